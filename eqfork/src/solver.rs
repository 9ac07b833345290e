//! Branching equation solver.
use std::collections::BTreeMap;
use std::fmt;

use partial_ref::{IntoPartialRef, IntoPartialRefMut, PartialRef};
use thiserror::Error;

use log::info;

use eqfork_algebra::{AlgebraError, Backend};
use eqfork_expr::Expr;

use crate::branch::BranchId;
use crate::config::{SolverConfig, SolverConfigUpdate};
use crate::context::{
    sync_config, BackendP, BranchesP, CapabilitiesP, Context, ScheduleP, SolverConfigP,
    SolverStateP, VariablesP,
};
use crate::model::{flatten, Definition, Model};
use crate::schedule::{solve_to_fixed_point, SolveStats};
use crate::state::SolveState;
use crate::variables::declare_var;

/// Values of all variables of a branch, ordered by name. `None` marks unsolved variables.
pub type Values = BTreeMap<String, Option<Expr>>;

/// Why a branch was deleted.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Contradiction {
    pub branch: BranchId,
    /// The equation or function that deleted the branch.
    pub capability: String,
    pub detail: String,
}

impl fmt::Display for Contradiction {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "branch {}: {}: {}", self.branch, self.capability, self.detail)
    }
}

fn list_contradictions(contradictions: &[Contradiction]) -> String {
    contradictions
        .iter()
        .map(|contradiction| contradiction.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

/// Possible errors while declaring, solving or reading results.
#[derive(Debug, Error)]
pub enum SolverError {
    #[error("variable {name} is declared more than once")]
    DuplicateVariable { name: String },
    #[error("{name:?} is not a valid variable name")]
    InvalidVariableName { name: String },
    #[error("cannot {operation} after solving started")]
    Locked { operation: &'static str },
    #[error("solve was already called")]
    AlreadySolved,
    #[error("no equations or functions are defined")]
    NoCapabilities,
    #[error("unknown variable {name}")]
    UnknownVariable { name: String },
    #[error("no consistent solution: {}", list_contradictions(.contradictions))]
    Contradiction { contradictions: Vec<Contradiction> },
    #[error("branch position {position} is out of range for {count} branches")]
    BranchIndex { position: usize, count: usize },
    #[error("no fixed point reached within {passes} passes")]
    NoProgress { passes: usize },
    #[error("capability {capability} failed")]
    Capability {
        capability: String,
        #[source]
        source: anyhow::Error,
    },
    #[error("algebra error in {context}")]
    Algebra {
        context: String,
        #[source]
        source: AlgebraError,
    },
}

/// Kinds of [`SolverError`].
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum ErrorKind {
    Declaration,
    State,
    Configuration,
    UnknownVariable,
    Contradiction,
    Index,
    NoProgress,
    Capability,
    Algebra,
}

impl SolverError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SolverError::DuplicateVariable { .. } | SolverError::InvalidVariableName { .. } => {
                ErrorKind::Declaration
            }
            SolverError::Locked { .. } | SolverError::AlreadySolved => ErrorKind::State,
            SolverError::NoCapabilities => ErrorKind::Configuration,
            SolverError::UnknownVariable { .. } => ErrorKind::UnknownVariable,
            SolverError::Contradiction { .. } => ErrorKind::Contradiction,
            SolverError::BranchIndex { .. } => ErrorKind::Index,
            SolverError::NoProgress { .. } => ErrorKind::NoProgress,
            SolverError::Capability { .. } => ErrorKind::Capability,
            SolverError::Algebra { .. } => ErrorKind::Algebra,
        }
    }
}

/// A branching equation solver.
///
/// Before [`solve`](Solver::solve) is called, variables can be declared and set. Afterwards the
/// solver is locked and only results can be read.
///
/// All per-variable accessors read the current branch, which can be changed using
/// [`switch_branch`](Solver::switch_branch) and [`rotate_branch`](Solver::rotate_branch).
pub struct Solver {
    ctx: Box<Context>,
}

impl Solver {
    /// Create a solver for a model and all its ancestors.
    pub fn new(model: &dyn Model) -> Result<Solver, SolverError> {
        Solver::from_definition(flatten(model))
    }

    /// Create a solver from a single definition.
    pub fn from_definition(definition: Definition) -> Result<Solver, SolverError> {
        let mut solver = Solver {
            ctx: Box::new(Context::default()),
        };
        let (variables, capabilities) = definition.into_parts();
        for (name, description) in variables {
            solver.declare(&name, &description)?;
        }
        *solver.ctx.into_partial_ref_mut().part_mut(CapabilitiesP) = capabilities;
        Ok(solver)
    }

    /// Fails if the solver is locked.
    fn check_unlocked(&self, operation: &'static str) -> Result<(), SolverError> {
        let ctx = self.ctx.into_partial_ref();
        if ctx.part(SolverStateP).is_locked() {
            Err(SolverError::Locked { operation })
        } else {
            Ok(())
        }
    }

    /// Change the solver configuration.
    pub fn config(&mut self, update: &SolverConfigUpdate) -> Result<(), SolverError> {
        self.check_unlocked("change the configuration")?;
        let mut ctx = self.ctx.into_partial_ref_mut();
        update.apply(ctx.part_mut(SolverConfigP));
        sync_config(ctx.borrow());
        Ok(())
    }

    /// The current configuration.
    pub fn current_config(&self) -> &SolverConfig {
        &self.ctx.solver_config
    }

    /// Use a custom symbolic backend instead of the bundled [`Algebra`](eqfork_algebra::Algebra).
    pub fn set_backend(&mut self, backend: Box<dyn Backend>) -> Result<(), SolverError> {
        self.check_unlocked("change the backend")?;
        let mut ctx = self.ctx.into_partial_ref_mut();
        ctx.part_mut(BackendP).custom = Some(backend);
        Ok(())
    }

    /// Define a unit of the bundled algebra in terms of other units.
    pub fn define_unit(&mut self, name: &str, value: Expr) -> Result<(), SolverError> {
        self.check_unlocked("define a unit")?;
        let mut ctx = self.ctx.into_partial_ref_mut();
        ctx.part_mut(BackendP).algebra.define_unit(name, value);
        Ok(())
    }

    /// Declare an additional variable.
    pub fn declare(&mut self, name: &str, description: &str) -> Result<(), SolverError> {
        let mut ctx = self.ctx.into_partial_ref_mut();
        declare_var(ctx.borrow(), name, description)?;
        Ok(())
    }

    /// Declare additional variables without description.
    pub fn declare_all(&mut self, names: &[&str]) -> Result<(), SolverError> {
        for name in names {
            self.declare(name, "")?;
        }
        Ok(())
    }

    /// Set a known value before solving.
    pub fn set(&mut self, name: &str, value: impl Into<Expr>) -> Result<(), SolverError> {
        self.check_unlocked("set a variable")?;
        let mut ctx = self.ctx.into_partial_ref_mut();
        let var = ctx.part(VariablesP).lookup(name)?;
        ctx.part_mut(BranchesP).write(var, Some(value.into()));
        Ok(())
    }

    /// Whether the solver refuses declarations and assignments.
    pub fn is_locked(&self) -> bool {
        let ctx = self.ctx.into_partial_ref();
        ctx.part(SolverStateP).is_locked()
    }

    /// Find all consistent assignments.
    ///
    /// This can only be called once. On success at least one branch remains, possibly with
    /// unsolved variables.
    pub fn solve(&mut self) -> Result<(), SolverError> {
        let mut ctx = self.ctx.into_partial_ref_mut();
        if ctx.part(SolverStateP).solve_state != SolveState::Unsolved {
            return Err(SolverError::AlreadySolved);
        }
        ctx.part_mut(SolverStateP).solve_state = SolveState::Solved;

        if ctx.part(CapabilitiesP).is_empty() {
            ctx.part_mut(SolverStateP).solve_state = SolveState::Failed;
            return Err(SolverError::NoCapabilities);
        }

        info!(
            "solving {} variables using {} capabilities",
            ctx.part(VariablesP).len(),
            ctx.part(CapabilitiesP).len()
        );

        let result = solve_to_fixed_point(ctx.borrow());

        let stats = ctx.part(ScheduleP).stats;
        match &result {
            Ok(()) => info!(
                "solved with {} branches after {} passes",
                ctx.part(BranchesP).len(),
                stats.passes
            ),
            Err(err) => {
                info!("solving failed after {} passes: {}", stats.passes, err);
                ctx.part_mut(SolverStateP).solve_state = SolveState::Failed;
            }
        }
        result
    }

    /// Description of a variable, empty if none was given.
    pub fn describe(&self, name: &str) -> Result<&str, SolverError> {
        let variables = &self.ctx.variables;
        Ok(variables.description(variables.lookup(name)?))
    }

    /// All variables with their descriptions, ordered by name.
    pub fn descriptions(&self) -> BTreeMap<String, String> {
        let variables = &self.ctx.variables;
        variables
            .iter()
            .map(|(id, name)| (name.to_string(), variables.description(id).to_owned()))
            .collect()
    }

    /// All variables in declaration order.
    pub fn variables(&self) -> Vec<&str> {
        self.ctx
            .variables
            .iter()
            .map(|(_, name)| name.as_str())
            .collect()
    }

    /// Value of a variable in the current branch, `None` if unsolved.
    pub fn get(&self, name: &str) -> Result<Option<&Expr>, SolverError> {
        let ctx = &self.ctx;
        let var = ctx.variables.lookup(name)?;
        Ok(ctx.branches.read(var))
    }

    /// Whether all given variables are solved in the current branch.
    pub fn is_solved(&self, names: &[&str]) -> Result<bool, SolverError> {
        for name in names {
            if self.get(name)?.is_none() {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Solved variables of the current branch, ordered by name.
    pub fn solved_values(&self) -> BTreeMap<String, Expr> {
        self.current_values()
            .into_iter()
            .filter_map(|(name, value)| Some((name, value?)))
            .collect()
    }

    /// All variables of the current branch, ordered by name.
    pub fn current_values(&self) -> Values {
        let ctx = &self.ctx;
        ctx.variables
            .iter()
            .map(|(id, name)| (name.to_string(), ctx.branches.read(id).cloned()))
            .collect()
    }

    /// Values of all variables for every branch.
    pub fn all_branch_values(&self) -> Vec<Values> {
        let ctx = &self.ctx;
        ctx.branches
            .iter()
            .map(|branch| {
                ctx.variables
                    .iter()
                    .map(|(id, name)| (name.to_string(), branch.get(id).cloned()))
                    .collect()
            })
            .collect()
    }

    /// Like [`all_branch_values`](Solver::all_branch_values) but evaluated to decimals.
    pub fn all_branch_values_decimal(&self) -> Result<Vec<Values>, SolverError> {
        self.all_branch_values()
            .into_iter()
            .map(|values| {
                values
                    .into_iter()
                    .map(|(name, value)| {
                        let decimal = self.decimal(&name, value)?;
                        Ok((name, decimal))
                    })
                    .collect()
            })
            .collect()
    }

    pub fn branch_count(&self) -> usize {
        self.ctx.branches.len()
    }

    /// Values of a variable in every branch.
    pub fn values_of(&self, name: &str) -> Result<Vec<Option<Expr>>, SolverError> {
        let ctx = &self.ctx;
        let var = ctx.variables.lookup(name)?;
        Ok(ctx
            .branches
            .iter()
            .map(|branch| branch.get(var).cloned())
            .collect())
    }

    /// Like [`values_of`](Solver::values_of) but evaluated to decimals.
    pub fn values_of_decimal(&self, name: &str) -> Result<Vec<Option<Expr>>, SolverError> {
        self.values_of(name)?
            .into_iter()
            .map(|value| self.decimal(name, value))
            .collect()
    }

    fn decimal(&self, name: &str, value: Option<Expr>) -> Result<Option<Expr>, SolverError> {
        match value {
            None => Ok(None),
            Some(value) => {
                let backend = self.ctx.backend.get();
                let decimal =
                    backend
                        .evaluate_decimal(&value)
                        .map_err(|source| SolverError::Algebra {
                            context: format!("decimal value of {}", name),
                            source,
                        })?;
                Ok(Some(decimal))
            }
        }
    }

    /// Id of the current branch, `None` if every branch was deleted.
    pub fn current_branch(&self) -> Option<BranchId> {
        self.ctx.branches.current().map(|branch| branch.id())
    }

    /// Make the branch at the given position current.
    pub fn switch_branch(&mut self, position: usize) -> Result<(), SolverError> {
        let mut ctx = self.ctx.into_partial_ref_mut();
        ctx.part_mut(BranchesP).switch(position)
    }

    /// Make the next branch current, wrapping around after the last one.
    pub fn rotate_branch(&mut self) {
        let mut ctx = self.ctx.into_partial_ref_mut();
        ctx.part_mut(BranchesP).rotate();
    }

    /// Ids of all branches in branch order.
    pub fn branch_ids(&self) -> Vec<BranchId> {
        self.ctx.branches.ids()
    }

    /// Why branches were deleted, in deletion order.
    pub fn contradictions(&self) -> &[Contradiction] {
        &self.ctx.solver_state.contradictions
    }

    pub fn stats(&self) -> SolveStats {
        self.ctx.schedule.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    use proptest::prelude::*;

    use eqfork_algebra::Algebra;
    use eqfork_expr::test::{integer_root_quadratic, linear_system};
    use eqfork_expr::{Bindings, Equation, Symbol};

    use crate::test::{init_logging, integer, linear_definition, single_equation};

    fn square_and_sum() -> Definition {
        let mut def = Definition::new();
        def.variable("x", "a root of 16").variable("y", "x plus one");
        def.equation("square", |s| Ok(Equation::new(s.var("x")?.powi(2), 16)));
        def.equation("sum", |s| Ok(Equation::new(s.var("y")?, s.var("x")? + 1)));
        def
    }

    #[test]
    fn splits_on_two_roots() {
        init_logging();
        let mut solver = Solver::from_definition(square_and_sum()).unwrap();
        solver.solve().unwrap();

        assert_eq!(solver.branch_count(), 2);
        let xs: Vec<_> = solver
            .values_of("x")
            .unwrap()
            .iter()
            .map(|value| integer(value.as_ref()))
            .collect();
        assert_eq!(xs, vec![Some(-4), Some(4)]);
        let ys: Vec<_> = solver
            .values_of("y")
            .unwrap()
            .iter()
            .map(|value| integer(value.as_ref()))
            .collect();
        assert_eq!(ys, vec![Some(-3), Some(5)]);
        assert_eq!(solver.stats().splits, 1);
        assert!(solver.is_locked());
    }

    #[test]
    fn branch_navigation() {
        let mut solver = Solver::from_definition(square_and_sum()).unwrap();
        solver.solve().unwrap();

        let ids = solver.branch_ids();
        assert_eq!(solver.current_branch(), Some(ids[0]));
        assert_eq!(integer(solver.get("x").unwrap()), Some(-4));

        solver.rotate_branch();
        assert_eq!(solver.current_branch(), Some(ids[1]));
        assert_eq!(integer(solver.get("x").unwrap()), Some(4));

        solver.rotate_branch();
        assert_eq!(solver.current_branch(), Some(ids[0]));

        solver.switch_branch(1).unwrap();
        assert_eq!(integer(solver.get("y").unwrap()), Some(5));

        let err = solver.switch_branch(2).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Index);
    }

    #[test]
    fn current_branch_after_pruning() {
        let mut def = square_and_sum();
        def.function("positive", |s| {
            if let Some(x) = s.real("x")? {
                if x < 0.0 {
                    s.discard_branch();
                }
            }
            Ok(())
        });
        let mut solver = Solver::from_definition(def).unwrap();
        solver.solve().unwrap();

        assert_eq!(solver.branch_count(), 1);
        assert_eq!(solver.current_branch(), Some(solver.branch_ids()[0]));
        assert_eq!(integer(solver.get("x").unwrap()), Some(4));
        assert_eq!(integer(solver.get("y").unwrap()), Some(5));
    }

    #[test]
    fn split_branches_are_visited_next_pass() {
        let visits = Rc::new(RefCell::new(vec![]));
        let mut def = square_and_sum();
        let log = visits.clone();
        def.function("observe", move |s| {
            log.borrow_mut().push(s.branch());
            Ok(())
        });
        let mut solver = Solver::from_definition(def).unwrap();
        solver.solve().unwrap();

        let ids = solver.branch_ids();
        // The first pass splits off ids[1] but only visits ids[0].
        assert_eq!(
            *visits.borrow(),
            vec![ids[0], ids[0], ids[1], ids[0], ids[1]]
        );
        assert_eq!(solver.stats().passes, 3);
        assert_eq!(solver.stats().splits, 1);
    }

    #[test]
    fn repeated_roots_keep_their_branches() {
        let x = || Expr::var("x");
        let cases = vec![
            ((x() - 1).powi(3), 1),
            (x().powi(3), 1),
            ((x() - 2).powi(2) * (x() + 1), 2),
        ];
        for (lhs, count) in cases {
            let equation = Equation::new(lhs.clone(), 0);
            let mut solver = Solver::from_definition(single_equation(equation)).unwrap();
            solver.solve().unwrap();
            assert_eq!(solver.branch_count(), count, "{}", lhs);
            assert!(solver.contradictions().is_empty(), "{}", lhs);
        }
    }

    /// Delegates to the bundled algebra but never considers an expression determined.
    struct NeverDetermined {
        algebra: Algebra,
        checks: Rc<Cell<usize>>,
    }

    impl Backend for NeverDetermined {
        fn substitute(&self, expr: &Expr, bindings: &Bindings) -> Expr {
            self.algebra.substitute(expr, bindings)
        }

        fn solve_for(
            &self,
            lhs: &Expr,
            rhs: &Expr,
            unknown: &Symbol,
        ) -> Result<Vec<Expr>, AlgebraError> {
            self.algebra.solve_for(lhs, rhs, unknown)
        }

        fn is_fully_determined(&self, _expr: &Expr) -> bool {
            self.checks.set(self.checks.get() + 1);
            false
        }

        fn evaluate_decimal(&self, expr: &Expr) -> Result<Expr, AlgebraError> {
            self.algebra.evaluate_decimal(expr)
        }

        fn equality_holds(&self, a: &Expr, b: &Expr) -> Result<bool, AlgebraError> {
            self.algebra.equality_holds(a, b)
        }
    }

    #[test]
    fn backend_decides_determination() {
        let mut def = Definition::new();
        def.variables(&["x", "y"]);
        def.equation("one_more", |s| Ok(Equation::new(s.var("y")?, s.var("x")? + 1)));
        def.equation("two_more", |s| Ok(Equation::new(s.var("y")?, s.var("x")? + 2)));
        let mut solver = Solver::from_definition(def).unwrap();

        let checks = Rc::new(Cell::new(0));
        solver
            .set_backend(Box::new(NeverDetermined {
                algebra: Algebra::default(),
                checks: checks.clone(),
            }))
            .unwrap();
        solver.set("x", 1).unwrap();
        solver.solve().unwrap();

        assert!(checks.get() > 0);
        assert_eq!(solver.branch_count(), 1);
        assert_eq!(integer(solver.get("y").unwrap()), Some(2));
    }

    #[test]
    fn declarations() {
        let mut solver = Solver::from_definition(square_and_sum()).unwrap();
        assert_eq!(solver.describe("x").unwrap(), "a root of 16");
        solver.declare("z", "").unwrap();
        solver.declare_all(&["w"]).unwrap();
        assert_eq!(solver.variables(), vec!["x", "y", "z", "w"]);
        assert_eq!(solver.describe("w").unwrap(), "");

        let descriptions = solver.descriptions();
        let names: Vec<_> = descriptions.keys().map(|name| name.as_str()).collect();
        assert_eq!(names, vec!["w", "x", "y", "z"]);

        let err = solver.declare("x", "again").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Declaration);
        let err = solver.declare("2x", "").unwrap_err();
        assert!(matches!(err, SolverError::InvalidVariableName { .. }));
        let err = solver.describe("v").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnknownVariable);
    }

    #[test]
    fn lock_after_solve() {
        let mut solver = Solver::from_definition(square_and_sum()).unwrap();
        assert!(!solver.is_locked());
        solver.set("x", 4).unwrap();
        solver.solve().unwrap();
        assert_eq!(solver.branch_count(), 1);
        assert_eq!(integer(solver.get("y").unwrap()), Some(5));

        assert!(matches!(
            solver.declare("z", ""),
            Err(SolverError::Locked { .. })
        ));
        assert!(matches!(solver.set("y", 1), Err(SolverError::Locked { .. })));
        assert!(matches!(
            solver.config(&SolverConfigUpdate::new()),
            Err(SolverError::Locked { .. })
        ));
        assert!(matches!(solver.solve(), Err(SolverError::AlreadySolved)));
    }

    #[test]
    fn no_capabilities() {
        let mut def = Definition::new();
        def.variable("x", "");
        let mut solver = Solver::from_definition(def).unwrap();
        let err = solver.solve().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
        assert!(matches!(solver.solve(), Err(SolverError::AlreadySolved)));
    }

    #[test]
    fn contradiction_lists_deleted_branches() {
        let mut def = Definition::new();
        def.variables(&["x", "y"]);
        def.equation("first", |s| Ok(Equation::new(s.var("y")?, s.var("x")? + 1)));
        def.equation("second", |s| Ok(Equation::new(s.var("y")?, s.var("x")? + 2)));
        def.equation("pin", |s| Ok(Equation::new(s.var("x")?, 0)));
        let mut solver = Solver::from_definition(def).unwrap();

        match solver.solve() {
            Err(SolverError::Contradiction { contradictions }) => {
                assert_eq!(contradictions.len(), 1);
                assert_eq!(contradictions[0].capability, "second");
            }
            other => panic!("unexpected result {:?}", other),
        }
        assert_eq!(solver.branch_count(), 0);
        assert_eq!(solver.current_branch(), None);
        assert_eq!(solver.contradictions().len(), 1);
    }

    #[test]
    fn capability_errors() {
        let mut def = Definition::new();
        def.variable("x", "");
        def.equation("typo", |s| Ok(Equation::new(s.var("xx")?, 1)));
        let mut solver = Solver::from_definition(def).unwrap();
        let err = solver.solve().unwrap_err();
        assert!(matches!(err, SolverError::UnknownVariable { ref name } if name == "xx"));

        let mut def = Definition::new();
        def.variable("x", "");
        def.function("broken", |_| Err(anyhow::anyhow!("out of coffee")));
        let mut solver = Solver::from_definition(def).unwrap();
        match solver.solve().unwrap_err() {
            SolverError::Capability { capability, source } => {
                assert_eq!(capability, "broken");
                assert_eq!(source.to_string(), "out of coffee");
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn undetermined_variables_remain_unsolved() {
        let mut def = Definition::new();
        def.variables(&["x", "y", "z"]);
        def.equation("plane", |s| {
            Ok(Equation::new(s.var("x")? + s.var("y")?, s.var("z")?))
        });
        def.equation("pin", |s| Ok(Equation::new(s.var("z")?, 3)));
        let mut solver = Solver::from_definition(def).unwrap();
        solver.solve().unwrap();

        assert_eq!(solver.branch_count(), 1);
        assert!(solver.is_solved(&["z"]).unwrap());
        assert!(!solver.is_solved(&["x", "z"]).unwrap());
        let solved: Vec<_> = solver.solved_values().keys().cloned().collect();
        assert_eq!(solved, vec!["z".to_owned()]);
        assert_eq!(solver.current_values().len(), 3);
    }

    #[test]
    fn pass_limit() {
        let mut def = Definition::new();
        def.variable("n", "");
        def.function("count", |s| {
            let next = match s.value("n")? {
                Some(value) => value.clone() + 1,
                None => Expr::from(0),
            };
            s.set("n", next)?;
            Ok(())
        });
        let mut solver = Solver::from_definition(def).unwrap();
        let mut update = SolverConfigUpdate::new();
        update.max_passes = Some(10);
        solver.config(&update).unwrap();
        assert_eq!(solver.current_config().max_passes, 10);

        let err = solver.solve().unwrap_err();
        assert!(matches!(err, SolverError::NoProgress { passes: 10 }));
    }

    proptest! {
        #[test]
        fn linear_systems(system in linear_system(1..8usize)) {
            let mut solver = Solver::from_definition(linear_definition(&system)).unwrap();
            solver.solve().unwrap();

            prop_assert_eq!(solver.branch_count(), 1);
            for (name, &value) in system.names.iter().zip(system.values.iter()) {
                prop_assert_eq!(integer(solver.get(name).unwrap()), Some(value));
            }
            prop_assert!(solver.stats().passes <= system.names.len() + 1);
        }

        #[test]
        fn quadratics((equation, low, high) in integer_root_quadratic()) {
            let mut solver = Solver::from_definition(single_equation(equation)).unwrap();
            solver.solve().unwrap();

            let mut roots: Vec<_> = solver
                .values_of("x")
                .unwrap()
                .iter()
                .map(|value| integer(value.as_ref()))
                .collect();
            roots.sort();
            prop_assert_eq!(roots, vec![Some(low), Some(high)]);
        }
    }
}
