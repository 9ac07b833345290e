//! Access to the branch a capability is applied to.
use num_complex::Complex64;

use eqfork_algebra::Backend;
use eqfork_expr::Expr;

use crate::branch::{Branch, BranchId};
use crate::solver::SolverError;
use crate::variables::Variables;

/// The context passed to every capability.
///
/// All reads and writes go to the branch that is currently processed. Equation capabilities only
/// get shared access and thus cannot modify the branch.
pub struct Scope<'a> {
    capability: &'a str,
    variables: &'a Variables,
    backend: &'a dyn Backend,
    branch: &'a mut Branch,
    changes: usize,
    discarded: bool,
}

impl<'a> Scope<'a> {
    pub(crate) fn new(
        capability: &'a str,
        variables: &'a Variables,
        backend: &'a dyn Backend,
        branch: &'a mut Branch,
    ) -> Scope<'a> {
        Scope {
            capability,
            variables,
            backend,
            branch,
            changes: 0,
            discarded: false,
        }
    }

    /// Name of the capability this scope was created for.
    pub fn capability(&self) -> &str {
        self.capability
    }

    pub fn branch(&self) -> BranchId {
        self.branch.id()
    }

    /// The value of a variable, or the variable itself if it is unsolved.
    ///
    /// This is what equations are built from.
    pub fn var(&self, name: &str) -> Result<Expr, SolverError> {
        let id = self.variables.lookup(name)?;
        Ok(match self.branch.get(id) {
            Some(value) => value.clone(),
            None => Expr::var_symbol(self.variables.name(id).clone()),
        })
    }

    /// The value of a variable, `None` if it is unsolved.
    pub fn value(&self, name: &str) -> Result<Option<&Expr>, SolverError> {
        let id = self.variables.lookup(name)?;
        Ok(self.branch.get(id))
    }

    /// Whether all given variables are solved.
    pub fn is_solved(&self, names: &[&str]) -> Result<bool, SolverError> {
        for name in names {
            if self.value(name)?.is_none() {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Decimal approximation of a solved variable without units.
    pub fn decimal(&self, name: &str) -> Result<Option<Complex64>, SolverError> {
        let value = match self.value(name)? {
            Some(value) => value,
            None => return Ok(None),
        };
        let decimal =
            self.backend
                .evaluate_decimal(value)
                .map_err(|source| SolverError::Algebra {
                    context: self.capability.to_owned(),
                    source,
                })?;
        Ok(decimal.as_number().map(|number| number.to_complex()))
    }

    /// Like [`decimal`](Scope::decimal) but only for real values.
    pub fn real(&self, name: &str) -> Result<Option<f64>, SolverError> {
        Ok(self
            .decimal(name)?
            .filter(|value| value.im == 0.0)
            .map(|value| value.re))
    }

    /// Assigns a value to a variable.
    pub fn set(&mut self, name: &str, value: impl Into<Expr>) -> Result<(), SolverError> {
        let id = self.variables.lookup(name)?;
        if self.branch.set(id, Some(value.into())) {
            self.changes += 1;
        }
        Ok(())
    }

    /// Deletes the current branch once the capability returns.
    ///
    /// No further capabilities are applied to it.
    pub fn discard_branch(&mut self) {
        self.discarded = true;
    }

    /// Number of assignments that changed the branch.
    pub(crate) fn changes(&self) -> usize {
        self.changes
    }

    pub(crate) fn is_discarded(&self) -> bool {
        self.discarded
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use eqfork_algebra::Algebra;

    use crate::branch::Branches;

    #[test]
    fn reads_and_writes_the_branch() {
        let mut variables = Variables::default();
        variables.declare("x", "").unwrap();
        variables.declare("y", "").unwrap();
        let mut branches = Branches::default();
        branches.set_var_count(variables.len());
        let algebra = Algebra::default();

        let mut scope = Scope::new("test", &variables, &algebra, branches.get_mut(0));
        assert_eq!(scope.var("x").unwrap(), Expr::var("x"));
        assert!(!scope.is_solved(&["x"]).unwrap());
        assert_eq!(scope.real("x").unwrap(), None);

        scope.set("x", Expr::from(2).sqrt()).unwrap();
        scope.set("x", Expr::from(2).sqrt()).unwrap();
        assert_eq!(scope.changes(), 1);
        assert!(scope.is_solved(&["x"]).unwrap());
        assert!(!scope.is_solved(&["x", "y"]).unwrap());
        let value = scope.real("x").unwrap().unwrap();
        assert!((value - 2f64.sqrt()).abs() < 1e-12);

        scope.set("y", (Expr::from(-1)).sqrt()).unwrap();
        assert_eq!(scope.real("y").unwrap(), None);
        assert!(scope.decimal("y").unwrap().is_some());

        assert!(matches!(
            scope.var("z"),
            Err(SolverError::UnknownVariable { .. })
        ));

        scope.discard_branch();
        assert!(scope.is_discarded());
    }
}
