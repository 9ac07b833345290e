//! A single pass over all branches.
use log::{debug, trace};

use partial_ref::{partial, PartialRef};

use eqfork_algebra::AlgebraError;

use crate::branch::BranchId;
use crate::context::{BackendP, BranchesP, CapabilitiesP, Context, SolverStateP, VariablesP};
use crate::model::{CapabilityKind, EquationFn, FunctionFn};
use crate::scope::Scope;
use crate::solver::{Contradiction, SolverError};

/// Changes made during a pass.
#[derive(Copy, Clone, Default, PartialEq, Eq, Debug)]
pub struct PassSummary {
    pub assignments: usize,
    pub splits: usize,
    pub deletions: usize,
}

impl PassSummary {
    /// Whether the pass changed nothing.
    pub fn is_quiescent(&self) -> bool {
        self.assignments == 0 && self.splits == 0 && self.deletions == 0
    }
}

/// Applies every capability to every branch.
///
/// Only branches that exist when the pass starts are visited. Branches split off during the pass
/// are visited by the next pass.
pub fn run_pass(
    mut ctx: partial!(
        Context,
        mut BranchesP,
        mut SolverStateP,
        BackendP,
        CapabilitiesP,
        VariablesP,
    ),
) -> Result<PassSummary, SolverError> {
    let mut summary = PassSummary::default();
    for id in ctx.part(BranchesP).ids() {
        visit_branch(ctx.borrow(), id, &mut summary)?;
    }
    Ok(summary)
}

/// Applies all equations and then all functions to one branch.
///
/// Stops as soon as the branch is deleted.
fn visit_branch(
    mut ctx: partial!(
        Context,
        mut BranchesP,
        mut SolverStateP,
        BackendP,
        CapabilitiesP,
        VariablesP,
    ),
    id: BranchId,
    summary: &mut PassSummary,
) -> Result<(), SolverError> {
    let position = match ctx.part(BranchesP).position(id) {
        Some(position) => position,
        None => return Ok(()),
    };
    ctx.part_mut(BranchesP).switch(position)?;

    let (capabilities, mut ctx) = ctx.split_part(CapabilitiesP);
    for capability in capabilities.equations().chain(capabilities.functions()) {
        let inconsistency = match capability.kind() {
            CapabilityKind::Equation(equation) => {
                apply_equation(ctx.borrow(), capability.name(), equation, position, summary)?
            }
            CapabilityKind::Function(function) => {
                apply_function(ctx.borrow(), capability.name(), function, position, summary)?
            }
        };
        if let Some(detail) = inconsistency {
            kill_branch(ctx.borrow(), id, capability.name(), detail);
            summary.deletions += 1;
            break;
        }
    }
    Ok(())
}

/// Applies an equation to a branch.
///
/// Returns why the branch is inconsistent if the equation cannot hold.
fn apply_equation(
    mut ctx: partial!(Context, mut BranchesP, BackendP, VariablesP),
    capability: &str,
    build: &EquationFn,
    position: usize,
    summary: &mut PassSummary,
) -> Result<Option<String>, SolverError> {
    let (variables, mut ctx) = ctx.split_part(VariablesP);
    let (backend, mut ctx) = ctx.split_part(BackendP);
    let backend = backend.get();
    let branches = ctx.part_mut(BranchesP);

    let equation = {
        let scope = Scope::new(capability, variables, backend, branches.get_mut(position));
        build(&scope).map_err(|err| capability_error(capability, err))?
    };

    let branch = branches.get(position);
    let id = branch.id();
    let bindings = branch.bindings(variables);
    let lhs = backend.substitute(&equation.lhs, &bindings);
    let rhs = backend.substitute(&equation.rhs, &bindings);

    let mut free = lhs.free_vars();
    free.extend(rhs.free_vars());
    for name in free.iter() {
        variables.lookup(name.as_str())?;
    }

    if backend.is_fully_determined(&lhs) && backend.is_fully_determined(&rhs) {
        return match backend.equality_holds(&lhs, &rhs) {
            Ok(true) => {
                trace!("{}: {} = {} holds in branch {}", capability, lhs, rhs, id);
                Ok(None)
            }
            Ok(false) => Ok(Some(format!("{} = {} does not hold", lhs, rhs))),
            Err(AlgebraError::Undefined { detail }) => {
                Ok(Some(format!("undefined value: {}", detail)))
            }
            Err(source) => Err(algebra_error(capability, source)),
        };
    }

    let mut free = free.into_iter();
    let unknown = match (free.next(), free.next()) {
        (Some(unknown), None) => unknown,
        _ => return Ok(None),
    };

    match backend.solve_for(&lhs, &rhs, &unknown) {
        Ok(candidates) => {
            let var = variables.lookup(unknown.as_str())?;
            let mut candidates = candidates.into_iter();
            let first = match candidates.next() {
                Some(first) => first,
                None => {
                    return Ok(Some(format!(
                        "{} = {} has no solution for {}",
                        lhs, rhs, unknown
                    )))
                }
            };
            trace!("{}: {} = {} in branch {}", capability, unknown, first, id);
            branches.get_mut(position).set(var, Some(first));
            summary.assignments += 1;

            for candidate in candidates {
                let spawned = branches.spawn_from(position, var, candidate);
                summary.splits += 1;
                debug!(
                    "{}: branch {} split off from {} for {}",
                    capability, spawned, id, unknown
                );
            }
            Ok(None)
        }
        Err(err @ AlgebraError::Unsupported { .. })
        | Err(err @ AlgebraError::Indeterminate { .. }) => {
            trace!("{}: deferred in branch {}: {}", capability, id, err);
            Ok(None)
        }
        Err(AlgebraError::Undefined { detail }) => Ok(Some(format!("undefined value: {}", detail))),
        Err(source) => Err(algebra_error(capability, source)),
    }
}

/// Applies a function to a branch.
///
/// Returns a reason if the function discarded the branch.
fn apply_function(
    mut ctx: partial!(Context, mut BranchesP, BackendP, VariablesP),
    capability: &str,
    run: &FunctionFn,
    position: usize,
    summary: &mut PassSummary,
) -> Result<Option<String>, SolverError> {
    let (variables, mut ctx) = ctx.split_part(VariablesP);
    let (backend, mut ctx) = ctx.split_part(BackendP);
    let branch = ctx.part_mut(BranchesP).get_mut(position);

    let mut scope = Scope::new(capability, variables, backend.get(), branch);
    run(&mut scope).map_err(|err| capability_error(capability, err))?;

    summary.assignments += scope.changes();
    if scope.is_discarded() {
        Ok(Some("branch discarded".to_owned()))
    } else {
        Ok(None)
    }
}

fn kill_branch(
    mut ctx: partial!(Context, mut BranchesP, mut SolverStateP),
    id: BranchId,
    capability: &str,
    detail: String,
) {
    debug!("{}: deleting branch {}: {}", capability, id, detail);
    ctx.part_mut(SolverStateP).contradictions.push(Contradiction {
        branch: id,
        capability: capability.to_owned(),
        detail,
    });
    ctx.part_mut(BranchesP).kill(id);
}

/// Errors of the solver raised inside a capability are passed on unchanged.
fn capability_error(capability: &str, err: anyhow::Error) -> SolverError {
    match err.downcast::<SolverError>() {
        Ok(err) => err,
        Err(source) => SolverError::Capability {
            capability: capability.to_owned(),
            source,
        },
    }
}

fn algebra_error(capability: &str, source: AlgebraError) -> SolverError {
    SolverError::Algebra {
        context: capability.to_owned(),
        source,
    }
}
