//! Central solver data structure.
use partial_ref::{part, partial, PartialRef, PartialRefTarget};

use eqfork_algebra::{Algebra, Backend};

use crate::branch::Branches;
use crate::config::SolverConfig;
use crate::model::Capabilities;
use crate::schedule::Schedule;
use crate::state::SolverState;
use crate::variables::Variables;

/// Part declarations for the [`Context`] struct.
mod parts {
    use super::*;

    part!(pub BackendP: SymbolicBackend);
    part!(pub BranchesP: Branches);
    part!(pub CapabilitiesP: Capabilities);
    part!(pub ScheduleP: Schedule);
    part!(pub SolverConfigP: SolverConfig);
    part!(pub SolverStateP: SolverState);
    part!(pub VariablesP: Variables);
}

pub use parts::*;

/// The symbolic backend used for all algebra.
///
/// This is the bundled [`Algebra`] unless a custom backend was installed.
#[derive(Default)]
pub struct SymbolicBackend {
    pub algebra: Algebra,
    pub custom: Option<Box<dyn Backend>>,
}

impl SymbolicBackend {
    pub fn get(&self) -> &dyn Backend {
        match &self.custom {
            Some(backend) => &**backend,
            None => &self.algebra,
        }
    }
}

/// Central solver data structure.
///
/// This struct contains all data kept by the solver. Functions operating on multiple fields of the
/// context use partial references provided by the `partial_ref` crate.
#[derive(PartialRefTarget, Default)]
pub struct Context {
    #[part(BackendP)]
    pub(crate) backend: SymbolicBackend,
    #[part(BranchesP)]
    pub(crate) branches: Branches,
    #[part(CapabilitiesP)]
    pub(crate) capabilities: Capabilities,
    #[part(ScheduleP)]
    pub(crate) schedule: Schedule,
    #[part(SolverConfigP)]
    pub(crate) solver_config: SolverConfig,
    #[part(SolverStateP)]
    pub(crate) solver_state: SolverState,
    #[part(VariablesP)]
    pub(crate) variables: Variables,
}

/// Update structures for a new variable count.
pub fn set_var_count(mut ctx: partial!(Context, mut BranchesP), count: usize) {
    ctx.part_mut(BranchesP).set_var_count(count);
}

/// Apply a changed configuration to the bundled algebra.
pub fn sync_config(mut ctx: partial!(Context, mut BackendP, SolverConfigP)) {
    let algebra_config = ctx.part(SolverConfigP).algebra_config();
    ctx.part_mut(BackendP).algebra.set_config(algebra_config);
}
