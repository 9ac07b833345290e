//! Repeating passes until a fixed point is reached.
use log::{debug, info};

use partial_ref::{partial, PartialRef};

use crate::context::{
    BackendP, BranchesP, CapabilitiesP, Context, ScheduleP, SolverConfigP, SolverStateP,
    VariablesP,
};
use crate::pass::run_pass;
use crate::solver::SolverError;

/// Statistics of a solver run.
#[derive(Copy, Clone, Default, PartialEq, Eq, Debug)]
pub struct SolveStats {
    /// Number of passes including the final one that changed nothing.
    pub passes: usize,
    /// Values assigned by equations or changed by functions.
    pub assignments: usize,
    /// Branches split off.
    pub splits: usize,
    /// Branches deleted.
    pub deletions: usize,
}

/// Scheduling of solver passes.
#[derive(Default)]
pub struct Schedule {
    pub stats: SolveStats,
}

/// Runs passes until one of them changes nothing.
///
/// Fails when every branch was deleted or when no fixed point is reached within the configured
/// number of passes. On success the branch at the position that was current before the first pass
/// is current again, or the first branch if there are fewer branches now.
pub fn solve_to_fixed_point(
    mut ctx: partial!(
        Context,
        mut BranchesP,
        mut ScheduleP,
        mut SolverStateP,
        BackendP,
        CapabilitiesP,
        SolverConfigP,
        VariablesP,
    ),
) -> Result<(), SolverError> {
    let max_passes = ctx.part(SolverConfigP).max_passes;
    let start = ctx.part(BranchesP).current_position();

    loop {
        let (schedule, mut ctx) = ctx.split_part_mut(ScheduleP);
        if schedule.stats.passes >= max_passes {
            return Err(SolverError::NoProgress { passes: max_passes });
        }

        let summary = run_pass(ctx.borrow())?;

        let stats = &mut schedule.stats;
        stats.passes += 1;
        stats.assignments += summary.assignments;
        stats.splits += summary.splits;
        stats.deletions += summary.deletions;

        if summary.splits > 0 {
            ctx.part_mut(SolverStateP).split = true;
        }

        debug!(
            "pass {}: {} assignments, {} splits, {} deletions, {} branches",
            stats.passes,
            summary.assignments,
            summary.splits,
            summary.deletions,
            ctx.part(BranchesP).len()
        );

        if ctx.part(BranchesP).is_empty() {
            info!("every branch is inconsistent after {} passes", stats.passes);
            return Err(SolverError::Contradiction {
                contradictions: ctx.part(SolverStateP).contradictions.clone(),
            });
        }

        if summary.is_quiescent() {
            let branches = ctx.part_mut(BranchesP);
            let position = if start < branches.len() { start } else { 0 };
            return branches.switch(position);
        }
    }
}
