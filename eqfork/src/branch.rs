//! Solution branches.
use std::fmt;

use eqfork_expr::{Bindings, Expr};

use crate::solver::SolverError;
use crate::variables::{VarId, Variables};

/// Identifies a branch.
///
/// Ids are assigned in creation order and never reused, so they stay meaningful after other
/// branches were deleted.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct BranchId(u64);

impl BranchId {
    pub fn index(self) -> u64 {
        self.0
    }
}

impl fmt::Display for BranchId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One assignment of values to every declared variable.
#[derive(Clone, Debug)]
pub struct Branch {
    id: BranchId,
    /// Indexed by [`VarId`], `None` for unsolved variables.
    values: Vec<Option<Expr>>,
}

impl Branch {
    pub fn id(&self) -> BranchId {
        self.id
    }

    pub fn get(&self, var: VarId) -> Option<&Expr> {
        self.values[var.index()].as_ref()
    }

    /// Stores a value, returns whether this changed the branch.
    pub fn set(&mut self, var: VarId, value: Option<Expr>) -> bool {
        let slot = &mut self.values[var.index()];
        if *slot == value {
            false
        } else {
            *slot = value;
            true
        }
    }

    /// Values of all solved variables.
    pub fn bindings(&self, variables: &Variables) -> Bindings {
        variables
            .iter()
            .filter_map(|(id, name)| Some((name.clone(), self.get(id)?.clone())))
            .collect()
    }
}

/// The live branches and the current branch.
pub struct Branches {
    branches: Vec<Branch>,
    current: usize,
    next_id: u64,
}

impl Default for Branches {
    fn default() -> Branches {
        Branches {
            branches: vec![Branch {
                id: BranchId(0),
                values: vec![],
            }],
            current: 0,
            next_id: 1,
        }
    }
}

impl Branches {
    pub fn len(&self) -> usize {
        self.branches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.branches.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Branch> {
        self.branches.iter()
    }

    /// Ids of all live branches in branch order.
    pub fn ids(&self) -> Vec<BranchId> {
        self.branches.iter().map(|branch| branch.id).collect()
    }

    pub fn position(&self, id: BranchId) -> Option<usize> {
        self.branches.iter().position(|branch| branch.id == id)
    }

    pub fn get(&self, position: usize) -> &Branch {
        &self.branches[position]
    }

    pub fn get_mut(&mut self, position: usize) -> &mut Branch {
        &mut self.branches[position]
    }

    pub fn current_position(&self) -> usize {
        self.current
    }

    /// The current branch, `None` when every branch was deleted.
    pub fn current(&self) -> Option<&Branch> {
        self.branches.get(self.current)
    }

    pub fn current_mut(&mut self) -> Option<&mut Branch> {
        self.branches.get_mut(self.current)
    }

    /// Makes the branch at `position` current.
    pub fn switch(&mut self, position: usize) -> Result<(), SolverError> {
        if position >= self.branches.len() {
            return Err(SolverError::BranchIndex {
                position,
                count: self.branches.len(),
            });
        }
        self.current = position;
        Ok(())
    }

    /// Makes the next branch current, wrapping around after the last.
    pub fn rotate(&mut self) {
        if !self.branches.is_empty() {
            self.current = (self.current + 1) % self.branches.len();
        }
    }

    /// Appends a copy of the branch at `position` where `var` has the value `value`.
    pub fn spawn_from(&mut self, position: usize, var: VarId, value: Expr) -> BranchId {
        let id = BranchId(self.next_id);
        self.next_id += 1;
        let mut branch = Branch {
            id,
            values: self.branches[position].values.clone(),
        };
        branch.set(var, Some(value));
        self.branches.push(branch);
        id
    }

    /// Removes a branch.
    ///
    /// The current branch stays current unless it is the removed one, in which case the following
    /// branch becomes current.
    pub fn kill(&mut self, id: BranchId) {
        if let Some(position) = self.position(id) {
            self.branches.remove(position);
            if position < self.current {
                self.current -= 1;
            }
            if self.current >= self.branches.len() {
                self.current = 0;
            }
        }
    }

    /// Value of `var` in the current branch.
    pub fn read(&self, var: VarId) -> Option<&Expr> {
        self.current()?.get(var)
    }

    /// Sets the value of `var` in the current branch, returns whether this changed the branch.
    pub fn write(&mut self, var: VarId, value: Option<Expr>) -> bool {
        match self.current_mut() {
            Some(branch) => branch.set(var, value),
            None => false,
        }
    }

    /// Extends every branch with unsolved values for new variables.
    pub fn set_var_count(&mut self, count: usize) {
        for branch in self.branches.iter_mut() {
            branch.values.resize(count, None);
        }
    }
}
