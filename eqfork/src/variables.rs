//! Declared variables and their descriptions.
use rustc_hash::FxHashMap;

use partial_ref::{partial, PartialRef};

use eqfork_expr::Symbol;

use crate::context::{set_var_count, BranchesP, Context, SolverStateP, VariablesP};
use crate::solver::SolverError;

/// Index of a declared variable.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct VarId(usize);

impl VarId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// The variable registry.
///
/// Variables are kept in declaration order. They are never removed.
#[derive(Default)]
pub struct Variables {
    names: Vec<Symbol>,
    descriptions: Vec<String>,
    ids: FxHashMap<Symbol, VarId>,
}

impl Variables {
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Adds a new variable.
    pub fn declare(&mut self, name: &str, description: &str) -> Result<VarId, SolverError> {
        if !is_identifier(name) {
            return Err(SolverError::InvalidVariableName {
                name: name.to_owned(),
            });
        }
        if self.ids.contains_key(name) {
            return Err(SolverError::DuplicateVariable {
                name: name.to_owned(),
            });
        }
        let id = VarId(self.names.len());
        let symbol = Symbol::new(name);
        self.names.push(symbol.clone());
        self.descriptions.push(description.to_owned());
        self.ids.insert(symbol, id);
        Ok(id)
    }

    pub fn id(&self, name: &str) -> Option<VarId> {
        self.ids.get(name).copied()
    }

    /// Like [`id`](Variables::id) but fails for undeclared variables.
    pub fn lookup(&self, name: &str) -> Result<VarId, SolverError> {
        self.id(name).ok_or_else(|| SolverError::UnknownVariable {
            name: name.to_owned(),
        })
    }

    pub fn name(&self, id: VarId) -> &Symbol {
        &self.names[id.0]
    }

    pub fn description(&self, id: VarId) -> &str {
        &self.descriptions[id.0]
    }

    /// All variables in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (VarId, &Symbol)> {
        self.names
            .iter()
            .enumerate()
            .map(|(index, name)| (VarId(index), name))
    }

    /// All variables in alphabetical order.
    pub fn sorted(&self) -> Vec<VarId> {
        let mut ids: Vec<VarId> = (0..self.names.len()).map(VarId).collect();
        ids.sort_by(|&a, &b| self.names[a.0].cmp(&self.names[b.0]));
        ids
    }
}

/// Whether `name` can be used as a variable name.
///
/// Names have to start with a letter or underscore, followed by letters, digits or underscores.
pub fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_alphabetic() || first == '_' => {
            chars.all(|c| c.is_alphanumeric() || c == '_')
        }
        _ => false,
    }
}

/// Declares a new variable, extending every branch.
pub fn declare_var(
    mut ctx: partial!(Context, mut BranchesP, mut VariablesP, SolverStateP),
    name: &str,
    description: &str,
) -> Result<VarId, SolverError> {
    if ctx.part(SolverStateP).is_locked() {
        return Err(SolverError::Locked {
            operation: "declare a variable",
        });
    }
    let id = ctx.part_mut(VariablesP).declare(name, description)?;
    let count = ctx.part(VariablesP).len();
    set_var_count(ctx.borrow(), count);
    Ok(id)
}
