//! Equations between two expressions.
use std::collections::BTreeSet;
use std::fmt;

use crate::expr::Expr;
use crate::symbol::Symbol;

/// The equation `lhs = rhs`.
#[derive(Clone, PartialEq, Debug)]
pub struct Equation {
    pub lhs: Expr,
    pub rhs: Expr,
}

impl Equation {
    pub fn new(lhs: impl Into<Expr>, rhs: impl Into<Expr>) -> Equation {
        Equation {
            lhs: lhs.into(),
            rhs: rhs.into(),
        }
    }

    /// `lhs - rhs`, which is zero exactly when the equation holds.
    pub fn difference(&self) -> Expr {
        &self.lhs - &self.rhs
    }

    /// Variables appearing on either side.
    pub fn free_vars(&self) -> BTreeSet<Symbol> {
        let mut vars = self.lhs.free_vars();
        vars.extend(self.rhs.free_vars());
        vars
    }

    /// Applies `f` to both sides.
    pub fn map_sides(&self, mut f: impl FnMut(&Expr) -> Expr) -> Equation {
        Equation {
            lhs: f(&self.lhs),
            rhs: f(&self.rhs),
        }
    }
}

impl fmt::Display for Equation {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} = {}", self.lhs, self.rhs)
    }
}
