//! Symbolic backend of the eqfork equation solver.
//!
//! The solver engine only talks to the algebra through the [`Backend`] trait. [`Algebra`] is the
//! bundled implementation.
use thiserror::Error;

use eqfork_expr::{Bindings, Expr, Symbol};

pub mod algebra;
pub mod config;

mod eval;
mod poly;
mod roots;

pub use algebra::Algebra;
pub use config::AlgebraConfig;

/// Failures of the symbolic backend.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum AlgebraError {
    #[error("cannot solve for {unknown}: {reason}")]
    Unsupported { unknown: String, reason: String },
    #[error("every value of {unknown} satisfies the equation")]
    Indeterminate { unknown: String },
    #[error("undefined value: {detail}")]
    Undefined { detail: String },
    #[error("variable {var} has no value")]
    Unbound { var: String },
}

/// Algebra needed by the solver engine.
///
/// Implementations must be pure: the same inputs always produce the same outputs.
pub trait Backend {
    /// Replaces every bound variable by its value.
    fn substitute(&self, expr: &Expr, bindings: &Bindings) -> Expr;

    /// All values of `unknown` for which `lhs = rhs` holds.
    ///
    /// The order of the returned candidates is the order in which the engine creates branches.
    fn solve_for(&self, lhs: &Expr, rhs: &Expr, unknown: &Symbol)
        -> Result<Vec<Expr>, AlgebraError>;

    /// Whether no unknown is left in the expression.
    fn is_fully_determined(&self, expr: &Expr) -> bool;

    /// Approximate decimal value, possibly complex.
    fn evaluate_decimal(&self, expr: &Expr) -> Result<Expr, AlgebraError>;

    /// Whether two fully determined expressions are equal.
    fn equality_holds(&self, a: &Expr, b: &Expr) -> Result<bool, AlgebraError>;
}
