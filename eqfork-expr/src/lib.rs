//! Expression and equation data types used by the eqfork equation solver.
use std::collections::BTreeMap;

pub mod equation;
pub mod expr;
pub mod number;
pub mod symbol;

#[cfg(any(test, feature = "internal-testing"))]
pub mod test;

pub use equation::Equation;
pub use expr::{Expr, Func, Node};
pub use number::Number;
pub use symbol::Symbol;

/// Known values of variables, substituted into expressions.
pub type Bindings = BTreeMap<Symbol, Expr>;
