//! Eqfork is a branching equation solver. Given a set of named unknowns, equations relating them
//! and optional auxiliary functions, it finds every consistent assignment of values to the
//! unknowns.
//!
//! Equations are applied one unknown at a time. When an equation has several roots, the solver
//! splits into independent branches, one per root. Branches that turn out inconsistent with some
//! equation are pruned.
//!
//! ```
//! use eqfork::{Definition, Equation, Solver};
//!
//! let mut def = Definition::new();
//! def.variables(&["x", "y"]);
//! def.equation("square", |s| Ok(Equation::new(s.var("x")?.powi(2), 16)));
//! def.equation("sum", |s| Ok(Equation::new(s.var("y")?, s.var("x")? + 1)));
//!
//! let mut solver = Solver::from_definition(def).unwrap();
//! solver.solve().unwrap();
//! assert_eq!(solver.branch_count(), 2);
//! ```

pub mod config;
pub mod model;
pub mod scope;
pub mod solver;

mod branch;
mod context;
mod pass;
mod schedule;
mod state;
mod variables;


pub use eqfork_algebra::{Algebra, AlgebraConfig, AlgebraError, Backend};
pub use eqfork_expr::{Bindings, Equation, Expr, Func, Number, Symbol};

pub use branch::BranchId;
pub use model::{Definition, Model};
pub use schedule::SolveStats;
pub use scope::Scope;
pub use solver::{Contradiction, ErrorKind, Solver, SolverError, Values};
