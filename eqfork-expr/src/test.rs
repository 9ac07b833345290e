//! Strategies generating equation systems with known solutions.
use proptest::{prelude::*, *};

use rand::seq::SliceRandom;

use crate::equation::Equation;
use crate::expr::Expr;

/// A system of linear equations with a unique integer solution.
#[derive(Clone, Debug)]
pub struct LinearSystem {
    /// Variable names, `x0`, `x1`, ...
    pub names: Vec<String>,
    /// The solution, indexed like `names`.
    pub values: Vec<i64>,
    pub equations: Vec<Equation>,
}

/// Generate a triangular linear system in shuffled equation order.
///
/// Equation `i` relates variable `i` to the variables before it, so substituting one variable at
/// a time always solves the whole system.
pub fn linear_system(vars: impl Strategy<Value = usize>) -> impl Strategy<Value = LinearSystem> {
    vars.prop_flat_map(|vars| {
        let values = collection::vec(-20i64..=20, vars);
        let scales = collection::vec(prop_oneof![-5i64..=-1, 1i64..=5], vars);
        let coefficients = collection::vec(collection::vec(-3i64..=3, vars), vars);
        (values, scales, coefficients).prop_perturb(|(values, scales, coefficients), mut rng| {
            let names: Vec<String> = (0..values.len()).map(|i| format!("x{}", i)).collect();
            let mut equations = vec![];
            for i in 0..values.len() {
                let mut lhs = Expr::var(&names[i]) * scales[i];
                let mut total = values[i] * scales[i];
                for j in 0..i {
                    lhs = lhs + Expr::var(&names[j]) * coefficients[i][j];
                    total += values[j] * coefficients[i][j];
                }
                equations.push(Equation::new(lhs, total));
            }
            equations.shuffle(&mut rng);
            LinearSystem {
                names,
                values,
                equations,
            }
        })
    })
}

/// Generate `k*x^2 + b*x + c = 0` with two distinct integer roots.
///
/// Returns the equation in the variable `x` and the roots in increasing order.
pub fn integer_root_quadratic() -> impl Strategy<Value = (Equation, i64, i64)> {
    (-12i64..=12, 1i64..=12, prop_oneof![-4i64..=-1, 1i64..=4]).prop_map(|(low, gap, k)| {
        let high = low + gap;
        let x = Expr::var("x");
        let lhs = x.clone().powi(2) * k - x * (k * (low + high)) + k * low * high;
        (Equation::new(lhs, 0), low, high)
    })
}
