//! Numeric evaluation of fully determined expressions.
use num_complex::Complex64;
use num_traits::Zero;

use eqfork_expr::{Expr, Func, Node, Symbol};

use crate::AlgebraError;

/// Numeric value of an expression.
#[derive(Copy, Clone, Debug)]
pub struct Numeric {
    pub value: Complex64,
    /// Largest magnitude of any subexpression.
    ///
    /// Cancellation inside the expression makes the value small compared to the scale, which is
    /// what zero tests and comparisons are relative to.
    pub scale: f64,
}

impl Numeric {
    pub fn is_zero(&self, tolerance: f64) -> bool {
        self.value.norm() <= tolerance * self.scale
    }
}

/// Evaluates an expression, looking up unit atoms using `unit_value`.
pub fn evaluate<F>(expr: &Expr, unit_value: &mut F) -> Result<Numeric, AlgebraError>
where
    F: FnMut(&Symbol) -> Result<Complex64, AlgebraError>,
{
    let mut scale = 0.0;
    let value = evaluate_node(expr, unit_value, &mut scale)?;
    Ok(Numeric { value, scale })
}

fn evaluate_node<F>(expr: &Expr, unit_value: &mut F, scale: &mut f64) -> Result<Complex64, AlgebraError>
where
    F: FnMut(&Symbol) -> Result<Complex64, AlgebraError>,
{
    let value = match expr.node() {
        Node::Num(value) => value.to_complex(),
        Node::Var(var) => return Err(AlgebraError::Unbound { var: var.to_string() }),
        Node::Unit(unit) => unit_value(unit)?,
        Node::Add(terms) => {
            let mut sum = Complex64::zero();
            for term in terms.iter() {
                sum += evaluate_node(term, unit_value, scale)?;
            }
            sum
        }
        Node::Mul(factors) => {
            let mut product = Complex64::new(1.0, 0.0);
            for factor in factors.iter() {
                product *= evaluate_node(factor, unit_value, scale)?;
            }
            product
        }
        Node::Pow(base, exponent) => {
            let base = evaluate_node(base, unit_value, scale)?;
            let exponent = evaluate_node(exponent, unit_value, scale)?;
            power(base, exponent).ok_or_else(|| undefined(expr))?
        }
        Node::Call(func, arg) => {
            let arg = evaluate_node(arg, unit_value, scale)?;
            if *func == Func::Ln && arg.is_zero() {
                return Err(undefined(expr));
            }
            func.apply(arg)
        }
    };

    if !value.is_finite() {
        return Err(undefined(expr));
    }
    *scale = scale.max(value.norm());
    Ok(value)
}

fn power(base: Complex64, exponent: Complex64) -> Option<Complex64> {
    if base.is_zero() {
        return if exponent.re > 0.0 {
            Some(Complex64::zero())
        } else {
            None
        };
    }
    if exponent.im == 0.0 && exponent.re.fract() == 0.0 && exponent.re.abs() <= i32::MAX as f64 {
        Some(base.powi(exponent.re as i32))
    } else {
        Some(base.powc(exponent))
    }
}

fn undefined(expr: &Expr) -> AlgebraError {
    AlgebraError::Undefined {
        detail: expr.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_units(unit: &Symbol) -> Result<Complex64, AlgebraError> {
        Err(AlgebraError::Unbound { var: unit.to_string() })
    }

    #[test]
    fn scale_tracks_cancellation() {
        let x = Expr::var("x");
        let expr = Expr::sum(vec![x.clone(), Expr::from(-100.0)]);
        let bound = expr.map_atoms(&mut |atom| atom.as_var().map(|_| Expr::unit("u")));
        let result = evaluate(&bound, &mut |_: &Symbol| Ok(Complex64::new(100.0, 0.0))).unwrap();
        assert!(result.is_zero(1e-10));
        assert!(result.scale >= 100.0);
    }

    #[test]
    fn undefined_values() {
        let expr = Expr::unit("u") / Expr::zero();
        let result = evaluate(&expr, &mut |_: &Symbol| Ok(Complex64::new(1.0, 0.0)));
        assert!(matches!(result, Err(AlgebraError::Undefined { .. })));

        let expr = (Expr::unit("u") - Expr::unit("u") * 1.0).ln();
        let result = evaluate(&expr, &mut |_: &Symbol| Ok(Complex64::new(1.0, 0.0)));
        assert!(result.is_err());
    }

    #[test]
    fn unbound_variables() {
        let result = evaluate(&(Expr::var("x") + 1), &mut no_units);
        assert_eq!(
            result.unwrap_err(),
            AlgebraError::Unbound {
                var: "x".to_owned()
            }
        );
    }
}
