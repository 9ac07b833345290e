//! Rational functions in a single unknown.
use eqfork_expr::{Expr, Node, Symbol};

use crate::AlgebraError;

/// Polynomials of higher degree are not solved.
const MAX_DEGREE: usize = 64;

/// Polynomial in a single unknown, coefficients ordered by increasing degree.
///
/// Coefficients are arbitrary expressions not containing the unknown. The coefficient vector is
/// never empty and has no structurally zero leading coefficient, except for the zero polynomial.
#[derive(Clone, PartialEq, Debug)]
pub struct Poly(pub Vec<Expr>);

impl Poly {
    pub fn constant(value: Expr) -> Poly {
        Poly(vec![value])
    }

    pub fn unknown() -> Poly {
        Poly(vec![Expr::zero(), Expr::one()])
    }

    pub fn degree(&self) -> usize {
        self.0.len() - 1
    }

    pub fn is_one(&self) -> bool {
        self.0.len() == 1 && self.0[0] == Expr::one()
    }

    fn trimmed(mut self) -> Poly {
        while self.0.len() > 1 && self.0.last().map_or(false, is_zero) {
            self.0.pop();
        }
        self
    }

    pub fn add(&self, other: &Poly) -> Poly {
        let len = self.0.len().max(other.0.len());
        let coefficients = (0..len)
            .map(|i| match (self.0.get(i), other.0.get(i)) {
                (Some(a), Some(b)) => a + b,
                (Some(a), None) | (None, Some(a)) => a.clone(),
                (None, None) => Expr::zero(),
            })
            .collect();
        Poly(coefficients).trimmed()
    }

    pub fn mul(&self, other: &Poly) -> Poly {
        if self.is_one() {
            return other.clone();
        }
        if other.is_one() {
            return self.clone();
        }
        let mut terms: Vec<Vec<Expr>> = vec![vec![]; self.0.len() + other.0.len() - 1];
        for (i, a) in self.0.iter().enumerate() {
            for (j, b) in other.0.iter().enumerate() {
                terms[i + j].push(a * b);
            }
        }
        Poly(terms.into_iter().map(Expr::sum).collect()).trimmed()
    }

    pub fn pow(&self, exponent: usize) -> Poly {
        let mut result = Poly::constant(Expr::one());
        for _ in 0..exponent {
            result = result.mul(self);
        }
        result
    }

    /// Value of the polynomial at `x`.
    pub fn eval_at(&self, x: &Expr) -> Expr {
        let mut result = Expr::zero();
        for coefficient in self.0.iter().rev() {
            result = result * x.clone() + coefficient.clone();
        }
        result
    }
}

fn is_zero(expr: &Expr) -> bool {
    expr.as_number().map_or(false, |value| value.is_zero())
}

/// The quotient `num / den` of two polynomials.
#[derive(Clone, PartialEq, Debug)]
pub struct RationalFn {
    pub num: Poly,
    pub den: Poly,
}

impl RationalFn {
    fn constant(value: Expr) -> RationalFn {
        RationalFn {
            num: Poly::constant(value),
            den: Poly::constant(Expr::one()),
        }
    }

    fn add(&self, other: &RationalFn) -> RationalFn {
        if self.den == other.den {
            RationalFn {
                num: self.num.add(&other.num),
                den: self.den.clone(),
            }
        } else {
            RationalFn {
                num: self.num.mul(&other.den).add(&other.num.mul(&self.den)),
                den: self.den.mul(&other.den),
            }
        }
    }

    fn mul(&self, other: &RationalFn) -> RationalFn {
        RationalFn {
            num: self.num.mul(&other.num),
            den: self.den.mul(&other.den),
        }
    }

    fn degree(&self) -> usize {
        self.num.degree().max(self.den.degree())
    }
}

/// Rewrites `expr` as a rational function in `unknown`.
pub fn decompose(expr: &Expr, unknown: &Symbol) -> Result<RationalFn, AlgebraError> {
    if !expr.contains_var(unknown.as_str()) {
        return Ok(RationalFn::constant(expr.clone()));
    }

    let unsupported = |reason: &str| AlgebraError::Unsupported {
        unknown: unknown.to_string(),
        reason: reason.to_owned(),
    };

    let result = match expr.node() {
        Node::Var(_) => RationalFn {
            num: Poly::unknown(),
            den: Poly::constant(Expr::one()),
        },
        Node::Add(terms) => {
            let mut result = RationalFn::constant(Expr::zero());
            for term in terms.iter() {
                result = result.add(&decompose(term, unknown)?);
                check_degree(&result, unknown)?;
            }
            result
        }
        Node::Mul(factors) => {
            let mut result = RationalFn::constant(Expr::one());
            for factor in factors.iter() {
                result = result.mul(&decompose(factor, unknown)?);
                check_degree(&result, unknown)?;
            }
            result
        }
        Node::Pow(base, exponent) => {
            let exponent = exponent
                .as_number()
                .and_then(|value| value.as_integer())
                .ok_or_else(|| unsupported("unknown raised to a non-integer power"))?;
            let base = decompose(base, unknown)?;
            let power = exponent.unsigned_abs() as usize;
            if base.degree().saturating_mul(power) > MAX_DEGREE {
                return Err(unsupported("polynomial degree too large"));
            }
            if exponent >= 0 {
                RationalFn {
                    num: base.num.pow(power),
                    den: base.den.pow(power),
                }
            } else {
                RationalFn {
                    num: base.den.pow(power),
                    den: base.num.pow(power),
                }
            }
        }
        Node::Call(func, _) => {
            return Err(unsupported(&format!("unknown inside {}", func.name())));
        }
        Node::Num(_) | Node::Unit(_) => RationalFn::constant(expr.clone()),
    };
    Ok(result)
}

fn check_degree(rational: &RationalFn, unknown: &Symbol) -> Result<(), AlgebraError> {
    if rational.degree() > MAX_DEGREE {
        Err(AlgebraError::Unsupported {
            unknown: unknown.to_string(),
            reason: "polynomial degree too large".to_owned(),
        })
    } else {
        Ok(())
    }
}
