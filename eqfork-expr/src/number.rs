//! Exact and approximate numbers.
use std::fmt;

use num_complex::Complex64;
use num_rational::Rational64;
use num_traits::{CheckedAdd, CheckedMul, One, Signed, ToPrimitive, Zero};

/// Largest absolute integer exponent evaluated exactly.
const MAX_EXACT_EXPONENT: i64 = 256;

/// Relative size below which the sum of two approximate values is rounded to zero.
const CANCELLATION: f64 = 1e-12;

/// A numeric constant.
///
/// Numbers stay exact as long as all operands are exact and no intermediate result overflows the
/// backing 64-bit rational. Everything else is represented as an approximate complex value.
#[derive(Copy, Clone, PartialEq, Debug)]
pub enum Number {
    Exact(Rational64),
    Approx(Complex64),
}

impl Number {
    pub fn zero() -> Number {
        Number::Exact(Rational64::zero())
    }

    pub fn one() -> Number {
        Number::Exact(Rational64::one())
    }

    /// An exact integer.
    pub fn integer(value: i64) -> Number {
        Number::Exact(Rational64::from_integer(value))
    }

    /// An exact fraction.
    ///
    /// Returns `None` for a zero denominator.
    pub fn fraction(numer: i64, denom: i64) -> Option<Number> {
        if denom == 0 {
            None
        } else {
            Some(Number::Exact(Rational64::new(numer, denom)))
        }
    }

    pub fn is_exact(&self) -> bool {
        match self {
            Number::Exact(_) => true,
            Number::Approx(_) => false,
        }
    }

    pub fn is_zero(&self) -> bool {
        match self {
            Number::Exact(value) => value.is_zero(),
            Number::Approx(value) => value.is_zero(),
        }
    }

    pub fn is_one(&self) -> bool {
        match self {
            Number::Exact(value) => value.is_one(),
            Number::Approx(value) => value.is_one(),
        }
    }

    /// Whether this is a real number below zero.
    pub fn is_negative(&self) -> bool {
        match self {
            Number::Exact(value) => value.is_negative(),
            Number::Approx(value) => value.im == 0.0 && value.re < 0.0,
        }
    }

    /// The exact value, if this is exact.
    pub fn as_rational(&self) -> Option<Rational64> {
        match *self {
            Number::Exact(value) => Some(value),
            Number::Approx(_) => None,
        }
    }

    /// The exact integer value, if this is an exact integer.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Number::Exact(value) if value.is_integer() => Some(value.to_integer()),
            _ => None,
        }
    }

    /// Complex approximation of this number.
    pub fn to_complex(&self) -> Complex64 {
        match self {
            Number::Exact(value) => Complex64::new(rational_to_f64(value), 0.0),
            Number::Approx(value) => *value,
        }
    }

    /// Approximate version of this number.
    pub fn to_approx(&self) -> Number {
        Number::Approx(self.to_complex())
    }

    pub fn add(self, other: Number) -> Number {
        match (self, other) {
            (Number::Exact(a), Number::Exact(b)) => match a.checked_add(&b) {
                Some(sum) => Number::Exact(sum),
                None => approx_sum(self.to_complex(), other.to_complex()),
            },
            _ => approx_sum(self.to_complex(), other.to_complex()),
        }
    }

    pub fn mul(self, other: Number) -> Number {
        match (self, other) {
            (Number::Exact(a), Number::Exact(b)) => match a.checked_mul(&b) {
                Some(product) => Number::Exact(product),
                None => Number::Approx(self.to_complex() * other.to_complex()),
            },
            _ => Number::Approx(self.to_complex() * other.to_complex()),
        }
    }

    pub fn neg(self) -> Number {
        match self {
            Number::Exact(value) if value.numer() != &i64::min_value() => Number::Exact(-value),
            _ => Number::Approx(-self.to_complex()),
        }
    }

    /// Multiplicative inverse, `None` for zero.
    pub fn recip(self) -> Option<Number> {
        if self.is_zero() {
            return None;
        }
        Some(match self {
            Number::Exact(value) if value.numer() != &i64::min_value() => {
                Number::Exact(value.recip())
            }
            _ => Number::Approx(self.to_complex().inv()),
        })
    }

    /// Integer power, `None` when raising zero to a negative power.
    pub fn powi(self, exponent: i64) -> Option<Number> {
        if exponent < 0 {
            return self.recip()?.powi(-exponent);
        }
        if let Number::Exact(base) = self {
            if exponent <= MAX_EXACT_EXPONENT {
                let mut result = Rational64::one();
                let mut exact = true;
                for _ in 0..exponent {
                    match result.checked_mul(&base) {
                        Some(next) => result = next,
                        None => {
                            exact = false;
                            break;
                        }
                    }
                }
                if exact {
                    return Some(Number::Exact(result));
                }
            }
        }
        let value = self.to_complex();
        Some(match exponent.to_i32() {
            Some(exponent) => Number::Approx(value.powi(exponent)),
            None => Number::Approx(value.powf(exponent as f64)),
        })
    }

    /// Exact square root of a non-negative perfect square rational.
    pub fn exact_sqrt(self) -> Option<Number> {
        let value = self.as_rational()?;
        if value.is_negative() {
            return None;
        }
        let numer = integer_sqrt(*value.numer())?;
        let denom = integer_sqrt(*value.denom())?;
        Some(Number::Exact(Rational64::new(numer, denom)))
    }

    /// Complex power with an arbitrary exponent.
    pub fn powc(self, exponent: Number) -> Number {
        if let Some(exponent) = exponent.as_integer() {
            if let Some(result) = self.powi(exponent) {
                return result;
            }
        }
        Number::Approx(self.to_complex().powc(exponent.to_complex()))
    }

    /// Whether both parts of the approximation are finite.
    pub fn is_finite(&self) -> bool {
        match self {
            Number::Exact(_) => true,
            Number::Approx(value) => value.is_finite(),
        }
    }
}

/// Adds two approximations, treating cancellation down to rounding noise as an exact zero.
fn approx_sum(a: Complex64, b: Complex64) -> Number {
    let cancel = |x: f64, y: f64| {
        let sum = x + y;
        if sum.abs() <= CANCELLATION * x.abs().max(y.abs()) {
            0.0
        } else {
            sum
        }
    };
    Number::Approx(Complex64::new(cancel(a.re, b.re), cancel(a.im, b.im)))
}

fn rational_to_f64(value: &Rational64) -> f64 {
    value.to_f64().unwrap_or(f64::NAN)
}

/// Square root of a perfect square.
fn integer_sqrt(value: i64) -> Option<i64> {
    if value < 0 {
        return None;
    }
    let guess = (value as f64).sqrt().round() as i64;
    for candidate in guess.saturating_sub(1)..=guess.saturating_add(1) {
        if candidate >= 0 && candidate.checked_mul(candidate) == Some(value) {
            return Some(candidate);
        }
    }
    None
}

impl From<i64> for Number {
    fn from(value: i64) -> Number {
        Number::integer(value)
    }
}

impl From<i32> for Number {
    fn from(value: i32) -> Number {
        Number::integer(value as i64)
    }
}

impl From<f64> for Number {
    fn from(value: f64) -> Number {
        Number::Approx(Complex64::new(value, 0.0))
    }
}

impl From<Complex64> for Number {
    fn from(value: Complex64) -> Number {
        Number::Approx(value)
    }
}

impl From<Rational64> for Number {
    fn from(value: Rational64) -> Number {
        Number::Exact(value)
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Number::Exact(value) => write!(f, "{}", value),
            Number::Approx(value) if value.im == 0.0 => write!(f, "{}", value.re),
            Number::Approx(value) if value.re == 0.0 => write!(f, "{}i", value.im),
            Number::Approx(value) if value.im < 0.0 => {
                write!(f, "{} - {}i", value.re, -value.im)
            }
            Number::Approx(value) => write!(f, "{} + {}i", value.re, value.im),
        }
    }
}
