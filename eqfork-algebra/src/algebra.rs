//! The bundled symbolic backend.
use std::collections::BTreeMap;
use std::hash::{Hash, Hasher};

use log::trace;
use num_complex::Complex64;
use rand::{rngs::StdRng, Rng, SeedableRng};
use rustc_hash::FxHasher;

use eqfork_expr::{Bindings, Expr, Symbol};

use crate::eval::{evaluate, Numeric};
use crate::poly::{decompose, Poly};
use crate::roots::polynomial_roots;
use crate::{AlgebraConfig, AlgebraError, Backend};

/// Number of independent unit samplings an expression containing units is compared under.
const UNIT_SAMPLES: u64 = 2;

/// Derived units may refer to other derived units up to this depth.
const MAX_UNIT_DEPTH: usize = 32;

/// Polynomial algebra over exact and approximate complex numbers.
///
/// Equations are solved for a single unknown after rewriting them as a rational function in that
/// unknown. Polynomials up to degree two are solved symbolically, higher degrees numerically.
///
/// Units are opaque atoms. To compare expressions containing units, every unit is replaced by a
/// random value close to one, using two independent samplings. Units can be defined in terms of
/// other units using [`define_unit`](Algebra::define_unit).
#[derive(Default)]
pub struct Algebra {
    config: AlgebraConfig,
    derived_units: BTreeMap<Symbol, Expr>,
}

impl Algebra {
    pub fn new(config: AlgebraConfig) -> Algebra {
        Algebra {
            config,
            derived_units: BTreeMap::new(),
        }
    }

    pub fn config(&self) -> &AlgebraConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: AlgebraConfig) {
        self.config = config;
    }

    /// Defines the unit `name` as `value`, e.g. `cm` as `m / 100`.
    pub fn define_unit(&mut self, name: &str, value: Expr) {
        self.derived_units.insert(Symbol::new(name), value);
    }

    /// Value of a base unit under the given sampling.
    fn sample_unit(&self, sample: u64, unit: &Symbol) -> f64 {
        let range = self.config.unit_sample_range;
        if !(range > 0.0) {
            return 1.0;
        }
        let mut hasher = FxHasher::default();
        unit.as_str().hash(&mut hasher);
        let seed = self.config.unit_sample_seed
            ^ hasher.finish()
            ^ sample.wrapping_mul(0x9e37_79b9_7f4a_7c15);
        let mut rng = StdRng::seed_from_u64(seed);
        rng.gen_range(1.0 - range, 1.0 + range)
    }

    fn unit_value(&self, sample: u64, unit: &Symbol, depth: usize) -> Result<Complex64, AlgebraError> {
        match self.derived_units.get(unit) {
            None => Ok(Complex64::new(self.sample_unit(sample, unit), 0.0)),
            Some(_) if depth >= MAX_UNIT_DEPTH => Err(AlgebraError::Undefined {
                detail: format!("unit {} is defined recursively", unit),
            }),
            Some(definition) => Ok(evaluate(definition, &mut |inner: &Symbol| {
                self.unit_value(sample, inner, depth + 1)
            })?
            .value),
        }
    }

    fn numeric(&self, expr: &Expr, sample: u64) -> Result<Numeric, AlgebraError> {
        evaluate(expr, &mut |unit: &Symbol| self.unit_value(sample, unit, 0))
    }

    /// Samplings needed to decide equalities involving the given expressions.
    fn samples(exprs: &[&Expr]) -> u64 {
        if exprs.iter().all(|expr| expr.units().is_empty()) {
            1
        } else {
            UNIT_SAMPLES
        }
    }

    /// Whether a fully determined expression is zero.
    ///
    /// Expressions that still contain variables are only zero if they are structurally zero.
    fn vanishes(&self, expr: &Expr) -> Result<bool, AlgebraError> {
        if let Some(value) = expr.as_number() {
            return Ok(value.is_zero());
        }
        if !expr.is_constant() {
            return Ok(false);
        }
        for sample in 0..Algebra::samples(&[expr]) {
            if !self.numeric(expr, sample)?.is_zero(self.config.tolerance) {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Fails with `Undefined` if a fully determined expression has no value.
    fn check_defined(&self, expr: &Expr) -> Result<(), AlgebraError> {
        if expr.is_constant() {
            for sample in 0..Algebra::samples(&[expr]) {
                self.numeric(expr, sample)?;
            }
        }
        Ok(())
    }

    fn quadratic_roots(&self, c: &Expr, b: &Expr, a: &Expr) -> Result<Vec<Expr>, AlgebraError> {
        let discriminant = b.clone().powi(2) - 4 * a.clone() * c.clone();
        let two_a = 2 * a.clone();
        if self.vanishes(&discriminant)? {
            return Ok(vec![-b / two_a]);
        }
        let root = discriminant.sqrt();
        Ok(vec![(-b - root.clone()) / two_a.clone(), (-b + root) / two_a])
    }

    fn numeric_roots(
        &self,
        coefficients: &[Expr],
        unknown: &Symbol,
    ) -> Result<Vec<Expr>, AlgebraError> {
        let mut values = vec![];
        for coefficient in coefficients {
            if !coefficient.is_constant() || !coefficient.units().is_empty() {
                return Err(AlgebraError::Unsupported {
                    unknown: unknown.to_string(),
                    reason: "polynomial of degree three or more with symbolic coefficients"
                        .to_owned(),
                });
            }
            values.push(self.numeric(coefficient, 0)?.value);
        }

        let roots = polynomial_roots(
            &values,
            self.config.root_iterations,
            self.config.tolerance,
        );

        Ok(roots
            .into_iter()
            .map(|root| {
                if root.im == 0.0 {
                    Expr::from(root.re)
                } else {
                    Expr::from(root)
                }
            })
            .collect())
    }

    /// Drops roots that are undefined, make the denominator vanish or repeat an earlier root.
    fn filter_roots(&self, candidates: Vec<Expr>, den: &Poly) -> Result<Vec<Expr>, AlgebraError> {
        let mut accepted: Vec<Expr> = vec![];
        'candidates: for candidate in candidates {
            if candidate.is_constant() {
                match self.check_defined(&candidate) {
                    Err(AlgebraError::Undefined { .. }) => continue,
                    result => result?,
                }
                if !den.is_one() {
                    match self.vanishes(&den.eval_at(&candidate)) {
                        Ok(true) | Err(AlgebraError::Undefined { .. }) => continue,
                        result => {
                            result?;
                        }
                    }
                }
                for previous in accepted.iter() {
                    if previous.is_constant() && self.equality_holds(previous, &candidate)? {
                        continue 'candidates;
                    }
                }
            } else if accepted.contains(&candidate) {
                continue;
            }
            accepted.push(candidate);
        }
        Ok(accepted)
    }
}

impl Backend for Algebra {
    fn substitute(&self, expr: &Expr, bindings: &Bindings) -> Expr {
        expr.map_atoms(&mut |atom| atom.as_var().and_then(|var| bindings.get(var).cloned()))
    }

    fn solve_for(
        &self,
        lhs: &Expr,
        rhs: &Expr,
        unknown: &Symbol,
    ) -> Result<Vec<Expr>, AlgebraError> {
        let rational = decompose(&(lhs - rhs), unknown)?;
        let coefficients = &rational.num.0;

        let mut degree = rational.num.degree();
        while degree > 0 && self.vanishes(&coefficients[degree])? {
            degree -= 1;
        }

        let candidates = match degree {
            0 => {
                if self.vanishes(&coefficients[0])? {
                    return Err(AlgebraError::Indeterminate {
                        unknown: unknown.to_string(),
                    });
                }
                vec![]
            }
            1 => vec![-&coefficients[0] / coefficients[1].clone()],
            2 => self.quadratic_roots(&coefficients[0], &coefficients[1], &coefficients[2])?,
            _ => self.numeric_roots(&coefficients[..=degree], unknown)?,
        };

        let roots = self.filter_roots(candidates, &rational.den)?;
        trace!(
            "{} = {} solved for {}: {:?}",
            lhs,
            rhs,
            unknown,
            roots
        );
        Ok(roots)
    }

    fn is_fully_determined(&self, expr: &Expr) -> bool {
        expr.is_constant()
    }

    fn evaluate_decimal(&self, expr: &Expr) -> Result<Expr, AlgebraError> {
        self.check_defined(expr)?;
        Ok(expr.map_atoms(&mut |atom| atom.as_number().map(|value| Expr::num(value.to_approx()))))
    }

    fn equality_holds(&self, a: &Expr, b: &Expr) -> Result<bool, AlgebraError> {
        if let (Some(x), Some(y)) = (a.as_number(), b.as_number()) {
            if x.is_exact() && y.is_exact() {
                return Ok(x == y);
            }
        }
        for sample in 0..Algebra::samples(&[a, b]) {
            let x = self.numeric(a, sample)?;
            let y = self.numeric(b, sample)?;
            let scale = x.scale.max(y.scale);
            if (x.value - y.value).norm() > self.config.tolerance * scale {
                return Ok(false);
            }
        }
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use proptest::prelude::*;

    use eqfork_expr::{test::integer_root_quadratic, Number};

    fn x() -> Expr {
        Expr::var("x")
    }

    fn unknown() -> Symbol {
        Symbol::new("x")
    }

    fn approx(expr: &Expr) -> Complex64 {
        expr.as_number().unwrap().to_complex()
    }

    #[test]
    fn linear_exact() {
        let algebra = Algebra::default();
        let roots = algebra
            .solve_for(&(3 * x() + 1), &Expr::from(2), &unknown())
            .unwrap();
        assert_eq!(roots, vec![Expr::num(Number::fraction(1, 3).unwrap())]);
    }

    #[test]
    fn quadratic_order() {
        let algebra = Algebra::default();
        let roots = algebra
            .solve_for(&x().powi(2), &Expr::from(16), &unknown())
            .unwrap();
        assert_eq!(roots, vec![Expr::from(-4), Expr::from(4)]);

        let roots = algebra
            .solve_for(&x().powi(2), &Expr::from(2), &unknown())
            .unwrap();
        assert_eq!(roots.len(), 2);
        assert!(roots[0].as_number().is_none());
        let decimal = algebra.evaluate_decimal(&roots[0]).unwrap();
        assert!((approx(&decimal).re + 2f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn double_root() {
        let algebra = Algebra::default();
        let roots = algebra
            .solve_for(&(x().powi(2) - 6 * x() + 9), &Expr::zero(), &unknown())
            .unwrap();
        assert_eq!(roots, vec![Expr::from(3)]);
    }

    #[test]
    fn cubic_numeric() {
        let algebra = Algebra::default();
        let lhs = x().powi(3) + 2 * x().powi(2) + 4 * x() + 2;
        let roots = algebra
            .solve_for(&lhs, &Expr::zero(), &unknown())
            .unwrap();
        assert_eq!(roots.len(), 3);
        let real: Vec<f64> = roots
            .iter()
            .map(approx)
            .filter(|root| root.im == 0.0)
            .map(|root| root.re)
            .collect();
        assert_eq!(real.len(), 1);
        assert!((real[0] + 0.6389).abs() < 1e-4);
    }

    #[test]
    fn repeated_numeric_roots() {
        let algebra = Algebra::default();
        let cases = vec![
            ((x() - 1).powi(3), vec![1.0]),
            (x().powi(3), vec![0.0]),
            ((x() - 2).powi(2) * (x() + 1), vec![-1.0, 2.0]),
        ];
        for (lhs, expected) in cases {
            let roots = algebra.solve_for(&lhs, &Expr::zero(), &unknown()).unwrap();
            assert_eq!(roots.len(), expected.len(), "{}", lhs);
            for (root, &expected) in roots.iter().zip(expected.iter()) {
                assert!((approx(root) - Complex64::new(expected, 0.0)).norm() < 1e-12);

                let bindings: Bindings = vec![(unknown(), root.clone())].into_iter().collect();
                let substituted = algebra.substitute(&lhs, &bindings);
                assert!(
                    algebra.equality_holds(&substituted, &Expr::zero()).unwrap(),
                    "{} at {}",
                    lhs,
                    root
                );
            }
        }
    }

    #[test]
    fn denominator_roots_are_dropped() {
        let algebra = Algebra::default();
        let lhs = (x().powi(2) - 1) / (x() - 1);
        let roots = algebra.solve_for(&lhs, &Expr::zero(), &unknown()).unwrap();
        assert_eq!(roots, vec![Expr::from(-1)]);

        let lhs = x() / (x() - 1);
        let roots = algebra.solve_for(&lhs, &Expr::one(), &unknown()).unwrap();
        assert!(roots.is_empty());
    }

    #[test]
    fn unsolvable_forms() {
        let algebra = Algebra::default();
        assert!(matches!(
            algebra.solve_for(&x().sin(), &Expr::zero(), &unknown()),
            Err(AlgebraError::Unsupported { .. })
        ));
        assert!(matches!(
            algebra.solve_for(&(x() + 1), &(x() + 1), &unknown()),
            Err(AlgebraError::Indeterminate { .. })
        ));
    }

    #[test]
    fn symbolic_coefficients() {
        let algebra = Algebra::default();
        let a = Expr::var("a");
        let roots = algebra
            .solve_for(&(a.clone() * x()), &Expr::from(2), &unknown())
            .unwrap();
        assert_eq!(roots, vec![2 * a.powi(-1)]);
    }

    #[test]
    fn units_are_opaque() {
        let algebra = Algebra::default();
        let cm = Expr::unit("cm");
        let m = Expr::unit("m");
        assert!(algebra
            .equality_holds(&(50 * cm.clone()), &(5 * (10 * cm.clone())))
            .unwrap());
        assert!(!algebra
            .equality_holds(&(50 * cm.clone()), &(50 * m.clone()))
            .unwrap());

        let roots = algebra
            .solve_for(&(2 * x()), &(10 * cm.clone()), &unknown())
            .unwrap();
        assert_eq!(roots, vec![5 * cm]);
    }

    #[test]
    fn derived_units() {
        let mut algebra = Algebra::default();
        algebra.define_unit("cm", Expr::unit("m") / 100);
        assert!(algebra
            .equality_holds(&(150 * Expr::unit("cm")), &(1.5 * Expr::unit("m")))
            .unwrap());
        assert!(!algebra
            .equality_holds(&(150 * Expr::unit("cm")), &(150 * Expr::unit("m")))
            .unwrap());

        algebra.define_unit("loop", Expr::unit("loop") * 2);
        assert!(algebra
            .equality_holds(&Expr::unit("loop"), &Expr::unit("m"))
            .is_err());
    }

    #[test]
    fn decimal_keeps_units() {
        let algebra = Algebra::default();
        let expr = Expr::from(2).sqrt() * Expr::unit("cm");
        let decimal = algebra.evaluate_decimal(&expr).unwrap();
        assert_eq!(decimal.units().len(), 1);
        assert!(algebra.equality_holds(&decimal, &expr).unwrap());

        assert!(matches!(
            algebra.evaluate_decimal(&(Expr::one() / Expr::zero())),
            Err(AlgebraError::Undefined { .. })
        ));
    }

    #[test]
    fn tolerant_equality() {
        let algebra = Algebra::default();
        let t = (Expr::from(3.0) + Expr::from(1969.0).sqrt()) / 9.8;
        let x_f = Expr::from(100.0) + 3.0 * t.clone() - 4.9 * t.powi(2);
        assert!(algebra.equality_holds(&x_f, &Expr::zero()).unwrap());
        assert!(!algebra
            .equality_holds(&Expr::from(1e-3), &Expr::zero())
            .unwrap());
    }

    proptest! {
        #[test]
        fn quadratics_with_integer_roots((equation, low, high) in integer_root_quadratic()) {
            let algebra = Algebra::default();
            let mut roots = algebra.solve_for(&equation.lhs, &equation.rhs, &unknown()).unwrap();
            prop_assert_eq!(roots.len(), 2);
            roots.sort_by_key(|root| root.as_number().and_then(|n| n.as_integer()));
            prop_assert_eq!(roots, vec![Expr::from(low), Expr::from(high)]);
        }
    }
}
