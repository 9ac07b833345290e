//! Numeric polynomial root finding.
use std::f64::consts::PI;

use num_complex::Complex64;
use num_traits::Zero;
use ordered_float::OrderedFloat;

/// Value and derivative of a polynomial at `z`, coefficients ordered by increasing degree.
fn eval_with_derivative(coefficients: &[Complex64], z: Complex64) -> (Complex64, Complex64) {
    let mut value = Complex64::zero();
    let mut derivative = Complex64::zero();
    for &coefficient in coefficients.iter().rev() {
        derivative = derivative * z + value;
        value = value * z + coefficient;
    }
    (value, derivative)
}

/// Newton steps used to polish a root.
const POLISH_STEPS: usize = 16;

/// Coefficients of the derivative, ordered by increasing degree.
fn derivative(coefficients: &[Complex64]) -> Vec<Complex64> {
    coefficients
        .iter()
        .enumerate()
        .skip(1)
        .map(|(power, &coefficient)| coefficient * power as f64)
        .collect()
}

/// Newton iteration starting at `z`, stopping once the residual no longer decreases.
fn polish(coefficients: &[Complex64], z: Complex64) -> Complex64 {
    let mut best = z;
    let (mut best_residual, _) = eval_with_derivative(coefficients, z);
    for _ in 0..POLISH_STEPS {
        let (value, slope) = eval_with_derivative(coefficients, best);
        if value.is_zero() || slope.is_zero() {
            break;
        }
        let next = best - value / slope;
        if !next.is_finite() {
            break;
        }
        let (residual, _) = eval_with_derivative(coefficients, next);
        if residual.norm() >= best_residual.norm() {
            break;
        }
        best = next;
        best_residual = residual;
    }
    best
}

/// Groups estimates that converged to the same multiple root.
///
/// Returns the mean of each group together with the group size. Estimates of a root of
/// multiplicity m spread by about the m-th root of the machine precision, so the grouping radius
/// grows with the degree.
fn clusters(estimates: &[Complex64], degree: usize, tolerance: f64) -> Vec<(Complex64, usize)> {
    let radius = tolerance
        .sqrt()
        .max(10.0 * f64::EPSILON.powf(1.0 / degree as f64));
    let mut groups: Vec<(Complex64, usize)> = vec![];
    for &estimate in estimates.iter() {
        let close = groups.iter_mut().find(|(sum, count)| {
            let center = sum / *count as f64;
            (center - estimate).norm() <= radius * center.norm().max(1.0)
        });
        match close {
            Some((sum, count)) => {
                *sum += estimate;
                *count += 1;
            }
            None => groups.push((estimate, 1)),
        }
    }
    groups
        .into_iter()
        .map(|(sum, count)| (sum / count as f64, count))
        .collect()
}

/// All distinct complex roots of a polynomial using the Aberth-Ehrlich method.
///
/// The leading coefficient must be nonzero. Multiple roots are returned once. Every root is
/// polished using Newton's method. Roots and imaginary parts that are negligible compared to the
/// coefficients are set to zero. The roots are sorted by real and then imaginary part.
pub fn polynomial_roots(
    coefficients: &[Complex64],
    iterations: usize,
    tolerance: f64,
) -> Vec<Complex64> {
    let degree = coefficients.len().saturating_sub(1);
    if degree == 0 {
        return vec![];
    }

    let leading = coefficients[degree];
    let monic: Vec<Complex64> = coefficients.iter().map(|&c| c / leading).collect();

    // Cauchy's bound on the magnitude of all roots
    let bound = 1.0
        + monic[..degree]
            .iter()
            .map(|c| c.norm())
            .fold(0.0, f64::max);
    let radius = bound * 0.5;

    let mut estimates: Vec<Complex64> = (0..degree)
        .map(|k| {
            let angle = 2.0 * PI * k as f64 / degree as f64 + 0.4;
            Complex64::from_polar(radius, angle)
        })
        .collect();

    for _ in 0..iterations {
        let mut largest_step: f64 = 0.0;
        for k in 0..degree {
            let z = estimates[k];
            let (value, slope) = eval_with_derivative(&monic, z);
            if value.is_zero() {
                continue;
            }
            let repulsion: Complex64 = estimates
                .iter()
                .enumerate()
                .filter(|&(j, _)| j != k)
                .map(|(_, &other)| (z - other).inv())
                .sum();
            let ratio = value / slope;
            let step = ratio / (Complex64::new(1.0, 0.0) - ratio * repulsion);
            if !step.is_finite() {
                continue;
            }
            estimates[k] = z - step;
            largest_step = largest_step.max(step.norm() / z.norm().max(1.0));
        }
        if largest_step <= f64::EPSILON {
            break;
        }
    }

    let mut roots: Vec<Complex64> = clusters(&estimates, degree, tolerance)
        .into_iter()
        .map(|(center, multiplicity)| {
            // A root of multiplicity m is a simple root of the (m-1)-th derivative.
            let mut polynomial = monic.clone();
            for _ in 1..multiplicity {
                polynomial = derivative(&polynomial);
            }
            polish(&polynomial, center)
        })
        .collect();

    for root in roots.iter_mut() {
        if root.norm() <= tolerance * bound {
            *root = Complex64::zero();
        }
        if root.im.abs() <= tolerance * root.norm().max(1.0) {
            root.im = 0.0;
        }
    }

    roots.sort_by_key(|root| (OrderedFloat(root.re), OrderedFloat(root.im)));
    roots
}
