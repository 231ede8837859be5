//! Real root finders for quadratic, cubic and quartic polynomials.
//!
//! Every solver returns its real roots in ascending order and handles vanishing
//! leading coefficients by exact case analysis, so the quartic degrades to the
//! cubic, the cubic to the quadratic and the quadratic to a linear equation.
//! Subtractions that can lose all significant digits go through
//! [`add_with_cancellation_check`](crate::math::add_with_cancellation_check),
//! which snaps near-cancelling sums to exactly zero.

mod cubic;
mod quadratic;
mod quartic;

pub use cubic::solve_cubic;
pub use quadratic::solve_quadratic;
pub use quartic::solve_quartic;

/// Evaluate a polynomial with coefficients ordered from highest degree down.
#[cfg(test)]
pub(crate) fn evaluate(coefficients: &[f64], x: f64) -> f64 {
    coefficients.iter().fold(0.0, |acc, c| acc * x + c)
}

#[cfg(test)]
pub(crate) fn assert_ascending(roots: &[f64]) {
    for pair in roots.windows(2) {
        assert!(pair[0] <= pair[1], "roots not ascending: {roots:?}");
    }
}
