use super::solve_quadratic;

/// Real roots of `a·x³ + b·x² + c·x + d`, in ascending order.
///
/// Falls back to [`solve_quadratic`] when `a == 0`. Repeated roots are
/// reported with their multiplicity where the case analysis can see it.
pub fn solve_cubic(a: f64, b: f64, c: f64, d: f64) -> Vec<f64> {
    if a == 0.0 {
        return solve_quadratic(b, c, d);
    }

    if b == 0.0 {
        if c == 0.0 {
            if d == 0.0 {
                // a·x³ = 0.
                return vec![0.0, 0.0, 0.0];
            }
            // a·x³ + d = 0.
            let root = (-d / a).cbrt();
            return vec![root, root, root];
        } else if d == 0.0 {
            // x·(a·x² + c) = 0.
            let roots = solve_quadratic(a, 0.0, c);
            if roots.is_empty() {
                return vec![0.0];
            }
            return vec![roots[0], 0.0, roots[1]];
        }
        return solve_general(a, 0.0, c, d);
    } else if c == 0.0 {
        if d == 0.0 {
            // x²·(a·x + b) = 0.
            let ratio = -b / a;
            if ratio < 0.0 {
                return vec![ratio, 0.0, 0.0];
            }
            return vec![0.0, 0.0, ratio];
        }
        return solve_general(a, b, 0.0, d);
    } else if d == 0.0 {
        // x·(a·x² + b·x + c) = 0.
        let roots = solve_quadratic(a, b, c);
        return match roots.as_slice() {
            [] => vec![0.0],
            &[r0, r1] if r1 <= 0.0 => vec![r0, r1, 0.0],
            &[r0, r1] if r0 >= 0.0 => vec![0.0, r0, r1],
            &[r0, r1] => vec![r0, 0.0, r1],
            // The quadratic has a non-zero leading term, so it yields 0 or 2 roots.
            _ => vec![0.0],
        };
    }

    solve_general(a, b, c, d)
}

/// Blinn's discriminant-based cubic solver.
///
/// See Jim Blinn, "How to Solve a Cubic Equation", parts 1-5.
fn solve_general(a: f64, b: f64, c: f64, d: f64) -> Vec<f64> {
    let cap_a = a;
    let cap_b = b / 3.0;
    let cap_c = c / 3.0;
    let cap_d = d;

    let ac = cap_a * cap_c;
    let bd = cap_b * cap_d;
    let b2 = cap_b * cap_b;
    let c2 = cap_c * cap_c;
    let delta1 = cap_a * cap_c - b2;
    let delta2 = cap_a * cap_d - cap_b * cap_c;
    let delta3 = cap_b * cap_d - c2;

    let discriminant = 4.0 * delta1 * delta3 - delta2 * delta2;

    if discriminant < 0.0 {
        // One real root. Pick the better-conditioned of the two depressions.
        let (a_bar, c_bar, d_bar) = if b2 * bd >= ac * c2 {
            (cap_a, delta1, -2.0 * cap_b * delta1 + cap_a * delta2)
        } else {
            (cap_d, delta3, -cap_d * delta2 + 2.0 * cap_c * delta3)
        };

        let s = if d_bar < 0.0 { -1.0 } else { 1.0 };
        let temp0 = -s * a_bar.abs() * (-discriminant).sqrt();
        let temp1 = -d_bar + temp0;

        let x = temp1 / 2.0;
        let p = if x < 0.0 { -(-x).cbrt() } else { x.cbrt() };
        let q = if temp1 == temp0 { -p } else { -c_bar / p };

        let temp = if c_bar <= 0.0 {
            p + q
        } else {
            -d_bar / (p * p + q * q + c_bar)
        };

        if b2 * bd >= ac * c2 {
            return vec![(temp - cap_b) / cap_a];
        }
        return vec![-cap_d / (temp + cap_c)];
    }

    // Three real roots.
    let c_bar_a = delta1;
    let d_bar_a = -2.0 * cap_b * delta1 + cap_a * delta2;

    let c_bar_d = delta3;
    let d_bar_d = -cap_d * delta2 + 2.0 * cap_c * delta3;

    let square_root_of_discriminant = discriminant.sqrt();
    let half_square_root_of_3 = 3.0_f64.sqrt() / 2.0;

    let theta = (cap_a * square_root_of_discriminant)
        .atan2(-d_bar_a)
        .abs()
        / 3.0;
    let temp = 2.0 * (-c_bar_a).sqrt();
    let cos_theta = theta.cos();
    let temp1 = temp * cos_theta;
    let temp3 = temp * (-cos_theta / 2.0 - half_square_root_of_3 * theta.sin());

    let numerator_large = if temp1 + temp3 > 2.0 * cap_b {
        temp1 - cap_b
    } else {
        temp3 - cap_b
    };
    let denominator_large = cap_a;
    let root1 = numerator_large / denominator_large;

    let theta = (cap_d * square_root_of_discriminant)
        .atan2(-d_bar_d)
        .abs()
        / 3.0;
    let temp = 2.0 * (-c_bar_d).sqrt();
    let cos_theta = theta.cos();
    let temp1 = temp * cos_theta;
    let temp3 = temp * (-cos_theta / 2.0 - half_square_root_of_3 * theta.sin());

    let numerator_small = -cap_d;
    let denominator_small = if temp1 + temp3 < 2.0 * cap_c {
        temp1 + cap_c
    } else {
        temp3 + cap_c
    };
    let root3 = numerator_small / denominator_small;

    let e = denominator_large * denominator_small;
    let f = -numerator_large * denominator_small - denominator_large * numerator_small;
    let g = numerator_large * numerator_small;

    let root2 = (cap_c * f - cap_b * g) / (-cap_b * f + cap_c * e);

    let mut roots = vec![root1, root2, root3];
    roots.sort_by(f64::total_cmp);
    roots
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::polynomial::{assert_ascending, evaluate};

    fn assert_roots(roots: &[f64], expected: &[f64]) {
        assert_eq!(roots.len(), expected.len(), "{roots:?} vs {expected:?}");
        for (root, want) in roots.iter().zip(expected) {
            assert!((root - want).abs() < 1e-9, "{roots:?} vs {expected:?}");
        }
    }

    #[test]
    fn test_three_distinct_roots() {
        // (x - 1)(x - 2)(x - 3)
        let roots = solve_cubic(1.0, -6.0, 11.0, -6.0);
        assert_roots(&roots, &[1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_single_real_root() {
        // (x - 2)(x² + 1)
        let roots = solve_cubic(1.0, -2.0, 1.0, -2.0);
        assert_roots(&roots, &[2.0]);
    }

    #[test]
    fn test_degenerate_cases() {
        assert_roots(&solve_cubic(0.0, 1.0, -3.0, 2.0), &[1.0, 2.0]);
        assert_roots(&solve_cubic(2.0, 0.0, 0.0, 0.0), &[0.0, 0.0, 0.0]);
        assert_roots(&solve_cubic(1.0, 0.0, 0.0, -8.0), &[2.0, 2.0, 2.0]);
        assert_roots(&solve_cubic(1.0, 0.0, -4.0, 0.0), &[-2.0, 0.0, 2.0]);
        assert_roots(&solve_cubic(1.0, -3.0, 0.0, 0.0), &[0.0, 0.0, 3.0]);
        assert_roots(&solve_cubic(1.0, 3.0, 0.0, 0.0), &[-3.0, 0.0, 0.0]);
        assert_roots(&solve_cubic(1.0, 1.0, -2.0, 0.0), &[-2.0, 0.0, 1.0]);
        assert_roots(&solve_cubic(1.0, -3.0, 2.0, 0.0), &[0.0, 1.0, 2.0]);
        // x·(-x² + x + 2) with a negative leading term.
        assert_roots(&solve_cubic(-1.0, 1.0, 2.0, 0.0), &[-1.0, 0.0, 2.0]);
    }

    #[test]
    fn test_zero_root_without_real_quadratic_factor() {
        // x·(x² + 1) has only the root at zero.
        assert_roots(&solve_cubic(1.0, 0.0, 1.0, 0.0), &[0.0]);
        assert_roots(&solve_cubic(1.0, 1.0, 1.0, 0.0), &[0.0]);
    }

    #[test]
    fn test_residuals_for_mixed_scales() {
        let cases = [
            [1.0, -0.5, -14.0, 24.0],
            [3.0, 7.0, -2.0, -1.0],
            [-2.0, 5.0, 11.0, -4.0],
            [0.1, 2.0, -1.0, 0.25],
        ];
        for coefficients in cases {
            let [a, b, c, d] = coefficients;
            let roots = solve_cubic(a, b, c, d);
            assert!(!roots.is_empty());
            assert_ascending(&roots);
            for root in roots {
                let residual = evaluate(&coefficients, root);
                assert!(residual.abs() < 1e-6, "{coefficients:?} root {root} residual {residual}");
            }
        }
    }
}
