use crate::math::{EPSILON14, add_with_cancellation_check, sign};

/// Real roots of `a·x² + b·x + c`, in ascending order.
///
/// Returns an empty vector when there are no real roots, or when the
/// equation degenerates to a constant. A double root is reported twice.
pub fn solve_quadratic(a: f64, b: f64, c: f64) -> Vec<f64> {
    if a == 0.0 {
        if b == 0.0 {
            // Constant: either no roots or infinitely many.
            return Vec::new();
        }
        return vec![-c / b];
    }

    if b == 0.0 {
        if c == 0.0 {
            return vec![0.0, 0.0];
        }

        let c_magnitude = c.abs();
        let a_magnitude = a.abs();

        if c_magnitude < a_magnitude && c_magnitude / a_magnitude < EPSILON14 {
            // c is negligible next to a.
            return vec![0.0, 0.0];
        } else if c_magnitude > a_magnitude && a_magnitude / c_magnitude < EPSILON14 {
            // a is negligible next to c: no real roots.
            return Vec::new();
        }

        let ratio = -c / a;
        if ratio < 0.0 {
            return Vec::new();
        }
        let root = ratio.sqrt();
        return vec![-root, root];
    }

    if c == 0.0 {
        let ratio = -b / a;
        if ratio < 0.0 {
            return vec![ratio, 0.0];
        }
        return vec![0.0, ratio];
    }

    let b2 = b * b;
    let four_ac = 4.0 * a * c;
    let radicand = add_with_cancellation_check(b2, -four_ac, EPSILON14);
    if radicand < 0.0 {
        return Vec::new();
    }

    let q = -0.5 * add_with_cancellation_check(b, sign(b) * radicand.sqrt(), EPSILON14);
    let (r0, r1) = (q / a, c / q);
    if r0 <= r1 { vec![r0, r1] } else { vec![r1, r0] }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;
    use crate::polynomial::{assert_ascending, evaluate};

    #[test]
    fn test_linear_and_constant() {
        assert_eq!(solve_quadratic(0.0, 2.0, -4.0), vec![2.0]);
        assert!(solve_quadratic(0.0, 0.0, 3.0).is_empty());
    }

    #[test]
    fn test_double_root_at_zero() {
        assert_eq!(solve_quadratic(2.0, 0.0, 0.0), vec![0.0, 0.0]);
        assert_eq!(solve_quadratic(1.0, 0.0, 1e-16), vec![0.0, 0.0]);
    }

    #[test]
    fn test_pure_quadratic() {
        assert_eq!(solve_quadratic(1.0, 0.0, -9.0), vec![-3.0, 3.0]);
        assert!(solve_quadratic(1.0, 0.0, 9.0).is_empty());
        assert!(solve_quadratic(1e-16, 0.0, -1.0).is_empty());
    }

    #[test]
    fn test_zero_constant_term() {
        assert_eq!(solve_quadratic(1.0, 3.0, 0.0), vec![-3.0, 0.0]);
        assert_eq!(solve_quadratic(1.0, -3.0, 0.0), vec![0.0, 3.0]);
    }

    #[test]
    fn test_general_case() {
        let roots = solve_quadratic(2.0, -10.0, 12.0);
        assert_eq!(roots.len(), 2);
        assert!((roots[0] - 2.0).abs() < 1e-12);
        assert!((roots[1] - 3.0).abs() < 1e-12);

        // Negative discriminant.
        assert!(solve_quadratic(1.0, 1.0, 1.0).is_empty());
    }

    #[test]
    fn test_negative_leading_coefficient_stays_ascending() {
        let roots = solve_quadratic(-1.0, 1.0, 2.0);
        assert!((roots[0] + 1.0).abs() < 1e-12);
        assert!((roots[1] - 2.0).abs() < 1e-12);

        let roots = solve_quadratic(-14.63, -5.49, 49.41);
        assert_eq!(roots.len(), 2);
        assert!(roots[0] < roots[1]);
        assert!(roots[0] < -2.0 && roots[1] > 1.6);
    }

    #[test]
    fn test_tiny_root_keeps_precision() {
        // x² - 1e8·x + 1 has a root near 1e-8 that the naive formula loses.
        let roots = solve_quadratic(1.0, -1e8, 1.0);
        assert!((roots[0] - 1e-8).abs() < 1e-20);
        assert!((roots[1] - 1e8).abs() < 1e-4);
    }

    proptest! {
        #[test]
        fn roots_are_ascending_and_satisfy_equation(
            a in -100.0f64..100.0,
            b in -100.0f64..100.0,
            c in -100.0f64..100.0,
        ) {
            prop_assume!(a.abs() > 1e-3);
            let roots = solve_quadratic(a, b, c);
            assert_ascending(&roots);
            let scale = a.abs().max(b.abs()).max(c.abs());
            for root in roots {
                let residual = evaluate(&[a, b, c], root);
                prop_assert!(residual.abs() <= 1e-8 * scale * (1.0 + root * root));
            }
        }
    }
}
