use super::{solve_cubic, solve_quadratic};
use crate::math::{EPSILON14, EPSILON15, sign};

/// Real roots of `a·x⁴ + b·x³ + c·x² + d·x + e`, in ascending order.
///
/// The polynomial is normalized to a monic quartic and factored into two
/// quadratics, either through the depressed resolvent cubic or Neumark's
/// resolvent. The choice follows the sign pattern of the normalized
/// coefficients, since each factorization loses precision on different
/// inputs.
pub fn solve_quartic(a: f64, b: f64, c: f64, d: f64, e: f64) -> Vec<f64> {
    if a.abs() < EPSILON15 {
        return solve_cubic(b, c, d, e);
    }

    let a3 = b / a;
    let a2 = c / a;
    let a1 = d / a;
    let a0 = e / a;

    // Encode the sign pattern of the coefficients as a 4-bit code.
    let mut k: u32 = u32::from(a3 < 0.0);
    k += if a2 < 0.0 { k + 1 } else { k };
    k += if a1 < 0.0 { k + 1 } else { k };
    k += if a0 < 0.0 { k + 1 } else { k };

    match k {
        1 | 2 | 5 | 8 | 11 => neumark(a3, a2, a1, a0),
        0..=15 => ferrari(a3, a2, a1, a0),
        _ => Vec::new(),
    }
}

/// Factor through the resolvent cubic of the depressed quartic.
fn ferrari(a3: f64, a2: f64, a1: f64, a0: f64) -> Vec<f64> {
    let a3_squared = a3 * a3;

    let p = a2 - 3.0 * a3_squared / 8.0;
    let q = a1 - a2 * a3 / 2.0 + a3_squared * a3 / 8.0;
    let r = a0 - a1 * a3 / 4.0 + a2 * a3_squared / 16.0 - 3.0 * a3_squared * a3_squared / 256.0;

    // h⁶ + 2p·h⁴ + (p² - 4r)·h² - q² = 0.
    let cubic_roots = solve_cubic(1.0, 2.0 * p, p * p - 4.0 * r, -q * q);
    let Some(&h_squared) = cubic_roots.last() else {
        return Vec::new();
    };

    let temp = -a3 / 4.0;

    if h_squared.abs() < EPSILON14 {
        // Biquadratic: y⁴ + p·y² + r = 0.
        return match solve_quadratic(1.0, p, r).as_slice() {
            &[root0, root1] if root0 >= 0.0 && root1 >= 0.0 => {
                let y0 = root0.sqrt();
                let y1 = root1.sqrt();
                vec![temp - y1, temp - y0, temp + y0, temp + y1]
            }
            &[root0, _] if root0 >= 0.0 => {
                let y = root0.sqrt();
                vec![temp - y, temp + y]
            }
            &[_, root1] if root1 >= 0.0 => {
                let y = root1.sqrt();
                vec![temp - y, temp + y]
            }
            _ => Vec::new(),
        };
    }

    if h_squared > 0.0 {
        let h = h_squared.sqrt();
        let m = (p + h_squared - q / h) / 2.0;
        let n = (p + h_squared + q / h) / 2.0;

        // (y² + h·y + m)(y² - h·y + n).
        let shift = |roots: Vec<f64>| roots.into_iter().map(|r| r + temp).collect::<Vec<_>>();
        let roots1 = shift(solve_quadratic(1.0, h, m));
        let roots2 = shift(solve_quadratic(1.0, -h, n));
        return merge_quadratic_roots(roots1, roots2);
    }

    Vec::new()
}

/// Factor through Neumark's resolvent cubic.
fn neumark(a3: f64, a2: f64, a1: f64, a0: f64) -> Vec<f64> {
    let a1_squared = a1 * a1;
    let a2_squared = a2 * a2;
    let a3_squared = a3 * a3;

    let p = -2.0 * a2;
    let q = a1 * a3 + a2_squared - 4.0 * a0;
    let r = a3_squared * a0 - a1 * a2 * a3 + a1_squared;

    let cubic_roots = solve_cubic(1.0, p, q, r);
    let Some(&y) = cubic_roots.first() else {
        return Vec::new();
    };

    let temp = a2 - y;
    let temp_squared = temp * temp;

    let g1 = a3 / 2.0;
    let h1 = temp / 2.0;

    let m = temp_squared - 4.0 * a0;
    let m_error = temp_squared + 4.0 * a0.abs();

    let n = a3_squared - 4.0 * y;
    let n_error = a3_squared + 4.0 * y.abs();

    let (g2, h2) = if y < 0.0 || m * n_error < n * m_error {
        let square_root_of_n = n.sqrt();
        let h2 = if square_root_of_n == 0.0 {
            0.0
        } else {
            (a3 * h1 - a1) / square_root_of_n
        };
        (square_root_of_n / 2.0, h2)
    } else {
        let square_root_of_m = m.sqrt();
        let g2 = if square_root_of_m == 0.0 {
            0.0
        } else {
            (a3 * h1 - a1) / square_root_of_m
        };
        (g2, square_root_of_m / 2.0)
    };

    let (big_g, small_g) = split_factor(g1, g2, y);
    let (big_h, small_h) = split_factor(h1, h2, a0);

    // (y² + G·y + H)(y² + g·y + h).
    let roots1 = solve_quadratic(1.0, big_g, big_h);
    let roots2 = solve_quadratic(1.0, small_g, small_h);
    merge_quadratic_roots(roots1, roots2)
}

/// Split `first ± second` into a pair whose product is `product`, adding
/// when the signs agree so the sum never cancels.
fn split_factor(first: f64, second: f64, product: f64) -> (f64, f64) {
    if first == 0.0 && second == 0.0 {
        (0.0, 0.0)
    } else if sign(first) == sign(second) {
        let big = first + second;
        (big, product / big)
    } else {
        let small = first - second;
        (product / small, small)
    }
}

/// Merge the ascending root pairs of two quadratic factors into one ascending list.
fn merge_quadratic_roots(roots1: Vec<f64>, roots2: Vec<f64>) -> Vec<f64> {
    match (roots1.as_slice(), roots2.as_slice()) {
        (&[a0, a1], &[b0, b1]) => {
            if a1 <= b0 {
                vec![a0, a1, b0, b1]
            } else if b1 <= a0 {
                vec![b0, b1, a0, a1]
            } else if a0 >= b0 && a1 <= b1 {
                vec![b0, a0, a1, b1]
            } else if b0 >= a0 && b1 <= a1 {
                vec![a0, b0, b1, a1]
            } else if a0 > b0 && a0 < b1 {
                vec![b0, a0, b1, a1]
            } else {
                vec![a0, b0, a1, b1]
            }
        }
        ([], _) => roots2,
        (_, _) => roots1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::polynomial::{assert_ascending, evaluate};

    fn assert_roots(roots: &[f64], expected: &[f64]) {
        assert_eq!(roots.len(), expected.len(), "{roots:?} vs {expected:?}");
        for (root, want) in roots.iter().zip(expected) {
            assert!((root - want).abs() < 1e-8, "{roots:?} vs {expected:?}");
        }
    }

    #[test]
    fn test_four_distinct_roots() {
        // (x + 2)(x + 1)(x - 1)(x - 3) = x⁴ - x³ - 7x² + x + 6
        let roots = solve_quartic(1.0, -1.0, -7.0, 1.0, 6.0);
        assert_roots(&roots, &[-2.0, -1.0, 1.0, 3.0]);
    }

    #[test]
    fn test_biquadratic_matches_quadratic_in_x_squared() {
        // (x² - 1)(x² - 4) = x⁴ - 5x² + 4
        let squared_roots = solve_quadratic(1.0, -5.0, 4.0);
        let mut expected: Vec<f64> = squared_roots
            .iter()
            .flat_map(|r| [-r.sqrt(), r.sqrt()])
            .collect();
        expected.sort_by(f64::total_cmp);

        let roots = solve_quartic(1.0, 0.0, -5.0, 0.0, 4.0);
        assert_roots(&roots, &expected);

        // x⁴ + x² - 6 = (x² + 3)(x² - 2): only ±√2 are real.
        let roots = solve_quartic(2.0, 0.0, 2.0, 0.0, -12.0);
        let r = 2.0_f64.sqrt();
        assert_roots(&roots, &[-r, r]);
    }

    #[test]
    fn test_no_real_roots() {
        // (x² + 1)(x² + 4)
        assert!(solve_quartic(1.0, 0.0, 5.0, 0.0, 4.0).is_empty());
    }

    #[test]
    fn test_vanishing_leading_coefficient() {
        let roots = solve_quartic(1e-16, 1.0, -6.0, 11.0, -6.0);
        assert_roots(&roots, &[1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_residuals_across_sign_patterns() {
        let cases = [
            // Each sign pattern exercises a different resolvent.
            [1.0, -10.0, 35.0, -50.0, 24.0],
            [1.0, 2.0, -13.0, -14.0, 24.0],
            [2.0, -3.0, -11.0, 3.0, 1.0],
            [1.0, 0.5, -4.0, -1.0, 1.5],
            [-1.0, 3.0, 2.0, -5.0, 0.5],
        ];
        for coefficients in cases {
            let [a, b, c, d, e] = coefficients;
            let roots = solve_quartic(a, b, c, d, e);
            assert!(!roots.is_empty(), "{coefficients:?}");
            assert_ascending(&roots);
            for root in roots {
                let residual = evaluate(&coefficients, root);
                assert!(residual.abs() < 1e-6, "{coefficients:?} root {root} residual {residual}");
            }
        }
    }

    #[test]
    fn test_merge_interleaved_roots() {
        assert_eq!(
            merge_quadratic_roots(vec![0.0, 2.0], vec![1.0, 3.0]),
            vec![0.0, 1.0, 2.0, 3.0]
        );
        assert_eq!(
            merge_quadratic_roots(vec![1.0, 2.0], vec![0.0, 3.0]),
            vec![0.0, 1.0, 2.0, 3.0]
        );
        assert_eq!(merge_quadratic_roots(Vec::new(), vec![1.0, 2.0]), vec![1.0, 2.0]);
    }
}
