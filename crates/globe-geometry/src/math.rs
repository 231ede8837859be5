//! Scalar and vector helpers shared by the geometry kernel.

use glam::{DQuat, DVec3};

pub const EPSILON1: f64 = 1e-1;
pub const EPSILON2: f64 = 1e-2;
pub const EPSILON3: f64 = 1e-3;
pub const EPSILON4: f64 = 1e-4;
pub const EPSILON6: f64 = 1e-6;
pub const EPSILON7: f64 = 1e-7;
pub const EPSILON10: f64 = 1e-10;
pub const EPSILON11: f64 = 1e-11;
pub const EPSILON12: f64 = 1e-12;
pub const EPSILON14: f64 = 1e-14;
pub const EPSILON15: f64 = 1e-15;

/// Full turn in radians.
pub const TWO_PI: f64 = std::f64::consts::TAU;

/// Sign of `value`, with zero mapping to zero.
///
/// Unlike [`f64::signum`], `sign(0.0) == 0.0`, which the polynomial solvers rely on.
#[must_use]
pub fn sign(value: f64) -> f64 {
    if value > 0.0 {
        1.0
    } else if value < 0.0 {
        -1.0
    } else {
        0.0
    }
}

/// Adds two numbers, returning exactly zero when they nearly cancel.
///
/// If `left` and `right` have opposite signs and the magnitude of their sum is
/// below `relative_epsilon` times the larger operand, the sum is treated as
/// round-off and collapsed to `0.0`.
#[must_use]
pub fn add_with_cancellation_check(left: f64, right: f64, relative_epsilon: f64) -> f64 {
    let difference = left + right;
    if sign(left) != sign(right)
        && (difference / left.abs().max(right.abs())).abs() < relative_epsilon
    {
        return 0.0;
    }
    difference
}

/// Compares two values using an absolute tolerance, then a relative one.
#[must_use]
pub fn equals_epsilon(left: f64, right: f64, relative: f64, absolute: f64) -> bool {
    let diff = (left - right).abs();
    diff <= absolute || diff <= relative * left.abs().max(right.abs())
}

/// Component-wise [`equals_epsilon`] for vectors.
#[must_use]
pub fn vec_equals_epsilon(left: DVec3, right: DVec3, relative: f64, absolute: f64) -> bool {
    equals_epsilon(left.x, right.x, relative, absolute)
        && equals_epsilon(left.y, right.y, relative, absolute)
        && equals_epsilon(left.z, right.z, relative, absolute)
}

/// Floating-point modulo that always returns a value with the sign of `n`.
#[must_use]
pub fn modulo(m: f64, n: f64) -> f64 {
    ((m % n) + n) % n
}

/// Wraps an angle into `[0, 2π]`, keeping exact multiples of 2π at 2π.
#[must_use]
pub fn zero_to_two_pi(angle: f64) -> f64 {
    let wrapped = modulo(angle, TWO_PI);
    if wrapped.abs() < EPSILON14 && angle.abs() > EPSILON14 {
        TWO_PI
    } else {
        wrapped
    }
}

/// Wraps an angle into `[-π, π]`.
#[must_use]
pub fn negative_pi_to_pi(angle: f64) -> f64 {
    zero_to_two_pi(angle + std::f64::consts::PI) - std::f64::consts::PI
}

/// `acos` with the argument clamped to `[-1, 1]`.
#[must_use]
pub fn acos_clamped(value: f64) -> f64 {
    value.clamp(-1.0, 1.0).acos()
}

/// Linear interpolation between `start` and `end`.
#[must_use]
pub fn lerp(start: f64, end: f64, t: f64) -> f64 {
    (1.0 - t) * start + t * end
}

/// Angle in radians between two vectors.
#[must_use]
pub fn angle_between(left: DVec3, right: DVec3) -> f64 {
    let left = left.normalize();
    let right = right.normalize();
    let cosine = left.dot(right);
    let sine = left.cross(right).length();
    sine.atan2(cosine)
}

/// Unit axis that is most orthogonal to `v`.
#[must_use]
pub fn most_orthogonal_axis(v: DVec3) -> DVec3 {
    let f = v.normalize().abs();
    if f.x <= f.y {
        if f.x <= f.z { DVec3::X } else { DVec3::Z }
    } else if f.y <= f.z {
        DVec3::Y
    } else {
        DVec3::Z
    }
}

/// Quaternion for a heading/pitch/roll triple in a local frame.
///
/// Heading rotates about -Z, pitch about -Y and roll about +X, applied
/// roll first.
#[must_use]
pub fn quaternion_from_heading_pitch_roll(heading: f64, pitch: f64, roll: f64) -> DQuat {
    let roll_q = DQuat::from_axis_angle(DVec3::X, roll);
    let pitch_q = DQuat::from_axis_angle(DVec3::Y, -pitch);
    let heading_q = DQuat::from_axis_angle(DVec3::Z, -heading);
    heading_q * (pitch_q * roll_q)
}

#[cfg(test)]
mod tests {
    use std::f64::consts::PI;

    use super::*;

    #[test]
    fn test_cancellation_collapses_to_zero() {
        assert_eq!(add_with_cancellation_check(1.0, -1.0 + 1e-16, 1e-14), 0.0);
        assert_eq!(add_with_cancellation_check(1.0, -0.5, 1e-14), 0.5);
        // Same signs never cancel.
        assert_eq!(add_with_cancellation_check(1e-20, 1e-20, 1e-14), 2e-20);
    }

    #[test]
    fn test_sign_of_zero_is_zero() {
        assert_eq!(sign(0.0), 0.0);
        assert_eq!(sign(-3.0), -1.0);
        assert_eq!(sign(2.0), 1.0);
    }

    #[test]
    fn test_angle_wrapping() {
        assert!((zero_to_two_pi(-PI / 2.0) - 1.5 * PI).abs() < 1e-12);
        assert!((zero_to_two_pi(TWO_PI) - TWO_PI).abs() < 1e-12);
        assert!((negative_pi_to_pi(1.5 * PI) + PI / 2.0).abs() < 1e-12);
        assert!((negative_pi_to_pi(-0.25) + 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_most_orthogonal_axis() {
        assert_eq!(most_orthogonal_axis(DVec3::new(1.0, 0.2, 0.3)), DVec3::Y);
        assert_eq!(most_orthogonal_axis(DVec3::new(0.1, 0.9, 0.3)), DVec3::X);
        assert_eq!(most_orthogonal_axis(DVec3::new(0.5, 0.9, 0.0)), DVec3::Z);
    }

    #[test]
    fn test_heading_pitch_roll_quaternion() {
        // Heading of π/2 turns +X (east in a local frame) toward -Y.
        let q = quaternion_from_heading_pitch_roll(PI / 2.0, 0.0, 0.0);
        let v = q * DVec3::X;
        assert!(v.abs_diff_eq(DVec3::NEG_Y, 1e-12));

        // Negative pitch tips +X downward.
        let q = quaternion_from_heading_pitch_roll(0.0, -PI / 2.0, 0.0);
        let v = q * DVec3::X;
        assert!(v.abs_diff_eq(DVec3::NEG_Z, 1e-12));
    }
}
