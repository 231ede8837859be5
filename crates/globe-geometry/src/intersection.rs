//! Ray intersection tests against ellipsoids and planes.

use glam::{DMat3, DVec3};

use crate::ellipsoid::Ellipsoid;
use crate::math::{
    EPSILON12, EPSILON15, add_with_cancellation_check, most_orthogonal_axis, sign,
};
use crate::polynomial::{solve_quadratic, solve_quartic};
use crate::ray::{Interval, Plane, Ray};

/// Intersect a ray with an ellipsoid.
///
/// The ray is scaled into the space where the ellipsoid is a unit sphere.
/// Returns `None` when the ray misses. A ray starting inside the ellipsoid
/// always yields an interval starting at `0.0`.
pub fn ray_ellipsoid(ray: &Ray, ellipsoid: &Ellipsoid) -> Option<Interval> {
    let inverse_radii = ellipsoid.one_over_radii();
    let q = inverse_radii * ray.origin;
    let w = inverse_radii * ray.direction;

    let q2 = q.length_squared();
    let qw = q.dot(w);

    if q2 > 1.0 {
        // Outside the ellipsoid.
        if qw >= 0.0 {
            // Looking outward or tangent.
            return None;
        }

        let qw2 = qw * qw;
        let difference = q2 - 1.0;
        let w2 = w.length_squared();
        let product = w2 * difference;

        if qw2 < product {
            // Imaginary roots.
            return None;
        } else if qw2 > product {
            // Distinct roots.
            let discriminant = qw * qw - product;
            let temp = -qw + discriminant.sqrt();
            let root0 = temp / w2;
            let root1 = difference / temp;
            return Some(if root0 < root1 {
                Interval::new(root0, root1)
            } else {
                Interval::new(root1, root0)
            });
        }

        // Repeated roots.
        let root = (difference / w2).sqrt();
        return Some(Interval::new(root, root));
    } else if q2 < 1.0 {
        // Inside the ellipsoid.
        let difference = q2 - 1.0;
        let w2 = w.length_squared();
        let product = w2 * difference;

        let discriminant = qw * qw - product;
        let temp = -qw + discriminant.sqrt();
        return Some(Interval::new(0.0, temp / w2));
    }

    // On the surface.
    if qw < 0.0 {
        let w2 = w.length_squared();
        return Some(Interval::new(0.0, -qw / w2));
    }

    None
}

/// Intersect a ray with a plane.
///
/// Returns `None` when the ray is parallel to the plane or the plane is
/// behind the ray's origin.
pub fn ray_plane(ray: &Ray, plane: &Plane) -> Option<DVec3> {
    let denominator = plane.normal.dot(ray.direction);
    if denominator.abs() < EPSILON15 {
        return None;
    }

    let t = (-plane.distance - plane.normal.dot(ray.origin)) / denominator;
    if t < 0.0 {
        return None;
    }

    Some(ray.point_at(t))
}

/// Point on the ellipsoid nearest in altitude to the ray.
///
/// If the ray does not descend toward the ellipsoid its origin is returned.
/// Otherwise the closest approach is found by a change of basis that turns
/// the problem into a quartic in the cosine of an angle. The result lies
/// above the surface for a missing ray and below it for a hitting ray.
pub fn grazing_altitude_location(ray: &Ray, ellipsoid: &Ellipsoid) -> Option<DVec3> {
    let position = ray.origin;
    let direction = ray.direction;

    if position != DVec3::ZERO {
        let normal = ellipsoid.geodetic_surface_normal(position);
        if direction.dot(normal) >= 0.0 {
            // The origin is already the closest point in altitude.
            return Some(position);
        }
    }

    let intersects = ray_ellipsoid(ray, ellipsoid).is_some();

    // Build a basis from the scaled direction.
    let f = ellipsoid.transform_position_to_scaled_space(direction);
    let first_axis = f.normalize();
    let reference = most_orthogonal_axis(f);
    let second_axis = reference.cross(first_axis).normalize();
    let third_axis = first_axis.cross(second_axis).normalize();

    let b = DMat3::from_cols(first_axis, second_axis, third_axis);
    let b_t = b.transpose();

    let d_i = DMat3::from_diagonal(ellipsoid.radii());
    let d = DMat3::from_diagonal(ellipsoid.one_over_radii());

    // Cross-product matrix: c * v == v × direction.
    let c = DMat3::from_cols(
        DVec3::new(0.0, -direction.z, direction.y),
        DVec3::new(direction.z, 0.0, -direction.x),
        DVec3::new(-direction.y, direction.x, 0.0),
    );

    let temp = b_t * d * c;
    let a = temp * d_i * b;
    let b_vec = temp * position;

    let solutions = quadratic_vector_expression(&a, -b_vec, 0.0, 0.0, 1.0);
    if solutions.is_empty() {
        return None;
    }

    let mut closest = DVec3::ZERO;
    let mut maximum_value = 0.0_f64;
    for solution in solutions {
        let candidate = d_i * (b * solution);
        let v = (candidate - position).normalize();
        let dot_product = v.dot(direction);

        if dot_product > maximum_value {
            maximum_value = dot_product;
            closest = candidate;
        }
    }

    let surface_point = ellipsoid.cartesian_to_cartographic(closest)?;
    let maximum_value = maximum_value.clamp(0.0, 1.0);
    let mut altitude =
        (closest - position).length() * (1.0 - maximum_value * maximum_value).sqrt();
    if intersects {
        altitude = -altitude;
    }

    Some(ellipsoid.cartographic_to_cartesian(&surface_point.with_height(altitude)))
}

/// Solve `xᵀ·M·x + b·x + c = 0` for points `x` on the circle `(x, w·cosθ, w·sinθ)`.
fn quadratic_vector_expression(
    matrix: &DMat3,
    cartesian: DVec3,
    c: f64,
    x: f64,
    w: f64,
) -> Vec<DVec3> {
    let m = matrix.to_cols_array();
    let x_squared = x * x;
    let w_squared = w * w;

    let l2 = (m[4] - m[8]) * w_squared;
    let l1 = w * (x * add_with_cancellation_check(m[3], m[1], EPSILON15) + cartesian.y);
    let l0 = (m[0] * x_squared + m[8] * w_squared) + x * cartesian.x + c;

    let r1 = w_squared * add_with_cancellation_check(m[7], m[5], EPSILON15);
    let r0 = w * (x * add_with_cancellation_check(m[6], m[2], EPSILON15) + cartesian.z);

    let mut solutions = Vec::new();

    if r0 == 0.0 && r1 == 0.0 {
        for cosine in solve_quadratic(l2, l1, l0) {
            let sine = (1.0 - cosine * cosine).max(0.0).sqrt();
            solutions.push(DVec3::new(x, w * cosine, w * -sine));
            solutions.push(DVec3::new(x, w * cosine, w * sine));
        }
        return solutions;
    }

    let r0_squared = r0 * r0;
    let r1_squared = r1 * r1;
    let l2_squared = l2 * l2;
    let r0r1 = r0 * r1;

    let c4 = l2_squared + r1_squared;
    let c3 = 2.0 * (l1 * l2 + r0r1);
    let c2 = 2.0 * l0 * l2 + l1 * l1 - r1_squared + r0_squared;
    let c1 = 2.0 * (l0 * l1 - r0r1);
    let c0 = l0 * l0 - r0_squared;

    if c4 == 0.0 && c3 == 0.0 && c2 == 0.0 && c1 == 0.0 {
        return solutions;
    }

    let cosines = solve_quartic(c4, c3, c2, c1, c0);
    let mut i = 0;
    while i < cosines.len() {
        let cosine = cosines[i];
        let cosine_squared = cosine * cosine;
        let sine = (1.0 - cosine_squared).max(0.0).sqrt();

        let left = if sign(l2) == sign(l0) {
            add_with_cancellation_check(l2 * cosine_squared + l0, l1 * cosine, EPSILON12)
        } else if sign(l0) == sign(l1 * cosine) {
            add_with_cancellation_check(l2 * cosine_squared, l1 * cosine + l0, EPSILON12)
        } else {
            add_with_cancellation_check(l2 * cosine_squared + l1 * cosine, l0, EPSILON12)
        };

        let right = add_with_cancellation_check(r1 * cosine, r0, EPSILON15);
        let product = left * right;

        if product < 0.0 {
            solutions.push(DVec3::new(x, w * cosine, w * sine));
        } else if product > 0.0 {
            solutions.push(DVec3::new(x, w * cosine, w * -sine));
        } else if sine != 0.0 {
            solutions.push(DVec3::new(x, w * cosine, w * -sine));
            solutions.push(DVec3::new(x, w * cosine, w * sine));
            // Both signs are covered, so the paired root is consumed too.
            i += 1;
        } else {
            solutions.push(DVec3::new(x, w * cosine, w * sine));
        }
        i += 1;
    }

    solutions
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ellipsoid::Cartographic;

    #[test]
    fn test_ray_from_outside_hits_twice() {
        let ellipsoid = Ellipsoid::WGS84;
        let origin = DVec3::new(2.0 * 6_378_137.0, 0.0, 0.0);
        let ray = Ray::new(origin, DVec3::NEG_X);

        let interval = ray_ellipsoid(&ray, &ellipsoid).unwrap();
        assert!(interval.start < interval.stop);
        assert!((interval.start - 6_378_137.0).abs() < 1e-6);
        assert!((interval.stop - 3.0 * 6_378_137.0).abs() < 1e-6);
    }

    #[test]
    fn test_ray_missing_or_pointing_away() {
        let ellipsoid = Ellipsoid::WGS84;
        let origin = DVec3::new(2.0 * 6_378_137.0, 0.0, 0.0);

        let away = Ray::new(origin, DVec3::X);
        assert!(ray_ellipsoid(&away, &ellipsoid).is_none());

        let past = Ray::new(origin, DVec3::new(-1.0, 1.0, 0.0).normalize());
        assert!(ray_ellipsoid(&past, &ellipsoid).is_none());
    }

    #[test]
    fn test_ray_from_inside_starts_at_zero() {
        let ellipsoid = Ellipsoid::WGS84;
        for direction in [DVec3::X, DVec3::NEG_Y, DVec3::new(1.0, 1.0, 1.0).normalize()] {
            let ray = Ray::new(DVec3::new(1000.0, -2000.0, 500.0), direction);
            let interval = ray_ellipsoid(&ray, &ellipsoid).unwrap();
            assert_eq!(interval.start, 0.0);
            assert!(interval.stop > 0.0);
        }
    }

    #[test]
    fn test_ray_on_surface() {
        let ellipsoid = Ellipsoid::UNIT_SPHERE;
        let inward = Ray::new(DVec3::X, DVec3::NEG_X);
        let interval = ray_ellipsoid(&inward, &ellipsoid).unwrap();
        assert_eq!(interval.start, 0.0);
        // Stop is -q·w / |w|² in scaled space.
        assert!((interval.stop - 1.0).abs() < 1e-12);

        let slanted = Ray::new(DVec3::X, DVec3::new(-1.0, 1.0, 0.0).normalize());
        let interval = ray_ellipsoid(&slanted, &ellipsoid).unwrap();
        assert_eq!(interval.start, 0.0);
        assert!((interval.stop - std::f64::consts::FRAC_1_SQRT_2).abs() < 1e-12);

        let outward = Ray::new(DVec3::X, DVec3::X);
        assert!(ray_ellipsoid(&outward, &ellipsoid).is_none());
    }

    #[test]
    fn test_tangent_ray_has_repeated_root() {
        let ellipsoid = Ellipsoid::UNIT_SPHERE;
        let ray = Ray::new(DVec3::new(-2.0, 1.0, 0.0), DVec3::X);
        let interval = ray_ellipsoid(&ray, &ellipsoid).unwrap();
        assert!((interval.start - 2.0).abs() < 1e-12);
        assert_eq!(interval.start, interval.stop);
    }

    #[test]
    fn test_ray_plane() {
        let plane = Plane::from_point_normal(DVec3::new(0.0, 0.0, 5.0), DVec3::Z);

        let up = Ray::new(DVec3::ZERO, DVec3::Z);
        let hit = ray_plane(&up, &plane).unwrap();
        assert!(hit.abs_diff_eq(DVec3::new(0.0, 0.0, 5.0), 1e-12));

        let down = Ray::new(DVec3::ZERO, DVec3::NEG_Z);
        assert!(ray_plane(&down, &plane).is_none());

        let parallel = Ray::new(DVec3::ZERO, DVec3::X);
        assert!(ray_plane(&parallel, &plane).is_none());
    }

    #[test]
    fn test_grazing_altitude_for_ascending_ray_is_origin() {
        let ellipsoid = Ellipsoid::WGS84;
        let origin = DVec3::new(7_000_000.0, 0.0, 0.0);
        let ray = Ray::new(origin, DVec3::new(1.0, 1.0, 0.0).normalize());
        assert_eq!(grazing_altitude_location(&ray, &ellipsoid), Some(origin));
    }

    #[test]
    fn test_grazing_altitude_for_missing_ray() {
        let ellipsoid = Ellipsoid::UNIT_SPHERE;
        // Passes the sphere at closest distance 1.5 from the center.
        let ray = Ray::new(DVec3::new(-5.0, 1.5, 0.0), DVec3::new(1.0, -0.01, 0.0).normalize());
        let point = grazing_altitude_location(&ray, &ellipsoid).unwrap();
        let carto = ellipsoid.cartesian_to_cartographic(point).unwrap();
        assert!(carto.height > 0.0);
        assert!(carto.height < 0.6);
        // The grazing point sits on the near side of the sphere.
        assert!(point.y > 0.0);
    }

    #[test]
    fn test_grazing_altitude_for_hitting_ray_is_below_surface() {
        let ellipsoid = Ellipsoid::WGS84;
        let origin = ellipsoid.cartographic_to_cartesian(&Cartographic::from_degrees(0.0, 0.0, 1_000_000.0));
        let direction = (DVec3::new(0.0, 6_378_137.0, 0.0) * 0.1 - origin).normalize();
        let ray = Ray::new(origin, direction);
        assert!(ray_ellipsoid(&ray, &ellipsoid).is_some());

        let point = grazing_altitude_location(&ray, &ellipsoid).unwrap();
        let carto = ellipsoid.cartesian_to_cartographic(point).unwrap();
        assert!(carto.height < 0.0);
    }
}
