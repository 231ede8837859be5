//! Geodesics on an ellipsoid of revolution.
//!
//! Endpoints are solved with Vincenty's inverse formula, which yields the
//! surface distance and the headings at both ends. Points along the geodesic
//! are then evaluated with a truncated series in `u²` (up to `u⁸`), so
//! interpolation never has to iterate.

use crate::ellipsoid::{Cartographic, Ellipsoid};
use crate::error::{Error, Result};
use crate::math::{EPSILON12, angle_between};

/// Maximum number of iterations of Vincenty's inverse formula.
const MAX_VINCENTY_ITERATIONS: usize = 200;

/// Minimum angular distance from antipodal, in radians, for a solvable geodesic.
const ANTIPODAL_TOLERANCE: f64 = 0.0125;

/// Series constants derived from the start point and the start heading.
#[derive(Debug, Clone, Copy)]
struct SeriesConstants {
    a: f64,
    b: f64,
    f: f64,
    cosine_heading: f64,
    sine_heading: f64,
    cosine_u: f64,
    sine_u: f64,
    sigma: f64,
    sine_alpha: f64,
    cosine_squared_alpha: f64,
    cosine_alpha: f64,
    u2_over_4: f64,
    u4_over_16: f64,
    u6_over_64: f64,
    u8_over_256: f64,
    distance_ratio: f64,
}

/// Solved geodesic between two endpoints.
#[derive(Debug, Clone, Copy)]
struct Solution {
    start: Cartographic,
    end: Cartographic,
    start_heading: f64,
    end_heading: f64,
    distance: f64,
    constants: SeriesConstants,
}

/// Geodesic between two points on an ellipsoid.
///
/// Heights of the endpoints are ignored; interpolated points lie on the
/// surface.
#[derive(Debug, Clone)]
pub struct EllipsoidGeodesic {
    ellipsoid: Ellipsoid,
    solution: Option<Solution>,
}

impl EllipsoidGeodesic {
    /// Create a geodesic on `ellipsoid` with no endpoints set.
    pub fn new(ellipsoid: Ellipsoid) -> Self {
        Self {
            ellipsoid,
            solution: None,
        }
    }

    /// Create a geodesic and solve it between `start` and `end`.
    pub fn between(ellipsoid: Ellipsoid, start: Cartographic, end: Cartographic) -> Result<Self> {
        let mut geodesic = Self::new(ellipsoid);
        geodesic.set_end_points(start, end)?;
        Ok(geodesic)
    }

    /// Solve the geodesic between two points.
    ///
    /// Fails for nearly antipodal endpoints, where the inverse formula is
    /// ill-conditioned, and when the iteration does not converge. On failure
    /// the previous endpoints are kept.
    pub fn set_end_points(&mut self, start: Cartographic, end: Cartographic) -> Result<()> {
        let first = self
            .ellipsoid
            .cartographic_to_cartesian(&start)
            .normalize();
        let last = self.ellipsoid.cartographic_to_cartesian(&end).normalize();
        let angle = angle_between(first, last);
        if (angle.abs() - std::f64::consts::PI).abs() < ANTIPODAL_TOLERANCE {
            return Err(Error::NearlyAntipodal { angle });
        }

        let major = self.ellipsoid.maximum_radius();
        let minor = self.ellipsoid.minimum_radius();
        let inverse = vincenty_inverse(major, minor, &start, &end)?;

        let start = start.with_height(0.0);
        let end = end.with_height(0.0);
        let constants = series_constants(major, minor, &start, inverse.start_heading, inverse.u_squared);

        self.solution = Some(Solution {
            start,
            end,
            start_heading: inverse.start_heading,
            end_heading: inverse.end_heading,
            distance: inverse.distance,
            constants,
        });
        Ok(())
    }

    pub fn ellipsoid(&self) -> &Ellipsoid {
        &self.ellipsoid
    }

    /// Start point, with zero height.
    pub fn start(&self) -> Option<Cartographic> {
        self.solution.map(|s| s.start)
    }

    /// End point, with zero height.
    pub fn end(&self) -> Option<Cartographic> {
        self.solution.map(|s| s.end)
    }

    /// Heading at the start point, in radians clockwise from north.
    pub fn start_heading(&self) -> Option<f64> {
        self.solution.map(|s| s.start_heading)
    }

    /// Heading at the end point, in radians clockwise from north.
    pub fn end_heading(&self) -> Option<f64> {
        self.solution.map(|s| s.end_heading)
    }

    /// Length of the geodesic along the surface, in meters.
    pub fn surface_distance(&self) -> Option<f64> {
        self.solution.map(|s| s.distance)
    }

    /// Point at `fraction` of the way from start to end.
    pub fn interpolate_using_fraction(&self, fraction: f64) -> Option<Cartographic> {
        let distance = self.solution?.distance;
        self.interpolate_using_surface_distance(distance * fraction)
    }

    /// Point `distance` meters along the geodesic from the start.
    ///
    /// The longitude is the start longitude plus a relative offset and is not
    /// wrapped into any particular range.
    pub fn interpolate_using_surface_distance(&self, distance: f64) -> Option<Cartographic> {
        let solution = self.solution?;
        let k = &solution.constants;

        let s = k.distance_ratio + distance / k.b;

        let cosine_2s = (2.0 * s).cos();
        let cosine_4s = (4.0 * s).cos();
        let cosine_6s = (6.0 * s).cos();
        let sine_2s = (2.0 * s).sin();
        let sine_4s = (4.0 * s).sin();
        let sine_6s = (6.0 * s).sin();
        let sine_8s = (8.0 * s).sin();

        let s2 = s * s;
        let s3 = s * s2;

        let u2 = k.u2_over_4;
        let u4 = k.u4_over_16;
        let u6 = k.u6_over_64;
        let u8 = k.u8_over_256;

        let sigma = 2.0 * s3 * u8 * cosine_2s / 3.0
            + s * (1.0 - u2 + 7.0 * u4 / 4.0 - 15.0 * u6 / 4.0 + 579.0 * u8 / 64.0
                - (u4 - 15.0 * u6 / 4.0 + 187.0 * u8 / 16.0) * cosine_2s
                - (5.0 * u6 / 4.0 - 115.0 * u8 / 16.0) * cosine_4s
                - 29.0 * u8 * cosine_6s / 16.0)
            + (u2 / 2.0 - u4 + 71.0 * u6 / 32.0 - 85.0 * u8 / 16.0) * sine_2s
            + (5.0 * u4 / 16.0 - 5.0 * u6 / 4.0 + 383.0 * u8 / 96.0) * sine_4s
            - s2 * ((u6 - 11.0 * u8 / 2.0) * sine_2s + 5.0 * u8 * sine_4s / 2.0)
            + (29.0 * u6 / 96.0 - 29.0 * u8 / 16.0) * sine_6s
            + 539.0 * u8 * sine_8s / 1536.0;

        let theta = (sigma.sin() * k.cosine_alpha).asin();
        let latitude = (k.a / k.b * theta.tan()).atan();

        // Relative to the start point's argument of latitude.
        let sigma = sigma - k.sigma;
        let cosine_twice_sigma_midpoint = (2.0 * k.sigma + sigma).cos();

        let sine_sigma = sigma.sin();
        let cosine_sigma = sigma.cos();

        let cc = k.cosine_u * cosine_sigma;
        let ss = k.sine_u * sine_sigma;

        let lambda = (sine_sigma * k.sine_heading).atan2(cc - ss * k.cosine_heading);
        let l = lambda
            - compute_delta_lambda(
                k.f,
                k.sine_alpha,
                k.cosine_squared_alpha,
                sigma,
                sine_sigma,
                cosine_sigma,
                cosine_twice_sigma_midpoint,
            );

        Some(Cartographic::new(solution.start.longitude + l, latitude, 0.0))
    }
}

/// Output of Vincenty's inverse formula.
struct InverseSolution {
    distance: f64,
    start_heading: f64,
    end_heading: f64,
    u_squared: f64,
}

fn vincenty_inverse(
    major: f64,
    minor: f64,
    first: &Cartographic,
    second: &Cartographic,
) -> Result<InverseSolution> {
    let eff = (major - minor) / major;
    let l = second.longitude - first.longitude;

    let u1 = ((1.0 - eff) * first.latitude.tan()).atan();
    let u2 = ((1.0 - eff) * second.latitude.tan()).atan();

    let (sine_u1, cosine_u1) = u1.sin_cos();
    let (sine_u2, cosine_u2) = u2.sin_cos();

    let cc = cosine_u1 * cosine_u2;
    let cs = cosine_u1 * sine_u2;
    let ss = sine_u1 * sine_u2;
    let sc = sine_u1 * cosine_u2;

    let mut lambda = l;
    let mut iterations = 0;

    let (sigma, sine_sigma, cosine_sigma, cosine_squared_alpha, cosine_twice_sigma_midpoint) = loop {
        let (sine_lambda, cosine_lambda) = lambda.sin_cos();

        let temp = cs - sc * cosine_lambda;
        let sine_sigma =
            (cosine_u2 * cosine_u2 * sine_lambda * sine_lambda + temp * temp).sqrt();
        let cosine_sigma = ss + cc * cosine_lambda;
        let sigma = sine_sigma.atan2(cosine_sigma);

        let (sine_alpha, cosine_squared_alpha) = if sine_sigma == 0.0 {
            (0.0, 1.0)
        } else {
            let sine_alpha = cc * sine_lambda / sine_sigma;
            (sine_alpha, 1.0 - sine_alpha * sine_alpha)
        };

        let previous = lambda;

        let mut cosine_twice_sigma_midpoint = cosine_sigma - 2.0 * ss / cosine_squared_alpha;
        if cosine_twice_sigma_midpoint.is_nan() {
            // Equatorial line.
            cosine_twice_sigma_midpoint = 0.0;
        }

        lambda = l + compute_delta_lambda(
            eff,
            sine_alpha,
            cosine_squared_alpha,
            sigma,
            sine_sigma,
            cosine_sigma,
            cosine_twice_sigma_midpoint,
        );

        iterations += 1;
        let residual = (lambda - previous).abs();
        if residual <= EPSILON12 {
            break (
                sigma,
                sine_sigma,
                cosine_sigma,
                cosine_squared_alpha,
                cosine_twice_sigma_midpoint,
            );
        }
        if iterations >= MAX_VINCENTY_ITERATIONS || residual.is_nan() {
            tracing::warn!(iterations, residual, "vincenty inverse formula did not converge");
            return Err(Error::GeodesicNoConvergence {
                iterations,
                residual,
            });
        }
    };

    let u_squared = cosine_squared_alpha * (major * major - minor * minor) / (minor * minor);
    let cap_a = 1.0
        + u_squared * (4096.0 + u_squared * (u_squared * (320.0 - 175.0 * u_squared) - 768.0))
            / 16384.0;
    let cap_b =
        u_squared * (256.0 + u_squared * (u_squared * (74.0 - 47.0 * u_squared) - 128.0)) / 1024.0;

    let cosine_squared_twice_sigma_midpoint =
        cosine_twice_sigma_midpoint * cosine_twice_sigma_midpoint;
    let delta_sigma = cap_b
        * sine_sigma
        * (cosine_twice_sigma_midpoint
            + cap_b
                * (cosine_sigma * (2.0 * cosine_squared_twice_sigma_midpoint - 1.0)
                    - cap_b
                        * cosine_twice_sigma_midpoint
                        * (4.0 * sine_sigma * sine_sigma - 3.0)
                        * (4.0 * cosine_squared_twice_sigma_midpoint - 3.0)
                        / 6.0)
                / 4.0);

    let distance = minor * cap_a * (sigma - delta_sigma);

    let (sine_lambda, cosine_lambda) = lambda.sin_cos();
    let start_heading = (cosine_u2 * sine_lambda).atan2(cs - sc * cosine_lambda);
    let end_heading = (cosine_u1 * sine_lambda).atan2(cs * cosine_lambda - sc);

    Ok(InverseSolution {
        distance,
        start_heading,
        end_heading,
        u_squared,
    })
}

fn series_constants(
    a: f64,
    b: f64,
    start: &Cartographic,
    start_heading: f64,
    u_squared: f64,
) -> SeriesConstants {
    let f = (a - b) / a;

    let (sine_heading, cosine_heading) = start_heading.sin_cos();

    let tan_u = (1.0 - f) * start.latitude.tan();
    let cosine_u = 1.0 / (1.0 + tan_u * tan_u).sqrt();
    let sine_u = cosine_u * tan_u;

    let sigma = tan_u.atan2(cosine_heading);

    let sine_alpha = cosine_u * sine_heading;
    let cosine_squared_alpha = 1.0 - sine_alpha * sine_alpha;
    let cosine_alpha = cosine_squared_alpha.sqrt();

    let u2_over_4 = u_squared / 4.0;
    let u4_over_16 = u2_over_4 * u2_over_4;
    let u6_over_64 = u4_over_16 * u2_over_4;
    let u8_over_256 = u4_over_16 * u4_over_16;

    let a0 = 1.0 + u2_over_4 - 3.0 * u4_over_16 / 4.0 + 5.0 * u6_over_64 / 4.0
        - 175.0 * u8_over_256 / 64.0;
    let a1 = 1.0 - u2_over_4 + 15.0 * u4_over_16 / 8.0 - 35.0 * u6_over_64 / 8.0;
    let a2 = 1.0 - 3.0 * u2_over_4 + 35.0 * u4_over_16 / 4.0;
    let a3 = 1.0 - 5.0 * u2_over_4;

    let distance_ratio = a0 * sigma
        - a1 * (2.0 * sigma).sin() * u2_over_4 / 2.0
        - a2 * (4.0 * sigma).sin() * u4_over_16 / 16.0
        - a3 * (6.0 * sigma).sin() * u6_over_64 / 48.0
        - (8.0 * sigma).sin() * 5.0 * u8_over_256 / 512.0;

    SeriesConstants {
        a,
        b,
        f,
        cosine_heading,
        sine_heading,
        cosine_u,
        sine_u,
        sigma,
        sine_alpha,
        cosine_squared_alpha,
        cosine_alpha,
        u2_over_4,
        u4_over_16,
        u6_over_64,
        u8_over_256,
        distance_ratio,
    }
}

fn compute_c(f: f64, cosine_squared_alpha: f64) -> f64 {
    f * cosine_squared_alpha * (4.0 + f * (4.0 - 3.0 * cosine_squared_alpha)) / 16.0
}

fn compute_delta_lambda(
    f: f64,
    sine_alpha: f64,
    cosine_squared_alpha: f64,
    sigma: f64,
    sine_sigma: f64,
    cosine_sigma: f64,
    cosine_twice_sigma_midpoint: f64,
) -> f64 {
    let c = compute_c(f, cosine_squared_alpha);
    (1.0 - c)
        * f
        * sine_alpha
        * (sigma
            + c * sine_sigma
                * (cosine_twice_sigma_midpoint
                    + c * cosine_sigma
                        * (2.0 * cosine_twice_sigma_midpoint * cosine_twice_sigma_midpoint - 1.0)))
}

#[cfg(test)]
mod tests {
    use std::f64::consts::PI;

    use super::*;
    use crate::math::negative_pi_to_pi;

    fn assert_same_position(actual: Cartographic, expected: Cartographic) {
        let d_lon = negative_pi_to_pi(actual.longitude - expected.longitude);
        assert!(d_lon.abs() < 1e-9, "longitude {actual:?} vs {expected:?}");
        assert!(
            (actual.latitude - expected.latitude).abs() < 1e-9,
            "latitude {actual:?} vs {expected:?}"
        );
    }

    #[test]
    fn test_fraction_endpoints_round_trip() {
        let pairs = [
            // Northern hemisphere.
            (
                Cartographic::from_degrees(-122.4, 37.8, 0.0),
                Cartographic::from_degrees(-74.0, 40.7, 0.0),
            ),
            // Southern hemisphere.
            (
                Cartographic::from_degrees(151.2, -33.9, 0.0),
                Cartographic::from_degrees(115.9, -31.9, 0.0),
            ),
            // Across the equator.
            (
                Cartographic::from_degrees(-43.2, -22.9, 0.0),
                Cartographic::from_degrees(-0.1, 51.5, 0.0),
            ),
            // Across the antimeridian.
            (
                Cartographic::from_degrees(179.0, 10.0, 0.0),
                Cartographic::from_degrees(-179.0, -5.0, 0.0),
            ),
        ];

        for (start, end) in pairs {
            let geodesic = EllipsoidGeodesic::between(Ellipsoid::WGS84, start, end).unwrap();
            assert_same_position(geodesic.interpolate_using_fraction(0.0).unwrap(), start);
            assert_same_position(geodesic.interpolate_using_fraction(1.0).unwrap(), end);
        }
    }

    #[test]
    fn test_known_distance() {
        // One degree of longitude along the equator.
        let start = Cartographic::from_degrees(0.0, 0.0, 0.0);
        let end = Cartographic::from_degrees(1.0, 0.0, 0.0);
        let geodesic = EllipsoidGeodesic::between(Ellipsoid::WGS84, start, end).unwrap();
        let expected = 6_378_137.0 * PI / 180.0;
        assert!((geodesic.surface_distance().unwrap() - expected).abs() < 1e-3);
        assert!((geodesic.start_heading().unwrap() - PI / 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_midpoint_of_meridian_arc() {
        let start = Cartographic::from_degrees(10.0, -20.0, 0.0);
        let end = Cartographic::from_degrees(10.0, 20.0, 0.0);
        let geodesic = EllipsoidGeodesic::between(Ellipsoid::WGS84, start, end).unwrap();
        let mid = geodesic.interpolate_using_fraction(0.5).unwrap();
        assert!(mid.latitude.abs() < 1e-9);
        assert!((mid.longitude - 10.0_f64.to_radians()).abs() < 1e-9);
    }

    #[test]
    fn test_heights_are_dropped() {
        let start = Cartographic::from_degrees(0.0, 0.0, 500.0);
        let end = Cartographic::from_degrees(3.0, 4.0, 900.0);
        let geodesic = EllipsoidGeodesic::between(Ellipsoid::WGS84, start, end).unwrap();
        assert_eq!(geodesic.start().unwrap().height, 0.0);
        assert_eq!(geodesic.end().unwrap().height, 0.0);
    }

    #[test]
    fn test_antipodal_endpoints_are_rejected() {
        let start = Cartographic::from_degrees(0.0, 0.0, 0.0);
        let end = Cartographic::from_degrees(180.0, 0.0, 0.0);
        let result = EllipsoidGeodesic::between(Ellipsoid::WGS84, start, end);
        assert!(matches!(result, Err(Error::NearlyAntipodal { .. })));
    }

    #[test]
    fn test_unsolved_geodesic_has_no_points() {
        let geodesic = EllipsoidGeodesic::new(Ellipsoid::WGS84);
        assert!(geodesic.interpolate_using_fraction(0.5).is_none());
        assert!(geodesic.surface_distance().is_none());
    }
}
