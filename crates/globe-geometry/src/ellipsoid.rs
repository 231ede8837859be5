//! Ellipsoid model and geographic coordinate conversions.
//!
//! Positions are Earth-centered, Earth-fixed (ECEF) cartesian coordinates in
//! meters. Geographic coordinates are [`Cartographic`] values in radians.

use glam::DVec3;

use crate::math::{EPSILON1, EPSILON12, sign};

/// Geographic position: longitude and latitude in radians, height in meters.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Cartographic {
    /// Longitude in radians. No canonical range is enforced.
    pub longitude: f64,
    /// Geodetic latitude in radians.
    pub latitude: f64,
    /// Height above the ellipsoid surface in meters.
    pub height: f64,
}

impl Cartographic {
    /// Create a cartographic position from radians.
    #[must_use]
    pub const fn new(longitude: f64, latitude: f64, height: f64) -> Self {
        Self {
            longitude,
            latitude,
            height,
        }
    }

    /// Create a cartographic position from degrees and meters.
    #[must_use]
    pub fn from_degrees(longitude: f64, latitude: f64, height: f64) -> Self {
        Self::new(longitude.to_radians(), latitude.to_radians(), height)
    }

    /// Copy of this position with a different height.
    #[must_use]
    pub fn with_height(self, height: f64) -> Self {
        Self { height, ..self }
    }
}

/// Geographic rectangle in radians.
///
/// `west > east` describes a rectangle that crosses the antimeridian.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rectangle {
    pub west: f64,
    pub south: f64,
    pub east: f64,
    pub north: f64,
}

impl Rectangle {
    #[must_use]
    pub const fn new(west: f64, south: f64, east: f64, north: f64) -> Self {
        Self {
            west,
            south,
            east,
            north,
        }
    }

    /// Create a rectangle from degrees.
    #[must_use]
    pub fn from_degrees(west: f64, south: f64, east: f64, north: f64) -> Self {
        Self::new(
            west.to_radians(),
            south.to_radians(),
            east.to_radians(),
            north.to_radians(),
        )
    }
}

/// Triaxial ellipsoid centered at the origin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ellipsoid {
    radii: DVec3,
    radii_squared: DVec3,
    one_over_radii: DVec3,
    one_over_radii_squared: DVec3,
}

impl Ellipsoid {
    /// The WGS84 reference ellipsoid.
    pub const WGS84: Self = Self::new(6_378_137.0, 6_378_137.0, 6_356_752.314_245_179);

    /// A unit sphere, used when curvature should not affect an operation.
    pub const UNIT_SPHERE: Self = Self::new(1.0, 1.0, 1.0);

    /// Create an ellipsoid from its semi-axis radii.
    #[must_use]
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self {
            radii: DVec3::new(x, y, z),
            radii_squared: DVec3::new(x * x, y * y, z * z),
            one_over_radii: DVec3::new(1.0 / x, 1.0 / y, 1.0 / z),
            one_over_radii_squared: DVec3::new(1.0 / (x * x), 1.0 / (y * y), 1.0 / (z * z)),
        }
    }

    /// Create a sphere of the given radius.
    #[must_use]
    pub const fn sphere(radius: f64) -> Self {
        Self::new(radius, radius, radius)
    }

    pub fn radii(&self) -> DVec3 {
        self.radii
    }

    pub fn radii_squared(&self) -> DVec3 {
        self.radii_squared
    }

    pub fn one_over_radii(&self) -> DVec3 {
        self.one_over_radii
    }

    pub fn one_over_radii_squared(&self) -> DVec3 {
        self.one_over_radii_squared
    }

    /// Largest semi-axis radius.
    pub fn maximum_radius(&self) -> f64 {
        self.radii.max_element()
    }

    /// Smallest semi-axis radius.
    pub fn minimum_radius(&self) -> f64 {
        self.radii.min_element()
    }

    /// Scale a position into the space where this ellipsoid is a unit sphere.
    pub fn transform_position_to_scaled_space(&self, position: DVec3) -> DVec3 {
        position * self.one_over_radii
    }

    /// Surface normal of the ellipsoid at (or through) `position`.
    pub fn geodetic_surface_normal(&self, position: DVec3) -> DVec3 {
        (position * self.one_over_radii_squared).normalize()
    }

    /// Surface normal at a geographic position.
    pub fn geodetic_surface_normal_cartographic(&self, carto: &Cartographic) -> DVec3 {
        let cos_latitude = carto.latitude.cos();
        DVec3::new(
            cos_latitude * carto.longitude.cos(),
            cos_latitude * carto.longitude.sin(),
            carto.latitude.sin(),
        )
        .normalize()
    }

    /// Convert a geographic position to ECEF.
    pub fn cartographic_to_cartesian(&self, carto: &Cartographic) -> DVec3 {
        let n = self.geodetic_surface_normal_cartographic(carto);
        let k = self.radii_squared * n;
        let gamma = n.dot(k).sqrt();
        k / gamma + n * carto.height
    }

    /// Convert an ECEF position to geographic coordinates.
    ///
    /// Returns `None` for positions at the center of the ellipsoid.
    pub fn cartesian_to_cartographic(&self, position: DVec3) -> Option<Cartographic> {
        let surface = self.scale_to_geodetic_surface(position)?;
        let n = self.geodetic_surface_normal(surface);
        let h = position - surface;
        Some(Cartographic {
            longitude: n.y.atan2(n.x),
            latitude: n.z.asin(),
            height: sign(h.dot(position)) * h.length(),
        })
    }

    /// Project a position along the geodetic normal onto the surface.
    ///
    /// Uses Newton's method on the scaling factor. Returns `None` near the
    /// center, where the projection is undefined.
    pub fn scale_to_geodetic_surface(&self, position: DVec3) -> Option<DVec3> {
        let scaled = position * self.one_over_radii;
        let squared = scaled * scaled;
        let squared_norm = squared.x + squared.y + squared.z;
        let ratio = (1.0 / squared_norm).sqrt();

        // Initial guess along the geocentric direction.
        let intersection = position * ratio;
        if squared_norm < EPSILON1 {
            return ratio.is_finite().then_some(intersection);
        }

        let oors = self.one_over_radii_squared;
        let gradient = intersection * oors * 2.0;
        let mut lambda = (1.0 - ratio) * position.length() / (0.5 * gradient.length());
        let mut correction = 0.0;
        let position2 = position * position * oors;

        let mut multiplier;
        loop {
            lambda -= correction;
            multiplier = DVec3::ONE / (DVec3::ONE + oors * lambda);
            let multiplier2 = multiplier * multiplier;
            let multiplier3 = multiplier2 * multiplier;

            let func = (position2 * multiplier2).element_sum() - 1.0;
            let derivative = -2.0 * (position2 * multiplier3 * oors).element_sum();
            correction = func / derivative;

            if func.abs() <= EPSILON12 {
                break;
            }
        }

        Some(position * multiplier)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cartographic_round_trip() {
        let ellipsoid = Ellipsoid::WGS84;
        let carto = Cartographic::from_degrees(-122.4, 37.8, 1500.0);
        let ecef = ellipsoid.cartographic_to_cartesian(&carto);
        let back = ellipsoid.cartesian_to_cartographic(ecef).unwrap();
        assert!((back.longitude - carto.longitude).abs() < 1e-12);
        assert!((back.latitude - carto.latitude).abs() < 1e-12);
        assert!((back.height - carto.height).abs() < 1e-6);
    }

    #[test]
    fn test_equator_and_pole() {
        let ellipsoid = Ellipsoid::WGS84;
        let equator = ellipsoid.cartographic_to_cartesian(&Cartographic::new(0.0, 0.0, 0.0));
        assert!((equator.x - 6_378_137.0).abs() < 1e-6);

        let pole = ellipsoid.cartographic_to_cartesian(&Cartographic::from_degrees(0.0, 90.0, 0.0));
        assert!((pole.z - 6_356_752.314_245_179).abs() < 1e-6);
    }

    #[test]
    fn test_center_has_no_cartographic() {
        assert!(Ellipsoid::WGS84.cartesian_to_cartographic(DVec3::ZERO).is_none());
    }

    #[test]
    fn test_scaled_point_lies_on_surface() {
        let ellipsoid = Ellipsoid::WGS84;
        let position = DVec3::new(-2_700_000.0, -4_290_000.0, 3_900_000.0);
        let surface = ellipsoid.scale_to_geodetic_surface(position).unwrap();
        let scaled = surface * ellipsoid.one_over_radii;
        assert!((scaled.length_squared() - 1.0).abs() < 1e-12);
        assert!(surface.length() > 6_350_000.0);
        let normal = ellipsoid.geodetic_surface_normal(surface);
        assert!((position - surface).normalize().dot(normal).abs() > 1.0 - 1e-9);
    }

    #[test]
    fn test_negative_height_below_surface() {
        let ellipsoid = Ellipsoid::WGS84;
        let carto = Cartographic::from_degrees(10.0, -45.0, -800.0);
        let ecef = ellipsoid.cartographic_to_cartesian(&carto);
        let back = ellipsoid.cartesian_to_cartographic(ecef).unwrap();
        assert!((back.height + 800.0).abs() < 1e-6);
    }
}
