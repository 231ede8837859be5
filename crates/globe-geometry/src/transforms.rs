//! Local reference frames anchored on the ellipsoid.

use glam::{DMat4, DVec3, DVec4};

use crate::ellipsoid::Ellipsoid;
use crate::math::{EPSILON14, equals_epsilon, sign};

/// Transform from a local east-north-up frame at `origin` to ECEF.
///
/// The columns are east, north, up and the origin. On the polar axis, where
/// east is undefined, east is taken as +Y and north and up follow the sign of
/// `origin.z`.
pub fn east_north_up_to_fixed_frame(origin: DVec3, ellipsoid: &Ellipsoid) -> DMat4 {
    let (east, north, up) = if equals_epsilon(origin.x, 0.0, EPSILON14, EPSILON14)
        && equals_epsilon(origin.y, 0.0, EPSILON14, EPSILON14)
    {
        let s = sign(origin.z);
        (DVec3::Y, DVec3::X * s, DVec3::Z * s)
    } else {
        let up = ellipsoid.geodetic_surface_normal(origin);
        let east = DVec3::new(-origin.y, origin.x, 0.0).normalize();
        let north = up.cross(east);
        (east, north, up)
    };

    DMat4::from_cols(
        east.extend(0.0),
        north.extend(0.0),
        up.extend(0.0),
        DVec4::new(origin.x, origin.y, origin.z, 1.0),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ellipsoid::Cartographic;

    #[test]
    fn test_enu_at_equator_prime_meridian() {
        let ellipsoid = Ellipsoid::WGS84;
        let origin = ellipsoid.cartographic_to_cartesian(&Cartographic::new(0.0, 0.0, 0.0));
        let frame = east_north_up_to_fixed_frame(origin, &ellipsoid);

        assert!(frame.x_axis.truncate().abs_diff_eq(DVec3::Y, 1e-12));
        assert!(frame.y_axis.truncate().abs_diff_eq(DVec3::Z, 1e-12));
        assert!(frame.z_axis.truncate().abs_diff_eq(DVec3::X, 1e-12));
        assert!(frame.w_axis.truncate().abs_diff_eq(origin, 1e-6));
    }

    #[test]
    fn test_enu_at_south_pole() {
        let frame = east_north_up_to_fixed_frame(DVec3::new(0.0, 0.0, -10.0), &Ellipsoid::WGS84);
        assert!(frame.x_axis.truncate().abs_diff_eq(DVec3::Y, 1e-12));
        assert!(frame.y_axis.truncate().abs_diff_eq(DVec3::NEG_X, 1e-12));
        assert!(frame.z_axis.truncate().abs_diff_eq(DVec3::NEG_Z, 1e-12));
    }
}
