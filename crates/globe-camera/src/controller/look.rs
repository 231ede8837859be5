//! Free look: turning the camera in place.

use globe_geometry::math::{EPSILON2, EPSILON4, acos_clamped, vec_equals_epsilon};
use glam::{DVec2, DVec3};

use super::ScreenSpaceCameraController;
use crate::aggregator::Movement;

impl ScreenSpaceCameraController {
    /// Turn the camera by the angle the cursor swept.
    ///
    /// With a `rotation_axis`, turning is about that axis and looking up or
    /// down stops just short of it.
    pub(super) fn look3d(&mut self, movement: &Movement, rotation_axis: Option<DVec3>) {
        let pair = movement.pair();

        let horizontal = self.swept_angle(
            DVec2::new(pair.start.x, 0.0),
            DVec2::new(pair.end.x, 0.0),
            pair.start.x > pair.end.x,
        );
        match rotation_axis {
            Some(axis) => self.camera.look(axis, -horizontal),
            None => self.camera.look_left(horizontal),
        }

        let mut vertical = self.swept_angle(
            DVec2::new(0.0, pair.start.y),
            DVec2::new(0.0, pair.end.y),
            pair.start.y > pair.end.y,
        );
        let Some(axis) = rotation_axis else {
            self.camera.look_up(vertical);
            return;
        };

        let direction = self.camera.direction_wc();
        let north_parallel = vec_equals_epsilon(direction, axis, EPSILON2, EPSILON2);
        let south_parallel = vec_equals_epsilon(direction, -axis, EPSILON2, EPSILON2);

        if !north_parallel && !south_parallel {
            let angle_to_axis = acos_clamped(direction.dot(axis));
            if vertical > 0.0 && vertical > angle_to_axis {
                vertical = angle_to_axis - EPSILON4;
            }

            let angle_to_negative_axis = acos_clamped(direction.dot(-axis));
            if vertical < 0.0 && -vertical > angle_to_negative_axis {
                vertical = -angle_to_negative_axis + EPSILON4;
            }

            self.camera.look(axis.cross(direction), vertical);
        } else if (north_parallel && vertical < 0.0) || (south_parallel && vertical > 0.0) {
            let right = self.camera.right_wc();
            self.camera.look(right, -vertical);
        }
    }

    /// Angle between the pick rays through two window positions.
    fn swept_angle(&mut self, from: DVec2, to: DVec2, negate: bool) -> f64 {
        let start = self.camera.pick_ray(from).direction;
        let end = self.camera.pick_ray(to).direction;
        let angle = start.cross(end).length().atan2(start.dot(end));
        if negate { -angle } else { angle }
    }
}

#[cfg(test)]
mod tests {
    use std::f64::consts::FRAC_PI_2;

    use super::super::tests::surface_point;
    use super::*;
    use crate::aggregator::MovementPair;

    #[test]
    fn test_free_look_keeps_position() {
        let mut controller = ScreenSpaceCameraController::default();
        let position = controller.position_wc();
        let direction = controller.camera().frame().direction;

        let movement = Movement::Drag(MovementPair::new(
            DVec2::new(600.0, 300.0),
            DVec2::new(700.0, 340.0),
        ));
        controller.look3d(&movement, None);

        assert_eq!(controller.position_wc(), position);
        assert!(controller.camera().frame().direction.angle_between(direction) > 0.05);
        assert!(controller.camera().frame().orthonormality_error() < 1e-9);
    }

    #[test]
    fn test_horizontal_free_look_keeps_up_vector() {
        let mut controller = ScreenSpaceCameraController::default();
        controller.set_view(surface_point(140.0, -35.0, 2_000.0), 0.4, -0.3, 0.0);
        let up = controller.camera().frame().up;

        let movement = Movement::Drag(MovementPair::new(
            DVec2::new(640.0, 360.0),
            DVec2::new(690.0, 360.0),
        ));
        controller.look3d(&movement, None);

        assert!(controller.camera().frame().up.abs_diff_eq(up, 1e-12));
        assert!(controller.camera().frame().orthonormality_error() < 1e-9);
    }

    #[test]
    fn test_look_up_stops_short_of_axis() {
        let mut controller = ScreenSpaceCameraController::default();
        let position = surface_point(20.0, 50.0, 300.0);
        controller.set_view(position, 0.0, FRAC_PI_2 - 0.05, 0.0);
        let normal = controller.camera().ellipsoid().geodetic_surface_normal(position);

        let movement = Movement::Drag(MovementPair::new(
            DVec2::new(640.0, 10.0),
            DVec2::new(640.0, 710.0),
        ));
        controller.look3d(&movement, Some(normal));

        let pitch = controller.pitch();
        assert!((pitch - (FRAC_PI_2 - EPSILON4)).abs() < 1e-6, "{pitch}");
    }

    #[test]
    fn test_horizontal_look_about_axis_keeps_pitch() {
        let mut controller = ScreenSpaceCameraController::default();
        let position = surface_point(-3.0, 40.0, 1_000.0);
        controller.set_view(position, 1.0, -0.2, 0.0);
        let normal = controller.camera().ellipsoid().geodetic_surface_normal(position);
        let heading = controller.heading();

        let movement = Movement::Drag(MovementPair::new(
            DVec2::new(600.0, 360.0),
            DVec2::new(500.0, 360.0),
        ));
        controller.look3d(&movement, Some(normal));

        assert!((controller.pitch() + 0.2).abs() < 1e-9);
        assert!((controller.heading() - heading).abs() > 0.01);
    }
}
