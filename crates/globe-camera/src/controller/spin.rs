//! Spinning the globe: orbiting a picked point, free rotation and strafing.

use std::f64::consts::PI;

use globe_geometry::{
    Ellipsoid, Plane,
    math::{EPSILON2, EPSILON14, TWO_PI, acos_clamped, most_orthogonal_axis, vec_equals_epsilon},
    ray_plane,
};
use glam::{DMat4, DVec2, DVec3};

use super::{InteractionMode, ScreenSpaceCameraController};
use crate::aggregator::Movement;

/// Pick rays this close to the surface tangent plane switch spinning to strafing.
const TANGENT_PICK_THRESHOLD: f64 = 0.05;

/// Smallest rotation applied by an unconstrained pan.
const MINIMUM_PAN_ANGLE: f64 = 2.0e-8;

impl ScreenSpaceCameraController {
    pub(super) fn spin3d(&mut self, start_position: DVec2, movement: &Movement) {
        if self.camera.transform() != DMat4::IDENTITY {
            self.rotate3d(movement, None, false, false);
            return;
        }

        let pair = movement.pair();
        let height = self.working_height();
        let below_picking =
            self.globe_attached && height < self.settings.minimum_picking_terrain_height;

        let mut picked = None;
        if below_picking {
            picked = self.pick_globe(pair.start);
            if let Some(hit) = picked {
                let ray = self.camera.pick_ray(pair.start);
                let normal = self.ellipsoid.geodetic_surface_normal(hit);
                let tangent_pick = ray.direction.dot(normal).abs() < TANGENT_PICK_THRESHOLD;
                if tangent_pick && self.spin.mode != InteractionMode::Looking {
                    self.set_spin_mode(InteractionMode::Strafing);
                }
            }
        }

        let position = self.camera.position_wc();
        let rotation_axis = self.ellipsoid.geodetic_surface_normal(position);

        if self.spin.mouse_position == Some(start_position) {
            match self.spin.mode {
                InteractionMode::Looking => self.look3d(movement, Some(rotation_axis)),
                InteractionMode::Strafing => self.strafe(movement),
                InteractionMode::Orbiting { pivot } => {
                    self.pan3d(movement, &Ellipsoid::sphere(pivot.length()));
                }
                _ => self.rotate3d(movement, None, false, false),
            }
            return;
        }

        if below_picking {
            if let Some(hit) = picked {
                if position.length() < hit.length() {
                    self.set_spin_mode(InteractionMode::Strafing);
                    self.strafe(movement);
                } else if self.pan3d(movement, &Ellipsoid::sphere(hit.length())) {
                    self.set_spin_mode(InteractionMode::Orbiting { pivot: hit });
                }
            } else {
                self.set_spin_mode(InteractionMode::Looking);
                self.look3d(movement, Some(rotation_axis));
            }
        } else if let Some(hit) = self.camera.pick_ellipsoid(pair.start, &self.ellipsoid) {
            let ellipsoid = self.ellipsoid;
            if self.pan3d(movement, &ellipsoid) {
                self.set_spin_mode(InteractionMode::Orbiting { pivot: hit });
            }
        } else if height > self.settings.minimum_track_ball_height {
            self.set_spin_mode(InteractionMode::Rotating);
            self.rotate3d(movement, None, false, false);
        } else {
            self.set_spin_mode(InteractionMode::Looking);
            self.look3d(movement, Some(rotation_axis));
        }

        self.spin.mouse_position = Some(start_position);
    }

    /// Drag the surface of `ellipsoid` under the cursor.
    ///
    /// Returns `false` when either end of the drag misses the ellipsoid, in
    /// which case the movement is applied as a free rotation instead.
    pub(super) fn pan3d(&mut self, movement: &Movement, ellipsoid: &Ellipsoid) -> bool {
        if !self.enable_pan {
            return true;
        }

        let pair = movement.pair();
        let p0 = self.camera.pick_ellipsoid(pair.start, ellipsoid);
        let p1 = self.camera.pick_ellipsoid(pair.end, ellipsoid);
        let (Some(p0), Some(p1)) = (p0, p1) else {
            self.set_spin_mode(InteractionMode::Rotating);
            self.rotate3d(movement, None, false, false);
            return false;
        };

        let p0 = self.camera.world_to_camera_coordinates(p0);
        let p1 = self.camera.world_to_camera_coordinates(p1);

        match self.camera.constrained_axis {
            None => {
                let p0 = p0.normalize();
                let p1 = p1.normalize();
                let dot = p0.dot(p1);
                let axis = p0.cross(p1).normalize_or_zero();

                if dot <= 1.0 && !axis.abs_diff_eq(DVec3::ZERO, EPSILON14) {
                    let angle = dot.acos().max(MINIMUM_PAN_ANGLE);
                    self.camera.rotate(axis, angle);
                }
            }
            Some(axis) => self.constrained_pan(axis, p0, p1),
        }
        true
    }

    /// Pan expressed as a longitude and colatitude change about `basis0`.
    fn constrained_pan(&mut self, basis0: DVec3, p0: DVec3, p1: DVec3) {
        let basis1 = most_orthogonal_axis(basis0).cross(basis0).normalize();
        let basis2 = basis0.cross(basis1);

        let spherical = |p: DVec3| {
            let dot = basis0.dot(p);
            let theta = acos_clamped(dot / p.length());
            let rejection = (p - basis0 * dot).normalize();
            let mut phi = acos_clamped(rejection.dot(basis1));
            if rejection.dot(basis2) < 0.0 {
                phi = TWO_PI - phi;
            }
            (theta, phi)
        };
        let (start_theta, start_phi) = spherical(p0);
        let (end_theta, end_phi) = spherical(p1);
        let delta_phi = start_phi - end_phi;

        let position = self.camera.position_wc();
        let east = if vec_equals_epsilon(basis0, position, EPSILON2, EPSILON2) {
            self.camera.right_wc()
        } else {
            basis0.cross(position)
        };

        let plane_normal = basis0.cross(east);
        let side0 = plane_normal.dot(p0 - basis0);
        let side1 = plane_normal.dot(p1 - basis0);

        let delta_theta = if side0 > 0.0 && side1 > 0.0 {
            end_theta - start_theta
        } else if side0 > 0.0 && side1 <= 0.0 {
            if position.dot(basis0) > 0.0 {
                -start_theta - end_theta
            } else {
                start_theta + end_theta
            }
        } else {
            start_theta - end_theta
        };

        self.camera.rotate_right(delta_phi);
        self.camera.rotate_up(delta_theta);
    }

    /// Trackball rotation about the reference frame origin.
    ///
    /// `constrained_axis` temporarily replaces the camera's own constraint.
    /// Each half of the rotation is undone if it leaves the camera below the
    /// floor. Upward rotations are always kept outside under-ground mode.
    pub(super) fn rotate3d(
        &mut self,
        movement: &Movement,
        constrained_axis: Option<DVec3>,
        only_vertical: bool,
        only_horizontal: bool,
    ) {
        let old_axis = self.camera.constrained_axis;
        if constrained_axis.is_some() {
            self.camera.constrained_axis = constrained_axis;
        }

        let rho = self.camera.position().length();
        let rotate_rate = (self.rotate_factor * (rho - self.rotate_rate_range_adjustment))
            .min(self.settings.maximum_rotate_rate)
            .max(self.settings.minimum_rotate_rate);

        let pair = movement.pair();
        let viewport = self.camera.viewport();
        let max_ratio = self.settings.maximum_movement_ratio;
        let phi_ratio = ((pair.start.x - pair.end.x) / viewport.width).min(max_ratio);
        let theta_ratio = ((pair.start.y - pair.end.y) / viewport.height).min(max_ratio);

        let delta_phi = rotate_rate * phi_ratio * TWO_PI;
        let delta_theta = rotate_rate * theta_ratio * PI;

        if !only_vertical {
            self.camera.rotate_right(delta_phi);
            if self.is_below_floor() {
                tracing::debug!(delta_phi, "horizontal rotation rolled back");
                self.camera.rotate_right(-delta_phi);
            }
        }

        if !only_horizontal {
            self.camera.rotate_up(delta_theta);
            if self.is_below_floor() && (self.enable_under_ground || delta_theta > 0.0) {
                tracing::debug!(delta_theta, "vertical rotation rolled back");
                self.camera.rotate_up(-delta_theta);
            }
        }

        self.camera.constrained_axis = old_axis;
    }

    /// Translate in the plane through the start pick that faces the camera.
    pub(super) fn strafe(&mut self, movement: &Movement) {
        let pair = movement.pair();
        let Some(start) = self.pick_globe(pair.start) else {
            return;
        };

        let ray = self.camera.pick_ray(pair.end);
        let plane = Plane::from_point_normal(start, self.camera.direction_wc());
        let Some(intersection) = ray_plane(&ray, &plane) else {
            return;
        };

        let position = self.camera.position_wc();
        self.set_world_position(position + (start - intersection));

        if self.is_below_floor() {
            tracing::debug!("strafe rolled back");
            self.set_world_position(position);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::f64::consts::FRAC_PI_2;

    use globe_geometry::Cartographic;

    use super::super::tests::{PlateauScene, surface_point};
    use super::*;
    use crate::aggregator::MovementPair;
    use crate::frustum::Viewport;

    fn drag(controller: &ScreenSpaceCameraController, offset: DVec2) -> Movement {
        let center = controller.window_center();
        Movement::Drag(MovementPair::new(center, center + offset))
    }

    #[test]
    fn test_spin_from_orbit_height_pans_about_pick() {
        let mut controller = ScreenSpaceCameraController::default();
        let radius = controller.position_wc().length();
        let center = controller.window_center();

        controller.spin3d(center, &drag(&controller, DVec2::new(50.0, 0.0)));

        assert!(matches!(
            controller.mode(super::super::GestureKind::Spin),
            InteractionMode::Orbiting { .. }
        ));
        let moved = controller.position_wc();
        assert!(((moved.length() - radius) / radius).abs() < 1e-9);
        assert!(moved.distance(crate::camera::CameraFrame::default().position) > 1.0);
        assert!(controller.camera().frame().orthonormality_error() < 1e-9);
    }

    #[test]
    fn test_spin_mode_is_sticky_for_same_start() {
        let mut controller = ScreenSpaceCameraController::default();
        let center = controller.window_center();
        controller.spin3d(center, &drag(&controller, DVec2::new(20.0, 0.0)));
        let first = controller.mode(super::super::GestureKind::Spin);

        controller.spin3d(center, &drag(&controller, DVec2::new(40.0, 10.0)));
        assert_eq!(controller.mode(super::super::GestureKind::Spin), first);
    }

    #[test]
    fn test_spin_at_horizon_looks() {
        let mut controller = ScreenSpaceCameraController::default();
        controller.set_view(surface_point(7.0, 46.0, 1_000.0), 0.0, 0.0, 0.0);
        let position = controller.position_wc();
        let direction = controller.camera().frame().direction;
        let center = controller.window_center();

        controller.spin3d(center, &drag(&controller, DVec2::new(-60.0, 0.0)));

        assert_eq!(
            controller.mode(super::super::GestureKind::Spin),
            InteractionMode::Looking
        );
        assert_eq!(controller.position_wc(), position);
        assert!(controller.camera().frame().direction.angle_between(direction) > 0.01);
    }

    #[test]
    fn test_spin_in_space_rotates() {
        let mut controller = ScreenSpaceCameraController::default();
        controller.set_view(surface_point(0.0, 0.0, 20_000_000.0), 0.0, FRAC_PI_2, 0.0);
        let center = controller.window_center();

        controller.spin3d(center, &drag(&controller, DVec2::new(30.0, 0.0)));

        assert_eq!(
            controller.mode(super::super::GestureKind::Spin),
            InteractionMode::Rotating
        );
    }

    fn strafing_controller(under_ground: bool) -> ScreenSpaceCameraController {
        let mut controller =
            ScreenSpaceCameraController::new(Viewport::default(), PlateauScene { height: 5_000.0 });
        controller.set_enable_under_ground(under_ground);
        controller.set_view(surface_point(10.0, 30.0, 5_010.0), 0.0, -0.3, 0.0);
        controller
    }

    #[test]
    fn test_strafe_below_terrain_rolls_back() {
        let mut controller = strafing_controller(false);
        let before = *controller.camera().frame();

        controller.strafe(&drag(&controller, DVec2::new(0.0, -100.0)));

        assert_eq!(*controller.camera().frame(), before);
    }

    #[test]
    fn test_strafe_under_ground_uses_lower_floor() {
        let mut controller = strafing_controller(true);

        controller.strafe(&drag(&controller, DVec2::new(0.0, -100.0)));

        let height = controller
            .position_cartographic()
            .map_or(f64::NAN, |c: Cartographic| c.height);
        assert!(height < 5_000.0, "{height}");
        assert!(height > -980.0, "{height}");
    }
}
