//! Tilting: swinging the camera over a pivot in a local east-north-up frame.
//!
//! High above the globe the pivot is the ellipsoid point at the view centre.
//! Close to the ground it is the terrain point under the cursor, and the
//! vertical swing happens about a second pivot on the same sphere so the
//! horizon stays level.

use std::f64::consts::FRAC_PI_2;

use globe_geometry::{
    Ellipsoid, east_north_up_to_fixed_frame, grazing_altitude_location,
    math::{EPSILON3, EPSILON4, EPSILON6, angle_between},
    ray_ellipsoid,
};
use glam::{DMat4, DVec2, DVec3};

use super::{InteractionMode, ScreenSpaceCameraController};
use crate::aggregator::Movement;

/// Up vectors closer than this to the surface normal level the roll about the view direction.
const STEEP_VIEW_DOT: f64 = 0.707;

impl ScreenSpaceCameraController {
    pub(super) fn tilt3d(&mut self, start_position: DVec2, movement: &Movement) {
        if self.camera.transform() != DMat4::IDENTITY {
            return;
        }

        if self.tilt.mouse_position != Some(start_position) {
            self.tilt.on_ellipsoid =
                self.working_height() > self.settings.minimum_collision_terrain_height;
            if self.tilt.mode == InteractionMode::Looking {
                self.set_tilt_mode(InteractionMode::Idle);
            }
        }

        if self.tilt.mode == InteractionMode::Looking {
            let normal = self.camera_surface_normal();
            self.look3d(movement, Some(normal));
            return;
        }

        if self.tilt.on_ellipsoid {
            self.tilt_on_ellipsoid(start_position, movement);
        } else {
            self.tilt_on_terrain(start_position, movement);
            self.level_roll();
        }
    }

    pub(super) fn camera_surface_normal(&mut self) -> DVec3 {
        let position = self.camera.position_wc();
        self.ellipsoid.geodetic_surface_normal(position)
    }

    /// Fall back to looking around when there is nothing to tilt over.
    fn tilt_by_looking(&mut self, start_position: DVec2, movement: &Movement) {
        self.set_tilt_mode(InteractionMode::Looking);
        let normal = self.camera_surface_normal();
        self.look3d(movement, Some(normal));
        self.tilt.mouse_position = Some(start_position);
    }

    fn tilt_on_ellipsoid(&mut self, start_position: DVec2, movement: &Movement) {
        let min_height = self.settings.minimum_zoom_distance * 0.25;
        let height = self.working_height();
        let pair = movement.pair();
        if height - min_height - 1.0 < EPSILON3 && pair.end.y - pair.start.y < 0.0 {
            return;
        }

        let window_center = self.window_center();
        let ray = self.camera.pick_ray(window_center);

        let pivot = if let Some(interval) = ray_ellipsoid(&ray, &self.ellipsoid) {
            ray.point_at(interval.start)
        } else if height > self.settings.minimum_track_ball_height {
            let Some(grazing) = grazing_altitude_location(&ray, &self.ellipsoid) else {
                return;
            };
            let Some(cartographic) = self.ellipsoid.cartesian_to_cartographic(grazing) else {
                return;
            };
            self.ellipsoid
                .cartographic_to_cartesian(&cartographic.with_height(0.0))
        } else {
            self.tilt_by_looking(start_position, movement);
            return;
        };

        self.set_tilt_mode(InteractionMode::Orbiting { pivot });
        let transform = east_north_up_to_fixed_frame(pivot, &self.ellipsoid);
        self.with_local_frame(transform, |controller| {
            controller.rotate3d(movement, Some(DVec3::Z), false, false);
        });
    }

    fn tilt_on_terrain(&mut self, start_position: DVec2, movement: &Movement) {
        let center = if self.tilt.mouse_position == Some(start_position) {
            self.tilt.center
        } else {
            let Some(center) = self.pick_tilt_center(start_position, movement) else {
                return;
            };
            self.tilt.mouse_position = Some(start_position);
            self.tilt.center = center;
            self.set_tilt_mode(InteractionMode::Orbiting { pivot: center });
            center
        };

        let window_position = DVec2::new(self.camera.viewport().width / 2.0, start_position.y);
        let ray = self.camera.pick_ray(window_position);
        let magnitude = center.length();
        let sphere = Ellipsoid::sphere(magnitude);
        let Some(interval) = ray_ellipsoid(&ray, &sphere) else {
            return;
        };
        let t = if ray.origin.length() > magnitude {
            interval.start
        } else {
            interval.stop
        };
        let vertical_center = ray.point_at(t);

        let transform = east_north_up_to_fixed_frame(center, &self.ellipsoid);
        let vertical_transform = east_north_up_to_fixed_frame(vertical_center, &sphere);
        let pair = movement.pair();

        self.with_local_frame(transform, |controller| {
            let tangent = vertical_center.cross(controller.camera.position_wc());
            let dot = controller.camera.right_wc().dot(tangent);

            controller.rotate3d(movement, Some(DVec3::Z), false, true);

            controller.camera.set_transform(vertical_transform);
            if dot < 0.0 {
                let constraint = if pair.start.y > pair.end.y {
                    None
                } else {
                    Some(DVec3::Z)
                };
                let old_axis = controller.camera.constrained_axis.take();
                controller.rotate3d(movement, constraint, true, false);
                controller.camera.constrained_axis = old_axis;
            } else {
                controller.rotate3d(movement, Some(DVec3::Z), true, false);
            }

            controller.level_to_constraint();
        });
    }

    /// Terrain point to tilt over, falling back to the ellipsoid.
    fn pick_tilt_center(&mut self, start_position: DVec2, movement: &Movement) -> Option<DVec3> {
        let picked = if self.camera.height() < 0.0 {
            self.pick_globe(start_position)
        } else {
            let ray = self.camera.pick_ray(start_position);
            match self.scene.raycast(&ray) {
                Some(hit) => Some(hit),
                None => self.pick_globe(start_position),
            }
        };
        if picked.is_some() {
            return picked;
        }

        let ray = self.camera.pick_ray(start_position);
        match ray_ellipsoid(&ray, &self.ellipsoid) {
            Some(interval) => Some(ray.point_at(interval.start)),
            None => {
                if self.working_height() <= self.settings.minimum_track_ball_height {
                    self.tilt_by_looking(start_position, movement);
                }
                None
            }
        }
    }

    /// Run `f` with the camera re-expressed in `transform` and the controller
    /// working against the unit sphere.
    fn with_local_frame(&mut self, transform: DMat4, f: impl FnOnce(&mut Self)) {
        let globe_attached = self.globe_attached;
        let ellipsoid = self.ellipsoid;
        let old_transform = self.camera.transform();

        self.globe_attached = false;
        self.ellipsoid = Ellipsoid::UNIT_SPHERE;
        self.rotate_factor = 1.0;
        self.rotate_rate_range_adjustment = 1.0;
        self.camera.set_transform(transform);

        f(self);

        self.camera.set_transform(old_transform);
        self.globe_attached = globe_attached;
        self.ellipsoid = ellipsoid;
        self.reset_rotate_factors();
    }

    /// Square the right vector against the camera's constrained axis.
    fn level_to_constraint(&mut self) {
        let Some(axis) = self.camera.constrained_axis else {
            return;
        };
        let direction = self.camera.direction();
        let mut right = direction.cross(axis).normalize_or_zero();
        if right.abs_diff_eq(DVec3::ZERO, EPSILON6) {
            return;
        }
        if right.dot(self.camera.right()) < 0.0 {
            right = -right;
        }

        let up = right.cross(direction);
        let right = direction.cross(up);
        self.camera
            .set_axes(right.normalize(), direction, up.normalize());
    }

    /// Remove roll so the right vector stays parallel to the surface.
    fn level_roll(&mut self) {
        let normal = self.camera_surface_normal();
        let angle = angle_between(normal, self.camera.right_wc());
        if (FRAC_PI_2 - angle).abs() < EPSILON4 {
            return;
        }

        let up = self.camera.up_wc();
        let look_axis = if normal.dot(up).abs() > STEEP_VIEW_DOT {
            self.camera.direction_wc()
        } else {
            up
        };
        self.camera.look(look_axis, angle - FRAC_PI_2);
    }
}
