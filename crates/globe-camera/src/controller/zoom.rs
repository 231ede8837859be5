//! Zooming towards the point under the cursor.
//!
//! A zoom gesture picks a target when it starts. Depending on the camera
//! height and view angle the zoom then either slides along the ray through
//! the target, rotates the globe so the target drifts towards the view
//! centre, or pans the camera along an arc that keeps the target in place.

use globe_geometry::math::acos_clamped;
use glam::{DVec2, DVec3};

use super::{InteractionMode, ScreenSpaceCameraController};
use crate::aggregator::Movement;

/// Below this height the target-tracking zoom is re-evaluated every frame.
const ROTATING_ZOOM_HEIGHT: f64 = 2_000_000.0;
/// Below this height the view centre is panned along an arc towards the target.
const ARC_PAN_HEIGHT: f64 = 1_000_000.0;
/// Below this height a shallow view zooms along the target ray.
const VECTOR_ZOOM_HEIGHT: f64 = 3_000.0;
/// Views flatter than this against the vertical zoom along the target ray.
const VECTOR_ZOOM_MAX_DOT: f64 = 0.6;
/// Target-to-centre angles above this rotate at a fixed fraction of the height.
const WIDE_ROTATION_DEGREES: f64 = 20.0;
/// Distance ahead of the camera used to re-aim after an arc pan.
const AIM_DISTANCE: f64 = 1_000.0;
/// Height the camera is lifted to when zooming under ground with nothing picked.
const RESURFACE_HEIGHT: f64 = 0.8;
/// Arc pans that end below this height are undone.
const ARC_PAN_FLOOR: f64 = 1.0;

impl ScreenSpaceCameraController {
    pub(super) fn zoom3d(&mut self, start_position: DVec2, movement: &Movement) {
        let center = self.window_center();
        let ray = self.camera.pick_ray(center);

        let height = self.working_height();
        let hit = if height < self.settings.minimum_picking_terrain_height {
            self.pick_globe(center)
        } else {
            None
        };
        let distance = hit.map_or(height, |hit| ray.origin.distance(hit));

        let unit_position = self.camera.position_wc().normalize();
        let direction = self.camera.direction_wc();
        self.handle_zoom(
            start_position,
            movement,
            self.settings.zoom_factor,
            distance,
            unit_position.dot(direction),
        );
    }

    /// Zoom by a rate that slows towards `distance_measure` meters away.
    pub(super) fn handle_zoom(
        &mut self,
        start_position: DVec2,
        movement: &Movement,
        zoom_factor: f64,
        distance_measure: f64,
        unit_position_dot_direction: f64,
    ) {
        let percentage = unit_position_dot_direction.abs().clamp(0.25, 1.0);
        let min_height = self.settings.minimum_zoom_distance * percentage;
        let max_height = self.settings.maximum_zoom_distance;

        let zoom_rate = (zoom_factor * (distance_measure - min_height))
            .max(self.settings.minimum_zoom_rate)
            .min(self.settings.maximum_zoom_rate);

        let pair = movement.zoom_pair();
        let range_window_ratio = ((pair.end.y - pair.start.y) / self.camera.viewport().height)
            .min(self.settings.maximum_movement_ratio);
        let mut distance = zoom_rate * range_window_ratio;

        if distance > 0.0 && (distance_measure - min_height).abs() < 1.0 {
            return;
        }
        if distance < 0.0 && (distance_measure - max_height).abs() < 1.0 {
            return;
        }

        if distance_measure - distance < min_height {
            distance = distance_measure - min_height - 1.0;
        } else if distance_measure - distance > max_height {
            distance = distance_measure - max_height;
        }

        let same_start = self.zoom.mouse_start == Some(start_position);
        let (was_on_vector, mut rotating_zoom) = if same_start {
            (
                matches!(self.zoom.mode, InteractionMode::ZoomingOnVector { .. }),
                self.zoom.mode == InteractionMode::RotatingZoom,
            )
        } else {
            self.zoom.mouse_start = Some(start_position);
            self.zoom.target = self.pick_globe(start_position);
            self.set_zoom_mode(InteractionMode::Idle);
            (false, false)
        };

        let Some(target) = self.zoom.target else {
            match self.camera.position_cartographic() {
                Some(cartographic) if cartographic.height < 0.0 => {
                    tracing::debug!("nothing to zoom towards under ground, resurfacing");
                    self.camera
                        .set_position_cartographic(&cartographic.with_height(RESURFACE_HEIGHT));
                }
                _ => self.camera.zoom_in(distance),
            }
            return;
        };

        let camera_height = self.camera.height();
        if camera_height < ROTATING_ZOOM_HEIGHT {
            rotating_zoom = true;
        }

        let mut zoom_on_vector = false;
        if !same_start || rotating_zoom {
            let position_normal = self.camera.position_wc().normalize();
            let direction = self.camera.direction_wc();

            if camera_height < VECTOR_ZOOM_HEIGHT
                && direction.dot(position_normal).abs() < VECTOR_ZOOM_MAX_DOT
            {
                zoom_on_vector = true;
            } else {
                let center = self.window_center();
                match self.pick_globe(center) {
                    Some(_) if camera_height < ARC_PAN_HEIGHT => {
                        self.arc_pan_to_target(target, distance);
                        return;
                    }
                    Some(center_position) => {
                        let picked_normal = target.normalize();
                        let center_normal = center_position.normalize();
                        let dot = picked_normal.dot(center_normal);

                        if dot > 0.0 && dot < 1.0 {
                            let angle = acos_clamped(dot);
                            let axis = picked_normal.cross(center_normal);
                            let denominator = if angle.abs() > WIDE_ROTATION_DEGREES.to_radians() {
                                camera_height * 0.75
                            } else {
                                camera_height - distance
                            };
                            self.camera.rotate(axis, angle * (distance / denominator));
                        }
                    }
                    None => zoom_on_vector = true,
                }
            }

            if !was_on_vector {
                self.set_zoom_mode(if zoom_on_vector {
                    InteractionMode::Idle
                } else {
                    InteractionMode::RotatingZoom
                });
            }
        }

        if (!same_start && zoom_on_vector) || was_on_vector {
            self.zoom_along_target_ray(start_position, target, distance);
        } else {
            self.camera.zoom_in(distance);
        }
    }

    /// Move along the ray through the target, as seen from the gesture start.
    fn zoom_along_target_ray(&mut self, start_position: DVec2, target: DVec3, distance: f64) {
        let through = match self.camera.world_to_window_coordinates(target) {
            Some(window) if self.zoom.mouse_start == Some(start_position) => window,
            _ => start_position,
        };
        let direction = self.camera.pick_ray(through).direction;

        self.camera.move_by(direction, distance);
        if self.is_below_floor() {
            tracing::debug!(distance, "vector zoom rolled back");
            self.camera.move_by(direction, -distance);
        }

        self.set_zoom_mode(InteractionMode::ZoomingOnVector { target });
    }

    /// Swing the camera along an arc so the zoom target stays under the cursor.
    ///
    /// When the target is above the camera the gesture has passed it. Outside
    /// under-ground mode that ends the gesture. Under ground the camera is
    /// instead lifted straight towards the surface.
    fn arc_pan_to_target(&mut self, target: DVec3, mut distance: f64) {
        let camera_position = self.camera.position_wc();
        let position_normal = camera_position.normalize();
        if target.normalize().dot(position_normal) < 0.0 {
            return;
        }

        let mut center = camera_position + self.camera.direction_wc() * AIM_DISTANCE;
        let position_to_target = target - camera_position;
        let position_to_target_normal = position_to_target.normalize();

        let alpha_dot = position_normal.dot(position_to_target_normal);
        let mut alpha = acos_clamped(-alpha_dot);
        let mut passed_target = false;
        if alpha_dot >= 0.0 {
            if !self.enable_under_ground {
                tracing::debug!("zoomed past target, next zoom picks a new one");
                self.zoom.mouse_start = None;
                return;
            }
            alpha = acos_clamped(alpha_dot);
            distance = -distance;
            passed_target = true;
            tracing::debug!(distance, "zoomed past target under ground");
        }

        let target_distance = target.length();
        let remaining_distance = camera_position.length() - distance;
        let gamma = (position_to_target.length() / target_distance * alpha.sin())
            .clamp(-1.0, 1.0)
            .asin();
        let delta = (remaining_distance / target_distance * alpha.sin())
            .clamp(-1.0, 1.0)
            .asin();
        let beta = gamma - delta + alpha;

        let up = position_normal;
        let right = position_to_target_normal.cross(up).normalize();
        let forward = up.cross(right).normalize();

        center = center.normalize() * (center.length() - distance);
        let mut new_position = position_normal * remaining_distance;

        if !passed_target {
            new_position += (up * (beta.cos() - 1.0) + forward * beta.sin()) * remaining_distance;

            let up = center.normalize();
            let forward = up.cross(right).normalize();
            center += (up * (beta.cos() - 1.0) + forward * beta.sin()) * center.length();
        }

        let old_up = self.camera.up_wc();
        self.set_world_position(new_position);

        if self.camera.height() < ARC_PAN_FLOOR {
            tracing::debug!("arc pan rolled back");
            self.set_world_position(camera_position);
            return;
        }

        let direction = (center - new_position).normalize();
        let right = direction.cross(old_up);
        let up = right.cross(direction);
        self.camera
            .set_axes(right.normalize(), direction, up.normalize());
    }
}

#[cfg(test)]
mod tests {
    use super::super::GestureKind;
    use super::super::tests::surface_point;
    use super::*;
    use crate::aggregator::MovementPair;
    use crate::frustum::Viewport;
    use crate::scene::EllipsoidScene;
    use crate::settings::ControllerSettings;

    fn zoom_drag(controller: &ScreenSpaceCameraController, dy: f64) -> (DVec2, Movement) {
        let center = controller.window_center();
        let movement = Movement::Drag(MovementPair::new(center, center + DVec2::new(0.0, dy)));
        (center, movement)
    }

    #[test]
    fn test_high_zoom_rotates_towards_target() {
        let mut controller = ScreenSpaceCameraController::default();
        let radius = controller.position_wc().length();

        let (start, movement) = zoom_drag(&controller, 72.0);
        controller.zoom3d(start, &movement);

        assert_eq!(controller.mode(GestureKind::Zoom), InteractionMode::RotatingZoom);
        assert!(controller.position_wc().length() < radius - 1_000.0);
    }

    #[test]
    fn test_zoom_out_backs_away() {
        let mut controller = ScreenSpaceCameraController::default();
        let radius = controller.position_wc().length();

        let (start, movement) = zoom_drag(&controller, -72.0);
        controller.zoom3d(start, &movement);

        assert!(controller.position_wc().length() > radius + 1_000.0);
    }

    #[test]
    fn test_zoom_without_target_moves_forward() {
        let mut controller = ScreenSpaceCameraController::default();
        controller.set_view(surface_point(0.0, 0.0, 20_000_000.0), 0.0, 1.5, 0.0);
        let before = controller.position_wc();
        let direction = controller.camera().frame().direction;

        let (start, movement) = zoom_drag(&controller, 36.0);
        controller.zoom3d(start, &movement);

        let moved = controller.position_wc() - before;
        assert!(moved.length() > 1.0);
        assert!(moved.normalize().dot(direction) > 1.0 - 1e-9);
    }

    #[test]
    fn test_shallow_low_zoom_follows_target_ray() {
        let mut controller = ScreenSpaceCameraController::default();
        controller.set_view(surface_point(8.5, 47.3, 500.0), 0.0, -0.3, 0.0);

        let center = controller.window_center();
        let target = controller.pick_globe(center).unwrap();
        let before = controller.position_wc().distance(target);

        let (start, movement) = zoom_drag(&controller, 72.0);
        controller.zoom3d(start, &movement);

        assert_eq!(
            controller.mode(GestureKind::Zoom),
            InteractionMode::ZoomingOnVector { target }
        );
        assert!(controller.position_wc().distance(target) < before - 1.0);
    }

    #[test]
    fn test_arc_pan_keeps_camera_above_ground() {
        let mut controller = ScreenSpaceCameraController::default();
        controller.set_view(surface_point(8.5, 47.3, 50_000.0), 0.0, -1.0, 0.0);

        let (start, movement) = zoom_drag(&controller, 72.0);
        controller.zoom3d(start, &movement);

        let height = controller.position_cartographic().map_or(f64::NAN, |c| c.height);
        assert!(height > 1.0 && height < 50_000.0, "{height}");
        assert!(controller.camera().frame().orthonormality_error() < 1e-9);
    }

    fn underground_controller(under_ground: bool) -> ScreenSpaceCameraController {
        let settings = ControllerSettings {
            zoom_factor: 20.0,
            ..ControllerSettings::default()
        };
        let mut controller =
            ScreenSpaceCameraController::with_settings(Viewport::default(), EllipsoidScene::default(), settings);
        controller.set_enable_under_ground(under_ground);
        controller.set_view(surface_point(0.0, 0.0, -50.0), 0.0, 1.0, 0.0);
        controller
    }

    #[test]
    fn test_zoom_past_target_while_under_ground() {
        let mut controller = underground_controller(true);
        let before = controller.position_wc();

        let (start, movement) = zoom_drag(&controller, 72.0);
        controller.zoom3d(start, &movement);

        let after = controller.position_wc();
        assert!(after.normalize().distance(before.normalize()) < 1e-12);
        assert!(after.length() > before.length() + 50.0);

        let height = controller.position_cartographic().map_or(f64::NAN, |c| c.height);
        assert!(height > 1.0 && height < 10.0, "{height}");
        assert!(controller.camera().frame().orthonormality_error() < 1e-9);
    }

    #[test]
    fn test_zoom_past_target_above_ground_restarts_gesture() {
        let mut controller = underground_controller(false);
        let before = *controller.camera().frame();

        let (start, movement) = zoom_drag(&controller, 72.0);
        controller.zoom3d(start, &movement);

        assert_eq!(*controller.camera().frame(), before);
        assert_eq!(controller.zoom.mouse_start, None);
    }

    #[test]
    fn test_zoom_stops_at_minimum_distance() {
        let mut controller = ScreenSpaceCameraController::default();
        let before = *controller.camera().frame();
        let (start, movement) = zoom_drag(&controller, 72.0);

        controller.handle_zoom(start, &movement, 5.0, 1.0, 1.0);

        assert_eq!(*controller.camera().frame(), before);
    }
}
