//! Keyboard navigation.
//!
//! Held keys act once per frame. Direction keys replay a short drag from the
//! view centre through the same spin logic the mouse uses, and the zoom keys
//! move along the view direction at a rate proportional to height and to the
//! time since the previous frame.

use std::collections::HashSet;
use std::f64::consts::PI;

use globe_geometry::{
    Ellipsoid,
    math::{EPSILON14, TWO_PI},
};
use glam::{DVec2, DVec3};
use web_time::Instant;

use super::ScreenSpaceCameraController;
use crate::aggregator::{Movement, MovementPair};

/// Length of the synthetic drag a direction key produces, in pixels.
const KEY_DRAG_PIXELS: f64 = 5.0;

/// Keyboard pans that end below this height are undone.
const KEY_PAN_FLOOR: f64 = 1.0;

/// Smallest angle applied by a keyboard pan.
const MINIMUM_KEY_PAN_ANGLE: f64 = 2.0e-8;

/// Navigation keys the controller responds to while held.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NavigationKey {
    Left,
    Right,
    Forward,
    Backward,
    ZoomIn,
    ZoomOut,
    PageUp,
    PageDown,
}

impl NavigationKey {
    pub const DIRECTIONS: [NavigationKey; 4] = [
        NavigationKey::Left,
        NavigationKey::Right,
        NavigationKey::Forward,
        NavigationKey::Backward,
    ];

    /// Window-space drag a direction key stands for.
    fn drag_offset(self) -> Option<DVec2> {
        match self {
            NavigationKey::Left => Some(DVec2::new(KEY_DRAG_PIXELS, 0.0)),
            NavigationKey::Right => Some(DVec2::new(-KEY_DRAG_PIXELS, 0.0)),
            NavigationKey::Forward => Some(DVec2::new(0.0, KEY_DRAG_PIXELS)),
            NavigationKey::Backward => Some(DVec2::new(0.0, -KEY_DRAG_PIXELS)),
            _ => None,
        }
    }
}

impl ScreenSpaceCameraController {
    pub fn press_key(&mut self, key: NavigationKey) {
        self.held_keys.insert(key);
    }

    pub fn release_key(&mut self, key: NavigationKey) {
        self.held_keys.remove(&key);
    }

    pub fn held_keys(&self) -> &HashSet<NavigationKey> {
        &self.held_keys
    }

    pub(super) fn handle_key_down(&mut self, now: Instant) {
        let gap_ms = self.last_key_time.map_or(0.0, |last| {
            now.saturating_duration_since(last).as_secs_f64() * 1000.0
        });
        self.last_key_time = Some(now);

        let cartographic = self.camera.position_cartographic().unwrap_or_default();
        let height = cartographic.height;
        let frames = gap_ms / self.settings.key_move_divisor;
        let move_rate = height / 300.0 * frames;
        let page_move_rate = height / 100.0 * frames;
        let max_height = self.settings.maximum_camera_height;

        if self.enable_inputs {
            let center = self.window_center();
            for key in NavigationKey::DIRECTIONS {
                if !self.held_keys.contains(&key) {
                    continue;
                }
                if let Some(offset) = key.drag_offset() {
                    self.spin_by_key(center, center + offset);
                }
            }

            let floor = self.floor_height(&cartographic);
            if self.held_keys.contains(&NavigationKey::ZoomIn) {
                self.descend_by_key(height, floor, move_rate);
            }
            if self.held_keys.contains(&NavigationKey::ZoomOut) {
                self.ascend_by_key(height, max_height, move_rate);
            }
            if self.held_keys.contains(&NavigationKey::PageUp) {
                self.descend_by_key(height, floor, page_move_rate);
            }
            if self.held_keys.contains(&NavigationKey::PageDown) {
                self.ascend_by_key(height, max_height, page_move_rate);
            }
        }

        if self.key_looking
            && !NavigationKey::DIRECTIONS
                .iter()
                .any(|key| self.held_keys.contains(key))
        {
            self.key_looking = false;
        }

        if height > max_height {
            let normal = self.camera_surface_normal();
            tracing::debug!(height, max_height, "camera above ceiling, pulling down");
            self.camera.move_by(-normal, height - max_height);
        }
    }

    fn descend_by_key(&mut self, height: f64, floor: f64, rate: f64) {
        if height > floor {
            let amount = if height - rate <= floor {
                height - floor
            } else {
                rate
            };
            self.camera.move_forward(amount);
        }
    }

    fn ascend_by_key(&mut self, height: f64, max_height: f64, rate: f64) {
        if height < max_height {
            let amount = if height + rate >= max_height {
                max_height - height
            } else {
                rate
            };
            self.camera.move_backward(amount);
        }
    }

    fn spin_by_key(&mut self, start: DVec2, end: DVec2) {
        if self.key_looking {
            self.look_by_key(start, end);
            return;
        }

        let height = self.working_height();
        if height < self.settings.minimum_picking_terrain_height {
            match self.pick_globe(start) {
                Some(hit) => self.pan_by_key(start, end, &Ellipsoid::sphere(hit.length())),
                None => {
                    self.key_looking = true;
                    self.look_by_key(start, end);
                }
            }
        } else if self.camera.pick_ellipsoid(start, &self.ellipsoid).is_some() {
            let ellipsoid = self.ellipsoid;
            self.pan_by_key(start, end, &ellipsoid);
        } else if height > self.settings.minimum_track_ball_height {
            self.rotate_by_key(start, end);
        } else {
            self.key_looking = true;
            self.look_by_key(start, end);
        }
    }

    fn pan_by_key(&mut self, start: DVec2, end: DVec2, ellipsoid: &Ellipsoid) {
        let p0 = self.camera.pick_ellipsoid(start, ellipsoid);
        let p1 = self.camera.pick_ellipsoid(end, ellipsoid);
        let (Some(p0), Some(p1)) = (p0, p1) else {
            return;
        };

        let p0 = self.camera.world_to_camera_coordinates(p0).normalize();
        let p1 = self.camera.world_to_camera_coordinates(p1).normalize();
        let dot = p0.dot(p1);
        let axis = p0.cross(p1).normalize_or_zero();
        if dot > 1.0 || axis.abs_diff_eq(DVec3::ZERO, EPSILON14) {
            return;
        }

        let before = *self.camera.frame();
        self.camera.rotate(axis, dot.acos().max(MINIMUM_KEY_PAN_ANGLE));
        if self.camera.height() < KEY_PAN_FLOOR {
            tracing::debug!("keyboard pan rolled back");
            self.camera.set_frame(before);
        }
    }

    /// Trackball rotation at the fastest rate.
    fn rotate_by_key(&mut self, start: DVec2, end: DVec2) {
        let viewport = self.camera.viewport();
        let max_ratio = self.settings.maximum_movement_ratio;
        let phi_ratio = ((start.x - end.x) / viewport.width).min(max_ratio);
        let theta_ratio = ((start.y - end.y) / viewport.height).min(max_ratio);

        let rate = self.settings.maximum_rotate_rate;
        self.camera.rotate_right(rate * phi_ratio * TWO_PI);
        self.camera.rotate_up(rate * theta_ratio * PI);
    }

    fn look_by_key(&mut self, start: DVec2, end: DVec2) {
        let normal = self.camera_surface_normal();
        self.look3d(&Movement::Drag(MovementPair::new(start, end)), Some(normal));
    }
}

#[cfg(test)]
mod tests {
    use std::f64::consts::FRAC_PI_2;
    use std::time::Duration;

    use super::super::tests::{PlateauScene, surface_point};
    use super::*;
    use crate::frustum::Viewport;

    fn height(controller: &mut ScreenSpaceCameraController) -> f64 {
        controller
            .position_cartographic()
            .map_or(f64::NAN, |c| c.height)
    }

    fn hold(controller: &mut ScreenSpaceCameraController, key: NavigationKey, gap: Duration) {
        let t0 = Instant::now();
        controller.press_key(key);
        controller.update(t0);
        controller.update(t0 + gap);
    }

    #[test]
    fn test_zoom_key_descends_by_height_rate() {
        let mut controller = ScreenSpaceCameraController::default();
        controller.set_view(surface_point(12.0, 41.9, 10_000.0), 0.0, -FRAC_PI_2, 0.0);

        hold(&mut controller, NavigationKey::ZoomIn, Duration::from_millis(100));

        let expected = 10_000.0 - 10_000.0 / 300.0 * (100.0 / 8.0);
        assert!((height(&mut controller) - expected).abs() < 1e-6);
    }

    #[test]
    fn test_page_up_stops_at_terrain_floor() {
        let mut controller =
            ScreenSpaceCameraController::new(Viewport::default(), PlateauScene { height: 5.0 });
        controller.set_view(surface_point(12.0, 41.9, 10.0), 0.0, -FRAC_PI_2, 0.0);

        hold(&mut controller, NavigationKey::PageUp, Duration::from_secs(1));

        assert!((height(&mut controller) - 5.9).abs() < 1e-6);
    }

    #[test]
    fn test_zoom_out_key_stops_at_ceiling() {
        let mut controller = ScreenSpaceCameraController::default();
        controller.set_view(surface_point(0.0, 20.0, 61_999_000.0), 0.0, -FRAC_PI_2, 0.0);

        hold(&mut controller, NavigationKey::ZoomOut, Duration::from_millis(100));

        // Heights this far out only round-trip to a few millimetres.
        assert!((height(&mut controller) - 62_000_000.0).abs() < 1e-2);
    }

    #[test]
    fn test_camera_above_ceiling_is_pulled_down() {
        let mut controller = ScreenSpaceCameraController::default();
        controller.set_view(surface_point(0.0, 0.0, 70_000_000.0), 0.0, -FRAC_PI_2, 0.0);

        controller.update(Instant::now());

        assert!((height(&mut controller) - 62_000_000.0).abs() < 1e-2);
    }

    #[test]
    fn test_direction_key_pans_globe() {
        let mut controller = ScreenSpaceCameraController::default();
        let before = controller.position_wc();

        hold(&mut controller, NavigationKey::Left, Duration::from_millis(16));

        let after = controller.position_wc();
        assert!(((after.length() - before.length()) / before.length()).abs() < 1e-9);
        assert!(after.distance(before) > 1.0);
        assert!(!controller.key_looking);
    }

    #[test]
    fn test_key_looking_ends_on_release() {
        let mut controller = ScreenSpaceCameraController::default();
        controller.set_view(surface_point(6.6, 46.5, 1_000.0), 0.0, 0.3, 0.0);
        let position = controller.position_wc();

        hold(&mut controller, NavigationKey::Left, Duration::from_millis(16));
        assert!(controller.key_looking);
        assert_eq!(controller.position_wc(), position);

        controller.release_key(NavigationKey::Left);
        controller.update(Instant::now());
        assert!(!controller.key_looking);
        assert!(controller.held_keys().is_empty());
    }

    #[test]
    fn test_keys_ignored_while_inputs_disabled() {
        let mut controller = ScreenSpaceCameraController::default();
        controller.set_view(surface_point(12.0, 41.9, 10_000.0), 0.0, -FRAC_PI_2, 0.0);
        controller.set_enable_inputs(false);
        let before = *controller.camera().frame();

        hold(&mut controller, NavigationKey::ZoomIn, Duration::from_millis(100));

        assert_eq!(*controller.camera().frame(), before);
    }
}
