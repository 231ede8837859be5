//! Tuning for the screen-space camera controller.
//!
//! Every threshold the controller consults lives here so hosts can load a
//! tuning file instead of recompiling. Heights and distances are in meters,
//! rates are unitless multipliers unless stated otherwise.

use serde::{Deserialize, Serialize};

/// Settings for camera interaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerSettings {
    /// Inertia coefficient for spinning and tilting. `1.0` disables inertia.
    pub inertia_spin: f64,
    /// Inertia coefficient for zooming. `1.0` disables inertia.
    pub inertia_zoom: f64,
    /// Largest fraction of the viewport a single movement may cover.
    pub maximum_movement_ratio: f64,
    /// Closest the camera may zoom towards its target.
    pub minimum_zoom_distance: f64,
    /// Farthest the camera may zoom away from its target.
    pub maximum_zoom_distance: f64,
    /// Below this height, gestures pick against terrain rather than the ellipsoid.
    pub minimum_picking_terrain_height: f64,
    /// Above this height, spinning without a pick becomes a free trackball rotation.
    pub minimum_track_ball_height: f64,
    /// Above this height, tilting pivots on the ellipsoid instead of terrain.
    pub minimum_collision_terrain_height: f64,
    /// Multiplier applied to the remaining distance when zooming.
    pub zoom_factor: f64,
    pub minimum_rotate_rate: f64,
    pub maximum_rotate_rate: f64,
    pub minimum_zoom_rate: f64,
    /// Distance from the Sun to Pluto.
    pub maximum_zoom_rate: f64,
    /// Ceiling enforced by keyboard movement.
    pub maximum_camera_height: f64,
    /// Divisor applied to the key repeat gap, in milliseconds.
    pub key_move_divisor: f64,
    /// Clearance kept above terrain when under-ground mode is off.
    pub terrain_clearance: f64,
    /// Lowest height allowed when under-ground mode is on.
    pub underground_floor: f64,
    /// Longest press, in seconds, that still produces inertia on release.
    pub inertia_max_click_time: f64,
}

impl Default for ControllerSettings {
    fn default() -> Self {
        Self {
            inertia_spin: 0.9,
            inertia_zoom: 0.8,
            maximum_movement_ratio: 0.1,
            minimum_zoom_distance: 1.0,
            maximum_zoom_distance: f64::MAX,
            minimum_picking_terrain_height: 150_000.0,
            minimum_track_ball_height: 7_500_000.0,
            minimum_collision_terrain_height: 15_000.0,
            zoom_factor: 5.0,
            minimum_rotate_rate: 0.0002,
            maximum_rotate_rate: 1.77,
            minimum_zoom_rate: 20.0,
            maximum_zoom_rate: 5_906_376_272_000.0,
            maximum_camera_height: 62_000_000.0,
            key_move_divisor: 8.0,
            terrain_clearance: 0.9,
            underground_floor: -980.0,
            inertia_max_click_time: 0.4,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_falls_back_to_defaults() {
        let settings: ControllerSettings =
            serde_json::from_str(r#"{ "inertia_spin": 1.0, "zoom_factor": 2.5 }"#).unwrap();
        assert!((settings.inertia_spin - 1.0).abs() < f64::EPSILON);
        assert!((settings.zoom_factor - 2.5).abs() < f64::EPSILON);
        assert_eq!(
            settings.minimum_collision_terrain_height,
            ControllerSettings::default().minimum_collision_terrain_height
        );
    }
}
