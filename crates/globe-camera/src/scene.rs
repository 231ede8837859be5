//! Scene queries consumed by the controller.
//!
//! The controller never owns terrain. It asks the host for ray hits and
//! terrain heights through [`SceneQuery`], and falls back to the bare
//! ellipsoid when the host has nothing to report.

use globe_geometry::{Cartographic, Ellipsoid, Ray, ray_ellipsoid};
use glam::DVec3;

/// Ray casting and height lookups provided by the host.
pub trait SceneQuery {
    /// Nearest hit of `ray` against any scene geometry.
    fn raycast(&self, ray: &Ray) -> Option<DVec3>;

    /// Nearest hit of `ray` against the globe's terrain.
    fn pick_globe(&self, ray: &Ray) -> Option<DVec3> {
        self.raycast(ray)
    }

    /// Terrain height under `position`, or `None` when no terrain is loaded there.
    fn height_at(&self, position: &Cartographic) -> Option<f64>;
}

/// A scene made of nothing but a smooth ellipsoid.
#[derive(Debug, Clone, Copy)]
pub struct EllipsoidScene {
    pub ellipsoid: Ellipsoid,
}

impl Default for EllipsoidScene {
    fn default() -> Self {
        Self {
            ellipsoid: Ellipsoid::WGS84,
        }
    }
}

impl SceneQuery for EllipsoidScene {
    fn raycast(&self, ray: &Ray) -> Option<DVec3> {
        let interval = ray_ellipsoid(ray, &self.ellipsoid)?;
        let t = if interval.start > 0.0 {
            interval.start
        } else {
            interval.stop
        };
        Some(ray.point_at(t))
    }

    fn height_at(&self, _position: &Cartographic) -> Option<f64> {
        Some(0.0)
    }
}

/// Terrain floor the camera may not sink below.
///
/// Missing terrain counts as sea level, and the floor never dips below it.
pub(crate) fn terrain_floor(terrain_height: Option<f64>, clearance: f64) -> f64 {
    terrain_height.unwrap_or(0.0).max(0.0) + clearance
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ellipsoid_scene_hits_surface() {
        let scene = EllipsoidScene::default();
        let ray = Ray::new(DVec3::new(1.0e7, 0.0, 0.0), DVec3::NEG_X);
        let hit = scene.raycast(&ray).unwrap();
        assert!((hit.x - 6_378_137.0).abs() < 1e-6);
        assert!(scene.pick_globe(&ray).is_some());
    }

    #[test]
    fn test_ellipsoid_scene_miss() {
        let scene = EllipsoidScene::default();
        let ray = Ray::new(DVec3::new(1.0e7, 0.0, 0.0), DVec3::X);
        assert!(scene.raycast(&ray).is_none());
    }

    #[test]
    fn test_terrain_floor() {
        assert!((terrain_floor(Some(120.0), 0.9) - 120.9).abs() < 1e-12);
        assert!((terrain_floor(Some(-50.0), 0.9) - 0.9).abs() < 1e-12);
        assert!((terrain_floor(None, 0.9) - 0.9).abs() < 1e-12);
    }
}
