//! Projection parameters used for picking and flight framing.

use glam::DVec2;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Default vertical field of view in degrees.
pub const DEFAULT_FOVY_DEGREES: f64 = 60.0;

/// Symmetric perspective frustum.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PerspectiveFrustum {
    /// Vertical field of view in radians.
    pub fovy: f64,
    /// Width divided by height.
    pub aspect_ratio: f64,
    /// Distance to the near plane in meters.
    pub near: f64,
}

impl Default for PerspectiveFrustum {
    fn default() -> Self {
        Self {
            fovy: DEFAULT_FOVY_DEGREES.to_radians(),
            aspect_ratio: 1.0,
            near: 1.0,
        }
    }
}

impl PerspectiveFrustum {
    /// Half-height of the near plane divided by the near distance.
    pub fn tan_phi(&self) -> f64 {
        (self.fovy * 0.5).tan()
    }

    /// Half-width of the near plane divided by the near distance.
    pub fn tan_theta(&self) -> f64 {
        self.aspect_ratio * self.tan_phi()
    }

    /// Half-height of the near plane.
    pub fn top(&self) -> f64 {
        self.near * self.tan_phi()
    }

    /// Half-width of the near plane.
    pub fn right(&self) -> f64 {
        self.aspect_ratio * self.top()
    }
}

/// Size of the drawing surface in pixels. Window y grows downwards.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1280.0,
            height: 720.0,
        }
    }
}

impl Viewport {
    /// Create a viewport, rejecting empty or negative sizes.
    pub fn new(width: f64, height: f64) -> Result<Self> {
        if width > 0.0 && height > 0.0 {
            Ok(Self { width, height })
        } else {
            Err(Error::InvalidViewport { width, height })
        }
    }

    pub fn aspect_ratio(&self) -> f64 {
        self.width / self.height
    }

    pub fn center(&self) -> DVec2 {
        DVec2::new(self.width / 2.0, self.height / 2.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_empty_viewport() {
        assert_eq!(
            Viewport::new(0.0, 10.0),
            Err(Error::InvalidViewport {
                width: 0.0,
                height: 10.0
            })
        );
        assert!(Viewport::new(800.0, 600.0).is_ok());
    }

    #[test]
    fn test_near_plane_extents() {
        let frustum = PerspectiveFrustum {
            fovy: std::f64::consts::FRAC_PI_2,
            aspect_ratio: 2.0,
            near: 1.0,
        };
        assert!((frustum.top() - 1.0).abs() < 1e-12);
        assert!((frustum.right() - 2.0).abs() < 1e-12);
    }
}
