//! Gesture modes, input bindings and inertia bookkeeping.

use glam::{DVec2, DVec3};

use crate::aggregator::{GestureCategory, Modifier};

/// How a continuous gesture is currently being interpreted.
///
/// Each gesture kind owns one mode. A mode is sticky while the gesture
/// keeps the same start position.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum InteractionMode {
    #[default]
    Idle,
    /// Panning the globe about a picked surface point.
    Orbiting { pivot: DVec3 },
    /// Turning the camera in place.
    Looking,
    /// Translating in the plane facing the camera.
    Strafing,
    /// Free trackball rotation driven by screen ratios.
    Rotating,
    /// Moving along the ray through a picked target.
    ZoomingOnVector { target: DVec3 },
    /// Zooming while rotating the globe to keep the target under the cursor.
    RotatingZoom,
}

impl InteractionMode {
    pub fn name(&self) -> &'static str {
        match self {
            InteractionMode::Idle => "idle",
            InteractionMode::Orbiting { .. } => "orbiting",
            InteractionMode::Looking => "looking",
            InteractionMode::Strafing => "strafing",
            InteractionMode::Rotating => "rotating",
            InteractionMode::ZoomingOnVector { .. } => "zooming on vector",
            InteractionMode::RotatingZoom => "rotating zoom",
        }
    }

    pub(crate) fn same_kind(&self, other: &InteractionMode) -> bool {
        std::mem::discriminant(self) == std::mem::discriminant(other)
    }
}

/// Gesture handled by the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GestureKind {
    Spin,
    Zoom,
    Tilt,
    Look,
}

impl GestureKind {
    /// Channels that drive this gesture.
    pub fn bindings(self) -> &'static [(GestureCategory, Modifier)] {
        match self {
            GestureKind::Spin => &[(GestureCategory::LeftDrag, Modifier::None)],
            GestureKind::Zoom => &[
                (GestureCategory::RightDrag, Modifier::None),
                (GestureCategory::Wheel, Modifier::None),
                (GestureCategory::Pinch, Modifier::None),
            ],
            GestureKind::Tilt => &[
                (GestureCategory::MiddleDrag, Modifier::None),
                (GestureCategory::Pinch, Modifier::None),
                (GestureCategory::LeftDrag, Modifier::Ctrl),
                (GestureCategory::RightDrag, Modifier::Ctrl),
            ],
            GestureKind::Look => &[(GestureCategory::LeftDrag, Modifier::Shift)],
        }
    }
}

/// Synthetic movement produced after a quick release.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct InertiaState {
    pub active: bool,
    pub motion: DVec2,
    pub start: DVec2,
    pub end: DVec2,
}

/// Exponential velocity falloff `t` seconds after release.
pub(crate) fn decay(t: f64, coefficient: f64) -> f64 {
    if t < 0.0 {
        return 0.0;
    }
    let tau = (1.0 - coefficient) * 25.0;
    (-tau * t).exp()
}
