//! Interactive camera navigation over a WGS84 globe.
//!
//! This crate provides:
//! - [`CameraController`], the camera pose with lazily derived world state and
//!   the primitive rotate, move, look and zoom operations.
//! - [`EventAggregator`], which folds raw pointer, wheel and pinch events into
//!   one movement per gesture channel per frame.
//! - [`ScreenSpaceCameraController`], which turns aggregated movements and
//!   held keys into spin, zoom, tilt and look gestures with inertia and
//!   terrain collision.
//! - Scripted flights ([`FlyToOptions`]) whose lifecycle is reported as
//!   [`FlightEvent`] values.
//!
//! ## Frame loop
//!
//! ```text
//! host events ─► handle_input ─► EventAggregator
//!                                      │
//! host frame tick ─► update(now) ──────┴─► camera pose ─► host renderer
//! ```
//!
//! Terrain is never owned here. Hosts implement [`SceneQuery`] to report ray
//! hits and terrain heights, or use [`EllipsoidScene`] for a bare globe.

pub mod aggregator;
pub mod camera;
pub mod controller;
pub mod error;
pub mod flight;
pub mod frustum;
pub mod scene;
pub mod settings;
pub mod tween;

pub use aggregator::{
    EventAggregator, GestureCategory, InputEvent, Modifier, MouseButton, Movement, MovementPair,
};
pub use camera::{CameraController, CameraFrame};
pub use controller::{GestureKind, InteractionMode, NavigationKey, ScreenSpaceCameraController};
pub use error::{Error, Result};
pub use flight::{FlightEvent, FlightId, FlyToOptions};
pub use frustum::{PerspectiveFrustum, Viewport};
pub use scene::{EllipsoidScene, SceneQuery};
pub use settings::ControllerSettings;
pub use tween::Easing;
