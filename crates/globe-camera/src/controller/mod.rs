//! Screen-space camera controller.
//!
//! Turns aggregated pointer, wheel, pinch and key input into camera motion
//! over the globe, and runs scripted flights. The host calls
//! [`ScreenSpaceCameraController::update`] once per frame:
//!
//! ```text
//! advance flight ─► choose working ellipsoid ─► spin / zoom / tilt / look
//!                                             ─► reset aggregator ─► held keys
//! ```
//!
//! ## Gesture bindings
//!
//! | Gesture | Channels                                        |
//! |---------|-------------------------------------------------|
//! | Spin    | left drag                                       |
//! | Zoom    | right drag, wheel, pinch                        |
//! | Tilt    | middle drag, pinch, ctrl+left drag, ctrl+right  |
//! | Look    | shift+left drag                                 |
//!
//! Every motion that would leave the camera below the terrain floor is
//! undone by applying the inverse of the step just taken.

mod keyboard;
mod look;
mod mode;
mod spin;
mod tilt;
mod zoom;

use std::collections::HashSet;

use globe_geometry::{Cartographic, Ellipsoid, Ray, Rectangle, math::EPSILON14};
use glam::{DMat4, DVec2, DVec3};
use web_time::Instant;

pub use keyboard::NavigationKey;
pub use mode::{GestureKind, InteractionMode};

use crate::aggregator::{EventAggregator, GestureCategory, InputEvent, Modifier, Movement, MovementPair};
use crate::camera::CameraController;
use crate::error::Result;
use crate::flight::{Flight, FlightEvent, FlightId, FlightPlan, FlyToOptions};
use crate::frustum::Viewport;
use crate::scene::{EllipsoidScene, SceneQuery, terrain_floor};
use crate::settings::ControllerSettings;
use mode::{InertiaState, decay};

/// How far along a pick ray the reversed under-ground pick starts.
const UNDERGROUND_PICK_DISTANCE: f64 = 10_000_000.0;

/// Movement shorter than this, in pixels, ends inertia.
const INERTIA_STOP_DISTANCE: f64 = 0.3;

// ============================================================================
// Per-gesture state
// ============================================================================

#[derive(Debug, Clone, Copy, Default)]
struct SpinState {
    mode: InteractionMode,
    /// Start position of the gesture the mode was chosen for.
    mouse_position: Option<DVec2>,
}

#[derive(Debug, Clone, Copy, Default)]
struct ZoomState {
    mode: InteractionMode,
    mouse_start: Option<DVec2>,
    /// World point picked under the cursor when the gesture started.
    target: Option<DVec3>,
}

#[derive(Debug, Clone, Copy, Default)]
struct TiltState {
    mode: InteractionMode,
    mouse_position: Option<DVec2>,
    center: DVec3,
    on_ellipsoid: bool,
}

// ============================================================================
// Controller
// ============================================================================

/// Per-frame camera interaction state machine.
pub struct ScreenSpaceCameraController {
    camera: CameraController,
    aggregator: EventAggregator,
    settings: ControllerSettings,
    scene: Box<dyn SceneQuery>,

    enable_inputs: bool,
    enable_rotate: bool,
    enable_zoom: bool,
    enable_tilt: bool,
    enable_look: bool,
    enable_pan: bool,
    enable_under_ground: bool,

    /// Globe ellipsoid, or the unit sphere under a local reference frame.
    ellipsoid: Ellipsoid,
    globe_attached: bool,
    rotate_factor: f64,
    rotate_rate_range_adjustment: f64,

    spin: SpinState,
    zoom: ZoomState,
    tilt: TiltState,
    spin_inertia: InertiaState,
    zoom_inertia: InertiaState,
    tilt_inertia: InertiaState,

    held_keys: HashSet<NavigationKey>,
    last_key_time: Option<Instant>,
    key_looking: bool,

    flight: Option<(FlightId, Flight)>,
    next_flight_id: u64,
}

impl Default for ScreenSpaceCameraController {
    fn default() -> Self {
        Self::new(Viewport::default(), EllipsoidScene::default())
    }
}

impl ScreenSpaceCameraController {
    pub fn new(viewport: Viewport, scene: impl SceneQuery + 'static) -> Self {
        Self::with_settings(viewport, scene, ControllerSettings::default())
    }

    pub fn with_settings(
        viewport: Viewport,
        scene: impl SceneQuery + 'static,
        settings: ControllerSettings,
    ) -> Self {
        let camera = CameraController::new(viewport);
        let ellipsoid = *camera.ellipsoid();
        let radius = ellipsoid.maximum_radius();
        Self {
            camera,
            aggregator: EventAggregator::new(viewport.width),
            settings,
            scene: Box::new(scene),
            enable_inputs: true,
            enable_rotate: true,
            enable_zoom: true,
            enable_tilt: true,
            enable_look: true,
            enable_pan: true,
            enable_under_ground: false,
            ellipsoid,
            globe_attached: true,
            rotate_factor: 1.0 / radius,
            rotate_rate_range_adjustment: radius,
            spin: SpinState::default(),
            zoom: ZoomState::default(),
            tilt: TiltState::default(),
            spin_inertia: InertiaState::default(),
            zoom_inertia: InertiaState::default(),
            tilt_inertia: InertiaState::default(),
            held_keys: HashSet::new(),
            last_key_time: None,
            key_looking: false,
            flight: None,
            next_flight_id: 0,
        }
    }

    // ------------------------------------------------------------------------
    // Frame loop
    // ------------------------------------------------------------------------

    /// Feed one raw input event. Takes effect on the next [`Self::update`].
    pub fn handle_input(&mut self, event: &InputEvent) {
        self.aggregator.handle(event);
    }

    /// Run one frame. Returns the flight events raised during the frame.
    pub fn update(&mut self, now: Instant) -> Vec<FlightEvent> {
        let mut events = Vec::new();
        self.advance_flight(now, &mut events);

        if self.camera.transform() == DMat4::IDENTITY {
            self.globe_attached = true;
            self.ellipsoid = *self.camera.ellipsoid();
        } else {
            self.globe_attached = false;
            self.ellipsoid = Ellipsoid::UNIT_SPHERE;
        }
        self.reset_rotate_factors();

        for kind in [
            GestureKind::Spin,
            GestureKind::Zoom,
            GestureKind::Tilt,
            GestureKind::Look,
        ] {
            self.react_to_input(kind, now);
        }
        self.aggregator.reset();

        self.handle_key_down(now);
        events
    }

    fn reset_rotate_factors(&mut self) {
        let radius = self.ellipsoid.maximum_radius();
        self.rotate_factor = 1.0 / radius;
        self.rotate_rate_range_adjustment = radius;
    }

    fn is_enabled(&self, kind: GestureKind) -> bool {
        self.enable_inputs
            && match kind {
                GestureKind::Spin => self.enable_rotate,
                GestureKind::Zoom => self.enable_zoom,
                GestureKind::Tilt => self.enable_tilt,
                GestureKind::Look => self.enable_look,
            }
    }

    fn react_to_input(&mut self, kind: GestureKind, now: Instant) {
        if !self.is_enabled(kind) {
            return;
        }

        let coefficient = match kind {
            GestureKind::Spin | GestureKind::Tilt => self.settings.inertia_spin,
            GestureKind::Zoom => self.settings.inertia_zoom,
            GestureKind::Look => 1.0,
        };

        for &(category, modifier) in kind.bindings() {
            if self.aggregator.is_moving(category, modifier) {
                let movement = self.aggregator.movement(category, modifier);
                let start_position = self.aggregator.start_mouse_position(category, modifier);
                self.dispatch(kind, start_position, &movement);
            } else if coefficient < 1.0 {
                self.maintain_inertia(kind, category, modifier, coefficient, now);
            }
        }
    }

    fn dispatch(&mut self, kind: GestureKind, start_position: DVec2, movement: &Movement) {
        match kind {
            GestureKind::Spin => self.spin3d(start_position, movement),
            GestureKind::Zoom => self.zoom3d(start_position, movement),
            GestureKind::Tilt => self.tilt3d(start_position, movement),
            GestureKind::Look => self.look3d(movement, None),
        }
    }

    fn inertia_mut(&mut self, kind: GestureKind) -> Option<&mut InertiaState> {
        match kind {
            GestureKind::Spin => Some(&mut self.spin_inertia),
            GestureKind::Zoom => Some(&mut self.zoom_inertia),
            GestureKind::Tilt => Some(&mut self.tilt_inertia),
            GestureKind::Look => None,
        }
    }

    /// Continue a quick gesture after release with a decaying movement.
    fn maintain_inertia(
        &mut self,
        kind: GestureKind,
        category: GestureCategory,
        modifier: Modifier,
        coefficient: f64,
        now: Instant,
    ) {
        let pressed = self.aggregator.button_press_time(category, modifier);
        let released = self.aggregator.button_release_time(category, modifier);
        let last_movement = self.aggregator.last_movement(category, modifier);
        let max_click_time = self.settings.inertia_max_click_time;

        let held = pressed
            .zip(released)
            .and_then(|(pressed, released)| released.checked_duration_since(pressed));
        let Some(state) = self.inertia_mut(kind) else {
            return;
        };
        let (Some(held), Some(released)) = (held, released) else {
            state.active = false;
            return;
        };
        if held.as_secs_f64() >= max_click_time {
            state.active = false;
            return;
        }

        let d = decay(now.saturating_duration_since(released).as_secs_f64(), coefficient);

        if state.active {
            state.start = state.end;
            state.end = state.start + state.motion * d;
            state.motion = DVec2::ZERO;
        } else {
            let Some(last) = last_movement.map(|movement| movement.pair()) else {
                return;
            };
            if last.start.abs_diff_eq(last.end, EPSILON14) {
                return;
            }

            state.motion = last.delta() * 0.5;
            state.start = last.start;
            state.end = state.start + state.motion * d;
            state.active = true;
            tracing::debug!(?kind, motion = ?state.motion, "inertia started");
        }

        if state.start.distance(state.end) < INERTIA_STOP_DISTANCE {
            state.active = false;
            return;
        }

        let movement = Movement::Drag(MovementPair::new(state.start, state.end));
        if !self.aggregator.is_button_down(category, modifier) {
            let start_position = self.aggregator.start_mouse_position(category, modifier);
            self.dispatch(kind, start_position, &movement);
        }
    }

    // ------------------------------------------------------------------------
    // Flights
    // ------------------------------------------------------------------------

    fn advance_flight(&mut self, now: Instant, events: &mut Vec<FlightEvent>) {
        let Some((id, flight)) = self.flight.as_mut() else {
            return;
        };
        if flight.advance(&mut self.camera, now) {
            let id = *id;
            self.flight = None;
            self.enable_inputs = true;
            tracing::info!(flight = id.0, "flight completed");
            events.push(FlightEvent::Completed(id));
        }
    }

    /// Start a flight, cancelling any flight already in progress.
    pub fn fly_to(&mut self, options: &FlyToOptions) -> Vec<FlightEvent> {
        let mut events: Vec<FlightEvent> = self.cancel_flight().into_iter().collect();

        let id = FlightId(self.next_flight_id);
        self.next_flight_id += 1;
        events.push(FlightEvent::Started(id));

        match FlightPlan::new(&mut self.camera, options) {
            FlightPlan::Empty => {
                tracing::info!(flight = id.0, "already at flight destination");
                events.push(FlightEvent::Completed(id));
            }
            FlightPlan::Immediate(path) => {
                path.apply(&mut self.camera, 1.0);
                tracing::info!(flight = id.0, "flight applied immediately");
                events.push(FlightEvent::Completed(id));
            }
            FlightPlan::Animated(flight) => {
                tracing::info!(
                    flight = id.0,
                    duration = flight.duration(),
                    easing = ?flight.easing(),
                    "flight started"
                );
                self.enable_inputs = false;
                self.flight = Some((id, flight));
            }
        }
        events
    }

    pub fn fly_to_cartographic(
        &mut self,
        destination: &Cartographic,
        heading: f64,
        pitch: f64,
        roll: f64,
        duration: Option<f64>,
    ) -> Vec<FlightEvent> {
        let destination = self.camera.ellipsoid().cartographic_to_cartesian(destination);
        let mut options = FlyToOptions::new(destination).with_orientation(heading, pitch, roll);
        options.duration = duration;
        self.fly_to(&options)
    }

    /// Fly to the position from which `rectangle` fills the view.
    pub fn fly_to_rectangle(
        &mut self,
        rectangle: &Rectangle,
        heading: f64,
        pitch: f64,
        roll: f64,
        duration: Option<f64>,
    ) -> Result<Vec<FlightEvent>> {
        let destination = self.camera.rectangle_camera_position(rectangle)?;
        let mut options = FlyToOptions::new(destination).with_orientation(heading, pitch, roll);
        options.duration = duration;
        Ok(self.fly_to(&options))
    }

    /// Stop the current flight where it is.
    pub fn cancel_flight(&mut self) -> Option<FlightEvent> {
        let (id, _) = self.flight.take()?;
        self.enable_inputs = true;
        tracing::info!(flight = id.0, "flight cancelled");
        Some(FlightEvent::Cancelled(id))
    }

    pub fn is_flying(&self) -> bool {
        self.flight.is_some()
    }

    // ------------------------------------------------------------------------
    // Picking and floors
    // ------------------------------------------------------------------------

    /// Pick the globe under a window position.
    ///
    /// Under ground, a missed pick is retried looking back along the ray
    /// from far outside the globe.
    pub fn pick_globe(&mut self, window_position: DVec2) -> Option<DVec3> {
        if !self.globe_attached {
            return None;
        }

        let ray = self.camera.pick_ray(window_position);
        if let Some(hit) = self.scene.pick_globe(&ray) {
            return Some(hit);
        }

        if self.enable_under_ground && self.camera.height() < 0.0 {
            let reversed = Ray::new(ray.point_at(UNDERGROUND_PICK_DISTANCE), -ray.direction);
            return self.scene.pick_globe(&reversed);
        }
        None
    }

    /// Lowest height the camera may occupy above `position`.
    fn floor_height(&self, position: &Cartographic) -> f64 {
        if self.enable_under_ground {
            self.settings.underground_floor
        } else {
            terrain_floor(self.scene.height_at(position), self.settings.terrain_clearance)
        }
    }

    fn is_below_floor(&mut self) -> bool {
        let Some(cartographic) = self.camera.position_cartographic() else {
            return false;
        };
        cartographic.height < self.floor_height(&cartographic)
    }

    /// Height above the working ellipsoid.
    fn working_height(&mut self) -> f64 {
        let position = self.camera.position_wc();
        self.ellipsoid
            .cartesian_to_cartographic(position)
            .map_or(0.0, |c| c.height)
    }

    fn window_center(&self) -> DVec2 {
        self.camera.viewport().center()
    }

    fn set_world_position(&mut self, position: DVec3) {
        let local = self.camera.world_to_camera_coordinates(position);
        self.camera.set_position(local);
    }

    fn log_mode_change(kind: GestureKind, from: &InteractionMode, to: &InteractionMode) {
        if !from.same_kind(to) {
            tracing::debug!(?kind, from = from.name(), to = to.name(), "gesture mode changed");
        }
    }

    fn set_spin_mode(&mut self, mode: InteractionMode) {
        Self::log_mode_change(GestureKind::Spin, &self.spin.mode, &mode);
        self.spin.mode = mode;
    }

    fn set_zoom_mode(&mut self, mode: InteractionMode) {
        Self::log_mode_change(GestureKind::Zoom, &self.zoom.mode, &mode);
        self.zoom.mode = mode;
    }

    fn set_tilt_mode(&mut self, mode: InteractionMode) {
        Self::log_mode_change(GestureKind::Tilt, &self.tilt.mode, &mode);
        self.tilt.mode = mode;
    }

    // ------------------------------------------------------------------------
    // Configuration
    // ------------------------------------------------------------------------

    pub fn camera(&self) -> &CameraController {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut CameraController {
        &mut self.camera
    }

    pub fn aggregator(&self) -> &EventAggregator {
        &self.aggregator
    }

    pub fn settings(&self) -> &ControllerSettings {
        &self.settings
    }

    pub fn set_settings(&mut self, settings: ControllerSettings) {
        self.settings = settings;
    }

    pub fn set_minimum_collision_terrain_height(&mut self, height: f64) {
        self.settings.minimum_collision_terrain_height = height;
    }

    /// Resize the drawing surface.
    pub fn resize(&mut self, width: f64, height: f64) -> Result<()> {
        let viewport = Viewport::new(width, height)?;
        self.camera.set_viewport(viewport);
        self.aggregator.set_viewport_width(width);
        Ok(())
    }

    /// Current interpretation of a gesture.
    pub fn mode(&self, kind: GestureKind) -> InteractionMode {
        match kind {
            GestureKind::Spin => self.spin.mode,
            GestureKind::Zoom => self.zoom.mode,
            GestureKind::Tilt => self.tilt.mode,
            GestureKind::Look => InteractionMode::Looking,
        }
    }

    pub fn enable_inputs(&self) -> bool {
        self.enable_inputs
    }

    pub fn set_enable_inputs(&mut self, enable: bool) {
        self.enable_inputs = enable;
    }

    pub fn enable_rotate(&self) -> bool {
        self.enable_rotate
    }

    pub fn set_enable_rotate(&mut self, enable: bool) {
        self.enable_rotate = enable;
    }

    pub fn enable_zoom(&self) -> bool {
        self.enable_zoom
    }

    pub fn set_enable_zoom(&mut self, enable: bool) {
        self.enable_zoom = enable;
    }

    pub fn enable_tilt(&self) -> bool {
        self.enable_tilt
    }

    pub fn set_enable_tilt(&mut self, enable: bool) {
        self.enable_tilt = enable;
    }

    pub fn enable_look(&self) -> bool {
        self.enable_look
    }

    pub fn set_enable_look(&mut self, enable: bool) {
        self.enable_look = enable;
    }

    pub fn enable_pan(&self) -> bool {
        self.enable_pan
    }

    pub fn set_enable_pan(&mut self, enable: bool) {
        self.enable_pan = enable;
    }

    pub fn enable_under_ground(&self) -> bool {
        self.enable_under_ground
    }

    pub fn set_enable_under_ground(&mut self, enable: bool) {
        self.enable_under_ground = enable;
    }

    // ------------------------------------------------------------------------
    // Camera primitives
    // ------------------------------------------------------------------------

    pub fn heading(&mut self) -> f64 {
        self.camera.heading()
    }

    pub fn pitch(&mut self) -> f64 {
        self.camera.pitch()
    }

    pub fn roll(&mut self) -> f64 {
        self.camera.roll()
    }

    pub fn position_wc(&mut self) -> DVec3 {
        self.camera.position_wc()
    }

    pub fn position_cartographic(&mut self) -> Option<Cartographic> {
        self.camera.position_cartographic()
    }

    pub fn set_view(&mut self, destination: DVec3, heading: f64, pitch: f64, roll: f64) {
        self.camera.set_view(destination, heading, pitch, roll);
    }

    pub fn rotate(&mut self, axis: DVec3, angle: f64) {
        self.camera.rotate(axis, angle);
    }

    pub fn move_by(&mut self, direction: DVec3, amount: f64) {
        self.camera.move_by(direction, amount);
    }

    pub fn look(&mut self, axis: DVec3, angle: f64) {
        self.camera.look(axis, angle);
    }

    pub fn zoom_in(&mut self, amount: f64) {
        self.camera.zoom_in(amount);
    }

    pub fn zoom_out(&mut self, amount: f64) {
        self.camera.zoom_out(amount);
    }

    pub fn pick_ray(&mut self, window_position: DVec2) -> Ray {
        self.camera.pick_ray(window_position)
    }
}
