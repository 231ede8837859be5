//! Per-frame aggregation of pointer, wheel and pinch input.
//!
//! The host feeds raw [`InputEvent`]s as they arrive. Every event that
//! lands between two controller updates is collapsed into a single
//! [`Movement`] per gesture channel, where a channel is a
//! `(GestureCategory, Modifier)` pair. The controller reads the collapsed
//! movements once per frame and then calls [`EventAggregator::reset`].
//!
//! ## Channel lifecycle
//!
//! ```text
//! down ──► move ... move ──► reset ──► move ... ──► up
//!          └── one Movement ─┘         └─ previous Movement becomes
//!                                        the last movement (inertia)
//! ```
//!
//! `reset` clears only the moving flag. Down state, start positions and
//! press/release times survive until the next transition.

use std::f64::consts::{PI, TAU};

use glam::DVec2;
use web_time::Instant;

/// Scales the unwrapped pinch angle into pixel-like units.
const PINCH_ANGLE_DIVISOR: f64 = 12.0;

/// Degrees of arc per wheel notch.
const WHEEL_ARC_DEGREES: f64 = 60.0;

// ============================================================================
// Channels
// ============================================================================

/// Kind of gesture a movement belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GestureCategory {
    LeftDrag,
    RightDrag,
    MiddleDrag,
    Wheel,
    Pinch,
}

impl GestureCategory {
    pub const ALL: [GestureCategory; 5] = [
        GestureCategory::LeftDrag,
        GestureCategory::RightDrag,
        GestureCategory::MiddleDrag,
        GestureCategory::Wheel,
        GestureCategory::Pinch,
    ];

    const DRAGS: [GestureCategory; 3] = [
        GestureCategory::LeftDrag,
        GestureCategory::RightDrag,
        GestureCategory::MiddleDrag,
    ];

    const fn index(self) -> usize {
        self as usize
    }
}

/// Keyboard modifier held during a gesture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Modifier {
    #[default]
    None,
    Shift,
    Ctrl,
}

impl Modifier {
    pub const ALL: [Modifier; 3] = [Modifier::None, Modifier::Shift, Modifier::Ctrl];

    const fn index(self) -> usize {
        self as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
}

impl MouseButton {
    /// Drag category driven by this button.
    pub fn category(self) -> GestureCategory {
        match self {
            MouseButton::Left => GestureCategory::LeftDrag,
            MouseButton::Right => GestureCategory::RightDrag,
            MouseButton::Middle => GestureCategory::MiddleDrag,
        }
    }
}

// ============================================================================
// Events and movements
// ============================================================================

/// Raw input delivered by the host. Positions are window pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    ButtonDown {
        button: MouseButton,
        position: DVec2,
        modifier: Modifier,
        time: Instant,
    },
    ButtonUp {
        button: MouseButton,
        position: DVec2,
        modifier: Modifier,
        time: Instant,
    },
    MouseMove {
        start: DVec2,
        end: DVec2,
        modifier: Modifier,
    },
    /// Wheel rotation in degrees. Positive values zoom in.
    Wheel { delta: f64, modifier: Modifier },
    PinchStart {
        positions: [DVec2; 2],
        modifier: Modifier,
        time: Instant,
    },
    PinchMove {
        previous: [DVec2; 2],
        current: [DVec2; 2],
        modifier: Modifier,
    },
    PinchEnd { modifier: Modifier, time: Instant },
}

/// A start and end position.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MovementPair {
    pub start: DVec2,
    pub end: DVec2,
}

impl MovementPair {
    pub fn new(start: DVec2, end: DVec2) -> Self {
        Self { start, end }
    }

    pub fn delta(&self) -> DVec2 {
        self.end - self.start
    }
}

/// Movement of one channel over one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Movement {
    Drag(MovementPair),
    /// Two-finger gesture.
    ///
    /// `distance` carries the finger spread in its y component.
    /// `angle_and_height` carries the scaled twist angle in x and the
    /// scaled centroid height in y.
    Pinch {
        distance: MovementPair,
        angle_and_height: MovementPair,
    },
}

impl Default for Movement {
    fn default() -> Self {
        Movement::Drag(MovementPair::default())
    }
}

impl Movement {
    /// Positions read by rotating, tilting and looking.
    pub fn pair(&self) -> MovementPair {
        match *self {
            Movement::Drag(pair) => pair,
            Movement::Pinch {
                angle_and_height, ..
            } => angle_and_height,
        }
    }

    /// Positions read by zooming.
    pub fn zoom_pair(&self) -> MovementPair {
        match *self {
            Movement::Drag(pair) => pair,
            Movement::Pinch { distance, .. } => distance,
        }
    }
}

// ============================================================================
// Aggregator
// ============================================================================

#[derive(Debug, Clone, Copy, Default)]
struct ChannelRecord {
    down: bool,
    moving: bool,
    start_position: DVec2,
    movement: Movement,
    last_movement: Option<Movement>,
    press_time: Option<Instant>,
    release_time: Option<Instant>,
    /// Pinch angle at the start of the current frame.
    previous_angle: f64,
}

/// Collapses raw input into one movement per channel per frame.
#[derive(Debug, Clone)]
pub struct EventAggregator {
    channels: [[ChannelRecord; Modifier::ALL.len()]; GestureCategory::ALL.len()],
    buttons_down: u32,
    current_mouse_position: DVec2,
    viewport_width: f64,
}

impl EventAggregator {
    pub fn new(viewport_width: f64) -> Self {
        Self {
            channels: Default::default(),
            buttons_down: 0,
            current_mouse_position: DVec2::ZERO,
            viewport_width,
        }
    }

    /// Width used to scale pinch angles.
    pub fn set_viewport_width(&mut self, width: f64) {
        self.viewport_width = width;
    }

    fn channel(&self, category: GestureCategory, modifier: Modifier) -> &ChannelRecord {
        &self.channels[category.index()][modifier.index()]
    }

    fn channel_mut(&mut self, category: GestureCategory, modifier: Modifier) -> &mut ChannelRecord {
        &mut self.channels[category.index()][modifier.index()]
    }

    /// Fold one raw event into the current frame.
    pub fn handle(&mut self, event: &InputEvent) {
        match *event {
            InputEvent::ButtonDown {
                button,
                position,
                modifier,
                time,
            } => {
                self.buttons_down += 1;
                let record = self.channel_mut(button.category(), modifier);
                record.last_movement = None;
                record.down = true;
                record.press_time = Some(time);
                record.start_position = position;
            }
            InputEvent::ButtonUp {
                button,
                modifier,
                time,
                ..
            } => {
                self.buttons_down = self.buttons_down.saturating_sub(1);
                let record = self.channel_mut(button.category(), modifier);
                record.down = false;
                record.release_time = Some(time);
            }
            InputEvent::MouseMove {
                start,
                end,
                modifier,
            } => {
                for category in GestureCategory::DRAGS {
                    let record = self.channel_mut(category, modifier);
                    if !record.down {
                        continue;
                    }
                    match &mut record.movement {
                        Movement::Drag(pair) if record.moving => pair.end = end,
                        _ => {
                            record.last_movement = Some(record.movement);
                            record.movement = Movement::Drag(MovementPair::new(start, end));
                            record.moving = true;
                        }
                    }
                }
                self.current_mouse_position = end;
            }
            InputEvent::Wheel { delta, modifier } => {
                let arc = WHEEL_ARC_DEGREES * delta.to_radians();
                let record = self.channel_mut(GestureCategory::Wheel, modifier);
                match &mut record.movement {
                    Movement::Drag(pair) if record.moving => pair.end.y += arc,
                    _ => {
                        record.movement =
                            Movement::Drag(MovementPair::new(DVec2::ZERO, DVec2::new(0.0, arc)));
                        record.moving = true;
                    }
                }
            }
            InputEvent::PinchStart {
                positions,
                modifier,
                time,
            } => {
                self.buttons_down += 1;
                let record = self.channel_mut(GestureCategory::Pinch, modifier);
                record.down = true;
                record.press_time = Some(time);
                record.start_position = (positions[0] + positions[1]) * 0.5;
            }
            InputEvent::PinchEnd { modifier, time } => {
                self.buttons_down = self.buttons_down.saturating_sub(1);
                let record = self.channel_mut(GestureCategory::Pinch, modifier);
                record.down = false;
                record.release_time = Some(time);
            }
            InputEvent::PinchMove {
                previous,
                current,
                modifier,
            } => self.pinch_move(previous, current, modifier),
        }
    }

    fn pinch_move(&mut self, previous: [DVec2; 2], current: [DVec2; 2], modifier: Modifier) {
        let width = self.viewport_width;
        let record = self.channel_mut(GestureCategory::Pinch, modifier);
        if !record.down {
            return;
        }

        let (previous_distance, previous_angle, previous_height) = measure_touches(previous);
        let (distance, angle, height) = measure_touches(current);

        let mut distance_pair = MovementPair::new(
            DVec2::new(0.0, previous_distance),
            DVec2::new(0.0, distance),
        );
        let mut angle_pair = MovementPair::new(
            DVec2::new(previous_angle, previous_height),
            DVec2::new(angle, height),
        );

        if record.moving {
            if let Movement::Pinch {
                distance,
                angle_and_height,
            } = record.movement
            {
                distance_pair.start = distance.start;
                angle_pair.start = angle_and_height.start;
            }
        } else {
            record.moving = true;
            record.previous_angle = previous_angle;
        }

        let previous_angle = record.previous_angle;
        let mut angle = angle_pair.end.x;
        while angle >= previous_angle + PI {
            angle -= TAU;
        }
        while angle < previous_angle - PI {
            angle += TAU;
        }
        angle_pair.end.x = -angle * width / PINCH_ANGLE_DIVISOR;
        angle_pair.start.x = -previous_angle * width / PINCH_ANGLE_DIVISOR;

        record.movement = Movement::Pinch {
            distance: distance_pair,
            angle_and_height: angle_pair,
        };
    }

    /// Mark every channel as not moving. Call once per frame after dispatch.
    pub fn reset(&mut self) {
        for record in self.channels.iter_mut().flatten() {
            record.moving = false;
        }
    }

    pub fn is_moving(&self, category: GestureCategory, modifier: Modifier) -> bool {
        self.channel(category, modifier).moving
    }

    pub fn movement(&self, category: GestureCategory, modifier: Modifier) -> Movement {
        self.channel(category, modifier).movement
    }

    /// Movement of the frame before the current one, if the gesture has one.
    pub fn last_movement(&self, category: GestureCategory, modifier: Modifier) -> Option<Movement> {
        self.channel(category, modifier).last_movement
    }

    pub fn is_button_down(&self, category: GestureCategory, modifier: Modifier) -> bool {
        self.channel(category, modifier).down
    }

    /// Where the gesture started. Wheel gestures start under the cursor.
    pub fn start_mouse_position(&self, category: GestureCategory, modifier: Modifier) -> DVec2 {
        if category == GestureCategory::Wheel {
            self.current_mouse_position
        } else {
            self.channel(category, modifier).start_position
        }
    }

    pub fn button_press_time(&self, category: GestureCategory, modifier: Modifier) -> Option<Instant> {
        self.channel(category, modifier).press_time
    }

    pub fn button_release_time(
        &self,
        category: GestureCategory,
        modifier: Modifier,
    ) -> Option<Instant> {
        self.channel(category, modifier).release_time
    }

    /// Whether a button or finger is held, or the wheel turned this frame.
    pub fn any_button_down(&self) -> bool {
        let wheel_moved = Modifier::ALL
            .iter()
            .any(|&modifier| self.is_moving(GestureCategory::Wheel, modifier));
        self.buttons_down > 0 || wheel_moved
    }

    pub fn current_mouse_position(&self) -> DVec2 {
        self.current_mouse_position
    }
}

/// Scaled finger spread, twist angle and scaled centroid height.
fn measure_touches([first, second]: [DVec2; 2]) -> (f64, f64, f64) {
    let offset = second - first;
    (
        offset.length() * 0.25,
        offset.y.atan2(offset.x),
        (first.y + second.y) * 0.125,
    )
}
