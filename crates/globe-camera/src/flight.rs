//! Scripted camera flights.
//!
//! A flight interpolates longitude, latitude, height, heading, pitch and roll
//! from the camera's current pose to a destination pose. Height follows an
//! arc that climbs high enough to keep both endpoints roughly in view, unless
//! either endpoint is already above that arc.
//!
//! Flights report their lifecycle as [`FlightEvent`] values returned by the
//! controller instead of invoking callbacks.

use std::f64::consts::{FRAC_PI_2, PI};

use globe_geometry::{
    Cartographic,
    math::{
        EPSILON10, EPSILON11, TWO_PI, equals_epsilon, lerp, negative_pi_to_pi, vec_equals_epsilon,
        zero_to_two_pi,
    },
};
use glam::DVec3;
use web_time::Instant;

use crate::camera::CameraController;
use crate::tween::{Easing, Tween};

/// Longest flight, in seconds, when no duration is requested.
const MAX_DEFAULT_DURATION: f64 = 3.0;

/// Starting height above which a descending flight eases out instead of in-out.
const EASE_OUT_HEIGHT: f64 = 11_500.0;

/// Ceiling for the height arc.
const MAX_ARC_ALTITUDE: f64 = 1.0e9;

const ARC_POWER: f64 = 8.0;
const ARC_FACTOR: f64 = 1.0e6;

// ============================================================================
// Options and events
// ============================================================================

/// Where and how to fly. Angles are in radians.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlyToOptions {
    /// World-space destination.
    pub destination: DVec3,
    pub heading: f64,
    pub pitch: f64,
    pub roll: f64,
    /// Flight duration in seconds. Derived from the distance when unset.
    pub duration: Option<f64>,
}

impl FlyToOptions {
    /// Fly to `destination` looking straight down with north up.
    pub fn new(destination: DVec3) -> Self {
        Self {
            destination,
            heading: 0.0,
            pitch: -FRAC_PI_2,
            roll: 0.0,
            duration: None,
        }
    }

    #[must_use]
    pub fn with_orientation(mut self, heading: f64, pitch: f64, roll: f64) -> Self {
        self.heading = heading;
        self.pitch = pitch;
        self.roll = roll;
        self
    }

    #[must_use]
    pub fn with_duration(mut self, duration: f64) -> Self {
        self.duration = Some(duration);
        self
    }
}

/// Identifier of a flight, unique per controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FlightId(pub u64);

/// Lifecycle notification for a flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlightEvent {
    Started(FlightId),
    Completed(FlightId),
    Cancelled(FlightId),
}

// ============================================================================
// Height profile
// ============================================================================

/// Height as a function of normalized flight time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HeightProfile {
    /// Rises towards `altitude` and comes back down.
    Arc {
        start: f64,
        end: f64,
        altitude: f64,
        factor: f64,
        power: f64,
    },
    Linear {
        start: f64,
        end: f64,
    },
}

impl HeightProfile {
    fn new(
        camera: &mut CameraController,
        destination: DVec3,
        start_height: f64,
        end_height: f64,
    ) -> Self {
        let max_height = start_height.max(end_height);

        let up = camera.up_wc();
        let right = camera.right_wc();
        let diff = camera.position_wc() - destination;
        let vertical = (up * diff.dot(up)).length();
        let horizontal = (right * diff.dot(right)).length();

        let frustum = camera.frustum();
        let fit = (vertical * frustum.near / frustum.right())
            .max(horizontal * frustum.near / frustum.top());
        let altitude = (fit * 0.2).min(MAX_ARC_ALTITUDE);

        if max_height < altitude {
            HeightProfile::Arc {
                start: -((altitude - start_height) * ARC_FACTOR).powf(1.0 / ARC_POWER),
                end: ((altitude - end_height) * ARC_FACTOR).powf(1.0 / ARC_POWER),
                altitude,
                factor: ARC_FACTOR,
                power: ARC_POWER,
            }
        } else {
            HeightProfile::Linear {
                start: start_height,
                end: end_height,
            }
        }
    }

    /// Height at normalized time `t`.
    pub fn at(&self, t: f64) -> f64 {
        match *self {
            HeightProfile::Arc {
                start,
                end,
                altitude,
                factor,
                power,
            } => {
                let x = t * (end - start) + start;
                -x.powf(power) / factor + altitude
            }
            HeightProfile::Linear { start, end } => lerp(start, end, t),
        }
    }
}

// ============================================================================
// Flight path
// ============================================================================

/// Interpolants from the camera's pose at planning time to the destination pose.
#[derive(Debug, Clone, PartialEq)]
pub struct FlightPath {
    start_longitude: f64,
    end_longitude: f64,
    start_latitude: f64,
    end_latitude: f64,
    height: HeightProfile,
    start_heading: f64,
    end_heading: f64,
    start_pitch: f64,
    end_pitch: f64,
    start_roll: f64,
    end_roll: f64,
}

impl FlightPath {
    fn new(camera: &mut CameraController, options: &FlyToOptions) -> Self {
        let mut start = camera.position_cartographic().unwrap_or_default();
        let start_pitch = camera.pitch();
        let start_heading = adjust_angle_for_lerp(camera.heading(), options.heading);
        let start_roll = adjust_angle_for_lerp(camera.roll(), options.roll);

        let mut end = camera
            .ellipsoid()
            .cartesian_to_cartographic(options.destination)
            .unwrap_or_default();

        start.longitude = zero_to_two_pi(start.longitude);
        end.longitude = zero_to_two_pi(end.longitude);

        let diff = start.longitude - end.longitude;
        if diff < -PI {
            start.longitude += TWO_PI;
        } else if diff > PI {
            end.longitude += TWO_PI;
        }

        let height = HeightProfile::new(camera, options.destination, start.height, end.height);

        Self {
            start_longitude: start.longitude,
            end_longitude: end.longitude,
            start_latitude: start.latitude,
            end_latitude: end.latitude,
            height,
            start_heading,
            end_heading: options.heading,
            start_pitch,
            end_pitch: options.pitch,
            start_roll,
            end_roll: options.roll,
        }
    }

    pub fn height_profile(&self) -> &HeightProfile {
        &self.height
    }

    /// Place the camera at normalized time `t`.
    pub fn apply(&self, camera: &mut CameraController, t: f64) {
        let position = camera.ellipsoid().cartographic_to_cartesian(&Cartographic::new(
            lerp(self.start_longitude, self.end_longitude, t),
            lerp(self.start_latitude, self.end_latitude, t),
            self.height.at(t),
        ));
        camera.set_view(
            position,
            lerp(self.start_heading, self.end_heading, t),
            lerp(self.start_pitch, self.end_pitch, t),
            lerp(self.start_roll, self.end_roll, t),
        );
    }
}

/// Shift `start` by a full turn so that lerping to `end` takes the short way round.
pub fn adjust_angle_for_lerp(start: f64, end: f64) -> f64 {
    let start = if equals_epsilon(start, TWO_PI, EPSILON11, EPSILON11) {
        0.0
    } else {
        start
    };

    if end > start + PI {
        start + TWO_PI
    } else if end < start - PI {
        start - TWO_PI
    } else {
        start
    }
}

// ============================================================================
// Planning
// ============================================================================

/// Outcome of planning a flight from the camera's current pose.
#[derive(Debug, Clone)]
pub enum FlightPlan {
    /// Already at the destination pose.
    Empty,
    /// Jump straight to the destination pose.
    Immediate(FlightPath),
    /// Animate over several frames.
    Animated(Flight),
}

impl FlightPlan {
    /// Plan a flight. Reads the camera pose but does not move it.
    pub fn new(camera: &mut CameraController, options: &FlyToOptions) -> Self {
        let position = camera.position_wc();
        let duration = options.duration.unwrap_or_else(|| {
            (((position - options.destination).length() / 1.0e6).ceil() + 2.0)
                .min(MAX_DEFAULT_DURATION)
        });

        let same_angle = |a: f64, b: f64| {
            equals_epsilon(negative_pi_to_pi(a), negative_pi_to_pi(b), EPSILON10, EPSILON10)
        };
        let empty = vec_equals_epsilon(options.destination, position, EPSILON10, EPSILON10)
            && same_angle(options.heading, camera.heading())
            && same_angle(options.pitch, camera.pitch())
            && same_angle(options.roll, camera.roll());
        if empty {
            return FlightPlan::Empty;
        }

        let path = FlightPath::new(camera, options);
        if duration <= 0.0 {
            return FlightPlan::Immediate(path);
        }

        let start_height = camera.height();
        let end_height = camera
            .ellipsoid()
            .cartesian_to_cartographic(options.destination)
            .map_or(0.0, |c| c.height);
        let easing = if start_height > end_height && start_height > EASE_OUT_HEIGHT {
            Easing::CubicOut
        } else {
            Easing::QuinticInOut
        };

        tracing::debug!(
            duration,
            ?easing,
            start_height,
            end_height,
            "planned flight"
        );

        FlightPlan::Animated(Flight {
            path,
            tween: Tween::new(0.0, duration, duration, easing),
        })
    }
}

/// A flight in progress.
#[derive(Debug, Clone)]
pub struct Flight {
    path: FlightPath,
    tween: Tween,
}

impl Flight {
    pub fn path(&self) -> &FlightPath {
        &self.path
    }

    pub fn duration(&self) -> f64 {
        self.tween.duration()
    }

    pub fn easing(&self) -> Easing {
        self.tween.easing()
    }

    /// Step the flight to `now`. Returns `true` once the destination is reached.
    pub fn advance(&mut self, camera: &mut CameraController, now: Instant) -> bool {
        let Some(step) = self.tween.advance(now) else {
            return false;
        };
        self.path.apply(camera, step.value / self.tween.duration());
        step.finished
    }
}
