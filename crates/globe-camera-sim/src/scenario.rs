//! Scripted input for the headless driver.
//!
//! Each scenario expands into a list of per-frame actions. Gestures start at
//! the viewport centre, move a fixed step per frame for the first half of the
//! run and are then released so inertia plays out over the second half.

use std::time::Duration;

use glam::DVec2;
use globe_camera::{InputEvent, Modifier, MouseButton, NavigationKey};
use web_time::Instant;

/// Per-frame pointer step, in pixels.
const DRAG_STEP: f64 = 6.0;

/// Wheel rotation per frame, in degrees.
const WHEEL_STEP: f64 = 15.0;

/// Scripted interaction to replay.
#[derive(Default, PartialEq, Eq, Clone, Copy, Debug, clap::ValueEnum)]
pub enum Scenario {
    /// Left drag across the globe, then release.
    #[default]
    Spin,
    /// Wheel zoom towards the view centre.
    Zoom,
    /// Middle drag upwards to tilt over the view centre.
    Tilt,
    /// Shift + left drag to look around.
    Look,
    /// Hold the forward and zoom-in keys.
    Keys,
    /// Fly to the destination given on the command line.
    Fly,
}

/// Something the driver does before updating the controller on a frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Action {
    Input(InputEvent),
    Press(NavigationKey),
    Release(NavigationKey),
}

/// Timestamp of `frame` at a fixed 60 Hz.
pub fn frame_time(start: Instant, frame: u32) -> Instant {
    start + Duration::from_secs_f64(f64::from(frame) / 60.0)
}

fn drag(
    button: MouseButton,
    modifier: Modifier,
    step: DVec2,
    center: DVec2,
    frames: u32,
    start: Instant,
) -> Vec<Vec<Action>> {
    let release_frame = frames / 2;
    let mut position = center;
    (0..frames)
        .map(|frame| {
            let time = frame_time(start, frame);
            if frame == 0 {
                vec![Action::Input(InputEvent::ButtonDown {
                    button,
                    position,
                    modifier,
                    time,
                })]
            } else if frame < release_frame {
                let next = position + step;
                let event = InputEvent::MouseMove {
                    start: position,
                    end: next,
                    modifier,
                };
                position = next;
                vec![Action::Input(event)]
            } else if frame == release_frame {
                vec![Action::Input(InputEvent::ButtonUp {
                    button,
                    position,
                    modifier,
                    time,
                })]
            } else {
                Vec::new()
            }
        })
        .collect()
}

impl Scenario {
    /// Actions to apply on each of `frames` frames.
    pub fn script(self, center: DVec2, frames: u32, start: Instant) -> Vec<Vec<Action>> {
        match self {
            Scenario::Spin => drag(
                MouseButton::Left,
                Modifier::None,
                DVec2::new(DRAG_STEP, 0.0),
                center,
                frames,
                start,
            ),
            Scenario::Tilt => drag(
                MouseButton::Middle,
                Modifier::None,
                DVec2::new(0.0, -DRAG_STEP),
                center,
                frames,
                start,
            ),
            Scenario::Look => drag(
                MouseButton::Left,
                Modifier::Shift,
                DVec2::new(DRAG_STEP, DRAG_STEP * 0.5),
                center,
                frames,
                start,
            ),
            Scenario::Zoom => (0..frames)
                .map(|frame| {
                    if frame < frames / 2 {
                        vec![Action::Input(InputEvent::Wheel {
                            delta: WHEEL_STEP,
                            modifier: Modifier::None,
                        })]
                    } else {
                        Vec::new()
                    }
                })
                .collect(),
            Scenario::Keys => (0..frames)
                .map(|frame| {
                    if frame == 0 {
                        vec![
                            Action::Press(NavigationKey::Forward),
                            Action::Press(NavigationKey::ZoomIn),
                        ]
                    } else if frame == frames / 2 {
                        vec![
                            Action::Release(NavigationKey::Forward),
                            Action::Release(NavigationKey::ZoomIn),
                        ]
                    } else {
                        Vec::new()
                    }
                })
                .collect(),
            Scenario::Fly => vec![Vec::new(); frames as usize],
        }
    }
}
