//! Minimal time-based value tween used to drive flights.
//!
//! A tween is started by its first [`Tween::advance`] call and then maps the
//! wall-clock time elapsed since that call through an easing curve.

use web_time::Instant;

/// Easing curve applied to normalized time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Easing {
    Linear,
    /// Fast start, slow finish.
    CubicOut,
    /// Slow start and finish.
    QuinticInOut,
}

impl Easing {
    /// Eased progress for `k` in `[0, 1]`.
    pub fn ease(self, k: f64) -> f64 {
        match self {
            Easing::Linear => k,
            Easing::CubicOut => {
                let k = k - 1.0;
                k * k * k + 1.0
            }
            Easing::QuinticInOut => {
                let k = k * 2.0;
                if k < 1.0 {
                    0.5 * k.powi(5)
                } else {
                    let k = k - 2.0;
                    0.5 * (k.powi(5) + 2.0)
                }
            }
        }
    }
}

/// Value produced by one step of a running tween.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TweenStep {
    pub value: f64,
    /// Set on the step that reaches the end of the tween.
    pub finished: bool,
}

/// Interpolates from `start` to `stop` over `duration` seconds.
#[derive(Debug, Clone)]
pub struct Tween {
    start: f64,
    stop: f64,
    duration: f64,
    easing: Easing,
    started_at: Option<Instant>,
}

impl Tween {
    pub fn new(start: f64, stop: f64, duration: f64, easing: Easing) -> Self {
        Self {
            start,
            stop,
            duration,
            easing,
            started_at: None,
        }
    }

    pub fn duration(&self) -> f64 {
        self.duration
    }

    pub fn easing(&self) -> Easing {
        self.easing
    }

    /// Advance to `now`.
    ///
    /// The first call starts the clock and yields no value.
    pub fn advance(&mut self, now: Instant) -> Option<TweenStep> {
        let Some(started_at) = self.started_at else {
            self.started_at = Some(now);
            return None;
        };

        let elapsed = now.saturating_duration_since(started_at).as_secs_f64();
        let fraction = if self.duration > 0.0 {
            (elapsed / self.duration).min(1.0)
        } else {
            1.0
        };

        Some(TweenStep {
            value: self.start + (self.stop - self.start) * self.easing.ease(fraction),
            finished: fraction >= 1.0,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn test_easing_endpoints() {
        for easing in [Easing::Linear, Easing::CubicOut, Easing::QuinticInOut] {
            assert!(easing.ease(0.0).abs() < 1e-12, "{easing:?}");
            assert!((easing.ease(1.0) - 1.0).abs() < 1e-12, "{easing:?}");
        }
        assert!((Easing::QuinticInOut.ease(0.5) - 0.5).abs() < 1e-12);
        assert!(Easing::CubicOut.ease(0.25) > 0.25);
        assert!(Easing::QuinticInOut.ease(0.25) < 0.25);
    }

    #[test]
    fn test_first_advance_starts_clock() {
        let start = Instant::now();
        let mut tween = Tween::new(0.0, 2.0, 2.0, Easing::Linear);
        assert!(tween.advance(start).is_none());

        let half = tween.advance(start + Duration::from_secs(1)).unwrap();
        assert!((half.value - 1.0).abs() < 1e-9);
        assert!(!half.finished);

        let done = tween.advance(start + Duration::from_secs(5)).unwrap();
        assert!((done.value - 2.0).abs() < 1e-12);
        assert!(done.finished);
    }
}
