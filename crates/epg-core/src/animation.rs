#![forbid(unsafe_code)]

//! Scroll animation primitives.
//!
//! Animations here produce pixel positions (`f64`), not normalized progress.
//! They are advanced by the caller with explicit `dt` values, so a replay of
//! the same tick sequence reproduces the same positions.

use std::time::Duration;

// ---------------------------------------------------------------------------
// Animation trait
// ---------------------------------------------------------------------------

/// A time-based animation producing a position.
pub trait Animation {
    /// Advance the animation by `dt`.
    fn tick(&mut self, dt: Duration);

    /// Whether the animation has come to rest.
    fn is_complete(&self) -> bool;

    /// Current position.
    fn value(&self) -> f64;

    /// Reset the animation to its initial state.
    fn reset(&mut self);
}

// ---------------------------------------------------------------------------
// Decay
// ---------------------------------------------------------------------------

/// Parameters for [`DecayAnimation`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecayConfig {
    /// Per-millisecond velocity retention, in `[0.5, 0.9999]` (default: 0.998).
    pub deceleration: f64,
    /// Speed in px/s below which the animation rests (default: 1.0).
    pub rest_velocity: f64,
}

impl DecayConfig {
    /// Lowest accepted deceleration.
    pub const MIN_DECELERATION: f64 = 0.5;
    /// Highest accepted deceleration.
    pub const MAX_DECELERATION: f64 = 0.9999;

    /// Deceleration forced into the accepted range. NaN falls back to the default.
    #[must_use]
    pub fn effective_deceleration(&self) -> f64 {
        if self.deceleration.is_nan() {
            return Self::default().deceleration;
        }
        self.deceleration
            .clamp(Self::MIN_DECELERATION, Self::MAX_DECELERATION)
    }
}

impl Default for DecayConfig {
    fn default() -> Self {
        Self {
            deceleration: 0.998,
            rest_velocity: 1.0,
        }
    }
}

/// Exponential velocity decay clamped to `[min, max]`.
///
/// Each tick of `dt` milliseconds moves the position by
/// `v/1000 * d * (1 - d^dt) / (1 - d)` and scales velocity by `d^dt`, where
/// `d` is the deceleration. The result is independent of how `dt` is split
/// across ticks.
///
/// Reaching a bound stops the animation at that bound.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecayAnimation {
    config: DecayConfig,
    start_position: f64,
    start_velocity: f64,
    position: f64,
    velocity: f64,
    min: f64,
    max: f64,
    done: bool,
}

impl DecayAnimation {
    /// Start from `position` moving at `velocity` px/s inside `[min, max]`.
    ///
    /// The bounds are reordered if given inverted; the start position is
    /// clamped into them.
    #[must_use]
    pub fn new(position: f64, velocity: f64, min: f64, max: f64, config: DecayConfig) -> Self {
        let (min, max) = if min <= max { (min, max) } else { (max, min) };
        let position = if position.is_finite() {
            position.clamp(min, max)
        } else {
            min.max(0.0_f64.min(max))
        };
        let velocity = if velocity.is_finite() { velocity } else { 0.0 };
        let mut anim = Self {
            config,
            start_position: position,
            start_velocity: velocity,
            position,
            velocity,
            min,
            max,
            done: false,
        };
        anim.settle();
        anim
    }

    /// Current velocity in px/s (zero once complete).
    #[inline]
    #[must_use]
    pub fn velocity(&self) -> f64 {
        self.velocity
    }

    /// Clamp range.
    #[inline]
    #[must_use]
    pub fn bounds(&self) -> (f64, f64) {
        (self.min, self.max)
    }

    /// Change the clamp range mid-flight. The position is re-clamped.
    pub fn set_bounds(&mut self, min: f64, max: f64) {
        let (min, max) = if min <= max { (min, max) } else { (max, min) };
        self.min = min;
        self.max = max;
        self.position = self.position.clamp(min, max);
        self.settle();
    }

    fn settle(&mut self) {
        let at_min = self.position <= self.min && self.velocity < 0.0;
        let at_max = self.position >= self.max && self.velocity > 0.0;
        if self.velocity.abs() < self.config.rest_velocity || at_min || at_max {
            self.velocity = 0.0;
            self.done = true;
        }
    }
}

impl Animation for DecayAnimation {
    fn tick(&mut self, dt: Duration) {
        if self.done || dt.is_zero() {
            return;
        }
        let d = self.config.effective_deceleration();
        let dt_ms = dt.as_secs_f64() * 1000.0;
        let kv = d.powf(dt_ms);
        let travel = self.velocity / 1000.0 * d * (1.0 - kv) / (1.0 - d);
        self.position = (self.position + travel).clamp(self.min, self.max);
        self.velocity *= kv;
        self.settle();
    }

    fn is_complete(&self) -> bool {
        self.done
    }

    fn value(&self) -> f64 {
        self.position
    }

    fn reset(&mut self) {
        self.position = self.start_position;
        self.velocity = self.start_velocity;
        self.done = false;
        self.settle();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FRAME: Duration = Duration::from_millis(16);

    fn run(anim: &mut DecayAnimation, max_frames: usize) -> usize {
        for frame in 0..max_frames {
            if anim.is_complete() {
                return frame;
            }
            anim.tick(FRAME);
        }
        max_frames
    }

    #[test]
    fn decays_towards_rest() {
        let mut a = DecayAnimation::new(0.0, -1000.0, -1e9, 0.0, DecayConfig::default());
        a.tick(FRAME);
        assert!(a.value() < 0.0);
        assert!(a.velocity() > -1000.0 && a.velocity() < 0.0);
        let frames = run(&mut a, 10_000);
        assert!(frames < 10_000);
        assert_eq!(a.velocity(), 0.0);
    }

    #[test]
    fn total_travel_matches_closed_form() {
        // Unbounded travel converges to v/1000 * d / (1 - d).
        let cfg = DecayConfig {
            rest_velocity: 1e-9,
            ..DecayConfig::default()
        };
        let mut a = DecayAnimation::new(0.0, -500.0, -1e9, 1e9, cfg);
        for _ in 0..100 {
            a.tick(Duration::from_secs(1));
        }
        let expected = -0.5 * 0.998 / 0.002;
        assert!((a.value() - expected).abs() < 1e-3, "{}", a.value());
    }

    #[test]
    fn split_ticks_match_single_tick() {
        let mut a = DecayAnimation::new(0.0, 800.0, -1e6, 1e6, DecayConfig::default());
        let mut b = a;
        a.tick(Duration::from_millis(64));
        for _ in 0..4 {
            b.tick(FRAME);
        }
        assert!((a.value() - b.value()).abs() < 1e-9);
        assert!((a.velocity() - b.velocity()).abs() < 1e-9);
    }

    #[test]
    fn stops_at_bound() {
        let mut a = DecayAnimation::new(-10.0, 5000.0, -100.0, 0.0, DecayConfig::default());
        a.tick(Duration::from_millis(100));
        assert_eq!(a.value(), 0.0);
        assert!(a.is_complete());
    }

    #[test]
    fn slow_release_rests_immediately() {
        let a = DecayAnimation::new(-10.0, 0.5, -100.0, 0.0, DecayConfig::default());
        assert!(a.is_complete());
        assert_eq!(a.value(), -10.0);
    }

    #[test]
    fn start_position_is_clamped() {
        let a = DecayAnimation::new(50.0, 0.0, -100.0, 0.0, DecayConfig::default());
        assert_eq!(a.value(), 0.0);
    }

    #[test]
    fn deceleration_is_clamped() {
        let cfg = DecayConfig {
            deceleration: 1.5,
            ..DecayConfig::default()
        };
        assert_eq!(cfg.effective_deceleration(), DecayConfig::MAX_DECELERATION);
        let cfg = DecayConfig {
            deceleration: f64::NAN,
            ..DecayConfig::default()
        };
        assert_eq!(cfg.effective_deceleration(), 0.998);
    }

    #[test]
    fn reset_restarts_from_origin() {
        let mut a = DecayAnimation::new(-50.0, -300.0, -1000.0, 0.0, DecayConfig::default());
        a.tick(FRAME);
        a.reset();
        assert_eq!(a.value(), -50.0);
        assert_eq!(a.velocity(), -300.0);
    }
}
