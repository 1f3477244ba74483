#![forbid(unsafe_code)]

//! Gesture arbitration: turns raw pointer samples into pan and tap gestures.
//!
//! [`GestureArbiter`] is a stateful processor. Feed it each [`PointerEvent`]
//! together with the time it was observed; it returns the semantic
//! [`GestureEvent`]s the event produced.
//!
//! # State Machine
//!
//! ```text
//! Idle --Down--> Pending --Move >= activation--> Panning --Up--> Idle (PanEnd)
//!                   |                               |
//!                   +--Up (short)--> Idle (Tap)     +--Cancel--> Idle (PanEnd, zero velocity)
//! ```
//!
//! # Invariants
//!
//! 1. Pan and Tap never both emit for the same down → up sequence. Whichever
//!    recognizer claims the sequence first owns it.
//! 2. `PanUpdate::translation` is measured from the down position, never from
//!    the previous sample.
//! 3. After [`reset`](GestureArbiter::reset) the arbiter is idle and emits
//!    nothing for the abandoned sequence.
//!
//! # Failure Modes
//!
//! - `Move`/`Up` without a preceding `Down` are ignored.
//! - A press held longer than `tap_max_duration` that never moved far enough
//!   to pan produces no event at all.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use crate::geometry::Point;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Thresholds for gesture arbitration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GestureConfig {
    /// Distance in pixels the pointer must travel before a pan activates (default: 10).
    pub pan_activation_distance: f64,
    /// Longest press that still counts as a tap (default: 500ms).
    pub tap_max_duration: Duration,
    /// Trailing window used to estimate release velocity (default: 100ms).
    pub velocity_window: Duration,
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            pan_activation_distance: 10.0,
            tap_max_duration: Duration::from_millis(500),
            velocity_window: Duration::from_millis(100),
        }
    }
}

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

/// A raw pointer sample in viewport coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerEvent {
    /// Pointer pressed.
    Down(Point),
    /// Pointer moved while pressed.
    Move(Point),
    /// Pointer released.
    Up(Point),
    /// The platform abandoned the sequence.
    Cancel,
}

/// A recognised gesture.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GestureEvent {
    /// A pan claimed the sequence.
    PanStart {
        /// Where the pointer went down.
        origin: Point,
    },
    /// Pan progress.
    PanUpdate {
        /// Total movement since the down position.
        translation: Point,
    },
    /// Pan finished.
    PanEnd {
        /// Release velocity in pixels per second.
        velocity: Point,
    },
    /// A tap claimed the sequence.
    Tap {
        /// Release position.
        position: Point,
    },
}

// ---------------------------------------------------------------------------
// GestureArbiter
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
enum Phase {
    Idle,
    Pending { origin: Point, down_at: Instant },
    Panning { origin: Point },
}

/// Stateful pan/tap arbiter.
#[derive(Debug, Clone)]
pub struct GestureArbiter {
    config: GestureConfig,
    phase: Phase,
    samples: VecDeque<(Instant, Point)>,
}

impl GestureArbiter {
    /// Create an idle arbiter.
    #[must_use]
    pub fn new(config: GestureConfig) -> Self {
        Self {
            config,
            phase: Phase::Idle,
            samples: VecDeque::with_capacity(16),
        }
    }

    /// Process a raw event observed at `now`.
    pub fn process(&mut self, event: PointerEvent, now: Instant) -> Vec<GestureEvent> {
        let mut out = Vec::with_capacity(2);
        match event {
            PointerEvent::Down(pos) => self.on_down(pos, now),
            PointerEvent::Move(pos) => self.on_move(pos, now, &mut out),
            PointerEvent::Up(pos) => self.on_up(pos, now, &mut out),
            PointerEvent::Cancel => {
                if matches!(self.phase, Phase::Panning { .. }) {
                    out.push(GestureEvent::PanEnd {
                        velocity: Point::ZERO,
                    });
                }
                self.reset();
            }
        }
        out
    }

    /// Whether a pan currently owns the pointer.
    #[inline]
    #[must_use]
    pub fn is_panning(&self) -> bool {
        matches!(self.phase, Phase::Panning { .. })
    }

    /// Whether a pointer is down.
    #[inline]
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.phase != Phase::Idle
    }

    /// Drop any in-progress sequence without emitting.
    pub fn reset(&mut self) {
        self.phase = Phase::Idle;
        self.samples.clear();
    }

    /// Current configuration.
    #[inline]
    #[must_use]
    pub fn config(&self) -> &GestureConfig {
        &self.config
    }

    /// Replace the configuration. Takes effect from the next sequence.
    pub fn set_config(&mut self, config: GestureConfig) {
        self.config = config;
    }
}

impl GestureArbiter {
    fn on_down(&mut self, pos: Point, now: Instant) {
        // A second Down without Up means the platform lost the Up.
        self.samples.clear();
        self.phase = Phase::Pending {
            origin: pos,
            down_at: now,
        };
        self.record(pos, now);
    }

    fn on_move(&mut self, pos: Point, now: Instant, out: &mut Vec<GestureEvent>) {
        match self.phase {
            Phase::Idle => {}
            Phase::Pending { origin, .. } => {
                self.record(pos, now);
                if pos.distance(origin) >= self.config.pan_activation_distance {
                    self.phase = Phase::Panning { origin };
                    out.push(GestureEvent::PanStart { origin });
                    out.push(GestureEvent::PanUpdate {
                        translation: pos.delta_from(origin),
                    });
                }
            }
            Phase::Panning { origin } => {
                self.record(pos, now);
                out.push(GestureEvent::PanUpdate {
                    translation: pos.delta_from(origin),
                });
            }
        }
    }

    fn on_up(&mut self, pos: Point, now: Instant, out: &mut Vec<GestureEvent>) {
        match self.phase {
            Phase::Idle => {}
            Phase::Pending { down_at, .. } => {
                if now.saturating_duration_since(down_at) <= self.config.tap_max_duration {
                    out.push(GestureEvent::Tap { position: pos });
                }
            }
            Phase::Panning { origin } => {
                self.record(pos, now);
                let velocity = self.velocity();
                out.push(GestureEvent::PanUpdate {
                    translation: pos.delta_from(origin),
                });
                out.push(GestureEvent::PanEnd { velocity });
            }
        }
        self.reset();
    }

    fn record(&mut self, pos: Point, now: Instant) {
        self.samples.push_back((now, pos));
        while let Some(&(t, _)) = self.samples.front() {
            if self.samples.len() > 2
                && now.saturating_duration_since(t) > self.config.velocity_window
            {
                self.samples.pop_front();
            } else {
                break;
            }
        }
    }

    /// Pixels per second between the oldest and newest retained samples.
    fn velocity(&self) -> Point {
        let (Some(&(t0, p0)), Some(&(t1, p1))) = (self.samples.front(), self.samples.back())
        else {
            return Point::ZERO;
        };
        let dt = t1.saturating_duration_since(t0).as_secs_f64();
        if dt <= f64::EPSILON {
            return Point::ZERO;
        }
        let d = p1.delta_from(p0);
        Point::new(d.x / dt, d.y / dt)
    }
}

impl Default for GestureArbiter {
    fn default() -> Self {
        Self::new(GestureConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(base: Instant, n: u64) -> Instant {
        base + Duration::from_millis(n)
    }

    fn count_taps(events: &[GestureEvent]) -> usize {
        events
            .iter()
            .filter(|e| matches!(e, GestureEvent::Tap { .. }))
            .count()
    }

    #[test]
    fn short_press_is_tap() {
        let mut g = GestureArbiter::default();
        let t = Instant::now();
        assert!(g.process(PointerEvent::Down(Point::new(50.0, 80.0)), t).is_empty());
        let out = g.process(PointerEvent::Up(Point::new(51.0, 80.0)), ms(t, 80));
        assert_eq!(
            out,
            vec![GestureEvent::Tap {
                position: Point::new(51.0, 80.0)
            }]
        );
        assert!(!g.is_active());
    }

    #[test]
    fn small_jitter_stays_a_tap() {
        let mut g = GestureArbiter::default();
        let t = Instant::now();
        g.process(PointerEvent::Down(Point::new(0.0, 0.0)), t);
        assert!(g.process(PointerEvent::Move(Point::new(3.0, 4.0)), ms(t, 10)).is_empty());
        let out = g.process(PointerEvent::Up(Point::new(3.0, 4.0)), ms(t, 20));
        assert_eq!(count_taps(&out), 1);
    }

    #[test]
    fn long_press_without_motion_emits_nothing() {
        let mut g = GestureArbiter::default();
        let t = Instant::now();
        g.process(PointerEvent::Down(Point::ZERO), t);
        assert!(g.process(PointerEvent::Up(Point::ZERO), ms(t, 900)).is_empty());
    }

    #[test]
    fn pan_claims_sequence_and_suppresses_tap() {
        let mut g = GestureArbiter::default();
        let t = Instant::now();
        g.process(PointerEvent::Down(Point::new(100.0, 100.0)), t);
        let out = g.process(PointerEvent::Move(Point::new(80.0, 100.0)), ms(t, 16));
        assert_eq!(
            out,
            vec![
                GestureEvent::PanStart {
                    origin: Point::new(100.0, 100.0)
                },
                GestureEvent::PanUpdate {
                    translation: Point::new(-20.0, 0.0)
                },
            ]
        );
        assert!(g.is_panning());
        let out = g.process(PointerEvent::Up(Point::new(60.0, 100.0)), ms(t, 32));
        assert_eq!(count_taps(&out), 0);
        assert!(matches!(out.last(), Some(GestureEvent::PanEnd { .. })));
    }

    #[test]
    fn translation_is_relative_to_origin() {
        let mut g = GestureArbiter::default();
        let t = Instant::now();
        g.process(PointerEvent::Down(Point::new(10.0, 10.0)), t);
        g.process(PointerEvent::Move(Point::new(30.0, 10.0)), ms(t, 10));
        let out = g.process(PointerEvent::Move(Point::new(40.0, 25.0)), ms(t, 20));
        assert_eq!(
            out,
            vec![GestureEvent::PanUpdate {
                translation: Point::new(30.0, 15.0)
            }]
        );
    }

    #[test]
    fn release_velocity_uses_recent_samples() {
        let mut g = GestureArbiter::default();
        let t = Instant::now();
        g.process(PointerEvent::Down(Point::new(0.0, 0.0)), t);
        // Slow start outside the window, then a fast 50ms flick.
        g.process(PointerEvent::Move(Point::new(-20.0, 0.0)), ms(t, 300));
        g.process(PointerEvent::Move(Point::new(-40.0, 0.0)), ms(t, 450));
        g.process(PointerEvent::Move(Point::new(-90.0, 0.0)), ms(t, 500));
        let out = g.process(PointerEvent::Up(Point::new(-140.0, 0.0)), ms(t, 550));
        let Some(GestureEvent::PanEnd { velocity }) = out.last() else {
            panic!("expected PanEnd, got {out:?}");
        };
        // Window keeps samples from 450ms on: 100px over 100ms.
        assert!((velocity.x + 1000.0).abs() < 1e-6, "vx = {}", velocity.x);
        assert_eq!(velocity.y, 0.0);
    }

    #[test]
    fn cancel_during_pan_ends_with_zero_velocity() {
        let mut g = GestureArbiter::default();
        let t = Instant::now();
        g.process(PointerEvent::Down(Point::ZERO), t);
        g.process(PointerEvent::Move(Point::new(0.0, 50.0)), ms(t, 10));
        let out = g.process(PointerEvent::Cancel, ms(t, 20));
        assert_eq!(
            out,
            vec![GestureEvent::PanEnd {
                velocity: Point::ZERO
            }]
        );
        assert!(!g.is_active());
    }

    #[test]
    fn orphan_move_and_up_are_ignored() {
        let mut g = GestureArbiter::default();
        let t = Instant::now();
        assert!(g.process(PointerEvent::Move(Point::new(99.0, 0.0)), t).is_empty());
        assert!(g.process(PointerEvent::Up(Point::new(99.0, 0.0)), t).is_empty());
    }

    #[test]
    fn reset_abandons_sequence() {
        let mut g = GestureArbiter::default();
        let t = Instant::now();
        g.process(PointerEvent::Down(Point::ZERO), t);
        g.reset();
        assert!(g.process(PointerEvent::Up(Point::ZERO), ms(t, 10)).is_empty());
    }
}
