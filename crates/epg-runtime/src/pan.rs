#![forbid(unsafe_code)]

//! Pan state machine: drag, release, decay.
//!
//! ```text
//!            begin()                release(v)
//! Idle ───────────────► Dragging ───────────────► Decaying
//!  ▲                       ▲                          │
//!  │                       └──────── begin() ─────────┤
//!  └──────────────── both axes at rest ◄── tick(dt) ──┘
//! ```
//!
//! The live translation is clamped to the [`ScrollBounds`] after every
//! change. `begin` re-baselines on the current live value, so a new gesture
//! during a fling catches the content where it is.

use std::time::Duration;

use epg_core::animation::{Animation, DecayAnimation, DecayConfig};
use epg_core::geometry::{Point, ScrollBounds, Translation};

/// Controller phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PanPhase {
    /// Nothing moving.
    #[default]
    Idle,
    /// A pointer owns the content.
    Dragging,
    /// Released with velocity; decaying towards rest.
    Decaying,
}

/// Owns the live translation.
#[derive(Debug, Clone)]
pub struct PanController {
    bounds: ScrollBounds,
    decay_config: DecayConfig,
    live: Translation,
    baseline: Translation,
    phase: PanPhase,
    decay: Option<(DecayAnimation, DecayAnimation)>,
}

impl PanController {
    /// Idle controller at `initial` (clamped).
    #[must_use]
    pub fn new(bounds: ScrollBounds, initial: Translation, decay_config: DecayConfig) -> Self {
        let live = bounds.clamp(initial);
        Self {
            bounds,
            decay_config,
            live,
            baseline: live,
            phase: PanPhase::Idle,
            decay: None,
        }
    }

    /// Current phase.
    #[inline]
    #[must_use]
    pub fn phase(&self) -> PanPhase {
        self.phase
    }

    /// Live translation.
    #[inline]
    #[must_use]
    pub fn live(&self) -> Translation {
        self.live
    }

    /// Active bounds.
    #[inline]
    #[must_use]
    pub fn bounds(&self) -> ScrollBounds {
        self.bounds
    }

    /// Whether [`tick`](Self::tick) still has work to do.
    #[inline]
    #[must_use]
    pub fn is_animating(&self) -> bool {
        self.phase == PanPhase::Decaying
    }

    /// Start a drag, cancelling any decay.
    pub fn begin(&mut self) {
        if self.phase == PanPhase::Decaying {
            tracing::trace!(x = self.live.x, y = self.live.y, "decay cancelled by new gesture");
        }
        self.decay = None;
        self.baseline = self.live;
        self.phase = PanPhase::Dragging;
    }

    /// Move to `baseline + delta`, clamped. Ignored unless dragging.
    pub fn update(&mut self, delta: Point) -> Translation {
        if self.phase == PanPhase::Dragging {
            self.live = self.bounds.clamp(self.baseline.shifted(delta));
        }
        self.live
    }

    /// Release with `velocity` (px/s) and start decaying.
    pub fn release(&mut self, velocity: Point) {
        if self.phase != PanPhase::Dragging {
            return;
        }
        let x = DecayAnimation::new(
            self.live.x,
            velocity.x,
            self.bounds.min_x(),
            0.0,
            self.decay_config,
        );
        let y = DecayAnimation::new(
            self.live.y,
            velocity.y,
            self.bounds.min_y(),
            0.0,
            self.decay_config,
        );
        if x.is_complete() && y.is_complete() {
            self.decay = None;
            self.phase = PanPhase::Idle;
        } else {
            self.decay = Some((x, y));
            self.phase = PanPhase::Decaying;
        }
    }

    /// Advance the decay by `dt`. Returns the live translation.
    pub fn tick(&mut self, dt: Duration) -> Translation {
        if let Some((x, y)) = self.decay.as_mut() {
            x.tick(dt);
            y.tick(dt);
            self.live = self.bounds.clamp(Translation::new(x.value(), y.value()));
            if x.is_complete() && y.is_complete() {
                self.decay = None;
                self.phase = PanPhase::Idle;
            }
        }
        self.live
    }

    /// Replace the bounds (resize or data change), re-clamping the live value.
    pub fn set_bounds(&mut self, bounds: ScrollBounds) -> Translation {
        self.bounds = bounds;
        self.live = bounds.clamp(self.live);
        self.baseline = bounds.clamp(self.baseline);
        if let Some((x, y)) = self.decay.as_mut() {
            x.set_bounds(bounds.min_x(), 0.0);
            y.set_bounds(bounds.min_y(), 0.0);
            if x.is_complete() && y.is_complete() {
                self.decay = None;
                self.phase = PanPhase::Idle;
            }
        }
        self.live
    }

    /// Jump to `translation` (clamped), stopping any motion.
    pub fn set_translation(&mut self, translation: Translation) -> Translation {
        self.decay = None;
        self.live = self.bounds.clamp(translation);
        self.baseline = self.live;
        self.phase = PanPhase::Idle;
        self.live
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use epg_core::geometry::Size;

    const FRAME: Duration = Duration::from_millis(16);

    fn controller() -> PanController {
        let bounds = ScrollBounds::new(Size::new(6100.0, 6060.0), Size::new(1000.0, 600.0));
        PanController::new(bounds, Translation::ZERO, DecayConfig::default())
    }

    #[test]
    fn drag_moves_from_baseline() {
        let mut p = controller();
        p.begin();
        assert_eq!(p.update(Point::new(-100.0, -30.0)), Translation::new(-100.0, -30.0));
        assert_eq!(p.update(Point::new(-150.0, -30.0)), Translation::new(-150.0, -30.0));
        assert_eq!(p.phase(), PanPhase::Dragging);
    }

    #[test]
    fn drag_is_clamped() {
        let mut p = controller();
        p.begin();
        assert_eq!(p.update(Point::new(500.0, 500.0)), Translation::ZERO);
        assert_eq!(
            p.update(Point::new(-1e6, -1e6)),
            Translation::new(-5100.0, -5460.0)
        );
    }

    #[test]
    fn update_ignored_when_idle() {
        let mut p = controller();
        assert_eq!(p.update(Point::new(-100.0, 0.0)), Translation::ZERO);
    }

    #[test]
    fn fling_decays_to_idle() {
        let mut p = controller();
        p.begin();
        p.update(Point::new(-1000.0, 0.0));
        p.release(Point::new(-2000.0, 0.0));
        assert_eq!(p.phase(), PanPhase::Decaying);
        let mut frames = 0;
        while p.is_animating() {
            p.tick(FRAME);
            frames += 1;
            assert!(frames < 5_000);
        }
        assert!(p.live().x < -1000.0);
        assert_eq!(p.phase(), PanPhase::Idle);
    }

    #[test]
    fn slow_release_goes_idle() {
        let mut p = controller();
        p.begin();
        p.update(Point::new(-10.0, 0.0));
        p.release(Point::new(0.2, 0.0));
        assert_eq!(p.phase(), PanPhase::Idle);
    }

    #[test]
    fn begin_during_decay_rebaselines() {
        let mut p = controller();
        p.begin();
        p.update(Point::new(-1000.0, 0.0));
        p.release(Point::new(-3000.0, 0.0));
        p.tick(FRAME);
        p.tick(FRAME);
        let caught = p.live();
        p.begin();
        assert_eq!(p.phase(), PanPhase::Dragging);
        assert_eq!(p.tick(FRAME), caught);
        assert_eq!(p.update(Point::new(10.0, 0.0)), caught.shifted(Point::new(10.0, 0.0)));
    }

    #[test]
    fn shrinking_bounds_reclamps() {
        let mut p = controller();
        p.begin();
        p.update(Point::new(-5000.0, -5000.0));
        let bounds = ScrollBounds::new(Size::new(3000.0, 1000.0), Size::new(1000.0, 600.0));
        assert_eq!(p.set_bounds(bounds), Translation::new(-2000.0, -400.0));
    }

    #[test]
    fn set_translation_stops_motion() {
        let mut p = controller();
        p.begin();
        p.update(Point::new(-100.0, 0.0));
        p.release(Point::new(-3000.0, 0.0));
        assert_eq!(p.set_translation(Translation::new(50.0, -20.0)), Translation::new(0.0, -20.0));
        assert_eq!(p.phase(), PanPhase::Idle);
    }
}
