#![forbid(unsafe_code)]

//! Deterministic two-context simulator.
//!
//! [`GuideSimulator`] wires a [`GuideEngine`], an [`AnimationContext`], the
//! hand-off and a [`NowTicker`] together on one thread and drives them from
//! a virtual clock. Nothing sleeps: [`GuideSimulator::advance`] steps the
//! animation frame by frame and pumps the hand-off after each step, in the
//! same order the threaded runtime would observe.
//!
//! ```ignore
//! use epg_harness::sim::GuideSimulator;
//!
//! let mut sim = GuideSimulator::new(config, source, date, now, Size::new(1000.0, 600.0));
//! sim.drag(Point::new(500.0, 300.0), Point::new(200.0, 300.0), 10, Duration::from_millis(200));
//! println!("{}", sim.text());
//! ```

use std::time::{Duration, Instant};

use epg_core::epg::EpgSource;
use epg_core::geometry::{Point, Translation, ViewportSize};
use epg_core::gesture::PointerEvent;
use epg_core::time::{Clock, DateKey, ManualClock, Timestamp};
use epg_layout::hit_test::Selection;
use epg_runtime::{
    AnimationContext, GuideConfig, GuideEngine, GuideFrame, HandoffReader, NowTick, NowTicker,
    NowTickerStats, ScrollHandoff,
};

use crate::text::frame_to_text;

/// Upper bound on frames run by [`GuideSimulator::settle`].
pub const MAX_SETTLE_FRAMES: usize = 10_000;

/// Both contexts of a guide on a virtual clock.
#[derive(Debug)]
pub struct GuideSimulator {
    engine: GuideEngine,
    animation: AnimationContext,
    reader: HandoffReader,
    ticker: NowTicker,
    clock: ManualClock,
    wall_start: Timestamp,
    start: Instant,
    elapsed: Duration,
    selections: Vec<Selection>,
    frames: u64,
}

impl GuideSimulator {
    /// Simulator showing `date` at wall time `now` in `viewport`.
    #[must_use]
    pub fn new(
        config: GuideConfig,
        source: EpgSource,
        date: DateKey,
        now: Timestamp,
        viewport: ViewportSize,
    ) -> Self {
        let ticker = NowTicker::new(config.now_interval());
        let mut engine = GuideEngine::new(config, source, date, now);
        let initial = engine.resize(viewport);
        let (writer, reader) = ScrollHandoff::channel();
        let animation = AnimationContext::new(engine.config(), engine.scroll_bounds(), initial, writer);
        let start = Instant::now();
        let mut sim = Self {
            engine,
            animation,
            reader,
            ticker,
            clock: ManualClock::new(now),
            wall_start: now,
            start,
            elapsed: Duration::ZERO,
            selections: Vec::new(),
            frames: 0,
        };
        sim.ticker.start_at(start);
        sim
    }

    /// Current virtual instant.
    #[must_use]
    pub fn instant(&self) -> Instant {
        self.start + self.elapsed
    }

    /// Current virtual wall time.
    #[must_use]
    pub fn wall_now(&self) -> Timestamp {
        self.clock.now()
    }

    /// Feed one pointer event at the current instant, then pump.
    pub fn pointer(&mut self, event: PointerEvent) {
        let now = self.instant();
        self.animation.handle_pointer_at(event, now);
        self.pump();
    }

    /// Run animation frames for `duration`, pumping after each.
    pub fn advance(&mut self, duration: Duration) {
        let step = self.animation.frame_interval().max(Duration::from_millis(1));
        let mut remaining = duration;
        while !remaining.is_zero() {
            let dt = step.min(remaining);
            remaining -= dt;
            self.elapsed += dt;
            self.clock.set(
                self.wall_start
                    .saturating_add_millis(self.elapsed.as_millis() as i64),
            );
            self.animation.frame_at(self.instant());
            self.frames += 1;
            self.pump();
        }
    }

    /// Advance until no motion or pending commit is left.
    ///
    /// Returns the number of frames run.
    pub fn settle(&mut self) -> usize {
        let step = self.animation.frame_interval();
        let mut frames = 0;
        while self.animation.needs_frame() && frames < MAX_SETTLE_FRAMES {
            self.advance(step);
            frames += 1;
        }
        frames
    }

    /// Drag from `from` to `to` in `steps` moves over `duration`, then hold
    /// still past the velocity window and release, so nothing flings.
    pub fn drag(&mut self, from: Point, to: Point, steps: u32, duration: Duration) {
        self.stroke(from, to, steps, duration);
        let hold = self.engine.config().gesture().velocity_window + self.animation.frame_interval();
        self.advance(hold);
        self.pointer(PointerEvent::Up(to));
        self.settle();
    }

    /// Drag from `from` to `to` and release at full speed, then let the
    /// fling decay to rest.
    pub fn fling(&mut self, from: Point, to: Point, steps: u32, duration: Duration) {
        self.stroke(from, to, steps, duration);
        self.pointer(PointerEvent::Up(to));
        self.settle();
    }

    /// Press and release at `at`.
    pub fn tap(&mut self, at: Point) {
        self.pointer(PointerEvent::Down(at));
        self.advance(Duration::from_millis(50));
        self.pointer(PointerEvent::Up(at));
    }

    /// Resize the viewport and realign the animation side. While follow-now
    /// is active the animation jumps to the re-centred position.
    pub fn resize(&mut self, viewport: ViewportSize) -> Translation {
        let target = self.engine.resize(viewport);
        let now = self.instant();
        self.animation.set_bounds_at(self.engine.scroll_bounds(), now);
        if self.engine.follow_now() && self.animation.live() != target {
            self.animation.reset_at(target, now);
        } else {
            self.animation.flush_at(now);
        }
        self.pump();
        target
    }

    /// Switch the displayed day and jump to its initial position.
    pub fn set_day(&mut self, date: DateKey) -> Translation {
        let target = self.engine.set_day(date, self.clock.now());
        let now = self.instant();
        self.animation.set_bounds_at(self.engine.scroll_bounds(), now);
        self.animation.reset_at(target, now);
        self.pump();
        target
    }

    /// The composed frame.
    pub fn frame(&mut self) -> &GuideFrame {
        self.engine.frame()
    }

    /// The composed frame as text.
    pub fn text(&mut self) -> String {
        let metrics = self.engine.metrics();
        frame_to_text(self.engine.frame(), &metrics)
    }

    /// The data side.
    #[must_use]
    pub fn engine(&self) -> &GuideEngine {
        &self.engine
    }

    /// Mutable data side.
    pub fn engine_mut(&mut self) -> &mut GuideEngine {
        &mut self.engine
    }

    /// The animation side.
    #[must_use]
    pub fn animation(&self) -> &AnimationContext {
        &self.animation
    }

    /// Selections produced by taps so far.
    #[must_use]
    pub fn selections(&self) -> &[Selection] {
        &self.selections
    }

    /// "Now" tick counters.
    #[must_use]
    pub fn now_stats(&self) -> NowTickerStats {
        self.ticker.stats()
    }

    /// Frames run so far.
    #[must_use]
    pub fn frames(&self) -> u64 {
        self.frames
    }

    fn stroke(&mut self, from: Point, to: Point, steps: u32, duration: Duration) {
        let steps = steps.max(1);
        let step_dt = duration / steps;
        self.pointer(PointerEvent::Down(from));
        for i in 1..=steps {
            self.advance(step_dt);
            let f = f64::from(i) / f64::from(steps);
            let p = Point::new(from.x + (to.x - from.x) * f, from.y + (to.y - from.y) * f);
            self.pointer(PointerEvent::Move(p));
        }
    }

    fn pump(&mut self) {
        if let Some(committed) = self.reader.latest() {
            self.engine.apply_commit(committed);
        }
        for tap in self.reader.taps() {
            if let Some(selection) = self.engine.select_at(tap.screen, tap.translation) {
                self.selections.push(selection);
            }
        }
        if self.ticker.poll_at(self.instant(), self.reader.commit_pending()) == NowTick::Fire {
            let flipped = self.engine.now_tick(self.clock.now());
            tracing::trace!(flipped, "simulated now tick");
        }
    }
}
