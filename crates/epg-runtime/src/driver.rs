#![forbid(unsafe_code)]

//! The animation context and its frame loop.
//!
//! [`AnimationContext`] turns raw pointer events into a live translation
//! (gesture arbitration, drag, fling decay) and feeds it through the sampler
//! and the commit throttle into a [`HandoffWriter`]. It never looks at the
//! data side.
//!
//! [`AnimationLoop`] runs a context on its own thread. Commands arrive over
//! an `mpsc` channel; frames are paced with [`StopSignal::wait_timeout`], so
//! stopping wakes the loop immediately.
//!
//! ```text
//! PointerEvent ─► GestureArbiter ─► PanController ─► ScrollSampler ─► ScrollCommitter ─► HandoffWriter
//!                      │ Tap                                                              ▲
//!                      └──────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

use epg_core::geometry::{ScrollBounds, Translation};
use epg_core::gesture::{GestureArbiter, GestureEvent, PointerEvent};

use crate::commit_throttle::{CommittedScroll, CommitterStats, ScrollCommitter, ScrollSampler};
use crate::config::GuideConfig;
use crate::handoff::{HandoffWriter, TapEvent};
use crate::pan::{PanController, PanPhase};
use crate::subscription::{StopSignal, StopTrigger};

/// Gesture, physics and commit state of the animation side.
#[derive(Debug)]
pub struct AnimationContext {
    arbiter: GestureArbiter,
    pan: PanController,
    sampler: ScrollSampler,
    committer: ScrollCommitter,
    writer: HandoffWriter,
    frame_interval: Duration,
    last_frame: Option<Instant>,
}

impl AnimationContext {
    /// Context at `initial` within `bounds`, publishing into `writer`.
    #[must_use]
    pub fn new(
        config: &GuideConfig,
        bounds: ScrollBounds,
        initial: Translation,
        writer: HandoffWriter,
    ) -> Self {
        Self {
            arbiter: GestureArbiter::new(config.gesture()),
            pan: PanController::new(bounds, initial, config.decay()),
            sampler: ScrollSampler::new(config.grid.row_height),
            committer: ScrollCommitter::new(config.committer()),
            writer,
            frame_interval: config.frame_interval(),
            last_frame: None,
        }
    }

    /// Feed one pointer event observed at `now`.
    ///
    /// Taps are forwarded through the hand-off and also returned.
    pub fn handle_pointer_at(&mut self, event: PointerEvent, now: Instant) -> Vec<TapEvent> {
        let mut taps = Vec::new();
        for gesture in self.arbiter.process(event, now) {
            match gesture {
                GestureEvent::PanStart { .. } => self.pan.begin(),
                GestureEvent::PanUpdate { translation } => {
                    let live = self.pan.update(translation);
                    self.push(live, now);
                }
                GestureEvent::PanEnd { velocity } => {
                    self.pan.release(velocity);
                    self.last_frame = Some(now);
                }
                GestureEvent::Tap { position } => {
                    let tap = TapEvent {
                        screen: position,
                        translation: self.pan.live(),
                    };
                    self.writer.tap(tap);
                    taps.push(tap);
                }
            }
        }
        self.writer.set_commit_pending(self.committer.has_pending());
        taps
    }

    /// Run one frame at `now`: advance decay, then publish a due commit.
    pub fn frame_at(&mut self, now: Instant) -> Option<CommittedScroll> {
        let dt = self
            .last_frame
            .map_or(self.frame_interval, |last| now.saturating_duration_since(last));
        self.last_frame = Some(now);
        if self.pan.is_animating() {
            let live = self.pan.tick(dt);
            self.push(live, now);
        }
        let committed = self.committer.tick_at(now).committed();
        self.finish(committed)
    }

    /// Publish any pending value immediately.
    pub fn flush_at(&mut self, now: Instant) -> Option<CommittedScroll> {
        let committed = self.committer.flush_at(now).committed();
        self.finish(committed)
    }

    /// Replace the scroll bounds (resize or data change).
    pub fn set_bounds_at(&mut self, bounds: ScrollBounds, now: Instant) {
        let live = self.pan.set_bounds(bounds);
        self.push(live, now);
        self.writer.set_commit_pending(self.committer.has_pending());
    }

    /// Jump to `translation`, dropping any gesture and motion, and publish it
    /// at once.
    pub fn reset_at(&mut self, translation: Translation, now: Instant) -> CommittedScroll {
        self.arbiter.reset();
        let live = self.pan.set_translation(translation);
        self.sampler.reset();
        self.sampler.sample(live);
        let committed = self.committer.reset_at(live, now);
        self.writer.publish(committed);
        self.writer.set_commit_pending(false);
        committed
    }

    /// Live translation.
    #[inline]
    #[must_use]
    pub fn live(&self) -> Translation {
        self.pan.live()
    }

    /// Pan phase.
    #[inline]
    #[must_use]
    pub fn phase(&self) -> PanPhase {
        self.pan.phase()
    }

    /// Whether another frame would do work.
    #[must_use]
    pub fn needs_frame(&self) -> bool {
        self.pan.is_animating() || self.committer.has_pending()
    }

    /// Commit counters.
    #[must_use]
    pub fn commit_stats(&self) -> CommitterStats {
        self.committer.stats()
    }

    /// Interval between frames.
    #[inline]
    #[must_use]
    pub fn frame_interval(&self) -> Duration {
        self.frame_interval
    }

    fn push(&mut self, live: Translation, now: Instant) {
        if self.sampler.sample(live)
            && let Some(committed) = self.committer.push_sample_at(live, now).committed()
        {
            self.writer.publish(committed);
        }
    }

    fn finish(&mut self, committed: Option<CommittedScroll>) -> Option<CommittedScroll> {
        if let Some(c) = committed {
            self.writer.publish(c);
        }
        self.writer.set_commit_pending(self.committer.has_pending());
        committed
    }
}

// ---------------------------------------------------------------------------
// AnimationLoop
// ---------------------------------------------------------------------------

/// Commands for a running [`AnimationLoop`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AnimationCommand {
    /// A pointer event and when it happened.
    Pointer {
        /// The event.
        event: PointerEvent,
        /// Observation time.
        at: Instant,
    },
    /// New scroll bounds.
    Bounds(ScrollBounds),
    /// Jump to a translation.
    Reset(Translation),
    /// Flush and exit.
    Stop,
}

/// An [`AnimationContext`] on its own thread.
#[derive(Debug)]
pub struct AnimationLoop {
    commands: mpsc::Sender<AnimationCommand>,
    trigger: StopTrigger,
    thread: Option<thread::JoinHandle<AnimationContext>>,
}

impl AnimationLoop {
    /// Start `context` on a new thread.
    #[must_use]
    pub fn spawn(context: AnimationContext) -> Self {
        let (commands, rx) = mpsc::channel();
        let (signal, trigger) = StopSignal::new();
        tracing::debug!(
            frame_ms = context.frame_interval().as_millis() as u64,
            "animation loop starting"
        );
        let thread = thread::spawn(move || run(context, &rx, &signal));
        Self {
            commands,
            trigger,
            thread: Some(thread),
        }
    }

    /// Send a command. Returns `false` once the loop has exited.
    pub fn send(&self, command: AnimationCommand) -> bool {
        self.commands.send(command).is_ok()
    }

    /// Send a pointer event stamped with the current time.
    pub fn pointer(&self, event: PointerEvent) -> bool {
        self.send(AnimationCommand::Pointer {
            event,
            at: Instant::now(),
        })
    }

    /// Stop the loop, flush its pending commit and return the context.
    pub fn stop(mut self) -> Option<AnimationContext> {
        let _ = self.commands.send(AnimationCommand::Stop);
        self.trigger.stop();
        self.thread.take().and_then(|handle| handle.join().ok())
    }
}

impl Drop for AnimationLoop {
    fn drop(&mut self) {
        self.trigger.stop();
    }
}

fn run(
    mut context: AnimationContext,
    commands: &mpsc::Receiver<AnimationCommand>,
    signal: &StopSignal,
) -> AnimationContext {
    loop {
        loop {
            match commands.try_recv() {
                Ok(AnimationCommand::Pointer { event, at }) => {
                    context.handle_pointer_at(event, at);
                }
                Ok(AnimationCommand::Bounds(bounds)) => {
                    context.set_bounds_at(bounds, Instant::now());
                }
                Ok(AnimationCommand::Reset(t)) => {
                    context.reset_at(t, Instant::now());
                }
                Ok(AnimationCommand::Stop) | Err(mpsc::TryRecvError::Disconnected) => {
                    return shutdown(context);
                }
                Err(mpsc::TryRecvError::Empty) => break,
            }
        }
        context.frame_at(Instant::now());
        if signal.wait_timeout(context.frame_interval()) {
            // Commands sent just before the stop still count.
            while let Ok(command) = commands.try_recv() {
                match command {
                    AnimationCommand::Pointer { event, at } => {
                        context.handle_pointer_at(event, at);
                    }
                    AnimationCommand::Bounds(bounds) => {
                        context.set_bounds_at(bounds, Instant::now());
                    }
                    AnimationCommand::Reset(t) => {
                        context.reset_at(t, Instant::now());
                    }
                    AnimationCommand::Stop => break,
                }
            }
            return shutdown(context);
        }
    }
}

fn shutdown(mut context: AnimationContext) -> AnimationContext {
    context.flush_at(Instant::now());
    let stats = context.commit_stats();
    tracing::debug!(
        samples = stats.samples,
        commits = stats.commits,
        coalesced = stats.coalesced,
        "animation loop stopped"
    );
    context
}
