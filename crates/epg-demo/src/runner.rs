#![forbid(unsafe_code)]

//! Script runners.
//!
//! [`Demo::run_simulated`] replays a script on a virtual clock through
//! [`GuideSimulator`]; output is deterministic. [`Demo::run_threaded`] runs
//! the animation side on an [`AnimationLoop`] thread and the "now" tick on an
//! [`Every`] subscription, with this thread acting as the data side.

use std::fmt;
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::mpsc;
use std::time::{Duration, Instant};

use epg_core::epg::EpgSource;
use epg_core::error::EpgError;
use epg_core::geometry::Size;
use epg_core::time::{DateKey, MILLIS_PER_MINUTE, Timestamp};
use epg_harness::mock::MockEpgConfig;
use epg_harness::sim::GuideSimulator;
use epg_harness::text::TextRenderer;
use epg_layout::hit_test::Selection;
use epg_runtime::subscription;
use epg_runtime::{
    AnimationCommand, AnimationContext, AnimationLoop, ConfigError, Every, GuideConfig,
    GuideEngine, HandoffReader, NowTick, NowTicker, ScrollHandoff,
};

use crate::cli::Opts;
use crate::script::Step;

/// Data-side polling granularity in threaded mode.
const PUMP_SLICE: Duration = Duration::from_millis(4);
/// Settle time after a drag or tap in threaded mode.
const GESTURE_SETTLE: Duration = Duration::from_millis(120);
/// A fling is over once no commit arrived for this long.
const FLING_QUIET: Duration = Duration::from_millis(250);
/// Longest wait for a fling to come to rest.
const FLING_MAX: Duration = Duration::from_secs(10);

// ============================================================================
// Errors
// ============================================================================

/// Demo failures.
#[derive(Debug)]
pub enum DemoError {
    /// Bad gesture script.
    Script(crate::script::ScriptError),
    /// Bad or unreadable config file.
    Config(ConfigError),
    /// Bad date or EPG JSON.
    Data(EpgError),
    /// An input file could not be read.
    Read {
        /// The file.
        path: PathBuf,
        /// Underlying error.
        source: io::Error,
    },
    /// Writing output failed.
    Output(io::Error),
}

impl fmt::Display for DemoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Script(e) => write!(f, "{e}"),
            Self::Config(e) => write!(f, "config: {e}"),
            Self::Data(e) => write!(f, "data: {e}"),
            Self::Read { path, source } => write!(f, "cannot read {}: {source}", path.display()),
            Self::Output(e) => write!(f, "output: {e}"),
        }
    }
}

impl std::error::Error for DemoError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Script(e) => Some(e),
            Self::Config(e) => Some(e),
            Self::Data(e) => Some(e),
            Self::Read { source, .. } => Some(source),
            Self::Output(e) => Some(e),
        }
    }
}

impl From<crate::script::ScriptError> for DemoError {
    fn from(e: crate::script::ScriptError) -> Self {
        Self::Script(e)
    }
}

impl From<ConfigError> for DemoError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

impl From<EpgError> for DemoError {
    fn from(e: EpgError) -> Self {
        Self::Data(e)
    }
}

impl From<io::Error> for DemoError {
    fn from(e: io::Error) -> Self {
        Self::Output(e)
    }
}

// ============================================================================
// Demo
// ============================================================================

/// Everything a run needs, resolved from [`Opts`].
#[derive(Debug, Clone)]
pub struct Demo {
    /// Guide configuration.
    pub config: GuideConfig,
    /// EPG data.
    pub source: EpgSource,
    /// Displayed day.
    pub date: DateKey,
    /// Wall time at start.
    pub now: Timestamp,
    /// Initial viewport.
    pub viewport: Size,
    /// Pixels per text column.
    pub px_per_col: f64,
}

impl Demo {
    /// Resolve options: load config and data, or generate mock data.
    pub fn from_opts(opts: &Opts) -> Result<Self, DemoError> {
        let config = match &opts.config {
            Some(path) => GuideConfig::load(path)?,
            None => GuideConfig::default(),
        };
        let date = DateKey::parse(&opts.date)?;
        let source = match &opts.data {
            Some(path) => {
                let json = std::fs::read_to_string(path).map_err(|source| DemoError::Read {
                    path: path.clone(),
                    source,
                })?;
                EpgSource::from_json(&json)?
            }
            None => MockEpgConfig::default()
                .with_channels(opts.channels)
                .with_seed(opts.seed)
                .with_date(date)
                .generate(),
        };
        let now = date
            .day_start()
            .saturating_add_millis(opts.now_minutes * MILLIS_PER_MINUTE);
        tracing::info!(
            %date,
            channels = source.briefs().len(),
            width = opts.width,
            height = opts.height,
            "demo ready"
        );
        Ok(Self {
            config,
            source,
            date,
            now,
            viewport: Size::new(opts.width, opts.height),
            px_per_col: opts.px_per_col,
        })
    }

    /// Replay `steps` on a virtual clock, writing frames to `out`.
    pub fn run_simulated(
        &self,
        steps: &[Step],
        out: &mut impl Write,
    ) -> Result<GuideSimulator, DemoError> {
        let mut sim = GuideSimulator::new(
            self.config,
            self.source.clone(),
            self.date,
            self.now,
            self.viewport,
        );
        let mut shown = 0;
        for step in steps {
            match *step {
                Step::Show => {
                    shown += 1;
                    let renderer = TextRenderer::new(&sim.engine().metrics(), self.px_per_col);
                    let t = sim.engine().committed();
                    writeln!(out, "-- frame {shown} at ({}, {}) --", t.x, t.y)?;
                    writeln!(out, "{}", renderer.render(sim.frame()))?;
                }
                Step::Wait(d) => sim.advance(d),
                Step::Resize(size) => {
                    sim.resize(size);
                }
                Step::Day(date) => {
                    sim.set_day(date);
                }
                Step::Drag(..) | Step::Fling(..) | Step::Tap(..) => {
                    let before = sim.selections().len();
                    for (delay, event) in step.pointer_events(sim.engine().viewport()) {
                        sim.advance(delay);
                        sim.pointer(event);
                    }
                    sim.settle();
                    if let Some(selection) = sim.selections().get(before) {
                        write_selection(out, selection)?;
                    }
                }
            }
            let t = sim.engine().committed();
            tracing::debug!(?step, x = t.x, y = t.y, "step done");
        }
        Ok(sim)
    }

    /// Run `steps` in real time with a threaded animation side.
    pub fn run_threaded(
        &self,
        steps: &[Step],
        out: &mut impl Write,
    ) -> Result<GuideEngine, DemoError> {
        let mut engine = GuideEngine::new(self.config, self.source.clone(), self.date, self.now);
        let initial = engine.resize(self.viewport);
        let (writer, reader) = ScrollHandoff::channel();
        let animation = AnimationLoop::spawn(AnimationContext::new(
            &self.config,
            engine.scroll_bounds(),
            initial,
            writer,
        ));
        let (tx, rx) = mpsc::channel();
        let now_sub = subscription::spawn(Every::new(self.config.now_interval(), || ()), tx);

        let mut data = DataSide {
            engine,
            reader,
            ticks: rx,
            ticker: NowTicker::new(self.config.now_interval()),
            started: Instant::now(),
            wall_start: self.now,
            selections: Vec::new(),
        };

        let mut shown = 0;
        for step in steps {
            match *step {
                Step::Show => {
                    shown += 1;
                    let renderer = TextRenderer::new(&data.engine.metrics(), self.px_per_col);
                    let t = data.engine.committed();
                    writeln!(out, "-- frame {shown} at ({}, {}) --", t.x, t.y)?;
                    writeln!(out, "{}", renderer.render(data.engine.frame()))?;
                }
                Step::Wait(d) => {
                    data.pump_for(d);
                }
                Step::Resize(size) => {
                    let t = data.engine.resize(size);
                    animation.send(AnimationCommand::Bounds(data.engine.scroll_bounds()));
                    if data.engine.follow_now() {
                        animation.send(AnimationCommand::Reset(t));
                    }
                    data.pump_for(GESTURE_SETTLE);
                }
                Step::Day(date) => {
                    let t = data.engine.set_day(date, data.wall_now());
                    animation.send(AnimationCommand::Bounds(data.engine.scroll_bounds()));
                    animation.send(AnimationCommand::Reset(t));
                    data.pump_for(GESTURE_SETTLE);
                }
                Step::Drag(..) | Step::Fling(..) | Step::Tap(..) => {
                    let before = data.selections.len();
                    for (delay, event) in step.pointer_events(data.engine.viewport()) {
                        data.pump_for(delay);
                        animation.pointer(event);
                    }
                    if matches!(step, Step::Fling(..)) {
                        data.pump_until_quiet(FLING_QUIET, FLING_MAX);
                    } else {
                        data.pump_for(GESTURE_SETTLE);
                    }
                    if let Some(selection) = data.selections.get(before) {
                        write_selection(out, selection)?;
                    }
                }
            }
        }

        now_sub.stop();
        if let Some(context) = animation.stop() {
            let stats = context.commit_stats();
            tracing::info!(
                samples = stats.samples,
                commits = stats.commits,
                now_fired = data.ticker.stats().fired,
                now_suppressed = data.ticker.stats().suppressed,
                "threaded run finished"
            );
        }
        data.pump();
        Ok(data.engine)
    }
}

fn write_selection(out: &mut impl Write, selection: &Selection) -> io::Result<()> {
    writeln!(
        out,
        "selected {} on channel {} ({} min)",
        selection.program.title,
        selection.channel_id,
        selection.program.duration_minutes()
    )
}

// ============================================================================
// Threaded data side
// ============================================================================

struct DataSide {
    engine: GuideEngine,
    reader: HandoffReader,
    ticks: mpsc::Receiver<()>,
    ticker: NowTicker,
    started: Instant,
    wall_start: Timestamp,
    selections: Vec<Selection>,
}

impl DataSide {
    fn wall_now(&self) -> Timestamp {
        let elapsed = Instant::now().saturating_duration_since(self.started);
        self.wall_start
            .saturating_add_millis(elapsed.as_millis() as i64)
    }

    /// One turn: apply the newest commit, taps and due "now" ticks. Returns
    /// whether a commit was applied.
    fn pump(&mut self) -> bool {
        let committed = match self.reader.latest() {
            Some(c) => {
                self.engine.apply_commit(c);
                true
            }
            None => false,
        };
        for tap in self.reader.taps() {
            if let Some(selection) = self.engine.select_at(tap.screen, tap.translation) {
                self.selections.push(selection);
            }
        }
        while self.ticks.try_recv().is_ok() {
            if self.ticker.on_due(self.reader.commit_pending()) == NowTick::Fire {
                let now = self.wall_now();
                self.engine.now_tick(now);
            }
        }
        committed
    }

    fn pump_for(&mut self, duration: Duration) {
        let deadline = Instant::now() + duration;
        loop {
            self.pump();
            let now = Instant::now();
            if now >= deadline {
                break;
            }
            std::thread::sleep(PUMP_SLICE.min(deadline - now));
        }
    }

    fn pump_until_quiet(&mut self, quiet: Duration, max: Duration) {
        let start = Instant::now();
        let mut last_commit = start;
        while start.elapsed() < max {
            if self.pump() {
                last_commit = Instant::now();
            } else if last_commit.elapsed() >= quiet && !self.reader.commit_pending() {
                break;
            }
            std::thread::sleep(PUMP_SLICE);
        }
    }
}
