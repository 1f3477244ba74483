#![forbid(unsafe_code)]

//! Scroll commit throttling.
//!
//! The pan controller produces a live translation every animation frame.
//! Re-culling and re-composing the grid that often is wasted work, so live
//! values go through a [`ScrollCommitter`] that publishes at most one
//! committed value per interval:
//!
//! - **Trailing commit**: the first sample after an idle period schedules a
//!   commit `interval` later. Later samples only replace the pending value.
//! - **Latest-wins**: the value committed is always the newest sample.
//! - **Skip no-ops**: a due value equal to the last committed one is dropped.
//!
//! A [`ScrollSampler`] sits in front of the committer and forwards only
//! samples that move the horizontal offset or the integer row offset.
//!
//! # Invariants
//!
//! - Samples within one interval produce at most one commit, equal to the
//!   last sample.
//! - Committed sequence numbers strictly increase.
//! - Identical sample sequences at identical instants yield identical
//!   decisions.
//!
//! # Failure Modes
//!
//! | Condition | Behavior |
//! |-----------|----------|
//! | `interval = 0` | Commit on the sample itself |
//! | `tick_at` before due | [`CommitAction::None`] |
//! | Clock runs backwards | Elapsed time saturates at zero |

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use epg_core::geometry::Translation;
use epg_layout::recycling::scroll_row_offset;

/// A committed scroll value with its sequence number.
///
/// Readers ignore anything with a sequence at or below what they already
/// applied.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CommittedScroll {
    /// Monotonic sequence number, starting at 1.
    pub seq: u64,
    /// Committed content translation.
    pub translation: Translation,
}

/// Settings for [`ScrollCommitter`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CommitterConfig {
    /// Minimum spacing between commits (default: 15ms).
    pub interval: Duration,
    /// Keep a decision log.
    pub enable_logging: bool,
    /// Decision-log capacity; oldest entries are dropped first.
    pub log_capacity: usize,
}

impl Default for CommitterConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(15),
            enable_logging: false,
            log_capacity: 256,
        }
    }
}

impl CommitterConfig {
    /// Set the interval.
    #[must_use]
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Enable or disable decision logging.
    #[must_use]
    pub fn with_logging(mut self, enabled: bool) -> Self {
        self.enable_logging = enabled;
        self
    }
}

/// What the caller should do after feeding the committer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CommitAction {
    /// Nothing to publish.
    None,
    /// Publish this committed value.
    Commit(CommittedScroll),
}

impl CommitAction {
    /// The committed value, if any.
    #[must_use]
    pub fn committed(self) -> Option<CommittedScroll> {
        match self {
            Self::Commit(c) => Some(c),
            Self::None => None,
        }
    }
}

/// Decision taken by the committer, for the log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitDecision {
    /// First sample after idle; commit scheduled.
    Schedule,
    /// Sample replaced a pending value.
    Coalesce,
    /// Pending value committed.
    Commit,
    /// Due value equalled the last commit and was dropped.
    SkipSame,
    /// Explicit reset committed.
    Reset,
}

impl CommitDecision {
    /// Stable string form.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Schedule => "schedule",
            Self::Coalesce => "coalesce",
            Self::Commit => "commit",
            Self::SkipSame => "skip_same",
            Self::Reset => "reset",
        }
    }
}

/// One decision-log entry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CommitLog {
    /// When the decision was taken.
    pub at: Instant,
    /// The decision.
    pub decision: CommitDecision,
    /// Pending value after the decision.
    pub pending: Option<Translation>,
    /// Sequence number committed by this decision.
    pub seq: Option<u64>,
}

/// Counters since construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CommitterStats {
    /// Samples received.
    pub samples: u64,
    /// Values committed, resets included.
    pub commits: u64,
    /// Samples that replaced a pending value.
    pub coalesced: u64,
    /// Due values dropped as unchanged.
    pub skipped: u64,
    /// Explicit resets.
    pub resets: u64,
}

/// Interval-bounded, latest-wins scroll committer.
#[derive(Debug, Clone)]
pub struct ScrollCommitter {
    config: CommitterConfig,
    pending: Option<Translation>,
    due: Option<Instant>,
    last_committed: Option<Translation>,
    seq: u64,
    stats: CommitterStats,
    logs: VecDeque<CommitLog>,
}

impl ScrollCommitter {
    /// Create an idle committer.
    #[must_use]
    pub fn new(config: CommitterConfig) -> Self {
        Self {
            config,
            pending: None,
            due: None,
            last_committed: None,
            seq: 0,
            stats: CommitterStats::default(),
            logs: VecDeque::new(),
        }
    }

    /// Feed a live sample observed at `now`.
    pub fn push_sample_at(&mut self, translation: Translation, now: Instant) -> CommitAction {
        self.stats.samples += 1;
        self.pending = Some(translation);

        if self.config.interval.is_zero() {
            return self.commit_pending(now);
        }

        if self.due.is_some() {
            self.stats.coalesced += 1;
            self.log(now, CommitDecision::Coalesce, None);
        } else {
            self.due = Some(now + self.config.interval);
            self.log(now, CommitDecision::Schedule, None);
        }
        CommitAction::None
    }

    /// Commit the pending value if it is due.
    pub fn tick_at(&mut self, now: Instant) -> CommitAction {
        match self.due {
            Some(due) if now >= due => self.commit_pending(now),
            _ => CommitAction::None,
        }
    }

    /// Commit the pending value now, due or not.
    pub fn flush_at(&mut self, now: Instant) -> CommitAction {
        if self.pending.is_none() {
            return CommitAction::None;
        }
        self.commit_pending(now)
    }

    /// Commit `translation` immediately, dropping any pending value.
    pub fn reset_at(&mut self, translation: Translation, now: Instant) -> CommittedScroll {
        self.pending = None;
        self.due = None;
        self.stats.resets += 1;
        let committed = self.publish(translation);
        self.log(now, CommitDecision::Reset, Some(committed.seq));
        committed
    }

    /// Time left until the pending value is due.
    #[must_use]
    pub fn time_until_commit(&self, now: Instant) -> Option<Duration> {
        self.due.map(|due| due.saturating_duration_since(now))
    }

    /// Whether a value is waiting to be committed.
    #[inline]
    #[must_use]
    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Last committed translation.
    #[inline]
    #[must_use]
    pub fn last_committed(&self) -> Option<Translation> {
        self.last_committed
    }

    /// Last issued sequence number (0 before the first commit).
    #[inline]
    #[must_use]
    pub fn seq(&self) -> u64 {
        self.seq
    }

    /// Counters.
    #[inline]
    #[must_use]
    pub fn stats(&self) -> CommitterStats {
        self.stats
    }

    /// Decision log (empty unless logging is enabled).
    pub fn logs(&self) -> impl Iterator<Item = &CommitLog> {
        self.logs.iter()
    }

    /// Clear the decision log.
    pub fn clear_logs(&mut self) {
        self.logs.clear();
    }

    /// Current configuration.
    #[inline]
    #[must_use]
    pub fn config(&self) -> &CommitterConfig {
        &self.config
    }

    fn commit_pending(&mut self, now: Instant) -> CommitAction {
        self.due = None;
        let Some(value) = self.pending.take() else {
            return CommitAction::None;
        };
        if self.last_committed == Some(value) {
            self.stats.skipped += 1;
            self.log(now, CommitDecision::SkipSame, None);
            return CommitAction::None;
        }
        let committed = self.publish(value);
        self.log(now, CommitDecision::Commit, Some(committed.seq));
        tracing::trace!(
            seq = committed.seq,
            x = value.x,
            y = value.y,
            "scroll committed"
        );
        CommitAction::Commit(committed)
    }

    fn publish(&mut self, translation: Translation) -> CommittedScroll {
        self.seq += 1;
        self.stats.commits += 1;
        self.last_committed = Some(translation);
        CommittedScroll {
            seq: self.seq,
            translation,
        }
    }

    fn log(&mut self, at: Instant, decision: CommitDecision, seq: Option<u64>) {
        if !self.config.enable_logging || self.config.log_capacity == 0 {
            return;
        }
        while self.logs.len() >= self.config.log_capacity {
            self.logs.pop_front();
        }
        self.logs.push_back(CommitLog {
            at,
            decision,
            pending: self.pending,
            seq,
        });
    }
}

impl Default for ScrollCommitter {
    fn default() -> Self {
        Self::new(CommitterConfig::default())
    }
}

/// Forwards a live sample only when it can change what the grid shows.
///
/// A sample passes when the horizontal translation changed or the integer
/// row offset changed. Sub-row vertical motion is absorbed.
#[derive(Debug, Clone, PartialEq)]
pub struct ScrollSampler {
    row_height: f64,
    last: Option<(f64, usize)>,
}

impl ScrollSampler {
    /// Sampler for rows of `row_height`.
    #[must_use]
    pub fn new(row_height: f64) -> Self {
        Self {
            row_height,
            last: None,
        }
    }

    /// Whether `translation` should be forwarded. Updates the reference
    /// value when it is.
    pub fn sample(&mut self, translation: Translation) -> bool {
        let key = (
            translation.x,
            scroll_row_offset(translation.offset().y, self.row_height),
        );
        if self.last == Some(key) {
            return false;
        }
        self.last = Some(key);
        true
    }

    /// Force the next sample through.
    pub fn reset(&mut self) {
        self.last = None;
    }
}
