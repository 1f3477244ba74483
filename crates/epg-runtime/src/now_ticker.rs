#![forbid(unsafe_code)]

//! "Now" tick policy.
//!
//! The "now" indicator and running flags refresh on a slow timer. A tick that
//! lands while a scroll commit is pending is suppressed: the data context is
//! about to recompose anyway, and refreshing underneath an in-flight commit
//! would do the work twice. The schedule keeps its cadence either way.

use std::time::{Duration, Instant};

/// Outcome of [`NowTicker::poll_at`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NowTick {
    /// Not due yet.
    Idle,
    /// Refresh now.
    Fire,
    /// Due, but skipped because a commit is pending.
    Suppressed,
}

/// Counters since construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NowTickerStats {
    /// Ticks that fired.
    pub fired: u64,
    /// Ticks skipped for a pending commit.
    pub suppressed: u64,
}

/// Fixed-interval ticker with commit-pending suppression.
#[derive(Debug, Clone)]
pub struct NowTicker {
    interval: Duration,
    next_due: Option<Instant>,
    stats: NowTickerStats,
}

impl NowTicker {
    /// Ticker firing every `interval` (default 10s).
    #[must_use]
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            next_due: None,
            stats: NowTickerStats::default(),
        }
    }

    /// Interval between ticks.
    #[inline]
    #[must_use]
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Anchor the schedule at `now`; the first tick is due one interval later.
    pub fn start_at(&mut self, now: Instant) {
        self.next_due = Some(now + self.interval);
    }

    /// Check the schedule at `now`.
    ///
    /// An unstarted ticker starts itself. Missed ticks collapse into one.
    pub fn poll_at(&mut self, now: Instant, commit_pending: bool) -> NowTick {
        let Some(due) = self.next_due else {
            self.start_at(now);
            return NowTick::Idle;
        };
        if now < due {
            return NowTick::Idle;
        }
        self.next_due = Some(now + self.interval);
        self.on_due(commit_pending)
    }

    /// Handle an externally timed tick (e.g. an [`Every`](crate::subscription::Every)
    /// subscription firing).
    pub fn on_due(&mut self, commit_pending: bool) -> NowTick {
        if commit_pending {
            self.stats.suppressed += 1;
            tracing::trace!("now tick suppressed by pending commit");
            NowTick::Suppressed
        } else {
            self.stats.fired += 1;
            NowTick::Fire
        }
    }

    /// Counters.
    #[inline]
    #[must_use]
    pub fn stats(&self) -> NowTickerStats {
        self.stats
    }
}

impl Default for NowTicker {
    fn default() -> Self {
        Self::new(Duration::from_secs(10))
    }
}
