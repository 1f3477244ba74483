#![forbid(unsafe_code)]

//! Wall-clock primitives: epoch timestamps, calendar-day keys and day windows.
//!
//! There is no ambient "today". Everything that needs the current time takes
//! a [`Timestamp`] argument or a [`Clock`], so the engine stays deterministic
//! under test.
//!
//! All civil-day math is done in UTC.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};

use chrono::{DateTime, Days, NaiveDate, NaiveTime, Utc};

use crate::error::EpgError;

/// Milliseconds in one minute.
pub const MILLIS_PER_MINUTE: i64 = 60_000;
/// Milliseconds in one hour.
pub const MILLIS_PER_HOUR: i64 = 60 * MILLIS_PER_MINUTE;
/// Milliseconds in one calendar day.
pub const MILLIS_PER_DAY: i64 = 24 * MILLIS_PER_HOUR;

/// Offset of the last displayed instant (23:59:59) from midnight.
const DAY_END_OFFSET_MS: i64 = MILLIS_PER_DAY - 1_000;

const DATE_KEY_FORMAT: &str = "%Y-%m-%d";

// ---------------------------------------------------------------------------
// Timestamp
// ---------------------------------------------------------------------------

/// Milliseconds since the Unix epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(transparent)
)]
pub struct Timestamp(i64);

impl Timestamp {
    /// Create a timestamp from epoch milliseconds.
    #[inline]
    #[must_use]
    pub const fn from_millis(ms: i64) -> Self {
        Self(ms)
    }

    /// Epoch milliseconds.
    #[inline]
    #[must_use]
    pub const fn as_millis(self) -> i64 {
        self.0
    }

    /// Shift by `ms` milliseconds, saturating at the `i64` range.
    #[inline]
    #[must_use]
    pub const fn saturating_add_millis(self, ms: i64) -> Self {
        Self(self.0.saturating_add(ms))
    }

    /// Fractional minutes elapsed since `earlier` (negative if `self` is earlier).
    #[inline]
    #[must_use]
    pub fn minutes_since(self, earlier: Timestamp) -> f64 {
        (self.0 - earlier.0) as f64 / MILLIS_PER_MINUTE as f64
    }

    /// The UTC calendar day containing this instant.
    #[must_use]
    pub fn date_key(self) -> DateKey {
        DateKey(
            DateTime::<Utc>::from_timestamp_millis(self.0)
                .map(|dt| dt.date_naive())
                .unwrap_or_default(),
        )
    }

    /// `HH:MM` wall-clock label for this instant.
    #[must_use]
    pub fn format_hm(self) -> String {
        let minute_of_day = self.0.rem_euclid(MILLIS_PER_DAY) / MILLIS_PER_MINUTE;
        format!("{:02}:{:02}", minute_of_day / 60, minute_of_day % 60)
    }
}

// ---------------------------------------------------------------------------
// DateKey
// ---------------------------------------------------------------------------

/// A calendar date, written as `YYYY-MM-DD` wherever it is used as a key.
///
/// Defaults to 1970-01-01.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct DateKey(NaiveDate);

impl DateKey {
    /// Build from year, month and day. Returns `None` for impossible dates.
    #[must_use]
    pub fn from_ymd(year: i32, month: u32, day: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, day).map(Self)
    }

    /// Parse a `YYYY-MM-DD` key.
    pub fn parse(input: &str) -> Result<Self, EpgError> {
        let invalid = || EpgError::InvalidDateKey {
            input: input.to_owned(),
        };
        // chrono accepts unpadded fields; keys are always zero-padded.
        if input.len() != 10 {
            return Err(invalid());
        }
        NaiveDate::parse_from_str(input, DATE_KEY_FORMAT)
            .map(Self)
            .map_err(|_| invalid())
    }

    /// The underlying calendar date.
    #[inline]
    #[must_use]
    pub fn date(self) -> NaiveDate {
        self.0
    }

    /// The current UTC day according to `clock`.
    #[must_use]
    pub fn today(clock: &dyn Clock) -> Self {
        clock.now().date_key()
    }

    /// Midnight at the start of this day.
    #[must_use]
    pub fn day_start(self) -> Timestamp {
        Timestamp(self.0.and_time(NaiveTime::MIN).and_utc().timestamp_millis())
    }

    /// The displayed window for this day: `[00:00:00, 23:59:59]`.
    #[must_use]
    pub fn window(self) -> TimeWindow {
        let start = self.day_start();
        TimeWindow::new(start, start.saturating_add_millis(DAY_END_OFFSET_MS))
    }

    /// The following calendar day.
    #[must_use]
    pub fn next(self) -> Option<Self> {
        self.0.checked_add_days(Days::new(1)).map(Self)
    }
}

impl fmt::Display for DateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(DATE_KEY_FORMAT))
    }
}

impl FromStr for DateKey {
    type Err = EpgError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for DateKey {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for DateKey {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = <std::borrow::Cow<'de, str>>::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// TimeWindow
// ---------------------------------------------------------------------------

/// Fixed bounds of the displayed day.
///
/// # Invariants
///
/// `day_start <= day_end`. [`TimeWindow::new`] collapses an inverted pair to
/// an empty window at `day_start`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimeWindow {
    day_start: Timestamp,
    day_end: Timestamp,
}

impl TimeWindow {
    /// Create a window. An end before the start collapses onto the start.
    #[must_use]
    pub fn new(day_start: Timestamp, day_end: Timestamp) -> Self {
        Self {
            day_start,
            day_end: day_end.max(day_start),
        }
    }

    /// First instant of the window.
    #[inline]
    #[must_use]
    pub const fn day_start(&self) -> Timestamp {
        self.day_start
    }

    /// Last instant of the window (inclusive).
    #[inline]
    #[must_use]
    pub const fn day_end(&self) -> Timestamp {
        self.day_end
    }

    /// Window length in milliseconds.
    #[inline]
    #[must_use]
    pub const fn duration_millis(&self) -> i64 {
        self.day_end.0 - self.day_start.0
    }

    /// Whether `t` lies in `[day_start, day_end]`.
    #[inline]
    #[must_use]
    pub fn contains(&self, t: Timestamp) -> bool {
        t >= self.day_start && t <= self.day_end
    }

    /// Clamp `t` into the window.
    #[inline]
    #[must_use]
    pub fn clamp(&self, t: Timestamp) -> Timestamp {
        t.clamp(self.day_start, self.day_end)
    }
}

// ---------------------------------------------------------------------------
// Clock
// ---------------------------------------------------------------------------

/// Source of wall-clock time.
pub trait Clock: Send + Sync {
    /// Current wall-clock time.
    fn now(&self) -> Timestamp;
}

/// The system UTC clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Timestamp(Utc::now().timestamp_millis())
    }
}

/// A manually driven clock for tests and replays.
///
/// Clones share the same underlying time.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Arc<AtomicI64>,
}

impl ManualClock {
    /// Create a clock frozen at `now`.
    #[must_use]
    pub fn new(now: Timestamp) -> Self {
        Self {
            now: Arc::new(AtomicI64::new(now.0)),
        }
    }

    /// Jump to `now`.
    pub fn set(&self, now: Timestamp) {
        self.now.store(now.0, Ordering::Release);
    }

    /// Move forward by `ms` milliseconds.
    pub fn advance_millis(&self, ms: i64) {
        self.now.fetch_add(ms, Ordering::AcqRel);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        Timestamp(self.now.load(Ordering::Acquire))
    }
}
