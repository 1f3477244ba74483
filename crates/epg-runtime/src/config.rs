#![forbid(unsafe_code)]

//! Engine configuration.
//!
//! [`GuideConfig`] gathers every tunable of the engine into one value with
//! defaults that reproduce the stock grid: 250px hourly slots, 60px rows, a
//! 100px channel column, 15ms scroll commits and a 10s "now" tick.
//!
//! With the `config-file` feature it loads from TOML or JSON:
//!
//! ```toml
//! [grid]
//! slot_width = 300.0
//!
//! [scroll]
//! commit_interval_ms = 20
//!
//! [now]
//! interval_ms = 5000
//! ```
//!
//! Missing sections and fields keep their defaults. Loaded values are
//! validated before they are returned.

use std::fmt;
use std::time::Duration;

#[cfg(feature = "config-file")]
use std::path::Path;

#[cfg(feature = "config-file")]
use serde::{Deserialize, Serialize};

use epg_core::animation::DecayConfig;
use epg_core::gesture::GestureConfig;
use epg_layout::GridMetrics;

use crate::commit_throttle::CommitterConfig;

// ---------------------------------------------------------------------------
// Sections
// ---------------------------------------------------------------------------

/// Grid geometry.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "config-file", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "config-file", serde(default))]
pub struct GridSection {
    /// Pixels per timeline slot.
    pub slot_width: f64,
    /// Minutes per timeline slot.
    pub slot_minutes: u32,
    /// Row height in pixels.
    pub row_height: f64,
    /// Header height in pixels.
    pub header_height: f64,
    /// Channel-name column width in pixels.
    pub channel_name_width: f64,
    /// Blocks at or below this width hide details.
    pub detail_min_width: f64,
}

impl Default for GridSection {
    fn default() -> Self {
        let m = GridMetrics::default();
        Self {
            slot_width: m.slot_width,
            slot_minutes: m.slot_minutes,
            row_height: m.row_height,
            header_height: m.header_height,
            channel_name_width: m.channel_name_width,
            detail_min_width: m.detail_min_width,
        }
    }
}

/// Scroll commit and pan physics.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "config-file", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "config-file", serde(default))]
pub struct ScrollSection {
    /// Minimum spacing between committed scroll values.
    pub commit_interval_ms: u64,
    /// Animation frame interval.
    pub frame_interval_ms: u64,
    /// Per-millisecond velocity retention after release.
    pub deceleration: f64,
    /// Speed in px/s at which a fling stops.
    pub rest_velocity: f64,
    /// Keep a decision log of commit choices.
    pub enable_logging: bool,
    /// Maximum decision-log entries kept.
    pub log_capacity: usize,
}

impl Default for ScrollSection {
    fn default() -> Self {
        let decay = DecayConfig::default();
        let committer = CommitterConfig::default();
        Self {
            commit_interval_ms: committer.interval.as_millis() as u64,
            frame_interval_ms: 16,
            deceleration: decay.deceleration,
            rest_velocity: decay.rest_velocity,
            enable_logging: committer.enable_logging,
            log_capacity: committer.log_capacity,
        }
    }
}

/// Gesture thresholds.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "config-file", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "config-file", serde(default))]
pub struct GestureSection {
    /// Pointer travel in pixels before a pan starts.
    pub pan_activation_distance: f64,
    /// Longest press that still counts as a tap.
    pub tap_max_duration_ms: u64,
    /// Trailing window for release velocity.
    pub velocity_window_ms: u64,
}

impl Default for GestureSection {
    fn default() -> Self {
        let g = GestureConfig::default();
        Self {
            pan_activation_distance: g.pan_activation_distance,
            tap_max_duration_ms: g.tap_max_duration.as_millis() as u64,
            velocity_window_ms: g.velocity_window.as_millis() as u64,
        }
    }
}

/// "Now" indicator refresh.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "config-file", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "config-file", serde(default))]
pub struct NowSection {
    /// Interval between "now" ticks.
    pub interval_ms: u64,
    /// Re-centre on "now" after resize until the user taps.
    pub follow_now: bool,
}

impl Default for NowSection {
    fn default() -> Self {
        Self {
            interval_ms: 10_000,
            follow_now: true,
        }
    }
}

// ---------------------------------------------------------------------------
// GuideConfig
// ---------------------------------------------------------------------------

/// Complete engine configuration.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "config-file", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "config-file", serde(default))]
pub struct GuideConfig {
    /// Grid geometry.
    pub grid: GridSection,
    /// Scroll commits and physics.
    pub scroll: ScrollSection,
    /// Gesture thresholds.
    pub gesture: GestureSection,
    /// "Now" tick.
    pub now: NowSection,
}

impl GuideConfig {
    /// Replace the grid metrics.
    #[must_use]
    pub fn with_metrics(mut self, m: GridMetrics) -> Self {
        self.grid = GridSection {
            slot_width: m.slot_width,
            slot_minutes: m.slot_minutes,
            row_height: m.row_height,
            header_height: m.header_height,
            channel_name_width: m.channel_name_width,
            detail_min_width: m.detail_min_width,
        };
        self
    }

    /// Set the scroll commit interval.
    #[must_use]
    pub fn with_commit_interval(mut self, interval: Duration) -> Self {
        self.scroll.commit_interval_ms = interval.as_millis() as u64;
        self
    }

    /// Set the animation frame interval.
    #[must_use]
    pub fn with_frame_interval(mut self, interval: Duration) -> Self {
        self.scroll.frame_interval_ms = interval.as_millis() as u64;
        self
    }

    /// Set the "now" tick interval.
    #[must_use]
    pub fn with_now_interval(mut self, interval: Duration) -> Self {
        self.now.interval_ms = interval.as_millis() as u64;
        self
    }

    /// Set the fling deceleration.
    #[must_use]
    pub fn with_deceleration(mut self, deceleration: f64) -> Self {
        self.scroll.deceleration = deceleration;
        self
    }

    /// Enable or disable commit decision logging.
    #[must_use]
    pub fn with_logging(mut self, enabled: bool) -> Self {
        self.scroll.enable_logging = enabled;
        self
    }

    /// Enable or disable follow-now.
    #[must_use]
    pub fn with_follow_now(mut self, enabled: bool) -> Self {
        self.now.follow_now = enabled;
        self
    }

    /// Grid metrics for the layout crate.
    #[must_use]
    pub fn metrics(&self) -> GridMetrics {
        GridMetrics {
            slot_width: self.grid.slot_width,
            slot_minutes: self.grid.slot_minutes,
            row_height: self.grid.row_height,
            header_height: self.grid.header_height,
            channel_name_width: self.grid.channel_name_width,
            detail_min_width: self.grid.detail_min_width,
        }
    }

    /// Scroll committer settings.
    #[must_use]
    pub fn committer(&self) -> CommitterConfig {
        CommitterConfig {
            interval: Duration::from_millis(self.scroll.commit_interval_ms),
            enable_logging: self.scroll.enable_logging,
            log_capacity: self.scroll.log_capacity,
        }
    }

    /// Fling decay settings.
    #[must_use]
    pub fn decay(&self) -> DecayConfig {
        DecayConfig {
            deceleration: self.scroll.deceleration,
            rest_velocity: self.scroll.rest_velocity,
        }
    }

    /// Gesture arbiter settings.
    #[must_use]
    pub fn gesture(&self) -> GestureConfig {
        GestureConfig {
            pan_activation_distance: self.gesture.pan_activation_distance,
            tap_max_duration: Duration::from_millis(self.gesture.tap_max_duration_ms),
            velocity_window: Duration::from_millis(self.gesture.velocity_window_ms),
        }
    }

    /// Animation frame interval.
    #[must_use]
    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(self.scroll.frame_interval_ms)
    }

    /// "Now" tick interval.
    #[must_use]
    pub fn now_interval(&self) -> Duration {
        Duration::from_millis(self.now.interval_ms)
    }

    /// Check every field, returning the first problem.
    pub fn validate(&self) -> Result<(), ConfigError> {
        fn positive(field: &'static str, v: f64) -> Result<(), ConfigError> {
            if v.is_finite() && v > 0.0 {
                Ok(())
            } else {
                Err(ConfigError::invalid(field, format!("must be > 0, got {v}")))
            }
        }
        fn non_negative(field: &'static str, v: f64) -> Result<(), ConfigError> {
            if v.is_finite() && v >= 0.0 {
                Ok(())
            } else {
                Err(ConfigError::invalid(field, format!("must be >= 0, got {v}")))
            }
        }

        positive("grid.slot_width", self.grid.slot_width)?;
        if self.grid.slot_minutes == 0 || self.grid.slot_minutes > 24 * 60 {
            return Err(ConfigError::invalid(
                "grid.slot_minutes",
                format!("must be in 1..=1440, got {}", self.grid.slot_minutes),
            ));
        }
        positive("grid.row_height", self.grid.row_height)?;
        non_negative("grid.header_height", self.grid.header_height)?;
        non_negative("grid.channel_name_width", self.grid.channel_name_width)?;
        non_negative("grid.detail_min_width", self.grid.detail_min_width)?;

        if self.scroll.frame_interval_ms == 0 {
            return Err(ConfigError::invalid("scroll.frame_interval_ms", "must be > 0"));
        }
        let d = self.scroll.deceleration;
        if !(DecayConfig::MIN_DECELERATION..=DecayConfig::MAX_DECELERATION).contains(&d) {
            return Err(ConfigError::invalid(
                "scroll.deceleration",
                format!(
                    "must be in [{}, {}], got {d}",
                    DecayConfig::MIN_DECELERATION,
                    DecayConfig::MAX_DECELERATION
                ),
            ));
        }
        positive("scroll.rest_velocity", self.scroll.rest_velocity)?;

        non_negative(
            "gesture.pan_activation_distance",
            self.gesture.pan_activation_distance,
        )?;
        if self.gesture.velocity_window_ms == 0 {
            return Err(ConfigError::invalid("gesture.velocity_window_ms", "must be > 0"));
        }

        if self.now.interval_ms == 0 {
            return Err(ConfigError::invalid("now.interval_ms", "must be > 0"));
        }
        Ok(())
    }

    /// Parse and validate a TOML document.
    #[cfg(feature = "config-file")]
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s).map_err(|e| ConfigError::parse("TOML", e))?;
        config.validate()?;
        Ok(config)
    }

    /// Parse and validate a JSON document.
    #[cfg(feature = "config-file")]
    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(s).map_err(|e| ConfigError::parse("JSON", e))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a file; `.json` files are JSON, anything else is TOML.
    #[cfg(feature = "config-file")]
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(ConfigError::Io)?;
        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        let config = if is_json {
            Self::from_json_str(&content)?
        } else {
            Self::from_toml_str(&content)?
        };
        tracing::info!(path = %path.display(), "loaded guide config");
        Ok(config)
    }

    /// Serialize to TOML.
    #[cfg(feature = "config-file")]
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::parse("TOML", e))
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors from building or loading a [`GuideConfig`].
#[derive(Debug)]
pub enum ConfigError {
    /// A field holds an unusable value.
    Invalid {
        /// Dotted field path.
        field: &'static str,
        /// What is wrong with it.
        reason: String,
    },
    /// The document could not be parsed.
    Parse {
        /// `TOML` or `JSON`.
        format: &'static str,
        /// Underlying parser error.
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// Reading the file failed.
    Io(std::io::Error),
}

impl ConfigError {
    fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            field,
            reason: reason.into(),
        }
    }

    #[cfg(feature = "config-file")]
    fn parse(format: &'static str, e: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Parse {
            format,
            source: Box::new(e),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Invalid { field, reason } => write!(f, "invalid config field {field}: {reason}"),
            Self::Parse { format, source } => write!(f, "{format} parse error: {source}"),
            Self::Io(e) => write!(f, "I/O error: {e}"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Invalid { .. } => None,
            Self::Parse { source, .. } => Some(source.as_ref()),
            Self::Io(e) => Some(e),
        }
    }
}
