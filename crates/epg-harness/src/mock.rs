#![forbid(unsafe_code)]

//! Deterministic mock EPG data.
//!
//! Each channel gets back-to-back programs from midnight until the next
//! program would run past the end of the day. Durations are drawn uniformly
//! from `[min_minutes, max_minutes]` and genres from `movie`, `news` and
//! `sports`, all from a seeded [`StdRng`] so the same config always yields
//! the same guide.
//!
//! ```ignore
//! use epg_harness::mock::MockEpgConfig;
//!
//! let source = MockEpgConfig::default().with_channels(20).with_seed(7).generate();
//! ```

use rand::prelude::*;

use epg_core::epg::{ChannelBrief, ChannelBriefs, ChannelPrograms, DayGuide, EpgSource, Program};
use epg_core::time::{DateKey, MILLIS_PER_DAY, MILLIS_PER_MINUTE};

/// Genres assigned to mock programs.
pub const GENRES: [&str; 3] = ["movie", "news", "sports"];

/// Placeholder logo for every mock channel.
pub const LOGO_PLACEHOLDER: &str = "https://via.placeholder.com/100";

/// Settings for [`generate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MockEpgConfig {
    /// Number of channels (default: 100).
    pub channel_count: u32,
    /// Day to fill (default: 2025-04-09).
    pub date: DateKey,
    /// RNG seed (default: 42).
    pub seed: u64,
    /// Shortest program in minutes (default: 10).
    pub min_minutes: i64,
    /// Longest program in minutes (default: 120).
    pub max_minutes: i64,
}

impl Default for MockEpgConfig {
    fn default() -> Self {
        Self {
            channel_count: 100,
            date: DateKey::from_ymd(2025, 4, 9).unwrap_or_default(),
            seed: 42,
            min_minutes: 10,
            max_minutes: 120,
        }
    }
}

impl MockEpgConfig {
    /// Set the channel count.
    #[must_use]
    pub fn with_channels(mut self, count: u32) -> Self {
        self.channel_count = count;
        self
    }

    /// Set the day.
    #[must_use]
    pub fn with_date(mut self, date: DateKey) -> Self {
        self.date = date;
        self
    }

    /// Set the seed.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Set the duration range in minutes. Bounds are reordered if needed
    /// and floored at one minute.
    #[must_use]
    pub fn with_durations(mut self, min_minutes: i64, max_minutes: i64) -> Self {
        let (lo, hi) = if min_minutes <= max_minutes {
            (min_minutes, max_minutes)
        } else {
            (max_minutes, min_minutes)
        };
        self.min_minutes = lo.max(1);
        self.max_minutes = hi.max(1);
        self
    }

    /// Build the source.
    #[must_use]
    pub fn generate(&self) -> EpgSource {
        generate(self)
    }
}

/// Build a mock source for `config`.
#[must_use]
pub fn generate(config: &MockEpgConfig) -> EpgSource {
    let mut rng = StdRng::seed_from_u64(config.seed);
    let window = config.date.window();
    let next_day = window.day_start().saturating_add_millis(MILLIS_PER_DAY);
    let (lo, hi) = (
        config.min_minutes.max(1),
        config.max_minutes.max(config.min_minutes.max(1)),
    );

    let mut briefs = Vec::with_capacity(config.channel_count as usize);
    let mut channels = Vec::with_capacity(config.channel_count as usize);
    for i in 0..config.channel_count {
        let channel_id = i + 1;
        briefs.push(ChannelBrief {
            channel_id,
            kind: "iptv".into(),
            default_channel_position: channel_id,
            logo_url: LOGO_PLACEHOLDER.into(),
            name: format!("Channel {channel_id}"),
        });

        let mut items = Vec::new();
        let mut start = window.day_start();
        let mut index: u64 = 1;
        loop {
            let minutes = rng.gen_range(lo..=hi);
            let end = start.saturating_add_millis(minutes * MILLIS_PER_MINUTE);
            if end >= next_day {
                break;
            }
            let genre = GENRES[rng.gen_range(0..GENRES.len())];
            items.push(Program {
                channel_id,
                id: u64::from(channel_id) * 100 + index,
                start,
                end,
                title: format!("Program {index}"),
                genre: Some(genre.into()),
            });
            start = end;
            index += 1;
        }
        channels.push(ChannelPrograms { channel_id, items });
    }

    let source = EpgSource::new(ChannelBriefs::new(briefs)).with_day(config.date, DayGuide { channels });
    tracing::debug!(
        date = %config.date,
        channels = config.channel_count,
        programs = source.day(config.date).map_or(0, DayGuide::program_count),
        seed = config.seed,
        "mock EPG generated"
    );
    source
}
