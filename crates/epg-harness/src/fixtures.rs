#![forbid(unsafe_code)]

//! Small hand-built guides with known geometry.

use epg_core::epg::{ChannelBrief, ChannelBriefs, ChannelId, ChannelPrograms, DayGuide, EpgSource, Program};
use epg_core::time::{DateKey, MILLIS_PER_MINUTE, Timestamp};

/// The fixture day, 2025-04-09.
#[must_use]
pub fn sample_day() -> DateKey {
    DateKey::from_ymd(2025, 4, 9).unwrap_or_default()
}

/// `minute` minutes after midnight of [`sample_day`].
#[must_use]
pub fn at_minute(minute: i64) -> Timestamp {
    sample_day()
        .day_start()
        .saturating_add_millis(minute * MILLIS_PER_MINUTE)
}

/// A program on `channel_id` spanning `[start_minute, end_minute)`.
#[must_use]
pub fn program(channel_id: ChannelId, id: u64, start_minute: i64, end_minute: i64, title: &str) -> Program {
    Program {
        channel_id,
        id,
        start: at_minute(start_minute),
        end: at_minute(end_minute),
        title: title.to_owned(),
        genre: None,
    }
}

/// Briefs named `Channel N` for ids `1..=count`.
#[must_use]
pub fn briefs(count: u32) -> ChannelBriefs {
    ChannelBriefs::new(
        (1..=count)
            .map(|id| ChannelBrief::new(id, format!("Channel {id}")))
            .collect(),
    )
}

/// `channels` channels of 24 hourly programs each. Program ids are the hour.
#[must_use]
pub fn hourly_source(channels: u32) -> EpgSource {
    let guide = DayGuide {
        channels: (1..=channels)
            .map(|channel_id| ChannelPrograms {
                channel_id,
                items: (0..24)
                    .map(|h| program(channel_id, h as u64, h * 60, (h + 1) * 60, &format!("Hour {h}")))
                    .collect(),
            })
            .collect(),
    };
    EpgSource::new(briefs(channels)).with_day(sample_day(), guide)
}

/// One channel with `A` at 00:00-00:30 and `B` at 00:30-01:00.
#[must_use]
pub fn two_half_hours() -> EpgSource {
    let guide = DayGuide {
        channels: vec![ChannelPrograms {
            channel_id: 1,
            items: vec![program(1, 1, 0, 30, "A"), program(1, 2, 30, 60, "B")],
        }],
    };
    EpgSource::new(briefs(1)).with_day(sample_day(), guide)
}

/// One channel with `Long` at 01:00-03:00 overlapped by `Short` at 02:00-02:30.
#[must_use]
pub fn overlapping() -> EpgSource {
    let guide = DayGuide {
        channels: vec![ChannelPrograms {
            channel_id: 1,
            items: vec![program(1, 1, 60, 180, "Long"), program(1, 2, 120, 150, "Short")],
        }],
    };
    EpgSource::new(briefs(1)).with_day(sample_day(), guide)
}
