#![forbid(unsafe_code)]

//! EPG records as delivered by the data source.
//!
//! The source is organised the way the upstream feed ships it:
//!
//! - per date key, a list of channels, each with its programs;
//! - per date key, a `channel_id -> index` map into that list;
//! - one channel-brief list that fixes row order and display names.
//!
//! Records are immutable once loaded. A refresh replaces a whole
//! [`DayGuide`] through [`EpgSource::insert_day`].
//!
//! With the `serde` feature the source round-trips through the JSON shape
//! `{ "epg": {...}, "epgMap": {...}, "channelsBrief": { "array": [...], "map": {...} } }`.

use std::collections::{BTreeMap, HashMap};

use crate::time::{DateKey, Timestamp};

/// Channel identifier.
pub type ChannelId = u32;

/// Program identifier.
pub type ProgramId = u64;

/// One scheduled program.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "camelCase")
)]
pub struct Program {
    /// Owning channel.
    pub channel_id: ChannelId,
    /// Program identifier, unique within its channel.
    pub id: ProgramId,
    /// Start instant.
    pub start: Timestamp,
    /// End instant (exclusive for layout, inclusive for "running").
    pub end: Timestamp,
    /// Display title.
    pub title: String,
    /// Optional genre tag.
    #[cfg_attr(
        feature = "serde",
        serde(default, skip_serializing_if = "Option::is_none")
    )]
    pub genre: Option<String>,
}

impl Program {
    /// Whether `now` lies in `[start, end]`.
    #[inline]
    #[must_use]
    pub fn is_running_at(&self, now: Timestamp) -> bool {
        now >= self.start && now <= self.end
    }

    /// Whether `start < end`.
    #[inline]
    #[must_use]
    pub fn is_well_formed(&self) -> bool {
        self.start < self.end
    }

    /// Length in fractional minutes (negative for inverted intervals).
    #[inline]
    #[must_use]
    pub fn duration_minutes(&self) -> f64 {
        self.end.minutes_since(self.start)
    }
}

/// A channel's programs for one day.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "camelCase")
)]
pub struct ChannelPrograms {
    /// Channel these programs belong to.
    pub channel_id: ChannelId,
    /// Programs in chronological order.
    pub items: Vec<Program>,
}

/// All channels for one day.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DayGuide {
    /// Channel schedules, in feed order (not row order).
    pub channels: Vec<ChannelPrograms>,
}

impl DayGuide {
    /// Build the `channel_id -> index` lookup for this day.
    #[must_use]
    pub fn index(&self) -> HashMap<ChannelId, usize> {
        self.channels
            .iter()
            .enumerate()
            .map(|(idx, ch)| (ch.channel_id, idx))
            .collect()
    }

    /// Total number of programs across channels.
    #[must_use]
    pub fn program_count(&self) -> usize {
        self.channels.iter().map(|c| c.items.len()).sum()
    }
}

/// Display metadata for one channel.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "camelCase")
)]
pub struct ChannelBrief {
    /// Channel identifier.
    pub channel_id: ChannelId,
    /// Delivery type (e.g. `iptv`).
    #[cfg_attr(feature = "serde", serde(rename = "type", default))]
    pub kind: String,
    /// Position the operator assigned; informational, rows follow list order.
    #[cfg_attr(feature = "serde", serde(default))]
    pub default_channel_position: u32,
    /// Logo URL.
    #[cfg_attr(feature = "serde", serde(default))]
    pub logo_url: String,
    /// Display name.
    pub name: String,
}

impl ChannelBrief {
    /// Brief with only an id and a name.
    #[must_use]
    pub fn new(channel_id: ChannelId, name: impl Into<String>) -> Self {
        Self {
            channel_id,
            kind: String::new(),
            default_channel_position: channel_id,
            logo_url: String::new(),
            name: name.into(),
        }
    }
}

/// Ordered channel briefs with an id lookup.
///
/// The list order is the row order: a brief's index is its row `position`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ChannelBriefs {
    array: Vec<ChannelBrief>,
    map: HashMap<ChannelId, usize>,
}

impl ChannelBriefs {
    /// Build from an ordered list. Later duplicates of a channel id are ignored
    /// by the lookup so each id maps to a single row.
    #[must_use]
    pub fn new(array: Vec<ChannelBrief>) -> Self {
        let mut briefs = Self {
            array,
            map: HashMap::new(),
        };
        briefs.reindex();
        briefs
    }

    /// Rebuild the id lookup from the list.
    pub fn reindex(&mut self) {
        self.map.clear();
        for (idx, brief) in self.array.iter().enumerate() {
            self.map.entry(brief.channel_id).or_insert(idx);
        }
    }

    /// Number of rows.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.array.len()
    }

    /// Whether there are no channels.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.array.is_empty()
    }

    /// Row position of `channel_id`, if it has a brief.
    #[must_use]
    pub fn position_of(&self, channel_id: ChannelId) -> Option<usize> {
        self.map
            .get(&channel_id)
            .copied()
            .filter(|&idx| idx < self.array.len())
    }

    /// Brief for `channel_id`.
    #[must_use]
    pub fn get(&self, channel_id: ChannelId) -> Option<&ChannelBrief> {
        self.position_of(channel_id).map(|idx| &self.array[idx])
    }

    /// Brief at row `position`.
    #[must_use]
    pub fn at(&self, position: usize) -> Option<&ChannelBrief> {
        self.array.get(position)
    }

    /// Briefs in row order.
    pub fn iter(&self) -> impl Iterator<Item = &ChannelBrief> {
        self.array.iter()
    }
}

/// All EPG data available to the engine.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "camelCase")
)]
pub struct EpgSource {
    epg: BTreeMap<DateKey, DayGuide>,
    epg_map: BTreeMap<DateKey, HashMap<ChannelId, usize>>,
    channels_brief: ChannelBriefs,
}

impl EpgSource {
    /// Empty source with the given row order.
    #[must_use]
    pub fn new(channels_brief: ChannelBriefs) -> Self {
        Self {
            epg: BTreeMap::new(),
            epg_map: BTreeMap::new(),
            channels_brief,
        }
    }

    /// Add or replace a day, rebuilding its channel index.
    pub fn insert_day(&mut self, date: DateKey, guide: DayGuide) {
        self.epg_map.insert(date, guide.index());
        self.epg.insert(date, guide);
    }

    /// Builder form of [`insert_day`](Self::insert_day).
    #[must_use]
    pub fn with_day(mut self, date: DateKey, guide: DayGuide) -> Self {
        self.insert_day(date, guide);
        self
    }

    /// Row order and channel names.
    #[inline]
    #[must_use]
    pub fn briefs(&self) -> &ChannelBriefs {
        &self.channels_brief
    }

    /// Schedules for `date`.
    #[must_use]
    pub fn day(&self, date: DateKey) -> Option<&DayGuide> {
        self.epg.get(&date)
    }

    /// Dates with data, ascending.
    pub fn dates(&self) -> impl Iterator<Item = DateKey> + '_ {
        self.epg.keys().copied()
    }

    /// One channel's schedule for `date`, found through the day's index map.
    ///
    /// Stale index entries that point past the channel list, or at a
    /// different channel, resolve to `None`.
    #[must_use]
    pub fn channel_for(&self, date: DateKey, channel_id: ChannelId) -> Option<&ChannelPrograms> {
        let idx = *self.epg_map.get(&date)?.get(&channel_id)?;
        self.epg
            .get(&date)?
            .channels
            .get(idx)
            .filter(|ch| ch.channel_id == channel_id)
    }

    /// Decode the upstream JSON shape.
    #[cfg(feature = "serde")]
    pub fn from_json(json: &str) -> Result<Self, crate::error::EpgError> {
        let mut source: Self = serde_json::from_str(json)?;
        if source.channels_brief.map.is_empty() {
            source.channels_brief.reindex();
        }
        let missing: Vec<DateKey> = source
            .epg
            .keys()
            .filter(|date| !source.epg_map.contains_key(date))
            .copied()
            .collect();
        for date in missing {
            let index = source.epg[&date].index();
            source.epg_map.insert(date, index);
        }
        tracing::debug!(
            days = source.epg.len(),
            channels = source.channels_brief.len(),
            "decoded EPG source"
        );
        Ok(source)
    }

    /// Encode to the upstream JSON shape.
    #[cfg(feature = "serde")]
    pub fn to_json(&self) -> Result<String, crate::error::EpgError> {
        Ok(serde_json::to_string(self)?)
    }
}
