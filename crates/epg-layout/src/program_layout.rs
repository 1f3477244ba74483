#![forbid(unsafe_code)]

//! Program geometry, computed once per data or day change and cached per row.
//!
//! [`ProgramLayoutEngine::layout`] is a pure function of the source, the day,
//! the metrics and `now`. The resulting [`RowCache`] is indexed by row
//! position (the channel-brief order). Rows whose channel has no schedule for
//! the day are `None`.
//!
//! Two in-place refreshes avoid recomputing geometry:
//!
//! - [`RowCache::refresh_running`] re-evaluates `running` flags on a "now" tick.
//! - [`RowCache::set_selected`] moves the selection highlight.
//!
//! Neither touches [`RowCache::geometry_generation`].

use std::fmt;

use epg_core::epg::{ChannelId, EpgSource, Program, ProgramId};
use epg_core::geometry::Rect;
use epg_core::time::{DateKey, Timestamp};

use crate::GridMetrics;

/// Identity of a laid-out program: `{channel_id}_{program_id}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProgramKey {
    /// Owning channel.
    pub channel_id: ChannelId,
    /// Program within the channel.
    pub program_id: ProgramId,
}

impl ProgramKey {
    /// Key for `program`.
    #[must_use]
    pub fn of(program: &Program) -> Self {
        Self {
            channel_id: program.channel_id,
            program_id: program.id,
        }
    }
}

impl fmt::Display for ProgramKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.channel_id, self.program_id)
    }
}

/// A program with its grid geometry and display state.
#[derive(Debug, Clone, PartialEq)]
pub struct PositionedProgram {
    /// Stable key.
    pub key: ProgramKey,
    /// Source record.
    pub program: Program,
    /// Grid-space rectangle. Width is unclamped and may be zero or negative.
    pub rect: Rect,
    /// Whether "now" falls inside the program.
    pub running: bool,
    /// Whether the user selected this program.
    pub selected: bool,
    /// Display name of the owning channel.
    pub channel_name: String,
}

impl PositionedProgram {
    /// Left edge in grid space.
    #[inline]
    #[must_use]
    pub fn x(&self) -> f64 {
        self.rect.x
    }

    /// Width in pixels.
    #[inline]
    #[must_use]
    pub fn width(&self) -> f64 {
        self.rect.width
    }

    /// Whether the block is wide enough to show title and subtitle.
    #[inline]
    #[must_use]
    pub fn shows_detail(&self, min_width: f64) -> bool {
        self.rect.width > min_width
    }

    /// `HH:MM - HH:MM | genre`, or just the time range without a genre.
    #[must_use]
    pub fn subtitle(&self) -> String {
        let range = format!(
            "{} - {}",
            self.program.start.format_hm(),
            self.program.end.format_hm()
        );
        match self.program.genre.as_deref() {
            Some(genre) if !genre.is_empty() => format!("{range} | {genre}"),
            _ => range,
        }
    }
}

/// All positioned programs of one channel row.
#[derive(Debug, Clone, PartialEq)]
pub struct LaidOutRow {
    /// Row position.
    pub position: usize,
    /// Channel shown in the row.
    pub channel_id: ChannelId,
    /// Channel display name.
    pub channel_name: String,
    /// Top edge in grid space.
    pub y: f64,
    /// Programs in source order.
    pub programs: Vec<PositionedProgram>,
}

/// Per-row layout results for one day.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RowCache {
    date: Option<DateKey>,
    rows: Vec<Option<LaidOutRow>>,
    geometry_generation: u64,
    selected: Option<ProgramKey>,
    dropped: usize,
}

impl RowCache {
    /// Number of row positions (channels), including rows without data.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether there are no rows at all.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Day the cache was computed for.
    #[inline]
    #[must_use]
    pub fn date(&self) -> Option<DateKey> {
        self.date
    }

    /// Row at `position`, if it has data.
    #[must_use]
    pub fn get(&self, position: usize) -> Option<&LaidOutRow> {
        self.rows.get(position).and_then(Option::as_ref)
    }

    /// Rows that have data, in position order.
    pub fn iter(&self) -> impl Iterator<Item = &LaidOutRow> {
        self.rows.iter().flatten()
    }

    /// Incremented by every geometry computation.
    #[inline]
    #[must_use]
    pub fn geometry_generation(&self) -> u64 {
        self.geometry_generation
    }

    /// Programs dropped because their channel had no brief, whether the whole
    /// channel was unbriefed or a single record named an unbriefed channel.
    #[inline]
    #[must_use]
    pub fn dropped(&self) -> usize {
        self.dropped
    }

    /// Total positioned programs.
    #[must_use]
    pub fn program_count(&self) -> usize {
        self.iter().map(|row| row.programs.len()).sum()
    }

    /// Currently selected program.
    #[inline]
    #[must_use]
    pub fn selected(&self) -> Option<ProgramKey> {
        self.selected
    }

    /// Re-evaluate `running` flags for `now`. Returns how many flags flipped.
    pub fn refresh_running(&mut self, now: Timestamp) -> usize {
        let mut flipped = 0;
        for row in self.rows.iter_mut().flatten() {
            for p in &mut row.programs {
                let running = p.program.is_running_at(now);
                if running != p.running {
                    p.running = running;
                    flipped += 1;
                }
            }
        }
        flipped
    }

    /// Move the selection highlight. Returns whether anything changed.
    pub fn set_selected(&mut self, key: Option<ProgramKey>) -> bool {
        if self.selected == key {
            return false;
        }
        self.selected = key;
        self.apply_selection();
        true
    }

    /// Find a program by key.
    #[must_use]
    pub fn find(&self, key: ProgramKey) -> Option<&PositionedProgram> {
        self.iter()
            .filter(|row| row.channel_id == key.channel_id)
            .flat_map(|row| row.programs.iter())
            .find(|p| p.key == key)
    }

    fn apply_selection(&mut self) {
        let selected = self.selected;
        for row in self.rows.iter_mut().flatten() {
            for p in &mut row.programs {
                p.selected = selected == Some(p.key);
            }
        }
    }
}

/// Computes [`RowCache`]s from EPG data.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ProgramLayoutEngine {
    metrics: GridMetrics,
}

impl ProgramLayoutEngine {
    /// Create an engine with `metrics`.
    #[must_use]
    pub fn new(metrics: GridMetrics) -> Self {
        Self { metrics }
    }

    /// Metrics in use.
    #[inline]
    #[must_use]
    pub fn metrics(&self) -> &GridMetrics {
        &self.metrics
    }

    /// Lay out every channel of `date`.
    #[must_use]
    pub fn layout(&self, source: &EpgSource, date: DateKey, now: Timestamp) -> RowCache {
        let _span = tracing::debug_span!("epg.layout", %date).entered();
        let timeline = self.metrics.timeline(date.window());
        let briefs = source.briefs();

        let mut stray = 0usize;
        let mut rows = Vec::with_capacity(briefs.len());
        for (position, brief) in briefs.iter().enumerate() {
            let row = source.channel_for(date, brief.channel_id).map(|ch| {
                let y = self.metrics.row_y(position);
                let programs = ch
                    .items
                    .iter()
                    .filter(|program| {
                        // A record's own channel must be briefed, not just its container.
                        let known = briefs.position_of(program.channel_id).is_some();
                        if !known {
                            stray += 1;
                        }
                        known
                    })
                    .map(|program| {
                        let left = timeline.pixel_for_time(program.start);
                        let right = timeline.pixel_for_time(program.end);
                        PositionedProgram {
                            key: ProgramKey::of(program),
                            program: program.clone(),
                            rect: Rect::new(
                                self.metrics.channel_name_width + left,
                                y,
                                right - left,
                                self.metrics.row_height,
                            ),
                            running: program.is_running_at(now),
                            selected: false,
                            channel_name: brief.name.clone(),
                        }
                    })
                    .collect();
                LaidOutRow {
                    position,
                    channel_id: brief.channel_id,
                    channel_name: brief.name.clone(),
                    y,
                    programs,
                }
            });
            rows.push(row);
        }

        let unbriefed: usize = source
            .day(date)
            .map(|day| {
                day.channels
                    .iter()
                    .filter(|ch| briefs.position_of(ch.channel_id).is_none())
                    .map(|ch| ch.items.len())
                    .sum()
            })
            .unwrap_or(0);
        let dropped = stray + unbriefed;
        if dropped > 0 {
            tracing::debug!(dropped, "programs without channel brief dropped");
        }
        if source.day(date).is_none() {
            tracing::debug!(%date, "no EPG data for day");
        }

        let cache = RowCache {
            date: Some(date),
            rows,
            geometry_generation: 1,
            selected: None,
            dropped,
        };
        tracing::debug!(
            rows = cache.len(),
            programs = cache.program_count(),
            "layout complete"
        );
        cache
    }

    /// Replace `cache` with a fresh layout, bumping its generation and
    /// carrying the selection over when the program still exists.
    pub fn relayout_into(
        &self,
        cache: &mut RowCache,
        source: &EpgSource,
        date: DateKey,
        now: Timestamp,
    ) {
        let generation = cache.geometry_generation;
        let selected = cache.selected;
        *cache = self.layout(source, date, now);
        cache.geometry_generation = generation + 1;
        if let Some(key) = selected
            && cache.find(key).is_some()
        {
            cache.set_selected(Some(key));
        }
    }
}
