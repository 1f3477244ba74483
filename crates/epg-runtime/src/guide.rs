#![forbid(unsafe_code)]

//! The data/layout side of the engine.
//!
//! [`GuideEngine`] owns the EPG data, the per-row layout cache, the row slot
//! pool and the committed scroll value. Inputs mark [`Dirty`] flags; the next
//! call to [`GuideEngine::frame`] recomposes the visible rows once, however
//! many inputs arrived in between.
//!
//! | Input | Work done immediately | Flag |
//! |-------|-----------------------|------|
//! | [`set_source`](GuideEngine::set_source) | full relayout | `DATA` |
//! | [`set_day`](GuideEngine::set_day) | full relayout, scroll reset | `DATA \| SCROLL` |
//! | [`resize`](GuideEngine::resize) | pool rebuild, re-clamp | `RESIZE` |
//! | [`apply_commit`](GuideEngine::apply_commit) | clamp | `SCROLL` |
//! | [`now_tick`](GuideEngine::now_tick) | `running` flags only | `NOW` |
//! | [`select_at`](GuideEngine::select_at) | `selected` flags only | `SELECTION` |
//!
//! Raw gesture samples never reach this type; it only sees committed values.

use bitflags::bitflags;

use epg_core::epg::{ChannelId, EpgSource};
use epg_core::geometry::{ContentExtent, Point, ScrollBounds, Translation, ViewportSize};
use epg_core::time::{DateKey, Timestamp};
use epg_core::timeline::{TimeLabel, TimelineModel};
use epg_layout::culling::{CullWindow, cull_into};
use epg_layout::hit_test::{Selection, resolve_tap};
use epg_layout::program_layout::{PositionedProgram, ProgramLayoutEngine, RowCache};
use epg_layout::recycling::{RowPool, scroll_row_offset};
use epg_layout::GridMetrics;

use crate::commit_throttle::CommittedScroll;
use crate::config::GuideConfig;

bitflags! {
    /// Inputs that changed since the last composition.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Dirty: u8 {
        /// EPG data or displayed day changed.
        const DATA      = 0b0000_0001;
        /// "Now" moved.
        const NOW       = 0b0000_0010;
        /// Viewport size changed.
        const RESIZE    = 0b0000_0100;
        /// Committed scroll changed.
        const SCROLL    = 0b0000_1000;
        /// Selection changed.
        const SELECTION = 0b0001_0000;
    }
}

/// One recycled row slot with the programs it shows.
#[derive(Debug, Clone, PartialEq)]
pub struct VisibleRow {
    /// Stable slot key (`y{slot_index}`).
    pub row_key: String,
    /// Slot index within the pool.
    pub slot_index: usize,
    /// Logical row position.
    pub logical_row: usize,
    /// Channel of the row.
    pub channel_id: ChannelId,
    /// Channel display name.
    pub channel_name: String,
    /// Programs overlapping the horizontal scroll window, in source order.
    pub programs: Vec<PositionedProgram>,
}

/// Everything a renderer needs for one frame.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GuideFrame {
    /// Visible rows, by ascending logical row.
    pub rows: Vec<VisibleRow>,
    /// Header labels overlapping the horizontal scroll window.
    pub labels: Vec<TimeLabel>,
    /// Grid-space x of the "now" marker when the displayed day is today.
    pub now_indicator_x: Option<f64>,
    /// Committed translation the frame was composed for.
    pub translation: Translation,
    /// Viewport the frame was composed for.
    pub viewport: ViewportSize,
}

impl GuideFrame {
    /// Total programs across all rows.
    #[must_use]
    pub fn program_count(&self) -> usize {
        self.rows.iter().map(|r| r.programs.len()).sum()
    }
}

/// Data/layout context.
#[derive(Debug, Clone)]
pub struct GuideEngine {
    config: GuideConfig,
    layout: ProgramLayoutEngine,
    source: EpgSource,
    date: DateKey,
    timeline: TimelineModel,
    labels: Vec<TimeLabel>,
    cache: RowCache,
    pool: RowPool,
    viewport: ViewportSize,
    committed: Translation,
    applied_seq: u64,
    now: Timestamp,
    follow_now: bool,
    dirty: Dirty,
    frame: GuideFrame,
    compositions: u64,
}

impl GuideEngine {
    /// Engine showing `date` of `source`, with a zero-size viewport.
    #[must_use]
    pub fn new(config: GuideConfig, source: EpgSource, date: DateKey, now: Timestamp) -> Self {
        let metrics = config.metrics();
        let layout = ProgramLayoutEngine::new(metrics);
        let timeline = metrics.timeline(date.window());
        let cache = layout.layout(&source, date, now);
        Self {
            config,
            layout,
            source,
            date,
            timeline,
            labels: timeline.generate_labels(),
            cache,
            pool: RowPool::with_header(metrics.row_height, metrics.header_height),
            viewport: ViewportSize::ZERO,
            committed: Translation::ZERO,
            applied_seq: 0,
            now,
            follow_now: config.now.follow_now,
            dirty: Dirty::all(),
            frame: GuideFrame::default(),
            compositions: 0,
        }
    }

    /// Replace the EPG data, keeping the day and the selection if it survives.
    pub fn set_source(&mut self, source: EpgSource, now: Timestamp) {
        self.source = source;
        self.now = now;
        self.layout
            .relayout_into(&mut self.cache, &self.source, self.date, now);
        self.committed = self.scroll_bounds().clamp(self.committed);
        self.dirty |= Dirty::DATA;
        tracing::debug!(
            rows = self.cache.len(),
            programs = self.cache.program_count(),
            generation = self.cache.geometry_generation(),
            "guide source replaced"
        );
    }

    /// Show another day. Resets the scroll to [`initial_translation`](Self::initial_translation)
    /// and returns it.
    pub fn set_day(&mut self, date: DateKey, now: Timestamp) -> Translation {
        self.date = date;
        self.now = now;
        self.timeline = self.metrics().timeline(date.window());
        self.labels = self.timeline.generate_labels();
        self.layout
            .relayout_into(&mut self.cache, &self.source, date, now);
        self.committed = self.initial_translation(now);
        self.dirty |= Dirty::DATA | Dirty::SCROLL;
        tracing::debug!(%date, "guide day changed");
        self.committed
    }

    /// Apply a new viewport size. Returns the committed translation after
    /// re-clamping (and re-centring on "now" while follow-now is active).
    pub fn resize(&mut self, viewport: ViewportSize) -> Translation {
        let viewport = viewport.sanitized();
        if viewport == self.viewport {
            return self.committed;
        }
        self.viewport = viewport;
        self.pool.resize(viewport.height);
        let target = if self.follow_now {
            Translation::new(self.centred_x(self.now), self.committed.y)
        } else {
            self.committed
        };
        self.committed = self.scroll_bounds().clamp(target);
        self.dirty |= Dirty::RESIZE;
        tracing::debug!(
            width = viewport.width,
            height = viewport.height,
            slots = self.pool.len(),
            "guide resized"
        );
        self.committed
    }

    /// Apply a committed scroll value. Stale sequences are ignored. Returns
    /// whether the committed translation changed.
    pub fn apply_commit(&mut self, committed: CommittedScroll) -> bool {
        if committed.seq <= self.applied_seq {
            return false;
        }
        self.applied_seq = committed.seq;
        let t = self.scroll_bounds().clamp(committed.translation);
        if t == self.committed {
            return false;
        }
        self.committed = t;
        self.dirty |= Dirty::SCROLL;
        true
    }

    /// Refresh `running` flags and the "now" marker. Geometry is untouched.
    /// Returns how many `running` flags flipped.
    pub fn now_tick(&mut self, now: Timestamp) -> usize {
        self.now = now;
        let flipped = self.cache.refresh_running(now);
        self.dirty |= Dirty::NOW;
        if flipped > 0 {
            tracing::trace!(flipped, "running flags refreshed");
        }
        flipped
    }

    /// Resolve a tap at `screen` under the `live` translation and select the
    /// hit program. A miss leaves the current selection in place.
    ///
    /// Any tap ends follow-now.
    pub fn select_at(&mut self, screen: Point, live: Translation) -> Option<Selection> {
        self.follow_now = false;
        let metrics = self.metrics();
        let selection = resolve_tap(&self.cache, &metrics, screen, live);
        if let Some(sel) = &selection
            && self.cache.set_selected(Some(sel.key))
        {
            self.dirty |= Dirty::SELECTION;
        }
        selection
    }

    /// Drop the selection.
    pub fn clear_selection(&mut self) {
        if self.cache.set_selected(None) {
            self.dirty |= Dirty::SELECTION;
        }
    }

    /// The current frame, recomposed if any input changed.
    pub fn frame(&mut self) -> &GuideFrame {
        if !self.dirty.is_empty() {
            self.compose();
        }
        &self.frame
    }

    /// Grid-space x of the "now" marker, or `None` when `today` is not the
    /// displayed day.
    #[must_use]
    pub fn now_indicator(&self, today: DateKey) -> Option<f64> {
        (today == self.date)
            .then(|| self.config.grid.channel_name_width + self.timeline.now_offset(self.now))
    }

    /// Full scrollable size.
    #[must_use]
    pub fn content_extent(&self) -> ContentExtent {
        self.metrics()
            .content_extent(&self.timeline, self.source.briefs().len())
    }

    /// Bounds for the current extent and viewport.
    #[must_use]
    pub fn scroll_bounds(&self) -> ScrollBounds {
        ScrollBounds::new(self.content_extent(), self.viewport)
    }

    /// Translation that centres `now` horizontally, at the top row.
    #[must_use]
    pub fn initial_translation(&self, now: Timestamp) -> Translation {
        self.scroll_bounds()
            .clamp(Translation::new(self.centred_x(now), 0.0))
    }

    /// Grid metrics in use.
    #[must_use]
    pub fn metrics(&self) -> GridMetrics {
        *self.layout.metrics()
    }

    /// Configuration.
    #[inline]
    #[must_use]
    pub fn config(&self) -> &GuideConfig {
        &self.config
    }

    /// Displayed day.
    #[inline]
    #[must_use]
    pub fn date(&self) -> DateKey {
        self.date
    }

    /// Last instant seen.
    #[inline]
    #[must_use]
    pub fn now(&self) -> Timestamp {
        self.now
    }

    /// Committed translation.
    #[inline]
    #[must_use]
    pub fn committed(&self) -> Translation {
        self.committed
    }

    /// Current viewport.
    #[inline]
    #[must_use]
    pub fn viewport(&self) -> ViewportSize {
        self.viewport
    }

    /// Layout cache.
    #[inline]
    #[must_use]
    pub fn cache(&self) -> &RowCache {
        &self.cache
    }

    /// Row slot pool.
    #[inline]
    #[must_use]
    pub fn pool(&self) -> &RowPool {
        &self.pool
    }

    /// Timeline for the displayed day.
    #[inline]
    #[must_use]
    pub fn timeline(&self) -> &TimelineModel {
        &self.timeline
    }

    /// EPG data.
    #[inline]
    #[must_use]
    pub fn source(&self) -> &EpgSource {
        &self.source
    }

    /// Pending dirty flags.
    #[inline]
    #[must_use]
    pub fn dirty(&self) -> Dirty {
        self.dirty
    }

    /// Whether resizes still re-centre on "now".
    #[inline]
    #[must_use]
    pub fn follow_now(&self) -> bool {
        self.follow_now
    }

    /// Number of compositions so far.
    #[inline]
    #[must_use]
    pub fn compositions(&self) -> u64 {
        self.compositions
    }

    fn centred_x(&self, now: Timestamp) -> f64 {
        -self.timeline.scroll_position_for_time(
            now,
            self.viewport.width,
            self.config.grid.channel_name_width,
        )
    }

    fn compose(&mut self) {
        let _span = tracing::trace_span!("epg.compose", dirty = ?self.dirty).entered();
        let offset = self.committed.offset();
        let s = scroll_row_offset(offset.y, self.pool.row_height());
        let window = CullWindow::from_translation(self.committed, self.viewport.width);

        let mut rows: Vec<VisibleRow> = self
            .pool
            .assign(s)
            .into_iter()
            .filter_map(|a| {
                let row = self.cache.get(a.logical_row)?;
                let mut programs = Vec::new();
                cull_into(&row.programs, window, &mut programs);
                Some(VisibleRow {
                    row_key: a.slot.key.clone(),
                    slot_index: a.slot.slot_index,
                    logical_row: a.logical_row,
                    channel_id: row.channel_id,
                    channel_name: row.channel_name.clone(),
                    programs,
                })
            })
            .collect();
        rows.sort_by_key(|r| r.logical_row);

        let name_width = self.config.grid.channel_name_width;
        let slot_width = self.timeline.slot_width();
        let labels = self
            .labels
            .iter()
            .filter(|l| {
                let left = name_width + l.x;
                left + slot_width > window.offset_x
                    && left < window.offset_x + window.viewport_width
            })
            .cloned()
            .collect();

        self.frame = GuideFrame {
            rows,
            labels,
            now_indicator_x: self.now_indicator(self.now.date_key()),
            translation: self.committed,
            viewport: self.viewport,
        };
        self.dirty = Dirty::empty();
        self.compositions += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use epg_core::epg::{ChannelBrief, ChannelBriefs, ChannelPrograms, DayGuide, Program};
    use epg_core::geometry::Size;
    use epg_core::time::MILLIS_PER_HOUR;

    fn day() -> DateKey {
        DateKey::parse("2025-04-09").unwrap()
    }

    fn at_hour(h: f64) -> Timestamp {
        day()
            .day_start()
            .saturating_add_millis((h * MILLIS_PER_HOUR as f64) as i64)
    }

    /// `channels` rows of 24 hourly programs, channel ids 100, 101, ...
    fn source(channels: u32) -> EpgSource {
        let briefs = ChannelBriefs::new(
            (0..channels)
                .map(|i| ChannelBrief::new(100 + i, format!("Channel {i}")))
                .collect(),
        );
        let guide = DayGuide {
            channels: (0..channels)
                .map(|i| ChannelPrograms {
                    channel_id: 100 + i,
                    items: (0..24u64)
                        .map(|h| Program {
                            channel_id: 100 + i,
                            id: h,
                            start: at_hour(h as f64),
                            end: at_hour(h as f64 + 1.0),
                            title: format!("P{h}"),
                            genre: None,
                        })
                        .collect(),
                })
                .collect(),
        };
        EpgSource::new(briefs).with_day(day(), guide)
    }

    fn engine(channels: u32) -> GuideEngine {
        let config = GuideConfig::default().with_follow_now(false);
        let mut e = GuideEngine::new(config, source(channels), day(), at_hour(12.0));
        e.resize(Size::new(1000.0, 600.0));
        e
    }

    #[test]
    fn first_frame_shows_pool_rows() {
        let mut e = engine(20);
        let frame = e.frame();
        assert_eq!(frame.rows.len(), 11);
        let logical: Vec<usize> = frame.rows.iter().map(|r| r.logical_row).collect();
        assert_eq!(logical, (0..11).collect::<Vec<_>>());
        // x in [100, 1000): hours 0..=3
        assert!(frame.rows.iter().all(|r| r.programs.len() == 4));
        assert_eq!(frame.rows[0].row_key, "y0");
        assert_eq!(frame.labels.len(), 4);
    }

    #[test]
    fn commit_rewindows_rows_and_programs() {
        let mut e = engine(20);
        let c = CommittedScroll {
            seq: 1,
            translation: Translation::new(-1000.0, -120.0),
        };
        assert!(e.apply_commit(c));
        let frame = e.frame();
        assert_eq!(frame.rows.first().map(|r| r.logical_row), Some(1));
        assert_eq!(frame.rows.last().map(|r| r.logical_row), Some(11));
        let ids: Vec<u64> = frame.rows[0].programs.iter().map(|p| p.key.program_id).collect();
        assert_eq!(ids, [3, 4, 5, 6, 7]);
        assert!(!e.apply_commit(c));
    }

    #[test]
    fn commit_is_clamped() {
        let mut e = engine(20);
        e.apply_commit(CommittedScroll {
            seq: 1,
            translation: Translation::new(-1e9, -1e9),
        });
        assert_eq!(e.committed(), Translation::new(-5100.0, -660.0));
    }

    #[test]
    fn headerless_grid_keeps_bottom_row() {
        let metrics = GridMetrics {
            header_height: 0.0,
            ..GridMetrics::default()
        };
        let config = GuideConfig::default()
            .with_follow_now(false)
            .with_metrics(metrics);
        let mut e = GuideEngine::new(config, source(20), day(), at_hour(12.0));
        e.resize(Size::new(1000.0, 600.0));
        e.apply_commit(CommittedScroll {
            seq: 1,
            translation: Translation::new(0.0, -330.0),
        });
        // Rows 5..=15 are on screen; row 15 starts at y 570.
        let logical: Vec<usize> = e.frame().rows.iter().map(|r| r.logical_row).collect();
        assert_eq!(logical, (4..16).collect::<Vec<_>>());
    }

    #[test]
    fn frame_is_lazy() {
        let mut e = engine(3);
        e.frame();
        e.frame();
        assert_eq!(e.compositions(), 1);
        assert!(e.dirty().is_empty());
        e.now_tick(at_hour(12.5));
        assert_eq!(e.dirty(), Dirty::NOW);
        e.frame();
        assert_eq!(e.compositions(), 2);
    }

    #[test]
    fn now_tick_keeps_geometry() {
        let mut e = engine(20);
        let generation = e.cache().geometry_generation();
        // 12:00 sits on the 11:00 and 12:00 blocks (inclusive end); 13:30 only on 13:00.
        let flipped = e.now_tick(at_hour(13.5));
        assert_eq!(flipped, 3 * 20);
        assert_eq!(e.cache().geometry_generation(), generation);
        let running = e.cache().get(0).unwrap().programs.iter().filter(|p| p.running).count();
        assert_eq!(running, 1);
    }

    #[test]
    fn tap_selects_and_marks_frame() {
        let mut e = engine(20);
        let sel = e
            .select_at(Point::new(360.0, 190.0), Translation::ZERO)
            .unwrap();
        assert_eq!(sel.channel_id, 102);
        assert_eq!(sel.key.program_id, 1);
        assert!(e.dirty().contains(Dirty::SELECTION));
        let frame = e.frame();
        let selected: Vec<_> = frame
            .rows
            .iter()
            .flat_map(|r| r.programs.iter())
            .filter(|p| p.selected)
            .map(|p| p.key)
            .collect();
        assert_eq!(selected, [sel.key]);
    }

    #[test]
    fn tap_in_header_misses() {
        let mut e = engine(3);
        assert!(e.select_at(Point::new(360.0, 30.0), Translation::ZERO).is_none());
        assert_eq!(e.cache().selected(), None);
    }

    #[test]
    fn follow_now_centres_until_tap() {
        let config = GuideConfig::default();
        let mut e = GuideEngine::new(config, source(20), day(), at_hour(12.0));
        // 12:00 → 3000px; centred offset = 3000 - 500 + 100
        assert_eq!(e.resize(Size::new(1000.0, 600.0)), Translation::new(-2600.0, 0.0));
        e.select_at(Point::new(10.0, 10.0), e.committed());
        assert!(!e.follow_now());
        assert_eq!(e.resize(Size::new(800.0, 600.0)), Translation::new(-2600.0, 0.0));
    }

    #[test]
    fn set_day_resets_scroll_and_empties_rows() {
        let mut e = engine(20);
        e.apply_commit(CommittedScroll {
            seq: 1,
            translation: Translation::new(-100.0, -300.0),
        });
        let next = day().next().unwrap();
        let t = e.set_day(next, at_hour(12.0));
        assert_eq!(t.y, 0.0);
        assert_eq!(e.committed(), t);
        assert!(e.frame().rows.is_empty());
        assert_eq!(e.frame().now_indicator_x, None);
    }

    #[test]
    fn now_indicator_only_for_today() {
        let e = engine(3);
        assert_eq!(e.now_indicator(day()), Some(3100.0));
        assert_eq!(e.now_indicator(day().next().unwrap()), None);
    }

    #[test]
    fn smaller_source_reclamps() {
        let mut e = engine(20);
        e.apply_commit(CommittedScroll {
            seq: 1,
            translation: Translation::new(0.0, -600.0),
        });
        e.set_source(source(12), at_hour(12.0));
        // 12 * 60 + 60 - 600
        assert_eq!(e.committed().y, -180.0);
        assert!(e.dirty().contains(Dirty::DATA));
    }

    #[test]
    fn zero_viewport_keeps_one_slot() {
        let mut e = engine(3);
        e.resize(Size::new(0.0, 0.0));
        assert_eq!(e.pool().len(), 1);
        assert_eq!(e.frame().rows.len(), 1);
    }
}
