#![forbid(unsafe_code)]

//! Tap resolution: screen point → program.
//!
//! The screen point is moved into grid space by subtracting the live
//! translation. The row comes from the vertical position below the header;
//! the program is the first one in that row whose open horizontal span
//! `(x, x + width)` contains the point. Overlapping programs therefore
//! resolve to whichever comes first in the row's list.

use epg_core::epg::{ChannelId, Program};
use epg_core::geometry::{Point, Translation};

use crate::GridMetrics;
use crate::program_layout::{LaidOutRow, PositionedProgram, ProgramKey, RowCache};

/// The outcome of a successful tap.
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    /// Key of the tapped program.
    pub key: ProgramKey,
    /// Channel of the tapped row.
    pub channel_id: ChannelId,
    /// The tapped program.
    pub program: Program,
}

/// Grid-space point under `screen` for content moved by `translation`.
#[inline]
#[must_use]
pub fn screen_to_content(screen: Point, translation: Translation) -> Point {
    Point::new(screen.x - translation.x, screen.y - translation.y)
}

/// Row position at grid-space `content_y`, or `None` inside the header.
#[must_use]
pub fn row_at(content_y: f64, metrics: &GridMetrics) -> Option<usize> {
    if !(metrics.row_height > 0.0) || !content_y.is_finite() {
        return None;
    }
    let row = ((content_y - metrics.header_height) / metrics.row_height).floor();
    (row >= 0.0).then_some(row as usize)
}

/// First program in `row` whose open span contains `content_x`.
#[must_use]
pub fn program_at(row: &LaidOutRow, content_x: f64) -> Option<&PositionedProgram> {
    row.programs
        .iter()
        .find(|p| content_x > p.rect.x && content_x < p.rect.right())
}

/// Resolve a tap at `screen` into a selection.
#[must_use]
pub fn resolve_tap(
    cache: &RowCache,
    metrics: &GridMetrics,
    screen: Point,
    translation: Translation,
) -> Option<Selection> {
    let content = screen_to_content(screen, translation);
    let position = row_at(content.y, metrics)?;
    let row = cache.get(position)?;
    let hit = program_at(row, content.x)?;
    tracing::trace!(key = %hit.key, row = position, "tap resolved");
    Some(Selection {
        key: hit.key,
        channel_id: row.channel_id,
        program: hit.program.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::program_layout::ProgramLayoutEngine;
    use epg_core::epg::{ChannelBrief, ChannelBriefs, ChannelPrograms, DayGuide, EpgSource};
    use epg_core::time::{DateKey, MILLIS_PER_MINUTE, Timestamp};

    fn day() -> DateKey {
        DateKey::parse("2025-04-09").unwrap()
    }

    fn program(channel_id: ChannelId, id: u64, from: i64, to: i64) -> Program {
        let start = day().day_start();
        Program {
            channel_id,
            id,
            start: start.saturating_add_millis(from * MILLIS_PER_MINUTE),
            end: start.saturating_add_millis(to * MILLIS_PER_MINUTE),
            title: format!("P{id}"),
            genre: None,
        }
    }

    fn cache() -> RowCache {
        let briefs = ChannelBriefs::new(vec![ChannelBrief::new(1, "One"), ChannelBrief::new(2, "Two")]);
        let guide = DayGuide {
            channels: vec![
                ChannelPrograms {
                    channel_id: 1,
                    items: vec![program(1, 10, 0, 60), program(1, 11, 60, 120)],
                },
                ChannelPrograms {
                    channel_id: 2,
                    // Overlapping pair: 20 covers 0-120, 21 covers 30-60.
                    items: vec![program(2, 20, 0, 120), program(2, 21, 30, 60)],
                },
            ],
        };
        let src = EpgSource::new(briefs).with_day(day(), guide);
        ProgramLayoutEngine::default().layout(&src, day(), Timestamp::from_millis(0))
    }

    #[test]
    fn header_has_no_row() {
        let m = GridMetrics::default();
        assert_eq!(row_at(30.0, &m), None);
        assert_eq!(row_at(60.0, &m), Some(0));
        assert_eq!(row_at(119.9, &m), Some(0));
        assert_eq!(row_at(120.0, &m), Some(1));
    }

    #[test]
    fn tap_selects_program_under_point() {
        let m = GridMetrics::default();
        let sel = resolve_tap(&cache(), &m, Point::new(400.0, 90.0), Translation::ZERO).unwrap();
        assert_eq!(sel.key.to_string(), "1_11");
        assert_eq!(sel.channel_id, 1);
    }

    #[test]
    fn translation_is_subtracted() {
        let m = GridMetrics::default();
        // Content scrolled left by 250px: screen x 150 is content x 400.
        let sel = resolve_tap(&cache(), &m, Point::new(150.0, 90.0), Translation::new(-250.0, 0.0));
        assert_eq!(sel.map(|s| s.key.program_id), Some(11));
    }

    #[test]
    fn boundary_taps_miss() {
        let m = GridMetrics::default();
        // x = 350 is the shared edge of 10 and 11.
        assert!(resolve_tap(&cache(), &m, Point::new(350.0, 90.0), Translation::ZERO).is_none());
    }

    #[test]
    fn overlap_resolves_to_first_in_list() {
        let m = GridMetrics::default();
        let sel = resolve_tap(&cache(), &m, Point::new(300.0, 150.0), Translation::ZERO).unwrap();
        assert_eq!(sel.key.program_id, 20);
    }

    #[test]
    fn taps_past_last_row_miss() {
        let m = GridMetrics::default();
        assert!(resolve_tap(&cache(), &m, Point::new(300.0, 500.0), Translation::ZERO).is_none());
    }
}
