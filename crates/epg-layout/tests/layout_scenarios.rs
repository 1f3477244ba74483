//! End-to-end layout scenarios: records in, positioned and culled blocks out.

use epg_core::epg::{ChannelBrief, ChannelBriefs, ChannelPrograms, DayGuide, EpgSource, Program};
use epg_core::geometry::Translation;
use epg_core::time::{DateKey, MILLIS_PER_MINUTE, Timestamp};
use epg_layout::culling::{CullWindow, cull_into};
use epg_layout::program_layout::ProgramLayoutEngine;
use epg_layout::recycling::{RowPool, scroll_row_offset};
use epg_layout::GridMetrics;

fn day() -> DateKey {
    DateKey::parse("2025-04-09").expect("valid key")
}

fn at_minute(m: i64) -> Timestamp {
    day().day_start().saturating_add_millis(m * MILLIS_PER_MINUTE)
}

fn program(channel_id: u32, id: u64, title: &str, from: i64, to: i64) -> Program {
    Program {
        channel_id,
        id,
        start: at_minute(from),
        end: at_minute(to),
        title: title.to_owned(),
        genre: None,
    }
}

/// `channels` rows of back-to-back hour-long programs.
fn grid(channels: u32) -> EpgSource {
    let briefs = ChannelBriefs::new(
        (1..=channels)
            .map(|id| ChannelBrief::new(id, format!("Channel {id}")))
            .collect(),
    );
    let guide = DayGuide {
        channels: (1..=channels)
            .map(|channel_id| ChannelPrograms {
                channel_id,
                items: (0..24)
                    .map(|h| {
                        let id = u64::from(channel_id) * 100 + h as u64;
                        program(channel_id, id, "Hour", h * 60, (h + 1) * 60)
                    })
                    .collect(),
            })
            .collect(),
    };
    EpgSource::new(briefs).with_day(day(), guide)
}

#[test]
fn two_half_hour_programs() {
    let briefs = ChannelBriefs::new(vec![ChannelBrief::new(1, "One")]);
    let guide = DayGuide {
        channels: vec![ChannelPrograms {
            channel_id: 1,
            items: vec![
                program(1, 1, "A", 0, 30),
                program(1, 2, "B", 30, 60),
            ],
        }],
    };
    let source = EpgSource::new(briefs).with_day(day(), guide);
    let cache = ProgramLayoutEngine::default().layout(&source, day(), at_minute(0));
    let row = cache.get(0).expect("row for channel 1");

    let a = &row.programs[0];
    let b = &row.programs[1];
    assert_eq!(a.program.title, "A");
    assert_eq!((a.x(), a.width()), (100.0, 125.0));
    assert_eq!(b.program.title, "B");
    assert_eq!((b.x(), b.width()), (225.0, 125.0));
}

#[test]
fn layout_is_deterministic() {
    let source = grid(20);
    let engine = ProgramLayoutEngine::default();
    let first = engine.layout(&source, day(), at_minute(600));
    let second = engine.layout(&source, day(), at_minute(600));
    assert_eq!(first, second);
}

#[test]
fn pooled_rows_and_culling_compose() {
    let metrics = GridMetrics::default();
    let source = grid(100);
    let cache = ProgramLayoutEngine::new(metrics).layout(&source, day(), at_minute(0));

    let mut pool = RowPool::new(metrics.row_height);
    pool.resize(600.0);
    assert_eq!(pool.len(), 11);

    // Scrolled 20 rows down and 10 hours right.
    let translation = Translation::new(-2500.0, -1200.0);
    let s = scroll_row_offset(translation.offset().y, metrics.row_height);
    assert_eq!(s, 20);
    let window = CullWindow::from_translation(translation, 1000.0);

    let mut visible_rows = 0;
    for assignment in pool.assign(s) {
        let Some(row) = cache.get(assignment.logical_row) else {
            continue;
        };
        let mut out = Vec::new();
        let n = cull_into(&row.programs, window, &mut out);
        // [2500, 3500) against hour blocks starting at 100 + 250 * h.
        assert_eq!(n, 5, "row {}", row.position);
        assert_eq!(out[0].program.start, at_minute(9 * 60));
        visible_rows += 1;
    }
    assert_eq!(visible_rows, 11);
}

#[test]
fn rows_past_last_channel_are_skipped() {
    let metrics = GridMetrics::default();
    let cache = ProgramLayoutEngine::new(metrics).layout(&grid(3), day(), at_minute(0));
    let mut pool = RowPool::new(metrics.row_height);
    pool.resize(600.0);
    let present = pool
        .assign(0)
        .iter()
        .filter(|a| cache.get(a.logical_row).is_some())
        .count();
    assert_eq!(present, 3);
}

#[test]
fn other_day_has_no_rows() {
    let source = grid(5);
    let other = day().next().expect("next day");
    let cache = ProgramLayoutEngine::default().layout(&source, other, at_minute(0));
    assert_eq!(cache.len(), 5);
    assert_eq!(cache.program_count(), 0);
}
