//! Benchmarks for program layout, culling and slot assignment.
//!
//! Run with: cargo bench -p epg-layout

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use epg_core::epg::{ChannelBrief, ChannelBriefs, ChannelPrograms, DayGuide, EpgSource, Program};
use epg_core::time::{DateKey, MILLIS_PER_MINUTE};
use epg_layout::culling::{CullWindow, cull_into};
use epg_layout::program_layout::ProgramLayoutEngine;
use epg_layout::recycling::RowPool;
use std::hint::black_box;

fn source(channels: u32, minutes: i64) -> (EpgSource, DateKey) {
    let day = DateKey::from_ymd(2025, 4, 9).expect("valid date");
    let start = day.day_start();
    let briefs = ChannelBriefs::new(
        (1..=channels)
            .map(|id| ChannelBrief::new(id, format!("Channel {id}")))
            .collect(),
    );
    let per_day = 24 * 60 / minutes;
    let guide = DayGuide {
        channels: (1..=channels)
            .map(|channel_id| ChannelPrograms {
                channel_id,
                items: (0..per_day)
                    .map(|i| Program {
                        channel_id,
                        id: i as u64,
                        start: start.saturating_add_millis(i * minutes * MILLIS_PER_MINUTE),
                        end: start.saturating_add_millis((i + 1) * minutes * MILLIS_PER_MINUTE),
                        title: format!("Program {i}"),
                        genre: Some("news".into()),
                    })
                    .collect(),
            })
            .collect(),
    };
    (EpgSource::new(briefs).with_day(day, guide), day)
}

// ============================================================================
// Layout
// ============================================================================

fn bench_layout(c: &mut Criterion) {
    let mut group = c.benchmark_group("layout/full_day");
    let engine = ProgramLayoutEngine::default();

    for channels in [10u32, 100, 500] {
        let (src, day) = source(channels, 30);
        let now = day.day_start();
        group.bench_with_input(BenchmarkId::new("channels", channels), &(), |b, _| {
            b.iter(|| black_box(engine.layout(&src, day, now)))
        });
    }

    group.finish();
}

fn bench_refresh_running(c: &mut Criterion) {
    let mut group = c.benchmark_group("layout/refresh_running");
    let (src, day) = source(100, 30);
    let mut cache = ProgramLayoutEngine::default().layout(&src, day, day.day_start());
    let mut minute = 0;

    group.bench_function("100_channels", |b| {
        b.iter(|| {
            minute = (minute + 1) % (24 * 60);
            let now = day.day_start().saturating_add_millis(minute * MILLIS_PER_MINUTE);
            black_box(cache.refresh_running(now))
        })
    });

    group.finish();
}

// ============================================================================
// Culling + recycling
// ============================================================================

fn bench_cull_viewport(c: &mut Criterion) {
    let mut group = c.benchmark_group("culling/viewport");
    let (src, day) = source(500, 10);
    let cache = ProgramLayoutEngine::default().layout(&src, day, day.day_start());
    let mut pool = RowPool::new(60.0);
    pool.resize(1080.0);
    let mut out = Vec::with_capacity(512);

    for offset_x in [0.0, 3000.0, 5000.0] {
        let window = CullWindow::new(offset_x, 1920.0);
        group.bench_with_input(
            BenchmarkId::new("offset", offset_x as u64),
            &window,
            |b, window| {
                b.iter(|| {
                    out.clear();
                    for a in pool.assign(240) {
                        if let Some(row) = cache.get(a.logical_row) {
                            cull_into(&row.programs, *window, &mut out);
                        }
                    }
                    black_box(out.len())
                })
            },
        );
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_layout,
    bench_refresh_running,
    bench_cull_viewport
);
criterion_main!(benches);
