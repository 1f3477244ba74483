//! Property-based invariant tests for the timeline model.
//!
//! 1. Pixel round-trip stays within one minute for every instant of the day.
//! 2. `now_offset` never leaves `[0, pixel_for_time(day_end)]`.
//! 3. Labels are strictly increasing in both `x` and `time`.
//! 4. `pixel_for_time` is monotonic.
//! 5. Initial scroll position stays inside the scrollable range.

use epg_core::time::{DateKey, MILLIS_PER_DAY, MILLIS_PER_MINUTE, Timestamp};
use epg_core::timeline::TimelineModel;
use proptest::prelude::*;

// ── Helpers ─────────────────────────────────────────────────────────────

fn day_strategy() -> impl Strategy<Value = DateKey> {
    (1990i32..=2090, 1u32..=12, 1u32..=28)
        .prop_map(|(y, m, d)| DateKey::from_ymd(y, m, d).expect("day <= 28 is always valid"))
}

fn model_strategy() -> impl Strategy<Value = TimelineModel> {
    (day_strategy(), 1.0f64..=1000.0, prop::sample::select(vec![15u32, 30, 60, 120]))
        .prop_map(|(day, w, mins)| TimelineModel::new(day.window(), w).with_slot_minutes(mins))
}

// ═════════════════════════════════════════════════════════════════════════
// 1. Round trip
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn pixel_round_trip_within_a_minute(model in model_strategy(), offset in 0i64..MILLIS_PER_DAY) {
        let t = model.window().clamp(model.window().day_start().saturating_add_millis(offset));
        let back = model.time_for_pixel(model.pixel_for_time(t));
        let drift = (back.as_millis() - t.as_millis()).abs();
        prop_assert!(drift < MILLIS_PER_MINUTE, "drift {}ms for {:?}", drift, t);
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 2. Now offset bounds
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn now_offset_is_bounded(model in model_strategy(), now in any::<i32>()) {
        let now = Timestamp::from_millis(i64::from(now) * 1_000);
        let x = model.now_offset(now);
        let max = model.pixel_for_time(model.window().day_end());
        prop_assert!(x >= 0.0 && x <= max, "x={} max={}", x, max);
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 3. Labels strictly increasing
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn labels_strictly_increase(model in model_strategy()) {
        let labels = model.generate_labels();
        prop_assert_eq!(labels.len(), model.label_count());
        for pair in labels.windows(2) {
            prop_assert!(pair[0].x < pair[1].x);
            prop_assert!(pair[0].center_x < pair[1].center_x);
            prop_assert!(pair[0].time < pair[1].time);
        }
        if let Some(last) = labels.last() {
            prop_assert!(last.time <= model.window().day_end());
        }
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 4. Monotonic mapping
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn pixel_for_time_is_monotonic(model in model_strategy(), a in 0i64..MILLIS_PER_DAY, b in 0i64..MILLIS_PER_DAY) {
        let start = model.window().day_start();
        let (ta, tb) = (start.saturating_add_millis(a), start.saturating_add_millis(b));
        if ta <= tb {
            prop_assert!(model.pixel_for_time(ta) <= model.pixel_for_time(tb));
        } else {
            prop_assert!(model.pixel_for_time(ta) >= model.pixel_for_time(tb));
        }
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 5. Initial scroll position
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn scroll_position_in_range(
        model in model_strategy(),
        offset in -MILLIS_PER_DAY..2 * MILLIS_PER_DAY,
        viewport in 0.0f64..20_000.0,
        channel_col in 0.0f64..300.0,
    ) {
        let now = model.window().day_start().saturating_add_millis(offset);
        let pos = model.scroll_position_for_time(now, viewport, channel_col);
        let max = (model.content_width(channel_col) - viewport).max(0.0);
        prop_assert!(pos >= 0.0 && pos <= max, "pos={} max={}", pos, max);
    }
}
