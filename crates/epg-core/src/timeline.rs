#![forbid(unsafe_code)]

//! Time ↔ pixel mapping for a single displayed day.
//!
//! [`TimelineModel`] is a pure function of its [`TimeWindow`] and slot
//! geometry: `slot_width` pixels per `slot_minutes` minutes. All x values it
//! produces are relative to the start of the timeline column; callers add
//! the channel-name column width to reach grid space.
//!
//! # Invariants
//!
//! 1. `time_for_pixel(pixel_for_time(t))` equals `t` to within a millisecond
//!    for every `t` in the window.
//! 2. `now_offset` never leaves `[0, pixel_for_time(day_end)]`.
//! 3. Labels are strictly increasing in `x` and `time`.

use crate::time::{MILLIS_PER_MINUTE, TimeWindow, Timestamp};

/// Default pixels per slot.
pub const DEFAULT_SLOT_WIDTH: f64 = 250.0;

/// Default minutes per slot.
pub const DEFAULT_SLOT_MINUTES: u32 = 60;

/// One hour-axis label.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeLabel {
    /// `HH:MM` text.
    pub text: String,
    /// The labelled instant.
    pub time: Timestamp,
    /// Left edge of the slot cell the label is centred in.
    pub x: f64,
    /// Pixel position of [`TimeLabel::time`].
    pub center_x: f64,
}

/// Pure mapping between wall-clock time and timeline pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimelineModel {
    window: TimeWindow,
    slot_width: f64,
    slot_minutes: u32,
}

impl TimelineModel {
    /// Create a model with hourly slots of `slot_width` pixels.
    #[must_use]
    pub fn new(window: TimeWindow, slot_width: f64) -> Self {
        Self {
            window,
            slot_width: if slot_width.is_finite() {
                slot_width.max(0.0)
            } else {
                0.0
            },
            slot_minutes: DEFAULT_SLOT_MINUTES,
        }
    }

    /// Set minutes per slot (builder). Zero is raised to one minute.
    #[must_use]
    pub fn with_slot_minutes(mut self, minutes: u32) -> Self {
        self.slot_minutes = minutes.max(1);
        self
    }

    /// The displayed day.
    #[inline]
    #[must_use]
    pub fn window(&self) -> TimeWindow {
        self.window
    }

    /// Pixels per slot.
    #[inline]
    #[must_use]
    pub fn slot_width(&self) -> f64 {
        self.slot_width
    }

    /// Minutes per slot.
    #[inline]
    #[must_use]
    pub fn slot_minutes(&self) -> u32 {
        self.slot_minutes
    }

    /// Horizontal scale.
    #[inline]
    #[must_use]
    pub fn pixels_per_minute(&self) -> f64 {
        self.slot_width / f64::from(self.slot_minutes)
    }

    /// Pixel x of `t`. Times outside the window map outside `[0, width]`.
    #[inline]
    #[must_use]
    pub fn pixel_for_time(&self, t: Timestamp) -> f64 {
        t.minutes_since(self.window.day_start()) * self.pixels_per_minute()
    }

    /// Instant at pixel `x`, rounded to the nearest millisecond.
    ///
    /// A zero-width slot has no inverse; the window start is returned.
    #[must_use]
    pub fn time_for_pixel(&self, x: f64) -> Timestamp {
        let ppm = self.pixels_per_minute();
        if ppm <= 0.0 || !x.is_finite() {
            return self.window.day_start();
        }
        let millis = (x / ppm * MILLIS_PER_MINUTE as f64).round() as i64;
        self.window.day_start().saturating_add_millis(millis)
    }

    /// Label spacing in milliseconds.
    #[inline]
    #[must_use]
    pub fn label_interval_millis(&self) -> i64 {
        i64::from(self.slot_minutes) * MILLIS_PER_MINUTE
    }

    /// Number of labels [`generate_labels`](Self::generate_labels) produces:
    /// `floor((span - interval / 2) / interval) + 1`.
    ///
    /// For slot lengths that divide the day this is `ceil(span / interval)`
    /// (24 for hourly slots). Otherwise the last label must still fall on or
    /// before `day_end`, so it can be one less: 31-minute slots give 46, not 47.
    #[must_use]
    pub fn label_count(&self) -> usize {
        let interval = self.label_interval_millis();
        let first = interval / 2;
        let span = self.window.duration_millis();
        if span < first {
            return 0;
        }
        ((span - first) / interval + 1) as usize
    }

    /// Slot labels from `day_start + interval/2` to `day_end`, one per slot.
    ///
    /// Each label sits at the centre of its slot cell, so the cell left
    /// edges are `0, slot_width, 2 * slot_width, ...`.
    #[must_use]
    pub fn generate_labels(&self) -> Vec<TimeLabel> {
        let interval = self.label_interval_millis();
        let count = self.label_count();
        let mut labels = Vec::with_capacity(count);
        let mut time = self.window.day_start().saturating_add_millis(interval / 2);
        for index in 0..count {
            labels.push(TimeLabel {
                text: time.format_hm(),
                time,
                x: index as f64 * self.slot_width,
                center_x: self.pixel_for_time(time),
            });
            time = time.saturating_add_millis(interval);
        }
        labels
    }

    /// Pixel x of the "now" marker: `now` clamped into the window.
    #[must_use]
    pub fn now_offset(&self, now: Timestamp) -> f64 {
        self.pixel_for_time(self.window.clamp(now))
    }

    /// Full content width: one cell per label plus the channel column.
    #[must_use]
    pub fn content_width(&self, channel_name_width: f64) -> f64 {
        self.label_count() as f64 * self.slot_width + channel_name_width
    }

    /// Horizontal content offset that centres `now` in a viewport of
    /// `viewport_width`, clamped to the scrollable range.
    #[must_use]
    pub fn scroll_position_for_time(
        &self,
        now: Timestamp,
        viewport_width: f64,
        channel_name_width: f64,
    ) -> f64 {
        let max = (self.content_width(channel_name_width) - viewport_width).max(0.0);
        let centred = self.now_offset(now) - viewport_width / 2.0 + channel_name_width;
        centred.clamp(0.0, max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::{DateKey, MILLIS_PER_HOUR};

    fn model() -> TimelineModel {
        let day = DateKey::parse("2025-04-09").unwrap();
        TimelineModel::new(day.window(), DEFAULT_SLOT_WIDTH)
    }

    fn at(model: &TimelineModel, minutes: i64) -> Timestamp {
        model
            .window()
            .day_start()
            .saturating_add_millis(minutes * MILLIS_PER_MINUTE)
    }

    #[test]
    fn half_hour_is_half_a_slot() {
        let m = model();
        assert_eq!(m.pixel_for_time(at(&m, 30)), 125.0);
        assert_eq!(m.pixel_for_time(at(&m, 60)), 250.0);
        assert_eq!(m.time_for_pixel(125.0), at(&m, 30));
    }

    #[test]
    fn full_day_has_24_labels() {
        let m = model();
        let labels = m.generate_labels();
        assert_eq!(labels.len(), 24);
        assert_eq!(m.label_count(), 24);
        assert_eq!(labels[0].text, "00:30");
        assert_eq!(labels[0].x, 0.0);
        assert_eq!(labels[0].center_x, 125.0);
        assert_eq!(labels[23].text, "23:30");
        assert_eq!(labels[23].x, 23.0 * 250.0);
    }

    #[test]
    fn labels_follow_slot_minutes() {
        let m = model().with_slot_minutes(30);
        let labels = m.generate_labels();
        assert_eq!(labels.len(), 48);
        assert_eq!(labels[0].text, "00:15");
        assert_eq!(labels[1].text, "00:45");
        assert_eq!(m.pixels_per_minute(), 250.0 / 30.0);
    }

    #[test]
    fn uneven_slots_stop_before_day_end() {
        let m = model().with_slot_minutes(31);
        let labels = m.generate_labels();
        assert_eq!(labels.len(), 46);
        let last = labels.last().unwrap();
        assert!(last.time <= m.window().day_end());
        assert_eq!(last.text, "23:30");
    }

    #[test]
    fn now_offset_clamps_to_day() {
        let m = model();
        let before = m.window().day_start().saturating_add_millis(-MILLIS_PER_HOUR);
        let after = m.window().day_end().saturating_add_millis(MILLIS_PER_HOUR);
        assert_eq!(m.now_offset(before), 0.0);
        assert_eq!(m.now_offset(after), m.pixel_for_time(m.window().day_end()));
        assert_eq!(m.now_offset(at(&m, 90)), 375.0);
    }

    #[test]
    fn content_width_includes_channel_column() {
        let m = model();
        assert_eq!(m.content_width(100.0), 24.0 * 250.0 + 100.0);
    }

    #[test]
    fn scroll_position_centres_now() {
        let m = model();
        let noon = at(&m, 12 * 60);
        // 12h * 250 = 3000; 3000 - 500 + 100 = 2600
        assert_eq!(m.scroll_position_for_time(noon, 1000.0, 100.0), 2600.0);
    }

    #[test]
    fn scroll_position_clamps_at_edges() {
        let m = model();
        assert_eq!(m.scroll_position_for_time(at(&m, 0), 1000.0, 100.0), 0.0);
        let late = at(&m, 24 * 60 - 1);
        assert_eq!(
            m.scroll_position_for_time(late, 1000.0, 100.0),
            m.content_width(100.0) - 1000.0
        );
    }

    #[test]
    fn zero_slot_width_degrades() {
        let m = TimelineModel::new(model().window(), 0.0);
        assert_eq!(m.pixel_for_time(at(&m, 90)), 0.0);
        assert_eq!(m.time_for_pixel(50.0), m.window().day_start());
    }
}
