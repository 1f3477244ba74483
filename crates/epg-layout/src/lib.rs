#![forbid(unsafe_code)]

//! Layout: turns EPG records into positioned program blocks and decides which
//! of them a viewport can see.
//!
//! # Role in the engine
//! [`program_layout`] computes geometry once per data or day change and
//! caches it per row. [`recycling`] maps a small fixed pool of row slots onto
//! the logical row space. [`culling`] filters a row's cached programs against
//! the horizontal scroll window. [`hit_test`] resolves taps back to programs.
//!
//! All of it is pure and synchronous; none of it returns errors.

pub mod culling;
pub mod hit_test;
pub mod program_layout;
pub mod recycling;

use epg_core::geometry::ContentExtent;
use epg_core::time::TimeWindow;
use epg_core::timeline::{DEFAULT_SLOT_MINUTES, DEFAULT_SLOT_WIDTH, TimelineModel};

pub use culling::{CullWindow, cull_into, cull_row, intersects};
pub use hit_test::{Selection, program_at, resolve_tap, row_at, screen_to_content};
pub use program_layout::{LaidOutRow, PositionedProgram, ProgramKey, ProgramLayoutEngine, RowCache};
pub use recycling::{RowPool, RowSlot, SlotAssignment, scroll_row_offset, slot_count};

/// Default row height in pixels.
pub const DEFAULT_ROW_HEIGHT: f64 = 60.0;
/// Default width of the sticky channel-name column.
pub const DEFAULT_CHANNEL_NAME_WIDTH: f64 = 100.0;
/// Default minimum width for a block to show title details.
pub const DEFAULT_DETAIL_MIN_WIDTH: f64 = 25.0;

/// Fixed pixel metrics of the grid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridMetrics {
    /// Pixels per timeline slot.
    pub slot_width: f64,
    /// Minutes per timeline slot.
    pub slot_minutes: u32,
    /// Height of one channel row.
    pub row_height: f64,
    /// Height of the time-label header row.
    pub header_height: f64,
    /// Width of the channel-name column.
    pub channel_name_width: f64,
    /// Blocks at or below this width hide their title details.
    pub detail_min_width: f64,
}

impl Default for GridMetrics {
    fn default() -> Self {
        Self {
            slot_width: DEFAULT_SLOT_WIDTH,
            slot_minutes: DEFAULT_SLOT_MINUTES,
            row_height: DEFAULT_ROW_HEIGHT,
            header_height: DEFAULT_ROW_HEIGHT,
            channel_name_width: DEFAULT_CHANNEL_NAME_WIDTH,
            detail_min_width: DEFAULT_DETAIL_MIN_WIDTH,
        }
    }
}

impl GridMetrics {
    /// Timeline model for `window` with these slot settings.
    #[must_use]
    pub fn timeline(&self, window: TimeWindow) -> TimelineModel {
        TimelineModel::new(window, self.slot_width).with_slot_minutes(self.slot_minutes)
    }

    /// Full scrollable size for `channel_count` rows.
    #[must_use]
    pub fn content_extent(&self, timeline: &TimelineModel, channel_count: usize) -> ContentExtent {
        ContentExtent::new(
            timeline.content_width(self.channel_name_width),
            channel_count as f64 * self.row_height + self.header_height,
        )
    }

    /// Top edge of row `position` in grid space.
    #[inline]
    #[must_use]
    pub fn row_y(&self, position: usize) -> f64 {
        position as f64 * self.row_height + self.header_height
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use epg_core::time::DateKey;

    #[test]
    fn default_extent_for_100_channels() {
        let m = GridMetrics::default();
        let tl = m.timeline(DateKey::parse("2025-04-09").unwrap().window());
        let extent = m.content_extent(&tl, 100);
        assert_eq!(extent.width, 24.0 * 250.0 + 100.0);
        assert_eq!(extent.height, 100.0 * 60.0 + 60.0);
    }

    #[test]
    fn first_row_sits_below_header() {
        let m = GridMetrics::default();
        assert_eq!(m.row_y(0), 60.0);
        assert_eq!(m.row_y(3), 240.0);
    }
}
