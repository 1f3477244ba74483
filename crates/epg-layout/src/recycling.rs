#![forbid(unsafe_code)]

//! Row slot recycling.
//!
//! A [`RowPool`] holds `N = ceil(viewport_height / row_height) + 1` slots
//! when the pinned header is one row tall. In general the pool is sized from
//! the body below the header plus one row:
//! `N = ceil((viewport_height - header_height + row_height) / row_height) + 1`.
//! As the vertical scroll moves, each slot is re-pointed at a logical row so
//! that the pool always covers the rows the viewport can show.
//!
//! # Assignment
//!
//! With `s` the integer row offset (`floor(offset_y / row_height)`):
//!
//! ```text
//! block    = floor(s / N) + 1
//! computed = slot + (block - 1) * N
//! logical  = computed          if computed >= s - 1
//!          = computed + N      otherwise
//! ```
//!
//! # Invariants
//!
//! 1. The assigned rows are exactly [`RowPool::window`]`(s)`:
//!    `[max(s - 1, floor(s / N) * N), +N)`.
//! 2. No logical row is assigned twice.
//! 3. `logical % N == slot_index`, so a slot keeps its identity while its
//!    row changes.
//!
//! Row `p` starts at content y `header_height + p * row_height`, so at
//! offset `s` the first row not hidden by the pinned header is `s` whatever
//! the header height, and at most `ceil(body / row_height) + 1` rows are on
//! screen. The window from invariant 1 holds every one of them. The
//! look-behind row and the row past the viewport's bottom edge are overscan:
//! they may or may not fall inside the window depending on where `s` sits
//! within its block of `N`.

use std::ops::Range;

/// Slots needed for a viewport of `viewport_height`. Never less than 1.
#[must_use]
pub fn slot_count(viewport_height: f64, row_height: f64) -> usize {
    if !(row_height.is_finite() && row_height > 0.0) {
        return 1;
    }
    let height = if viewport_height.is_finite() {
        viewport_height.max(0.0)
    } else {
        0.0
    };
    ((height / row_height).ceil() as usize).saturating_add(1).max(1)
}

/// Integer row offset for a positive vertical content offset.
#[must_use]
pub fn scroll_row_offset(offset_y: f64, row_height: f64) -> usize {
    if !(row_height.is_finite() && row_height > 0.0) || !offset_y.is_finite() || offset_y <= 0.0 {
        return 0;
    }
    (offset_y / row_height).floor() as usize
}

/// A member of the pool.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RowSlot {
    /// Index within the pool.
    pub slot_index: usize,
    /// Stable render key, `y{slot_index}`.
    pub key: String,
}

impl RowSlot {
    fn new(slot_index: usize) -> Self {
        Self {
            slot_index,
            key: format!("y{slot_index}"),
        }
    }
}

/// A slot and the logical row it currently shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotAssignment<'a> {
    /// The slot.
    pub slot: &'a RowSlot,
    /// Logical row position.
    pub logical_row: usize,
}

/// Fixed-size pool of row slots.
#[derive(Debug, Clone, PartialEq)]
pub struct RowPool {
    row_height: f64,
    header_height: f64,
    viewport_height: f64,
    slots: Vec<RowSlot>,
}

impl RowPool {
    /// Pool for a zero-height viewport (one slot), under a header one row tall.
    #[must_use]
    pub fn new(row_height: f64) -> Self {
        Self::with_header(row_height, row_height)
    }

    /// Pool for rows of `row_height` under a pinned header of `header_height`.
    #[must_use]
    pub fn with_header(row_height: f64, header_height: f64) -> Self {
        let header_height = if header_height.is_finite() {
            header_height.max(0.0)
        } else {
            row_height
        };
        let mut pool = Self {
            row_height,
            header_height,
            viewport_height: 0.0,
            slots: Vec::new(),
        };
        pool.rebuild();
        pool
    }

    /// Rebuild the slots for a new viewport height. Returns whether the
    /// slot count changed.
    pub fn resize(&mut self, viewport_height: f64) -> bool {
        let before = self.slots.len();
        self.viewport_height = viewport_height;
        self.rebuild();
        let changed = before != self.slots.len();
        if changed {
            tracing::debug!(from = before, to = self.slots.len(), "row pool resized");
        }
        changed
    }

    fn rebuild(&mut self) {
        let body = self.viewport_height.max(0.0) - self.header_height;
        let n = if body <= -self.row_height {
            1
        } else {
            slot_count(body + self.row_height, self.row_height)
        };
        self.slots = (0..n).map(RowSlot::new).collect();
    }

    /// Number of slots.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Always false; the pool keeps at least one slot.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Row height the pool was built for.
    #[inline]
    #[must_use]
    pub fn row_height(&self) -> f64 {
        self.row_height
    }

    /// Pinned header height the pool was built for.
    #[inline]
    #[must_use]
    pub fn header_height(&self) -> f64 {
        self.header_height
    }

    /// Slots in index order.
    #[inline]
    #[must_use]
    pub fn slots(&self) -> &[RowSlot] {
        &self.slots
    }

    /// Logical row for `slot_index` at row offset `s`.
    #[must_use]
    pub fn logical_row(&self, slot_index: usize, s: usize) -> usize {
        let n = self.slots.len().max(1);
        let base = (s / n) * n;
        let computed = slot_index + base;
        if computed + 1 >= s { computed } else { computed + n }
    }

    /// Map every slot onto a logical row for row offset `s`, in slot order.
    #[must_use]
    pub fn assign(&self, s: usize) -> Vec<SlotAssignment<'_>> {
        self.slots
            .iter()
            .map(|slot| SlotAssignment {
                slot,
                logical_row: self.logical_row(slot.slot_index, s),
            })
            .collect()
    }

    /// Logical rows covered at row offset `s`.
    #[must_use]
    pub fn window(&self, s: usize) -> Range<usize> {
        let n = self.slots.len().max(1);
        let start = s.saturating_sub(1).max((s / n) * n);
        start..start + n
    }
}
