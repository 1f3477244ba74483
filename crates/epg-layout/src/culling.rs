#![forbid(unsafe_code)]

//! Horizontal viewport culling.
//!
//! A program is visible when its `[x, x + width)` span overlaps the scroll
//! window `[offset_x, offset_x + viewport_width)`. Culling runs over a row's
//! cached programs and never reorders them.

use epg_core::geometry::Translation;

use crate::program_layout::PositionedProgram;

/// The horizontal band of content the viewport currently shows.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CullWindow {
    /// Positive content offset.
    pub offset_x: f64,
    /// Viewport width.
    pub viewport_width: f64,
}

impl CullWindow {
    /// Window at `offset_x` spanning `viewport_width`.
    #[must_use]
    pub const fn new(offset_x: f64, viewport_width: f64) -> Self {
        Self {
            offset_x,
            viewport_width,
        }
    }

    /// Window for a committed translation.
    #[must_use]
    pub fn from_translation(translation: Translation, viewport_width: f64) -> Self {
        Self::new(translation.offset().x, viewport_width)
    }

    /// Whether `program` overlaps the window.
    #[inline]
    #[must_use]
    pub fn contains(&self, program: &PositionedProgram) -> bool {
        intersects(program, self.offset_x, self.viewport_width)
    }
}

/// `p.x + p.width > offset_x && p.x < offset_x + viewport_width`.
#[inline]
#[must_use]
pub fn intersects(program: &PositionedProgram, offset_x: f64, viewport_width: f64) -> bool {
    program.rect.intersects_band(offset_x, viewport_width)
}

/// Visible programs of one row, in source order.
#[must_use]
pub fn cull_row(
    programs: &[PositionedProgram],
    offset_x: f64,
    viewport_width: f64,
) -> Vec<&PositionedProgram> {
    programs
        .iter()
        .filter(|p| intersects(p, offset_x, viewport_width))
        .collect()
}

/// Append clones of the visible programs to `out`. Returns how many were added.
pub fn cull_into(
    programs: &[PositionedProgram],
    window: CullWindow,
    out: &mut Vec<PositionedProgram>,
) -> usize {
    let before = out.len();
    out.extend(programs.iter().filter(|p| window.contains(p)).cloned());
    out.len() - before
}
