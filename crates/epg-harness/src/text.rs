#![forbid(unsafe_code)]

//! Plain-text rendering of a [`GuideFrame`].
//!
//! One text column stands for `px_per_col` pixels. The first line is the
//! time header, then one line per visible row. Program blocks are drawn as
//! `[title   ]`; a `*` before the title marks a running program and `>` the
//! selected one. Blocks too narrow for details are filled with `#`. The
//! channel-name column is drawn last, over whatever scrolled under it, the
//! same way the sticky column covers content on screen. A `v` in the header
//! marks "now".
//!
//! Trailing spaces are trimmed from every line.

use epg_layout::GridMetrics;
use epg_layout::program_layout::PositionedProgram;
use epg_runtime::guide::GuideFrame;

/// Pixels per text column used by [`frame_to_text`].
pub const DEFAULT_PX_PER_COL: f64 = 10.0;

/// Renders frames into fixed-width text.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextRenderer {
    px_per_col: f64,
    channel_name_width: f64,
    detail_min_width: f64,
}

impl TextRenderer {
    /// Renderer for `metrics` at `px_per_col` pixels per column.
    #[must_use]
    pub fn new(metrics: &GridMetrics, px_per_col: f64) -> Self {
        let px_per_col = if px_per_col.is_finite() && px_per_col > 0.0 {
            px_per_col
        } else {
            DEFAULT_PX_PER_COL
        };
        Self {
            px_per_col,
            channel_name_width: metrics.channel_name_width,
            detail_min_width: metrics.detail_min_width,
        }
    }

    /// Render `frame`.
    #[must_use]
    pub fn render(&self, frame: &GuideFrame) -> String {
        let cols = self.col(frame.viewport.width).max(0) as usize;
        let name_cols = (self.col(self.channel_name_width).max(0) as usize).min(cols);
        let offset_x = frame.translation.offset().x;

        let mut lines = Vec::with_capacity(frame.rows.len() + 1);

        let mut header = vec![' '; cols];
        for label in &frame.labels {
            let start = self.col(self.channel_name_width + label.x - offset_x);
            put_str(&mut header, start, &label.text);
        }
        if let Some(x) = frame.now_indicator_x {
            let c = self.col(x - offset_x);
            if c >= name_cols as i64 && (c as usize) < cols {
                header[c as usize] = 'v';
            }
        }
        overlay_name(&mut header, name_cols, "");
        lines.push(header);

        for row in &frame.rows {
            let mut line = vec![' '; cols];
            for p in &row.programs {
                self.draw_block(&mut line, p, offset_x);
            }
            overlay_name(&mut line, name_cols, &row.channel_name);
            lines.push(line);
        }

        lines
            .into_iter()
            .map(|l| l.into_iter().collect::<String>().trim_end().to_owned())
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn col(&self, px: f64) -> i64 {
        (px / self.px_per_col).floor() as i64
    }

    fn draw_block(&self, line: &mut [char], p: &PositionedProgram, offset_x: f64) {
        let start = self.col(p.x() - offset_x);
        let end = self.col(p.x() + p.width() - offset_x);
        if end <= start {
            return;
        }
        let len = (end - start) as usize;
        let mut block = vec![' '; len];
        if p.shows_detail(self.detail_min_width) {
            block[0] = '[';
            if len > 1 {
                block[len - 1] = ']';
            }
            let mut text = String::new();
            if p.selected {
                text.push('>');
            }
            if p.running {
                text.push('*');
            }
            text.push_str(&p.program.title);
            for (slot, ch) in block.iter_mut().skip(1).take(len.saturating_sub(2)).zip(text.chars()) {
                *slot = ch;
            }
        } else {
            block.fill('#');
        }
        for (i, ch) in block.into_iter().enumerate() {
            let c = start + i as i64;
            if c >= 0 && (c as usize) < line.len() {
                line[c as usize] = ch;
            }
        }
    }
}

/// Render `frame` at [`DEFAULT_PX_PER_COL`].
#[must_use]
pub fn frame_to_text(frame: &GuideFrame, metrics: &GridMetrics) -> String {
    TextRenderer::new(metrics, DEFAULT_PX_PER_COL).render(frame)
}

fn put_str(line: &mut [char], start: i64, text: &str) {
    for (i, ch) in text.chars().enumerate() {
        let c = start + i as i64;
        if c >= 0 && (c as usize) < line.len() {
            line[c as usize] = ch;
        }
    }
}

fn overlay_name(line: &mut [char], name_cols: usize, name: &str) {
    if name_cols == 0 {
        return;
    }
    let mut chars = name.chars();
    for slot in line.iter_mut().take(name_cols - 1) {
        *slot = chars.next().unwrap_or(' ');
    }
    line[name_cols - 1] = '|';
}
