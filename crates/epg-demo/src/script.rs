#![forbid(unsafe_code)]

//! Gesture scripts.
//!
//! A script is a `;`-separated list of steps such as
//! `drag:-300,0;tap:400,200;show`. Pointer steps expand into timed
//! [`PointerEvent`]s so the simulated and threaded runners replay the same
//! input.

use std::fmt;
use std::time::Duration;

use epg_core::geometry::{Point, Size};
use epg_core::gesture::PointerEvent;
use epg_core::time::DateKey;

use crate::cli::parse_size;

/// Moves per drag or fling.
const STROKE_MOVES: u32 = 10;
/// Gap between moves of a drag.
const DRAG_MOVE_GAP: Duration = Duration::from_millis(20);
/// Gap between moves of a fling.
const FLING_MOVE_GAP: Duration = Duration::from_millis(8);
/// Stillness before a drag's release, longer than the velocity window.
const DRAG_HOLD: Duration = Duration::from_millis(150);
/// Press length of a tap.
const TAP_PRESS: Duration = Duration::from_millis(60);

/// One script step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Step {
    /// Print the current frame.
    Show,
    /// Drag by `(dx, dy)` from the viewport centre and stop.
    Drag(f64, f64),
    /// Drag by `(dx, dy)` and release at speed.
    Fling(f64, f64),
    /// Tap at a viewport point.
    Tap(f64, f64),
    /// Let time pass.
    Wait(Duration),
    /// Resize the viewport.
    Resize(Size),
    /// Switch the displayed day.
    Day(DateKey),
}

/// Script parse failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptError {
    /// The offending step text.
    pub step: String,
    /// What was wrong with it.
    pub reason: &'static str,
}

impl fmt::Display for ScriptError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "bad script step {:?}: {}", self.step, self.reason)
    }
}

impl std::error::Error for ScriptError {}

/// Parse a script. Empty steps are skipped.
pub fn parse(script: &str) -> Result<Vec<Step>, ScriptError> {
    script
        .split(';')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(parse_step)
        .collect()
}

fn parse_step(text: &str) -> Result<Step, ScriptError> {
    let err = |reason| ScriptError {
        step: text.to_string(),
        reason,
    };
    let (name, arg) = text.split_once(':').unwrap_or((text, ""));
    match name {
        "show" => Ok(Step::Show),
        "drag" => pair(arg).map(|(x, y)| Step::Drag(x, y)).ok_or_else(|| err("expected DX,DY")),
        "fling" => pair(arg).map(|(x, y)| Step::Fling(x, y)).ok_or_else(|| err("expected DX,DY")),
        "tap" => pair(arg).map(|(x, y)| Step::Tap(x, y)).ok_or_else(|| err("expected X,Y")),
        "wait" => arg
            .parse()
            .map(|ms| Step::Wait(Duration::from_millis(ms)))
            .map_err(|_| err("expected milliseconds")),
        "resize" => parse_size(arg)
            .map(|(w, h)| Step::Resize(Size::new(w, h)))
            .ok_or_else(|| err("expected WxH")),
        "day" => DateKey::parse(arg)
            .map(Step::Day)
            .map_err(|_| err("expected YYYY-MM-DD")),
        _ => Err(err("unknown step")),
    }
}

fn pair(arg: &str) -> Option<(f64, f64)> {
    let (a, b) = arg.split_once(',')?;
    let (a, b): (f64, f64) = (a.trim().parse().ok()?, b.trim().parse().ok()?);
    (a.is_finite() && b.is_finite()).then_some((a, b))
}

impl Step {
    /// Timed pointer events for this step in a viewport of `viewport`.
    /// Each entry is the delay before the event. Empty for non-pointer steps.
    #[must_use]
    pub fn pointer_events(&self, viewport: Size) -> Vec<(Duration, PointerEvent)> {
        let centre = Point::new(viewport.width / 2.0, viewport.height / 2.0);
        match *self {
            Step::Drag(dx, dy) => {
                let mut events = stroke(centre, dx, dy, DRAG_MOVE_GAP);
                let end = Point::new(centre.x + dx, centre.y + dy);
                events.push((DRAG_HOLD, PointerEvent::Up(end)));
                events
            }
            Step::Fling(dx, dy) => {
                let mut events = stroke(centre, dx, dy, FLING_MOVE_GAP);
                let end = Point::new(centre.x + dx, centre.y + dy);
                events.push((Duration::ZERO, PointerEvent::Up(end)));
                events
            }
            Step::Tap(x, y) => {
                let at = Point::new(x, y);
                vec![
                    (Duration::ZERO, PointerEvent::Down(at)),
                    (TAP_PRESS, PointerEvent::Up(at)),
                ]
            }
            Step::Show | Step::Wait(_) | Step::Resize(_) | Step::Day(_) => Vec::new(),
        }
    }
}

fn stroke(from: Point, dx: f64, dy: f64, gap: Duration) -> Vec<(Duration, PointerEvent)> {
    let mut events = vec![(Duration::ZERO, PointerEvent::Down(from))];
    for i in 1..=STROKE_MOVES {
        let f = f64::from(i) / f64::from(STROKE_MOVES);
        events.push((gap, PointerEvent::Move(Point::new(from.x + dx * f, from.y + dy * f))));
    }
    events
}
