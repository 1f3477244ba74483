#![forbid(unsafe_code)]

//! Core: time model, EPG records, pixel geometry, gestures and scroll animation.

pub mod animation;
pub mod epg;
pub mod error;
pub mod geometry;
pub mod gesture;
pub mod time;
pub mod timeline;

pub use epg::{
    ChannelBrief, ChannelBriefs, ChannelId, ChannelPrograms, DayGuide, EpgSource, Program,
    ProgramId,
};
pub use error::EpgError;
pub use geometry::{ContentExtent, Point, Rect, ScrollBounds, Size, Translation, ViewportSize};
pub use time::{Clock, DateKey, ManualClock, SystemClock, TimeWindow, Timestamp};
pub use timeline::{TimeLabel, TimelineModel};
