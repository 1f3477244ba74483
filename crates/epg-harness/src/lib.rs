#![forbid(unsafe_code)]

//! Test and demo support for the EPG guide.
//!
//! # Key Components
//!
//! - [`mock`] - Seeded mock EPG days (100 channels of back-to-back programs)
//! - [`fixtures`] - Tiny hand-built guides with known geometry
//! - [`text`] - Renders a [`GuideFrame`](epg_runtime::GuideFrame) as fixed-width text
//! - [`sim`] - Both runtime contexts on a virtual clock

pub mod fixtures;
pub mod mock;
pub mod sim;
pub mod text;

pub use mock::{MockEpgConfig, generate};
pub use sim::GuideSimulator;
pub use text::{TextRenderer, frame_to_text};
