#![forbid(unsafe_code)]

//! EPG Runtime
//!
//! Ties the core and layout crates into a running guide.
//!
//! # Key Components
//!
//! - [`GuideEngine`] - Data/layout context: owns EPG data, row cache, slot pool and committed scroll
//! - [`AnimationContext`] - Gesture, pan physics and commit throttling
//! - [`AnimationLoop`] - An animation context on its own thread
//! - [`ScrollCommitter`] - Interval-bounded, latest-wins scroll commits
//! - [`ScrollHandoff`] - One-way animation → data hand-off
//! - [`NowTicker`] - "Now" refresh with commit-pending suppression
//! - [`GuideConfig`] - Every tunable, optionally loaded from TOML/JSON
//!
//! # How it fits together
//! The animation context runs at frame rate and publishes committed scroll
//! values and taps. The data context drains them when it gets to it, marks
//! dirty flags, and recomposes the visible frame once. Neither side blocks
//! on the other.

pub mod commit_throttle;
pub mod config;
pub mod driver;
pub mod guide;
pub mod handoff;
pub mod now_ticker;
pub mod pan;
pub mod subscription;

pub use commit_throttle::{
    CommitAction, CommitDecision, CommitLog, CommittedScroll, CommitterConfig, CommitterStats,
    ScrollCommitter, ScrollSampler,
};
pub use config::{ConfigError, GuideConfig};
pub use driver::{AnimationCommand, AnimationContext, AnimationLoop};
pub use guide::{Dirty, GuideEngine, GuideFrame, VisibleRow};
pub use handoff::{HandoffReader, HandoffWriter, ScrollHandoff, TapEvent};
pub use now_ticker::{NowTick, NowTicker, NowTickerStats};
pub use pan::{PanController, PanPhase};
pub use subscription::{Every, StopSignal, StopTrigger, Subscription, SubscriptionHandle};
