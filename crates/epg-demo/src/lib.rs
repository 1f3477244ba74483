#![forbid(unsafe_code)]

//! Headless EPG grid demo.
//!
//! Builds a guide from mock or JSON data, replays a gesture script against
//! it and prints the composed frames as text.

pub mod cli;
pub mod runner;
pub mod script;
