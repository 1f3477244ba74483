#![forbid(unsafe_code)]

//! Errors raised by the fallible edges of the core crate.
//!
//! Only input parsing can fail here. Layout, culling and recycling never
//! return errors; they degrade to empty rows or zero-width cells instead.

use std::fmt;

/// Errors produced while parsing EPG inputs.
#[derive(Debug)]
pub enum EpgError {
    /// A date key was not in `YYYY-MM-DD` form or named an impossible date.
    InvalidDateKey {
        /// The rejected input.
        input: String,
    },
    /// JSON decode or encode failure.
    #[cfg(feature = "serde")]
    Json(serde_json::Error),
}

impl fmt::Display for EpgError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidDateKey { input } => {
                write!(f, "invalid date key {input:?}: expected YYYY-MM-DD")
            }
            #[cfg(feature = "serde")]
            Self::Json(e) => write!(f, "EPG JSON error: {e}"),
        }
    }
}

impl std::error::Error for EpgError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::InvalidDateKey { .. } => None,
            #[cfg(feature = "serde")]
            Self::Json(e) => Some(e),
        }
    }
}

#[cfg(feature = "serde")]
impl From<serde_json::Error> for EpgError {
    fn from(e: serde_json::Error) -> Self {
        Self::Json(e)
    }
}
