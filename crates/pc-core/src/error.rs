//! Error types for pc-core.
//!
//! Capture entry points never surface these to callers; they are returned by
//! the lower-level helpers (framing, CLI input parsing) and logged at the seams.

use crate::framing::FramingError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("framing error: {0}")]
    Framing(#[from] FramingError),

    #[error("invalid row input: {0}")]
    RowInput(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, CoreError>;
