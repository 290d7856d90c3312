//! Error types for ABI parsing and hex handling.

use thiserror::Error;

/// Errors from the hex primitives.
#[derive(Debug, Error)]
pub enum HexError {
    #[error("invalid hex string '{input}'")]
    InvalidHex { input: String },

    #[error("hex value '{input}' does not fit in 256 bits")]
    Overflow { input: String },
}

/// Errors from parsing an ABI JSON document.
#[derive(Debug, Error)]
pub enum AbiParseError {
    #[error("ABI JSON parse failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("ABI root is not an array")]
    NotArray,

    #[error("ABI item missing mandatory field '{field}'")]
    MissingField { field: &'static str },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
