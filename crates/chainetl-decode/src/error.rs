//! Decode-time errors.
//!
//! A failure here is row-scoped: the pipeline drops the row, counts it as
//! processed-but-not-decoded, and keeps going.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("log entry has no topics")]
    NoTopics,

    #[error("no event matches topic0 {topic0}")]
    UnknownEvent { topic0: String },

    #[error("unsupported ABI type '{decl}'")]
    UnsupportedType { decl: String },

    #[error("insufficient data: need {needed} bytes at offset {offset}, have {available}")]
    OutOfBounds {
        offset: usize,
        needed: usize,
        available: usize,
    },

    #[error("word at offset {offset} does not fit in 64 bits")]
    WordOverflow { offset: usize },

    #[error("length {length} exceeds remaining buffer of {available} bytes")]
    LengthOverflow { length: u64, available: usize },

    #[error("dynamic offset {offset} outside buffer of {available} bytes")]
    BadOffset { offset: usize, available: usize },

    #[error("missing topic for indexed parameter '{name}'")]
    MissingTopic { name: String },

    #[error("string parameter is not valid UTF-8")]
    InvalidUtf8,

    #[error("invalid hex in log payload: {0}")]
    Hex(#[from] chainetl_abi::HexError),
}
