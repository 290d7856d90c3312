//! Error types for the streaming pipeline.
//!
//! Only source failures are fatal to a run; ABI and decode failures are
//! absorbed at group and row scope, and sink failures at batch scope.

use thiserror::Error;

/// Errors from a log source or ABI resolver.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("connection failed: {0}")]
    Connection(String),

    #[error("query failed: {0}")]
    Query(String),

    #[error("operation timed out after {seconds}s")]
    Timeout { seconds: u64 },
}

/// Errors from a sink's batch writer.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("insert failed: {0}")]
    Insert(String),

    #[error("columnar write failed: {0}")]
    Columnar(String),
}

/// Fatal pipeline errors.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("invalid block range {start}-{end}")]
    InvalidRange { start: u64, end: u64 },

    #[error("source error: {0}")]
    Source(#[from] SourceError),
}
