//! The streaming orchestrator: pages raw log rows out of a source, fans
//! decoding out across per-contract worker groups, and fans the decoded
//! records into batched sinks.
//!
//! The source and ABI-resolver boundaries are async traits so any store
//! can sit behind them; the decode fan-out itself runs on plain OS
//! threads, since work within a page is embarrassingly parallel across
//! contract groups and there is no cross-page concurrency.

pub mod error;
pub mod file_sink;
pub mod memory;
pub mod pipeline;
pub mod progress;
pub mod resolver;
pub mod sink;
pub mod source;

pub use error::{PipelineError, SinkError, SourceError};
pub use file_sink::{BlockFileWriter, FileFormat};
pub use pipeline::{Pipeline, PipelineConfig, RunReport, SinkReport};
pub use progress::{ProgressObserver, ProgressSnapshot};
pub use resolver::{AbiResolver, ContractAbiRecord};
pub use sink::{BatchWriter, BatchingSink, RecordSink};
pub use source::{LogRow, LogSource, PageCursor};
