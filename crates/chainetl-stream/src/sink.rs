//! The batched sink contract and the shared buffering shell.

use crate::error::SinkError;
use chainetl_decode::DecodedRecord;

/// A batched consumer of decoded records.
///
/// `write` only buffers; the record hits storage when the batch threshold
/// is reached or on the final `flush`. The pipeline serialises all calls
/// through its emission lock, so implementations need no internal locking.
pub trait RecordSink: Send {
    fn name(&self) -> &str;

    /// Buffer one record, flushing the batch when it reaches the threshold.
    fn write(&mut self, record: DecodedRecord);

    /// Force-flush any partial batch. Must be called on shutdown.
    fn flush(&mut self);

    fn total_written(&self) -> u64;

    fn total_failed(&self) -> u64;
}

/// Writes one whole batch to its destination. A failed batch is counted
/// and dropped; retries are the caller's responsibility, not the sink's.
pub trait BatchWriter: Send {
    fn name(&self) -> &str;

    fn write_batch(&mut self, records: &[DecodedRecord]) -> Result<(), SinkError>;
}

/// Buffering shell shared by every sink: collects records and hands full
/// batches to the inner writer, keeping written and failed counts as two
/// distinct counters.
pub struct BatchingSink<W> {
    writer: W,
    batch_size: usize,
    pending: Vec<DecodedRecord>,
    total_written: u64,
    total_failed: u64,
}

impl<W: BatchWriter> BatchingSink<W> {
    pub fn new(writer: W, batch_size: usize) -> Self {
        let batch_size = batch_size.max(1);
        Self {
            writer,
            batch_size,
            pending: Vec::with_capacity(batch_size),
            total_written: 0,
            total_failed: 0,
        }
    }

    fn flush_pending(&mut self) {
        if self.pending.is_empty() {
            return;
        }
        let count = self.pending.len() as u64;
        match self.writer.write_batch(&self.pending) {
            Ok(()) => {
                self.total_written += count;
                tracing::debug!(
                    sink = self.writer.name(),
                    records = count,
                    total_written = self.total_written,
                    "batch written"
                );
            }
            Err(error) => {
                self.total_failed += count;
                tracing::error!(
                    sink = self.writer.name(),
                    records = count,
                    error = %error,
                    total_failed = self.total_failed,
                    "batch write failed"
                );
            }
        }
        self.pending.clear();
    }
}

impl<W: BatchWriter> RecordSink for BatchingSink<W> {
    fn name(&self) -> &str {
        self.writer.name()
    }

    fn write(&mut self, record: DecodedRecord) {
        self.pending.push(record);
        if self.pending.len() >= self.batch_size {
            self.flush_pending();
        }
    }

    fn flush(&mut self) {
        self.flush_pending();
    }

    fn total_written(&self) -> u64 {
        self.total_written
    }

    fn total_failed(&self) -> u64 {
        self.total_failed
    }
}
