//! In-memory source, resolver, and sink implementations.
//!
//! Suitable for tests, wiring experiments, and embedded use; they honour
//! the same contracts as the warehouse-backed adapters.

use crate::error::{SinkError, SourceError};
use crate::resolver::{AbiResolver, ContractAbiRecord};
use crate::sink::BatchWriter;
use crate::source::{LogRow, LogSource};
use async_trait::async_trait;
use chainetl_decode::DecodedRecord;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// A `LogSource` over a fixed in-memory row set.
pub struct MemoryLogSource {
    rows: Vec<LogRow>,
}

impl MemoryLogSource {
    pub fn new(mut rows: Vec<LogRow>) -> Self {
        rows.sort_by_key(|row| (row.block_number, row.log_index));
        Self { rows }
    }
}

#[async_trait]
impl LogSource for MemoryLogSource {
    async fn select_logs(
        &self,
        start_block: u64,
        end_block: u64,
        page_size: u64,
        offset: u64,
    ) -> Result<Vec<LogRow>, SourceError> {
        Ok(self
            .rows
            .iter()
            .filter(|row| row.block_number >= start_block && row.block_number <= end_block)
            .skip(offset as usize)
            .take(page_size as usize)
            .cloned()
            .collect())
    }
}

/// An `AbiResolver` over a fixed set of contract records, keyed by both
/// proxy and implementation addresses like the warehouse resolver.
pub struct MemoryAbiResolver {
    records: HashMap<String, ContractAbiRecord>,
}

impl MemoryAbiResolver {
    pub fn new(records: impl IntoIterator<Item = ContractAbiRecord>) -> Self {
        let mut map = HashMap::new();
        for record in records {
            if let Some(implementation) = &record.implementation_address {
                map.insert(implementation.clone(), record.clone());
            }
            map.insert(record.address.clone(), record);
        }
        Self { records: map }
    }
}

#[async_trait]
impl AbiResolver for MemoryAbiResolver {
    async fn resolve_abis(
        &self,
        addresses: &[String],
    ) -> Result<HashMap<String, ContractAbiRecord>, SourceError> {
        Ok(addresses
            .iter()
            .filter_map(|addr| {
                self.records
                    .get(addr)
                    .map(|record| (addr.clone(), record.clone()))
            })
            .collect())
    }
}

/// A `BatchWriter` that collects records into shared memory; can be told
/// to fail every batch for counter tests.
pub struct CollectingWriter {
    records: Arc<Mutex<Vec<DecodedRecord>>>,
    fail: bool,
}

impl CollectingWriter {
    pub fn new() -> Self {
        Self {
            records: Arc::new(Mutex::new(Vec::new())),
            fail: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            records: Arc::new(Mutex::new(Vec::new())),
            fail: true,
        }
    }

    /// Handle to the collected records, shared with the writer.
    pub fn records(&self) -> Arc<Mutex<Vec<DecodedRecord>>> {
        Arc::clone(&self.records)
    }
}

impl Default for CollectingWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl BatchWriter for CollectingWriter {
    fn name(&self) -> &str {
        "memory"
    }

    fn write_batch(&mut self, records: &[DecodedRecord]) -> Result<(), SinkError> {
        if self.fail {
            return Err(SinkError::Insert("collecting writer set to fail".into()));
        }
        self.records
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .extend_from_slice(records);
        Ok(())
    }
}
