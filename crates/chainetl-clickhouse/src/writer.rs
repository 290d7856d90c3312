//! Warehouse sink: one async insert per batch, zero retries.

use crate::config::ClickHouseConfig;
use crate::query_config::QueryConfig;
use chainetl_decode::DecodedRecord;
use chainetl_stream::{BatchWriter, SinkError};
use clickhouse::Row;
use serde::Serialize;
use std::time::Duration;

/// Insert row for the decoded-logs table, fixed column order.
#[derive(Row, Serialize)]
struct DecodedLogRow {
    transaction_hash: String,
    log_index: u32,
    contract_address: String,
    event_name: String,
    event_signature: String,
    signature: String,
    args: String,
}

impl DecodedLogRow {
    fn from_record(record: &DecodedRecord) -> Self {
        Self {
            transaction_hash: record.transaction_hash.clone(),
            log_index: record.log_index as u32,
            contract_address: record.contract_address.clone(),
            event_name: record.event_name.clone(),
            event_signature: record.event_signature.clone(),
            signature: record.signature.clone(),
            args: record.args.clone(),
        }
    }
}

/// Batched inserter into the decoded-logs table.
///
/// The async-insert session settings from [`QueryConfig`] are applied as
/// client options, so the server buffers and compacts the inserts. A
/// failed batch is dropped after one attempt; retries belong to the
/// caller.
pub struct ClickHouseWriter {
    client: clickhouse::Client,
    table: String,
    handle: tokio::runtime::Handle,
    timeout: Duration,
}

impl ClickHouseWriter {
    /// Must be constructed inside a Tokio runtime: batch flushes block the
    /// calling worker thread on the captured handle.
    pub fn new(config: &ClickHouseConfig, queries: &QueryConfig) -> Self {
        let mut client = config.client();
        for (key, value) in queries.async_insert_settings() {
            client = client.with_option(key.as_str(), value.as_str());
        }
        Self {
            client,
            table: queries.insert_table().to_string(),
            handle: tokio::runtime::Handle::current(),
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }
}

impl BatchWriter for ClickHouseWriter {
    fn name(&self) -> &str {
        "clickhouse"
    }

    fn write_batch(&mut self, records: &[DecodedRecord]) -> Result<(), SinkError> {
        let rows: Vec<DecodedLogRow> = records.iter().map(DecodedLogRow::from_record).collect();
        let client = self.client.clone();
        let table = self.table.clone();

        let insert = async move {
            let mut insert = client
                .insert(&table)
                .map_err(|error| SinkError::Insert(error.to_string()))?;
            for row in &rows {
                insert
                    .write(row)
                    .await
                    .map_err(|error| SinkError::Insert(error.to_string()))?;
            }
            insert
                .end()
                .await
                .map_err(|error| SinkError::Insert(error.to_string()))
        };

        self.handle
            .block_on(async {
                tokio::time::timeout(self.timeout, insert)
                    .await
                    .map_err(|_| SinkError::Insert("insert timed out".to_string()))?
            })
    }
}
