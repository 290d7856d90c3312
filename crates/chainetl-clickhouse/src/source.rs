//! `LogSource` backed by the warehouse `logs` table.

use crate::config::ClickHouseConfig;
use crate::query_config::QueryConfig;
use async_trait::async_trait;
use chainetl_stream::{LogRow, LogSource, SourceError};
use clickhouse::Row;
use serde::Deserialize;
use std::time::Duration;

/// Wire row in the exact column order of the log-stream query.
#[derive(Row, Deserialize)]
struct RawLogRow {
    transaction_hash: String,
    block_number: u64,
    address: String,
    data: String,
    log_index: u64,
    topic0: Option<String>,
    topic1: Option<String>,
    topic2: Option<String>,
    topic3: Option<String>,
}

impl RawLogRow {
    fn into_log_row(self) -> LogRow {
        // Null topics collapse out of the list; order is preserved.
        let topics = [self.topic0, self.topic1, self.topic2, self.topic3]
            .into_iter()
            .flatten()
            .filter(|topic| !topic.is_empty())
            .collect();
        LogRow {
            transaction_hash: self.transaction_hash,
            block_number: self.block_number,
            log_index: self.log_index,
            address: self.address,
            data: self.data,
            topics,
        }
    }
}

/// Paged reader over the raw logs table.
pub struct ClickHouseLogSource {
    client: clickhouse::Client,
    queries: QueryConfig,
    timeout: Duration,
}

impl ClickHouseLogSource {
    pub fn new(config: &ClickHouseConfig, queries: QueryConfig) -> Self {
        Self {
            client: config.client(),
            queries,
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }

    /// Cheap connectivity probe, run before streaming starts so that an
    /// unreachable host fails fast with a configuration error.
    pub async fn test_connection(&self) -> Result<(), SourceError> {
        tokio::time::timeout(self.timeout, self.client.query("SELECT 1").fetch_one::<u8>())
            .await
            .map_err(|_| SourceError::Timeout {
                seconds: self.timeout.as_secs(),
            })?
            .map_err(|error| SourceError::Connection(error.to_string()))?;
        Ok(())
    }
}

#[async_trait]
impl LogSource for ClickHouseLogSource {
    async fn select_logs(
        &self,
        start_block: u64,
        end_block: u64,
        page_size: u64,
        offset: u64,
    ) -> Result<Vec<LogRow>, SourceError> {
        let sql = self
            .queries
            .format_log_stream_query(start_block, end_block, page_size, offset);
        tracing::debug!(start_block, end_block, page_size, offset, "fetching log page");

        let rows = tokio::time::timeout(
            self.timeout,
            self.client.query(&sql).fetch_all::<RawLogRow>(),
        )
        .await
        .map_err(|_| SourceError::Timeout {
            seconds: self.timeout.as_secs(),
        })?
        .map_err(|error| SourceError::Query(error.to_string()))?;

        Ok(rows.into_iter().map(RawLogRow::into_log_row).collect())
    }
}
