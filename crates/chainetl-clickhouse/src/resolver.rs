//! `AbiResolver` backed by the warehouse contracts table.

use crate::config::ClickHouseConfig;
use crate::query_config::QueryConfig;
use async_trait::async_trait;
use chainetl_stream::{AbiResolver, ContractAbiRecord, SourceError};
use clickhouse::Row;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;

#[derive(Row, Deserialize)]
struct RawContractRow {
    address: String,
    name: String,
    abi: String,
    implementation_address: String,
}

/// Batched ABI lookup over the contracts table.
pub struct ClickHouseAbiResolver {
    client: clickhouse::Client,
    queries: QueryConfig,
    timeout: Duration,
}

impl ClickHouseAbiResolver {
    pub fn new(config: &ClickHouseConfig, queries: QueryConfig) -> Self {
        Self {
            client: config.client(),
            queries,
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }
}

#[async_trait]
impl AbiResolver for ClickHouseAbiResolver {
    async fn resolve_abis(
        &self,
        addresses: &[String],
    ) -> Result<HashMap<String, ContractAbiRecord>, SourceError> {
        let mut resolved = HashMap::new();
        if addresses.is_empty() {
            return Ok(resolved);
        }

        let sql = self.queries.format_contract_abi_query(addresses);
        let rows = tokio::time::timeout(
            self.timeout,
            self.client.query(&sql).fetch_all::<RawContractRow>(),
        )
        .await
        .map_err(|_| SourceError::Timeout {
            seconds: self.timeout.as_secs(),
        })?
        .map_err(|error| SourceError::Query(error.to_string()))?;

        for row in rows {
            let implementation_address = if row.implementation_address.is_empty() {
                None
            } else {
                Some(row.implementation_address)
            };
            let record = ContractAbiRecord {
                address: row.address.clone(),
                name: row.name,
                abi_json: row.abi,
                implementation_address,
            };
            // Logs at a proxy address decode with the implementation's ABI;
            // one parse serves both keys.
            if let Some(implementation) = &record.implementation_address {
                resolved.insert(implementation.clone(), record.clone());
            }
            resolved.insert(row.address, record);
        }

        tracing::debug!(
            requested = addresses.len(),
            resolved = resolved.len(),
            "batched ABI lookup"
        );
        Ok(resolved)
    }
}
