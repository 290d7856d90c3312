//! ABI resolution for a set of contract addresses.

use crate::error::SourceError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A contract's ABI row as stored in the warehouse.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContractAbiRecord {
    pub address: String,
    /// Display name, e.g. the verified contract name.
    pub name: String,
    /// Raw ABI JSON text; parsed once per contract group by a worker.
    pub abi_json: String,
    /// Proxy target. When set, logs emitted at `address` decode with the
    /// implementation's ABI, and both addresses map to this record.
    pub implementation_address: Option<String>,
}

/// Batched ABI lookup.
#[async_trait]
pub trait AbiResolver: Send + Sync {
    /// Resolve ABIs for the given addresses. The returned map is keyed by
    /// both proxy and implementation addresses where a proxy relationship
    /// exists. Unknown contracts are simply absent, never an error.
    async fn resolve_abis(
        &self,
        addresses: &[String],
    ) -> Result<HashMap<String, ContractAbiRecord>, SourceError>;
}
