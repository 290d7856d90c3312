//! SQL templates and session settings, overridable from a config directory.
//!
//! Templates use `{START_BLOCK}`, `{END_BLOCK}`, `{PAGE_SIZE}`, `{OFFSET}`,
//! and `{ADDRESS_LIST}` placeholders. A config directory may override any
//! of them individually:
//!
//! ```text
//! <dir>/config.json               page size, insert table
//! <dir>/log_stream.sql            raw log page query
//! <dir>/contract_abi.sql          batched ABI lookup
//! <dir>/clickhouse_settings.sql   one `SET key = value` per line
//! ```
//!
//! Anything missing keeps its built-in default.

use std::path::Path;

/// Default rows per source page.
pub const DEFAULT_PAGE_SIZE: u64 = 25_000;

const DEFAULT_LOG_STREAM_QUERY: &str = "\
SELECT transactionHash, blockNumber, address, data, logIndex,
       topic0, topic1, topic2, topic3
FROM logs
WHERE blockNumber >= {START_BLOCK} AND blockNumber <= {END_BLOCK}
  AND removed = 0
ORDER BY blockNumber, logIndex
LIMIT {PAGE_SIZE} OFFSET {OFFSET}";

const DEFAULT_CONTRACT_ABI_QUERY: &str = "\
SELECT ADDRESS, NAME, ABI, IMPLEMENTATION_ADDRESS
FROM decoded_contracts
WHERE (ADDRESS IN ({ADDRESS_LIST}) OR IMPLEMENTATION_ADDRESS IN ({ADDRESS_LIST}))
  AND ABI != '' AND ABI IS NOT NULL";

const DEFAULT_INSERT_TABLE: &str = "decoded_logs";

fn default_settings() -> Vec<(String, String)> {
    [
        ("async_insert", "1"),
        ("wait_for_async_insert", "0"),
        ("async_insert_threads", "4"),
        ("async_insert_max_data_size", "100000000"),
        ("max_insert_block_size", "100000"),
    ]
    .into_iter()
    .map(|(key, value)| (key.to_string(), value.to_string()))
    .collect()
}

/// The queries and session settings driving the warehouse adapters.
#[derive(Debug, Clone)]
pub struct QueryConfig {
    log_stream_query: String,
    contract_abi_query: String,
    insert_table: String,
    async_insert_settings: Vec<(String, String)>,
    page_size: u64,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            log_stream_query: DEFAULT_LOG_STREAM_QUERY.to_string(),
            contract_abi_query: DEFAULT_CONTRACT_ABI_QUERY.to_string(),
            insert_table: DEFAULT_INSERT_TABLE.to_string(),
            async_insert_settings: default_settings(),
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl QueryConfig {
    /// Load overrides from a config directory; every file is optional and
    /// anything missing keeps its default.
    pub fn load_from_dir(dir: &Path) -> Self {
        let mut config = Self::default();

        if let Ok(text) = std::fs::read_to_string(dir.join("config.json")) {
            match serde_json::from_str::<serde_json::Value>(&text) {
                Ok(json) => {
                    if let Some(size) = json
                        .get("pagination")
                        .and_then(|p| p.get("page_size"))
                        .and_then(|s| s.as_u64())
                    {
                        config.page_size = size;
                    }
                    if let Some(table) = json.get("insert_table").and_then(|t| t.as_str()) {
                        config.insert_table = table.to_string();
                    }
                }
                Err(error) => {
                    tracing::warn!(dir = %dir.display(), error = %error, "bad config.json, using defaults");
                }
            }
        }

        load_sql(dir, "log_stream.sql", &mut config.log_stream_query);
        load_sql(dir, "contract_abi.sql", &mut config.contract_abi_query);

        if let Ok(text) = std::fs::read_to_string(dir.join("clickhouse_settings.sql")) {
            config.async_insert_settings = parse_settings(&text);
        }

        tracing::info!(dir = %dir.display(), page_size = config.page_size, "loaded SQL config");
        config
    }

    pub fn page_size(&self) -> u64 {
        self.page_size
    }

    pub fn set_page_size(&mut self, page_size: u64) {
        self.page_size = page_size.max(1);
    }

    pub fn insert_table(&self) -> &str {
        &self.insert_table
    }

    pub fn async_insert_settings(&self) -> &[(String, String)] {
        &self.async_insert_settings
    }

    pub fn format_log_stream_query(
        &self,
        start_block: u64,
        end_block: u64,
        page_size: u64,
        offset: u64,
    ) -> String {
        self.log_stream_query
            .replace("{START_BLOCK}", &start_block.to_string())
            .replace("{END_BLOCK}", &end_block.to_string())
            .replace("{PAGE_SIZE}", &page_size.to_string())
            .replace("{OFFSET}", &offset.to_string())
    }

    /// Substitute the quoted, comma-separated address list.
    pub fn format_contract_abi_query(&self, addresses: &[String]) -> String {
        let list = addresses
            .iter()
            .map(|addr| format!("'{}'", addr.replace('\'', "''")))
            .collect::<Vec<_>>()
            .join(",");
        self.contract_abi_query.replace("{ADDRESS_LIST}", &list)
    }
}

fn load_sql(dir: &Path, name: &str, target: &mut String) {
    match std::fs::read_to_string(dir.join(name)) {
        Ok(text) => *target = text.trim_end().to_string(),
        Err(_) => {
            tracing::debug!(dir = %dir.display(), file = name, "no override, using default query")
        }
    }
}

/// Parse `SET key = value` lines; blanks and `--` comments are skipped.
fn parse_settings(text: &str) -> Vec<(String, String)> {
    text.lines()
        .filter_map(|line| {
            let line = line.trim();
            if line.is_empty() || line.starts_with('-') {
                return None;
            }
            let assignment = line.strip_prefix("SET ").unwrap_or(line);
            let (key, value) = assignment.split_once('=')?;
            Some((
                key.trim().to_string(),
                value.trim().trim_end_matches(';').trim().to_string(),
            ))
        })
        .collect()
}
