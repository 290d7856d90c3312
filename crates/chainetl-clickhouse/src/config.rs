//! ClickHouse connection settings.

use serde::{Deserialize, Serialize};

/// Connection parameters for the warehouse (HTTP interface).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClickHouseConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub database: String,
    /// Per-operation timeout in seconds, applied around every query and
    /// insert.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    30
}

impl ClickHouseConfig {
    pub fn url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }

    /// Build a client for this configuration. Clients are cheap handles
    /// over a shared connection pool; clone freely.
    pub fn client(&self) -> clickhouse::Client {
        clickhouse::Client::default()
            .with_url(self.url())
            .with_user(self.user.as_str())
            .with_password(self.password.as_str())
            .with_database(self.database.as_str())
    }

    /// Redacted connection summary for logs.
    pub fn connection_info(&self) -> String {
        format!(
            "{}@{}:{}/{}",
            self.user, self.host, self.port, self.database
        )
    }
}
