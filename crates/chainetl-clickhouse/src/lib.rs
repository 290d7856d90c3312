//! ClickHouse adapters for the chainetl pipeline.
//!
//! Three thin shims over the warehouse: a paged [`source::ClickHouseLogSource`],
//! a batched [`resolver::ClickHouseAbiResolver`], and a
//! [`writer::ClickHouseWriter`] sink that lands decoded rows back in a
//! warehouse table through async inserts. All SQL is templated and
//! overridable from a config directory ([`query_config::QueryConfig`]).

pub mod config;
pub mod query_config;
pub mod resolver;
pub mod source;
pub mod writer;

pub use config::ClickHouseConfig;
pub use query_config::QueryConfig;
pub use resolver::ClickHouseAbiResolver;
pub use source::ClickHouseLogSource;
pub use writer::ClickHouseWriter;
