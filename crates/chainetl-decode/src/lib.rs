//! ABI-directed decoding of EVM event logs.
//!
//! Given a parsed [`chainetl_abi::Abi`] and a raw log (topics + data), the
//! [`log::LogDecoder`] reconstructs the event's high-level meaning: it
//! matches topic0 against the ABI index, decodes indexed parameters from
//! the topics and the rest from the ABI-encoded data payload, and re-merges
//! everything in declaration order.
//!
//! The value layer ([`decoder`]) implements the ABI head/tail binary
//! encoding: static values in a contiguous head, dynamic values in a tail
//! reached through byte offsets, recursively for arrays and tuples.
//!
//! Decode failures are row-scoped by design; a multi-hour backfill should
//! never halt because one contract emits garbage.

pub mod abitype;
pub mod decoder;
pub mod error;
pub mod log;
pub mod record;
pub mod value;

pub use abitype::AbiType;
pub use decoder::ValueDecoder;
pub use error::DecodeError;
pub use log::{DecodedLog, DecodedParam, DecoderOptions, LogDecoder, LogEntry};
pub use record::DecodedRecord;
pub use value::DecodedValue;
