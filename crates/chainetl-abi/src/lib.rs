//! ABI model, canonical event signatures, and hex primitives.
//!
//! This crate is the bottom of the chainetl stack: it parses contract ABI
//! JSON into an immutable [`Abi`] indexed by topic0, derives canonical
//! event signatures (`Transfer(address,address,uint256)` and their
//! keccak256 hashes), and provides the hex/decimal string helpers the
//! decoder layers build on.
//!
//! ABIs are parsed once per contract and shared read-only afterwards;
//! nothing in this crate mutates an [`Abi`] after construction.

pub mod error;
pub mod hexutil;
pub mod model;
pub mod parser;
pub mod signature;

pub use error::{AbiParseError, HexError};
pub use model::{Abi, AbiEvent, AbiInput};
pub use signature::{event_topic0, keccak256, normalize_topic};
