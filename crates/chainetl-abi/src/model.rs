//! The in-memory ABI model: events, inputs, and the topic0 index.

use crate::error::AbiParseError;
use crate::signature::normalize_topic;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// One event parameter as declared in the ABI JSON.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AbiInput {
    /// Parameter name; may be empty in older ABIs.
    #[serde(default)]
    pub name: String,
    /// Declared type string, verbatim (`"uint256"`, `"tuple[2]"`, ...).
    #[serde(rename = "type")]
    pub type_decl: String,
    /// Whether the value is carried in a topic rather than in the data.
    #[serde(default)]
    pub indexed: bool,
    /// Tuple member declarations; non-empty iff `type_decl` starts with `tuple`.
    #[serde(default)]
    pub components: Vec<AbiInput>,
}

/// A parsed event with its derived canonical signature and topic0 hash.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AbiEvent {
    pub name: String,
    pub inputs: Vec<AbiInput>,
    pub anonymous: bool,
    /// Canonical signature string, e.g. `Transfer(address,address,uint256)`.
    pub signature: String,
    /// `0x`-prefixed keccak256 of `signature`; equals topic0 on the wire.
    pub topic0: String,
}

impl AbiEvent {
    /// Inputs carried in topics[1..], in declaration order.
    pub fn indexed_inputs(&self) -> impl Iterator<Item = &AbiInput> {
        self.inputs.iter().filter(|i| i.indexed)
    }

    /// Inputs carried in the data payload, in declaration order.
    pub fn data_inputs(&self) -> impl Iterator<Item = &AbiInput> {
        self.inputs.iter().filter(|i| !i.indexed)
    }
}

/// A contract's parsed ABI: the declared events plus a topic0 index.
///
/// Built once per contract, immutable afterwards, shared read-only between
/// decoder workers (wrap in `Arc`).
#[derive(Debug, Clone, Default)]
pub struct Abi {
    events: Vec<AbiEvent>,
    by_topic0: HashMap<String, usize>,
}

impl Abi {
    /// Parse an ABI from its JSON text. Only `"type": "event"` items are
    /// retained.
    pub fn parse_str(json: &str) -> Result<Self, AbiParseError> {
        crate::parser::parse_abi(json)
    }

    /// Parse an ABI from a JSON file on disk.
    pub fn parse_file(path: &Path) -> Result<Self, AbiParseError> {
        let json = std::fs::read_to_string(path)?;
        Self::parse_str(&json)
    }

    /// Look up an event by its topic0 value (prefix- and case-insensitive).
    pub fn event_by_topic0(&self, topic: &str) -> Option<&AbiEvent> {
        self.by_topic0
            .get(&normalize_topic(topic))
            .map(|&idx| &self.events[idx])
    }

    /// All declared events, in ABI order.
    pub fn events(&self) -> &[AbiEvent] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Add an event, indexing it by topic0. On a duplicate signature the
    /// latest entry wins; the anomaly is logged, not fatal.
    pub(crate) fn insert(&mut self, event: AbiEvent) {
        let key = normalize_topic(&event.topic0);
        if self.by_topic0.contains_key(&key) {
            tracing::warn!(
                signature = %event.signature,
                topic0 = %event.topic0,
                "duplicate event signature in ABI, keeping latest"
            );
        }
        self.events.push(event);
        self.by_topic0.insert(key, self.events.len() - 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transfer_event() -> AbiEvent {
        AbiEvent {
            name: "Transfer".into(),
            inputs: vec![],
            anonymous: false,
            signature: "Transfer(address,address,uint256)".into(),
            topic0: "0xddf252ad1be2c89b69c2b068fc378daa952ba7f163c4a11628f55a4df523b3ef"
                .into(),
        }
    }

    #[test]
    fn lookup_is_prefix_and_case_insensitive() {
        let mut abi = Abi::default();
        abi.insert(transfer_event());

        assert!(abi
            .event_by_topic0("ddf252ad1be2c89b69c2b068fc378daa952ba7f163c4a11628f55a4df523b3ef")
            .is_some());
        assert!(abi
            .event_by_topic0("0xDDF252AD1BE2C89B69C2B068FC378DAA952BA7F163C4A11628F55A4DF523B3EF")
            .is_some());
        assert!(abi.event_by_topic0("0xdeadbeef").is_none());
    }

    #[test]
    fn duplicate_signature_latest_wins() {
        let mut abi = Abi::default();
        abi.insert(transfer_event());
        let mut second = transfer_event();
        second.name = "TransferV2".into();
        abi.insert(second);

        assert_eq!(abi.len(), 2);
        let found = abi
            .event_by_topic0("0xddf252ad1be2c89b69c2b068fc378daa952ba7f163c4a11628f55a4df523b3ef")
            .unwrap();
        assert_eq!(found.name, "TransferV2");
    }
}
