//! Event-level decoding: topics vs data, parameter merge order, and the
//! unknown-event fallback.

use crate::abitype::AbiType;
use crate::decoder::ValueDecoder;
use crate::error::DecodeError;
use crate::value::DecodedValue;
use chainetl_abi::{hexutil, normalize_topic, Abi, AbiInput};
use std::sync::Arc;

/// ERC-20 `Transfer(address,address,uint256)`.
pub const TRANSFER_TOPIC0: &str =
    "0xddf252ad1be2c89b69c2b068fc378daa952ba7f163c4a11628f55a4df523b3ef";

/// ERC-20 `Approval(address,address,uint256)`.
pub const APPROVAL_TOPIC0: &str =
    "0x8c5be1e5ebec7d5bd14f71427d1e84f3dd0314c0f7b2291e5b200ac8c7c3b925";

/// A raw log as handed to the decoder: topics (empties filtered) plus the
/// hex data payload.
#[derive(Debug, Clone)]
pub struct LogEntry {
    pub topics: Vec<String>,
    pub data: String,
}

/// One decoded parameter.
#[derive(Debug, Clone)]
pub struct DecodedParam {
    pub name: String,
    /// Declared type string, verbatim from the ABI.
    pub type_decl: String,
    pub value: DecodedValue,
}

/// A decoded event.
#[derive(Debug, Clone)]
pub struct DecodedLog {
    pub event_name: String,
    /// topic0 — the keccak256 of the canonical signature.
    pub event_signature: String,
    /// Canonical signature string (`Transfer(address,address,uint256)`);
    /// empty for fallback records with no known shape.
    pub signature: String,
    /// Parameters in declaration order, indexed and non-indexed interleaved
    /// exactly as the ABI declares them.
    pub params: Vec<DecodedParam>,
}

/// Decoder behaviour switches.
#[derive(Debug, Clone)]
pub struct DecoderOptions {
    /// Emit best-effort records for events missing from the ABI. Disable to
    /// expose the true decode rate.
    pub unknown_event_fallback: bool,
    /// Reject strings that are not valid UTF-8 instead of lossy-decoding
    /// them.
    pub strict_utf8: bool,
}

impl Default for DecoderOptions {
    fn default() -> Self {
        Self {
            unknown_event_fallback: true,
            strict_utf8: false,
        }
    }
}

/// Decodes raw log entries against one contract's parsed ABI.
///
/// Cheap to construct; workers build one per contract group and share the
/// `Arc<Abi>` behind it.
pub struct LogDecoder {
    abi: Arc<Abi>,
    options: DecoderOptions,
    values: ValueDecoder,
}

impl LogDecoder {
    pub fn new(abi: Arc<Abi>) -> Self {
        Self::with_options(abi, DecoderOptions::default())
    }

    pub fn with_options(abi: Arc<Abi>, options: DecoderOptions) -> Self {
        let values = ValueDecoder::new(options.strict_utf8);
        Self {
            abi,
            options,
            values,
        }
    }

    /// Decode one log entry. topic0 selects the event; indexed parameters
    /// come from topics[1..] and the rest from the data payload, re-merged
    /// in declaration order.
    pub fn decode(&self, entry: &LogEntry) -> Result<DecodedLog, DecodeError> {
        let topic0 = entry.topics.first().ok_or(DecodeError::NoTopics)?;

        let Some(event) = self.abi.event_by_topic0(topic0) else {
            if self.options.unknown_event_fallback {
                return self.decode_unknown(entry, topic0);
            }
            return Err(DecodeError::UnknownEvent {
                topic0: topic0.clone(),
            });
        };

        let indexed: Vec<&AbiInput> = event.indexed_inputs().collect();
        let data_inputs: Vec<&AbiInput> = event.data_inputs().collect();

        let topic_params = self.decode_topics(&entry.topics[1..], &indexed)?;
        let data_params = self.decode_data(&entry.data, &data_inputs)?;

        let mut topic_iter = topic_params.into_iter();
        let mut data_iter = data_params.into_iter();
        let mut params = Vec::with_capacity(event.inputs.len());
        for input in &event.inputs {
            let param = if input.indexed {
                topic_iter.next()
            } else {
                data_iter.next()
            };
            params.push(param.ok_or_else(|| DecodeError::MissingTopic {
                name: input.name.clone(),
            })?);
        }

        Ok(DecodedLog {
            event_name: event.name.clone(),
            event_signature: event.topic0.clone(),
            signature: event.signature.clone(),
            params,
        })
    }

    fn decode_topics(
        &self,
        topics: &[String],
        inputs: &[&AbiInput],
    ) -> Result<Vec<DecodedParam>, DecodeError> {
        if topics.len() < inputs.len() {
            return Err(DecodeError::MissingTopic {
                name: inputs[topics.len()].name.clone(),
            });
        }
        inputs
            .iter()
            .zip(topics)
            .map(|(input, topic)| {
                Ok(DecodedParam {
                    name: input.name.clone(),
                    type_decl: input.type_decl.clone(),
                    value: self.decode_topic_value(input, topic)?,
                })
            })
            .collect()
    }

    /// Indexed reference types carry the keccak256 of the value; the
    /// plaintext is unrecoverable, so the raw 32-byte topic is returned
    /// as-is. Value types decode with the scalar rules.
    fn decode_topic_value(
        &self,
        input: &AbiInput,
        topic: &str,
    ) -> Result<DecodedValue, DecodeError> {
        let ty = AbiType::parse(&input.type_decl, &input.components)?;
        if ty.is_hashed_in_topic() {
            return Ok(DecodedValue::Str(normalize_topic(topic)));
        }
        let word = hexutil::hex_to_bytes(topic)?;
        self.values.decode_word(&ty, &word)
    }

    fn decode_data(
        &self,
        data: &str,
        inputs: &[&AbiInput],
    ) -> Result<Vec<DecodedParam>, DecodeError> {
        if inputs.is_empty() {
            return Ok(Vec::new());
        }
        let types = inputs
            .iter()
            .map(|input| AbiType::parse(&input.type_decl, &input.components))
            .collect::<Result<Vec<_>, _>>()?;
        let bytes = hexutil::hex_to_bytes(data)?;
        let values = self.values.decode_sequence(&types, &bytes)?;
        Ok(inputs
            .iter()
            .zip(values)
            .map(|(input, value)| DecodedParam {
                name: input.name.clone(),
                type_decl: input.type_decl.clone(),
                value,
            })
            .collect())
    }

    /// Best-effort record for a topic0 the ABI does not know. ERC-20
    /// `Transfer`/`Approval` get their well-known shapes; everything else is
    /// emitted as raw `bytes32` topics plus the data payload.
    fn decode_unknown(&self, entry: &LogEntry, topic0: &str) -> Result<DecodedLog, DecodeError> {
        let normalized = normalize_topic(topic0);
        let mut log = DecodedLog {
            event_name: "UnknownEvent".to_string(),
            event_signature: normalized.clone(),
            signature: String::new(),
            params: Vec::new(),
        };

        if normalized == TRANSFER_TOPIC0 {
            log.event_name = "Transfer".to_string();
            log.signature = "Transfer(address,address,uint256)".to_string();
            if entry.topics.len() >= 3 {
                log.params.push(self.heuristic_topic_param("from", &entry.topics[1])?);
                log.params.push(self.heuristic_topic_param("to", &entry.topics[2])?);
            }
            if let Some(param) = self.heuristic_value_param(&entry.data) {
                log.params.push(param);
            }
        } else if normalized == APPROVAL_TOPIC0 {
            log.event_name = "Approval".to_string();
            log.signature = "Approval(address,address,uint256)".to_string();
            if entry.topics.len() >= 3 {
                log.params.push(self.heuristic_topic_param("owner", &entry.topics[1])?);
                log.params.push(self.heuristic_topic_param("spender", &entry.topics[2])?);
            }
            if let Some(param) = self.heuristic_value_param(&entry.data) {
                log.params.push(param);
            }
        } else {
            for (i, topic) in entry.topics.iter().enumerate().skip(1) {
                log.params.push(DecodedParam {
                    name: format!("topic{i}"),
                    type_decl: "bytes32".to_string(),
                    value: DecodedValue::Str(normalize_topic(topic)),
                });
            }
            if has_payload(&entry.data) {
                log.params.push(DecodedParam {
                    name: "data".to_string(),
                    type_decl: "bytes".to_string(),
                    value: DecodedValue::Bytes(hexutil::hex_to_bytes(&entry.data)?),
                });
            }
        }

        Ok(log)
    }

    fn heuristic_topic_param(&self, name: &str, topic: &str) -> Result<DecodedParam, DecodeError> {
        let word = hexutil::hex_to_bytes(topic)?;
        Ok(DecodedParam {
            name: name.to_string(),
            type_decl: "address".to_string(),
            value: self.values.decode_word(&AbiType::Address, &word)?,
        })
    }

    /// `uint256` from the first data word; falls back to the raw bytes when
    /// the payload is too short to hold one.
    fn heuristic_value_param(&self, data: &str) -> Option<DecodedParam> {
        if !has_payload(data) {
            return None;
        }
        let bytes = hexutil::hex_to_bytes(data).ok()?;
        Some(match self.values.decode_static(&AbiType::Uint(256), &bytes, 0) {
            Ok(value) => DecodedParam {
                name: "value".to_string(),
                type_decl: "uint256".to_string(),
                value,
            },
            Err(_) => DecodedParam {
                name: "data".to_string(),
                type_decl: "bytes".to_string(),
                value: DecodedValue::Bytes(bytes),
            },
        })
    }
}

fn has_payload(data: &str) -> bool {
    !data.is_empty() && data != "0x"
}
