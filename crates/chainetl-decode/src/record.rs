//! The pipeline's output record.

use crate::log::{DecodedLog, DecodedParam};
use serde::Serialize;

/// One decoded log row, ready for a sink.
///
/// `transaction_hash`, `block_number`, `log_index`, and `contract_address`
/// are copied verbatim from the source row; the rest comes from the
/// decoder.
#[derive(Debug, Clone, Serialize)]
pub struct DecodedRecord {
    pub transaction_hash: String,
    pub block_number: u64,
    pub log_index: u64,
    pub contract_address: String,
    pub event_name: String,
    /// topic0 hash.
    pub event_signature: String,
    /// Canonical signature string `Name(t1,t2,...)`.
    pub signature: String,
    /// Ordered JSON object of decoded parameters, serialised to text.
    pub args: String,
}

impl DecodedRecord {
    /// Combine a source row's identity with a decoded event.
    pub fn from_log(
        transaction_hash: impl Into<String>,
        block_number: u64,
        log_index: u64,
        contract_address: impl Into<String>,
        log: DecodedLog,
    ) -> Self {
        let args = args_json(&log.params);
        Self {
            transaction_hash: transaction_hash.into(),
            block_number,
            log_index,
            contract_address: contract_address.into(),
            event_name: log.event_name,
            event_signature: log.event_signature,
            signature: log.signature,
            args,
        }
    }
}

/// Serialise decoded params into the `args` JSON object, keys in declared
/// order. Unnamed parameters get positional `param{i}` keys.
pub fn args_json(params: &[DecodedParam]) -> String {
    let mut map = serde_json::Map::new();
    for (i, param) in params.iter().enumerate() {
        let key = if param.name.is_empty() {
            format!("param{i}")
        } else {
            param.name.clone()
        };
        map.insert(key, param.value.to_json());
    }
    serde_json::Value::Object(map).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::DecodedValue;

    #[test]
    fn args_keep_declared_order() {
        let params = vec![
            DecodedParam {
                name: "zebra".into(),
                type_decl: "uint256".into(),
                value: DecodedValue::Dec("1".into()),
            },
            DecodedParam {
                name: "apple".into(),
                type_decl: "bool".into(),
                value: DecodedValue::Bool(true),
            },
        ];
        let json = args_json(&params);
        assert_eq!(json, r#"{"zebra":"1","apple":true}"#);
    }

    #[test]
    fn unnamed_params_get_positional_keys() {
        let params = vec![DecodedParam {
            name: String::new(),
            type_decl: "uint256".into(),
            value: DecodedValue::Dec("7".into()),
        }];
        assert_eq!(args_json(&params), r#"{"param0":"7"}"#);
    }
}
