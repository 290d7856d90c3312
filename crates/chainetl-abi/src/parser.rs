//! ABI JSON parsing and canonical type derivation.
//!
//! The parser walks the top-level JSON array, keeps `"type": "event"` items,
//! and derives each event's canonical signature: tuples expand to
//! `(t1,t2,...)` (preserving any array suffix), the `uint`/`int`/`byte`
//! aliases resolve to their full widths, everything else passes through
//! verbatim.

use crate::error::AbiParseError;
use crate::model::{Abi, AbiEvent, AbiInput};
use crate::signature::event_topic0;
use serde_json::Value;

/// Parse a full ABI document into an [`Abi`].
pub fn parse_abi(json: &str) -> Result<Abi, AbiParseError> {
    let root: Value = serde_json::from_str(json)?;
    let items = root.as_array().ok_or(AbiParseError::NotArray)?;

    let mut abi = Abi::default();
    for item in items {
        let kind = item
            .get("type")
            .and_then(Value::as_str)
            .ok_or(AbiParseError::MissingField { field: "type" })?;
        if kind != "event" {
            continue;
        }
        abi.insert(parse_event(item)?);
    }
    Ok(abi)
}

fn parse_event(item: &Value) -> Result<AbiEvent, AbiParseError> {
    let name = item
        .get("name")
        .and_then(Value::as_str)
        .ok_or(AbiParseError::MissingField { field: "name" })?;
    let anonymous = item
        .get("anonymous")
        .and_then(Value::as_bool)
        .unwrap_or(false);
    let inputs: Vec<AbiInput> = match item.get("inputs") {
        Some(inputs) => serde_json::from_value(inputs.clone())?,
        None => Vec::new(),
    };

    let params: Vec<String> = inputs.iter().map(canonical_type).collect();
    let signature = format!("{}({})", name, params.join(","));
    let topic0 = event_topic0(&signature);

    Ok(AbiEvent {
        name: name.to_string(),
        inputs,
        anonymous,
        signature,
        topic0,
    })
}

/// Canonical type string for one input, as used in the signature hash.
pub fn canonical_type(input: &AbiInput) -> String {
    let decl = input.type_decl.as_str();
    if let Some(suffix) = decl.strip_prefix("tuple") {
        let inner: Vec<String> = input.components.iter().map(canonical_type).collect();
        return format!("({}){}", inner.join(","), suffix);
    }
    match decl {
        "uint" => "uint256".to_string(),
        "int" => "int256".to_string(),
        "byte" => "bytes1".to_string(),
        _ => decl.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ERC20_ABI: &str = r#"[
        {
            "type": "event",
            "name": "Transfer",
            "anonymous": false,
            "inputs": [
                {"name": "from", "type": "address", "indexed": true},
                {"name": "to", "type": "address", "indexed": true},
                {"name": "value", "type": "uint256", "indexed": false}
            ]
        },
        {
            "type": "function",
            "name": "transfer",
            "inputs": [
                {"name": "to", "type": "address"},
                {"name": "value", "type": "uint256"}
            ]
        }
    ]"#;

    #[test]
    fn keeps_only_events() {
        let abi = parse_abi(ERC20_ABI).unwrap();
        assert_eq!(abi.len(), 1);
        let event = &abi.events()[0];
        assert_eq!(event.name, "Transfer");
        assert_eq!(event.signature, "Transfer(address,address,uint256)");
        assert_eq!(
            event.topic0,
            "0xddf252ad1be2c89b69c2b068fc378daa952ba7f163c4a11628f55a4df523b3ef"
        );
    }

    #[test]
    fn signature_is_deterministic_across_reparse() {
        let first = parse_abi(ERC20_ABI).unwrap();
        let second = parse_abi(ERC20_ABI).unwrap();
        assert_eq!(first.events()[0].topic0, second.events()[0].topic0);
    }

    #[test]
    fn aliases_expand() {
        let json = r#"[{
            "type": "event",
            "name": "Odd",
            "inputs": [
                {"name": "a", "type": "uint"},
                {"name": "b", "type": "int"},
                {"name": "c", "type": "byte"}
            ]
        }]"#;
        let abi = parse_abi(json).unwrap();
        assert_eq!(abi.events()[0].signature, "Odd(uint256,int256,bytes1)");
    }

    #[test]
    fn tuple_expands_with_array_suffix() {
        let json = r#"[{
            "type": "event",
            "name": "Filled",
            "inputs": [{
                "name": "orders",
                "type": "tuple[]",
                "components": [
                    {"name": "maker", "type": "address"},
                    {"name": "amount", "type": "uint256"}
                ]
            }]
        }]"#;
        let abi = parse_abi(json).unwrap();
        assert_eq!(abi.events()[0].signature, "Filled((address,uint256)[])");
    }

    #[test]
    fn missing_name_is_an_error() {
        let json = r#"[{"type": "event", "inputs": []}]"#;
        assert!(matches!(
            parse_abi(json),
            Err(AbiParseError::MissingField { field: "name" })
        ));
    }

    #[test]
    fn missing_type_is_an_error() {
        let json = r#"[{"name": "Transfer"}]"#;
        assert!(matches!(
            parse_abi(json),
            Err(AbiParseError::MissingField { field: "type" })
        ));
    }

    #[test]
    fn malformed_json_is_an_error() {
        assert!(matches!(parse_abi("not json"), Err(AbiParseError::Json(_))));
        assert!(matches!(parse_abi("{}"), Err(AbiParseError::NotArray)));
    }
}
