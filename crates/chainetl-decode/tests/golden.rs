//! Golden decode tests over real-world event shapes.
//!
//! Each case builds a raw log from literal wire values, decodes it, and
//! asserts the exact field values a block explorer would show.

use chainetl_abi::Abi;
use chainetl_decode::{DecodedValue, DecoderOptions, LogDecoder, LogEntry};
use std::sync::Arc;

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
        "type": "event",
        "name": "Approval",
        "anonymous": false,
        "inputs": [
            {"name": "owner", "type": "address", "indexed": true},
            {"name": "spender", "type": "address", "indexed": true},
            {"name": "value", "type": "uint256", "indexed": false}
        ]
    }
]"#;

const UNISWAP_V3_ABI: &str = r#"[{
    "type": "event",
    "name": "Swap",
    "anonymous": false,
    "inputs": [
        {"name": "sender", "type": "address", "indexed": true},
        {"name": "recipient", "type": "address", "indexed": true},
        {"name": "amount0", "type": "int256", "indexed": false},
        {"name": "amount1", "type": "int256", "indexed": false},
        {"name": "sqrtPriceX96", "type": "uint160", "indexed": false},
        {"name": "liquidity", "type": "uint128", "indexed": false},
        {"name": "tick", "type": "int24", "indexed": false}
    ]
}]"#;

fn pad_address(addr: &str) -> String {
    format!("0x000000000000000000000000{}", addr.trim_start_matches("0x"))
}

fn word_hex(value: u64) -> String {
    format!("0x{:064x}", value)
}

#[test]
fn erc20_transfer_end_to_end() {
    let abi = Arc::new(Abi::parse_str(ERC20_ABI).unwrap());
    let decoder = LogDecoder::new(abi);

    let entry = LogEntry {
        topics: vec![
            "0xddf252ad1be2c89b69c2b068fc378daa952ba7f163c4a11628f55a4df523b3ef".into(),
            pad_address("0xa9d1e08c7793af67e9d92fe308d5697fb81d3e43"),
            pad_address("0x77696bb39917c91a0c3908d577d5e322095425ca"),
        ],
        data: word_hex(100_000),
    };

    let log = decoder.decode(&entry).unwrap();
    assert_eq!(log.event_name, "Transfer");
    assert_eq!(
        log.event_signature,
        "0xddf252ad1be2c89b69c2b068fc378daa952ba7f163c4a11628f55a4df523b3ef"
    );
    assert_eq!(log.signature, "Transfer(address,address,uint256)");

    let values: Vec<(&str, String)> = log
        .params
        .iter()
        .map(|p| (p.name.as_str(), p.value.to_string()))
        .collect();
    assert_eq!(
        values,
        vec![
            ("from", "0xa9d1e08c7793af67e9d92fe308d5697fb81d3e43".to_string()),
            ("to", "0x77696bb39917c91a0c3908d577d5e322095425ca".to_string()),
            ("value", "100000".to_string()),
        ]
    );
}

#[test]
fn uniswap_v3_swap_negative_amounts() {
    let abi = Arc::new(Abi::parse_str(UNISWAP_V3_ABI).unwrap());
    assert_eq!(
        abi.events()[0].topic0,
        "0xc42079f94a6350d7e6235f29174924f928cc2ac818eb64fed8004e115fbcca67"
    );
    let decoder = LogDecoder::new(Arc::clone(&abi));

    // amount0 = 500, amount1 = -500 (two's complement), sqrtPriceX96 = 1,
    // liquidity = 2, tick = -1
    let mut data = String::from("0x");
    data.push_str(&format!("{:064x}", 500));
    data.push_str(&format!("{}fe0c", "f".repeat(60))); // -500
    data.push_str(&format!("{:064x}", 1));
    data.push_str(&format!("{:064x}", 2));
    data.push_str(&"f".repeat(64)); // tick = -1

    let entry = LogEntry {
        topics: vec![
            abi.events()[0].topic0.clone(),
            pad_address("0xe592427a0aece92de3edee1f18e0157c05861564"),
            pad_address("0xa9d1e08c7793af67e9d92fe308d5697fb81d3e43"),
        ],
        data,
    };

    let log = decoder.decode(&entry).unwrap();
    assert_eq!(log.event_name, "Swap");
    assert_eq!(log.params.len(), 7);
    assert_eq!(log.params[2].value, DecodedValue::Dec("500".into()));
    assert_eq!(log.params[3].value, DecodedValue::Dec("-500".into()));
    assert_eq!(log.params[4].value, DecodedValue::Dec("1".into()));
    assert_eq!(log.params[5].value, DecodedValue::Dec("2".into()));
    assert_eq!(log.params[6].value, DecodedValue::Dec("-1".into()));
}

#[test]
fn approval_heuristic_without_abi() {
    let decoder = LogDecoder::new(Arc::new(Abi::default()));
    let entry = LogEntry {
        topics: vec![
            "0x8c5be1e5ebec7d5bd14f71427d1e84f3dd0314c0f7b2291e5b200ac8c7c3b925".into(),
            pad_address("0xa9d1e08c7793af67e9d92fe308d5697fb81d3e43"),
            pad_address("0xe592427a0aece92de3edee1f18e0157c05861564"),
        ],
        data: word_hex(7),
    };
    let log = decoder.decode(&entry).unwrap();
    assert_eq!(log.event_name, "Approval");
    assert_eq!(log.params[0].name, "owner");
    assert_eq!(log.params[1].name, "spender");
    assert_eq!(log.params[2].value, DecodedValue::Dec("7".into()));
}

#[test]
fn decode_rate_exposed_when_fallback_disabled() {
    let abi = Arc::new(Abi::parse_str(ERC20_ABI).unwrap());
    let strict = LogDecoder::with_options(
        Arc::clone(&abi),
        DecoderOptions {
            unknown_event_fallback: false,
            ..DecoderOptions::default()
        },
    );

    let unknown = LogEntry {
        topics: vec![format!("0x{}", "99".repeat(32))],
        data: "0x".into(),
    };
    assert!(strict.decode(&unknown).is_err());
}
