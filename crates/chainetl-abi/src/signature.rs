//! Event signature hashing.
//!
//! topic0 of a non-anonymous EVM log is the keccak256 hash of the event's
//! canonical signature string, e.g.:
//!   keccak256("Transfer(address,address,uint256)")
//!   → 0xddf252ad1be2c89b69c2b068fc378daa952ba7f163c4a11628f55a4df523b3ef

use tiny_keccak::{Hasher, Keccak};

/// Keccak-256 (Ethereum padding variant) over arbitrary bytes.
pub fn keccak256(input: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak::v256();
    let mut output = [0u8; 32];
    hasher.update(input);
    hasher.finalize(&mut output);
    output
}

/// Hash a canonical signature string into its `0x`-prefixed topic0 value.
pub fn event_topic0(signature: &str) -> String {
    format!("0x{}", hex::encode(keccak256(signature.as_bytes())))
}

/// Normalise a topic for index lookup: lowercase, `0x`-prefixed.
pub fn normalize_topic(topic: &str) -> String {
    let stripped = crate::hexutil::strip_hex_prefix(topic);
    format!("0x{}", stripped.to_ascii_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn erc20_transfer_topic0() {
        assert_eq!(
            event_topic0("Transfer(address,address,uint256)"),
            "0xddf252ad1be2c89b69c2b068fc378daa952ba7f163c4a11628f55a4df523b3ef"
        );
    }

    #[test]
    fn uniswap_v3_swap_topic0() {
        assert_eq!(
            event_topic0("Swap(address,address,int256,int256,uint160,uint128,int24)"),
            "0xc42079f94a6350d7e6235f29174924f928cc2ac818eb64fed8004e115fbcca67"
        );
    }

    #[test]
    fn topic_normalisation() {
        assert_eq!(normalize_topic("0xABCDEF"), "0xabcdef");
        assert_eq!(normalize_topic("ABCDEF"), "0xabcdef");
    }
}
