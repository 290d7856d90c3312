//! The decoder's view of an ABI type.
//!
//! Declared type strings are parsed at decode time, not at ABI-parse time:
//! an exotic type in one event is a row-level decode error and never poisons
//! the rest of the contract's ABI.

use crate::error::DecodeError;
use chainetl_abi::AbiInput;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AbiType {
    Address,
    /// Width in bits, 8..=256 in steps of 8.
    Uint(usize),
    Int(usize),
    Bool,
    /// Length in bytes, 1..=32.
    FixedBytes(usize),
    Bytes,
    String,
    /// `T[]`
    Array(Box<AbiType>),
    /// `T[N]`
    FixedArray(Box<AbiType>, usize),
    /// Tuple members in declaration order, with their field names.
    Tuple(Vec<(String, AbiType)>),
}

impl AbiType {
    /// Parse a declared type string, using `components` for tuple members.
    pub fn parse(decl: &str, components: &[AbiInput]) -> Result<Self, DecodeError> {
        // Array suffixes bind outermost-last: `uint8[2][]` is a dynamic
        // array of `uint8[2]`.
        if decl.ends_with(']') {
            if let Some(open) = decl.rfind('[') {
                let elem = Box::new(Self::parse(&decl[..open], components)?);
                let len_str = &decl[open + 1..decl.len() - 1];
                if len_str.is_empty() {
                    return Ok(AbiType::Array(elem));
                }
                let len: usize = len_str
                    .parse()
                    .map_err(|_| DecodeError::UnsupportedType {
                        decl: decl.to_string(),
                    })?;
                return Ok(AbiType::FixedArray(elem, len));
            }
        }

        match decl {
            "address" => return Ok(AbiType::Address),
            "bool" => return Ok(AbiType::Bool),
            "string" => return Ok(AbiType::String),
            "bytes" => return Ok(AbiType::Bytes),
            "uint" => return Ok(AbiType::Uint(256)),
            "int" => return Ok(AbiType::Int(256)),
            "byte" => return Ok(AbiType::FixedBytes(1)),
            "tuple" => {
                let members = components
                    .iter()
                    .map(|c| {
                        Ok((c.name.clone(), Self::parse(&c.type_decl, &c.components)?))
                    })
                    .collect::<Result<Vec<_>, DecodeError>>()?;
                return Ok(AbiType::Tuple(members));
            }
            _ => {}
        }

        if let Some(bits) = decl.strip_prefix("uint") {
            let bits = parse_width(bits, decl, 256, 8)?;
            return Ok(AbiType::Uint(bits));
        }
        if let Some(bits) = decl.strip_prefix("int") {
            let bits = parse_width(bits, decl, 256, 8)?;
            return Ok(AbiType::Int(bits));
        }
        if let Some(len) = decl.strip_prefix("bytes") {
            let len = parse_width(len, decl, 32, 1)?;
            return Ok(AbiType::FixedBytes(len));
        }

        Err(DecodeError::UnsupportedType {
            decl: decl.to_string(),
        })
    }

    /// A type is dynamic when its encoded size depends on the value.
    pub fn is_dynamic(&self) -> bool {
        match self {
            AbiType::Bytes | AbiType::String | AbiType::Array(_) => true,
            AbiType::FixedArray(elem, _) => elem.is_dynamic(),
            AbiType::Tuple(members) => members.iter().any(|(_, ty)| ty.is_dynamic()),
            _ => false,
        }
    }

    /// Indexed parameters of reference types are stored as the keccak256 of
    /// their encoded value; the original value is unrecoverable from the
    /// topic.
    pub fn is_hashed_in_topic(&self) -> bool {
        matches!(
            self,
            AbiType::Bytes
                | AbiType::String
                | AbiType::Array(_)
                | AbiType::FixedArray(..)
                | AbiType::Tuple(_)
        )
    }

    /// Encoded size in bytes of a static value. Callers check
    /// [`AbiType::is_dynamic`] first; dynamic types occupy one offset word
    /// in the head instead.
    pub fn static_size(&self) -> usize {
        match self {
            AbiType::FixedArray(elem, len) => elem.static_size() * len,
            AbiType::Tuple(members) => members.iter().map(|(_, ty)| ty.static_size()).sum(),
            _ => 32,
        }
    }
}

fn parse_width(s: &str, decl: &str, max: usize, step: usize) -> Result<usize, DecodeError> {
    let unsupported = || DecodeError::UnsupportedType {
        decl: decl.to_string(),
    };
    let n: usize = s.parse().map_err(|_| unsupported())?;
    if n == 0 || n > max || n % step != 0 {
        return Err(unsupported());
    }
    Ok(n)
}
