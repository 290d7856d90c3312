//! Type-directed decoding of the ABI head/tail binary encoding.
//!
//! The buffer is treated as a sequence of 32-byte words. Static values live
//! in a contiguous head; dynamic values live in a tail, linked from the
//! head by byte offsets relative to the enclosing tuple or array body.
//! Every offset and length word is validated against the remaining buffer
//! before anything is sliced or allocated.

use crate::abitype::AbiType;
use crate::error::DecodeError;
use crate::value::DecodedValue;
use alloy_primitives::{I256, U256};

pub(crate) const WORD: usize = 32;

/// Decodes typed values out of ABI-encoded byte regions.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValueDecoder {
    strict_utf8: bool,
}

impl ValueDecoder {
    pub fn new(strict_utf8: bool) -> Self {
        Self { strict_utf8 }
    }

    /// Decode a sequence of values laid out head/tail over `region`.
    ///
    /// This is the top-level entry for event data (the non-indexed inputs
    /// form an implicit tuple) and the recursion point for nested tuples.
    pub fn decode_sequence(
        &self,
        types: &[AbiType],
        region: &[u8],
    ) -> Result<Vec<DecodedValue>, DecodeError> {
        enum Slot {
            Done(DecodedValue),
            Tail(usize),
        }

        let mut head = 0usize;
        let mut slots = Vec::with_capacity(types.len());
        for ty in types {
            if ty.is_dynamic() {
                let offset = usize_word(region, head)?;
                if offset > region.len() {
                    return Err(DecodeError::BadOffset {
                        offset,
                        available: region.len(),
                    });
                }
                slots.push(Slot::Tail(offset));
                head += WORD;
            } else {
                slots.push(Slot::Done(self.decode_static(ty, region, head)?));
                head += ty.static_size();
            }
        }

        slots
            .into_iter()
            .zip(types)
            .map(|(slot, ty)| match slot {
                Slot::Done(value) => Ok(value),
                Slot::Tail(offset) => self.decode_dynamic(ty, &region[offset..]),
            })
            .collect()
    }

    /// Decode a single 32-byte word as a scalar of the given type. Used for
    /// indexed topics.
    pub fn decode_word(&self, ty: &AbiType, word: &[u8]) -> Result<DecodedValue, DecodeError> {
        if word.len() != WORD {
            return Err(DecodeError::OutOfBounds {
                offset: 0,
                needed: WORD,
                available: word.len(),
            });
        }
        self.decode_static(ty, word, 0)
    }

    /// Decode a static value in place at `at`.
    pub(crate) fn decode_static(
        &self,
        ty: &AbiType,
        region: &[u8],
        at: usize,
    ) -> Result<DecodedValue, DecodeError> {
        match ty {
            AbiType::Address => {
                let word = word_at(region, at)?;
                Ok(DecodedValue::Str(format!("0x{}", hex::encode(&word[12..]))))
            }
            AbiType::Uint(_) => {
                let word = word_at(region, at)?;
                Ok(DecodedValue::Dec(U256::from_be_slice(word).to_string()))
            }
            AbiType::Int(_) => {
                let word = word_at(region, at)?;
                let mut be = [0u8; WORD];
                be.copy_from_slice(word);
                Ok(DecodedValue::Dec(I256::from_be_bytes(be).to_string()))
            }
            AbiType::Bool => {
                let word = word_at(region, at)?;
                Ok(DecodedValue::Bool(word.iter().any(|b| *b != 0)))
            }
            AbiType::FixedBytes(len) => {
                let word = word_at(region, at)?;
                Ok(DecodedValue::Bytes(word[..*len].to_vec()))
            }
            AbiType::FixedArray(elem, len) => {
                let mut items = Vec::with_capacity(*len);
                let mut cursor = at;
                for _ in 0..*len {
                    items.push(self.decode_static(elem, region, cursor)?);
                    cursor += elem.static_size();
                }
                Ok(DecodedValue::List(items))
            }
            AbiType::Tuple(members) => {
                let mut fields = Vec::with_capacity(members.len());
                let mut cursor = at;
                for (name, member) in members {
                    fields.push((name.clone(), self.decode_static(member, region, cursor)?));
                    cursor += member.static_size();
                }
                Ok(DecodedValue::Map(fields))
            }
            // Dynamic types never reach here; callers dispatch on
            // is_dynamic() first.
            AbiType::Bytes | AbiType::String | AbiType::Array(_) => {
                Err(DecodeError::UnsupportedType {
                    decl: format!("{ty:?} in static position"),
                })
            }
        }
    }

    /// Decode a dynamic value whose body starts at the beginning of `body`.
    fn decode_dynamic(&self, ty: &AbiType, body: &[u8]) -> Result<DecodedValue, DecodeError> {
        match ty {
            AbiType::Bytes => Ok(DecodedValue::Bytes(read_length_prefixed(body)?.to_vec())),
            AbiType::String => {
                let raw = read_length_prefixed(body)?;
                if self.strict_utf8 {
                    String::from_utf8(raw.to_vec())
                        .map(DecodedValue::Str)
                        .map_err(|_| DecodeError::InvalidUtf8)
                } else {
                    Ok(DecodedValue::Str(String::from_utf8_lossy(raw).into_owned()))
                }
            }
            AbiType::Array(elem) => {
                let len = usize_word(body, 0)?;
                self.decode_elements(elem, len, &body[WORD..])
            }
            AbiType::FixedArray(elem, len) => self.decode_elements(elem, *len, body),
            AbiType::Tuple(members) => {
                let types: Vec<AbiType> =
                    members.iter().map(|(_, member)| member.clone()).collect();
                let values = self.decode_sequence(&types, body)?;
                Ok(DecodedValue::Map(
                    members
                        .iter()
                        .map(|(name, _)| name.clone())
                        .zip(values)
                        .collect(),
                ))
            }
            _ => Err(DecodeError::UnsupportedType {
                decl: format!("{ty:?} in dynamic position"),
            }),
        }
    }

    /// Decode `len` packed elements from an array body. Dynamic elements sit
    /// behind offsets relative to the start of the body.
    fn decode_elements(
        &self,
        elem: &AbiType,
        len: usize,
        body: &[u8],
    ) -> Result<DecodedValue, DecodeError> {
        let slot = if elem.is_dynamic() {
            WORD
        } else {
            elem.static_size()
        };
        let head_bytes = len
            .checked_mul(slot)
            .ok_or(DecodeError::LengthOverflow {
                length: len as u64,
                available: body.len(),
            })?;
        if head_bytes > body.len() {
            return Err(DecodeError::LengthOverflow {
                length: len as u64,
                available: body.len(),
            });
        }

        let mut items = Vec::with_capacity(len);
        if elem.is_dynamic() {
            for i in 0..len {
                let offset = usize_word(body, i * WORD)?;
                if offset > body.len() {
                    return Err(DecodeError::BadOffset {
                        offset,
                        available: body.len(),
                    });
                }
                items.push(self.decode_dynamic(elem, &body[offset..])?);
            }
        } else {
            for i in 0..len {
                items.push(self.decode_static(elem, body, i * slot)?);
            }
        }
        Ok(DecodedValue::List(items))
    }
}

fn word_at(buf: &[u8], offset: usize) -> Result<&[u8], DecodeError> {
    let end = offset.checked_add(WORD).ok_or(DecodeError::OutOfBounds {
        offset,
        needed: WORD,
        available: buf.len(),
    })?;
    if end > buf.len() {
        return Err(DecodeError::OutOfBounds {
            offset,
            needed: WORD,
            available: buf.len(),
        });
    }
    Ok(&buf[offset..end])
}

/// Read a word that must fit in 64 bits (offsets and lengths). Anything
/// wider could not address a real buffer anyway.
fn usize_word(buf: &[u8], offset: usize) -> Result<usize, DecodeError> {
    let word = word_at(buf, offset)?;
    if word[..24].iter().any(|b| *b != 0) {
        return Err(DecodeError::WordOverflow { offset });
    }
    let mut be = [0u8; 8];
    be.copy_from_slice(&word[24..]);
    Ok(u64::from_be_bytes(be) as usize)
}

/// Length word followed by that many bytes; the padding past `len` in the
/// final word is never materialised.
fn read_length_prefixed(body: &[u8]) -> Result<&[u8], DecodeError> {
    let len = usize_word(body, 0)?;
    let available = body.len().saturating_sub(WORD);
    if len > available {
        return Err(DecodeError::LengthOverflow {
            length: len as u64,
            available,
        });
    }
    Ok(&body[WORD..WORD + len])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn word_with_tail(byte: u8) -> Vec<u8> {
        let mut word = vec![0u8; WORD];
        word[31] = byte;
        word
    }

    fn buf(words: &[Vec<u8>]) -> Vec<u8> {
        words.iter().flatten().copied().collect()
    }

    #[test]
    fn uint256_word() {
        let decoder = ValueDecoder::default();
        let mut word = vec![0u8; WORD];
        word[29..].copy_from_slice(&[0x01, 0x86, 0xa0]);
        assert_eq!(
            decoder.decode_word(&AbiType::Uint(256), &word).unwrap(),
            DecodedValue::Dec("100000".into())
        );
    }

    #[test]
    fn int256_negative_one() {
        let decoder = ValueDecoder::default();
        let word = vec![0xffu8; WORD];
        assert_eq!(
            decoder.decode_word(&AbiType::Int(256), &word).unwrap(),
            DecodedValue::Dec("-1".into())
        );
    }

    #[test]
    fn int256_positive() {
        let decoder = ValueDecoder::default();
        assert_eq!(
            decoder
                .decode_word(&AbiType::Int(256), &word_with_tail(42))
                .unwrap(),
            DecodedValue::Dec("42".into())
        );
    }

    #[test]
    fn bool_any_bit_set() {
        let decoder = ValueDecoder::default();
        assert_eq!(
            decoder
                .decode_word(&AbiType::Bool, &word_with_tail(1))
                .unwrap(),
            DecodedValue::Bool(true)
        );
        assert_eq!(
            decoder
                .decode_word(&AbiType::Bool, &word_with_tail(0))
                .unwrap(),
            DecodedValue::Bool(false)
        );
        // Nonstandard encoding: high bit set still reads as true.
        let mut word = vec![0u8; WORD];
        word[0] = 0x80;
        assert_eq!(
            decoder.decode_word(&AbiType::Bool, &word).unwrap(),
            DecodedValue::Bool(true)
        );
    }

    #[test]
    fn address_is_last_twenty_bytes() {
        let decoder = ValueDecoder::default();
        let mut word = vec![0u8; WORD];
        word[12..].copy_from_slice(&[0xab; 20]);
        assert_eq!(
            decoder.decode_word(&AbiType::Address, &word).unwrap(),
            DecodedValue::Str(format!("0x{}", "ab".repeat(20)))
        );
    }

    #[test]
    fn fixed_bytes_truncates_word() {
        let decoder = ValueDecoder::default();
        let mut word = vec![0u8; WORD];
        word[0] = 0xde;
        word[1] = 0xad;
        assert_eq!(
            decoder.decode_word(&AbiType::FixedBytes(2), &word).unwrap(),
            DecodedValue::Bytes(vec![0xde, 0xad])
        );
    }

    #[test]
    fn dynamic_bytes_discards_padding() {
        let decoder = ValueDecoder::default();
        // offset(32) | len(3) | "abc" + 29 bytes padding
        let mut data_word = vec![0u8; WORD];
        data_word[..3].copy_from_slice(b"abc");
        let region = buf(&[word_with_tail(32), word_with_tail(3), data_word]);
        let values = decoder
            .decode_sequence(&[AbiType::Bytes], &region)
            .unwrap();
        assert_eq!(values, vec![DecodedValue::Bytes(b"abc".to_vec())]);
    }

    #[test]
    fn string_spanning_two_words() {
        let decoder = ValueDecoder::default();
        let text = b"hello world, hello world, hello world!!!"; // 40 bytes
        let mut data = Vec::new();
        data.extend_from_slice(text);
        data.resize(64, 0);
        let mut region = buf(&[word_with_tail(32), word_with_tail(text.len() as u8)]);
        region.extend_from_slice(&data);
        let values = decoder
            .decode_sequence(&[AbiType::String], &region)
            .unwrap();
        assert_eq!(
            values,
            vec![DecodedValue::Str(String::from_utf8_lossy(text).into_owned())]
        );
    }

    #[test]
    fn strict_utf8_rejects_invalid() {
        let strict = ValueDecoder::new(true);
        let lenient = ValueDecoder::default();
        let mut data_word = vec![0u8; WORD];
        data_word[..2].copy_from_slice(&[0xff, 0xfe]);
        let region = buf(&[word_with_tail(32), word_with_tail(2), data_word]);

        assert!(matches!(
            strict.decode_sequence(&[AbiType::String], &region),
            Err(DecodeError::InvalidUtf8)
        ));
        assert!(lenient.decode_sequence(&[AbiType::String], &region).is_ok());
    }

    #[test]
    fn static_then_dynamic_head_tail() {
        let decoder = ValueDecoder::default();
        // (uint256 = 7, string = "hi")
        // head: 7 | offset 64; tail: len 2 | "hi" padded
        let mut text_word = vec![0u8; WORD];
        text_word[..2].copy_from_slice(b"hi");
        let region = buf(&[
            word_with_tail(7),
            word_with_tail(64),
            word_with_tail(2),
            text_word,
        ]);
        let values = decoder
            .decode_sequence(&[AbiType::Uint(256), AbiType::String], &region)
            .unwrap();
        assert_eq!(
            values,
            vec![
                DecodedValue::Dec("7".into()),
                DecodedValue::Str("hi".into())
            ]
        );
    }

    #[test]
    fn dynamic_array_of_uints() {
        let decoder = ValueDecoder::default();
        // offset 32 | len 2 | 10 | 20
        let region = buf(&[
            word_with_tail(32),
            word_with_tail(2),
            word_with_tail(10),
            word_with_tail(20),
        ]);
        let values = decoder
            .decode_sequence(&[AbiType::Array(Box::new(AbiType::Uint(256)))], &region)
            .unwrap();
        assert_eq!(
            values,
            vec![DecodedValue::List(vec![
                DecodedValue::Dec("10".into()),
                DecodedValue::Dec("20".into())
            ])]
        );
    }

    #[test]
    fn fixed_array_is_inline() {
        let decoder = ValueDecoder::default();
        // uint256[2] in place, no offset word
        let region = buf(&[word_with_tail(1), word_with_tail(2)]);
        let values = decoder
            .decode_sequence(
                &[AbiType::FixedArray(Box::new(AbiType::Uint(256)), 2)],
                &region,
            )
            .unwrap();
        assert_eq!(
            values,
            vec![DecodedValue::List(vec![
                DecodedValue::Dec("1".into()),
                DecodedValue::Dec("2".into())
            ])]
        );
    }

    #[test]
    fn array_of_strings_offsets_relative_to_body() {
        let decoder = ValueDecoder::default();
        // string[] = ["ab", "c"]
        // outer offset 32 | len 2 | elem offsets 64, 128 (relative to body)
        // | len 2 "ab" pad | len 1 "c" pad
        let mut ab = vec![0u8; WORD];
        ab[..2].copy_from_slice(b"ab");
        let mut c = vec![0u8; WORD];
        c[..1].copy_from_slice(b"c");
        let region = buf(&[
            word_with_tail(32),
            word_with_tail(2),
            word_with_tail(64),
            word_with_tail(128),
            word_with_tail(2),
            ab,
            word_with_tail(1),
            c,
        ]);
        let values = decoder
            .decode_sequence(&[AbiType::Array(Box::new(AbiType::String))], &region)
            .unwrap();
        assert_eq!(
            values,
            vec![DecodedValue::List(vec![
                DecodedValue::Str("ab".into()),
                DecodedValue::Str("c".into())
            ])]
        );
    }

    #[test]
    fn static_tuple_decodes_in_place() {
        let decoder = ValueDecoder::default();
        let tuple = AbiType::Tuple(vec![
            ("flag".into(), AbiType::Bool),
            ("count".into(), AbiType::Uint(256)),
        ]);
        let region = buf(&[word_with_tail(1), word_with_tail(9)]);
        let values = decoder.decode_sequence(&[tuple], &region).unwrap();
        assert_eq!(
            values,
            vec![DecodedValue::Map(vec![
                ("flag".into(), DecodedValue::Bool(true)),
                ("count".into(), DecodedValue::Dec("9".into()))
            ])]
        );
    }

    #[test]
    fn insufficient_data_is_an_error() {
        let decoder = ValueDecoder::default();
        assert!(matches!(
            decoder.decode_sequence(&[AbiType::Uint(256)], &[0u8; 16]),
            Err(DecodeError::OutOfBounds { .. })
        ));
    }

    #[test]
    fn length_word_beyond_buffer_is_an_error() {
        let decoder = ValueDecoder::default();
        // offset 32 | len 1000 with no data behind it
        let region = buf(&[word_with_tail(32), word_with_tail(250)]);
        assert!(matches!(
            decoder.decode_sequence(&[AbiType::Bytes], &region),
            Err(DecodeError::LengthOverflow { .. })
        ));
    }

    #[test]
    fn offset_beyond_buffer_is_an_error() {
        let decoder = ValueDecoder::default();
        let mut offset_word = vec![0u8; WORD];
        offset_word[30] = 0x01; // offset 256 into a 32-byte region
        assert!(matches!(
            decoder.decode_sequence(&[AbiType::Bytes], &offset_word),
            Err(DecodeError::BadOffset { .. })
        ));
    }

    #[test]
    fn giant_length_word_is_an_error() {
        let decoder = ValueDecoder::default();
        let region = buf(&[word_with_tail(32), vec![0xffu8; WORD]]);
        assert!(matches!(
            decoder.decode_sequence(&[AbiType::Bytes], &region),
            Err(DecodeError::WordOverflow { .. })
        ));
    }
}
