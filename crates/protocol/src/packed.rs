//! Packed collision-queue entries.
//!
//! One `uint256` per entry: the high 96 bits hold the collision time, the low
//! 160 bits the id of the right-hand entity of the pair.

use bytes::Bytes;
use num_bigint::{BigInt, BigUint};

use crate::binary::{WordReader, WordWriter};
use crate::ids::{EntityId, UINT160_MAX, UINT96_MAX};
use crate::ProtocolError;

/// A decoded queue entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackedEntry {
    /// Collision time (WAD seconds).
    pub time: BigInt,
    pub entity_id: EntityId,
}

impl PackedEntry {
    pub fn new(time: BigInt, entity_id: EntityId) -> Self {
        Self { time, entity_id }
    }

    /// Split a packed word into its time and id halves.
    pub fn unpack(word: &BigUint) -> Self {
        Self {
            time: BigInt::from(word >> 160u32),
            entity_id: EntityId::new(word & &*UINT160_MAX),
        }
    }

    /// Pack into a single word. Fails if either half exceeds its width.
    pub fn pack(&self) -> Result<BigUint, ProtocolError> {
        let time = match self.time.to_biguint() {
            Some(time) if time <= *UINT96_MAX => time,
            _ => {
                return Err(ProtocolError::ValueOutOfRange {
                    value: self.time.to_string(),
                    bits: 96,
                });
            }
        };
        if self.entity_id.as_biguint() > &*UINT160_MAX {
            return Err(ProtocolError::ValueOutOfRange {
                value: self.entity_id.as_biguint().to_string(),
                bits: 160,
            });
        }
        Ok((time << 160u32) | self.entity_id.as_biguint())
    }
}

/// Decode a run of raw 32-byte big-endian words into packed queue words.
pub fn decode_packed_words(data: impl Into<Bytes>) -> Result<Vec<BigUint>, ProtocolError> {
    WordReader::new(data).get_all_words()
}

/// Encode packed queue words as raw 32-byte big-endian words.
pub fn encode_packed_words(words: &[BigUint]) -> Result<Bytes, ProtocolError> {
    let mut writer = WordWriter::with_capacity(words.len());
    for word in words {
        writer.put_word(word)?;
    }
    Ok(writer.finish())
}

/// Serde adapter for a line's packed queue.
///
/// Reads either a list of words (decimal or `0x` strings, or plain integers)
/// or a single `0x` hex string holding the raw concatenated 32-byte words as
/// stored on chain. Always writes the list form.
pub mod words {
    use std::fmt;
    use std::marker::PhantomData;

    use num_bigint::BigUint;
    use serde::de::{self, SeqAccess, Visitor};
    use serde::{Deserializer, Serializer};

    use super::decode_packed_words;
    use crate::serde_big;

    pub fn serialize<S: Serializer>(words: &[BigUint], serializer: S) -> Result<S::Ok, S::Error> {
        serde_big::vec::serialize(words, serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<BigUint>, D::Error> {
        deserializer.deserialize_any(WordsVisitor)
    }

    struct WordsVisitor;

    impl<'de> Visitor<'de> for WordsVisitor {
        type Value = Vec<BigUint>;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("a list of packed words or a hex string of raw 32-byte words")
        }

        fn visit_seq<A: SeqAccess<'de>>(self, seq: A) -> Result<Vec<BigUint>, A::Error> {
            serde_big::vec::SeqVisitor(PhantomData).visit_seq(seq)
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<Vec<BigUint>, E> {
            let digits = v.strip_prefix("0x").unwrap_or(v);
            let raw = hex::decode(digits).map_err(E::custom)?;
            self.visit_byte_buf(raw)
        }

        fn visit_bytes<E: de::Error>(self, v: &[u8]) -> Result<Vec<BigUint>, E> {
            self.visit_byte_buf(v.to_vec())
        }

        fn visit_byte_buf<E: de::Error>(self, v: Vec<u8>) -> Result<Vec<BigUint>, E> {
            decode_packed_words(v).map_err(E::custom)
        }
    }
}

/// Mask a signed value to its low `bits` bits, as the contract does before
/// hashing. Negative inputs are taken in two's complement.
pub fn mask_low_bits(value: &BigInt, bits: u32) -> BigUint {
    let modulus = BigInt::from(1u8) << bits;
    let masked = ((value % &modulus) + &modulus) % &modulus;
    masked.to_biguint().unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unpack_splits_high_and_low_halves() {
        let time = BigUint::from(1_700_000_000_000_000_000_000u128);
        let id = BigUint::from(0xABCDEFu32);
        let word = (&time << 160u32) | &id;

        let entry = PackedEntry::unpack(&word);
        assert_eq!(entry.time, BigInt::from(time));
        assert_eq!(entry.entity_id, EntityId::new(id));
        assert_eq!(entry.pack().unwrap(), word);
    }

    #[test]
    fn test_boundary_ids_survive_packing() {
        let entry = PackedEntry::new(BigInt::from(5), EntityId::rightmost(9));
        let word = entry.pack().unwrap();
        assert_eq!(PackedEntry::unpack(&word), entry);
    }

    #[test]
    fn test_negative_time_cannot_be_packed() {
        let entry = PackedEntry::new(BigInt::from(-1), EntityId::from(1));
        assert!(matches!(
            entry.pack(),
            Err(ProtocolError::ValueOutOfRange { bits: 96, .. })
        ));
    }

    #[test]
    fn test_raw_words_decode() {
        let words = vec![BigUint::from(1u8) << 200u32, BigUint::from(77u8)];
        let raw = encode_packed_words(&words).unwrap();
        assert_eq!(raw.len(), 64);
        assert_eq!(decode_packed_words(raw).unwrap(), words);
    }

    #[derive(Debug, serde::Deserialize)]
    struct Queue {
        #[serde(with = "words")]
        words: Vec<BigUint>,
    }

    #[test]
    fn test_words_accept_raw_hex_blob() {
        let words = vec![BigUint::from(3u8) << 160u32, BigUint::from(9u8)];
        let raw = encode_packed_words(&words).unwrap();
        let json = format!(r#"{{"words": "0x{}"}}"#, hex::encode(&raw));

        let queue: Queue = serde_json::from_str(&json).unwrap();
        assert_eq!(queue.words, words);

        let listed: Queue = serde_json::from_str(r#"{"words": ["0x3", 9]}"#).unwrap();
        assert_eq!(listed.words, vec![BigUint::from(3u8), BigUint::from(9u8)]);
    }

    #[test]
    fn test_words_reject_partial_word() {
        let json = format!(r#"{{"words": "0x{}"}}"#, "ab".repeat(40));
        let err = serde_json::from_str::<Queue>(&json).unwrap_err();
        assert!(err.to_string().contains("Trailing 8 bytes"));
        assert!(serde_json::from_str::<Queue>(r#"{"words": "0xzz"}"#).is_err());
    }

    #[test]
    fn test_mask_low_bits() {
        assert_eq!(mask_low_bits(&BigInt::from(0x1_0000_0005u64), 32), BigUint::from(5u8));
        assert_eq!(mask_low_bits(&BigInt::from(-1), 8), BigUint::from(0xFFu8));
    }
}
