//! Serde helpers for arbitrary-precision integers.
//!
//! Values are written as decimal strings since they routinely exceed what JSON
//! numbers (and TOML integers) can hold. On input, decimal strings, `0x` hex
//! strings and plain integers are all accepted.
//!
//! ```ignore
//! #[serde(with = "protocol::serde_big")]
//! pub mass: BigInt,
//! ```

use std::fmt::{self, Display};
use std::marker::PhantomData;

use num_traits::{FromPrimitive, Num};
use serde::de::{self, SeqAccess, Visitor};
use serde::ser::SerializeSeq;
use serde::{Deserializer, Serializer};

use crate::ProtocolError;

/// Parse a decimal or `0x`-prefixed hexadecimal integer literal.
pub fn parse_int<T: Num>(raw: &str) -> Result<T, ProtocolError> {
    let trimmed = raw.trim();
    let (sign, digits) = match trimmed.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", trimmed),
    };
    let parsed = match digits
        .strip_prefix("0x")
        .or_else(|| digits.strip_prefix("0X"))
    {
        Some(hex) => T::from_str_radix(&format!("{sign}{hex}"), 16),
        None => T::from_str_radix(trimmed, 10),
    };
    parsed.map_err(|_| ProtocolError::InvalidInteger(raw.to_string()))
}

pub fn serialize<T: Display, S: Serializer>(value: &T, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(value)
}

pub fn deserialize<'de, T, D>(deserializer: D) -> Result<T, D::Error>
where
    T: Num + FromPrimitive,
    D: Deserializer<'de>,
{
    deserializer.deserialize_any(IntVisitor(PhantomData))
}

struct IntVisitor<T>(PhantomData<T>);

impl<'de, T: Num + FromPrimitive> Visitor<'de> for IntVisitor<T> {
    type Value = T;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("an integer or an integer string")
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<T, E> {
        T::from_u64(v).ok_or_else(|| E::custom(format!("{v} is out of range")))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<T, E> {
        T::from_i64(v).ok_or_else(|| E::custom(format!("{v} is out of range")))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<T, E> {
        parse_int(v).map_err(E::custom)
    }
}

/// Same as the parent module, for `Vec`s of big integers.
pub mod vec {
    use super::*;

    pub fn serialize<T: Display, S: Serializer>(
        values: &[T],
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(values.len()))?;
        for value in values {
            seq.serialize_element(&value.to_string())?;
        }
        seq.end()
    }

    pub fn deserialize<'de, T, D>(deserializer: D) -> Result<Vec<T>, D::Error>
    where
        T: Num + FromPrimitive,
        D: Deserializer<'de>,
    {
        deserializer.deserialize_seq(SeqVisitor(PhantomData))
    }

    pub(crate) struct SeqVisitor<T>(pub(crate) PhantomData<T>);

    struct Element<T>(T);

    impl<'de, T: Num + FromPrimitive> serde::Deserialize<'de> for Element<T> {
        fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
            super::deserialize(deserializer).map(Element)
        }
    }

    impl<'de, T: Num + FromPrimitive> Visitor<'de> for SeqVisitor<T> {
        type Value = Vec<T>;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("a list of integers or integer strings")
        }

        fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Vec<T>, A::Error> {
            let mut out = Vec::with_capacity(seq.size_hint().unwrap_or(0));
            while let Some(Element(value)) = seq.next_element()? {
                out.push(value);
            }
            Ok(out)
        }
    }
}
