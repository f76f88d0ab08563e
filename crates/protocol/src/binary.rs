//! Reading and writing of 32-byte words.
//!
//! Chain storage packs every dynamic array element into one big-endian
//! `uint256`. Collision queues in particular arrive as a run of such words.

use bytes::{Buf, BufMut, Bytes, BytesMut};
use num_bigint::BigUint;

use crate::ProtocolError;

/// Size of one storage word in bytes.
pub const WORD_BYTES: usize = 32;

/// A reader over a buffer of big-endian 32-byte words.
#[derive(Debug)]
pub struct WordReader {
    buf: Bytes,
}

impl WordReader {
    /// Create a new reader from raw bytes.
    pub fn new(data: impl Into<Bytes>) -> Self {
        Self { buf: data.into() }
    }

    /// Returns remaining bytes.
    #[inline]
    pub fn remaining(&self) -> usize {
        self.buf.remaining()
    }

    /// Returns the number of whole words left.
    #[inline]
    pub fn remaining_words(&self) -> usize {
        self.buf.remaining() / WORD_BYTES
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        !self.buf.has_remaining()
    }

    /// Read one word as an unsigned integer.
    pub fn get_word(&mut self) -> Result<BigUint, ProtocolError> {
        if self.buf.remaining() < WORD_BYTES {
            return Err(ProtocolError::UnexpectedEof {
                needed: WORD_BYTES,
                remaining: self.buf.remaining(),
            });
        }
        let word = self.buf.copy_to_bytes(WORD_BYTES);
        Ok(BigUint::from_bytes_be(&word))
    }

    /// Safe version that returns None if a whole word is not available.
    #[inline]
    pub fn try_get_word(&mut self) -> Option<BigUint> {
        self.get_word().ok()
    }

    /// Read every remaining word. The buffer must hold a whole number of words.
    pub fn get_all_words(&mut self) -> Result<Vec<BigUint>, ProtocolError> {
        let trailing = self.buf.remaining() % WORD_BYTES;
        if trailing != 0 {
            return Err(ProtocolError::TrailingBytes(trailing));
        }
        let mut words = Vec::with_capacity(self.remaining_words());
        while !self.is_empty() {
            words.push(self.get_word()?);
        }
        Ok(words)
    }
}

/// A writer producing big-endian 32-byte words.
#[derive(Debug, Default)]
pub struct WordWriter {
    buf: BytesMut,
}

impl WordWriter {
    /// Create a new writer with room for 16 words.
    pub fn new() -> Self {
        Self::with_capacity(16)
    }

    /// Create a new writer with room for `words` words.
    pub fn with_capacity(words: usize) -> Self {
        Self {
            buf: BytesMut::with_capacity(words * WORD_BYTES),
        }
    }

    /// Returns the current length in bytes.
    #[inline]
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Write one word, left-padded with zeros.
    pub fn put_word(&mut self, value: &BigUint) -> Result<(), ProtocolError> {
        let bytes = value.to_bytes_be();
        if value.bits() > 256 {
            return Err(ProtocolError::ValueOutOfRange {
                value: value.to_string(),
                bits: 256,
            });
        }
        self.buf.put_bytes(0, WORD_BYTES - bytes.len());
        self.buf.put_slice(&bytes);
        Ok(())
    }

    /// Consume the writer and return the built buffer.
    pub fn finish(self) -> Bytes {
        self.buf.freeze()
    }

    /// Get current buffer as a slice.
    pub fn as_slice(&self) -> &[u8] {
        &self.buf
    }
}

/// Left-pad `value` to a single 32-byte big-endian word.
pub fn to_word_bytes(value: &BigUint) -> Result<[u8; WORD_BYTES], ProtocolError> {
    let mut writer = WordWriter::with_capacity(1);
    writer.put_word(value)?;
    let mut word = [0u8; WORD_BYTES];
    word.copy_from_slice(writer.as_slice());
    Ok(word)
}
