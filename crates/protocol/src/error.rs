//! Protocol error types.

use thiserror::Error;

/// Errors that can occur while decoding chain data.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("Unexpected end of data: needed {needed} bytes, {remaining} remaining")]
    UnexpectedEof { needed: usize, remaining: usize },

    #[error("Trailing {0} bytes do not form a whole 32-byte word")]
    TrailingBytes(usize),

    #[error("Value {value} does not fit in {bits} bits")]
    ValueOutOfRange { value: String, bits: u32 },

    #[error("Invalid integer literal: {0:?}")]
    InvalidInteger(String),

    #[error("Unknown entity type tag: {0}")]
    UnknownEntityType(u8),
}
