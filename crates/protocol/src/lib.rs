//! Wire layer shared by the line engine and its tools.
//!
//! This crate contains:
//! - 32-byte word reading/writing for chain storage arrays
//! - The packed (time, entity id) collision-queue entry codec
//! - Entity ids and the reserved boundary-id namespace
//! - Chain table records and serde helpers for big integers

mod binary;
mod error;
pub mod ids;
pub mod packed;
pub mod records;
pub mod serde_big;

pub use binary::{to_word_bytes, WordReader, WordWriter, WORD_BYTES};
pub use error::ProtocolError;
pub use ids::EntityId;
pub use packed::PackedEntry;
pub use records::{
    EntityRecord, EntityType, GameConfigRecord, GameStateRecord, LineOffchainRecord, LineRecord,
    PlayerRecord, Snapshot, SyncProgressRecord, UsernameRecord,
};
