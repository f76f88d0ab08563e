//! Engine error types.

use protocol::{EntityId, ProtocolError};
use thiserror::Error;

use crate::math::MathError;

/// Fatal failures of a forward pass or of decoding its input.
///
/// Stale collision-queue entries are not errors; they are dropped silently.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("entity {0} is referenced but not present on the line")]
    MissingEntity(EntityId),

    #[error(transparent)]
    Math(#[from] MathError),

    #[error("heap capacity must be greater than zero, got {0}")]
    InvalidHeapCapacity(usize),

    #[error("heap holds {len} values but its capacity is {capacity}")]
    HeapOverCapacity { len: usize, capacity: usize },

    #[error("no username for scored entity {0}")]
    MissingUsername(EntityId),

    #[error("entity {entity_id} is on line {line_id}, which has no line record")]
    UnknownLine { line_id: u32, entity_id: EntityId },

    #[error("invalid game config: {0}")]
    InvalidConfig(&'static str),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error("line {line_id} failed at iteration {iteration}: {source}")]
    LineFault {
        line_id: u32,
        iteration: u64,
        #[source]
        source: Box<EngineError>,
    },
}

impl EngineError {
    /// Attach the line and iteration a resolution failure happened at.
    pub fn at(self, line_id: u32, iteration: u64) -> Self {
        EngineError::LineFault {
            line_id,
            iteration,
            source: Box::new(self),
        }
    }
}

pub type Result<T, E = EngineError> = std::result::Result<T, E>;
