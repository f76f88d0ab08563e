//! Deterministic collision engine for one-dimensional lines.
//!
//! Replays the on-chain resolution rules locally so a client can forward the
//! last synced snapshot to the current time between chain updates.

pub mod collision_queue;
pub mod config;
pub mod entity;
pub mod error;
pub mod events;
pub mod forward;
pub mod leaderboard;
pub mod line;
pub mod math;
pub mod score_heap;
pub mod simulator;
pub mod spawn_point;
pub mod spawner;
pub mod state;
pub mod sync;

// Re-export commonly used types
pub use collision_queue::{CollisionQueue, QueueEntry};
pub use config::{Config, DebugConfig, GameConfig};
pub use entity::{Entity, EntityId, EntityType};
pub use error::{EngineError, Result};
pub use events::ResolutionEvent;
pub use forward::{forward_state_to, ForwardOptions, Forwarded};
pub use line::{Line, LineState};
pub use math::{MathError, Wad};
pub use score_heap::BoundedScoreHeap;
pub use state::{GameState, LiveState};
pub use sync::{decode_snapshot, reconcile, Reconciled, Synced};
