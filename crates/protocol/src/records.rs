//! Chain table records.
//!
//! These mirror the on-chain tables one-to-one. Merging them into the shapes
//! the engine simulates is the engine's `sync` module's job.

use num_bigint::{BigInt, BigUint};
use serde::{Deserialize, Serialize};

use crate::ids::EntityId;
use crate::ProtocolError;

/// Entity type enum matching the on-chain `EntityType` values.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum EntityType {
    #[default]
    Dead = 0,
    Alive = 1,
    Food = 2,
    Wall = 3,
    PowerPellet = 4,
}

impl EntityType {
    /// Food and power pellets: things that never win a consume.
    #[inline]
    pub fn is_consumable(self) -> bool {
        matches!(self, EntityType::Food | EntityType::PowerPellet)
    }
}

impl TryFrom<u8> for EntityType {
    type Error = ProtocolError;

    fn try_from(tag: u8) -> Result<Self, Self::Error> {
        match tag {
            0 => Ok(EntityType::Dead),
            1 => Ok(EntityType::Alive),
            2 => Ok(EntityType::Food),
            3 => Ok(EntityType::Wall),
            4 => Ok(EntityType::PowerPellet),
            other => Err(ProtocolError::UnknownEntityType(other)),
        }
    }
}

impl From<EntityType> for u8 {
    fn from(etype: EntityType) -> u8 {
        etype as u8
    }
}

/// Indexer sync progress.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncProgressRecord {
    pub step: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub percentage: f64,
    #[serde(default)]
    pub latest_block_number: u64,
    #[serde(default)]
    pub last_block_number_processed: u64,
}

impl SyncProgressRecord {
    pub const LIVE: &'static str = "live";

    pub fn is_live(&self) -> bool {
        self.step == Self::LIVE
    }
}

impl Default for SyncProgressRecord {
    fn default() -> Self {
        Self {
            step: "initialize".to_string(),
            message: "Connecting".to_string(),
            percentage: 0.0,
            latest_block_number: 0,
            last_block_number_processed: 0,
        }
    }
}

/// Singleton `GameConfig` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameConfigRecord {
    #[serde(with = "crate::serde_big")]
    pub line_jump_decay_factor: BigInt,
    #[serde(with = "crate::serde_big")]
    pub velocity_coefficient: BigInt,
    #[serde(with = "crate::serde_big")]
    pub min_food_mass: BigInt,
    #[serde(with = "crate::serde_big")]
    pub max_food_mass: BigInt,
    #[serde(with = "crate::serde_big")]
    pub wall_mass: BigInt,
    #[serde(with = "crate::serde_big")]
    pub player_starting_mass: BigInt,
    #[serde(with = "crate::serde_big")]
    pub line_width: BigInt,
    #[serde(with = "crate::serde_big")]
    pub consumable_spawn_gap: BigInt,
    #[serde(with = "crate::serde_big")]
    pub power_pellet_effect_time: BigInt,
    pub power_pellet_spawn_odds: u32,
    pub high_score_top_k: u8,
}

/// Singleton `GameState` table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameStateRecord {
    pub num_lines: u32,
}

/// `Line` table: the packed collision queue of one line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineRecord {
    pub line_id: u32,
    /// Packed queue words in heap order.
    #[serde(with = "crate::packed::words", default)]
    pub collision_queue: Vec<BigUint>,
}

/// Off-chain `LineOffchain` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineOffchainRecord {
    pub line_id: u32,
    #[serde(with = "crate::serde_big")]
    pub last_touched_time: BigInt,
}

/// `Entity` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityRecord {
    pub entity_id: EntityId,
    pub etype: EntityType,
    #[serde(with = "crate::serde_big")]
    pub mass: BigInt,
    #[serde(with = "crate::serde_big")]
    pub vel_multiplier: BigInt,
    pub line_id: u32,
    /// Left edge of the entity.
    #[serde(with = "crate::serde_big")]
    pub last_x: BigInt,
    #[serde(with = "crate::serde_big")]
    pub last_touched_time: BigInt,
    pub left_neighbor: EntityId,
    pub right_neighbor: EntityId,
}

/// `Player` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerRecord {
    pub entity_id: EntityId,
    #[serde(with = "crate::serde_big", default)]
    pub consumed_mass: BigInt,
    #[serde(default)]
    pub last_jump_block_number: u32,
    #[serde(with = "crate::serde_big", default)]
    pub last_consumed_power_pellet_time: BigInt,
    /// Stored in min-heap order.
    #[serde(with = "crate::serde_big::vec", default)]
    pub high_scores: Vec<BigInt>,
}

/// Off-chain `UsernameOffchain` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsernameRecord {
    pub entity_id: EntityId,
    #[serde(default)]
    pub username: Option<String>,
}

/// Every table the client syncs, as delivered by the indexer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    #[serde(default)]
    pub sync_progress: SyncProgressRecord,
    #[serde(default)]
    pub game_config: Option<GameConfigRecord>,
    #[serde(default)]
    pub game_state: Option<GameStateRecord>,
    #[serde(default)]
    pub lines: Vec<LineRecord>,
    #[serde(default)]
    pub line_offchain: Vec<LineOffchainRecord>,
    #[serde(default)]
    pub entities: Vec<EntityRecord>,
    #[serde(default)]
    pub players: Vec<PlayerRecord>,
    #[serde(default)]
    pub usernames: Vec<UsernameRecord>,
}
