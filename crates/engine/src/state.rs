//! Game-wide and live (forwarded) state.

use std::collections::BTreeMap;

use num_bigint::BigInt;
use num_traits::Zero;
use protocol::EntityId;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::line::Line;
use crate::math::Wad;
use crate::score_heap::BoundedScoreHeap;

/// State shared by every line of a match.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameState {
    pub num_lines: u32,
    /// Top-K lifetime scores per player, heap-ordered.
    pub high_scores: BTreeMap<EntityId, BoundedScoreHeap>,
    /// `None` for players whose username row exists but is empty.
    pub usernames: BTreeMap<EntityId, Option<String>>,
}

impl GameState {
    /// Record a finished life's score for `player`.
    pub fn record_score(&mut self, player: &EntityId, score: Wad, top_k: usize) -> Result<()> {
        self.high_scores
            .entry(player.clone())
            .or_default()
            .enqueue(score, top_k)
    }
}

/// Everything the forwarder reads and produces.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiveState {
    /// Wall-clock seconds at which the chain snapshot was taken.
    pub last_synced_time: u64,
    /// WAD time up to which collisions have been resolved.
    #[serde(with = "protocol::serde_big")]
    pub last_processed_time: Wad,
    /// Sorted by line id.
    pub lines: Vec<Line>,
    pub game_state: GameState,
}

impl LiveState {
    pub fn new(last_synced_time: u64, lines: Vec<Line>, game_state: GameState) -> Self {
        Self {
            last_synced_time,
            last_processed_time: BigInt::zero(),
            lines,
            game_state,
        }
    }

    pub fn line(&self, line_id: u32) -> Option<&Line> {
        self.lines.iter().find(|line| line.line_id == line_id)
    }

    /// Total number of entities across every line.
    pub fn entity_count(&self) -> usize {
        self.lines.iter().map(Line::len).sum()
    }
}
