//! Overall-score leaderboard across live and archived high scores.

use std::collections::BTreeMap;

use num_bigint::BigInt;
use num_traits::{Signed, Zero};
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};
use crate::math::{Wad, WAD};
use crate::state::GameState;

/// High scores carried over from earlier matches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArchivedScores {
    pub username: String,
    #[serde(with = "protocol::serde_big::vec")]
    pub high_scores: Vec<Wad>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardRow {
    pub username: String,
    /// Sum of the top-K scores in whole units, floored.
    #[serde(with = "protocol::serde_big")]
    pub total_score: BigInt,
}

/// Rank players by the sum of their `top_k` best scores.
///
/// Rows with a zero total are dropped. Ties are ordered by username.
pub fn leaderboard(
    game_state: &GameState,
    archive: &[ArchivedScores],
    top_k: usize,
) -> Result<Vec<LeaderboardRow>> {
    let mut scores: BTreeMap<&str, Vec<Wad>> = BTreeMap::new();

    for (entity_id, heap) in &game_state.high_scores {
        let username = game_state
            .usernames
            .get(entity_id)
            .and_then(|name| name.as_deref())
            .filter(|name| !name.is_empty())
            .ok_or_else(|| EngineError::MissingUsername(entity_id.clone()))?;
        scores
            .entry(username)
            .or_default()
            .extend(heap.values().iter().cloned());
    }

    for entry in archive {
        scores
            .entry(entry.username.as_str())
            .or_default()
            .extend(entry.high_scores.iter().cloned());
    }

    let mut rows: Vec<LeaderboardRow> = scores
        .into_iter()
        .map(|(username, mut all)| {
            all.sort_unstable_by(|a, b| b.cmp(a));
            let total: Wad = all.iter().take(top_k).sum();
            LeaderboardRow {
                username: username.to_string(),
                total_score: floor_units(&total),
            }
        })
        .filter(|row| row.total_score.is_positive())
        .collect();

    rows.sort_by(|a, b| {
        b.total_score
            .cmp(&a.total_score)
            .then_with(|| a.username.cmp(&b.username))
    });
    Ok(rows)
}

fn floor_units(value: &Wad) -> BigInt {
    let whole = value / &*WAD;
    if value.is_negative() && !(value % &*WAD).is_zero() {
        whole - 1
    } else {
        whole
    }
}
