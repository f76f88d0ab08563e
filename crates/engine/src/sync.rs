//! Turning indexer snapshots into live state.
//!
//! Decoding merges the chain tables into per-line entity arenas and
//! collision queues. Reconciling folds a fresh snapshot into the state the
//! client has already forwarded, keeping lines the chain has not touched.

use std::collections::BTreeMap;

use num_bigint::BigInt;
use num_traits::{Signed, Zero};
use protocol::{EntityId, LineRecord, PlayerRecord, Snapshot, SyncProgressRecord};
use tracing::{debug, info};

use crate::collision_queue::CollisionQueue;
use crate::config::GameConfig;
use crate::entity::Entity;
use crate::error::{EngineError, Result};
use crate::line::{Line, LineState};
use crate::score_heap::BoundedScoreHeap;
use crate::state::{GameState, LiveState};

/// Result of decoding a snapshot.
#[derive(Debug, Clone)]
pub enum Synced {
    /// The indexer has not caught up yet.
    Pending(SyncProgressRecord),
    Live { state: LiveState, config: GameConfig },
}

/// Decode a snapshot taken at wall time `synced_at`.
///
/// Output does not depend on the order of records within each table.
pub fn decode_snapshot(snapshot: Snapshot, synced_at: u64) -> Result<Synced> {
    let Snapshot {
        sync_progress,
        game_config,
        game_state,
        lines,
        line_offchain,
        entities,
        players,
        usernames,
    } = snapshot;

    if !sync_progress.is_live() {
        debug!(step = %sync_progress.step, percentage = sync_progress.percentage, "indexer not live yet");
        return Ok(Synced::Pending(sync_progress));
    }

    let config = GameConfig::try_from(
        game_config.ok_or(EngineError::InvalidConfig("game config table is empty"))?,
    )?;

    let players: BTreeMap<EntityId, PlayerRecord> = players
        .into_iter()
        .map(|p| (p.entity_id.clone(), p))
        .collect();

    let mut high_scores = BTreeMap::new();
    for (id, player) in &players {
        let heap = BoundedScoreHeap::from_heap_ordered(player.high_scores.clone(), config.top_k())?;
        high_scores.insert(id.clone(), heap);
    }

    let game_state = GameState {
        num_lines: game_state.unwrap_or_default().num_lines,
        high_scores,
        usernames: usernames
            .into_iter()
            .map(|u| (u.entity_id, u.username))
            .collect(),
    };

    let mut by_line: BTreeMap<u32, Vec<Entity>> = BTreeMap::new();
    for record in entities {
        let (pp_time, consumed) = players
            .get(&record.entity_id)
            .map(|p| (p.last_consumed_power_pellet_time.clone(), p.consumed_mass.clone()))
            .unwrap_or_else(|| (BigInt::zero(), BigInt::zero()));
        by_line
            .entry(record.line_id)
            .or_default()
            .push(Entity::from_record(record, pp_time, consumed));
    }

    let touched: BTreeMap<u32, BigInt> = line_offchain
        .into_iter()
        .map(|l| (l.line_id, l.last_touched_time))
        .collect();

    let line_records: BTreeMap<u32, LineRecord> =
        lines.into_iter().map(|l| (l.line_id, l)).collect();

    let mut decoded = Vec::with_capacity(line_records.len());
    for (line_id, record) in line_records {
        let state = LineState {
            last_touched_time: touched.get(&line_id).cloned().unwrap_or_else(BigInt::zero),
            collision_queue: CollisionQueue::from_packed(&record.collision_queue),
        };
        let entities = by_line.remove(&line_id).unwrap_or_default();
        decoded.push(Line::with_entities(line_id, entities, state));
    }

    if let Some((line_id, orphans)) = by_line.into_iter().next() {
        let entity_id = orphans
            .into_iter()
            .map(|e| e.entity_id)
            .min()
            .unwrap_or_else(EntityId::none);
        return Err(EngineError::UnknownLine { line_id, entity_id });
    }

    let state = LiveState::new(synced_at, decoded, game_state);
    info!(
        lines = state.lines.len(),
        entities = state.entity_count(),
        players = players.len(),
        "decoded live snapshot"
    );
    Ok(Synced::Live { state, config })
}

/// Outcome of [`reconcile`].
#[derive(Debug, Clone)]
pub struct Reconciled {
    /// State to forward next.
    pub state: LiveState,
    pub is_new_sync: bool,
    /// Lines taken from the new snapshot because the chain touched them.
    pub resynced_lines: Vec<u32>,
    /// Whether the next forward pass should collect events.
    pub should_notify: bool,
}

/// Choose the starting point of the next forward pass.
///
/// On a new sync, every line whose `last_touched_time` is unchanged keeps its
/// already-forwarded copy from `prev`; the rest restart from `synced`.
pub fn reconcile(prev: &LiveState, synced: &LiveState) -> Reconciled {
    let is_new_sync = prev.last_synced_time != synced.last_synced_time;
    if !is_new_sync {
        return Reconciled {
            state: prev.clone(),
            is_new_sync,
            resynced_lines: Vec::new(),
            should_notify: prev.last_processed_time.is_positive(),
        };
    }

    let mut state = synced.clone();
    let mut resynced_lines = Vec::new();
    for line in state.lines.iter_mut() {
        match prev.line(line.line_id) {
            Some(kept) if kept.state.last_touched_time == line.state.last_touched_time => {
                *line = kept.clone();
            }
            _ => {
                debug!(line = line.line_id, "re-syncing line");
                resynced_lines.push(line.line_id);
            }
        }
    }

    Reconciled {
        state,
        is_new_sync,
        resynced_lines,
        should_notify: false,
    }
}
