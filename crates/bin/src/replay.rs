//! Lines replay - forwards a chain snapshot offline.
//!
//! Environment:
//! - `SNAPSHOT`: snapshot JSON to load (default `snapshot.json`)
//! - `SYNCED_AT`: wall-clock second the snapshot was taken (default 0)
//! - `TARGET_TIME`: WAD time to forward to (default: now)
//! - `NEXT_SNAPSHOT`: optional later snapshot to reconcile into the result
//! - `ARCHIVE`: optional JSON list of archived high scores for the leaderboard
//! - `OUTPUT`: optional path for the forwarded state as JSON

use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::Context;
use engine::leaderboard::{leaderboard, ArchivedScores};
use engine::spawn_point::find_best_right_spawn_neighbor;
use engine::{
    decode_snapshot, forward_state_to, reconcile, Config, ForwardOptions, Forwarded, GameConfig,
    LiveState, Synced, Wad,
};
use num_bigint::BigInt;
use protocol::Snapshot;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Lines replay v{}", env!("CARGO_PKG_VERSION"));

    let config = Config::load()?;
    info!("Loaded configuration");
    info!("  Stop at iteration: {:?}", config.debug.stop_at_iteration);
    info!("  Only line: {:?}", config.debug.only_line);

    let snapshot_path = std::env::var("SNAPSHOT").unwrap_or_else(|_| "snapshot.json".to_string());
    let synced_at = std::env::var("SYNCED_AT")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .unwrap_or(0);
    let target = match std::env::var("TARGET_TIME") {
        Ok(raw) => protocol::serde_big::parse_int::<BigInt>(&raw)
            .with_context(|| format!("invalid TARGET_TIME {raw}"))?,
        Err(_) => now_wad()?,
    };

    let Some((state, game)) = load_live(Path::new(&snapshot_path), synced_at, &config)? else {
        return Ok(());
    };

    let options = ForwardOptions::until(target.clone()).with_debug(&config.debug);
    let mut forwarded = forward_state_to(&state, &game, &options)?;
    summarize(&forwarded, &game, &target)?;

    if let Ok(next_path) = std::env::var("NEXT_SNAPSHOT") {
        if let Some((synced, _)) = load_live(Path::new(&next_path), synced_at + 1, &config)? {
            let reconciled = reconcile(&forwarded.state, &synced);
            info!(
                "Reconciled next snapshot: re-synced lines {:?}, notify next pass: {}",
                reconciled.resynced_lines, reconciled.should_notify
            );
            forwarded = forward_state_to(&reconciled.state, &game, &options)?;
            summarize(&forwarded, &game, &target)?;
        }
    }

    if let Ok(archive_path) = std::env::var("ARCHIVE") {
        let archive: Vec<ArchivedScores> = serde_json::from_str(
            &std::fs::read_to_string(&archive_path)
                .with_context(|| format!("reading {archive_path}"))?,
        )?;
        for (rank, row) in leaderboard(&forwarded.state.game_state, &archive, game.top_k())?
            .iter()
            .enumerate()
        {
            info!("  #{} {} {}", rank + 1, row.username, row.total_score);
        }
    }

    if let Ok(output) = std::env::var("OUTPUT") {
        std::fs::write(&output, serde_json::to_string_pretty(&forwarded.state)?)
            .with_context(|| format!("writing {output}"))?;
        info!("Wrote forwarded state to {}", output);
    }

    Ok(())
}

/// Read and decode a snapshot; `None` while the indexer is still catching up.
fn load_live(path: &Path, synced_at: u64, config: &Config) -> anyhow::Result<Option<(LiveState, GameConfig)>> {
    let contents =
        std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let snapshot: Snapshot = serde_json::from_str(&contents)?;

    match decode_snapshot(snapshot, synced_at)? {
        Synced::Pending(progress) => {
            warn!(
                "Snapshot {} not live yet: {} ({:.1}%)",
                path.display(),
                progress.message,
                progress.percentage
            );
            Ok(None)
        }
        Synced::Live { state, config: game } => {
            if game != config.game {
                info!("Using the snapshot's game config over config.toml");
            }
            Ok(Some((state, game)))
        }
    }
}

fn summarize(forwarded: &Forwarded, game: &GameConfig, target: &Wad) -> anyhow::Result<()> {
    info!(
        "Forwarded to {} ({} events)",
        forwarded.state.last_processed_time,
        forwarded.events.len()
    );
    for (line_id, pass) in &forwarded.passes {
        let Some(line) = forwarded.state.line(*line_id) else {
            continue;
        };
        let spawn = find_best_right_spawn_neighbor(line, target, &game.velocity_coefficient)?;
        info!(
            "  Line {}: {} iterations, {} entities, {} queued, spawn left of {}",
            line_id,
            pass.iterations,
            line.len(),
            line.state.collision_queue.len(),
            spawn.map_or_else(|| "nothing".to_string(), |id| id.to_string())
        );
    }
    Ok(())
}

fn now_wad() -> anyhow::Result<Wad> {
    let elapsed = SystemTime::now().duration_since(UNIX_EPOCH)?;
    Ok(BigInt::from(elapsed.as_millis()) * BigInt::from(1_000_000_000_000_000u64))
}
