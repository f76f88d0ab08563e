//! Forwarding a live state to a target time.

use protocol::EntityId;
use tracing::debug;

use crate::config::{DebugConfig, GameConfig};
use crate::error::Result;
use crate::events::{EventSink, ResolutionEvent};
use crate::math::Wad;
use crate::simulator::{LinePass, LineSimulator, StepLimits};
use crate::state::LiveState;

/// Stop conditions and diagnostics for one forward pass.
#[derive(Debug, Clone)]
pub struct ForwardOptions {
    /// Resolve collisions due at or before this time.
    pub stop_at_time: Wad,
    /// Per-line cap on popped entries, for diagnostic replay.
    pub stop_at_iteration: Option<u64>,
    /// Collect resolution events.
    pub notify: bool,
    /// Keep only events involving this player.
    pub focus_player: Option<EntityId>,
    /// Forward this line only; the others are returned untouched.
    pub only_line: Option<u32>,
}

impl ForwardOptions {
    /// Plain real-time forwarding with no events.
    pub fn until(stop_at_time: Wad) -> Self {
        Self {
            stop_at_time,
            stop_at_iteration: None,
            notify: false,
            focus_player: None,
            only_line: None,
        }
    }

    /// Apply the replay switches from `config.toml`.
    pub fn with_debug(mut self, debug: &DebugConfig) -> Self {
        self.stop_at_iteration = debug.stop_at_iteration;
        self.only_line = debug.only_line;
        self.notify |= debug.notify;
        if debug.focus_player.is_some() {
            self.focus_player = debug.focus_player.clone();
        }
        self
    }
}

/// Output of [`forward_state_to`].
#[derive(Debug, Clone)]
pub struct Forwarded {
    pub state: LiveState,
    pub events: Vec<ResolutionEvent>,
    /// One entry per forwarded line.
    pub passes: Vec<(u32, LinePass)>,
}

/// Resolve every line of `prev` up to the options' stop conditions.
///
/// `prev` is never modified. A fault on any line fails the whole pass.
pub fn forward_state_to(
    prev: &LiveState,
    config: &GameConfig,
    options: &ForwardOptions,
) -> Result<Forwarded> {
    let mut state = prev.clone();
    let mut events = EventSink::new(options.notify, options.focus_player.clone());
    let mut passes = Vec::with_capacity(state.lines.len());
    let limits = StepLimits {
        stop_at_time: options.stop_at_time.clone(),
        stop_at_iteration: options.stop_at_iteration,
    };

    let LiveState {
        lines, game_state, ..
    } = &mut state;
    let mut simulator = LineSimulator::new(config, game_state, &mut events);
    for line in lines.iter_mut() {
        if options.only_line.is_some_and(|only| only != line.line_id) {
            continue;
        }
        let pass = simulator.process_collisions(line, &limits)?;
        debug!(
            line = line.line_id,
            iterations = pass.iterations,
            entities = line.len(),
            queued = line.state.collision_queue.len(),
            "forwarded line"
        );
        passes.push((line.line_id, pass));
    }

    state.last_processed_time = match options.stop_at_iteration {
        None => options.stop_at_time.clone(),
        Some(_) => passes
            .iter()
            .map(|(_, pass)| &pass.last_collision_time)
            .max()
            .cloned()
            .unwrap_or_else(|| prev.last_processed_time.clone()),
    };

    Ok(Forwarded {
        state,
        events: events.into_events(),
        passes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collision_queue::QueueEntry;
    use crate::entity::{Entity, EntityType};
    use crate::line::{Line, LineState};
    use crate::math::wad;
    use crate::state::GameState;

    fn boundary_line(line_id: u32, width: i64) -> Line {
        let (l, r) = (EntityId::leftmost(line_id), EntityId::rightmost(line_id));
        let mut left = Entity::consumable(l.clone(), EntityType::Wall, wad(0));
        left.line_id = line_id;
        left.right_neighbor = r.clone();
        let mut right = Entity::consumable(r, EntityType::Wall, wad(0));
        right.line_id = line_id;
        right.left_neighbor = l;
        right.last_x = wad(width);
        Line::with_entities(line_id, [left, right], LineState::default())
    }

    fn two_line_state() -> LiveState {
        let mut lines = vec![boundary_line(0, 100), boundary_line(1, 100)];
        for line in lines.iter_mut() {
            for t in [3, 6] {
                line.state
                    .collision_queue
                    .push(QueueEntry::new(wad(t), EntityId::from(50)));
            }
        }
        LiveState::new(1, lines, GameState::default())
    }

    #[test]
    fn test_forward_leaves_input_untouched() {
        let prev = two_line_state();
        let snapshot = prev.clone();
        let out = forward_state_to(&prev, &GameConfig::default(), &ForwardOptions::until(wad(10)))
            .unwrap();
        assert_eq!(prev, snapshot);
        assert_eq!(out.state.last_processed_time, wad(10));
        assert!(out.state.lines.iter().all(|l| l.state.collision_queue.is_empty()));
    }

    #[test]
    fn test_iteration_cap_reports_last_collision() {
        let prev = two_line_state();
        let mut options = ForwardOptions::until(wad(10));
        options.stop_at_iteration = Some(1);
        let out = forward_state_to(&prev, &GameConfig::default(), &options).unwrap();
        assert_eq!(out.state.last_processed_time, wad(3));
        assert_eq!(out.passes.len(), 2);
    }

    #[test]
    fn test_only_line_skips_others() {
        let prev = two_line_state();
        let mut options = ForwardOptions::until(wad(10));
        options.only_line = Some(1);
        let out = forward_state_to(&prev, &GameConfig::default(), &options).unwrap();
        assert_eq!(out.state.lines[0], prev.lines[0]);
        assert!(out.state.lines[1].state.collision_queue.is_empty());
        assert_eq!(out.passes.len(), 1);
    }

    #[test]
    fn test_with_debug_copies_switches() {
        let debug = DebugConfig {
            stop_at_iteration: Some(4),
            only_line: Some(2),
            notify: true,
            focus_player: Some(EntityId::from(9)),
        };
        let options = ForwardOptions::until(wad(1)).with_debug(&debug);
        assert_eq!(options.stop_at_iteration, Some(4));
        assert_eq!(options.only_line, Some(2));
        assert!(options.notify);
        assert_eq!(options.focus_player, Some(EntityId::from(9)));
    }
}
