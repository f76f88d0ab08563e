//! Collision resolution for a single line.
//!
//! Pops due entries off the line's collision queue in time order and applies
//! one of three outcomes to each live pair:
//! - Bounce off a boundary (walls also bounce off power pellets)
//! - Mutual bounce between walls and/or powered-up entities
//! - Consumption, where the winner absorbs the loser and takes its place

use num_traits::Signed;
use protocol::EntityType;
use tracing::{error, trace};

use crate::collision_queue::QueueEntry;
use crate::config::GameConfig;
use crate::entity::{collision_time, is_powered_up, mass_to_diameter, position, Entity};
use crate::error::Result;
use crate::events::{EventSink, ResolutionEvent};
use crate::line::Line;
use crate::math::{min_wad, Wad};
use crate::spawner::spawn_or_schedule;
use crate::state::GameState;

/// When a pass over one line stops.
#[derive(Debug, Clone)]
pub struct StepLimits {
    /// Entries due strictly after this time stay queued.
    pub stop_at_time: Wad,
    /// Maximum number of entries popped.
    pub stop_at_iteration: Option<u64>,
}

/// Result of one pass over a line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinePass {
    /// Time of the last entry popped, or the line's latest touch if none was.
    pub last_collision_time: Wad,
    pub iterations: u64,
}

/// Resolves collisions with a shared game state and event sink.
pub struct LineSimulator<'a> {
    config: &'a GameConfig,
    game_state: &'a mut GameState,
    events: &'a mut EventSink,
}

impl<'a> LineSimulator<'a> {
    pub fn new(config: &'a GameConfig, game_state: &'a mut GameState, events: &'a mut EventSink) -> Self {
        Self {
            config,
            game_state,
            events,
        }
    }

    /// Resolve every queued collision due at or before the stop time.
    ///
    /// The line's `last_touched_time` is left alone; it tracks on-chain
    /// mutations only.
    pub fn process_collisions(&mut self, line: &mut Line, limits: &StepLimits) -> Result<LinePass> {
        let mut pass = LinePass {
            last_collision_time: line.latest_touch(),
            iterations: 0,
        };
        let cap = limits.stop_at_iteration.unwrap_or(u64::MAX);

        while pass.iterations < cap {
            match line.state.collision_queue.peek() {
                Some(next) if next.time <= limits.stop_at_time => {}
                _ => break,
            }
            let Some(entry) = line.state.collision_queue.pop() else {
                break;
            };
            trace!(line = line.line_id, iteration = pass.iterations, right = %entry.entity_id, "processing entry");
            pass.last_collision_time = entry.time.clone();

            if let Err(err) = self.resolve(line, &entry) {
                error!(line = line.line_id, iteration = pass.iterations, %err, "failed to resolve collision");
                return Err(err.at(line.line_id, pass.iterations));
            }
            pass.iterations += 1;
        }

        Ok(pass)
    }

    fn resolve(&mut self, line: &mut Line, entry: &QueueEntry) -> Result<()> {
        let time = &entry.time;
        let config = self.config;
        let k = &config.velocity_coefficient;

        // Moved or killed since the entry was queued.
        let right = match line.get(&entry.entity_id) {
            Some(e) if e.line_id == line.line_id && e.etype != EntityType::Dead => e.clone(),
            _ => {
                trace!(line = line.line_id, right = %entry.entity_id, "dropping stale entry");
                return Ok(());
            }
        };
        let left = line.entity(&right.left_neighbor)?.clone();

        if collision_time(&left, &right, k)? != *time {
            trace!(line = line.line_id, left = %left.entity_id, right = %right.entity_id, "collision time changed");
            return Ok(());
        }

        let (left_type, right_type) = (left.etype, right.etype);

        if left.is_boundary()
            || right.is_boundary()
            || matches!(
                (left_type, right_type),
                (EntityType::Wall, EntityType::PowerPellet) | (EntityType::PowerPellet, EntityType::Wall)
            )
        {
            return self.bounce_off_static(line, left, right, time);
        }

        let effect = &config.power_pellet_effect_time;
        if (left_type == EntityType::Wall || is_powered_up(&left, time, effect))
            && (right_type == EntityType::Wall || is_powered_up(&right, time, effect))
        {
            return self.bounce_apart(line, left, right, time);
        }

        self.consume(line, left, right, time)
    }

    /// The moving side reverses; the static side is untouched.
    fn bounce_off_static(&mut self, line: &mut Line, left: Entity, right: Entity, time: &Wad) -> Result<()> {
        let (mut mover, other, mover_is_right) = if left.is_static() {
            (right, left, true)
        } else {
            (left, right, false)
        };

        touch(&mut mover, time, &self.config.velocity_coefficient)?;
        mover.vel_multiplier = -&mover.vel_multiplier;
        self.events.emit(ResolutionEvent::Bounced {
            entity: mover.entity_id.clone(),
            other: other.entity_id,
        });

        let mover_id = mover.entity_id.clone();
        let (gap_left, gap_right) = if mover_is_right {
            (mover_id, mover.right_neighbor.clone())
        } else {
            (mover.left_neighbor.clone(), mover_id)
        };
        line.put(mover);
        spawn_or_schedule(line, &gap_left, &gap_right, time, self.config, self.events)
    }

    /// Both sides move away from each other.
    fn bounce_apart(&mut self, line: &mut Line, mut left: Entity, mut right: Entity, time: &Wad) -> Result<()> {
        touch(&mut left, time, &self.config.velocity_coefficient)?;
        touch(&mut right, time, &self.config.velocity_coefficient)?;
        left.vel_multiplier = -left.vel_multiplier.abs();
        right.vel_multiplier = right.vel_multiplier.abs();

        self.events.emit(ResolutionEvent::Bounced {
            entity: left.entity_id.clone(),
            other: right.entity_id.clone(),
        });

        let (left_id, outer_left) = (left.entity_id.clone(), left.left_neighbor.clone());
        let (right_id, outer_right) = (right.entity_id.clone(), right.right_neighbor.clone());
        line.put(left);
        line.put(right);
        spawn_or_schedule(line, &outer_left, &left_id, time, self.config, self.events)?;
        spawn_or_schedule(line, &right_id, &outer_right, time, self.config, self.events)
    }

    fn consume(&mut self, line: &mut Line, mut left: Entity, mut right: Entity, time: &Wad) -> Result<()> {
        let config = self.config;
        let k = &config.velocity_coefficient;
        let (left_type, right_type) = (left.etype, right.etype);

        let left_wins;
        let new_x;
        if left_type == EntityType::Wall || right_type == EntityType::Wall {
            // Walls never grow.
            left_wins = left_type == EntityType::Wall;
            new_x = position(if left_wins { &left } else { &right }, time, k)?;
        } else {
            let effect = &config.power_pellet_effect_time;
            left_wins = if left_type.is_consumable() {
                false
            } else if right_type.is_consumable() {
                true
            } else if is_powered_up(&left, time, effect) {
                true
            } else if is_powered_up(&right, time, effect) {
                false
            } else {
                left.mass > right.mass
            };

            // Position first: the new mass changes the winner's velocity.
            let mut x = position(if left_wins { &left } else { &right }, time, k)?;

            let mut left_mass = left.mass.clone();
            let mut right_mass = right.mass.clone();
            if left_wins {
                if right_type == EntityType::Alive {
                    right_mass = min_wad(&right_mass, &right.consumed_mass).clone();
                }
            } else {
                if left_type == EntityType::Alive {
                    left_mass = min_wad(&left_mass, &left.consumed_mass).clone();
                }
                // Grow out from the left edge so the right edge stays put.
                x -= mass_to_diameter(&(&right_mass + &left_mass)) - mass_to_diameter(&right_mass);
            }

            let total = &left_mass + &right_mass;
            let winner = if left_wins { &mut left } else { &mut right };
            winner.mass = total;
            winner.consumed_mass += if left_wins { right_mass } else { left_mass };
            new_x = x;
        }

        let outer_left = left.left_neighbor.clone();
        let outer_right = right.right_neighbor.clone();
        let (mut winner, mut loser) = if left_wins { (left, right) } else { (right, left) };
        winner.last_x = new_x;
        winner.last_touched_time = time.clone();
        winner.left_neighbor = outer_left.clone();
        winner.right_neighbor = outer_right.clone();

        let winner_id = winner.entity_id.clone();
        line.entity_mut(&outer_left)?.right_neighbor = winner_id.clone();
        line.entity_mut(&outer_right)?.left_neighbor = winner_id.clone();

        self.on_consume(&mut winner, &mut loser, time)?;
        line.put(winner);
        line.remove(&loser.entity_id);

        let player_ate_food = matches!(
            (left_type, right_type),
            (EntityType::Alive, EntityType::Food) | (EntityType::Food, EntityType::Alive)
        );
        if player_ate_food {
            // Player-food pairs never spawn.
            line.schedule_collision(&outer_left, &winner_id, k)?;
            line.schedule_collision(&winner_id, &outer_right, k)
        } else {
            spawn_or_schedule(line, &outer_left, &winner_id, time, self.config, self.events)?;
            spawn_or_schedule(line, &winner_id, &outer_right, time, self.config, self.events)
        }
    }

    /// Score bookkeeping for the loser and power-up for the winner.
    fn on_consume(&mut self, winner: &mut Entity, loser: &mut Entity, time: &Wad) -> Result<()> {
        self.events.emit(ResolutionEvent::Consumed {
            winner: winner.entity_id.clone(),
            loser: loser.entity_id.clone(),
        });

        match (loser.etype, winner.etype) {
            (EntityType::Alive, _) => {
                let score = std::mem::take(&mut loser.consumed_mass);
                trace!(player = %loser.entity_id, "recording score");
                self.game_state
                    .record_score(&loser.entity_id, score, self.config.top_k())?;
            }
            (EntityType::PowerPellet, EntityType::Alive) => {
                winner.last_consumed_power_pellet_time = time.clone();
                self.events.emit(ResolutionEvent::PoweredUp {
                    entity: winner.entity_id.clone(),
                });
            }
            _ => {}
        }
        Ok(())
    }
}

/// Re-anchor an entity's trajectory at `time`.
fn touch(entity: &mut Entity, time: &Wad, velocity_coefficient: &Wad) -> Result<()> {
    entity.last_x = position(entity, time, velocity_coefficient)?;
    entity.last_touched_time = time.clone();
    Ok(())
}
