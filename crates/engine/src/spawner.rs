//! Deterministic consumable spawning in gaps that opened up on a line.

use num_bigint::{BigInt, BigUint};
use num_traits::Zero;
use protocol::ids::UINT160_MAX;
use protocol::packed::mask_low_bits;
use protocol::{to_word_bytes, EntityId, EntityType};
use sha3::{Digest, Keccak256};
use tracing::debug;

use crate::config::GameConfig;
use crate::entity::{diameter, mass_to_diameter, position, Entity};
use crate::error::Result;
use crate::events::{EventSink, ResolutionEvent};
use crate::line::Line;
use crate::math::Wad;

/// `keccak256(uint256(time mod 2^96) ++ uint256(right_id mod 2^160))`.
pub fn spawn_seed(time: &Wad, right_id: &EntityId) -> Result<BigUint> {
    let time_word = to_word_bytes(&mask_low_bits(time, 96))?;
    let id_word = to_word_bytes(&(right_id.as_biguint() & &*UINT160_MAX))?;

    let mut hasher = Keccak256::new();
    hasher.update(time_word);
    hasher.update(id_word);
    Ok(BigUint::from_bytes_be(&hasher.finalize()))
}

/// Type and mass of the consumable with this id.
pub fn consumable_for(id: &EntityId, config: &GameConfig) -> (EntityType, Wad) {
    let raw = id.to_bigint();
    if (&raw % BigInt::from(config.power_pellet_spawn_odds)).is_zero() {
        (EntityType::PowerPellet, BigInt::from(2) * &config.max_food_mass)
    } else {
        (
            EntityType::Food,
            &config.min_food_mass + raw % &config.max_food_mass,
        )
    }
}

/// Spawn a consumable centered in the gap between two neighbors if the gap is
/// at least `consumable_spawn_gap`; otherwise just schedule their collision.
pub fn spawn_or_schedule(
    line: &mut Line,
    left_id: &EntityId,
    right_id: &EntityId,
    time: &Wad,
    config: &GameConfig,
    events: &mut EventSink,
) -> Result<()> {
    let k = &config.velocity_coefficient;
    let left = line.entity(left_id)?;
    let right = line.entity(right_id)?;
    let left_right_edge = position(left, time, k)? + diameter(left);
    let right_left_edge = position(right, time, k)?;

    if &right_left_edge - &left_right_edge < config.consumable_spawn_gap {
        return line.schedule_collision(left_id, right_id, k);
    }

    let id = EntityId::from_seed(&spawn_seed(time, right_id)?);
    let (etype, mass) = consumable_for(&id, config);
    let left_edge = (left_right_edge + right_left_edge - mass_to_diameter(&mass)) / BigInt::from(2);
    debug!(line = line.line_id, entity = %id, ?etype, "spawning consumable");

    line.insert_between(
        Entity::consumable(id.clone(), etype, mass),
        left_edge,
        left_id,
        right_id,
        time,
        k,
    )?;
    events.emit(ResolutionEvent::Spawned {
        entity: id,
        line_id: line.line_id,
    });
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::line::LineState;
    use crate::math::wad;

    fn wall(id: EntityId, left: EntityId, right: EntityId, x: i64) -> Entity {
        Entity {
            last_x: wad(x),
            left_neighbor: left,
            right_neighbor: right,
            ..Entity::consumable(id, EntityType::Wall, BigInt::zero())
        }
    }

    fn line_with_gap(width: i64) -> Line {
        let (l, r) = (EntityId::leftmost(1), EntityId::rightmost(1));
        Line::with_entities(
            1,
            [
                wall(l.clone(), EntityId::none(), r.clone(), 0),
                wall(r.clone(), l.clone(), EntityId::none(), width),
            ],
            LineState::default(),
        )
    }

    #[test]
    fn test_seed_is_stable() {
        let a = spawn_seed(&wad(5), &EntityId::from(77)).unwrap();
        let b = spawn_seed(&wad(5), &EntityId::from(77)).unwrap();
        let c = spawn_seed(&wad(6), &EntityId::from(77)).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_seed_masks_time_to_96_bits() {
        let wrapped = wad(5) + (BigInt::from(1) << 96u32);
        assert_eq!(
            spawn_seed(&wad(5), &EntityId::from(1)).unwrap(),
            spawn_seed(&wrapped, &EntityId::from(1)).unwrap()
        );
    }

    #[test]
    fn test_consumable_for_respects_odds() {
        let config = GameConfig::default();
        let (etype, mass) = consumable_for(&EntityId::from(40), &config);
        assert_eq!(etype, EntityType::PowerPellet);
        assert_eq!(mass, wad(6));

        let (etype, mass) = consumable_for(&EntityId::from(41), &config);
        assert_eq!(etype, EntityType::Food);
        assert_eq!(mass, wad(1) + BigInt::from(41));
    }

    #[test]
    fn test_spawns_at_exact_gap() {
        let config = GameConfig::default();
        let mut line = line_with_gap(50);
        let mut events = EventSink::new(true, None);

        spawn_or_schedule(
            &mut line,
            &EntityId::leftmost(1),
            &EntityId::rightmost(1),
            &wad(3),
            &config,
            &mut events,
        )
        .unwrap();

        assert_eq!(line.len(), 3);
        let ordered = line.ordered_ids().unwrap();
        let spawned = line.get(&ordered[1]).unwrap();
        assert!(spawned.etype.is_consumable());
        assert_eq!(spawned.last_touched_time, wad(3));
        let center = &spawned.last_x + diameter(spawned) / BigInt::from(2);
        assert!((center - wad(25)).magnitude() <= &BigUint::from(1u32));
        assert_eq!(events.into_events().len(), 1);
    }

    #[test]
    fn test_narrow_gap_only_schedules() {
        let config = GameConfig::default();
        let mut line = line_with_gap(49);
        let mut events = EventSink::new(true, None);

        spawn_or_schedule(
            &mut line,
            &EntityId::leftmost(1),
            &EntityId::rightmost(1),
            &wad(3),
            &config,
            &mut events,
        )
        .unwrap();

        assert_eq!(line.len(), 2);
        // Two static walls never close.
        assert!(line.state.collision_queue.is_empty());
        assert!(events.into_events().is_empty());
    }
}
