//! Line entities.
//!
//! This module defines the entity record the simulator mutates and the pure
//! kinematics derived from it.

mod kinematics;

pub use kinematics::{
    collision_time, diameter, is_powered_up, mass_after_line_jump, mass_to_diameter,
    mass_to_speed, position, velocity, VELOCITY_MASS_EPSILON,
};
pub use protocol::{EntityId, EntityType};

use num_bigint::BigInt;
use num_traits::Zero;
use protocol::EntityRecord;
use serde::{Deserialize, Serialize};

use crate::math::Wad;

/// One object on a line: a player, food, a power pellet, a wall or a boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    pub entity_id: EntityId,
    pub etype: EntityType,
    #[serde(with = "protocol::serde_big")]
    pub mass: Wad,
    /// Sign is the direction, magnitude scales speed; zero means static.
    #[serde(with = "protocol::serde_big")]
    pub vel_multiplier: Wad,
    pub line_id: u32,
    /// Left edge at `last_touched_time`.
    #[serde(with = "protocol::serde_big")]
    pub last_x: Wad,
    #[serde(with = "protocol::serde_big")]
    pub last_touched_time: Wad,
    pub left_neighbor: EntityId,
    pub right_neighbor: EntityId,
    #[serde(with = "protocol::serde_big")]
    pub last_consumed_power_pellet_time: Wad,
    /// Mass absorbed during the current life.
    #[serde(with = "protocol::serde_big")]
    pub consumed_mass: Wad,
}

impl Entity {
    /// A freshly spawned consumable, not yet linked into a line.
    pub fn consumable(entity_id: EntityId, etype: EntityType, mass: Wad) -> Self {
        Self {
            entity_id,
            etype,
            mass,
            vel_multiplier: BigInt::zero(),
            line_id: 0,
            last_x: BigInt::zero(),
            last_touched_time: BigInt::zero(),
            left_neighbor: EntityId::none(),
            right_neighbor: EntityId::none(),
            last_consumed_power_pellet_time: BigInt::zero(),
            consumed_mass: BigInt::zero(),
        }
    }

    /// Merge an `Entity` row with the player-only fields kept elsewhere.
    pub fn from_record(
        record: EntityRecord,
        last_consumed_power_pellet_time: Wad,
        consumed_mass: Wad,
    ) -> Self {
        Self {
            entity_id: record.entity_id,
            etype: record.etype,
            mass: record.mass,
            vel_multiplier: record.vel_multiplier,
            line_id: record.line_id,
            last_x: record.last_x,
            last_touched_time: record.last_touched_time,
            left_neighbor: record.left_neighbor,
            right_neighbor: record.right_neighbor,
            last_consumed_power_pellet_time,
            consumed_mass,
        }
    }

    #[inline]
    pub fn is_boundary(&self) -> bool {
        self.entity_id.is_boundary()
    }

    #[inline]
    pub fn is_static(&self) -> bool {
        self.vel_multiplier.is_zero()
    }
}
