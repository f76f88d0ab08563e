//! Line state management.
//!
//! A line is an id-indexed arena of entities whose `left_neighbor` /
//! `right_neighbor` fields form one ordered chain between two boundary
//! entities, plus the line's collision queue.

use std::collections::{BTreeMap, HashSet};

use num_bigint::BigInt;
use num_traits::Zero;
use protocol::EntityId;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::collision_queue::{CollisionQueue, QueueEntry};
use crate::entity::{collision_time, Entity};
use crate::error::{EngineError, Result};
use crate::math::Wad;

/// Queue-relevant state of a line.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineState {
    /// Time of the most recent on-chain mutation affecting the queue.
    #[serde(with = "protocol::serde_big")]
    pub last_touched_time: Wad,
    pub collision_queue: CollisionQueue,
}

/// One lane of the game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Line {
    pub line_id: u32,
    entities: BTreeMap<EntityId, Entity>,
    pub state: LineState,
}

impl Line {
    pub fn new(line_id: u32, state: LineState) -> Self {
        Self {
            line_id,
            entities: BTreeMap::new(),
            state,
        }
    }

    /// Build a line from already-linked entities.
    pub fn with_entities(
        line_id: u32,
        entities: impl IntoIterator<Item = Entity>,
        state: LineState,
    ) -> Self {
        let mut line = Self::new(line_id, state);
        for entity in entities {
            line.entities.insert(entity.entity_id.clone(), entity);
        }
        line
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Get an entity by id.
    #[inline]
    pub fn get(&self, id: &EntityId) -> Option<&Entity> {
        self.entities.get(id)
    }

    /// Get a mutable entity by id.
    #[inline]
    pub fn get_mut(&mut self, id: &EntityId) -> Option<&mut Entity> {
        self.entities.get_mut(id)
    }

    /// Look up an entity the chain says must exist.
    pub fn entity(&self, id: &EntityId) -> Result<&Entity> {
        self.entities
            .get(id)
            .ok_or_else(|| EngineError::MissingEntity(id.clone()))
    }

    pub fn entity_mut(&mut self, id: &EntityId) -> Result<&mut Entity> {
        self.entities
            .get_mut(id)
            .ok_or_else(|| EngineError::MissingEntity(id.clone()))
    }

    /// Insert or overwrite an entity.
    pub fn put(&mut self, entity: Entity) {
        self.entities.insert(entity.entity_id.clone(), entity);
    }

    pub fn remove(&mut self, id: &EntityId) -> Option<Entity> {
        self.entities.remove(id)
    }

    /// Entities in id order.
    pub fn iter(&self) -> impl Iterator<Item = &Entity> {
        self.entities.values()
    }

    /// Latest `last_touched_time` of any entity on the line.
    pub fn latest_touch(&self) -> Wad {
        self.entities
            .values()
            .map(|e| &e.last_touched_time)
            .max()
            .cloned()
            .unwrap_or_else(BigInt::zero)
    }

    /// Ids in left-to-right order, following the neighbor chain from the left
    /// boundary. A dangling or cyclic link is reported as a missing entity.
    pub fn ordered_ids(&self) -> Result<Vec<EntityId>> {
        let Some(start) = self.entities.keys().find(|id| id.is_leftmost()) else {
            return Err(EngineError::MissingEntity(EntityId::leftmost(self.line_id)));
        };

        let mut ordered = Vec::with_capacity(self.entities.len());
        let mut seen = HashSet::with_capacity(self.entities.len());
        let mut current = start.clone();
        loop {
            if !seen.insert(current.clone()) {
                return Err(EngineError::MissingEntity(current));
            }
            let entity = self.entity(&current)?;
            ordered.push(current.clone());
            if entity.entity_id.is_rightmost() {
                break;
            }
            current = entity.right_neighbor.clone();
        }
        Ok(ordered)
    }

    /// Queue the collision between two neighbors if they are closing.
    pub fn schedule_collision(
        &mut self,
        left_id: &EntityId,
        right_id: &EntityId,
        velocity_coefficient: &Wad,
    ) -> Result<()> {
        let time = collision_time(self.entity(left_id)?, self.entity(right_id)?, velocity_coefficient)?;
        if !time.is_zero() {
            trace!(line = self.line_id, left = %left_id, right = %right_id, "scheduled collision");
            self.state
                .collision_queue
                .push(QueueEntry::new(time, right_id.clone()));
        }
        Ok(())
    }

    /// Link `entity` between two neighbors with its left edge at `left_edge`
    /// and schedule its collisions on both sides.
    pub fn insert_between(
        &mut self,
        mut entity: Entity,
        left_edge: Wad,
        left_id: &EntityId,
        right_id: &EntityId,
        time: &Wad,
        velocity_coefficient: &Wad,
    ) -> Result<()> {
        let id = entity.entity_id.clone();
        entity.line_id = self.line_id;
        entity.last_x = left_edge;
        entity.last_touched_time = time.clone();
        entity.left_neighbor = left_id.clone();
        entity.right_neighbor = right_id.clone();

        self.entity_mut(left_id)?.right_neighbor = id.clone();
        self.entity_mut(right_id)?.left_neighbor = id.clone();
        self.put(entity);
        trace!(line = self.line_id, entity = %id, left = %left_id, right = %right_id, "inserted entity");

        self.schedule_collision(left_id, &id, velocity_coefficient)?;
        self.schedule_collision(&id, right_id, velocity_coefficient)
    }
}
