//! Choosing where a new player should enter a line.

use std::cmp::Ordering;

use protocol::{EntityId, EntityType};

use crate::entity::{diameter, position, Entity};
use crate::error::{EngineError, Result};
use crate::line::Line;
use crate::math::Wad;

/// Find the wall or right boundary with the widest hostile-free gap on its
/// left at `time`. A new player spawns just left of it.
///
/// Hostiles are players and walls; with none to the left, the gap runs to the
/// left boundary. Returns `None` if no gap is positive.
pub fn find_best_right_spawn_neighbor(
    line: &Line,
    time: &Wad,
    velocity_coefficient: &Wad,
) -> Result<Option<EntityId>> {
    let mut ordered = Vec::with_capacity(line.len());
    for entity in line.iter() {
        ordered.push((position(entity, time, velocity_coefficient)?, entity));
    }
    ordered.sort_by(|(ax, a), (bx, b)| {
        rank(a)
            .cmp(&rank(b))
            .then_with(|| ax.cmp(bx))
            .then_with(|| a.entity_id.cmp(&b.entity_id))
    });

    let leftmost = ordered
        .iter()
        .find(|(_, e)| e.entity_id.is_leftmost())
        .map(|(x, e)| (x, *e));

    let mut best: Option<(Wad, &EntityId)> = None;
    for (i, (right_left_edge, right)) in ordered.iter().enumerate().rev() {
        if right.etype != EntityType::Wall && !right.entity_id.is_rightmost() {
            continue;
        }

        let hostile = ordered[..i]
            .iter()
            .rev()
            .find(|(_, e)| matches!(e.etype, EntityType::Alive | EntityType::Wall))
            .map(|(x, e)| (x, *e))
            .or(leftmost)
            .ok_or_else(|| EngineError::MissingEntity(EntityId::leftmost(line.line_id)))?;

        let gap = right_left_edge - (hostile.0 + diameter(hostile.1));
        let widest = best.as_ref().map_or(Ordering::Greater, |(g, _)| gap.cmp(g));
        if gap > Wad::default() && widest == Ordering::Greater {
            best = Some((gap, &right.entity_id));
        }
    }

    Ok(best.map(|(_, id)| id.clone()))
}

/// Left boundary first, right boundary last, everything else by position.
fn rank(entity: &Entity) -> u8 {
    if entity.entity_id.is_leftmost() {
        0
    } else if entity.entity_id.is_rightmost() {
        2
    } else {
        1
    }
}
