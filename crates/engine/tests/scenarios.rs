//! End-to-end forwarding scenarios.

use engine::entity::diameter;
use engine::math::wad;
use engine::spawner::spawn_or_schedule;
use engine::events::EventSink;
use engine::{
    forward_state_to, Entity, EntityId, EntityType, ForwardOptions, GameConfig, GameState, Line,
    LineState, LiveState, QueueEntry, ResolutionEvent, Wad,
};
use num_bigint::BigInt;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const T0: i64 = 1_000;

fn entity(id: u64, etype: EntityType, mass: i64, vel: i64, x: i64) -> Entity {
    Entity {
        vel_multiplier: wad(vel),
        last_x: wad(x),
        last_touched_time: wad(T0),
        ..Entity::consumable(EntityId::from(id), etype, wad(mass))
    }
}

/// A line with `inner` linked between boundaries at 0 and `width`, and every
/// closing neighbor pair queued.
fn build_line(width: i64, inner: Vec<Entity>) -> Line {
    let mut chain = vec![Entity::consumable(EntityId::leftmost(0), EntityType::Wall, BigInt::from(0))];
    chain.extend(inner);
    let mut right = Entity::consumable(EntityId::rightmost(0), EntityType::Wall, BigInt::from(0));
    right.last_x = wad(width);
    chain.push(right);

    let ids: Vec<EntityId> = chain.iter().map(|e| e.entity_id.clone()).collect();
    for (i, e) in chain.iter_mut().enumerate() {
        if i > 0 {
            e.left_neighbor = ids[i - 1].clone();
        }
        if i + 1 < ids.len() {
            e.right_neighbor = ids[i + 1].clone();
        }
    }

    let mut line = Line::with_entities(0, chain, LineState::default());
    let k = GameConfig::default().velocity_coefficient;
    for pair in ids.windows(2) {
        line.schedule_collision(&pair[0], &pair[1], &k).unwrap();
    }
    line
}

fn live(lines: Vec<Line>) -> LiveState {
    LiveState::new(1, lines, GameState::default())
}

fn non_boundary(line: &Line) -> Vec<&Entity> {
    line.iter().filter(|e| !e.is_boundary()).collect()
}

fn first_due(line: &Line) -> Wad {
    line.state.collision_queue.peek().unwrap().time.clone()
}

#[test]
fn scenario_a_two_entities_merge() {
    let line = build_line(
        20,
        vec![
            entity(1, EntityType::Alive, 4, 1, 0),
            entity(2, EntityType::Food, 4, 0, 10),
        ],
    );
    assert_eq!(diameter(line.get(&EntityId::from(1)).unwrap()), wad(2));
    let due = first_due(&line);
    assert!(due > wad(T0));
    let state = live(vec![line]);

    let out = forward_state_to(&state, &GameConfig::default(), &ForwardOptions::until(due)).unwrap();

    let survivors = non_boundary(&out.state.lines[0]);
    assert_eq!(survivors.len(), 1);
    assert_eq!(survivors[0].entity_id, EntityId::from(1));
    assert_eq!(survivors[0].mass, wad(8));
}

#[test]
fn scenario_b_spawn_at_exact_gap() {
    let config = GameConfig::default();
    let mut events = EventSink::disabled();

    let mut exact = build_line(50, vec![]);
    spawn_or_schedule(
        &mut exact,
        &EntityId::leftmost(0),
        &EntityId::rightmost(0),
        &wad(T0),
        &config,
        &mut events,
    )
    .unwrap();
    assert_eq!(non_boundary(&exact).len(), 1);

    let mut narrow = build_line(50, vec![]);
    narrow
        .get_mut(&EntityId::rightmost(0))
        .unwrap()
        .last_x -= 1;
    spawn_or_schedule(
        &mut narrow,
        &EntityId::leftmost(0),
        &EntityId::rightmost(0),
        &wad(T0),
        &config,
        &mut events,
    )
    .unwrap();
    assert!(non_boundary(&narrow).is_empty());
}

#[test]
fn scenario_c_wall_beats_heavy_food() {
    let line = build_line(
        200,
        vec![
            entity(1, EntityType::Wall, 30, 1, 10),
            entity(2, EntityType::Food, 1_000, 0, 40),
        ],
    );
    let due = first_due(&line);
    let mut options = ForwardOptions::until(due);
    options.notify = true;

    let out = forward_state_to(&live(vec![line]), &GameConfig::default(), &options).unwrap();

    let line = &out.state.lines[0];
    assert!(line.get(&EntityId::from(2)).is_none());
    assert_eq!(line.get(&EntityId::from(1)).unwrap().mass, wad(30));
    assert!(out.events.contains(&ResolutionEvent::Consumed {
        winner: EntityId::from(1),
        loser: EntityId::from(2),
    }));
}

#[test]
fn scenario_d_mismatched_entry_is_dropped() {
    let mut line = build_line(
        200,
        vec![
            entity(1, EntityType::Alive, 4, 1, 10),
            entity(2, EntityType::Food, 1, 0, 40),
        ],
    );
    let due = first_due(&line);
    // Replace the real entry with one whose key no longer matches.
    line.state.collision_queue.pop();
    line.state
        .collision_queue
        .push(QueueEntry::new(&due - 1, EntityId::from(2)));
    let before = line.clone();

    let out = forward_state_to(
        &live(vec![line]),
        &GameConfig::default(),
        &ForwardOptions::until(due),
    )
    .unwrap();

    let after = &out.state.lines[0];
    assert!(after.state.collision_queue.is_empty());
    for e in before.iter() {
        assert_eq!(after.get(&e.entity_id), Some(e));
    }
}

#[test]
fn consumed_player_gain_is_capped() {
    let mut prey = entity(2, EntityType::Alive, 9, 0, 20);
    prey.consumed_mass = wad(2);
    let line = build_line(
        60,
        vec![entity(1, EntityType::Alive, 16, 1, 10), prey],
    );
    let due = first_due(&line);

    let out = forward_state_to(&live(vec![line]), &GameConfig::default(), &ForwardOptions::until(due))
        .unwrap();

    let winner = out.state.lines[0].get(&EntityId::from(1)).unwrap();
    assert_eq!(winner.mass, wad(18));
    assert_eq!(winner.consumed_mass, wad(2));
    assert_eq!(
        out.state.game_state.high_scores[&EntityId::from(2)].values(),
        &[wad(2)]
    );
}

fn random_state(seed: u64) -> LiveState {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut inner = Vec::new();
    for i in 0..12u64 {
        let etype = if rng.random_bool(0.5) {
            EntityType::Alive
        } else {
            EntityType::Food
        };
        let vel = if etype == EntityType::Alive {
            rng.random_range(-2..=2)
        } else {
            0
        };
        let mass = rng.random_range(1..=4);
        inner.push(entity(i + 1, etype, mass, vel, 20 * i as i64 + 10));
    }
    live(vec![build_line(300, inner)])
}

#[test]
fn forwarding_is_deterministic() {
    let config = GameConfig::default();
    let state = random_state(7);
    let mut options = ForwardOptions::until(wad(T0 + 30));
    options.notify = true;

    let a = forward_state_to(&state, &config, &options).unwrap();
    let b = forward_state_to(&state, &config, &options).unwrap();

    assert_eq!(a.state, b.state);
    assert_eq!(a.events, b.events);
    assert!(!a.events.is_empty());
    a.state.lines[0].ordered_ids().unwrap();
}

#[test]
fn forwarding_in_steps_matches_one_pass() {
    let config = GameConfig::default();
    let state = random_state(11);

    let direct = forward_state_to(&state, &config, &ForwardOptions::until(wad(T0 + 20))).unwrap();
    let half = forward_state_to(&state, &config, &ForwardOptions::until(wad(T0 + 10))).unwrap();
    let stepped =
        forward_state_to(&half.state, &config, &ForwardOptions::until(wad(T0 + 20))).unwrap();

    assert_eq!(direct.state, stepped.state);
}
