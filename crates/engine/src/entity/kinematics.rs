//! Entity kinematics: where an entity is, how fast it goes, and when two
//! neighbors meet. All pure; motion is linear between touches.

use num_bigint::BigInt;
use num_traits::{Signed, Zero};

use super::Entity;
use crate::math::{div_wad, log10_wad, mul_wad, sqrt_wad, MathError, Wad};

/// Added to mass before taking its log so the result stays positive.
pub const VELOCITY_MASS_EPSILON: u64 = 1_000_000_001_000_000_000;

/// Diameter grows with the square root of mass (strictly sub-linear).
#[inline]
pub fn mass_to_diameter(mass: &Wad) -> Wad {
    sqrt_wad(mass)
}

/// Speed decays logarithmically with mass: `k / log10(mass + epsilon)`.
pub fn mass_to_speed(mass: &Wad, velocity_coefficient: &Wad) -> Result<Wad, MathError> {
    let denominator = log10_wad(&(mass + BigInt::from(VELOCITY_MASS_EPSILON)))?;
    div_wad(velocity_coefficient, &denominator)
}

pub fn mass_after_line_jump(mass: &Wad, line_jump_decay_factor: &Wad) -> Wad {
    mul_wad(mass, line_jump_decay_factor)
}

#[inline]
pub fn diameter(entity: &Entity) -> Wad {
    mass_to_diameter(&entity.mass)
}

/// Signed velocity.
pub fn velocity(entity: &Entity, velocity_coefficient: &Wad) -> Result<Wad, MathError> {
    Ok(mul_wad(
        &mass_to_speed(&entity.mass, velocity_coefficient)?,
        &entity.vel_multiplier,
    ))
}

/// Left edge at `time`.
pub fn position(entity: &Entity, time: &Wad, velocity_coefficient: &Wad) -> Result<Wad, MathError> {
    let elapsed = time - &entity.last_touched_time;
    Ok(&entity.last_x + mul_wad(&velocity(entity, velocity_coefficient)?, &elapsed))
}

pub fn is_powered_up(entity: &Entity, time: &Wad, power_pellet_effect_time: &Wad) -> bool {
    time - &entity.last_consumed_power_pellet_time <= *power_pellet_effect_time
}

/// Absolute time at which `right` runs into `left`, or 0 if they never close.
///
/// Solves `left.x(t) + left.diameter == right.x(t)` with both trajectories
/// anchored at their own last-touched times.
pub fn collision_time(
    left: &Entity,
    right: &Entity,
    velocity_coefficient: &Wad,
) -> Result<Wad, MathError> {
    let left_right_edge = &left.last_x + diameter(left);
    let right_left_edge = &right.last_x;
    let left_velocity = velocity(left, velocity_coefficient)?;
    let right_velocity = velocity(right, velocity_coefficient)?;

    let closing = &left_velocity - &right_velocity;
    if !closing.is_positive() {
        return Ok(BigInt::zero());
    }

    let numerator = (right_left_edge - left_right_edge)
        + mul_wad(&left.last_touched_time, &left_velocity)
        - mul_wad(&right.last_touched_time, &right_velocity);
    div_wad(&numerator, &closing)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::{to_f64, wad};
    use protocol::{EntityId, EntityType};
    use proptest::prelude::*;

    fn mover(id: u64, mass: i64, x: i64, multiplier: i64) -> Entity {
        Entity {
            vel_multiplier: wad(multiplier),
            last_x: wad(x),
            ..Entity::consumable(EntityId::from(id), EntityType::Alive, wad(mass))
        }
    }

    #[test]
    fn test_diameter_is_sqrt_of_mass() {
        assert_eq!(mass_to_diameter(&wad(4)), wad(2));
        assert_eq!(diameter(&mover(1, 9, 0, 0)), wad(3));
    }

    #[test]
    fn test_speed_decreases_with_mass() {
        let k = wad(20);
        let light = mass_to_speed(&wad(2), &k).unwrap();
        let heavy = mass_to_speed(&wad(200), &k).unwrap();
        assert!(light > heavy);
        assert!(heavy.is_positive());
        // Massless entities still get a finite speed.
        assert!(mass_to_speed(&BigInt::zero(), &k).unwrap().is_positive());
    }

    #[test]
    fn test_velocity_sign_follows_multiplier() {
        let k = wad(20);
        assert!(velocity(&mover(1, 4, 0, 1), &k).unwrap().is_positive());
        assert!(velocity(&mover(1, 4, 0, -1), &k).unwrap().is_negative());
        assert!(velocity(&mover(1, 4, 0, 0), &k).unwrap().is_zero());
    }

    #[test]
    fn test_position_extrapolates_linearly() {
        let k = wad(20);
        let mut e = mover(1, 4, 10, 1);
        e.last_touched_time = wad(100);
        let v = velocity(&e, &k).unwrap();
        assert_eq!(position(&e, &wad(100), &k).unwrap(), wad(10));
        assert_eq!(position(&e, &wad(102), &k).unwrap(), wad(10) + mul_wad(&v, &wad(2)));
    }

    #[test]
    fn test_power_up_window_is_inclusive() {
        let mut e = mover(1, 4, 0, 1);
        e.last_consumed_power_pellet_time = wad(50);
        assert!(is_powered_up(&e, &wad(60), &wad(10)));
        assert!(!is_powered_up(&e, &(wad(60) + 1), &wad(10)));
    }

    #[test]
    fn test_equal_velocities_never_collide() {
        let k = wad(20);
        // Overlapping in projection, same speed and direction.
        let left = mover(1, 4, 0, 1);
        let right = mover(2, 4, 1, 1);
        assert_eq!(collision_time(&left, &right, &k).unwrap(), BigInt::zero());
    }

    #[test]
    fn test_separating_pair_never_collides() {
        let k = wad(20);
        let left = mover(1, 4, 0, -1);
        let right = mover(2, 4, 10, 1);
        assert_eq!(collision_time(&left, &right, &k).unwrap(), BigInt::zero());
    }

    #[test]
    fn test_closing_pair_meets_at_touching_edges() {
        let k = wad(20);
        let left = mover(1, 4, 0, 1);
        let right = mover(2, 4, 10, 0);
        let t = collision_time(&left, &right, &k).unwrap();
        assert!(t.is_positive());

        // At t the left entity's right edge reaches the static right edge.
        let left_right_edge = position(&left, &t, &k).unwrap() + diameter(&left);
        let gap = to_f64(&(right.last_x.clone() - left_right_edge)).abs();
        assert!(gap < 1e-9, "gap at collision was {gap}");
    }

    #[test]
    fn test_line_jump_decay() {
        let decay = BigInt::from(900_000_000_000_000_000u64);
        assert_eq!(mass_after_line_jump(&wad(10), &decay), wad(9));
    }

    proptest! {
        #[test]
        fn prop_diameter_is_sub_linear(a in 1u64..1_000_000_000, b in 1u64..1_000_000_000) {
            let (m1, m2) = (BigInt::from(a.min(b)) * 1_000_000_000u64, BigInt::from(a.max(b)) * 1_000_000_000u64);
            prop_assume!(m2 > m1);
            let combined = mass_to_diameter(&(&m1 + &m2));
            prop_assert!(combined < mass_to_diameter(&m1) + mass_to_diameter(&m2));
        }
    }
}
