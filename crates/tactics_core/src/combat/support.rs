//! Healers and casters trail the infantry.

use rand::seq::SliceRandom;

use crate::combat::Army;
use crate::config::ControllerConfig;
use crate::math::{fx, Fixed, Vec2Fixed};
use crate::orders::{CommandBuffer, Order};
use crate::snapshot::{center, closest_to, Entity, WorldSnapshot};
use crate::state::EngineState;

fn follow_centroid(unit: &Entity, centroid: Vec2Fixed, leash: Fixed, buffer: &mut CommandBuffer) {
    if unit.distance_to(centroid) > leash {
        buffer.push(Order::Move {
            unit: unit.id,
            to: centroid,
        });
    }
}

/// Keep support units with the fight. With enemies in view each one
/// escorts a randomly picked front-line unit; otherwise it stays leashed to
/// the infantry centroid.
pub fn follow_army<W: WorldSnapshot>(
    world: &W,
    state: &mut EngineState,
    config: &ControllerConfig,
    army: &Army<'_>,
    buffer: &mut CommandBuffer,
) {
    let Some(centroid) = center(army.infantry.iter().copied()) else {
        return;
    };
    let c = &config.combat;
    let enemies: Vec<&Entity> = world
        .enemy_units()
        .iter()
        .filter(|u| !u.kind.is_ignored_target())
        .chain(world.enemy_structures())
        .collect();

    let forward: Vec<&Entity> = army
        .infantry
        .iter()
        .copied()
        .filter(|u| {
            closest_to(enemies.iter().copied(), u.position)
                .is_some_and(|e| e.position.within(u.position, fx(c.forward_radius)))
        })
        .collect();

    let groups = [
        (&army.healers, fx(c.healer_leash), fx(c.healer_escort)),
        (&army.casters, fx(c.caster_leash), fx(c.caster_escort)),
    ];
    for (units, leash, escort) in groups {
        for unit in units.iter().copied() {
            match forward.choose(&mut state.rng) {
                Some(front) if unit.distance_to(front.position) > escort => {
                    buffer.push(Order::Move {
                        unit: unit.id,
                        to: front.position,
                    });
                }
                Some(_) => {}
                None => follow_centroid(unit, centroid, leash, buffer),
            }
        }
    }
}
