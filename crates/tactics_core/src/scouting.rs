//! Reconnaissance: keep a small rotating set of scouts touring the map.
//!
//! Scouts are drawn from idle flying support first and from the infantry
//! only when the army can spare one. Each scout heads for the stalest
//! eligible target; a location is ineligible for a while after a visit.

use tracing::{debug, info};

use crate::config::{ControllerConfig, ScoutingConfig};
use crate::math::{fx, percent, Fixed, Vec2Fixed};
use crate::orders::{CommandBuffer, Order};
use crate::snapshot::{closest_to, Entity, WorldSnapshot};
use crate::state::{EngineState, Stance};
use crate::unit_kind::UnitRole;

/// An own townhall this close to an expansion site makes it ours.
const OWNED_SITE_RADIUS: i32 = 6;

/// Scouts wanted at match time `now`.
#[must_use]
pub fn desired_scouts(now: Fixed, config: &ScoutingConfig) -> usize {
    if now < Fixed::from_num(config.second_scout_secs) {
        1
    } else {
        2
    }
}

/// Every location worth a look: enemy start, unowned expansion sites and the
/// map center.
pub fn scout_targets(world: &impl WorldSnapshot) -> Vec<Vec2Fixed> {
    let map = world.map();
    let owned = |site: Vec2Fixed| {
        world
            .townhalls()
            .iter()
            .any(|t| t.position.within(site, fx(OWNED_SITE_RADIUS)))
    };
    std::iter::once(map.enemy_start)
        .chain(map.expansion_locations.iter().copied().filter(|&s| !owned(s)))
        .chain(std::iter::once(map.map_center))
        .collect()
}

/// Stalest eligible target; never-visited locations come first, then the
/// nearest.
pub fn pick_target(
    targets: &[Vec2Fixed],
    state: &EngineState,
    now: Fixed,
    from: Vec2Fixed,
    config: &ScoutingConfig,
) -> Option<Vec2Fixed> {
    let cooldown = Fixed::from_num(config.revisit_secs);
    targets
        .iter()
        .copied()
        .filter(|&t| state.scouted.is_eligible(t, now, cooldown))
        .min_by_key(|&t| {
            (
                state.scouted.last_visit(t).unwrap_or(Fixed::MIN),
                t.distance_squared(from),
            )
        })
}

fn is_flying_support(unit: &Entity) -> bool {
    unit.is_flying && matches!(unit.role(), UnitRole::Healer | UnitRole::Caster)
}

/// Top up the scout registry to the desired count.
fn assign_scouts(world: &impl WorldSnapshot, state: &mut EngineState, config: &ScoutingConfig) {
    let wanted = desired_scouts(world.time(), config);
    if state.scouts.len() >= wanted {
        return;
    }

    let support: Vec<&Entity> = world
        .army()
        .into_iter()
        .filter(|u| is_flying_support(u) && u.is_idle && !state.scouts.contains(&u.id))
        .collect();
    for unit in support {
        if state.scouts.len() >= wanted {
            return;
        }
        info!(unit = %unit.id, kind = ?unit.kind, "assigned flying scout");
        state.scouts.insert(unit.id);
    }

    if state.scouts.len() >= wanted {
        return;
    }
    let infantry = world.infantry();
    if infantry.len() as u32 <= config.spare_combat_threshold {
        return;
    }
    let spare = infantry
        .into_iter()
        .find(|u| !state.scouts.contains(&u.id) && !state.retreats.contains(u.id));
    if let Some(unit) = spare {
        info!(unit = %unit.id, kind = ?unit.kind, "drafted spare scout");
        state.scouts.insert(unit.id);
    }
}

/// Wounded scouts with an enemy close by head home.
fn should_flee(world: &impl WorldSnapshot, scout: &Entity, config: &ScoutingConfig) -> bool {
    if scout.health >= percent(config.flee_health_pct) {
        return false;
    }
    closest_to(world.enemy_units(), scout.position)
        .is_some_and(|e| e.position.within(scout.position, fx(config.flee_radius)))
}

/// One scouting pass.
pub fn run<W: WorldSnapshot>(
    world: &W,
    state: &mut EngineState,
    config: &ControllerConfig,
    buffer: &mut CommandBuffer,
) {
    let c = &config.scouting;
    assign_scouts(world, state, c);

    let now = world.time();
    let targets = scout_targets(world);
    let arrival = fx(c.arrival_radius);
    let scouts: Vec<&Entity> = state
        .scouts
        .iter()
        .filter_map(|id| world.entity(*id))
        .collect();

    for scout in scouts {
        state.set_stance(scout.id, Stance::Scouting);

        if should_flee(world, scout, c) {
            debug!(scout = %scout.id, "scout fleeing home");
            buffer.push(Order::Move {
                unit: scout.id,
                to: world.map().start,
            });
            continue;
        }

        for &target in &targets {
            if scout.position.within(target, arrival) {
                debug!(scout = %scout.id, x = %target.x, y = %target.y, "location scouted");
                state.scouted.visit(target, now);
            }
        }

        if let Some(target) = pick_target(&targets, state, now, scout.position, c) {
            buffer.push(Order::Move {
                unit: scout.id,
                to: target,
            });
        }
    }
}
