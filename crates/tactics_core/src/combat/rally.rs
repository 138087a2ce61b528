//! Hold the army at a forward rally point while it grows.

use crate::combat::{is_retreating, Army};
use crate::config::ControllerConfig;
use crate::math::{fx, Vec2Fixed};
use crate::orders::{Ability, CommandBuffer, Order, Target};
use crate::snapshot::{closest_to, EntityId, WorldSnapshot};
use crate::state::{EngineState, Stance};

/// Where the army gathers: in front of the ready base nearest the map
/// center once two bases are up, otherwise the top of the main ramp.
pub fn rally_point(world: &impl WorldSnapshot, config: &ControllerConfig) -> Vec2Fixed {
    let ready = world.ready_townhalls();
    let map = world.map();
    if ready.len() < 2 {
        return map.ramp_top_center;
    }
    closest_to(ready, map.map_center).map_or(map.ramp_top_center, |base| {
        base.position
            .towards(map.map_center, fx(config.combat.rally_forward_bias))
    })
}

/// Per-unit spread around the rally point on a 3x3 lattice.
#[must_use]
pub fn rally_offset(id: EntityId, spread: i32) -> (i32, i32) {
    let column = (id.0 % 3) as i32 - 1;
    let row = (id.0 / 3 % 3) as i32 - 1;
    (column * spread, row * spread)
}

/// Move every non-retreating fighter to the rally point.
pub fn rally<W: WorldSnapshot>(
    world: &W,
    state: &mut EngineState,
    config: &ControllerConfig,
    army: &Army<'_>,
    buffer: &mut CommandBuffer,
) {
    let point = rally_point(world, config);
    let c = &config.combat;

    for unit in &army.infantry {
        if is_retreating(state, unit.id) {
            continue;
        }
        let (dx, dy) = rally_offset(unit.id, c.rally_spread);
        state.set_stance(unit.id, Stance::Rallying);
        buffer.push(Order::Attack {
            unit: unit.id,
            target: Target::Position(point.offset(fx(dx), fx(dy))),
        });
    }

    for tank in &army.siege {
        state.set_stance(tank.id, Stance::Rallying);
        let distance = tank.distance_to(point);
        if tank.kind.is_sieged() {
            if distance > fx(c.rally_siege_exit) {
                buffer.ability(tank.id, Ability::Unsiege, None);
            }
        } else if distance <= fx(c.rally_siege_enter) {
            buffer.ability(tank.id, Ability::SiegeMode, None);
        } else {
            buffer.push(Order::Move {
                unit: tank.id,
                to: point,
            });
        }
    }
}
