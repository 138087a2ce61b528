//! Economy management, run every tick.
//!
//! Keeps worker production going until the bases are saturated, adds supply
//! ahead of demand, morphs command centers into orbitals and spends orbital
//! energy on MULEs. Depots are lowered while the area is quiet and raised
//! when enemies walk up to them.
//!
//! All decisions read the snapshot and the tick's [`CommandBuffer`]; nothing
//! here holds state of its own.

use std::cmp::Reverse;

use tracing::debug;

use crate::config::{ControllerConfig, ProductionConfig};
use crate::math::{fx, Vec2Fixed};
use crate::orders::{Ability, CommandBuffer, Target};
use crate::snapshot::{closer_than, closest_to, Entity, WorldSnapshot};
use crate::state::EngineState;
use crate::unit_kind::UnitKind;

/// Supply cap of the game.
pub const MAX_SUPPLY: u32 = 200;

/// Nearest worker free to construct: mining or idle, not already building,
/// not pulled for defense or scouting, and not given a job this tick.
pub fn pick_builder<'a>(
    world: &'a impl WorldSnapshot,
    state: &EngineState,
    buffer: &CommandBuffer,
    near: Vec2Fixed,
) -> Option<&'a Entity> {
    let candidates = world.workers().into_iter().filter(|w| {
        (w.is_gathering || w.is_idle)
            && !w.is_constructing
            && !state.defenders.contains(&w.id)
            && !state.scouts.contains(&w.id)
            && !buffer.is_claimed(w.id)
    });
    closest_to(candidates, near)
}

/// Workers plus MULE income expressed in workers.
pub fn effective_workers(world: &impl WorldSnapshot, config: &ProductionConfig) -> u32 {
    let mules = world.units_of(UnitKind::Mule).len() as u32;
    world.workers().len() as u32 + config.mule_worker_equivalent * mules
}

/// Queue workers on idle townhalls until the effective count reaches the
/// global cap or the per-base cap.
pub fn train_workers(world: &impl WorldSnapshot, config: &ProductionConfig, buffer: &mut CommandBuffer) {
    let ready = world.ready_townhalls();
    let per_base_cap = config.workers_per_base * ready.len() as u32;
    let mut effective = effective_workers(world, config) + buffer.queued(UnitKind::Scv);
    let cost = world.unit_cost(UnitKind::Scv);
    for townhall in ready.into_iter().filter(|t| t.is_idle) {
        if effective >= config.max_workers || effective >= per_base_cap {
            break;
        }
        if buffer.train(townhall.id, 1, UnitKind::Scv, cost) {
            effective += 1;
        }
    }
}

/// Maximum depots under construction at once.
#[must_use]
pub fn max_pending_depots(ready_bases: usize) -> u32 {
    if ready_bases > 1 {
        2
    } else {
        1
    }
}

/// Start a depot when free supply runs low relative to the base count.
pub fn build_supply(
    world: &impl WorldSnapshot,
    state: &EngineState,
    config: &ProductionConfig,
    buffer: &mut CommandBuffer,
) {
    let economy = world.economy();
    let bases = world.townhalls().len().max(1) as u32;
    if economy.supply_cap >= MAX_SUPPLY
        || buffer.supply_left() >= config.supply_headroom_per_base * bases
    {
        return;
    }
    let pending = world.pending(UnitKind::SupplyDepot) + buffer.queued(UnitKind::SupplyDepot);
    if pending >= max_pending_depots(world.ready_townhalls().len()) {
        return;
    }
    let near = world
        .townhalls()
        .first()
        .map_or(world.map().start, |t| t.position);
    let Some(spot) = world.fallback_placement(UnitKind::SupplyDepot, near) else {
        return;
    };
    let Some(builder) = pick_builder(world, state, buffer, spot) else {
        return;
    };
    if buffer.build(builder.id, UnitKind::SupplyDepot, spot, world.unit_cost(UnitKind::SupplyDepot)) {
        debug!(builder = %builder.id, x = %spot.x, y = %spot.y, "supply depot");
    }
}

/// Lower quiet depots, raise lowered ones with enemies close by.
pub fn toggle_depots(world: &impl WorldSnapshot, config: &ProductionConfig, buffer: &mut CommandBuffer) {
    let radius = fx(config.depot_raise_radius);
    let enemy_near = |depot: &Entity| {
        world
            .enemy_units()
            .iter()
            .any(|e| e.position.within(depot.position, radius))
    };
    for depot in world.ready_structures_of(UnitKind::SupplyDepot) {
        if !enemy_near(depot) {
            buffer.ability(depot.id, Ability::LowerDepot, None);
        }
    }
    for depot in world.ready_structures_of(UnitKind::SupplyDepotLowered) {
        if enemy_near(depot) {
            buffer.ability(depot.id, Ability::RaiseDepot, None);
        }
    }
}

/// Morph idle command centers once a barracks is up.
pub fn upgrade_orbitals(world: &impl WorldSnapshot, buffer: &mut CommandBuffer) {
    if world.ready_structures_of(UnitKind::Barracks).is_empty() {
        return;
    }
    let cost = world.unit_cost(UnitKind::OrbitalCommand);
    for cc in world.ready_structures_of(UnitKind::CommandCenter) {
        if cc.is_idle && buffer.morph(cc.id, Ability::UpgradeToOrbital, cost) {
            debug!(townhall = %cc.id, "orbital upgrade");
        }
    }
}

/// Drop MULEs on the richest nearby mineral field, nearest on ties.
pub fn call_down_mules(world: &impl WorldSnapshot, config: &ProductionConfig, buffer: &mut CommandBuffer) {
    for orbital in world.ready_structures_of(UnitKind::OrbitalCommand) {
        if orbital.energy < config.mule_energy || buffer.is_claimed(orbital.id) {
            continue;
        }
        let fields = closer_than(world.mineral_fields(), orbital.position, fx(config.mule_radius));
        let best = fields.into_iter().max_by_key(|f| {
            (
                f.remaining,
                Reverse(f.position.distance_squared(orbital.position)),
                Reverse(f.id),
            )
        });
        if let Some(field) = best {
            buffer.ability(orbital.id, Ability::CalldownMule, Some(Target::Unit(field.id)));
        }
    }
}

/// Every-tick economy pass.
pub fn run(
    world: &impl WorldSnapshot,
    state: &EngineState,
    config: &ControllerConfig,
    buffer: &mut CommandBuffer,
) {
    let production = &config.production;
    build_supply(world, state, production, buffer);
    toggle_depots(world, production, buffer);
    upgrade_orbitals(world, buffer);
    call_down_mules(world, production, buffer);
    train_workers(world, production, buffer);
}
