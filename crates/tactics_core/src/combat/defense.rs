//! Early-rush defense override.
//!
//! While a rush is detected the army and a capped pool of pulled workers
//! fight at the first threatened base. Workers keep their defender slot
//! across ticks so the pool does not churn; once the base is clear every
//! pulled worker goes back to mining.

use std::collections::BTreeSet;

use tracing::{debug, info};

use crate::combat::{is_retreating, Army};
use crate::config::{CombatConfig, ControllerConfig};
use crate::math::fx;
use crate::orders::{CommandBuffer, Order, Target};
use crate::snapshot::{closer_than, closest_to, Entity, EntityId, WorldSnapshot};
use crate::state::{EngineState, Stance};
use crate::threat::LocalThreats;

/// Number of workers to pull against an enemy force of `power`.
#[must_use]
pub fn defender_pool_size(power: u32, total_workers: u32, config: &CombatConfig) -> u32 {
    if total_workers > config.established_workers {
        (power + config.defender_extra).min(config.defender_cap_established)
    } else {
        power.min(config.defender_cap)
    }
}

/// Previous defenders first, then the workers nearest the base.
fn select_defenders<'a>(
    world: &'a impl WorldSnapshot,
    previous: &BTreeSet<EntityId>,
    base: &Entity,
    pool: u32,
    config: &CombatConfig,
) -> Vec<&'a Entity> {
    let workers = world.workers();
    let mut nearby = closer_than(
        workers.iter().copied(),
        base.position,
        fx(config.defender_pickup_radius),
    );
    nearby.sort_by_key(|w| (w.position.distance_squared(base.position), w.id));

    // A previous defender that wandered off loses its slot
    let mut chosen: Vec<&Entity> = nearby
        .iter()
        .copied()
        .filter(|w| previous.contains(&w.id))
        .take(pool as usize)
        .collect();
    for worker in nearby {
        if chosen.len() >= pool as usize {
            break;
        }
        if !worker.is_constructing && !chosen.iter().any(|c| c.id == worker.id) {
            chosen.push(worker);
        }
    }
    chosen
}

fn send_to_mine(world: &impl WorldSnapshot, worker: &Entity, buffer: &mut CommandBuffer) {
    if let Some(field) = closest_to(world.mineral_fields(), worker.position) {
        buffer.push(Order::Gather {
            unit: worker.id,
            field: field.id,
        });
    }
}

/// Fight at the first threatened base with the army and pulled workers.
pub fn early_game_defense<W: WorldSnapshot>(
    world: &W,
    state: &mut EngineState,
    config: &ControllerConfig,
    army: &Army<'_>,
    buffer: &mut CommandBuffer,
) {
    let radius = fx(config.threat.base_threat_radius);
    let threatened = world.townhalls().into_iter().find_map(|base| {
        let threats = LocalThreats::around(world, base.position, radius);
        (!threats.is_empty()).then_some((base, threats))
    });

    let Some((base, threats)) = threatened else {
        for worker in world.workers() {
            if state.defenders.contains(&worker.id) && worker.is_attacking {
                send_to_mine(world, worker, buffer);
            }
        }
        if !state.defenders.is_empty() {
            info!(released = state.defenders.len(), "rush cleared, releasing defenders");
        }
        state.defenders.clear();
        return;
    };

    let c = &config.combat;
    let power = threats.power(c.offensive_structure_power);
    let pool = defender_pool_size(power, world.workers().len() as u32, c);
    let defenders = select_defenders(world, &state.defenders, base, pool, c);
    debug!(base = %base.id, power, pool, pulled = defenders.len(), "early defense");
    state.defenders = defenders.iter().map(|w| w.id).collect();

    let fighters = army
        .infantry
        .iter()
        .chain(&army.siege)
        .filter(|u| !is_retreating(state, u.id))
        .chain(&defenders);
    let mut orders = Vec::new();
    for unit in fighters {
        if let Some(target) = threats.priority_target(unit.position) {
            orders.push((unit.id, target.id));
        }
    }
    for (unit, target) in orders {
        state.set_stance(unit, Stance::Defending);
        buffer.push(Order::Attack {
            unit,
            target: Target::Unit(target),
        });
    }

    let pickup = fx(c.defender_pickup_radius);
    for worker in world.workers() {
        if worker.is_attacking
            && !state.defenders.contains(&worker.id)
            && worker.position.within(base.position, pickup)
        {
            send_to_mine(world, worker, buffer);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Vec2Fixed;
    use crate::snapshot::MapInfo;
    use crate::terrain::TerrainGrid;
    use crate::unit_kind::UnitKind;
    use crate::world::StaticWorld;

    fn world() -> StaticWorld {
        let map = MapInfo {
            start: Vec2Fixed::from_ints(30, 30),
            enemy_start: Vec2Fixed::from_ints(170, 170),
            map_center: Vec2Fixed::from_ints(100, 100),
            ramp_top_center: Vec2Fixed::from_ints(40, 40),
            expansion_locations: Vec::new(),
        };
        let mut world = StaticWorld::new(map, TerrainGrid::new(200, 200)).at_time(60);
        world.spawn_own(UnitKind::CommandCenter, Vec2Fixed::from_ints(30, 30));
        world.add_minerals(Vec2Fixed::from_ints(24, 30), 1500);
        world
    }

    fn add_workers(w: &mut StaticWorld, n: i32) {
        for i in 0..n {
            w.spawn_own(UnitKind::Scv, Vec2Fixed::from_ints(28 + i % 4, 32 + i / 4));
        }
    }

    fn run_defense(w: &StaticWorld, state: &mut EngineState) -> Vec<Order> {
        let config = ControllerConfig::default();
        let army = Army::gather(w, &BTreeSet::new());
        let mut buffer = CommandBuffer::new(w.economy());
        early_game_defense(w, state, &config, &army, &mut buffer);
        buffer.into_orders()
    }

    #[test]
    fn test_pool_size_tiers() {
        let c = CombatConfig::default();
        assert_eq!(defender_pool_size(3, 12, &c), 3);
        assert_eq!(defender_pool_size(15, 12, &c), 8);
        assert_eq!(defender_pool_size(3, 22, &c), 5);
        assert_eq!(defender_pool_size(15, 22, &c), 12);
    }

    #[test]
    fn test_pulls_capped_workers_and_army() {
        let mut w = world();
        add_workers(&mut w, 12);
        let marine = w.spawn_own(UnitKind::Marine, Vec2Fixed::from_ints(35, 35));
        let ling = w.spawn_enemy(UnitKind::Zergling, Vec2Fixed::from_ints(45, 30));
        w.spawn_enemy(UnitKind::Zergling, Vec2Fixed::from_ints(46, 30));
        let mut state = EngineState::new(1);

        let orders = run_defense(&w, &mut state);
        assert_eq!(state.defenders.len(), 2);
        assert_eq!(orders.len(), 3);
        assert!(orders.contains(&Order::Attack {
            unit: marine,
            target: Target::Unit(ling),
        }));
        assert_eq!(state.stance(marine), Some(Stance::Defending));
    }

    #[test]
    fn test_previous_defenders_kept() {
        let mut w = world();
        add_workers(&mut w, 6);
        let kept = w.spawn_own(UnitKind::Scv, Vec2Fixed::from_ints(37, 30));
        w.spawn_enemy(UnitKind::Zergling, Vec2Fixed::from_ints(45, 30));
        let mut state = EngineState::new(1);
        state.defenders.insert(kept);

        run_defense(&w, &mut state);
        assert_eq!(state.defenders.len(), 1);
        assert!(state.defenders.contains(&kept));
    }

    #[test]
    fn test_distant_previous_defender_dropped() {
        let mut w = world();
        add_workers(&mut w, 6);
        let far = w.spawn_own(UnitKind::Scv, Vec2Fixed::from_ints(150, 150));
        w.spawn_enemy(UnitKind::Zergling, Vec2Fixed::from_ints(45, 30));
        let mut state = EngineState::new(1);
        state.defenders.insert(far);

        let orders = run_defense(&w, &mut state);
        assert_eq!(state.defenders.len(), 1);
        assert!(!state.defenders.contains(&far));
        assert!(orders.iter().all(|o| o.subject() != far));
    }

    #[test]
    fn test_clear_base_releases_defenders() {
        let mut w = world();
        let id = w.next_entity_id();
        w.push_own(Entity::new(id, UnitKind::Scv, Vec2Fixed::from_ints(40, 30)).attacking());
        let mut state = EngineState::new(1);
        state.defenders.insert(EntityId(id));

        let orders = run_defense(&w, &mut state);
        assert!(state.defenders.is_empty());
        assert!(matches!(orders[0], Order::Gather { unit, .. } if unit == EntityId(id)));
    }

    #[test]
    fn test_stray_attacking_worker_returns_to_mine() {
        let mut w = world();
        w.spawn_enemy(UnitKind::Zergling, Vec2Fixed::from_ints(45, 30));
        // Near the base but beyond the pool of one
        let pulled = w.next_entity_id();
        w.push_own(Entity::new(pulled, UnitKind::Scv, Vec2Fixed::from_ints(32, 30)).attacking());
        let stray = w.next_entity_id();
        w.push_own(Entity::new(stray, UnitKind::Scv, Vec2Fixed::from_ints(36, 30)).attacking());
        let mut state = EngineState::new(1);

        let orders = run_defense(&w, &mut state);
        assert!(state.defenders.contains(&EntityId(pulled)));
        assert!(!state.defenders.contains(&EntityId(stray)));
        assert!(orders
            .iter()
            .any(|o| matches!(o, Order::Gather { unit, .. } if *unit == EntityId(stray))));
    }

    #[test]
    fn test_attacking_worker_elsewhere_left_alone() {
        let mut w = world();
        w.spawn_enemy(UnitKind::Zergling, Vec2Fixed::from_ints(45, 30));
        let id = w.next_entity_id();
        w.push_own(Entity::new(id, UnitKind::Scv, Vec2Fixed::from_ints(120, 120)).attacking());
        let mut state = EngineState::new(1);

        let orders = run_defense(&w, &mut state);
        assert!(!state.defenders.contains(&EntityId(id)));
        assert!(orders.iter().all(|o| o.subject() != EntityId(id)));
    }
}
