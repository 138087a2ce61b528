//! Production scheduling: structures, addons, research and army units.
//!
//! Runs on the production cadence. Every target count is a pure function
//! of the snapshot (plus what this tick's [`CommandBuffer`] already
//! queued), and every producer takes at most one job per tick. Order within
//! a pass matters: gas and tech structures claim minerals before barracks,
//! and addons claim hosts before units are queued on them.

use tracing::{debug, info};

use crate::config::{ControllerConfig, ProductionConfig};
use crate::economy::pick_builder;
use crate::math::{fx, Vec2Fixed};
use crate::orders::{Ability, CommandBuffer, Target, Upgrade};
use crate::placement::{addon_clearance, find_placement, landing_site, SiteRequest};
use crate::snapshot::{closer_than, closest_to, Entity, WorldSnapshot};
use crate::state::EngineState;
use crate::unit_kind::{AddonKind, UnitKind};

/// Ready, airborne, pending and just-queued structures of `kind`.
fn total(world: &impl WorldSnapshot, buffer: &CommandBuffer, kind: UnitKind) -> u32 {
    world.structure_total(kind) + buffer.queued(kind)
}

/// Addon flavour currently attached to `host`.
pub fn attached_addon(world: &impl WorldSnapshot, host: &Entity) -> Option<AddonKind> {
    host.addon
        .and_then(|id| world.entity(id))
        .and_then(|addon| addon.kind.addon_kind())
}

/// Barracks wanted: one per six workers, capped by tech tier; exactly the
/// single-base count while only one base is ready.
pub fn barracks_target(world: &impl WorldSnapshot, config: &ProductionConfig) -> u32 {
    match world.ready_townhalls().len() {
        0 => 0,
        1 => config.single_base_barracks,
        _ => {
            let cap = if world.structure_total(UnitKind::Starport) > 0 {
                config.barracks_cap_starport
            } else if world.structure_total(UnitKind::Factory) > 0 {
                config.barracks_cap_factory
            } else {
                config.barracks_cap
            };
            (world.workers().len() as u32 / config.workers_per_barracks.max(1)).min(cap)
        }
    }
}

/// Factories wanted: one per ready base, between one and the configured cap.
pub fn factory_target(world: &impl WorldSnapshot, config: &ProductionConfig) -> u32 {
    (world.ready_townhalls().len() as u32).clamp(1, config.max_factories.max(1))
}

/// Refinery cap for the number of ready bases.
#[must_use]
pub fn max_refineries(ready_bases: u32) -> u32 {
    match ready_bases {
        0 | 1 => 1,
        2 => 3,
        // ceil(1.2 * bases + 2)
        n => (12 * n + 20).div_ceil(10),
    }
}

/// Whether the next barracks addon should be a tech lab.
#[must_use]
pub fn techlab_wanted(techlabs: u32, reactors: u32, config: &ProductionConfig) -> bool {
    let total = techlabs + reactors;
    total == 0 || techlabs * 100 < total * config.techlab_share_pct
}

/// Next research item on a track, if its prerequisites are met.
pub fn next_upgrade(world: &impl WorldSnapshot, track: &[Upgrade], has_armory: bool) -> Option<Upgrade> {
    let next = track.iter().copied().find(|u| !world.upgrade_started(*u))?;
    (next.level() == 1 || has_armory).then_some(next)
}

fn anchor(world: &impl WorldSnapshot) -> Vec2Fixed {
    world
        .townhalls()
        .first()
        .map_or(world.map().start, |t| t.position)
}

fn production_request(world: &impl WorldSnapshot, config: &ControllerConfig, kind: UnitKind) -> SiteRequest {
    let p = &config.placement;
    SiteRequest::new(kind, anchor(world), p.production_clearance, p.production_radius).with_addon()
}

fn tech_request(world: &impl WorldSnapshot, config: &ControllerConfig, kind: UnitKind) -> SiteRequest {
    let p = &config.placement;
    SiteRequest::new(kind, anchor(world), p.tech_clearance, p.tech_radius)
}

/// Site, builder and order for one structure.
fn construct<W: WorldSnapshot>(
    world: &W,
    state: &mut EngineState,
    config: &ControllerConfig,
    request: &SiteRequest,
    buffer: &mut CommandBuffer,
) -> bool {
    let cost = world.unit_cost(request.kind);
    if !buffer.can_afford(cost) {
        return false;
    }
    let Some(site) = find_placement(world, request, &config.placement, &mut state.rng) else {
        return false;
    };
    let Some(builder) = pick_builder(world, state, buffer, site) else {
        debug!(kind = ?request.kind, "no builder available");
        return false;
    };
    let ordered = buffer.build(builder.id, request.kind, site, cost);
    if ordered {
        info!(kind = ?request.kind, builder = %builder.id, x = %site.x, y = %site.y, "construction ordered");
    }
    ordered
}

/// One refinery per pass once a barracks exists, up to the base-scaled cap.
pub fn build_refineries(
    world: &impl WorldSnapshot,
    state: &EngineState,
    config: &ProductionConfig,
    buffer: &mut CommandBuffer,
) {
    if total(world, buffer, UnitKind::Barracks) == 0 {
        return;
    }
    let ready = world.ready_townhalls();
    if total(world, buffer, UnitKind::Refinery) >= max_refineries(ready.len() as u32) {
        return;
    }
    let radius = fx(config.geyser_radius);
    let Some(geyser) = ready
        .iter()
        .find_map(|base| closer_than(world.geysers(), base.position, radius).first().copied())
    else {
        return;
    };
    let miners = world
        .workers()
        .into_iter()
        .filter(|w| w.is_gathering && !buffer.is_claimed(w.id) && !state.defenders.contains(&w.id));
    let Some(builder) = closest_to(miners, geyser.position) else {
        debug!("no miner free for refinery");
        return;
    };
    if buffer.build_on_geyser(builder.id, UnitKind::Refinery, geyser.id, world.unit_cost(UnitKind::Refinery)) {
        debug!(geyser = %geyser.id, builder = %builder.id, "refinery");
    }
}

/// Barracks up to [`barracks_target`].
pub fn build_barracks<W: WorldSnapshot>(
    world: &W,
    state: &mut EngineState,
    config: &ControllerConfig,
    buffer: &mut CommandBuffer,
) {
    if total(world, buffer, UnitKind::Barracks) >= barracks_target(world, &config.production) {
        return;
    }
    let request = production_request(world, config, UnitKind::Barracks);
    construct(world, state, config, &request, buffer);
}

/// Factories: the first once the army has some weight, later ones only for
/// a large ground army.
pub fn build_factory<W: WorldSnapshot>(
    world: &W,
    state: &mut EngineState,
    config: &ControllerConfig,
    buffer: &mut CommandBuffer,
) {
    let c = &config.production;
    if world.ready_structures_of(UnitKind::Barracks).is_empty() {
        return;
    }
    let factories = total(world, buffer, UnitKind::Factory);
    if factories >= factory_target(world, c) {
        return;
    }
    let ready_to_build = if factories == 0 {
        world.military_metric() >= c.factory_metric
    } else {
        world.infantry().len() as u32 >= c.factory_ground_army
    };
    if ready_to_build {
        let request = production_request(world, config, UnitKind::Factory);
        construct(world, state, config, &request, buffer);
    }
}

/// Starports once a factory is up.
pub fn build_starport<W: WorldSnapshot>(
    world: &W,
    state: &mut EngineState,
    config: &ControllerConfig,
    buffer: &mut CommandBuffer,
) {
    let c = &config.production;
    if world.ready_structures_of(UnitKind::Factory).is_empty()
        || world.military_metric() < c.starport_metric
        || total(world, buffer, UnitKind::Starport) >= c.max_starports
    {
        return;
    }
    let request = production_request(world, config, UnitKind::Starport);
    construct(world, state, config, &request, buffer);
}

/// Engineering bays for the two upgrade tracks.
pub fn build_engineering_bay<W: WorldSnapshot>(
    world: &W,
    state: &mut EngineState,
    config: &ControllerConfig,
    buffer: &mut CommandBuffer,
) {
    let c = &config.production;
    if world.military_metric() < c.upgrade_metric {
        return;
    }
    let bays = total(world, buffer, UnitKind::EngineeringBay);
    if bays >= c.max_engineering_bays {
        return;
    }
    if bays >= 1 && world.ready_structures_of(UnitKind::Factory).is_empty() {
        return;
    }
    let request = tech_request(world, config, UnitKind::EngineeringBay);
    construct(world, state, config, &request, buffer);
}

/// A single armory, unlocking upgrade levels 2 and 3.
pub fn build_armory<W: WorldSnapshot>(
    world: &W,
    state: &mut EngineState,
    config: &ControllerConfig,
    buffer: &mut CommandBuffer,
) {
    if world.military_metric() < config.production.upgrade_metric
        || world.ready_structures_of(UnitKind::EngineeringBay).is_empty()
        || world.ready_structures_of(UnitKind::Factory).is_empty()
        || total(world, buffer, UnitKind::Armory) > 0
    {
        return;
    }
    let request = tech_request(world, config, UnitKind::Armory);
    construct(world, state, config, &request, buffer);
}

/// Build an addon on `host`, or lift it when there is no room.
fn attach_addon(
    world: &impl WorldSnapshot,
    host: &Entity,
    flavour: AddonKind,
    buffer: &mut CommandBuffer,
) -> bool {
    let Some(kind) = host.kind.addon(flavour) else {
        return false;
    };
    if addon_clearance(world, host.position) {
        buffer.build_addon(host.id, kind, world.unit_cost(kind))
    } else {
        debug!(host = %host.id, "no room for addon, lifting");
        buffer.ability(host.id, Ability::Lift, None);
        false
    }
}

fn bare_hosts<'a>(world: &'a impl WorldSnapshot, buffer: &CommandBuffer, kind: UnitKind) -> Vec<&'a Entity> {
    world
        .ready_structures_of(kind)
        .into_iter()
        .filter(|h| h.is_idle && h.addon.is_none() && !buffer.is_claimed(h.id))
        .collect()
}

/// Addons for idle, bare production structures.
pub fn append_addons(world: &impl WorldSnapshot, config: &ProductionConfig, buffer: &mut CommandBuffer) {
    let count = |kind: UnitKind, buffer: &CommandBuffer| {
        world.structures_of(kind).len() as u32 + buffer.queued(kind)
    };

    let mut techlabs = count(UnitKind::BarracksTechLab, buffer);
    let mut reactors = count(UnitKind::BarracksReactor, buffer);
    for barracks in bare_hosts(world, buffer, UnitKind::Barracks) {
        let flavour = if techlab_wanted(techlabs, reactors, config) {
            AddonKind::TechLab
        } else {
            AddonKind::Reactor
        };
        if attach_addon(world, barracks, flavour, buffer) {
            match flavour {
                AddonKind::TechLab => techlabs += 1,
                AddonKind::Reactor => reactors += 1,
            }
        }
    }

    for factory in bare_hosts(world, buffer, UnitKind::Factory) {
        attach_addon(world, factory, AddonKind::TechLab, buffer);
    }

    let mut starport_techlab = count(UnitKind::StarportTechLab, buffer) > 0;
    for starport in bare_hosts(world, buffer, UnitKind::Starport) {
        let flavour = if starport_techlab {
            AddonKind::Reactor
        } else {
            AddonKind::TechLab
        };
        if attach_addon(world, starport, flavour, buffer) && flavour == AddonKind::TechLab {
            starport_techlab = true;
        }
    }
}

/// Land idle airborne production structures where the addon fits.
pub fn land_hosts(world: &impl WorldSnapshot, config: &ControllerConfig, buffer: &mut CommandBuffer) {
    let airborne = [
        UnitKind::BarracksFlying,
        UnitKind::FactoryFlying,
        UnitKind::StarportFlying,
    ];
    for kind in airborne {
        for host in world.structures_of(kind) {
            if !host.is_idle || buffer.is_claimed(host.id) {
                continue;
            }
            if let Some(spot) = landing_site(world, host.position, &config.placement) {
                debug!(host = %host.id, x = %spot.x, y = %spot.y, "landing");
                buffer.ability(host.id, Ability::Land, Some(Target::Position(spot)));
            }
        }
    }
}

/// Weapons on the first engineering bay, armor on the second.
pub fn research_upgrades(world: &impl WorldSnapshot, config: &ProductionConfig, buffer: &mut CommandBuffer) {
    if world.military_metric() < config.upgrade_metric {
        return;
    }
    let has_armory = !world.ready_structures_of(UnitKind::Armory).is_empty();
    let bays = world.ready_structures_of(UnitKind::EngineeringBay);
    for (bay, track) in bays.into_iter().zip([Upgrade::WEAPONS, Upgrade::ARMOR]) {
        if !bay.is_idle {
            continue;
        }
        if let Some(upgrade) = next_upgrade(world, &track, has_armory) {
            if buffer.research(bay.id, upgrade) {
                info!(?upgrade, building = %bay.id, "research started");
            }
        }
    }
}

fn idle_producers<'a>(world: &'a impl WorldSnapshot, kind: UnitKind) -> Vec<(&'a Entity, Option<AddonKind>)> {
    world
        .ready_structures_of(kind)
        .into_iter()
        .filter(|h| h.is_idle)
        .map(|h| (h, attached_addon(world, h)))
        .collect()
}

/// Queue army units on idle production structures.
pub fn train_army(world: &impl WorldSnapshot, config: &ProductionConfig, buffer: &mut CommandBuffer) {
    let cost = |kind: UnitKind| world.unit_cost(kind);

    if world.military_metric() >= config.siege_metric {
        for (factory, addon) in idle_producers(world, UnitKind::Factory) {
            if addon == Some(AddonKind::TechLab) {
                buffer.train(factory.id, 1, UnitKind::SiegeTank, cost(UnitKind::SiegeTank));
            }
        }
    }

    let infantry = world.infantry().len() as u32;
    let wanted_healers = infantry / config.infantry_per_healer.max(1);
    let mut healers = world.units_of(UnitKind::Medivac).len() as u32 + buffer.queued(UnitKind::Medivac);
    for (starport, _) in idle_producers(world, UnitKind::Starport) {
        if healers >= wanted_healers {
            break;
        }
        if buffer.train(starport.id, 1, UnitKind::Medivac, cost(UnitKind::Medivac)) {
            healers += 1;
        }
    }

    let mut casters = world.units_of(UnitKind::Raven).len() as u32 + buffer.queued(UnitKind::Raven);
    for (starport, addon) in idle_producers(world, UnitKind::Starport) {
        if casters >= config.max_casters {
            break;
        }
        if addon == Some(AddonKind::TechLab)
            && buffer.train(starport.id, 1, UnitKind::Raven, cost(UnitKind::Raven))
        {
            casters += 1;
        }
    }

    let count = |kind: UnitKind, buffer: &CommandBuffer| {
        world.units_of(kind).len() as u32 + world.pending(kind) + buffer.queued(kind)
    };
    for (barracks, addon) in idle_producers(world, UnitKind::Barracks) {
        match addon {
            Some(AddonKind::TechLab) => {
                let marines = count(UnitKind::Marine, buffer);
                let marauders = count(UnitKind::Marauder, buffer);
                let kind = if marauders < marines + config.marauder_offset {
                    UnitKind::Marauder
                } else {
                    UnitKind::Marine
                };
                buffer.train(barracks.id, 1, kind, cost(kind));
            }
            Some(AddonKind::Reactor) => {
                for _ in 0..2 {
                    buffer.train(barracks.id, 2, UnitKind::Marine, cost(UnitKind::Marine));
                }
            }
            None => {
                buffer.train(barracks.id, 1, UnitKind::Marine, cost(UnitKind::Marine));
            }
        }
    }
}

/// One production pass.
///
/// # Arguments
///
/// * `world` - Snapshot for this tick
/// * `state` - Controller memory; its RNG drives placement shuffles
/// * `config` - Tuning
/// * `buffer` - Orders and spending so far this tick
pub fn run<W: WorldSnapshot>(
    world: &W,
    state: &mut EngineState,
    config: &ControllerConfig,
    buffer: &mut CommandBuffer,
) {
    let production = &config.production;
    build_refineries(world, state, production, buffer);
    build_factory(world, state, config, buffer);
    build_barracks(world, state, config, buffer);
    build_starport(world, state, config, buffer);
    build_engineering_bay(world, state, config, buffer);
    build_armory(world, state, config, buffer);
    append_addons(world, production, buffer);
    land_hosts(world, config, buffer);
    research_upgrades(world, production, buffer);
    train_army(world, production, buffer);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::{Fixed, Vec2Fixed};
    use crate::orders::Order;
    use crate::placement::addon_anchor;
    use crate::snapshot::{EntityId, MapInfo};
    use crate::terrain::{TerrainCell, TerrainGrid};
    use crate::world::StaticWorld;

    fn half(x: i32, y: i32) -> Vec2Fixed {
        Vec2Fixed::new(Fixed::from_num(x) + Fixed::from_num(0.5), Fixed::from_num(y) + Fixed::from_num(0.5))
    }

    fn world() -> StaticWorld {
        let map = MapInfo {
            start: Vec2Fixed::from_ints(50, 50),
            enemy_start: Vec2Fixed::from_ints(150, 150),
            map_center: Vec2Fixed::from_ints(100, 100),
            ramp_top_center: Vec2Fixed::from_ints(60, 60),
            expansion_locations: Vec::new(),
        };
        let mut world = StaticWorld::new(map, TerrainGrid::new(200, 200))
            .with_bank(2000, 2000)
            .with_supply(40, 100);
        world.spawn_own(UnitKind::CommandCenter, Vec2Fixed::from_ints(50, 50));
        world
    }

    fn add_miners(w: &mut StaticWorld, n: i32) {
        for i in 0..n {
            let id = w.next_entity_id();
            w.push_own(Entity::new(id, UnitKind::Scv, Vec2Fixed::from_ints(44 + i % 4, 44 + i / 4)).gathering());
        }
    }

    fn host_with_addon(w: &mut StaticWorld, kind: UnitKind, at: Vec2Fixed, flavour: AddonKind) -> EntityId {
        let addon_kind = kind.addon(flavour).unwrap();
        let addon = w.spawn_own(addon_kind, addon_anchor(at));
        let id = w.next_entity_id();
        w.push_own(Entity::new(id, kind, at).with_addon(addon));
        EntityId(id)
    }

    #[test]
    fn test_barracks_target_tiers() {
        let config = ProductionConfig::default();
        let mut w = world();
        add_miners(&mut w, 30);
        assert_eq!(barracks_target(&w, &config), 2);

        w.spawn_own(UnitKind::CommandCenter, Vec2Fixed::from_ints(90, 50));
        assert_eq!(barracks_target(&w, &config), 4);

        w.spawn_own(UnitKind::Factory, half(70, 70));
        assert_eq!(barracks_target(&w, &config), 5);
    }

    #[test]
    fn test_barracks_target_zero_ratio() {
        let config = ProductionConfig {
            workers_per_barracks: 0,
            ..ProductionConfig::default()
        };
        let mut w = world();
        add_miners(&mut w, 30);
        w.spawn_own(UnitKind::CommandCenter, Vec2Fixed::from_ints(90, 50));
        assert_eq!(barracks_target(&w, &config), config.barracks_cap);
    }

    #[test]
    fn test_refinery_caps() {
        assert_eq!(max_refineries(1), 1);
        assert_eq!(max_refineries(2), 3);
        assert_eq!(max_refineries(3), 6);
        assert_eq!(max_refineries(4), 7);
    }

    #[test]
    fn test_techlab_share() {
        let config = ProductionConfig::default();
        assert!(techlab_wanted(0, 0, &config));
        assert!(!techlab_wanted(1, 0, &config));
        assert!(techlab_wanted(1, 1, &config));
        assert!(!techlab_wanted(3, 2, &config));
        assert!(techlab_wanted(2, 2, &config));
    }

    #[test]
    fn test_barracks_addons_alternate() {
        let config = ProductionConfig::default();
        let mut w = world();
        let a = w.spawn_own(UnitKind::Barracks, half(70, 40));
        let b = w.spawn_own(UnitKind::Barracks, half(70, 50));
        let c = w.spawn_own(UnitKind::Barracks, half(70, 60));
        let mut buffer = CommandBuffer::new(w.economy());
        append_addons(&w, &config, &mut buffer);
        assert_eq!(
            buffer.orders(),
            &[
                Order::BuildAddon { host: a, kind: UnitKind::BarracksTechLab },
                Order::BuildAddon { host: b, kind: UnitKind::BarracksReactor },
                Order::BuildAddon { host: c, kind: UnitKind::BarracksTechLab },
            ]
        );
    }

    #[test]
    fn test_blocked_host_lifts_and_flying_host_lands() {
        let config = ControllerConfig::default();
        let mut w = world();
        w.terrain.fill_rect(72, 36, 76, 44, TerrainCell::Blocked);
        let rax = w.spawn_own(UnitKind::Barracks, half(70, 40));
        let mut buffer = CommandBuffer::new(w.economy());
        append_addons(&w, &config.production, &mut buffer);
        assert_eq!(
            buffer.orders(),
            &[Order::Ability { unit: rax, ability: Ability::Lift, target: None }]
        );

        let flying = w.spawn_own(UnitKind::BarracksFlying, half(70, 40));
        let mut buffer = CommandBuffer::new(w.economy());
        land_hosts(&w, &config, &mut buffer);
        match buffer.orders() {
            [Order::Ability { unit, ability: Ability::Land, target: Some(Target::Position(spot)) }] => {
                assert_eq!(*unit, flying);
                assert!(addon_clearance(&w, *spot));
            }
            other => panic!("expected a landing order, got {other:?}"),
        }
    }

    #[test]
    fn test_starport_addons() {
        let config = ProductionConfig::default();
        let mut w = world();
        let first = w.spawn_own(UnitKind::Starport, half(80, 40));
        let second = w.spawn_own(UnitKind::Starport, half(80, 60));
        let mut buffer = CommandBuffer::new(w.economy());
        append_addons(&w, &config, &mut buffer);
        assert_eq!(
            buffer.orders(),
            &[
                Order::BuildAddon { host: first, kind: UnitKind::StarportTechLab },
                Order::BuildAddon { host: second, kind: UnitKind::StarportReactor },
            ]
        );
    }

    #[test]
    fn test_army_mix() {
        let config = ProductionConfig::default();
        let mut w = world();
        let techlab = host_with_addon(&mut w, UnitKind::Barracks, half(70, 40), AddonKind::TechLab);
        let reactor = host_with_addon(&mut w, UnitKind::Barracks, half(70, 50), AddonKind::Reactor);
        let plain = w.spawn_own(UnitKind::Barracks, half(70, 60));
        let mut buffer = CommandBuffer::new(w.economy());
        train_army(&w, &config, &mut buffer);
        assert_eq!(
            buffer.orders(),
            &[
                Order::Train { producer: techlab, kind: UnitKind::Marauder },
                Order::Train { producer: reactor, kind: UnitKind::Marine },
                Order::Train { producer: reactor, kind: UnitKind::Marine },
                Order::Train { producer: plain, kind: UnitKind::Marine },
            ]
        );
    }

    #[test]
    fn test_marines_when_marauders_ahead() {
        let config = ProductionConfig::default();
        let mut w = world();
        for i in 0..3 {
            w.spawn_own(UnitKind::Marauder, Vec2Fixed::from_ints(90, 90 + i));
        }
        let techlab = host_with_addon(&mut w, UnitKind::Barracks, half(70, 40), AddonKind::TechLab);
        let mut buffer = CommandBuffer::new(w.economy());
        train_army(&w, &config, &mut buffer);
        assert_eq!(
            buffer.orders(),
            &[Order::Train { producer: techlab, kind: UnitKind::Marine }]
        );
    }

    #[test]
    fn test_upgrade_track_needs_armory() {
        let mut w = world();
        assert_eq!(next_upgrade(&w, &Upgrade::WEAPONS, false), Some(Upgrade::InfantryWeapons1));
        w.upgrades.insert(Upgrade::InfantryWeapons1);
        assert_eq!(next_upgrade(&w, &Upgrade::WEAPONS, false), None);
        assert_eq!(next_upgrade(&w, &Upgrade::WEAPONS, true), Some(Upgrade::InfantryWeapons2));
    }

    #[test]
    fn test_first_factory_waits_for_army() {
        let config = ControllerConfig::default();
        let mut w = world();
        add_miners(&mut w, 8);
        w.spawn_own(UnitKind::Barracks, half(62, 50));
        let mut state = EngineState::new(4);

        let mut buffer = CommandBuffer::new(w.economy());
        build_factory(&w, &mut state, &config, &mut buffer);
        assert_eq!(buffer.queued(UnitKind::Factory), 0);

        for i in 0..5 {
            w.spawn_own(UnitKind::Marauder, Vec2Fixed::from_ints(80, 80 + i));
        }
        let mut buffer = CommandBuffer::new(w.economy());
        build_factory(&w, &mut state, &config, &mut buffer);
        assert_eq!(buffer.queued(UnitKind::Factory), 1);
    }

    #[test]
    fn test_refinery_after_barracks() {
        let config = ProductionConfig::default();
        let state = EngineState::new(1);
        let mut w = world();
        add_miners(&mut w, 6);
        let geyser = w.add_geyser(Vec2Fixed::from_ints(57, 50), 2250);
        let mut buffer = CommandBuffer::new(w.economy());
        build_refineries(&w, &state, &config, &mut buffer);
        assert!(buffer.orders().is_empty());

        w.spawn_own(UnitKind::Barracks, half(62, 40));
        let mut buffer = CommandBuffer::new(w.economy());
        build_refineries(&w, &state, &config, &mut buffer);
        assert!(matches!(
            buffer.orders(),
            [Order::BuildOnGeyser { kind: UnitKind::Refinery, geyser: g, .. }] if *g == geyser
        ));
    }
}
