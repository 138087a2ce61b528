//! Test fixtures and helpers.
//!
//! Pre-built worlds and entity groups for consistent testing. Every fixture
//! uses [`standard_map`]: a 200x200 open grid with the home base in the
//! lower-left corner and the enemy in the upper-right.

use fixed::types::I32F32;
use tactics_core::math::Vec2Fixed;
use tactics_core::snapshot::{Entity, EntityId, MapInfo};
use tactics_core::terrain::TerrainGrid;
use tactics_core::unit_kind::UnitKind;
use tactics_core::world::StaticWorld;

/// Remaining minerals per field in a fresh mineral line.
pub const FIELD_MINERALS: u32 = 1500;

/// Create a fixed-point number from an integer.
#[must_use]
pub fn fixed(n: i32) -> I32F32 {
    I32F32::from_num(n)
}

/// Create a fixed-point number from a float (for tests only).
///
/// Note: In controller code, never use floats.
/// This is only for convenient test setup.
#[must_use]
pub fn fixed_f(n: f64) -> I32F32 {
    I32F32::from_num(n)
}

/// Position from whole coordinates.
#[must_use]
pub fn pos(x: i32, y: i32) -> Vec2Fixed {
    Vec2Fixed::from_ints(x, y)
}

/// Home base location on the standard map.
#[must_use]
pub fn home() -> Vec2Fixed {
    pos(30, 30)
}

/// Enemy start location on the standard map.
#[must_use]
pub fn enemy_home() -> Vec2Fixed {
    pos(170, 170)
}

/// The shared test map.
#[must_use]
pub fn standard_map() -> MapInfo {
    MapInfo {
        start: home(),
        enemy_start: enemy_home(),
        map_center: pos(100, 100),
        ramp_top_center: pos(40, 40),
        expansion_locations: vec![
            pos(30, 80),
            pos(80, 30),
            pos(100, 100),
            pos(120, 170),
            pos(170, 120),
        ],
    }
}

/// Empty open world on the standard map at match start.
#[must_use]
pub fn empty_world() -> StaticWorld {
    StaticWorld::new(standard_map(), TerrainGrid::new(200, 200))
}

/// Add a ready command center with eight mineral fields, two geysers and
/// `workers` mining SCVs, all within ten units of the base.
pub fn add_base(world: &mut StaticWorld, at: Vec2Fixed, workers: u32) -> EntityId {
    let base = world.spawn_own(UnitKind::CommandCenter, at);
    for i in 0..8 {
        world.add_minerals(at.offset(fixed(-7), fixed(i - 4)), FIELD_MINERALS);
    }
    world.add_geyser(at.offset(fixed(7), fixed(-5)), 2250);
    world.add_geyser(at.offset(fixed(7), fixed(5)), 2250);
    for i in 0..workers as i32 {
        let id = world.next_entity_id();
        let p = at.offset(fixed(-5 + i % 3), fixed(-4 + i / 3));
        world.push_own(Entity::new(id, UnitKind::Scv, p).gathering());
    }
    base
}

/// Add `count` own units of `kind` in a row starting at `around`.
pub fn add_units(world: &mut StaticWorld, kind: UnitKind, count: u32, around: Vec2Fixed) -> Vec<EntityId> {
    (0..count as i32)
        .map(|i| world.spawn_own(kind, around.offset(fixed(i % 5), fixed(i / 5))))
        .collect()
}

/// Add `count` visible enemy units of `kind` in a row starting at `around`.
pub fn add_enemies(world: &mut StaticWorld, kind: UnitKind, count: u32, around: Vec2Fixed) -> Vec<EntityId> {
    (0..count as i32)
        .map(|i| world.spawn_enemy(kind, around.offset(fixed(i % 5), fixed(i / 5))))
        .collect()
}

/// Add a ready production structure with an addon attached.
pub fn add_host_with_addon(world: &mut StaticWorld, kind: UnitKind, addon: UnitKind, at: Vec2Fixed) -> EntityId {
    let addon_id = world.spawn_own(addon, tactics_core::placement::addon_anchor(at));
    let id = world.next_entity_id();
    world.push_own(Entity::new(id, kind, at).with_addon(addon_id));
    EntityId(id)
}

/// Opening position: one base, twelve workers, fifty minerals.
#[must_use]
pub fn opening_world() -> StaticWorld {
    let mut world = empty_world().with_bank(50, 0).with_supply(12, 15);
    add_base(&mut world, home(), 12);
    world
}

/// A single enemy combat unit twenty units from home at t=60, facing four
/// marines and twelve workers.
#[must_use]
pub fn early_rush_world() -> StaticWorld {
    let mut world = empty_world().at_time(60).with_bank(150, 0).with_supply(16, 23);
    add_base(&mut world, home(), 12);
    add_units(&mut world, UnitKind::Marine, 4, pos(36, 36));
    world.spawn_enemy(UnitKind::Zergling, pos(50, 30));
    world
}

/// Two saturated bases with full mineral lines and nothing pending.
#[must_use]
pub fn two_base_saturated_world() -> StaticWorld {
    let mut world = empty_world().at_time(300).with_bank(600, 100).with_supply(50, 70);
    add_base(&mut world, home(), 16);
    add_base(&mut world, pos(30, 80), 16);
    world
}

/// Three-base mid game with every production tier up and a mixed army
/// holding near the center while enemies mass beyond it.
#[must_use]
pub fn mid_game_world() -> StaticWorld {
    let mut world = empty_world().at_time(420).with_bank(1200, 600).with_supply(120, 150);
    add_base(&mut world, home(), 18);
    add_base(&mut world, pos(30, 80), 16);
    add_base(&mut world, pos(80, 30), 14);

    let half = fixed_f(0.5);
    let at = |x: i32, y: i32| pos(x, y).offset(half, half);
    add_host_with_addon(&mut world, UnitKind::Barracks, UnitKind::BarracksTechLab, at(45, 40));
    add_host_with_addon(&mut world, UnitKind::Barracks, UnitKind::BarracksReactor, at(45, 46));
    add_host_with_addon(&mut world, UnitKind::Barracks, UnitKind::BarracksTechLab, at(45, 52));
    add_host_with_addon(&mut world, UnitKind::Factory, UnitKind::FactoryTechLab, at(52, 40));
    add_host_with_addon(&mut world, UnitKind::Starport, UnitKind::StarportTechLab, at(52, 48));
    world.spawn_own(UnitKind::EngineeringBay, at(20, 45));
    world.spawn_own(UnitKind::SupplyDepot, pos(22, 22));

    add_units(&mut world, UnitKind::Marine, 20, pos(60, 60));
    add_units(&mut world, UnitKind::Marauder, 6, pos(58, 64));
    add_units(&mut world, UnitKind::SiegeTank, 2, pos(55, 55));
    add_units(&mut world, UnitKind::Medivac, 2, pos(57, 57));

    add_enemies(&mut world, UnitKind::Roach, 10, pos(120, 120));
    add_enemies(&mut world, UnitKind::Zergling, 12, pos(125, 110));
    world.spawn_enemy(UnitKind::Hatchery, pos(170, 120));
    world
}
