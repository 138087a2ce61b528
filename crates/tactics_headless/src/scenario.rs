//! Scenario loading.
//!
//! A scenario is a hand-written RON description of one frozen moment of a
//! match: map layout, terrain patches, bank, own bases and every unit on the
//! board. [`Scenario::into_world`] turns it into a [`StaticWorld`] the
//! controller can be stepped against.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use tactics_core::math::Vec2Fixed;
use tactics_core::snapshot::{Entity, MapInfo};
use tactics_core::terrain::{TerrainCell, TerrainGrid};
use tactics_core::unit_kind::UnitKind;
use tactics_core::world::StaticWorld;

/// Mineral fields placed around each scenario base.
const FIELDS_PER_BASE: i32 = 8;

/// Error type for scenario operations.
#[derive(Error, Debug)]
pub enum ScenarioError {
    /// File not found.
    #[error("Scenario file not found: {0}")]
    FileNotFound(String),
    /// Failed to read file.
    #[error("Failed to read scenario file: {0}")]
    ReadError(#[from] std::io::Error),
    /// Failed to parse RON.
    #[error("Failed to parse scenario: {0}")]
    ParseError(#[from] ron::error::SpannedError),
    /// Parsed but describes an impossible board.
    #[error("Invalid scenario: {0}")]
    Invalid(String),
}

/// A complete scenario configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    /// Scenario name.
    pub name: String,
    /// Human-readable description.
    #[serde(default)]
    pub description: String,
    /// Match clock in seconds when the scenario starts.
    #[serde(default)]
    pub time_secs: u32,
    /// Map dimensions (width, height) in world units.
    pub map_size: (u32, u32),
    /// Named map locations.
    pub layout: MapLayout,
    /// Terrain that is not open ground.
    #[serde(default)]
    pub terrain: Vec<TerrainPatch>,
    /// Bank and supply.
    pub bank: BankSetup,
    /// Own bases, each with a mineral line and two geysers.
    #[serde(default)]
    pub bases: Vec<BaseSetup>,
    /// Own units and structures beyond the bases.
    #[serde(default)]
    pub own: Vec<UnitPlacement>,
    /// Visible enemy units and structures.
    #[serde(default)]
    pub enemies: Vec<UnitPlacement>,
}

impl Scenario {
    /// Load a scenario from a RON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ScenarioError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ScenarioError::FileNotFound(path.display().to_string()));
        }
        let contents = std::fs::read_to_string(path)?;
        Self::from_ron_str(&contents)
    }

    /// Load from a RON string (useful for embedded scenarios).
    pub fn from_ron_str(ron: &str) -> Result<Self, ScenarioError> {
        let scenario: Scenario = ron::from_str(ron)?;
        scenario.validate()?;
        Ok(scenario)
    }

    fn validate(&self) -> Result<(), ScenarioError> {
        let (w, h) = self.map_size;
        if w == 0 || h == 0 {
            return Err(ScenarioError::Invalid("map_size must be non-zero".to_string()));
        }
        let outside = |(x, y): (i32, i32)| x < 0 || y < 0 || x as u32 >= w || y as u32 >= h;
        let placements = self.own.iter().chain(&self.enemies).map(|p| p.position);
        let points = [
            self.layout.start,
            self.layout.enemy_start,
            self.layout.map_center,
            self.layout.ramp_top,
        ]
        .into_iter()
        .chain(self.layout.expansions.iter().copied())
        .chain(self.bases.iter().map(|b| b.position))
        .chain(placements);
        for p in points {
            if outside(p) {
                return Err(ScenarioError::Invalid(format!(
                    "position ({}, {}) lies outside the {w}x{h} map",
                    p.0, p.1
                )));
            }
        }
        Ok(())
    }

    /// Build the world this scenario describes.
    #[must_use]
    pub fn into_world(self) -> StaticWorld {
        let (w, h) = self.map_size;
        let mut terrain = TerrainGrid::new(w, h);
        for patch in &self.terrain {
            terrain.fill_rect(patch.from.0, patch.from.1, patch.to.0, patch.to.1, patch.cell);
        }

        let mut world = StaticWorld::new(self.layout.to_map_info(), terrain)
            .at_time(self.time_secs)
            .with_bank(self.bank.minerals, self.bank.gas)
            .with_supply(self.bank.supply_used, self.bank.supply_cap);

        for base in &self.bases {
            add_base(&mut world, base);
        }
        for placement in &self.own {
            for at in placement.positions() {
                world.spawn_own(placement.kind, at);
            }
        }
        for placement in &self.enemies {
            for at in placement.positions() {
                world.spawn_enemy(placement.kind, at);
            }
        }
        world
    }
}

/// Named locations on the map, in whole world units.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MapLayout {
    /// Own starting location.
    pub start: (i32, i32),
    /// Enemy starting location.
    pub enemy_start: (i32, i32),
    /// Center of the playable area.
    pub map_center: (i32, i32),
    /// Top of the main ramp.
    pub ramp_top: (i32, i32),
    /// Every townhall site.
    pub expansions: Vec<(i32, i32)>,
}

impl MapLayout {
    fn to_map_info(&self) -> MapInfo {
        MapInfo {
            start: point(self.start),
            enemy_start: point(self.enemy_start),
            map_center: point(self.map_center),
            ramp_top_center: point(self.ramp_top),
            expansion_locations: self.expansions.iter().copied().map(point).collect(),
        }
    }
}

/// A rectangle of grid cells (inclusive corners) set to one cell state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TerrainPatch {
    /// Lower corner.
    pub from: (u32, u32),
    /// Upper corner.
    pub to: (u32, u32),
    /// State written to every cell.
    pub cell: TerrainCell,
}

/// Starting bank and supply.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BankSetup {
    /// Banked minerals.
    pub minerals: u32,
    /// Banked gas.
    pub gas: u32,
    /// Supply in use.
    pub supply_used: u32,
    /// Supply cap.
    pub supply_cap: u32,
}

/// A ready command center with its resources and miners.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BaseSetup {
    /// Townhall position.
    pub position: (i32, i32),
    /// Mining workers.
    pub workers: u32,
    /// Minerals in each of the eight fields.
    #[serde(default = "default_field_minerals")]
    pub field_minerals: u32,
}

fn default_field_minerals() -> u32 {
    1500
}

/// A row of identical entities.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnitPlacement {
    /// Unit type.
    pub kind: UnitKind,
    /// First position (x, y).
    pub position: (i32, i32),
    /// Number of entities, laid out five to a row.
    #[serde(default = "default_count")]
    pub count: u32,
}

fn default_count() -> u32 {
    1
}

impl UnitPlacement {
    /// Create a new unit placement.
    #[must_use]
    pub fn new(kind: UnitKind, x: i32, y: i32, count: u32) -> Self {
        Self {
            kind,
            position: (x, y),
            count,
        }
    }

    fn positions(&self) -> impl Iterator<Item = Vec2Fixed> + '_ {
        let (x, y) = self.position;
        (0..self.count as i32).map(move |i| Vec2Fixed::from_ints(x + i % 5, y + i / 5))
    }
}

fn point((x, y): (i32, i32)) -> Vec2Fixed {
    Vec2Fixed::from_ints(x, y)
}

fn add_base(world: &mut StaticWorld, base: &BaseSetup) {
    let (x, y) = base.position;
    world.spawn_own(UnitKind::CommandCenter, point(base.position));
    for i in 0..FIELDS_PER_BASE {
        world.add_minerals(Vec2Fixed::from_ints(x - 7, y + i - FIELDS_PER_BASE / 2), base.field_minerals);
    }
    world.add_geyser(Vec2Fixed::from_ints(x + 7, y - 5), 2250);
    world.add_geyser(Vec2Fixed::from_ints(x + 7, y + 5), 2250);
    for i in 0..base.workers as i32 {
        let id = world.next_entity_id();
        let at = Vec2Fixed::from_ints(x - 5 + i % 3, y - 4 + i / 3);
        world.push_own(Entity::new(id, UnitKind::Scv, at).gathering());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tactics_core::snapshot::WorldSnapshot;

    const RUSH: &str = r#"
        Scenario(
            name: "Rush",
            time_secs: 60,
            map_size: (200, 200),
            layout: MapLayout(
                start: (30, 30),
                enemy_start: (170, 170),
                map_center: (100, 100),
                ramp_top: (40, 40),
                expansions: [(30, 80), (80, 30)],
            ),
            terrain: [
                TerrainPatch(from: (0, 190), to: (199, 199), cell: Blocked),
            ],
            bank: BankSetup(minerals: 150, gas: 0, supply_used: 16, supply_cap: 23),
            bases: [BaseSetup(position: (30, 30), workers: 12)],
            own: [UnitPlacement(kind: Marine, position: (36, 36), count: 4)],
            enemies: [UnitPlacement(kind: Zergling, position: (50, 30))],
        )
    "#;

    #[test]
    fn test_parse_from_ron() {
        let scenario = Scenario::from_ron_str(RUSH).unwrap();
        assert_eq!(scenario.name, "Rush");
        assert_eq!(scenario.enemies[0].count, 1);
        assert_eq!(scenario.bases[0].field_minerals, 1500);
    }

    #[test]
    fn test_into_world() {
        let world = Scenario::from_ron_str(RUSH).unwrap().into_world();
        assert_eq!(world.time(), tactics_core::math::fx(60));
        assert_eq!(world.workers().len(), 12);
        assert_eq!(world.infantry().len(), 4);
        assert_eq!(world.enemy_units().len(), 1);
        assert_eq!(world.minerals.len(), 8);
        assert_eq!(world.geysers.len(), 2);
        assert!(!world.terrain.is_pathable(Vec2Fixed::from_ints(50, 195)));
        assert!(world.terrain.is_pathable(Vec2Fixed::from_ints(50, 150)));
    }

    #[test]
    fn test_out_of_bounds_rejected() {
        let bad = RUSH.replace("(50, 30)", "(250, 30)");
        assert!(matches!(
            Scenario::from_ron_str(&bad),
            Err(ScenarioError::Invalid(_))
        ));
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            Scenario::load("does/not/exist.ron"),
            Err(ScenarioError::FileNotFound(_))
        ));
    }
}
