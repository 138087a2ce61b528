//! Plain-data world used by tests, benchmarks and the headless runner.
//!
//! [`StaticWorld`] implements [`WorldSnapshot`] over owned vectors and a
//! [`TerrainGrid`]. It models just enough of the engine for the controller's
//! queries: footprint checks against terrain and existing structures, a
//! nearest-first fallback placement scan and a default expansion pick.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::math::{fx, Fixed, Vec2Fixed};
use crate::orders::Upgrade;
use crate::snapshot::{Economy, Entity, EntityId, MapInfo, ResourceField, WorldSnapshot};
use crate::terrain::{footprints_overlap, TerrainGrid};
use crate::unit_kind::UnitKind;

/// Half-width of the square scanned by [`StaticWorld::fallback_placement`].
const FALLBACK_SCAN: i32 = 15;

/// Footprint side used for mineral fields and geysers.
const RESOURCE_FOOTPRINT: u32 = 2;

/// Snapshot backed by owned data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StaticWorld {
    /// Match time in seconds.
    #[serde(with = "crate::math::fixed_serde")]
    pub time: Fixed,
    /// Map layout.
    pub map: MapInfo,
    /// Terrain.
    pub terrain: TerrainGrid,
    /// Own units.
    pub own_units: Vec<Entity>,
    /// Own structures.
    pub own_structures: Vec<Entity>,
    /// Enemy units.
    pub enemy_units: Vec<Entity>,
    /// Enemy structures.
    pub enemy_structures: Vec<Entity>,
    /// Mineral fields.
    pub minerals: Vec<ResourceField>,
    /// Free geysers.
    pub geysers: Vec<ResourceField>,
    /// Bank and supply.
    pub economy: Economy,
    /// Ordered-but-unstarted counts per kind, on top of unfinished structures.
    pub pending: BTreeMap<UnitKind, u32>,
    /// Upgrades researching or done.
    pub upgrades: BTreeSet<Upgrade>,
    next_id: u64,
}

impl StaticWorld {
    /// Empty world at match time zero.
    #[must_use]
    pub fn new(map: MapInfo, terrain: TerrainGrid) -> Self {
        Self {
            time: Fixed::ZERO,
            map,
            terrain,
            own_units: Vec::new(),
            own_structures: Vec::new(),
            enemy_units: Vec::new(),
            enemy_structures: Vec::new(),
            minerals: Vec::new(),
            geysers: Vec::new(),
            economy: Economy::default(),
            pending: BTreeMap::new(),
            upgrades: BTreeSet::new(),
            next_id: 1,
        }
    }

    /// Set the match clock.
    #[must_use]
    pub fn at_time(mut self, secs: u32) -> Self {
        self.time = Fixed::from_num(secs);
        self
    }

    /// Set the bank.
    #[must_use]
    pub fn with_bank(mut self, minerals: u32, gas: u32) -> Self {
        self.economy.minerals = minerals;
        self.economy.gas = gas;
        self
    }

    /// Set supply used and provided.
    #[must_use]
    pub fn with_supply(mut self, used: u32, cap: u32) -> Self {
        self.economy.supply_used = used;
        self.economy.supply_cap = cap;
        self
    }

    fn alloc_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Allocate a fresh id without adding anything.
    pub fn next_entity_id(&mut self) -> u64 {
        self.alloc_id()
    }

    /// Add an own unit or structure with default attributes.
    pub fn spawn_own(&mut self, kind: UnitKind, pos: Vec2Fixed) -> EntityId {
        let id = self.alloc_id();
        self.push_own(Entity::new(id, kind, pos));
        EntityId(id)
    }

    /// Add a prepared own entity.
    pub fn push_own(&mut self, entity: Entity) {
        self.next_id = self.next_id.max(entity.id.0 + 1);
        if entity.is_structure() {
            self.own_structures.push(entity);
        } else {
            self.own_units.push(entity);
        }
    }

    /// Add an enemy unit or structure with default attributes.
    pub fn spawn_enemy(&mut self, kind: UnitKind, pos: Vec2Fixed) -> EntityId {
        let id = self.alloc_id();
        self.push_enemy(Entity::new(id, kind, pos));
        EntityId(id)
    }

    /// Add a prepared enemy entity.
    pub fn push_enemy(&mut self, entity: Entity) {
        self.next_id = self.next_id.max(entity.id.0 + 1);
        if entity.is_structure() {
            self.enemy_structures.push(entity);
        } else {
            self.enemy_units.push(entity);
        }
    }

    /// Add a mineral field.
    pub fn add_minerals(&mut self, pos: Vec2Fixed, remaining: u32) -> EntityId {
        let id = self.alloc_id();
        self.minerals.push(ResourceField::new(id, pos, remaining));
        EntityId(id)
    }

    /// Add a free geyser.
    pub fn add_geyser(&mut self, pos: Vec2Fixed, remaining: u32) -> EntityId {
        let id = self.alloc_id();
        self.geysers.push(ResourceField::new(id, pos, remaining));
        EntityId(id)
    }

    /// Record `count` ordered units or structures of `kind`.
    pub fn set_pending(&mut self, kind: UnitKind, count: u32) {
        self.pending.insert(kind, count);
    }

    /// Mutable access to an own entity.
    pub fn own_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.own_units
            .iter_mut()
            .chain(self.own_structures.iter_mut())
            .find(|e| e.id == id)
    }

    /// Remove an entity from every list (it died).
    pub fn remove(&mut self, id: EntityId) {
        self.own_units.retain(|e| e.id != id);
        self.own_structures.retain(|e| e.id != id);
        self.enemy_units.retain(|e| e.id != id);
        self.enemy_structures.retain(|e| e.id != id);
    }

    fn covered_by_structure(&self, p: Vec2Fixed) -> bool {
        self.own_structures
            .iter()
            .chain(&self.enemy_structures)
            .filter(|s| !s.is_flying && s.kind != UnitKind::SupplyDepotLowered)
            .any(|s| {
                let half = Fixed::from_num(s.kind.footprint().max(1)) / Fixed::from_num(2);
                (p.x - s.position.x).abs() < half && (p.y - s.position.y).abs() < half
            })
    }

    fn blocked_by_structure(&self, kind: UnitKind, p: Vec2Fixed) -> bool {
        let size = kind.footprint();
        let structures = self
            .own_structures
            .iter()
            .chain(&self.enemy_structures)
            .filter(|s| !s.is_flying)
            .any(|s| footprints_overlap(p, size, s.position, s.kind.footprint()));
        let fields = self
            .minerals
            .iter()
            .chain(&self.geysers)
            .any(|f| footprints_overlap(p, size, f.position, RESOURCE_FOOTPRINT));
        structures || fields
    }
}

impl WorldSnapshot for StaticWorld {
    fn time(&self) -> Fixed {
        self.time
    }

    fn map(&self) -> &MapInfo {
        &self.map
    }

    fn own_units(&self) -> &[Entity] {
        &self.own_units
    }

    fn own_structures(&self) -> &[Entity] {
        &self.own_structures
    }

    fn enemy_units(&self) -> &[Entity] {
        &self.enemy_units
    }

    fn enemy_structures(&self) -> &[Entity] {
        &self.enemy_structures
    }

    fn mineral_fields(&self) -> &[ResourceField] {
        &self.minerals
    }

    fn geysers(&self) -> &[ResourceField] {
        &self.geysers
    }

    fn economy(&self) -> Economy {
        self.economy
    }

    fn pending(&self, kind: UnitKind) -> u32 {
        let ordered = self.pending.get(&kind).copied().unwrap_or(0);
        let building = self
            .own_structures
            .iter()
            .filter(|s| s.kind == kind && !s.is_ready)
            .count() as u32;
        ordered + building
    }

    fn upgrade_started(&self, upgrade: Upgrade) -> bool {
        self.upgrades.contains(&upgrade)
    }

    fn in_bounds(&self, p: Vec2Fixed) -> bool {
        self.terrain.in_bounds(p)
    }

    fn in_placement_grid(&self, p: Vec2Fixed) -> bool {
        self.terrain.is_buildable(p) && !self.covered_by_structure(p)
    }

    fn in_pathing_grid(&self, p: Vec2Fixed) -> bool {
        self.terrain.is_pathable(p) && !self.covered_by_structure(p)
    }

    fn can_place(&self, kind: UnitKind, p: Vec2Fixed) -> bool {
        self.terrain.footprint_buildable(p, kind.footprint()) && !self.blocked_by_structure(kind, p)
    }

    fn fallback_placement(&self, kind: UnitKind, near: Vec2Fixed) -> Option<Vec2Fixed> {
        let base = near.rounded();
        let half = if kind.footprint() % 2 == 1 {
            Fixed::ONE / Fixed::from_num(2)
        } else {
            Fixed::ZERO
        };
        let mut offsets: Vec<(i32, i32)> = (-FALLBACK_SCAN..=FALLBACK_SCAN)
            .flat_map(|dy| (-FALLBACK_SCAN..=FALLBACK_SCAN).map(move |dx| (dx, dy)))
            .collect();
        offsets.sort_by_key(|&(dx, dy)| (dx * dx + dy * dy, dy, dx));
        offsets
            .into_iter()
            .map(|(dx, dy)| base.offset(fx(dx) + half, fx(dy) + half))
            .find(|&p| self.can_place(kind, p))
    }

    fn default_expansion(&self) -> Option<Vec2Fixed> {
        let taken = |loc: Vec2Fixed| {
            self.own_structures
                .iter()
                .chain(&self.enemy_structures)
                .any(|s| s.kind.is_townhall() && s.position.within(loc, fx(6)))
        };
        let start = self.map.start;
        self.map
            .expansion_locations
            .iter()
            .copied()
            .filter(|&loc| !taken(loc))
            .min_by_key(|loc| loc.distance_squared(start))
    }
}
