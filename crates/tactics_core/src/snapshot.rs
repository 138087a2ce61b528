//! Read-only view of the world for one tick.
//!
//! The controller never owns or mutates entities. Each tick it is handed a
//! [`WorldSnapshot`], resolves every handle it needs fresh from it, and
//! answers with orders. Everything here mirrors what a player could query
//! from the engine: own and visible enemy entities, resource fields, the
//! bank, terrain grids and a few engine-side placement helpers.

use serde::{Deserialize, Serialize};

use crate::math::{centroid, fx, Fixed, Vec2Fixed};
use crate::orders::Upgrade;
use crate::unit_kind::{Cost, UnitKind, UnitRole};

/// Stable engine identifier for a unit, structure or resource field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(pub u64);

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Anything with an identity and a position on the map.
pub trait Located {
    /// Engine identifier.
    fn id(&self) -> EntityId;
    /// Current position.
    fn position(&self) -> Vec2Fixed;
}

/// A unit or structure as seen this tick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    /// Engine identifier.
    pub id: EntityId,
    /// Unit type.
    pub kind: UnitKind,
    /// Current position.
    pub position: Vec2Fixed,
    /// Health as a fraction of maximum (0..=1).
    #[serde(with = "crate::math::fixed_serde")]
    pub health: Fixed,
    /// Current energy.
    pub energy: u32,
    /// Seconds until the weapon can fire again.
    #[serde(with = "crate::math::fixed_serde")]
    pub weapon_cooldown: Fixed,
    /// Ground weapon range.
    #[serde(with = "crate::math::fixed_serde")]
    pub ground_range: Fixed,
    /// Whether this entity has a weapon.
    pub can_attack: bool,
    /// Construction or morph finished.
    pub is_ready: bool,
    /// Airborne.
    pub is_flying: bool,
    /// No queued orders.
    pub is_idle: bool,
    /// Currently executing an attack order.
    pub is_attacking: bool,
    /// Currently mining or returning cargo.
    pub is_gathering: bool,
    /// Worker currently constructing a structure.
    pub is_constructing: bool,
    /// Attached addon, if any.
    pub addon: Option<EntityId>,
}

impl Entity {
    /// A healthy, ready, idle entity with the kind's default weapon stats.
    #[must_use]
    pub fn new(id: u64, kind: UnitKind, position: Vec2Fixed) -> Self {
        let range = kind.ground_range();
        Self {
            id: EntityId(id),
            kind,
            position,
            health: Fixed::ONE,
            energy: 0,
            weapon_cooldown: Fixed::ZERO,
            ground_range: fx(range),
            can_attack: range > 0 || kind.is_defensive_structure(),
            is_ready: true,
            is_flying: kind.is_airborne(),
            is_idle: true,
            is_attacking: false,
            is_gathering: false,
            is_constructing: false,
            addon: None,
        }
    }

    /// Set health from a percentage.
    #[must_use]
    pub fn with_health_pct(mut self, pct: u32) -> Self {
        self.health = crate::math::percent(pct);
        self
    }

    /// Set energy.
    #[must_use]
    pub fn with_energy(mut self, energy: u32) -> Self {
        self.energy = energy;
        self
    }

    /// Put the weapon on cooldown.
    #[must_use]
    pub fn with_weapon_cooldown(mut self, secs: Fixed) -> Self {
        self.weapon_cooldown = secs;
        self
    }

    /// Attach an addon.
    #[must_use]
    pub fn with_addon(mut self, addon: EntityId) -> Self {
        self.addon = Some(addon);
        self
    }

    /// Mark as still under construction.
    #[must_use]
    pub fn under_construction(mut self) -> Self {
        self.is_ready = false;
        self.is_idle = false;
        self
    }

    /// Mark as busy (has queued orders).
    #[must_use]
    pub fn busy(mut self) -> Self {
        self.is_idle = false;
        self
    }

    /// Mark as executing an attack order.
    #[must_use]
    pub fn attacking(mut self) -> Self {
        self.is_attacking = true;
        self.is_idle = false;
        self
    }

    /// Mark as mining.
    #[must_use]
    pub fn gathering(mut self) -> Self {
        self.is_gathering = true;
        self.is_idle = false;
        self
    }

    /// Mark a worker as building a structure.
    #[must_use]
    pub fn constructing(mut self) -> Self {
        self.is_constructing = true;
        self.is_idle = false;
        self
    }

    /// Whether this is a structure.
    #[must_use]
    pub fn is_structure(&self) -> bool {
        self.kind.is_structure()
    }

    /// Behavior class.
    #[must_use]
    pub fn role(&self) -> UnitRole {
        self.kind.role()
    }

    /// Ranged units kite while their weapon cools down.
    #[must_use]
    pub fn is_ranged(&self) -> bool {
        self.ground_range > Fixed::ONE
    }

    /// Enemy structure that shoots back or belongs to the defensive set.
    #[must_use]
    pub fn is_offensive_structure(&self) -> bool {
        self.is_structure() && (self.can_attack || self.kind.is_defensive_structure())
    }

    /// Distance to another point.
    #[must_use]
    pub fn distance_to(&self, p: Vec2Fixed) -> Fixed {
        self.position.distance(p)
    }
}

impl Located for Entity {
    fn id(&self) -> EntityId {
        self.id
    }

    fn position(&self) -> Vec2Fixed {
        self.position
    }
}

/// A mineral field or gas geyser.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceField {
    /// Engine identifier.
    pub id: EntityId,
    /// Field position.
    pub position: Vec2Fixed,
    /// Remaining resource.
    pub remaining: u32,
}

impl ResourceField {
    /// Create a resource field.
    #[must_use]
    pub fn new(id: u64, position: Vec2Fixed, remaining: u32) -> Self {
        Self {
            id: EntityId(id),
            position,
            remaining,
        }
    }
}

impl Located for ResourceField {
    fn id(&self) -> EntityId {
        self.id
    }

    fn position(&self) -> Vec2Fixed {
        self.position
    }
}

/// Static map layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapInfo {
    /// Own starting location.
    pub start: Vec2Fixed,
    /// Enemy starting location.
    pub enemy_start: Vec2Fixed,
    /// Center of the playable area.
    pub map_center: Vec2Fixed,
    /// Top of the ramp out of the main base.
    pub ramp_top_center: Vec2Fixed,
    /// Every known townhall site.
    pub expansion_locations: Vec<Vec2Fixed>,
}

/// Bank and supply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Economy {
    /// Banked minerals.
    pub minerals: u32,
    /// Banked gas.
    pub gas: u32,
    /// Supply in use.
    pub supply_used: u32,
    /// Supply provided.
    pub supply_cap: u32,
}

impl Economy {
    /// Free supply.
    #[must_use]
    pub const fn supply_left(&self) -> u32 {
        self.supply_cap.saturating_sub(self.supply_used)
    }
}

/// Per-tick view of the world the controller decides against.
///
/// Implementors supply raw data and terrain queries; the provided methods
/// derive the filtered groups the controller needs. Every list is in a
/// stable order so that decisions are reproducible.
pub trait WorldSnapshot {
    /// Elapsed match time in seconds.
    fn time(&self) -> Fixed;

    /// Static map layout.
    fn map(&self) -> &MapInfo;

    /// Own units (non-structures).
    fn own_units(&self) -> &[Entity];

    /// Own structures, including airborne and unfinished ones.
    fn own_structures(&self) -> &[Entity];

    /// Visible enemy units.
    fn enemy_units(&self) -> &[Entity];

    /// Visible or remembered enemy structures.
    fn enemy_structures(&self) -> &[Entity];

    /// Mineral fields.
    fn mineral_fields(&self) -> &[ResourceField];

    /// Gas geysers without an extractor.
    fn geysers(&self) -> &[ResourceField];

    /// Bank and supply.
    fn economy(&self) -> Economy;

    /// Units or structures of `kind` ordered or in progress but not yet ready.
    fn pending(&self, kind: UnitKind) -> u32;

    /// Whether an upgrade is researching or finished.
    fn upgrade_started(&self, upgrade: Upgrade) -> bool;

    /// Inside the playable map.
    fn in_bounds(&self, p: Vec2Fixed) -> bool;

    /// Terrain allows construction at this point.
    fn in_placement_grid(&self, p: Vec2Fixed) -> bool;

    /// Ground units can walk through this point.
    fn in_pathing_grid(&self, p: Vec2Fixed) -> bool;

    /// The full footprint of `kind` fits at `p`.
    fn can_place(&self, kind: UnitKind, p: Vec2Fixed) -> bool;

    /// The engine's own, less constrained placement search.
    fn fallback_placement(&self, kind: UnitKind, near: Vec2Fixed) -> Option<Vec2Fixed>;

    /// The engine's default expansion site.
    fn default_expansion(&self) -> Option<Vec2Fixed>;

    /// Live mineral/gas cost, falling back to the built-in table.
    fn unit_cost(&self, kind: UnitKind) -> Cost {
        kind.fallback_cost()
    }

    /// Resolve an own or enemy entity by id.
    fn entity(&self, id: EntityId) -> Option<&Entity> {
        self.own_units()
            .iter()
            .chain(self.own_structures())
            .chain(self.enemy_units())
            .chain(self.enemy_structures())
            .find(|e| e.id == id)
    }

    /// Own resource gatherers. MULEs are temporary and left out.
    fn workers(&self) -> Vec<&Entity> {
        self.own_units()
            .iter()
            .filter(|u| u.kind.is_worker() && u.kind != UnitKind::Mule)
            .collect()
    }

    /// Own units of a specific kind.
    fn units_of(&self, kind: UnitKind) -> Vec<&Entity> {
        self.own_units().iter().filter(|u| u.kind == kind).collect()
    }

    /// Own front-line infantry.
    fn infantry(&self) -> Vec<&Entity> {
        self.own_units().iter().filter(|u| u.kind.is_infantry()).collect()
    }

    /// Own siege units in either mode.
    fn siege_units(&self) -> Vec<&Entity> {
        self.own_units()
            .iter()
            .filter(|u| u.role() == UnitRole::Siege)
            .collect()
    }

    /// Own army (infantry, siege, healers and casters).
    fn army(&self) -> Vec<&Entity> {
        self.own_units().iter().filter(|u| u.kind.is_army()).collect()
    }

    /// Own townhalls of every variant.
    fn townhalls(&self) -> Vec<&Entity> {
        self.own_structures()
            .iter()
            .filter(|s| s.kind.is_townhall() && !s.is_flying)
            .collect()
    }

    /// Own finished townhalls.
    fn ready_townhalls(&self) -> Vec<&Entity> {
        self.townhalls().into_iter().filter(|s| s.is_ready).collect()
    }

    /// Own structures of a specific kind.
    fn structures_of(&self, kind: UnitKind) -> Vec<&Entity> {
        self.own_structures()
            .iter()
            .filter(|s| s.kind == kind)
            .collect()
    }

    /// Own finished structures of a specific kind.
    fn ready_structures_of(&self, kind: UnitKind) -> Vec<&Entity> {
        self.own_structures()
            .iter()
            .filter(|s| s.kind == kind && s.is_ready)
            .collect()
    }

    /// Ready, airborne and pending structures of `kind` combined.
    fn structure_total(&self, kind: UnitKind) -> u32 {
        let ready = self
            .own_structures()
            .iter()
            .filter(|s| s.kind == kind && s.is_ready)
            .count() as u32;
        let airborne = kind.lifted().map_or(0, |flying| {
            self.own_structures()
                .iter()
                .filter(|s| s.kind == flying)
                .count() as u32
        });
        ready + airborne + self.pending(kind)
    }

    /// Weighted military-size metric over own units.
    fn military_metric(&self) -> u32 {
        self.own_units()
            .iter()
            .map(|u| u.role().military_weight())
            .sum()
    }
}

/// The closest item to `p`, ties broken by lowest id.
pub fn closest_to<'a, T, I>(items: I, p: Vec2Fixed) -> Option<&'a T>
where
    T: Located + 'a,
    I: IntoIterator<Item = &'a T>,
{
    items
        .into_iter()
        .min_by_key(|item| (item.position().distance_squared(p), item.id()))
}

/// Items strictly closer than `radius` to `p`.
pub fn closer_than<'a, T, I>(items: I, p: Vec2Fixed, radius: Fixed) -> Vec<&'a T>
where
    T: Located + 'a,
    I: IntoIterator<Item = &'a T>,
{
    items
        .into_iter()
        .filter(|item| item.position().within(p, radius))
        .collect()
}

/// Mean position of a group.
pub fn center<'a, T, I>(items: I) -> Option<Vec2Fixed>
where
    T: Located + 'a,
    I: IntoIterator<Item = &'a T>,
{
    centroid(items.into_iter().map(Located::position))
}

/// Total remaining minerals within `radius` of `p`.
pub fn minerals_near(fields: &[ResourceField], p: Vec2Fixed, radius: Fixed) -> u32 {
    closer_than(fields, p, radius)
        .into_iter()
        .map(|f| f.remaining)
        .sum()
}
