//! Orders and the per-tick command buffer.
//!
//! Orders are plain values. The controller appends them to a
//! [`CommandBuffer`], which also keeps a spending ledger and the set of
//! producers already given work this tick, so that later decisions in the
//! same tick see what earlier ones committed.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::math::Vec2Fixed;
use crate::snapshot::{Economy, EntityId};
use crate::unit_kind::{Cost, UnitKind};

/// Target of an attack or ability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Target {
    /// A specific entity.
    Unit(EntityId),
    /// A map position (attack-move for attacks).
    Position(Vec2Fixed),
}

/// Research items the controller pursues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Upgrade {
    /// Infantry weapons level 1.
    InfantryWeapons1,
    /// Infantry weapons level 2.
    InfantryWeapons2,
    /// Infantry weapons level 3.
    InfantryWeapons3,
    /// Infantry armor level 1.
    InfantryArmor1,
    /// Infantry armor level 2.
    InfantryArmor2,
    /// Infantry armor level 3.
    InfantryArmor3,
}

impl Upgrade {
    /// Weapons track in research order.
    pub const WEAPONS: [Self; 3] = [
        Self::InfantryWeapons1,
        Self::InfantryWeapons2,
        Self::InfantryWeapons3,
    ];

    /// Armor track in research order.
    pub const ARMOR: [Self; 3] = [
        Self::InfantryArmor1,
        Self::InfantryArmor2,
        Self::InfantryArmor3,
    ];

    /// Level within its track (1..=3).
    #[must_use]
    pub const fn level(self) -> u32 {
        match self {
            Self::InfantryWeapons1 | Self::InfantryArmor1 => 1,
            Self::InfantryWeapons2 | Self::InfantryArmor2 => 2,
            Self::InfantryWeapons3 | Self::InfantryArmor3 => 3,
        }
    }

    /// Research cost.
    #[must_use]
    pub const fn cost(self) -> Cost {
        match self.level() {
            1 => Cost::new(100, 100),
            2 => Cost::new(175, 175),
            _ => Cost::new(250, 250),
        }
    }
}

/// Special abilities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Ability {
    /// Deploy a siege unit.
    SiegeMode,
    /// Pack up a deployed siege unit.
    Unsiege,
    /// Lift a production structure off the ground.
    Lift,
    /// Land an airborne structure at the target position.
    Land,
    /// Lower a supply depot so units can walk over it.
    LowerDepot,
    /// Raise a lowered supply depot.
    RaiseDepot,
    /// Morph a command center into its energy-caster variant.
    UpgradeToOrbital,
    /// Drop a temporary mining unit on a mineral field.
    CalldownMule,
    /// Drop an area-denial turret.
    AutoTurret,
}

/// A single order for one unit or structure.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Order {
    /// Move without engaging.
    Move {
        /// Ordered unit.
        unit: EntityId,
        /// Destination.
        to: Vec2Fixed,
    },
    /// Attack a unit, or attack-move to a position.
    Attack {
        /// Ordered unit.
        unit: EntityId,
        /// What to attack.
        target: Target,
    },
    /// Mine from a resource field.
    Gather {
        /// Ordered worker.
        unit: EntityId,
        /// Mineral field.
        field: EntityId,
    },
    /// Construct a structure at a position.
    Build {
        /// Constructing worker.
        builder: EntityId,
        /// Structure type.
        kind: UnitKind,
        /// Footprint center.
        at: Vec2Fixed,
    },
    /// Construct an extractor on a geyser.
    BuildOnGeyser {
        /// Constructing worker.
        builder: EntityId,
        /// Extractor type.
        kind: UnitKind,
        /// Geyser.
        geyser: EntityId,
    },
    /// Attach an addon to a production structure.
    BuildAddon {
        /// Host structure.
        host: EntityId,
        /// Addon type.
        kind: UnitKind,
    },
    /// Queue a unit.
    Train {
        /// Producing structure.
        producer: EntityId,
        /// Unit type.
        kind: UnitKind,
    },
    /// Start research.
    Research {
        /// Researching structure.
        building: EntityId,
        /// Research item.
        upgrade: Upgrade,
    },
    /// Use an ability.
    Ability {
        /// Caster.
        unit: EntityId,
        /// Ability used.
        ability: Ability,
        /// Optional target.
        target: Option<Target>,
    },
}

impl Order {
    /// The entity receiving this order.
    #[must_use]
    pub const fn subject(&self) -> EntityId {
        match *self {
            Self::Move { unit, .. }
            | Self::Attack { unit, .. }
            | Self::Gather { unit, .. }
            | Self::Ability { unit, .. } => unit,
            Self::Build { builder, .. } | Self::BuildOnGeyser { builder, .. } => builder,
            Self::BuildAddon { host, .. } => host,
            Self::Train { producer, .. } => producer,
            Self::Research { building, .. } => building,
        }
    }
}

/// Orders issued this tick plus the resources and producers they committed.
#[derive(Debug, Clone)]
pub struct CommandBuffer {
    orders: Vec<Order>,
    minerals: u32,
    gas: u32,
    supply_left: u32,
    claimed: BTreeSet<EntityId>,
    trains: BTreeMap<EntityId, u32>,
    queued: BTreeMap<UnitKind, u32>,
}

impl CommandBuffer {
    /// Start a tick with the snapshot's bank.
    #[must_use]
    pub fn new(economy: Economy) -> Self {
        Self {
            orders: Vec::new(),
            minerals: economy.minerals,
            gas: economy.gas,
            supply_left: economy.supply_left(),
            claimed: BTreeSet::new(),
            trains: BTreeMap::new(),
            queued: BTreeMap::new(),
        }
    }

    /// Minerals not yet committed this tick.
    #[must_use]
    pub const fn minerals(&self) -> u32 {
        self.minerals
    }

    /// Gas not yet committed this tick.
    #[must_use]
    pub const fn gas(&self) -> u32 {
        self.gas
    }

    /// Supply not yet committed this tick.
    #[must_use]
    pub const fn supply_left(&self) -> u32 {
        self.supply_left
    }

    /// Whether the remaining bank covers `cost`.
    #[must_use]
    pub const fn can_afford(&self, cost: Cost) -> bool {
        self.minerals >= cost.minerals && self.gas >= cost.gas
    }

    fn spend(&mut self, cost: Cost) {
        self.minerals = self.minerals.saturating_sub(cost.minerals);
        self.gas = self.gas.saturating_sub(cost.gas);
    }

    /// Whether this entity already received a production or construction
    /// order this tick.
    #[must_use]
    pub fn is_claimed(&self, id: EntityId) -> bool {
        self.claimed.contains(&id)
    }

    /// Units or structures of `kind` ordered earlier this tick.
    #[must_use]
    pub fn queued(&self, kind: UnitKind) -> u32 {
        self.queued.get(&kind).copied().unwrap_or(0)
    }

    fn note_queued(&mut self, kind: UnitKind) {
        *self.queued.entry(kind).or_insert(0) += 1;
    }

    /// Append a fire-and-forget order.
    pub fn push(&mut self, order: Order) {
        self.orders.push(order);
    }

    /// Queue a unit on `producer`, which holds `slots` parallel queues.
    ///
    /// Returns `false` without issuing anything when the producer has no free
    /// slot this tick, the bank cannot cover `cost`, or free supply is not
    /// above the kind's headroom.
    pub fn train(&mut self, producer: EntityId, slots: u32, kind: UnitKind, cost: Cost) -> bool {
        let used = self.trains.get(&producer).copied().unwrap_or(0);
        if used >= slots || self.claimed.contains(&producer) {
            return false;
        }
        if !self.can_afford(cost) || self.supply_left <= kind.supply_headroom() {
            return false;
        }
        self.spend(cost);
        self.supply_left = self.supply_left.saturating_sub(kind.supply());
        self.trains.insert(producer, used + 1);
        self.note_queued(kind);
        self.orders.push(Order::Train { producer, kind });
        true
    }

    /// Order a structure. Claims the builder.
    pub fn build(&mut self, builder: EntityId, kind: UnitKind, at: Vec2Fixed, cost: Cost) -> bool {
        if self.claimed.contains(&builder) || !self.can_afford(cost) {
            return false;
        }
        self.spend(cost);
        self.claimed.insert(builder);
        self.note_queued(kind);
        self.orders.push(Order::Build { builder, kind, at });
        true
    }

    /// Order an extractor on a geyser. Claims the builder.
    pub fn build_on_geyser(
        &mut self,
        builder: EntityId,
        kind: UnitKind,
        geyser: EntityId,
        cost: Cost,
    ) -> bool {
        if self.claimed.contains(&builder) || !self.can_afford(cost) {
            return false;
        }
        self.spend(cost);
        self.claimed.insert(builder);
        self.note_queued(kind);
        self.orders.push(Order::BuildOnGeyser {
            builder,
            kind,
            geyser,
        });
        true
    }

    /// Attach an addon. Claims the host.
    pub fn build_addon(&mut self, host: EntityId, kind: UnitKind, cost: Cost) -> bool {
        if self.claimed.contains(&host) || !self.can_afford(cost) {
            return false;
        }
        self.spend(cost);
        self.claimed.insert(host);
        self.note_queued(kind);
        self.orders.push(Order::BuildAddon { host, kind });
        true
    }

    /// Start research. Claims the building.
    pub fn research(&mut self, building: EntityId, upgrade: Upgrade) -> bool {
        let cost = upgrade.cost();
        if self.claimed.contains(&building) || !self.can_afford(cost) {
            return false;
        }
        self.spend(cost);
        self.claimed.insert(building);
        self.orders.push(Order::Research { building, upgrade });
        true
    }

    /// Use an ability that costs resources (morphs). Claims the caster.
    pub fn morph(&mut self, unit: EntityId, ability: Ability, cost: Cost) -> bool {
        if self.claimed.contains(&unit) || !self.can_afford(cost) {
            return false;
        }
        self.spend(cost);
        self.claimed.insert(unit);
        self.orders.push(Order::Ability {
            unit,
            ability,
            target: None,
        });
        true
    }

    /// Use a free ability. Claims the caster.
    pub fn ability(&mut self, unit: EntityId, ability: Ability, target: Option<Target>) {
        self.claimed.insert(unit);
        self.orders.push(Order::Ability {
            unit,
            ability,
            target,
        });
    }

    /// Orders issued so far.
    #[must_use]
    pub fn orders(&self) -> &[Order] {
        &self.orders
    }

    /// Consume the buffer, yielding its orders in issue order.
    #[must_use]
    pub fn into_orders(self) -> Vec<Order> {
        self.orders
    }
}
