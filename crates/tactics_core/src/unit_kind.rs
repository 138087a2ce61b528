//! Closed unit identity and classification.
//!
//! Every behavior dispatch in the controller ("is this a worker?", "does this
//! structure shoot back?", "how much army weight is this?") goes through the
//! exhaustive matches in this module rather than ad hoc type sets:
//! - [`UnitKind`]: every unit and structure type the controller reasons about
//! - [`UnitRole`]: the behavior class a kind belongs to
//! - [`AddonKind`]: the two addon flavours a production structure can carry
//! - [`Cost`]: fallback mineral/gas costs, used when the engine has no live data
//!
//! Unknown engine types map to [`UnitKind::Unknown`], which classifies as a
//! generic combat unit and costs the default `(100, 25)`.

use serde::{Deserialize, Serialize};

/// Mineral and gas cost of a unit, structure or research item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Cost {
    /// Mineral cost.
    pub minerals: u32,
    /// Gas cost.
    pub gas: u32,
}

impl Cost {
    /// Create a new cost.
    #[must_use]
    pub const fn new(minerals: u32, gas: u32) -> Self {
        Self { minerals, gas }
    }

    /// Combined mineral + gas value, used for army value comparisons.
    #[must_use]
    pub const fn total(self) -> u32 {
        self.minerals + self.gas
    }

    /// Default cost for kinds missing from the fallback table.
    pub const DEFAULT: Self = Self::new(100, 25);
}

/// Behavior class of a unit kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnitRole {
    /// Resource gatherer (also used as emergency defender).
    Worker,
    /// Light infantry, army weight 1.
    Light,
    /// Medium infantry, army weight 2.
    Medium,
    /// Siege-capable vehicle in either mode, army weight 4.
    Siege,
    /// Flying healer that follows the army.
    Healer,
    /// Flying caster with an area-denial ability.
    Caster,
    /// Any other unit that fights.
    Combat,
    /// Non-combat units that are never worth shooting at (eggs, larvae,
    /// passive flying scouts).
    Passive,
    /// Illusions and spies.
    Illusion,
    /// Resource-collection anchor.
    Townhall,
    /// Structure that trains army units and can carry an addon.
    Production,
    /// Addon attached to a production structure.
    Addon,
    /// Supply provider.
    Supply,
    /// Gas extractor.
    Extractor,
    /// Structure that can attack or is part of the fixed defensive set.
    Defense,
    /// Research or tech structure.
    Tech,
}

impl UnitRole {
    /// Whether this role describes a structure.
    #[must_use]
    pub const fn is_structure(self) -> bool {
        matches!(
            self,
            Self::Townhall
                | Self::Production
                | Self::Addon
                | Self::Supply
                | Self::Extractor
                | Self::Defense
                | Self::Tech
        )
    }

    /// Weighted contribution to the military-size metric.
    #[must_use]
    pub const fn military_weight(self) -> u32 {
        match self {
            Self::Light => 1,
            Self::Medium => 2,
            Self::Siege => 4,
            _ => 0,
        }
    }
}

/// Addon flavour for production structures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AddonKind {
    /// Unlocks advanced units.
    TechLab,
    /// Doubles base-unit output.
    Reactor,
}

/// Every unit and structure type the controller reasons about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum UnitKind {
    // Own faction units
    Scv,
    Mule,
    Marine,
    Marauder,
    Reaper,
    Hellion,
    SiegeTank,
    SiegeTankSieged,
    Medivac,
    Raven,
    VikingFighter,
    Banshee,
    AutoTurret,

    // Own faction structures
    CommandCenter,
    CommandCenterFlying,
    OrbitalCommand,
    PlanetaryFortress,
    SupplyDepot,
    SupplyDepotLowered,
    Refinery,
    Barracks,
    BarracksFlying,
    BarracksTechLab,
    BarracksReactor,
    Factory,
    FactoryFlying,
    FactoryTechLab,
    FactoryReactor,
    Starport,
    StarportFlying,
    StarportTechLab,
    StarportReactor,
    EngineeringBay,
    Armory,
    Bunker,
    MissileTurret,

    // Protoss
    Probe,
    Zealot,
    Stalker,
    Sentry,
    Adept,
    Immortal,
    Colossus,
    Observer,
    VoidRay,
    Nexus,
    Pylon,
    Assimilator,
    Gateway,
    CyberneticsCore,
    Forge,
    PhotonCannon,
    ShieldBattery,

    // Zerg
    Drone,
    Zergling,
    Baneling,
    Roach,
    Ravager,
    Hydralisk,
    Queen,
    Mutalisk,
    Ultralisk,
    Overlord,
    Overseer,
    Larva,
    Egg,
    Changeling,
    Hatchery,
    Extractor,
    SpawningPool,
    RoachWarren,
    SpineCrawler,
    SporeCrawler,

    /// Any engine type without a dedicated variant.
    Unknown,
}

impl UnitKind {
    /// Behavior class for this kind.
    #[must_use]
    pub const fn role(self) -> UnitRole {
        use UnitKind::*;
        match self {
            Scv | Mule | Probe | Drone => UnitRole::Worker,
            Marine | Reaper => UnitRole::Light,
            Marauder => UnitRole::Medium,
            SiegeTank | SiegeTankSieged => UnitRole::Siege,
            Medivac => UnitRole::Healer,
            Raven => UnitRole::Caster,
            Hellion | VikingFighter | Banshee | AutoTurret | Zealot | Stalker | Sentry | Adept
            | Immortal | Colossus | VoidRay | Zergling | Baneling | Roach | Ravager | Hydralisk
            | Queen | Mutalisk | Ultralisk | Unknown => UnitRole::Combat,
            Observer | Overlord | Overseer | Larva | Egg => UnitRole::Passive,
            Changeling => UnitRole::Illusion,
            CommandCenter | CommandCenterFlying | OrbitalCommand | Nexus | Hatchery => {
                UnitRole::Townhall
            }
            Barracks | BarracksFlying | Factory | FactoryFlying | Starport | StarportFlying
            | Gateway => UnitRole::Production,
            BarracksTechLab | BarracksReactor | FactoryTechLab | FactoryReactor
            | StarportTechLab | StarportReactor => UnitRole::Addon,
            SupplyDepot | SupplyDepotLowered | Pylon => UnitRole::Supply,
            Refinery | Assimilator | Extractor => UnitRole::Extractor,
            PlanetaryFortress | Bunker | MissileTurret | PhotonCannon | ShieldBattery
            | SpineCrawler | SporeCrawler => UnitRole::Defense,
            EngineeringBay | Armory | CyberneticsCore | Forge | SpawningPool | RoachWarren => {
                UnitRole::Tech
            }
        }
    }

    /// Whether this kind is a structure.
    #[must_use]
    pub const fn is_structure(self) -> bool {
        self.role().is_structure()
    }

    /// Whether this kind gathers resources.
    #[must_use]
    pub const fn is_worker(self) -> bool {
        matches!(self.role(), UnitRole::Worker)
    }

    /// Whether this kind is an own army unit counted by the attack rules
    /// (infantry, siege, healers and casters).
    #[must_use]
    pub const fn is_army(self) -> bool {
        matches!(
            self.role(),
            UnitRole::Light | UnitRole::Medium | UnitRole::Siege | UnitRole::Healer | UnitRole::Caster
        )
    }

    /// Whether this kind fights on the front line (infantry that engages,
    /// kites and retreats).
    #[must_use]
    pub const fn is_infantry(self) -> bool {
        matches!(self.role(), UnitRole::Light | UnitRole::Medium)
    }

    /// Whether an enemy of this kind counts as a combat threat: not a
    /// structure, not a worker, not passive and not an illusion.
    #[must_use]
    pub const fn is_enemy_combat(self) -> bool {
        !matches!(
            self.role(),
            UnitRole::Worker | UnitRole::Passive | UnitRole::Illusion
        ) && !self.is_structure()
    }

    /// Whether the attack filter drops this kind entirely.
    #[must_use]
    pub const fn is_ignored_target(self) -> bool {
        matches!(self.role(), UnitRole::Passive | UnitRole::Illusion)
    }

    /// Whether this structure belongs to the fixed defensive set.
    #[must_use]
    pub const fn is_defensive_structure(self) -> bool {
        matches!(self.role(), UnitRole::Defense)
    }

    /// Whether this is a townhall of any variant, including airborne.
    #[must_use]
    pub const fn is_townhall(self) -> bool {
        matches!(self.role(), UnitRole::Townhall)
    }

    /// Whether this siege unit is currently deployed.
    #[must_use]
    pub const fn is_sieged(self) -> bool {
        matches!(self, Self::SiegeTankSieged)
    }

    /// The airborne form of a liftable structure.
    #[must_use]
    pub const fn lifted(self) -> Option<Self> {
        match self {
            Self::CommandCenter => Some(Self::CommandCenterFlying),
            Self::Barracks => Some(Self::BarracksFlying),
            Self::Factory => Some(Self::FactoryFlying),
            Self::Starport => Some(Self::StarportFlying),
            _ => None,
        }
    }

    /// The grounded form of an airborne structure.
    #[must_use]
    pub const fn landed(self) -> Option<Self> {
        match self {
            Self::CommandCenterFlying => Some(Self::CommandCenter),
            Self::BarracksFlying => Some(Self::Barracks),
            Self::FactoryFlying => Some(Self::Factory),
            Self::StarportFlying => Some(Self::Starport),
            _ => None,
        }
    }

    /// Whether this is an airborne structure.
    #[must_use]
    pub const fn is_flying_structure(self) -> bool {
        self.landed().is_some()
    }

    /// Addon type this production structure builds for the given flavour.
    #[must_use]
    pub const fn addon(self, flavour: AddonKind) -> Option<Self> {
        match (self, flavour) {
            (Self::Barracks, AddonKind::TechLab) => Some(Self::BarracksTechLab),
            (Self::Barracks, AddonKind::Reactor) => Some(Self::BarracksReactor),
            (Self::Factory, AddonKind::TechLab) => Some(Self::FactoryTechLab),
            (Self::Factory, AddonKind::Reactor) => Some(Self::FactoryReactor),
            (Self::Starport, AddonKind::TechLab) => Some(Self::StarportTechLab),
            (Self::Starport, AddonKind::Reactor) => Some(Self::StarportReactor),
            _ => None,
        }
    }

    /// Addon flavour of an addon structure.
    #[must_use]
    pub const fn addon_kind(self) -> Option<AddonKind> {
        match self {
            Self::BarracksTechLab | Self::FactoryTechLab | Self::StarportTechLab => {
                Some(AddonKind::TechLab)
            }
            Self::BarracksReactor | Self::FactoryReactor | Self::StarportReactor => {
                Some(AddonKind::Reactor)
            }
            _ => None,
        }
    }

    /// Whether units of this kind fly (airborne structures included).
    #[must_use]
    pub const fn is_airborne(self) -> bool {
        use UnitKind::*;
        matches!(
            self,
            Medivac
                | Raven
                | VikingFighter
                | Banshee
                | Observer
                | VoidRay
                | Mutalisk
                | Overlord
                | Overseer
        ) || self.is_flying_structure()
    }

    /// Ground weapon range in world units; zero for kinds without a ranged
    /// ground attack.
    #[must_use]
    pub const fn ground_range(self) -> i32 {
        use UnitKind::*;
        match self {
            Marine | Reaper | Hellion | Sentry | Hydralisk | Queen => 5,
            Marauder | Stalker | Immortal | Banshee | Ravager | AutoTurret | Bunker
            | PlanetaryFortress => 6,
            SiegeTank | Colossus | PhotonCannon | SpineCrawler => 7,
            SiegeTankSieged => 13,
            Adept | Roach => 4,
            Mutalisk => 3,
            _ => 0,
        }
    }

    /// Side length of the square footprint, in grid cells.
    #[must_use]
    pub const fn footprint(self) -> u32 {
        use UnitKind::*;
        match self {
            CommandCenter | OrbitalCommand | PlanetaryFortress | Nexus | Hatchery => 5,
            Barracks | Factory | Starport | EngineeringBay | Armory | Bunker | Refinery
            | Gateway | CyberneticsCore | Forge | Assimilator | Extractor | SpawningPool
            | RoachWarren => 3,
            SupplyDepot | SupplyDepotLowered | MissileTurret | Pylon | PhotonCannon
            | ShieldBattery | SpineCrawler | SporeCrawler => 2,
            BarracksTechLab | BarracksReactor | FactoryTechLab | FactoryReactor
            | StarportTechLab | StarportReactor => 2,
            _ => 0,
        }
    }

    /// Supply consumed by one unit of this kind.
    #[must_use]
    pub const fn supply(self) -> u32 {
        use UnitKind::*;
        match self {
            Scv | Marine | Reaper | Probe | Drone | Zealot => 1,
            Marauder | Hellion | Medivac | Raven | VikingFighter | Stalker | Sentry | Adept
            | Roach | Hydralisk | Queen | Mutalisk => 2,
            SiegeTank | SiegeTankSieged | Banshee | Immortal | Ravager => 3,
            Colossus | VoidRay => 4,
            Ultralisk => 6,
            _ => 0,
        }
    }

    /// Spare supply that must exist before training this kind.
    ///
    /// Training is allowed only when free supply is strictly greater than
    /// this value.
    #[must_use]
    pub const fn supply_headroom(self) -> u32 {
        match self {
            Self::Scv => 0,
            Self::Marine | Self::Reaper => 1,
            Self::Marauder | Self::Medivac | Self::Raven => 2,
            Self::SiegeTank => 4,
            other => other.supply(),
        }
    }

    /// Fallback `(minerals, gas)` cost when the engine provides no live data.
    #[must_use]
    pub const fn fallback_cost(self) -> Cost {
        use UnitKind::*;
        let (m, g) = match self {
            Scv | Probe | Drone | Marine => (50, 0),
            Marauder => (100, 25),
            Reaper => (50, 50),
            Hellion => (100, 0),
            SiegeTank | SiegeTankSieged => (150, 125),
            VikingFighter => (150, 75),
            Medivac => (100, 100),
            Raven => (100, 200),
            Banshee => (150, 100),
            Zealot => (100, 0),
            Stalker => (125, 50),
            Sentry => (50, 100),
            Adept => (100, 25),
            Immortal => (275, 100),
            Colossus => (300, 200),
            Observer => (25, 75),
            VoidRay => (250, 150),
            Zergling => (25, 0),
            Baneling => (25, 25),
            Roach => (75, 25),
            Ravager => (75, 75),
            Hydralisk => (100, 50),
            Queen => (150, 0),
            Ultralisk => (300, 200),
            Overlord => (100, 0),
            Overseer => (50, 50),
            Mutalisk => (100, 100),
            CommandCenter => (400, 0),
            OrbitalCommand => (150, 0),
            SupplyDepot => (100, 0),
            Refinery => (75, 0),
            Barracks => (150, 0),
            Factory | Starport | Armory => (150, 100),
            EngineeringBay => (125, 0),
            BarracksTechLab | FactoryTechLab | StarportTechLab => (50, 25),
            BarracksReactor | FactoryReactor | StarportReactor => (50, 50),
            _ => return Cost::DEFAULT,
        };
        Cost::new(m, g)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_military_weights() {
        assert_eq!(UnitKind::Marine.role().military_weight(), 1);
        assert_eq!(UnitKind::Reaper.role().military_weight(), 1);
        assert_eq!(UnitKind::Marauder.role().military_weight(), 2);
        assert_eq!(UnitKind::SiegeTank.role().military_weight(), 4);
        assert_eq!(UnitKind::SiegeTankSieged.role().military_weight(), 4);
        assert_eq!(UnitKind::Medivac.role().military_weight(), 0);
        assert_eq!(UnitKind::Scv.role().military_weight(), 0);
    }

    #[test]
    fn test_enemy_combat_classification() {
        assert!(UnitKind::Zergling.is_enemy_combat());
        assert!(UnitKind::Stalker.is_enemy_combat());
        assert!(UnitKind::Unknown.is_enemy_combat());
        assert!(!UnitKind::Drone.is_enemy_combat());
        assert!(!UnitKind::Larva.is_enemy_combat());
        assert!(!UnitKind::Overlord.is_enemy_combat());
        assert!(!UnitKind::Changeling.is_enemy_combat());
        assert!(!UnitKind::Hatchery.is_enemy_combat());
    }

    #[test]
    fn test_defensive_structures() {
        for kind in [
            UnitKind::PhotonCannon,
            UnitKind::SpineCrawler,
            UnitKind::SporeCrawler,
            UnitKind::Bunker,
            UnitKind::PlanetaryFortress,
        ] {
            assert!(kind.is_defensive_structure(), "{kind:?}");
            assert!(kind.is_structure(), "{kind:?}");
        }
        assert!(!UnitKind::Pylon.is_defensive_structure());
    }

    #[test]
    fn test_lift_and_land_round_trip() {
        for kind in [UnitKind::Barracks, UnitKind::Factory, UnitKind::Starport] {
            let flying = kind.lifted().expect("liftable");
            assert!(flying.is_flying_structure());
            assert_eq!(flying.landed(), Some(kind));
        }
        assert_eq!(UnitKind::EngineeringBay.lifted(), None);
    }

    #[test]
    fn test_addon_mapping() {
        assert_eq!(
            UnitKind::Barracks.addon(AddonKind::TechLab),
            Some(UnitKind::BarracksTechLab)
        );
        assert_eq!(
            UnitKind::Starport.addon(AddonKind::Reactor),
            Some(UnitKind::StarportReactor)
        );
        assert_eq!(
            UnitKind::FactoryTechLab.addon_kind(),
            Some(AddonKind::TechLab)
        );
        assert_eq!(UnitKind::EngineeringBay.addon(AddonKind::TechLab), None);
    }

    #[test]
    fn test_fallback_costs() {
        assert_eq!(UnitKind::Marine.fallback_cost(), Cost::new(50, 0));
        assert_eq!(UnitKind::SiegeTank.fallback_cost().total(), 275);
        assert_eq!(UnitKind::Unknown.fallback_cost(), Cost::DEFAULT);
        assert_eq!(UnitKind::Changeling.fallback_cost(), Cost::new(100, 25));
    }

    #[test]
    fn test_supply_headroom() {
        assert_eq!(UnitKind::Scv.supply_headroom(), 0);
        assert_eq!(UnitKind::SiegeTank.supply_headroom(), 4);
        assert_eq!(UnitKind::Marauder.supply_headroom(), 2);
    }
}
