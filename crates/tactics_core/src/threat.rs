//! Danger classification.
//!
//! Answers two questions every tick: is this an early rush (cheese), and
//! which bases have enemy combat units on top of them. Both are pure
//! functions of the snapshot.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::ThreatConfig;
use crate::math::{fx, Fixed, Vec2Fixed};
use crate::snapshot::{closest_to, Entity, EntityId, WorldSnapshot};

/// Overall danger level for a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ThreatLevel {
    /// Early intrusion at the home base; the defense override runs.
    EarlyRush,
    /// At least one base has enemy combat units nearby.
    BaseUnderAttack,
    /// Nothing at home; the army decides between rallying and attacking.
    OpenField,
}

/// Result of [`assess`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThreatReport {
    /// Overall level.
    pub level: ThreatLevel,
    /// Early-rush check result.
    pub cheese: bool,
    /// Own townhalls with enemy combat units inside the threat radius.
    pub bases_under_attack: Vec<EntityId>,
}

/// Enemies near one point, split into the groups target priority works on.
#[derive(Debug, Clone, Default)]
pub struct LocalThreats<'a> {
    /// Enemy structures that shoot back.
    pub offensive_structures: Vec<&'a Entity>,
    /// Enemy workers.
    pub workers: Vec<&'a Entity>,
    /// Enemy non-worker units.
    pub combat: Vec<&'a Entity>,
    /// Remaining enemy structures.
    pub other_structures: Vec<&'a Entity>,
}

impl<'a> LocalThreats<'a> {
    /// Classify every enemy strictly within `radius` of `center`. Passive
    /// units and illusions are ignored.
    pub fn around(world: &'a impl WorldSnapshot, center: Vec2Fixed, radius: Fixed) -> Self {
        let mut threats = Self::default();
        for unit in world.enemy_units() {
            if !unit.position.within(center, radius) || unit.kind.is_ignored_target() {
                continue;
            }
            if unit.kind.is_worker() {
                threats.workers.push(unit);
            } else {
                threats.combat.push(unit);
            }
        }
        for structure in world.enemy_structures() {
            if !structure.position.within(center, radius) {
                continue;
            }
            if structure.is_offensive_structure() {
                threats.offensive_structures.push(structure);
            } else {
                threats.other_structures.push(structure);
            }
        }
        threats
    }

    /// Nothing nearby.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.offensive_structures.is_empty()
            && self.workers.is_empty()
            && self.combat.is_empty()
            && self.other_structures.is_empty()
    }

    /// Enemy power score: every unit and structure counts once, offensive
    /// structures count `offensive_weight` times.
    #[must_use]
    pub fn power(&self, offensive_weight: u32) -> u32 {
        let units = (self.workers.len() + self.combat.len() + self.other_structures.len()) as u32;
        units + offensive_weight * self.offensive_structures.len() as u32
    }

    /// Target chosen by the five-tier priority: offensive structures, then
    /// constructing workers, then combat units, then other structures, then
    /// remaining workers. Within a tier the closest to `from` wins.
    #[must_use]
    pub fn priority_target(&self, from: Vec2Fixed) -> Option<&'a Entity> {
        let constructing = self.workers.iter().copied().filter(|w| w.is_constructing);
        closest_to(self.offensive_structures.iter().copied(), from)
            .or_else(|| closest_to(constructing, from))
            .or_else(|| closest_to(self.combat.iter().copied(), from))
            .or_else(|| closest_to(self.other_structures.iter().copied(), from))
            .or_else(|| closest_to(self.workers.iter().copied(), from))
    }
}

/// Early-rush check: match time below the cheese window and a non-worker
/// enemy combat unit or any enemy structure within the threat radius of the
/// home start location.
pub fn detect_cheese(world: &impl WorldSnapshot, config: &ThreatConfig, time: Fixed) -> bool {
    if time >= Fixed::from_num(config.cheese_window_secs) {
        return false;
    }
    let home = world.map().start;
    let radius = fx(config.base_threat_radius);
    let unit_near = world
        .enemy_units()
        .iter()
        .any(|u| u.kind.is_enemy_combat() && u.position.within(home, radius));
    let structure_near = world
        .enemy_structures()
        .iter()
        .any(|s| s.position.within(home, radius));
    unit_near || structure_near
}

/// Own townhalls with an enemy combat unit inside the threat radius, in
/// snapshot order.
pub fn classify_base_threats(world: &impl WorldSnapshot, config: &ThreatConfig) -> Vec<EntityId> {
    let radius = fx(config.base_threat_radius);
    world
        .townhalls()
        .into_iter()
        .filter(|base| {
            world
                .enemy_units()
                .iter()
                .any(|u| u.kind.is_enemy_combat() && u.position.within(base.position, radius))
        })
        .map(|base| base.id)
        .collect()
}

/// Full assessment for the current tick.
pub fn assess(world: &impl WorldSnapshot, config: &ThreatConfig) -> ThreatReport {
    let cheese = detect_cheese(world, config, world.time());
    let bases_under_attack = classify_base_threats(world, config);
    let level = if cheese {
        ThreatLevel::EarlyRush
    } else if !bases_under_attack.is_empty() {
        ThreatLevel::BaseUnderAttack
    } else {
        ThreatLevel::OpenField
    };
    debug!(
        time = %world.time(),
        ?level,
        bases = bases_under_attack.len(),
        "threat assessed"
    );
    ThreatReport {
        level,
        cheese,
        bases_under_attack,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
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
        let mut world = StaticWorld::new(map, TerrainGrid::new(200, 200));
        world.spawn_own(UnitKind::CommandCenter, Vec2Fixed::from_ints(30, 30));
        world
    }

    #[test]
    fn test_cheese_needs_early_time_and_intruder() {
        let config = ThreatConfig::default();
        let mut w = world().at_time(60);
        assert!(!detect_cheese(&w, &config, w.time()));

        w.spawn_enemy(UnitKind::Zergling, Vec2Fixed::from_ints(50, 30));
        assert!(detect_cheese(&w, &config, fx(60)));
        assert!(!detect_cheese(&w, &config, fx(180)));
        assert!(!detect_cheese(&w, &config, fx(400)));
    }

    #[test]
    fn test_cheese_ignores_workers_but_not_structures() {
        let config = ThreatConfig::default();
        let mut w = world();
        w.spawn_enemy(UnitKind::Probe, Vec2Fixed::from_ints(40, 30));
        assert!(!detect_cheese(&w, &config, fx(60)));

        w.spawn_enemy(UnitKind::Pylon, Vec2Fixed::from_ints(45, 30));
        assert!(detect_cheese(&w, &config, fx(60)));
    }

    #[test]
    fn test_base_threats_and_level() {
        let config = ThreatConfig::default();
        let mut w = world().at_time(600);
        let report = assess(&w, &config);
        assert_eq!(report.level, ThreatLevel::OpenField);

        w.spawn_enemy(UnitKind::Roach, Vec2Fixed::from_ints(35, 35));
        let report = assess(&w, &config);
        assert_eq!(report.level, ThreatLevel::BaseUnderAttack);
        assert_eq!(report.bases_under_attack.len(), 1);
        assert!(!report.cheese);
    }

    #[test]
    fn test_priority_order() {
        let mut w = world();
        let here = Vec2Fixed::from_ints(30, 30);
        w.spawn_enemy(UnitKind::Probe, Vec2Fixed::from_ints(31, 30));
        let pylon = w.spawn_enemy(UnitKind::Pylon, Vec2Fixed::from_ints(33, 30));
        let zealot = w.spawn_enemy(UnitKind::Zealot, Vec2Fixed::from_ints(40, 30));

        let threats = LocalThreats::around(&w, here, fx(30));
        assert_eq!(threats.priority_target(here).map(|e| e.id), Some(zealot));

        let cannon = w.spawn_enemy(UnitKind::PhotonCannon, Vec2Fixed::from_ints(50, 30));
        let threats = LocalThreats::around(&w, here, fx(30));
        assert_eq!(threats.priority_target(here).map(|e| e.id), Some(cannon));
        assert_eq!(threats.power(3), 3 + 3);

        w.remove(cannon);
        w.remove(zealot);
        let threats = LocalThreats::around(&w, here, fx(30));
        assert_eq!(threats.priority_target(here).map(|e| e.id), Some(pylon));
    }

    #[test]
    fn test_constructing_worker_outranks_combat() {
        let mut w = world();
        let here = Vec2Fixed::from_ints(30, 30);
        w.spawn_enemy(UnitKind::Zealot, Vec2Fixed::from_ints(32, 30));
        let id = w.next_entity_id();
        w.push_enemy(Entity::new(id, UnitKind::Probe, Vec2Fixed::from_ints(45, 30)).constructing());

        let threats = LocalThreats::around(&w, here, fx(30));
        assert_eq!(threats.priority_target(here).map(|e| e.id), Some(EntityId(id)));
    }
}
