//! Army control.
//!
//! Each tick the army is in exactly one mode, chosen from the threat report
//! and the attack rules:
//!
//! 1. Support units follow the army (always).
//! 2. Early rush: the defense override pulls workers and fights at home.
//! 3. A base under attack: the attack routine runs regardless of rules.
//! 4. Otherwise [`should_attack`] picks between attacking and rallying.
//!
//! Units assigned to scouting never receive combat orders.

pub mod attack;
pub mod defense;
pub mod rally;
pub mod support;

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::ControllerConfig;
use crate::math::{fx, Fixed};
use crate::orders::CommandBuffer;
use crate::snapshot::{center, closer_than, Entity, EntityId, WorldSnapshot};
use crate::state::EngineState;
use crate::threat::{ThreatLevel, ThreatReport};
use crate::unit_kind::UnitRole;

/// Own army split by behavior, scouts excluded.
#[derive(Debug, Clone, Default)]
pub struct Army<'a> {
    /// Front-line infantry.
    pub infantry: Vec<&'a Entity>,
    /// Siege units in either mode.
    pub siege: Vec<&'a Entity>,
    /// Flying healers.
    pub healers: Vec<&'a Entity>,
    /// Flying casters.
    pub casters: Vec<&'a Entity>,
}

impl<'a> Army<'a> {
    /// Group own units, skipping `excluded` ids.
    pub fn gather(world: &'a impl WorldSnapshot, excluded: &BTreeSet<EntityId>) -> Self {
        let mut army = Self::default();
        for unit in world.own_units() {
            if excluded.contains(&unit.id) {
                continue;
            }
            match unit.role() {
                UnitRole::Light | UnitRole::Medium => army.infantry.push(unit),
                UnitRole::Siege => army.siege.push(unit),
                UnitRole::Healer => army.healers.push(unit),
                UnitRole::Caster => army.casters.push(unit),
                _ => {}
            }
        }
        army
    }

    /// No infantry and no siege units.
    #[must_use]
    pub fn has_fighters(&self) -> bool {
        !self.infantry.is_empty() || !self.siege.is_empty()
    }
}

/// What the army did this tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CombatMode {
    /// Early-rush defense override.
    EarlyDefense,
    /// Attack routine triggered by a base under attack.
    BaseDefense,
    /// Attack routine triggered by the attack rules.
    Attack,
    /// Holding at the rally point.
    Rally,
}

/// Result of one attack rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Attack now; stop evaluating.
    Attack,
    /// Do not attack; stop evaluating.
    Hold,
    /// No opinion; try the next rule.
    Pass,
}

/// Signature shared by every attack rule.
pub type AttackRule<W> = fn(&W, &ControllerConfig) -> Verdict;

/// Attack rules in priority order.
#[must_use]
pub fn attack_rules<W: WorldSnapshot>() -> [(&'static str, AttackRule<W>); 4] {
    [
        ("base_defense", rule_base_defense::<W>),
        ("military_metric", rule_military_metric::<W>),
        ("supply_used", rule_supply_used::<W>),
        ("army_value", rule_army_value::<W>),
    ]
}

/// A threatened base decides alone: counter-attack only with a clear local
/// numbers advantage, otherwise hold.
pub fn rule_base_defense<W: WorldSnapshot>(world: &W, config: &ControllerConfig) -> Verdict {
    let threat_radius = fx(config.threat.base_threat_radius);
    let defense_radius = fx(config.combat.base_defense_radius);
    let army = world.army();
    for base in world.townhalls() {
        let enemies = world
            .enemy_units()
            .iter()
            .filter(|u| u.kind.is_enemy_combat() && u.position.within(base.position, threat_radius))
            .count() as u32;
        if enemies == 0 {
            continue;
        }
        let defenders = army
            .iter()
            .filter(|u| u.position.within(base.position, defense_radius))
            .count() as u32;
        return if defenders * 100 > enemies * config.combat.base_defense_margin_pct {
            Verdict::Attack
        } else {
            Verdict::Hold
        };
    }
    Verdict::Pass
}

/// Attack once the weighted army is large enough.
pub fn rule_military_metric<W: WorldSnapshot>(world: &W, config: &ControllerConfig) -> Verdict {
    if world.military_metric() > config.combat.attack_military_metric {
        Verdict::Attack
    } else {
        Verdict::Pass
    }
}

/// Attack when supply is nearly maxed.
pub fn rule_supply_used<W: WorldSnapshot>(world: &W, config: &ControllerConfig) -> Verdict {
    if world.economy().supply_used > config.combat.attack_supply_used {
        Verdict::Attack
    } else {
        Verdict::Pass
    }
}

/// Friendly:enemy value ratio required for `nearby` friendly units, in percent.
#[must_use]
pub fn value_ratio_pct(nearby: u32, config: &ControllerConfig) -> u32 {
    let c = &config.combat;
    if nearby > c.value_high_count {
        c.value_ratio_high_pct
    } else if nearby > c.value_mid_count {
        c.value_ratio_mid_pct
    } else {
        c.value_ratio_pct
    }
}

/// Attack a visible enemy force when the army near it is worth enough more.
pub fn rule_army_value<W: WorldSnapshot>(world: &W, config: &ControllerConfig) -> Verdict {
    let enemies: Vec<&Entity> = world
        .enemy_units()
        .iter()
        .filter(|u| u.kind.is_enemy_combat())
        .collect();
    if enemies.len() as u32 <= config.combat.value_check_min_enemies {
        return Verdict::Pass;
    }
    let Some(enemy_center) = center(enemies.iter().copied()) else {
        return Verdict::Pass;
    };
    let enemy_value: u32 = enemies.iter().map(|u| world.unit_cost(u.kind).total()).sum();
    let nearby = closer_than(world.army(), enemy_center, fx(config.combat.value_check_radius));
    let friendly_value: u32 = nearby.iter().map(|u| world.unit_cost(u.kind).total()).sum();
    let ratio = value_ratio_pct(nearby.len() as u32, config);
    if u64::from(friendly_value) * 100 > u64::from(enemy_value) * u64::from(ratio) {
        debug!(friendly_value, enemy_value, ratio, "army value advantage");
        Verdict::Attack
    } else {
        Verdict::Pass
    }
}

/// Name of the rule that decided to attack, or `None` to hold.
pub fn attack_decision<W: WorldSnapshot>(world: &W, config: &ControllerConfig) -> Option<&'static str> {
    for (name, rule) in attack_rules::<W>() {
        match rule(world, config) {
            Verdict::Attack => return Some(name),
            Verdict::Hold => return None,
            Verdict::Pass => {}
        }
    }
    None
}

/// Global attack decision.
pub fn should_attack<W: WorldSnapshot>(world: &W, config: &ControllerConfig) -> bool {
    attack_decision(world, config).is_some()
}

/// Whether `id` is inside an open retreat window.
pub(crate) fn is_retreating(state: &EngineState, id: EntityId) -> bool {
    state.retreats.contains(id)
}

/// Run army control for one tick.
pub fn run<W: WorldSnapshot>(
    world: &W,
    state: &mut EngineState,
    config: &ControllerConfig,
    report: &ThreatReport,
    buffer: &mut CommandBuffer,
) -> CombatMode {
    let now: Fixed = world.time();
    state.retreats.expire(now, config.combat.retreat_duration());

    let scouts = state.scouts.clone();
    let army = Army::gather(world, &scouts);

    support::follow_army(world, state, config, &army, buffer);

    if report.level == ThreatLevel::EarlyRush {
        defense::early_game_defense(world, state, config, &army, buffer);
        return CombatMode::EarlyDefense;
    }

    if !report.bases_under_attack.is_empty() {
        debug!(bases = report.bases_under_attack.len(), "defending threatened base");
        attack::execute_attack(world, state, config, &army, buffer);
        return CombatMode::BaseDefense;
    }

    match attack_decision(world, config) {
        Some(rule) => {
            info!(rule, tick = state.tick, "attacking");
            attack::execute_attack(world, state, config, &army, buffer);
            CombatMode::Attack
        }
        None => {
            rally::rally(world, state, config, &army, buffer);
            CombatMode::Rally
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
        let mut world = StaticWorld::new(map, TerrainGrid::new(200, 200)).at_time(400);
        world.spawn_own(UnitKind::CommandCenter, Vec2Fixed::from_ints(30, 30));
        world
    }

    fn spawn_many(world: &mut StaticWorld, kind: UnitKind, n: u32, x: i32, y: i32) {
        for i in 0..n {
            world.spawn_own(kind, Vec2Fixed::from_ints(x + i as i32 % 5, y + i as i32 / 5));
        }
    }

    #[test]
    fn test_metric_eighteen_does_not_fire() {
        let config = ControllerConfig::default();
        let mut w = world();
        spawn_many(&mut w, UnitKind::Marine, 10, 50, 50);
        spawn_many(&mut w, UnitKind::SiegeTank, 2, 60, 60);
        assert_eq!(w.military_metric(), 18);
        assert_eq!(rule_military_metric(&w, &config), Verdict::Pass);
        assert!(!should_attack(&w, &config));
    }

    #[test]
    fn test_metric_rule_fires_above_threshold() {
        let config = ControllerConfig::default();
        let mut w = world();
        spawn_many(&mut w, UnitKind::Marauder, 11, 50, 50);
        assert_eq!(attack_decision(&w, &config), Some("military_metric"));
    }

    #[test]
    fn test_base_defense_overrides_metric() {
        let config = ControllerConfig::default();
        let mut w = world();
        spawn_many(&mut w, UnitKind::Marauder, 11, 120, 120);
        for i in 0..3 {
            w.spawn_enemy(UnitKind::Roach, Vec2Fixed::from_ints(40 + i, 30));
        }
        // Army is far away: hold despite metric 22
        assert_eq!(attack_decision(&w, &config), None);

        // Five defenders against three roaches: 500 > 450
        spawn_many(&mut w, UnitKind::Marine, 5, 35, 35);
        assert_eq!(attack_decision(&w, &config), Some("base_defense"));
    }

    #[test]
    fn test_supply_rule() {
        let config = ControllerConfig::default();
        let w = world().with_supply(181, 200);
        assert_eq!(attack_decision(&w, &config), Some("supply_used"));
    }

    #[test]
    fn test_value_ratio_tiers() {
        let config = ControllerConfig::default();
        assert_eq!(value_ratio_pct(5, &config), 200);
        assert_eq!(value_ratio_pct(11, &config), 150);
        assert_eq!(value_ratio_pct(16, &config), 130);
    }

    #[test]
    fn test_army_value_rule() {
        let config = ControllerConfig::default();
        let mut w = world();
        // Six zerglings far from home: value 150
        for i in 0..6 {
            w.spawn_enemy(UnitKind::Zergling, Vec2Fixed::from_ints(120 + i, 120));
        }
        assert_eq!(rule_army_value(&w, &config), Verdict::Pass);
        // Four marines nearby: value 200, needs > 300
        spawn_many(&mut w, UnitKind::Marine, 4, 115, 115);
        assert_eq!(rule_army_value(&w, &config), Verdict::Pass);
        // Seven marines: value 350 > 300
        spawn_many(&mut w, UnitKind::Marine, 3, 115, 118);
        assert_eq!(rule_army_value(&w, &config), Verdict::Attack);
    }

    #[test]
    fn test_army_groups_skip_scouts() {
        let mut w = world();
        let medivac = w.spawn_own(UnitKind::Medivac, Vec2Fixed::from_ints(40, 40));
        w.spawn_own(UnitKind::Raven, Vec2Fixed::from_ints(40, 41));
        w.spawn_own(UnitKind::Marine, Vec2Fixed::from_ints(40, 42));
        let scouts: BTreeSet<EntityId> = [medivac].into_iter().collect();
        let army = Army::gather(&w, &scouts);
        assert!(army.healers.is_empty());
        assert_eq!(army.casters.len(), 1);
        assert_eq!(army.infantry.len(), 1);
    }
}
