//! Controller tuning, loaded from RON.
//!
//! All distances are whole world units, fractions are percentages and
//! durations are seconds of match time. `Default` reproduces the tuned
//! constants the controller ships with, so an empty RON document `()` is a
//! valid config.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, TacticsError};
use crate::math::{fx, percent, Fixed};

/// Complete controller configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    /// Seed for placement shuffling and forward-unit picks.
    pub seed: u64,
    /// Danger classification.
    pub threat: ThreatConfig,
    /// Army micro and the attack decision.
    pub combat: CombatConfig,
    /// Structure siting.
    pub placement: PlacementConfig,
    /// Structure, addon, unit and economy targets.
    pub production: ProductionConfig,
    /// New-base decisions.
    pub expansion: ExpansionConfig,
    /// Reconnaissance.
    pub scouting: ScoutingConfig,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            seed: 0x5EED,
            threat: ThreatConfig::default(),
            combat: CombatConfig::default(),
            placement: PlacementConfig::default(),
            production: ProductionConfig::default(),
            expansion: ExpansionConfig::default(),
            scouting: ScoutingConfig::default(),
        }
    }
}

/// Danger classification settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThreatConfig {
    /// Match time before which an intrusion counts as cheese.
    pub cheese_window_secs: u32,
    /// Radius around a base inside which enemies count as a threat.
    pub base_threat_radius: i32,
}

impl Default for ThreatConfig {
    fn default() -> Self {
        Self {
            cheese_window_secs: 180,
            base_threat_radius: 30,
        }
    }
}

/// Army behavior and the global attack decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CombatConfig {
    /// Enemies inside this radius put a unit into the engaging state.
    pub engage_radius: i32,
    /// Health percentage below which an engaged unit retreats.
    pub retreat_health_pct: u32,
    /// How long a retreat lasts.
    pub retreat_secs: u32,
    /// How far back toward home a retreating unit moves.
    pub retreat_distance: i32,
    /// Step taken away from the nearest threat while the weapon cools down.
    pub kite_distance: i32,

    /// Rally point bias from the forward base toward the map center.
    pub rally_forward_bias: i32,
    /// Multiplier applied to each unit's id-derived rally offset.
    pub rally_spread: i32,
    /// Siege units deploy when this close to the rally point.
    pub rally_siege_enter: i32,
    /// Deployed siege units pack up when farther than this from the rally point.
    pub rally_siege_exit: i32,

    /// Match time at which siege thresholds switch to the late-game pair.
    pub siege_late_game_secs: u32,
    /// Early-game: deploy when the target is closer than this.
    pub early_siege_enter: i32,
    /// Early-game: pack up when the target is farther than this.
    pub early_siege_exit: i32,
    /// Late-game: deploy when the target is closer than this.
    pub late_siege_enter: i32,
    /// Late-game: pack up when the target is farther than this.
    pub late_siege_exit: i32,
    /// Mobile siege units approach to this distance from their target.
    pub siege_standoff: i32,

    /// Weighted military metric above which the army attacks.
    pub attack_military_metric: u32,
    /// Supply used above which the army attacks.
    pub attack_supply_used: u32,
    /// Radius around a threatened base in which friendly units are counted.
    pub base_defense_radius: i32,
    /// Friendly units must exceed enemy count by this percentage to counter-attack.
    pub base_defense_margin_pct: u32,
    /// Army value comparison only runs above this many visible enemy combat units.
    pub value_check_min_enemies: u32,
    /// Radius around the enemy centroid in which friendly value is counted.
    pub value_check_radius: i32,
    /// Baseline friendly:enemy value ratio, in percent.
    pub value_ratio_pct: u32,
    /// Ratio used when more than `value_mid_count` friendly units are near.
    pub value_ratio_mid_pct: u32,
    /// Ratio used when more than `value_high_count` friendly units are near.
    pub value_ratio_high_pct: u32,
    /// Nearby-unit count for the middle ratio.
    pub value_mid_count: u32,
    /// Nearby-unit count for the lowest ratio.
    pub value_high_count: u32,

    /// Energy a caster needs to drop its area-denial ability.
    pub caster_energy: u32,
    /// Cast range for the area-denial ability.
    pub caster_range: i32,
    /// Enemy count at which casters target the cluster centroid.
    pub caster_cluster: u32,
    /// Healers re-center on the army when displaced beyond this.
    pub healer_leash: i32,
    /// Casters re-center on the army when displaced beyond this.
    pub caster_leash: i32,
    /// Healers close to this distance of their escorted unit.
    pub healer_escort: i32,
    /// Casters close to this distance of their escorted unit.
    pub caster_escort: i32,
    /// Combat units within this distance of an enemy count as forward.
    pub forward_radius: i32,

    /// Maximum pulled workers while the economy is small.
    pub defender_cap: u32,
    /// Maximum pulled workers once the economy is established.
    pub defender_cap_established: u32,
    /// Worker count above which the economy counts as established.
    pub established_workers: u32,
    /// Extra defenders added on top of enemy power once established.
    pub defender_extra: u32,
    /// Workers within this distance of a threatened base may be pulled.
    pub defender_pickup_radius: i32,
    /// Weight of an offensive structure in the enemy power score.
    pub offensive_structure_power: u32,
}

impl Default for CombatConfig {
    fn default() -> Self {
        Self {
            engage_radius: 15,
            retreat_health_pct: 40,
            retreat_secs: 10,
            retreat_distance: 20,
            kite_distance: 2,
            rally_forward_bias: 8,
            rally_spread: 2,
            rally_siege_enter: 5,
            rally_siege_exit: 7,
            siege_late_game_secs: 300,
            early_siege_enter: 15,
            early_siege_exit: 20,
            late_siege_enter: 13,
            late_siege_exit: 15,
            siege_standoff: 12,
            attack_military_metric: 20,
            attack_supply_used: 180,
            base_defense_radius: 40,
            base_defense_margin_pct: 150,
            value_check_min_enemies: 5,
            value_check_radius: 30,
            value_ratio_pct: 200,
            value_ratio_mid_pct: 150,
            value_ratio_high_pct: 130,
            value_mid_count: 10,
            value_high_count: 15,
            caster_energy: 50,
            caster_range: 15,
            caster_cluster: 3,
            healer_leash: 5,
            caster_leash: 7,
            healer_escort: 3,
            caster_escort: 5,
            forward_radius: 15,
            defender_cap: 8,
            defender_cap_established: 12,
            established_workers: 20,
            defender_extra: 2,
            defender_pickup_radius: 10,
            offensive_structure_power: 3,
        }
    }
}

impl CombatConfig {
    /// Retreat health threshold as a fraction.
    #[must_use]
    pub fn retreat_health(&self) -> Fixed {
        percent(self.retreat_health_pct)
    }

    /// Retreat duration in seconds.
    #[must_use]
    pub fn retreat_duration(&self) -> Fixed {
        Fixed::from_num(self.retreat_secs)
    }

    /// `(enter, exit)` siege distances for the given match time.
    #[must_use]
    pub fn siege_thresholds(&self, time: Fixed) -> (Fixed, Fixed) {
        if time < Fixed::from_num(self.siege_late_game_secs) {
            (fx(self.early_siege_enter), fx(self.early_siege_exit))
        } else {
            (fx(self.late_siege_enter), fx(self.late_siege_exit))
        }
    }
}

/// Structure siting settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlacementConfig {
    /// Angular step between ring candidates.
    pub ring_step_degrees: u32,
    /// Radius of the innermost ring.
    pub min_ring_radius: i32,
    /// Distance between consecutive rings.
    pub radial_step: i32,
    /// Offset of the pathability probe points from the candidate.
    pub probe_offset: i32,
    /// Probe points (out of 8) that must be pathable.
    pub min_pathable_probes: u32,
    /// Half-width of the square scanned for a landing spot.
    pub landing_scan: i32,
    /// Clearance from other structures for production buildings.
    pub production_clearance: i32,
    /// Search radius for production buildings.
    pub production_radius: i32,
    /// Clearance from other structures for tech buildings.
    pub tech_clearance: i32,
    /// Search radius for tech buildings.
    pub tech_radius: i32,
}

impl Default for PlacementConfig {
    fn default() -> Self {
        Self {
            ring_step_degrees: 20,
            min_ring_radius: 7,
            radial_step: 2,
            probe_offset: 3,
            min_pathable_probes: 6,
            landing_scan: 10,
            production_clearance: 6,
            production_radius: 25,
            tech_clearance: 5,
            tech_radius: 20,
        }
    }
}

/// Structure, addon, unit and economy targets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProductionConfig {
    /// Ticks between structure/addon/unit production passes.
    pub interval_ticks: u64,

    /// One barracks per this many workers.
    pub workers_per_barracks: u32,
    /// Barracks cap before any factory exists.
    pub barracks_cap: u32,
    /// Barracks cap once a factory exists.
    pub barracks_cap_factory: u32,
    /// Barracks cap once a starport exists.
    pub barracks_cap_starport: u32,
    /// Barracks target while only one base is ready.
    pub single_base_barracks: u32,
    /// Military metric required for the first factory.
    pub factory_metric: u32,
    /// Ground army required for additional factories.
    pub factory_ground_army: u32,
    /// Hard factory cap (further limited by ready bases).
    pub max_factories: u32,
    /// Military metric required for starports.
    pub starport_metric: u32,
    /// Starport cap.
    pub max_starports: u32,
    /// Military metric required for engineering bays, armory and research.
    pub upgrade_metric: u32,
    /// Engineering bay cap.
    pub max_engineering_bays: u32,

    /// Target tech-lab share among barracks addons, in percent.
    pub techlab_share_pct: u32,
    /// Marauders are trained while `marauders < marines + offset`.
    pub marauder_offset: u32,
    /// Military metric required for siege units.
    pub siege_metric: u32,
    /// One healer per this many infantry.
    pub infantry_per_healer: u32,
    /// Caster cap.
    pub max_casters: u32,

    /// Effective worker cap.
    pub max_workers: u32,
    /// Effective workers per ready base.
    pub workers_per_base: u32,
    /// Worker equivalent of one resource-drop unit.
    pub mule_worker_equivalent: u32,
    /// Supply headroom wanted per base.
    pub supply_headroom_per_base: u32,
    /// Lowered depots raise when an enemy is this close.
    pub depot_raise_radius: i32,
    /// Energy required for a resource drop.
    pub mule_energy: u32,
    /// Mineral fields within this radius are drop candidates.
    pub mule_radius: i32,
    /// Geysers within this radius of a ready base are refinery candidates.
    pub geyser_radius: i32,
}

impl Default for ProductionConfig {
    fn default() -> Self {
        Self {
            interval_ticks: 10,
            workers_per_barracks: 6,
            barracks_cap: 4,
            barracks_cap_factory: 8,
            barracks_cap_starport: 12,
            single_base_barracks: 2,
            factory_metric: 10,
            factory_ground_army: 30,
            max_factories: 3,
            starport_metric: 10,
            max_starports: 2,
            upgrade_metric: 30,
            max_engineering_bays: 2,
            techlab_share_pct: 60,
            marauder_offset: 2,
            siege_metric: 10,
            infantry_per_healer: 8,
            max_casters: 2,
            max_workers: 80,
            workers_per_base: 20,
            mule_worker_equivalent: 4,
            supply_headroom_per_base: 6,
            depot_raise_radius: 10,
            mule_energy: 50,
            mule_radius: 10,
            geyser_radius: 10,
        }
    }
}

/// New-base decision settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExpansionConfig {
    /// No expansion once the base count exceeds this.
    pub max_bases: u32,
    /// No expansion while this many are pending.
    pub max_pending: u32,
    /// Bases with less remaining minerals than this are ignored.
    pub viable_minerals: u32,
    /// Workers a viable base needs before expanding.
    pub saturation_workers: u32,
    /// Radius for counting workers and minerals around a base.
    pub saturation_radius: i32,
    /// Score weight per mineral, in percent.
    pub mineral_weight_pct: u32,
    /// Score penalty per unit of distance from home.
    pub home_distance_weight: i32,
    /// Score bonus per unit of distance from the enemy start.
    pub enemy_distance_weight: i32,
    /// Sites closer than this to the enemy start are rejected.
    pub enemy_exclusion_radius: i32,
    /// Match time after which an unaffordable expansion withholds production.
    pub backpressure_secs: u32,
}

impl Default for ExpansionConfig {
    fn default() -> Self {
        Self {
            max_bases: 12,
            max_pending: 2,
            viable_minerals: 2000,
            saturation_workers: 16,
            saturation_radius: 10,
            mineral_weight_pct: 1,
            home_distance_weight: 2,
            enemy_distance_weight: 1,
            enemy_exclusion_radius: 40,
            backpressure_secs: 480,
        }
    }
}

/// Reconnaissance settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoutingConfig {
    /// Match time after which two scouts are kept.
    pub second_scout_secs: u32,
    /// A combat unit is drafted only when more than this many exist.
    pub spare_combat_threshold: u32,
    /// Health percentage below which a threatened scout heads home.
    pub flee_health_pct: u32,
    /// Enemy distance that makes a wounded scout flee.
    pub flee_radius: i32,
    /// A location is not revisited for this long.
    pub revisit_secs: u32,
    /// Distance at which a scout counts as arrived.
    pub arrival_radius: i32,
}

impl Default for ScoutingConfig {
    fn default() -> Self {
        Self {
            second_scout_secs: 600,
            spare_combat_threshold: 15,
            flee_health_pct: 30,
            flee_radius: 10,
            revisit_secs: 120,
            arrival_radius: 3,
        }
    }
}

impl ControllerConfig {
    /// Load and validate a config from a RON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(TacticsError::ConfigNotFound(path.display().to_string()));
        }
        let contents = std::fs::read_to_string(path)?;
        Self::from_ron_str(&contents)
    }

    /// Parse and validate a config from a RON string.
    pub fn from_ron_str(ron: &str) -> Result<Self> {
        let config: Self = ron::from_str(ron)?;
        config.validate()?;
        Ok(config)
    }

    /// Check cross-field consistency.
    pub fn validate(&self) -> Result<()> {
        let c = &self.combat;
        if c.early_siege_exit <= c.early_siege_enter {
            return Err(TacticsError::invalid(
                "combat.early_siege_exit",
                format!(
                    "must exceed early_siege_enter ({} <= {})",
                    c.early_siege_exit, c.early_siege_enter
                ),
            ));
        }
        if c.late_siege_exit <= c.late_siege_enter {
            return Err(TacticsError::invalid(
                "combat.late_siege_exit",
                format!(
                    "must exceed late_siege_enter ({} <= {})",
                    c.late_siege_exit, c.late_siege_enter
                ),
            ));
        }
        if c.rally_siege_exit <= c.rally_siege_enter {
            return Err(TacticsError::invalid(
                "combat.rally_siege_exit",
                "must exceed rally_siege_enter",
            ));
        }
        if c.retreat_health_pct > 100 {
            return Err(TacticsError::invalid(
                "combat.retreat_health_pct",
                "must be a percentage",
            ));
        }
        if c.engage_radius <= 0 {
            return Err(TacticsError::invalid("combat.engage_radius", "must be positive"));
        }

        let p = &self.placement;
        if p.ring_step_degrees == 0 || p.ring_step_degrees > 360 {
            return Err(TacticsError::invalid(
                "placement.ring_step_degrees",
                "must be within 1..=360",
            ));
        }
        if p.radial_step <= 0 {
            return Err(TacticsError::invalid("placement.radial_step", "must be positive"));
        }
        if p.min_pathable_probes > 8 {
            return Err(TacticsError::invalid(
                "placement.min_pathable_probes",
                "at most 8 probe points exist",
            ));
        }

        let prod = &self.production;
        if prod.interval_ticks == 0 {
            return Err(TacticsError::invalid(
                "production.interval_ticks",
                "must be non-zero",
            ));
        }
        if prod.workers_per_barracks == 0 || prod.infantry_per_healer == 0 {
            return Err(TacticsError::invalid(
                "production.workers_per_barracks",
                "divisors must be non-zero",
            ));
        }
        if prod.techlab_share_pct > 100 {
            return Err(TacticsError::invalid(
                "production.techlab_share_pct",
                "must be a percentage",
            ));
        }

        if self.scouting.flee_health_pct > 100 {
            return Err(TacticsError::invalid(
                "scouting.flee_health_pct",
                "must be a percentage",
            ));
        }
        if self.threat.cheese_window_secs == 0 {
            return Err(TacticsError::invalid(
                "threat.cheese_window_secs",
                "must be non-zero",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(ControllerConfig::default().validate().is_ok());
    }

    #[test]
    fn test_empty_document_uses_defaults() {
        let config = ControllerConfig::from_ron_str("()").unwrap();
        assert_eq!(config, ControllerConfig::default());
    }

    #[test]
    fn test_partial_override() {
        let config = ControllerConfig::from_ron_str(
            "(seed: 7, threat: (cheese_window_secs: 240), combat: (engage_radius: 12))",
        )
        .unwrap();
        assert_eq!(config.seed, 7);
        assert_eq!(config.threat.cheese_window_secs, 240);
        assert_eq!(config.threat.base_threat_radius, 30);
        assert_eq!(config.combat.engage_radius, 12);
        assert_eq!(config.combat.retreat_secs, 10);
    }

    #[test]
    fn test_inverted_siege_range_rejected() {
        let err = ControllerConfig::from_ron_str(
            "(combat: (late_siege_enter: 15, late_siege_exit: 13))",
        )
        .unwrap_err();
        assert!(matches!(
            err,
            TacticsError::InvalidConfig {
                field: "combat.late_siege_exit",
                ..
            }
        ));
    }

    #[test]
    fn test_zero_interval_rejected() {
        let mut config = ControllerConfig::default();
        config.production.interval_ticks = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_malformed_ron_is_parse_error() {
        let err = ControllerConfig::from_ron_str("(seed: )").unwrap_err();
        assert!(matches!(err, TacticsError::ConfigParse(_)));
    }

    #[test]
    fn test_missing_file() {
        let err = ControllerConfig::load("/nonexistent/controller.ron").unwrap_err();
        assert!(matches!(err, TacticsError::ConfigNotFound(_)));
    }

    #[test]
    fn test_siege_thresholds_switch_with_time() {
        let combat = CombatConfig::default();
        assert_eq!(combat.siege_thresholds(fx(60)), (fx(15), fx(20)));
        assert_eq!(combat.siege_thresholds(fx(300)), (fx(13), fx(15)));
    }
}
