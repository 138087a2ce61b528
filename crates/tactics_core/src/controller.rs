//! The per-tick pipeline driver.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::combat::{self, CombatMode};
use crate::config::ControllerConfig;
use crate::economy;
use crate::error::Result;
use crate::expansion::{self, ExpansionOutcome};
use crate::math::Fixed;
use crate::orders::{CommandBuffer, Order};
use crate::production;
use crate::scouting;
use crate::snapshot::WorldSnapshot;
use crate::state::EngineState;
use crate::threat::{self, ThreatReport};

/// Everything one tick decided.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickOutcome {
    /// Tick number this outcome belongs to.
    pub tick: u64,
    /// Danger assessment.
    pub threat: ThreatReport,
    /// What the army did.
    pub mode: CombatMode,
    /// Result of the expansion attempt.
    pub expansion: ExpansionOutcome,
    /// Whether the structure/addon/unit pass ran.
    pub production_ran: bool,
    /// Orders in issue order.
    pub orders: Vec<Order>,
}

/// Tactical controller for one match.
///
/// Owns the tick-persistent [`EngineState`] and turns each snapshot into
/// orders. Components run in a fixed order every tick:
///
/// 1. **Reconcile** - prune registries against the live entity set
/// 2. **Threat** - classify danger
/// 3. **Combat** - defense override, attack or rally
/// 4. **Economy** - workers, supply, orbitals, MULEs
/// 5. **Expansion** - new bases, with backpressure late in the match
/// 6. **Production** - structures, addons, research, army (on cadence)
/// 7. **Scouting** - assign scouts and tour the map
#[derive(Debug, Clone)]
pub struct TacticalController {
    config: ControllerConfig,
    state: EngineState,
    last_mode: Option<CombatMode>,
}

impl TacticalController {
    /// Controller with fresh state seeded from the config.
    #[must_use]
    pub fn new(config: ControllerConfig) -> Self {
        let state = EngineState::new(config.seed);
        Self {
            config,
            state,
            last_mode: None,
        }
    }

    /// Load a RON config and build a controller from it.
    pub fn from_config_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        Ok(Self::new(ControllerConfig::load(path)?))
    }

    /// Active configuration.
    #[must_use]
    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    /// Controller memory.
    #[must_use]
    pub fn state(&self) -> &EngineState {
        &self.state
    }

    /// Ticks stepped so far.
    #[must_use]
    pub fn tick(&self) -> u64 {
        self.state.tick
    }

    /// Run the pipeline once against `world`.
    pub fn step<W: WorldSnapshot>(&mut self, world: &W) -> TickOutcome {
        let tick = self.state.tick;
        let config = &self.config;
        let state = &mut self.state;

        state.reconcile(world);
        let report = threat::assess(world, &config.threat);
        let mut buffer = CommandBuffer::new(world.economy());

        let mode = combat::run(world, state, config, &report, &mut buffer);
        if self.last_mode != Some(mode) {
            info!(tick, ?mode, cheese = report.cheese, "combat mode changed");
            self.last_mode = Some(mode);
        }

        economy::run(world, state, config, &mut buffer);

        let expansion = expansion::expand(world, state, config, &mut buffer);
        let withheld = expansion == ExpansionOutcome::Unaffordable
            && world.time() >= Fixed::from_num(config.expansion.backpressure_secs);
        if withheld {
            warn!(
                tick,
                minerals = buffer.minerals(),
                "expansion unaffordable, withholding production"
            );
        }

        let production_ran = !withheld && tick % config.production.interval_ticks == 0;
        if production_ran {
            production::run(world, state, config, &mut buffer);
        }

        scouting::run(world, state, config, &mut buffer);

        state.tick += 1;
        let orders = buffer.into_orders();
        debug!(tick, orders = orders.len(), ?mode, "tick complete");

        TickOutcome {
            tick,
            threat: report,
            mode,
            expansion,
            production_ran,
            orders,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Vec2Fixed;
    use crate::snapshot::{Entity, MapInfo};
    use crate::terrain::TerrainGrid;
    use crate::threat::ThreatLevel;
    use crate::unit_kind::UnitKind;
    use crate::world::StaticWorld;

    fn world(secs: u32) -> StaticWorld {
        let map = MapInfo {
            start: Vec2Fixed::from_ints(30, 30),
            enemy_start: Vec2Fixed::from_ints(170, 170),
            map_center: Vec2Fixed::from_ints(100, 100),
            ramp_top_center: Vec2Fixed::from_ints(40, 40),
            expansion_locations: vec![Vec2Fixed::from_ints(30, 80)],
        };
        let mut world = StaticWorld::new(map, TerrainGrid::new(200, 200))
            .at_time(secs)
            .with_bank(100, 0)
            .with_supply(16, 23);
        world.spawn_own(UnitKind::CommandCenter, Vec2Fixed::from_ints(30, 30));
        for i in 0..4 {
            world.add_minerals(Vec2Fixed::from_ints(24, 28 + i), 1500);
        }
        for i in 0..16 {
            let id = world.next_entity_id();
            world.push_own(
                Entity::new(id, UnitKind::Scv, Vec2Fixed::from_ints(27 + i % 4, 27 + i / 4)).gathering(),
            );
        }
        world
    }

    #[test]
    fn test_production_cadence() {
        let w = world(100);
        let mut controller = TacticalController::new(ControllerConfig::default());
        let first = controller.step(&w);
        let second = controller.step(&w);
        assert_eq!(first.tick, 0);
        assert!(first.production_ran);
        assert_eq!(second.tick, 1);
        assert!(!second.production_ran);
        assert_eq!(controller.tick(), 2);
    }

    #[test]
    fn test_late_unaffordable_expansion_withholds_production() {
        let mut controller = TacticalController::new(ControllerConfig::default());
        let outcome = controller.step(&world(500));
        assert_eq!(outcome.expansion, ExpansionOutcome::Unaffordable);
        assert!(!outcome.production_ran);

        let mut controller = TacticalController::new(ControllerConfig::default());
        let outcome = controller.step(&world(400));
        assert_eq!(outcome.expansion, ExpansionOutcome::Unaffordable);
        assert!(outcome.production_ran);
    }

    #[test]
    fn test_quiet_map_rallies() {
        let mut controller = TacticalController::new(ControllerConfig::default());
        let outcome = controller.step(&world(100));
        assert_eq!(outcome.threat.level, ThreatLevel::OpenField);
        assert_eq!(outcome.mode, CombatMode::Rally);
    }

    #[test]
    fn test_dead_scout_pruned() {
        let mut w = world(100);
        let medivac = w.spawn_own(UnitKind::Medivac, Vec2Fixed::from_ints(60, 60));
        let mut controller = TacticalController::new(ControllerConfig::default());
        controller.step(&w);
        assert!(controller.state().scouts.contains(&medivac));

        w.remove(medivac);
        controller.step(&w);
        assert!(!controller.state().scouts.contains(&medivac));
    }
}
