//! Scenario runner.
//!
//! Steps a [`TacticalController`] against a scenario world for a fixed
//! number of ticks, advancing the match clock after each tick, and writes
//! every [`TickOutcome`] to a sink as one JSON object per line.

use std::io::Write;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use tactics_core::combat::CombatMode;
use tactics_core::config::ControllerConfig;
use tactics_core::controller::{TacticalController, TickOutcome};
use tactics_core::math::Fixed;
use tactics_core::world::StaticWorld;

use crate::scenario::Scenario;

/// Error type for runner output.
#[derive(Error, Debug)]
pub enum RunnerError {
    /// Writing to the sink failed.
    #[error("Failed to write tick output: {0}")]
    Io(#[from] std::io::Error),
    /// Encoding an outcome failed.
    #[error("Failed to encode tick output: {0}")]
    Json(#[from] serde_json::Error),
}

/// Totals over one run, printed once the last tick is written.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Ticks stepped.
    pub ticks: u64,
    /// Orders issued across all ticks.
    pub orders: u64,
    /// Ticks on which the production pass ran.
    pub production_ticks: u64,
    /// Ticks spent defending.
    pub defense_ticks: u64,
    /// Combat mode on the final tick.
    pub final_mode: Option<CombatMode>,
}

/// A controller bound to a scenario world.
pub struct ScenarioRunner {
    world: StaticWorld,
    controller: TacticalController,
    secs_per_tick: Fixed,
}

impl ScenarioRunner {
    /// Create a runner for `scenario` with the given config.
    #[must_use]
    pub fn new(scenario: Scenario, config: ControllerConfig, secs_per_tick: Fixed) -> Self {
        info!(name = %scenario.name, seed = config.seed, "loading scenario");
        Self {
            world: scenario.into_world(),
            controller: TacticalController::new(config),
            secs_per_tick,
        }
    }

    /// The world as the controller sees it next tick.
    #[must_use]
    pub fn world(&self) -> &StaticWorld {
        &self.world
    }

    /// Step once and advance the clock.
    pub fn step(&mut self) -> TickOutcome {
        let outcome = self.controller.step(&self.world);
        self.world.time += self.secs_per_tick;
        outcome
    }

    /// Step `ticks` times, writing each outcome as a JSON line to `out`.
    pub fn run<W: Write>(&mut self, ticks: u64, out: &mut W) -> Result<RunSummary, RunnerError> {
        let mut summary = RunSummary::default();
        for _ in 0..ticks {
            let outcome = self.step();
            serde_json::to_writer(&mut *out, &outcome)?;
            writeln!(out)?;

            summary.ticks += 1;
            summary.orders += outcome.orders.len() as u64;
            summary.production_ticks += u64::from(outcome.production_ran);
            summary.defense_ticks += u64::from(matches!(
                outcome.mode,
                CombatMode::EarlyDefense | CombatMode::BaseDefense
            ));
            summary.final_mode = Some(outcome.mode);
            debug!(tick = outcome.tick, orders = outcome.orders.len(), "tick written");
        }
        out.flush()?;
        info!(
            ticks = summary.ticks,
            orders = summary.orders,
            production_ticks = summary.production_ticks,
            "run complete"
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenario::{BankSetup, BaseSetup, MapLayout, UnitPlacement};
    use tactics_core::unit_kind::UnitKind;

    fn scenario() -> Scenario {
        Scenario {
            name: "Opening".to_string(),
            description: String::new(),
            time_secs: 30,
            map_size: (200, 200),
            layout: MapLayout {
                start: (30, 30),
                enemy_start: (170, 170),
                map_center: (100, 100),
                ramp_top: (40, 40),
                expansions: vec![(30, 80), (80, 30)],
            },
            terrain: Vec::new(),
            bank: BankSetup {
                minerals: 400,
                gas: 0,
                supply_used: 12,
                supply_cap: 15,
            },
            bases: vec![BaseSetup {
                position: (30, 30),
                workers: 12,
                field_minerals: 1500,
            }],
            own: vec![UnitPlacement::new(UnitKind::Marine, 36, 36, 2)],
            enemies: Vec::new(),
        }
    }

    #[test]
    fn test_writes_one_line_per_tick() {
        let mut runner = ScenarioRunner::new(scenario(), ControllerConfig::default(), Fixed::ONE);
        let mut out = Vec::new();
        let summary = runner.run(5, &mut out).unwrap();

        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 5);
        assert_eq!(summary.ticks, 5);

        let first: TickOutcome = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first.tick, 0);
        let last: TickOutcome = serde_json::from_str(lines[4]).unwrap();
        assert_eq!(last.tick, 4);
        let total: u64 = lines
            .iter()
            .map(|l| serde_json::from_str::<TickOutcome>(l).unwrap().orders.len() as u64)
            .sum();
        assert_eq!(total, summary.orders);
    }

    #[test]
    fn test_clock_advances() {
        let mut runner = ScenarioRunner::new(scenario(), ControllerConfig::default(), Fixed::ONE);
        runner.step();
        runner.step();
        assert_eq!(runner.world().time, Fixed::from_num(32));
    }

    #[test]
    fn test_quiet_scenario_never_defends() {
        let mut runner = ScenarioRunner::new(scenario(), ControllerConfig::default(), Fixed::ONE);
        let summary = runner.run(10, &mut std::io::sink()).unwrap();
        assert_eq!(summary.defense_ticks, 0);
        assert_eq!(summary.final_mode, Some(CombatMode::Rally));
    }
}
