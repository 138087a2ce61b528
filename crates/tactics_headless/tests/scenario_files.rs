//! Scenario and config files round-tripped through the filesystem.

use std::io::Write;
use std::path::PathBuf;

use tactics_core::combat::CombatMode;
use tactics_core::config::ControllerConfig;
use tactics_core::controller::TickOutcome;
use tactics_core::error::TacticsError;
use tactics_core::math::Fixed;
use tactics_headless::{Scenario, ScenarioError, ScenarioRunner};

fn shipped(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("../../scenarios")
        .join(name)
}

#[test]
fn shipped_scenarios_load() {
    for name in ["early_rush.ron", "mid_game.ron"] {
        let scenario = Scenario::load(shipped(name)).unwrap();
        assert!(!scenario.bases.is_empty(), "{name} has no bases");
    }
}

#[test]
fn early_rush_defends_from_the_first_tick() {
    let scenario = Scenario::load(shipped("early_rush.ron")).unwrap();
    let mut runner = ScenarioRunner::new(scenario, ControllerConfig::default(), Fixed::ONE);
    let outcome = runner.step();
    assert!(outcome.threat.cheese);
    assert_eq!(outcome.mode, CombatMode::EarlyDefense);
}

#[test]
fn scenario_from_temp_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"Scenario(
            name: "Temp",
            map_size: (120, 120),
            layout: MapLayout(
                start: (20, 20),
                enemy_start: (100, 100),
                map_center: (60, 60),
                ramp_top: (28, 28),
                expansions: [(20, 60)],
            ),
            bank: BankSetup(minerals: 50, gas: 0, supply_used: 12, supply_cap: 15),
            bases: [BaseSetup(position: (20, 20), workers: 12)],
        )"#
    )
    .unwrap();

    let scenario = Scenario::load(file.path()).unwrap();
    let mut runner = ScenarioRunner::new(scenario, ControllerConfig::default(), Fixed::ONE);
    let mut out = Vec::new();
    let summary = runner.run(3, &mut out).unwrap();
    assert_eq!(summary.ticks, 3);

    let outcomes: Vec<TickOutcome> = String::from_utf8(out)
        .unwrap()
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    assert_eq!(outcomes.len(), 3);
    assert!(outcomes.iter().all(|o| o.mode == CombatMode::Rally));
}

#[test]
fn malformed_scenario_reports_parse_error() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, "Scenario(name: ").unwrap();
    assert!(matches!(
        Scenario::load(file.path()),
        Err(ScenarioError::ParseError(_))
    ));
}

#[test]
fn default_config_round_trips_through_a_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("controller.ron");
    let text = ron::ser::to_string_pretty(
        &ControllerConfig::default(),
        ron::ser::PrettyConfig::default(),
    )
    .unwrap();
    std::fs::write(&path, text).unwrap();

    let loaded = ControllerConfig::load(&path).unwrap();
    assert_eq!(loaded, ControllerConfig::default());
}

#[test]
fn invalid_config_file_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bad.ron");
    let mut config = ControllerConfig::default();
    config.production.interval_ticks = 0;
    let text = ron::ser::to_string(&config).unwrap();
    std::fs::write(&path, text).unwrap();

    assert!(matches!(
        ControllerConfig::load(&path),
        Err(TacticsError::InvalidConfig { .. })
    ));
}
