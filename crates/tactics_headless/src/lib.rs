//! Headless scenario runner for offline replay and CI verification.
//!
//! This crate steps the tactical controller against scenario worlds loaded
//! from RON, with no engine attached. This enables:
//!
//! - **Offline replay**: Re-run a frozen match moment and inspect every order
//! - **CI verification**: Scenario regressions and determinism checks
//! - **Config tuning**: Validate a config file before shipping it
//!
//! # Output
//!
//! - **stdout**: One [`TickOutcome`](tactics_core::controller::TickOutcome)
//!   per line (JSON)
//! - **stderr**: Logs (human-readable)
//!
//! # Example
//!
//! ```bash
//! # Run a scenario for 120 ticks
//! cargo run -p tactics_headless -- run --scenario scenarios/early_rush.ron --ticks 120
//!
//! # Check a config file
//! cargo run -p tactics_headless -- validate-config controller.ron
//! ```

pub mod runner;
pub mod scenario;

pub use runner::{RunSummary, RunnerError, ScenarioRunner};
pub use scenario::{Scenario, ScenarioError};
