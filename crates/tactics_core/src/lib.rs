//! # Tactics Core
//!
//! Deterministic tactical controller for a Terran-style strategy agent.
//!
//! This crate contains **only** decision logic:
//! - No engine bindings (the world arrives as a [`snapshot::WorldSnapshot`])
//! - No IO on the tick path
//! - No system randomness (one seeded RNG in the engine state)
//! - No floating-point math (uses fixed-point)
//!
//! This separation enables:
//! - Offline scenario replay in the headless runner
//! - Determinism testing (same snapshot + seed, same orders)
//! - Driving the controller from any engine adapter
//!
//! ## Crate Structure
//!
//! - [`controller`] - The per-tick pipeline
//! - [`threat`] - Danger classification
//! - [`combat`] - Defense override, attack, rally and support micro
//! - [`placement`] - Structure and addon siting
//! - [`economy`] - Workers, supply, orbitals and MULEs
//! - [`production`] - Structures, addons, research and army units
//! - [`expansion`] - New-base decisions
//! - [`scouting`] - Reconnaissance
//! - [`world`] - Plain-data snapshot for tests and replay
//! - [`math`] - Fixed-point math utilities

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod combat;
pub mod config;
pub mod controller;
pub mod economy;
pub mod error;
pub mod expansion;
pub mod math;
pub mod orders;
pub mod placement;
pub mod production;
pub mod scouting;
pub mod snapshot;
pub mod state;
pub mod terrain;
pub mod threat;
pub mod unit_kind;
pub mod world;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::combat::CombatMode;
    pub use crate::config::ControllerConfig;
    pub use crate::controller::{TacticalController, TickOutcome};
    pub use crate::error::{Result, TacticsError};
    pub use crate::expansion::ExpansionOutcome;
    pub use crate::math::{Fixed, Vec2Fixed};
    pub use crate::orders::{Ability, CommandBuffer, Order, Target, Upgrade};
    pub use crate::snapshot::{Economy, Entity, EntityId, MapInfo, ResourceField, WorldSnapshot};
    pub use crate::state::{EngineState, Stance};
    pub use crate::terrain::{TerrainCell, TerrainGrid};
    pub use crate::threat::{ThreatLevel, ThreatReport};
    pub use crate::unit_kind::{AddonKind, Cost, UnitKind, UnitRole};
    pub use crate::world::StaticWorld;
}
