//! Determinism testing utilities.
//!
//! Provides a harness for verifying that the controller issues identical
//! orders given identical snapshots and seeds.
//!
//! # Testing Strategy
//!
//! Replays must be reproducible so that a logged match can be stepped again
//! offline. Sources of non-determinism include:
//!
//! - **Floating-point math**: Different CPUs can produce different results.
//!   We use fixed-point arithmetic via [`tactics_core::math::Fixed`] throughout.
//!
//! - **HashMap iteration order**: Rust's default hasher is randomized.
//!   Registries iterate in sorted entity ID order.
//!
//! - **System randomness**: Placement shuffles and escort picks draw from a
//!   single `StdRng` seeded from the config.
//!
//! # Test Levels
//!
//! 1. **Unit tests**: Individual component determinism (placement, support)
//! 2. **Property tests**: Random inputs must still produce deterministic outputs
//! 3. **Integration tests**: Full controller replays are reproducible
//! 4. **Parallel tests**: Running N replays on scoped threads all match

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::thread;

use tactics_core::config::ControllerConfig;
use tactics_core::controller::{TacticalController, TickOutcome};
use tactics_core::math::Fixed;
use tactics_core::world::StaticWorld;

/// Result of a determinism test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeterminismResult {
    /// Whether all runs produced identical results.
    pub is_deterministic: bool,
    /// Hashes from each run.
    pub hashes: Vec<u64>,
    /// Number of ticks stepped.
    pub ticks: u64,
}

impl DeterminismResult {
    /// Get all unique hashes (should be 1 for a deterministic controller).
    #[must_use]
    pub fn unique_hashes(&self) -> Vec<u64> {
        let mut unique: Vec<u64> = self.hashes.clone();
        unique.sort_unstable();
        unique.dedup();
        unique
    }

    /// Assert that the controller was deterministic, with a detailed error message.
    ///
    /// # Panics
    ///
    /// Panics if the runs produced different hashes.
    pub fn assert_deterministic(&self) {
        if !self.is_deterministic {
            let unique = self.unique_hashes();
            panic!(
                "Controller is non-deterministic!\n\
                 Runs: {}\n\
                 Ticks: {}\n\
                 Unique hashes: {} (expected 1)\n\
                 All hashes: {:?}",
                self.hashes.len(),
                self.ticks,
                unique.len(),
                self.hashes
            );
        }
    }
}

/// Run a stepping process multiple times and verify determinism.
///
/// # Arguments
///
/// * `runs` - Number of times to run
/// * `ticks` - Number of ticks per run
/// * `setup` - Function to create the initial state
/// * `step` - Function to advance by one tick
/// * `hash` - Function to compute a state hash
pub fn verify_determinism<S, Setup, Step, HashFn>(
    runs: usize,
    ticks: u64,
    setup: Setup,
    step: Step,
    hash: HashFn,
) -> DeterminismResult
where
    Setup: Fn() -> S,
    Step: Fn(&mut S),
    HashFn: Fn(&S) -> u64,
{
    let mut hashes = Vec::with_capacity(runs);

    for _ in 0..runs {
        let mut state = setup();

        for _ in 0..ticks {
            step(&mut state);
        }

        hashes.push(hash(&state));
    }

    let is_deterministic = hashes.windows(2).all(|w| w[0] == w[1]);

    DeterminismResult {
        is_deterministic,
        hashes,
        ticks,
    }
}

/// A controller replaying a world whose clock advances every tick.
#[derive(Debug, Clone)]
pub struct Replay {
    /// The world being replayed.
    pub world: StaticWorld,
    /// Controller under test.
    pub controller: TacticalController,
    /// Match seconds added to the clock after each tick.
    pub secs_per_tick: Fixed,
    /// Running hash over every order issued so far.
    pub order_hash: u64,
}

impl Replay {
    /// Start a replay at the world's current time.
    #[must_use]
    pub fn new(world: StaticWorld, config: ControllerConfig, secs_per_tick: Fixed) -> Self {
        Self {
            world,
            controller: TacticalController::new(config),
            secs_per_tick,
            order_hash: 0,
        }
    }

    /// Step once, fold the orders into the running hash and advance the clock.
    pub fn step(&mut self) -> TickOutcome {
        let outcome = self.controller.step(&self.world);
        self.order_hash = compute_hash(&(self.order_hash, &outcome.orders));
        self.world.time += self.secs_per_tick;
        outcome
    }
}

/// Replay `world` twice with the same config and compare the order streams.
///
/// # Returns
///
/// `true` if both runs issued identical orders on every tick.
pub fn verify_controller_determinism<F>(setup_fn: F, config: &ControllerConfig, num_ticks: u64) -> bool
where
    F: Fn() -> StaticWorld,
{
    let result = verify_determinism(
        2,
        num_ticks,
        || Replay::new(setup_fn(), config.clone(), Fixed::ONE),
        |replay| {
            replay.step();
        },
        |replay| replay.order_hash,
    );
    result.is_deterministic
}

/// Run N replays on scoped threads and collect their order hashes.
///
/// Catches non-determinism that only manifests under thread scheduling or
/// memory layout differences.
pub fn run_parallel_replays<F>(
    setup_fn: F,
    config: &ControllerConfig,
    num_runs: usize,
    num_ticks: u64,
) -> DeterminismResult
where
    F: Fn() -> StaticWorld + Sync,
{
    let hashes: Vec<u64> = thread::scope(|s| {
        let handles: Vec<_> = (0..num_runs)
            .map(|_| {
                s.spawn(|| {
                    let mut replay = Replay::new(setup_fn(), config.clone(), Fixed::ONE);
                    for _ in 0..num_ticks {
                        replay.step();
                    }
                    replay.order_hash
                })
            })
            .collect();

        handles
            .into_iter()
            .map(|h| h.join().unwrap_or_else(|e| std::panic::resume_unwind(e)))
            .collect()
    });

    let is_deterministic = hashes.windows(2).all(|w| w[0] == w[1]);
    DeterminismResult {
        is_deterministic,
        hashes,
        ticks: num_ticks,
    }
}

/// Compare two replays tick-by-tick, finding the first divergence.
///
/// # Returns
///
/// `None` if the replays match, `Some(tick)` for the first tick whose
/// orders differ.
pub fn find_first_divergence<F>(setup_fn: F, config: &ControllerConfig, num_ticks: u64) -> Option<u64>
where
    F: Fn() -> StaticWorld,
{
    let mut a = Replay::new(setup_fn(), config.clone(), Fixed::ONE);
    let mut b = Replay::new(setup_fn(), config.clone(), Fixed::ONE);

    (0..num_ticks).find(|_| a.step().orders != b.step().orders)
}

/// Compute a simple hash for any hashable value.
pub fn compute_hash<T: Hash>(value: &T) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}

/// Proptest strategies for controller inputs.
pub mod strategies {
    use proptest::prelude::*;
    use tactics_core::math::{Fixed, Vec2Fixed};
    use tactics_core::unit_kind::UnitKind;

    /// Whole-unit coordinate inside the standard 200x200 map.
    pub fn arb_coordinate() -> impl Strategy<Value = i32> {
        2i32..198i32
    }

    /// Position inside the standard map.
    pub fn arb_position() -> impl Strategy<Value = Vec2Fixed> {
        (arb_coordinate(), arb_coordinate()).prop_map(|(x, y)| Vec2Fixed::from_ints(x, y))
    }

    /// Match time in whole seconds, up to twenty minutes.
    pub fn arb_match_secs() -> impl Strategy<Value = u32> {
        0u32..1200u32
    }

    /// Match time as a fixed-point value with sub-second precision.
    pub fn arb_match_time() -> impl Strategy<Value = Fixed> {
        (0i64..1_200_000i64).prop_map(|ms| Fixed::from_num(ms) / Fixed::from_num(1000))
    }

    /// Health percentage (1-100).
    pub fn arb_health_pct() -> impl Strategy<Value = u32> {
        1u32..=100u32
    }

    /// Enemy combat unit kind.
    pub fn arb_enemy_combat_kind() -> impl Strategy<Value = UnitKind> {
        prop_oneof![
            Just(UnitKind::Zergling),
            Just(UnitKind::Roach),
            Just(UnitKind::Hydralisk),
            Just(UnitKind::Zealot),
            Just(UnitKind::Stalker),
            Just(UnitKind::Adept),
        ]
    }

    /// Friendly production structure kind.
    pub fn arb_production_kind() -> impl Strategy<Value = UnitKind> {
        prop_oneof![
            Just(UnitKind::Barracks),
            Just(UnitKind::Factory),
            Just(UnitKind::Starport),
            Just(UnitKind::EngineeringBay),
        ]
    }

    /// Controller seed.
    pub fn arb_seed() -> impl Strategy<Value = u64> {
        any::<u64>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;

    #[test]
    fn test_verify_determinism_simple() {
        let result = verify_determinism(3, 100, || 0u64, |n| *n += 1, |n| *n);

        assert!(result.is_deterministic);
        assert_eq!(result.hashes, vec![100, 100, 100]);
    }

    #[test]
    fn test_opening_replay_is_deterministic() {
        let config = ControllerConfig::default();
        assert!(verify_controller_determinism(fixtures::opening_world, &config, 30));
    }

    #[test]
    fn test_mid_game_has_no_divergence() {
        let config = ControllerConfig::default();
        assert_eq!(find_first_divergence(fixtures::mid_game_world, &config, 20), None);
    }

    #[test]
    fn test_parallel_replays_match() {
        let config = ControllerConfig::default();
        run_parallel_replays(fixtures::early_rush_world, &config, 4, 15).assert_deterministic();
    }

    #[test]
    fn test_replay_advances_clock() {
        let mut replay = Replay::new(fixtures::opening_world(), ControllerConfig::default(), Fixed::ONE);
        replay.step();
        replay.step();
        assert_eq!(replay.world.time, Fixed::from_num(2));
        assert_eq!(replay.controller.tick(), 2);
    }
}
