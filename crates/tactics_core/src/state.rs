//! Tick-persistent controller memory.
//!
//! Every registry the controller keeps between ticks lives in
//! [`EngineState`]: created at match start, mutated once per tick by the
//! controller alone, dropped at match end. Registries hold only
//! [`EntityId`]s and are reconciled against the live snapshot before use.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::math::{Fixed, Vec2Fixed};
use crate::snapshot::{EntityId, WorldSnapshot};

/// Logical combat stance assigned to a unit this tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Stance {
    /// Holding at the rally point.
    Rallying,
    /// Moving on the enemy with nothing in range.
    Advancing,
    /// Fighting an enemy in range.
    Engaging,
    /// Falling back toward home.
    Retreating,
    /// Assigned to reconnaissance.
    Scouting,
    /// Pulled worker or unit defending a base.
    Defending,
}

/// Units currently falling back, keyed to the match time they started.
#[derive(Debug, Clone, Default)]
pub struct RetreatRegistry {
    started: BTreeMap<EntityId, Fixed>,
}

impl RetreatRegistry {
    /// Record a retreat starting at `now`.
    pub fn begin(&mut self, id: EntityId, now: Fixed) {
        self.started.insert(id, now);
    }

    /// Whether `id` is mid-retreat.
    #[must_use]
    pub fn contains(&self, id: EntityId) -> bool {
        self.started.contains_key(&id)
    }

    /// Start time of a retreat.
    #[must_use]
    pub fn started_at(&self, id: EntityId) -> Option<Fixed> {
        self.started.get(&id).copied()
    }

    /// Drop retreats that ran for `duration` or longer.
    pub fn expire(&mut self, now: Fixed, duration: Fixed) {
        self.started.retain(|_, start| now - *start < duration);
    }

    /// Drop entries for entities that no longer exist.
    pub fn retain_alive(&mut self, alive: &BTreeSet<EntityId>) {
        self.started.retain(|id, _| alive.contains(id));
    }

    /// All `(id, start)` entries.
    pub fn iter(&self) -> impl Iterator<Item = (EntityId, Fixed)> + '_ {
        self.started.iter().map(|(id, t)| (*id, *t))
    }

    /// Number of retreating units.
    #[must_use]
    pub fn len(&self) -> usize {
        self.started.len()
    }

    /// No unit is retreating.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.started.is_empty()
    }
}

/// Last visit time per scouted location.
#[derive(Debug, Clone, Default)]
pub struct ScoutedLocations {
    visits: HashMap<Vec2Fixed, Fixed>,
}

impl ScoutedLocations {
    /// Mark `location` visited at `now`.
    pub fn visit(&mut self, location: Vec2Fixed, now: Fixed) {
        self.visits.insert(location, now);
    }

    /// Last visit time.
    #[must_use]
    pub fn last_visit(&self, location: Vec2Fixed) -> Option<Fixed> {
        self.visits.get(&location).copied()
    }

    /// Whether `location` may be targeted again: never visited, or visited
    /// at least `cooldown` ago.
    #[must_use]
    pub fn is_eligible(&self, location: Vec2Fixed, now: Fixed, cooldown: Fixed) -> bool {
        self.last_visit(location)
            .map_or(true, |last| now - last >= cooldown)
    }
}

/// All state carried between ticks.
#[derive(Debug, Clone)]
pub struct EngineState {
    /// Ticks stepped so far.
    pub tick: u64,
    /// Units mid-retreat.
    pub retreats: RetreatRegistry,
    /// Every unit that has ever retreated. Never pruned.
    pub retreated: BTreeSet<EntityId>,
    /// Workers pulled to defend.
    pub defenders: BTreeSet<EntityId>,
    /// Units assigned to reconnaissance.
    pub scouts: BTreeSet<EntityId>,
    /// Last visit times of scout targets.
    pub scouted: ScoutedLocations,
    /// Stance given to each unit this tick.
    pub stances: BTreeMap<EntityId, Stance>,
    /// Seeded source for placement shuffles and escort picks.
    pub rng: StdRng,
}

impl EngineState {
    /// Fresh state for a new match.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            tick: 0,
            retreats: RetreatRegistry::default(),
            retreated: BTreeSet::new(),
            defenders: BTreeSet::new(),
            scouts: BTreeSet::new(),
            scouted: ScoutedLocations::default(),
            stances: BTreeMap::new(),
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Drop registry entries whose entity is gone and clear last tick's
    /// stances. The historical retreat set is left untouched.
    pub fn reconcile(&mut self, world: &impl WorldSnapshot) {
        let alive: BTreeSet<EntityId> = world
            .own_units()
            .iter()
            .chain(world.own_structures())
            .map(|e| e.id)
            .collect();
        self.retreats.retain_alive(&alive);
        self.defenders.retain(|id| alive.contains(id));
        self.scouts.retain(|id| alive.contains(id));
        self.stances.clear();
    }

    /// Record a unit's stance for this tick.
    pub fn set_stance(&mut self, id: EntityId, stance: Stance) {
        self.stances.insert(id, stance);
    }

    /// Stance given this tick.
    #[must_use]
    pub fn stance(&self, id: EntityId) -> Option<Stance> {
        self.stances.get(&id).copied()
    }
}

impl Default for EngineState {
    fn default() -> Self {
        Self::new(0)
    }
}
