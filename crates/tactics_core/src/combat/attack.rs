//! Open-field attack: infantry engage/kite/retreat, siege positioning and
//! caster turret drops.

use tracing::debug;

use crate::combat::{is_retreating, Army};
use crate::config::ControllerConfig;
use crate::math::{fx, Fixed, Vec2Fixed};
use crate::orders::{Ability, CommandBuffer, Order, Target};
use crate::snapshot::{center, closer_than, closest_to, Entity, EntityId, WorldSnapshot};
use crate::state::{EngineState, Stance};
use crate::threat::LocalThreats;

/// Enemy entities the attack routine works with.
#[derive(Debug, Clone, Default)]
pub struct EnemyField<'a> {
    /// Enemy units worth shooting at.
    pub units: Vec<&'a Entity>,
    /// Enemy structures that shoot back.
    pub offensive_structures: Vec<&'a Entity>,
    /// Remaining enemy structures.
    pub other_structures: Vec<&'a Entity>,
}

impl<'a> EnemyField<'a> {
    /// Drop passive units and illusions; split structures by whether they
    /// shoot back.
    pub fn observe(world: &'a impl WorldSnapshot) -> Self {
        let units = world
            .enemy_units()
            .iter()
            .filter(|u| !u.kind.is_ignored_target())
            .collect();
        let (offensive_structures, other_structures) = world
            .enemy_structures()
            .iter()
            .partition(|s| s.is_offensive_structure());
        Self {
            units,
            offensive_structures,
            other_structures,
        }
    }

    /// Nearest unit or offensive structure, at any range.
    #[must_use]
    pub fn nearest_threat(&self, from: Vec2Fixed) -> Option<&'a Entity> {
        closest_to(
            self.units
                .iter()
                .chain(&self.offensive_structures)
                .copied(),
            from,
        )
    }
}

/// What one infantry unit should do this tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InfantryAction {
    /// Inside an open retreat window; leave it alone.
    Skip,
    /// Start retreating toward the given point.
    Retreat(Vec2Fixed),
    /// Step away from the nearest threat while the weapon cools down.
    Kite(Vec2Fixed),
    /// Attack a specific entity.
    Engage(EntityId),
    /// Advance on a structure or position.
    Advance(Target),
}

/// Pure per-unit decision for the attack routine.
pub fn infantry_action(
    world: &impl WorldSnapshot,
    state: &EngineState,
    config: &ControllerConfig,
    field: &EnemyField<'_>,
    unit: &Entity,
) -> InfantryAction {
    let combat = &config.combat;
    if is_retreating(state, unit.id) {
        return InfantryAction::Skip;
    }

    let threats = LocalThreats::around(world, unit.position, fx(combat.engage_radius));
    if let Some(target) = threats.priority_target(unit.position) {
        if unit.health < combat.retreat_health() && !state.retreated.contains(&unit.id) {
            let home = world.map().start;
            return InfantryAction::Retreat(unit.position.towards(home, fx(combat.retreat_distance)));
        }
        if unit.is_ranged() && unit.weapon_cooldown > Fixed::ZERO {
            let nearest = threats
                .combat
                .iter()
                .chain(&threats.offensive_structures)
                .chain(&threats.workers)
                .chain(&threats.other_structures)
                .copied();
            let from = closest_to(nearest, unit.position).map_or(target.position, |e| e.position);
            return InfantryAction::Kite(unit.position.towards(from, -fx(combat.kite_distance)));
        }
        return InfantryAction::Engage(target.id);
    }

    match closest_to(field.other_structures.iter().copied(), unit.position) {
        Some(structure) => InfantryAction::Advance(Target::Unit(structure.id)),
        None => InfantryAction::Advance(Target::Position(world.map().enemy_start)),
    }
}

/// Siege deployment toggle for a target at `distance`.
pub fn siege_toggle(
    sieged: bool,
    distance: Fixed,
    enter: Fixed,
    exit: Fixed,
) -> Option<Ability> {
    match sieged {
        false if distance < enter => Some(Ability::SiegeMode),
        true if distance > exit => Some(Ability::Unsiege),
        _ => None,
    }
}

fn command_siege(
    world: &impl WorldSnapshot,
    config: &ControllerConfig,
    field: &EnemyField<'_>,
    tank: &Entity,
    buffer: &mut CommandBuffer,
) {
    let target = field
        .nearest_threat(tank.position)
        .or_else(|| closest_to(field.other_structures.iter().copied(), tank.position))
        .map_or(world.map().enemy_start, |e| e.position);
    let distance = tank.distance_to(target);
    let (enter, exit) = config.combat.siege_thresholds(world.time());
    let sieged = tank.kind.is_sieged();
    if let Some(ability) = siege_toggle(sieged, distance, enter, exit) {
        buffer.ability(tank.id, ability, None);
    } else if !sieged {
        let standoff = target.towards(tank.position, fx(config.combat.siege_standoff));
        buffer.push(Order::Move {
            unit: tank.id,
            to: standoff,
        });
    }
}

/// Drop point for a caster's turret, if it has energy and targets in range.
pub fn turret_drop(
    world: &impl WorldSnapshot,
    config: &ControllerConfig,
    field: &EnemyField<'_>,
    caster: &Entity,
) -> Option<Vec2Fixed> {
    let c = &config.combat;
    if caster.energy < c.caster_energy {
        return None;
    }
    let nearby = closer_than(field.units.iter().copied(), caster.position, fx(c.caster_range));
    let spot = if nearby.len() as u32 >= c.caster_cluster {
        center(nearby.iter().copied())?
    } else {
        closest_to(nearby.iter().copied(), caster.position)?.position
    };
    world.in_pathing_grid(spot).then_some(spot)
}

/// Run the attack routine for every fighter.
pub fn execute_attack<W: WorldSnapshot>(
    world: &W,
    state: &mut EngineState,
    config: &ControllerConfig,
    army: &Army<'_>,
    buffer: &mut CommandBuffer,
) {
    let field = EnemyField::observe(world);
    let now = world.time();

    for unit in &army.infantry {
        match infantry_action(world, state, config, &field, unit) {
            InfantryAction::Skip => state.set_stance(unit.id, Stance::Retreating),
            InfantryAction::Retreat(to) => {
                state.retreats.begin(unit.id, now);
                state.retreated.insert(unit.id);
                state.set_stance(unit.id, Stance::Retreating);
                debug!(unit = %unit.id, health = %unit.health, "retreating");
                buffer.push(Order::Move { unit: unit.id, to });
            }
            InfantryAction::Kite(to) => {
                state.set_stance(unit.id, Stance::Engaging);
                buffer.push(Order::Move { unit: unit.id, to });
            }
            InfantryAction::Engage(target) => {
                state.set_stance(unit.id, Stance::Engaging);
                buffer.push(Order::Attack {
                    unit: unit.id,
                    target: Target::Unit(target),
                });
            }
            InfantryAction::Advance(target) => {
                state.set_stance(unit.id, Stance::Advancing);
                buffer.push(Order::Attack {
                    unit: unit.id,
                    target,
                });
            }
        }
    }

    for tank in &army.siege {
        state.set_stance(tank.id, Stance::Advancing);
        command_siege(world, config, &field, tank, buffer);
    }

    for caster in &army.casters {
        if let Some(spot) = turret_drop(world, config, &field, caster) {
            debug!(unit = %caster.id, x = %spot.x, y = %spot.y, "dropping turret");
            buffer.ability(caster.id, Ability::AutoTurret, Some(Target::Position(spot)));
        }
    }
}
