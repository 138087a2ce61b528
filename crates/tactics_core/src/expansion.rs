//! New-base decisions: when to expand and where.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::{ControllerConfig, ExpansionConfig};
use crate::economy::pick_builder;
use crate::math::{fx, percent, Fixed, Vec2Fixed};
use crate::orders::CommandBuffer;
use crate::snapshot::{closer_than, minerals_near, EntityId, WorldSnapshot};
use crate::state::EngineState;
use crate::unit_kind::UnitKind;

/// A townhall within this distance of a site means the site is taken.
const SITE_TAKEN_RADIUS: i32 = 6;

/// Result of one expansion attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExpansionOutcome {
    /// Base count, pending expansions or saturation say no.
    NotWarranted,
    /// A new base is warranted but the bank does not cover it.
    Unaffordable,
    /// No candidate site and no engine default.
    NoSite,
    /// Every worker is busy, claimed or reserved.
    NoBuilder,
    /// Construction ordered.
    Ordered {
        /// Worker sent to build.
        builder: EntityId,
        /// Chosen site.
        site: Vec2Fixed,
    },
}

/// Townhalls ordered this tick or still under construction.
fn pending_expansions(world: &impl WorldSnapshot, buffer: &CommandBuffer) -> u32 {
    world.pending(UnitKind::CommandCenter) + buffer.queued(UnitKind::CommandCenter)
}

/// Whether a new base is warranted.
///
/// Every ready base that still has a viable mineral line must be saturated.
/// Mined-out bases do not hold expansion back.
pub fn should_expand(world: &impl WorldSnapshot, config: &ExpansionConfig, buffer: &CommandBuffer) -> bool {
    if world.townhalls().len() as u32 > config.max_bases
        || pending_expansions(world, buffer) >= config.max_pending
    {
        return false;
    }
    let radius = fx(config.saturation_radius);
    let workers = world.workers();
    world
        .ready_townhalls()
        .into_iter()
        .filter(|base| minerals_near(world.mineral_fields(), base.position, radius) >= config.viable_minerals)
        .all(|base| {
            let nearby = closer_than(workers.iter().copied(), base.position, radius).len() as u32;
            nearby >= config.saturation_workers
        })
}

/// Desirability of a site: rich, near home and far from the enemy.
#[must_use]
pub fn score_site(world: &impl WorldSnapshot, site: Vec2Fixed, config: &ExpansionConfig) -> Fixed {
    let map = world.map();
    let minerals = minerals_near(world.mineral_fields(), site, fx(config.saturation_radius));
    Fixed::from_num(minerals) * percent(config.mineral_weight_pct)
        - site.distance(map.start) * fx(config.home_distance_weight)
        + site.distance(map.enemy_start) * fx(config.enemy_distance_weight)
}

/// Best free expansion site, falling back to the engine's default.
pub fn choose_expansion(world: &impl WorldSnapshot, config: &ExpansionConfig) -> Option<Vec2Fixed> {
    let map = world.map();
    let taken_radius = fx(SITE_TAKEN_RADIUS);
    let taken = |site: Vec2Fixed| {
        world
            .own_structures()
            .iter()
            .any(|s| s.kind.is_townhall() && s.position.within(site, taken_radius))
    };
    let exclusion = fx(config.enemy_exclusion_radius);

    let best = map
        .expansion_locations
        .iter()
        .copied()
        .filter(|&site| !taken(site) && site.distance(map.enemy_start) > exclusion)
        .map(|site| (score_site(world, site, config), site))
        .max_by(|(a, pa), (b, pb)| a.cmp(b).then_with(|| (pb.x, pb.y).cmp(&(pa.x, pa.y))));

    match best {
        Some((score, site)) => {
            debug!(x = %site.x, y = %site.y, %score, "expansion site scored best");
            Some(site)
        }
        None => {
            debug!("no scored expansion site, using engine default");
            world.default_expansion()
        }
    }
}

/// Order a new base if one is warranted.
pub fn expand<W: WorldSnapshot>(
    world: &W,
    state: &EngineState,
    config: &ControllerConfig,
    buffer: &mut CommandBuffer,
) -> ExpansionOutcome {
    if !should_expand(world, &config.expansion, buffer) {
        return ExpansionOutcome::NotWarranted;
    }
    let cost = world.unit_cost(UnitKind::CommandCenter);
    if !buffer.can_afford(cost) {
        return ExpansionOutcome::Unaffordable;
    }
    let Some(site) = choose_expansion(world, &config.expansion) else {
        return ExpansionOutcome::NoSite;
    };
    let Some(builder) = pick_builder(world, state, buffer, site) else {
        return ExpansionOutcome::NoBuilder;
    };
    if !buffer.build(builder.id, UnitKind::CommandCenter, site, cost) {
        return ExpansionOutcome::NoBuilder;
    }
    info!(builder = %builder.id, x = %site.x, y = %site.y, "expanding");
    ExpansionOutcome::Ordered {
        builder: builder.id,
        site,
    }
}
