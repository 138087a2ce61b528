//! Structure and addon siting.
//!
//! [`find_site`] scans rings around an anchor in a seeded random order and
//! returns the first spot that is buildable, keeps clear of existing
//! structures, leaves room for an addon when asked and does not wall off
//! the surrounding ground. [`find_placement`] adds the engine fallback.
//! Addon hosts without room are lifted and re-landed through
//! [`landing_site`].

use rand::seq::SliceRandom;
use rand::Rng;
use tracing::{debug, warn};

use crate::config::PlacementConfig;
use crate::math::{fx, ring_directions, Fixed, Vec2Fixed};
use crate::snapshot::WorldSnapshot;
use crate::unit_kind::UnitKind;

/// Number of probe points checked around a candidate.
pub const PROBE_POINTS: u32 = 8;

/// What to place and how strict to be.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SiteRequest {
    /// Structure to place.
    pub kind: UnitKind,
    /// Search center.
    pub anchor: Vec2Fixed,
    /// Candidates must be strictly farther than this from every grounded
    /// own structure.
    pub min_clearance: Fixed,
    /// Rings stop before this radius.
    pub max_radius: i32,
    /// Reserve the addon footprint beside the structure.
    pub reserve_addon: bool,
}

impl SiteRequest {
    /// Request a site with the given clearance and search radius.
    #[must_use]
    pub fn new(kind: UnitKind, anchor: Vec2Fixed, min_clearance: i32, max_radius: i32) -> Self {
        Self {
            kind,
            anchor,
            min_clearance: fx(min_clearance),
            max_radius,
            reserve_addon: false,
        }
    }

    /// Also reserve addon space.
    #[must_use]
    pub fn with_addon(mut self) -> Self {
        self.reserve_addon = true;
        self
    }
}

/// Ring candidates around `anchor`: radii from the configured minimum up to
/// (not including) `max_radius`, one point per angular step.
#[must_use]
pub fn ring_candidates(anchor: Vec2Fixed, max_radius: i32, config: &PlacementConfig) -> Vec<Vec2Fixed> {
    let directions = ring_directions(config.ring_step_degrees);
    let step = config.radial_step.max(1) as usize;
    (config.min_ring_radius..max_radius)
        .step_by(step)
        .flat_map(|radius| {
            let r = fx(radius);
            directions.iter().map(move |d| anchor + *d * r)
        })
        .collect()
}

/// Center of the addon footprint for a host at `host`.
#[must_use]
pub fn addon_anchor(host: Vec2Fixed) -> Vec2Fixed {
    host.offset(Fixed::from_num(2.5), Fixed::from_num(-0.5))
}

/// The four cells an addon occupies beside a host at `host`.
#[must_use]
pub fn addon_points(host: Vec2Fixed) -> [Vec2Fixed; 4] {
    let center = addon_anchor(host);
    let half = Fixed::from_num(0.5);
    let at = |dx: i32, dy: i32| center.offset(fx(dx) - half, fx(dy) - half).rounded();
    [at(0, 0), at(0, 1), at(1, 0), at(1, 1)]
}

/// Ground probe points at `offset` around a candidate, center excluded.
fn probe_points(p: Vec2Fixed, offset: i32) -> impl Iterator<Item = Vec2Fixed> {
    [-offset, 0, offset]
        .into_iter()
        .flat_map(move |dx| [-offset, 0, offset].into_iter().map(move |dy| (dx, dy)))
        .filter(|&(dx, dy)| dx != 0 || dy != 0)
        .map(move |(dx, dy)| p.offset(fx(dx), fx(dy)))
}

/// Check one candidate against the four placement rules, in order.
pub fn site_qualifies(
    world: &impl WorldSnapshot,
    request: &SiteRequest,
    p: Vec2Fixed,
    config: &PlacementConfig,
) -> bool {
    if !world.can_place(request.kind, p) {
        return false;
    }
    let clear = world
        .own_structures()
        .iter()
        .filter(|s| !s.is_flying)
        .all(|s| s.position.distance_squared(p) > request.min_clearance * request.min_clearance);
    if !clear {
        return false;
    }
    // A 2x2 depot footprint stands in for the addon.
    if request.reserve_addon && !world.can_place(UnitKind::SupplyDepot, addon_anchor(p)) {
        return false;
    }
    let pathable = probe_points(p, config.probe_offset)
        .filter(|&q| world.in_pathing_grid(q))
        .count() as u32;
    pathable >= config.min_pathable_probes
}

/// Strict ring search. `None` when no ring position qualifies.
pub fn find_site<R: Rng + ?Sized>(
    world: &impl WorldSnapshot,
    request: &SiteRequest,
    config: &PlacementConfig,
    rng: &mut R,
) -> Option<Vec2Fixed> {
    let mut candidates = ring_candidates(request.anchor, request.max_radius, config);
    candidates.shuffle(rng);
    candidates
        .into_iter()
        .find(|&p| site_qualifies(world, request, p, config))
}

/// Ring search, then the engine's generic placement near the anchor.
pub fn find_placement<R: Rng + ?Sized>(
    world: &impl WorldSnapshot,
    request: &SiteRequest,
    config: &PlacementConfig,
    rng: &mut R,
) -> Option<Vec2Fixed> {
    if let Some(site) = find_site(world, request, config, rng) {
        debug!(kind = ?request.kind, x = %site.x, y = %site.y, "placement found");
        return Some(site);
    }
    let fallback = world.fallback_placement(request.kind, request.anchor);
    match fallback {
        Some(site) => debug!(kind = ?request.kind, x = %site.x, y = %site.y, "placement fallback"),
        None => warn!(kind = ?request.kind, "no placement available"),
    }
    fallback
}

fn spot_clear(world: &impl WorldSnapshot, p: Vec2Fixed) -> bool {
    world.in_bounds(p) && world.in_placement_grid(p) && world.in_pathing_grid(p)
}

/// Whether a grounded host at `host` has room for its addon.
pub fn addon_clearance(world: &impl WorldSnapshot, host: Vec2Fixed) -> bool {
    addon_points(host).into_iter().all(|p| spot_clear(world, p))
}

/// Nearest landing spot for an airborne host where both the 3x3 footprint
/// and the addon cells are clear.
pub fn landing_site(
    world: &impl WorldSnapshot,
    from: Vec2Fixed,
    config: &PlacementConfig,
) -> Option<Vec2Fixed> {
    let scan = config.landing_scan;
    let mut offsets: Vec<(i32, i32)> = (-scan..scan)
        .flat_map(|x| (-scan..scan).map(move |y| (x, y)))
        .collect();
    offsets.sort_by_key(|&(x, y)| x * x + y * y);

    let half = Fixed::from_num(0.5);
    let base = from.rounded().offset(-half, -half);
    offsets
        .into_iter()
        .map(|(x, y)| base.offset(fx(x), fx(y)))
        .find(|&target| {
            let footprint = (-1..=1)
                .flat_map(|x| (-1..=1).map(move |y| (x, y)))
                .map(|(x, y)| target.offset(fx(x), fx(y)).rounded());
            footprint
                .chain(addon_points(target))
                .all(|p| spot_clear(world, p))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::MapInfo;
    use crate::terrain::{TerrainCell, TerrainGrid};
    use crate::world::StaticWorld;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn open_world() -> StaticWorld {
        let map = MapInfo {
            start: Vec2Fixed::from_ints(60, 60),
            enemy_start: Vec2Fixed::from_ints(180, 180),
            map_center: Vec2Fixed::from_ints(100, 100),
            ramp_top_center: Vec2Fixed::from_ints(70, 70),
            expansion_locations: Vec::new(),
        };
        StaticWorld::new(map, TerrainGrid::new(200, 200))
    }

    #[test]
    fn test_ring_candidate_count() {
        let config = PlacementConfig::default();
        // radii 7, 9, ..., 23 -> 9 rings of 18 points
        let rings = ring_candidates(Vec2Fixed::from_ints(60, 60), 25, &config);
        assert_eq!(rings.len(), 9 * 18);
    }

    #[test]
    fn test_found_site_keeps_clearance() {
        let config = PlacementConfig::default();
        let mut world = open_world();
        let anchor = Vec2Fixed::from_ints(60, 60);
        world.spawn_own(UnitKind::CommandCenter, anchor);
        world.spawn_own(UnitKind::Barracks, Vec2Fixed::new(Fixed::from_num(70.5), Fixed::from_num(60.5)));

        let request = SiteRequest::new(UnitKind::Barracks, anchor, 6, 25).with_addon();
        let mut rng = StdRng::seed_from_u64(3);
        let site = find_site(&world, &request, &config, &mut rng).expect("open map has room");
        for s in world.own_structures() {
            assert!(s.position.distance(site) > fx(6));
        }
        assert!(world.can_place(UnitKind::Barracks, site));
        assert!(world.can_place(UnitKind::SupplyDepot, addon_anchor(site)));
    }

    #[test]
    fn test_no_site_when_unbuildable() {
        let config = PlacementConfig::default();
        let mut world = open_world();
        world.terrain.fill_rect(0, 0, 199, 199, TerrainCell::PathOnly);
        let request = SiteRequest::new(UnitKind::Barracks, Vec2Fixed::from_ints(60, 60), 6, 25);
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(find_site(&world, &request, &config, &mut rng), None);
    }

    #[test]
    fn test_island_fails_pathability() {
        let config = PlacementConfig::default();
        let mut world = open_world();
        world.terrain.fill_rect(0, 0, 199, 199, TerrainCell::Blocked);
        world.terrain.fill_rect(49, 49, 51, 51, TerrainCell::Open);

        let p = Vec2Fixed::new(Fixed::from_num(50.5), Fixed::from_num(50.5));
        let request = SiteRequest::new(UnitKind::EngineeringBay, Vec2Fixed::from_ints(60, 60), 5, 20);
        assert!(world.can_place(UnitKind::EngineeringBay, p));
        assert!(!site_qualifies(&world, &request, p, &config));

        // The strict search rejects the island; the looser engine search takes it
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(find_site(&world, &request, &config, &mut rng), None);
        assert_eq!(find_placement(&world, &request, &config, &mut rng), Some(p));
    }

    #[test]
    fn test_addon_points_layout() {
        let host = Vec2Fixed::new(Fixed::from_num(10.5), Fixed::from_num(10.5));
        let points = addon_points(host);
        // Addon center (13, 10): cells rounded around it
        for p in points {
            assert!(p.x >= fx(12) && p.x <= fx(14), "{p:?}");
            assert!(p.y >= fx(9) && p.y <= fx(11), "{p:?}");
        }
    }

    #[test]
    fn test_addon_clearance_and_landing() {
        let config = PlacementConfig::default();
        let mut world = open_world();
        let host = Vec2Fixed::new(Fixed::from_num(50.5), Fixed::from_num(50.5));
        assert!(addon_clearance(&world, host));

        // Wall off the addon side
        world.terrain.fill_rect(52, 46, 56, 54, TerrainCell::Blocked);
        assert!(!addon_clearance(&world, host));

        let spot = landing_site(&world, host, &config).expect("room to the west");
        assert!(addon_clearance(&world, spot));
        assert!(spot.distance(host) <= fx(15));
    }
}
