//! Property tests for the controller's timing and siting invariants.

use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;

use tactics_core::combat::attack::{infantry_action, EnemyField, InfantryAction};
use tactics_core::config::{ControllerConfig, ThreatConfig};
use tactics_core::math::{fx, Fixed};
use tactics_core::placement::{find_site, SiteRequest};
use tactics_core::prelude::*;
use tactics_core::state::RetreatRegistry;
use tactics_core::threat::detect_cheese;
use tactics_test_utils::determinism::strategies::*;
use tactics_test_utils::fixtures::{self, pos};

proptest! {
    #[test]
    fn retreat_never_outlives_its_window(
        start in arb_match_time(),
        elapsed_ms in 10_000i64..600_000i64,
    ) {
        let config = ControllerConfig::default();
        let mut registry = RetreatRegistry::default();
        let id = EntityId(1);
        registry.begin(id, start);

        let now = start + Fixed::from_num(elapsed_ms) / Fixed::from_num(1000);
        registry.expire(now, config.combat.retreat_duration());
        prop_assert!(!registry.contains(id));
    }

    #[test]
    fn retreat_holds_inside_its_window(
        start in arb_match_time(),
        elapsed_ms in 0i64..10_000i64,
    ) {
        let config = ControllerConfig::default();
        let mut registry = RetreatRegistry::default();
        let id = EntityId(1);
        registry.begin(id, start);

        let now = start + Fixed::from_num(elapsed_ms) / Fixed::from_num(1000);
        registry.expire(now, config.combat.retreat_duration());
        prop_assert!(registry.contains(id));
    }

    #[test]
    fn veterans_never_retreat_again(
        health in arb_health_pct(),
        kind in arb_enemy_combat_kind(),
    ) {
        let mut world = fixtures::empty_world().at_time(400);
        let id = world.next_entity_id();
        world.push_own(Entity::new(id, UnitKind::Marine, pos(100, 100)).with_health_pct(health));
        world.spawn_enemy(kind, pos(103, 100));
        let mut state = EngineState::new(0);
        state.retreated.insert(EntityId(id));

        let config = ControllerConfig::default();
        let field = EnemyField::observe(&world);
        let unit = &world.own_units[0];
        let action = infantry_action(&world, &state, &config, &field, unit);
        prop_assert!(!matches!(action, InfantryAction::Retreat(_)));
    }

    #[test]
    fn no_cheese_after_the_window(
        secs in 180u32..1200u32,
        at in arb_position(),
        kind in arb_enemy_combat_kind(),
    ) {
        let config = ThreatConfig::default();
        let mut world = fixtures::empty_world().at_time(secs);
        world.spawn_own(UnitKind::CommandCenter, fixtures::home());
        world.spawn_enemy(kind, at);
        world.spawn_enemy(UnitKind::Pylon, fixtures::home().offset(fx(5), fx(5)));
        prop_assert!(!detect_cheese(&world, &config, world.time()));
    }

    #[test]
    fn intruder_is_cheese_only_inside_the_window(
        secs in arb_match_secs(),
        kind in arb_enemy_combat_kind(),
    ) {
        let config = ThreatConfig::default();
        let mut world = fixtures::empty_world().at_time(secs);
        world.spawn_own(UnitKind::CommandCenter, fixtures::home());
        world.spawn_enemy(kind, fixtures::home().offset(fx(10), fx(0)));
        prop_assert_eq!(
            detect_cheese(&world, &config, world.time()),
            secs < config.cheese_window_secs
        );
    }

    #[test]
    fn placement_keeps_clearance(
        structures in proptest::collection::vec((30i32..70i32, 30i32..70i32), 0..12),
        seed in arb_seed(),
        kind in arb_production_kind(),
    ) {
        let config = ControllerConfig::default();
        let mut world = fixtures::empty_world();
        for (x, y) in &structures {
            world.spawn_own(UnitKind::SupplyDepot, pos(*x, *y));
        }
        let clearance = config.placement.production_clearance;
        let request = SiteRequest::new(kind, pos(50, 50), clearance, config.placement.production_radius);
        let mut rng = StdRng::seed_from_u64(seed);

        if let Some(site) = find_site(&world, &request, &config.placement, &mut rng) {
            let min = fx(clearance);
            for s in world.own_structures().iter().filter(|s| !s.is_flying) {
                prop_assert!(s.position.distance_squared(site) > min * min);
            }
        }
    }

    #[test]
    fn blocked_ground_yields_no_site(seed in arb_seed(), kind in arb_production_kind()) {
        let config = ControllerConfig::default();
        let mut world = fixtures::empty_world();
        world.terrain.fill_rect(0, 0, 199, 199, TerrainCell::Blocked);
        let request = SiteRequest::new(kind, pos(100, 100), 6, 15);
        let mut rng = StdRng::seed_from_u64(seed);
        prop_assert_eq!(find_site(&world, &request, &config.placement, &mut rng), None);
    }
}
