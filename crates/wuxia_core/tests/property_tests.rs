//! Property-based tests for cooldowns, team assignment and area shapes.

use std::collections::HashSet;

use proptest::prelude::*;

use wuxia_core::combat::{can_act, cooldown_ticks, CombatStarter, CombatState, TeamSlot};
use wuxia_core::entity::Entity;
use wuxia_core::error::CombatError;
use wuxia_core::math::Vector;

use wuxia_test_utils::determinism::strategies::{
    arb_enemy, arb_min_frequency, arb_position, arb_power_factor, arb_roster, arb_team_rules,
};
use wuxia_test_utils::fixtures::location;

proptest! {
    #[test]
    fn test_cooldown_never_grows_with_power(
        weaker in 0.001f64..2.0,
        boost in 0.0f64..2.0,
        min_frequency in arb_min_frequency(),
    ) {
        let stronger = weaker + boost;
        prop_assert!(
            cooldown_ticks(stronger, min_frequency) <= cooldown_ticks(weaker, min_frequency)
        );
        prop_assert!(cooldown_ticks(weaker, min_frequency) >= 1);
    }

    #[test]
    fn test_waiting_longer_never_revokes_a_turn(
        last in 0u64..1_000,
        elapsed in 0u64..100,
        power_factor in arb_power_factor(),
        min_frequency in arb_min_frequency(),
    ) {
        if can_act(last + elapsed, last, power_factor, min_frequency) {
            prop_assert!(can_act(last + elapsed + 1, last, power_factor, min_frequency));
        }
    }

    #[test]
    fn test_weakest_combatant_still_acts(
        last in 0u64..1_000,
        min_frequency in arb_min_frequency(),
    ) {
        let wait = (1.0 / min_frequency).ceil() as u64;
        prop_assert!(can_act(last + wait, last, 0.0, min_frequency));
    }

    #[test]
    fn test_team_assignment_invariant(roster in arb_roster(8), rules in arb_team_rules()) {
        let entity_count = roster.len();
        let starter = CombatStarter::new(location(&[], roster));
        match starter.group_by_tags(&rules) {
            Ok(context) => {
                let teams = context.teams();
                prop_assert!(teams.len() <= TeamSlot::COUNT);
                let player_teams = teams
                    .iter()
                    .filter(|team| team.slot == TeamSlot::PLAYER)
                    .count();
                prop_assert_eq!(player_teams, 1);

                let mut seen = HashSet::new();
                for team in teams {
                    for &member in &team.members {
                        let entity_id = context.combatant(member).unwrap().entity.id.clone();
                        prop_assert!(seen.insert(entity_id), "entity placed twice");
                    }
                }
                prop_assert!(seen.len() <= entity_count);
                prop_assert_eq!(seen.len(), context.len());
            }
            Err(error) => prop_assert!(matches!(error, CombatError::TooManyTeams { .. }), "expected TooManyTeams error"),
        }
    }

    #[test]
    fn test_power_level_survives_a_snapshot(entity in arb_enemy()) {
        let snapshot = ron::to_string(&entity).unwrap();
        let restored: Entity = ron::from_str(&snapshot).unwrap();

        let before = CombatState::new(entity, "team_1", TeamSlot(1), Vector::ZERO);
        let after = CombatState::new(restored, "team_1", TeamSlot(1), Vector::ZERO);
        prop_assert_eq!(before.power_level, after.power_level);
    }

    #[test]
    fn test_cone_contains_only_points_in_range(
        point in arb_position(100.0),
        origin in arb_position(100.0),
        facing in arb_position(100.0),
        range in 1.0f64..80.0,
        angle in 1.0f64..360.0,
    ) {
        let direction = facing - origin;
        prop_assume!(!direction.is_zero());
        if point.in_cone(origin, direction, range, angle).unwrap() {
            prop_assert!(point.distance_from(origin) <= range + 1e-9);
        }
    }

    #[test]
    fn test_cone_contains_its_axis(
        origin in arb_position(100.0),
        facing in arb_position(100.0),
        range in 1.0f64..80.0,
        angle in 1.0f64..360.0,
        reach in 0.01f64..0.99,
    ) {
        let direction = facing - origin;
        prop_assume!(direction.length() > 1e-6);
        let unit = direction.normalized().unwrap();
        let point = origin + unit * (range * reach);
        prop_assert!(point.in_cone(origin, direction, range, angle).unwrap());
    }
}

#[test]
fn test_zero_facing_off_apex_is_an_error() {
    let origin = Vector::new(0.0, 0.0);
    let result = Vector::new(1.0, 0.0).in_cone(origin, Vector::ZERO, 5.0, 90.0);
    assert!(matches!(result, Err(CombatError::ZeroLengthVector)));
}
