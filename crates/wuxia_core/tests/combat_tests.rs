//! Combat scenario tests.
//!
//! End-to-end checks of action resolution and the tick loop through the
//! public resolver API.

use wuxia_core::combat::{
    roll_physical, CombatContext, CombatOutcome, CombatResolver, CombatantId, OutputTag,
    PlayerInputResult, RecordingHost,
};
use wuxia_core::config::CombatConfig;
use wuxia_core::packets::{ActionPacket, EffectClass, SoulEffectType};
use wuxia_core::technique::{PhaseOutput, SoulPhase, Technique};
use wuxia_core::world_time::WorldTimestamp;

use wuxia_test_utils::fixtures::{bandit, cultivated, duel, open_palm, player, wolf};
use wuxia_test_utils::random::ScriptedRandom;

const PLAYER: CombatantId = CombatantId(0);
const ENEMY: CombatantId = CombatantId(1);

fn resolver_rolling(context: CombatContext, roll: f64) -> CombatResolver<ScriptedRandom> {
    CombatResolver::new(context, ScriptedRandom::constant(roll), CombatConfig::default())
}

fn soul_technique(name: &str, effect_class: EffectClass, effect_type: SoulEffectType) -> Technique {
    Technique::new(name).with_soul(SoulPhase {
        effect_class,
        effect_type,
        strength: 20.0,
        duration: 80.0,
        output: PhaseOutput {
            success: format!("{name} takes hold."),
            ..PhaseOutput::default()
        },
    })
}

#[test]
fn test_physical_phase_deals_scaled_base_damage() {
    let context = duel(player(10.0, 5.0), bandit("b", 5.0, 5.0), 3.0);

    // Hit chance (10 + 10) / 5 + 0.01 is above 1: the strike cannot miss.
    for roll in [0.0, 0.5, 0.999] {
        let mut rng = ScriptedRandom::constant(roll);
        let phase = open_palm().physical.unwrap();
        let strike = roll_physical(
            &mut rng,
            &phase,
            50.0,
            context.combatant(PLAYER).unwrap(),
            context.combatant(ENEMY).unwrap(),
        )
        .unwrap();
        assert_eq!(strike.base, 25.0);
    }

    let mut resolver = resolver_rolling(context, 0.99);
    let mut host = RecordingHost::new();
    let action = ActionPacket::technique(PLAYER, ENEMY, open_palm()).with_stamina(50.0);
    let record = resolver.resolve_action(&action, &mut host).unwrap();

    assert!(record.succeeded);
    assert_eq!(record.phases_landed, 1);
    let enemy = resolver.context().combatant(ENEMY).unwrap();
    // Crit at 1.1x, plus 2.01 overflow of that again.
    assert!((enemy.entity.hp - (100.0 - 25.0 * 1.1 * 3.01)).abs() < 1e-9);
    assert_eq!(resolver.context().combatant(PLAYER).unwrap().entity.stamina, 20.0);
}

#[test]
fn test_win_is_signalled_every_tick_while_enemies_are_down() {
    let mut fallen = bandit("b", 5.0, 5.0);
    fallen.is_alive = false;
    let context = duel(player(10.0, 5.0), fallen, 3.0);
    let mut resolver = resolver_rolling(context, 0.5);
    let mut host = RecordingHost::new();

    let first = resolver.tick(&mut host).unwrap();
    let second = resolver.tick(&mut host).unwrap();

    assert_eq!(first.outcome, Some(CombatOutcome::Win));
    assert_eq!(second.outcome, Some(CombatOutcome::Win));
    assert_eq!(host.outcomes, vec![CombatOutcome::Win, CombatOutcome::Win]);
}

#[test]
fn test_defeat_when_player_team_is_down() {
    let mut fallen = player(10.0, 5.0);
    fallen.is_alive = false;
    let context = duel(fallen, bandit("b", 5.0, 5.0), 3.0);
    let mut resolver = resolver_rolling(context, 0.5);
    let mut host = RecordingHost::new();

    let events = resolver.tick(&mut host).unwrap();
    assert_eq!(events.outcome, Some(CombatOutcome::Defeat));
}

fn retreat_with_roll(
    roll: f64,
) -> (CombatResolver<ScriptedRandom>, RecordingHost, PlayerInputResult) {
    // The player is the strongest combatant, so the odds are exactly 0.8.
    let context = duel(player(10.0, 5.0), bandit("b", 5.0, 5.0), 3.0);
    let mut resolver = resolver_rolling(context, roll);
    let mut host = RecordingHost::new();
    resolver.tick(&mut host).unwrap();
    assert!(resolver.awaiting_player_input());

    let result = resolver.resolve_player_input("retreat", &mut host).unwrap();
    (resolver, host, result)
}

#[test]
fn test_retreat_succeeds_below_threshold() {
    let (_, host, result) = retreat_with_roll(0.79);
    assert_eq!(result, PlayerInputResult::Consumed);
    assert_eq!(host.outcome(), Some(CombatOutcome::Defeat));
    assert_eq!(host.lines_tagged(OutputTag::Success).count(), 1);
}

#[test]
fn test_retreat_fails_above_threshold() {
    let (resolver, host, result) = retreat_with_roll(0.81);
    assert_eq!(result, PlayerInputResult::Consumed);
    assert!(host.outcomes.is_empty());
    assert!(!resolver.awaiting_player_input());

    let player = resolver.context().combatant(PLAYER).unwrap();
    assert_eq!(player.last_action_tick, 1);
    assert_eq!(player.entity.hp, 100.0);
}

#[test]
fn test_input_before_the_players_turn_is_ignored() {
    let context = duel(player(10.0, 5.0), bandit("b", 5.0, 5.0), 3.0);
    let mut resolver = resolver_rolling(context, 0.0);
    let mut host = RecordingHost::new();
    let result = resolver.resolve_player_input("retreat", &mut host).unwrap();
    assert_eq!(result, PlayerInputResult::NotReady);
    assert!(host.outcomes.is_empty());
}

#[test]
fn test_soul_debuff_is_stored_on_the_caster() {
    let context = duel(
        cultivated(player(10.0, 5.0), 0.0, 100.0),
        bandit("b", 5.0, 5.0),
        3.0,
    );
    let mut resolver = resolver_rolling(context, 0.5);
    let mut host = RecordingHost::new();
    let technique = soul_technique(
        "Withering Gaze",
        EffectClass::Debuff,
        SoulEffectType::AgilityMult,
    );

    let action = ActionPacket::technique(PLAYER, ENEMY, technique)
        .with_stamina(0.0)
        .with_qi(0.0)
        .with_soul(40.0);
    let record = resolver.resolve_action(&action, &mut host).unwrap();

    assert!(record.succeeded);
    assert!(host.said("Withering Gaze takes hold."));
    let caster = resolver.context().combatant(PLAYER).unwrap();
    assert_eq!(caster.effects.len(), 1);
    assert_eq!(caster.entity.cultivation.soul, 60.0);
    assert!(resolver.context().combatant(ENEMY).unwrap().effects.is_empty());
}

#[test]
fn test_utility_effect_steals_each_tick() {
    let caster = cultivated(bandit("b", 5.0, 5.0), 0.0, 100.0);
    let context = duel(player(10.0, 5.0), caster, 3.0);
    let mut resolver = resolver_rolling(context, 0.5);
    let mut host = RecordingHost::new();
    let technique = soul_technique(
        "Leech Soul",
        EffectClass::Utility,
        SoulEffectType::StealVitality,
    );

    let action = ActionPacket::technique(ENEMY, PLAYER, technique).with_soul(50.0);
    assert!(resolver.resolve_action(&action, &mut host).unwrap().succeeded);

    {
        let leech = resolver.context_mut().combatant_mut(ENEMY).unwrap();
        // 50 * 0.8 / (0 + 14) ticks
        let ending = leech.effects.iter().next().unwrap().ending_time;
        assert_eq!(ending, WorldTimestamp::new(2));
        leech.target = Some(PLAYER);
        leech.entity.lose_hp(50.0);
        leech.last_action_tick = 100;
    }

    host.advance(1);
    let events = resolver.tick(&mut host).unwrap();
    assert!(events.actions.is_empty());

    // Strength 0.2 * (100 / max(1, 0)) = 20% of the player's hp.
    assert!((resolver.context().combatant(PLAYER).unwrap().entity.hp - 80.0).abs() < 1e-9);
    assert!((resolver.context().combatant(ENEMY).unwrap().entity.hp - 70.0).abs() < 1e-9);

    host.advance(1);
    resolver.tick(&mut host).unwrap();
    let leech = resolver.context().combatant(ENEMY).unwrap();
    assert!(leech.effects.is_empty(), "effect expires at t2");
    assert!((resolver.context().combatant(PLAYER).unwrap().entity.hp - 80.0).abs() < 1e-9);
}

#[test]
fn test_ai_attacks_on_its_cooldown() {
    // Wolf power 17 against the player's 19: eligible every tick from tick 2.
    let context = duel(player(10.0, 5.0), wolf("w"), 2.0);
    let mut resolver = resolver_rolling(context, 0.5);
    let mut host = RecordingHost::new();

    let actions: usize = (0..4)
        .map(|_| resolver.tick(&mut host).unwrap().actions.len())
        .sum();

    assert_eq!(actions, 3);
    assert_eq!(resolver.context().combatant(ENEMY).unwrap().target, Some(PLAYER));
    assert_eq!(resolver.context().combatant(PLAYER).unwrap().entity.hp, 85.0);
}

#[test]
fn test_deaths_are_reported_once() {
    let mut frail = player(10.0, 5.0);
    frail.hp = 5.0;
    let context = duel(frail, wolf("w"), 2.0);
    let mut resolver = resolver_rolling(context, 0.5);
    let mut host = RecordingHost::new();

    assert!(resolver.tick(&mut host).unwrap().deaths.is_empty());
    assert_eq!(resolver.tick(&mut host).unwrap().deaths, vec![PLAYER]);
    let after = resolver.tick(&mut host).unwrap();
    assert!(after.deaths.is_empty());
    assert_eq!(after.outcome, Some(CombatOutcome::Defeat));
}
