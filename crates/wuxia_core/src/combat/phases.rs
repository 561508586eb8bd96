//! Technique phase handlers.
//!
//! Each handler commits up to the requested amount of its resource, rolls
//! against the shared random source and reports whether the phase landed.
//! A `false` result stops the remaining phases of the technique.

use super::context::CombatContext;
use super::state::CombatState;
use super::CombatantId;
use crate::error::Result;
use crate::math::Vector;
use crate::packets::{
    DamagePacket, DamageType, DefensePacket, EffectClass, EffectPacket, SoulEffectType,
};
use crate::rng::RandomSource;
use crate::stats::StatKind;
use crate::technique::{
    AreaType, PhysicalPhase, QiEffect, QiPhase, RangedQi, ResourceKind, SoulPhase,
};
use crate::world_time::WorldTimestamp;

/// Stability below which a shield starts to decay.
pub const SHIELD_STABILITY_THRESHOLD: f64 = 25.0;

/// Hit chance bonus of area attacks centred on a point.
const AREA_HIT_BONUS: f64 = 0.2;

// ============================================================================
// Shared roll
// ============================================================================

/// Outcome of the shared crit roll.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Strike {
    /// Damage before crit and overflow.
    pub base: f64,
    /// Damage dealt.
    pub damage: f64,
    /// Whether the crit roll succeeded.
    pub crit: bool,
}

/// Roll a crit on `base` damage.
///
/// A hit chance above 1 is dominance; the excess adds to the crit chance,
/// and crit chance beyond 1 adds `overflow * overflow_weight` of the damage
/// again whether or not the crit landed.
fn roll_strike<R: RandomSource>(
    rng: &mut R,
    base: f64,
    hit_chance: f64,
    crit_points: f64,
    precision_points: f64,
    overflow_weight: f64,
) -> Strike {
    let dominance = hit_chance.max(1.0);
    let crit_chance = crit_points / 100.0 + (dominance - 1.0);
    let overflow = (crit_chance - 1.0).max(0.0);
    let crit = rng.next_f64() < crit_chance;
    let mut damage = if crit {
        base * (1.0 + precision_points / 100.0)
    } else {
        base
    };
    damage += damage * overflow * overflow_weight;
    Strike { base, damage, crit }
}

fn drop_off(distance: f64, range: f64, max_drop: f64) -> f64 {
    if range > 0.0 {
        distance / range * max_drop
    } else {
        0.0
    }
}

fn committed(
    context: &CombatContext,
    origin: CombatantId,
    resource: ResourceKind,
    requested: f64,
) -> Result<f64> {
    let available = context.combatant(origin)?.available(resource);
    Ok(requested.max(0.0).min(available))
}

fn spend(
    context: &mut CombatContext,
    origin: CombatantId,
    resource: ResourceKind,
    amount: f64,
) -> Result<f64> {
    Ok(context.combatant_mut(origin)?.spend(resource, amount))
}

fn hit(
    context: &mut CombatContext,
    target: CombatantId,
    damage_type: DamageType,
    amount: f64,
) -> Result<()> {
    context
        .combatant_mut(target)?
        .take_damage(DamagePacket::of(damage_type, amount));
    Ok(())
}

// ============================================================================
// Physical
// ============================================================================

/// Roll a physical strike without applying it.
///
/// Returns `None` on a miss.
#[must_use]
pub fn roll_physical<R: RandomSource>(
    rng: &mut R,
    phase: &PhysicalPhase,
    resource: f64,
    origin: &CombatState,
    target: &CombatState,
) -> Option<Strike> {
    let speed = phase.speed_points / 100.0 * resource;
    let agility_factor =
        (origin.get_stat(StatKind::Agility) + speed) / target.get_stat(StatKind::Agility).max(1.0);
    let luck_factor =
        origin.get_stat(StatKind::Luck) / target.get_stat(StatKind::Luck).max(1.0) / 100.0;
    let chance = agility_factor + luck_factor;
    if chance < 1.0 && rng.next_f64() >= chance {
        return None;
    }
    let base = phase.damage_points / 100.0 * resource;
    Some(roll_strike(
        rng,
        base,
        chance,
        phase.crit_points,
        phase.precision_points,
        1.0,
    ))
}

/// Resolve a physical phase.
///
/// Fails without spending when the target stands beyond the origin's
/// agility or the origin lacks the required weapon.
pub(crate) fn physical<R: RandomSource>(
    context: &mut CombatContext,
    rng: &mut R,
    phase: &PhysicalPhase,
    requested: f64,
    origin: CombatantId,
    target: CombatantId,
) -> Result<bool> {
    {
        let origin_state = context.combatant(origin)?;
        if let Some(tag) = &phase.weapon_required {
            let armed = origin_state
                .entity
                .loadout
                .as_ref()
                .and_then(|loadout| loadout.weapon.as_ref())
                .is_some_and(|weapon| weapon.tags().contains(tag));
            if !armed {
                return Ok(false);
            }
        }
        if context.distance(origin, target)? > origin_state.get_stat(StatKind::Agility) {
            return Ok(false);
        }
    }

    let amount = committed(context, origin, ResourceKind::Stamina, requested)?;
    let resource = spend(context, origin, ResourceKind::Stamina, amount)?;
    let strike = roll_physical(
        rng,
        phase,
        resource,
        context.combatant(origin)?,
        context.combatant(target)?,
    );
    let Some(strike) = strike else {
        return Ok(false);
    };
    tracing::trace!(
        %origin,
        %target,
        damage = strike.damage,
        crit = strike.crit,
        "Physical strike"
    );
    hit(context, target, phase.damage_type, strike.damage)?;
    Ok(true)
}

// ============================================================================
// Qi
// ============================================================================

/// Shield raised by a qi defense phase fed with `resource` qi.
#[must_use]
pub fn defense_shield(
    defense_points: f64,
    armor_penetration_resistance_points: f64,
    stability_points: f64,
    resource: f64,
) -> DefensePacket {
    DefensePacket::new(
        defense_points / 100.0 * resource,
        armor_penetration_resistance_points,
        ((SHIELD_STABILITY_THRESHOLD - stability_points) / 100.0).max(0.0),
    )
}

/// Resolve a qi phase.
pub(crate) fn qi<R: RandomSource>(
    context: &mut CombatContext,
    rng: &mut R,
    phase: &QiPhase,
    requested: f64,
    origin: CombatantId,
    target: CombatantId,
) -> Result<bool> {
    let amount = committed(context, origin, ResourceKind::Qi, requested)?;
    match &phase.effect {
        QiEffect::Defense {
            defense_points,
            armor_penetration_resistance_points,
            stability_points,
        } => {
            let resource = spend(context, origin, ResourceKind::Qi, amount)?;
            let shield = defense_shield(
                *defense_points,
                *armor_penetration_resistance_points,
                *stability_points,
                resource,
            );
            context.combatant_mut(origin)?.add_defense(shield);
            Ok(true)
        }
        QiEffect::Melee {
            damage_points,
            crit_points,
            damage_type,
        } => {
            let resource = spend(context, origin, ResourceKind::Qi, amount)?;
            let mut damage = damage_points / 100.0 * resource;
            let crit_chance = crit_points / 100.0;
            if rng.next_f64() < crit_chance {
                damage *= 1.0 + (1.0 - crit_chance);
            }
            hit(context, target, *damage_type, damage)?;
            Ok(true)
        }
        QiEffect::Ranged(ranged) => {
            let range = ranged.range_points / 100.0 * amount;
            if context.distance(origin, target)? > range {
                return Ok(false);
            }
            let resource = spend(context, origin, ResourceKind::Qi, amount)?;
            ranged_attack(context, rng, ranged, resource, range, origin, target)
        }
    }
}

fn agility_of(context: &CombatContext, id: CombatantId) -> Result<f64> {
    Ok(context.combatant(id)?.get_stat(StatKind::Agility).max(1.0))
}

fn position_of(context: &CombatContext, id: CombatantId) -> Result<Vector> {
    Ok(context.combatant(id)?.position)
}

fn ranged_attack<R: RandomSource>(
    context: &mut CombatContext,
    rng: &mut R,
    ranged: &RangedQi,
    resource: f64,
    range: f64,
    origin: CombatantId,
    target: CombatantId,
) -> Result<bool> {
    let origin_position = position_of(context, origin)?;
    let target_position = position_of(context, target)?;
    let speed = ranged.speed_points / 100.0 * resource;
    let max_damage = ranged.damage_points / 100.0 * resource;
    let area = ranged.area_of_effect_points / 100.0;
    let enemies = context.living_enemies_of(origin);

    match ranged.area_type {
        AreaType::Bullet => {
            if !enemies.contains(&target) {
                return Ok(false);
            }
            let chance = speed / agility_of(context, target)?;
            if rng.next_f64() < chance {
                let distance = origin_position.distance_from(target_position);
                let damage = max_damage * (1.0 - drop_off(distance, range, 0.1));
                let strike = roll_strike(
                    rng,
                    damage,
                    chance,
                    ranged.crit_points,
                    ranged.precision_points,
                    1.0,
                );
                hit(context, target, ranged.damage_type, strike.damage)?;
            }
            Ok(true)
        }
        AreaType::Cone => {
            let facing = target_position - origin_position;
            if facing.is_zero() {
                return Ok(false);
            }
            let mut in_shape = Vec::new();
            for enemy in enemies {
                let position = position_of(context, enemy)?;
                if position.in_cone(origin_position, facing, range, ranged.area_of_effect_points)? {
                    in_shape.push(enemy);
                }
            }
            let distance = origin_position.distance_from(target_position);
            let damage = max_damage * (1.0 - drop_off(distance, range, 0.5));
            for &enemy in &in_shape {
                let chance = (speed + area) / agility_of(context, enemy)?;
                if rng.next_f64() > chance {
                    continue;
                }
                let strike = roll_strike(
                    rng,
                    damage,
                    chance,
                    ranged.crit_points,
                    ranged.precision_points,
                    1.0 - area,
                );
                hit(context, enemy, ranged.damage_type, strike.damage)?;
            }
            Ok(!in_shape.is_empty())
        }
        AreaType::Surround | AreaType::Burst => {
            // Both shapes gather around the origin; a burst falls off from its target.
            let (drop_from, max_drop) = if ranged.area_type == AreaType::Surround {
                (origin_position, 0.2)
            } else {
                (target_position, 0.3)
            };
            let radius = area * resource;
            let mut in_shape = Vec::new();
            for enemy in enemies {
                if position_of(context, enemy)?.distance_from(origin_position) <= radius {
                    in_shape.push(enemy);
                }
            }
            for &enemy in &in_shape {
                let chance = (speed + AREA_HIT_BONUS) / agility_of(context, enemy)?;
                if rng.next_f64() > chance {
                    continue;
                }
                let distance = position_of(context, enemy)?.distance_from(drop_from);
                let damage = max_damage * (1.0 - drop_off(distance, range, max_drop));
                let strike = roll_strike(
                    rng,
                    damage,
                    chance,
                    ranged.crit_points,
                    ranged.precision_points,
                    0.8,
                );
                hit(context, enemy, ranged.damage_type, strike.damage)?;
            }
            Ok(!in_shape.is_empty())
        }
        AreaType::Beam => {
            let offset = target_position - origin_position;
            if offset.is_zero() {
                return Ok(false);
            }
            let direction = offset.normalized()?;
            let width = area * resource;
            let mut in_shape = Vec::new();
            for enemy in enemies {
                let (distance, projection) =
                    position_of(context, enemy)?.point_line_distance(origin_position, direction);
                if projection < 0.0 || projection > range || distance > width {
                    continue;
                }
                in_shape.push((enemy, projection));
            }
            for &(enemy, projection) in &in_shape {
                let chance = speed / agility_of(context, enemy)?;
                if rng.next_f64() > chance {
                    continue;
                }
                let damage = max_damage * (1.0 - drop_off(projection, range, 0.2));
                let strike = roll_strike(
                    rng,
                    damage,
                    chance,
                    ranged.crit_points,
                    ranged.precision_points,
                    0.0,
                );
                hit(context, enemy, ranged.damage_type, strike.damage)?;
            }
            Ok(!in_shape.is_empty())
        }
    }
}

// ============================================================================
// Soul
// ============================================================================

/// Resolve a soul phase. The effect is stored on the origin.
pub(crate) fn soul(
    context: &mut CombatContext,
    phase: &SoulPhase,
    requested: f64,
    origin: CombatantId,
    target: CombatantId,
    now: WorldTimestamp,
) -> Result<bool> {
    let resource = committed(context, origin, ResourceKind::Soul, requested)?;
    let (duration, strength) = {
        let origin_state = context.combatant(origin)?;
        let stat_total = origin_state.physical_stat_total();
        if phase.effect_class == EffectClass::Buff {
            (
                resource * (phase.duration / 100.0) / stat_total.max(1.0),
                phase.strength / 100.0,
            )
        } else {
            let target_soul = context.combatant(target)?.entity.cultivation.soul;
            let origin_soul = origin_state.entity.cultivation.soul;
            (
                resource * (phase.duration / 100.0) / (target_soul + stat_total).max(1.0),
                phase.strength / 100.0 * (origin_soul / target_soul.max(1.0)),
            )
        }
    };
    spend(context, origin, ResourceKind::Soul, resource)?;

    let effect = EffectPacket {
        effect_class: phase.effect_class,
        effect_type: phase.effect_type,
        strength,
        origin,
        ending_time: now.advanced_by(duration.max(0.0) as u64),
    };
    let state = context.combatant_mut(origin)?;
    if effect.effect_class != EffectClass::Utility {
        effect.apply(&mut state.modifier_pool);
    }
    state.effects.add(effect);
    tracing::trace!(
        %origin,
        effect = %effect.effect_type,
        ending = %effect.ending_time,
        "Soul effect stored"
    );
    Ok(true)
}

// ============================================================================
// Utility
// ============================================================================

/// Apply one tick of a utility effect.
///
/// The effect's origin steals from its current target; nothing happens if
/// the origin is dead or has no living target.
pub(crate) fn apply_utility(context: &mut CombatContext, effect: &EffectPacket) -> Result<()> {
    let origin_id = effect.origin;
    let Some(target_id) = context.combatant(origin_id)?.target else {
        return Ok(());
    };
    if target_id == origin_id {
        return Ok(());
    }
    let (origin, target) = context.pair_mut(origin_id, target_id)?;
    if !origin.is_alive() || !target.is_alive() {
        return Ok(());
    }

    let fraction = effect.strength / 100.0;
    match effect.effect_type {
        SoulEffectType::StealVitality => {
            if target.entity.hp <= 0.0 {
                return Ok(());
            }
            let stolen = target.entity.hp * fraction;
            origin.entity.hp = (origin.entity.hp + stolen).min(origin.entity.max_hp());
            target.entity.lose_hp(stolen);
        }
        SoulEffectType::StealEndurance => {
            if target.entity.stamina <= 0.0 {
                let damage = target.entity.hp * fraction / 2.0;
                target.entity.lose_hp(damage);
                return Ok(());
            }
            let stolen = target.entity.stamina * fraction;
            origin.entity.stamina =
                (origin.entity.stamina + stolen).min(origin.entity.max_stamina());
            target.entity.stamina = (target.entity.stamina - stolen).max(0.0);
        }
        SoulEffectType::StealQi => {
            if target.entity.cultivation.qi.total() <= 0.0 {
                let damage = target.entity.hp * fraction / 2.0;
                target.entity.lose_hp(damage);
                return Ok(());
            }
            let stolen = target.usable_qi * fraction;
            origin.usable_qi += stolen;
            target.usable_qi = (target.usable_qi - stolen).max(0.0);
        }
        SoulEffectType::StrengthMult | SoulEffectType::AgilityMult => {}
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combat::context::TeamRoster;
    use crate::combat::PLAYER_TEAM;
    use crate::cultivation::{Cultivation, QiReserves};
    use crate::entity::{Entity, EntityKind};
    use crate::packets::ModifierAttribute;
    use crate::stats::Stats;
    use crate::technique::PhaseOutput;

    /// Replays a fixed list of rolls, then a constant.
    struct Rolls(Vec<f64>, f64);

    impl RandomSource for Rolls {
        fn next_f64(&mut self) -> f64 {
            if self.0.is_empty() {
                self.1
            } else {
                self.0.remove(0)
            }
        }
    }

    fn fighter(id: &str, kind: EntityKind, agility: f64, luck: f64) -> Entity {
        Entity::new(id, id, kind, Stats::new(4.0, 5.0, agility, 2.0, luck, 0.0))
    }

    /// Player at the origin facing a foe team; foes placed by the caller.
    fn arena(foes: Vec<(Entity, Vector)>) -> CombatContext {
        let player = fighter("you", EntityKind::Player, 10.0, 5.0)
            .with_cultivation(Cultivation::new(QiReserves::new(100.0, 0.0, 0.0), 100.0));
        let positions: Vec<Vector> = foes.iter().map(|(_, p)| *p).collect();
        let members = foes.into_iter().map(|(e, _)| e).collect();
        let mut context = CombatContext::new(
            vec![
                TeamRoster::new(PLAYER_TEAM, vec![player]),
                TeamRoster::new("foes", members),
            ],
            100.0,
        )
        .unwrap();
        context.combatant_mut(CombatantId(0)).unwrap().position = Vector::ZERO;
        for (index, position) in positions.into_iter().enumerate() {
            context.combatant_mut(CombatantId(index + 1)).unwrap().position = position;
        }
        context.combatant_mut(CombatantId(0)).unwrap().usable_qi = 100.0;
        context
    }

    fn strike_phase() -> PhysicalPhase {
        PhysicalPhase {
            weapon_required: None,
            damage_type: DamageType::Crush,
            damage_points: 50.0,
            speed_points: 20.0,
            precision_points: 10.0,
            crit_points: 0.0,
            output: PhaseOutput::default(),
        }
    }

    fn lone_foe(agility: f64, distance: f64) -> CombatContext {
        arena(vec![(
            fighter("foe", EntityKind::Human, agility, 5.0),
            Vector::new(distance, 0.0),
        )])
    }

    /// Player (0) casts at the first foe (1).
    fn qi_at_foe(
        context: &mut CombatContext,
        mut rng: Rolls,
        phase: &QiPhase,
        amount: f64,
    ) -> bool {
        qi(context, &mut rng, phase, amount, CombatantId(0), CombatantId(1)).unwrap()
    }

    fn physical_at_foe(
        context: &mut CombatContext,
        mut rng: Rolls,
        phase: &PhysicalPhase,
        amount: f64,
    ) -> bool {
        physical(context, &mut rng, phase, amount, CombatantId(0), CombatantId(1)).unwrap()
    }

    fn ranged_phase(area_type: AreaType) -> QiPhase {
        QiPhase {
            effect: QiEffect::Ranged(RangedQi {
                damage_points: 40.0,
                speed_points: 20.0,
                crit_points: 0.0,
                precision_points: 10.0,
                range_points: 20.0,
                area_of_effect_points: 10.0,
                damage_type: DamageType::Pierce,
                area_type,
            }),
            output: PhaseOutput::default(),
        }
    }

    fn hp(context: &CombatContext, id: usize) -> f64 {
        context.combatant(CombatantId(id)).unwrap().entity.hp
    }

    #[test]
    fn test_physical_base_damage_and_dominance() {
        let context = lone_foe(5.0, 3.0);
        let origin = context.combatant(CombatantId(0)).unwrap();
        let target = context.combatant(CombatantId(1)).unwrap();

        // Hit chance (10 + 10) / 5 + 0.01 never needs a roll; the crit roll
        // is the only one drawn.
        let mut rng = Rolls(vec![0.99], 0.99);
        let strike = roll_physical(&mut rng, &strike_phase(), 50.0, origin, target).unwrap();
        assert_eq!(strike.base, 25.0);
        assert!(strike.crit);
        // 25 * 1.1 crit, plus overflow 2.01 of that again
        assert!((strike.damage - 25.0 * 1.1 * 3.01).abs() < 1e-9);
        assert!(rng.0.is_empty());
    }

    #[test]
    fn test_physical_out_of_reach_spends_nothing() {
        let mut context = lone_foe(5.0, 30.0);
        let stamina = context.combatant(CombatantId(0)).unwrap().entity.stamina;
        let landed = physical_at_foe(&mut context, Rolls(vec![], 0.0), &strike_phase(), 50.0);
        assert!(!landed);
        assert_eq!(context.combatant(CombatantId(0)).unwrap().entity.stamina, stamina);
        assert_eq!(hp(&context, 1), 200.0);
    }

    #[test]
    fn test_physical_miss() {
        // Slow attacker against a nimble target: chance (1 + 0.2) / 20 + 0.01
        let mut context = lone_foe(20.0, 1.0);
        context.combatant_mut(CombatantId(0)).unwrap().entity.stats.agility = 1.0;
        let landed = physical_at_foe(&mut context, Rolls(vec![0.5], 0.5), &strike_phase(), 1.0);
        assert!(!landed);
        assert_eq!(hp(&context, 1), 200.0);
    }

    #[test]
    fn test_physical_requires_weapon_tag() {
        let mut context = lone_foe(5.0, 1.0);
        let mut phase = strike_phase();
        phase.weapon_required = Some("Sword".to_string());
        let landed = physical_at_foe(&mut context, Rolls(vec![], 0.0), &phase, 50.0);
        assert!(!landed);
    }

    #[test]
    fn test_qi_defense_shield() {
        let mut context = lone_foe(5.0, 1.0);
        let phase = QiPhase {
            effect: QiEffect::Defense {
                defense_points: 60.0,
                armor_penetration_resistance_points: 20.0,
                stability_points: 20.0,
            },
            output: PhaseOutput::default(),
        };
        assert!(qi_at_foe(&mut context, Rolls(vec![], 0.0), &phase, 50.0));
        let origin = context.combatant(CombatantId(0)).unwrap();
        assert_eq!(origin.defense_techniques, vec![DefensePacket::new(30.0, 20.0, 0.05)]);
        assert_eq!(origin.usable_qi, 50.0);
    }

    #[test]
    fn test_qi_melee_literal_crit_multiplier() {
        let mut context = lone_foe(5.0, 90.0);
        let phase = QiPhase {
            effect: QiEffect::Melee {
                damage_points: 40.0,
                crit_points: 25.0,
                damage_type: DamageType::Slash,
            },
            output: PhaseOutput::default(),
        };
        // No range check; crit multiplies by 1 + (1 - 0.25).
        assert!(qi_at_foe(&mut context, Rolls(vec![0.1], 0.9), &phase, 50.0));
        assert_eq!(hp(&context, 1), 200.0 - 20.0 * 1.75);
    }

    #[test]
    fn test_bullet_out_of_range_fails() {
        let mut context = lone_foe(5.0, 11.0);
        // Range 20 points * 50 qi / 100 = 10.
        let landed = qi_at_foe(
            &mut context,
            Rolls(vec![], 0.0),
            &ranged_phase(AreaType::Bullet),
            50.0,
        );
        assert!(!landed);
        assert_eq!(context.combatant(CombatantId(0)).unwrap().usable_qi, 100.0);
    }

    #[test]
    fn test_bullet_miss_still_succeeds() {
        let mut context = lone_foe(50.0, 5.0);
        // Chance 10 / 50 = 0.2 against a 0.5 roll.
        let landed = qi_at_foe(
            &mut context,
            Rolls(vec![0.5], 0.5),
            &ranged_phase(AreaType::Bullet),
            50.0,
        );
        assert!(landed);
        assert_eq!(hp(&context, 1), 200.0);
    }

    #[test]
    fn test_bullet_drop_off() {
        let mut context = lone_foe(20.0, 5.0);
        // Chance 10 / 20 = 0.5; hit roll 0.1, crit roll 0.9 (crit chance 0).
        let landed = qi_at_foe(
            &mut context,
            Rolls(vec![0.1, 0.9], 0.9),
            &ranged_phase(AreaType::Bullet),
            50.0,
        );
        assert!(landed);
        // 20 max damage, 5 of 10 range -> 5% drop.
        assert!((hp(&context, 1) - (200.0 - 19.0)).abs() < 1e-9);
    }

    #[test]
    fn test_cone_hits_only_inside() {
        let mut context = arena(vec![
            (fighter("ahead", EntityKind::Human, 1.0, 5.0), Vector::new(5.0, 0.0)),
            (fighter("beside", EntityKind::Human, 1.0, 5.0), Vector::new(5.0, 0.2)),
            (fighter("behind", EntityKind::Human, 1.0, 5.0), Vector::new(-5.0, 0.0)),
        ]);
        let landed = qi_at_foe(
            &mut context,
            Rolls(vec![], 0.99),
            &ranged_phase(AreaType::Cone),
            50.0,
        );
        assert!(landed);
        assert!(hp(&context, 1) < 200.0);
        assert!(hp(&context, 2) < 200.0);
        assert_eq!(hp(&context, 3), 200.0);
    }

    #[test]
    fn test_cone_on_own_position_fails() {
        let mut context = arena(vec![(fighter("foe", EntityKind::Human, 5.0, 5.0), Vector::ZERO)]);
        let landed = qi_at_foe(
            &mut context,
            Rolls(vec![], 0.0),
            &ranged_phase(AreaType::Cone),
            50.0,
        );
        assert!(!landed);
    }

    #[test]
    fn test_surround_and_burst_gather_around_origin() {
        // Radius 10 points * 50 / 100 = 5.
        let foes = || {
            vec![
                (fighter("target", EntityKind::Human, 1.0, 5.0), Vector::new(9.0, 0.0)),
                (fighter("near_me", EntityKind::Human, 1.0, 5.0), Vector::new(0.0, 3.0)),
            ]
        };
        let cast = |area_type| {
            let mut context = arena(foes());
            let phase = ranged_phase(area_type);
            assert!(qi_at_foe(&mut context, Rolls(vec![], 0.99), &phase, 50.0));
            context
        };

        let surround = cast(AreaType::Surround);
        assert_eq!(hp(&surround, 1), 200.0);
        assert!(hp(&surround, 2) < 200.0);

        let burst = cast(AreaType::Burst);
        assert_eq!(hp(&burst, 1), 200.0);
        assert!(hp(&burst, 2) < 200.0);
        // Burst drop-off runs from the target, 9.5 away from near_me.
        assert!(hp(&burst, 2) > hp(&surround, 2));
    }

    #[test]
    fn test_beam_follows_line() {
        let mut context = arena(vec![
            (fighter("target", EntityKind::Human, 1.0, 5.0), Vector::new(4.0, 0.0)),
            (fighter("on_line", EntityKind::Human, 1.0, 5.0), Vector::new(8.0, 1.0)),
            (fighter("off_line", EntityKind::Human, 1.0, 5.0), Vector::new(8.0, 8.0)),
        ]);
        assert!(qi_at_foe(&mut context, Rolls(vec![], 0.99), &ranged_phase(AreaType::Beam), 50.0));
        assert!(hp(&context, 1) < 200.0);
        assert!(hp(&context, 2) < 200.0);
        assert_eq!(hp(&context, 3), 200.0);
    }

    #[test]
    fn test_soul_debuff_lands_on_origin() {
        let mut context = lone_foe(5.0, 1.0);
        let phase = SoulPhase {
            effect_class: EffectClass::Debuff,
            effect_type: SoulEffectType::AgilityMult,
            strength: 30.0,
            duration: 50.0,
            output: PhaseOutput::default(),
        };
        let now = WorldTimestamp::new(5);
        assert!(soul(&mut context, &phase, 60.0, CombatantId(0), CombatantId(1), now).unwrap());

        let origin = context.combatant(CombatantId(0)).unwrap();
        assert_eq!(origin.effects.len(), 1);
        assert!((origin.modifier_pool.value(ModifierAttribute::AgilityMult) - 31.0).abs() < 1e-9);
        assert_eq!(origin.entity.cultivation.soul, 40.0);
        let target = context.combatant(CombatantId(1)).unwrap();
        assert!(target.effects.is_empty());

        let effect = origin.effects.iter().next().unwrap();
        // 60 * 0.5 / max(1, 0 + 4 + 2 + 5 + 10) = 1.43 ticks, truncated
        assert_eq!(effect.ending_time, WorldTimestamp::new(6));
        // 0.3 * (100 / max(1, 0))
        assert!((effect.strength - 30.0).abs() < 1e-9);
    }

    #[test]
    fn test_utility_steals_from_current_target() {
        let mut context = lone_foe(5.0, 1.0);
        context.combatant_mut(CombatantId(0)).unwrap().target = Some(CombatantId(1));
        context.combatant_mut(CombatantId(0)).unwrap().entity.hp = 100.0;
        let effect = EffectPacket {
            effect_class: EffectClass::Utility,
            effect_type: SoulEffectType::StealVitality,
            strength: 10.0,
            origin: CombatantId(0),
            ending_time: WorldTimestamp::new(100),
        };
        apply_utility(&mut context, &effect).unwrap();
        assert_eq!(hp(&context, 0), 120.0);
        assert_eq!(hp(&context, 1), 180.0);
    }

    #[test]
    fn test_utility_endurance_and_qi() {
        let mut context = lone_foe(5.0, 1.0);
        context.combatant_mut(CombatantId(0)).unwrap().target = Some(CombatantId(1));
        context.combatant_mut(CombatantId(0)).unwrap().entity.stamina = 0.0;
        let mut effect = EffectPacket {
            effect_class: EffectClass::Utility,
            effect_type: SoulEffectType::StealEndurance,
            strength: 50.0,
            origin: CombatantId(0),
            ending_time: WorldTimestamp::new(100),
        };
        apply_utility(&mut context, &effect).unwrap();
        assert_eq!(context.combatant(CombatantId(0)).unwrap().entity.stamina, 35.0);
        assert_eq!(context.combatant(CombatantId(1)).unwrap().entity.stamina, 35.0);

        // The foe has no raw qi, so a qi steal bleeds hp instead.
        effect.effect_type = SoulEffectType::StealQi;
        apply_utility(&mut context, &effect).unwrap();
        assert_eq!(hp(&context, 1), 150.0);
    }

    #[test]
    fn test_utility_without_target_is_noop() {
        let mut context = lone_foe(5.0, 1.0);
        let effect = EffectPacket {
            effect_class: EffectClass::Utility,
            effect_type: SoulEffectType::StealVitality,
            strength: 10.0,
            origin: CombatantId(0),
            ending_time: WorldTimestamp::new(100),
        };
        apply_utility(&mut context, &effect).unwrap();
        assert_eq!(hp(&context, 1), 200.0);
    }
}
