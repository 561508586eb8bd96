//! AI decision procedure for non-player combatants.
//!
//! Each eligible tick an AI combatant picks an [`Intent`] from the hp race
//! against its target, moves according to it, and builds an
//! [`ActionPacket`] from the best technique it knows for that intent.

use serde::{Deserialize, Serialize};

use super::state::CombatState;
use super::CombatantId;
use crate::config::CombatConfig;
use crate::math::Vector;
use crate::packets::{ActionPacket, EffectClass, SoulEffectType};
use crate::stats::StatKind;
use crate::technique::{QiEffect, RangedQi, Technique};

/// Hp fraction at or below which a losing combatant turns cautious.
pub const CAUTIOUS_HP_FRACTION: f64 = 0.25;

/// Hp fraction at or below which a losing combatant turns careful.
pub const CAREFUL_HP_FRACTION: f64 = 0.5;

/// What a combatant is trying to do this action.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum Intent {
    /// Close in and hit hard.
    Aggressive,
    /// Back off at full speed and shield up.
    Cautious,
    /// Back off at half speed and finish the target.
    Careful,
}

impl Intent {
    /// Intent of `own` against `target`.
    ///
    /// Only a combatant with less hp than its target holds back.
    #[must_use]
    pub fn choose(own: &CombatState, target: &CombatState) -> Self {
        let hp = own.entity.hp;
        if hp >= target.entity.hp {
            return Self::Aggressive;
        }
        let max_hp = own.entity.max_hp();
        if hp <= max_hp * CAUTIOUS_HP_FRACTION {
            Self::Cautious
        } else if hp <= max_hp * CAREFUL_HP_FRACTION {
            Self::Careful
        } else {
            Self::Aggressive
        }
    }
}

/// Resource an AI combatant leans on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Bias {
    Soul,
    Physical,
    Qi,
}

/// Best known technique per category. Ties keep the first technique found.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TechniqueInsight<'a> {
    /// Highest physical damage points.
    pub most_damaging_physical: Option<&'a Technique>,
    /// Highest qi melee damage points.
    pub most_damaging_melee_technique: Option<&'a Technique>,
    /// Highest ranged qi range points.
    pub most_range_technique: Option<&'a Technique>,
    /// Highest ranged qi damage points.
    pub most_damaging_ranged_technique: Option<&'a Technique>,
    /// Highest ranged qi speed points.
    pub fastest_qi_technique: Option<&'a Technique>,
    /// Highest qi defense points.
    pub strongest_defense_technique: Option<&'a Technique>,
    /// Strongest agility buff.
    pub strongest_speed_buff: Option<&'a Technique>,
    /// Strongest strength buff.
    pub strongest_strength_buff: Option<&'a Technique>,
    /// Strongest agility debuff.
    pub strongest_speed_debuff: Option<&'a Technique>,
    /// Strongest strength debuff.
    pub strongest_strength_debuff: Option<&'a Technique>,
    /// Strongest hp steal.
    pub strongest_vitality_steal: Option<&'a Technique>,
    /// Strongest stamina steal.
    pub strongest_endurance_steal: Option<&'a Technique>,
    /// Strongest qi steal.
    pub strongest_qi_steal: Option<&'a Technique>,
}

fn keep_best<'a>(
    slot: &mut Option<&'a Technique>,
    candidate: &'a Technique,
    score: impl Fn(&Technique) -> f64,
) {
    match *slot {
        Some(best) if score(candidate) <= score(best) => {}
        _ => *slot = Some(candidate),
    }
}

fn ranged_score(technique: &Technique, pick: impl Fn(&RangedQi) -> f64) -> f64 {
    technique.ranged_qi().map_or(f64::NEG_INFINITY, pick)
}

fn soul_strength(technique: &Technique) -> f64 {
    technique
        .soul
        .as_ref()
        .map_or(f64::NEG_INFINITY, |soul| soul.strength)
}

impl<'a> TechniqueInsight<'a> {
    /// Scan `techniques` for the best of each category.
    #[must_use]
    pub fn understand(techniques: &'a [Technique]) -> Self {
        let mut insight = Self::default();
        for technique in techniques {
            if technique.physical.is_some() {
                keep_best(&mut insight.most_damaging_physical, technique, |t| {
                    t.physical
                        .as_ref()
                        .map_or(f64::NEG_INFINITY, |p| p.damage_points)
                });
            }

            match technique.qi_effect() {
                Some(QiEffect::Melee { .. }) => {
                    keep_best(&mut insight.most_damaging_melee_technique, technique, |t| {
                        match t.qi_effect() {
                            Some(QiEffect::Melee { damage_points, .. }) => *damage_points,
                            _ => f64::NEG_INFINITY,
                        }
                    });
                }
                Some(QiEffect::Ranged(_)) => {
                    keep_best(&mut insight.most_range_technique, technique, |t| {
                        ranged_score(t, |r| r.range_points)
                    });
                    keep_best(&mut insight.most_damaging_ranged_technique, technique, |t| {
                        ranged_score(t, |r| r.damage_points)
                    });
                    keep_best(&mut insight.fastest_qi_technique, technique, |t| {
                        ranged_score(t, |r| r.speed_points)
                    });
                }
                Some(QiEffect::Defense { .. }) => {
                    keep_best(&mut insight.strongest_defense_technique, technique, |t| {
                        match t.qi_effect() {
                            Some(QiEffect::Defense { defense_points, .. }) => *defense_points,
                            _ => f64::NEG_INFINITY,
                        }
                    });
                }
                None => {}
            }

            if let Some(soul) = &technique.soul {
                let slot = match (soul.effect_class, soul.effect_type) {
                    (EffectClass::Buff, SoulEffectType::AgilityMult) => {
                        &mut insight.strongest_speed_buff
                    }
                    (EffectClass::Buff, SoulEffectType::StrengthMult) => {
                        &mut insight.strongest_strength_buff
                    }
                    (EffectClass::Debuff, SoulEffectType::AgilityMult) => {
                        &mut insight.strongest_speed_debuff
                    }
                    (EffectClass::Debuff, SoulEffectType::StrengthMult) => {
                        &mut insight.strongest_strength_debuff
                    }
                    (EffectClass::Utility, SoulEffectType::StealVitality) => {
                        &mut insight.strongest_vitality_steal
                    }
                    (EffectClass::Utility, SoulEffectType::StealEndurance) => {
                        &mut insight.strongest_endurance_steal
                    }
                    (EffectClass::Utility, SoulEffectType::StealQi) => {
                        &mut insight.strongest_qi_steal
                    }
                    _ => continue,
                };
                keep_best(slot, technique, soul_strength);
            }
        }
        insight
    }

    /// Whether no category was filled.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Build the action `participant` takes against `target` under `intent`.
///
/// Technique actions commit all three resources. Anything unmatched falls
/// back to a plain attack.
#[must_use]
pub fn generate_action(
    participant: &CombatState,
    participant_id: CombatantId,
    target: &CombatState,
    target_id: CombatantId,
    intent: Intent,
    config: &CombatConfig,
) -> ActionPacket {
    let attack = ActionPacket::attack(participant_id, target_id);
    let insight = TechniqueInsight::understand(&participant.entity.techniques);
    if insight.is_empty() {
        return attack;
    }

    let stamina = participant.entity.stamina;
    let soul = participant.entity.cultivation.soul;
    let raw_qi = participant.entity.cultivation.qi.total();
    let usable_qi = participant.usable_qi;
    let total_stats = participant.physical_stat_total();
    let bias = if soul > stamina && soul > raw_qi {
        Bias::Soul
    } else if stamina > raw_qi + usable_qi {
        Bias::Physical
    } else {
        Bias::Qi
    };

    let use_technique = |technique: &Technique, on: CombatantId, stamina: f64, qi: f64, soul: f64| {
        ActionPacket::technique(participant_id, on, technique.clone())
            .with_stamina(stamina)
            .with_qi(qi)
            .with_soul(soul)
    };

    let target_agility = target.get_stat(StatKind::Agility);
    match intent {
        Intent::Aggressive => match bias {
            Bias::Physical => {
                if let Some(technique) = insight.most_damaging_physical {
                    let speed = technique.physical.as_ref().map_or(0.0, |p| p.speed_points);
                    let amount = stamina.min(target_agility * speed / 100.0);
                    return use_technique(technique, target_id, amount, 0.0, 0.0);
                }
            }
            Bias::Qi => {
                let own_agility = participant.get_stat(StatKind::Agility);
                if target_agility > own_agility {
                    if let Some(technique) = insight.fastest_qi_technique {
                        let speed = ranged_score(technique, |r| r.speed_points);
                        let amount = usable_qi.min(target_agility * speed / 100.0);
                        return use_technique(technique, target_id, 0.0, amount, 0.0);
                    }
                } else if let Some(technique) = insight.most_damaging_ranged_technique {
                    let range = ranged_score(technique, |r| r.range_points);
                    let distance = participant.distance_to(target);
                    let amount =
                        usable_qi.min(distance * config.ai_ranged_reach_factor * range / 100.0);
                    return use_technique(technique, target_id, 0.0, amount, 0.0);
                }
            }
            Bias::Soul => {}
        },
        Intent::Cautious => {
            if bias == Bias::Soul && soul > 0.0 {
                if let Some(technique) = insight.strongest_speed_buff {
                    if !participant
                        .effects
                        .is_active(EffectClass::Buff, SoulEffectType::AgilityMult)
                    {
                        let duration = technique.soul.as_ref().map_or(0.0, |s| s.duration);
                        let amount = soul.min(total_stats * duration / 100.0);
                        return use_technique(technique, participant_id, 0.0, 0.0, amount);
                    }
                }
            }
            if usable_qi > 0.0 {
                if let Some(technique) = insight.strongest_defense_technique {
                    let defense = match technique.qi_effect() {
                        Some(QiEffect::Defense { defense_points, .. }) => *defense_points,
                        _ => 0.0,
                    };
                    let target_strength = target.get_stat(StatKind::Strength);
                    let amount = usable_qi
                        .min(config.ai_defense_strength_factor * target_strength * defense / 100.0);
                    return use_technique(technique, participant_id, 0.0, amount, 0.0);
                }
            }
        }
        Intent::Careful => {
            if bias == Bias::Soul && soul > 0.0 {
                if let Some(technique) = insight.strongest_strength_buff {
                    if !participant
                        .effects
                        .is_active(EffectClass::Buff, SoulEffectType::StrengthMult)
                    {
                        let duration = technique.soul.as_ref().map_or(0.0, |s| s.duration);
                        let amount = soul.min(total_stats * duration / 100.0);
                        return use_technique(technique, participant_id, 0.0, 0.0, amount);
                    }
                }
            }
            if usable_qi > 0.0 {
                if let Some(technique) = insight.most_damaging_melee_technique {
                    let damage = match technique.qi_effect() {
                        Some(QiEffect::Melee { damage_points, .. }) => *damage_points,
                        _ => 0.0,
                    };
                    if damage > 0.0 {
                        let amount = usable_qi.min(target.entity.hp / (damage / 100.0));
                        return use_technique(technique, target_id, 0.0, amount, 0.0);
                    }
                }
            }
        }
    }
    attack
}

/// Move `participant` relative to `target` under `intent`.
///
/// Movement range is agility scaled by the hp fraction left. Aggressive
/// combatants step in, snapping onto the target when it is within range;
/// cautious ones step straight back, careful ones half as far.
pub fn move_according_to_intent(participant: &mut CombatState, target: Vector, intent: Intent) {
    let offset = target - participant.position;
    let distance = offset.length();
    if distance == 0.0 {
        return;
    }
    let direction = offset / distance;
    let max_hp = participant.entity.max_hp();
    let hp_fraction = if max_hp > 0.0 {
        participant.entity.hp / max_hp
    } else {
        0.0
    };
    let reach = participant.get_stat(StatKind::Agility) * hp_fraction;

    match intent {
        Intent::Aggressive => {
            if distance <= reach {
                participant.position = target;
            } else {
                participant.position += direction * reach;
            }
        }
        Intent::Cautious => participant.position += direction * -reach,
        Intent::Careful => participant.position += direction * (-reach * 0.5),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combat::TeamSlot;
    use crate::cultivation::{Cultivation, QiReserves};
    use crate::entity::{Entity, EntityKind};
    use crate::packets::{ActionKind, DamageType, EffectPacket, ModifierAttribute, ModifierPacket};
    use crate::world_time::WorldTimestamp;
    use crate::stats::Stats;
    use crate::technique::{PhaseOutput, PhysicalPhase, QiPhase, RangedQi, SoulPhase};
    use crate::technique::AreaType;

    fn state(vitality: f64, agility: f64) -> CombatState {
        let entity = Entity::new(
            "c",
            "Combatant",
            EntityKind::Human,
            Stats::new(vitality, 5.0, agility, 2.0, 1.0, 0.0),
        );
        CombatState::new(entity, "team_1", TeamSlot(1), Vector::ZERO)
    }

    fn physical(name: &str, damage_points: f64) -> Technique {
        Technique::new(name).with_physical(PhysicalPhase {
            weapon_required: None,
            damage_type: DamageType::Slash,
            damage_points,
            speed_points: 20.0,
            precision_points: 10.0,
            crit_points: 0.0,
            output: PhaseOutput::default(),
        })
    }

    fn ranged(name: &str, damage_points: f64, speed_points: f64) -> Technique {
        Technique::new(name).with_qi(QiPhase {
            effect: QiEffect::Ranged(RangedQi {
                damage_points,
                speed_points,
                crit_points: 0.0,
                precision_points: 5.0,
                range_points: 20.0,
                area_of_effect_points: 5.0,
                damage_type: DamageType::Pierce,
                area_type: AreaType::Bullet,
            }),
            output: PhaseOutput::default(),
        })
    }

    fn buff(name: &str, effect_type: SoulEffectType, strength: f64) -> Technique {
        Technique::new(name).with_soul(SoulPhase {
            effect_class: EffectClass::Buff,
            effect_type,
            strength,
            duration: 40.0,
            output: PhaseOutput::default(),
        })
    }

    #[test]
    fn test_intent_thresholds() {
        let strong = state(10.0, 5.0);
        let mut weak = state(10.0, 5.0);

        assert_eq!(Intent::choose(&weak, &strong), Intent::Aggressive);
        weak.entity.hp = 400.0;
        assert_eq!(Intent::choose(&weak, &strong), Intent::Aggressive);
        weak.entity.hp = 250.0;
        assert_eq!(Intent::choose(&weak, &strong), Intent::Careful);
        weak.entity.hp = 125.0;
        assert_eq!(Intent::choose(&weak, &strong), Intent::Cautious);
        // Winning the hp race is always aggressive.
        assert_eq!(Intent::choose(&strong, &weak), Intent::Aggressive);
    }

    #[test]
    fn test_understand_keeps_first_on_ties() {
        let techniques = vec![
            physical("first", 50.0),
            physical("second", 50.0),
            physical("third", 60.0),
            ranged("slow", 40.0, 10.0),
            ranged("fast", 30.0, 30.0),
        ];
        let insight = TechniqueInsight::understand(&techniques);
        assert_eq!(insight.most_damaging_physical.map(|t| t.name.as_str()), Some("third"));
        assert_eq!(insight.most_damaging_ranged_technique.map(|t| t.name.as_str()), Some("slow"));
        assert_eq!(insight.fastest_qi_technique.map(|t| t.name.as_str()), Some("fast"));
        assert_eq!(insight.most_range_technique.map(|t| t.name.as_str()), Some("slow"));
        assert!(insight.strongest_defense_technique.is_none());

        let ties = vec![physical("a", 50.0), physical("b", 50.0)];
        let insight = TechniqueInsight::understand(&ties);
        assert_eq!(insight.most_damaging_physical.map(|t| t.name.as_str()), Some("a"));
    }

    #[test]
    fn test_understand_soul_categories() {
        let techniques = vec![
            buff("quick", SoulEffectType::AgilityMult, 20.0),
            buff("quicker", SoulEffectType::AgilityMult, 30.0),
            buff("mighty", SoulEffectType::StrengthMult, 10.0),
        ];
        let insight = TechniqueInsight::understand(&techniques);
        assert_eq!(insight.strongest_speed_buff.map(|t| t.name.as_str()), Some("quicker"));
        assert_eq!(insight.strongest_strength_buff.map(|t| t.name.as_str()), Some("mighty"));
        assert!(insight.strongest_speed_debuff.is_none());
    }

    #[test]
    fn test_no_techniques_attacks() {
        let own = state(2.0, 5.0);
        let target = state(2.0, 5.0);
        let action = generate_action(
            &own,
            CombatantId(0),
            &target,
            CombatantId(1),
            Intent::Aggressive,
            &CombatConfig::default(),
        );
        assert_eq!(action, ActionPacket::attack(CombatantId(0), CombatantId(1)));
    }

    #[test]
    fn test_physical_bias_sizes_stamina_to_target_agility() {
        let mut own = state(2.0, 5.0);
        own.entity.techniques.push(physical("palm", 50.0));
        let target = state(2.0, 8.0);

        let action = generate_action(
            &own,
            CombatantId(0),
            &target,
            CombatantId(1),
            Intent::Aggressive,
            &CombatConfig::default(),
        );
        assert_eq!(action.action, ActionKind::Technique);
        // target agility 8 * speed 20 / 100
        assert!((action.stamina.unwrap() - 1.6).abs() < 1e-12);
        assert_eq!(action.qi, Some(0.0));
        assert_eq!(action.soul, Some(0.0));
        assert_eq!(action.target, CombatantId(1));
    }

    #[test]
    fn test_cautious_soul_bias_buffs_self_while_not_active() {
        let mut own = state(2.0, 5.0);
        own.entity.stamina = 0.0;
        own.entity.cultivation = Cultivation::new(QiReserves::default(), 50.0);
        own.entity
            .techniques
            .push(buff("quick", SoulEffectType::AgilityMult, 20.0));
        // A neutral entry, as an expired buff leaves behind, is not a running buff.
        own.modifier_pool
            .add(ModifierPacket::new(ModifierAttribute::AgilityMult, 0.0));
        let target = state(2.0, 5.0);
        let config = CombatConfig::default();
        let decide = |own: &CombatState| {
            generate_action(
                own,
                CombatantId(0),
                &target,
                CombatantId(1),
                Intent::Cautious,
                &config,
            )
        };

        let action = decide(&own);
        assert_eq!(action.action, ActionKind::Technique);
        assert_eq!(action.target, CombatantId(0));
        // total stats 2 + 2 + 5 + 5 = 14, duration 40 -> 5.6 soul
        assert!((action.soul.unwrap() - 5.6).abs() < 1e-12);

        let effect = EffectPacket {
            effect_class: EffectClass::Buff,
            effect_type: SoulEffectType::AgilityMult,
            strength: 0.2,
            origin: CombatantId(0),
            ending_time: WorldTimestamp::new(10),
        };
        effect.apply(&mut own.modifier_pool);
        own.effects.add(effect);
        assert_eq!(decide(&own).action, ActionKind::Attack);

        own.effects
            .refresh(WorldTimestamp::new(10), &mut own.modifier_pool);
        assert!(own.effects.is_empty());
        let action = decide(&own);
        assert_eq!(action.action, ActionKind::Technique);
        assert_eq!(action.target, CombatantId(0));
    }

    #[test]
    fn test_aggressive_moves_and_snaps() {
        let mut own = state(2.0, 5.0);
        move_according_to_intent(&mut own, Vector::new(0.0, 20.0), Intent::Aggressive);
        assert_eq!(own.position, Vector::new(0.0, 5.0));
        move_according_to_intent(&mut own, Vector::new(0.0, 9.0), Intent::Aggressive);
        assert_eq!(own.position, Vector::new(0.0, 9.0));
    }

    #[test]
    fn test_retreat_scales_with_hp() {
        let mut cautious = state(2.0, 10.0);
        cautious.entity.hp = 50.0;
        move_according_to_intent(&mut cautious, Vector::new(10.0, 0.0), Intent::Cautious);
        assert_eq!(cautious.position, Vector::new(-5.0, 0.0));

        let mut careful = state(2.0, 10.0);
        careful.entity.hp = 50.0;
        move_according_to_intent(&mut careful, Vector::new(10.0, 0.0), Intent::Careful);
        assert_eq!(careful.position, Vector::new(-2.5, 0.0));
    }

    #[test]
    fn test_no_movement_on_top_of_target() {
        let mut own = state(2.0, 5.0);
        move_according_to_intent(&mut own, Vector::ZERO, Intent::Cautious);
        assert_eq!(own.position, Vector::ZERO);
    }
}
