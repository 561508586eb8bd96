//! Player progression state that feeds combat modifiers.

use serde::{Deserialize, Serialize};

use crate::packets::{ModifierAttribute, ModifierPacket};

/// Player skill state relevant to combat.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SkillState {
    /// Physical technique points.
    pub physical_technique_points: f64,
    /// Qi technique points.
    pub qi_technique_points: f64,
    /// Soul technique points.
    pub soul_technique_points: f64,
    /// Strength multiplier.
    pub strength_mult: f64,
    /// Agility multiplier.
    pub agility_mult: f64,
    /// Stamina regeneration multiplier.
    pub stamina_regen_mult: f64,
    /// Qi regeneration multiplier.
    pub qi_regen_mult: f64,
    /// Soul regeneration multiplier.
    pub soul_regen_mult: f64,
    /// Essence regeneration multiplier.
    pub essence_regen_mult: f64,
    /// Melee weapon damage multiplier.
    pub melee_weapons_damage: f64,
    /// Ranged weapon damage multiplier.
    pub ranged_weapons_damage: f64,
}

impl Default for SkillState {
    fn default() -> Self {
        Self {
            physical_technique_points: 100.0,
            qi_technique_points: 100.0,
            soul_technique_points: 100.0,
            strength_mult: 1.0,
            agility_mult: 1.0,
            stamina_regen_mult: 1.0,
            qi_regen_mult: 1.0,
            soul_regen_mult: 1.0,
            essence_regen_mult: 1.0,
            melee_weapons_damage: 1.0,
            ranged_weapons_damage: 1.0,
        }
    }
}

impl SkillState {
    /// Modifier bonuses this skill state grants.
    ///
    /// Multipliers become bonuses relative to 1.0; point pools pass through.
    #[must_use]
    pub fn modifier_packets(&self) -> Vec<ModifierPacket> {
        let values = [
            (ModifierAttribute::PhysicalTechniquePoints, self.physical_technique_points),
            (ModifierAttribute::QiTechniquePoints, self.qi_technique_points),
            (ModifierAttribute::SoulTechniquePoints, self.soul_technique_points),
            (ModifierAttribute::StrengthMult, self.strength_mult),
            (ModifierAttribute::AgilityMult, self.agility_mult),
            (ModifierAttribute::StaminaRegen, self.stamina_regen_mult),
            (ModifierAttribute::QiRegen, self.qi_regen_mult),
            (ModifierAttribute::SoulRegen, self.soul_regen_mult),
            (ModifierAttribute::EssenceRegen, self.essence_regen_mult),
            (ModifierAttribute::MeleeWeaponsDamage, self.melee_weapons_damage),
            (ModifierAttribute::RangedWeaponsDamage, self.ranged_weapons_damage),
        ];
        values
            .into_iter()
            .map(|(attribute, value)| {
                ModifierPacket::new(attribute, value - attribute.neutral())
            })
            .collect()
    }
}
