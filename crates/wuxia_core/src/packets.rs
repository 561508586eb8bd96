//! Value types passed between combatants while an action resolves.
//!
//! - [`DamagePacket`] - damage split by [`DamageType`]
//! - [`DefensePacket`] - a shield on a combatant's defense stack
//! - [`ModifierPacket`] / [`ModifierPacketPool`] - named stat adjustments
//! - [`EffectPacket`] - a timed soul effect
//! - [`ActionPacket`] - a request to resolve an attack or technique

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::combat::CombatantId;
use crate::error::{CombatError, Result};
use crate::technique::Technique;
use crate::world_time::WorldTimestamp;

// ============================================================================
// Damage
// ============================================================================

/// Physical damage category.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum DamageType {
    /// Cutting damage.
    Slash,
    /// Piercing damage.
    Pierce,
    /// Blunt damage.
    Crush,
}

impl DamageType {
    /// Every damage type, in declaration order.
    pub const ALL: [Self; 3] = [Self::Slash, Self::Pierce, Self::Crush];

    /// Order in which shields absorb damage types.
    pub const ABSORB_ORDER: [Self; 3] = [Self::Crush, Self::Slash, Self::Pierce];
}

/// Damage split by type.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct DamagePacket {
    /// Slash damage.
    pub slash: f64,
    /// Pierce damage.
    pub pierce: f64,
    /// Crush damage.
    pub crush: f64,
}

impl DamagePacket {
    /// Create a damage packet.
    #[must_use]
    pub const fn new(slash: f64, pierce: f64, crush: f64) -> Self {
        Self {
            slash,
            pierce,
            crush,
        }
    }

    /// A packet carrying `amount` of a single damage type.
    #[must_use]
    pub fn of(damage_type: DamageType, amount: f64) -> Self {
        let mut packet = Self::default();
        *packet.get_mut(damage_type) = amount;
        packet
    }

    /// Damage of one type.
    #[must_use]
    pub fn get(&self, damage_type: DamageType) -> f64 {
        match damage_type {
            DamageType::Slash => self.slash,
            DamageType::Pierce => self.pierce,
            DamageType::Crush => self.crush,
        }
    }

    /// Mutable damage of one type.
    pub fn get_mut(&mut self, damage_type: DamageType) -> &mut f64 {
        match damage_type {
            DamageType::Slash => &mut self.slash,
            DamageType::Pierce => &mut self.pierce,
            DamageType::Crush => &mut self.crush,
        }
    }

    /// Sum of all damage types.
    #[must_use]
    pub fn total(&self) -> f64 {
        self.slash + self.pierce + self.crush
    }

    /// Every component multiplied by `factor`.
    #[must_use]
    pub fn scaled(&self, factor: f64) -> Self {
        Self::new(self.slash * factor, self.pierce * factor, self.crush * factor)
    }
}

impl std::ops::Add for DamagePacket {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self::new(
            self.slash + rhs.slash,
            self.pierce + rhs.pierce,
            self.crush + rhs.crush,
        )
    }
}

// ============================================================================
// Defense
// ============================================================================

/// A shield that absorbs incoming damage.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DefensePacket {
    /// Remaining absorption.
    pub strength: f64,
    /// Damage of one type the shield can stop per hit before it starts leaking.
    pub penetration_resistance: f64,
    /// Fraction of strength lost per decay step.
    pub decay: f64,
}

impl DefensePacket {
    /// Create a shield.
    #[must_use]
    pub const fn new(strength: f64, penetration_resistance: f64, decay: f64) -> Self {
        Self {
            strength,
            penetration_resistance,
            decay,
        }
    }

    /// Absorb damage in place, type by type in [`DamageType::ABSORB_ORDER`].
    ///
    /// A weak shield (strength at or below its penetration resistance) that
    /// faces more damage than it has left lets the overflow through and is
    /// emptied; once empty it absorbs nothing further.
    pub fn take_damage(&mut self, damage: &mut DamagePacket) {
        for damage_type in DamageType::ABSORB_ORDER {
            let amount = damage.get_mut(damage_type);
            if self.strength == 0.0 {
                break;
            }
            if self.strength <= self.penetration_resistance && self.strength < *amount {
                *amount -= self.strength;
                self.strength = 0.0;
                break;
            }
            if self.penetration_resistance - *amount >= 0.0 {
                self.strength -= *amount;
                *amount = 0.0;
            } else {
                self.strength -= self.penetration_resistance;
                *amount -= self.penetration_resistance;
            }
        }
    }

    /// Lose `decay` of the remaining strength.
    pub fn process_decay(&mut self) {
        self.strength -= self.strength * self.decay;
        if self.strength <= 0.0 {
            self.strength = 0.0;
        }
    }

    /// Whether the shield has nothing left to absorb.
    #[must_use]
    pub fn is_depleted(&self) -> bool {
        self.strength <= 0.0
    }
}

// ============================================================================
// Modifiers
// ============================================================================

/// Attribute a modifier adjusts.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum ModifierAttribute {
    /// Melee weapon damage multiplier.
    MeleeWeaponsDamage,
    /// Ranged weapon damage multiplier.
    RangedWeaponsDamage,
    /// Melee technique damage multiplier.
    MeleeTechniqueDamage,
    /// Ranged technique damage multiplier.
    RangedTechniqueDamage,
    /// Stamina regeneration multiplier.
    StaminaRegen,
    /// Qi regeneration multiplier.
    QiRegen,
    /// Soul regeneration multiplier.
    SoulRegen,
    /// Essence regeneration multiplier.
    EssenceRegen,
    /// Strength multiplier.
    StrengthMult,
    /// Vitality multiplier.
    VitalityMult,
    /// Agility multiplier.
    AgilityMult,
    /// Endurance multiplier.
    EnduranceMult,
    /// Slash damage multiplier from gear.
    SlashDamageMult,
    /// Pierce damage multiplier from gear.
    PierceDamageMult,
    /// Crush damage multiplier from gear.
    CrushDamageMult,
    /// Physical technique point pool.
    PhysicalTechniquePoints,
    /// Qi technique point pool.
    QiTechniquePoints,
    /// Soul technique point pool.
    SoulTechniquePoints,
}

impl ModifierAttribute {
    /// Whether the attribute is a point pool summed directly rather than a
    /// multiplier around 1.0.
    #[must_use]
    pub const fn is_additive(self) -> bool {
        matches!(
            self,
            Self::PhysicalTechniquePoints | Self::QiTechniquePoints | Self::SoulTechniquePoints
        )
    }

    /// Value of an attribute nobody has modified.
    #[must_use]
    pub const fn neutral(self) -> f64 {
        if self.is_additive() {
            0.0
        } else {
            1.0
        }
    }

    /// Gear damage multiplier for a damage type.
    #[must_use]
    pub const fn for_damage_type(damage_type: DamageType) -> Self {
        match damage_type {
            DamageType::Slash => Self::SlashDamageMult,
            DamageType::Pierce => Self::PierceDamageMult,
            DamageType::Crush => Self::CrushDamageMult,
        }
    }
}

/// A named adjustment.
///
/// Packets handed to [`ModifierPacketPool::add`] carry a bonus (`0.1` is
/// +10%). Packets held by a pool carry the effective value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModifierPacket {
    /// Attribute adjusted.
    pub attribute: ModifierAttribute,
    /// Bonus or effective value.
    pub modifier: f64,
}

impl ModifierPacket {
    /// Create a modifier.
    #[must_use]
    pub const fn new(attribute: ModifierAttribute, modifier: f64) -> Self {
        Self {
            attribute,
            modifier,
        }
    }

    /// Merge another bonus for the same attribute into this one.
    ///
    /// # Errors
    ///
    /// Returns [`CombatError::ModifierMismatch`] if the attributes differ.
    pub fn add(&mut self, other: &Self) -> Result<()> {
        if self.attribute != other.attribute {
            return Err(CombatError::ModifierMismatch {
                left: self.attribute.to_string(),
                right: other.attribute.to_string(),
            });
        }
        self.modifier += other.modifier;
        Ok(())
    }

    /// Remove `amount`, flooring at zero.
    pub fn subtract(&mut self, amount: f64) {
        self.modifier = (self.modifier - amount).max(0.0);
    }

    /// Scale a plain value.
    #[must_use]
    pub fn apply(&self, value: f64) -> f64 {
        value * self.modifier
    }

    /// Scale every component of a damage packet.
    #[must_use]
    pub fn apply_to_damage(&self, damage: &DamagePacket) -> DamagePacket {
        damage.scaled(self.modifier)
    }
}

/// Active modifiers, at most one per attribute.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModifierPacketPool {
    modifiers: BTreeMap<ModifierAttribute, ModifierPacket>,
}

impl ModifierPacketPool {
    /// Create an empty pool.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a bonus, merging with any packet already held for the
    /// attribute.
    pub fn add(&mut self, bonus: ModifierPacket) {
        let held = self
            .modifiers
            .entry(bonus.attribute)
            .or_insert_with(|| ModifierPacket::new(bonus.attribute, bonus.attribute.neutral()));
        held.modifier += bonus.modifier;
    }

    /// Unregister a bonus previously added, flooring at zero.
    ///
    /// A missing attribute is created at its neutral value first.
    pub fn withdraw(&mut self, attribute: ModifierAttribute, amount: f64) {
        self.modifiers
            .entry(attribute)
            .or_insert_with(|| ModifierPacket::new(attribute, attribute.neutral()))
            .subtract(amount);
    }

    /// Packet held for an attribute.
    #[must_use]
    pub fn get(&self, attribute: ModifierAttribute) -> Option<&ModifierPacket> {
        self.modifiers.get(&attribute)
    }

    /// Whether any packet is held for an attribute.
    #[must_use]
    pub fn contains(&self, attribute: ModifierAttribute) -> bool {
        self.modifiers.contains_key(&attribute)
    }

    /// Effective value of an attribute, neutral if absent.
    #[must_use]
    pub fn value(&self, attribute: ModifierAttribute) -> f64 {
        self.get(attribute)
            .map_or(attribute.neutral(), |packet| packet.modifier)
    }

    /// Number of attributes held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.modifiers.len()
    }

    /// Whether the pool is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.modifiers.is_empty()
    }

    /// Iterate held packets in attribute order.
    pub fn iter(&self) -> impl Iterator<Item = &ModifierPacket> {
        self.modifiers.values()
    }
}

// ============================================================================
// Effects
// ============================================================================

/// Broad category of a soul effect.
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
pub enum EffectClass {
    /// Raises a stat for a while.
    Buff,
    /// Lowers a stat for a while.
    Debuff,
    /// Drains a resource every tick.
    Utility,
}

/// What a soul effect does.
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
pub enum SoulEffectType {
    /// Scales strength.
    StrengthMult,
    /// Scales agility.
    AgilityMult,
    /// Drains hp.
    StealVitality,
    /// Drains stamina.
    StealEndurance,
    /// Drains usable qi.
    StealQi,
}

impl SoulEffectType {
    /// Modifier registered by a buff or debuff of this type.
    #[must_use]
    pub const fn modifier_attribute(self) -> Option<ModifierAttribute> {
        match self {
            Self::StrengthMult => Some(ModifierAttribute::StrengthMult),
            Self::AgilityMult => Some(ModifierAttribute::AgilityMult),
            Self::StealVitality | Self::StealEndurance | Self::StealQi => None,
        }
    }

    /// Whether techniques may pair this type with `class`.
    #[must_use]
    pub const fn allowed_for(self, class: EffectClass) -> bool {
        match class {
            EffectClass::Buff | EffectClass::Debuff => self.modifier_attribute().is_some(),
            EffectClass::Utility => self.modifier_attribute().is_none(),
        }
    }
}

/// A timed effect held in a combatant's effect pool.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EffectPacket {
    /// Category.
    pub effect_class: EffectClass,
    /// What it does.
    pub effect_type: SoulEffectType,
    /// Magnitude.
    pub strength: f64,
    /// Combatant that cast it.
    pub origin: CombatantId,
    /// World time at which it expires.
    pub ending_time: WorldTimestamp,
}

impl EffectPacket {
    /// Register this effect's modifier, if it has one.
    pub fn apply(&self, pool: &mut ModifierPacketPool) {
        if let Some(attribute) = self.effect_type.modifier_attribute() {
            pool.add(ModifierPacket::new(attribute, self.strength));
        }
    }

    /// Whether the effect has run out at `now`.
    #[must_use]
    pub fn has_ended(&self, now: WorldTimestamp) -> bool {
        now >= self.ending_time
    }
}

// ============================================================================
// Actions
// ============================================================================

/// Kind of action a combatant can take.
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
pub enum ActionKind {
    /// Innate weapon or fist attack.
    Attack,
    /// Technique use.
    Technique,
    /// Register a modifier directly.
    AddModifier,
}

impl ActionKind {
    /// Parse an action name.
    ///
    /// # Errors
    ///
    /// Returns [`CombatError::UnknownAction`] for any other name.
    pub fn parse(name: &str) -> Result<Self> {
        name.parse()
            .map_err(|_| CombatError::UnknownAction(name.to_string()))
    }
}

/// A requested action.
#[derive(Debug, Clone, PartialEq)]
pub struct ActionPacket {
    /// Action kind.
    pub action: ActionKind,
    /// Acting combatant.
    pub origin: CombatantId,
    /// Combatant acted upon.
    pub target: CombatantId,
    /// Technique used, for technique actions.
    pub technique: Option<Technique>,
    /// Stamina committed to the physical phase.
    pub stamina: Option<f64>,
    /// Qi committed to the qi phase.
    pub qi: Option<f64>,
    /// Soul committed to the soul phase.
    pub soul: Option<f64>,
}

impl ActionPacket {
    /// A plain attack.
    #[must_use]
    pub const fn attack(origin: CombatantId, target: CombatantId) -> Self {
        Self {
            action: ActionKind::Attack,
            origin,
            target,
            technique: None,
            stamina: None,
            qi: None,
            soul: None,
        }
    }

    /// A technique use with no resources committed yet.
    #[must_use]
    pub fn technique(origin: CombatantId, target: CombatantId, technique: Technique) -> Self {
        Self {
            action: ActionKind::Technique,
            origin,
            target,
            technique: Some(technique),
            stamina: None,
            qi: None,
            soul: None,
        }
    }

    /// Commit stamina.
    #[must_use]
    pub fn with_stamina(mut self, stamina: f64) -> Self {
        self.stamina = Some(stamina);
        self
    }

    /// Commit qi.
    #[must_use]
    pub fn with_qi(mut self, qi: f64) -> Self {
        self.qi = Some(qi);
        self
    }

    /// Commit soul.
    #[must_use]
    pub fn with_soul(mut self, soul: f64) -> Self {
        self.soul = Some(soul);
        self
    }
}
