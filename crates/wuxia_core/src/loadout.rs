//! Equipped weapon and armour.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::packets::{DamagePacket, DamageType, ModifierAttribute, ModifierPacket};

/// Equipment slot.
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
pub enum LoadoutSlot {
    /// Held weapon.
    Weapon,
    /// Head armour.
    Helmet,
    /// Torso armour.
    Chestplate,
    /// Leg armour.
    Leggings,
    /// Foot armour.
    Boots,
}

impl LoadoutSlot {
    /// Slots that hold armour.
    pub const ARMOR: [Self; 4] = [Self::Helmet, Self::Chestplate, Self::Leggings, Self::Boots];
}

/// Close-quarters weapon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeleeWeapon {
    /// Display name.
    pub name: String,
    /// Base damage by type.
    pub damage: DamagePacket,
    /// Tags techniques can require.
    #[serde(default)]
    pub tags: Vec<String>,
    /// Bonuses granted while equipped.
    #[serde(default)]
    pub modifiers: BTreeMap<ModifierAttribute, f64>,
}

/// Projectile weapon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RangedWeapon {
    /// Display name.
    pub name: String,
    /// Pierce damage per shot.
    pub base_damage: f64,
    /// Tags techniques can require.
    #[serde(default)]
    pub tags: Vec<String>,
    /// Bonuses granted while equipped.
    #[serde(default)]
    pub modifiers: BTreeMap<ModifierAttribute, f64>,
}

/// A weapon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Weapon {
    /// Melee weapon.
    Melee(MeleeWeapon),
    /// Ranged weapon.
    Ranged(RangedWeapon),
}

impl Weapon {
    /// Weapon tags.
    #[must_use]
    pub fn tags(&self) -> &[String] {
        match self {
            Self::Melee(weapon) => &weapon.tags,
            Self::Ranged(weapon) => &weapon.tags,
        }
    }

    /// Bonuses granted while equipped.
    #[must_use]
    pub fn modifiers(&self) -> &BTreeMap<ModifierAttribute, f64> {
        match self {
            Self::Melee(weapon) => &weapon.modifiers,
            Self::Ranged(weapon) => &weapon.modifiers,
        }
    }

    /// Pool attribute that scales this weapon's attacks.
    #[must_use]
    pub const fn damage_modifier(&self) -> ModifierAttribute {
        match self {
            Self::Melee(_) => ModifierAttribute::MeleeWeaponsDamage,
            Self::Ranged(_) => ModifierAttribute::RangedWeaponsDamage,
        }
    }
}

/// Armour piece.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Armor {
    /// Display name.
    pub name: String,
    /// Defense by damage type at full durability.
    pub defense: DamagePacket,
    /// Maximum durability.
    pub durability: f64,
    /// Remaining durability.
    pub current_durability: f64,
    /// Bonuses granted while equipped.
    #[serde(default)]
    pub modifiers: BTreeMap<ModifierAttribute, f64>,
}

impl Armor {
    /// Fraction of durability remaining.
    #[must_use]
    pub fn condition(&self) -> f64 {
        if self.durability <= 0.0 {
            return 0.0;
        }
        self.current_durability / self.durability
    }
}

/// Everything an entity has equipped.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Loadout {
    /// Weapon slot.
    #[serde(default)]
    pub weapon: Option<Weapon>,
    /// Helmet slot.
    #[serde(default)]
    pub helmet: Option<Armor>,
    /// Chestplate slot.
    #[serde(default)]
    pub chestplate: Option<Armor>,
    /// Leggings slot.
    #[serde(default)]
    pub leggings: Option<Armor>,
    /// Boots slot.
    #[serde(default)]
    pub boots: Option<Armor>,
}

impl Loadout {
    /// Armour in a slot. Always `None` for [`LoadoutSlot::Weapon`].
    #[must_use]
    pub fn armor(&self, slot: LoadoutSlot) -> Option<&Armor> {
        match slot {
            LoadoutSlot::Weapon => None,
            LoadoutSlot::Helmet => self.helmet.as_ref(),
            LoadoutSlot::Chestplate => self.chestplate.as_ref(),
            LoadoutSlot::Leggings => self.leggings.as_ref(),
            LoadoutSlot::Boots => self.boots.as_ref(),
        }
    }

    fn armor_mut(&mut self, slot: LoadoutSlot) -> Option<&mut Armor> {
        match slot {
            LoadoutSlot::Weapon => None,
            LoadoutSlot::Helmet => self.helmet.as_mut(),
            LoadoutSlot::Chestplate => self.chestplate.as_mut(),
            LoadoutSlot::Leggings => self.leggings.as_mut(),
            LoadoutSlot::Boots => self.boots.as_mut(),
        }
    }

    fn armor_pieces(&self) -> impl Iterator<Item = &Armor> {
        LoadoutSlot::ARMOR
            .into_iter()
            .filter_map(|slot| self.armor(slot))
    }

    /// Gear multiplier for an attribute: 1 plus every armour bonus for it.
    #[must_use]
    pub fn gear_multiplier(&self, attribute: ModifierAttribute) -> f64 {
        1.0 + self
            .armor_pieces()
            .filter_map(|armor| armor.modifiers.get(&attribute))
            .sum::<f64>()
    }

    /// Bonuses from every equipped item.
    #[must_use]
    pub fn modifier_packets(&self) -> Vec<ModifierPacket> {
        let weapon_modifiers = self.weapon.iter().flat_map(|weapon| weapon.modifiers());
        let armor_modifiers = self.armor_pieces().flat_map(|armor| armor.modifiers.iter());
        weapon_modifiers
            .chain(armor_modifiers)
            .map(|(&attribute, &bonus)| ModifierPacket::new(attribute, bonus))
            .collect()
    }

    /// Armour defense by damage type, scaled by each piece's condition.
    #[must_use]
    pub fn defense(&self) -> DamagePacket {
        self.armor_pieces()
            .fold(DamagePacket::default(), |total, armor| {
                total + armor.defense.scaled(armor.condition())
            })
    }

    /// Weapon damage, with melee damage scaled by armour damage multipliers.
    #[must_use]
    pub fn weapon_damage(&self) -> Option<DamagePacket> {
        match self.weapon.as_ref()? {
            Weapon::Ranged(weapon) => {
                Some(DamagePacket::of(DamageType::Pierce, weapon.base_damage))
            }
            Weapon::Melee(weapon) => {
                let mut damage = weapon.damage;
                for damage_type in DamageType::ALL {
                    *damage.get_mut(damage_type) *=
                        self.gear_multiplier(ModifierAttribute::for_damage_type(damage_type));
                }
                Some(damage)
            }
        }
    }

    /// Spread `damage` evenly as durability loss over intact armour.
    pub fn wear(&mut self, damage: f64) {
        let intact: Vec<LoadoutSlot> = LoadoutSlot::ARMOR
            .into_iter()
            .filter(|&slot| {
                self.armor(slot)
                    .is_some_and(|armor| armor.current_durability > 0.0)
            })
            .collect();
        if intact.is_empty() {
            return;
        }

        let share = damage / intact.len() as f64;
        for slot in intact {
            if let Some(armor) = self.armor_mut(slot) {
                armor.current_durability = (armor.current_durability - share).max(0.0);
            }
        }
    }
}
