//! World entities as combat sees them.
//!
//! An [`Entity`] outlives any single combat: combat borrows it into a
//! [`CombatState`](crate::combat::CombatState) and hands it back with hp and
//! resources changed.

use serde::{Deserialize, Serialize};

use crate::cultivation::Cultivation;
use crate::loadout::Loadout;
use crate::packets::{DamagePacket, DamageType};
use crate::skills::SkillState;
use crate::stats::{StatKind, Stats};
use crate::technique::Technique;

/// Tag carried by every player entity.
pub const PLAYER_TAG: &str = "Player";

/// Broad kind of entity.
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
pub enum EntityKind {
    /// Animal or monster.
    Beast,
    /// Person.
    Human,
    /// The player character.
    Player,
}

impl EntityKind {
    /// Tags every entity of this kind carries.
    #[must_use]
    pub fn default_tags(self) -> Vec<String> {
        match self {
            Self::Beast => vec!["Beast".to_string()],
            Self::Human => vec!["Human".to_string()],
            Self::Player => vec!["Human".to_string(), PLAYER_TAG.to_string()],
        }
    }
}

fn alive() -> bool {
    true
}

/// A world entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    /// Unique identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Kind of entity.
    pub kind: EntityKind,
    /// Descriptive tags used for team assignment.
    #[serde(default)]
    pub tags: Vec<String>,
    /// Current hit points.
    pub hp: f64,
    /// Current stamina.
    pub stamina: f64,
    /// Whether the entity is alive.
    #[serde(default = "alive")]
    pub is_alive: bool,
    /// Base stats.
    pub stats: Stats,
    /// Qi and soul reserves.
    #[serde(default)]
    pub cultivation: Cultivation,
    /// Equipped items.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loadout: Option<Loadout>,
    /// Player skills.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skills: Option<SkillState>,
    /// Known techniques.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub techniques: Vec<Technique>,
}

impl Entity {
    /// Create an entity at full hp and stamina with its kind's tags.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        kind: EntityKind,
        stats: Stats,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            kind,
            tags: kind.default_tags(),
            hp: stats.max_hp(),
            stamina: stats.max_stamina(),
            is_alive: true,
            skills: (kind == EntityKind::Player).then(SkillState::default),
            stats,
            cultivation: Cultivation::default(),
            loadout: None,
            techniques: Vec::new(),
        }
    }

    /// Set cultivation.
    #[must_use]
    pub fn with_cultivation(mut self, cultivation: Cultivation) -> Self {
        self.cultivation = cultivation;
        self
    }

    /// Set loadout.
    #[must_use]
    pub fn with_loadout(mut self, loadout: Loadout) -> Self {
        self.loadout = Some(loadout);
        self
    }

    /// Add a technique.
    #[must_use]
    pub fn with_technique(mut self, technique: Technique) -> Self {
        self.techniques.push(technique);
        self
    }

    /// Add a tag.
    #[must_use]
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    /// Whether this is the player character.
    #[must_use]
    pub fn is_player(&self) -> bool {
        self.kind == EntityKind::Player
    }

    /// Whether the entity carries every tag in `tags`.
    #[must_use]
    pub fn has_all_tags(&self, tags: &[String]) -> bool {
        tags.iter().all(|tag| self.tags.contains(tag))
    }

    /// Maximum hit points.
    #[must_use]
    pub fn max_hp(&self) -> f64 {
        self.stats.max_hp()
    }

    /// Maximum stamina.
    #[must_use]
    pub fn max_stamina(&self) -> f64 {
        self.stats.max_stamina()
    }

    /// Subtract hp, marking the entity dead at zero.
    pub fn lose_hp(&mut self, amount: f64) {
        self.hp = (self.hp - amount).max(0.0);
        if self.hp <= 0.0 {
            self.is_alive = false;
        }
    }

    /// Take a hit after armour.
    ///
    /// Armour stops up to its defense per damage type; the loadout then
    /// wears by the full incoming amount.
    pub fn take_damage(&mut self, damage: DamagePacket) {
        let incoming = damage.total();
        let through = match self.loadout.as_mut() {
            Some(loadout) => {
                let defense = loadout.defense();
                let through: f64 = DamageType::ALL
                    .into_iter()
                    .map(|kind| (damage.get(kind) - defense.get(kind)).max(0.0))
                    .sum();
                loadout.wear(incoming);
                through
            }
            None => incoming,
        };
        self.hp -= through;
        if self.hp <= 0.0 {
            self.is_alive = false;
        }
    }

    /// Damage of an innate attack.
    ///
    /// Unarmed attacks crush for the entity's strength. Armed attacks deal
    /// weapon damage plus strength split in the weapon's damage proportions.
    #[must_use]
    pub fn damage(&self) -> DamagePacket {
        let strength = self.stats.get(StatKind::Strength);
        let Some(weapon_damage) = self.loadout.as_ref().and_then(Loadout::weapon_damage) else {
            return DamagePacket::of(DamageType::Crush, strength);
        };

        let total = weapon_damage.total();
        if total <= 0.0 {
            return DamagePacket::of(DamageType::Crush, strength);
        }
        let mut damage = weapon_damage;
        for damage_type in DamageType::ALL {
            let share = weapon_damage.get(damage_type) / total;
            *damage.get_mut(damage_type) += share * strength;
        }
        damage
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loadout::{Armor, MeleeWeapon, Weapon};
    use std::collections::BTreeMap;

    fn brawler() -> Entity {
        Entity::new("b1", "Brawler", EntityKind::Human, Stats::new(2.0, 10.0, 5.0, 2.0, 1.0, 0.0))
    }

    #[test]
    fn test_new_entity_is_at_full_pools() {
        let entity = brawler();
        assert_eq!(entity.hp, 100.0);
        assert_eq!(entity.stamina, 70.0);
        assert!(entity.is_alive);
        assert!(entity.skills.is_none());
        assert!(entity.has_all_tags(&["Human".to_string()]));
    }

    #[test]
    fn test_player_has_skills_and_tag() {
        let stats = Stats::new(1.0, 1.0, 1.0, 1.0, 1.0, 1.0);
        let player = Entity::new("p", "Player", EntityKind::Player, stats);
        assert!(player.is_player());
        assert!(player.skills.is_some());
        assert!(player.has_all_tags(&[PLAYER_TAG.to_string()]));
    }

    #[test]
    fn test_take_damage_kills() {
        let mut entity = brawler();
        entity.take_damage(DamagePacket::new(40.0, 0.0, 60.0));
        assert_eq!(entity.hp, 0.0);
        assert!(!entity.is_alive);
    }

    #[test]
    fn test_armor_reduces_damage_and_wears() {
        let mut entity = brawler().with_loadout(Loadout {
            chestplate: Some(Armor {
                name: "Lamellar".to_string(),
                defense: DamagePacket::new(5.0, 0.0, 0.0),
                durability: 50.0,
                current_durability: 50.0,
                modifiers: BTreeMap::new(),
            }),
            ..Loadout::default()
        });
        entity.take_damage(DamagePacket::new(8.0, 2.0, 0.0));
        assert_eq!(entity.hp, 95.0);
        let chest = entity.loadout.as_ref().unwrap().chestplate.as_ref().unwrap();
        assert_eq!(chest.current_durability, 40.0);
    }

    #[test]
    fn test_unarmed_damage_is_crush_strength() {
        assert_eq!(brawler().damage(), DamagePacket::of(DamageType::Crush, 10.0));
    }

    #[test]
    fn test_armed_damage_distributes_strength() {
        let entity = brawler().with_loadout(Loadout {
            weapon: Some(Weapon::Melee(MeleeWeapon {
                name: "Axe".to_string(),
                damage: DamagePacket::new(6.0, 0.0, 2.0),
                tags: Vec::new(),
                modifiers: BTreeMap::new(),
            })),
            ..Loadout::default()
        });
        assert_eq!(entity.damage(), DamagePacket::new(13.5, 0.0, 4.5));
    }
}
