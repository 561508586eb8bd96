//! Base character stats.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{CombatError, Result};

/// Hit points granted per point of vitality.
pub const HP_PER_VITALITY: f64 = 50.0;

/// Stamina granted per point of endurance.
pub const STAMINA_PER_ENDURANCE: f64 = 35.0;

/// One of the six base stats.
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
    strum::EnumIter,
)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum StatKind {
    /// Health pool.
    Vitality,
    /// Raw power.
    Strength,
    /// Speed and reach.
    Agility,
    /// Stamina pool.
    Endurance,
    /// Fortune.
    Luck,
    /// Presence.
    Charisma,
}

impl StatKind {
    /// Parse a stat name.
    ///
    /// # Errors
    ///
    /// Returns [`CombatError::UnknownStat`] for names outside the six stats.
    pub fn parse(name: &str) -> Result<Self> {
        name.parse()
            .map_err(|_| CombatError::UnknownStat(name.to_string()))
    }
}

/// Persistent adjustment to a single stat, from gear or progression.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StatAdjustment {
    /// Multiplier on the base value.
    #[serde(default = "one")]
    pub mult: f64,
    /// Flat amount added after the multiplier.
    #[serde(default)]
    pub add: f64,
}

fn one() -> f64 {
    1.0
}

impl Default for StatAdjustment {
    fn default() -> Self {
        Self { mult: 1.0, add: 0.0 }
    }
}

/// An entity's base stats.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stats {
    /// Vitality.
    pub vitality: f64,
    /// Strength.
    pub strength: f64,
    /// Agility.
    pub agility: f64,
    /// Endurance.
    pub endurance: f64,
    /// Luck.
    pub luck: f64,
    /// Charisma.
    #[serde(default)]
    pub charisma: f64,
    /// Adjustments keyed by stat.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub adjustments: BTreeMap<StatKind, StatAdjustment>,
}

impl Stats {
    /// Create stats with no adjustments.
    #[must_use]
    pub const fn new(
        vitality: f64,
        strength: f64,
        agility: f64,
        endurance: f64,
        luck: f64,
        charisma: f64,
    ) -> Self {
        Self {
            vitality,
            strength,
            agility,
            endurance,
            luck,
            charisma,
            adjustments: BTreeMap::new(),
        }
    }

    /// Unadjusted value of a stat.
    #[must_use]
    pub fn base(&self, stat: StatKind) -> f64 {
        match stat {
            StatKind::Vitality => self.vitality,
            StatKind::Strength => self.strength,
            StatKind::Agility => self.agility,
            StatKind::Endurance => self.endurance,
            StatKind::Luck => self.luck,
            StatKind::Charisma => self.charisma,
        }
    }

    /// Adjusted value of a stat.
    #[must_use]
    pub fn get(&self, stat: StatKind) -> f64 {
        let adjustment = self.adjustments.get(&stat).copied().unwrap_or_default();
        self.base(stat) * adjustment.mult + adjustment.add
    }

    /// Adjusted value of a stat looked up by name.
    ///
    /// # Errors
    ///
    /// Returns [`CombatError::UnknownStat`] for unknown names.
    pub fn get_named(&self, name: &str) -> Result<f64> {
        Ok(self.get(StatKind::parse(name)?))
    }

    /// Add an adjustment to a stat.
    #[must_use]
    pub fn with_adjustment(mut self, stat: StatKind, adjustment: StatAdjustment) -> Self {
        self.adjustments.insert(stat, adjustment);
        self
    }

    /// Maximum hit points.
    #[must_use]
    pub fn max_hp(&self) -> f64 {
        HP_PER_VITALITY * self.get(StatKind::Vitality)
    }

    /// Maximum stamina.
    #[must_use]
    pub fn max_stamina(&self) -> f64 {
        STAMINA_PER_ENDURANCE * self.get(StatKind::Endurance)
    }
}
