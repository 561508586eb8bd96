//! Cultivation resources: tiered qi reserves and soul.

use serde::{Deserialize, Serialize};

/// Purity tier of qi.
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
pub enum QiType {
    /// Lowest tier.
    Mortal,
    /// Middle tier.
    Immortal,
    /// Highest tier.
    Celestial,
}

impl QiType {
    /// Every tier, lowest first.
    pub const ALL: [Self; 3] = [Self::Mortal, Self::Immortal, Self::Celestial];

    /// Worth of one unit of this tier in mortal-qi units.
    #[must_use]
    pub const fn weight(self) -> f64 {
        match self {
            Self::Mortal => 1.0,
            Self::Immortal => 10.0,
            Self::Celestial => 150.0,
        }
    }
}

/// Amounts of qi per tier.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct QiReserves {
    /// Mortal qi.
    #[serde(default)]
    pub mortal: f64,
    /// Immortal qi.
    #[serde(default)]
    pub immortal: f64,
    /// Celestial qi.
    #[serde(default)]
    pub celestial: f64,
}

impl QiReserves {
    /// Create reserves.
    #[must_use]
    pub const fn new(mortal: f64, immortal: f64, celestial: f64) -> Self {
        Self {
            mortal,
            immortal,
            celestial,
        }
    }

    /// Amount of one tier.
    #[must_use]
    pub fn get(&self, qi_type: QiType) -> f64 {
        match qi_type {
            QiType::Mortal => self.mortal,
            QiType::Immortal => self.immortal,
            QiType::Celestial => self.celestial,
        }
    }

    /// Mutable amount of one tier.
    pub fn get_mut(&mut self, qi_type: QiType) -> &mut f64 {
        match qi_type {
            QiType::Mortal => &mut self.mortal,
            QiType::Immortal => &mut self.immortal,
            QiType::Celestial => &mut self.celestial,
        }
    }

    /// Unweighted sum of all tiers.
    #[must_use]
    pub fn total(&self) -> f64 {
        self.mortal + self.immortal + self.celestial
    }

    /// Sum of all tiers weighted by [`QiType::weight`].
    #[must_use]
    pub fn weighted_total(&self) -> f64 {
        QiType::ALL
            .iter()
            .map(|&qi_type| self.get(qi_type) * qi_type.weight())
            .sum()
    }

    /// Every tier multiplied by `factor`.
    #[must_use]
    pub fn scaled(&self, factor: f64) -> Self {
        Self::new(
            self.mortal * factor,
            self.immortal * factor,
            self.celestial * factor,
        )
    }

    /// Remove `other` tier by tier, flooring each at zero.
    pub fn drain(&mut self, other: &Self) {
        for qi_type in QiType::ALL {
            let amount = self.get_mut(qi_type);
            *amount = (*amount - other.get(qi_type)).max(0.0);
        }
    }
}

/// An entity's cultivation state.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Cultivation {
    /// Raw qi reserves.
    #[serde(default)]
    pub qi: QiReserves,
    /// Soul reserve.
    #[serde(default)]
    pub soul: f64,
}

impl Cultivation {
    /// Create a cultivation state.
    #[must_use]
    pub const fn new(qi: QiReserves, soul: f64) -> Self {
        Self { qi, soul }
    }
}
