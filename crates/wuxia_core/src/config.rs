//! Combat tunables.

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Tunable constants of combat resolution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CombatConfig {
    /// Retreat succeeds with probability `factor * power_level / max_power_level`.
    pub retreat_chance_factor: f64,
    /// Floor on the action-frequency multiplier of weak combatants.
    pub min_action_frequency: f64,
    /// AI ranged sizing: qi spent per unit of distance, times range points.
    pub ai_ranged_reach_factor: f64,
    /// AI defense sizing: shield qi per point of target strength.
    pub ai_defense_strength_factor: f64,
}

impl Default for CombatConfig {
    fn default() -> Self {
        Self {
            retreat_chance_factor: 0.8,
            min_action_frequency: 0.1,
            ai_ranged_reach_factor: 1.2,
            ai_defense_strength_factor: 3.0,
        }
    }
}

impl CombatConfig {
    /// Load from a RON string. Missing fields take their defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the RON is malformed.
    pub fn from_ron_str(ron: &str) -> Result<Self> {
        Ok(ron::from_str(ron)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_keeps_defaults() {
        let config = CombatConfig::from_ron_str("(retreat_chance_factor: 0.5)").unwrap();
        assert_eq!(config.retreat_chance_factor, 0.5);
        assert_eq!(config.min_action_frequency, 0.1);
    }

    #[test]
    fn test_empty_config_is_default() {
        assert_eq!(CombatConfig::from_ron_str("()").unwrap(), CombatConfig::default());
    }
}
