//! Technique definitions.
//!
//! A [`Technique`] is data: up to three ordered phases, each with a point
//! budget of at most [`PHASE_POINT_BUDGET`] split across its parameters, plus
//! narration strings. Combat reads techniques and never mutates them.

use serde::{Deserialize, Serialize};

use crate::error::{CombatError, Result};
use crate::packets::{DamageType, EffectClass, SoulEffectType};

/// Maximum sum of a phase's point parameters.
pub const PHASE_POINT_BUDGET: f64 = 100.0;

/// Resource a phase consumes.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::AsRefStr,
)]
#[strum(serialize_all = "snake_case")]
pub enum ResourceKind {
    /// Physical phases.
    Stamina,
    /// Qi phases.
    Qi,
    /// Soul phases.
    Soul,
}

/// Narration emitted while a phase resolves. Empty strings are skipped.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PhaseOutput {
    /// Shown to the player when they start the phase.
    pub start: String,
    /// Shown to the player when their phase succeeds.
    pub success: String,
    /// Shown when the phase succeeds against the player.
    pub success_on_player: String,
    /// Shown when the phase fails.
    pub fail: String,
}

/// Shape of a ranged qi attack.
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
pub enum AreaType {
    /// Single projectile at the target.
    Bullet,
    /// Cone from the caster towards the target.
    Cone,
    /// Circle around the caster.
    Surround,
    /// Circle around the caster, strongest near the target.
    Burst,
    /// Line from the caster through the target.
    Beam,
}

/// Physical phase parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhysicalPhase {
    /// Weapon tag the caster must hold, if any.
    #[serde(default)]
    pub weapon_required: Option<String>,
    /// Damage type dealt.
    pub damage_type: DamageType,
    /// Damage points.
    pub damage_points: f64,
    /// Speed points.
    pub speed_points: f64,
    /// Precision points (crit multiplier).
    pub precision_points: f64,
    /// Crit points.
    #[serde(default)]
    pub crit_points: f64,
    /// Narration.
    #[serde(default)]
    pub output: PhaseOutput,
}

/// Ranged qi attack parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RangedQi {
    /// Damage points.
    pub damage_points: f64,
    /// Speed points.
    pub speed_points: f64,
    /// Crit points.
    #[serde(default)]
    pub crit_points: f64,
    /// Precision points.
    pub precision_points: f64,
    /// Range points.
    pub range_points: f64,
    /// Area of effect points; also the cone angle in degrees.
    pub area_of_effect_points: f64,
    /// Damage type dealt.
    pub damage_type: DamageType,
    /// Shape.
    pub area_type: AreaType,
}

/// What a qi phase does.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum QiEffect {
    /// Raise a shield on the caster.
    Defense {
        /// Shield strength points.
        defense_points: f64,
        /// Penetration resistance of the shield.
        armor_penetration_resistance_points: f64,
        /// Stability points; each point below 25 adds 1% decay.
        stability_points: f64,
    },
    /// Guaranteed close-range strike.
    Melee {
        /// Damage points.
        damage_points: f64,
        /// Crit points.
        #[serde(default)]
        crit_points: f64,
        /// Damage type dealt.
        damage_type: DamageType,
    },
    /// Projectile or area attack.
    Ranged(RangedQi),
}

impl QiEffect {
    fn points(&self) -> Vec<(&'static str, f64)> {
        match self {
            Self::Defense {
                defense_points,
                armor_penetration_resistance_points,
                stability_points,
            } => vec![
                ("defense_points", *defense_points),
                ("armor_penetration_resistance_points", *armor_penetration_resistance_points),
                ("stability_points", *stability_points),
            ],
            Self::Melee {
                damage_points,
                crit_points,
                ..
            } => vec![("damage_points", *damage_points), ("crit_points", *crit_points)],
            Self::Ranged(ranged) => vec![
                ("damage_points", ranged.damage_points),
                ("speed_points", ranged.speed_points),
                ("crit_points", ranged.crit_points),
                ("precision_points", ranged.precision_points),
                ("range_points", ranged.range_points),
                ("area_of_effect_points", ranged.area_of_effect_points),
            ],
        }
    }
}

/// Qi phase parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QiPhase {
    /// Effect.
    pub effect: QiEffect,
    /// Narration.
    #[serde(default)]
    pub output: PhaseOutput,
}

/// Soul phase parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SoulPhase {
    /// Effect category.
    pub effect_class: EffectClass,
    /// Effect.
    pub effect_type: SoulEffectType,
    /// Strength points.
    pub strength: f64,
    /// Duration points.
    pub duration: f64,
    /// Narration.
    #[serde(default)]
    pub output: PhaseOutput,
}

/// A borrowed phase, in resolution order.
#[derive(Debug, Clone, Copy)]
pub enum TechniquePhase<'a> {
    /// Physical phase.
    Physical(&'a PhysicalPhase),
    /// Qi phase.
    Qi(&'a QiPhase),
    /// Soul phase.
    Soul(&'a SoulPhase),
}

impl TechniquePhase<'_> {
    /// Resource the phase consumes.
    #[must_use]
    pub const fn resource(&self) -> ResourceKind {
        match self {
            Self::Physical(_) => ResourceKind::Stamina,
            Self::Qi(_) => ResourceKind::Qi,
            Self::Soul(_) => ResourceKind::Soul,
        }
    }

    /// Narration.
    #[must_use]
    pub fn output(&self) -> &PhaseOutput {
        match self {
            Self::Physical(phase) => &phase.output,
            Self::Qi(phase) => &phase.output,
            Self::Soul(phase) => &phase.output,
        }
    }
}

/// A combat technique.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Technique {
    /// Unique name.
    pub name: String,
    /// Flavour text.
    #[serde(default)]
    pub description: String,
    /// Narration shown when the technique is started.
    #[serde(default)]
    pub output_start: String,
    /// Condition expressions gating use, evaluated by the engine.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<String>,
    /// Physical phase.
    #[serde(default)]
    pub physical: Option<PhysicalPhase>,
    /// Qi phase.
    #[serde(default)]
    pub qi: Option<QiPhase>,
    /// Soul phase.
    #[serde(default)]
    pub soul: Option<SoulPhase>,
}

impl Technique {
    /// Create a technique with no phases.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            output_start: String::new(),
            conditions: Vec::new(),
            physical: None,
            qi: None,
            soul: None,
        }
    }

    /// Set the physical phase.
    #[must_use]
    pub fn with_physical(mut self, phase: PhysicalPhase) -> Self {
        self.physical = Some(phase);
        self
    }

    /// Set the qi phase.
    #[must_use]
    pub fn with_qi(mut self, phase: QiPhase) -> Self {
        self.qi = Some(phase);
        self
    }

    /// Set the soul phase.
    #[must_use]
    pub fn with_soul(mut self, phase: SoulPhase) -> Self {
        self.soul = Some(phase);
        self
    }

    /// Present phases: physical, then qi, then soul.
    pub fn phases(&self) -> impl Iterator<Item = TechniquePhase<'_>> {
        let physical = self.physical.as_ref().map(TechniquePhase::Physical);
        let qi = self.qi.as_ref().map(TechniquePhase::Qi);
        let soul = self.soul.as_ref().map(TechniquePhase::Soul);
        physical.into_iter().chain(qi).chain(soul)
    }

    /// Resources an action using this technique must commit.
    pub fn required_resources(&self) -> impl Iterator<Item = ResourceKind> + '_ {
        self.phases().map(|phase| phase.resource())
    }

    /// Qi effect, if the technique has a qi phase.
    #[must_use]
    pub fn qi_effect(&self) -> Option<&QiEffect> {
        self.qi.as_ref().map(|phase| &phase.effect)
    }

    /// Ranged qi parameters, if the qi phase is ranged.
    #[must_use]
    pub fn ranged_qi(&self) -> Option<&RangedQi> {
        match self.qi_effect() {
            Some(QiEffect::Ranged(ranged)) => Some(ranged),
            _ => None,
        }
    }

    /// Check point budgets and phase composition.
    ///
    /// # Errors
    ///
    /// Returns [`CombatError::InvalidTechnique`] describing the first problem.
    pub fn validate(&self) -> Result<()> {
        if self.physical.is_none() && self.qi.is_none() && self.soul.is_none() {
            return Err(self.invalid("technique has no phases"));
        }
        if let Some(physical) = &self.physical {
            self.validate_physical(physical)?;
        }
        if let Some(qi) = &self.qi {
            self.validate_qi(qi)?;
        }
        if let Some(soul) = &self.soul {
            self.validate_soul(soul)?;
        }
        self.validate_composition()
    }

    fn invalid(&self, reason: impl Into<String>) -> CombatError {
        CombatError::InvalidTechnique {
            technique: self.name.clone(),
            reason: reason.into(),
        }
    }

    fn check_positive(&self, name: &str, value: f64) -> Result<()> {
        if value > 0.0 {
            Ok(())
        } else {
            Err(self.invalid(format!("{name} must be positive, got {value}")))
        }
    }

    fn check_budget(&self, phase: &str, total: f64) -> Result<()> {
        if total > PHASE_POINT_BUDGET {
            return Err(self.invalid(format!(
                "{phase} phase spends {total} points (max {PHASE_POINT_BUDGET})"
            )));
        }
        Ok(())
    }

    fn validate_physical(&self, phase: &PhysicalPhase) -> Result<()> {
        self.check_positive("damage_points", phase.damage_points)?;
        self.check_positive("speed_points", phase.speed_points)?;
        self.check_positive("precision_points", phase.precision_points)?;
        if phase.crit_points < 0.0 {
            return Err(self.invalid("crit_points must not be negative"));
        }
        self.check_budget(
            "physical",
            phase.damage_points + phase.speed_points + phase.precision_points + phase.crit_points,
        )
    }

    fn validate_qi(&self, phase: &QiPhase) -> Result<()> {
        let points = phase.effect.points();
        for &(name, value) in &points {
            if name == "crit_points" {
                if value < 0.0 {
                    return Err(self.invalid("crit_points must not be negative"));
                }
            } else {
                self.check_positive(name, value)?;
            }
        }
        self.check_budget("qi", points.iter().map(|(_, value)| value).sum())
    }

    fn validate_soul(&self, phase: &SoulPhase) -> Result<()> {
        if !phase.effect_type.allowed_for(phase.effect_class) {
            return Err(self.invalid(format!(
                "effect type '{}' is not allowed for effect class '{}'",
                phase.effect_type, phase.effect_class
            )));
        }
        self.check_positive("strength", phase.strength)?;
        self.check_positive("duration", phase.duration)?;
        self.check_budget("soul", phase.strength + phase.duration)
    }

    fn validate_composition(&self) -> Result<()> {
        let soul_buff = self
            .soul
            .as_ref()
            .is_some_and(|soul| soul.effect_class == EffectClass::Buff);
        let qi_effect = self.qi_effect();
        let qi_defense = matches!(qi_effect, Some(QiEffect::Defense { .. }));
        let qi_attack = matches!(qi_effect, Some(QiEffect::Melee { .. } | QiEffect::Ranged(_)));

        if self.physical.is_some() && qi_defense {
            return Err(self.invalid("a physical phase cannot be paired with a qi defense"));
        }
        if self.physical.is_some() && soul_buff {
            return Err(self.invalid("a physical phase cannot be paired with a soul buff"));
        }
        if qi_attack && soul_buff {
            return Err(self.invalid("a qi attack cannot be paired with a soul buff"));
        }
        if matches!(qi_effect, Some(QiEffect::Melee { .. })) && self.physical.is_none() {
            return Err(self.invalid("a qi melee phase requires a physical phase"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strike() -> PhysicalPhase {
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

    fn buff() -> SoulPhase {
        SoulPhase {
            effect_class: EffectClass::Buff,
            effect_type: SoulEffectType::AgilityMult,
            strength: 30.0,
            duration: 40.0,
            output: PhaseOutput::default(),
        }
    }

    fn shield() -> QiPhase {
        QiPhase {
            effect: QiEffect::Defense {
                defense_points: 60.0,
                armor_penetration_resistance_points: 20.0,
                stability_points: 20.0,
            },
            output: PhaseOutput::default(),
        }
    }

    #[test]
    fn test_valid_physical_technique() {
        assert!(Technique::new("Palm").with_physical(strike()).validate().is_ok());
    }

    #[test]
    fn test_empty_technique_is_invalid() {
        assert!(Technique::new("Nothing").validate().is_err());
    }

    #[test]
    fn test_physical_budget_overflow() {
        let mut phase = strike();
        phase.crit_points = 21.0;
        let err = Technique::new("Greedy").with_physical(phase).validate();
        assert!(matches!(err, Err(CombatError::InvalidTechnique { .. })));
    }

    #[test]
    fn test_physical_requires_positive_speed() {
        let mut phase = strike();
        phase.speed_points = 0.0;
        assert!(Technique::new("Slow").with_physical(phase).validate().is_err());
    }

    #[test]
    fn test_soul_effect_must_match_class() {
        let mut soul = buff();
        soul.effect_type = SoulEffectType::StealQi;
        assert!(Technique::new("Odd").with_soul(soul).validate().is_err());
    }

    #[test]
    fn test_composition_rules() {
        let melee_qi = QiPhase {
            effect: QiEffect::Melee {
                damage_points: 60.0,
                crit_points: 10.0,
                damage_type: DamageType::Slash,
            },
            output: PhaseOutput::default(),
        };

        assert!(Technique::new("a").with_physical(strike()).with_qi(shield()).validate().is_err());
        assert!(Technique::new("b").with_physical(strike()).with_soul(buff()).validate().is_err());
        assert!(Technique::new("c")
            .with_physical(strike())
            .with_qi(melee_qi.clone())
            .with_soul(buff())
            .validate()
            .is_err());
        assert!(Technique::new("d").with_qi(melee_qi.clone()).validate().is_err());
        assert!(Technique::new("e").with_physical(strike()).with_qi(melee_qi).validate().is_ok());
        assert!(Technique::new("f").with_qi(shield()).with_soul(buff()).validate().is_ok());
    }

    #[test]
    fn test_phase_order_and_resources() {
        let technique = Technique::new("Combo").with_soul(buff()).with_qi(shield());
        let resources: Vec<_> = technique.required_resources().collect();
        assert_eq!(resources, vec![ResourceKind::Qi, ResourceKind::Soul]);
    }
}
