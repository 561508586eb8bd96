//! Per-combatant runtime state.

use serde::{Deserialize, Serialize};

use super::ai::Intent;
use super::TeamSlot;
use crate::cultivation::QiReserves;
use crate::entity::Entity;
use crate::math::Vector;
use crate::packets::{
    DamagePacket, DefensePacket, EffectClass, EffectPacket, ModifierAttribute, ModifierPacketPool,
    SoulEffectType,
};
use crate::stats::StatKind;
use crate::technique::ResourceKind;
use crate::world_time::WorldTimestamp;

use super::CombatantId;

/// Rate at which each qi tier converts into usable qi per action.
pub const QI_CONVERSION_RATE: f64 = 0.01;

/// Timed effects active on a combatant.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EffectPool {
    effects: Vec<EffectPacket>,
}

impl EffectPool {
    /// Create an empty pool.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start tracking an effect.
    pub fn add(&mut self, effect: EffectPacket) {
        self.effects.push(effect);
    }

    /// Drop effects that have ended at `now`, unregistering their modifiers
    /// from `modifiers`. Returns the expired effects.
    pub fn refresh(
        &mut self,
        now: WorldTimestamp,
        modifiers: &mut ModifierPacketPool,
    ) -> Vec<EffectPacket> {
        let mut expired = Vec::new();
        for index in (0..self.effects.len()).rev() {
            if !self.effects[index].has_ended(now) {
                continue;
            }
            let effect = self.effects.remove(index);
            if let Some(attribute) = effect.effect_type.modifier_attribute() {
                modifiers.withdraw(attribute, effect.strength);
            }
            expired.push(effect);
        }
        expired
    }

    /// Active utility effects.
    pub fn utility_effects(&self) -> impl Iterator<Item = &EffectPacket> {
        self.effects
            .iter()
            .filter(|effect| effect.effect_class == EffectClass::Utility)
    }

    /// Whether an effect of this class and type is running.
    #[must_use]
    pub fn is_active(&self, class: EffectClass, effect_type: SoulEffectType) -> bool {
        self.effects
            .iter()
            .any(|effect| effect.effect_class == class && effect.effect_type == effect_type)
    }

    /// All active effects.
    pub fn iter(&self) -> impl Iterator<Item = &EffectPacket> {
        self.effects.iter()
    }

    /// Number of active effects.
    #[must_use]
    pub fn len(&self) -> usize {
        self.effects.len()
    }

    /// Whether no effects are active.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }
}

/// One combatant for the duration of a combat.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombatState {
    /// The entity fighting.
    pub entity: Entity,
    /// Position on the field.
    pub position: Vector,
    /// Team name.
    pub team: String,
    /// Team slot.
    pub slot: TeamSlot,
    /// Current focus.
    pub target: Option<CombatantId>,
    /// Strength rating fixed at combat start.
    pub power_level: f64,
    /// Converted qi available to techniques.
    pub usable_qi: f64,
    /// Qi moved from reserves into `usable_qi` per conversion.
    pub qi_conversion_per_tick: QiReserves,
    /// Tick of the last action.
    pub last_action_tick: u64,
    /// Active modifiers.
    pub modifier_pool: ModifierPacketPool,
    /// Active shields, most recent last.
    pub defense_techniques: Vec<DefensePacket>,
    /// Active timed effects.
    pub effects: EffectPool,
    /// Intent chosen at the last eligible tick.
    pub intent: Option<Intent>,
    /// Player only: a turn is available for input.
    pub awaiting_input: bool,
}

impl CombatState {
    /// Enter an entity into combat.
    ///
    /// Seeds the modifier pool from the entity's skills and loadout and
    /// fixes the power level.
    #[must_use]
    pub fn new(entity: Entity, team: impl Into<String>, slot: TeamSlot, position: Vector) -> Self {
        let modifier_pool = Self::initial_modifiers(&entity);
        let power_level = Self::compute_power_level(&entity, &modifier_pool);
        let qi_conversion_per_tick = entity.cultivation.qi.scaled(QI_CONVERSION_RATE);
        Self {
            entity,
            position,
            team: team.into(),
            slot,
            target: None,
            power_level,
            usable_qi: 0.0,
            qi_conversion_per_tick,
            last_action_tick: 0,
            modifier_pool,
            defense_techniques: Vec::new(),
            effects: EffectPool::new(),
            intent: None,
            awaiting_input: false,
        }
    }

    /// Modifiers an entity brings into combat.
    #[must_use]
    pub fn initial_modifiers(entity: &Entity) -> ModifierPacketPool {
        let mut pool = ModifierPacketPool::new();
        let skills = entity
            .skills
            .iter()
            .filter(|_| entity.is_player())
            .flat_map(|skills| skills.modifier_packets());
        let gear = entity
            .loadout
            .iter()
            .flat_map(|loadout| loadout.modifier_packets());
        for packet in skills.chain(gear) {
            pool.add(packet);
        }
        pool
    }

    /// Power level of an entity with the given modifiers.
    #[must_use]
    pub fn compute_power_level(entity: &Entity, modifiers: &ModifierPacketPool) -> f64 {
        let stats = &entity.stats;
        stats.get(StatKind::Endurance)
            + stats.get(StatKind::Vitality)
            + stats.get(StatKind::Strength) * modifiers.value(ModifierAttribute::StrengthMult)
            + stats.get(StatKind::Agility) * modifiers.value(ModifierAttribute::AgilityMult)
            + entity.cultivation.qi.weighted_total()
            + entity.cultivation.soul
    }

    /// Stat after combat modifiers.
    #[must_use]
    pub fn get_stat(&self, stat: StatKind) -> f64 {
        let base = self.entity.stats.get(stat);
        let modifier = match stat {
            StatKind::Strength => Some(ModifierAttribute::StrengthMult),
            StatKind::Agility => Some(ModifierAttribute::AgilityMult),
            _ => None,
        };
        match modifier.and_then(|attribute| self.modifier_pool.get(attribute)) {
            Some(packet) => packet.apply(base),
            None => base,
        }
    }

    /// Vitality, endurance, strength and agility after modifiers.
    #[must_use]
    pub fn physical_stat_total(&self) -> f64 {
        [
            StatKind::Vitality,
            StatKind::Endurance,
            StatKind::Strength,
            StatKind::Agility,
        ]
        .into_iter()
        .map(|stat| self.get_stat(stat))
        .sum()
    }

    /// Whether the entity is alive.
    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.entity.is_alive
    }

    /// Whether this is the player character.
    #[must_use]
    pub fn is_player(&self) -> bool {
        self.entity.is_player()
    }

    /// Distance to another combatant.
    #[must_use]
    pub fn distance_to(&self, other: &Self) -> f64 {
        self.position.distance_from(other.position)
    }

    /// Take a hit: shields absorb most-recent-first, the rest reaches the
    /// entity.
    pub fn take_damage(&mut self, damage: DamagePacket) {
        let mut remaining = damage;
        for index in (0..self.defense_techniques.len()).rev() {
            if remaining.total() <= 0.0 {
                return;
            }
            self.defense_techniques[index].take_damage(&mut remaining);
            if self.defense_techniques[index].is_depleted() {
                self.defense_techniques.remove(index);
            }
        }
        if remaining.total() > 0.0 {
            self.entity.take_damage(remaining);
        }
    }

    /// Raise a shield on top of the defense stack.
    pub fn add_defense(&mut self, shield: DefensePacket) {
        self.defense_techniques.push(shield);
    }

    /// Decay every shield once, dropping any that empty.
    pub fn decay_defenses(&mut self) {
        for shield in &mut self.defense_techniques {
            shield.process_decay();
        }
        self.defense_techniques.retain(|shield| !shield.is_depleted());
    }

    /// Convert one step of reserve qi into usable qi.
    ///
    /// Conversion stops once the mortal reserve can no longer cover a step.
    /// Returns whether anything converted.
    pub fn convert_qi(&mut self) -> bool {
        let step = self.qi_conversion_per_tick;
        let reserves = &mut self.entity.cultivation.qi;
        if step.total() <= 0.0 || reserves.mortal < step.mortal {
            return false;
        }
        self.usable_qi += step.weighted_total();
        reserves.drain(&step);
        true
    }

    /// Amount of a resource currently available.
    #[must_use]
    pub fn available(&self, resource: ResourceKind) -> f64 {
        match resource {
            ResourceKind::Stamina => self.entity.stamina,
            ResourceKind::Qi => self.usable_qi,
            ResourceKind::Soul => self.entity.cultivation.soul,
        }
    }

    /// Spend up to `amount` of a resource. Returns the amount spent.
    pub fn spend(&mut self, resource: ResourceKind, amount: f64) -> f64 {
        let pool = match resource {
            ResourceKind::Stamina => &mut self.entity.stamina,
            ResourceKind::Qi => &mut self.usable_qi,
            ResourceKind::Soul => &mut self.entity.cultivation.soul,
        };
        let spent = amount.clamp(0.0, pool.max(0.0));
        *pool -= spent;
        spent
    }
}
