//! Per-tick combat simulation.

use serde::Serialize;

use super::ai::{self, Intent};
use super::context::CombatContext;
use super::host::{CombatHost, CombatOutcome, OutputTag};
use super::phases;
use super::state::CombatState;
use super::{CombatantId, TeamSlot};
use crate::config::CombatConfig;
use crate::entity::Entity;
use crate::error::{CombatError, Result};
use crate::packets::{ActionKind, ActionPacket, EffectPacket};
use crate::rng::{RandomSource, SeededRandom};
use crate::technique::{ResourceKind, TechniquePhase};

/// Whether a combatant that last acted at `last_action_tick` may act at
/// `current_tick`.
#[must_use]
pub fn can_act(
    current_tick: u64,
    last_action_tick: u64,
    power_factor: f64,
    min_action_frequency: f64,
) -> bool {
    let elapsed = current_tick.saturating_sub(last_action_tick) as f64;
    elapsed * power_factor.max(min_action_frequency) >= 1.0
}

/// Ticks `last_action_tick` advances by after an action.
#[must_use]
pub fn cooldown_ticks(power_factor: f64, min_action_frequency: f64) -> u64 {
    let frequency = if power_factor > 0.0 {
        power_factor
    } else {
        min_action_frequency
    };
    if frequency <= 0.0 {
        return 1;
    }
    ((1.0 / frequency).round() as u64).max(1)
}

/// One resolved action.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActionRecord {
    /// Acting combatant.
    pub origin: CombatantId,
    /// Combatant acted upon.
    pub target: CombatantId,
    /// Action kind.
    pub action: ActionKind,
    /// Technique name, for technique actions.
    pub technique: Option<String>,
    /// Phases that landed.
    pub phases_landed: usize,
    /// Whether every phase landed.
    pub succeeded: bool,
}

/// What happened during one tick.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TickEvents {
    /// Tick number.
    pub tick: u64,
    /// End signal raised this tick.
    pub outcome: Option<CombatOutcome>,
    /// AI actions resolved this tick.
    pub actions: Vec<ActionRecord>,
    /// Combatants that died this tick.
    pub deaths: Vec<CombatantId>,
}

/// Drives one combat.
///
/// The resolver owns its [`CombatContext`] and random source; the host is
/// passed into every call that narrates or signals.
#[derive(Debug)]
pub struct CombatResolver<R: RandomSource = SeededRandom> {
    pub(super) context: CombatContext,
    pub(super) rng: R,
    pub(super) config: CombatConfig,
    pub(super) tick: u64,
}

impl<R: RandomSource> CombatResolver<R> {
    /// Create a resolver at tick zero.
    #[must_use]
    pub fn new(context: CombatContext, rng: R, config: CombatConfig) -> Self {
        Self {
            context,
            rng,
            config,
            tick: 0,
        }
    }

    /// Combat layout.
    #[must_use]
    pub fn context(&self) -> &CombatContext {
        &self.context
    }

    /// Mutable combat layout.
    pub fn context_mut(&mut self) -> &mut CombatContext {
        &mut self.context
    }

    /// Tunables.
    #[must_use]
    pub fn config(&self) -> &CombatConfig {
        &self.config
    }

    /// Ticks run so far.
    #[must_use]
    pub fn tick_count(&self) -> u64 {
        self.tick
    }

    /// Whether the player has a turn waiting for input.
    #[must_use]
    pub fn awaiting_player_input(&self) -> bool {
        self.context
            .player()
            .and_then(|id| self.context.get(id))
            .is_some_and(|player| player.awaiting_input)
    }

    /// End combat and hand the entities back.
    #[must_use]
    pub fn into_entities(self) -> Vec<Entity> {
        self.context.into_entities()
    }

    // ========================================================================
    // Actions
    // ========================================================================

    /// Resolve one action.
    ///
    /// # Errors
    ///
    /// Returns [`CombatError::UnsupportedAction`] for `add_modifier`,
    /// [`CombatError::MissingTechnique`] or [`CombatError::MissingResource`]
    /// for malformed technique actions, and
    /// [`CombatError::UnknownCombatant`] for foreign handles.
    pub fn resolve_action(
        &mut self,
        action: &ActionPacket,
        host: &mut impl CombatHost,
    ) -> Result<ActionRecord> {
        let mut record = ActionRecord {
            origin: action.origin,
            target: action.target,
            action: action.action,
            technique: None,
            phases_landed: 0,
            succeeded: false,
        };

        match action.action {
            ActionKind::Attack => {
                let origin = self.context.combatant(action.origin)?;
                let mut damage = origin.entity.damage();
                let weapon_modifier = origin
                    .entity
                    .loadout
                    .as_ref()
                    .and_then(|loadout| loadout.weapon.as_ref())
                    .and_then(|weapon| origin.modifier_pool.get(weapon.damage_modifier()));
                if let Some(modifier) = weapon_modifier {
                    damage = modifier.apply_to_damage(&damage);
                }
                self.context.combatant_mut(action.target)?.take_damage(damage);
                record.succeeded = true;
            }
            ActionKind::AddModifier => {
                return Err(CombatError::UnsupportedAction(action.action.to_string()));
            }
            ActionKind::Technique => {
                let technique = action.technique.as_ref().ok_or(CombatError::MissingTechnique)?;
                record.technique = Some(technique.name.clone());
                for resource in technique.required_resources() {
                    if committed_amount(action, resource).is_none() {
                        return Err(CombatError::MissingResource {
                            technique: technique.name.clone(),
                            resource: resource.to_string(),
                        });
                    }
                }

                let origin_is_player = self.context.combatant(action.origin)?.is_player();
                let target_is_player = self.context.combatant(action.target)?.is_player();
                let now = host.world_time();
                if origin_is_player {
                    say(host, &technique.output_start, OutputTag::Combat);
                }

                record.succeeded = true;
                for phase in technique.phases() {
                    let output = phase.output();
                    if origin_is_player {
                        say(host, &output.start, OutputTag::Combat);
                    }
                    let amount = committed_amount(action, phase.resource()).unwrap_or(0.0);
                    let landed = match phase {
                        TechniquePhase::Physical(physical) => phases::physical(
                            &mut self.context,
                            &mut self.rng,
                            physical,
                            amount,
                            action.origin,
                            action.target,
                        )?,
                        TechniquePhase::Qi(qi) => phases::qi(
                            &mut self.context,
                            &mut self.rng,
                            qi,
                            amount,
                            action.origin,
                            action.target,
                        )?,
                        TechniquePhase::Soul(soul) => phases::soul(
                            &mut self.context,
                            soul,
                            amount,
                            action.origin,
                            action.target,
                            now,
                        )?,
                    };
                    if !landed {
                        say(host, &output.fail, OutputTag::Combat);
                        record.succeeded = false;
                        break;
                    }
                    record.phases_landed += 1;
                    if target_is_player {
                        say(host, &output.success_on_player, OutputTag::Warning);
                    }
                    if origin_is_player {
                        say(host, &output.success, OutputTag::Success);
                    }
                }
            }
        }

        tracing::debug!(
            origin = %record.origin,
            target = %record.target,
            action = %record.action,
            technique = record.technique.as_deref().unwrap_or("-"),
            phases_landed = record.phases_landed,
            succeeded = record.succeeded,
            "Action resolved"
        );
        Ok(record)
    }

    // ========================================================================
    // Tick
    // ========================================================================

    /// Advance combat by one tick.
    ///
    /// # Errors
    ///
    /// Propagates fatal errors from action resolution.
    pub fn tick(&mut self, host: &mut impl CombatHost) -> Result<TickEvents> {
        self.tick += 1;
        let now = host.world_time();
        let mut events = TickEvents {
            tick: self.tick,
            ..TickEvents::default()
        };

        if self.context.alive_enemies() == 0 {
            events.outcome = Some(CombatOutcome::Win);
        } else if self.context.alive_player_team() == 0 {
            events.outcome = Some(CombatOutcome::Defeat);
        }
        if let Some(outcome) = events.outcome {
            tracing::info!(tick = self.tick, %outcome, "Combat end condition");
            host.end_combat(outcome);
        }

        let ids: Vec<CombatantId> = self.context.ids().collect();
        let alive_before: Vec<bool> = ids
            .iter()
            .map(|&id| self.context.get(id).is_some_and(CombatState::is_alive))
            .collect();

        for &id in &ids {
            let utilities: Vec<EffectPacket> = {
                let state = self.context.combatant_mut(id)?;
                state.effects.refresh(now, &mut state.modifier_pool);
                state.effects.utility_effects().copied().collect()
            };
            for effect in &utilities {
                phases::apply_utility(&mut self.context, effect)?;
            }

            let state = self.context.combatant(id)?;
            if !state.is_alive() {
                continue;
            }
            let is_player = state.is_player();
            let target_alive = state
                .target
                .and_then(|target| self.context.get(target))
                .is_some_and(CombatState::is_alive);
            if !is_player && !target_alive {
                self.retarget(id)?;
            }

            let power_factor = self.context.power_factor(id);
            let last_action_tick = self.context.combatant(id)?.last_action_tick;
            if !can_act(
                self.tick,
                last_action_tick,
                power_factor,
                self.config.min_action_frequency,
            ) {
                continue;
            }

            let intent = {
                let state = self.context.combatant(id)?;
                state
                    .target
                    .and_then(|target| self.context.get(target))
                    .map_or(Intent::Aggressive, |target| Intent::choose(state, target))
            };
            let cooldown = cooldown_ticks(power_factor, self.config.min_action_frequency);
            let target = {
                let state = self.context.combatant_mut(id)?;
                state.intent = Some(intent);
                state.last_action_tick += cooldown;
                state.convert_qi();
                if is_player {
                    state.awaiting_input = true;
                    continue;
                }
                state.target
            };
            let Some(target) = target else {
                continue;
            };

            let target_position = self.context.combatant(target)?.position;
            ai::move_according_to_intent(self.context.combatant_mut(id)?, target_position, intent);
            let action = ai::generate_action(
                self.context.combatant(id)?,
                id,
                self.context.combatant(target)?,
                target,
                intent,
                &self.config,
            );
            let record = self.resolve_action(&action, host)?;
            events.actions.push(record);
        }

        events.deaths = ids
            .iter()
            .zip(alive_before)
            .filter(|&(&id, was_alive)| {
                was_alive && self.context.get(id).is_some_and(|state| !state.is_alive())
            })
            .map(|(&id, _)| id)
            .collect();
        for &id in &events.deaths {
            tracing::info!(tick = self.tick, combatant = %id, "Combatant died");
        }
        Ok(events)
    }

    /// Pick a new target for `id`: a random other team, without
    /// replacement, then a random living member of it.
    fn retarget(&mut self, id: CombatantId) -> Result<()> {
        let own_slot = self.context.combatant(id)?.slot;
        let mut slots: Vec<TeamSlot> = self
            .context
            .teams()
            .iter()
            .map(|team| team.slot)
            .filter(|&slot| slot != own_slot)
            .collect();

        let mut chosen = None;
        while !slots.is_empty() {
            let slot = slots.remove(self.rng.pick_index(slots.len()));
            let living: Vec<CombatantId> = self
                .context
                .team(slot)
                .map(|team| {
                    team.members
                        .iter()
                        .copied()
                        .filter(|&member| {
                            self.context.get(member).is_some_and(CombatState::is_alive)
                        })
                        .collect()
                })
                .unwrap_or_default();
            if !living.is_empty() {
                chosen = Some(living[self.rng.pick_index(living.len())]);
                break;
            }
        }

        tracing::debug!(combatant = %id, target = ?chosen, "Retargeted");
        self.context.combatant_mut(id)?.target = chosen;
        Ok(())
    }
}

fn committed_amount(action: &ActionPacket, resource: ResourceKind) -> Option<f64> {
    match resource {
        ResourceKind::Stamina => action.stamina,
        ResourceKind::Qi => action.qi,
        ResourceKind::Soul => action.soul,
    }
}

pub(super) fn say(host: &mut impl CombatHost, text: &str, tag: OutputTag) {
    if !text.is_empty() {
        host.output(text, tag);
    }
}
