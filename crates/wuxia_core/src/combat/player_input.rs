//! Player command parsing.
//!
//! Commands are whitespace-separated words, case-insensitive:
//!
//! - `retreat` - try to flee; odds scale with power factor
//! - `help` / `look` - information, free
//! - `attack <n|closest>` - innate attack on enemy `n` from `look`
//! - `move <towards|away|opposite> <n>` - step by agility
//! - `technique ...` - reported as not yet available
//!
//! Mistyped commands are rejected with a narrated message and leave the
//! player's turn available.

use thiserror::Error;

use super::host::{CombatHost, CombatOutcome, OutputTag};
use super::resolver::{say, CombatResolver};
use super::CombatantId;
use crate::error::{CombatError, Result};
use crate::math::Vector;
use crate::packets::ActionPacket;
use crate::rng::RandomSource;
use crate::stats::StatKind;

/// Attempts at drawing a non-zero random direction before falling back.
const MAX_DIRECTION_ATTEMPTS: usize = 8;

const HELP: [&str; 5] = [
    "Combat takes the following commands:",
    "1. \"look\" : Displays all enemies' information.",
    "2. \"attack\" : Followed by the id of the enemy you want to attack, or \"closest\".",
    "3. \"move\" : Followed by \"towards\" or \"away\", \
     followed by the id of the referenced target.",
    "4. \"retreat\" : Attempts to retreat from the battlefield.",
];

/// Why a player command could not be used.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlayerInputError {
    /// Nothing was typed.
    #[error("Type a combat command, or \"help\" to list them.")]
    Empty,

    /// A lone word that is not a standalone command.
    #[error(
        "I do indeed wonder what you were trying to do by writing only one word in combat. \
         Have you considered typing \"help\" instead?"
    )]
    SingleWord,

    /// First word is not a command.
    #[error("\"{0}\" is not a valid combat action. If you need help, write \"help\" instead.")]
    UnknownCommand(String),

    /// `attack` with more than one target.
    #[error("\"attack\" only takes a single target.")]
    AttackArity,

    /// `move` without exactly a direction and a target.
    #[error("\"move\" takes exactly 2 arguments: \"towards\" or \"away\", then the target id.")]
    MoveArity,

    /// Unknown move direction.
    #[error("\"{0}\" is not valid. Move must be followed by either \"towards\" or \"away\".")]
    MoveDirection(String),

    /// Target id is not a number.
    #[error("Target id must be an integer. Use \"look\" to get the ids of all enemies.")]
    BadTargetId(String),

    /// No enemy has this id.
    #[error("No target by the target id \"{0}\" found.")]
    NoSuchTarget(String),

    /// The enemy is already dead.
    #[error("Target {0} is already dead.")]
    TargetDead(usize),
}

/// Result of one player command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayerInputResult {
    /// The player cannot act right now; input was ignored.
    NotReady,
    /// The command used the player's turn.
    Consumed,
    /// The command was handled without using the turn.
    NotConsumed,
    /// The command was rejected and reported; the turn is still available.
    Rejected(PlayerInputError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::EnumString)]
#[strum(ascii_case_insensitive)]
enum MoveDirection {
    #[strum(serialize = "towards")]
    Towards,
    #[strum(serialize = "away", serialize = "opposite")]
    Away,
}

impl<R: RandomSource> CombatResolver<R> {
    /// Resolve one line of player input.
    ///
    /// Input is only accepted while the player is alive and has a turn
    /// waiting (see [`CombatResolver::awaiting_player_input`]).
    ///
    /// # Errors
    ///
    /// Returns [`CombatError::NoPlayer`] when the combat has no player.
    /// Mistyped commands come back as [`PlayerInputResult::Rejected`].
    pub fn resolve_player_input(
        &mut self,
        raw: &str,
        host: &mut impl CombatHost,
    ) -> Result<PlayerInputResult> {
        let player = self.context.player().ok_or(CombatError::NoPlayer)?;
        let state = self.context.combatant(player)?;
        if !state.is_alive() || !state.awaiting_input {
            return Ok(PlayerInputResult::NotReady);
        }

        let input = raw.trim().to_lowercase();
        let words: Vec<&str> = input.split_whitespace().collect();
        let result = self.run_command(player, &words, host)?;
        tracing::debug!(input = %input, result = ?result, "Player input");

        match &result {
            PlayerInputResult::Consumed => {
                let tick = self.tick;
                let state = self.context.combatant_mut(player)?;
                state.awaiting_input = false;
                state.last_action_tick = tick;
            }
            PlayerInputResult::Rejected(error) => {
                say(host, &error.to_string(), OutputTag::Error);
            }
            PlayerInputResult::NotReady | PlayerInputResult::NotConsumed => {}
        }
        Ok(result)
    }

    fn run_command(
        &mut self,
        player: CombatantId,
        words: &[&str],
        host: &mut impl CombatHost,
    ) -> Result<PlayerInputResult> {
        let Some(&command) = words.first() else {
            return Ok(PlayerInputResult::Rejected(PlayerInputError::Empty));
        };

        match command {
            "retreat" => return self.retreat(player, host),
            "help" => {
                for line in HELP {
                    say(host, line, OutputTag::Info);
                }
                return Ok(PlayerInputResult::NotConsumed);
            }
            "look" => {
                self.look(player, host)?;
                return Ok(PlayerInputResult::NotConsumed);
            }
            _ => {}
        }

        if words.len() < 2 {
            return Ok(PlayerInputResult::Rejected(PlayerInputError::SingleWord));
        }
        match command {
            "attack" => self.attack(player, words, host),
            "move" => self.step(player, words),
            "technique" => {
                say(
                    host,
                    "sorry but \"technique\" is not yet implemented.",
                    OutputTag::Narrator,
                );
                Ok(PlayerInputResult::NotConsumed)
            }
            other => Ok(PlayerInputResult::Rejected(PlayerInputError::UnknownCommand(
                other.to_string(),
            ))),
        }
    }

    fn retreat(
        &mut self,
        player: CombatantId,
        host: &mut impl CombatHost,
    ) -> Result<PlayerInputResult> {
        let chance = self.config.retreat_chance_factor * self.context.power_factor(player);
        if self.rng.next_f64() < chance {
            say(host, "You managed to escape.", OutputTag::Success);
            say(
                host,
                "I'm kind of impressed, you shouldn't have been able to escape unless you are \
                 one of the strongest on the field. Nice.",
                OutputTag::Narrator,
            );
            tracing::info!(chance, "Player retreated");
            host.end_combat(CombatOutcome::Defeat);
        } else {
            say(
                host,
                "Your attempt to retreat from the battlefield was unsuccessful.",
                OutputTag::Warning,
            );
        }
        Ok(PlayerInputResult::Consumed)
    }

    fn look(&self, player: CombatantId, host: &mut impl CombatHost) -> Result<()> {
        let position = self.context.combatant(player)?.position;
        for (index, &enemy) in self.context.enemies().iter().enumerate() {
            let enemy = self.context.combatant(enemy)?;
            let line = if enemy.is_alive() {
                format!(
                    "{} : Distance : {}",
                    index + 1,
                    position.distance_from(enemy.position)
                )
            } else {
                format!("{} : Dead", index + 1)
            };
            say(host, &line, OutputTag::Info);
        }
        Ok(())
    }

    fn attack(
        &mut self,
        player: CombatantId,
        words: &[&str],
        host: &mut impl CombatHost,
    ) -> Result<PlayerInputResult> {
        if words.len() > 2 {
            return Ok(PlayerInputResult::Rejected(PlayerInputError::AttackArity));
        }

        let target = if words[1] == "closest" {
            let Some(target) = self.context.closest_enemy(player) else {
                host.end_combat(CombatOutcome::Win);
                return Ok(PlayerInputResult::NotConsumed);
            };
            target
        } else {
            let (number, target) = match self.enemy_target(words[1]) {
                Ok(found) => found,
                Err(error) => return Ok(PlayerInputResult::Rejected(error)),
            };
            if !self.context.combatant(target)?.is_alive() {
                return Ok(PlayerInputResult::Rejected(PlayerInputError::TargetDead(number)));
            }
            target
        };

        self.resolve_action(&ActionPacket::attack(player, target), host)?;
        Ok(PlayerInputResult::Consumed)
    }

    fn step(&mut self, player: CombatantId, words: &[&str]) -> Result<PlayerInputResult> {
        if words.len() != 3 {
            return Ok(PlayerInputResult::Rejected(PlayerInputError::MoveArity));
        }
        let Ok(direction) = words[1].parse::<MoveDirection>() else {
            return Ok(PlayerInputResult::Rejected(PlayerInputError::MoveDirection(
                words[1].to_string(),
            )));
        };
        let target = match self.enemy_target(words[2]) {
            Ok((_, target)) => target,
            Err(error) => return Ok(PlayerInputResult::Rejected(error)),
        };

        let target_position = self.context.combatant(target)?.position;
        let state = self.context.combatant(player)?;
        let max_move = state.get_stat(StatKind::Agility);
        let position = state.position;
        let distance = position.distance_from(target_position);

        let destination = match direction {
            MoveDirection::Towards => {
                if distance <= 0.0 {
                    return Ok(PlayerInputResult::NotConsumed);
                }
                if distance < max_move {
                    target_position
                } else {
                    position + (target_position - position) / distance * max_move
                }
            }
            MoveDirection::Away => {
                let unit = if distance <= 0.0 {
                    self.random_direction()
                } else {
                    (position - target_position) / distance
                };
                position + unit * max_move
            }
        };
        self.context.combatant_mut(player)?.position = destination;
        Ok(PlayerInputResult::Consumed)
    }

    /// Enemy referred to by a `look` number.
    fn enemy_target(
        &self,
        word: &str,
    ) -> std::result::Result<(usize, CombatantId), PlayerInputError> {
        let number: usize = word
            .parse()
            .map_err(|_| PlayerInputError::BadTargetId(word.to_string()))?;
        let target = self
            .context
            .enemy_by_number(number)
            .ok_or_else(|| PlayerInputError::NoSuchTarget(word.to_string()))?;
        Ok((number, target))
    }

    fn random_direction(&mut self) -> Vector {
        for _ in 0..MAX_DIRECTION_ATTEMPTS {
            let candidate = Vector::new(self.rng.uniform(-1.0, 1.0), self.rng.uniform(-1.0, 1.0));
            if let Ok(unit) = candidate.normalized() {
                return unit;
            }
        }
        Vector::new(1.0, 0.0)
    }
}
