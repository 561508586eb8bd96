//! Positional multi-team combat.
//!
//! A [`CombatStarter`] groups a location's entities into teams and builds a
//! [`CombatContext`], which places every combatant on the field. A
//! [`CombatResolver`] then owns the context and is driven one tick at a time
//! by the engine.
//!
//! # Tick Order
//!
//! 1. Win/loss check, signalled through [`CombatHost::end_combat`]
//! 2. Effect refresh and utility effects for every combatant
//! 3. Retargeting of AI combatants without a living target
//! 4. Cooldown check, qi conversion, then AI movement and action

mod ai;
mod context;
mod host;
mod phases;
mod player_input;
mod resolver;
mod starter;
mod state;

use serde::{Deserialize, Serialize};

pub use ai::{generate_action, move_according_to_intent, Intent, TechniqueInsight};
pub use context::{spawn_position, CombatContext, Team, TeamRoster, SPAWN_SPACING};
pub use host::{CombatHost, CombatOutcome, OutputTag, RecordingHost};
pub use phases::{defense_shield, roll_physical, Strike, SHIELD_STABILITY_THRESHOLD};
pub use player_input::{PlayerInputError, PlayerInputResult};
pub use resolver::{can_act, cooldown_ticks, ActionRecord, CombatResolver, TickEvents};
pub use starter::{CombatStarter, FieldSize, Location, TeamRule, MAX_COMMANDERS};
pub use state::{CombatState, EffectPool};

/// Team name reserved for the player's side.
pub const PLAYER_TEAM: &str = "__player__";

/// Handle to a combatant inside one [`CombatContext`].
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct CombatantId(pub usize);

impl CombatantId {
    /// Raw index.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

impl std::fmt::Display for CombatantId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Side of the field a team starts on. Slot 4 belongs to the player.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct TeamSlot(pub u8);

impl TeamSlot {
    /// Number of slots on a field.
    pub const COUNT: usize = 4;

    /// Player slot, bottom-center.
    pub const PLAYER: Self = Self(4);

    /// Slots available to non-player teams, in assignment order.
    pub const OTHERS: [Self; 3] = [Self(1), Self(2), Self(3)];

    /// Whether this is the player's slot.
    #[must_use]
    pub const fn is_player(self) -> bool {
        self.0 == Self::PLAYER.0
    }
}

impl std::fmt::Display for TeamSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "slot {}", self.0)
    }
}
