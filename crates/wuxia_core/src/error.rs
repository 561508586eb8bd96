//! Error types for the combat core.

use thiserror::Error;

/// Result type alias using [`CombatError`].
pub type Result<T> = std::result::Result<T, CombatError>;

/// Top-level error type for combat setup and resolution.
///
/// Every variant is fatal: content errors surface while building a combat,
/// runtime errors indicate a caller bug. Player typos never reach this type.
#[derive(Debug, Error)]
pub enum CombatError {
    /// Stat name that is not one of the six base stats.
    #[error("Unknown stat: {0}")]
    UnknownStat(String),

    /// Technique failed content validation.
    #[error("Invalid technique '{technique}': {reason}")]
    InvalidTechnique {
        /// Technique name.
        technique: String,
        /// What was wrong with it.
        reason: String,
    },

    /// Two techniques in one catalog share a name.
    #[error("Duplicate technique: {0}")]
    DuplicateTechnique(String),

    /// Team layout has no player team.
    #[error("Team layout is missing the player team '{0}'")]
    MissingPlayerTeam(String),

    /// Two team rules share a name.
    #[error("Duplicate team: {0}")]
    DuplicateTeam(String),

    /// Team layout has more teams than the field has sides.
    #[error("Too many teams: {count} (max {max})")]
    TooManyTeams {
        /// Number of teams supplied.
        count: usize,
        /// Maximum supported.
        max: usize,
    },

    /// More commanders than available non-player slots.
    #[error("Too many commanders: {count} (max {max})")]
    TooManyCommanders {
        /// Number of commanders supplied.
        count: usize,
        /// Maximum supported.
        max: usize,
    },

    /// Two commanders would produce the same team.
    #[error("Commanders share an identical tag set: {0:?}")]
    DuplicateCommanderTags(Vec<String>),

    /// Attempted to merge modifier packets for different attributes.
    #[error("Cannot merge modifier '{left}' with '{right}'")]
    ModifierMismatch {
        /// Attribute of the receiving packet.
        left: String,
        /// Attribute of the packet being merged in.
        right: String,
    },

    /// Action name that is not a known action type.
    #[error("Unknown action type: {0}")]
    UnknownAction(String),

    /// Known action type without an implementation.
    #[error("Action type '{0}' is not supported")]
    UnsupportedAction(String),

    /// Technique action without the resource amount one of its phases needs.
    #[error("Technique '{technique}' requires a {resource} amount")]
    MissingResource {
        /// Technique name.
        technique: String,
        /// Missing resource.
        resource: String,
    },

    /// Technique action without a technique.
    #[error("Technique action carries no technique")]
    MissingTechnique,

    /// Handle that does not belong to this combat.
    #[error("Combatant not found: {0}")]
    UnknownCombatant(usize),

    /// Player command issued in a combat without a player combatant.
    #[error("Combat has no player combatant")]
    NoPlayer,

    /// Normalizing a vector of length zero.
    #[error("Cannot normalize a zero-length vector")]
    ZeroLengthVector,

    /// Content data failed to parse.
    #[error("Failed to parse content: {0}")]
    Parse(#[from] ron::error::SpannedError),
}
