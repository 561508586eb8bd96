//! Engine-side collaborators of a combat.

use serde::{Deserialize, Serialize};

use crate::world_time::WorldTimestamp;

/// Category of a narration line, used by the host for styling.
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
    strum::AsRefStr,
)]
#[strum(serialize_all = "snake_case")]
pub enum OutputTag {
    /// Technique narration.
    Combat,
    /// Neutral information.
    Info,
    /// Something went the player's way.
    Success,
    /// Something went against the player.
    Warning,
    /// Player input could not be used.
    Error,
    /// Narrator aside.
    Narrator,
}

/// How a combat ended for the player.
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
    strum::AsRefStr,
)]
#[strum(serialize_all = "snake_case")]
pub enum CombatOutcome {
    /// Every enemy is down.
    Win,
    /// The player's team is down, or the player fled.
    Defeat,
}

/// The engine, as seen from inside a combat.
///
/// `end_combat` may be called on several consecutive ticks while the end
/// condition persists; hosts debounce it.
pub trait CombatHost {
    /// Report narration. Must not block.
    fn output(&mut self, text: &str, tag: OutputTag);

    /// Signal that combat is over.
    fn end_combat(&mut self, outcome: CombatOutcome);

    /// Current world time.
    fn world_time(&self) -> WorldTimestamp;
}

/// Host that records everything it receives.
#[derive(Debug, Clone, Default)]
pub struct RecordingHost {
    /// Narration in order of arrival.
    pub outputs: Vec<(String, OutputTag)>,
    /// Every end signal received.
    pub outcomes: Vec<CombatOutcome>,
    /// World time reported to combat.
    pub now: WorldTimestamp,
}

impl RecordingHost {
    /// Create an empty recorder at time zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Move the world clock forward.
    pub fn advance(&mut self, ticks: u64) {
        self.now = self.now.advanced_by(ticks);
    }

    /// First outcome signalled, if any.
    #[must_use]
    pub fn outcome(&self) -> Option<CombatOutcome> {
        self.outcomes.first().copied()
    }

    /// Whether any narration line contains `needle`.
    #[must_use]
    pub fn said(&self, needle: &str) -> bool {
        self.outputs.iter().any(|(text, _)| text.contains(needle))
    }

    /// Narration lines with a given tag.
    pub fn lines_tagged(&self, tag: OutputTag) -> impl Iterator<Item = &str> {
        self.outputs
            .iter()
            .filter(move |(_, t)| *t == tag)
            .map(|(text, _)| text.as_str())
    }
}

impl CombatHost for RecordingHost {
    fn output(&mut self, text: &str, tag: OutputTag) {
        self.outputs.push((text.to_string(), tag));
    }

    fn end_combat(&mut self, outcome: CombatOutcome) {
        self.outcomes.push(outcome);
    }

    fn world_time(&self) -> WorldTimestamp {
        self.now
    }
}
