//! # Wuxia Core
//!
//! Combat resolution for a cultivation RPG.
//!
//! Combat is positional and multi-team: up to four teams on a square field,
//! the player's always at the bottom. Techniques run in up to three phases
//! (physical, qi, soul), each spending its own resource. Everything the
//! engine provides (narration sink, end signal, world clock) comes in
//! through [`combat::CombatHost`], and every roll goes through
//! [`rng::RandomSource`], so a combat is reproducible from its seed.
//!
//! This crate does no IO. Content arrives as RON strings.
//!
//! ## Crate Structure
//!
//! - [`combat`] - Context, resolver, phases, AI and player commands
//! - [`entity`] - Entities and what they bring into combat
//! - [`technique`] - Technique definitions and validation
//! - [`packets`] - Damage, defense, modifier, effect and action packets
//! - [`math`] - 2D vectors and shape tests
//! - [`data`] - RON content catalogs

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod combat;
pub mod config;
pub mod cultivation;
pub mod data;
pub mod entity;
pub mod error;
pub mod loadout;
pub mod math;
pub mod packets;
pub mod rng;
pub mod skills;
pub mod stats;
pub mod technique;
pub mod world_time;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::combat::{
        ActionRecord, CombatContext, CombatHost, CombatOutcome, CombatResolver, CombatStarter,
        CombatState, CombatantId, FieldSize, Intent, Location, OutputTag, PlayerInputError,
        PlayerInputResult, RecordingHost, TeamRoster, TeamRule, TeamSlot, TickEvents,
        PLAYER_TEAM,
    };
    pub use crate::config::CombatConfig;
    pub use crate::cultivation::{Cultivation, QiReserves};
    pub use crate::data::TechniqueCatalog;
    pub use crate::entity::{Entity, EntityKind, PLAYER_TAG};
    pub use crate::error::{CombatError, Result};
    pub use crate::math::Vector;
    pub use crate::packets::{ActionKind, ActionPacket, DamagePacket, DamageType};
    pub use crate::rng::{RandomSource, SeededRandom};
    pub use crate::stats::{StatKind, Stats};
    pub use crate::technique::Technique;
    pub use crate::world_time::WorldTimestamp;
}
