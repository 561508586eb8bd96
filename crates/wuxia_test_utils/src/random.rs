//! Scripted random sources.
//!
//! Combat draws every roll from a [`RandomSource`]; scripting the rolls
//! pins hit, crit and retreat outcomes exactly.

use std::collections::VecDeque;

use wuxia_core::rng::RandomSource;

/// Replays a fixed sequence of rolls, then a fallback value forever.
#[derive(Debug, Clone, PartialEq)]
pub struct ScriptedRandom {
    rolls: VecDeque<f64>,
    fallback: f64,
    drawn: usize,
}

impl ScriptedRandom {
    /// Replay `rolls`, then `0.5`.
    #[must_use]
    pub fn new(rolls: impl IntoIterator<Item = f64>) -> Self {
        Self {
            rolls: rolls.into_iter().collect(),
            fallback: 0.5,
            drawn: 0,
        }
    }

    /// Always return `value`.
    #[must_use]
    pub fn constant(value: f64) -> Self {
        Self::new([]).with_fallback(value)
    }

    /// Value returned once the script runs out.
    #[must_use]
    pub fn with_fallback(mut self, fallback: f64) -> Self {
        self.fallback = fallback;
        self
    }

    /// Rolls left in the script.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.rolls.len()
    }

    /// Rolls drawn so far, script and fallback alike.
    #[must_use]
    pub fn drawn(&self) -> usize {
        self.drawn
    }
}

impl RandomSource for ScriptedRandom {
    fn next_f64(&mut self) -> f64 {
        self.drawn += 1;
        self.rolls.pop_front().unwrap_or(self.fallback)
    }
}
