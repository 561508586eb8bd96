//! Determinism testing utilities.
//!
//! Provides a harness for verifying that a seeded combat produces identical
//! results given identical inputs.
//!
//! # Testing Strategy
//!
//! Every roll in combat goes through a [`RandomSource`]. With a seeded
//! source, the only other inputs are the entity data and the host's clock,
//! so two runs from the same setup must hash identically tick for tick.
//! Floats are hashed by bit pattern.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use wuxia_core::combat::{CombatContext, CombatHost, CombatResolver, RecordingHost};
use wuxia_core::rng::{RandomSource, SeededRandom};

/// Result of a determinism test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeterminismResult {
    /// Whether all runs produced identical results.
    pub is_deterministic: bool,
    /// Hashes from each run.
    pub hashes: Vec<u64>,
    /// Number of ticks simulated.
    pub ticks: u64,
}

impl DeterminismResult {
    /// Get all unique hashes (should be 1 for a deterministic combat).
    #[must_use]
    pub fn unique_hashes(&self) -> Vec<u64> {
        let mut unique: Vec<u64> = self.hashes.clone();
        unique.sort_unstable();
        unique.dedup();
        unique
    }

    /// Assert that the runs matched, with a detailed error message.
    ///
    /// # Panics
    ///
    /// Panics if the runs produced different hashes.
    pub fn assert_deterministic(&self) {
        if !self.is_deterministic {
            let unique = self.unique_hashes();
            panic!(
                "Combat is non-deterministic!\n\
                 Runs: {}\n\
                 Ticks: {}\n\
                 Unique hashes: {} (expected 1)\n\
                 All hashes: {:?}",
                self.hashes.len(),
                self.ticks,
                unique.len(),
                self.hashes
            );
        }
    }
}

/// Run a simulation multiple times and verify determinism.
///
/// # Arguments
///
/// * `runs` - Number of times to run the simulation
/// * `ticks` - Number of ticks to simulate per run
/// * `setup` - Function to create initial state
/// * `step` - Function to advance state by one tick
/// * `hash` - Function to compute state hash
pub fn verify_determinism<S, Setup, Step, HashFn>(
    runs: usize,
    ticks: u64,
    setup: Setup,
    step: Step,
    hash: HashFn,
) -> DeterminismResult
where
    Setup: Fn() -> S,
    Step: Fn(&mut S),
    HashFn: Fn(&S) -> u64,
{
    let mut hashes = Vec::with_capacity(runs);

    for _ in 0..runs {
        let mut state = setup();

        for _ in 0..ticks {
            step(&mut state);
        }

        hashes.push(hash(&state));
    }

    let is_deterministic = hashes.windows(2).all(|w| w[0] == w[1]);

    DeterminismResult {
        is_deterministic,
        hashes,
        ticks,
    }
}

/// A combat in progress together with the host recording it.
#[derive(Debug)]
pub struct CombatRun<R: RandomSource = SeededRandom> {
    /// The resolver.
    pub resolver: CombatResolver<R>,
    /// The host; its clock advances one unit per step.
    pub host: RecordingHost,
    /// Set once a tick returned an error; later steps do nothing.
    pub failed: bool,
}

impl<R: RandomSource> CombatRun<R> {
    /// Start a run at world time zero.
    #[must_use]
    pub fn new(resolver: CombatResolver<R>) -> Self {
        Self {
            resolver,
            host: RecordingHost::new(),
            failed: false,
        }
    }

    /// Advance the clock and run one tick.
    pub fn step(&mut self) {
        if self.failed {
            return;
        }
        self.host.advance(1);
        if let Err(error) = self.resolver.tick(&mut self.host) {
            tracing::debug!(%error, "Combat tick failed");
            self.failed = true;
        }
    }

    /// Hash of the combat plus everything the host has seen.
    #[must_use]
    pub fn fingerprint(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        combat_fingerprint(self.resolver.context()).hash(&mut hasher);
        self.resolver.tick_count().hash(&mut hasher);
        self.failed.hash(&mut hasher);
        for (text, tag) in &self.host.outputs {
            text.hash(&mut hasher);
            tag.hash(&mut hasher);
        }
        self.host.outcomes.hash(&mut hasher);
        self.host.world_time().ticks().hash(&mut hasher);
        hasher.finish()
    }
}

/// Verify that combats built by `setup` replay identically.
///
/// Runs the combat twice for `num_ticks` and compares fingerprints.
pub fn verify_combat_determinism<R, F>(setup: F, num_ticks: u64) -> bool
where
    R: RandomSource,
    F: Fn() -> CombatResolver<R>,
{
    verify_determinism(
        2,
        num_ticks,
        || CombatRun::new(setup()),
        CombatRun::step,
        CombatRun::fingerprint,
    )
    .is_deterministic
}

/// Compare two runs tick-by-tick, finding first divergence.
///
/// # Returns
///
/// `None` if the runs match throughout, `Some(tick)` if they diverge at
/// that tick.
pub fn find_first_divergence<R, F>(setup: F, num_ticks: u64) -> Option<u64>
where
    R: RandomSource,
    F: Fn() -> CombatResolver<R>,
{
    let mut first = CombatRun::new(setup());
    let mut second = CombatRun::new(setup());

    if first.fingerprint() != second.fingerprint() {
        return Some(0);
    }

    for tick in 1..=num_ticks {
        first.step();
        second.step();

        if first.fingerprint() != second.fingerprint() {
            tracing::debug!(tick, "Combat runs diverged");
            return Some(tick);
        }
    }

    None
}

/// Hash of every combatant's mutable combat state.
#[must_use]
pub fn combat_fingerprint(context: &CombatContext) -> u64 {
    let mut hasher = DefaultHasher::new();
    for (id, state) in context.iter() {
        id.hash(&mut hasher);
        state.is_alive().hash(&mut hasher);
        for value in [
            state.entity.hp,
            state.entity.stamina,
            state.entity.cultivation.soul,
            state.entity.cultivation.qi.total(),
            state.usable_qi,
            state.position.x,
            state.position.y,
        ] {
            value.to_bits().hash(&mut hasher);
        }
        state.target.hash(&mut hasher);
        state.last_action_tick.hash(&mut hasher);
        state.defense_techniques.len().hash(&mut hasher);
        state.effects.len().hash(&mut hasher);
    }
    hasher.finish()
}

/// Compute a simple hash for any hashable value.
pub fn compute_hash<T: Hash>(value: &T) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}

/// Proptest strategies for combat testing.
pub mod strategies {
    use proptest::prelude::*;
    use wuxia_core::combat::TeamRule;
    use wuxia_core::entity::{Entity, EntityKind};
    use wuxia_core::math::Vector;

    use crate::fixtures;

    /// Tags enemies are drawn from.
    pub const TAG_POOL: [&str; 4] = ["Bandit", "Wolf", "Cultist", "Elite"];

    /// Power factor, including zero and values above one.
    pub fn arb_power_factor() -> impl Strategy<Value = f64> {
        prop_oneof![Just(0.0), 0.0f64..2.0]
    }

    /// Minimum action frequency.
    pub fn arb_min_frequency() -> impl Strategy<Value = f64> {
        0.01f64..1.0
    }

    /// Position on a field of side `field_size`.
    pub fn arb_position(field_size: f64) -> impl Strategy<Value = Vector> {
        (0.0..field_size, 0.0..field_size).prop_map(|(x, y)| Vector::new(x, y))
    }

    /// Non-empty subset of [`TAG_POOL`].
    pub fn arb_tags() -> impl Strategy<Value = Vec<String>> {
        proptest::sample::subsequence(TAG_POOL.to_vec(), 1..=TAG_POOL.len())
            .prop_map(|tags| tags.into_iter().map(ToString::to_string).collect())
    }

    /// A human enemy carrying a random tag set.
    pub fn arb_enemy() -> impl Strategy<Value = Entity> {
        (arb_tags(), 1.0f64..20.0, 1.0f64..10.0).prop_map(|(tags, agility, luck)| {
            let stats = fixtures::stats(agility, luck);
            let mut entity = Entity::new("enemy", "Enemy", EntityKind::Human, stats);
            entity.tags.extend(tags);
            entity
        })
    }

    /// One player plus up to `max_enemies` tagged enemies, ids unique.
    pub fn arb_roster(max_enemies: usize) -> impl Strategy<Value = Vec<Entity>> {
        proptest::collection::vec(arb_enemy(), 0..=max_enemies).prop_map(|enemies| {
            let mut roster = vec![fixtures::player(10.0, 5.0)];
            for (index, mut enemy) in enemies.into_iter().enumerate() {
                enemy.id = format!("enemy_{index}");
                roster.push(enemy);
            }
            roster
        })
    }

    /// The player rule followed by up to five single-tag rules.
    pub fn arb_team_rules() -> impl Strategy<Value = Vec<TeamRule>> {
        proptest::collection::vec(proptest::sample::select(TAG_POOL.to_vec()), 0..=5).prop_map(
            |tags| {
                let mut rules = vec![TeamRule::player()];
                for (index, tag) in tags.into_iter().enumerate() {
                    rules.push(TeamRule::new(
                        format!("team_{}", index + 1),
                        vec![vec![tag.to_string()]],
                    ));
                }
                rules
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;
    use crate::random::ScriptedRandom;
    use wuxia_core::config::CombatConfig;

    #[test]
    fn test_verify_determinism_simple() {
        let result = verify_determinism(3, 100, || 0u64, |n| *n += 1, |n| *n);

        assert!(result.is_deterministic);
        assert_eq!(result.hashes, vec![100, 100, 100]);
    }

    #[test]
    fn test_unique_hashes() {
        let result = DeterminismResult {
            is_deterministic: false,
            hashes: vec![3, 1, 3],
            ticks: 1,
        };
        assert_eq!(result.unique_hashes(), vec![1, 3]);
    }

    fn seeded_duel() -> CombatResolver {
        let context = fixtures::duel(
            fixtures::player(10.0, 5.0),
            fixtures::bandit("b", 6.0, 3.0).with_technique(fixtures::open_palm()),
            4.0,
        );
        CombatResolver::new(context, SeededRandom::new(17), CombatConfig::default())
    }

    #[test]
    fn test_seeded_combat_is_deterministic() {
        assert!(verify_combat_determinism(seeded_duel, 50));
        assert_eq!(find_first_divergence(seeded_duel, 50), None);
    }

    #[test]
    fn test_scripted_combat_is_deterministic() {
        let setup = || {
            let context = fixtures::duel(fixtures::player(10.0, 5.0), fixtures::wolf("w"), 2.0);
            CombatResolver::new(context, ScriptedRandom::constant(0.3), CombatConfig::default())
        };
        assert!(verify_combat_determinism(setup, 20));
    }

    #[test]
    fn test_combat_fingerprint_changes_with_hp() {
        let mut context = fixtures::duel(fixtures::player(10.0, 5.0), fixtures::wolf("w"), 2.0);
        let before = combat_fingerprint(&context);
        context
            .combatant_mut(wuxia_core::combat::CombatantId(1))
            .unwrap()
            .entity
            .lose_hp(1.0);
        assert_ne!(before, combat_fingerprint(&context));
    }
}
