//! Scenario runner.
//!
//! Drives a [`CombatResolver`] against a host that writes narration to any
//! [`Write`]. The same runner serves both modes:
//!
//! - scripted: the scenario's `player_commands` are fed whenever the player
//!   has a turn, falling back to `attack closest`
//! - interactive: lines arrive on a channel fed by a stdin thread and are
//!   polled with `try_recv` between ticks, so enemies keep acting while the
//!   player thinks

use std::collections::VecDeque;
use std::io::{BufRead, Write};
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::time::Duration;

use serde::Serialize;

use wuxia_core::combat::{
    CombatHost, CombatOutcome, CombatResolver, CombatStarter, CombatantId, OutputTag,
    PlayerInputResult, TickEvents,
};
use wuxia_core::config::CombatConfig;
use wuxia_core::data::TechniqueCatalog;
use wuxia_core::rng::SeededRandom;
use wuxia_core::world_time::WorldTimestamp;

use crate::scenario::{Scenario, ScenarioError};

/// Command issued when a scripted player runs out of commands.
pub const FALLBACK_COMMAND: &str = "attack closest";

/// Host that prints narration and keeps the first end signal.
#[derive(Debug)]
pub struct ConsoleHost<W: Write> {
    out: W,
    now: WorldTimestamp,
    outcome: Option<CombatOutcome>,
}

impl<W: Write> ConsoleHost<W> {
    /// Create a host at world time zero.
    pub fn new(out: W) -> Self {
        Self {
            out,
            now: WorldTimestamp::default(),
            outcome: None,
        }
    }

    /// Move the world clock forward.
    pub fn advance(&mut self, ticks: u64) {
        self.now = self.now.advanced_by(ticks);
    }

    /// The outcome, once combat has ended.
    #[must_use]
    pub fn outcome(&self) -> Option<CombatOutcome> {
        self.outcome
    }

    /// Give back the writer.
    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> CombatHost for ConsoleHost<W> {
    fn output(&mut self, text: &str, tag: OutputTag) {
        if let Err(error) = writeln!(self.out, "[{tag}] {text}") {
            tracing::warn!(%error, "Failed to write combat output");
        }
    }

    fn end_combat(&mut self, outcome: CombatOutcome) {
        if self.outcome.is_none() {
            tracing::info!(%outcome, time = %self.now, "Combat ended");
            self.outcome = Some(outcome);
        }
    }

    fn world_time(&self) -> WorldTimestamp {
        self.now
    }
}

/// Runner limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunConfig {
    /// Seed for the random source.
    pub seed: u64,
    /// Ticks before the run is cut off.
    pub max_ticks: u64,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            max_ticks: 1_000,
        }
    }
}

/// One combatant at the end of a run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CombatantSummary {
    /// Entity id.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Team name.
    pub team: String,
    /// Remaining hp.
    pub hp: f64,
    /// Whether still standing.
    pub alive: bool,
}

/// What happened in a run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    /// Scenario name.
    pub scenario: String,
    /// Seed used.
    pub seed: u64,
    /// Ticks resolved.
    pub ticks: u64,
    /// How it ended; `None` if cut off.
    pub outcome: Option<CombatOutcome>,
    /// Actions resolved, AI and player alike.
    pub actions: usize,
    /// Player commands that used the turn.
    pub player_turns: usize,
    /// Entity ids in order of death.
    pub deaths: Vec<String>,
    /// Final state of everyone.
    pub combatants: Vec<CombatantSummary>,
}

impl RunSummary {
    /// Pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// A scenario being fought.
#[derive(Debug)]
pub struct CombatRunner<W: Write> {
    scenario: String,
    run: RunConfig,
    resolver: CombatResolver<SeededRandom>,
    host: ConsoleHost<W>,
    commands: VecDeque<String>,
    actions: usize,
    player_turns: usize,
    fallen: Vec<CombatantId>,
    deaths: Vec<String>,
}

impl<W: Write> CombatRunner<W> {
    /// Build the scenario's combat.
    ///
    /// # Errors
    ///
    /// Returns an error if the scenario cannot be turned into a combat.
    pub fn new(
        scenario: &Scenario,
        catalog: &TechniqueCatalog,
        config: CombatConfig,
        run: RunConfig,
        out: W,
    ) -> Result<Self, ScenarioError> {
        let context = scenario.build_context(catalog)?;
        let fallen = context
            .iter()
            .filter(|(_, state)| !state.is_alive())
            .map(|(id, _)| id)
            .collect();
        let resolver = CombatStarter::start_combat(context, SeededRandom::new(run.seed), config);
        Ok(Self {
            scenario: scenario.name.clone(),
            run,
            resolver,
            host: ConsoleHost::new(out),
            commands: scenario.player_commands.iter().cloned().collect(),
            actions: 0,
            player_turns: 0,
            fallen,
            deaths: Vec::new(),
        })
    }

    /// The resolver.
    #[must_use]
    pub fn resolver(&self) -> &CombatResolver<SeededRandom> {
        &self.resolver
    }

    /// Whether combat ended or the tick limit was reached.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.host.outcome().is_some() || self.resolver.tick_count() >= self.run.max_ticks
    }

    /// Advance the world clock and resolve one tick.
    ///
    /// # Errors
    ///
    /// Returns an error if resolution fails.
    pub fn step(&mut self) -> Result<TickEvents, ScenarioError> {
        self.host.advance(1);
        let events = self.resolver.tick(&mut self.host)?;
        self.actions += events.actions.len();
        self.record_deaths();
        Ok(events)
    }

    // Player attacks land between ticks, so tick events alone miss them.
    fn record_deaths(&mut self) {
        for (id, state) in self.resolver.context().iter() {
            if !state.is_alive() && !self.fallen.contains(&id) {
                self.fallen.push(id);
                self.deaths.push(state.entity.id.clone());
            }
        }
    }

    /// Hand one line of player input to combat.
    ///
    /// # Errors
    ///
    /// Returns an error if resolving the command fails.
    pub fn submit(&mut self, line: &str) -> Result<PlayerInputResult, ScenarioError> {
        let result = self.resolver.resolve_player_input(line, &mut self.host)?;
        if result == PlayerInputResult::Consumed {
            self.actions += 1;
            self.player_turns += 1;
            self.record_deaths();
        }
        tracing::debug!(command = line, ?result, "Player input");
        Ok(result)
    }

    fn play_scripted_turn(&mut self) -> Result<(), ScenarioError> {
        while self.resolver.awaiting_player_input() && self.host.outcome().is_none() {
            let command = self
                .commands
                .pop_front()
                .unwrap_or_else(|| FALLBACK_COMMAND.to_string());
            self.submit(&command)?;
        }
        Ok(())
    }

    /// Fight to the end with scripted player commands.
    ///
    /// # Errors
    ///
    /// Returns an error if resolution fails.
    pub fn run_scripted(mut self) -> Result<RunSummary, ScenarioError> {
        while !self.is_finished() {
            self.step()?;
            self.play_scripted_turn()?;
        }
        Ok(self.summary())
    }

    /// Fight to the end reading player commands from `input`.
    ///
    /// Sleeps `tick_interval` between ticks. Stops early once `input`
    /// disconnects while the player has a turn.
    ///
    /// # Errors
    ///
    /// Returns an error if resolution fails.
    pub fn run_interactive(
        mut self,
        input: &Receiver<String>,
        tick_interval: Duration,
    ) -> Result<RunSummary, ScenarioError> {
        while !self.is_finished() {
            self.step()?;
            while self.resolver.awaiting_player_input() && self.host.outcome().is_none() {
                match input.try_recv() {
                    Ok(line) => {
                        self.submit(line.trim())?;
                    }
                    Err(TryRecvError::Empty) => break,
                    Err(TryRecvError::Disconnected) => {
                        tracing::info!("Input closed, leaving combat");
                        return Ok(self.summary());
                    }
                }
            }
            std::thread::sleep(tick_interval);
        }
        Ok(self.summary())
    }

    /// Summary of the run so far.
    #[must_use]
    pub fn summary(&self) -> RunSummary {
        RunSummary {
            scenario: self.scenario.clone(),
            seed: self.run.seed,
            ticks: self.resolver.tick_count(),
            outcome: self.host.outcome(),
            actions: self.actions,
            player_turns: self.player_turns,
            deaths: self.deaths.clone(),
            combatants: self
                .resolver
                .context()
                .iter()
                .map(|(_, state)| CombatantSummary {
                    id: state.entity.id.clone(),
                    name: state.entity.name.clone(),
                    team: state.team.clone(),
                    hp: state.entity.hp,
                    alive: state.is_alive(),
                })
                .collect(),
        }
    }
}

/// Forward stdin lines to a channel from a background thread.
pub fn spawn_stdin_reader() -> Receiver<String> {
    let (sender, receiver) = mpsc::channel();
    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            if sender.send(line).is_err() {
                break;
            }
        }
    });
    receiver
}
