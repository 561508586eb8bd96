//! Wuxia Combat - Development Tools
//!
//! # Usage
//!
//! ```bash
//! # Check every technique file in a directory
//! cargo run -p wuxia_tools -- validate data/techniques
//!
//! # Resolve a scenario with scripted player commands
//! cargo run -p wuxia_tools -- simulate data/scenarios/ambush.ron -t data/techniques --json
//!
//! # Fight a scenario from the terminal
//! cargo run -p wuxia_tools -- play data/scenarios/ambush.ron --techniques data/techniques
//! ```
//!
//! Narration goes to stdout, logs to stderr (`RUST_LOG=debug` for detail).

use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use wuxia_core::config::CombatConfig;
use wuxia_core::data::TechniqueCatalog;
use wuxia_tools::runner::{self, CombatRunner, RunConfig, RunSummary};
use wuxia_tools::scenario::{self, Scenario, ScenarioError};
use wuxia_tools::validate;

#[derive(Parser)]
#[command(name = "wuxia")]
#[command(about = "Development tools for Wuxia combat")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate technique data files
    Validate {
        /// Path to technique directory
        #[arg(default_value = "data/techniques")]
        path: PathBuf,
    },

    /// Resolve a scenario with scripted player commands
    Simulate {
        /// Scenario file to load
        scenario: PathBuf,

        #[command(flatten)]
        content: ContentArgs,

        /// Tick limit
        #[arg(long, default_value = "1000")]
        max_ticks: u64,

        /// Print the run summary as JSON instead of narration
        #[arg(long)]
        json: bool,
    },

    /// Fight a scenario interactively
    Play {
        /// Scenario file to load
        scenario: PathBuf,

        #[command(flatten)]
        content: ContentArgs,

        /// Milliseconds between ticks
        #[arg(long, default_value = "500")]
        tick_ms: u64,

        /// Tick limit
        #[arg(long, default_value = "100000")]
        max_ticks: u64,
    },
}

#[derive(clap::Args)]
struct ContentArgs {
    /// Technique directory the scenario's names resolve against
    #[arg(short, long)]
    techniques: Option<PathBuf>,

    /// Combat config file, overriding the scenario's
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Seed, overriding the scenario's
    #[arg(long)]
    seed: Option<u64>,
}

struct Content {
    scenario: Scenario,
    catalog: TechniqueCatalog,
    config: CombatConfig,
    seed: u64,
}

impl ContentArgs {
    fn load(&self, path: &Path) -> Result<Content, Box<dyn std::error::Error>> {
        let scenario = Scenario::load(path)?;
        let catalog = match &self.techniques {
            Some(dir) => validate::load_technique_directory(dir)?,
            None => TechniqueCatalog::new(),
        };
        let config = match &self.config {
            Some(file) => scenario::load_config(file)?,
            None => scenario.config.clone().unwrap_or_default(),
        };
        let seed = self.seed.unwrap_or(scenario.seed);
        Ok(Content {
            scenario,
            catalog,
            config,
            seed,
        })
    }
}

impl Content {
    fn runner<W: Write>(&self, run: RunConfig, out: W) -> Result<CombatRunner<W>, ScenarioError> {
        CombatRunner::new(&self.scenario, &self.catalog, self.config.clone(), run, out)
    }
}

fn print_summary(summary: &RunSummary) {
    match summary.outcome {
        Some(outcome) => println!(
            "{} ended in {outcome} after {} ticks",
            summary.scenario, summary.ticks
        ),
        None => println!(
            "{} was cut off after {} ticks",
            summary.scenario, summary.ticks
        ),
    }
    for combatant in &summary.combatants {
        let status = if combatant.alive { "standing" } else { "down" };
        println!(
            "  {} ({}): {:.1} hp, {status}",
            combatant.name, combatant.team, combatant.hp
        );
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Validate { path } => {
            tracing::info!("Validating technique files in: {}", path.display());
            let report = validate::validate_technique_directory(&path)?;
            for failure in &report.failures {
                println!("FAIL {}: {}", failure.path, failure.reason);
            }
            println!(
                "{} files, {} techniques, {} failures",
                report.files_checked,
                report.techniques,
                report.failures.len()
            );
            report.into_result()?;
        }
        Commands::Simulate {
            scenario,
            content,
            max_ticks,
            json,
        } => {
            let content = content.load(&scenario)?;
            let run = RunConfig {
                seed: content.seed,
                max_ticks,
            };
            let summary = if json {
                content.runner(run, std::io::sink())?.run_scripted()?
            } else {
                content.runner(run, std::io::stdout())?.run_scripted()?
            };
            if json {
                println!("{}", summary.to_json()?);
            } else {
                print_summary(&summary);
            }
        }
        Commands::Play {
            scenario,
            content,
            tick_ms,
            max_ticks,
        } => {
            let content = content.load(&scenario)?;
            let run = RunConfig {
                seed: content.seed,
                max_ticks,
            };
            println!("{}", content.scenario.description);
            println!("Type 'help' for commands.");
            let input = runner::spawn_stdin_reader();
            let summary = content
                .runner(run, std::io::stdout())?
                .run_interactive(&input, Duration::from_millis(tick_ms))?;
            print_summary(&summary);
        }
    }
    Ok(())
}

fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        tracing::error!("{e}");
        std::process::exit(1);
    }
}
