use crate::config::harness::HarnessConfig;
use crate::config::types::GameKind;
use crate::games::numbers::{IntervalCase, NumbersDriver};
use crate::games::{driver_for, GameDriver};
use crate::kernel::signal::{self, SignalHandler};
use crate::observability::{init_event_journal, MetricsSnapshot};
use crate::rating::{EloRating, MatchOutcome};
use crate::report::{rank, LeaderboardRow, SubmissionRecord};
use crate::session::{Entrant, Evaluator};
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// JSON configuration file (defaults are used when absent)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,
    /// C driver program linked against each library for the leak check
    #[arg(long, global = true, value_name = "FILE")]
    audit_source: Option<PathBuf>,
    /// Append submission events as JSON lines to this file
    #[arg(long, global = true, value_name = "FILE")]
    events: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate a numbers (LCM) round
    Numbers {
        /// Entrant as ID=PATH, ID=NULL or PATH
        #[arg(long = "player", value_name = "ENTRANT", required = true)]
        players: Vec<String>,
        /// Fix the interval's lower border instead of drawing one
        #[arg(long, requires = "high")]
        low: Option<i32>,
        /// Fix the interval's upper border
        #[arg(long, requires = "low")]
        high: Option<i32>,
    },
    /// Evaluate a split round over a corpus directory
    Split {
        #[arg(long, value_name = "DIR")]
        corpus: PathBuf,
        #[arg(long = "player", value_name = "ENTRANT", required = true)]
        players: Vec<String>,
    },
    /// Evaluate a strtok round over a corpus file
    Strtok {
        #[arg(long, value_name = "FILE")]
        corpus: PathBuf,
        #[arg(long = "player", value_name = "ENTRANT", required = true)]
        players: Vec<String>,
    },
    /// Update two ratings after a match
    Rate {
        #[arg(long)]
        rating1: f64,
        #[arg(long)]
        rating2: f64,
        /// Result for player 1: win, draw or loss
        #[arg(long)]
        result: MatchOutcome,
    },
}

/// What a round prints on stdout
#[derive(Serialize)]
struct RoundSummary<'a> {
    round_id: &'a str,
    game: GameKind,
    leaderboard: Vec<LeaderboardRow>,
    records: Vec<&'a SubmissionRecord>,
    metrics: MetricsSnapshot,
}

#[derive(Serialize)]
struct RatingSummary {
    rating1: f64,
    rating2: f64,
}

fn parse_entrants(players: &[String]) -> Result<Vec<Entrant>> {
    players
        .iter()
        .map(|arg| Entrant::parse(arg).with_context(|| format!("invalid --player '{}'", arg)))
        .collect()
}

fn build_driver(
    config: &HarnessConfig,
    command: &Commands,
) -> Result<Box<dyn GameDriver>> {
    let driver: Box<dyn GameDriver> = match command {
        Commands::Numbers {
            low: Some(low),
            high: Some(high),
            ..
        } => Box::new(NumbersDriver::with_case(
            config.numbers.clone(),
            IntervalCase::new(*low, *high)?,
        )),
        Commands::Numbers { .. } => driver_for(GameKind::Numbers, config, None)?,
        Commands::Split { corpus, .. } => driver_for(GameKind::Split, config, Some(corpus.as_path()))?,
        Commands::Strtok { corpus, .. } => driver_for(GameKind::Strtok, config, Some(corpus.as_path()))?,
        Commands::Rate { .. } => anyhow::bail!("rate does not evaluate submissions"),
    };
    Ok(driver)
}

fn run_round(cli: &Cli) -> Result<()> {
    let players = match &cli.command {
        Commands::Numbers { players, .. }
        | Commands::Split { players, .. }
        | Commands::Strtok { players, .. } => players,
        Commands::Rate { .. } => anyhow::bail!("rate does not evaluate submissions"),
    };

    let config = HarnessConfig::load_or_default(cli.config.as_deref())?;
    let entrants = parse_entrants(players)?;
    let driver = build_driver(&config, &cli.command)?;

    let mut evaluator = Evaluator::new(config)?.with_interrupt(|| !signal::should_continue());
    if let Some(source) = &cli.audit_source {
        evaluator = evaluator.with_auditor(source.clone());
    } else if evaluator.config().audit.enabled {
        log::warn!("audit.enabled is set but no --audit-source was given; skipping leak checks");
    }

    let records = evaluator.evaluate_round(driver.as_ref(), entrants);
    let ranked = rank(&records);

    let summary = RoundSummary {
        round_id: evaluator.round_id(),
        game: driver.game(),
        leaderboard: ranked.iter().map(|record| record.to_row()).collect(),
        records: ranked,
        metrics: evaluator.metrics().snapshot(),
    };
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

fn run_rate(cli: &Cli, rating1: f64, rating2: f64, outcome: MatchOutcome) -> Result<()> {
    let config = HarnessConfig::load_or_default(cli.config.as_deref())?;
    let elo = EloRating::new(config.rating);
    let (rating1, rating2) = elo.update_pair(rating1, rating2, outcome);
    println!(
        "{}",
        serde_json::to_string_pretty(&RatingSummary { rating1, rating2 })?
    );
    Ok(())
}

pub fn run() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();

    if let Some(path) = &cli.events {
        init_event_journal(path)?;
    }

    match &cli.command {
        Commands::Rate {
            rating1,
            rating2,
            result,
        } => run_rate(&cli, *rating1, *rating2, *result),
        _ => {
            let handler = SignalHandler::init().map_err(anyhow::Error::msg)?;
            run_round(&cli)?;
            if handler.shutdown_requested() {
                anyhow::bail!("round interrupted by signal {}", handler.get_signal());
            }
            Ok(())
        }
    }
}
