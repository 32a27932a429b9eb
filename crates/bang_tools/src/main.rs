//! Bang Board - Development Tools

use std::path::PathBuf;

use bang_core::prelude::*;
use bang_tools::replay::replay;
use bang_tools::scenario::Scenario;
use bang_tools::summary::BoardSummary;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "board-tools")]
#[command(about = "Development tools for the Bang board")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a board and print its occupancy
    Generate {
        /// Generator config (RON); defaults are used when omitted
        #[arg(long)]
        config: Option<PathBuf>,
        /// Override the seed
        #[arg(long)]
        seed: Option<u64>,
        /// Print the summary as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show where a piece in a scenario can move and fire
    Moves {
        /// Scenario file (RON)
        scenario: PathBuf,
        /// Piece id
        piece: u32,
    },
    /// Replay a scenario through the action scheduler
    Replay {
        /// Scenario file (RON)
        scenario: PathBuf,
        /// Watchdog threshold in milliseconds
        #[arg(long, default_value_t = 5_000)]
        watchdog_ms: u64,
        /// Log every scheduler decision
        #[arg(long)]
        trace: bool,
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let outcome = match cli.command {
        Commands::Generate { config, seed, json } => generate(config, seed, json),
        Commands::Moves { scenario, piece } => moves(&scenario, piece),
        Commands::Replay {
            scenario,
            watchdog_ms,
            trace,
            json,
        } => run_replay(&scenario, watchdog_ms, trace, json),
    };

    if let Err(e) = outcome {
        tracing::error!("{e}");
        std::process::exit(1);
    }
}

type CliResult = std::result::Result<(), Box<dyn std::error::Error>>;

fn generate(config: Option<PathBuf>, seed: Option<u64>, json: bool) -> CliResult {
    let mut generator = match config {
        Some(path) => GeneratorConfig::from_ron_str(&std::fs::read_to_string(path)?)?,
        None => GeneratorConfig::default(),
    };
    if let Some(seed) = seed {
        generator = generator.with_seed(seed);
    }
    tracing::info!(seed = generator.seed, "Generating board");

    let mut board = generate_board(&generator)?;
    board.shadow_pieces(std::iter::empty());
    let summary = BoardSummary::of(&board);
    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print!("{}", board.render_occupancy(None));
        print!("{summary}");
    }
    Ok(())
}

fn moves(path: &std::path::Path, piece_id: PieceId) -> CliResult {
    let scenario = Scenario::load(path)?;
    let piece = scenario
        .piece(piece_id)
        .ok_or_else(|| format!("no piece {piece_id} in {}", path.display()))?;

    let mut board = generate_board(&scenario.generator)?;
    board.shadow_pieces(&scenario.pieces);
    let set = compute_moves(&board, piece, true);

    print!("{}", board.render_occupancy(Some(&set.moves)));
    println!(
        "piece {} at ({}, {}): {} moves, {} attackable tiles",
        piece.piece_id,
        piece.x,
        piece.y,
        set.moves.len(),
        set.attacks.as_ref().map_or(0, TileSet::len)
    );
    Ok(())
}

fn run_replay(path: &std::path::Path, watchdog_ms: u64, trace: bool, json: bool) -> CliResult {
    let scenario = Scenario::load(path)?;
    let config = SchedulerConfig {
        watchdog_ms,
        trace_actions: trace,
    };
    let report = replay(&scenario, config)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        for entry in &report.timeline {
            println!(
                "{:>7}ms  #{:<4} {:<10} {:?} ({}ms)",
                entry.at_ms, entry.action, entry.kind, entry.pieces, entry.duration_ms
            );
        }
        print!("{}", report.final_board);
        println!(
            "{} steps, {}ms, {} actions completed, {} stuck, {} illegal moves, {} missed shots",
            report.steps,
            report.elapsed_ms,
            report.stats.completed,
            report.stuck.len(),
            report.illegal_moves,
            report.missed_shots
        );
    }
    Ok(())
}
