//! Strictly Chess - unified CLI
//!
//! Interactive terminal play plus headless commands for inspecting positions
//! and running searches.

#![warn(missing_docs)]

mod cli;

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Command};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use strictly_chess::{
    BotTurn, ChessEngine, ColorChoice, Engine, EnginePosition, GameSetup, GameStateController,
    Opponent, Phase, PlayConfig, QueryCoordinator, QueryRequest,
};
use tracing::{info, instrument, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    match cli.command {
        Command::Play {
            config,
            opponent,
            level,
            color,
            fen,
        } => {
            let config = PlayConfig::load(config.as_deref())?
                .with_overrides(opponent, level, color, fen)?;
            strictly_chess::run_tui(Arc::new(ChessEngine::new()), config).await
        }
        Command::Moves { fen } => {
            initialize_tracing();
            print_moves(fen.as_deref())
        }
        Command::Search {
            fen,
            depth,
            request,
        } => {
            initialize_tracing();
            run_search(fen, depth, request).await
        }
        Command::Demo { level, plies, seed } => {
            initialize_tracing();
            run_demo(level, plies, seed).await
        }
    }
}

#[instrument]
fn initialize_tracing() {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,strictly_chess=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    info!("Tracing initialized");
}

/// Prints the board and the legality index of a position.
#[instrument]
fn print_moves(fen: Option<&str>) -> Result<()> {
    let engine = ChessEngine::new();
    let controller = GameStateController::new(engine.new_position(fen)?);
    let index = controller.legality_index()?;

    println!("{}\n", controller.position().board_text());
    println!(
        "{} to move, {} legal moves ({})",
        if index.white_to_move() { "White" } else { "Black" },
        index.move_count(),
        controller.status().label()
    );

    let mut origins: Vec<_> = index.origins().collect();
    origins.sort();
    for origin in origins {
        let mut destinations: Vec<_> = index
            .destinations(origin)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default();
        destinations.sort();
        let destinations: Vec<String> = destinations.iter().map(|d| d.to_string()).collect();
        println!("{}: {}", origin, destinations.join(" "));
    }
    Ok(())
}

/// Dispatches one query through the coordinator and prints the response.
#[instrument(skip(request))]
async fn run_search(fen: Option<String>, depth: u32, request: Option<String>) -> Result<()> {
    let engine = Arc::new(ChessEngine::new());
    let request = match request {
        Some(json) => serde_json::from_str::<QueryRequest>(&json).context("Invalid request JSON")?,
        None => {
            let position = engine.new_position(fen.as_deref())?;
            QueryRequest::new(position.to_position_text(), depth)
        }
    };

    let mut coordinator = QueryCoordinator::new(engine);
    let mut query = coordinator.start_query(request.position_text, request.depth)?;
    let response = query.result().await?;
    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}

/// Plays random human moves against the engine through the phase machine.
#[instrument]
async fn run_demo(level: u8, plies: u32, seed: Option<u64>) -> Result<()> {
    let seed = seed.unwrap_or_else(rand::random);
    info!(seed, "Starting demo");
    let mut rng = StdRng::seed_from_u64(seed);

    let config = PlayConfig::default().with_overrides(
        Some(Opponent::Engine),
        Some(level),
        Some(ColorChoice::Random),
        None,
    )?;
    let setup: GameSetup = config.setup();

    let mut phase = Phase::new();
    phase.start(Arc::new(ChessEngine::new()), &setup, None, &mut rng)?;
    let Some(game) = phase.game_mut() else {
        anyhow::bail!("Game did not start");
    };
    if let Some(bot) = game.bot() {
        println!("Engine plays {} at depth {} (seed {})", bot.side, bot.depth, seed);
    }

    for ply in 1..=plies {
        if game.status().is_over() {
            break;
        }
        if game.is_automated_turn() {
            match game.next_bot_move().await? {
                BotTurn::Moved(m) => println!(
                    "{:>3}. engine {} (score {}, {} nodes)",
                    ply, m.mv, m.score, m.nodes_searched
                ),
                BotTurn::NoMove => break,
                other => {
                    warn!(?other, "Unexpected engine outcome, retrying");
                    game.retry_query()?;
                }
            }
        } else {
            let mut moves: Vec<_> = game.legality().moves().collect();
            moves.sort_by_key(|m| (m.origin, m.destination));
            let Some(&mv) = moves.choose(&mut rng) else {
                break;
            };
            game.play(mv)?;
            println!("{:>3}. random {}", ply, mv);
        }
    }

    println!("{}\n\n{}", game.board_text(), game.status().label());
    Ok(())
}
