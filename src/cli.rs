//! Command-line interface for strictly_chess.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use strictly_chess::{ColorChoice, Opponent};

/// Strictly Chess - terminal chess against a built-in engine
#[derive(Parser, Debug)]
#[command(name = "strictly_chess")]
#[command(about = "Terminal chess front-end with a background search engine", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Play interactively in the terminal
    Play {
        /// Path to a TOML config file (defaults to ./strictly_chess.toml if present)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Opponent: engine or friend
        #[arg(long)]
        opponent: Option<Opponent>,

        /// Engine level, 1-7
        #[arg(short, long)]
        level: Option<u8>,

        /// Your colour: white, black or random
        #[arg(long)]
        color: Option<ColorChoice>,

        /// Start position as FEN
        #[arg(long)]
        fen: Option<String>,
    },

    /// Print the legal moves of a position, grouped by origin square
    Moves {
        /// Position as FEN (defaults to the starting position)
        #[arg(long)]
        fen: Option<String>,
    },

    /// Run one background search and print the response as JSON
    Search {
        /// Position as FEN (defaults to the starting position)
        #[arg(long, conflicts_with = "request")]
        fen: Option<String>,

        /// Search depth in plies
        #[arg(short, long, default_value = "3", conflicts_with = "request")]
        depth: u32,

        /// Raw request JSON: {"positionText": "...", "depth": N}
        #[arg(long)]
        request: Option<String>,
    },

    /// Watch a random mover play the engine
    Demo {
        /// Engine level, 1-7
        #[arg(short, long, default_value = "1")]
        level: u8,

        /// Maximum number of plies to play
        #[arg(short, long, default_value = "20")]
        plies: u32,

        /// Seed for the random mover and colour draw
        #[arg(long)]
        seed: Option<u64>,
    },
}
