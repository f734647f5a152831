//! Terminal front-end: setup screen and interactive board.

mod board_grid;
mod controller;
mod screen;
mod screens;
mod selection;

pub use board_grid::{BoardGrid, glyph};
pub use controller::AppController;
pub use screen::{Screen, ScreenTransition};
pub use screens::{BoardScreen, SetupScreen};
pub use selection::{DragOutcome, DragSelection};

use std::io;
use std::sync::Arc;

use anyhow::Context;
use crossterm::{
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend};
use tracing::{error, info, warn};

use crate::config::PlayConfig;
use crate::engine::Engine;

/// Restores the terminal when dropped, including on early return.
struct TerminalGuard;

impl TerminalGuard {
    fn enter() -> io::Result<Self> {
        enable_raw_mode()?;
        execute!(io::stdout(), EnterAlternateScreen)?;
        Ok(Self)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        info!("Restoring terminal");
        if let Err(e) = disable_raw_mode() {
            warn!(error = %e, "Failed to disable raw mode");
        }
        if let Err(e) = execute!(io::stdout(), LeaveAlternateScreen) {
            warn!(error = %e, "Failed to leave alternate screen");
        }
    }
}

/// Runs the interactive front-end until the user quits.
///
/// Logs go to the configured log file so they never corrupt the terminal.
///
/// # Errors
///
/// Fails if the log file or terminal cannot be set up, or on a terminal I/O
/// error during the session.
pub async fn run_tui<E: Engine>(engine: Arc<E>, config: PlayConfig) -> anyhow::Result<()> {
    let log_file = std::fs::File::create(config.log_file())
        .with_context(|| format!("Failed to create log file {}", config.log_file().display()))?;
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,strictly_chess=debug".into()),
        )
        .with_writer(Arc::new(log_file))
        .with_ansi(false)
        .try_init();

    info!("Starting Strictly Chess TUI");

    let guard = TerminalGuard::enter().context("Failed to set up terminal")?;
    let mut terminal = Terminal::new(CrosstermBackend::new(io::stdout()))?;
    terminal.clear()?;

    let mut app = AppController::new(engine, config);
    let res = app.run(&mut terminal).await;

    drop(app);
    terminal.show_cursor()?;
    drop(guard);

    if let Err(e) = &res {
        error!(error = ?e, "Event loop error");
    }
    res
}
