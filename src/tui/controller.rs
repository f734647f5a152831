//! App controller: owns the phase and drives the screens.

use std::sync::Arc;

use crossterm::event::{self, Event, KeyEvent, KeyEventKind};
use ratatui::{Terminal, backend::Backend};
use tokio::time::{Duration, sleep};
use tracing::{debug, error, info, instrument};

use crate::config::PlayConfig;
use crate::engine::Engine;
use crate::phase::{GameSetup, Phase};
use crate::tui::screen::{Screen, ScreenTransition};
use crate::tui::screens::{BoardScreen, SetupScreen};

/// Active screen.
#[derive(Debug)]
enum ActiveScreen {
    Setup(SetupScreen),
    Board(BoardScreen),
}

/// Drives setup and play over one terminal session.
///
/// Call [`AppController::run`] to start the event loop.
#[derive(Debug)]
pub struct AppController<E: Engine> {
    engine: Arc<E>,
    config: PlayConfig,
    last_setup: GameSetup,
    phase: Phase<E>,
    screen: ActiveScreen,
}

impl<E: Engine> AppController<E> {
    /// Creates a controller on the setup screen.
    #[instrument(skip(engine))]
    pub fn new(engine: Arc<E>, config: PlayConfig) -> Self {
        info!("Creating AppController");
        let last_setup = config.setup();
        Self {
            engine,
            config,
            last_setup,
            screen: ActiveScreen::Setup(SetupScreen::new(last_setup)),
            phase: Phase::new(),
        }
    }

    /// The current phase.
    pub fn phase(&self) -> &Phase<E> {
        &self.phase
    }

    /// Whether the board screen is showing.
    pub fn on_board(&self) -> bool {
        matches!(self.screen, ActiveScreen::Board(_))
    }

    /// Runs the event loop until the user quits.
    #[instrument(skip(self, terminal))]
    pub async fn run<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> anyhow::Result<()>
    where
        <B as Backend>::Error: Send + Sync + 'static,
    {
        info!("Starting event loop");
        loop {
            self.tick();
            terminal.draw(|f| match &self.screen {
                ActiveScreen::Setup(s) => s.render(f, &self.phase),
                ActiveScreen::Board(s) => s.render(f, &self.phase),
            })?;

            if event::poll(Duration::from_millis(100))? {
                if let Event::Key(key) = event::read()? {
                    // crossterm reports both press and release on some platforms.
                    if key.kind == KeyEventKind::Release {
                        continue;
                    }
                    if !self.handle_key(key) {
                        info!("Quitting");
                        return Ok(());
                    }
                }
            }

            sleep(Duration::from_millis(10)).await;
        }
    }

    /// Lets the active screen pick up engine moves.
    pub fn tick(&mut self) {
        match &mut self.screen {
            ActiveScreen::Setup(s) => s.tick(&mut self.phase),
            ActiveScreen::Board(s) => s.tick(&mut self.phase),
        }
    }

    /// Routes a key to the active screen. Returns false on quit.
    #[instrument(skip(self, key))]
    pub fn handle_key(&mut self, key: KeyEvent) -> bool {
        let transition = match &mut self.screen {
            ActiveScreen::Setup(s) => s.handle_key(key, &mut self.phase),
            ActiveScreen::Board(s) => s.handle_key(key, &mut self.phase),
        };
        self.apply_transition(transition)
    }

    #[instrument(skip(self))]
    fn apply_transition(&mut self, transition: ScreenTransition) -> bool {
        match transition {
            ScreenTransition::Stay => {}
            ScreenTransition::StartGame(setup) => self.start_game(setup),
            ScreenTransition::NewGame => {
                // Dropping the active game cancels its query.
                self.phase = Phase::new();
                info!("Returned to setup");
                self.screen = ActiveScreen::Setup(SetupScreen::new(self.last_setup));
            }
            ScreenTransition::Quit => return false,
        }
        true
    }

    #[instrument(skip(self))]
    fn start_game(&mut self, setup: GameSetup) {
        let mut rng = rand::thread_rng();
        let result = self.phase.start(
            Arc::clone(&self.engine),
            &setup,
            self.config.start_position().as_deref(),
            &mut rng,
        );
        match result {
            Ok(()) => {
                debug!("Switching to board screen");
                self.last_setup = setup;
                self.screen = ActiveScreen::Board(BoardScreen::new());
            }
            Err(e) => {
                error!(error = %e, "Failed to start game");
                if let ActiveScreen::Setup(s) = &mut self.screen {
                    s.set_error(e.to_string());
                }
            }
        }
    }
}
