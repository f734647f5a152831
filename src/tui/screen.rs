//! Screen trait and transition type for the terminal front-end.

use crossterm::event::KeyEvent;
use ratatui::Frame;

use crate::engine::Engine;
use crate::phase::{GameSetup, Phase};

/// The result of handling an input event on a screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScreenTransition {
    /// Stay on the current screen.
    Stay,
    /// Leave setup and start a game with these choices.
    StartGame(GameSetup),
    /// Abandon the current game and return to setup.
    NewGame,
    /// Exit the application.
    Quit,
}

/// A screen of the terminal front-end.
///
/// Each screen owns its view state; the game itself lives in the [`Phase`]
/// held by the controller and is lent to the screen per call.
pub trait Screen<E: Engine> {
    /// Renders the screen.
    fn render(&self, frame: &mut Frame, phase: &Phase<E>);

    /// Handles a key press.
    fn handle_key(&mut self, key: KeyEvent, phase: &mut Phase<E>) -> ScreenTransition;

    /// Called once per event-loop iteration before rendering.
    fn tick(&mut self, _phase: &mut Phase<E>) {}
}
