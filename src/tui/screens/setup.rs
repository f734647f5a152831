//! Setup screen: opponent, level and colour.

use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
};
use tracing::{debug, info, instrument};

use crate::engine::Engine;
use crate::phase::{GameSetup, MAX_LEVEL, MIN_LEVEL, Opponent, Phase};
use crate::tui::screen::{Screen, ScreenTransition};

const ROWS: usize = 4;
const ROW_OPPONENT: usize = 0;
const ROW_LEVEL: usize = 1;
const ROW_COLOR: usize = 2;
const ROW_START: usize = 3;

/// State for the setup screen.
#[derive(Debug)]
pub struct SetupScreen {
    setup: GameSetup,
    list_state: ListState,
    error: Option<String>,
}

impl SetupScreen {
    /// Creates the screen pre-filled with `setup`.
    #[instrument]
    pub fn new(setup: GameSetup) -> Self {
        debug!("Initializing SetupScreen");
        let mut list_state = ListState::default();
        list_state.select(Some(ROW_START));
        Self {
            setup,
            list_state,
            error: None,
        }
    }

    /// Current choices.
    pub fn setup(&self) -> GameSetup {
        self.setup
    }

    /// Shows an error from a failed start.
    pub fn set_error(&mut self, error: impl Into<String>) {
        self.error = Some(error.into());
    }

    fn selected(&self) -> usize {
        self.list_state.selected().unwrap_or(ROW_START)
    }

    fn select_offset(&mut self, delta: isize) {
        let next = (self.selected() as isize + delta).rem_euclid(ROWS as isize) as usize;
        self.list_state.select(Some(next));
    }

    #[instrument(skip(self))]
    fn adjust(&mut self, forward: bool) {
        match self.selected() {
            ROW_OPPONENT => self.setup.opponent = self.setup.opponent.toggle(),
            ROW_LEVEL if forward => self.setup.level_up(),
            ROW_LEVEL => self.setup.level_down(),
            ROW_COLOR => self.setup.color = self.setup.color.cycle(),
            _ => return,
        }
        info!(setup = ?self.setup, "Setup changed");
    }
}

impl<E: Engine> Screen<E> for SetupScreen {
    #[instrument(skip(self, frame, _phase))]
    fn render(&self, frame: &mut Frame, _phase: &Phase<E>) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Min(6),
                Constraint::Length(3),
                Constraint::Length(3),
            ])
            .split(frame.area());

        let title = Paragraph::new("Strictly Chess")
            .style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::ALL));
        frame.render_widget(title, chunks[0]);

        let vs_engine = self.setup.opponent == Opponent::Engine;
        let engine_only = if vs_engine {
            Style::default()
        } else {
            Style::default().fg(Color::DarkGray)
        };
        let items = vec![
            ListItem::new(format!("Opponent    [ {} ]", self.setup.opponent)),
            ListItem::new(format!(
                "Level       [ {} ]  ({}-{})",
                self.setup.level, MIN_LEVEL, MAX_LEVEL
            ))
            .style(engine_only),
            ListItem::new(format!("Play as     [ {} ]", self.setup.color)).style(engine_only),
            ListItem::new("Start game"),
        ];
        let list = List::new(items)
            .block(Block::default().borders(Borders::ALL).title("New Game"))
            .highlight_style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD))
            .highlight_symbol("> ");
        let mut list_state = self.list_state;
        frame.render_stateful_widget(list, chunks[1], &mut list_state);

        let error = Paragraph::new(self.error.as_deref().unwrap_or(""))
            .style(Style::default().fg(Color::Red))
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::ALL));
        frame.render_widget(error, chunks[2]);

        let help = Paragraph::new("↑↓: Select | ←→: Change | Enter: Start | Q: Quit")
            .style(Style::default().fg(Color::DarkGray))
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::ALL));
        frame.render_widget(help, chunks[3]);
    }

    #[instrument(skip(self, key, _phase))]
    fn handle_key(&mut self, key: KeyEvent, _phase: &mut Phase<E>) -> ScreenTransition {
        match key.code {
            KeyCode::Up => {
                self.select_offset(-1);
                ScreenTransition::Stay
            }
            KeyCode::Down | KeyCode::Tab => {
                self.select_offset(1);
                ScreenTransition::Stay
            }
            KeyCode::Left => {
                self.adjust(false);
                ScreenTransition::Stay
            }
            KeyCode::Right => {
                self.adjust(true);
                ScreenTransition::Stay
            }
            KeyCode::Enter | KeyCode::Char(' ') if self.selected() != ROW_START => {
                self.adjust(true);
                ScreenTransition::Stay
            }
            KeyCode::Enter | KeyCode::Char(' ') | KeyCode::Char('s') => {
                info!(setup = ?self.setup, "Starting game");
                self.error = None;
                ScreenTransition::StartGame(self.setup)
            }
            KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('Q') => ScreenTransition::Quit,
            _ => ScreenTransition::Stay,
        }
    }
}
