//! Board screen: the active game.

use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};
use tracing::{debug, error, info, instrument, warn};

use crate::controller::StateToken;
use crate::engine::Engine;
use crate::phase::{ActiveGame, BotTurn, Phase, Side};
use crate::tui::board_grid::{BoardGrid, glyph};
use crate::tui::screen::{Screen, ScreenTransition};
use crate::tui::selection::{DragOutcome, DragSelection};
use crate::wire::{Square, encode_square};

const LIGHT: Color = Color::Rgb(240, 217, 181);
const DARK: Color = Color::Rgb(181, 136, 99);
const CURSOR: Color = Color::Rgb(106, 160, 220);
const HELD: Color = Color::Rgb(205, 210, 106);
const TARGET: Color = Color::Rgb(130, 170, 100);

/// State for the board screen.
#[derive(Debug)]
pub struct BoardScreen {
    cursor: Square,
    drag: DragSelection,
    seen_token: Option<StateToken>,
    message: Option<String>,
}

impl Default for BoardScreen {
    fn default() -> Self {
        Self::new()
    }
}

impl BoardScreen {
    /// Creates the screen with the cursor on e2.
    #[instrument]
    pub fn new() -> Self {
        debug!("Initializing BoardScreen");
        Self {
            cursor: encode_square(1, 4).unwrap_or_default(),
            drag: DragSelection::Idle,
            seen_token: None,
            message: None,
        }
    }

    /// Square under the cursor.
    pub fn cursor(&self) -> Square {
        self.cursor
    }

    /// Current drag state.
    pub fn drag(&self) -> DragSelection {
        self.drag
    }

    /// Last status message.
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    /// Whether the board is drawn from black's side.
    ///
    /// Against the engine the human's side is at the bottom. Between two
    /// humans the side to move is at the bottom.
    pub fn flipped<E: Engine>(game: &ActiveGame<E>) -> bool {
        match game.bot() {
            Some(bot) => bot.side.is_white(),
            None => !game.white_to_move(),
        }
    }

    /// Drops any held piece once the position has changed under it.
    fn sync<E: Engine>(&mut self, game: &ActiveGame<E>) {
        let token = game.token();
        if self.seen_token != Some(token) {
            if self.drag.cancel() {
                debug!("Position changed, drag dropped");
            }
            self.seen_token = Some(token);
        }
    }

    fn move_cursor(&mut self, code: KeyCode, flipped: bool) {
        let (d_row, d_col) = match code {
            KeyCode::Up => (1, 0),
            KeyCode::Down => (-1, 0),
            KeyCode::Left => (0, -1),
            KeyCode::Right => (0, 1),
            _ => return,
        };
        let (d_row, d_col) = if flipped { (-d_row, -d_col) } else { (d_row, d_col) };
        if let Some(next) = self.cursor.offset(d_row, d_col) {
            self.cursor = next;
        }
    }

    #[instrument(skip(self, game), fields(cursor = %self.cursor))]
    fn press<E: Engine>(&mut self, game: &mut ActiveGame<E>) {
        self.sync(game);
        if game.status().is_over() {
            return;
        }
        if game.is_automated_turn() {
            self.message = Some("The engine is thinking".to_string());
            return;
        }
        match self.drag.press(self.cursor, game.legality()) {
            DragOutcome::Dropped(mv) => match game.play(mv) {
                Ok(token) => {
                    info!(mv = %mv, version = token.version(), "Move played");
                    self.seen_token = Some(token);
                    self.message = None;
                }
                Err(e) => {
                    warn!(error = %e, "Move rejected");
                    self.message = Some(e.to_string());
                }
            },
            DragOutcome::PickedUp(_) | DragOutcome::Cancelled | DragOutcome::Ignored => {}
        }
    }

    fn status_line<E: Engine>(&self, game: &ActiveGame<E>) -> String {
        let status = game.status();
        let mut parts = vec![if status.is_over() {
            status.label().to_string()
        } else {
            format!("{} to move", Side::from_white(game.white_to_move()))
        }];
        if game.is_thinking() {
            parts.push("engine thinking…".to_string());
        }
        if let Some(last) = game.last_bot_move() {
            parts.push(format!(
                "engine played {} (score {}, {} nodes)",
                last.mv, last.score, last.nodes_searched
            ));
        }
        if let Some(message) = &self.message {
            parts.push(message.clone());
        }
        parts.join(" | ")
    }

    fn board_lines<E: Engine>(&self, game: &ActiveGame<E>) -> Vec<Line<'static>> {
        let grid = match BoardGrid::parse(&game.board_text()) {
            Ok(grid) => grid,
            Err(e) => {
                error!(error = %e, "Engine board text unreadable");
                return vec![Line::from(e.to_string())];
            }
        };
        let flipped = Self::flipped(game);
        let targets = self.drag.targets(game.legality());
        let held = self.drag.origin();

        let mut lines = Vec::new();
        for row in BoardGrid::screen_rows(flipped) {
            let rank = row.first().map_or(0, |sq| sq.row() + 1);
            let mut spans = vec![Span::raw(format!(" {} ", rank))];
            for square in row {
                let base = if (square.row() + square.col()) % 2 == 0 { DARK } else { LIGHT };
                let bg = if square == self.cursor {
                    CURSOR
                } else if Some(square) == held {
                    HELD
                } else if targets.contains(&square) {
                    TARGET
                } else {
                    base
                };
                let (text, fg) = match grid.piece_at(square) {
                    Some(code) if code.is_ascii_uppercase() => (glyph(code), Color::White),
                    Some(code) => (glyph(code), Color::Black),
                    None => (' ', Color::Black),
                };
                spans.push(Span::styled(
                    format!(" {} ", text),
                    Style::default().bg(bg).fg(fg).add_modifier(Modifier::BOLD),
                ));
            }
            lines.push(Line::from(spans));
        }
        let files: String = BoardGrid::screen_rows(flipped)
            .first()
            .map(|row| {
                row.iter()
                    .map(|sq| format!(" {} ", char::from(b'a' + sq.col())))
                    .collect()
            })
            .unwrap_or_default();
        lines.push(Line::from(format!("   {}", files)));
        lines
    }
}

impl<E: Engine> Screen<E> for BoardScreen {
    #[instrument(skip(self, frame, phase))]
    fn render(&self, frame: &mut Frame, phase: &Phase<E>) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Min(11),
                Constraint::Length(3),
                Constraint::Length(3),
            ])
            .split(frame.area());

        let Some(game) = phase.game() else {
            let idle = Paragraph::new("No game in progress").alignment(Alignment::Center);
            frame.render_widget(idle, frame.area());
            return;
        };

        let title = match game.bot() {
            Some(bot) => format!("Strictly Chess - you play {} vs engine", bot.side.opponent()),
            None => "Strictly Chess - two players".to_string(),
        };
        let title = Paragraph::new(title)
            .style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::ALL));
        frame.render_widget(title, chunks[0]);

        let board = Paragraph::new(self.board_lines(game))
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::ALL).title("Board"));
        frame.render_widget(board, chunks[1]);

        let status = Paragraph::new(self.status_line(game))
            .style(Style::default().fg(Color::Yellow))
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::ALL).title("Status"));
        frame.render_widget(status, chunks[2]);

        let help = Paragraph::new("Arrows: Move | Enter/Space: Pick up/Drop | Esc: Cancel | N: New game | Q: Quit")
            .style(Style::default().fg(Color::DarkGray))
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::ALL));
        frame.render_widget(help, chunks[3]);
    }

    #[instrument(skip(self, key, phase))]
    fn handle_key(&mut self, key: KeyEvent, phase: &mut Phase<E>) -> ScreenTransition {
        match key.code {
            KeyCode::Char('q') | KeyCode::Char('Q') => return ScreenTransition::Quit,
            KeyCode::Char('n') | KeyCode::Char('N') => return ScreenTransition::NewGame,
            _ => {}
        }
        let Some(game) = phase.game_mut() else {
            return ScreenTransition::Stay;
        };
        match key.code {
            KeyCode::Up | KeyCode::Down | KeyCode::Left | KeyCode::Right => {
                self.move_cursor(key.code, Self::flipped(game));
            }
            KeyCode::Enter | KeyCode::Char(' ') => self.press(game),
            KeyCode::Esc => {
                if self.drag.cancel() {
                    debug!("Drag cancelled");
                }
            }
            _ => {}
        }
        ScreenTransition::Stay
    }

    fn tick(&mut self, phase: &mut Phase<E>) {
        let Some(game) = phase.game_mut() else {
            return;
        };
        match game.poll_bot_move() {
            Ok(BotTurn::Moved(bot_move)) => {
                debug!(mv = %bot_move.mv, "Engine move shown");
                self.message = None;
            }
            Ok(BotTurn::NoMove) => {
                self.message = Some("The engine has no move".to_string());
            }
            Ok(BotTurn::Idle | BotTurn::Thinking | BotTurn::Superseded) => {}
            Err(e) => {
                error!(error = %e, "Engine move failed");
                self.message = Some(format!("Engine error: {}", e));
            }
        }
        self.sync(game);
    }
}
