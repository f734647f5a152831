//! Game setup choices and their resolution into a bot configuration.

use rand::Rng;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};
use tracing::{debug, instrument};

/// Lowest selectable difficulty level.
pub const MIN_LEVEL: u8 = 1;
/// Highest selectable difficulty level.
pub const MAX_LEVEL: u8 = 7;

/// A side of the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
pub enum Side {
    /// Moves first.
    White,
    /// Moves second.
    Black,
}

impl Side {
    /// Maps a side-to-move flag to a side.
    pub fn from_white(white: bool) -> Self {
        if white { Side::White } else { Side::Black }
    }

    /// True for [`Side::White`].
    pub fn is_white(self) -> bool {
        self == Side::White
    }

    /// The other side.
    pub fn opponent(self) -> Self {
        match self {
            Side::White => Side::Black,
            Side::Black => Side::White,
        }
    }
}

/// Who plays against the human.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Default,
    Display,
    EnumIter,
    EnumString,
    Serialize,
    Deserialize,
)]
#[serde(rename_all = "lowercase")]
#[strum(ascii_case_insensitive)]
pub enum Opponent {
    /// The built-in engine.
    #[default]
    #[strum(serialize = "engine", to_string = "Computer")]
    Engine,
    /// Another human at the same keyboard.
    #[strum(to_string = "Friend")]
    Friend,
}

impl Opponent {
    /// Switches between the two opponents.
    pub fn toggle(self) -> Self {
        match self {
            Opponent::Engine => Opponent::Friend,
            Opponent::Friend => Opponent::Engine,
        }
    }
}

/// The colour the human asks to play.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Default,
    Display,
    EnumIter,
    EnumString,
    Serialize,
    Deserialize,
)]
#[serde(rename_all = "lowercase")]
#[strum(ascii_case_insensitive)]
pub enum ColorChoice {
    /// Play white.
    White,
    /// Play black.
    Black,
    /// Decided by a coin flip when the game starts.
    #[default]
    Random,
}

impl ColorChoice {
    /// Next option in display order, wrapping around.
    pub fn cycle(self) -> Self {
        match self {
            ColorChoice::White => ColorChoice::Black,
            ColorChoice::Black => ColorChoice::Random,
            ColorChoice::Random => ColorChoice::White,
        }
    }

    /// Resolves the choice to a concrete side. `Random` draws from `rng`.
    #[instrument(skip(rng))]
    pub fn resolve<R: Rng + ?Sized>(self, rng: &mut R) -> Side {
        match self {
            ColorChoice::White => Side::White,
            ColorChoice::Black => Side::Black,
            ColorChoice::Random => {
                let side = Side::from_white(rng.gen_bool(0.5));
                debug!(%side, "Random colour resolved");
                side
            }
        }
    }
}

/// Which side the engine controls and how deep it searches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BotConfig {
    /// Search depth in plies.
    pub depth: u32,
    /// The side the engine plays.
    pub side: Side,
}

impl BotConfig {
    /// Whether the engine moves when `white_to_move` describes the side to move.
    pub fn controls(&self, white_to_move: bool) -> bool {
        self.side.is_white() == white_to_move
    }
}

/// Choices made on the setup screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameSetup {
    /// Engine or friend.
    pub opponent: Opponent,
    /// Difficulty, clamped to `MIN_LEVEL..=MAX_LEVEL`.
    pub level: u8,
    /// The human's colour.
    pub color: ColorChoice,
}

impl Default for GameSetup {
    fn default() -> Self {
        Self {
            opponent: Opponent::Engine,
            level: 4,
            color: ColorChoice::Random,
        }
    }
}

impl GameSetup {
    /// Search depth for the configured level.
    pub fn depth(&self) -> u32 {
        u32::from(self.level.clamp(MIN_LEVEL, MAX_LEVEL)) + 1
    }

    /// Raises the level by one, saturating at `MAX_LEVEL`.
    pub fn level_up(&mut self) {
        self.level = self.level.saturating_add(1).min(MAX_LEVEL);
    }

    /// Lowers the level by one, saturating at `MIN_LEVEL`.
    pub fn level_down(&mut self) {
        self.level = self.level.saturating_sub(1).max(MIN_LEVEL);
    }

    /// Produces the bot configuration for a new game.
    ///
    /// Returns `None` against a friend. Otherwise the engine takes the side
    /// opposite the human, with a random colour resolved here, once.
    #[instrument(skip(rng))]
    pub fn resolve<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<BotConfig> {
        match self.opponent {
            Opponent::Friend => None,
            Opponent::Engine => {
                let human = self.color.resolve(rng);
                Some(BotConfig {
                    depth: self.depth(),
                    side: human.opponent(),
                })
            }
        }
    }
}
