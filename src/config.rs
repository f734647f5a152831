//! Play configuration loaded from TOML.

use std::path::{Path, PathBuf};

use derive_getters::Getters;
use derive_more::{Display, Error};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::phase::{ColorChoice, GameSetup, MAX_LEVEL, MIN_LEVEL, Opponent};

/// Default config file name, looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "strictly_chess.toml";

/// Options for interactive play.
#[derive(Debug, Clone, PartialEq, Eq, Getters, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PlayConfig {
    /// Engine or friend.
    #[serde(default)]
    opponent: Opponent,

    /// Difficulty 1-7; the engine searches `level + 1` plies.
    #[serde(default = "default_level")]
    level: u8,

    /// The human's colour.
    #[serde(default)]
    color: ColorChoice,

    /// FEN to start the first game from.
    #[serde(default)]
    start_position: Option<String>,

    /// Where the terminal UI writes its logs.
    #[serde(default = "default_log_file")]
    log_file: PathBuf,
}

fn default_level() -> u8 {
    GameSetup::default().level
}

fn default_log_file() -> PathBuf {
    PathBuf::from("strictly_chess.log")
}

impl Default for PlayConfig {
    fn default() -> Self {
        Self {
            opponent: Opponent::default(),
            level: default_level(),
            color: ColorChoice::default(),
            start_position: None,
            log_file: default_log_file(),
        }
    }
}

impl PlayConfig {
    /// Loads configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Fails if the file cannot be read or parsed, or holds an out-of-range level.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        debug!("Loading config from file");
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::new(format!("Failed to read config file: {}", e)))?;
        let config: Self = toml::from_str(&content)
            .map_err(|e| ConfigError::new(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        info!(
            opponent = %config.opponent,
            level = config.level,
            color = %config.color,
            "Config loaded successfully"
        );
        Ok(config)
    }

    /// Loads `path` if given, else [`DEFAULT_CONFIG_FILE`] if it exists, else defaults.
    ///
    /// # Errors
    ///
    /// An explicitly named file that is missing is an error; so is any file
    /// that fails [`PlayConfig::from_file`].
    #[instrument]
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::from_file(path),
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => Self::from_file(DEFAULT_CONFIG_FILE),
            None => {
                debug!("No config file, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Replaces file values with any command-line values given.
    ///
    /// # Errors
    ///
    /// Fails if the resulting level is out of range.
    pub fn with_overrides(
        mut self,
        opponent: Option<Opponent>,
        level: Option<u8>,
        color: Option<ColorChoice>,
        start_position: Option<String>,
    ) -> Result<Self, ConfigError> {
        if let Some(opponent) = opponent {
            self.opponent = opponent;
        }
        if let Some(level) = level {
            self.level = level;
        }
        if let Some(color) = color {
            self.color = color;
        }
        if start_position.is_some() {
            self.start_position = start_position;
        }
        self.validate()?;
        Ok(self)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if !(MIN_LEVEL..=MAX_LEVEL).contains(&self.level) {
            return Err(ConfigError::new(format!(
                "level must be between {} and {}, got {}",
                MIN_LEVEL, MAX_LEVEL, self.level
            )));
        }
        Ok(())
    }

    /// Initial setup-screen choices.
    pub fn setup(&self) -> GameSetup {
        GameSetup {
            opponent: self.opponent,
            level: self.level,
            color: self.color,
        }
    }
}

/// Configuration error.
#[derive(Debug, Clone, Display, Error)]
#[display("Config error: {} at {}:{}", message, file, line)]
pub struct ConfigError {
    /// Error message.
    pub message: String,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl ConfigError {
    /// Creates a new configuration error.
    #[track_caller]
    pub fn new(message: String) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            message,
            line: loc.line(),
            file: loc.file(),
        }
    }
}
