//! Concrete screens.

mod board;
mod setup;

pub use board::BoardScreen;
pub use setup::SetupScreen;
