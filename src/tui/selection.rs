//! Keyboard drag-and-drop over the board.

use std::collections::HashSet;

use tracing::{debug, instrument};

use crate::legality::LegalityIndex;
use crate::wire::{Move, Square};

/// Drag state: nothing held, or a piece lifted from `origin`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DragSelection {
    /// No piece held.
    #[default]
    Idle,
    /// A piece is held.
    Holding {
        /// Square the piece was lifted from.
        origin: Square,
    },
}

/// What a press on a square did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragOutcome {
    /// A piece with legal moves was lifted.
    PickedUp(Square),
    /// The held piece was dropped on a legal destination.
    Dropped(Move),
    /// The drag ended without a move.
    Cancelled,
    /// Nothing happened.
    Ignored,
}

impl DragSelection {
    /// Handles a pick-up/drop press on `square`.
    ///
    /// Only squares the index lists as origins can be lifted. Dropping on a
    /// square that is not a legal destination cancels the drag and produces
    /// no move.
    #[instrument(skip(index))]
    pub fn press(&mut self, square: Square, index: &LegalityIndex) -> DragOutcome {
        match *self {
            DragSelection::Idle if index.has_origin(square) => {
                *self = DragSelection::Holding { origin: square };
                debug!(%square, "Piece picked up");
                DragOutcome::PickedUp(square)
            }
            DragSelection::Idle => DragOutcome::Ignored,
            DragSelection::Holding { origin } => {
                *self = DragSelection::Idle;
                let mv = Move::new(origin, square);
                if index.allows(mv) {
                    DragOutcome::Dropped(mv)
                } else {
                    debug!(%origin, %square, "Drop on illegal square, drag cancelled");
                    DragOutcome::Cancelled
                }
            }
        }
    }

    /// Abandons the drag. Returns true if a piece was held.
    pub fn cancel(&mut self) -> bool {
        let held = self.origin().is_some();
        *self = DragSelection::Idle;
        held
    }

    /// Square of the held piece.
    pub fn origin(&self) -> Option<Square> {
        match self {
            DragSelection::Idle => None,
            DragSelection::Holding { origin } => Some(*origin),
        }
    }

    /// Legal destinations of the held piece.
    pub fn targets(&self, index: &LegalityIndex) -> HashSet<Square> {
        self.origin()
            .and_then(|origin| index.destinations(origin))
            .cloned()
            .unwrap_or_default()
    }
}
