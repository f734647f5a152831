//! Legality index: origin square to the set of reachable destinations.

use std::collections::{HashMap, HashSet};

use tracing::{debug, instrument};

use crate::wire::{Move, Square, WireError, parse_move_list};

/// Lookup structure for validating board interaction.
///
/// Built once per position from the engine's move enumeration and never
/// mutated afterwards. A position with no legal moves yields an empty index.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LegalityIndex {
    targets: HashMap<Square, HashSet<Square>>,
    white_to_move: bool,
    move_count: usize,
}

impl LegalityIndex {
    /// Builds the index from the engine's raw legal-move text.
    ///
    /// # Errors
    ///
    /// Any malformed token aborts construction; no partial index is returned.
    #[instrument(skip(raw))]
    pub fn build(raw: &str, white_to_move: bool) -> Result<Self, WireError> {
        let moves = parse_move_list(raw)?;
        let index = Self::from_moves(moves, white_to_move);
        debug!(
            origins = index.targets.len(),
            moves = index.move_count,
            "Built legality index"
        );
        Ok(index)
    }

    /// Builds the index from already-parsed moves.
    pub fn from_moves(moves: impl IntoIterator<Item = Move>, white_to_move: bool) -> Self {
        let mut targets: HashMap<Square, HashSet<Square>> = HashMap::new();
        let mut move_count = 0;
        for mv in moves {
            if targets.entry(mv.origin).or_default().insert(mv.destination) {
                move_count += 1;
            }
        }
        Self {
            targets,
            white_to_move,
            move_count,
        }
    }

    /// Destinations reachable from `origin`, if any.
    pub fn destinations(&self, origin: Square) -> Option<&HashSet<Square>> {
        self.targets.get(&origin)
    }

    /// Whether the move appears in the enumeration this index was built from.
    pub fn allows(&self, mv: Move) -> bool {
        self.targets
            .get(&mv.origin)
            .is_some_and(|set| set.contains(&mv.destination))
    }

    /// Whether any legal move starts on `origin`.
    pub fn has_origin(&self, origin: Square) -> bool {
        self.targets.contains_key(&origin)
    }

    /// All origin squares with at least one legal move.
    pub fn origins(&self) -> impl Iterator<Item = Square> + '_ {
        self.targets.keys().copied()
    }

    /// Every (origin, destination) pair in the index.
    pub fn moves(&self) -> impl Iterator<Item = Move> + '_ {
        self.targets
            .iter()
            .flat_map(|(origin, set)| set.iter().map(|dest| Move::new(*origin, *dest)))
    }

    /// True when the position has no legal moves.
    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    /// Number of distinct (origin, destination) pairs.
    pub fn move_count(&self) -> usize {
        self.move_count
    }

    /// Side to move in the position this index was built for.
    pub fn white_to_move(&self) -> bool {
        self.white_to_move
    }
}
