//! Fixed-depth negamax with alpha-beta pruning.

use std::sync::atomic::{AtomicBool, Ordering};

use shakmaty::{Chess, Move, Position, Role};

use super::eval;

/// Score of a mate delivered at the root. Mates further away score lower.
pub const MATE_SCORE: i32 = 30_000;

/// One search invocation. Counts nodes and honours the stop flag.
pub(crate) struct Negamax<'a> {
    stop: &'a AtomicBool,
    nodes: u64,
}

impl<'a> Negamax<'a> {
    pub(crate) fn new(stop: &'a AtomicBool) -> Self {
        Self { stop, nodes: 0 }
    }

    pub(crate) fn nodes(&self) -> u64 {
        self.nodes
    }

    /// Searches `root` to `depth` plies.
    ///
    /// Returns the best move (absent in terminal positions or at depth 0)
    /// with its score, or `None` if the stop flag was raised.
    pub(crate) fn run(&mut self, root: &Chess, depth: u32) -> Option<(Option<Move>, i32)> {
        self.nodes += 1;
        if depth == 0 {
            return Some((None, eval::evaluate(root)));
        }

        let moves = ordered_moves(root);
        if moves.is_empty() {
            return Some((None, terminal_score(root, 0)));
        }

        let mut alpha = -MATE_SCORE - 1;
        let beta = MATE_SCORE + 1;
        let mut best = None;
        for m in moves {
            let mut child = root.clone();
            child.play_unchecked(&m);
            let score = -self.negamax(&child, depth - 1, 1, -beta, -alpha)?;
            if best.is_none() || score > alpha {
                alpha = score;
                best = Some(m);
            }
        }
        Some((best, alpha))
    }

    fn negamax(&mut self, pos: &Chess, depth: u32, ply: i32, mut alpha: i32, beta: i32) -> Option<i32> {
        if self.stop.load(Ordering::Relaxed) {
            return None;
        }
        self.nodes += 1;
        if depth == 0 {
            return Some(eval::evaluate(pos));
        }

        let moves = ordered_moves(pos);
        if moves.is_empty() {
            return Some(terminal_score(pos, ply));
        }

        for m in moves {
            let mut child = pos.clone();
            child.play_unchecked(&m);
            let score = -self.negamax(&child, depth - 1, ply + 1, -beta, -alpha)?;
            if score > alpha {
                alpha = score;
            }
            if alpha >= beta {
                break;
            }
        }
        Some(alpha)
    }
}

/// Score for a position with no legal moves: mated or stalemated.
fn terminal_score(pos: &Chess, ply: i32) -> i32 {
    if pos.is_check() { -(MATE_SCORE - ply) } else { 0 }
}

/// Legal moves with captures and queen promotions first.
///
/// Under-promotions are skipped; the front-end always promotes to a queen.
fn ordered_moves(pos: &Chess) -> Vec<Move> {
    let mut moves: Vec<Move> = pos
        .legal_moves()
        .into_iter()
        .filter(|m| m.promotion().is_none_or(|role| role == Role::Queen))
        .collect();
    moves.sort_by_key(|m| -move_priority(m));
    moves
}

fn move_priority(m: &Move) -> i32 {
    let victim = m.capture().map_or(0, |role| 10 * eval::role_value(role));
    let attacker = if m.is_capture() { eval::role_value(m.role()) } else { 0 };
    let promotion = if m.promotion().is_some() { eval::role_value(Role::Queen) } else { 0 };
    victim - attacker + promotion
}
