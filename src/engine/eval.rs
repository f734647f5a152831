//! Static evaluation: material plus a small centralization bonus.

use shakmaty::{Chess, Color, Position, Role, Square};

/// Centipawn value of a piece kind. Kings are not counted.
pub(crate) fn role_value(role: Role) -> i32 {
    match role {
        Role::Pawn => 100,
        Role::Knight => 320,
        Role::Bishop => 330,
        Role::Rook => 500,
        Role::Queen => 900,
        Role::King => 0,
    }
}

// Distance-from-centre bonus for minor pieces and pawns, indexed by file/rank.
const CENTER: [i32; 8] = [0, 2, 5, 10, 10, 5, 2, 0];

fn placement_bonus(role: Role, square: Square, color: Color) -> i32 {
    let file = usize::from(square.file());
    let rank = usize::from(square.rank());
    match role {
        Role::Knight | Role::Bishop => CENTER[file] + CENTER[rank],
        Role::Pawn => {
            let advanced = if color.is_white() { rank } else { 7 - rank };
            CENTER[file] + 4 * advanced as i32
        }
        _ => 0,
    }
}

/// Evaluates `pos` from the side to move's perspective.
pub(crate) fn evaluate(pos: &Chess) -> i32 {
    let board = pos.board();
    let mut white_minus_black = 0;
    for square in Square::ALL {
        let Some(piece) = board.piece_at(square) else {
            continue;
        };
        let value = role_value(piece.role) + placement_bonus(piece.role, square, piece.color);
        if piece.color.is_white() {
            white_minus_black += value;
        } else {
            white_minus_black -= value;
        }
    }
    if pos.turn().is_white() { white_minus_black } else { -white_minus_black }
}
