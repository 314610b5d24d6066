//! Movement, capture resolution and threat queries

use crate::board::{unit_step, Coord, Square, DIRECTIONS};
use crate::game::{Board, Capture, CaptureRule, EndReason, GameState, Move, Outcome};
use crate::pieces::{Color, Kind, Piece, PieceId};

// ============================================================================
// MOVEMENT
// ============================================================================

/// Walk one ray from `from`, calling `f` for every empty cell until a piece
/// or the edge blocks it
fn walk_ray(board: &Board, from: Square, (dr, dc): (i64, i64), mut f: impl FnMut(Square) -> bool) {
    let mut steps = 1;
    while let Some(sq) = from.offset(dr, dc, steps) {
        if !board.is_empty(sq) || !f(sq) {
            return;
        }
        steps += 1;
    }
}

/// Empty cells a piece on `from` can slide to, in direction order then distance
pub fn destinations(board: &Board, from: Square) -> Vec<Square> {
    let mut out = Vec::new();
    for dir in DIRECTIONS {
        walk_ray(board, from, dir, |sq| {
            out.push(sq);
            true
        });
    }
    out
}

/// Straight move through empty cells onto an empty cell
pub fn is_reachable(board: &Board, from: Square, to: Square) -> bool {
    let Some((dr, dc)) = unit_step(from.coord(), to.coord()) else {
        return false;
    };
    let mut found = false;
    walk_ray(board, from, (dr, dc), |sq| {
        found = sq == to;
        !found
    });
    found
}

/// Append every move for `color`: pieces in collection order, then
/// direction order, then increasing distance
pub fn generate_moves(board: &Board, color: Color, moves: &mut Vec<Move>) {
    for piece in board.pieces().iter().filter(|p| p.color == color) {
        for dir in DIRECTIONS {
            walk_ray(board, piece.square, dir, |to| {
                moves.push(Move {
                    piece: piece.id,
                    from: piece.square,
                    to,
                });
                true
            });
        }
    }
}

pub fn has_any_move(board: &Board, color: Color) -> bool {
    board.pieces().iter().filter(|p| p.color == color).any(|p| {
        DIRECTIONS
            .iter()
            .any(|&(dr, dc)| p.square.offset(dr, dc, 1).is_some_and(|sq| board.is_empty(sq)))
    })
}

/// Number of legal destinations across all pieces of `color`
pub fn mobility(board: &Board, color: Color) -> u32 {
    let mut count = 0;
    for piece in board.pieces().iter().filter(|p| p.color == color) {
        for dir in DIRECTIONS {
            walk_ray(board, piece.square, dir, |_| {
                count += 1;
                true
            });
        }
    }
    count
}

// ============================================================================
// CAPTURE ENGINE
// ============================================================================

/// Resolve everything a move triggers: Seltou first, then Linca to a fixed
/// point, then the auto-defeat check. Finally the destination is marked as
/// controlled by the mover (city cells are never marked).
///
/// `moved` must already stand on its destination; `origin` is where it
/// started.
pub fn resolve_move(state: &mut GameState, moved: PieceId, origin: Coord) -> Vec<Capture> {
    let mut captures = Vec::new();
    check_seltou(state, moved, origin, &mut captures);
    if !state.is_over() {
        check_linca(state, moved, &mut captures);
    }
    check_auto_defeat(state);

    if let Some(piece) = state.board().piece(moved).copied() {
        if !piece.square.is_city() {
            state.board_mut().set_control(piece.square, Some(piece.color));
        }
    }
    captures
}

/// Remove `victim`, clear its cell, end the game if it was a king
fn capture(state: &mut GameState, victim: PieceId, rule: CaptureRule, captures: &mut Vec<Capture>) {
    let Some(piece) = state.board_mut().remove(victim) else {
        return;
    };
    captures.push(Capture { piece, rule });
    if piece.kind == Kind::King {
        state.finish(Outcome::Victory {
            winner: piece.color.opponent(),
            reason: EndReason::KingCaptured { king: piece.color },
        });
    }
}

/// Seltou target for a piece of `color` that moved from `origin` to `dest`.
///
/// The candidate is the enemy one step past `dest` along the move vector.
/// It is taken only when the cell behind it is on the board and does not
/// hold one of its own pieces. Diagonal and zero vectors, as well as any
/// referenced cell off the board, yield nothing.
pub fn seltou_target(board: &Board, color: Color, origin: Coord, dest: Coord) -> Option<PieceId> {
    let (dr, dc) = unit_step(origin, dest)?;
    let front = dest.step(dr, dc).to_square()?;
    let back = dest.step(2 * dr, 2 * dc).to_square()?;
    let victim = board.piece_at(front).filter(|p| p.color != color)?;
    if board.piece_at(back).is_some_and(|p| p.color == victim.color) {
        return None;
    }
    Some(victim.id)
}

pub fn check_seltou(state: &mut GameState, moved: PieceId, origin: Coord, captures: &mut Vec<Capture>) {
    let Some(mover) = state.board().piece(moved).copied() else {
        return;
    };
    if let Some(victim) = seltou_target(state.board(), mover.color, origin, mover.square.coord()) {
        capture(state, victim, CaptureRule::Seltou, captures);
    }
}

/// First Linca victim around `mover`, scanning directions in order
fn linca_target(board: &Board, mover: &Piece) -> Option<PieceId> {
    DIRECTIONS.iter().find_map(|&(dr, dc)| {
        let far = mover.square.offset(dr, dc, 2)?;
        let near = mover.square.offset(dr, dc, 1)?;
        let enemy = board.piece_at(near).filter(|p| p.color != mover.color)?;
        board
            .piece_at(far)
            .filter(|p| p.color == mover.color)
            .map(|_| enemy.id)
    })
}

/// Sandwich captures around the moved piece, repeated until a full pass
/// over all four directions finds nothing or a king falls.
pub fn check_linca(state: &mut GameState, moved: PieceId, captures: &mut Vec<Capture>) {
    while !state.is_over() {
        let Some(mover) = state.board().piece(moved).copied() else {
            return;
        };
        match linca_target(state.board(), &mover) {
            Some(victim) => capture(state, victim, CaptureRule::Linca, captures),
            None => return,
        }
    }
}

/// A color left with exactly one king and one soldier loses. Blue is checked
/// first. Returns true if this call ended the game.
pub fn check_auto_defeat(state: &mut GameState) -> bool {
    if state.is_over() {
        return false;
    }
    for color in Color::ALL {
        let board = state.board();
        if board.count(color, Kind::King) == 1 && board.count(color, Kind::Soldier) == 1 {
            return state.finish(Outcome::Victory {
                winner: color.opponent(),
                reason: EndReason::AutoDefeat { loser: color },
            });
        }
    }
    false
}

// ============================================================================
// THREAT QUERIES (search support, never mutate)
// ============================================================================

/// First piece met walking from `from` (exclusive) along a direction
pub fn first_piece_on_ray(board: &Board, from: Square, (dr, dc): (i64, i64)) -> Option<&Piece> {
    let mut steps = 1;
    while let Some(sq) = from.offset(dr, dc, steps) {
        if let Some(piece) = board.piece_at(sq) {
            return Some(piece);
        }
        steps += 1;
    }
    None
}

/// Can some piece of `color` slide onto the empty cell `target` in one move?
fn reachable_by(board: &Board, color: Color, target: Square) -> bool {
    DIRECTIONS
        .iter()
        .any(|&dir| first_piece_on_ray(board, target, dir).is_some_and(|p| p.color == color))
}

/// Could the opponent of `victim` remove it with a single move?
pub fn is_threatened(board: &Board, victim: &Piece) -> bool {
    let attacker = victim.color.opponent();
    DIRECTIONS.iter().any(|&(dr, dc)| {
        let Some(landing) = victim.square.offset(-dr, -dc, 1) else {
            return false;
        };
        let Some(beyond) = victim.square.offset(dr, dc, 1) else {
            return false;
        };
        if !board.is_empty(landing) {
            return false;
        }
        let behind = board.piece_at(beyond).map(|p| p.color);

        let linca = behind == Some(attacker) && reachable_by(board, attacker, landing);
        let seltou = behind != Some(victim.color)
            && first_piece_on_ray(board, landing, (-dr, -dc)).is_some_and(|p| p.color == attacker);
        linca || seltou
    })
}

/// Pieces of `color` the opponent could take next move
pub fn threatened_count(board: &Board, color: Color) -> u32 {
    board
        .pieces()
        .iter()
        .filter(|p| p.color == color && is_threatened(board, p))
        .count() as u32
}

/// Would `color` moving `from -> to` capture anything right away?
pub fn would_capture(board: &Board, color: Color, from: Square, to: Square) -> bool {
    if seltou_target(board, color, from.coord(), to.coord()).is_some() {
        return true;
    }
    DIRECTIONS.iter().any(|&(dr, dc)| {
        let (Some(near), Some(far)) = (to.offset(dr, dc, 1), to.offset(dr, dc, 2)) else {
            return false;
        };
        far != from
            && board.piece_at(near).is_some_and(|p| p.color != color)
            && board.piece_at(far).is_some_and(|p| p.color == color)
    })
}

/// Orthogonal neighbors of `square` that belong to `color`, not counting `exclude`
pub fn adjacent_allies(board: &Board, color: Color, square: Square, exclude: PieceId) -> usize {
    DIRECTIONS
        .iter()
        .filter_map(|&(dr, dc)| square.offset(dr, dc, 1))
        .filter_map(|sq| board.piece_at(sq))
        .filter(|p| p.color == color && p.id != exclude)
        .count()
}

// ============================================================================
// TESTS
// ============================================================================
