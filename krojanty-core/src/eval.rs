//! Position evaluation

use crate::game::{GameState, Outcome};
use crate::pieces::{Color, Kind};
use crate::rules::{mobility, threatened_count};
use serde::{Deserialize, Serialize};

/// Heuristic weights for position evaluation
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Heuristics {
    /// Points per living soldier
    pub soldier: i32,
    /// Points per living king
    pub king: i32,
    /// Points per controlled cell
    pub control: i32,
    /// Points per legal destination
    pub mobility: i32,
    /// Points per enemy piece capturable next move
    pub threat: i32,
    /// Points per own piece not currently capturable
    pub defense: i32,
}

impl Default for Heuristics {
    fn default() -> Self {
        Self {
            soldier: 200,
            king: 500,
            control: 50,
            mobility: 30,
            threat: 100,
            defense: 40,
        }
    }
}

/// Terminal score magnitude, far above any heuristic total
pub const WIN_SCORE: i32 = 1_000_000;

/// One-sided sum of every term for `color`
fn side_score(state: &GameState, color: Color, h: &Heuristics) -> i32 {
    let board = state.board();
    let soldiers = board.count(color, Kind::Soldier) as i32;
    let kings = board.count(color, Kind::King) as i32;
    let live = soldiers + kings;
    let exposed = threatened_count(board, color) as i32;
    let threats = threatened_count(board, color.opponent()) as i32;

    h.soldier * soldiers
        + h.king * kings
        + h.control * board.controlled(color) as i32
        + h.mobility * mobility(board, color) as i32
        + h.threat * threats
        + h.defense * (live - exposed)
}

/// Static evaluation from `color`'s point of view.
///
/// Zero-sum: `evaluate(s, Blue, h) == -evaluate(s, Red, h)`.
pub fn evaluate(state: &GameState, color: Color, heuristics: &Heuristics) -> i32 {
    side_score(state, color, heuristics) - side_score(state, color.opponent(), heuristics)
}

/// Score of a finished game for `color`, preferring short wins and long losses
pub fn terminal_score(outcome: &Outcome, color: Color, ply: u32) -> i32 {
    let ply = ply.min(WIN_SCORE as u32 / 2) as i32;
    match outcome.winner() {
        Some(winner) if winner == color => WIN_SCORE - ply,
        Some(_) => -WIN_SCORE + ply,
        None => 0,
    }
}
