//! Error types for move validation and configuration

use crate::board::Square;
use crate::pieces::{Color, PieceId};
use thiserror::Error;

/// Reasons a move is rejected before any state is touched
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MoveError {
    #[error("the game is already over")]
    GameOver,

    #[error("no live piece with id {0}")]
    UnknownPiece(PieceId),

    #[error("piece {piece} is on {actual}, not {claimed}")]
    StaleOrigin {
        piece: PieceId,
        claimed: Square,
        actual: Square,
    },

    #[error("it is {to_move}'s turn, piece on {square} is {color}")]
    WrongTurn {
        square: Square,
        color: Color,
        to_move: Color,
    },

    #[error("{from} -> {to} is not a legal move")]
    Illegal { from: Square, to: Square },
}

/// Configuration parsing errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("unknown difficulty '{0}' (expected easy, medium or hard)")]
    UnknownDifficulty(String),

    #[error("max_turn must be at least 1")]
    ZeroTurnLimit,
}
