//! Network error types

use krojanty_core::{Color, MoveError, Square};
use thiserror::Error;

/// A token that cannot be decoded
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("wrong length: {0} characters")]
    WrongLength(usize),

    #[error("'{0}' is not a file between A and I")]
    BadFile(char),

    #[error("'{0}' is not a rank between 1 and 9")]
    BadRank(char),

    #[error("no move to send")]
    MissingPayload,
}

/// Transport and session failures
#[derive(Error, Debug)]
pub enum NetError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error("connection closed after {received} of 4 bytes")]
    ClosedMidToken { received: usize },

    #[error("connection lost")]
    Disconnected,
}

/// Why a move received from the peer was refused
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PeerMoveError {
    #[error("malformed token: {0}")]
    Malformed(ProtocolError),

    #[error("no piece on {0}")]
    NoPiece(Square),

    #[error("piece on {square} is {color} but it is {to_move}'s turn")]
    WrongTurn {
        square: Square,
        color: Color,
        to_move: Color,
    },

    #[error("peer moved during the local player's turn")]
    NotPeerTurn,

    #[error(transparent)]
    Illegal(#[from] MoveError),
}
