//! Four-character move tokens
//!
//! A token is origin file, origin rank, destination file, destination rank:
//! `A9B9` moves the piece on row 0 column 0 to row 0 column 1. Files run
//! `A..=I` left to right, ranks `9..=1` top to bottom.

use crate::error::ProtocolError;
use krojanty_core::{Move, Square, BOARD_SIZE};
use std::fmt;
use std::str::FromStr;

/// Bytes per token on the wire
pub const TOKEN_LEN: usize = 4;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Token {
    from: Square,
    to: Square,
}

impl Token {
    pub fn new(from: Square, to: Square) -> Self {
        Self { from, to }
    }

    pub fn from_move(mv: &Move) -> Self {
        Self::new(mv.from, mv.to)
    }

    pub fn from(&self) -> Square {
        self.from
    }

    pub fn to(&self) -> Square {
        self.to
    }

    pub fn to_bytes(&self) -> [u8; TOKEN_LEN] {
        [
            self.from.file_char() as u8,
            self.from.rank_char() as u8,
            self.to.file_char() as u8,
            self.to.rank_char() as u8,
        ]
    }

    /// Decode exactly four bytes. Files are case-insensitive.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ProtocolError> {
        let [f1, r1, f2, r2] = bytes else {
            return Err(ProtocolError::WrongLength(bytes.len()));
        };
        Ok(Self {
            from: decode_square(*f1, *r1)?,
            to: decode_square(*f2, *r2)?,
        })
    }
}

/// Parse a two-character cell name such as `E5`
pub fn parse_square(s: &str) -> Result<Square, ProtocolError> {
    match s.as_bytes() {
        [file, rank] => decode_square(*file, *rank),
        other => Err(ProtocolError::WrongLength(other.len())),
    }
}

fn decode_square(file: u8, rank: u8) -> Result<Square, ProtocolError> {
    let col = file.to_ascii_uppercase().wrapping_sub(b'A');
    if col >= BOARD_SIZE {
        return Err(ProtocolError::BadFile(file as char));
    }
    let digit = rank.wrapping_sub(b'0');
    if digit == 0 || digit > BOARD_SIZE {
        return Err(ProtocolError::BadRank(rank as char));
    }
    Square::new(BOARD_SIZE - digit, col).ok_or(ProtocolError::BadRank(rank as char))
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.from, self.to)
    }
}

impl FromStr for Token {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_bytes(s.as_bytes())
    }
}
