//! Piece definitions

use crate::board::Square;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Side color. Blue moves first.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Color {
    Blue = 0,
    Red = 1,
}

impl Color {
    pub const ALL: [Color; 2] = [Color::Blue, Color::Red];

    pub fn opponent(self) -> Self {
        match self {
            Color::Blue => Color::Red,
            Color::Red => Color::Blue,
        }
    }

    pub fn index(self) -> usize {
        self as usize
    }

    /// Lowercase name used in status messages
    pub fn name(self) -> &'static str {
        match self {
            Color::Blue => "blue",
            Color::Red => "red",
        }
    }

    /// Home city of this color
    pub fn city(self) -> Square {
        match self {
            Color::Blue => crate::board::BLUE_CITY,
            Color::Red => crate::board::RED_CITY,
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Color::Blue => write!(f, "Blue"),
            Color::Red => write!(f, "Red"),
        }
    }
}

/// Piece kind
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Kind {
    King = 0,
    Soldier = 1,
}

impl Kind {
    pub fn index(self) -> usize {
        self as usize
    }
}

/// Stable piece identifier.
///
/// Assigned once when the piece is placed and never reused within a game,
/// so an id taken before a capture cascade either still names the same
/// piece or resolves to nothing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PieceId(pub u8);

impl fmt::Display for PieceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A piece on the board
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Piece {
    pub id: PieceId,
    pub square: Square,
    pub color: Color,
    pub kind: Kind,
}

impl Piece {
    pub fn is_king(&self) -> bool {
        self.kind == Kind::King
    }

    /// Single-letter symbol: uppercase for Blue, lowercase for Red
    pub fn symbol(&self) -> char {
        let c = match self.kind {
            Kind::King => 'K',
            Kind::Soldier => 'S',
        };
        match self.color {
            Color::Blue => c,
            Color::Red => c.to_ascii_lowercase(),
        }
    }
}
