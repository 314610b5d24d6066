//! Square geometry on the 9x9 board

use serde::{Deserialize, Serialize};
use std::fmt;

/// Board side length
pub const BOARD_SIZE: u8 = 9;

/// Number of cells on the board
pub const CELLS: usize = (BOARD_SIZE as usize) * (BOARD_SIZE as usize);

/// Orthogonal direction vectors (drow, dcol)
/// Index: 0=up, 1=down, 2=left, 3=right
pub const DIRECTIONS: [(i64, i64); 4] = [(-1, 0), (1, 0), (0, -1), (0, 1)];

/// Central cell, target of the "advance toward the center" ordering rule
pub const CENTER: Square = Square::at(4, 4);

/// Blue's city (top-left corner, A9)
pub const BLUE_CITY: Square = Square::at(0, 0);

/// Red's city (bottom-right corner, I1)
pub const RED_CITY: Square = Square::at(8, 8);

/// A cell on the board, always in range
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Square {
    row: u8,
    col: u8,
}

impl Square {
    /// Build a square from literal coordinates. Panics when out of range,
    /// use [`Square::new`] for untrusted input.
    pub const fn at(row: u8, col: u8) -> Self {
        assert!(row < BOARD_SIZE && col < BOARD_SIZE);
        Self { row, col }
    }

    pub fn new(row: u8, col: u8) -> Option<Self> {
        (row < BOARD_SIZE && col < BOARD_SIZE).then_some(Self { row, col })
    }

    pub fn row(self) -> u8 {
        self.row
    }

    pub fn col(self) -> u8 {
        self.col
    }

    /// Flat index into 81-cell arrays
    pub fn index(self) -> usize {
        self.row as usize * BOARD_SIZE as usize + self.col as usize
    }

    pub fn from_index(index: usize) -> Option<Self> {
        if index >= CELLS {
            return None;
        }
        let size = BOARD_SIZE as usize;
        Some(Self {
            row: (index / size) as u8,
            col: (index % size) as u8,
        })
    }

    /// All 81 squares in row-major order
    pub fn all() -> impl Iterator<Item = Square> {
        (0..CELLS).filter_map(Square::from_index)
    }

    pub fn coord(self) -> Coord {
        Coord::new(self.row as i64, self.col as i64)
    }

    /// Neighbor `steps` cells away in direction (dr, dc), if on the board
    pub fn offset(self, dr: i64, dc: i64, steps: i64) -> Option<Square> {
        self.coord().step(dr * steps, dc * steps).to_square()
    }

    /// Manhattan distance to the central cell
    pub fn distance_to_center(self) -> u8 {
        self.row.abs_diff(CENTER.row) + self.col.abs_diff(CENTER.col)
    }

    pub fn is_city(self) -> bool {
        self == BLUE_CITY || self == RED_CITY
    }

    /// Column letter, 'A' for column 0
    pub fn file_char(self) -> char {
        (b'A' + self.col) as char
    }

    /// Rank digit as printed on the board, '9' for row 0
    pub fn rank_char(self) -> char {
        (b'0' + (BOARD_SIZE - self.row)) as char
    }
}

impl fmt::Display for Square {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.file_char(), self.rank_char())
    }
}

/// Signed coordinate, possibly off the board.
///
/// Capture resolution derives cells from arbitrary move vectors; every
/// derived coordinate goes through [`Coord::to_square`] before indexing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Coord {
    pub row: i64,
    pub col: i64,
}

impl Coord {
    pub const fn new(row: i64, col: i64) -> Self {
        Self { row, col }
    }

    pub fn step(self, dr: i64, dc: i64) -> Coord {
        Coord::new(self.row.saturating_add(dr), self.col.saturating_add(dc))
    }

    pub fn to_square(self) -> Option<Square> {
        let max = BOARD_SIZE as i64 - 1;
        if (0..=max).contains(&self.row) && (0..=max).contains(&self.col) {
            Some(Square {
                row: self.row as u8,
                col: self.col as u8,
            })
        } else {
            None
        }
    }
}

impl From<Square> for Coord {
    fn from(square: Square) -> Self {
        square.coord()
    }
}

/// Unit step of a straight move from `from` to `to`.
///
/// Returns `None` for diagonal and zero-length vectors. Only comparisons are
/// used, so arbitrarily large coordinates cannot overflow.
pub fn unit_step(from: Coord, to: Coord) -> Option<(i64, i64)> {
    if from.row != to.row && from.col != to.col {
        return None;
    }
    if from == to {
        return None;
    }
    let dr = to.row.cmp(&from.row) as i64;
    let dc = to.col.cmp(&from.col) as i64;
    Some((dr, dc))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_square_validity() {
        assert!(Square::new(0, 0).is_some());
        assert!(Square::new(8, 8).is_some());
        assert!(Square::new(9, 0).is_none());
        assert!(Square::new(0, 9).is_none());
    }

    #[test]
    fn test_index_roundtrip_corners() {
        assert_eq!(Square::at(0, 0).index(), 0);
        assert_eq!(Square::at(8, 8).index(), 80);
        assert_eq!(Square::from_index(40), Some(CENTER));
        assert_eq!(Square::from_index(81), None);
        assert_eq!(Square::all().count(), CELLS);
    }

    #[test]
    fn test_display_uses_board_labels() {
        assert_eq!(Square::at(0, 0).to_string(), "A9");
        assert_eq!(Square::at(8, 8).to_string(), "I1");
        assert_eq!(Square::at(4, 2).to_string(), "C5");
    }

    #[test]
    fn test_coord_bounds_are_inclusive() {
        assert!(Coord::new(0, 8).to_square().is_some());
        assert!(Coord::new(-1, 0).to_square().is_none());
        assert!(Coord::new(0, 9).to_square().is_none());
        assert!(Coord::new(2_456_000_000, 4_300_000).to_square().is_none());
        assert!(Coord::new(i64::MAX, 0).step(1, 0).to_square().is_none());
    }

    #[test]
    fn test_unit_step() {
        let a = Coord::new(3, 4);
        assert_eq!(unit_step(a, Coord::new(4, 4)), Some((1, 0)));
        assert_eq!(unit_step(a, Coord::new(3, 0)), Some((0, -1)));
        assert_eq!(unit_step(a, Coord::new(5, 5)), None);
        assert_eq!(unit_step(a, a), None);
        assert_eq!(unit_step(Coord::new(0, -3), Coord::new(0, 0)), Some((0, 1)));
        assert_eq!(unit_step(Coord::new(0, 2_456_000_000), Coord::new(2_456_000_000, 4_300_000)), None);
    }

    #[test]
    fn test_distance_to_center() {
        assert_eq!(CENTER.distance_to_center(), 0);
        assert_eq!(Square::at(0, 0).distance_to_center(), 8);
        assert_eq!(Square::at(3, 4).distance_to_center(), 1);
    }
}
