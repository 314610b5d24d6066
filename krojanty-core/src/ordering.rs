//! Move ordering for the searcher

use crate::board::{Square, CELLS};
use crate::game::{Board, Move};
use crate::rules::{adjacent_allies, would_capture};
use std::cmp::Reverse;

/// Killer slots per ply
const KILLERS_PER_PLY: usize = 2;

/// Ordering class, lower is searched first
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum MoveClass {
    Capture = 0,
    Central = 1,
    Defensive = 2,
    Quiet = 3,
}

pub fn classify(board: &Board, mv: &Move) -> MoveClass {
    let Some(piece) = board.piece(mv.piece) else {
        return MoveClass::Quiet;
    };
    if would_capture(board, piece.color, mv.from, mv.to) {
        MoveClass::Capture
    } else if mv.to.distance_to_center() < mv.from.distance_to_center() {
        MoveClass::Central
    } else if adjacent_allies(board, piece.color, mv.to, piece.id)
        > adjacent_allies(board, piece.color, mv.from, piece.id)
    {
        MoveClass::Defensive
    } else {
        MoveClass::Quiet
    }
}

/// Two most recent cutoff moves per ply
#[derive(Default)]
pub struct KillerTable {
    slots: Vec<[Option<Move>; KILLERS_PER_PLY]>,
}

impl KillerTable {
    pub fn record(&mut self, ply: usize, mv: Move) {
        if self.slots.len() <= ply {
            self.slots.resize(ply + 1, [None; KILLERS_PER_PLY]);
        }
        let slot = &mut self.slots[ply];
        if slot[0] != Some(mv) {
            slot[1] = slot[0];
            slot[0] = Some(mv);
        }
    }

    pub fn is_killer(&self, ply: usize, mv: &Move) -> bool {
        self.slots
            .get(ply)
            .is_some_and(|slot| slot.contains(&Some(*mv)))
    }

    pub fn clear(&mut self) {
        self.slots.clear();
    }
}

/// Cutoff counts per (from, to) pair
pub struct HistoryTable {
    scores: Vec<u32>,
}

impl Default for HistoryTable {
    fn default() -> Self {
        Self {
            scores: vec![0; CELLS * CELLS],
        }
    }
}

impl HistoryTable {
    fn slot(from: Square, to: Square) -> usize {
        from.index() * CELLS + to.index()
    }

    pub fn record(&mut self, mv: &Move, depth: u32) {
        let slot = &mut self.scores[Self::slot(mv.from, mv.to)];
        *slot = slot.saturating_add(depth * depth);
    }

    pub fn score(&self, mv: &Move) -> u32 {
        self.scores[Self::slot(mv.from, mv.to)]
    }

    pub fn clear(&mut self) {
        self.scores.fill(0);
    }
}

/// Inputs that break ties inside an ordering class
pub struct OrderingHints<'a> {
    pub hint: Option<Move>,
    pub killers: Option<(&'a KillerTable, usize)>,
    pub history: Option<&'a HistoryTable>,
}

impl OrderingHints<'_> {
    pub const NONE: OrderingHints<'static> = OrderingHints {
        hint: None,
        killers: None,
        history: None,
    };

    fn bonus(&self, mv: &Move) -> u64 {
        if self.hint == Some(*mv) {
            return u64::MAX;
        }
        if let Some((killers, ply)) = self.killers {
            if killers.is_killer(ply, mv) {
                return u64::MAX - 1;
            }
        }
        self.history.map_or(0, |h| h.score(mv) as u64)
    }
}

/// Stable sort by class, then by descending bonus. Without bonuses the
/// generation order survives inside each class.
pub fn order_moves(board: &Board, moves: &mut [Move], hints: &OrderingHints<'_>) {
    moves.sort_by_cached_key(|mv| (classify(board, mv), Reverse(hints.bonus(mv))));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pieces::{Color, Kind, PieceId};

    fn sq(r: u8, c: u8) -> Square {
        Square::at(r, c)
    }

    fn mv(piece: PieceId, from: Square, to: Square) -> Move {
        Move { piece, from, to }
    }

    #[test]
    fn test_classes() {
        let mut board = Board::empty();
        let a = board.place(Color::Blue, Kind::Soldier, sq(3, 4));
        board.place(Color::Red, Kind::Soldier, sq(5, 4));
        let b = board.place(Color::Blue, Kind::Soldier, sq(0, 8));
        board.place(Color::Blue, Kind::Soldier, sq(1, 6));

        assert_eq!(classify(&board, &mv(a, sq(3, 4), sq(4, 4))), MoveClass::Capture);
        assert_eq!(classify(&board, &mv(a, sq(3, 4), sq(3, 5))), MoveClass::Quiet);
        assert_eq!(classify(&board, &mv(b, sq(0, 8), sq(0, 7))), MoveClass::Central);
        assert_eq!(classify(&board, &mv(b, sq(0, 8), sq(1, 8))), MoveClass::Central);
        let c = board.place(Color::Blue, Kind::Soldier, sq(8, 4));
        board.place(Color::Blue, Kind::Soldier, sq(8, 0));
        assert_eq!(classify(&board, &mv(c, sq(8, 4), sq(8, 1))), MoveClass::Defensive);
        assert_eq!(classify(&board, &mv(c, sq(8, 4), sq(8, 6))), MoveClass::Quiet);
    }

    #[test]
    fn test_order_is_stable_within_class() {
        let mut board = Board::empty();
        let a = board.place(Color::Blue, Kind::Soldier, sq(8, 4));
        let moves = vec![
            mv(a, sq(8, 4), sq(8, 5)),
            mv(a, sq(8, 4), sq(8, 6)),
            mv(a, sq(8, 4), sq(8, 3)),
            mv(a, sq(8, 4), sq(7, 4)),
        ];
        let mut ordered = moves.clone();
        order_moves(&board, &mut ordered, &OrderingHints::NONE);
        assert_eq!(ordered[0], moves[3]);
        assert_eq!(&ordered[1..], &[moves[0], moves[1], moves[2]]);
    }

    #[test]
    fn test_hint_killer_history_break_ties() {
        let mut board = Board::empty();
        let a = board.place(Color::Blue, Kind::Soldier, sq(8, 4));
        let quiet = [
            mv(a, sq(8, 4), sq(8, 5)),
            mv(a, sq(8, 4), sq(8, 6)),
            mv(a, sq(8, 4), sq(8, 7)),
            mv(a, sq(8, 4), sq(8, 8)),
        ];
        let mut killers = KillerTable::default();
        killers.record(2, quiet[2]);
        let mut history = HistoryTable::default();
        history.record(&quiet[3], 3);
        let hints = OrderingHints {
            hint: Some(quiet[1]),
            killers: Some((&killers, 2)),
            history: Some(&history),
        };
        let mut ordered = quiet.to_vec();
        order_moves(&board, &mut ordered, &hints);
        assert_eq!(ordered, vec![quiet[1], quiet[2], quiet[3], quiet[0]]);
    }

    #[test]
    fn test_killer_slots_rotate() {
        let a = PieceId(0);
        let m1 = mv(a, sq(0, 0), sq(0, 1));
        let m2 = mv(a, sq(0, 0), sq(0, 2));
        let m3 = mv(a, sq(0, 0), sq(0, 3));
        let mut killers = KillerTable::default();
        killers.record(1, m1);
        killers.record(1, m2);
        killers.record(1, m2);
        assert!(killers.is_killer(1, &m1));
        killers.record(1, m3);
        assert!(!killers.is_killer(1, &m1));
        assert!(killers.is_killer(1, &m2) && killers.is_killer(1, &m3));
        assert!(!killers.is_killer(0, &m3));
        killers.clear();
        assert!(!killers.is_killer(1, &m3));
    }
}
