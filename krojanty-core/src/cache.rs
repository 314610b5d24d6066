//! Position fingerprints and the transposition table

use crate::board::CELLS;
use crate::game::{GameState, Move};
use crate::pieces::Color;
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use rustc_hash::FxHashMap;

/// Fixed seed so fingerprints are reproducible across runs
const ZOBRIST_SEED: u64 = 0x6b72_6f6a_616e_7479;

/// Highest turn number with its own key; later turns share the last one
const MAX_TURN_KEYS: usize = 256;

/// Zobrist keys for pieces, control, side to move and turn
pub struct Zobrist {
    /// [color][kind][cell]
    pieces: Vec<u64>,
    /// [color][cell]
    control: Vec<u64>,
    side: u64,
    turns: Vec<u64>,
}

impl Default for Zobrist {
    fn default() -> Self {
        Self::new()
    }
}

impl Zobrist {
    pub fn new() -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(ZOBRIST_SEED);
        Self {
            pieces: (0..2 * 2 * CELLS).map(|_| rng.gen()).collect(),
            control: (0..2 * CELLS).map(|_| rng.gen()).collect(),
            side: rng.gen(),
            turns: (0..MAX_TURN_KEYS).map(|_| rng.gen()).collect(),
        }
    }

    pub fn hash(&self, state: &GameState) -> u64 {
        let board = state.board();
        let mut h = 0u64;
        for p in board.pieces() {
            h ^= self.pieces[(p.color.index() * 2 + p.kind.index()) * CELLS + p.square.index()];
        }
        for sq in crate::board::Square::all() {
            if let Some(owner) = board.control(sq) {
                h ^= self.control[owner.index() * CELLS + sq.index()];
            }
        }
        if state.to_move() == Color::Red {
            h ^= self.side;
        }
        h ^ self.turns[(state.turn() as usize).min(MAX_TURN_KEYS - 1)]
    }
}

/// How a stored score relates to the true value
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Bound {
    Exact,
    /// Failed high: true score >= stored
    Lower,
    /// Failed low: true score <= stored
    Upper,
}

#[derive(Clone, Copy, Debug)]
pub struct Entry {
    pub depth: u32,
    pub score: i32,
    pub bound: Bound,
    /// Color the score is measured for
    pub perspective: Color,
    pub best: Option<Move>,
}

/// Transposition table, emptied wholesale once it reaches capacity
pub struct TranspositionTable {
    entries: FxHashMap<u64, Entry>,
    capacity: usize,
}

impl TranspositionTable {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: FxHashMap::default(),
            capacity: capacity.max(1),
        }
    }

    pub fn get(&self, key: u64) -> Option<&Entry> {
        self.entries.get(&key)
    }

    /// Store an entry, keeping a deeper one already present for the same key
    pub fn store(&mut self, key: u64, entry: Entry) {
        if let Some(existing) = self.entries.get(&key) {
            if existing.depth > entry.depth {
                return;
            }
        } else if self.entries.len() >= self.capacity {
            self.entries.clear();
        }
        self.entries.insert(key, entry);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MatchConfig;

    fn entry(depth: u32, score: i32) -> Entry {
        Entry {
            depth,
            score,
            bound: Bound::Exact,
            perspective: Color::Blue,
            best: None,
        }
    }

    #[test]
    fn test_hash_is_stable_and_sensitive() {
        let z = Zobrist::new();
        let game = GameState::standard(&MatchConfig::default());
        assert_eq!(z.hash(&game), Zobrist::new().hash(&game));

        let mv = game.legal_moves()[0];
        let next = game.with_move(mv).unwrap();
        assert_ne!(z.hash(&game), z.hash(&next));
    }

    #[test]
    fn test_transposed_move_orders_match() {
        let z = Zobrist::new();
        let game = GameState::standard(&MatchConfig::default());
        let blue = game.legal_moves();
        let (b1, b2) = (blue[0], *blue.iter().find(|m| m.piece != blue[0].piece).unwrap());

        let after_b1 = game.with_move(b1).unwrap();
        let r1 = after_b1.legal_moves()[0];
        let a = after_b1.with_move(r1).unwrap().with_move(b2).unwrap();

        let after_b2 = game.with_move(b2).unwrap();
        let b = after_b2.with_move(r1).unwrap().with_move(b1).unwrap();

        assert_eq!(z.hash(&a), z.hash(&b));
    }

    #[test]
    fn test_table_keeps_deeper_entry() {
        let mut tt = TranspositionTable::new(8);
        tt.store(1, entry(4, 10));
        tt.store(1, entry(2, 99));
        assert_eq!(tt.get(1).map(|e| e.score), Some(10));
        tt.store(1, entry(5, 7));
        assert_eq!(tt.get(1).map(|e| e.score), Some(7));
    }

    #[test]
    fn test_table_clears_at_capacity() {
        let mut tt = TranspositionTable::new(2);
        tt.store(1, entry(1, 1));
        tt.store(2, entry(1, 2));
        tt.store(3, entry(1, 3));
        assert_eq!(tt.len(), 1);
        assert!(tt.get(1).is_none());
        assert!(tt.get(3).is_some());
        tt.clear();
        assert!(tt.is_empty());
    }
}
