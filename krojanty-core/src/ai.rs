//! Minimax search with alpha-beta pruning

use crate::cache::{Bound, Entry, TranspositionTable, Zobrist};
use crate::config::{Difficulty, SearchConfig};
use crate::eval::{evaluate, terminal_score, WIN_SCORE};
use crate::game::{GameState, Move};
use crate::ordering::{order_moves, HistoryTable, KillerTable, OrderingHints};
use crate::pieces::Color;
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use std::time::Instant;

// ============================================================================
// CONSTANTS
// ============================================================================

/// Window bound, safely outside every reachable score
pub const INFINITY: i32 = 2 * WIN_SCORE;

/// Depth of the fast entry point
const FAST_DEPTH: u32 = 2;

/// Live pieces at or below which the adaptive search goes one ply deeper
const ENDGAME_PIECES: usize = 8;

/// Nodes between deadline checks
const CLOCK_MASK: u64 = 1023;

// ============================================================================
// SEARCHER
// ============================================================================

/// Alpha-beta searcher.
///
/// Owns its transposition table and ordering tables; nothing is shared
/// between instances. Call [`Searcher::reset`] at the start of a new match.
pub struct Searcher {
    config: SearchConfig,
    zobrist: Zobrist,
    table: TranspositionTable,
    killers: KillerTable,
    history: HistoryTable,
    rng: ChaCha8Rng,
    nodes: u64,
    deadline: Option<Instant>,
    aborted: bool,
}

/// Root result: best move found and its score
type RootResult = Option<(Move, i32)>;

impl Searcher {
    pub fn new(config: SearchConfig) -> Self {
        Self {
            zobrist: Zobrist::new(),
            table: TranspositionTable::new(config.table_capacity),
            killers: KillerTable::default(),
            history: HistoryTable::default(),
            rng: ChaCha8Rng::seed_from_u64(config.seed),
            nodes: 0,
            deadline: None,
            aborted: false,
            config,
        }
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Nodes visited since the last reset
    pub fn nodes(&self) -> u64 {
        self.nodes
    }

    pub fn table_len(&self) -> usize {
        self.table.len()
    }

    /// Forget everything learned in previous searches
    pub fn reset(&mut self) {
        self.table.clear();
        self.killers.clear();
        self.history.clear();
        self.rng = ChaCha8Rng::seed_from_u64(self.config.seed);
        self.nodes = 0;
        self.deadline = None;
        self.aborted = false;
    }

    // ========================================================================
    // ENTRY POINTS
    // ========================================================================

    /// Minimax value of `state` for `maximizing`, searched `depth` plies
    pub fn minimax(&mut self, state: &GameState, depth: u32, maximizing: Color, alpha: i32, beta: i32) -> i32 {
        self.deadline = None;
        self.aborted = false;
        self.search(state, depth, 0, maximizing, alpha, beta)
    }

    /// Best move at a fixed depth. Depth 0 scores each reply statically.
    pub fn best_move(&mut self, state: &GameState, depth: u32) -> Option<Move> {
        self.deadline = None;
        self.aborted = false;
        let moves = state.legal_moves();
        if moves.len() <= 1 {
            return moves.first().copied();
        }
        self.search_root(state, depth, moves).map(|(mv, _)| mv)
    }

    /// Iterative deepening under the difficulty's time budget.
    ///
    /// Keeps the deepest completed iteration; an interrupted first
    /// iteration still yields its best move so far.
    pub fn best_move_adaptive(&mut self, state: &GameState, difficulty: Difficulty) -> Option<Move> {
        let moves = state.legal_moves();
        if moves.len() <= 1 {
            return moves.first().copied();
        }

        let live = state.board().pieces().len();
        let max_depth = difficulty.base_depth() + u32::from(live <= ENDGAME_PIECES);
        let deadline = Instant::now() + difficulty.time_budget();
        self.deadline = Some(deadline);
        self.aborted = false;

        let mut chosen: RootResult = None;
        for depth in 1..=max_depth {
            let result = self.search_root(state, depth, moves.clone());
            if self.aborted {
                if chosen.is_none() {
                    chosen = result;
                }
                break;
            }
            chosen = result;
            if Instant::now() >= deadline {
                break;
            }
        }

        self.deadline = None;
        self.aborted = false;
        chosen.map(|(mv, _)| mv).or_else(|| moves.first().copied())
    }

    /// Shallow search over the best-ordered candidates only
    pub fn best_move_fast(&mut self, state: &GameState) -> Option<Move> {
        self.deadline = None;
        self.aborted = false;
        let mut moves = state.legal_moves();
        if moves.len() <= 1 {
            return moves.first().copied();
        }
        order_moves(state.board(), &mut moves, &OrderingHints::NONE);
        moves.truncate(self.config.fast_move_limit.max(1));
        self.search_root(state, FAST_DEPTH, moves).map(|(mv, _)| mv)
    }

    // ========================================================================
    // SEARCH
    // ========================================================================

    fn search_root(&mut self, state: &GameState, depth: u32, mut moves: Vec<Move>) -> RootResult {
        let me = state.to_move();
        let key = self.zobrist.hash(state);
        let hint = self.table.get(key).and_then(|e| e.best);
        self.order(state, &mut moves, hint, 0);

        let mut alpha = -INFINITY;
        let mut best: RootResult = None;
        for mv in moves {
            let Ok(child) = state.with_move(mv) else {
                continue;
            };
            let score = self.search(&child, depth.saturating_sub(1), 1, me, alpha, INFINITY);
            if self.aborted {
                break;
            }
            if best.map_or(true, |(_, s)| score > s) {
                best = Some((mv, score));
                alpha = alpha.max(score);
            }
        }

        if let (Some((mv, score)), false) = (best, self.aborted) {
            if self.config.use_transposition {
                self.table.store(
                    key,
                    Entry {
                        depth,
                        score,
                        bound: Bound::Exact,
                        perspective: me,
                        best: Some(mv),
                    },
                );
            }
        }
        best
    }

    fn search(&mut self, state: &GameState, depth: u32, ply: u32, maximizing: Color, mut alpha: i32, mut beta: i32) -> i32 {
        self.nodes += 1;
        if self.out_of_time() {
            return 0;
        }

        if let Some(outcome) = state.outcome() {
            return terminal_score(&outcome, maximizing, ply);
        }
        if depth == 0 {
            return self.leaf(state, maximizing);
        }

        let mut moves = state.legal_moves();
        if moves.is_empty() {
            // Side to move is stuck and loses
            let winner = state.to_move().opponent();
            return if winner == maximizing {
                WIN_SCORE - ply as i32
            } else {
                -WIN_SCORE + ply as i32
            };
        }

        // Transposition probe
        let key = self.config.use_transposition.then(|| self.zobrist.hash(state));
        let mut hint = None;
        if let Some(entry) = key.and_then(|k| self.table.get(k)) {
            hint = entry.best;
            if entry.perspective == maximizing && entry.depth >= depth {
                match entry.bound {
                    Bound::Exact => return entry.score,
                    Bound::Lower => alpha = alpha.max(entry.score),
                    Bound::Upper => beta = beta.min(entry.score),
                }
                if alpha >= beta {
                    return entry.score;
                }
            }
        }

        self.order(state, &mut moves, hint, ply as usize);

        let (alpha_in, beta_in) = (alpha, beta);
        let is_max = state.to_move() == maximizing;
        let mut best = if is_max { -INFINITY } else { INFINITY };
        let mut best_move = None;

        for mv in moves {
            let Ok(child) = state.with_move(mv) else {
                continue;
            };
            let score = self.search(&child, depth - 1, ply + 1, maximizing, alpha, beta);
            if self.aborted {
                return 0;
            }

            if is_max {
                if score > best || best_move.is_none() {
                    best = score;
                    best_move = Some(mv);
                }
                alpha = alpha.max(score);
            } else {
                if score < best || best_move.is_none() {
                    best = score;
                    best_move = Some(mv);
                }
                beta = beta.min(score);
            }

            if alpha >= beta {
                self.record_cutoff(mv, ply as usize, depth);
                break;
            }
        }

        if let Some(k) = key {
            let bound = if best <= alpha_in {
                Bound::Upper
            } else if best >= beta_in {
                Bound::Lower
            } else {
                Bound::Exact
            };
            self.table.store(
                k,
                Entry {
                    depth,
                    score: best,
                    bound,
                    perspective: maximizing,
                    best: best_move,
                },
            );
        }
        best
    }

    fn leaf(&mut self, state: &GameState, maximizing: Color) -> i32 {
        let base = evaluate(state, maximizing, &self.config.heuristics);
        if self.config.noise_scale <= 0.0 {
            return base;
        }
        let noise = (self.rng.gen::<f32>() - 0.5) * 2.0 * self.config.noise_scale;
        base + noise.round() as i32
    }

    fn order(&self, state: &GameState, moves: &mut [Move], hint: Option<Move>, ply: usize) {
        let hints = OrderingHints {
            hint,
            killers: self.config.use_killers.then_some((&self.killers, ply)),
            history: self.config.use_history.then_some(&self.history),
        };
        order_moves(state.board(), moves, &hints);
    }

    fn record_cutoff(&mut self, mv: Move, ply: usize, depth: u32) {
        if self.config.use_killers {
            self.killers.record(ply, mv);
        }
        if self.config.use_history {
            self.history.record(&mv, depth);
        }
    }

    fn out_of_time(&mut self) -> bool {
        if self.aborted {
            return true;
        }
        if let Some(deadline) = self.deadline {
            if self.nodes & CLOCK_MASK == 0 && Instant::now() >= deadline {
                self.aborted = true;
            }
        }
        self.aborted
    }
}

// ============================================================================
// TESTS
// ============================================================================
