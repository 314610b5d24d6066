//! Krojanty Core - Rules engine and AI
//!
//! This crate provides the core game logic for Krojanty:
//! - Board geometry (9x9 grid, overflow-safe coordinates)
//! - Game state, movement and the capture rules (Linca, Seltou, auto-defeat)
//! - Position evaluation
//! - Minimax search with alpha-beta, transposition table and move ordering
//! - The live match that every move source goes through

pub mod board;
pub mod pieces;
pub mod error;
pub mod game;
pub mod rules;
pub mod eval;
pub mod cache;
pub mod ordering;
pub mod ai;
pub mod config;
pub mod live;

// Re-exports for convenient access
pub use board::{Coord, Square, BOARD_SIZE, DIRECTIONS};
pub use pieces::{Color, Kind, Piece, PieceId};
pub use error::{ConfigError, MoveError};
pub use game::{Board, Capture, CaptureRule, EndReason, GameState, Move, MoveReport, Outcome, Scores};
pub use eval::{evaluate, Heuristics, WIN_SCORE};
pub use ai::Searcher;
pub use config::{Difficulty, MatchConfig, SearchConfig};
pub use live::{LiveMatch, MatchEvent};
