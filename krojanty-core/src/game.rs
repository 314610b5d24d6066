//! Board state, game state and move application

use crate::board::{Square, CELLS};
use crate::config::MatchConfig;
use crate::error::MoveError;
use crate::pieces::{Color, Kind, Piece, PieceId};
use crate::rules;
use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// CONSTANTS
// ============================================================================

/// Marker for a vacant slot in the occupancy grid
const EMPTY: u8 = u8::MAX;

/// Blue king start (B8)
const BLUE_KING: (u8, u8) = (1, 1);

/// Blue soldiers start around the king, next to Blue's city.
/// Red's setup is the point mirror through the center.
const BLUE_SOLDIERS: [(u8, u8); 9] = [
    (0, 1),
    (0, 2),
    (0, 3),
    (1, 0),
    (1, 2),
    (2, 0),
    (2, 1),
    (2, 2),
    (3, 0),
];

// ============================================================================
// CORE TYPES
// ============================================================================

/// A fully specified move
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Move {
    pub piece: PieceId,
    pub from: Square,
    pub to: Square,
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.from, self.to)
    }
}

/// Which rule removed a piece
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CaptureRule {
    /// Enemy bracketed between the mover and an ally
    Linca,
    /// Unprotected enemy directly ahead of the mover
    Seltou,
}

impl fmt::Display for CaptureRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CaptureRule::Linca => write!(f, "Linca"),
            CaptureRule::Seltou => write!(f, "Seltou"),
        }
    }
}

/// A piece removed during capture resolution
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capture {
    pub piece: Piece,
    pub rule: CaptureRule,
}

/// Why the game ended
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum EndReason {
    KingCaptured { king: Color },
    AutoDefeat { loser: Color },
    TurnLimit { blue: u32, red: u32 },
    NoLegalMoves { stuck: Color },
    InvalidPeerMove,
}

impl fmt::Display for EndReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EndReason::KingCaptured { king } => write!(f, "the {} king was captured", king.name()),
            EndReason::AutoDefeat { loser } => {
                write!(f, "{} is down to one king and one soldier", loser.name())
            }
            EndReason::TurnLimit { blue, red } => {
                write!(f, "turn limit reached (blue {}, red {})", blue, red)
            }
            EndReason::NoLegalMoves { stuck } => write!(f, "{} has no legal move", stuck.name()),
            EndReason::InvalidPeerMove => write!(f, "the opponent played an invalid move"),
        }
    }
}

/// Terminal result of a game
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    Victory { winner: Color, reason: EndReason },
    Draw { reason: EndReason },
}

impl Outcome {
    pub fn winner(&self) -> Option<Color> {
        match self {
            Outcome::Victory { winner, .. } => Some(*winner),
            Outcome::Draw { .. } => None,
        }
    }

    pub fn reason(&self) -> EndReason {
        match self {
            Outcome::Victory { reason, .. } | Outcome::Draw { reason } => *reason,
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Victory { winner, reason } => write!(f, "{} wins: {}", winner, reason),
            Outcome::Draw { reason } => write!(f, "draw: {}", reason),
        }
    }
}

/// Score per color (controlled cells + surviving soldiers) and live piece counts
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scores {
    pub blue: u32,
    pub red: u32,
    pub blue_pieces: u32,
    pub red_pieces: u32,
}

impl Scores {
    pub fn score(&self, color: Color) -> u32 {
        match color {
            Color::Blue => self.blue,
            Color::Red => self.red,
        }
    }

    pub fn pieces(&self, color: Color) -> u32 {
        match color {
            Color::Blue => self.blue_pieces,
            Color::Red => self.red_pieces,
        }
    }
}

/// Result of applying one move
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MoveReport {
    pub mv: Move,
    pub captures: Vec<Capture>,
    pub outcome: Option<Outcome>,
}

// ============================================================================
// BOARD
// ============================================================================

/// Pieces, occupancy and cell control.
///
/// `pieces` keeps placement order; captures compact it without reordering
/// survivors. `slots` maps each cell to an index into `pieces` and is
/// rebuilt after every removal.
#[derive(Clone, Debug)]
pub struct Board {
    pieces: Vec<Piece>,
    slots: [u8; CELLS],
    control: [Option<Color>; CELLS],
    next_id: u8,
}

impl Default for Board {
    fn default() -> Self {
        Self::empty()
    }
}

impl Board {
    pub fn empty() -> Self {
        Self {
            pieces: Vec::with_capacity(20),
            slots: [EMPTY; CELLS],
            control: [None; CELLS],
            next_id: 0,
        }
    }

    /// Standard opening position: one king and nine soldiers per side
    pub fn standard() -> Self {
        let mut board = Self::empty();
        for color in Color::ALL {
            let place = |(r, c): (u8, u8)| match color {
                Color::Blue => Square::at(r, c),
                Color::Red => Square::at(8 - r, 8 - c),
            };
            board.place(color, Kind::King, place(BLUE_KING));
            for &cell in &BLUE_SOLDIERS {
                board.place(color, Kind::Soldier, place(cell));
            }
        }
        board
    }

    /// Put a new piece on `square`, replacing any occupant
    pub fn place(&mut self, color: Color, kind: Kind, square: Square) -> PieceId {
        if let Some(existing) = self.piece_at(square).map(|p| p.id) {
            self.remove(existing);
        }
        let id = PieceId(self.next_id);
        self.next_id = self.next_id.wrapping_add(1);
        self.slots[square.index()] = self.pieces.len() as u8;
        self.pieces.push(Piece {
            id,
            square,
            color,
            kind,
        });
        id
    }

    /// Live pieces in placement order
    pub fn pieces(&self) -> &[Piece] {
        &self.pieces
    }

    pub fn piece(&self, id: PieceId) -> Option<&Piece> {
        self.pieces.iter().find(|p| p.id == id)
    }

    pub fn piece_at(&self, square: Square) -> Option<&Piece> {
        match self.slots[square.index()] {
            EMPTY => None,
            idx => self.pieces.get(idx as usize),
        }
    }

    pub fn is_empty(&self, square: Square) -> bool {
        self.slots[square.index()] == EMPTY
    }

    pub fn control(&self, square: Square) -> Option<Color> {
        self.control[square.index()]
    }

    pub fn set_control(&mut self, square: Square, owner: Option<Color>) {
        self.control[square.index()] = owner;
    }

    /// Number of cells controlled by `color`
    pub fn controlled(&self, color: Color) -> usize {
        self.control.iter().filter(|c| **c == Some(color)).count()
    }

    pub fn count(&self, color: Color, kind: Kind) -> usize {
        self.pieces
            .iter()
            .filter(|p| p.color == color && p.kind == kind)
            .count()
    }

    pub fn count_color(&self, color: Color) -> usize {
        self.pieces.iter().filter(|p| p.color == color).count()
    }

    pub fn king(&self, color: Color) -> Option<&Piece> {
        self.pieces
            .iter()
            .find(|p| p.color == color && p.kind == Kind::King)
    }

    /// Move a piece without any rule checks. Returns false for unknown ids.
    pub(crate) fn relocate(&mut self, id: PieceId, to: Square) -> bool {
        let Some(idx) = self.pieces.iter().position(|p| p.id == id) else {
            return false;
        };
        let from = self.pieces[idx].square;
        self.slots[from.index()] = EMPTY;
        self.slots[to.index()] = idx as u8;
        self.pieces[idx].square = to;
        true
    }

    /// Remove a piece and clear the control of its cell
    pub fn remove(&mut self, id: PieceId) -> Option<Piece> {
        let idx = self.pieces.iter().position(|p| p.id == id)?;
        let piece = self.pieces.remove(idx);
        self.control[piece.square.index()] = None;
        self.rebuild_slots();
        Some(piece)
    }

    fn rebuild_slots(&mut self) {
        self.slots = [EMPTY; CELLS];
        for (idx, piece) in self.pieces.iter().enumerate() {
            self.slots[piece.square.index()] = idx as u8;
        }
    }
}

// ============================================================================
// GAME STATE
// ============================================================================

/// Game state (clone to explore)
///
/// Owns its board outright, so a clone is an independent snapshot.
#[derive(Clone, Debug)]
pub struct GameState {
    board: Board,
    to_move: Color,
    turn: u16,
    max_turn: u16,
    outcome: Option<Outcome>,
}

impl GameState {
    // ========================================================================
    // CONSTRUCTORS
    // ========================================================================

    pub fn new(board: Board, to_move: Color, config: &MatchConfig) -> Self {
        Self {
            board,
            to_move,
            turn: 1,
            max_turn: config.max_turn,
            outcome: None,
        }
    }

    /// Standard opening, Blue to move
    pub fn standard(config: &MatchConfig) -> Self {
        Self::new(Board::standard(), Color::Blue, config)
    }

    // ========================================================================
    // ACCESSORS
    // ========================================================================

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub(crate) fn board_mut(&mut self) -> &mut Board {
        &mut self.board
    }

    pub fn to_move(&self) -> Color {
        self.to_move
    }

    pub fn turn(&self) -> u16 {
        self.turn
    }

    pub fn max_turn(&self) -> u16 {
        self.max_turn
    }

    pub fn outcome(&self) -> Option<Outcome> {
        self.outcome
    }

    pub fn is_over(&self) -> bool {
        self.outcome.is_some()
    }

    /// Record a terminal outcome. The first outcome wins; returns false if
    /// the game had already ended.
    pub fn finish(&mut self, outcome: Outcome) -> bool {
        if self.outcome.is_some() {
            return false;
        }
        self.outcome = Some(outcome);
        true
    }

    pub fn scores(&self) -> Scores {
        let score = |color| {
            (self.board.controlled(color) + self.board.count(color, Kind::Soldier)) as u32
        };
        Scores {
            blue: score(Color::Blue),
            red: score(Color::Red),
            blue_pieces: self.board.count_color(Color::Blue) as u32,
            red_pieces: self.board.count_color(Color::Red) as u32,
        }
    }

    // ========================================================================
    // MOVE GENERATION AND VALIDATION
    // ========================================================================

    /// All legal moves for the side to move, in generation order
    pub fn legal_moves(&self) -> Vec<Move> {
        let mut moves = Vec::with_capacity(64);
        if self.outcome.is_none() {
            rules::generate_moves(&self.board, self.to_move, &mut moves);
        }
        moves
    }

    pub fn has_legal_move(&self) -> bool {
        self.outcome.is_none() && rules::has_any_move(&self.board, self.to_move)
    }

    /// Build a move for a piece from its current square
    pub fn move_for(&self, piece: PieceId, to: Square) -> Result<Move, MoveError> {
        let p = self
            .board
            .piece(piece)
            .ok_or(MoveError::UnknownPiece(piece))?;
        Ok(Move {
            piece,
            from: p.square,
            to,
        })
    }

    /// Legality checker: does `piece` belong to the side to move and may it
    /// reach `to` this turn?
    pub fn is_legal(&self, piece: PieceId, to: Square) -> bool {
        self.move_for(piece, to)
            .and_then(|mv| self.check_move(mv))
            .is_ok()
    }

    pub fn check_move(&self, mv: Move) -> Result<(), MoveError> {
        if self.outcome.is_some() {
            return Err(MoveError::GameOver);
        }
        let piece = self
            .board
            .piece(mv.piece)
            .ok_or(MoveError::UnknownPiece(mv.piece))?;
        if piece.square != mv.from {
            return Err(MoveError::StaleOrigin {
                piece: mv.piece,
                claimed: mv.from,
                actual: piece.square,
            });
        }
        if piece.color != self.to_move {
            return Err(MoveError::WrongTurn {
                square: piece.square,
                color: piece.color,
                to_move: self.to_move,
            });
        }
        if !rules::is_reachable(&self.board, mv.from, mv.to) {
            return Err(MoveError::Illegal {
                from: mv.from,
                to: mv.to,
            });
        }
        Ok(())
    }

    // ========================================================================
    // MOVE APPLICATION
    // ========================================================================

    /// Validate and apply a move, resolve its captures, advance the turn.
    ///
    /// Nothing is mutated when validation fails.
    pub fn apply_move(&mut self, mv: Move) -> Result<MoveReport, MoveError> {
        self.check_move(mv)?;

        self.board.relocate(mv.piece, mv.to);
        let captures = rules::resolve_move(self, mv.piece, mv.from.coord());

        self.turn = self.turn.saturating_add(1);
        self.to_move = self.to_move.opponent();

        if self.outcome.is_none() {
            if self.turn > self.max_turn {
                self.outcome = Some(self.turn_limit_outcome());
            } else if !rules::has_any_move(&self.board, self.to_move) {
                self.outcome = Some(Outcome::Victory {
                    winner: self.to_move.opponent(),
                    reason: EndReason::NoLegalMoves {
                        stuck: self.to_move,
                    },
                });
            }
        }

        Ok(MoveReport {
            mv,
            captures,
            outcome: self.outcome,
        })
    }

    /// Clone-and-apply, leaving `self` untouched
    pub fn with_move(&self, mv: Move) -> Result<Self, MoveError> {
        let mut next = self.clone();
        next.apply_move(mv)?;
        Ok(next)
    }

    fn turn_limit_outcome(&self) -> Outcome {
        let scores = self.scores();
        let reason = EndReason::TurnLimit {
            blue: scores.blue,
            red: scores.red,
        };
        match scores.blue.cmp(&scores.red) {
            std::cmp::Ordering::Greater => Outcome::Victory {
                winner: Color::Blue,
                reason,
            },
            std::cmp::Ordering::Less => Outcome::Victory {
                winner: Color::Red,
                reason,
            },
            std::cmp::Ordering::Equal => Outcome::Draw { reason },
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> MatchConfig {
        MatchConfig::default()
    }

    fn sq(r: u8, c: u8) -> Square {
        Square::at(r, c)
    }

    #[test]
    fn test_standard_setup() {
        let board = Board::standard();
        assert_eq!(board.pieces().len(), 20);
        for color in Color::ALL {
            assert_eq!(board.count(color, Kind::King), 1);
            assert_eq!(board.count(color, Kind::Soldier), 9);
        }
        assert_eq!(board.king(Color::Blue).map(|k| k.square), Some(sq(1, 1)));
        assert_eq!(board.king(Color::Red).map(|k| k.square), Some(sq(7, 7)));
        assert!(board.is_empty(sq(0, 0)));
        assert!(board.is_empty(sq(8, 8)));
        assert_eq!(board.controlled(Color::Blue), 0);
    }

    #[test]
    fn test_game_creation() {
        let game = GameState::standard(&config());
        assert_eq!(game.to_move(), Color::Blue);
        assert_eq!(game.turn(), 1);
        assert_eq!(game.max_turn(), 64);
        assert!(!game.is_over());
        assert!(!game.legal_moves().is_empty());
    }

    #[test]
    fn test_removal_compacts_and_keeps_ids() {
        let mut board = Board::empty();
        let a = board.place(Color::Blue, Kind::Soldier, sq(0, 0));
        let b = board.place(Color::Red, Kind::Soldier, sq(0, 1));
        let c = board.place(Color::Blue, Kind::Soldier, sq(0, 2));
        board.set_control(sq(0, 1), Some(Color::Red));

        let removed = board.remove(b).map(|p| p.square);
        assert_eq!(removed, Some(sq(0, 1)));
        assert_eq!(board.pieces().iter().map(|p| p.id).collect::<Vec<_>>(), vec![a, c]);
        assert_eq!(board.piece(c).map(|p| p.square), Some(sq(0, 2)));
        assert!(board.piece(b).is_none());
        assert_eq!(board.piece_at(sq(0, 2)).map(|p| p.id), Some(c));
        assert_eq!(board.control(sq(0, 1)), None);
    }

    #[test]
    fn test_apply_move_advances_turn() {
        let mut game = GameState::standard(&config());
        let mv = game.legal_moves()[0];
        let report = game.apply_move(mv).unwrap();
        assert_eq!(report.mv, mv);
        assert_eq!(game.turn(), 2);
        assert_eq!(game.to_move(), Color::Red);
        assert_eq!(game.board().piece(mv.piece).map(|p| p.square), Some(mv.to));
    }

    #[test]
    fn test_illegal_moves_leave_state_untouched() {
        let mut game = GameState::standard(&config());
        let red_king = game.board().king(Color::Red).copied().unwrap();
        let wrong_turn = Move {
            piece: red_king.id,
            from: red_king.square,
            to: sq(7, 4),
        };
        assert!(matches!(game.apply_move(wrong_turn), Err(MoveError::WrongTurn { .. })));

        let blue_king = game.board().king(Color::Blue).copied().unwrap();
        let blocked = Move {
            piece: blue_king.id,
            from: blue_king.square,
            to: sq(1, 5),
        };
        assert!(matches!(game.apply_move(blocked), Err(MoveError::Illegal { .. })));

        let stale = Move {
            piece: blue_king.id,
            from: sq(4, 4),
            to: sq(4, 5),
        };
        assert!(matches!(game.apply_move(stale), Err(MoveError::StaleOrigin { .. })));

        assert_eq!(game.turn(), 1);
        assert_eq!(game.board().piece(blue_king.id).map(|p| p.square), Some(sq(1, 1)));
    }

    #[test]
    fn test_is_legal() {
        let mut board = Board::empty();
        let mover = board.place(Color::Blue, Kind::Soldier, sq(4, 0));
        board.place(Color::Red, Kind::Soldier, sq(4, 5));
        board.place(Color::Blue, Kind::King, sq(0, 8));
        board.place(Color::Red, Kind::King, sq(8, 0));
        let game = GameState::new(board, Color::Blue, &config());

        assert!(game.is_legal(mover, sq(4, 4)));
        assert!(game.is_legal(mover, sq(0, 0)));
        assert!(!game.is_legal(mover, sq(4, 5))); // occupied
        assert!(!game.is_legal(mover, sq(4, 6))); // jump
        assert!(!game.is_legal(mover, sq(5, 1))); // diagonal
        assert!(!game.is_legal(mover, sq(4, 0))); // no-op
        assert!(!game.is_legal(PieceId(99), sq(4, 4)));
    }

    #[test]
    fn test_turn_limit_compares_scores() {
        let mut board = Board::empty();
        let mover = board.place(Color::Blue, Kind::Soldier, sq(4, 0));
        board.place(Color::Blue, Kind::Soldier, sq(6, 0));
        board.place(Color::Blue, Kind::King, sq(0, 8));
        board.place(Color::Red, Kind::King, sq(8, 1));
        board.place(Color::Red, Kind::Soldier, sq(8, 3));
        board.place(Color::Red, Kind::Soldier, sq(8, 5));
        let config = MatchConfig { max_turn: 1 };
        let mut game = GameState::new(board, Color::Blue, &config);

        let mv = game.move_for(mover, sq(4, 4)).unwrap();
        let report = game.apply_move(mv).unwrap();
        // Blue: 2 soldiers + 1 controlled cell, Red: 2 soldiers
        assert_eq!(
            report.outcome,
            Some(Outcome::Victory {
                winner: Color::Blue,
                reason: EndReason::TurnLimit { blue: 3, red: 2 },
            })
        );
        assert!(matches!(game.apply_move(mv), Err(MoveError::GameOver)));
    }

    #[test]
    fn test_with_move_leaves_original() {
        let game = GameState::standard(&config());
        let mv = game.legal_moves()[0];
        let next = game.with_move(mv).unwrap();
        assert_eq!(game.turn(), 1);
        assert_eq!(next.turn(), 2);
        assert_eq!(game.board().piece(mv.piece).map(|p| p.square), Some(mv.from));
    }

    #[test]
    fn test_outcome_messages() {
        let outcome = Outcome::Victory {
            winner: Color::Blue,
            reason: EndReason::KingCaptured { king: Color::Red },
        };
        assert_eq!(outcome.to_string(), "Blue wins: the red king was captured");
        assert_eq!(outcome.winner(), Some(Color::Blue));
        let draw = Outcome::Draw {
            reason: EndReason::TurnLimit { blue: 4, red: 4 },
        };
        assert_eq!(draw.winner(), None);
        assert_eq!(draw.to_string(), "draw: turn limit reached (blue 4, red 4)");
    }
}
