//! The authoritative match owned by the game loop

use crate::board::Square;
use crate::config::MatchConfig;
use crate::error::MoveError;
use crate::game::{Capture, EndReason, GameState, Move, Outcome, Scores};
use crate::pieces::{Color, PieceId};
use crate::rules::destinations;

/// Notifications for the presentation layer, in the order they happened
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MatchEvent {
    Moved { mv: Move, captures: Vec<Capture> },
    ScoreChanged(Scores),
    GameOver(Outcome),
}

/// Single mutator of a game in progress.
///
/// Local input, the searcher and the network peer all go through
/// [`LiveMatch::play`], so every source is validated the same way.
#[derive(Clone, Debug)]
pub struct LiveMatch {
    state: GameState,
}

impl LiveMatch {
    pub fn new(config: &MatchConfig) -> Self {
        Self {
            state: GameState::standard(config),
        }
    }

    pub fn from_state(state: GameState) -> Self {
        Self { state }
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    /// Independent copy for the searcher
    pub fn snapshot(&self) -> GameState {
        self.state.clone()
    }

    pub fn is_over(&self) -> bool {
        self.state.is_over()
    }

    /// Move `piece` to `to` if legal. Nothing changes on error.
    pub fn play(&mut self, piece: PieceId, to: Square) -> Result<Vec<MatchEvent>, MoveError> {
        let mv = self.state.move_for(piece, to)?;
        self.play_move(mv)
    }

    pub fn play_move(&mut self, mv: Move) -> Result<Vec<MatchEvent>, MoveError> {
        let report = self.state.apply_move(mv)?;
        let mut events = vec![
            MatchEvent::Moved {
                mv: report.mv,
                captures: report.captures,
            },
            MatchEvent::ScoreChanged(self.state.scores()),
        ];
        if let Some(outcome) = report.outcome {
            events.push(MatchEvent::GameOver(outcome));
        }
        Ok(events)
    }

    /// End the match in `winner`'s favor. Returns `None` if it was already over.
    pub fn forfeit(&mut self, winner: Color, reason: EndReason) -> Option<MatchEvent> {
        let outcome = Outcome::Victory { winner, reason };
        self.state.finish(outcome).then_some(MatchEvent::GameOver(outcome))
    }

    /// Destinations to highlight for a selected piece. Empty unless the
    /// piece belongs to the side to move and the game is running.
    pub fn highlights(&self, piece: PieceId) -> Vec<Square> {
        match self.state.board().piece(piece) {
            Some(p) if !self.state.is_over() && p.color == self.state.to_move() => {
                destinations(self.state.board(), p.square)
            }
            _ => Vec::new(),
        }
    }
}
