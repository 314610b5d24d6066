//! Applying peer moves to the local match

use crate::error::PeerMoveError;
use crate::session::PeerEvent;
use krojanty_core::{Color, EndReason, LiveMatch, MatchEvent, Square};
use tracing::warn;

/// What the game loop should do after handling one peer event
#[derive(Debug, PartialEq, Eq)]
pub enum SyncStep {
    /// The move was applied like a local one
    Applied(Vec<MatchEvent>),
    /// The peer broke the rules; the match is forfeited to the local player
    /// and the connection should be closed
    Rejected {
        error: PeerMoveError,
        game_over: Option<MatchEvent>,
    },
    /// The connection is gone; the board is left as it was
    Lost(Option<String>),
}

/// Validate and apply a move received from the peer.
///
/// Checks, in order: a piece stands on `from`, it is the peer's turn, the
/// piece belongs to the side to move, and the move is legal. Any failure
/// ends the match in favor of `local` and leaves the board untouched.
pub fn apply_peer_move(
    live: &mut LiveMatch,
    from: Square,
    to: Square,
    local: Color,
) -> Result<Vec<MatchEvent>, PeerMoveError> {
    let result = check_and_play(live, from, to, local);
    if let Err(e) = &result {
        warn!("Invalid move from peer {}{}: {}", from, to, e);
        live.forfeit(local, EndReason::InvalidPeerMove);
    }
    result
}

fn check_and_play(
    live: &mut LiveMatch,
    from: Square,
    to: Square,
    local: Color,
) -> Result<Vec<MatchEvent>, PeerMoveError> {
    let state = live.state();
    let piece = *state.board().piece_at(from).ok_or(PeerMoveError::NoPiece(from))?;
    if piece.color != state.to_move() {
        return Err(PeerMoveError::WrongTurn {
            square: from,
            color: piece.color,
            to_move: state.to_move(),
        });
    }
    if state.to_move() == local {
        return Err(PeerMoveError::NotPeerTurn);
    }
    Ok(live.play(piece.id, to)?)
}

/// Route one event from the session into the match
pub fn handle_peer_event(live: &mut LiveMatch, event: PeerEvent, local: Color) -> SyncStep {
    let result = match event {
        PeerEvent::Move { from, to } => apply_peer_move(live, from, to, local),
        PeerEvent::Invalid(e) => {
            warn!("Malformed token from peer: {}", e);
            live.forfeit(local, EndReason::InvalidPeerMove);
            Err(PeerMoveError::Malformed(e))
        }
        PeerEvent::Disconnected(reason) => return SyncStep::Lost(reason),
    };
    match result {
        Ok(events) => SyncStep::Applied(events),
        Err(error) => SyncStep::Rejected {
            error,
            game_over: live.state().outcome().map(MatchEvent::GameOver),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProtocolError;
    use krojanty_core::{MatchConfig, MoveError, Outcome};

    fn sq(r: u8, c: u8) -> Square {
        Square::at(r, c)
    }

    fn forfeited_to(live: &LiveMatch, local: Color) -> bool {
        live.state().outcome()
            == Some(Outcome::Victory {
                winner: local,
                reason: EndReason::InvalidPeerMove,
            })
    }

    #[test]
    fn test_valid_peer_move_applies() {
        // local is Red, so Blue's opening move comes from the peer
        let mut live = LiveMatch::new(&MatchConfig::default());
        let events = apply_peer_move(&mut live, sq(0, 1), sq(0, 0), Color::Red).unwrap();
        assert!(matches!(events[0], MatchEvent::Moved { .. }));
        assert!(live.state().board().piece_at(sq(0, 0)).is_some());
        assert_eq!(live.state().to_move(), Color::Red);
    }

    #[test]
    fn test_empty_origin_forfeits() {
        let mut live = LiveMatch::new(&MatchConfig::default());
        let err = apply_peer_move(&mut live, sq(4, 4), sq(4, 5), Color::Red).unwrap_err();
        assert_eq!(err, PeerMoveError::NoPiece(sq(4, 4)));
        assert!(forfeited_to(&live, Color::Red));
    }

    #[test]
    fn test_wrong_color_forfeits() {
        let mut live = LiveMatch::new(&MatchConfig::default());
        let err = apply_peer_move(&mut live, sq(8, 7), sq(8, 8), Color::Red).unwrap_err();
        assert!(matches!(err, PeerMoveError::WrongTurn { color: Color::Red, .. }));
        assert!(forfeited_to(&live, Color::Red));
    }

    #[test]
    fn test_move_on_local_turn_forfeits() {
        // local is Blue and it is Blue's turn; the peer tries to move a blue piece
        let mut live = LiveMatch::new(&MatchConfig::default());
        let err = apply_peer_move(&mut live, sq(0, 1), sq(0, 0), Color::Blue).unwrap_err();
        assert_eq!(err, PeerMoveError::NotPeerTurn);
        assert!(forfeited_to(&live, Color::Blue));
        assert!(live.state().board().piece_at(sq(0, 1)).is_some());
    }

    #[test]
    fn test_illegal_move_forfeits() {
        let mut live = LiveMatch::new(&MatchConfig::default());
        let err = apply_peer_move(&mut live, sq(1, 1), sq(1, 5), Color::Red).unwrap_err();
        assert!(matches!(err, PeerMoveError::Illegal(MoveError::Illegal { .. })));
        assert!(forfeited_to(&live, Color::Red));
        assert_eq!(live.state().turn(), 1);
    }

    #[test]
    fn test_handle_events() {
        let mut live = LiveMatch::new(&MatchConfig::default());
        let step = handle_peer_event(
            &mut live,
            PeerEvent::Move { from: sq(0, 1), to: sq(0, 0) },
            Color::Red,
        );
        assert!(matches!(step, SyncStep::Applied(_)));

        let lost = handle_peer_event(&mut live, PeerEvent::Disconnected(None), Color::Red);
        assert_eq!(lost, SyncStep::Lost(None));
        assert!(!live.is_over());

        let step = handle_peer_event(&mut live, PeerEvent::Invalid(ProtocolError::BadRank('0')), Color::Red);
        match step {
            SyncStep::Rejected { error, game_over } => {
                assert_eq!(error, PeerMoveError::Malformed(ProtocolError::BadRank('0')));
                assert!(matches!(game_over, Some(MatchEvent::GameOver(_))));
            }
            other => panic!("expected rejection, got {:?}", other),
        }
        assert!(forfeited_to(&live, Color::Red));
    }
}
