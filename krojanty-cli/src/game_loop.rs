//! The game loop: single owner of the live match
//!
//! ## Architecture (4-layer granularity)
//!
//! - Level 1: GameLoop::run() - orchestration
//! - Level 2: drain_peer(), human_turn(), computer_turn(), remote_turn()
//! - Level 3: play_local(), apply_step(), disconnect()
//! - Level 4: PeerLink seam and the Computer player

use std::io::{BufRead, Write};
use std::time::Duration;

use anyhow::Result;

use krojanty_core::{Color, GameState, LiveMatch, MatchEvent, Move, Outcome, Searcher, SearchConfig, Square};
use krojanty_net::{handle_peer_event, NetError, PeerEvent, Session, SyncStep, Token};

use crate::config::AiMode;
use crate::terminal::{Command, Terminal};

/// How long to wait for the remote side before checking again
const TICK: Duration = Duration::from_millis(50);

// ============================================================================
// PLAYERS (Level 4)
// ============================================================================

/// A searcher plus the entry point it is driven through
pub struct Computer {
    searcher: Searcher,
    mode: AiMode,
}

impl Computer {
    pub fn new(config: SearchConfig, mode: AiMode) -> Self {
        Self {
            searcher: Searcher::new(config),
            mode,
        }
    }

    /// Pick a move for the side to move, searching on a private copy
    pub fn choose(&mut self, state: &GameState) -> Option<Move> {
        let snapshot = state.clone();
        let mv = match self.mode {
            AiMode::Depth(depth) => self.searcher.best_move(&snapshot, depth),
            AiMode::Adaptive(difficulty) => self.searcher.best_move_adaptive(&snapshot, difficulty),
            AiMode::Fast => self.searcher.best_move_fast(&snapshot),
        };
        tracing::debug!(
            "AI ({:?}) searched {} nodes, table {}",
            self.mode,
            self.searcher.nodes(),
            self.searcher.table_len()
        );
        mv
    }
}

/// Who decides the moves of one color
pub enum Player {
    Human,
    Computer(Box<Computer>),
    /// Moves arrive from the peer link
    Remote,
}

/// Connection to the other program
pub trait PeerLink {
    fn try_recv(&mut self) -> Option<PeerEvent>;
    fn recv_timeout(&mut self, timeout: Duration) -> Option<PeerEvent>;
    fn send(&mut self, token: Token) -> Result<(), NetError>;
    fn close(&mut self);
}

impl PeerLink for Session {
    fn try_recv(&mut self) -> Option<PeerEvent> {
        Session::try_recv(self)
    }

    fn recv_timeout(&mut self, timeout: Duration) -> Option<PeerEvent> {
        Session::recv_timeout(self, timeout)
    }

    fn send(&mut self, token: Token) -> Result<(), NetError> {
        Session::send(self, token)
    }

    fn close(&mut self) {
        Session::close(self)
    }
}

// ============================================================================
// GAME LOOP
// ============================================================================

pub struct GameLoop<R, W> {
    live: LiveMatch,
    /// Indexed by `Color::index()`
    players: [Player; 2],
    terminal: Terminal<R, W>,
    peer: Option<(Box<dyn PeerLink>, Color)>,
}

impl<R: BufRead, W: Write> GameLoop<R, W> {
    pub fn new(live: LiveMatch, blue: Player, red: Player, terminal: Terminal<R, W>) -> Self {
        Self {
            live,
            players: [blue, red],
            terminal,
            peer: None,
        }
    }

    /// Attach a peer link; `local` is the color this program plays
    pub fn with_peer(mut self, peer: Box<dyn PeerLink>, local: Color) -> Self {
        self.peer = Some((peer, local));
        self
    }

    pub fn live(&self) -> &LiveMatch {
        &self.live
    }

    // ========================================================================
    // LEVEL 1 - ORCHESTRATION
    // ========================================================================

    /// Play until the match ends. `None` when a player quits or the
    /// connection drops before a result.
    pub fn run(&mut self) -> Result<Option<Outcome>> {
        self.terminal.show_board(self.live.state(), &[])?;

        loop {
            if !self.drain_peer()? {
                return Ok(None);
            }
            if self.live.is_over() {
                break;
            }

            let color = self.live.state().to_move();
            let keep_going = match self.players[color.index()] {
                Player::Human => self.human_turn(color)?,
                Player::Computer(_) => self.computer_turn(color)?,
                Player::Remote => self.remote_turn()?,
            };
            if !keep_going {
                return Ok(None);
            }
        }

        let outcome = self.live.state().outcome();
        if let Some(outcome) = outcome {
            tracing::info!("Match finished: {}", outcome);
        }
        if let Some((mut peer, _)) = self.peer.take() {
            peer.close();
        }
        Ok(outcome)
    }

    // ========================================================================
    // LEVEL 2 - TURNS
    // ========================================================================

    /// Apply every event already queued by the peer. `false` when the
    /// connection is gone.
    fn drain_peer(&mut self) -> Result<bool> {
        loop {
            let Some((peer, _)) = self.peer.as_mut() else {
                return Ok(true);
            };
            let Some(event) = peer.try_recv() else {
                return Ok(true);
            };
            if !self.apply_step(event)? {
                return Ok(false);
            }
        }
    }

    fn human_turn(&mut self, color: Color) -> Result<bool> {
        match self.terminal.prompt(color)? {
            Command::Quit => {
                self.terminal.message("Leaving the match.")?;
                self.disconnect();
                Ok(false)
            }
            Command::Select(square) => {
                let highlights = self.selectable(square, color);
                if highlights.is_empty() {
                    self.terminal.message(&format!("No moves from {}.", square))?;
                } else {
                    self.terminal.show_board(self.live.state(), &highlights)?;
                }
                Ok(true)
            }
            Command::Move(token) => {
                let piece = self.live.state().board().piece_at(token.from()).copied();
                match piece {
                    Some(p) if p.color == color => match self.live.state().move_for(p.id, token.to()) {
                        Ok(mv) => self.play_local(mv),
                        Err(e) => {
                            self.terminal.message(&format!("Illegal move {}: {}", token, e))?;
                            Ok(true)
                        }
                    },
                    Some(_) => {
                        self.terminal.message(&format!("The piece on {} is not yours.", token.from()))?;
                        Ok(true)
                    }
                    None => {
                        self.terminal.message(&format!("No piece on {}.", token.from()))?;
                        Ok(true)
                    }
                }
            }
            Command::Help => Ok(true),
        }
    }

    fn computer_turn(&mut self, color: Color) -> Result<bool> {
        let Player::Computer(computer) = &mut self.players[color.index()] else {
            return Ok(true);
        };
        match computer.choose(self.live.state()) {
            Some(mv) => {
                tracing::info!("{} AI plays {}", color, mv);
                self.play_local(mv)
            }
            None => {
                // apply_move ends the game when the side to move is stuck
                tracing::warn!("{} AI found no move", color);
                self.disconnect();
                Ok(false)
            }
        }
    }

    fn remote_turn(&mut self) -> Result<bool> {
        let Some((peer, _)) = self.peer.as_mut() else {
            anyhow::bail!("remote player without a connection");
        };
        match peer.recv_timeout(TICK) {
            Some(event) => self.apply_step(event),
            None => Ok(true),
        }
    }

    // ========================================================================
    // LEVEL 3 - STEPS
    // ========================================================================

    /// Play a move chosen on this side and forward it to the peer
    fn play_local(&mut self, mv: Move) -> Result<bool> {
        let events = match self.live.play_move(mv) {
            Ok(events) => events,
            Err(e) => {
                self.terminal.message(&format!("Illegal move {}: {}", mv, e))?;
                return Ok(true);
            }
        };
        self.show(&events)?;

        if let Some((peer, _)) = self.peer.as_mut() {
            if let Err(e) = peer.send(Token::from_move(&mv)) {
                tracing::warn!("Failed to send {}: {}", mv, e);
                self.terminal.message("Connection lost.")?;
                self.disconnect();
                return Ok(self.live.is_over());
            }
        }
        Ok(true)
    }

    fn apply_step(&mut self, event: PeerEvent) -> Result<bool> {
        let Some(local) = self.peer.as_ref().map(|(_, color)| *color) else {
            return Ok(true);
        };
        match handle_peer_event(&mut self.live, event, local) {
            SyncStep::Applied(events) => {
                self.show(&events)?;
                Ok(true)
            }
            SyncStep::Rejected { error, game_over } => {
                self.terminal.message(&format!("Opponent sent an invalid move: {}", error))?;
                if let Some(event) = game_over {
                    self.terminal.show_events(&[event])?;
                }
                self.disconnect();
                Ok(true)
            }
            SyncStep::Lost(reason) => {
                let text = match reason {
                    Some(reason) => format!("Connection lost: {}", reason),
                    None => "Opponent disconnected.".to_string(),
                };
                self.terminal.message(&text)?;
                self.disconnect();
                Ok(self.live.is_over())
            }
        }
    }

    fn show(&mut self, events: &[MatchEvent]) -> Result<()> {
        for event in events {
            if let MatchEvent::Moved { mv, captures } = event {
                for capture in captures {
                    tracing::info!("{} captured {} on {}", mv, capture.rule, capture.piece.square);
                }
            }
        }
        self.terminal.show_events(events)?;
        self.terminal.show_board(self.live.state(), &[])?;
        Ok(())
    }

    fn selectable(&self, square: Square, color: Color) -> Vec<Square> {
        match self.live.state().board().piece_at(square) {
            Some(p) if p.color == color => self.live.highlights(p.id),
            _ => Vec::new(),
        }
    }

    fn disconnect(&mut self) {
        if let Some((mut peer, _)) = self.peer.take() {
            peer.close();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use krojanty_core::{EndReason, MatchConfig};
    use std::cell::RefCell;
    use std::collections::VecDeque;
    use std::io::Cursor;
    use std::rc::Rc;

    #[derive(Default)]
    struct Wire {
        incoming: VecDeque<PeerEvent>,
        sent: Vec<String>,
        closed: bool,
    }

    /// Delivers queued events only while waiting for the remote turn,
    /// then reports a disconnect
    struct FakePeer(Rc<RefCell<Wire>>);

    impl PeerLink for FakePeer {
        fn try_recv(&mut self) -> Option<PeerEvent> {
            None
        }

        fn recv_timeout(&mut self, _timeout: Duration) -> Option<PeerEvent> {
            let mut wire = self.0.borrow_mut();
            Some(wire.incoming.pop_front().unwrap_or(PeerEvent::Disconnected(None)))
        }

        fn send(&mut self, token: Token) -> Result<(), NetError> {
            self.0.borrow_mut().sent.push(token.to_string());
            Ok(())
        }

        fn close(&mut self) {
            self.0.borrow_mut().closed = true;
        }
    }

    fn terminal(script: &str) -> Terminal<Cursor<String>, Vec<u8>> {
        Terminal::new(Cursor::new(script.to_string()), Vec::new())
    }

    fn peer_move(token: &str) -> PeerEvent {
        let token: Token = token.parse().unwrap();
        PeerEvent::Move {
            from: token.from(),
            to: token.to(),
        }
    }

    #[test]
    fn test_hot_seat_moves_then_quit() {
        let live = LiveMatch::new(&MatchConfig::default());
        let mut game = GameLoop::new(live, Player::Human, Player::Human, terminal("A6A5\nI4I5\nquit\n"));
        assert_eq!(game.run().unwrap(), None);
        assert_eq!(game.live().state().turn(), 3);
        assert_eq!(game.live().state().to_move(), Color::Blue);
    }

    #[test]
    fn test_human_mistakes_are_reported() {
        let live = LiveMatch::new(&MatchConfig::default());
        // I4 is red, E5 is empty, A6A6 is not a move
        let script = "I4I5\nE5E6\nA6A6\nB8\nquit\n";
        let mut game = GameLoop::new(live, Player::Human, Player::Human, terminal(script));
        assert_eq!(game.run().unwrap(), None);
        assert_eq!(game.live().state().turn(), 1);
    }

    #[test]
    fn test_computers_finish_the_game() {
        let config = MatchConfig { max_turn: 12 };
        let search = SearchConfig {
            depth: 1,
            ..SearchConfig::default()
        };
        let blue = Player::Computer(Box::new(Computer::new(search.clone(), AiMode::Depth(1))));
        let red = Player::Computer(Box::new(Computer::new(search, AiMode::Fast)));
        let mut game = GameLoop::new(LiveMatch::new(&config), blue, red, terminal(""));
        let outcome = game.run().unwrap();
        assert!(outcome.is_some());
        assert!(game.live().is_over());
    }

    #[test]
    fn test_remote_moves_are_sent_and_received() {
        let wire = Rc::new(RefCell::new(Wire::default()));
        wire.borrow_mut().incoming.push_back(peer_move("I4I5"));

        let live = LiveMatch::new(&MatchConfig::default());
        let mut game = GameLoop::new(live, Player::Human, Player::Remote, terminal("A6A5\nquit\n"))
            .with_peer(Box::new(FakePeer(wire.clone())), Color::Blue);
        assert_eq!(game.run().unwrap(), None);

        let wire = wire.borrow();
        assert_eq!(wire.sent, vec!["A6A5".to_string()]);
        assert!(wire.closed);
        assert_eq!(game.live().state().turn(), 3);
    }

    #[test]
    fn test_invalid_remote_move_forfeits() {
        let wire = Rc::new(RefCell::new(Wire::default()));
        // Red piece moved on Blue's turn
        wire.borrow_mut().incoming.push_back(peer_move("I4I5"));

        let live = LiveMatch::new(&MatchConfig::default());
        let mut game = GameLoop::new(live, Player::Remote, Player::Human, terminal(""))
            .with_peer(Box::new(FakePeer(wire.clone())), Color::Red);
        let outcome = game.run().unwrap();

        assert_eq!(
            outcome,
            Some(Outcome::Victory {
                winner: Color::Red,
                reason: EndReason::InvalidPeerMove,
            })
        );
        assert!(wire.borrow().closed);
        assert!(wire.borrow().sent.is_empty());
    }

    #[test]
    fn test_disconnect_abandons_match() {
        let wire = Rc::new(RefCell::new(Wire::default()));
        let live = LiveMatch::new(&MatchConfig::default());
        let mut game = GameLoop::new(live, Player::Remote, Player::Human, terminal(""))
            .with_peer(Box::new(FakePeer(wire.clone())), Color::Red);
        assert_eq!(game.run().unwrap(), None);
        assert!(wire.borrow().closed);
    }
}
