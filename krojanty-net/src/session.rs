//! Background connection to the peer
//!
//! The session owns a small tokio runtime. A reader task turns incoming
//! tokens into [`PeerEvent`]s on a bounded channel and a writer task drains
//! outgoing tokens. The game loop never touches the socket: it polls
//! [`Session::try_recv`] and calls [`Session::send`].

use crate::error::{NetError, ProtocolError};
use crate::token::Token;
use crate::transport::{read_token, write_token};
use krojanty_core::{Color, Square};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpListener, TcpStream, ToSocketAddrs};
use tokio::runtime::Runtime;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Pending events before the reader waits on the game loop
const INCOMING_CAPACITY: usize = 32;

/// Pending outgoing tokens
const OUTGOING_CAPACITY: usize = 32;

/// Color taken by the listening side; the connecting side plays the other
pub const LISTENER_COLOR: Color = Color::Red;

/// What the reader task hands to the game loop
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PeerEvent {
    /// A well-formed token, not yet checked against the game
    Move { from: Square, to: Square },
    /// Four bytes that do not decode to a move
    Invalid(ProtocolError),
    /// The stream ended; carries the error text if it failed
    Disconnected(Option<String>),
}

// ============================================================================
// LISTENER
// ============================================================================

/// Bound socket waiting for the single peer
pub struct Listener {
    runtime: Runtime,
    listener: TcpListener,
}

impl Listener {
    pub fn bind(addr: impl ToSocketAddrs) -> Result<Self, NetError> {
        let runtime = Runtime::new()?;
        let listener = runtime.block_on(TcpListener::bind(addr))?;
        Ok(Self { runtime, listener })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, NetError> {
        Ok(self.listener.local_addr()?)
    }

    /// Block until one peer connects. The listener plays [`LISTENER_COLOR`].
    pub fn accept(self) -> Result<Session, NetError> {
        let Self { runtime, listener } = self;
        let (stream, peer) = runtime.block_on(listener.accept())?;
        info!("Peer connected from {}", peer);
        Session::start(runtime, stream, LISTENER_COLOR)
    }
}

/// Connect to a listening peer. The connector plays the opposite of
/// [`LISTENER_COLOR`].
pub fn connect(addr: impl ToSocketAddrs) -> Result<Session, NetError> {
    let runtime = Runtime::new()?;
    let stream = runtime.block_on(TcpStream::connect(addr))?;
    info!("Connected to {}", stream.peer_addr()?);
    Session::start(runtime, stream, LISTENER_COLOR.opponent())
}

// ============================================================================
// SESSION
// ============================================================================

pub struct Session {
    runtime: Runtime,
    incoming: mpsc::Receiver<PeerEvent>,
    outgoing: Option<mpsc::Sender<Token>>,
    shutdown: watch::Sender<bool>,
    tasks: Vec<JoinHandle<()>>,
    local_color: Color,
    peer_addr: SocketAddr,
}

impl Session {
    fn start(runtime: Runtime, stream: TcpStream, local_color: Color) -> Result<Self, NetError> {
        stream.set_nodelay(true)?;
        let peer_addr = stream.peer_addr()?;
        let (reader, writer) = stream.into_split();

        let (event_tx, incoming) = mpsc::channel(INCOMING_CAPACITY);
        let (token_tx, token_rx) = mpsc::channel(OUTGOING_CAPACITY);
        let (shutdown, shutdown_rx) = watch::channel(false);

        let tasks = vec![
            runtime.spawn(reader_task(reader, event_tx, shutdown_rx.clone())),
            runtime.spawn(writer_task(writer, token_rx, shutdown_rx)),
        ];

        Ok(Self {
            runtime,
            incoming,
            outgoing: Some(token_tx),
            shutdown,
            tasks,
            local_color,
            peer_addr,
        })
    }

    pub fn local_color(&self) -> Color {
        self.local_color
    }

    pub fn peer_addr(&self) -> SocketAddr {
        self.peer_addr
    }

    /// Queue a token for the writer task
    pub fn send(&self, token: Token) -> Result<(), NetError> {
        let sender = self.outgoing.as_ref().ok_or(NetError::Disconnected)?;
        debug!("Queueing {}", token);
        sender.blocking_send(token).map_err(|_| NetError::Disconnected)
    }

    /// Next event if one is ready. Never blocks.
    pub fn try_recv(&mut self) -> Option<PeerEvent> {
        self.incoming.try_recv().ok()
    }

    /// Wait up to `timeout` for the next event
    pub fn recv_timeout(&mut self, timeout: Duration) -> Option<PeerEvent> {
        let incoming = &mut self.incoming;
        self.runtime
            .block_on(async { tokio::time::timeout(timeout, incoming.recv()).await })
            .ok()
            .flatten()
    }

    /// Stop both tasks and wait for them. Safe to call twice.
    pub fn close(&mut self) {
        if self.tasks.is_empty() {
            return;
        }
        // Dropping the sender lets the writer finish the queue first
        self.outgoing = None;
        let _ = self.shutdown.send(true);
        for task in self.tasks.drain(..) {
            if let Err(e) = self.runtime.block_on(task) {
                warn!("Network task ended abnormally: {}", e);
            }
        }
        info!("Session with {} closed", self.peer_addr);
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.close();
    }
}

// ============================================================================
// TASKS
// ============================================================================

async fn reader_task(
    mut reader: OwnedReadHalf,
    events: mpsc::Sender<PeerEvent>,
    mut shutdown: watch::Receiver<bool>,
) {
    loop {
        let read = tokio::select! {
            _ = shutdown.changed() => break,
            read = read_token(&mut reader) => read,
        };

        let event = match read {
            Ok(Some(bytes)) => match Token::from_bytes(&bytes) {
                Ok(token) => {
                    info!("Received {}", token);
                    PeerEvent::Move {
                        from: token.from(),
                        to: token.to(),
                    }
                }
                Err(e) => {
                    warn!("Undecodable token {:?}: {}", String::from_utf8_lossy(&bytes), e);
                    PeerEvent::Invalid(e)
                }
            },
            Ok(None) => {
                info!("Peer closed the connection");
                let _ = events.send(PeerEvent::Disconnected(None)).await;
                break;
            }
            Err(e) => {
                warn!("Read failed: {}", e);
                let _ = events.send(PeerEvent::Disconnected(Some(e.to_string()))).await;
                break;
            }
        };

        if events.send(event).await.is_err() {
            break;
        }
    }
}

async fn writer_task(
    mut writer: OwnedWriteHalf,
    mut tokens: mpsc::Receiver<Token>,
    mut shutdown: watch::Receiver<bool>,
) {
    loop {
        let next = tokio::select! {
            biased;
            token = tokens.recv() => Some(token),
            _ = shutdown.changed() => None,
        };
        let Some(token) = next else {
            // Tokens queued before close still go out, in order
            drain(&mut writer, &mut tokens).await;
            break;
        };
        let Some(token) = token else {
            break;
        };
        if !write_one(&mut writer, &token).await {
            break;
        }
    }
    let _ = tokio::io::AsyncWriteExt::shutdown(&mut writer).await;
}

async fn drain(writer: &mut OwnedWriteHalf, tokens: &mut mpsc::Receiver<Token>) {
    while let Ok(token) = tokens.try_recv() {
        if !write_one(writer, &token).await {
            return;
        }
    }
}

async fn write_one(writer: &mut OwnedWriteHalf, token: &Token) -> bool {
    match write_token(writer, token).await {
        Ok(()) => {
            info!("Sent {}", token);
            true
        }
        Err(e) => {
            warn!("Write failed: {}", e);
            false
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
