//! Krojanty Net - Move synchronization between two players
//!
//! - Four-byte move tokens (`A9B9`)
//! - Exact-length token reads and writes over any async stream
//! - A background TCP session feeding a bounded event channel
//! - Validation of peer moves against the local match

pub mod error;
pub mod token;
pub mod transport;
pub mod session;
pub mod sync;

pub use error::{NetError, PeerMoveError, ProtocolError};
pub use token::{parse_square, Token, TOKEN_LEN};
pub use transport::{read_token, send_message, write_token};
pub use session::{connect, Listener, PeerEvent, Session, LISTENER_COLOR};
pub use sync::{apply_peer_move, handle_peer_event, SyncStep};
