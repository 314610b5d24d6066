//! Serve and connect commands - one side here, the other over TCP
//!
//! The listening side plays Red, the connecting side plays Blue.

use std::io;

use anyhow::{Context, Result};
use clap::Args;

use krojanty_core::{Color, LiveMatch};
use krojanty_net::{connect, Listener, Session};

use crate::config::{self, CommonArgs, Settings};
use crate::game_loop::{GameLoop, Player};
use crate::local::computer;
use crate::terminal::Terminal;

// ============================================================================
// COMMAND ARGUMENTS
// ============================================================================

#[derive(Args)]
pub struct ServeArgs {
    /// Port to listen on
    #[arg(long, default_value = "5555")]
    pub port: u16,

    /// Let the computer play this side
    #[arg(long)]
    pub ai: bool,

    #[command(flatten)]
    pub common: CommonArgs,
}

#[derive(Args)]
pub struct ConnectArgs {
    /// Opponent address
    #[arg(value_name = "HOST:PORT")]
    pub address: String,

    /// Let the computer play this side
    #[arg(long)]
    pub ai: bool,

    #[command(flatten)]
    pub common: CommonArgs,
}

// ============================================================================
// COMMANDS
// ============================================================================

pub fn serve(args: ServeArgs) -> Result<()> {
    let settings = config::resolve(&args.common)?;
    let listener = Listener::bind(("0.0.0.0", args.port))
        .with_context(|| format!("Failed to listen on port {}", args.port))?;
    let addr = listener.local_addr()?;
    println!("Waiting for an opponent on {} ...", addr);

    let session = listener.accept().context("Failed to accept the opponent")?;
    play(session, &settings, args.ai)
}

pub fn connect_to(args: ConnectArgs) -> Result<()> {
    let settings = config::resolve(&args.common)?;
    let session = connect(args.address.as_str())
        .with_context(|| format!("Failed to connect to {}", args.address))?;
    play(session, &settings, args.ai)
}

/// Run the match with the remote side on the other color
fn play(session: Session, settings: &Settings, ai: bool) -> Result<()> {
    let local = session.local_color();
    println!("Connected to {}. You play {}.", session.peer_addr(), local);

    let me = if ai { computer(settings, local) } else { Player::Human };
    let (blue, red) = match local {
        Color::Blue => (me, Player::Remote),
        Color::Red => (Player::Remote, me),
    };

    let terminal = Terminal::new(io::stdin().lock(), io::stdout());
    let mut game = GameLoop::new(LiveMatch::new(&settings.game), blue, red, terminal)
        .with_peer(Box::new(session), local);
    match game.run()? {
        Some(outcome) => println!("\n{}", outcome),
        None => println!("\nMatch ended without a result."),
    }
    Ok(())
}
