//! Krojanty CLI - Command-line interface
//!
//! Commands:
//! - local: Play on this machine (hot seat, against the AI, or AI vs AI)
//! - serve: Wait for an opponent over TCP (plays Red)
//! - connect: Join an opponent over TCP (plays Blue)
//! - selfplay: Run AI vs AI games and report statistics

mod config;
mod game_loop;
mod local;
mod network;
mod selfplay;
mod terminal;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "krojanty")]
#[command(about = "Krojanty: a two-player capture game on a 9x9 board")]
struct Cli {
    /// Log search and network details
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Play on this machine
    Local(local::LocalArgs),
    /// Host a network match
    Serve(network::ServeArgs),
    /// Join a network match
    Connect(network::ConnectArgs),
    /// Computer against computer
    Selfplay(selfplay::SelfplayArgs),
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // RUST_LOG takes precedence over --verbose
    let default_level = if cli.verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Local(args) => local::run(args),
        Commands::Serve(args) => network::serve(args),
        Commands::Connect(args) => network::connect_to(args),
        Commands::Selfplay(args) => selfplay::run(args),
    }
}
