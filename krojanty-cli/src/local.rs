//! Local command - both sides on this machine

use std::io;

use anyhow::Result;
use clap::{ArgAction, Args};

use krojanty_core::{Color, LiveMatch};

use crate::config::{self, CommonArgs, Settings};
use crate::game_loop::{Computer, GameLoop, Player};
use crate::terminal::Terminal;

#[derive(Args)]
pub struct LocalArgs {
    /// Computer players: none, -a for Red, -aa for both sides
    #[arg(short = 'a', long = "ai", action = ArgAction::Count)]
    pub ai: u8,

    #[command(flatten)]
    pub common: CommonArgs,
}

pub fn run(args: LocalArgs) -> Result<()> {
    let settings = config::resolve(&args.common)?;
    tracing::info!("Local match, {} computer player(s), {:?}", args.ai.min(2), settings.ai);

    let (blue, red) = match args.ai {
        0 => (Player::Human, Player::Human),
        1 => (Player::Human, computer(&settings, Color::Red)),
        _ => (computer(&settings, Color::Blue), computer(&settings, Color::Red)),
    };

    let terminal = Terminal::new(io::stdin().lock(), io::stdout());
    let mut game = GameLoop::new(LiveMatch::new(&settings.game), blue, red, terminal);
    match game.run()? {
        Some(outcome) => println!("\n{}", outcome),
        None => println!("\nMatch abandoned."),
    }
    Ok(())
}

/// Computer player for `color`; each side gets its own noise stream
pub fn computer(settings: &Settings, color: Color) -> Player {
    let mut search = settings.search.clone();
    search.seed = search.seed.wrapping_add(color.index() as u64);
    Player::Computer(Box::new(Computer::new(search, settings.ai)))
}
