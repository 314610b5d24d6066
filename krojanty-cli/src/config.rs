//! Options shared by every command and the JSON settings file

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use serde::{Deserialize, Serialize};

use krojanty_core::{Difficulty, MatchConfig, SearchConfig};

// ============================================================================
// COMMAND ARGUMENTS
// ============================================================================

#[derive(Args, Clone, Debug, Default)]
pub struct CommonArgs {
    /// Fixed search depth in plies (overrides --difficulty)
    #[arg(long)]
    pub depth: Option<u32>,

    /// Adaptive search budget: easy, medium or hard
    #[arg(long)]
    pub difficulty: Option<Difficulty>,

    /// Use the fast shallow search
    #[arg(long, conflicts_with_all = ["depth", "difficulty"])]
    pub fast: bool,

    /// Turn limit
    #[arg(long)]
    pub max_turn: Option<u16>,

    /// JSON settings file
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Seed for the AI's evaluation noise
    #[arg(long)]
    pub seed: Option<u64>,
}

// ============================================================================
// SETTINGS
// ============================================================================

/// How the computer picks its moves
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AiMode {
    Depth(u32),
    Adaptive(Difficulty),
    Fast,
}

/// Contents of the settings file
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SettingsFile {
    pub search: SearchConfig,
    #[serde(rename = "match")]
    pub game: MatchConfig,
}

/// Resolved settings for one run
#[derive(Clone, Debug)]
pub struct Settings {
    pub search: SearchConfig,
    pub game: MatchConfig,
    pub ai: AiMode,
}

/// Load the settings file if any, then apply command-line overrides
pub fn resolve(args: &CommonArgs) -> Result<Settings> {
    let file = match &args.config {
        Some(path) => load_file(path)?,
        None => SettingsFile::default(),
    };
    apply_overrides(file, args)
}

fn load_file(path: &Path) -> Result<SettingsFile> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read settings: {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse settings: {}", path.display()))
}

fn apply_overrides(file: SettingsFile, args: &CommonArgs) -> Result<Settings> {
    let SettingsFile { mut search, mut game } = file;

    if let Some(max_turn) = args.max_turn {
        game.max_turn = max_turn;
    }
    game.validate()?;

    if let Some(seed) = args.seed {
        search.seed = seed;
    }
    if let Some(depth) = args.depth {
        search.depth = depth;
    }
    if let Some(difficulty) = args.difficulty {
        search.difficulty = difficulty;
    }

    let ai = if args.fast {
        AiMode::Fast
    } else if args.depth.is_some() {
        AiMode::Depth(search.depth)
    } else {
        AiMode::Adaptive(search.difficulty)
    };

    Ok(Settings { search, game, ai })
}
