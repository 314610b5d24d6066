//! Self-play command - computer against computer, with statistics
//!
//! ## Architecture (4-layer granularity)
//!
//! - Level 1: run() - orchestration
//! - Level 2: play_series(), report_results()
//! - Level 3: play_single_game(), compute_statistics()
//! - Level 4: formatting utilities

use std::time::Instant;

use anyhow::Result;
use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use krojanty_core::{Color, EndReason, GameState, Outcome, Scores};

use crate::config::{self, CommonArgs, Settings};
use crate::game_loop::Computer;

// ============================================================================
// COMMAND ARGUMENTS (Level 4 - Configuration)
// ============================================================================

#[derive(Args)]
pub struct SelfplayArgs {
    /// Number of games to play
    #[arg(long, default_value = "10")]
    pub games: usize,

    /// Evaluation noise so games differ
    #[arg(long, default_value = "20.0")]
    pub noise: f32,

    /// Output results as JSON
    #[arg(long)]
    pub json: bool,

    #[command(flatten)]
    pub common: CommonArgs,
}

/// Result of a single game
#[derive(Clone, Debug)]
pub struct GameRecord {
    pub game_number: usize,
    pub outcome: Option<Outcome>,
    pub moves: usize,
    pub scores: Scores,
    pub millis: u128,
}

/// Aggregated results
#[derive(Clone, Debug, Default)]
pub struct SeriesResults {
    pub games: Vec<GameRecord>,
    pub blue_wins: usize,
    pub red_wins: usize,
    pub draws: usize,
    pub king_captures: usize,
    pub auto_defeats: usize,
    pub turn_limits: usize,
    pub avg_moves: f32,
}

// ============================================================================
// LEVEL 1 - ORCHESTRATION
// ============================================================================

pub fn run(args: SelfplayArgs) -> Result<()> {
    let mut settings = config::resolve(&args.common)?;
    settings.search.noise_scale = args.noise;

    tracing::info!(
        "Self-play: {} games, {:?}, noise {}",
        args.games,
        settings.ai,
        args.noise
    );

    let results = play_series(&settings, args.games, !args.json);
    report_results(&results, args.json);
    Ok(())
}

// ============================================================================
// LEVEL 2 - PHASES
// ============================================================================

pub fn play_series(settings: &Settings, games: usize, show_progress: bool) -> SeriesResults {
    let mut rng = ChaCha8Rng::seed_from_u64(settings.search.seed);
    let progress = if show_progress {
        progress_bar(games)
    } else {
        ProgressBar::hidden()
    };

    let mut records = Vec::with_capacity(games);
    for game_number in 1..=games {
        let record = play_single_game(settings, game_number, rng.gen());
        tracing::info!(
            "Game {}: {} ({} moves)",
            record.game_number,
            describe(record.outcome),
            record.moves
        );
        records.push(record);
        progress.inc(1);
    }
    progress.finish_and_clear();

    compute_statistics(records)
}

fn report_results(results: &SeriesResults, json: bool) {
    if json {
        print_json_results(results);
    } else {
        print_text_results(results);
    }
}

// ============================================================================
// LEVEL 3 - STEPS
// ============================================================================

/// One game between two independently seeded computers
pub fn play_single_game(settings: &Settings, game_number: usize, seed: u64) -> GameRecord {
    let start = Instant::now();
    let mut state = GameState::standard(&settings.game);
    let mut players = Color::ALL.map(|color| {
        let mut search = settings.search.clone();
        search.seed = seed.wrapping_add(color.index() as u64);
        Computer::new(search, settings.ai)
    });

    let mut moves = 0;
    while !state.is_over() {
        let Some(mv) = players[state.to_move().index()].choose(&state) else {
            break;
        };
        if let Err(e) = state.apply_move(mv) {
            tracing::warn!("Game {}: searcher chose an illegal move {}: {}", game_number, mv, e);
            break;
        }
        moves += 1;
    }

    GameRecord {
        game_number,
        outcome: state.outcome(),
        moves,
        scores: state.scores(),
        millis: start.elapsed().as_millis(),
    }
}

pub fn compute_statistics(games: Vec<GameRecord>) -> SeriesResults {
    let mut results = SeriesResults::default();
    for game in &games {
        match game.outcome.and_then(|o| o.winner()) {
            Some(Color::Blue) => results.blue_wins += 1,
            Some(Color::Red) => results.red_wins += 1,
            None => results.draws += 1,
        }
        match game.outcome.map(|o| o.reason()) {
            Some(EndReason::KingCaptured { .. }) => results.king_captures += 1,
            Some(EndReason::AutoDefeat { .. }) => results.auto_defeats += 1,
            Some(EndReason::TurnLimit { .. }) => results.turn_limits += 1,
            _ => {}
        }
    }

    let total_moves: usize = games.iter().map(|g| g.moves).sum();
    results.avg_moves = if games.is_empty() {
        0.0
    } else {
        total_moves as f32 / games.len() as f32
    };
    results.games = games;
    results
}

// ============================================================================
// LEVEL 4 - UTILITIES
// ============================================================================

fn progress_bar(len: usize) -> ProgressBar {
    let bar = ProgressBar::new(len as u64);
    let style = ProgressStyle::with_template("{bar:40} {pos}/{len} games [{elapsed_precise}]")
        .unwrap_or_else(|_| ProgressStyle::default_bar());
    bar.set_style(style);
    bar
}

fn describe(outcome: Option<Outcome>) -> String {
    match outcome {
        Some(outcome) => outcome.to_string(),
        None => "unfinished".to_string(),
    }
}

fn rate(count: usize, total: usize) -> f32 {
    if total > 0 {
        count as f32 / total as f32
    } else {
        0.0
    }
}

fn print_json_results(results: &SeriesResults) {
    #[derive(serde::Serialize)]
    struct JsonGame {
        game_number: usize,
        result: String,
        moves: usize,
        blue_score: u32,
        red_score: u32,
        millis: u128,
    }

    #[derive(serde::Serialize)]
    struct JsonOutput {
        total_games: usize,
        blue_wins: usize,
        red_wins: usize,
        draws: usize,
        king_captures: usize,
        auto_defeats: usize,
        turn_limits: usize,
        avg_moves: f32,
        blue_win_rate: f32,
        games: Vec<JsonGame>,
    }

    let total = results.games.len();
    let output = JsonOutput {
        total_games: total,
        blue_wins: results.blue_wins,
        red_wins: results.red_wins,
        draws: results.draws,
        king_captures: results.king_captures,
        auto_defeats: results.auto_defeats,
        turn_limits: results.turn_limits,
        avg_moves: results.avg_moves,
        blue_win_rate: rate(results.blue_wins, total),
        games: results
            .games
            .iter()
            .map(|g| JsonGame {
                game_number: g.game_number,
                result: describe(g.outcome),
                moves: g.moves,
                blue_score: g.scores.blue,
                red_score: g.scores.red,
                millis: g.millis,
            })
            .collect(),
    };

    if let Ok(json) = serde_json::to_string_pretty(&output) {
        println!("{}", json);
    }
}

fn print_text_results(results: &SeriesResults) {
    let total = results.games.len();

    println!("\n=== Self-play Results ===");
    println!("Total games: {}", total);
    println!(
        "Blue wins:   {} ({:.1}%)",
        results.blue_wins,
        rate(results.blue_wins, total) * 100.0
    );
    println!(
        "Red wins:    {} ({:.1}%)",
        results.red_wins,
        rate(results.red_wins, total) * 100.0
    );
    println!("Draws:       {}", results.draws);
    println!(
        "Endings:     {} king captures, {} auto-defeats, {} turn limits",
        results.king_captures, results.auto_defeats, results.turn_limits
    );
    println!("Avg moves:   {:.1}", results.avg_moves);
}
