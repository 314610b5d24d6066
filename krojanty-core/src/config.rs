//! Match and search configuration

use crate::error::ConfigError;
use anyhow::Context;
use crate::eval::Heuristics;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

/// Default turn limit
pub const DEFAULT_MAX_TURN: u16 = 64;

/// Match rules that vary between games
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchConfig {
    /// The game ends once the turn counter passes this value
    pub max_turn: u16,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            max_turn: DEFAULT_MAX_TURN,
        }
    }
}

impl MatchConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_turn == 0 {
            return Err(ConfigError::ZeroTurnLimit);
        }
        Ok(())
    }
}

/// Time/depth budget for the adaptive search
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl Difficulty {
    pub fn base_depth(self) -> u32 {
        match self {
            Difficulty::Easy => 1,
            Difficulty::Medium => 3,
            Difficulty::Hard => 5,
        }
    }

    pub fn time_budget(self) -> Duration {
        match self {
            Difficulty::Easy => Duration::from_millis(200),
            Difficulty::Medium => Duration::from_secs(1),
            Difficulty::Hard => Duration::from_secs(3),
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Difficulty::Easy => write!(f, "easy"),
            Difficulty::Medium => write!(f, "medium"),
            Difficulty::Hard => write!(f, "hard"),
        }
    }
}

impl FromStr for Difficulty {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "easy" => Ok(Difficulty::Easy),
            "medium" => Ok(Difficulty::Medium),
            "hard" => Ok(Difficulty::Hard),
            _ => Err(ConfigError::UnknownDifficulty(s.to_string())),
        }
    }
}

/// Searcher settings. Every optimization can be switched off without
/// changing which moves are legal or how positions are scored.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Plies for the depth-driven entry point
    pub depth: u32,
    pub difficulty: Difficulty,
    pub use_transposition: bool,
    pub use_killers: bool,
    pub use_history: bool,
    /// Entries kept before the transposition table is cleared
    pub table_capacity: usize,
    /// Candidate moves kept by the fast entry point
    pub fast_move_limit: usize,
    /// Amplitude of random evaluation noise, 0 disables it
    pub noise_scale: f32,
    pub seed: u64,
    pub heuristics: Heuristics,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            depth: 3,
            difficulty: Difficulty::Medium,
            use_transposition: true,
            use_killers: true,
            use_history: true,
            table_capacity: 1 << 18,
            fast_move_limit: 8,
            noise_scale: 0.0,
            seed: 42,
            heuristics: Heuristics::default(),
        }
    }
}

impl SearchConfig {
    /// Plain minimax with alpha-beta only
    pub fn without_caches() -> Self {
        Self {
            use_transposition: false,
            use_killers: false,
            use_history: false,
            ..Self::default()
        }
    }

    /// Load from a JSON file; missing fields take their defaults
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read search config: {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse search config: {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_difficulty_parse() {
        assert_eq!("easy".parse::<Difficulty>(), Ok(Difficulty::Easy));
        assert_eq!(" HARD ".parse::<Difficulty>(), Ok(Difficulty::Hard));
        assert_eq!(
            "insane".parse::<Difficulty>(),
            Err(ConfigError::UnknownDifficulty("insane".to_string()))
        );
    }

    #[test]
    fn test_difficulty_budgets_grow() {
        assert!(Difficulty::Easy.base_depth() < Difficulty::Medium.base_depth());
        assert!(Difficulty::Medium.time_budget() < Difficulty::Hard.time_budget());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: SearchConfig =
            serde_json::from_str(r#"{"depth": 5, "difficulty": "hard", "use_killers": false}"#).unwrap();
        assert_eq!(config.depth, 5);
        assert_eq!(config.difficulty, Difficulty::Hard);
        assert!(!config.use_killers);
        assert!(config.use_history);
        assert_eq!(config.fast_move_limit, 8);
    }

    #[test]
    fn test_load_from_file() {
        let path = std::env::temp_dir().join(format!("krojanty-search-{}.json", std::process::id()));
        std::fs::write(&path, r#"{"seed": 7, "noise_scale": 2.5}"#).unwrap();
        let config = SearchConfig::load(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(config.seed, 7);
        assert_eq!(config.noise_scale, 2.5);
        assert!(SearchConfig::load(&path).is_err());
    }

    #[test]
    fn test_load_errors_name_the_file() {
        let missing = std::env::temp_dir().join("krojanty-no-such-config.json");
        let err = SearchConfig::load(&missing).unwrap_err();
        assert!(err.to_string().starts_with("Failed to read search config"));
        assert!(err.to_string().contains("krojanty-no-such-config.json"));

        let path = std::env::temp_dir().join(format!("krojanty-bad-search-{}.json", std::process::id()));
        std::fs::write(&path, "{ not json").unwrap();
        let err = SearchConfig::load(&path).unwrap_err();
        std::fs::remove_file(&path).ok();
        assert!(err.to_string().starts_with("Failed to parse search config"));
    }

    #[test]
    fn test_match_config_validation() {
        assert!(MatchConfig::default().validate().is_ok());
        assert_eq!(MatchConfig { max_turn: 0 }.validate(), Err(ConfigError::ZeroTurnLimit));
    }
}
