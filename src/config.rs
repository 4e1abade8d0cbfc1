use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ChessResult;

/// Engine and game settings, usually read from a TOML file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Plies searched by the minimax levels
    pub search_depth: u32,
    /// 1-2 random, 3-4 best of a few ordered moves, 5-6 minimax
    pub ai_level: u8,
    pub move_timeout_ms: u64,
    pub initial_time_minutes: u64,
    pub white_name: String,
    pub black_name: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            search_depth: 3,
            ai_level: 5,
            move_timeout_ms: 3000,
            initial_time_minutes: 10,
            white_name: "White".to_string(),
            black_name: "Black".to_string(),
        }
    }
}

impl EngineConfig {
    pub fn from_toml_str(text: &str) -> ChessResult<Self> {
        Ok(toml::from_str(text)?)
    }

    pub fn load(path: &Path) -> ChessResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    pub fn move_timeout(&self) -> Duration {
        Duration::from_millis(self.move_timeout_ms)
    }

    pub fn initial_time(&self) -> Duration {
        Duration::from_secs(self.initial_time_minutes * 60)
    }
}
