//! Rule constants for a session, loadable from JSON.

use serde::{Deserialize, Serialize};

/// Tunable rules. `Default` gives the standard rainbow rules.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct RulesConfig {
    /// Rolls allowed per turn; every roll spends one.
    pub rolls_per_turn: u8,
    /// Locked upper-section total needed for the bonus.
    pub upper_bonus_threshold: u32,
    pub upper_bonus_value: u32,
    /// Added to a locked Yahtzee for every further Yahtzee scored on it.
    pub yahtzee_bonus_value: u32,
    /// Completed games kept by the history log.
    pub history_capacity: usize,
    /// Pause between computer-player decisions.
    pub computer_roll_delay_ms: u64,
    pub max_players: usize,
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            rolls_per_turn: 2,
            upper_bonus_threshold: 63,
            upper_bonus_value: 35,
            yahtzee_bonus_value: 100,
            history_capacity: 10,
            computer_roll_delay_ms: 1_000,
            max_players: 4,
        }
    }
}

impl RulesConfig {
    /// Parses a JSON document. Missing fields keep their defaults.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
