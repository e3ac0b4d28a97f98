use std::collections::VecDeque;

use serde::{Deserialize, Serialize};
use web_time::{SystemTime, UNIX_EPOCH};

use crate::game::GameMode;

pub const DEFAULT_CAPACITY: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerResult {
    /// 1-based seat number.
    pub player_number: usize,
    pub score: u32,
}

/// Record of one completed game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameSummary {
    /// Milliseconds since the Unix epoch.
    pub date: u64,
    pub mode: GameMode,
    pub players: Vec<PlayerResult>,
}

impl GameSummary {
    pub fn new(mode: GameMode, scores: &[u32]) -> Self {
        Self {
            date: now_ms(),
            mode,
            players: scores
                .iter()
                .enumerate()
                .map(|(idx, &score)| PlayerResult {
                    player_number: idx + 1,
                    score,
                })
                .collect(),
        }
    }
}

/// Storage for completed games. Implemented by the application shell.
pub trait HistoryStore {
    fn append(&mut self, summary: GameSummary);
}

/// In-memory history that keeps only the most recent games.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameHistory {
    capacity: usize,
    games: VecDeque<GameSummary>,
}

impl GameHistory {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            games: VecDeque::with_capacity(capacity),
        }
    }

    /// Oldest first.
    pub fn games(&self) -> impl DoubleEndedIterator<Item = &GameSummary> {
        self.games.iter()
    }

    /// Up to `n` games, most recent first.
    pub fn recent(&self, n: usize) -> Vec<&GameSummary> {
        self.games.iter().rev().take(n).collect()
    }

    pub fn len(&self) -> usize {
        self.games.len()
    }

    pub fn is_empty(&self) -> bool {
        self.games.is_empty()
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&self.games)
    }

    /// Restores from a JSON array, keeping the newest `capacity` entries.
    pub fn from_json(json: &str, capacity: usize) -> Result<Self, serde_json::Error> {
        let games: Vec<GameSummary> = serde_json::from_str(json)?;
        let mut history = Self::new(capacity);
        for game in games {
            history.append(game);
        }
        Ok(history)
    }
}

impl Default for GameHistory {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl HistoryStore for GameHistory {
    fn append(&mut self, summary: GameSummary) {
        if self.capacity == 0 {
            return;
        }
        while self.games.len() >= self.capacity {
            self.games.pop_front();
        }
        self.games.push_back(summary);
    }
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
