use serde::Serialize;

use crate::category::{Category, Section};
use crate::dice::Die;
use crate::game::{GameMode, GameState, PlayerKind};

/// One scorecard row as rendered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreRowView {
    pub key: &'static str,
    pub category: Category,
    pub section: Section,
    /// Contract:
    /// - Selected row: the locked score.
    /// - Open row: the preview for the current dice, `None` before the first roll.
    /// - Bonus row: the derived bonus, `selected` once it is earned.
    pub value: Option<u32>,
    pub selected: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerView {
    pub player_number: usize,
    pub kind: PlayerKind,
    pub total: u32,
    pub upper_total: u32,
    pub upper_bonus: u32,
    pub lower_total: u32,
    pub remaining: usize,
    pub rows: Vec<ScoreRowView>,
}

/// Public game state returned from WASM APIs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GameView {
    pub state: GameState,
    pub mode: GameMode,
    pub current_player: usize,
    pub rolls_left: u8,
    pub can_roll: bool,
    pub dice: Vec<Die>,
    pub players: Vec<PlayerView>,
    /// Winning seat once the game is over.
    pub winner: Option<usize>,
}
