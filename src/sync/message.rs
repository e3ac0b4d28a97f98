use serde::{Deserialize, Serialize};

use crate::category::Category;
use crate::config::RulesConfig;
use crate::dice::{DICE_COUNT, Die, FACES};
use crate::error::ProtocolError;
use crate::game::{GameMode, GameState};
use crate::scorecard::ScorecardEntry;

/// Upper bound for any single score carried by a snapshot. Keeps every sum
/// over a scorecard far below `u32::MAX`.
pub const MAX_SNAPSHOT_SCORE: u32 = 1_000_000;

/// Complete authoritative session state sent from host to guest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub state: GameState,
    pub mode: GameMode,
    pub player_count: usize,
    pub current_player: usize,
    pub rolls_left: u8,
    pub dice: Vec<Die>,
    /// Grand total per seat.
    pub totals: Vec<u32>,
    /// Every selectable line of the current player's scorecard.
    pub scorecard: Vec<(Category, ScorecardEntry)>,
    /// Bonus Yahtzees per seat.
    #[serde(default)]
    pub bonus_yahtzees: Vec<u32>,
}

impl Snapshot {
    /// Checks that the snapshot describes a session this side can hold.
    pub fn validate(&self, config: &RulesConfig) -> Result<(), ProtocolError> {
        let invalid = |reason: String| Err(ProtocolError::InvalidSnapshot(reason));

        if self.player_count > config.max_players {
            return invalid(format!(
                "{} players, at most {} allowed",
                self.player_count, config.max_players
            ));
        }
        if self.state != GameState::MainMenu && self.player_count == 0 {
            return invalid(format!("{:?} with no players", self.state));
        }
        if self.player_count > 0 && self.current_player >= self.player_count {
            return invalid(format!(
                "current player {} of {}",
                self.current_player, self.player_count
            ));
        }
        if self.rolls_left > config.rolls_per_turn {
            return invalid(format!("{} rolls left", self.rolls_left));
        }
        if self.dice.len() != DICE_COUNT {
            return invalid(format!("{} dice, expected {DICE_COUNT}", self.dice.len()));
        }
        if let Some(die) = self.dice.iter().find(|d| d.value > FACES) {
            return invalid(format!("die face {}", die.value));
        }
        if self.totals.len() > self.player_count || self.bonus_yahtzees.len() > self.player_count {
            return invalid("more per-seat values than players".to_string());
        }
        if self.scorecard.len() > Category::COUNT {
            return invalid(format!("{} scorecard lines", self.scorecard.len()));
        }
        let values = self
            .totals
            .iter()
            .chain(self.bonus_yahtzees.iter())
            .copied()
            .chain(self.scorecard.iter().filter_map(|(_, entry)| entry.value));
        for value in values {
            if value > MAX_SNAPSHOT_SCORE {
                return invalid(format!("score {value} out of range"));
            }
        }
        Ok(())
    }
}

/// Messages exchanged between host and guest.
///
/// Requests flow guest -> host only; snapshots and notices flow host -> guest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Message {
    /// Protocol version announcement, sent by both sides on connect.
    Hello { version: u32 },
    GameStarted { player_count: usize, mode: GameMode },
    GameState { snapshot: Snapshot },
    RollDiceRequest,
    HoldDiceRequest { index: usize },
    /// Category by view key, so unknown keys reach the host and get rejected there.
    SelectCategoryRequest { category: String },
    BonusYahtzeeNotice { score: u32 },
    GameOverNotice,
    ResyncRequest,
    Emoji { emoji: String },
    ChatMessage { text: String },
}

impl Message {
    pub fn is_request(&self) -> bool {
        matches!(
            self,
            Message::RollDiceRequest
                | Message::HoldDiceRequest { .. }
                | Message::SelectCategoryRequest { .. }
        )
    }
}
