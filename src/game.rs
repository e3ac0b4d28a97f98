use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::category::{Category, Section};
use crate::config::RulesConfig;
use crate::dice::{DiceSet, Die};
use crate::error::{ActionError, ProtocolError};
use crate::history::{GameSummary, HistoryStore};
use crate::scorecard::{LockOutcome, Scorecard};
use crate::scoring;
use crate::sync::Snapshot;
use crate::types::{GameView, PlayerView, ScoreRowView};

/// Session phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum GameState {
    #[default]
    MainMenu,
    Playing,
    GameOver,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum GameMode {
    #[default]
    SinglePlayer,
    LocalMultiPlayer,
    OnlineMultiPlayer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PlayerKind {
    #[default]
    Human,
    Computer,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Player {
    kind: PlayerKind,
    scorecard: Scorecard,
    rolls_left: u8,
    /// Total as last reported by the host; set only on guests.
    reported_total: Option<u32>,
}

impl Player {
    fn new(kind: PlayerKind, config: &RulesConfig) -> Self {
        Self {
            kind,
            scorecard: Scorecard::with_rules(config),
            rolls_left: config.rolls_per_turn,
            reported_total: None,
        }
    }

    pub fn kind(&self) -> PlayerKind {
        self.kind
    }

    pub fn scorecard(&self) -> &Scorecard {
        &self.scorecard
    }

    pub fn rolls_left(&self) -> u8 {
        self.rolls_left
    }

    pub fn total_score(&self) -> u32 {
        self.reported_total
            .unwrap_or_else(|| self.scorecard.total_score())
    }

    pub fn is_complete(&self) -> bool {
        self.scorecard.is_complete()
    }
}

/// Outcome of a successful category selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection {
    pub player: usize,
    pub category: Category,
    pub outcome: LockOutcome,
    /// `true` when this selection finished the whole session.
    pub game_over: bool,
}

/// Listener invoked with `(new_state, old_state)`.
pub type StateListener = Box<dyn FnMut(GameState, GameState)>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(usize);

/// Root aggregate: players, dice, turn order and phase.
pub struct GameSession {
    config: RulesConfig,
    players: Vec<Player>,
    current_player: usize,
    dice: DiceSet,
    state: GameState,
    mode: GameMode,
    rng: Box<dyn RngCore>,
    listeners: Vec<(SubscriptionId, StateListener)>,
    next_listener_id: usize,
    history: Option<Box<dyn HistoryStore>>,
    summary: Option<GameSummary>,
}

impl GameSession {
    pub fn new(rng: Box<dyn RngCore>) -> Self {
        Self::with_config(RulesConfig::default(), rng)
    }

    pub fn with_config(config: RulesConfig, rng: Box<dyn RngCore>) -> Self {
        Self {
            config,
            players: Vec::new(),
            current_player: 0,
            dice: DiceSet::new(),
            state: GameState::MainMenu,
            mode: GameMode::SinglePlayer,
            rng,
            listeners: Vec::new(),
            next_listener_id: 0,
            history: None,
            summary: None,
        }
    }

    /// Session with a reproducible dice stream.
    pub fn seeded(seed: u64) -> Self {
        Self::new(Box::new(ChaCha8Rng::seed_from_u64(seed)))
    }

    /// Attaches the store that receives one summary per finished game.
    pub fn attach_history(&mut self, store: Box<dyn HistoryStore>) {
        self.history = Some(store);
    }

    pub fn on_state_change(&mut self, listener: StateListener) -> SubscriptionId {
        let id = SubscriptionId(self.next_listener_id);
        self.next_listener_id += 1;
        self.listeners.push((id, listener));
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(listener_id, _)| *listener_id != id);
        self.listeners.len() != before
    }

    /// Starts a game of `player_count` human players.
    pub fn start_new_game(&mut self, player_count: usize) -> Result<(), ActionError> {
        let mode = if player_count == 1 {
            GameMode::SinglePlayer
        } else {
            GameMode::LocalMultiPlayer
        };
        self.start_new_game_with(&vec![PlayerKind::Human; player_count], mode)
    }

    /// Starts a game with one fresh player per entry of `kinds`.
    /// Legal from the main menu and as a restart while playing.
    pub fn start_new_game_with(
        &mut self,
        kinds: &[PlayerKind],
        mode: GameMode,
    ) -> Result<(), ActionError> {
        if self.state == GameState::GameOver {
            return Err(ActionError::GameFinished);
        }
        let max = self.config.max_players;
        if kinds.is_empty() || kinds.len() > max {
            return Err(ActionError::InvalidPlayerCount {
                count: kinds.len(),
                max,
            });
        }

        self.players = kinds
            .iter()
            .map(|&kind| Player::new(kind, &self.config))
            .collect();
        self.current_player = 0;
        self.mode = mode;
        self.summary = None;
        self.dice.reset();
        info!(players = kinds.len(), ?mode, "new game started");
        self.set_state(GameState::Playing);
        Ok(())
    }

    /// Leaves a running or finished game for the main menu.
    pub fn return_to_menu(&mut self) {
        self.players.clear();
        self.current_player = 0;
        self.summary = None;
        self.dice.reset();
        self.set_state(GameState::MainMenu);
    }

    /// Rolls the unheld dice for the current player, spending one roll.
    /// Returns the rolls left afterwards.
    pub fn roll_dice(&mut self) -> Result<u8, ActionError> {
        self.ensure_playing()?;
        let player = self
            .players
            .get_mut(self.current_player)
            .ok_or(ActionError::GameNotInProgress)?;
        if player.rolls_left == 0 {
            return Err(ActionError::NoRollsLeft);
        }
        player.rolls_left -= 1;
        let rolls_left = player.rolls_left;

        self.dice.roll_all(self.rng.as_mut());
        self.refresh_previews();
        debug!(
            player = self.current_player,
            rolls_left,
            dice = ?self.dice.values().collect::<Vec<_>>(),
            "dice rolled"
        );
        Ok(rolls_left)
    }

    /// Toggles the held flag of one die. Returns the new flag.
    pub fn toggle_hold(&mut self, index: usize) -> Result<bool, ActionError> {
        self.ensure_playing()?;
        if index >= self.dice.len() {
            return Err(ActionError::DieOutOfRange {
                index,
                len: self.dice.len(),
            });
        }
        if self.dice.is_blank() {
            return Err(ActionError::NotRolled);
        }
        let held = self.dice.toggle_hold(index)?;
        debug!(index, held, "die hold toggled");
        Ok(held)
    }

    /// Scores the current dice into `category` for the current player, then
    /// passes the turn or ends the session.
    pub fn select_category(&mut self, category: Category) -> Result<Selection, ActionError> {
        self.ensure_playing()?;
        if !category.is_selectable() {
            return Err(ActionError::NotSelectable(category));
        }
        if self.dice.is_blank() {
            return Err(ActionError::NotRolled);
        }

        let player = self.current_player;
        let score = scoring::score(category, &self.dice);
        let outcome = self
            .players
            .get_mut(player)
            .ok_or(ActionError::GameNotInProgress)?
            .scorecard
            .lock_category(category, score)?;
        match outcome {
            LockOutcome::Locked { score } => {
                info!(player, %category, score, "category locked");
            }
            LockOutcome::BonusYahtzee { bonus, total } => {
                info!(player, bonus, total, "bonus yahtzee");
            }
        }

        let game_over = self.players.iter().all(Player::is_complete);
        if game_over {
            self.end_game();
        } else {
            self.advance_turn();
        }

        Ok(Selection {
            player,
            category,
            outcome,
            game_over,
        })
    }

    /// `select_category` for a category given by its view key.
    pub fn select_category_key(&mut self, key: &str) -> Result<Selection, ActionError> {
        let category =
            Category::from_key(key).ok_or_else(|| ActionError::UnknownCategory(key.to_string()))?;
        self.select_category(category)
    }

    /// Preview for the current player; see `Scorecard::preview_score`.
    pub fn preview_score(&self, category: Category) -> u32 {
        match self.players.get(self.current_player) {
            Some(player) => player.scorecard.preview_score(category, &self.dice),
            None => scoring::score(category, &self.dice),
        }
    }

    /// Rejects actions from anyone but the current player.
    pub fn check_turn(&self, player: usize) -> Result<(), ActionError> {
        self.ensure_playing()?;
        if player != self.current_player {
            return Err(ActionError::OutOfTurn { player });
        }
        Ok(())
    }

    pub fn state(&self) -> GameState {
        self.state
    }

    pub fn mode(&self) -> GameMode {
        self.mode
    }

    pub fn config(&self) -> &RulesConfig {
        &self.config
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn player(&self, idx: usize) -> Option<&Player> {
        self.players.get(idx)
    }

    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    pub fn current_player(&self) -> usize {
        self.current_player
    }

    pub fn current(&self) -> Option<&Player> {
        self.players.get(self.current_player)
    }

    pub fn dice(&self) -> &DiceSet {
        &self.dice
    }

    pub fn rolls_left(&self) -> u8 {
        self.current()
            .map_or(self.config.rolls_per_turn, Player::rolls_left)
    }

    /// `true` when the current player may roll right now.
    pub fn can_roll(&self) -> bool {
        self.state == GameState::Playing && !self.players.is_empty() && self.rolls_left() > 0
    }

    pub fn player_score(&self, idx: usize) -> u32 {
        self.players.get(idx).map_or(0, Player::total_score)
    }

    pub fn is_game_over(&self) -> bool {
        self.state == GameState::GameOver
    }

    /// Highest total, ties to the lowest seat. `None` before a game starts.
    pub fn winner(&self) -> Option<(usize, u32)> {
        self.players
            .iter()
            .enumerate()
            .map(|(idx, player)| (idx, player.total_score()))
            .fold(None, |best, (idx, score)| match best {
                Some((_, best_score)) if best_score >= score => best,
                _ => Some((idx, score)),
            })
    }

    /// Summary of the finished game, once the session is over.
    pub fn summary(&self) -> Option<&GameSummary> {
        self.summary.as_ref()
    }

    /// Read-only render model for the view layer.
    pub fn view(&self) -> GameView {
        GameView {
            state: self.state,
            mode: self.mode,
            current_player: self.current_player,
            rolls_left: self.rolls_left(),
            can_roll: self.can_roll(),
            dice: self.dice.dice().to_vec(),
            players: self
                .players
                .iter()
                .enumerate()
                .map(|(idx, player)| player_view(idx, player))
                .collect(),
            winner: self
                .is_game_over()
                .then(|| self.winner())
                .flatten()
                .map(|(idx, _)| idx),
        }
    }

    /// Full authoritative state for a guest.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            state: self.state,
            mode: self.mode,
            player_count: self.players.len(),
            current_player: self.current_player,
            rolls_left: self.rolls_left(),
            dice: self.dice.dice().to_vec(),
            totals: self.players.iter().map(Player::total_score).collect(),
            scorecard: self
                .current()
                .map(|p| p.scorecard.entries().collect())
                .unwrap_or_default(),
            bonus_yahtzees: self
                .players
                .iter()
                .map(|p| p.scorecard.bonus_yahtzees())
                .collect(),
        }
    }

    /// Replaces local state with the host's snapshot. Never merges.
    /// A snapshot that fails validation leaves the session untouched.
    pub fn apply_snapshot(&mut self, snapshot: &Snapshot) -> Result<(), ProtocolError> {
        snapshot.validate(&self.config)?;
        if self.players.len() != snapshot.player_count {
            self.players = (0..snapshot.player_count)
                .map(|_| Player::new(PlayerKind::Human, &self.config))
                .collect();
        }
        self.mode = snapshot.mode;
        self.dice.set_dice(&snapshot.dice);
        self.current_player = snapshot
            .current_player
            .min(self.players.len().saturating_sub(1));

        for (idx, player) in self.players.iter_mut().enumerate() {
            player.reported_total = snapshot.totals.get(idx).copied();
            player
                .scorecard
                .set_bonus_yahtzees(snapshot.bonus_yahtzees.get(idx).copied().unwrap_or(0));
        }
        if let Some(player) = self.players.get_mut(self.current_player) {
            player.rolls_left = snapshot.rolls_left;
            player.scorecard.overwrite(&snapshot.scorecard);
        }

        match snapshot.state {
            GameState::GameOver => self.end_game(),
            state => {
                if state == GameState::Playing {
                    self.summary = None;
                }
                self.set_state(state)
            }
        }
        Ok(())
    }

    /// Replaces the dice wholesale.
    pub fn set_dice(&mut self, dice: &[Die]) {
        self.dice.set_dice(dice);
        self.refresh_previews();
    }

    fn ensure_playing(&self) -> Result<(), ActionError> {
        match self.state {
            GameState::Playing => Ok(()),
            GameState::GameOver => Err(ActionError::GameFinished),
            GameState::MainMenu => Err(ActionError::GameNotInProgress),
        }
    }

    fn advance_turn(&mut self) {
        let count = self.players.len();
        let mut next = self.current_player;
        for _ in 0..count {
            next = (next + 1) % count;
            if !self.players[next].is_complete() {
                break;
            }
        }
        self.current_player = next;
        self.players[next].rolls_left = self.config.rolls_per_turn;
        self.dice.reset();
        self.refresh_previews();
        debug!(player = next, "turn passed");
    }

    fn end_game(&mut self) {
        if self.summary.is_none() {
            let scores: Vec<u32> = self.players.iter().map(Player::total_score).collect();
            let summary = GameSummary::new(self.mode, &scores);
            info!(?scores, "game over");
            if let Some(store) = self.history.as_mut() {
                store.append(summary.clone());
            }
            self.summary = Some(summary);
        }
        self.set_state(GameState::GameOver);
    }

    fn refresh_previews(&mut self) {
        for player in self.players.iter_mut() {
            player.scorecard.refresh_previews(&self.dice);
        }
    }

    fn set_state(&mut self, new_state: GameState) {
        let old_state = self.state;
        if old_state == new_state {
            return;
        }
        self.state = new_state;
        debug!(?old_state, ?new_state, "state changed");
        for (_, listener) in self.listeners.iter_mut() {
            listener(new_state, old_state);
        }
    }

    #[cfg(test)]
    fn set_dice_for_test(&mut self, faces: &[(u8, crate::dice::DieColor)]) {
        self.dice = DiceSet::from_faces(faces);
        self.refresh_previews();
    }
}

fn player_view(idx: usize, player: &Player) -> PlayerView {
    let card = &player.scorecard;
    let mut rows: Vec<ScoreRowView> = card
        .entries()
        .map(|(category, entry)| ScoreRowView {
            key: category.key(),
            category,
            section: category.section(),
            value: entry.value,
            selected: entry.selected,
        })
        .collect();
    rows.push(ScoreRowView {
        key: Category::UpperBonus.key(),
        category: Category::UpperBonus,
        section: Section::Bonus,
        value: Some(card.upper_bonus()),
        selected: card.is_upper_bonus_earned(),
    });

    PlayerView {
        player_number: idx + 1,
        kind: player.kind,
        total: player.total_score(),
        upper_total: card.upper_total(),
        upper_bonus: card.upper_bonus(),
        lower_total: card.lower_total(),
        remaining: card.remaining_category_count(),
        rows,
    }
}
