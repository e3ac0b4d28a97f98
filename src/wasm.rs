//! Browser-facing handle around `GameSession`.

use std::cell::RefCell;
use std::rc::Rc;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::warn;
use wasm_bindgen::prelude::*;
use web_time::{Instant, SystemTime, UNIX_EPOCH};

use crate::ai::{ComputerTurn, GreedyStrategy, TurnStep};
use crate::category::Category;
use crate::config::RulesConfig;
use crate::game::{GameMode, GameSession, GameState, PlayerKind};
use crate::history::{GameHistory, GameSummary, HistoryStore};
use crate::scoring;

/// Lets the shell read the log the session appends to.
struct SharedHistory(Rc<RefCell<GameHistory>>);

impl HistoryStore for SharedHistory {
    fn append(&mut self, summary: GameSummary) {
        self.0.borrow_mut().append(summary);
    }
}

fn to_js(err: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&err.to_string())
}

fn state_name(state: GameState) -> &'static str {
    match state {
        GameState::MainMenu => "mainMenu",
        GameState::Playing => "playing",
        GameState::GameOver => "gameOver",
    }
}

fn clock_seed() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or_default()
}

#[wasm_bindgen]
pub struct YahtzeeGame {
    session: GameSession,
    history: Rc<RefCell<GameHistory>>,
    computer: Option<ComputerTurn>,
}

#[wasm_bindgen]
impl YahtzeeGame {
    #[wasm_bindgen(constructor)]
    pub fn new() -> YahtzeeGame {
        Self::with_rules(RulesConfig::default(), clock_seed())
    }

    /// Handle configured from a JSON `RulesConfig`, with a fixed dice seed.
    #[wasm_bindgen(js_name = withRules)]
    pub fn with_rules_json(json: &str, seed: u64) -> Result<YahtzeeGame, JsValue> {
        let config = RulesConfig::from_json(json).map_err(to_js)?;
        Ok(Self::with_rules(config, seed))
    }

    #[wasm_bindgen(js_name = startNewGame)]
    pub fn start_new_game(&mut self, player_count: usize) -> Result<(), JsValue> {
        self.computer = None;
        self.session.start_new_game(player_count).map_err(to_js)
    }

    /// One human against `computers` computer players.
    #[wasm_bindgen(js_name = startVsComputer)]
    pub fn start_vs_computer(&mut self, computers: usize) -> Result<(), JsValue> {
        let mut kinds = vec![PlayerKind::Human];
        kinds.extend(std::iter::repeat_n(PlayerKind::Computer, computers));
        self.computer = None;
        self.session
            .start_new_game_with(&kinds, GameMode::SinglePlayer)
            .map_err(to_js)
    }

    #[wasm_bindgen(js_name = returnToMenu)]
    pub fn return_to_menu(&mut self) {
        if let Some(turn) = self.computer.as_mut() {
            turn.cancel();
        }
        self.computer = None;
        self.session.return_to_menu();
    }

    /// Returns the rolls left after this roll.
    #[wasm_bindgen(js_name = rollDice)]
    pub fn roll_dice(&mut self) -> Result<u8, JsValue> {
        self.ensure_human_turn()?;
        self.session.roll_dice().map_err(to_js)
    }

    #[wasm_bindgen(js_name = toggleHold)]
    pub fn toggle_hold(&mut self, index: usize) -> Result<bool, JsValue> {
        self.ensure_human_turn()?;
        self.session.toggle_hold(index).map_err(to_js)
    }

    /// Locks the category named by its view key. Returns `true` on game over.
    #[wasm_bindgen(js_name = selectCategory)]
    pub fn select_category(&mut self, key: &str) -> Result<bool, JsValue> {
        self.ensure_human_turn()?;
        let selection = self.session.select_category_key(key).map_err(to_js)?;
        Ok(selection.game_over)
    }

    /// Preview for the current player; unknown keys preview as 0.
    #[wasm_bindgen(js_name = previewScore)]
    pub fn preview_score(&self, key: &str) -> u32 {
        match Category::from_key(key) {
            Some(category) => self.session.preview_score(category),
            None => scoring::score_key(key, self.session.dice()),
        }
    }

    /// Advances a pending computer turn. Call from an animation frame or timer.
    /// Returns `true` when something changed.
    pub fn tick(&mut self) -> Result<bool, JsValue> {
        let now = Instant::now();
        if self.computer.as_ref().is_none_or(ComputerTurn::is_finished) {
            self.computer = ComputerTurn::for_current(&self.session, now);
        }
        let Some(turn) = self.computer.as_mut() else {
            return Ok(false);
        };
        match turn.poll(&mut self.session, &GreedyStrategy, now) {
            Ok(TurnStep::Waiting | TurnStep::Cancelled | TurnStep::Finished) => Ok(false),
            Ok(TurnStep::Rolled { .. }) => Ok(true),
            Ok(TurnStep::Selected(_)) => {
                self.computer = None;
                Ok(true)
            }
            Err(err) => {
                warn!(error = %err, "computer turn aborted");
                self.computer = None;
                Err(to_js(err))
            }
        }
    }

    /// Full render model as a plain JS object.
    pub fn view(&self) -> Result<JsValue, JsValue> {
        serde_wasm_bindgen::to_value(&self.session.view()).map_err(to_js)
    }

    /// Completed games as a JSON array, oldest first.
    #[wasm_bindgen(js_name = historyJson)]
    pub fn history_json(&self) -> Result<String, JsValue> {
        self.history.borrow().to_json().map_err(to_js)
    }

    /// Restores the history log saved by the shell.
    #[wasm_bindgen(js_name = loadHistory)]
    pub fn load_history(&mut self, json: &str) -> Result<(), JsValue> {
        let capacity = self.session.config().history_capacity;
        let restored = GameHistory::from_json(json, capacity).map_err(to_js)?;
        *self.history.borrow_mut() = restored;
        Ok(())
    }

    /// Calls `callback(newState, oldState)` on every phase change.
    #[wasm_bindgen(js_name = onStateChange)]
    pub fn on_state_change(&mut self, callback: js_sys::Function) {
        self.session
            .on_state_change(Box::new(move |new_state, old_state| {
                let result = callback.call2(
                    &JsValue::NULL,
                    &JsValue::from_str(state_name(new_state)),
                    &JsValue::from_str(state_name(old_state)),
                );
                if let Err(err) = result {
                    warn!(?err, "state listener threw");
                }
            }));
    }
}

impl YahtzeeGame {
    fn with_rules(config: RulesConfig, seed: u64) -> Self {
        let capacity = config.history_capacity;
        let rng = Box::new(ChaCha8Rng::seed_from_u64(seed));
        let mut session = GameSession::with_config(config, rng);
        let history = Rc::new(RefCell::new(GameHistory::new(capacity)));
        session.attach_history(Box::new(SharedHistory(history.clone())));
        Self {
            session,
            history,
            computer: None,
        }
    }

    fn ensure_human_turn(&self) -> Result<(), JsValue> {
        match self.session.current() {
            Some(player) if player.kind() == PlayerKind::Computer => {
                Err(JsValue::from_str("computer player's turn"))
            }
            _ => Ok(()),
        }
    }
}

impl Default for YahtzeeGame {
    fn default() -> Self {
        Self::new()
    }
}
