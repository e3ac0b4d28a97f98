use wasm_bindgen::prelude::*;

pub mod ai;
pub mod category;
pub mod config;
pub mod dice;
pub mod error;
pub mod game;
pub mod history;
pub mod scorecard;
pub mod scoring;
pub mod sync;
pub mod types;
pub mod wasm;

pub use category::{Category, Section};
pub use config::RulesConfig;
pub use dice::{DiceSet, Die, DieColor};
pub use error::{ActionError, ProtocolError};
pub use game::{GameMode, GameSession, GameState, PlayerKind, Selection};
pub use scorecard::{LockOutcome, Scorecard, ScorecardEntry};

#[wasm_bindgen]
pub fn wasm_ready() -> bool {
    true
}
