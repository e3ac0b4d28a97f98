use std::time::Duration;

use tracing::{debug, info};
use web_time::Instant;

use crate::ai::strategy::TurnStrategy;
use crate::error::ActionError;
use crate::game::{GameSession, GameState, PlayerKind, Selection};

/// Result of one `ComputerTurn::poll`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnStep {
    /// Nothing done; the next action is not due yet.
    Waiting,
    Rolled { rolls_left: u8 },
    Selected(Selection),
    Cancelled,
    Finished,
}

/// Drives one computer player's turn, one action per elapsed delay.
///
/// The caller owns the clock: `poll` is handed `now` and does nothing until
/// the pacing delay since the previous action has passed.
#[derive(Debug, Clone)]
pub struct ComputerTurn {
    player: usize,
    delay: Duration,
    next_at: Instant,
    cancelled: bool,
    done: bool,
}

impl ComputerTurn {
    /// Turn for the current player; the first action is due one delay after `now`.
    pub fn new(session: &GameSession, now: Instant) -> Self {
        let delay = Duration::from_millis(session.config().computer_roll_delay_ms);
        Self {
            player: session.current_player(),
            delay,
            next_at: now + delay,
            cancelled: false,
            done: false,
        }
    }

    /// A turn only when a computer player is up in a running game.
    pub fn for_current(session: &GameSession, now: Instant) -> Option<Self> {
        if session.state() != GameState::Playing {
            return None;
        }
        let player = session.current()?;
        (player.kind() == PlayerKind::Computer).then(|| Self::new(session, now))
    }

    pub fn player(&self) -> usize {
        self.player
    }

    /// Stops the turn; later polls return `Cancelled` and touch nothing.
    pub fn cancel(&mut self) {
        if !self.cancelled && !self.done {
            debug!(player = self.player, "computer turn cancelled");
        }
        self.cancelled = true;
    }

    pub fn is_finished(&self) -> bool {
        self.done || self.cancelled
    }

    pub fn poll(
        &mut self,
        session: &mut GameSession,
        strategy: &dyn TurnStrategy,
        now: Instant,
    ) -> Result<TurnStep, ActionError> {
        if self.cancelled {
            return Ok(TurnStep::Cancelled);
        }
        if self.done {
            return Ok(TurnStep::Finished);
        }
        if now < self.next_at {
            return Ok(TurnStep::Waiting);
        }
        if let Err(err) = session.check_turn(self.player) {
            self.done = true;
            return Err(err);
        }
        self.next_at = now + self.delay;

        if session.dice().is_blank() {
            let rolls_left = session.roll_dice()?;
            return Ok(TurnStep::Rolled { rolls_left });
        }

        let card = session
            .current()
            .map(|p| p.scorecard().clone())
            .ok_or(ActionError::GameNotInProgress)?;

        if let Some(holds) = strategy.choose_holds(session.dice(), session.rolls_left(), &card) {
            let current: Vec<bool> = session.dice().dice().iter().map(|d| d.held).collect();
            for (index, (&want, &is)) in holds.iter().zip(current.iter()).enumerate() {
                if want != is {
                    session.toggle_hold(index)?;
                }
            }
            let rolls_left = session.roll_dice()?;
            return Ok(TurnStep::Rolled { rolls_left });
        }

        let category = strategy
            .choose_category(session.dice(), &card)
            .ok_or(ActionError::GameFinished)?;
        let selection = session.select_category(category)?;
        self.done = true;
        info!(player = self.player, %category, "computer scored");
        Ok(TurnStep::Selected(selection))
    }

    /// Polls until the turn completes, ignoring pacing. For headless play.
    pub fn run_to_end(
        &mut self,
        session: &mut GameSession,
        strategy: &dyn TurnStrategy,
    ) -> Result<Option<Selection>, ActionError> {
        loop {
            let now = self.next_at;
            match self.poll(session, strategy, now)? {
                TurnStep::Selected(selection) => return Ok(Some(selection)),
                TurnStep::Cancelled | TurnStep::Finished => return Ok(None),
                TurnStep::Waiting | TurnStep::Rolled { .. } => {}
            }
        }
    }
}
