use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};

use crate::error::ActionError;

pub const DICE_COUNT: usize = 5;
pub const FACES: u8 = 6;
const ROLL_COLORS: [DieColor; 3] = [DieColor::Red, DieColor::Green, DieColor::Blue];

/// Die colour. `Blank` is only carried by unrolled dice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DieColor {
    Red,
    Green,
    Blue,
    #[default]
    Blank,
}

/// A single die. `value == 0` means the die has not been rolled this turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Die {
    pub value: u8,
    pub color: DieColor,
    pub held: bool,
    /// Animation hint for the view layer; set on dice changed by the last roll.
    #[serde(default)]
    pub is_rolling: bool,
}

impl Die {
    pub const fn blank() -> Self {
        Self {
            value: 0,
            color: DieColor::Blank,
            held: false,
            is_rolling: false,
        }
    }

    pub const fn new(value: u8, color: DieColor) -> Self {
        Self {
            value,
            color,
            held: false,
            is_rolling: false,
        }
    }

    pub fn is_blank(&self) -> bool {
        self.value == 0
    }
}

/// The fixed-length set of dice shared by every player of a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiceSet {
    dice: Vec<Die>,
}

impl DiceSet {
    /// Creates a set of `DICE_COUNT` blank dice.
    pub fn new() -> Self {
        Self::with_len(DICE_COUNT)
    }

    pub fn with_len(len: usize) -> Self {
        Self {
            dice: vec![Die::blank(); len],
        }
    }

    /// Builds a set from explicit dice. Mostly useful for tests and snapshots.
    pub fn from_dice(dice: &[Die]) -> Self {
        Self {
            dice: dice.to_vec(),
        }
    }

    /// Builds an unheld set from `(value, color)` pairs.
    pub fn from_faces(faces: &[(u8, DieColor)]) -> Self {
        Self {
            dice: faces
                .iter()
                .map(|&(value, color)| Die::new(value, color))
                .collect(),
        }
    }

    /// Replaces every die with a blank, unheld die. The length is kept.
    pub fn reset(&mut self) {
        let len = self.dice.len();
        self.dice.clear();
        self.dice.resize(len, Die::blank());
    }

    /// Rolls every unheld die: a uniform face in `1..=6` and a uniform colour
    /// out of red, green and blue. Held dice are left untouched.
    pub fn roll_all(&mut self, rng: &mut dyn RngCore) {
        for die in self.dice.iter_mut() {
            if die.held {
                die.is_rolling = false;
                continue;
            }
            die.value = rng.gen_range(1..=FACES);
            die.color = ROLL_COLORS[rng.gen_range(0..ROLL_COLORS.len())];
            die.is_rolling = true;
        }
    }

    /// Flips the held flag of the die at `index` and returns the new flag.
    pub fn toggle_hold(&mut self, index: usize) -> Result<bool, ActionError> {
        let len = self.dice.len();
        let die = self
            .dice
            .get_mut(index)
            .ok_or(ActionError::DieOutOfRange { index, len })?;
        die.held = !die.held;
        Ok(die.held)
    }

    /// Replaces the set wholesale with a host-provided snapshot.
    pub fn set_dice(&mut self, dice: &[Die]) {
        self.dice = dice.to_vec();
    }

    pub fn dice(&self) -> &[Die] {
        &self.dice
    }

    pub fn len(&self) -> usize {
        self.dice.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dice.is_empty()
    }

    /// `true` while no die has been rolled since the last reset.
    pub fn is_blank(&self) -> bool {
        self.dice.iter().all(Die::is_blank)
    }

    pub fn values(&self) -> impl Iterator<Item = u8> + '_ {
        self.dice.iter().map(|die| die.value)
    }

    pub fn sum(&self) -> u32 {
        self.values().map(u32::from).sum()
    }

    /// Occurrences per face, indexed by face value (index 0 counts blanks).
    pub fn face_counts(&self) -> [u8; FACES as usize + 1] {
        let mut counts = [0u8; FACES as usize + 1];
        for value in self.values() {
            if let Some(slot) = counts.get_mut(value as usize) {
                *slot += 1;
            }
        }
        counts
    }

    /// Occurrences per colour in `[red, green, blue, blank]` order.
    pub fn color_counts(&self) -> [u8; 4] {
        let mut counts = [0u8; 4];
        for die in &self.dice {
            let slot = match die.color {
                DieColor::Red => 0,
                DieColor::Green => 1,
                DieColor::Blue => 2,
                DieColor::Blank => 3,
            };
            counts[slot] += 1;
        }
        counts
    }
}

impl Default for DiceSet {
    fn default() -> Self {
        Self::new()
    }
}
