//! Category rules. Every rule is a pure function of the dice; locking and
//! eligibility live in the scorecard.

use crate::category::Category;
use crate::dice::{DiceSet, DieColor};

pub const FULL_HOUSE_SCORE: u32 = 25;
pub const SMALL_STRAIGHT_SCORE: u32 = 30;
pub const LARGE_STRAIGHT_SCORE: u32 = 40;
pub const YAHTZEE_SCORE: u32 = 50;
pub const COLOR_SCORE: u32 = 35;
pub const COLOR_FULL_HOUSE_SCORE: u32 = 15;

const SMALL_STRAIGHTS: [[u8; 4]; 3] = [[1, 2, 3, 4], [2, 3, 4, 5], [3, 4, 5, 6]];
const LARGE_STRAIGHTS: [[u8; 5]; 2] = [[1, 2, 3, 4, 5], [2, 3, 4, 5, 6]];

/// Scores `dice` for `category`. The derived upper bonus always scores 0.
pub fn score(category: Category, dice: &DiceSet) -> u32 {
    match category {
        Category::Ones
        | Category::Twos
        | Category::Threes
        | Category::Fours
        | Category::Fives
        | Category::Sixes => category.face().map_or(0, |face| upper(face, dice)),
        Category::ThreeOfAKind => of_a_kind(3, dice),
        Category::FourOfAKind => of_a_kind(4, dice),
        Category::FullHouse => full_house(dice),
        Category::SmallStraight => small_straight(dice),
        Category::LargeStraight => large_straight(dice),
        Category::Yahtzee => yahtzee(dice),
        Category::Chance => chance(dice),
        Category::Reds => color(DieColor::Red, dice),
        Category::Greens => color(DieColor::Green, dice),
        Category::Blues => color(DieColor::Blue, dice),
        Category::ColorFullHouse => color_full_house(dice),
        Category::UpperBonus => 0,
    }
}

/// Scores a category given by its key. Unknown keys score 0.
pub fn score_key(key: &str, dice: &DiceSet) -> u32 {
    Category::from_key(key).map_or(0, |category| score(category, dice))
}

/// Count of dice showing `face`, times `face`.
pub fn upper(face: u8, dice: &DiceSet) -> u32 {
    let count = dice.values().filter(|&v| v == face).count() as u32;
    count * u32::from(face)
}

/// Sum of all dice when some rolled face appears at least `n` times.
pub fn of_a_kind(n: u8, dice: &DiceSet) -> u32 {
    let counts = dice.face_counts();
    if counts[1..].iter().any(|&c| c >= n) {
        dice.sum()
    } else {
        0
    }
}

pub fn full_house(dice: &DiceSet) -> u32 {
    if is_two_and_three(&dice.face_counts()) {
        FULL_HOUSE_SCORE
    } else {
        0
    }
}

pub fn small_straight(dice: &DiceSet) -> u32 {
    let present = present_faces(dice);
    let found = SMALL_STRAIGHTS
        .iter()
        .any(|run| run.iter().all(|&face| present[face as usize]));
    if found { SMALL_STRAIGHT_SCORE } else { 0 }
}

pub fn large_straight(dice: &DiceSet) -> u32 {
    let present = present_faces(dice);
    let distinct = present[1..].iter().filter(|&&p| p).count();
    let found = distinct == dice.len()
        && LARGE_STRAIGHTS
            .iter()
            .any(|run| run.iter().all(|&face| present[face as usize]));
    if found { LARGE_STRAIGHT_SCORE } else { 0 }
}

pub fn yahtzee(dice: &DiceSet) -> u32 {
    if is_yahtzee(dice) { YAHTZEE_SCORE } else { 0 }
}

pub fn chance(dice: &DiceSet) -> u32 {
    dice.sum()
}

pub fn color(color: DieColor, dice: &DiceSet) -> u32 {
    let all_match = !dice.is_empty() && dice.dice().iter().all(|d| d.color == color);
    if all_match && color != DieColor::Blank {
        COLOR_SCORE
    } else {
        0
    }
}

pub fn color_full_house(dice: &DiceSet) -> u32 {
    if is_two_and_three(&dice.color_counts()) {
        COLOR_FULL_HOUSE_SCORE
    } else {
        0
    }
}

/// All dice share one rolled face.
pub fn is_yahtzee(dice: &DiceSet) -> bool {
    let mut values = dice.values();
    match values.next() {
        Some(first) if first != 0 => values.all(|v| v == first),
        _ => false,
    }
}

fn present_faces(dice: &DiceSet) -> [bool; 7] {
    let mut present = [false; 7];
    for (face, count) in dice.face_counts().iter().enumerate() {
        present[face] = *count > 0;
    }
    present
}

/// Nonzero counts, sorted ascending, are exactly `[2, 3]`.
fn is_two_and_three(counts: &[u8]) -> bool {
    let mut nonzero: Vec<u8> = counts.iter().copied().filter(|&c| c > 0).collect();
    nonzero.sort_unstable();
    nonzero == [2, 3]
}
