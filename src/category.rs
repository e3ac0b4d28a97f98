use std::fmt;

use serde::{Deserialize, Serialize};

/// Scorecard grouping of a category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Section {
    Upper,
    Lower,
    /// Derived rows that no player selects.
    Bonus,
}

/// Every scoring line of the rainbow scorecard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Category {
    Ones,
    Twos,
    Threes,
    Fours,
    Fives,
    Sixes,
    ThreeOfAKind,
    FourOfAKind,
    FullHouse,
    SmallStraight,
    LargeStraight,
    Yahtzee,
    Chance,
    Reds,
    Greens,
    Blues,
    ColorFullHouse,
    /// Upper-section bonus. Derived from the upper total, never locked.
    UpperBonus,
}

impl Category {
    /// The selectable categories in scorecard order.
    pub const REAL: [Category; 17] = [
        Category::Ones,
        Category::Twos,
        Category::Threes,
        Category::Fours,
        Category::Fives,
        Category::Sixes,
        Category::ThreeOfAKind,
        Category::FourOfAKind,
        Category::FullHouse,
        Category::SmallStraight,
        Category::LargeStraight,
        Category::Yahtzee,
        Category::Chance,
        Category::Reds,
        Category::Greens,
        Category::Blues,
        Category::ColorFullHouse,
    ];

    pub const UPPER: [Category; 6] = [
        Category::Ones,
        Category::Twos,
        Category::Threes,
        Category::Fours,
        Category::Fives,
        Category::Sixes,
    ];

    pub const COUNT: usize = Self::REAL.len();

    pub fn section(self) -> Section {
        match self {
            Category::Ones
            | Category::Twos
            | Category::Threes
            | Category::Fours
            | Category::Fives
            | Category::Sixes => Section::Upper,
            Category::UpperBonus => Section::Bonus,
            _ => Section::Lower,
        }
    }

    pub fn is_upper(self) -> bool {
        self.section() == Section::Upper
    }

    pub fn is_selectable(self) -> bool {
        self != Category::UpperBonus
    }

    /// Face value counted by an upper category.
    pub fn face(self) -> Option<u8> {
        match self {
            Category::Ones => Some(1),
            Category::Twos => Some(2),
            Category::Threes => Some(3),
            Category::Fours => Some(4),
            Category::Fives => Some(5),
            Category::Sixes => Some(6),
            _ => None,
        }
    }

    /// Upper category for a face value.
    pub fn for_face(face: u8) -> Option<Category> {
        Self::UPPER.get((face as usize).checked_sub(1)?).copied()
    }

    /// Position in `REAL`, `None` for the derived bonus.
    pub fn index(self) -> Option<usize> {
        Self::REAL.iter().position(|&c| c == self)
    }

    /// Key used by the view layer (`data-category` attributes).
    pub fn key(self) -> &'static str {
        match self {
            Category::Ones => "Ones",
            Category::Twos => "Twos",
            Category::Threes => "Threes",
            Category::Fours => "Fours",
            Category::Fives => "Fives",
            Category::Sixes => "Sixes",
            Category::ThreeOfAKind => "Three of a Kind",
            Category::FourOfAKind => "Four of a Kind",
            Category::FullHouse => "Full House",
            Category::SmallStraight => "Small Straight",
            Category::LargeStraight => "Large Straight",
            Category::Yahtzee => "Yahtzee",
            Category::Chance => "Chance",
            Category::Reds => "Reds",
            Category::Greens => "Greens",
            Category::Blues => "Blues",
            Category::ColorFullHouse => "Color Full House",
            Category::UpperBonus => "Top Bonus",
        }
    }

    /// Looks up a category by its view key or by its variant name.
    ///
    /// Variant names are accepted because `ScoreRowView::category` reaches
    /// JS in that form, so either field of a rendered row round-trips.
    pub fn from_key(key: &str) -> Option<Category> {
        let category = match key {
            "Ones" => Category::Ones,
            "Twos" => Category::Twos,
            "Threes" => Category::Threes,
            "Fours" => Category::Fours,
            "Fives" => Category::Fives,
            "Sixes" => Category::Sixes,
            "Three of a Kind" | "ThreeOfAKind" => Category::ThreeOfAKind,
            "Four of a Kind" | "FourOfAKind" => Category::FourOfAKind,
            "Full House" | "FullHouse" => Category::FullHouse,
            "Small Straight" | "SmallStraight" => Category::SmallStraight,
            "Large Straight" | "LargeStraight" => Category::LargeStraight,
            "Yahtzee" => Category::Yahtzee,
            "Chance" => Category::Chance,
            "Reds" => Category::Reds,
            "Greens" => Category::Greens,
            "Blues" => Category::Blues,
            "Color Full House" | "ColorFullHouse" => Category::ColorFullHouse,
            "Top Bonus" | "UpperBonus" => Category::UpperBonus,
            _ => return None,
        };
        Some(category)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}
