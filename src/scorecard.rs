use serde::{Deserialize, Serialize};

use crate::category::{Category, Section};
use crate::config::RulesConfig;
use crate::dice::DiceSet;
use crate::error::ActionError;
use crate::scoring;

/// One scorecard line.
///
/// Contract:
/// - `selected == true`: `value` is the locked score.
/// - `selected == false`: `value` is the live preview for the current dice,
///   `None` while the dice are blank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ScorecardEntry {
    pub value: Option<u32>,
    pub selected: bool,
}

/// Result of a successful lock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockOutcome {
    Locked { score: u32 },
    /// Another Yahtzee landed on an already-scored Yahtzee line.
    BonusYahtzee { bonus: u32, total: u32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct BonusRules {
    upper_threshold: u32,
    upper_value: u32,
    yahtzee_value: u32,
}

impl From<&RulesConfig> for BonusRules {
    fn from(config: &RulesConfig) -> Self {
        Self {
            upper_threshold: config.upper_bonus_threshold,
            upper_value: config.upper_bonus_value,
            yahtzee_value: config.yahtzee_bonus_value,
        }
    }
}

/// Per-player scorecard over the selectable categories. The upper bonus is
/// derived from the locked upper lines and never stored as a row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scorecard {
    entries: [ScorecardEntry; Category::COUNT],
    rules: BonusRules,
    bonus_yahtzees: u32,
}

impl Scorecard {
    pub fn new() -> Self {
        Self::with_rules(&RulesConfig::default())
    }

    pub fn with_rules(config: &RulesConfig) -> Self {
        Self {
            entries: [ScorecardEntry::default(); Category::COUNT],
            rules: BonusRules::from(config),
            bonus_yahtzees: 0,
        }
    }

    /// Entry for a selectable category; `None` for the derived bonus.
    pub fn entry(&self, category: Category) -> Option<&ScorecardEntry> {
        category.index().map(|idx| &self.entries[idx])
    }

    pub fn entries(&self) -> impl Iterator<Item = (Category, ScorecardEntry)> + '_ {
        Category::REAL.into_iter().zip(self.entries.iter().copied())
    }

    pub fn is_selected(&self, category: Category) -> bool {
        self.entry(category).is_some_and(|e| e.selected)
    }

    /// What `category` would score with `dice`. Locked lines report their
    /// locked value; the bonus reports its derived value. Never mutates.
    pub fn preview_score(&self, category: Category, dice: &DiceSet) -> u32 {
        match self.entry(category) {
            Some(entry) if entry.selected => entry.value.unwrap_or(0),
            Some(_) => scoring::score(category, dice),
            None => self.upper_bonus(),
        }
    }

    /// Recomputes the preview value of every unselected line.
    pub fn refresh_previews(&mut self, dice: &DiceSet) {
        let blank = dice.is_blank();
        for (category, entry) in Category::REAL.iter().zip(self.entries.iter_mut()) {
            if entry.selected {
                continue;
            }
            entry.value = if blank {
                None
            } else {
                Some(scoring::score(*category, dice))
            };
        }
    }

    /// Locks `score` into `category`.
    ///
    /// A locked line is write-once, except that a nonzero Yahtzee line gains
    /// the Yahtzee bonus when `score` shows another Yahtzee.
    pub fn lock_category(
        &mut self,
        category: Category,
        score: u32,
    ) -> Result<LockOutcome, ActionError> {
        let idx = category
            .index()
            .ok_or(ActionError::NotSelectable(category))?;
        let entry = &mut self.entries[idx];

        if !entry.selected {
            entry.value = Some(score);
            entry.selected = true;
            return Ok(LockOutcome::Locked { score });
        }

        let locked = entry.value.unwrap_or(0);
        if category == Category::Yahtzee && locked > 0 && score > 0 {
            let total = locked + self.rules.yahtzee_value;
            entry.value = Some(total);
            self.bonus_yahtzees += 1;
            return Ok(LockOutcome::BonusYahtzee {
                bonus: self.rules.yahtzee_value,
                total,
            });
        }

        Err(ActionError::CategoryLocked(category))
    }

    /// Raw overwrite used when applying an authoritative snapshot.
    pub fn overwrite(&mut self, entries: &[(Category, ScorecardEntry)]) {
        for (category, entry) in entries {
            if let Some(idx) = category.index() {
                self.entries[idx] = *entry;
            }
        }
    }

    fn locked_sum(&self, section: Section) -> u32 {
        self.entries()
            .filter(|(category, entry)| entry.selected && category.section() == section)
            .map(|(_, entry)| entry.value.unwrap_or(0))
            .sum()
    }

    /// Sum of the locked upper lines.
    pub fn upper_total(&self) -> u32 {
        self.locked_sum(Section::Upper)
    }

    pub fn lower_total(&self) -> u32 {
        self.locked_sum(Section::Lower)
    }

    pub fn is_upper_bonus_earned(&self) -> bool {
        self.upper_total() >= self.rules.upper_threshold
    }

    pub fn upper_bonus(&self) -> u32 {
        if self.is_upper_bonus_earned() {
            self.rules.upper_value
        } else {
            0
        }
    }

    pub fn total_score(&self) -> u32 {
        self.upper_total() + self.upper_bonus() + self.lower_total()
    }

    pub fn bonus_yahtzees(&self) -> u32 {
        self.bonus_yahtzees
    }

    /// Raw overwrite of the bonus count, paired with `overwrite`.
    pub(crate) fn set_bonus_yahtzees(&mut self, count: u32) {
        self.bonus_yahtzees = count;
    }

    pub fn remaining_category_count(&self) -> usize {
        self.entries.iter().filter(|e| !e.selected).count()
    }

    pub fn is_complete(&self) -> bool {
        self.remaining_category_count() == 0
    }
}

impl Default for Scorecard {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dice::DieColor;

    fn sixes() -> DiceSet {
        DiceSet::from_faces(&[(6, DieColor::Red); 5])
    }

    #[test]
    fn fresh_scorecard_has_every_line_open_and_empty() {
        let card = Scorecard::new();

        assert_eq!(card.remaining_category_count(), 17);
        assert!(card.entries().all(|(_, e)| e.value.is_none() && !e.selected));
        assert_eq!(card.total_score(), 0);
    }

    #[test]
    fn lock_is_write_once() {
        let mut card = Scorecard::new();
        card.lock_category(Category::Chance, 20).unwrap();

        let err = card.lock_category(Category::Chance, 30).unwrap_err();

        assert_eq!(err, ActionError::CategoryLocked(Category::Chance));
        assert_eq!(
            card.entry(Category::Chance),
            Some(&ScorecardEntry {
                value: Some(20),
                selected: true
            })
        );
    }

    #[test]
    fn bonus_row_cannot_be_locked() {
        let mut card = Scorecard::new();

        let err = card.lock_category(Category::UpperBonus, 35).unwrap_err();

        assert_eq!(err, ActionError::NotSelectable(Category::UpperBonus));
    }

    #[test]
    fn second_yahtzee_adds_the_bonus() {
        let mut card = Scorecard::new();
        let dice = sixes();
        let first = scoring::score(Category::Yahtzee, &dice);
        card.lock_category(Category::Yahtzee, first).unwrap();

        let outcome = card
            .lock_category(Category::Yahtzee, scoring::score(Category::Yahtzee, &dice))
            .unwrap();

        assert_eq!(outcome, LockOutcome::BonusYahtzee { bonus: 100, total: 150 });
        assert_eq!(card.entry(Category::Yahtzee).unwrap().value, Some(150));
        assert_eq!(card.bonus_yahtzees(), 1);
    }

    #[test]
    fn scratched_yahtzee_never_earns_a_bonus() {
        let mut card = Scorecard::new();
        card.lock_category(Category::Yahtzee, 0).unwrap();

        let err = card.lock_category(Category::Yahtzee, 50).unwrap_err();

        assert_eq!(err, ActionError::CategoryLocked(Category::Yahtzee));
        assert_eq!(card.entry(Category::Yahtzee).unwrap().value, Some(0));
    }

    #[test]
    fn locked_yahtzee_without_a_new_yahtzee_is_rejected() {
        let mut card = Scorecard::new();
        card.lock_category(Category::Yahtzee, 50).unwrap();

        let err = card.lock_category(Category::Yahtzee, 0).unwrap_err();

        assert_eq!(err, ActionError::CategoryLocked(Category::Yahtzee));
    }

    #[test]
    fn upper_bonus_is_derived_and_monotonic() {
        let mut card = Scorecard::new();
        let locks = [
            (Category::Sixes, 24),
            (Category::Fives, 20),
            (Category::Fours, 12),
            (Category::Threes, 9),
            (Category::Twos, 0),
            (Category::Ones, 0),
        ];
        let mut earned_before = false;

        for (category, score) in locks {
            card.lock_category(category, score).unwrap();
            let earned = card.is_upper_bonus_earned();
            assert!(!earned_before || earned);
            earned_before = earned;
        }

        assert_eq!(card.upper_total(), 65);
        assert!(card.is_upper_bonus_earned());
        assert_eq!(card.total_score(), 65 + 35);
        assert_eq!(card.preview_score(Category::UpperBonus, &DiceSet::new()), 35);
    }

    #[test]
    fn upper_bonus_ignores_unlocked_previews() {
        let mut card = Scorecard::new();
        card.refresh_previews(&sixes());

        assert_eq!(card.entry(Category::Sixes).unwrap().value, Some(30));
        assert_eq!(card.upper_total(), 0);
        assert_eq!(card.total_score(), 0);
    }

    #[test]
    fn preview_never_mutates_the_scorecard() {
        let mut card = Scorecard::new();
        card.lock_category(Category::Chance, 17).unwrap();
        let before = card.clone();
        let dice = sixes();

        for _ in 0..3 {
            assert_eq!(card.preview_score(Category::Sixes, &dice), 30);
            assert_eq!(card.preview_score(Category::Chance, &dice), 17);
        }

        assert_eq!(card, before);
    }

    #[test]
    fn refresh_previews_skips_locked_lines_and_clears_on_blank_dice() {
        let mut card = Scorecard::new();
        card.lock_category(Category::Sixes, 12).unwrap();

        card.refresh_previews(&sixes());
        assert_eq!(card.entry(Category::Sixes).unwrap().value, Some(12));
        assert_eq!(card.entry(Category::Chance).unwrap().value, Some(30));

        card.refresh_previews(&DiceSet::new());
        assert_eq!(card.entry(Category::Chance).unwrap().value, None);
        assert_eq!(card.entry(Category::Sixes).unwrap().value, Some(12));
    }

    #[test]
    fn complete_only_after_the_last_real_line_is_locked() {
        let mut card = Scorecard::new();
        for category in Category::REAL.iter().take(Category::COUNT - 1) {
            card.lock_category(*category, 0).unwrap();
        }

        assert_eq!(card.remaining_category_count(), 1);
        assert!(!card.is_complete());

        card.lock_category(Category::ColorFullHouse, 15).unwrap();

        assert!(card.is_complete());
        assert_eq!(card.total_score(), 15);
    }
}
