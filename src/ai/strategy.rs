use crate::category::Category;
use crate::dice::DiceSet;
use crate::scorecard::Scorecard;
use crate::scoring;

/// Decision policy for a computer-controlled player.
pub trait TurnStrategy {
    /// Dice to hold before the next roll, or `None` to score now.
    fn choose_holds(&self, dice: &DiceSet, rolls_left: u8, card: &Scorecard) -> Option<Vec<bool>>;

    /// Category to lock for `dice`. `None` only when nothing can be locked.
    fn choose_category(&self, dice: &DiceSet, card: &Scorecard) -> Option<Category>;
}

/// Greedy policy: keep runs, sets and useful high faces; score the best
/// open line.
#[derive(Debug, Default, Clone, Copy)]
pub struct GreedyStrategy;

impl TurnStrategy for GreedyStrategy {
    fn choose_holds(&self, dice: &DiceSet, rolls_left: u8, card: &Scorecard) -> Option<Vec<bool>> {
        if rolls_left == 0 || yahtzee_is_scorable(dice, card) {
            return None;
        }
        if !card.is_selected(Category::LargeStraight) && scoring::large_straight(dice) > 0 {
            return None;
        }

        let counts = dice.face_counts();
        let run = straight_run(dice);
        let mut run_faces_taken = [false; 7];
        let holds: Vec<bool> = dice
            .values()
            .map(|value| {
                let face = value as usize;
                if let Some((low, high)) = run
                    && (low..=high).contains(&value)
                    && !run_faces_taken[face]
                {
                    run_faces_taken[face] = true;
                    return true;
                }
                if counts[face] >= 2 {
                    return true;
                }
                value >= 4 && Category::for_face(value).is_some_and(|c| !card.is_selected(c))
            })
            .collect();

        if holds.iter().all(|&h| h) {
            None
        } else {
            Some(holds)
        }
    }

    fn choose_category(&self, dice: &DiceSet, card: &Scorecard) -> Option<Category> {
        if yahtzee_is_scorable(dice, card) {
            return Some(Category::Yahtzee);
        }

        let mut best: Option<(Category, u32)> = None;
        for category in Category::REAL {
            if card.is_selected(category) {
                continue;
            }
            let score = scoring::score(category, dice);
            if best.is_none_or(|(_, best_score)| score > best_score) {
                best = Some((category, score));
            }
        }
        best.map(|(category, _)| category)
    }
}

/// A Yahtzee that is open, or already scored nonzero and eligible for the bonus.
fn yahtzee_is_scorable(dice: &DiceSet, card: &Scorecard) -> bool {
    if !scoring::is_yahtzee(dice) {
        return false;
    }
    match card.entry(Category::Yahtzee) {
        Some(entry) if entry.selected => entry.value.unwrap_or(0) > 0,
        _ => true,
    }
}

/// Lowest and highest face of the first run of four or more consecutive faces.
fn straight_run(dice: &DiceSet) -> Option<(u8, u8)> {
    let counts = dice.face_counts();
    let mut start = None;
    let mut best = None;
    for face in 1..=7u8 {
        let present = face <= 6 && counts[face as usize] > 0;
        match (present, start) {
            (true, None) => start = Some(face),
            (false, Some(low)) => {
                if face - low >= 4 && best.is_none() {
                    best = Some((low, face - 1));
                }
                start = None;
            }
            _ => {}
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dice::DieColor::{Blue, Green, Red};

    fn plain(values: [u8; 5]) -> DiceSet {
        DiceSet::from_faces(&values.map(|v| (v, Red)))
    }

    #[test]
    fn last_roll_always_scores() {
        let card = Scorecard::new();

        assert_eq!(GreedyStrategy.choose_holds(&plain([1, 3, 5, 2, 6]), 0, &card), None);
    }

    #[test]
    fn open_yahtzee_is_taken_immediately() {
        let card = Scorecard::new();
        let dice = plain([4; 5]);

        assert_eq!(GreedyStrategy.choose_holds(&dice, 2, &card), None);
        assert_eq!(GreedyStrategy.choose_category(&dice, &card), Some(Category::Yahtzee));
    }

    #[test]
    fn scratched_yahtzee_is_not_chosen_again() {
        let mut card = Scorecard::new();
        card.lock_category(Category::Yahtzee, 0).unwrap();

        let dice = DiceSet::from_faces(&[(4, Red), (4, Blue), (4, Green), (4, Red), (4, Blue)]);

        let choice = GreedyStrategy.choose_category(&dice, &card);

        assert_eq!(choice, Some(Category::Fours));
    }

    #[test]
    fn holds_pairs_and_open_high_faces() {
        let card = Scorecard::new();
        let dice = plain([2, 2, 5, 1, 3]);

        let holds = GreedyStrategy.choose_holds(&dice, 2, &card).unwrap();

        assert_eq!(holds, vec![true, true, true, false, false]);
    }

    #[test]
    fn holds_one_die_per_face_of_a_straight_run() {
        let card = Scorecard::new();
        let dice = DiceSet::from_faces(&[(3, Red), (4, Blue), (5, Green), (6, Red), (1, Blue)]);

        let holds = GreedyStrategy.choose_holds(&dice, 1, &card).unwrap();

        assert_eq!(holds, vec![true, true, true, true, false]);
    }

    #[test]
    fn picks_highest_open_score_with_ties_in_card_order() {
        let mut card = Scorecard::new();
        let dice = DiceSet::from_faces(&[(1, Red), (1, Blue), (1, Green), (4, Red), (4, Blue)]);

        assert_eq!(GreedyStrategy.choose_category(&dice, &card), Some(Category::FullHouse));

        card.lock_category(Category::FullHouse, 25).unwrap();
        assert_eq!(
            GreedyStrategy.choose_category(&dice, &card),
            Some(Category::ThreeOfAKind)
        );
    }

    #[test]
    fn nothing_to_choose_on_a_complete_card() {
        let mut card = Scorecard::new();
        for category in Category::REAL {
            card.lock_category(category, 0).unwrap();
        }

        assert_eq!(GreedyStrategy.choose_category(&plain([1, 2, 3, 4, 6]), &card), None);
    }

    #[test]
    fn straight_run_finds_four_and_five_long_runs() {
        assert_eq!(straight_run(&plain([2, 3, 4, 5, 5])), Some((2, 5)));
        assert_eq!(straight_run(&plain([1, 2, 3, 4, 5])), Some((1, 5)));
        assert_eq!(straight_run(&plain([1, 2, 3, 5, 6])), None);
    }
}
