//! Closed-form expectation and threshold probability.
//!
//! Advantage/disadvantage use the order-statistic weights of the kept value
//! over a distinct pair: for a die with `s` faces the kept value equals `i`
//! with probability `(2i - 1) / s²` under advantage and `(2(s - i) + 1) / s²`
//! under disadvantage.

use super::parse::DieExpression;
use super::roll::DieRoll;

fn per_face_expectation(sides: u32, advantage: bool, disadvantage: bool) -> f64 {
    let s = f64::from(sides);
    let mut sum = 0.0;
    for i in 1..=sides {
        let i_f = f64::from(i);
        let weight = if advantage {
            (2.0 * i_f - 1.0) / (s * s)
        } else if disadvantage {
            (2.0 * (s - i_f) + 1.0) / (s * s)
        } else {
            1.0 / s
        };
        sum += i_f * weight;
    }
    sum
}

/// Expected value of an expression rolled `count` times with the given
/// advantage state, before any sampling happens.
///
/// Used for what-if queries (average damage) that must not consume rng.
#[must_use]
pub(crate) fn expected_value(
    expr: &DieExpression,
    crit: bool,
    advantage: bool,
    disadvantage: bool,
) -> f64 {
    if expr.is_flat() {
        return (i64::from(expr.count) + expr.modifier()) as f64;
    }
    let count = if crit { expr.count * 2 } else { expr.count };
    f64::from(count) * per_face_expectation(expr.sides, advantage, disadvantage)
        + expr.modifier() as f64
}

/// Probability that an expression's total is at least `x`.
///
/// Exact for single-die expressions. For multi-die expressions the same
/// per-face sum is applied without convolving the independent dice, so the
/// value is an approximation; preserved as-is from the reference rules.
#[must_use]
pub(crate) fn prob_at_least(
    sides: u32,
    modifier: i64,
    x: i64,
    advantage: bool,
    disadvantage: bool,
) -> f64 {
    if sides == 0 {
        // Flat rolls are deterministic.
        return if modifier >= x { 1.0 } else { 0.0 };
    }
    if x > i64::from(sides) + modifier {
        return 0.0;
    }
    if x < 1 + modifier {
        return 1.0;
    }

    let threshold = (x - modifier) as u32;
    let s = f64::from(sides);
    let mut sum = 0.0;
    for i in threshold..=sides {
        let i_f = f64::from(i);
        sum += if advantage {
            (2.0 * i_f - 1.0) / (s * s)
        } else if disadvantage {
            (2.0 * (s - i_f) + 1.0) / (s * s)
        } else {
            1.0 / s
        };
    }
    sum
}

impl DieRoll {
    /// Closed-form expected value of this roll's parameters.
    ///
    /// Plain rolls: `count * (sides + 1) / 2 + modifier`. Advantage and
    /// disadvantage weight each face by the kept-value order statistic.
    #[must_use]
    pub fn expected(&self) -> f64 {
        if self.sides() == 0 {
            return self.result() as f64;
        }
        self.entries().len() as f64
            * per_face_expectation(self.sides(), self.advantage(), self.disadvantage())
            + self.modifier() as f64
    }

    /// Probability that a fresh roll with these parameters totals at least
    /// `x`. See [`prob_at_least`] for the multi-die caveat.
    #[must_use]
    pub fn prob(&self, x: i64) -> f64 {
        prob_at_least(
            self.sides(),
            self.modifier(),
            x,
            self.advantage(),
            self.disadvantage(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::super::roll::Roller;
    use super::super::state::DiceState;
    use super::*;
    use crate::dice::parse;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn plain_expectations() {
        let mut dice = DiceState::from_seed(0);
        assert!(close(Roller::new("1d6+2").roll(&mut dice).expected(), 5.5));
        assert!(close(Roller::new("1d20").roll(&mut dice).expected(), 10.5));
        assert!(close(Roller::new("2d6").roll(&mut dice).expected(), 7.0));
    }

    #[test]
    fn advantage_expectation_is_weighted_order_statistic() {
        let mut dice = DiceState::from_seed(0);
        let adv = Roller::new("1d20").advantage(true).roll(&mut dice);
        assert!(close(adv.expected(), 13.825));
        assert!((adv.expected() - 13.83).abs() < 0.01);

        let dis = Roller::new("1d20").disadvantage(true).roll(&mut dice);
        assert!(close(dis.expected(), 7.175));
    }

    #[test]
    fn crit_expectation_doubles_dice() {
        let mut dice = DiceState::from_seed(0);
        let roll = Roller::new("1d6").crit(true).roll(&mut dice);
        assert!(close(roll.expected(), 7.0));
    }

    #[test]
    fn expected_value_matches_rolled_expectation() {
        let mut dice = DiceState::from_seed(0);
        let expr = parse("2d8+3");
        let rolled = Roller::from_expression(expr).roll(&mut dice);
        assert!(close(expected_value(&expr, false, false, false), rolled.expected()));
    }

    #[test]
    fn prob_clips_to_unit_interval() {
        let mut dice = DiceState::from_seed(0);
        let roll = Roller::new("1d20+5").roll(&mut dice);
        assert!(close(roll.prob(26), 0.0));
        assert!(close(roll.prob(6), 1.0));
        assert!(close(roll.prob(16), 0.5));
    }

    #[test]
    fn advantage_prob_sums_to_one_from_lowest_face() {
        let mut dice = DiceState::from_seed(0);
        let roll = Roller::new("1d20").advantage(true).roll(&mut dice);
        assert!(close(roll.prob(1), 1.0));
        // P(kept 20) = (2*20 - 1) / 400
        assert!(close(roll.prob(20), 39.0 / 400.0));
    }

    #[test]
    fn flat_roll_probability_is_deterministic() {
        let mut dice = DiceState::from_seed(0);
        let roll = Roller::new("5").roll(&mut dice);
        assert!(close(roll.prob(5), 1.0));
        assert!(close(roll.prob(6), 0.0));
    }
}
