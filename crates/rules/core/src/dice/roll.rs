//! Roll outcomes and the roller that produces them.

use std::fmt;

use tracing::trace;

use super::parse::{DieExpression, ModifierSign, parse};
use super::state::DiceState;

/// One die's worth of outcome: a single value, or the distinct pair drawn
/// for an advantage/disadvantage roll.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RollEntry {
    Single(i64),
    Pair(i64, i64),
}

impl RollEntry {
    /// The value this entry contributes: max of the pair under advantage,
    /// min under disadvantage, the raw value otherwise.
    #[must_use]
    pub fn kept(&self, advantage: bool, disadvantage: bool) -> i64 {
        match *self {
            RollEntry::Single(v) => v,
            RollEntry::Pair(a, b) => {
                if advantage {
                    a.max(b)
                } else if disadvantage {
                    a.min(b)
                } else {
                    a
                }
            }
        }
    }
}

/// Ordered sequence of per-die results plus the roll's parameters.
///
/// Immutable once produced; rerolls yield a fresh outcome linked back to
/// this one through `prior`.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DieRoll {
    entries: Vec<RollEntry>,
    modifier: i64,
    sides: u32,
    advantage: bool,
    disadvantage: bool,
    crit: bool,
    /// Outcome this roll replaced, for lucky-reroll audit trails.
    prior: Option<Box<DieRoll>>,
}

impl DieRoll {
    /// Per-die entries in roll order.
    #[must_use]
    pub fn entries(&self) -> &[RollEntry] {
        &self.entries
    }

    /// Kept value of every entry, in roll order.
    #[must_use]
    pub fn kept_values(&self) -> Vec<i64> {
        self.entries
            .iter()
            .map(|e| e.kept(self.advantage, self.disadvantage))
            .collect()
    }

    /// Die size; `0` for flat-modifier rolls.
    #[must_use]
    pub const fn sides(&self) -> u32 {
        self.sides
    }

    /// Signed modifier added to the kept sum.
    #[must_use]
    pub const fn modifier(&self) -> i64 {
        self.modifier
    }

    /// True when this roll was made with advantage.
    #[must_use]
    pub const fn advantage(&self) -> bool {
        self.advantage
    }

    /// True when this roll was made with disadvantage.
    #[must_use]
    pub const fn disadvantage(&self) -> bool {
        self.disadvantage
    }

    /// True when the die count was doubled for a critical hit.
    #[must_use]
    pub const fn crit(&self) -> bool {
        self.crit
    }

    /// The outcome this roll replaced, if it was a reroll.
    #[must_use]
    pub fn prior(&self) -> Option<&DieRoll> {
        self.prior.as_deref()
    }

    /// Sum of kept values plus the modifier.
    #[must_use]
    pub fn result(&self) -> i64 {
        let kept: i64 = self
            .entries
            .iter()
            .map(|e| e.kept(self.advantage, self.disadvantage))
            .sum();
        kept + self.modifier
    }

    /// True if any kept value is the die's maximum face on a d20.
    ///
    /// Only meaningful for `sides == 20`.
    #[must_use]
    pub fn nat_20(&self) -> bool {
        self.entries
            .iter()
            .any(|e| e.kept(self.advantage, self.disadvantage) == 20)
    }

    /// True if any kept value is a natural 1.
    ///
    /// Only meaningful for `sides == 20`.
    #[must_use]
    pub fn nat_1(&self) -> bool {
        self.entries
            .iter()
            .any(|e| e.kept(self.advantage, self.disadvantage) == 1)
    }

    /// Re-sample part of this roll, linking the old outcome as `prior`.
    ///
    /// A lucky reroll re-samples only entries whose kept value is 1. A
    /// plain reroll (weapon reroll features) re-samples entries whose kept
    /// value is 1 or the die's maximum face.
    #[must_use]
    pub fn reroll(&self, lucky: bool, state: &mut DiceState) -> DieRoll {
        if lucky {
            self.reroll_values(&[1], state)
        } else {
            self.reroll_values(&[1, i64::from(self.sides)], state)
        }
    }

    /// Re-sample exactly the entries whose kept value appears in `values`.
    ///
    /// Used by damage rerolls that target specific faces (great-weapon
    /// fighting rerolls 1s and 2s). A reroll is a roll of this die size,
    /// so it consumes a pending fudge override like any other.
    #[must_use]
    pub fn reroll_values(&self, values: &[i64], state: &mut DiceState) -> DieRoll {
        let fudged = state.take_fudge(self.sides);
        let entries = self
            .entries
            .iter()
            .map(|entry| {
                let kept = entry.kept(self.advantage, self.disadvantage);
                if !values.contains(&kept) || self.sides == 0 {
                    return *entry;
                }
                match (fudged, self.advantage || self.disadvantage) {
                    (Some(v), true) => RollEntry::Pair(v, v),
                    (Some(v), false) => RollEntry::Single(v),
                    (None, true) => {
                        let (a, b) = state.sample_pair(self.sides);
                        RollEntry::Pair(a, b)
                    }
                    (None, false) => RollEntry::Single(state.sample(self.sides)),
                }
            })
            .collect();

        let roll = DieRoll {
            entries,
            modifier: self.modifier,
            sides: self.sides,
            advantage: self.advantage,
            disadvantage: self.disadvantage,
            crit: self.crit,
            prior: Some(Box::new(self.clone())),
        };
        state.record(roll.clone());
        roll
    }
}

impl fmt::Display for DieRoll {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.sides == 0 {
            return write!(f, "{}", self.result());
        }
        let rendered: Vec<String> = self
            .entries
            .iter()
            .map(|e| match *e {
                RollEntry::Single(v) => v.to_string(),
                RollEntry::Pair(a, b) => format!("{a}|{b}"),
            })
            .collect();
        write!(f, "d{}({})", self.sides, rendered.join(" + "))?;
        if self.modifier > 0 {
            write!(f, " + {}", self.modifier)?;
        } else if self.modifier < 0 {
            write!(f, " - {}", -self.modifier)?;
        }
        Ok(())
    }
}

/// Several rolls composed with `+`, summed together.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RollSum {
    rolls: Vec<DieRoll>,
}

impl RollSum {
    /// The composed rolls, in addition order.
    #[must_use]
    pub fn rolls(&self) -> &[DieRoll] {
        &self.rolls
    }

    /// Sum of every composed roll's result.
    #[must_use]
    pub fn result(&self) -> i64 {
        self.rolls.iter().map(DieRoll::result).sum()
    }

    /// Sum of every composed roll's expectation.
    #[must_use]
    pub fn expected(&self) -> f64 {
        self.rolls.iter().map(DieRoll::expected).sum()
    }
}

impl fmt::Display for RollSum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.rolls.iter().map(DieRoll::to_string).collect();
        write!(f, "{}", parts.join(" + "))
    }
}

impl std::ops::Add for DieRoll {
    type Output = RollSum;

    fn add(self, rhs: DieRoll) -> RollSum {
        RollSum {
            rolls: vec![self, rhs],
        }
    }
}

impl std::ops::Add<DieRoll> for RollSum {
    type Output = RollSum;

    fn add(mut self, rhs: DieRoll) -> RollSum {
        self.rolls.push(rhs);
        self
    }
}

/// Builds [`DieRoll`] outcomes from an expression plus roll options.
#[derive(Clone, Debug)]
pub struct Roller {
    expr: DieExpression,
    crit: bool,
    advantage: bool,
    disadvantage: bool,
    description: Option<String>,
}

impl Roller {
    /// Roller over a textual expression. Parsing is lenient (see
    /// [`parse`]); this never fails.
    #[must_use]
    pub fn new(expr: &str) -> Self {
        Self::from_expression(parse(expr))
    }

    /// A `1d20` roller with a signed modifier.
    ///
    /// Formatting a negative modifier into the textual grammar would lose
    /// the sign (the lenient scanner skips `-` after `+`), so attack and
    /// save rolls build the expression directly.
    #[must_use]
    pub const fn d20(modifier: i64) -> Self {
        let (sign, magnitude) = if modifier < 0 {
            (ModifierSign::Minus, -modifier)
        } else {
            (ModifierSign::Plus, modifier)
        };
        Self::from_expression(DieExpression {
            count: 1,
            sides: 20,
            sign,
            modifier_value: magnitude,
        })
    }

    /// Roller over an already-parsed expression.
    #[must_use]
    pub const fn from_expression(expr: DieExpression) -> Self {
        Self {
            expr,
            crit: false,
            advantage: false,
            disadvantage: false,
            description: None,
        }
    }

    /// Double the die count before sampling (critical hit).
    #[must_use]
    pub const fn crit(mut self, crit: bool) -> Self {
        self.crit = crit;
        self
    }

    /// Draw a distinct pair per die and keep the higher value.
    #[must_use]
    pub const fn advantage(mut self, advantage: bool) -> Self {
        self.advantage = advantage;
        self
    }

    /// Draw a distinct pair per die and keep the lower value.
    #[must_use]
    pub const fn disadvantage(mut self, disadvantage: bool) -> Self {
        self.disadvantage = disadvantage;
        self
    }

    /// Label carried into the roll trace (audit logs).
    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// The parsed expression this roller samples from.
    #[must_use]
    pub const fn expression(&self) -> &DieExpression {
        &self.expr
    }

    /// Produce an outcome, consuming any pending fudge for this die size.
    #[must_use]
    pub fn roll(&self, state: &mut DiceState) -> DieRoll {
        let roll = self.sample(state);
        trace!(
            expr = ?self.expr,
            description = self.description.as_deref().unwrap_or(""),
            result = roll.result(),
            "die roll"
        );
        state.record(roll.clone());
        roll
    }

    /// Roll, and when any kept value is a natural 1 and the roller's owner
    /// has the lucky trait, perform exactly one lucky reroll.
    #[must_use]
    pub fn roll_with_lucky(&self, lucky_trait: bool, state: &mut DiceState) -> DieRoll {
        let roll = self.roll(state);
        if lucky_trait && roll.nat_1() {
            roll.reroll(true, state)
        } else {
            roll
        }
    }

    fn sample(&self, state: &mut DiceState) -> DieRoll {
        if self.expr.is_flat() {
            // A flat expression still yields one entry so composed sums and
            // renders stay uniform.
            return DieRoll {
                entries: vec![RollEntry::Single(i64::from(self.expr.count))],
                modifier: self.expr.modifier(),
                sides: 0,
                advantage: false,
                disadvantage: false,
                crit: false,
                prior: None,
            };
        }

        let sides = self.expr.sides;
        let mut count = self.expr.count;
        if self.crit {
            count *= 2;
        }

        let paired = self.advantage || self.disadvantage;
        let fudged = state.take_fudge(sides);
        let entries = (0..count)
            .map(|_| match (fudged, paired) {
                (Some(v), true) => RollEntry::Pair(v, v),
                (Some(v), false) => RollEntry::Single(v),
                (None, true) => {
                    let (a, b) = state.sample_pair(sides);
                    RollEntry::Pair(a, b)
                }
                (None, false) => RollEntry::Single(state.sample(sides)),
            })
            .collect();

        DieRoll {
            entries,
            modifier: self.expr.modifier(),
            sides,
            advantage: self.advantage,
            disadvantage: self.disadvantage,
            crit: self.crit,
            prior: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state() -> DiceState {
        DiceState::from_seed(42)
    }

    #[test]
    fn flat_roll_result() {
        let mut dice = state();
        assert_eq!(Roller::new("1").roll(&mut dice).result(), 1);
        assert_eq!(Roller::new("5").roll(&mut dice).result(), 5);
    }

    #[test]
    fn single_die_stays_in_range() {
        let mut dice = state();
        for _ in 0..100 {
            let result = Roller::new("1d6").roll(&mut dice).result();
            assert!((1..=6).contains(&result), "out of range: {result}");
        }
    }

    #[test]
    fn multi_die_with_modifier_stays_in_range() {
        let mut dice = state();
        for _ in 0..100 {
            let result = Roller::new("2d6+2").roll(&mut dice).result();
            assert!((4..=14).contains(&result), "out of range: {result}");
        }
    }

    #[test]
    fn crit_doubles_die_count_not_sides() {
        let mut dice = state();
        let roll = Roller::new("2d6").crit(true).roll(&mut dice);
        assert_eq!(roll.entries().len(), 4);
        assert_eq!(roll.sides(), 6);
    }

    #[test]
    fn advantage_pair_values_are_distinct() {
        let mut dice = state();
        for _ in 0..200 {
            let roll = Roller::new("1d20").advantage(true).roll(&mut dice);
            match roll.entries()[0] {
                RollEntry::Pair(a, b) => assert_ne!(a, b),
                RollEntry::Single(_) => panic!("advantage roll must sample a pair"),
            }
        }
    }

    #[test]
    fn advantage_keeps_max_disadvantage_keeps_min() {
        let mut dice = state();
        let adv = Roller::new("1d20").advantage(true).roll(&mut dice);
        let RollEntry::Pair(a, b) = adv.entries()[0] else {
            panic!("expected pair");
        };
        assert_eq!(adv.result(), a.max(b));

        let dis = Roller::new("1d20").disadvantage(true).roll(&mut dice);
        let RollEntry::Pair(a, b) = dis.entries()[0] else {
            panic!("expected pair");
        };
        assert_eq!(dis.result(), a.min(b));
    }

    #[test]
    fn fudge_forces_next_roll_and_clears() {
        let mut dice = state();
        dice.fudge(20, 20);
        let roll = Roller::new("1d20").roll(&mut dice);
        assert_eq!(roll.result(), 20);
        assert!(roll.nat_20());

        // Consumed: the next roll is sampled normally and a later fudge
        // under advantage duplicates the value as the pair.
        dice.fudge(7, 20);
        let adv = Roller::new("1d20").advantage(true).roll(&mut dice);
        assert_eq!(adv.entries()[0], RollEntry::Pair(7, 7));
        assert_eq!(adv.result(), 7);
    }

    #[test]
    fn nat_checks_use_kept_value() {
        let mut dice = state();
        dice.fudge(1, 20);
        let roll = Roller::new("1d20").roll(&mut dice);
        assert!(roll.nat_1());
        assert!(!roll.nat_20());
    }

    #[test]
    fn lucky_reroll_replaces_only_ones() {
        let mut dice = state();
        dice.fudge(1, 20);
        let roll = Roller::new("1d20").roll(&mut dice);
        assert!(roll.nat_1());

        dice.fudge(15, 20);
        let rerolled = roll.reroll(true, &mut dice);
        assert_eq!(rerolled.result(), 15);
        assert_eq!(rerolled.prior().unwrap().result(), 1);
    }

    #[test]
    fn lucky_reroll_keeps_non_one_entries() {
        let mut dice = state();
        dice.fudge(4, 6);
        let roll = Roller::new("2d6").roll(&mut dice);
        assert_eq!(roll.result(), 8);

        let rerolled = roll.reroll(true, &mut dice);
        // No kept 1s: nothing re-sampled.
        assert_eq!(rerolled.kept_values(), roll.kept_values());
    }

    #[test]
    fn plain_reroll_replaces_ones_and_max_faces() {
        let mut dice = state();
        dice.fudge(6, 6);
        let roll = Roller::new("1d6").roll(&mut dice);
        assert_eq!(roll.result(), 6);

        dice.fudge(3, 6);
        let rerolled = roll.reroll(false, &mut dice);
        assert_eq!(rerolled.result(), 3);
    }

    #[test]
    fn roll_with_lucky_rerolls_once_for_lucky_entities() {
        let mut dice = state();
        dice.fudge(1, 20);
        let roll = Roller::new("1d20+3").roll_with_lucky(true, &mut dice);
        assert!(roll.prior().is_some(), "nat 1 with lucky must reroll");

        dice.fudge(1, 20);
        let unlucky = Roller::new("1d20+3").roll_with_lucky(false, &mut dice);
        assert!(unlucky.prior().is_none());
    }

    #[test]
    fn composed_rolls_sum_and_render() {
        let mut dice = state();
        dice.fudge(7, 8);
        let first = Roller::new("2d8").roll(&mut dice);
        dice.fudge(4, 6);
        let second = Roller::new("1d6").roll(&mut dice);

        let sum = first + second;
        assert_eq!(sum.result(), 7 + 7 + 4);
        assert_eq!(sum.to_string(), "d8(7 + 7) + d6(4)");
    }

    #[test]
    fn display_includes_modifier() {
        let mut dice = state();
        dice.fudge(5, 8);
        let roll = Roller::new("1d8+2").roll(&mut dice);
        assert_eq!(roll.to_string(), "d8(5) + 2");
    }
}
