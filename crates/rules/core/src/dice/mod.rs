//! Probabilistic dice engine.
//!
//! Everything else in the crate rolls through here. The module provides:
//! - `parse`: the `[N]d[S][(+|-)M]` expression grammar
//! - `state`: the session-scoped [`DiceState`] (rng, fudge overrides,
//!   bounded roll history), injected rather than global
//! - `roll`: [`Roller`]/[`DieRoll`] outcomes with kept-value semantics for
//!   advantage and disadvantage, plus [`RollSum`] composition
//! - `expectation`: closed-form expected values and threshold probabilities
//!
//! # Advantage sampling
//!
//! An advantage/disadvantage die draws **two distinct** uniform samples from
//! `[1, sides]` (without replacement) rather than two independent rolls.
//! This deviates from tabletop convention on purpose and is preserved for
//! compatibility; the pair values are never equal.

mod expectation;
mod parse;
mod roll;
mod state;

pub use parse::{DieExpression, ModifierSign, parse};
pub use roll::{DieRoll, RollEntry, RollSum, Roller};
pub use state::{DiceState, HISTORY_CAPACITY};

pub(crate) use expectation::{expected_value, prob_at_least};
