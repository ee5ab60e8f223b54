//! Session-scoped dice state.
//!
//! One [`DiceState`] lives inside each game-state owner (a battle, a test
//! harness) and is threaded explicitly through every roll. Keeping the rng,
//! fudge overrides, and roll history here instead of process-wide globals
//! lets independent sessions (and parallel tests) roll without interfering.

use std::collections::HashMap;
use std::collections::VecDeque;

use rand::Rng;
use rand::SeedableRng;
use rand::rngs::StdRng;

use super::roll::DieRoll;

/// Number of rolls retained for inspection. Oldest entries are evicted
/// first once the capacity is reached.
pub const HISTORY_CAPACITY: usize = 100;

/// Mutable dice machinery for one session.
#[derive(Debug)]
pub struct DiceState {
    rng: StdRng,
    fudge: HashMap<u32, i64>,
    history: VecDeque<DieRoll>,
}

impl DiceState {
    /// Deterministic state for tests and replays.
    #[must_use]
    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            fudge: HashMap::new(),
            history: VecDeque::with_capacity(HISTORY_CAPACITY),
        }
    }

    /// OS-seeded state for live play.
    #[must_use]
    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_os_rng(),
            fudge: HashMap::new(),
            history: VecDeque::with_capacity(HISTORY_CAPACITY),
        }
    }

    /// Force the next roll of `sides`-sided dice to come up `value`.
    ///
    /// The override is consumed (and removed) by the next roll call that
    /// samples a die of that size; every die in that one call reads the
    /// fudged value, and under advantage/disadvantage the value is
    /// duplicated as the pair. Intended for deterministic tests.
    pub fn fudge(&mut self, value: i64, sides: u32) {
        self.fudge.insert(sides, value);
    }

    /// Drop any pending override for `sides`-sided dice.
    pub fn unfudge(&mut self, sides: u32) {
        self.fudge.remove(&sides);
    }

    /// Consume the pending override for `sides`, if any.
    pub(super) fn take_fudge(&mut self, sides: u32) -> Option<i64> {
        self.fudge.remove(&sides)
    }

    /// One uniform sample in `[1, sides]`.
    pub(super) fn sample(&mut self, sides: u32) -> i64 {
        i64::from(self.rng.random_range(1..=sides))
    }

    /// Two distinct uniform samples in `[1, sides]`, without replacement.
    ///
    /// Degenerate `sides == 1` duplicates the only face rather than loop
    /// forever.
    pub(super) fn sample_pair(&mut self, sides: u32) -> (i64, i64) {
        if sides <= 1 {
            return (1, 1);
        }
        let first = self.rng.random_range(1..=sides);
        // Sample the second from the remaining faces, then shift past the
        // first to keep the pair distinct and uniform.
        let mut second = self.rng.random_range(1..=sides - 1);
        if second >= first {
            second += 1;
        }
        (i64::from(first), i64::from(second))
    }

    /// Record a completed roll, evicting the oldest past capacity.
    pub(super) fn record(&mut self, roll: DieRoll) {
        if self.history.len() == HISTORY_CAPACITY {
            self.history.pop_front();
        }
        self.history.push_back(roll);
    }

    /// Retained rolls, oldest first.
    pub fn history(&self) -> impl Iterator<Item = &DieRoll> {
        self.history.iter()
    }

    /// Number of retained rolls.
    #[must_use]
    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    /// Forget all retained rolls.
    pub fn clear_history(&mut self) {
        self.history.clear();
    }
}
