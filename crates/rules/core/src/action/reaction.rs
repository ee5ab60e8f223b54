//! Two-phase reaction suspension.
//!
//! Resolution is synchronous until it needs a controller's real-time
//! choice. At that point it returns [`Resolution::Pending`] carrying the
//! prompt and a continuation holding every value computed before the
//! suspension point; the caller obtains a decision however it likes
//! (UI, network, AI) and re-enters through `GameAction::resume`. Declining
//! is equivalent to resolution proceeding with no additional event.
//! Timeouts and cancellation are caller concerns.

use core::sync::atomic::{AtomicU64, Ordering};

use crate::dice::DieRoll;
use crate::env::ReactionPrompt;
use crate::item::ResolvedItem;
use crate::types::{ActionResource, AdvantageTags, DamageType, EntityId};

static NEXT_TOKEN: AtomicU64 = AtomicU64::new(1);

/// Outcome of a resolve (or resume) call.
#[derive(Debug)]
pub enum Resolution {
    /// Resolution ran to completion.
    Complete(Vec<ResolvedItem>),
    /// Resolution suspended awaiting a reaction decision.
    Pending(Box<PendingReaction>),
}

impl Resolution {
    /// Unwrap a completed resolution's items; panics on `Pending`.
    ///
    /// Test convenience only.
    #[must_use]
    pub fn expect_complete(self) -> Vec<ResolvedItem> {
        match self {
            Resolution::Complete(items) => items,
            Resolution::Pending(pending) => {
                panic!("resolution suspended on {:?}", pending.prompt)
            }
        }
    }
}

/// A suspended resolution: the prompt for the controller plus the exact
/// state needed to resume at the suspension point.
#[derive(Debug)]
pub struct PendingReaction {
    /// Matches a resume call back to the action that suspended.
    pub token: u64,
    pub prompt: ReactionPrompt,
    pub(crate) continuation: Continuation,
}

impl PendingReaction {
    pub(crate) fn new(prompt: ReactionPrompt, continuation: Continuation) -> Box<Self> {
        Box::new(Self {
            token: NEXT_TOKEN.fetch_add(1, Ordering::Relaxed),
            prompt,
            continuation,
        })
    }
}

/// Where a suspended resolution picks back up.
#[derive(Clone, Debug)]
pub(crate) enum Continuation {
    Attack(AttackContinuation),
}

/// Everything an attack computed before the reaction pause: the roll, the
/// gathered advantage state, the AC snapshot, and the damage plan that has
/// not been rolled yet.
#[derive(Clone, Debug)]
pub(crate) struct AttackContinuation {
    pub source: EntityId,
    pub target: EntityId,
    pub weapon: Option<String>,
    pub attack_name: String,
    pub attack_roll: DieRoll,
    pub bonus_rolls: Vec<DieRoll>,
    pub advantage: AdvantageTags,
    pub advantage_mod: i8,
    pub target_ac: i64,
    pub cover_ac: i64,
    /// Damage expression to roll after the reaction settles.
    pub damage_expr: String,
    pub damage_type: DamageType,
    /// Sneak attack dice to roll on a hit, when eligible.
    pub sneak_attack_expr: Option<String>,
    /// Great-weapon-fighting rerolls of 1s and 2s apply to the damage.
    pub gwf_reroll: bool,
    pub economy: ActionResource,
    pub thrown: bool,
    pub second_hand: bool,
    pub ammo: Option<String>,
    /// Items emitted before the suspension (effect-hook output).
    pub early_items: Vec<ResolvedItem>,
    /// A hook already forced the attack to miss.
    pub force_miss: bool,
}
