//! The effect capability trait.

use core::fmt;
use core::sync::atomic::{AtomicU64, Ordering};

use crate::item::ResolvedItem;
use crate::types::{Ability, AdvantageTags, DamageType, EntityId, GameTime};

/// Process-unique identifier for an attached effect instance.
///
/// Identifiers are allocated from a shared counter so that a caster's
/// non-owning `casted_effects` references stay unambiguous across entities.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EffectId(u64);

static NEXT_EFFECT_ID: AtomicU64 = AtomicU64::new(1);

impl EffectId {
    /// Allocate a fresh identifier.
    #[must_use]
    pub fn fresh() -> Self {
        Self(NEXT_EFFECT_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for EffectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "effect#{}", self.0)
    }
}

/// Whether an effect stays attached after a lifecycle hook fires.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EffectLifecycle {
    Retain,
    Dismiss,
}

/// What an attack-roll listener observed, frozen pre-finalization.
#[derive(Clone, Debug, PartialEq)]
pub struct AttackRollInfo {
    pub attacker: EntityId,
    pub target: EntityId,
    /// Attack total including bonus dice.
    pub attack_total: i64,
    /// Target AC including cover at the moment of the roll.
    pub effective_ac: i64,
}

/// Response from an attack-roll listener.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ReactionResponse {
    /// Force the attack to miss regardless of the roll (Shield and kin).
    pub force_miss: bool,
    /// Items to append to the attack's resolution output.
    pub items: Vec<ResolvedItem>,
}

impl ReactionResponse {
    /// Merge another response in: items concatenate, any force-miss wins.
    pub fn merge(&mut self, other: ReactionResponse) {
        self.force_miss |= other.force_miss;
        self.items.extend(other.items);
    }
}

/// An arbitrary capability bundle attached to an entity.
///
/// Every hook method has a no-op default; an effect implements only the
/// hooks it registers for. The registry consults handlers in registration
/// order with the combinators documented on [`super::HookKind`].
pub trait Effect: fmt::Debug + Send + Sync {
    /// Stable name used for `has_effect` queries and audit logs.
    fn name(&self) -> &str;

    /// Replace the owner's armor class outright.
    fn ac_override(&self, _owner: EntityId) -> Option<i64> {
        None
    }

    /// Additive armor class contribution.
    fn ac_bonus(&self, _owner: EntityId) -> i64 {
        0
    }

    /// Replace the owner's movement speed (feet).
    fn speed_override(&self, _owner: EntityId, _base: u32) -> Option<u32> {
        None
    }

    /// Replace the owner's damage resistance list.
    fn resistance_override(&self, _owner: EntityId) -> Option<Vec<DamageType>> {
        None
    }

    /// Advantage tags granted to attacks made against the owner.
    fn targeted_advantage(&self, _owner: EntityId, _attacker: EntityId) -> AdvantageTags {
        AdvantageTags::new()
    }

    /// Advantage tags granted to the owner's own attacks.
    fn attack_advantage(&self, _owner: EntityId, _target: EntityId) -> AdvantageTags {
        AdvantageTags::new()
    }

    /// Transform the owner's saving throw total.
    fn saving_throw_override(
        &self,
        _owner: EntityId,
        _ability: Ability,
        _roll: i64,
    ) -> Option<i64> {
        None
    }

    /// Replace the owner's hit point maximum.
    fn hit_point_max_override(&self, _owner: EntityId, _base: i64) -> Option<i64> {
        None
    }

    /// The owner's turn started.
    fn start_of_turn(&self, _owner: EntityId, _time: GameTime) -> EffectLifecycle {
        EffectLifecycle::Retain
    }

    /// The owner's turn ended.
    fn end_of_turn(&self, _owner: EntityId, _time: GameTime) -> EffectLifecycle {
        EffectLifecycle::Retain
    }

    /// A short rest completed.
    fn short_rest(&self, _owner: EntityId, _time: GameTime) -> EffectLifecycle {
        EffectLifecycle::Retain
    }

    /// A long rest completed.
    fn long_rest(&self, _owner: EntityId, _time: GameTime) -> EffectLifecycle {
        EffectLifecycle::Retain
    }

    /// An attack roll involving the owner was made and not yet finalized.
    fn after_attack_roll(&self, _owner: EntityId, _info: &AttackRollInfo) -> ReactionResponse {
        ReactionResponse::default()
    }
}
