//! Reaction decision contract.
//!
//! Resolution occasionally needs a real-time choice from whoever controls
//! an entity ("cast Shield against this hit?"). A controller may answer
//! synchronously (AI), or defer, in which case resolution suspends and the
//! caller resumes it with the decision (the two-phase protocol in
//! `action::reaction`). An entity with no controller at all never gets the
//! choice: resolution degrades to "no reaction taken" rather than failing.

use crate::types::EntityId;

/// What a reaction decision is being requested for.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ReactionTrigger {
    /// An incoming attack the entity could blunt by casting Shield.
    ShieldSpell {
        attacker: EntityId,
        attack_total: i64,
        effective_ac: i64,
    },
}

/// A reaction choice presented to an entity's controller.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ReactionPrompt {
    /// Entity whose reaction is being requested.
    pub entity: EntityId,
    pub trigger: ReactionTrigger,
}

/// Answer to a reaction prompt.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ReactionDecision {
    /// Spend the reaction and take the offered action.
    Take,
    /// Let resolution proceed with no additional event.
    Decline,
}

/// Decides reactions for the entities it controls.
pub trait Controller {
    /// Answer a reaction prompt immediately, or return `None` to defer the
    /// decision to the caller through the suspend/resume protocol.
    fn decide_reaction(&self, prompt: &ReactionPrompt) -> Option<ReactionDecision>;
}
