//! Action protocol: eligibility, parameterization, resolution, application.
//!
//! Every combat action walks the same lifecycle:
//!
//! 1. **Build**: a sequence of typed parameter requests
//!    ([`build::ParamRequest`]) answered through a pure reducer
//!    ([`GameAction::supply`]) until the action is `Ready`.
//! 2. **Validate**: domain rules collect human-readable strings in
//!    `errors()`; they never raise. Structural defects (a missing mandatory
//!    parameter) are programmer errors and do.
//! 3. **Resolve**: pure computation over world reads plus dice; emits
//!    [`ResolvedItem`]s, or suspends on a reaction decision
//!    ([`reaction::Resolution::Pending`]).
//! 4. **Apply**: the item-kind-keyed registry ([`apply::ApplyRegistry`])
//!    routes each item to exactly one handler, which performs all world
//!    mutation.
//!
//! No entity HP or effect state changes during resolve; all mutation
//! happens in apply, exactly once per item.

pub mod apply;
pub mod attack;
pub mod build;
pub mod heal;
pub mod reaction;
pub mod spell;
pub mod support;
pub mod use_item;

pub use apply::ApplyRegistry;
pub use attack::{AttackAction, AttackOpts};
pub use build::{BuildState, ParamAnswer, ParamRequest, ParamSpec, TargetFilter, build_map};
pub use heal::{LayOnHandsAction, SecondWindAction};
pub use reaction::{PendingReaction, Resolution};
pub use spell::{Spell, SpellCastAction, SpellRegistry};
pub use support::{DisengageAction, DodgeAction, HelpAction, MoveAction};
pub use use_item::UseItemAction;

use crate::env::{Battle, Catalog, ReactionDecision};
use crate::error::ActionError;
use crate::item::ResolvedItem;
use crate::types::EntityId;

/// Immutable per-session services threaded through the protocol: the data
/// catalog and the spell behavior registry, both populated once at startup.
#[derive(Clone, Copy)]
pub struct Session<'a> {
    pub catalog: &'a dyn Catalog,
    pub spells: &'a SpellRegistry,
}

impl<'a> Session<'a> {
    #[must_use]
    pub fn new(catalog: &'a dyn Catalog, spells: &'a SpellRegistry) -> Self {
        Self { catalog, spells }
    }
}

/// Where an action currently sits in its lifecycle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ActionPhase {
    /// No parameters supplied yet.
    #[default]
    Unparameterized,
    /// Waiting on the numbered parameter request.
    AwaitingParam(u8),
    /// Fully parameterized; resolve may run.
    Ready,
    /// Resolution produced items not yet applied.
    Resolved,
    /// Items were applied; the action is terminal.
    Applied,
}

/// Bookkeeping every action embeds: collected validation failures, the
/// resolution output, and the lifecycle phase.
#[derive(Clone, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ActionState {
    pub errors: Vec<String>,
    pub result: Vec<ResolvedItem>,
    pub phase: ActionPhase,
}

impl ActionState {
    /// Record resolution output and advance the phase.
    pub(crate) fn resolved(&mut self, items: Vec<ResolvedItem>) -> Vec<ResolvedItem> {
        self.result = items.clone();
        self.phase = ActionPhase::Resolved;
        items
    }
}

/// The action/spell object model contract.
///
/// Implementations are plain data (all derive `Clone`); cloning snapshots
/// the parameter chain without sharing target/result state, which is what
/// the what-if probability queries rely on.
pub trait GameAction {
    /// Entity performing the action.
    fn source(&self) -> EntityId;

    /// Kind tag for dispatch and labels.
    fn kind(&self) -> ActionKind;

    /// Next parameter request, or `None` once the action is ready.
    fn next_request(&self, session: &Session<'_>, battle: &dyn Battle) -> Option<ParamRequest>;

    /// Pure reducer folding one request's answers into the chain.
    fn supply(&mut self, session: &Session<'_>, answers: Vec<ParamAnswer>)
    -> Result<(), ActionError>;

    /// Collect domain-rule violations into `errors()`. Never raises for
    /// rule violations.
    fn validate(&mut self, session: &Session<'_>, battle: &dyn Battle);

    /// Validation failures collected by the last `validate` call. Empty
    /// means valid.
    fn errors(&self) -> &[String];

    /// Compute the outcome. Reads the world and rolls dice; never mutates
    /// entity or effect state.
    fn resolve(
        &mut self,
        session: &Session<'_>,
        battle: &mut dyn Battle,
    ) -> Result<Resolution, ActionError>;

    /// Re-enter a suspended resolution with the controller's decision.
    ///
    /// Only actions that can suspend implement this; the default rejects
    /// the token.
    fn resume(
        &mut self,
        _session: &Session<'_>,
        _battle: &mut dyn Battle,
        pending: PendingReaction,
        _decision: ReactionDecision,
    ) -> Result<Resolution, ActionError> {
        Err(ActionError::TokenMismatch {
            token: pending.token,
        })
    }

    /// Items produced by the last successful resolution.
    fn result(&self) -> &[ResolvedItem];

    /// Lifecycle phase.
    fn phase(&self) -> ActionPhase;

    /// Mark the action applied (terminal). Called by the host after every
    /// item went through the apply registry.
    fn mark_applied(&mut self);
}

/// Tags for every action variant.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum ActionKind {
    Attack,
    TwoWeaponAttack,
    SpellCast,
    UseItem,
    Move,
    Dodge,
    Disengage,
    Help,
    LayOnHands,
    SecondWind,
}

/// Tagged union over every concrete action, for hosts that store mixed
/// action lists.
#[derive(Clone, Debug)]
pub enum Action {
    Attack(AttackAction),
    SpellCast(SpellCastAction),
    UseItem(UseItemAction),
    Move(MoveAction),
    Dodge(DodgeAction),
    Disengage(DisengageAction),
    Help(HelpAction),
    LayOnHands(LayOnHandsAction),
    SecondWind(SecondWindAction),
}

impl Action {
    /// View the variant through the protocol trait.
    pub fn as_game_action(&mut self) -> &mut dyn GameAction {
        match self {
            Action::Attack(a) => a,
            Action::SpellCast(a) => a,
            Action::UseItem(a) => a,
            Action::Move(a) => a,
            Action::Dodge(a) => a,
            Action::Disengage(a) => a,
            Action::Help(a) => a,
            Action::LayOnHands(a) => a,
            Action::SecondWind(a) => a,
        }
    }
}
