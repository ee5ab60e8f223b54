//! Turn-based tabletop combat rules engine.
//!
//! `rules-core` converts a chosen action (attack, spell, item use) into
//! concrete, auditable state changes under a fixed rules grammar:
//! advantage/disadvantage, cover, saving throws, concentration, and
//! resource consumption. Four subsystems carry the work:
//!
//! - [`dice`]: expression parsing, weighted outcomes, exact expectation
//!   and probability formulas, session-scoped dice state
//! - [`effects`]: per-entity hook registries letting independently
//!   authored abilities compose at resolution time
//! - [`combat`]: advantage gathering, cover, effective AC, hit gates
//! - [`action`]: the three-phase protocol of parameterize, resolve
//!   (pure, suspendable on reaction decisions), apply (all mutation)
//!
//! Collaborators the engine consumes but does not implement (the battle
//! scheduler, map geometry, the data catalog, entities) are contracts in
//! [`env`]. Reference implementations live in the `rules-content` crate.

pub mod action;
pub mod combat;
pub mod dice;
pub mod effects;
pub mod env;
pub mod error;
pub mod item;
pub mod types;

pub use action::{
    Action, ActionKind, ActionPhase, ApplyRegistry, AttackAction, AttackOpts, BuildState,
    DisengageAction,
    DodgeAction, GameAction, HelpAction, LayOnHandsAction, MoveAction, ParamAnswer, ParamRequest,
    ParamSpec, PendingReaction, Resolution, SecondWindAction, Session, Spell, SpellCastAction,
    SpellRegistry, TargetFilter, UseItemAction, build_map,
};
pub use dice::{DiceState, DieExpression, DieRoll, RollEntry, RollSum, Roller, parse};
pub use effects::{Effect, EffectId, EffectRegistry, HookKind};
pub use env::{
    Battle, BattleMap, Catalog, CastingTime, Controller, CoverObject, Entity, EntityState,
    ItemDetails, ReactionDecision, ReactionPrompt, ReactionTrigger, SpellDetails, WeaponDetails,
    WeaponKind, WeaponProperties,
};
pub use error::{ActionError, CatalogError, EngineError, ErrorSeverity};
pub use item::{AttackRecord, HealCost, ItemKind, ResolvedItem, SaveOutcome, SpellRecord};
pub use types::{
    Ability, ActionResource, AdvantageReason, AdvantageTags, ClassFeature, CoverType,
    CreatureSize, DamageType, EntityId, GameTime, Position,
};
