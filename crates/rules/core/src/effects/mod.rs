//! Dynamic effect and event-hook system.
//!
//! Effects are capability bundles attached to entities: a typed [`Effect`]
//! trait (every hook method has a no-op default, so an effect implements
//! only what it changes) plus a per-entity [`EffectRegistry`] keyed by
//! [`HookKind`]. Only explicitly registered hooks fire, in registration
//! order, and each hook kind documents its combinator: additive for bonus
//! hooks, last-registration-wins for overrides, list-union for advantage
//! tags.
//!
//! Expiration is lazy: an effect whose expiry has passed is treated as
//! absent by the next query; nothing runs in the background.

mod effect;
mod hook;
mod registry;

pub use effect::{
    AttackRollInfo, Effect, EffectId, EffectLifecycle, ReactionResponse,
};
pub use hook::HookKind;
pub use registry::{CastedRef, EffectRegistry};
