//! Data-driven content and reference collaborators for `rules-core`.
//!
//! This crate houses the declarative catalogs (weapons, spells,
//! consumables, RON) with their loaders, plus reference implementations of
//! the engine's collaborator contracts:
//! - [`RonCatalog`]: the `Catalog` contract over embedded or host RON data
//! - [`Combatant`]: the `Entity` contract over plain base values
//! - [`SimpleBattle`]/[`GridMap`]: the `Battle`/`BattleMap` contracts with
//!   initiative, turn hooks, and a flat cover-aware grid
//!
//! Content is consumed through the core's traits and never leaks into the
//! core itself; integration tests for the whole engine live here because
//! this is the first crate with every contract implemented.

mod battle;
mod catalog;
mod combatant;

pub use battle::{CoverBlock, DeferController, GridMap, ScriptedController, SimpleBattle};
pub use catalog::RonCatalog;
pub use combatant::{AbilityScores, Combatant};
