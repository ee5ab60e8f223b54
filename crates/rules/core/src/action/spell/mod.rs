//! Spell casting.
//!
//! The cast action's wizard first asks for a spell choice, then chains into
//! the chosen spell's own parameter sequence. Spell behavior lives behind
//! the [`Spell`] trait in a name-keyed [`SpellRegistry`] populated once at
//! startup; catalog data (level, casting time, range) stays declarative and
//! is loaded through the session's catalog.

mod bless;
mod cure_wounds;
mod firebolt;
mod sacred_flame;
mod shield;

pub use bless::{BlessEffect, BlessSpell};
pub use cure_wounds::CureWoundsSpell;
pub use firebolt::FireboltSpell;
pub use sacred_flame::SacredFlameSpell;
pub use shield::{ShieldEffect, ShieldSpell};

use std::collections::HashMap;

use super::build::{ParamAnswer, ParamRequest, ParamSpec};
use super::reaction::Resolution;
use super::{ActionKind, ActionPhase, ActionState, GameAction, Session};
use crate::env::{Battle, Entity};
use crate::error::{ActionError, CatalogError};
use crate::item::ResolvedItem;
use crate::types::{ActionResource, EntityId};

/// Behavior of one spell: its parameter steps, validation, and resolution.
///
/// Implementations are stateless; per-cast state lives on the
/// [`SpellCastAction`].
pub trait Spell: Send + Sync {
    /// Catalog key this behavior implements.
    fn key(&self) -> &'static str;

    /// Next parameter request for this spell's chain.
    fn next_request(
        &self,
        action: &SpellCastAction,
        session: &Session<'_>,
        battle: &dyn Battle,
    ) -> Option<ParamRequest>;

    /// Fold one answer batch into the cast.
    fn supply(
        &self,
        action: &mut SpellCastAction,
        answers: Vec<ParamAnswer>,
    ) -> Result<(), ActionError>;

    /// Domain-rule violations for this cast.
    fn validate(
        &self,
        action: &SpellCastAction,
        session: &Session<'_>,
        battle: &dyn Battle,
    ) -> Vec<String>;

    /// Compute the cast's outcome items.
    fn resolve(
        &self,
        action: &SpellCastAction,
        session: &Session<'_>,
        battle: &mut dyn Battle,
    ) -> Result<Vec<ResolvedItem>, ActionError>;
}

/// Name-keyed spell behavior table, populated once at startup.
#[derive(Default)]
pub struct SpellRegistry {
    spells: HashMap<&'static str, Box<dyn Spell>>,
}

impl SpellRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every built-in spell.
    #[must_use]
    pub fn standard() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(FireboltSpell));
        registry.register(Box::new(SacredFlameSpell));
        registry.register(Box::new(ShieldSpell));
        registry.register(Box::new(CureWoundsSpell));
        registry.register(Box::new(BlessSpell));
        registry
    }

    pub fn register(&mut self, spell: Box<dyn Spell>) {
        self.spells.insert(spell.key(), spell);
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&dyn Spell> {
        self.spells.get(key).map(Box::as_ref)
    }
}

/// Cantrip damage dice scale with caster level at 5, 11, and 17.
#[must_use]
pub(crate) fn cantrip_dice(caster_level: u8) -> u32 {
    let mut dice = 1;
    for threshold in [5, 11, 17] {
        if caster_level >= threshold {
            dice += 1;
        }
    }
    dice
}

/// A cast of one spell by one entity.
#[derive(Clone, Debug)]
pub struct SpellCastAction {
    source: EntityId,
    /// Catalog key of the chosen spell.
    pub spell: Option<String>,
    /// Slot level the spell is cast at; `0` for cantrips.
    pub at_level: u8,
    pub targets: Vec<EntityId>,
    pub(crate) state: ActionState,
}

impl SpellCastAction {
    #[must_use]
    pub fn new(source: EntityId) -> Self {
        Self {
            source,
            spell: None,
            at_level: 0,
            targets: Vec::new(),
            state: ActionState::default(),
        }
    }

    /// Static eligibility gate: the entity can cast something at all.
    #[must_use]
    pub fn can(battle: &dyn Battle, entity: EntityId) -> bool {
        battle.entity(entity).is_some_and(|e| e.has_spells())
    }

    /// Eligibility for one specific spell: the casting-time resource and,
    /// for leveled spells, a slot at that level.
    pub fn can_cast(
        battle: &dyn Battle,
        session: &Session<'_>,
        entity: EntityId,
        spell: &str,
        at_level: u8,
    ) -> Result<bool, CatalogError> {
        let details = session.catalog.load_spell(spell)?;
        if battle.resource_remaining(entity, details.casting_time.resource) == 0 {
            return Ok(false);
        }
        if details.level > 0 {
            let Some(caster) = battle.entity(entity) else {
                return Ok(false);
            };
            if caster.spell_slots_count(at_level.max(details.level)) == 0 {
                return Ok(false);
            }
        }
        Ok(true)
    }

    fn behavior<'a>(&self, session: &Session<'a>) -> Result<&'a dyn Spell, ActionError> {
        let name = self
            .spell
            .as_deref()
            .ok_or(ActionError::MissingParameter("spell"))?;
        session
            .spells
            .get(name)
            .ok_or_else(|| ActionError::Catalog(CatalogError::UnknownSpell(name.to_owned())))
    }

    /// Economy resource this cast consumes, from catalog data.
    pub fn economy(&self, session: &Session<'_>) -> Result<ActionResource, ActionError> {
        let name = self
            .spell
            .as_deref()
            .ok_or(ActionError::MissingParameter("spell"))?;
        Ok(session.catalog.load_spell(name)?.casting_time.resource)
    }
}

impl GameAction for SpellCastAction {
    fn source(&self) -> EntityId {
        self.source
    }

    fn kind(&self) -> ActionKind {
        ActionKind::SpellCast
    }

    fn next_request(&self, session: &Session<'_>, battle: &dyn Battle) -> Option<ParamRequest> {
        // The cast root first needs a spell choice, then chains into the
        // spell's own parameter sequence.
        if self.spell.is_none() {
            return Some(ParamRequest::single(ParamSpec::SelectSpell));
        }
        let behavior = self.behavior(session).ok()?;
        behavior.next_request(self, session, battle)
    }

    fn supply(
        &mut self,
        session: &Session<'_>,
        answers: Vec<ParamAnswer>,
    ) -> Result<(), ActionError> {
        let mut rest = Vec::new();
        for answer in answers {
            match answer {
                ParamAnswer::Spell { name, at_level } => {
                    // Fatal on unknown names: this is a data defect, not a
                    // recoverable selection.
                    session.catalog.load_spell(&name)?;
                    if session.spells.get(&name).is_none() {
                        return Err(ActionError::Catalog(CatalogError::UnknownSpell(name)));
                    }
                    self.spell = Some(name);
                    self.at_level = at_level;
                    self.state.phase = ActionPhase::AwaitingParam(1);
                }
                other => rest.push(other),
            }
        }
        if !rest.is_empty() {
            let behavior = self.behavior(session)?;
            behavior.supply(self, rest)?;
        }
        Ok(())
    }

    fn validate(&mut self, session: &Session<'_>, battle: &dyn Battle) {
        self.state.errors.clear();
        if self.spell.is_none() {
            self.state.errors.push("no spell selected".into());
            return;
        }
        match self.behavior(session) {
            Ok(behavior) => {
                self.state.errors = behavior.validate(self, session, battle);
            }
            Err(err) => self.state.errors.push(err.to_string()),
        }
    }

    fn errors(&self) -> &[String] {
        &self.state.errors
    }

    fn resolve(
        &mut self,
        session: &Session<'_>,
        battle: &mut dyn Battle,
    ) -> Result<Resolution, ActionError> {
        let behavior = self.behavior(session)?;
        let items = behavior.resolve(self, session, battle)?;
        Ok(Resolution::Complete(self.state.resolved(items)))
    }

    fn result(&self) -> &[ResolvedItem] {
        &self.state.result
    }

    fn phase(&self) -> ActionPhase {
        self.state.phase
    }

    fn mark_applied(&mut self) {
        self.state.phase = ActionPhase::Applied;
    }
}
