//! Shield: reaction spell, +5 AC until the caster's next turn starts.

use super::{Session, Spell, SpellCastAction};
use crate::action::GameAction;
use crate::action::build::{ParamAnswer, ParamRequest};
use crate::effects::{Effect, EffectLifecycle};
use crate::env::{Battle, Entity};
use crate::error::ActionError;
use crate::item::ResolvedItem;
use crate::types::{ActionResource, EntityId, GameTime};

/// The +5 AC buff Shield leaves behind. Self-dismisses when the owner's
/// next turn starts.
#[derive(Clone, Copy, Debug)]
pub struct ShieldEffect;

impl Effect for ShieldEffect {
    fn name(&self) -> &str {
        "shield"
    }

    fn ac_bonus(&self, _owner: EntityId) -> i64 {
        5
    }

    fn start_of_turn(&self, _owner: EntityId, _time: GameTime) -> EffectLifecycle {
        EffectLifecycle::Dismiss
    }
}

#[derive(Clone, Copy, Debug)]
pub struct ShieldSpell;

impl Spell for ShieldSpell {
    fn key(&self) -> &'static str {
        "shield"
    }

    fn next_request(
        &self,
        _action: &SpellCastAction,
        _session: &Session<'_>,
        _battle: &dyn Battle,
    ) -> Option<ParamRequest> {
        // Self-targeted: no parameters beyond the spell choice.
        None
    }

    fn supply(
        &self,
        _action: &mut SpellCastAction,
        _answers: Vec<ParamAnswer>,
    ) -> Result<(), ActionError> {
        Ok(())
    }

    fn validate(
        &self,
        action: &SpellCastAction,
        _session: &Session<'_>,
        battle: &dyn Battle,
    ) -> Vec<String> {
        let mut errors = Vec::new();
        if battle.resource_remaining(action.source(), ActionResource::Reaction) == 0 {
            errors.push("no reaction remaining".into());
        }
        if battle
            .entity(action.source())
            .is_none_or(|e| e.spell_slots_count(1) == 0)
        {
            errors.push("no level 1 spell slot remaining".into());
        }
        errors
    }

    fn resolve(
        &self,
        action: &SpellCastAction,
        _session: &Session<'_>,
        _battle: &mut dyn Battle,
    ) -> Result<Vec<ResolvedItem>, ActionError> {
        // The interesting path arrives here through the attack reaction
        // suspension; a direct cast emits the same item.
        Ok(vec![ResolvedItem::Shield {
            source: action.source(),
        }])
    }
}
