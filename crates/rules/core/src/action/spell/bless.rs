//! Bless: concentration buff adding a d4 to up to three allies' attack
//! rolls.

use super::{Session, Spell, SpellCastAction};
use crate::action::build::{ParamAnswer, ParamRequest, ParamSpec, TargetFilter};
use crate::action::{ActionPhase, GameAction};
use crate::effects::Effect;
use crate::env::{Battle, Entity};
use crate::error::ActionError;
use crate::item::ResolvedItem;
use crate::types::{ActionResource, EntityId};

/// Marker effect attack resolution checks by name: a blessed attacker adds
/// a d4 to the attack total.
#[derive(Clone, Copy, Debug)]
pub struct BlessEffect;

impl Effect for BlessEffect {
    fn name(&self) -> &str {
        "bless"
    }
}

#[derive(Clone, Copy, Debug)]
pub struct BlessSpell;

impl Spell for BlessSpell {
    fn key(&self) -> &'static str {
        "bless"
    }

    fn next_request(
        &self,
        action: &SpellCastAction,
        session: &Session<'_>,
        _battle: &dyn Battle,
    ) -> Option<ParamRequest> {
        if action.targets.is_empty() {
            let range = session
                .catalog
                .load_spell(self.key())
                .ok()
                .map(|details| details.range);
            return Some(ParamRequest::single(ParamSpec::SelectTarget {
                num: 3,
                range,
                filters: vec![TargetFilter::SelfTarget, TargetFilter::Allies],
            }));
        }
        None
    }

    fn supply(
        &self,
        action: &mut SpellCastAction,
        answers: Vec<ParamAnswer>,
    ) -> Result<(), ActionError> {
        for answer in answers {
            match answer {
                ParamAnswer::Target(target) => action.targets.push(target),
                ParamAnswer::Targets(targets) => action.targets.extend(targets),
                _ => return Err(ActionError::ParameterType { expected: "targets" }),
            }
        }
        action.state.phase = ActionPhase::Ready;
        Ok(())
    }

    fn validate(
        &self,
        action: &SpellCastAction,
        _session: &Session<'_>,
        battle: &dyn Battle,
    ) -> Vec<String> {
        let mut errors = Vec::new();
        if action.targets.is_empty() {
            errors.push("at least one target is required".into());
        }
        if action.targets.len() > 3 {
            errors.push("bless affects at most three creatures".into());
        }
        let at_level = action.at_level.max(1);
        if battle
            .entity(action.source())
            .is_none_or(|e| e.spell_slots_count(at_level) == 0)
        {
            errors.push(format!("no level {at_level} spell slot remaining"));
        }
        if battle.resource_remaining(action.source(), ActionResource::Action) == 0 {
            errors.push("no action remaining".into());
        }
        errors
    }

    fn resolve(
        &self,
        action: &SpellCastAction,
        _session: &Session<'_>,
        _battle: &mut dyn Battle,
    ) -> Result<Vec<ResolvedItem>, ActionError> {
        let targets: Vec<EntityId> = action.targets.clone();
        if targets.is_empty() {
            return Err(ActionError::MissingParameter("target"));
        }
        Ok(vec![ResolvedItem::Bless {
            source: action.source(),
            targets,
            at_level: action.at_level.max(1),
        }])
    }
}
