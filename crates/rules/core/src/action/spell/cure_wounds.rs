//! Cure wounds: touch-range slot-consuming heal.

use super::{Session, Spell, SpellCastAction};
use crate::action::build::{ParamAnswer, ParamRequest, ParamSpec, TargetFilter};
use crate::action::{ActionPhase, GameAction};
use crate::dice::Roller;
use crate::env::{Battle, Entity};
use crate::error::ActionError;
use crate::item::{HealCost, ResolvedItem};
use crate::types::ActionResource;

#[derive(Clone, Copy, Debug)]
pub struct CureWoundsSpell;

impl Spell for CureWoundsSpell {
    fn key(&self) -> &'static str {
        "cure_wounds"
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
                num: 1,
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
                ParamAnswer::Target(target) => action.targets = vec![target],
                _ => return Err(ActionError::ParameterType { expected: "target" }),
            }
        }
        action.state.phase = ActionPhase::Ready;
        Ok(())
    }

    fn validate(
        &self,
        action: &SpellCastAction,
        session: &Session<'_>,
        battle: &dyn Battle,
    ) -> Vec<String> {
        let mut errors = Vec::new();
        if action.targets.is_empty() {
            errors.push("a target is required".into());
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
        if let (Some(&target), Ok(details), Some(map)) = (
            action.targets.first(),
            session.catalog.load_spell(self.key()),
            battle.map_for(action.source()),
        ) && map.distance(action.source(), target) > details.range
        {
            errors.push("target is out of reach".into());
        }
        errors
    }

    fn resolve(
        &self,
        action: &SpellCastAction,
        _session: &Session<'_>,
        battle: &mut dyn Battle,
    ) -> Result<Vec<ResolvedItem>, ActionError> {
        let source = action.source();
        let target = *action
            .targets
            .first()
            .ok_or(ActionError::MissingParameter("target"))?;
        let at_level = action.at_level.max(1);

        let caster = battle
            .entity(source)
            .ok_or(ActionError::UnknownEntity(source))?;
        let spell_mod = caster
            .spellcasting_ability()
            .map_or(0, |a| caster.ability_modifier(a));

        // One d8 per slot level, plus the spellcasting modifier.
        let expr = if spell_mod >= 0 {
            format!("{at_level}d8+{spell_mod}")
        } else {
            format!("{at_level}d8{spell_mod}")
        };
        let healing = Roller::new(&expr)
            .description("cure wounds")
            .roll(battle.dice());

        Ok(vec![ResolvedItem::Heal {
            source,
            target,
            healing,
            cost: HealCost::SpellSlot { level: at_level },
            economy: ActionResource::Action,
        }])
    }
}
