//! Sacred flame: save-based cantrip, no attack roll.

use super::{Session, Spell, SpellCastAction, cantrip_dice};
use crate::action::build::{ParamAnswer, ParamRequest, ParamSpec, TargetFilter};
use crate::action::{ActionPhase, GameAction};
use crate::dice::Roller;
use crate::env::{Battle, Entity};
use crate::error::ActionError;
use crate::item::{ResolvedItem, SaveOutcome, SpellRecord};
use crate::types::{Ability, ActionResource, AdvantageTags, DamageType};

#[derive(Clone, Copy, Debug)]
pub struct SacredFlameSpell;

impl Spell for SacredFlameSpell {
    fn key(&self) -> &'static str {
        "sacred_flame"
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
                filters: vec![TargetFilter::Enemies],
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
        let Some(&target) = action.targets.first() else {
            errors.push("a target is required".into());
            return errors;
        };
        if battle.entity(target).is_none_or(|t| t.dead()) {
            errors.push("target is not a living combatant".into());
        }
        if let (Ok(details), Some(map)) = (
            session.catalog.load_spell(self.key()),
            battle.map_for(action.source()),
        ) && map.distance(action.source(), target) > details.range
        {
            errors.push("target is out of range".into());
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
        battle: &mut dyn Battle,
    ) -> Result<Vec<ResolvedItem>, ActionError> {
        let source = action.source();
        let target = *action
            .targets
            .first()
            .ok_or(ActionError::MissingParameter("target"))?;

        let caster = battle
            .entity(source)
            .ok_or(ActionError::UnknownEntity(source))?;
        let dc = caster.spell_save_dc();
        let dice = cantrip_dice(caster.level());

        let (save_roll, save_total) = battle
            .save_throw_for(target, Ability::Dexterity)
            .ok_or(ActionError::UnknownEntity(target))?;
        let save = SaveOutcome {
            ability: Ability::Dexterity,
            roll: save_roll,
            total: save_total,
            dc,
        };
        let save_failed = save_total < dc;

        let record = SpellRecord {
            source,
            target,
            spell: self.key().to_owned(),
            attack_roll: None,
            save: Some(save),
            advantage: AdvantageTags::new(),
            cover_ac: 0,
            at_level: 0,
            economy: ActionResource::Action,
        };

        if save_failed {
            let damage = Roller::new(&format!("{dice}d8"))
                .description("sacred flame damage")
                .roll(battle.dice());
            Ok(vec![ResolvedItem::SpellDamage {
                spell: record,
                damage,
                damage_type: DamageType::Radiant,
            }])
        } else {
            Ok(vec![ResolvedItem::SpellMiss { spell: record }])
        }
    }
}
