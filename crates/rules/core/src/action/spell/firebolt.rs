//! Fire bolt: ranged spell attack cantrip.

use super::{Session, Spell, SpellCastAction, cantrip_dice};
use crate::action::build::{ParamAnswer, ParamRequest, ParamSpec, TargetFilter};
use crate::action::{ActionPhase, GameAction};
use crate::combat::{attack_hits, effective_ac, target_advantage_condition};
use crate::dice::Roller;
use crate::env::{Battle, Entity};
use crate::error::ActionError;
use crate::item::{ResolvedItem, SpellRecord};
use crate::types::{ActionResource, AdvantageTags, DamageType};

#[derive(Clone, Copy, Debug)]
pub struct FireboltSpell;

impl Spell for FireboltSpell {
    fn key(&self) -> &'static str {
        "firebolt"
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
        let attack_mod = caster.spell_attack_mod();
        let dice = cantrip_dice(caster.level());

        let (advantage_mod, advantage) =
            target_advantage_condition(battle, source, target, None, false, AdvantageTags::new());

        let attack_roll = Roller::d20(attack_mod)
            .advantage(advantage_mod > 0)
            .disadvantage(advantage_mod < 0)
            .description("firebolt attack")
            .roll(battle.dice());

        let (target_ac, cover_ac) = effective_ac(battle, source, target);
        let hit = attack_hits(&attack_roll, attack_roll.result(), target_ac);

        let record = SpellRecord {
            source,
            target,
            spell: self.key().to_owned(),
            attack_roll: Some(attack_roll.clone()),
            save: None,
            advantage,
            cover_ac,
            at_level: 0,
            economy: ActionResource::Action,
        };

        if hit {
            let damage = Roller::new(&format!("{dice}d10"))
                .crit(attack_roll.nat_20())
                .description("firebolt damage")
                .roll(battle.dice());
            Ok(vec![ResolvedItem::SpellDamage {
                spell: record,
                damage,
                damage_type: DamageType::Fire,
            }])
        } else {
            Ok(vec![ResolvedItem::SpellMiss { spell: record }])
        }
    }
}
