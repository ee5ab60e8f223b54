//! Weapon attacks: melee, ranged, thrown, and off-hand.

use tracing::debug;

use super::build::{ParamAnswer, ParamRequest, ParamSpec, TargetFilter};
use super::reaction::{AttackContinuation, Continuation, PendingReaction, Resolution};
use super::{ActionKind, ActionPhase, ActionState, GameAction, Session};
use crate::combat::{attack_hits, effective_ac, shield_reaction_applicable, target_advantage_condition};
use crate::dice::{DieRoll, Roller, expected_value, parse, prob_at_least};
use crate::effects::{AttackRollInfo, HookKind, ReactionResponse};
use crate::env::{
    Battle, Entity, ReactionDecision, ReactionPrompt, ReactionTrigger, WeaponDetails,
    WeaponKind, WeaponProperties,
};
use crate::error::ActionError;
use crate::item::{AttackRecord, ResolvedItem};
use crate::types::{ActionResource, AdvantageTags, ClassFeature, EntityId};

/// Eligibility context for [`AttackAction::can`].
#[derive(Clone, Copy, Debug, Default)]
pub struct AttackOpts {
    pub as_bonus_action: bool,
    pub opportunity_attack: bool,
}

/// Damage dice string for a weapon in this entity's hands.
///
/// Ability modifier is capped at zero for an off-hand attack without the
/// two-weapon fighting style; versatile weapons use their two-handed dice
/// when the off hand is free; the dueling style adds +2 to one-handed
/// melee damage.
#[must_use]
pub fn damage_modifier(entity: &dyn Entity, weapon: &WeaponDetails, second_hand: bool) -> String {
    let mut damage_mod = entity.attack_ability_mod(weapon);

    if second_hand && !entity.class_feature(ClassFeature::TwoWeaponFighting) {
        damage_mod = damage_mod.min(0);
    }

    let dice = if weapon.properties.contains(WeaponProperties::VERSATILE) && entity.off_hand_free()
    {
        weapon.damage_2.as_deref().unwrap_or(&weapon.damage)
    } else {
        &weapon.damage
    };

    if entity.class_feature(ClassFeature::Dueling)
        && weapon.kind == WeaponKind::MeleeAttack
        && entity.off_hand_free()
    {
        damage_mod += 2;
    }

    if damage_mod >= 0 {
        format!("{dice}+{damage_mod}")
    } else {
        format!("{dice}{damage_mod}")
    }
}

/// A weapon attack against one target.
#[derive(Clone, Debug)]
pub struct AttackAction {
    source: EntityId,
    pub target: Option<EntityId>,
    /// Catalog key of the weapon being used.
    pub using: Option<String>,
    pub thrown: bool,
    pub as_reaction: bool,
    pub as_bonus_action: bool,
    second_hand: bool,
    /// Net advantage modifier gathered by the last resolve.
    pub advantage_mod: i8,
    /// The d20 outcome of the last resolve.
    pub attack_roll: Option<DieRoll>,
    state: ActionState,
}

impl AttackAction {
    #[must_use]
    pub fn new(source: EntityId) -> Self {
        Self {
            source,
            target: None,
            using: None,
            thrown: false,
            as_reaction: false,
            as_bonus_action: false,
            second_hand: false,
            advantage_mod: 0,
            attack_roll: None,
            state: ActionState::default(),
        }
    }

    /// Off-hand attack with the second light weapon (bonus action).
    #[must_use]
    pub fn second_hand(source: EntityId) -> Self {
        let mut action = Self::new(source);
        action.second_hand = true;
        action.as_bonus_action = true;
        action
    }

    /// Opportunity attack (reaction).
    #[must_use]
    pub fn opportunity(source: EntityId) -> Self {
        let mut action = Self::new(source);
        action.as_reaction = true;
        action
    }

    /// Static eligibility gate. Never mutates.
    #[must_use]
    pub fn can(battle: &dyn Battle, entity: EntityId, opts: AttackOpts) -> bool {
        if opts.as_bonus_action {
            return battle.resource_remaining(entity, ActionResource::BonusAction) > 0;
        }
        if opts.opportunity_attack {
            return battle.resource_remaining(entity, ActionResource::Reaction) > 0;
        }
        battle.resource_remaining(entity, ActionResource::Action) > 0
    }

    /// Eligibility for the off-hand attack: a light first-hand weapon was
    /// used this turn and a bonus action remains.
    #[must_use]
    pub fn can_second_hand(battle: &dyn Battle, entity: EntityId) -> bool {
        battle.resource_remaining(entity, ActionResource::BonusAction) > 0
            && battle
                .entity_state_for(entity)
                .is_some_and(|s| s.two_weapon.is_some())
    }

    fn economy(&self) -> ActionResource {
        if self.as_reaction {
            ActionResource::Reaction
        } else if self.as_bonus_action || self.second_hand {
            ActionResource::BonusAction
        } else {
            ActionResource::Action
        }
    }

    /// Probability the attack hits the current target, without consuming
    /// rng or mutating this action. What-if query for AI planning.
    pub fn compute_hit_probability(
        &self,
        session: &Session<'_>,
        battle: &dyn Battle,
    ) -> Result<f64, ActionError> {
        let probe = self.clone();
        let target = probe.target.ok_or(ActionError::MissingParameter("target"))?;
        let using = probe.using.ok_or(ActionError::MissingParameter("using"))?;
        let weapon = session.catalog.load_weapon(&using)?;

        let attack_mod = battle
            .entity(self.source)
            .map_or(0, |e| e.attack_roll_mod(&weapon));
        let (advantage_mod, _) = target_advantage_condition(
            battle,
            self.source,
            target,
            Some(&weapon),
            probe.thrown,
            AdvantageTags::new(),
        );
        let (target_ac, _) = effective_ac(battle, self.source, target);

        Ok(prob_at_least(
            20,
            attack_mod,
            target_ac,
            advantage_mod > 0,
            advantage_mod < 0,
        ))
    }

    /// Expected damage on a hit. What-if query for AI planning.
    pub fn avg_damage(
        &self,
        session: &Session<'_>,
        battle: &dyn Battle,
    ) -> Result<f64, ActionError> {
        let using = self
            .using
            .clone()
            .ok_or(ActionError::MissingParameter("using"))?;
        let weapon = session.catalog.load_weapon(&using)?;
        let expr = battle
            .entity(self.source)
            .map_or_else(|| weapon.damage.clone(), |e| damage_modifier(e, &weapon, self.second_hand));
        Ok(expected_value(&parse(&expr), false, false, false))
    }

    /// Roll damage and settle hit or miss. Runs after any reaction has
    /// been decided.
    fn finalize(
        continuation: AttackContinuation,
        battle: &mut dyn Battle,
    ) -> Vec<ResolvedItem> {
        let crit = continuation.attack_roll.nat_20();

        let mut damage = Roller::new(&continuation.damage_expr)
            .crit(crit)
            .description("attack damage")
            .roll(battle.dice());
        if continuation.gwf_reroll {
            damage = damage.reroll_values(&[1, 2], battle.dice());
        }

        let sneak_attack = continuation.sneak_attack_expr.as_ref().map(|expr| {
            Roller::new(expr)
                .crit(crit)
                .description("sneak attack")
                .roll(battle.dice())
        });

        let attack_total = continuation.attack_roll.result()
            + continuation
                .bonus_rolls
                .iter()
                .map(DieRoll::result)
                .sum::<i64>();
        let hit = !continuation.force_miss
            && attack_hits(
                &continuation.attack_roll,
                attack_total,
                continuation.target_ac,
            );

        let record = AttackRecord {
            source: continuation.source,
            target: continuation.target,
            attack_name: continuation.attack_name,
            weapon: continuation.weapon,
            attack_roll: Some(continuation.attack_roll),
            bonus_rolls: continuation.bonus_rolls,
            advantage: continuation.advantage,
            target_ac: continuation.target_ac,
            cover_ac: continuation.cover_ac,
            economy: continuation.economy,
            thrown: continuation.thrown,
            second_hand: continuation.second_hand,
            ammo: continuation.ammo,
        };

        debug!(
            source = %record.source,
            target = %record.target,
            attack = %record.attack_name,
            total = attack_total,
            ac = record.target_ac,
            hit,
            "attack resolved"
        );

        let mut items = continuation.early_items;
        if hit {
            items.push(ResolvedItem::Damage {
                attack: record,
                damage,
                sneak_attack,
                damage_type: continuation.damage_type,
            });
        } else {
            items.push(ResolvedItem::Miss { attack: record });
        }
        items
    }
}

impl GameAction for AttackAction {
    fn source(&self) -> EntityId {
        self.source
    }

    fn kind(&self) -> ActionKind {
        if self.second_hand {
            ActionKind::TwoWeaponAttack
        } else {
            ActionKind::Attack
        }
    }

    fn next_request(&self, session: &Session<'_>, _battle: &dyn Battle) -> Option<ParamRequest> {
        let Some(using) = &self.using else {
            return Some(ParamRequest::single(ParamSpec::SelectWeapon));
        };
        if self.target.is_none() {
            let range = session
                .catalog
                .load_weapon(using)
                .ok()
                .map(|w| w.max_range(self.thrown));
            return Some(ParamRequest::single(ParamSpec::SelectTarget {
                num: 1,
                range,
                filters: vec![TargetFilter::Enemies],
            }));
        }
        None
    }

    fn supply(
        &mut self,
        _session: &Session<'_>,
        answers: Vec<ParamAnswer>,
    ) -> Result<(), ActionError> {
        for answer in answers {
            match answer {
                ParamAnswer::Weapon(weapon) => self.using = Some(weapon),
                ParamAnswer::Target(target) => self.target = Some(target),
                _ => return Err(ActionError::ParameterType { expected: "weapon or target" }),
            }
        }
        self.state.phase = match (&self.using, self.target) {
            (Some(_), Some(_)) => ActionPhase::Ready,
            (Some(_), None) => ActionPhase::AwaitingParam(1),
            _ => ActionPhase::AwaitingParam(0),
        };
        Ok(())
    }

    fn validate(&mut self, session: &Session<'_>, battle: &dyn Battle) {
        self.state.errors.clear();

        let Some(target) = self.target else {
            self.state.errors.push("a target is required".into());
            return;
        };
        let Some(target_entity) = battle.entity(target) else {
            self.state.errors.push("target is not in this battle".into());
            return;
        };
        if target_entity.dead() {
            self.state.errors.push("target is already dead".into());
        }

        if battle.resource_remaining(self.source, self.economy()) == 0 {
            self.state
                .errors
                .push(format!("no {} remaining", self.economy()));
        }

        if let (Some(using), Some(map)) = (&self.using, battle.map_for(self.source))
            && let Ok(weapon) = session.catalog.load_weapon(using)
            && map.distance(self.source, target) > weapon.max_range(self.thrown)
        {
            self.state.errors.push("target is out of range".into());
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
        let target = self.target.ok_or(ActionError::MissingParameter("target"))?;
        let using = self
            .using
            .clone()
            .ok_or(ActionError::MissingParameter("using"))?;
        let weapon = session.catalog.load_weapon(&using)?;
        let now = battle.game_time();

        // Snapshot source-entity scalars before rolling (the dice borrow
        // the battle mutably).
        let source_entity = battle
            .entity(self.source)
            .ok_or(ActionError::MissingParameter("source"))?;
        let lucky = source_entity.class_feature(ClassFeature::Lucky);
        let attack_mod = source_entity.attack_roll_mod(&weapon);
        let damage_expr = damage_modifier(source_entity, &weapon, self.second_hand);
        let has_bless = source_entity.has_effect("bless", now);
        let sneak_dice = source_entity.sneak_attack_dice();
        let has_sneak = source_entity.class_feature(ClassFeature::SneakAttack);
        let gwf_reroll = source_entity.class_feature(ClassFeature::GreatWeaponFighting)
            && (weapon.properties.contains(WeaponProperties::TWO_HANDED)
                || (weapon.properties.contains(WeaponProperties::VERSATILE)
                    && source_entity.off_hand_free()));

        let (advantage_mod, advantage) = target_advantage_condition(
            battle,
            self.source,
            target,
            Some(&weapon),
            self.thrown,
            AdvantageTags::new(),
        );
        self.advantage_mod = advantage_mod;

        let attack_roll = Roller::d20(attack_mod)
            .advantage(advantage_mod > 0)
            .disadvantage(advantage_mod < 0)
            .description("attack")
            .roll_with_lucky(lucky, battle.dice());
        self.attack_roll = Some(attack_roll.clone());

        let mut bonus_rolls = Vec::new();
        if has_bless {
            bonus_rolls.push(Roller::new("1d4").description("bless").roll(battle.dice()));
        }

        let (target_ac, cover_ac) = effective_ac(battle, self.source, target);
        let attack_total =
            attack_roll.result() + bonus_rolls.iter().map(DieRoll::result).sum::<i64>();

        // Effect-hook pass over both sides before the hit is finalized.
        let info = AttackRollInfo {
            attacker: self.source,
            target,
            attack_total,
            effective_ac: target_ac,
        };
        let mut hooks = ReactionResponse::default();
        if let Some(source_entity) = battle.entity(self.source) {
            hooks.merge(source_entity.effects().after_attack_roll(
                HookKind::AfterAttackRoll,
                self.source,
                &info,
                now,
            ));
        }
        if let Some(target_entity) = battle.entity(target) {
            hooks.merge(target_entity.effects().after_attack_roll(
                HookKind::AfterAttackRollTarget,
                target,
                &info,
                now,
            ));
        }

        let sneak_attack_expr = if has_sneak
            && (weapon.properties.contains(WeaponProperties::FINESSE)
                || weapon.kind == WeaponKind::RangedAttack)
            && (advantage_mod > 0 || battle.enemy_in_melee_range(target, &[self.source]))
        {
            sneak_dice
        } else {
            None
        };

        let mut continuation = AttackContinuation {
            source: self.source,
            target,
            weapon: Some(using),
            attack_name: weapon.name.clone(),
            attack_roll: attack_roll.clone(),
            bonus_rolls,
            advantage,
            advantage_mod,
            target_ac,
            cover_ac,
            damage_expr,
            damage_type: weapon.damage_type,
            sneak_attack_expr,
            gwf_reroll,
            economy: self.economy(),
            thrown: self.thrown,
            second_hand: self.second_hand,
            ammo: weapon.ammo.clone(),
            early_items: hooks.items,
            force_miss: hooks.force_miss,
        };

        // Shield reaction: only offered when the attack would otherwise
        // land and +5 AC changes the outcome.
        let would_hit =
            !continuation.force_miss && attack_hits(&attack_roll, attack_total, target_ac);
        if would_hit
            && shield_reaction_applicable(battle, session.catalog, target, attack_total, target_ac)?
        {
            let prompt = ReactionPrompt {
                entity: target,
                trigger: ReactionTrigger::ShieldSpell {
                    attacker: self.source,
                    attack_total,
                    effective_ac: target_ac,
                },
            };
            match battle.controller_for(target).map(|c| c.decide_reaction(&prompt)) {
                // No controller: degrade to "no reaction taken".
                None | Some(Some(ReactionDecision::Decline)) => {}
                Some(Some(ReactionDecision::Take)) => {
                    continuation.force_miss = true;
                    continuation
                        .early_items
                        .push(ResolvedItem::Shield { source: target });
                }
                // Controller defers: suspend at this exact point.
                Some(None) => {
                    return Ok(Resolution::Pending(PendingReaction::new(
                        prompt,
                        Continuation::Attack(continuation),
                    )));
                }
            }
        }

        let items = Self::finalize(continuation, battle);
        Ok(Resolution::Complete(self.state.resolved(items)))
    }

    fn resume(
        &mut self,
        _session: &Session<'_>,
        battle: &mut dyn Battle,
        pending: PendingReaction,
        decision: ReactionDecision,
    ) -> Result<Resolution, ActionError> {
        let Continuation::Attack(mut continuation) = pending.continuation;
        if continuation.source != self.source || Some(continuation.target) != self.target {
            return Err(ActionError::TokenMismatch {
                token: pending.token,
            });
        }

        if decision == ReactionDecision::Take {
            continuation.force_miss = true;
            continuation.early_items.push(ResolvedItem::Shield {
                source: pending.prompt.entity,
            });
        }

        let items = Self::finalize(continuation, battle);
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
