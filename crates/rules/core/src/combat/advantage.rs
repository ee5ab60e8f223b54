//! Advantage/disadvantage gathering.

use crate::env::{Battle, Entity, WeaponDetails, WeaponKind, WeaponProperties};
use crate::types::{AdvantageReason, AdvantageTags, ClassFeature, CreatureSize, EntityId};

/// Gather every advantage/disadvantage reason for an attack and reduce them
/// to a net modifier.
///
/// Sources, in order: caller-supplied overrides, hook-contributed tags
/// (`attack_advantage_modifier` on the source, `targeted_advantage_override`
/// on the target), then the fixed rule predicates. The net modifier follows
/// the cancellation rule: any advantage is +1, any disadvantage is -1, both
/// together are 0.
#[must_use]
pub fn target_advantage_condition(
    battle: &dyn Battle,
    source: EntityId,
    target: EntityId,
    weapon: Option<&WeaponDetails>,
    thrown: bool,
    overrides: AdvantageTags,
) -> (i8, AdvantageTags) {
    let mut tags = overrides;
    let now = battle.game_time();

    let Some(source_entity) = battle.entity(source) else {
        return (tags.net(), tags);
    };
    let Some(target_entity) = battle.entity(target) else {
        return (tags.net(), tags);
    };

    tags.extend(source_entity.effects().attack_advantage(source, target, now));
    tags.extend(target_entity.effects().targeted_advantage(target, source, now));

    if source_entity.prone() {
        tags.disadvantage(AdvantageReason::Prone);
    }
    if source_entity.squeezed() {
        tags.disadvantage(AdvantageReason::Squeezed);
    }
    if battle
        .entity_state_for(target)
        .is_some_and(|state| state.dodge)
    {
        tags.disadvantage(AdvantageReason::TargetDodge);
    }
    if !source_entity.proficient_with_equipped_armor() {
        tags.disadvantage(AdvantageReason::ArmorProficiency);
    }
    if target_entity.squeezed() {
        tags.advantage(AdvantageReason::TargetSqueezed);
    }
    if battle.help_with(target) {
        tags.advantage(AdvantageReason::BeingHelped);
    }

    let ranged = thrown || weapon.is_some_and(|w| w.kind == WeaponKind::RangedAttack);
    if ranged && battle.map_for(source).is_some() {
        if battle.enemy_in_melee_range(source, &[]) {
            tags.disadvantage(AdvantageReason::RangedWithEnemyInMelee);
        }
        if target_entity.prone() {
            tags.disadvantage(AdvantageReason::TargetIsProneRange);
        }
        if let (Some(weapon), Some(map)) = (weapon, battle.map_for(source))
            && map.distance(source, target) > weapon.range
        {
            tags.disadvantage(AdvantageReason::TargetLongRange);
        }
    }

    if source_entity.class_feature(ClassFeature::PackTactics)
        && battle.ally_within_enemy_melee_range(source, target)
    {
        tags.advantage(AdvantageReason::PackTactics);
    }

    if weapon.is_some_and(|w| w.properties.contains(WeaponProperties::HEAVY))
        && source_entity.size() == CreatureSize::Small
    {
        tags.disadvantage(AdvantageReason::SmallCreatureUsingHeavy);
    }

    if !ranged
        && weapon.is_some_and(|w| w.kind == WeaponKind::MeleeAttack)
        && target_entity.prone()
    {
        tags.advantage(AdvantageReason::TargetIsProne);
    }

    if battle.map_for(source).is_some() {
        if !battle.can_see(target, source) {
            tags.advantage(AdvantageReason::UnseenAttacker);
        }
        if !battle.can_see(source, target) {
            tags.disadvantage(AdvantageReason::InvisibleAttacker);
        }
    }

    (tags.net(), tags)
}
