//! Item application: the only place world state changes.
//!
//! An explicit registry maps each [`ItemKind`] to one handler, populated
//! once at startup via [`ApplyRegistry::standard`]. Each item is applied
//! exactly once; an item whose kind has no handler is logged and silently
//! dropped (a documented defect risk rather than a fatal error, so hosts
//! can register partial handler sets for replay tooling).

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, warn};

use super::Session;
use super::spell::{BlessEffect, ShieldEffect};
use crate::combat::adjusted_damage;
use crate::dice::DieRoll;
use crate::effects::{EffectId, HookKind};
use crate::env::{Battle, Entity};
use crate::error::ActionError;
use crate::item::{AttackRecord, HealCost, ItemKind, ResolvedItem};
use crate::types::{ActionResource, EntityId, GameTime};

/// Handler for one item kind.
pub type ApplyFn = fn(&Session<'_>, &mut dyn Battle, &ResolvedItem) -> Result<(), ActionError>;

/// Item-kind-keyed dispatch table for world mutation.
pub struct ApplyRegistry {
    handlers: HashMap<ItemKind, ApplyFn>,
}

impl ApplyRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// Registry with every built-in handler.
    #[must_use]
    pub fn standard() -> Self {
        let mut registry = Self::new();
        registry.register(ItemKind::Damage, apply_attack_damage);
        registry.register(ItemKind::Miss, apply_attack_miss);
        registry.register(ItemKind::SpellDamage, apply_spell_damage);
        registry.register(ItemKind::SpellMiss, apply_spell_miss);
        registry.register(ItemKind::Shield, apply_shield);
        registry.register(ItemKind::Bless, apply_bless);
        registry.register(ItemKind::Heal, apply_heal);
        registry.register(ItemKind::LayOnHands, apply_lay_on_hands);
        registry.register(ItemKind::Dodge, apply_dodge);
        registry.register(ItemKind::Disengage, apply_disengage);
        registry.register(ItemKind::Help, apply_help);
        registry.register(ItemKind::Move, apply_move);
        registry
    }

    pub fn register(&mut self, kind: ItemKind, handler: ApplyFn) {
        self.handlers.insert(kind, handler);
    }

    /// Apply one item through its registered handler.
    ///
    /// Unroutable items are logged and dropped.
    pub fn apply(
        &self,
        session: &Session<'_>,
        battle: &mut dyn Battle,
        item: &ResolvedItem,
    ) -> Result<(), ActionError> {
        match self.handlers.get(&item.kind()) {
            Some(handler) => {
                debug!(kind = %item.kind(), source = %item.source(), "applying item");
                handler(session, battle, item)
            }
            None => {
                warn!(kind = %item.kind(), "no apply handler registered, item dropped");
                Ok(())
            }
        }
    }

    /// Apply a resolution's items in order.
    pub fn apply_all(
        &self,
        session: &Session<'_>,
        battle: &mut dyn Battle,
        items: &[ResolvedItem],
    ) -> Result<(), ActionError> {
        for item in items {
            self.apply(session, battle, item)?;
        }
        Ok(())
    }
}

impl Default for ApplyRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

// ----------------------------------------------------------------------
// Attack items
// ----------------------------------------------------------------------

/// Resource/ammunition bookkeeping shared by hits and misses.
fn consume_attack(
    session: &Session<'_>,
    battle: &mut dyn Battle,
    attack: &AttackRecord,
    hit: bool,
) -> Result<(), ActionError> {
    if let Some(ammo) = &attack.ammo {
        battle
            .entity_mut(attack.source)
            .ok_or(ActionError::UnknownEntity(attack.source))?
            .deduct_item(ammo, 1);
    }

    // A thrown weapon leaves the attacker's hands; on a hit it sticks in
    // the target.
    if attack.thrown && let Some(weapon) = &attack.weapon {
        battle
            .entity_mut(attack.source)
            .ok_or(ActionError::UnknownEntity(attack.source))?
            .deduct_item(weapon, 1);
        if hit && let Some(target) = battle.entity_mut(attack.target) {
            target.add_item(weapon, 1);
        }
    }

    battle.consume(attack.source, attack.economy);
    battle
        .entity_mut(attack.source)
        .ok_or(ActionError::UnknownEntity(attack.source))?
        .break_stealth();

    // A first light-weapon attack opens the off-hand bonus attack; any
    // other attack closes it.
    let light = attack
        .weapon
        .as_deref()
        .and_then(|w| session.catalog.load_weapon(w).ok())
        .is_some_and(|w| {
            w.properties
                .contains(crate::env::WeaponProperties::LIGHT)
        });
    if let Some(state) = battle.entity_state_mut(attack.source) {
        state.two_weapon = if light && !attack.second_hand {
            attack.weapon.clone()
        } else {
            None
        };
    }

    battle.dismiss_help_for(attack.target);
    Ok(())
}

fn apply_attack_damage(
    session: &Session<'_>,
    battle: &mut dyn Battle,
    item: &ResolvedItem,
) -> Result<(), ActionError> {
    let ResolvedItem::Damage {
        attack,
        damage,
        sneak_attack,
        damage_type,
    } = item
    else {
        return Ok(());
    };

    let now = battle.game_time();
    let raw = damage.result() + sneak_attack.as_ref().map_or(0, DieRoll::result);
    let total = {
        let target = battle
            .entity(attack.target)
            .ok_or(ActionError::UnknownEntity(attack.target))?;
        adjusted_damage(target, raw, *damage_type, now)
    };
    let critical = attack.attack_roll.as_ref().is_some_and(DieRoll::nat_20);

    battle
        .entity_mut(attack.target)
        .ok_or(ActionError::UnknownEntity(attack.target))?
        .take_damage(total, *damage_type, critical);

    consume_attack(session, battle, attack, true)
}

fn apply_attack_miss(
    session: &Session<'_>,
    battle: &mut dyn Battle,
    item: &ResolvedItem,
) -> Result<(), ActionError> {
    let ResolvedItem::Miss { attack } = item else {
        return Ok(());
    };
    consume_attack(session, battle, attack, false)
}

// ----------------------------------------------------------------------
// Spell items
// ----------------------------------------------------------------------

fn consume_cast(
    battle: &mut dyn Battle,
    source: EntityId,
    economy: ActionResource,
    at_level: u8,
) -> Result<(), ActionError> {
    if at_level > 0 {
        battle
            .entity_mut(source)
            .ok_or(ActionError::UnknownEntity(source))?
            .consume_spell_slot(at_level);
    }
    battle.consume(source, economy);
    Ok(())
}

fn apply_spell_damage(
    _session: &Session<'_>,
    battle: &mut dyn Battle,
    item: &ResolvedItem,
) -> Result<(), ActionError> {
    let ResolvedItem::SpellDamage {
        spell,
        damage,
        damage_type,
    } = item
    else {
        return Ok(());
    };

    let now = battle.game_time();
    let total = {
        let target = battle
            .entity(spell.target)
            .ok_or(ActionError::UnknownEntity(spell.target))?;
        adjusted_damage(target, damage.result(), *damage_type, now)
    };
    let critical = spell.attack_roll.as_ref().is_some_and(DieRoll::nat_20);

    battle
        .entity_mut(spell.target)
        .ok_or(ActionError::UnknownEntity(spell.target))?
        .take_damage(total, *damage_type, critical);

    consume_cast(battle, spell.source, spell.economy, spell.at_level)
}

fn apply_spell_miss(
    _session: &Session<'_>,
    battle: &mut dyn Battle,
    item: &ResolvedItem,
) -> Result<(), ActionError> {
    let ResolvedItem::SpellMiss { spell } = item else {
        return Ok(());
    };
    consume_cast(battle, spell.source, spell.economy, spell.at_level)
}

fn apply_shield(
    _session: &Session<'_>,
    battle: &mut dyn Battle,
    item: &ResolvedItem,
) -> Result<(), ActionError> {
    let ResolvedItem::Shield { source } = item else {
        return Ok(());
    };

    let now = battle.game_time();
    let expiry = now.advanced_by(GameTime::from_hours(8));
    {
        let entity = battle
            .entity_mut(*source)
            .ok_or(ActionError::UnknownEntity(*source))?;
        let effects = entity.effects_mut();
        let id = effects.register_effect(
            HookKind::AcBonus,
            Arc::new(ShieldEffect),
            Some(*source),
            Some(expiry),
        );
        effects.register_hook(HookKind::StartOfTurn, id);
        entity.consume_spell_slot(1);
    }
    battle.consume(*source, ActionResource::Reaction);
    Ok(())
}

fn apply_bless(
    _session: &Session<'_>,
    battle: &mut dyn Battle,
    item: &ResolvedItem,
) -> Result<(), ActionError> {
    let ResolvedItem::Bless {
        source,
        targets,
        at_level,
    } = item
    else {
        return Ok(());
    };

    let now = battle.game_time();
    // Concentration, up to one minute.
    let expiry = now.advanced_by(GameTime::from_rounds(10));
    let cast_id = EffectId::fresh();

    for &target in targets {
        battle
            .entity_mut(target)
            .ok_or(ActionError::UnknownEntity(target))?
            .effects_mut()
            .attach_as(cast_id, Arc::new(BlessEffect), Some(*source), Some(expiry));
    }

    // Sustaining a new concentration effect ends the previous one wherever
    // it was attached.
    let previous = {
        let caster = battle
            .entity_mut(*source)
            .ok_or(ActionError::UnknownEntity(*source))?;
        let effects = caster.effects_mut();
        for &target in targets {
            effects.add_casted(cast_id, target);
        }
        effects.concentration_on(cast_id)
    };
    if let Some(previous) = previous {
        break_casted_effect(battle, *source, previous)?;
    }

    consume_cast(battle, *source, ActionResource::Action, *at_level)
}

/// Dismiss a previously-cast effect from every entity it was attached to.
pub fn break_casted_effect(
    battle: &mut dyn Battle,
    caster: EntityId,
    effect: EffectId,
) -> Result<(), ActionError> {
    let refs = battle
        .entity_mut(caster)
        .ok_or(ActionError::UnknownEntity(caster))?
        .effects_mut()
        .take_casted(effect);
    for r in refs {
        if let Some(target) = battle.entity_mut(r.target) {
            target.effects_mut().dismiss(r.effect);
        }
    }
    // Self-applied effects are covered by dismissing on the caster too.
    battle
        .entity_mut(caster)
        .ok_or(ActionError::UnknownEntity(caster))?
        .effects_mut()
        .dismiss(effect);
    Ok(())
}

// ----------------------------------------------------------------------
// Healing items
// ----------------------------------------------------------------------

fn apply_heal(
    _session: &Session<'_>,
    battle: &mut dyn Battle,
    item: &ResolvedItem,
) -> Result<(), ActionError> {
    let ResolvedItem::Heal {
        source,
        target,
        healing,
        cost,
        economy,
    } = item
    else {
        return Ok(());
    };

    let now = battle.game_time();
    battle
        .entity_mut(*target)
        .ok_or(ActionError::UnknownEntity(*target))?
        .heal(healing.result(), now);

    {
        let source_entity = battle
            .entity_mut(*source)
            .ok_or(ActionError::UnknownEntity(*source))?;
        match cost {
            HealCost::SpellSlot { level } => source_entity.consume_spell_slot(*level),
            HealCost::Consumable { item } => source_entity.deduct_item(item, 1),
            HealCost::FeatureCharge => {
                source_entity.consume_feature_pool(crate::types::ClassFeature::SecondWind, 1);
            }
        }
    }
    battle.consume(*source, *economy);
    Ok(())
}

fn apply_lay_on_hands(
    _session: &Session<'_>,
    battle: &mut dyn Battle,
    item: &ResolvedItem,
) -> Result<(), ActionError> {
    let ResolvedItem::LayOnHands {
        source,
        target,
        amount,
    } = item
    else {
        return Ok(());
    };

    let now = battle.game_time();
    battle
        .entity_mut(*target)
        .ok_or(ActionError::UnknownEntity(*target))?
        .heal(*amount, now);
    battle
        .entity_mut(*source)
        .ok_or(ActionError::UnknownEntity(*source))?
        .consume_feature_pool(crate::types::ClassFeature::LayOnHands, *amount);
    battle.consume(*source, ActionResource::Action);
    Ok(())
}

// ----------------------------------------------------------------------
// Support items
// ----------------------------------------------------------------------

fn apply_dodge(
    _session: &Session<'_>,
    battle: &mut dyn Battle,
    item: &ResolvedItem,
) -> Result<(), ActionError> {
    let ResolvedItem::Dodge { source } = item else {
        return Ok(());
    };
    if let Some(state) = battle.entity_state_mut(*source) {
        state.dodge = true;
    }
    battle.consume(*source, ActionResource::Action);
    Ok(())
}

fn apply_disengage(
    _session: &Session<'_>,
    battle: &mut dyn Battle,
    item: &ResolvedItem,
) -> Result<(), ActionError> {
    let ResolvedItem::Disengage { source } = item else {
        return Ok(());
    };
    if let Some(state) = battle.entity_state_mut(*source) {
        state.disengage = true;
    }
    battle.consume(*source, ActionResource::Action);
    Ok(())
}

fn apply_help(
    _session: &Session<'_>,
    battle: &mut dyn Battle,
    item: &ResolvedItem,
) -> Result<(), ActionError> {
    let ResolvedItem::Help { source, target } = item else {
        return Ok(());
    };
    if let Some(state) = battle.entity_state_mut(*target) {
        state.helped_by.push(*source);
    }
    battle.consume(*source, ActionResource::Action);
    Ok(())
}

fn apply_move(
    _session: &Session<'_>,
    battle: &mut dyn Battle,
    item: &ResolvedItem,
) -> Result<(), ActionError> {
    let ResolvedItem::Move { source, path } = item else {
        return Ok(());
    };
    let Some(&destination) = path.last() else {
        return Ok(());
    };
    battle.move_entity(*source, destination);
    let cost = path.len() as u32 * 5;
    if let Some(state) = battle.entity_state_mut(*source) {
        state.movement = state.movement.saturating_sub(cost);
    }
    Ok(())
}
