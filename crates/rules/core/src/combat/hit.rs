//! Hit resolution.

use crate::dice::DieRoll;
use crate::env::{Battle, Catalog, Entity};
use crate::error::CatalogError;
use crate::types::{ActionResource, EntityId};

/// Does the attack connect?
///
/// A natural 20 forces a hit and a natural 1 forces a miss, both evaluated
/// against the kept d20 value; otherwise the attack total (d20 plus bonus
/// dice) is compared against the effective armor class.
#[must_use]
pub fn attack_hits(attack_roll: &DieRoll, attack_total: i64, effective_ac: i64) -> bool {
    if attack_roll.nat_20() {
        true
    } else if attack_roll.nat_1() {
        false
    } else {
        attack_total >= effective_ac
    }
}

/// Would casting Shield as a reaction turn this hit into a miss?
///
/// True when the target has Shield prepared as a reaction spell, still has
/// its reaction, and the attack total lands inside `[ac, ac + 5)`, the
/// only band where +5 AC changes the outcome. The caller still owes the
/// target's controller the actual decision.
pub fn shield_reaction_applicable(
    battle: &dyn Battle,
    catalog: &dyn Catalog,
    target: EntityId,
    attack_total: i64,
    effective_ac: i64,
) -> Result<bool, CatalogError> {
    let Some(target_entity) = battle.entity(target) else {
        return Ok(false);
    };
    if battle.resource_remaining(target, ActionResource::Reaction) == 0 {
        return Ok(false);
    }
    if attack_total < effective_ac || attack_total >= effective_ac + 5 {
        return Ok(false);
    }

    for spell_name in target_entity.prepared_spells() {
        let details = catalog.load_spell(&spell_name)?;
        if details.casting_time.resource == ActionResource::Reaction && spell_name == "shield" {
            return Ok(true);
        }
    }
    Ok(false)
}
