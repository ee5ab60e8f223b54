//! Combatant contract.
//!
//! Entities are owned by the battle (the single game-state object of the
//! resource model); the engine reads them during `resolve` and mutates them
//! only inside `apply` handlers. Effect-derived quantities (armor class,
//! speed, saves, resistances) are provided methods layered over the
//! entity's [`EffectRegistry`], so implementations only store base values.

use crate::dice::{DiceState, DieRoll, Roller};
use crate::effects::EffectRegistry;
use crate::types::{
    Ability, ClassFeature, CreatureSize, DamageType, EntityId, GameTime,
};

/// Standard ability-score-to-modifier conversion.
#[must_use]
pub(crate) fn ability_modifier_for(score: i64) -> i64 {
    (score - 10).div_euclid(2)
}

/// A creature participating in combat.
pub trait Entity {
    // ------------------------------------------------------------------
    // Identity
    // ------------------------------------------------------------------

    fn id(&self) -> EntityId;

    fn name(&self) -> &str;

    fn size(&self) -> CreatureSize;

    fn level(&self) -> u8;

    // ------------------------------------------------------------------
    // Hit points
    // ------------------------------------------------------------------

    fn hp(&self) -> i64;

    /// Hit point maximum before effect overrides.
    fn base_max_hp(&self) -> i64;

    /// Hit point maximum after `hit_point_max_override` effects.
    fn max_hp(&self, now: GameTime) -> i64 {
        self.effects()
            .hit_point_max_override(self.id(), self.base_max_hp(), now)
    }

    /// Restore hit points, clamped to the current maximum.
    fn heal(&mut self, amount: i64, now: GameTime);

    /// Deduct hit points. `critical` is forwarded for death-save
    /// bookkeeping in implementations that track it.
    fn take_damage(&mut self, amount: i64, damage_type: DamageType, critical: bool);

    fn dead(&self) -> bool;

    // ------------------------------------------------------------------
    // Ability scores and derived modifiers
    // ------------------------------------------------------------------

    fn ability_score(&self, ability: Ability) -> i64;

    fn ability_modifier(&self, ability: Ability) -> i64 {
        ability_modifier_for(self.ability_score(ability))
    }

    fn proficiency_bonus(&self) -> i64;

    /// True when the entity adds proficiency to saves of this ability.
    fn proficient_in_save(&self, ability: Ability) -> bool;

    /// Roll a saving throw: d20 + ability modifier (+ proficiency when
    /// proficient), then apply `saving_throw_override` effects to the
    /// total. Returns the roll and the final total.
    fn save_throw(
        &self,
        ability: Ability,
        dice: &mut DiceState,
        now: GameTime,
    ) -> (DieRoll, i64) {
        let mut modifier = self.ability_modifier(ability);
        if self.proficient_in_save(ability) {
            modifier += self.proficiency_bonus();
        }
        let roll = Roller::d20(modifier)
            .description(format!("save.{ability}"))
            .roll(dice);
        let total = self
            .effects()
            .saving_throw_override(self.id(), ability, roll.result(), now);
        (roll, total)
    }

    // ------------------------------------------------------------------
    // Defense
    // ------------------------------------------------------------------

    /// Armor class from armor and natural defenses, before effects.
    fn base_armor_class(&self) -> i64;

    /// Armor class after `ac_override` and `ac_bonus` effects.
    fn armor_class(&self, now: GameTime) -> i64 {
        let id = self.id();
        let effects = self.effects();
        let base = effects
            .ac_override(id, now)
            .unwrap_or_else(|| self.base_armor_class());
        base + effects.ac_bonus(id, now)
    }

    /// Base damage resistances, before effect overrides.
    fn base_resistances(&self) -> Vec<DamageType>;

    fn base_vulnerabilities(&self) -> Vec<DamageType>;

    fn resistant_to(&self, damage_type: DamageType, now: GameTime) -> bool {
        let resistances = self
            .effects()
            .resistance_override(self.id(), now)
            .unwrap_or_else(|| self.base_resistances());
        resistances.contains(&damage_type)
    }

    fn vulnerable_to(&self, damage_type: DamageType) -> bool {
        self.base_vulnerabilities().contains(&damage_type)
    }

    // ------------------------------------------------------------------
    // Movement and posture
    // ------------------------------------------------------------------

    /// Walking speed in feet, before effects.
    fn base_speed(&self) -> u32;

    fn speed(&self, now: GameTime) -> u32 {
        let base = self.base_speed();
        self.effects()
            .speed_override(self.id(), base, now)
            .unwrap_or(base)
    }

    fn prone(&self) -> bool;

    fn set_prone(&mut self, prone: bool);

    /// Squeezing through a space too small for its size.
    fn squeezed(&self) -> bool;

    /// Hidden from enemies; broken by attacking.
    fn stealthy(&self) -> bool;

    fn break_stealth(&mut self);

    // ------------------------------------------------------------------
    // Proficiency and features
    // ------------------------------------------------------------------

    fn class_feature(&self, feature: ClassFeature) -> bool;

    /// Sneak attack dice, e.g. `2d6`, for rogues.
    fn sneak_attack_dice(&self) -> Option<String>;

    fn proficient_with_equipped_armor(&self) -> bool;

    /// Attack roll modifier for a weapon: attack ability modifier plus
    /// proficiency when proficient.
    fn attack_roll_mod(&self, weapon: &super::WeaponDetails) -> i64;

    /// Ability modifier used for a weapon's damage.
    fn attack_ability_mod(&self, weapon: &super::WeaponDetails) -> i64;

    /// True when the off hand is free (versatile grips, dueling style).
    fn off_hand_free(&self) -> bool;

    fn shield_equipped(&self) -> bool;

    // ------------------------------------------------------------------
    // Inventory
    // ------------------------------------------------------------------

    fn item_count(&self, item: &str) -> u32;

    fn add_item(&mut self, item: &str, count: u32);

    /// Deduct items; deducting below zero clamps at zero.
    fn deduct_item(&mut self, item: &str, count: u32);

    fn equipped_weapons(&self) -> Vec<String>;

    // ------------------------------------------------------------------
    // Spellcasting
    // ------------------------------------------------------------------

    fn has_spells(&self) -> bool {
        !self.prepared_spells().is_empty()
    }

    /// Catalog keys of spells the entity can currently cast.
    fn prepared_spells(&self) -> Vec<String>;

    fn spell_slots_count(&self, level: u8) -> u8;

    fn consume_spell_slot(&mut self, level: u8);

    /// Spellcasting ability for DCs and spell attacks.
    fn spellcasting_ability(&self) -> Option<Ability>;

    fn spell_save_dc(&self) -> i64 {
        let ability_mod = self
            .spellcasting_ability()
            .map_or(0, |a| self.ability_modifier(a));
        8 + self.proficiency_bonus() + ability_mod
    }

    fn spell_attack_mod(&self) -> i64 {
        let ability_mod = self
            .spellcasting_ability()
            .map_or(0, |a| self.ability_modifier(a));
        self.proficiency_bonus() + ability_mod
    }

    // ------------------------------------------------------------------
    // Feature pools
    // ------------------------------------------------------------------

    /// Remaining pool for pool-limited features (lay on hands).
    fn feature_pool(&self, feature: ClassFeature) -> i64;

    fn consume_feature_pool(&mut self, feature: ClassFeature, amount: i64);

    // ------------------------------------------------------------------
    // Effects
    // ------------------------------------------------------------------

    fn effects(&self) -> &EffectRegistry;

    fn effects_mut(&mut self) -> &mut EffectRegistry;

    fn has_effect(&self, name: &str, now: GameTime) -> bool {
        self.effects().has_effect(name, now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn modifier_table_matches_reference_values() {
        // floor((score - 10) / 2), including the odd negative scores.
        let expected = [
            (1, -5),
            (3, -4),
            (4, -3),
            (8, -1),
            (10, 0),
            (11, 0),
            (13, 1),
            (15, 2),
            (18, 4),
            (20, 5),
            (30, 10),
        ];
        for (score, modifier) in expected {
            assert_eq!(ability_modifier_for(score), modifier, "score {score}");
        }
    }
}
