//! Reference entity implementation.
//!
//! A `Combatant` stores base values only; every effect-derived quantity
//! (armor class, speed, saves, resistances) comes from the provided methods
//! on the `Entity` trait layered over the embedded effect registry.

use rules_core::{
    Ability, ClassFeature, CreatureSize, DamageType, EffectRegistry, Entity, EntityId, GameTime,
    WeaponDetails, WeaponKind, WeaponProperties,
};

use std::collections::HashMap;

/// The six ability scores.
#[derive(Clone, Copy, Debug)]
pub struct AbilityScores {
    pub strength: i64,
    pub dexterity: i64,
    pub constitution: i64,
    pub intelligence: i64,
    pub wisdom: i64,
    pub charisma: i64,
}

impl Default for AbilityScores {
    fn default() -> Self {
        Self {
            strength: 10,
            dexterity: 10,
            constitution: 10,
            intelligence: 10,
            wisdom: 10,
            charisma: 10,
        }
    }
}

impl AbilityScores {
    fn get(&self, ability: Ability) -> i64 {
        match ability {
            Ability::Strength => self.strength,
            Ability::Dexterity => self.dexterity,
            Ability::Constitution => self.constitution,
            Ability::Intelligence => self.intelligence,
            Ability::Wisdom => self.wisdom,
            Ability::Charisma => self.charisma,
        }
    }
}

/// A creature built from base values plus an effect registry.
#[derive(Debug)]
pub struct Combatant {
    id: EntityId,
    name: String,
    size: CreatureSize,
    level: u8,
    hp: i64,
    max_hp: i64,
    dead: bool,
    scores: AbilityScores,
    base_ac: i64,
    base_speed: u32,
    proficiency: i64,
    save_proficiencies: Vec<Ability>,
    features: Vec<ClassFeature>,
    sneak_dice: Option<String>,
    resistances: Vec<DamageType>,
    vulnerabilities: Vec<DamageType>,
    prone: bool,
    squeezed: bool,
    stealthy: bool,
    armor_proficient: bool,
    shield: bool,
    off_hand_free: bool,
    inventory: HashMap<String, u32>,
    equipped: Vec<String>,
    prepared: Vec<String>,
    spell_slots: [u8; 9],
    spellcasting: Option<Ability>,
    lay_on_hands_pool: i64,
    second_wind_charges: i64,
    effects: EffectRegistry,
}

impl Combatant {
    #[must_use]
    pub fn new(id: EntityId, name: impl Into<String>, level: u8) -> Self {
        Self {
            id,
            name: name.into(),
            size: CreatureSize::Medium,
            level,
            hp: 10,
            max_hp: 10,
            dead: false,
            scores: AbilityScores::default(),
            base_ac: 10,
            base_speed: 30,
            proficiency: 2,
            save_proficiencies: Vec::new(),
            features: Vec::new(),
            sneak_dice: None,
            resistances: Vec::new(),
            vulnerabilities: Vec::new(),
            prone: false,
            squeezed: false,
            stealthy: false,
            armor_proficient: true,
            shield: false,
            off_hand_free: true,
            inventory: HashMap::new(),
            equipped: Vec::new(),
            prepared: Vec::new(),
            spell_slots: [0; 9],
            spellcasting: None,
            lay_on_hands_pool: 0,
            second_wind_charges: 0,
            effects: EffectRegistry::new(),
        }
    }

    #[must_use]
    pub fn with_hp(mut self, hp: i64) -> Self {
        self.hp = hp;
        self.max_hp = hp;
        self
    }

    #[must_use]
    pub fn with_scores(mut self, scores: AbilityScores) -> Self {
        self.scores = scores;
        self
    }

    #[must_use]
    pub fn with_ac(mut self, ac: i64) -> Self {
        self.base_ac = ac;
        self
    }

    #[must_use]
    pub fn with_size(mut self, size: CreatureSize) -> Self {
        self.size = size;
        self
    }

    #[must_use]
    pub fn with_feature(mut self, feature: ClassFeature) -> Self {
        self.features.push(feature);
        self
    }

    #[must_use]
    pub fn with_sneak_dice(mut self, dice: impl Into<String>) -> Self {
        self.sneak_dice = Some(dice.into());
        self
    }

    #[must_use]
    pub fn with_resistance(mut self, damage_type: DamageType) -> Self {
        self.resistances.push(damage_type);
        self
    }

    #[must_use]
    pub fn with_vulnerability(mut self, damage_type: DamageType) -> Self {
        self.vulnerabilities.push(damage_type);
        self
    }

    #[must_use]
    pub fn with_weapon(mut self, weapon: impl Into<String>) -> Self {
        let weapon = weapon.into();
        self.equipped.push(weapon.clone());
        *self.inventory.entry(weapon).or_insert(0) += 1;
        self
    }

    #[must_use]
    pub fn with_item(mut self, item: impl Into<String>, count: u32) -> Self {
        *self.inventory.entry(item.into()).or_insert(0) += count;
        self
    }

    #[must_use]
    pub fn with_spells(
        mut self,
        ability: Ability,
        prepared: &[&str],
        slots: &[(u8, u8)],
    ) -> Self {
        self.spellcasting = Some(ability);
        self.prepared = prepared.iter().map(|s| (*s).to_owned()).collect();
        for &(level, count) in slots {
            if (1..=9).contains(&level) {
                self.spell_slots[usize::from(level) - 1] = count;
            }
        }
        self
    }

    #[must_use]
    pub fn with_save_proficiency(mut self, ability: Ability) -> Self {
        self.save_proficiencies.push(ability);
        self
    }

    #[must_use]
    pub fn with_lay_on_hands_pool(mut self, pool: i64) -> Self {
        self.lay_on_hands_pool = pool;
        self.features.push(ClassFeature::LayOnHands);
        self
    }

    #[must_use]
    pub fn with_second_wind(mut self) -> Self {
        self.second_wind_charges = 1;
        self.features.push(ClassFeature::SecondWind);
        self
    }

    #[must_use]
    pub fn with_proficiency_bonus(mut self, bonus: i64) -> Self {
        self.proficiency = bonus;
        self
    }

    pub fn set_stealthy(&mut self, stealthy: bool) {
        self.stealthy = stealthy;
    }

    pub fn set_squeezed(&mut self, squeezed: bool) {
        self.squeezed = squeezed;
    }
}

impl Entity for Combatant {
    fn id(&self) -> EntityId {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn size(&self) -> CreatureSize {
        self.size
    }

    fn level(&self) -> u8 {
        self.level
    }

    fn hp(&self) -> i64 {
        self.hp
    }

    fn base_max_hp(&self) -> i64 {
        self.max_hp
    }

    fn heal(&mut self, amount: i64, now: GameTime) {
        if amount <= 0 {
            return;
        }
        self.hp = (self.hp + amount).min(self.max_hp(now));
        if self.hp > 0 {
            self.dead = false;
        }
    }

    fn take_damage(&mut self, amount: i64, _damage_type: DamageType, _critical: bool) {
        self.hp -= amount.max(0);
        if self.hp <= 0 {
            self.hp = 0;
            self.dead = true;
        }
    }

    fn dead(&self) -> bool {
        self.dead
    }

    fn ability_score(&self, ability: Ability) -> i64 {
        self.scores.get(ability)
    }

    fn proficiency_bonus(&self) -> i64 {
        self.proficiency
    }

    fn proficient_in_save(&self, ability: Ability) -> bool {
        self.save_proficiencies.contains(&ability)
    }

    fn base_armor_class(&self) -> i64 {
        self.base_ac
    }

    fn base_resistances(&self) -> Vec<DamageType> {
        self.resistances.clone()
    }

    fn base_vulnerabilities(&self) -> Vec<DamageType> {
        self.vulnerabilities.clone()
    }

    fn base_speed(&self) -> u32 {
        self.base_speed
    }

    fn prone(&self) -> bool {
        self.prone
    }

    fn set_prone(&mut self, prone: bool) {
        self.prone = prone;
    }

    fn squeezed(&self) -> bool {
        self.squeezed
    }

    fn stealthy(&self) -> bool {
        self.stealthy
    }

    fn break_stealth(&mut self) {
        self.stealthy = false;
    }

    fn class_feature(&self, feature: ClassFeature) -> bool {
        self.features.contains(&feature)
    }

    fn sneak_attack_dice(&self) -> Option<String> {
        self.sneak_dice.clone()
    }

    fn proficient_with_equipped_armor(&self) -> bool {
        self.armor_proficient
    }

    fn attack_roll_mod(&self, weapon: &WeaponDetails) -> i64 {
        self.attack_ability_mod(weapon) + self.proficiency
    }

    fn attack_ability_mod(&self, weapon: &WeaponDetails) -> i64 {
        let str_mod = self.ability_modifier(Ability::Strength);
        let dex_mod = self.ability_modifier(Ability::Dexterity);
        if weapon.properties.contains(WeaponProperties::FINESSE) {
            str_mod.max(dex_mod)
        } else if weapon.kind == WeaponKind::RangedAttack {
            dex_mod
        } else {
            str_mod
        }
    }

    fn off_hand_free(&self) -> bool {
        self.off_hand_free && !self.shield
    }

    fn shield_equipped(&self) -> bool {
        self.shield
    }

    fn item_count(&self, item: &str) -> u32 {
        self.inventory.get(item).copied().unwrap_or(0)
    }

    fn add_item(&mut self, item: &str, count: u32) {
        *self.inventory.entry(item.to_owned()).or_insert(0) += count;
    }

    fn deduct_item(&mut self, item: &str, count: u32) {
        if let Some(held) = self.inventory.get_mut(item) {
            *held = held.saturating_sub(count);
        }
    }

    fn equipped_weapons(&self) -> Vec<String> {
        self.equipped.clone()
    }

    fn prepared_spells(&self) -> Vec<String> {
        self.prepared.clone()
    }

    fn spell_slots_count(&self, level: u8) -> u8 {
        if (1..=9).contains(&level) {
            self.spell_slots[usize::from(level) - 1]
        } else {
            0
        }
    }

    fn consume_spell_slot(&mut self, level: u8) {
        if (1..=9).contains(&level) {
            let slot = &mut self.spell_slots[usize::from(level) - 1];
            *slot = slot.saturating_sub(1);
        }
    }

    fn spellcasting_ability(&self) -> Option<Ability> {
        self.spellcasting
    }

    fn feature_pool(&self, feature: ClassFeature) -> i64 {
        match feature {
            ClassFeature::LayOnHands => self.lay_on_hands_pool,
            ClassFeature::SecondWind => self.second_wind_charges,
            _ => 0,
        }
    }

    fn consume_feature_pool(&mut self, feature: ClassFeature, amount: i64) {
        match feature {
            ClassFeature::LayOnHands => {
                self.lay_on_hands_pool = (self.lay_on_hands_pool - amount).max(0);
            }
            ClassFeature::SecondWind => {
                self.second_wind_charges = (self.second_wind_charges - amount).max(0);
            }
            _ => {}
        }
    }

    fn effects(&self) -> &EffectRegistry {
        &self.effects
    }

    fn effects_mut(&mut self) -> &mut EffectRegistry {
        &mut self.effects
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rules_core::Catalog;

    #[test]
    fn damage_and_healing_clamp() {
        let mut goblin = Combatant::new(EntityId(1), "goblin", 1).with_hp(7);
        goblin.take_damage(5, DamageType::Slashing, false);
        assert_eq!(goblin.hp(), 2);
        assert!(!goblin.dead());

        goblin.take_damage(10, DamageType::Slashing, false);
        assert_eq!(goblin.hp(), 0);
        assert!(goblin.dead());

        goblin.heal(3, GameTime(0));
        assert_eq!(goblin.hp(), 3);
        assert!(!goblin.dead());

        goblin.heal(100, GameTime(0));
        assert_eq!(goblin.hp(), 7);
    }

    #[test]
    fn finesse_weapons_use_best_of_str_dex() {
        let rogue = Combatant::new(EntityId(2), "rogue", 3).with_scores(AbilityScores {
            strength: 8,
            dexterity: 16,
            ..AbilityScores::default()
        });
        let catalog = crate::RonCatalog::builtin().unwrap();

        let dagger = catalog.load_weapon("dagger").unwrap();
        assert_eq!(rogue.attack_ability_mod(&dagger), 3);

        let greatsword = catalog.load_weapon("greatsword").unwrap();
        assert_eq!(rogue.attack_ability_mod(&greatsword), -1);
    }
}
