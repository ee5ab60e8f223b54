//! Shared fixtures for the integration tests.

use rules_content::{AbilityScores, Combatant, GridMap, RonCatalog, SimpleBattle};
use rules_core::{Ability, ApplyRegistry, EntityId, Position, SpellRegistry};

pub const FIGHTER: EntityId = EntityId(1);
pub const GOBLIN: EntityId = EntityId(2);
pub const CLERIC: EntityId = EntityId(3);
pub const WIZARD: EntityId = EntityId(4);

/// Catalog, spell table, and apply table, built once per test.
pub struct Harness {
    pub catalog: RonCatalog,
    pub spells: SpellRegistry,
    pub apply: ApplyRegistry,
}

impl Harness {
    pub fn new() -> Self {
        Self {
            catalog: RonCatalog::builtin().expect("embedded catalog must parse"),
            spells: SpellRegistry::standard(),
            apply: ApplyRegistry::standard(),
        }
    }
}

pub fn fighter() -> Combatant {
    Combatant::new(FIGHTER, "fighter", 3)
        .with_hp(24)
        .with_ac(16)
        .with_scores(AbilityScores {
            strength: 16,
            constitution: 14,
            ..AbilityScores::default()
        })
        .with_weapon("longsword")
}

pub fn goblin() -> Combatant {
    Combatant::new(GOBLIN, "goblin", 1)
        .with_hp(20)
        .with_ac(13)
        .with_scores(AbilityScores {
            dexterity: 14,
            ..AbilityScores::default()
        })
        .with_weapon("shortsword")
}

pub fn cleric() -> Combatant {
    Combatant::new(CLERIC, "cleric", 3)
        .with_hp(21)
        .with_ac(15)
        .with_scores(AbilityScores {
            wisdom: 16,
            ..AbilityScores::default()
        })
        .with_spells(
            Ability::Wisdom,
            &["sacred_flame", "cure_wounds", "bless"],
            &[(1, 3)],
        )
}

pub fn wizard() -> Combatant {
    Combatant::new(WIZARD, "wizard", 1)
        .with_hp(12)
        .with_ac(12)
        .with_scores(AbilityScores {
            intelligence: 16,
            ..AbilityScores::default()
        })
        .with_spells(Ability::Intelligence, &["shield"], &[(1, 2)])
}

/// Two-sided battle on a small grid: heroes in the west column, monsters
/// one square east.
pub fn skirmish(heroes: Vec<Combatant>, monsters: Vec<Combatant>) -> SimpleBattle {
    let mut battle = SimpleBattle::new(0xD20).with_map(GridMap::new());
    for (i, hero) in heroes.into_iter().enumerate() {
        let pos = Position::new(0, i as i32);
        battle.add(hero, "heroes", Some(pos));
    }
    for (i, monster) in monsters.into_iter().enumerate() {
        let pos = Position::new(1, i as i32);
        battle.add(monster, "monsters", Some(pos));
    }
    battle
}
