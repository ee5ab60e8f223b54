//! Spell casting end to end: attack cantrips, save spells, heals, the
//! bless buff, and the concentration invariant.

mod common;

use common::{CLERIC, FIGHTER, GOBLIN, Harness, cleric, fighter, goblin};
use rules_core::{
    ActionResource, AttackAction, Battle, BuildState, DamageType, Entity, EntityId, GameAction,
    HealCost, ItemKind, LayOnHandsAction, ParamAnswer, ParamSpec, ResolvedItem, SecondWindAction,
    Session, SpellCastAction, UseItemAction, build_map,
};
use rules_content::{AbilityScores, Combatant};

const SORCERER: EntityId = EntityId(7);

fn sorcerer() -> Combatant {
    Combatant::new(SORCERER, "sorcerer", 1)
        .with_hp(10)
        .with_ac(12)
        .with_scores(AbilityScores {
            charisma: 16,
            ..AbilityScores::default()
        })
        .with_spells(rules_core::Ability::Charisma, &["firebolt"], &[])
}

#[test]
fn firebolt_walks_the_spell_wizard_and_damages_on_hit() {
    let h = Harness::new();
    let session = Session::new(&h.catalog, &h.spells);
    let mut battle = common::skirmish(vec![sorcerer()], vec![goblin()]);

    let mut cast = SpellCastAction::new(SORCERER);

    // Root step: choose the spell.
    let BuildState::NeedsParams(request) = build_map(&cast, &session, &battle) else {
        panic!("cast must first request a spell choice");
    };
    assert!(matches!(request.specs[0], ParamSpec::SelectSpell));
    cast.supply(
        &session,
        vec![ParamAnswer::Spell {
            name: "firebolt".into(),
            at_level: 0,
        }],
    )
    .unwrap();

    // The chosen spell chains in its own target step.
    let BuildState::NeedsParams(request) = build_map(&cast, &session, &battle) else {
        panic!("firebolt must request a target");
    };
    assert!(matches!(
        request.specs[0],
        ParamSpec::SelectTarget {
            num: 1,
            range: Some(120),
            ..
        }
    ));
    cast.supply(&session, vec![ParamAnswer::Target(GOBLIN)])
        .unwrap();
    assert_eq!(build_map(&cast, &session, &battle), BuildState::Ready);

    cast.validate(&session, &battle);
    assert!(cast.errors().is_empty(), "errors: {:?}", cast.errors());

    // Spell attack +5 (cha 3 + prof 2): 10 + 5 = 15 vs AC 13.
    battle.dice().fudge(10, 20);
    battle.dice().fudge(7, 10);
    let items = cast
        .resolve(&session, &mut battle)
        .unwrap()
        .expect_complete();

    let ResolvedItem::SpellDamage {
        spell,
        damage,
        damage_type,
    } = &items[0]
    else {
        panic!("expected spell damage, got {items:?}");
    };
    assert_eq!(spell.spell, "firebolt");
    assert_eq!(*damage_type, DamageType::Fire);
    assert_eq!(damage.result(), 7);

    h.apply.apply_all(&session, &mut battle, &items).unwrap();
    assert_eq!(battle.combatant(GOBLIN).unwrap().hp(), 13);
    assert_eq!(battle.resource_remaining(SORCERER, ActionResource::Action), 0);
}

#[test]
fn firebolt_miss_still_consumes_the_action() {
    let h = Harness::new();
    let session = Session::new(&h.catalog, &h.spells);
    let mut battle = common::skirmish(vec![sorcerer()], vec![goblin()]);

    let mut cast = SpellCastAction::new(SORCERER);
    cast.supply(
        &session,
        vec![ParamAnswer::Spell {
            name: "firebolt".into(),
            at_level: 0,
        }],
    )
    .unwrap();
    cast.supply(&session, vec![ParamAnswer::Target(GOBLIN)])
        .unwrap();

    // 2 + 5 = 7 vs AC 13: miss.
    battle.dice().fudge(2, 20);
    let items = cast
        .resolve(&session, &mut battle)
        .unwrap()
        .expect_complete();
    assert_eq!(items[0].kind(), ItemKind::SpellMiss);

    h.apply.apply_all(&session, &mut battle, &items).unwrap();
    assert_eq!(battle.combatant(GOBLIN).unwrap().hp(), 20);
    assert_eq!(battle.resource_remaining(SORCERER, ActionResource::Action), 0);
}

#[test]
fn save_spell_splits_on_the_saving_throw() {
    let h = Harness::new();
    let session = Session::new(&h.catalog, &h.spells);

    // Save succeeds: 20 + 2 (dex) well over DC 13.
    let mut battle = common::skirmish(vec![cleric()], vec![goblin()]);
    let mut cast = SpellCastAction::new(CLERIC);
    cast.supply(
        &session,
        vec![ParamAnswer::Spell {
            name: "sacred_flame".into(),
            at_level: 0,
        }],
    )
    .unwrap();
    cast.supply(&session, vec![ParamAnswer::Target(GOBLIN)])
        .unwrap();

    battle.dice().fudge(20, 20);
    let items = cast
        .resolve(&session, &mut battle)
        .unwrap()
        .expect_complete();
    let ResolvedItem::SpellMiss { spell } = &items[0] else {
        panic!("a made save must resolve to a spell miss, got {items:?}");
    };
    let save = spell.save.as_ref().expect("save outcome recorded");
    assert!(save.succeeded());
    assert_eq!(save.dc, 13);

    // Save fails: 5 + 2 under DC 13; damage matches the rolled die.
    let mut battle = common::skirmish(vec![cleric()], vec![goblin()]);
    let mut cast = SpellCastAction::new(CLERIC);
    cast.supply(
        &session,
        vec![ParamAnswer::Spell {
            name: "sacred_flame".into(),
            at_level: 0,
        }],
    )
    .unwrap();
    cast.supply(&session, vec![ParamAnswer::Target(GOBLIN)])
        .unwrap();

    battle.dice().fudge(5, 20);
    battle.dice().fudge(6, 8);
    let items = cast
        .resolve(&session, &mut battle)
        .unwrap()
        .expect_complete();
    let ResolvedItem::SpellDamage { spell, damage, .. } = &items[0] else {
        panic!("a failed save must resolve to spell damage, got {items:?}");
    };
    assert!(!spell.save.as_ref().unwrap().succeeded());
    assert!(spell.attack_roll.is_none());
    assert_eq!(damage.result(), 6);

    h.apply.apply_all(&session, &mut battle, &items).unwrap();
    assert_eq!(battle.combatant(GOBLIN).unwrap().hp(), 14);
}

#[test]
fn cure_wounds_heals_and_consumes_a_slot() {
    let h = Harness::new();
    let session = Session::new(&h.catalog, &h.spells);
    let mut battle = common::skirmish(vec![fighter(), cleric()], vec![goblin()]);

    battle
        .combatant_mut(FIGHTER)
        .unwrap()
        .take_damage(12, DamageType::Slashing, false);
    assert_eq!(battle.combatant(FIGHTER).unwrap().hp(), 12);

    let mut cast = SpellCastAction::new(CLERIC);
    cast.supply(
        &session,
        vec![ParamAnswer::Spell {
            name: "cure_wounds".into(),
            at_level: 1,
        }],
    )
    .unwrap();
    cast.supply(&session, vec![ParamAnswer::Target(FIGHTER)])
        .unwrap();
    cast.validate(&session, &battle);
    assert!(cast.errors().is_empty(), "errors: {:?}", cast.errors());

    // 1d8 = 4, +3 wisdom.
    battle.dice().fudge(4, 8);
    let items = cast
        .resolve(&session, &mut battle)
        .unwrap()
        .expect_complete();
    let ResolvedItem::Heal { healing, cost, .. } = &items[0] else {
        panic!("expected a heal item, got {items:?}");
    };
    assert_eq!(healing.result(), 7);
    assert_eq!(*cost, HealCost::SpellSlot { level: 1 });

    h.apply.apply_all(&session, &mut battle, &items).unwrap();
    assert_eq!(battle.combatant(FIGHTER).unwrap().hp(), 19);
    assert_eq!(battle.combatant(CLERIC).unwrap().spell_slots_count(1), 2);
}

#[test]
fn bless_adds_a_d4_and_concentration_replaces_it() {
    let h = Harness::new();
    let session = Session::new(&h.catalog, &h.spells);
    let mut battle = common::skirmish(vec![fighter(), cleric()], vec![goblin()]);

    // Cast bless on the fighter.
    let mut cast = SpellCastAction::new(CLERIC);
    cast.supply(
        &session,
        vec![ParamAnswer::Spell {
            name: "bless".into(),
            at_level: 1,
        }],
    )
    .unwrap();
    cast.supply(&session, vec![ParamAnswer::Targets(vec![FIGHTER])])
        .unwrap();
    let items = cast
        .resolve(&session, &mut battle)
        .unwrap()
        .expect_complete();
    h.apply.apply_all(&session, &mut battle, &items).unwrap();

    let now = battle.game_time();
    assert!(battle.combatant(FIGHTER).unwrap().has_effect("bless", now));
    assert_eq!(battle.combatant(CLERIC).unwrap().spell_slots_count(1), 2);

    // A blessed attack rolls the extra d4 into the attack total.
    let mut attack = AttackAction::new(FIGHTER);
    attack.using = Some("longsword".into());
    attack.target = Some(GOBLIN);
    battle.dice().fudge(10, 20);
    battle.dice().fudge(3, 4);
    battle.dice().fudge(6, 10);
    let items = attack
        .resolve(&session, &mut battle)
        .unwrap()
        .expect_complete();
    let ResolvedItem::Damage { attack: record, .. } = &items[0] else {
        panic!("15 + 3 vs AC 13 must hit, got {items:?}");
    };
    assert_eq!(record.bonus_rolls.len(), 1);
    assert_eq!(record.attack_total(), 18);

    // Sustaining a second bless ends the first wherever it is attached.
    battle.start_turn(CLERIC);
    let mut second = SpellCastAction::new(CLERIC);
    second
        .supply(
            &session,
            vec![ParamAnswer::Spell {
                name: "bless".into(),
                at_level: 1,
            }],
        )
        .unwrap();
    second
        .supply(&session, vec![ParamAnswer::Targets(vec![CLERIC])])
        .unwrap();
    let items = second
        .resolve(&session, &mut battle)
        .unwrap()
        .expect_complete();
    h.apply.apply_all(&session, &mut battle, &items).unwrap();

    let now = battle.game_time();
    assert!(!battle.combatant(FIGHTER).unwrap().has_effect("bless", now));
    assert!(battle.combatant(CLERIC).unwrap().has_effect("bless", now));
    assert_eq!(
        battle
            .combatant(CLERIC)
            .unwrap()
            .effects()
            .active_effects(now)
            .len(),
        1
    );
}

#[test]
fn healing_potion_consumes_inventory() {
    let h = Harness::new();
    let session = Session::new(&h.catalog, &h.spells);
    let hero = fighter().with_item("healing_potion", 2);
    let mut battle = common::skirmish(vec![hero], vec![goblin()]);

    battle
        .combatant_mut(FIGHTER)
        .unwrap()
        .take_damage(15, DamageType::Slashing, false);

    let mut action = UseItemAction::new(FIGHTER);
    let BuildState::NeedsParams(request) = build_map(&action, &session, &battle) else {
        panic!("item use must request an item");
    };
    assert!(matches!(request.specs[0], ParamSpec::SelectItem));
    action
        .supply(&session, vec![ParamAnswer::Item("healing_potion".into())])
        .unwrap();
    action
        .supply(&session, vec![ParamAnswer::Target(FIGHTER)])
        .unwrap();
    action.validate(&session, &battle);
    assert!(action.errors().is_empty(), "errors: {:?}", action.errors());

    // 2d4 + 2 with both dice fudged to 3.
    battle.dice().fudge(3, 4);
    let items = action
        .resolve(&session, &mut battle)
        .unwrap()
        .expect_complete();
    h.apply.apply_all(&session, &mut battle, &items).unwrap();

    assert_eq!(battle.combatant(FIGHTER).unwrap().hp(), 17);
    assert_eq!(
        battle.combatant(FIGHTER).unwrap().item_count("healing_potion"),
        1
    );
}

#[test]
fn lay_on_hands_spends_exactly_the_chosen_pool_points() {
    let h = Harness::new();
    let session = Session::new(&h.catalog, &h.spells);
    let paladin = Combatant::new(EntityId(8), "paladin", 3)
        .with_hp(28)
        .with_lay_on_hands_pool(10);
    let mut battle = common::skirmish(vec![fighter(), paladin], vec![goblin()]);

    battle
        .combatant_mut(FIGHTER)
        .unwrap()
        .take_damage(10, DamageType::Slashing, false);

    let mut action = LayOnHandsAction::new(EntityId(8));
    action
        .supply(&session, vec![ParamAnswer::Target(FIGHTER)])
        .unwrap();

    // The second request is the numeric pool spend, capped by the pool.
    let BuildState::NeedsParams(request) = build_map(&action, &session, &battle) else {
        panic!("lay on hands must request an amount");
    };
    assert!(matches!(
        request.specs[0],
        ParamSpec::NumberInput { min: 1, max: 10 }
    ));
    action
        .supply(&session, vec![ParamAnswer::Number(6)])
        .unwrap();
    action.validate(&session, &battle);
    assert!(action.errors().is_empty(), "errors: {:?}", action.errors());

    let items = action
        .resolve(&session, &mut battle)
        .unwrap()
        .expect_complete();
    h.apply.apply_all(&session, &mut battle, &items).unwrap();

    assert_eq!(battle.combatant(FIGHTER).unwrap().hp(), 20);
    assert_eq!(
        battle
            .combatant(EntityId(8))
            .unwrap()
            .feature_pool(rules_core::ClassFeature::LayOnHands),
        4
    );
}

#[test]
fn second_wind_heals_once_per_charge() {
    let h = Harness::new();
    let session = Session::new(&h.catalog, &h.spells);
    let hero = fighter().with_second_wind();
    let mut battle = common::skirmish(vec![hero], vec![goblin()]);

    battle
        .combatant_mut(FIGHTER)
        .unwrap()
        .take_damage(15, DamageType::Slashing, false);

    assert!(SecondWindAction::can(&battle, FIGHTER));
    let mut action = SecondWindAction::new(FIGHTER);
    action.validate(&session, &battle);
    assert!(action.errors().is_empty());

    // 1d10 = 7, plus level 3.
    battle.dice().fudge(7, 10);
    let items = action
        .resolve(&session, &mut battle)
        .unwrap()
        .expect_complete();
    h.apply.apply_all(&session, &mut battle, &items).unwrap();

    assert_eq!(battle.combatant(FIGHTER).unwrap().hp(), 19);
    assert_eq!(
        battle.resource_remaining(FIGHTER, ActionResource::BonusAction),
        0
    );
    assert!(!SecondWindAction::can(&battle, FIGHTER));
}
