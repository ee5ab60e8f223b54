//! End-to-end weapon combat: build wizard, resolve/apply split, advantage
//! gathering, cover, and the shield reaction suspension.

mod common;

use std::sync::Arc;

use common::{FIGHTER, GOBLIN, Harness, WIZARD, fighter, goblin, wizard};
use rules_content::{DeferController, ScriptedController};
use rules_core::{
    ActionResource, AttackAction, Battle, BuildState, DamageType, Effect, Entity, EntityId,
    GameAction, HookKind, ItemKind, ParamAnswer, ParamSpec, ReactionDecision, ReactionTrigger,
    Resolution, ResolvedItem, RollEntry, Session, build_map,
    combat::effective_ac,
};

#[test]
fn melee_attack_full_lifecycle() {
    let h = Harness::new();
    let session = Session::new(&h.catalog, &h.spells);
    let mut battle = common::skirmish(vec![fighter()], vec![goblin()]);

    let mut action = AttackAction::new(FIGHTER);

    // Wizard step 1: weapon.
    let BuildState::NeedsParams(request) = build_map(&action, &session, &battle) else {
        panic!("fresh attack must request parameters");
    };
    assert!(matches!(request.specs[0], ParamSpec::SelectWeapon));
    action
        .supply(&session, vec![ParamAnswer::Weapon("longsword".into())])
        .unwrap();

    // Wizard step 2: target, with the weapon's range attached.
    let BuildState::NeedsParams(request) = build_map(&action, &session, &battle) else {
        panic!("attack still needs a target");
    };
    assert!(matches!(
        request.specs[0],
        ParamSpec::SelectTarget { num: 1, .. }
    ));
    action
        .supply(&session, vec![ParamAnswer::Target(GOBLIN)])
        .unwrap();
    assert_eq!(build_map(&action, &session, &battle), BuildState::Ready);

    action.validate(&session, &battle);
    assert!(action.errors().is_empty(), "errors: {:?}", action.errors());

    // Attack: 12 + 5 (str 3 + prof 2) = 17 vs AC 13. Damage: versatile
    // d10 = 6, +3 str.
    battle.dice().fudge(12, 20);
    battle.dice().fudge(6, 10);

    let items = action
        .resolve(&session, &mut battle)
        .unwrap()
        .expect_complete();

    // Resolution never touches hit points; only apply does.
    assert_eq!(battle.combatant(GOBLIN).unwrap().hp(), 20);

    assert_eq!(items.len(), 1);
    let ResolvedItem::Damage { attack, damage, .. } = &items[0] else {
        panic!("expected a damage item, got {items:?}");
    };
    assert_eq!(attack.attack_total(), 17);
    assert_eq!(attack.target_ac, 13);
    assert_eq!(damage.result(), 9);

    h.apply.apply_all(&session, &mut battle, &items).unwrap();
    assert_eq!(battle.combatant(GOBLIN).unwrap().hp(), 11);
    assert_eq!(battle.resource_remaining(FIGHTER, ActionResource::Action), 0);

    // Re-driving the wizard on a clone does not disturb the applied
    // original.
    let snapshot = action.result().to_vec();
    let mut probe = action.clone();
    probe.target = None;
    let BuildState::NeedsParams(_) = build_map(&probe, &session, &battle) else {
        panic!("clone with cleared target must ask again");
    };
    probe
        .supply(&session, vec![ParamAnswer::Target(FIGHTER)])
        .unwrap();
    assert_eq!(action.result(), snapshot.as_slice());
    assert_eq!(action.result().len(), 1);
}

#[test]
fn resistance_halves_and_vulnerability_doubles() {
    let h = Harness::new();
    let session = Session::new(&h.catalog, &h.spells);

    let resistant = goblin().with_resistance(DamageType::Slashing);
    let mut battle = common::skirmish(vec![fighter()], vec![resistant]);

    let mut action = AttackAction::new(FIGHTER);
    action.using = Some("longsword".into());
    action.target = Some(GOBLIN);

    battle.dice().fudge(12, 20);
    battle.dice().fudge(6, 10);
    let items = action
        .resolve(&session, &mut battle)
        .unwrap()
        .expect_complete();
    h.apply.apply_all(&session, &mut battle, &items).unwrap();
    // 9 slashing, halved to 4 (integer floor).
    assert_eq!(battle.combatant(GOBLIN).unwrap().hp(), 16);

    let vulnerable = goblin().with_vulnerability(DamageType::Slashing);
    let mut battle = common::skirmish(vec![fighter()], vec![vulnerable]);
    let mut action = AttackAction::new(FIGHTER);
    action.using = Some("longsword".into());
    action.target = Some(GOBLIN);

    battle.dice().fudge(12, 20);
    battle.dice().fudge(6, 10);
    let items = action
        .resolve(&session, &mut battle)
        .unwrap()
        .expect_complete();
    h.apply.apply_all(&session, &mut battle, &items).unwrap();
    assert_eq!(battle.combatant(GOBLIN).unwrap().hp(), 2);
}

#[test]
fn dodge_and_help_cancel_to_plain_roll() {
    let h = Harness::new();
    let session = Session::new(&h.catalog, &h.spells);
    let mut battle = common::skirmish(vec![fighter()], vec![goblin()]);

    // Dodge alone: disadvantage, pair sampling.
    battle.entity_state_mut(GOBLIN).unwrap().dodge = true;
    let mut action = AttackAction::new(FIGHTER);
    action.using = Some("longsword".into());
    action.target = Some(GOBLIN);
    battle.dice().fudge(11, 20);
    battle.dice().fudge(4, 10);
    let _ = action.resolve(&session, &mut battle).unwrap();
    assert_eq!(action.advantage_mod, -1);
    assert!(matches!(
        action.attack_roll.as_ref().unwrap().entries()[0],
        RollEntry::Pair(_, _)
    ));

    // Dodge plus help: one tag each way, net zero, plain semantics.
    battle
        .entity_state_mut(GOBLIN)
        .unwrap()
        .helped_by
        .push(EntityId(99));
    let mut action = AttackAction::new(FIGHTER);
    action.using = Some("longsword".into());
    action.target = Some(GOBLIN);
    battle.dice().fudge(11, 20);
    battle.dice().fudge(4, 10);
    let items = action
        .resolve(&session, &mut battle)
        .unwrap()
        .expect_complete();
    assert_eq!(action.advantage_mod, 0);
    assert!(matches!(
        action.attack_roll.as_ref().unwrap().entries()[0],
        RollEntry::Single(_)
    ));

    let record = match &items[0] {
        ResolvedItem::Damage { attack, .. } => attack,
        ResolvedItem::Miss { attack } => attack,
        other => panic!("unexpected item {other:?}"),
    };
    assert!(!record.advantage.advantage.is_empty());
    assert!(!record.advantage.disadvantage.is_empty());
    assert_eq!(record.advantage.net(), 0);
}

#[test]
fn cover_raises_effective_ac_for_ranged_shots() {
    use rules_content::{GridMap, SimpleBattle};
    use rules_core::{CoverType, Position};

    let h = Harness::new();
    let session = Session::new(&h.catalog, &h.spells);

    let archer = fighter().with_weapon("longbow").with_item("arrows", 10);
    let mut map = GridMap::new();
    // Half cover two squares out, past the archer's melee reach.
    map.add_cover(Position::new(0, 2), CoverType::Half, false);
    let mut battle = SimpleBattle::new(0xD20).with_map(map);
    battle.add(archer, "heroes", Some(Position::new(0, 0)));
    battle.add(goblin(), "monsters", Some(Position::new(0, 3)));

    let (ac, cover) = effective_ac(&battle, FIGHTER, GOBLIN);
    assert_eq!(cover, 2);
    assert_eq!(ac, 15);

    // The shot consumes ammunition on apply.
    let mut action = AttackAction::new(FIGHTER);
    action.using = Some("longbow".into());
    action.target = Some(GOBLIN);
    action.validate(&session, &battle);
    assert!(action.errors().is_empty(), "errors: {:?}", action.errors());

    battle.dice().fudge(13, 20);
    battle.dice().fudge(5, 8);
    let items = action
        .resolve(&session, &mut battle)
        .unwrap()
        .expect_complete();
    h.apply.apply_all(&session, &mut battle, &items).unwrap();
    assert_eq!(battle.combatant(FIGHTER).unwrap().item_count("arrows"), 9);
}

#[test]
fn ac_override_effect_changes_effective_ac() {
    #[derive(Debug)]
    struct StoneSkin;

    impl Effect for StoneSkin {
        fn name(&self) -> &str {
            "stone_skin"
        }

        fn ac_override(&self, _owner: EntityId) -> Option<i64> {
            Some(18)
        }
    }

    let h = Harness::new();
    let _session = Session::new(&h.catalog, &h.spells);
    let mut battle = common::skirmish(vec![fighter()], vec![goblin()]);

    let (base_ac, _) = effective_ac(&battle, FIGHTER, GOBLIN);
    assert_eq!(base_ac, 13);

    battle
        .combatant_mut(GOBLIN)
        .unwrap()
        .effects_mut()
        .register_effect(HookKind::AcOverride, Arc::new(StoneSkin), None, None);

    let (overridden, cover) = effective_ac(&battle, FIGHTER, GOBLIN);
    assert_eq!(overridden, 18);
    assert_eq!(cover, 0);
}

#[test]
fn shield_reaction_suspends_and_forces_a_miss() {
    let h = Harness::new();
    let session = Session::new(&h.catalog, &h.spells);
    let mut battle = common::skirmish(vec![fighter()], vec![wizard()]);
    battle.set_controller(WIZARD, Box::new(DeferController));

    let mut action = AttackAction::new(FIGHTER);
    action.using = Some("longsword".into());
    action.target = Some(WIZARD);

    // 9 + 5 = 14 against AC 12: a hit that +5 AC would turn into a miss.
    battle.dice().fudge(9, 20);

    let resolution = action.resolve(&session, &mut battle).unwrap();
    let Resolution::Pending(pending) = resolution else {
        panic!("a deferring controller must suspend resolution");
    };
    assert_eq!(pending.prompt.entity, WIZARD);
    let ReactionTrigger::ShieldSpell {
        attack_total,
        effective_ac,
        ..
    } = &pending.prompt.trigger;
    assert_eq!(*attack_total, 14);
    assert_eq!(*effective_ac, 12);

    battle.dice().fudge(4, 10);
    let items = action
        .resume(&session, &mut battle, *pending, ReactionDecision::Take)
        .unwrap()
        .expect_complete();

    let kinds: Vec<ItemKind> = items.iter().map(ResolvedItem::kind).collect();
    assert_eq!(kinds, vec![ItemKind::Shield, ItemKind::Miss]);

    h.apply.apply_all(&session, &mut battle, &items).unwrap();

    // No damage landed; the wizard paid a reaction and a slot and now has
    // the shield buff.
    assert_eq!(battle.combatant(WIZARD).unwrap().hp(), 12);
    assert_eq!(battle.resource_remaining(WIZARD, ActionResource::Reaction), 0);
    assert_eq!(battle.combatant(WIZARD).unwrap().spell_slots_count(1), 1);
    let now = battle.game_time();
    assert!(battle.combatant(WIZARD).unwrap().has_effect("shield", now));
    assert_eq!(battle.combatant(WIZARD).unwrap().armor_class(now), 17);

    // The buff self-dismisses when the wizard's next turn starts.
    battle.start_turn(WIZARD);
    let now = battle.game_time();
    assert!(!battle.combatant(WIZARD).unwrap().has_effect("shield", now));
    assert_eq!(battle.combatant(WIZARD).unwrap().armor_class(now), 12);
}

#[test]
fn declined_reaction_proceeds_with_no_extra_event() {
    let h = Harness::new();
    let session = Session::new(&h.catalog, &h.spells);
    let mut battle = common::skirmish(vec![fighter()], vec![wizard()]);
    battle.set_controller(WIZARD, Box::new(DeferController));

    let mut action = AttackAction::new(FIGHTER);
    action.using = Some("longsword".into());
    action.target = Some(WIZARD);

    battle.dice().fudge(9, 20);
    let Resolution::Pending(pending) = action.resolve(&session, &mut battle).unwrap() else {
        panic!("expected suspension");
    };

    battle.dice().fudge(4, 10);
    let items = action
        .resume(&session, &mut battle, *pending, ReactionDecision::Decline)
        .unwrap()
        .expect_complete();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].kind(), ItemKind::Damage);

    h.apply.apply_all(&session, &mut battle, &items).unwrap();
    // 4 + 3 damage landed; the reaction was not spent.
    assert_eq!(battle.combatant(WIZARD).unwrap().hp(), 5);
    assert_eq!(battle.resource_remaining(WIZARD, ActionResource::Reaction), 1);
}

#[test]
fn scripted_and_absent_controllers_skip_the_suspension() {
    let h = Harness::new();
    let session = Session::new(&h.catalog, &h.spells);

    // Scripted controller answers synchronously: no Pending.
    let mut battle = common::skirmish(vec![fighter()], vec![wizard()]);
    battle.set_controller(WIZARD, Box::new(ScriptedController(ReactionDecision::Take)));
    let mut action = AttackAction::new(FIGHTER);
    action.using = Some("longsword".into());
    action.target = Some(WIZARD);
    battle.dice().fudge(9, 20);
    battle.dice().fudge(4, 10);
    let items = action
        .resolve(&session, &mut battle)
        .unwrap()
        .expect_complete();
    assert_eq!(items[0].kind(), ItemKind::Shield);
    assert_eq!(items[1].kind(), ItemKind::Miss);

    // No controller at all: degrade to "no reaction taken", never fail.
    let mut battle = common::skirmish(vec![fighter()], vec![wizard()]);
    let mut action = AttackAction::new(FIGHTER);
    action.using = Some("longsword".into());
    action.target = Some(WIZARD);
    battle.dice().fudge(9, 20);
    battle.dice().fudge(4, 10);
    let items = action
        .resolve(&session, &mut battle)
        .unwrap()
        .expect_complete();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].kind(), ItemKind::Damage);
}

#[test]
fn what_if_queries_leave_the_action_untouched() {
    let h = Harness::new();
    let session = Session::new(&h.catalog, &h.spells);
    let battle = common::skirmish(vec![fighter()], vec![goblin()]);

    let mut action = AttackAction::new(FIGHTER);
    action.using = Some("longsword".into());
    action.target = Some(GOBLIN);

    // d20 + 5 vs AC 13: faces 8..20 hit, 13 of 20.
    let hit_prob = action.compute_hit_probability(&session, &battle).unwrap();
    assert!((hit_prob - 0.65).abs() < 1e-9);

    // Versatile longsword: 1d10 + 3 expected 8.5.
    let avg = action.avg_damage(&session, &battle).unwrap();
    assert!((avg - 8.5).abs() < 1e-9);

    assert!(action.result().is_empty());
    assert!(action.attack_roll.is_none());
}
