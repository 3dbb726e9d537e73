use proptest::prelude::*;
use rand::SeedableRng;

use mv_core::follower::FollowerTemplate;
use mv_core::opponent::OpponentTemplate;
use mv_core::{Element, Follower, FollowerId, GearSlot, QuestState};

use super::*;

fn catalogs() -> Catalogs {
    Catalogs::builtin().unwrap()
}

fn sure_hits() -> CombatOdds {
    CombatOdds {
        miss_chance: 0.0,
        crit_chance: 0.0,
    }
}

fn foe(name: &str, hp: i32, atk: i32, action_chance: f64) -> Opponent {
    let t: OpponentTemplate = serde_json::from_value(serde_json::json!({
        "name": name, "hp": hp, "atk": atk, "defense": 1, "action_chance": action_chance
    }))
    .unwrap();
    Opponent::from_template(&t)
}

fn attack() -> Action {
    Action::Attack { target: None }
}

#[test]
fn killing_blow_banks_loot_and_pays_out() {
    let cat = catalogs();
    let ctx = CombatContext::new(&cat).with_odds(sure_hits());
    let mut rng = StdRng::seed_from_u64(1);
    let mut hero = Player::default();
    let mut slime = foe("Slime", 8, 1, 1.0);
    slime.hp.current = 1;
    let mut enc = Encounter::new(vec![slime]);

    let out = resolve_round(&mut hero, &mut enc, &attack(), &ctx, &mut rng).unwrap();
    assert!(out.performed);
    let lines = out.messages();
    assert_eq!(lines[0], "You strike down the Slime.");
    assert!(lines.iter().any(|l| l.starts_with("You gain ")), "{lines:?}");
    assert_eq!(lines.last().unwrap(), "All is quiet. No enemies in sight.");
    assert!(out.events.contains(&BattleEvent::OpponentsDefeated(vec![0])));
    assert!(out.events.contains(&BattleEvent::BattleWon));
    assert!((4..=8).contains(&hero.xp));
    assert!((14..=18).contains(&hero.gold));
    assert!(enc.opponents.is_empty());
    assert!(enc.loot.is_empty());
}

#[test]
fn refused_cast_changes_nothing() {
    let cat = catalogs();
    let ctx = CombatContext::new(&cat);
    let mut rng = StdRng::seed_from_u64(2);
    let mut hero = Player::default();
    hero.mp.current = 1;
    let mut enc = Encounter::new(vec![foe("Slime", 8, 4, 1.0)]);
    let (hero_before, enc_before) = (hero.clone(), enc.clone());

    let cast = Action::Cast {
        spell: "spark".into(),
        target: None,
        team_target: None,
        rank: None,
    };
    let out = resolve_round(&mut hero, &mut enc, &cast, &ctx, &mut rng).unwrap();
    assert!(!out.performed);
    assert_eq!(out.messages(), vec!["Not enough MP to cast Spark."]);
    assert_eq!(hero, hero_before);
    assert_eq!(enc, enc_before);
}

#[test]
fn unknown_spell_is_an_error() {
    let cat = catalogs();
    let ctx = CombatContext::new(&cat);
    let mut rng = StdRng::seed_from_u64(3);
    let cast = Action::Cast {
        spell: "meteor".into(),
        target: None,
        team_target: None,
        rank: None,
    };
    let err = resolve_round(
        &mut Player::default(),
        &mut Encounter::new(vec![foe("Slime", 8, 4, 1.0)]),
        &cast,
        &ctx,
        &mut rng,
    )
    .unwrap_err();
    assert_eq!(err, MechError::UnknownSpell("meteor".into()));
}

#[test]
fn rank_two_spell_hits_every_living_opponent() {
    let cat = catalogs();
    let ctx = CombatContext::new(&cat).with_odds(sure_hits());
    let mut rng = StdRng::seed_from_u64(4);
    let mut hero = Player::default();
    hero.level = 3;
    let mut enc = Encounter::new(vec![foe("Slime", 200, 1, 0.0), foe("Wolf", 200, 1, 0.0)]);
    let cast = Action::Cast {
        spell: "spark".into(),
        target: Some(1),
        team_target: None,
        rank: None,
    };
    let out = resolve_round(&mut hero, &mut enc, &cast, &ctx, &mut rng).unwrap();
    assert!(out.performed);
    assert_eq!(enc.last_spell_targets, vec![0, 1]);
    assert_eq!(hero.mp.current, 6);
    assert!(out.messages()[0].contains("Slime") && out.messages()[0].contains("Wolf"));
    assert!(enc.opponents.iter().all(|o| o.hp.current < 200));
}

#[test]
fn rank_one_choice_hits_only_the_chosen_opponent() {
    let cat = catalogs();
    let ctx = CombatContext::new(&cat).with_odds(sure_hits());
    let mut rng = StdRng::seed_from_u64(4);
    let mut hero = Player::default();
    hero.level = 3;
    let mut enc = Encounter::new(vec![foe("Slime", 200, 1, 0.0), foe("Wolf", 200, 1, 0.0)]);
    let cast = Action::Cast {
        spell: "spark".into(),
        target: Some(1),
        team_target: None,
        rank: Some(1),
    };
    let out = resolve_round(&mut hero, &mut enc, &cast, &ctx, &mut rng).unwrap();
    assert!(out.performed);
    assert_eq!(enc.last_spell_targets, vec![1]);
    assert_eq!(hero.mp.current, 8);
    assert_eq!(enc.opponents[0].hp.current, 200);
    assert!(enc.opponents[1].hp.current < 200);
}

#[test]
fn defend_raises_guard_until_next_action() {
    let cat = catalogs();
    let ctx = CombatContext::new(&cat).with_odds(sure_hits());
    let mut rng = StdRng::seed_from_u64(5);
    let mut hero = Player::default();
    let mut enc = Encounter::new(vec![foe("Slime", 200, 1, 0.0)]);

    let out = resolve_round(&mut hero, &mut enc, &Action::Defend, &ctx, &mut rng).unwrap();
    assert_eq!(out.messages(), vec!["You brace for impact.", "The Slime hesitates."]);
    assert_eq!(
        enc.stance,
        Some(DefendStance {
            defense: 2,
            evasion: 0.05
        })
    );
    resolve_round(&mut hero, &mut enc, &attack(), &ctx, &mut rng).unwrap();
    assert_eq!(enc.stance, None);
}

#[test]
fn follower_kill_during_defend_leaves_the_battle_open() {
    let cat = catalogs();
    let ctx = CombatContext::new(&cat).with_odds(sure_hits());
    let mut rng = StdRng::seed_from_u64(17);
    let mut hero = Player::default();
    let mut rex = Follower::new(FollowerId(0), "wolf", "Rex");
    rex.atk = 50;
    hero.add_follower(rex);
    let mut slime = foe("Slime", 8, 1, 0.0);
    slime.hp.current = 1;
    let mut enc = Encounter::new(vec![slime]);

    let out = resolve_round(&mut hero, &mut enc, &Action::Defend, &ctx, &mut rng).unwrap();
    assert!(out.performed);
    assert!(!enc.any_alive());
    assert!(!out.events.contains(&BattleEvent::BattleWon));
    assert!(!out.events.iter().any(|e| matches!(e, BattleEvent::OpponentsDefeated(_))));
    assert_eq!(enc.opponents.len(), 1);
    assert!(!enc.opponents[0].melted);
    assert!(!enc.loot.is_empty());
    assert_eq!(hero.xp, 0);
}

#[test]
fn stunned_opponent_loses_its_turn() {
    let cat = catalogs();
    let ctx = CombatContext::new(&cat);
    let mut rng = StdRng::seed_from_u64(6);
    let mut hero = Player::default();
    let mut slime = foe("Slime", 200, 50, 1.0);
    slime.stunned_turns = 2;
    let mut enc = Encounter::new(vec![slime]);
    let out = resolve_round(&mut hero, &mut enc, &Action::Defend, &ctx, &mut rng).unwrap();
    assert_eq!(out.messages()[1], "The Slime is stunned.");
    assert_eq!(enc.opponents[0].stunned_turns, 1);
    assert_eq!(hero.hp.current, 50);
}

#[test]
fn elemental_opponents_are_blunted_by_armor_points() {
    let cat = catalogs();
    let ctx = CombatContext::new(&cat).with_odds(sure_hits());
    let mut rng = StdRng::seed_from_u64(7);
    let mut hero = Player::default();
    hero.defense = 0;
    let mut ember = foe("Ember Goblin", 200, 6, 1.0);
    ember.element = Element::Fire;
    let armor = mv_core::item::ItemDef {
        name: "Ember Mail".into(),
        kind: mv_core::item::ItemKind::Gear,
        slot: Some(GearSlot::Armor),
        elem_points: [(Element::Fire, 100)].into(),
        ..Default::default()
    };
    hero.add_gear("ember_mail", &armor);
    let mut enc = Encounter::new(vec![ember]);
    let out = resolve_round(&mut hero, &mut enc, &Action::Defend, &ctx, &mut rng).unwrap();
    assert_eq!(out.messages()[1], "The Ember Goblin hits you for 1.");
    assert_eq!(hero.hp.current, 49);
}

#[test]
fn falling_in_battle_costs_half_the_gold() {
    let cat = catalogs();
    let ctx = CombatContext::new(&cat).with_odds(sure_hits());
    let mut rng = StdRng::seed_from_u64(8);
    let mut hero = Player::default();
    hero.hp.current = 1;
    hero.temp_atk_bonus = 7;
    let mut enc = Encounter::new(vec![foe("Ogre", 500, 100, 1.0), foe("Slime", 500, 100, 1.0)]);

    let out = resolve_round(&mut hero, &mut enc, &Action::Defend, &ctx, &mut rng).unwrap();
    assert!(out.player_defeated());
    assert_eq!(
        out.messages().last().unwrap(),
        "You were defeated and wake up at the inn. You lost 5 GP."
    );
    assert_eq!(hero.gold, 5);
    assert!(hero.hp.is_full() && hero.mp.is_full());
    assert_eq!(hero.temp_atk_bonus, 0);
    assert!(enc.opponents.is_empty());
    assert!(!out.messages().iter().any(|m| m.contains("Slime")));
}

#[test]
fn flee_needs_someone_to_flee_from() {
    let cat = catalogs();
    let ctx = CombatContext::new(&cat);
    let mut rng = StdRng::seed_from_u64(9);
    let out = resolve_round(&mut Player::default(), &mut Encounter::default(), &Action::Flee, &ctx, &mut rng)
        .unwrap();
    assert!(!out.performed);
    assert_eq!(out.messages(), vec!["There is nothing to flee from."]);
}

#[test]
fn successful_flee_ends_the_encounter() {
    let cat = catalogs();
    let ctx = CombatContext::new(&cat);
    let mut rng = StdRng::seed_from_u64(10);
    let mut hero = Player::default();
    hero.level = 10;
    let mut enc = Encounter::new(vec![foe("Slime", 200, 1, 0.0)]);
    for _ in 0..50 {
        let out = resolve_round(&mut hero, &mut enc, &Action::Flee, &ctx, &mut rng).unwrap();
        if out.messages() == vec!["You flee to safety."] {
            assert!(enc.opponents.is_empty());
            return;
        }
        assert_eq!(out.messages()[0], "You fail to flee.");
    }
    panic!("never escaped");
}

#[test]
fn socialize_respects_recruit_restriction() {
    let cat = catalogs();
    let ctx = CombatContext::new(&cat);
    let mut rng = StdRng::seed_from_u64(11);
    let mut hero = Player::default();
    hero.flags.recruit_only_types = vec!["mushroom_baby".into()];
    let fairy = Opponent::from_template(&cat.opponents.base_opponents["fairy"]);
    let mut enc = Encounter::new(vec![fairy]);
    let out = resolve_round(&mut hero, &mut enc, &Action::Socialize { target: None }, &ctx, &mut rng).unwrap();
    assert!(!out.performed);
    assert_eq!(out.messages(), vec!["Why would I want to join your group?"]);
    assert_eq!(hero.gold, 10);
}

#[test]
fn recruiting_the_last_opponent_ends_the_battle() {
    let cat = catalogs();
    let ctx = CombatContext::new(&cat);
    let mut rng = StdRng::seed_from_u64(12);
    let mut hero = Player::default();
    hero.quests.insert("first_friend".into(), QuestState::active());
    hero.flags.raise("into_the_woods_done");
    let mut mushroom = Opponent::from_template(&cat.opponents.base_opponents["mushroom"]);
    mushroom.recruit_chance = 1.0;
    let mut enc = Encounter::new(vec![mushroom]);

    let out = resolve_round(&mut hero, &mut enc, &Action::Socialize { target: None }, &ctx, &mut rng).unwrap();
    let lines = out.messages();
    assert!(lines[0].ends_with(" joins your party. Quest complete: A First Friend."), "{lines:?}");
    assert_eq!(hero.gold, 5);
    assert_eq!(hero.followers().len(), 1);
    assert_eq!(hero.followers()[0].kind, "mushroom_baby");
    assert_eq!(hero.followers()[0].mp.max, 8);
    assert!(out.events.contains(&BattleEvent::BattleWon));
    assert_eq!(lines.last().unwrap(), "All is quiet. No enemies in sight.");
}

#[test]
fn recruited_mage_brings_a_starter_wand() {
    let cat = catalogs();
    let ctx = CombatContext::new(&cat);
    let mut rng = StdRng::seed_from_u64(13);
    let mut hero = Player::new("Ada", 100);
    let mut mage = Opponent::from_template(&cat.opponents.base_opponents["mushroom_mage"]);
    mage.recruit_chance = 1.0;
    let mut enc = Encounter::new(vec![mage]);
    resolve_round(&mut hero, &mut enc, &Action::Socialize { target: None }, &ctx, &mut rng).unwrap();

    let follower = &hero.followers()[0];
    assert_eq!(follower.spells, vec!["healing".to_string(), "strength".to_string()]);
    assert!(hero.follower_gear(follower, GearSlot::Wand).is_some());
    assert!(!hero.has_wand());
    assert!(hero.owner_index_consistent());
}

#[test]
fn caster_follower_heals_a_hurt_player() {
    let cat = catalogs();
    let ctx = CombatContext::new(&cat).with_odds(sure_hits());
    let mut rng = StdRng::seed_from_u64(14);
    let mut hero = Player::default();
    hero.hp.current = 20;
    let mut mage = Follower::new(FollowerId(0), "mushroom_mage", "Miranda");
    mage.apply_template(cat.followers.template("mushroom_mage").unwrap());
    hero.add_follower(mage);
    let mut enc = Encounter::new(vec![foe("Slime", 200, 1, 0.0)]);

    let out = resolve_round(&mut hero, &mut enc, &Action::Defend, &ctx, &mut rng).unwrap();
    assert!(out.messages().contains(&"Miranda casts Life Boost.".to_string()));
    assert_eq!(hero.followers()[0].mp.current, 3);
    assert_eq!(hero.temp_hp_bonus, 9);
    assert_eq!(hero.hp.current, 30);
}

#[test]
fn follower_wand_casts_are_not_boosted_by_default() {
    let cat = catalogs();
    let ctx = CombatContext::new(&cat).with_odds(sure_hits());
    let wand = mv_core::item::ItemDef {
        name: "Fire Wand".into(),
        kind: mv_core::item::ItemKind::Gear,
        slot: Some(GearSlot::Wand),
        element: Some(Element::Fire),
        ..Default::default()
    };
    let fireblast = cat.spell("fireblast").unwrap();
    assert_eq!(fireblast.rank3_damage_mult, None);

    for seed in 0..40 {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut hero = Player::default();
        hero.add_follower(Follower::new(FollowerId(0), "wolf", "Rex"));
        let id = hero.add_gear("fire_wand", &wand).unwrap();
        assert!(hero.assign_gear_to_follower(0, &id));
        let rex = hero.followers()[0].clone();
        let atk = rex.total_atk(hero.gear()) + fireblast.atk_bonus + rex.element_points(hero.gear(), Element::Fire);
        let mut enc = Encounter::new(vec![foe("Slime", 500, 1, 0.0)]);

        let out = resolve_round(&mut hero, &mut enc, &Action::Defend, &ctx, &mut rng).unwrap();
        assert!(out.messages().iter().any(|m| m.contains("Fireblast")), "{:?}", out.messages());
        let dealt = 500 - enc.opponents[0].hp.current;
        assert!(dealt <= (atk - 1).max(1), "seed {seed}: {dealt} > {}", atk - 1);
    }
}

#[test]
fn end_of_round_heal_falls_back_by_level() {
    let cat = catalogs();
    let ctx = CombatContext::new(&cat).with_odds(sure_hits());
    let mut rng = StdRng::seed_from_u64(15);
    let mut hero = Player::default();
    hero.hp.current = 10;
    let mut fairy = Follower::new(FollowerId(0), "fairy", "Pip");
    fairy.apply_template(&FollowerTemplate {
        abilities: vec!["fairy_mana".into(), "fairy_heal".into()],
        ..FollowerTemplate::default()
    });
    hero.add_follower(fairy);
    let mut enc = Encounter::new(vec![foe("Slime", 200, 1, 0.0)]);

    let out = resolve_round(&mut hero, &mut enc, &Action::Defend, &ctx, &mut rng).unwrap();
    let glow = out
        .messages()
        .into_iter()
        .find(|m| m.starts_with("Pip uses Fairy Glow and restores "))
        .unwrap();
    assert!(glow.ends_with(" HP."));
    assert_eq!(hero.followers()[0].active_ability, "fairy_heal");
    assert!((12..=14).contains(&hero.hp.current));
}

#[test]
fn level_up_reports_notes() {
    let cat = catalogs();
    let ctx = CombatContext::new(&cat).with_odds(sure_hits());
    let mut rng = StdRng::seed_from_u64(16);
    let mut hero = Player::default();
    hero.xp = 49;
    let mut slime = foe("Slime", 8, 1, 1.0);
    slime.hp.current = 1;
    let mut enc = Encounter::new(vec![slime]);
    let out = resolve_round(&mut hero, &mut enc, &attack(), &ctx, &mut rng).unwrap();
    let level_up = out
        .events
        .iter()
        .find_map(|e| match e {
            BattleEvent::LevelUp { levels, notes } => Some((*levels, notes.clone())),
            _ => None,
        })
        .unwrap();
    assert_eq!(level_up.0, 1);
    assert!(level_up.1.contains(&"New spell: Boulder (Rank 1)".to_string()), "{:?}", level_up.1);
    assert!(hero.needs_level_up());
}

proptest! {
    #[test]
    fn rounds_keep_state_sane(seed in any::<u64>(), rounds in 1usize..12) {
        let cat = catalogs();
        let ctx = CombatContext::new(&cat);
        let mut rng = StdRng::seed_from_u64(seed);
        let mut hero = Player::default();
        let opponents = crate::spawn::spawn_encounter(&cat.opponents, 3, Element::Base, &mut rng);
        let mut enc = Encounter::new(opponents);
        for _ in 0..rounds {
            let out = resolve_round(&mut hero, &mut enc, &attack(), &ctx, &mut rng).unwrap();
            prop_assert!(hero.hp.current > 0);
            prop_assert!(enc.opponents.iter().all(|o| o.hp.current >= 0));
            prop_assert!(hero.owner_index_consistent());
            if enc.opponents.is_empty() {
                let won = out.events.contains(&BattleEvent::BattleWon);
                prop_assert!(won || out.player_defeated() || !out.performed);
            }
        }
    }
}
