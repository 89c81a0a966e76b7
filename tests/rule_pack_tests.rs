/// Shipped rule packs: loading, linting and resolution with real event context.

use callout_engine::core::events::{collect_actor_rules, CONTEXT_PREFIXES};
use callout_engine::core::grammar::{GrammarRequest, RulePackSet, TemplateResolver, ROOT_KEYWORD};
use callout_engine::schema::actor::{Actor, ActorId, Weapon};
use callout_engine::schema::location::{Cell, MapId};
use callout_engine::schema::pool::PoolId;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::Path;

fn shipped_packs() -> RulePackSet {
    let mut set = RulePackSet::new();
    let mut paths: Vec<_> = std::fs::read_dir("callout_data/rule_packs")
        .unwrap()
        .map(|entry| entry.unwrap().path())
        .collect();
    paths.sort();
    for path in paths {
        set.merge(RulePackSet::load_from_ron(&path).unwrap());
    }
    set
}

#[test]
fn shipped_packs_load() {
    let set = shipped_packs();
    for pool in [PoolId::drafted(), PoolId::melee_attack(), PoolId::ranged_attack()] {
        assert!(set.get(&pool).is_some(), "Missing pack: {}", pool);
        assert!(set.rule_count(&pool, ROOT_KEYWORD) > 0);
    }
    assert!(set.get(&PoolId::new("common")).is_some());
}

#[test]
fn shipped_packs_lint_clean() {
    let issues = shipped_packs().lint(CONTEXT_PREFIXES);
    assert!(
        issues.is_empty(),
        "Lint issues: {:?}",
        issues.iter().map(ToString::to_string).collect::<Vec<_>>()
    );
}

#[test]
fn fixture_packs_share_common_rules() {
    let set = RulePackSet::load_from_ron(Path::new("tests/fixtures/test_rule_packs.ron")).unwrap();
    assert_eq!(set.rule_count(&PoolId::drafted(), ROOT_KEYWORD), 2);
    assert_eq!(set.rule_count(&PoolId::melee_attack(), ROOT_KEYWORD), 3);
    assert_eq!(set.rule_count(&PoolId::new("common"), "greeting"), 2);
    assert!(set.lint(CONTEXT_PREFIXES).is_empty());
}

#[test]
fn every_shipped_pool_resolves_with_full_context() {
    let set = shipped_packs();
    let mut initiator = Actor::new(ActorId(1), "Ada", MapId(0), Cell::new(0, 0));
    initiator.weapon = Some(Weapon {
        quality: Some("good".to_string()),
        ..Weapon::new("assault rifle")
    });
    let recipient = Actor::new(ActorId(2), "raider", MapId(0), Cell::new(4, 0));

    let mut request = GrammarRequest::new();
    collect_actor_rules(&initiator, "INITIATOR", &mut request);
    collect_actor_rules(&recipient, "RECIPIENT", &mut request);
    request.set_rule("INITIATOR_COVER_label", "wall");
    request.set_rule("RECIPIENT_COVER_label", "sandbags");

    for pool in [PoolId::drafted(), PoolId::melee_attack(), PoolId::ranged_attack()] {
        for seed in 0..30 {
            let mut rng = StdRng::seed_from_u64(seed);
            let text = set.resolve(&pool, &request, &mut rng);
            assert!(text.is_some(), "{} failed to resolve with seed {}", pool, seed);
            assert!(!text.unwrap().contains('{'));
        }
    }
}

#[test]
fn missing_context_falls_back_to_plain_lines() {
    let set = shipped_packs();
    let request = GrammarRequest::new();
    for seed in 0..30 {
        let mut rng = StdRng::seed_from_u64(seed);
        assert!(set.resolve(&PoolId::ranged_attack(), &request, &mut rng).is_some());
    }
}

#[test]
fn spicy_constant_unlocks_rules() {
    let set = shipped_packs();
    let mut request = GrammarRequest::new();
    request.set_constant("SPICY", "true");
    request.set_rule("INITIATOR_label", "Ada");

    let mut saw_blood = false;
    for seed in 0..100 {
        let mut rng = StdRng::seed_from_u64(seed);
        let text = set.resolve(&PoolId::drafted(), &request, &mut rng).unwrap();
        assert_ne!(text, "Keep your heads down, everyone.");
        saw_blood |= text == "Finally, some blood!";
    }
    assert!(saw_blood);
}

#[test]
fn melee_lines_mention_weapon_quality_when_known() {
    let set = shipped_packs();
    let mut fighter = Actor::new(ActorId(1), "Ada", MapId(0), Cell::new(0, 0));
    fighter.weapon = Some(Weapon {
        quality: Some("masterwork".to_string()),
        ..Weapon::new("gladius")
    });
    let mut request = GrammarRequest::new();
    collect_actor_rules(&fighter, "INITIATOR", &mut request);

    let saw_quality = (0..200).any(|seed| {
        let mut rng = StdRng::seed_from_u64(seed);
        set.resolve(&PoolId::melee_attack(), &request, &mut rng)
            .is_some_and(|text| text == "This masterwork gladius will do!")
    });
    assert!(saw_quality);

    fighter.weapon = Some(Weapon::new("gladius"));
    let mut request = GrammarRequest::new();
    collect_actor_rules(&fighter, "INITIATOR", &mut request);
    for seed in 0..200 {
        let mut rng = StdRng::seed_from_u64(seed);
        let text = set.resolve(&PoolId::melee_attack(), &request, &mut rng).unwrap();
        assert!(!text.starts_with("This "));
    }
}
