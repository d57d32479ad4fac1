use std::collections::HashSet;
use std::sync::Arc;

use lw_content::{Catalog, CompoundRequirement, EntityProperty};
use lw_core::{ChoiceId, EntityRef, Player, ResourceKind, SceneId};
use lw_engine::requirement::{evaluate, explain};
use lw_engine::trace::TraceParent;
use lw_engine::{
    EngineConfig, EngineError, GameSession, ResolutionMetadata, SceneState, ScriptedChallenges,
    SessionSnapshot,
};

const TAVERN: &str = include_str!("fixtures/tavern.json");

fn catalog() -> Arc<Catalog> {
    let (catalog, warnings) = Catalog::from_json(TAVERN).unwrap();
    assert!(warnings.is_empty(), "unexpected warnings: {warnings:?}");
    Arc::new(catalog)
}

fn session(config: EngineConfig) -> GameSession {
    GameSession::new(catalog(), config).unwrap()
}

fn pick(session: &GameSession, scene: SceneId, template_id: &str) -> ChoiceId {
    let situation = session.scene(scene).unwrap().current().unwrap();
    situation
        .choices
        .iter()
        .find(|c| c.template_id == template_id)
        .unwrap_or_else(|| panic!("no choice '{template_id}' in {}", situation.template_id))
        .id
}

fn play(session: &mut GameSession, steps: &[(&str, &str)]) {
    for (scene_template, choice_template) in steps {
        let scene = session
            .active_scenes()
            .find(|s| s.template_id == *scene_template)
            .map(|s| s.id)
            .unwrap();
        let choice = pick(session, scene, choice_template);
        session.execute_choice(scene, choice).unwrap();
    }
}

// ---------------------------------------------------------------------------
// Scenarios
// ---------------------------------------------------------------------------

#[test]
fn coin_grant_with_terminal_flag() {
    let mut session = session(EngineConfig::default());
    let scene = session.spawn_scene("lucky_find").unwrap();
    let before = session.state().player.resources.coins;
    let outcome = session
        .execute_choice(scene, pick(&session, scene, "pocket"))
        .unwrap();

    assert_eq!(session.state().player.resources.coins, before + 10);
    assert_eq!(outcome.receipt.resource_change(ResourceKind::Coins), 10);
    assert_eq!(outcome.scene_state, SceneState::Completed);
    assert_eq!(session.scene(scene).unwrap().state, SceneState::Completed);
}

#[test]
fn missing_merchant_is_created_from_defaults() {
    let mut session = session(EngineConfig::default());
    let npcs_before = session.state().world.npcs().len();
    let scene = session.spawn_scene("merchant_call").unwrap();

    assert_eq!(session.state().world.npcs().len(), npcs_before + 1);
    let trace = session.trace().unwrap();
    let node = trace.scene(trace.scene_node(scene).unwrap()).unwrap();
    let Some(ResolutionMetadata::Created {
        filter_provided,
        generated,
    }) = &node.placement_resolution
    else {
        panic!("expected a created placement, got {:?}", node.placement_resolution);
    };
    assert_eq!(filter_provided, &vec![EntityProperty::Profession]);
    assert!(!generated.is_empty());
    assert!(!generated.contains(&EntityProperty::Profession));
}

#[test]
fn second_requirement_path_can_satisfy() {
    let session = session(EngineConfig::default());
    let mut state = session.state().clone();
    state.player.resources.coins = 600;
    if let Some(elena) = state.world.find_npc_by_key("elena").map(|n| n.id) {
        state.world.npc_mut(elena).unwrap().bond = 10;
    }
    let requirement: CompoundRequirement = serde_json::from_str(
        r#"{ "OrPaths": [
            { "Requirements": [ { "Type": "BondStrength", "Context": "elena", "Threshold": 15 } ] },
            { "Requirements": [ { "Type": "Coins", "Threshold": 500 } ] }
        ] }"#,
    )
    .unwrap();

    assert!(evaluate(&requirement, &state));
    let paths = explain(&requirement, &state);
    assert!(!paths[0].satisfied);
    assert!(paths[1].satisfied);
}

#[test]
fn won_challenge_applies_success_branch_only() {
    let mut session =
        session(EngineConfig::default()).with_challenges(Box::new(ScriptedChallenges::new([true])));
    let scene = session.start()[0];
    let before = session.state().player.resources.coins;
    let outcome = session
        .execute_choice(scene, pick(&session, scene, "haggle"))
        .unwrap();

    assert!(outcome.challenge.as_ref().unwrap().succeeded);
    assert_eq!(session.state().player.resources.coins, before + 3);
    let trace = session.trace().unwrap();
    let choice = trace.choices().last().unwrap();
    assert_eq!(choice.challenge, outcome.challenge);
    let situation = trace.situation(choice.situation_node).unwrap();
    assert_eq!(situation.challenge_succeeded, Some(true));
}

// ---------------------------------------------------------------------------
// Previews and cascades
// ---------------------------------------------------------------------------

#[test]
fn taken_preview_becomes_active_and_is_linked() {
    let mut session = session(EngineConfig::default());
    let scene = session.start()[0];
    let chat = pick(&session, scene, "chat");
    let preview = session.scene(scene).unwrap().current().unwrap().choice(chat).unwrap().previews[0].id;

    let outcome = session.execute_choice(scene, chat).unwrap();
    assert_eq!(outcome.receipt.spawned().collect::<Vec<_>>(), vec![preview]);
    let room = session.scene(preview).unwrap();
    assert_eq!(room.state, SceneState::Active);
    assert!(room.current().unwrap().location.is_some());

    let trace = session.trace().unwrap();
    let node = trace.scene(trace.scene_node(preview).unwrap()).unwrap();
    assert_eq!(node.state, SceneState::Active);
    let TraceParent::Choice(choice_node) = node.parent else {
        panic!("preview should hang off the executed choice");
    };
    assert!(trace.choice(choice_node).unwrap().spawned_scenes.contains(&node.id));
}

#[test]
fn untaken_preview_is_discarded_with_its_resources() {
    let mut session = session(EngineConfig::default());
    let scene = session.start()[0];
    let chat = pick(&session, scene, "chat");
    let preview = session.scene(scene).unwrap().current().unwrap().choice(chat).unwrap().previews[0].clone();
    assert!(!preview.dependents.is_empty());

    session
        .execute_choice(scene, pick(&session, scene, "pay"))
        .unwrap();
    for id in &preview.dependents.locations {
        assert!(session.state().world.location(*id).is_none());
    }
    assert!(session.scene(preview.id).is_none());
    let trace = session.trace().unwrap();
    assert!(trace.scene(trace.scene_node(preview.id).unwrap()).unwrap().discarded);
    assert!(trace.export_markdown().contains("Untaken previews"));
}

#[test]
fn other_scenes_never_bind_to_preview_resources() {
    let mut session = session(EngineConfig::default());
    let scene = session.start()[0];
    let chat = pick(&session, scene, "chat");
    let preview = session.scene(scene).unwrap().current().unwrap().choice(chat).unwrap().previews[0].clone();

    let hideout = session.spawn_scene("hideout").unwrap();
    let Some(EntityRef::Location(spot)) = session.scene(hideout).unwrap().placement else {
        panic!("expected location placement");
    };
    assert!(!preview.dependents.locations.contains(&spot));

    session
        .execute_choice(scene, pick(&session, scene, "leave"))
        .unwrap();
    assert!(session.scene(preview.id).is_none());
    assert!(session.state().world.location(spot).is_some());
    assert!(session.scene(hideout).unwrap().is_active());
}

#[test]
fn cascade_spawns_when_no_preview_was_possible() {
    let mut session = session(EngineConfig::default());
    let scene = session.spawn_scene("street_rumor").unwrap();
    let outcome = session
        .execute_choice(scene, pick(&session, scene, "follow"))
        .unwrap();

    let spawned: Vec<SceneId> = outcome.receipt.spawned().collect();
    assert_eq!(spawned.len(), 1);
    let watch = session.scene(spawned[0]).unwrap();
    assert_eq!(watch.template_id, "night_watch");
    assert!(watch.is_active());
    assert_eq!(watch.depth, 1);
}

#[test]
fn dependent_item_ends_up_in_inventory() {
    let mut session = session(EngineConfig::default());
    let room = session.spawn_scene("private_room").unwrap();
    let key = session.scene(room).unwrap().dependents.items[0];
    session
        .execute_choice(room, pick(&session, room, "take_key"))
        .unwrap();
    assert!(session.state().player.has_item(key));

    session.advance_time(32);
    assert_eq!(session.scene(room).unwrap().state, SceneState::Completed);
    assert!(session.state().player.has_item(key), "completed scenes keep their resources");
}

// ---------------------------------------------------------------------------
// Invariants
// ---------------------------------------------------------------------------

#[test]
fn unaffordable_choice_has_no_partial_effect() {
    let mut session = session(EngineConfig::default())
        .with_player(Player {
            resources: lw_core::player::Resources {
                coins: 2,
                ..Default::default()
            },
            ..Player::new("Broke")
        });
    let scene = session.start()[0];
    let before = session.snapshot();
    let err = session
        .execute_choice(scene, pick(&session, scene, "pay"))
        .unwrap_err();
    assert!(matches!(err, EngineError::Unaffordable { .. }));
    assert_eq!(session.snapshot(), before);
}

#[test]
fn unmet_requirement_is_rejected() {
    let mut session = session(EngineConfig::default());
    let scene = session.start()[0];
    session
        .execute_choice(scene, pick(&session, scene, "pay"))
        .unwrap();
    let mut broke = session.snapshot();
    broke.state.player.resources.coins = 0;
    let mut session = GameSession::restore(catalog(), broke, EngineConfig::default()).unwrap();
    let err = session
        .execute_choice(scene, pick(&session, scene, "tip"))
        .unwrap_err();
    assert!(matches!(err, EngineError::RequirementsNotMet(_)));
}

#[test]
fn tracing_does_not_change_the_game() {
    let steps = [("tavern_welcome", "chat"), ("private_room", "take_key"), ("tavern_welcome", "rest")];
    let mut traced = session(EngineConfig::default().with_trace(true));
    let mut silent = session(EngineConfig::default().with_trace(false));
    traced.start();
    silent.start();
    play(&mut traced, &steps);
    play(&mut silent, &steps);

    assert!(silent.trace().is_none());
    assert!(!traced.trace().unwrap().is_empty());
    assert_eq!(traced.state(), silent.state());
    assert_eq!(traced.scenes(), silent.scenes());
}

#[test]
fn snapshot_round_trips_through_json() {
    let mut session = session(EngineConfig::default());
    session.start();
    play(&mut session, &[("tavern_welcome", "chat")]);

    let snapshot = session.snapshot();
    let json = snapshot.to_json().unwrap();
    let decoded = SessionSnapshot::from_json(&json).unwrap();
    assert_eq!(decoded, snapshot);

    let restored = GameSession::restore(catalog(), decoded, EngineConfig::default()).unwrap();
    assert_eq!(restored.state(), session.state());
    assert_eq!(restored.scenes(), session.scenes());
    assert_eq!(restored.trace(), session.trace());
    assert_eq!(restored.turn(), 1);
}

#[test]
fn incompatible_snapshot_is_refused() {
    let mut snapshot = session(EngineConfig::default()).snapshot();
    snapshot.version += 1;
    let err = GameSession::restore(catalog(), snapshot, EngineConfig::default())
        .err()
        .unwrap();
    assert!(matches!(err, EngineError::SnapshotVersion { .. }));
}

#[test]
fn repeated_resolution_reuses_the_created_entity() {
    let mut session = session(EngineConfig::default());
    let first = session.spawn_scene("merchant_call").unwrap();
    let npcs = session.state().world.npcs().len();
    let second = session.spawn_scene("merchant_call").unwrap();

    assert_eq!(session.state().world.npcs().len(), npcs);
    assert_eq!(
        session.scene(first).unwrap().placement,
        session.scene(second).unwrap().placement
    );
}

#[test]
fn every_choice_and_situation_has_one_owner() {
    let mut session = session(EngineConfig::default());
    session.start();
    session.spawn_scene("journey").unwrap();
    play(&mut session, &[("tavern_welcome", "chat")]);

    let mut situations = HashSet::new();
    let mut choices = HashSet::new();
    let mut stack: Vec<&lw_engine::Scene> = session.scenes().iter().collect();
    while let Some(scene) = stack.pop() {
        for situation in &scene.situations {
            assert!(situations.insert(situation.id), "situation owned twice");
            for choice in &situation.choices {
                assert!(choices.insert(choice.id), "choice owned twice");
                stack.extend(choice.previews.iter());
            }
        }
    }
    assert!(!choices.is_empty());
}
