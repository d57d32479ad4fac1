//! Shared fixtures for unit tests.

use rand::SeedableRng;
use rand::rngs::StdRng;

use lw_content::{Catalog, Consequence};
use lw_core::{ChoiceId, GameClock, GameState, Player, SceneId, SituationId, WorldMeta};

use crate::lifecycle::SceneState;
use crate::scene::{Choice, DependentResources, Scene, Situation, SpawnTrigger};

pub const FIXTURE_JSON: &str = include_str!("../tests/fixtures/tavern.json");

pub fn fixture_catalog() -> Catalog {
    let (catalog, _warnings) = Catalog::from_json(FIXTURE_JSON).expect("fixture content is valid");
    catalog
}

/// Fresh world from the fixture with the player standing in the inn.
pub fn fixture_state(catalog: &Catalog) -> GameState {
    let world = catalog
        .new_world(WorldMeta::new("Fixture"), &mut StdRng::seed_from_u64(7))
        .expect("fixture world installs");
    let mut player = Player::new("Wren");
    player.location = world.find_location_by_key("inn").map(|l| l.id);
    GameState::new(player, world)
}

fn bare_choice(template_id: &str) -> Choice {
    Choice {
        id: ChoiceId::new(),
        template_id: template_id.into(),
        action_text: format!("Do {template_id}"),
        path_type: Default::default(),
        action_type: Default::default(),
        requirement: Default::default(),
        consequence: Consequence::terminal(),
        on_success: None,
        on_failure: None,
        challenge: None,
        previews: Vec::new(),
    }
}

/// A scene with one situation and two terminal choices, bound to nothing.
pub fn bare_scene(state: SceneState) -> Scene {
    let situation = Situation {
        id: SituationId::new(),
        template_id: "only".into(),
        name: "Only".into(),
        situation_type: Default::default(),
        description: "Nothing happens.".into(),
        location: None,
        npc: None,
        route: None,
        choices: vec![bare_choice("first"), bare_choice("second")],
        completed: false,
    };
    Scene {
        id: SceneId::new(),
        template_id: "bare".into(),
        display_name: "Bare Scene".into(),
        intro: String::new(),
        archetype: Default::default(),
        presentation_mode: Default::default(),
        progression_mode: Default::default(),
        placement: None,
        state,
        current_situation: (!state.is_terminal()).then_some(situation.id),
        situations: vec![situation],
        spawned_at: GameClock::default(),
        expires_on_day: None,
        trigger: SpawnTrigger::Manual,
        depth: 0,
        parent_choice: None,
        dependents: DependentResources::default(),
    }
}
