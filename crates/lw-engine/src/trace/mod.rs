//! Spawn trace: an append-only provenance graph of every scene spawn,
//! situation spawn, and choice execution in a session.
//!
//! Nodes live in three arenas and refer to each other by index. Recording
//! only reads game state; a session with tracing off plays identically.

pub mod export;
pub mod node;
pub mod snapshot;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use lw_core::{GameClock, Player, SceneId, SituationId, World};

use crate::consequence::AppliedEffect;
use crate::external::ChallengeOutcome;
use crate::lifecycle::SceneState;
use crate::resolver::ResolutionMetadata;
use crate::scene::{Choice, Scene, Situation};

pub use node::{
    ChoiceExecutionNode, ChoiceNodeId, SceneNodeId, SceneSpawnNode, SituationNodeId,
    SituationSpawnNode, SlotResolution, TraceParent,
};
pub use snapshot::{LocationSnapshot, NpcSnapshot, PlacementSnapshot, PlayerSnapshot, RouteSnapshot};

/// The provenance graph.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SpawnTrace {
    scenes: Vec<SceneSpawnNode>,
    situations: Vec<SituationSpawnNode>,
    choices: Vec<ChoiceExecutionNode>,
    roots: Vec<SceneNodeId>,
}

impl SpawnTrace {
    /// Empty trace.
    pub fn new() -> Self {
        Self::default()
    }

    // -----------------------------------------------------------------------
    // Recording
    // -----------------------------------------------------------------------

    /// Record a scene spawn, snapshotting its placement.
    pub fn record_scene_spawn(
        &mut self,
        scene: &Scene,
        world: &World,
        parent: TraceParent,
        placement_resolution: Option<ResolutionMetadata>,
    ) -> SceneNodeId {
        let id = SceneNodeId(self.scenes.len());
        let now = Utc::now();
        self.scenes.push(SceneSpawnNode {
            id,
            scene: scene.id,
            template_id: scene.template_id.clone(),
            display_name: scene.display_name.clone(),
            trigger: scene.trigger,
            depth: scene.depth,
            parent,
            placement: scene
                .placement
                .and_then(|p| PlacementSnapshot::capture(world, p)),
            placement_resolution,
            state: scene.state,
            spawned_at: scene.spawned_at,
            recorded_at: now,
            activated_at: (scene.state == SceneState::Active).then_some(now),
            completed_at: None,
            discarded: false,
            situations: Vec::new(),
        });
        if parent == TraceParent::Root {
            self.roots.push(id);
        }
        id
    }

    /// Record a situation spawn under a scene node.
    pub fn record_situation_spawn(
        &mut self,
        scene_node: SceneNodeId,
        situation: &Situation,
        world: &World,
        resolutions: Vec<SlotResolution>,
    ) -> SituationNodeId {
        let id = SituationNodeId(self.situations.len());
        self.situations.push(SituationSpawnNode {
            id,
            scene_node,
            situation: situation.id,
            template_id: situation.template_id.clone(),
            name: situation.name.clone(),
            description: situation.description.clone(),
            location: situation
                .location
                .and_then(|l| world.location(l))
                .map(Into::into),
            npc: situation.npc.and_then(|n| world.npc(n)).map(Into::into),
            route: situation.route.and_then(|r| world.route(r)).map(Into::into),
            resolutions,
            completed: false,
            challenge_succeeded: None,
            recorded_at: Utc::now(),
            choices: Vec::new(),
        });
        if let Some(scene) = self.scenes.get_mut(scene_node.0) {
            scene.situations.push(id);
        }
        id
    }

    /// Record a choice execution before its consequence is applied.
    pub fn record_choice_execution(
        &mut self,
        situation_node: SituationNodeId,
        choice: &Choice,
        player: &Player,
        clock: GameClock,
    ) -> ChoiceNodeId {
        let id = ChoiceNodeId(self.choices.len());
        self.choices.push(ChoiceExecutionNode {
            id,
            situation_node,
            choice: choice.id,
            template_id: choice.template_id.clone(),
            action_text: choice.action_text.clone(),
            action_type: choice.action_type,
            player_before: player.into(),
            player_after: None,
            effects: Vec::new(),
            challenge: None,
            spawned_scenes: Vec::new(),
            executed_at: clock,
            recorded_at: Utc::now(),
        });
        if let Some(situation) = self.situations.get_mut(situation_node.0) {
            situation.choices.push(id);
        }
        id
    }

    // -----------------------------------------------------------------------
    // Updates
    // -----------------------------------------------------------------------

    /// Fill in the outcome of a recorded choice.
    pub fn complete_choice(
        &mut self,
        node: ChoiceNodeId,
        player: &Player,
        effects: &[AppliedEffect],
        challenge: Option<ChallengeOutcome>,
    ) {
        let Some(choice) = self.choices.get_mut(node.0) else {
            return;
        };
        choice.player_after = Some(player.into());
        choice.effects = effects.to_vec();
        let succeeded = challenge.as_ref().map(|c| c.succeeded);
        choice.challenge = challenge;
        let situation_node = choice.situation_node;
        if let Some(situation) = self.situations.get_mut(situation_node.0) {
            situation.completed = true;
            if succeeded.is_some() {
                situation.challenge_succeeded = succeeded;
            }
        }
    }

    /// Attach a scene node to the choice that spawned it.
    pub fn link_spawned(&mut self, choice: ChoiceNodeId, scene: SceneNodeId) {
        if let Some(node) = self.scenes.get_mut(scene.0) {
            node.parent = TraceParent::Choice(choice);
        }
        if let Some(node) = self.choices.get_mut(choice.0)
            && !node.spawned_scenes.contains(&scene)
        {
            node.spawned_scenes.push(scene);
        }
    }

    /// Track a lifecycle change.
    pub fn update_scene_state(&mut self, scene: SceneId, state: SceneState) {
        let Some(node) = self.scenes.iter_mut().find(|n| n.scene == scene) else {
            return;
        };
        let now = Utc::now();
        node.state = state;
        match state {
            SceneState::Active => node.activated_at = Some(now),
            SceneState::Completed | SceneState::Expired => node.completed_at = Some(now),
            SceneState::Provisional => {}
        }
    }

    /// Flag a preview that was never taken.
    pub fn mark_discarded(&mut self, scene: SceneId) {
        if let Some(node) = self.scenes.iter_mut().find(|n| n.scene == scene) {
            node.discarded = true;
        }
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    /// Node for a scene instance.
    pub fn scene_node(&self, scene: SceneId) -> Option<SceneNodeId> {
        self.scenes.iter().find(|n| n.scene == scene).map(|n| n.id)
    }

    /// Node for a situation instance.
    pub fn situation_node(&self, situation: SituationId) -> Option<SituationNodeId> {
        self.situations
            .iter()
            .find(|n| n.situation == situation)
            .map(|n| n.id)
    }

    /// Scene node by index.
    pub fn scene(&self, id: SceneNodeId) -> Option<&SceneSpawnNode> {
        self.scenes.get(id.0)
    }

    /// Situation node by index.
    pub fn situation(&self, id: SituationNodeId) -> Option<&SituationSpawnNode> {
        self.situations.get(id.0)
    }

    /// Choice node by index.
    pub fn choice(&self, id: ChoiceNodeId) -> Option<&ChoiceExecutionNode> {
        self.choices.get(id.0)
    }

    /// All scene nodes.
    pub fn scenes(&self) -> &[SceneSpawnNode] {
        &self.scenes
    }

    /// All situation nodes.
    pub fn situations(&self) -> &[SituationSpawnNode] {
        &self.situations
    }

    /// All choice nodes.
    pub fn choices(&self) -> &[ChoiceExecutionNode] {
        &self.choices
    }

    /// Scenes with no parent.
    pub fn roots(&self) -> &[SceneNodeId] {
        &self.roots
    }

    /// Whether nothing was recorded.
    pub fn is_empty(&self) -> bool {
        self.scenes.is_empty()
    }
}
