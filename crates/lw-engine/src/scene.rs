//! Live scenes, situations, and choices.

use serde::{Deserialize, Serialize};

use lw_content::template::{
    ChallengeSpec, PresentationMode, ProgressionMode, SceneArchetype, SituationType,
};
use lw_content::{ActionType, CompoundRequirement, Consequence, PathType};
use lw_core::{ChoiceId, EntityId, EntityRef, GameClock, SceneId, SituationId};

use crate::lifecycle::SceneState;

/// What caused a scene to spawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpawnTrigger {
    /// Spawned when the session started.
    Starter,
    /// Spawned directly by the host.
    Manual,
    /// Built as a preview of a choice the player has not taken yet.
    ChoicePreview,
    /// Spawned while applying a consequence, with no preview available.
    Cascade,
}

/// Resources a scene manufactured for itself.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependentResources {
    /// Created location IDs.
    pub locations: Vec<EntityId>,
    /// Created item IDs.
    pub items: Vec<EntityId>,
}

impl DependentResources {
    /// Whether nothing was created.
    pub fn is_empty(&self) -> bool {
        self.locations.is_empty() && self.items.is_empty()
    }
}

/// A live choice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Choice {
    /// Instance id.
    pub id: ChoiceId,
    /// Source template id.
    pub template_id: String,
    /// Button text with placeholders substituted.
    pub action_text: String,
    /// Presentation tag.
    pub path_type: PathType,
    /// Execution kind.
    pub action_type: ActionType,
    /// Gate, including any gates added at instantiation.
    pub requirement: CompoundRequirement,
    /// Effects, with scene-local keys rebound.
    pub consequence: Consequence,
    /// Extra effects when a challenge succeeds.
    pub on_success: Option<Consequence>,
    /// Extra effects when a challenge fails.
    pub on_failure: Option<Consequence>,
    /// Challenge parameters.
    pub challenge: Option<ChallengeSpec>,
    /// Provisional scenes this choice would spawn.
    pub previews: Vec<Scene>,
}

/// A live situation. Owned by exactly one scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Situation {
    /// Instance id.
    pub id: SituationId,
    /// Source template id.
    pub template_id: String,
    /// Display name.
    pub name: String,
    /// Semantic weight.
    pub situation_type: SituationType,
    /// Narrative text.
    pub description: String,
    /// Resolved location.
    pub location: Option<EntityId>,
    /// Resolved NPC.
    pub npc: Option<EntityId>,
    /// Resolved route.
    pub route: Option<EntityId>,
    /// Choices in declaration order.
    pub choices: Vec<Choice>,
    /// Whether a choice has been executed here.
    pub completed: bool,
}

impl Situation {
    /// Look up a choice.
    pub fn choice(&self, id: ChoiceId) -> Option<&Choice> {
        self.choices.iter().find(|c| c.id == id)
    }
}

/// A live scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scene {
    /// Instance id.
    pub id: SceneId,
    /// Source template id.
    pub template_id: String,
    /// Display name.
    pub display_name: String,
    /// Introduction text.
    pub intro: String,
    /// Structural shape.
    pub archetype: SceneArchetype,
    /// Presentation.
    pub presentation_mode: PresentationMode,
    /// Pacing.
    pub progression_mode: ProgressionMode,
    /// Resolved placement.
    pub placement: Option<EntityRef>,
    /// Lifecycle state.
    pub state: SceneState,
    /// Situations in declaration order.
    pub situations: Vec<Situation>,
    /// The situation whose choices are offered.
    pub current_situation: Option<SituationId>,
    /// Clock at spawn time.
    pub spawned_at: GameClock,
    /// Last day the scene may stay active.
    pub expires_on_day: Option<u32>,
    /// Spawn cause.
    pub trigger: SpawnTrigger,
    /// Cascade depth; starter and manual scenes are depth zero.
    pub depth: u32,
    /// The choice that spawned this scene.
    pub parent_choice: Option<ChoiceId>,
    /// Resources created for this scene.
    pub dependents: DependentResources,
}

impl Scene {
    /// The situation currently offered.
    pub fn current(&self) -> Option<&Situation> {
        let id = self.current_situation?;
        self.situations.iter().find(|s| s.id == id)
    }

    /// Mutable access to the current situation.
    pub fn current_mut(&mut self) -> Option<&mut Situation> {
        let id = self.current_situation?;
        self.situations.iter_mut().find(|s| s.id == id)
    }

    /// Look up a situation by instance id.
    pub fn situation(&self, id: SituationId) -> Option<&Situation> {
        self.situations.iter().find(|s| s.id == id)
    }

    /// Look up a situation by template id.
    pub fn situation_by_template(&self, template_id: &str) -> Option<&Situation> {
        self.situations.iter().find(|s| s.template_id == template_id)
    }

    /// The situation declared after `id`, if any.
    pub fn situation_after(&self, id: SituationId) -> Option<SituationId> {
        let pos = self.situations.iter().position(|s| s.id == id)?;
        self.situations.get(pos + 1).map(|s| s.id)
    }

    /// Whether choices may be executed in this scene.
    pub fn is_active(&self) -> bool {
        self.state == SceneState::Active
    }
}
