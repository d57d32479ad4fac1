//! Trace graph nodes. Edges are arena indices into [`super::SpawnTrace`].

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use lw_content::ActionType;
use lw_core::{ChoiceId, GameClock, PlacementKind, SceneId, SituationId};

use super::snapshot::{LocationSnapshot, NpcSnapshot, PlacementSnapshot, PlayerSnapshot, RouteSnapshot};
use crate::consequence::AppliedEffect;
use crate::external::ChallengeOutcome;
use crate::lifecycle::SceneState;
use crate::resolver::ResolutionMetadata;
use crate::scene::SpawnTrigger;

macro_rules! node_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(pub usize);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, "{}"), self.0)
            }
        }
    };
}

node_id! {
    /// Index of a scene node.
    SceneNodeId, "scene#"
}

node_id! {
    /// Index of a situation node.
    SituationNodeId, "situation#"
}

node_id! {
    /// Index of a choice node.
    ChoiceNodeId, "choice#"
}

/// What a scene node hangs from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "node", rename_all = "snake_case")]
pub enum TraceParent {
    /// Spawned at session start or by the host.
    Root,
    /// Built as a preview of a choice in this situation.
    Situation(SituationNodeId),
    /// Spawned by executing this choice.
    Choice(ChoiceNodeId),
}

/// How one slot of a situation was filled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotResolution {
    /// Which slot.
    pub slot: PlacementKind,
    /// How it was resolved.
    pub metadata: ResolutionMetadata,
}

/// A scene spawn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneSpawnNode {
    /// This node.
    pub id: SceneNodeId,
    /// Scene instance.
    pub scene: SceneId,
    /// Template id.
    pub template_id: String,
    /// Display name at spawn time.
    pub display_name: String,
    /// Spawn cause.
    pub trigger: SpawnTrigger,
    /// Cascade depth.
    pub depth: u32,
    /// Parent edge.
    pub parent: TraceParent,
    /// Placement entity at spawn time.
    pub placement: Option<PlacementSnapshot>,
    /// How the placement was obtained.
    pub placement_resolution: Option<ResolutionMetadata>,
    /// Latest known lifecycle state.
    pub state: SceneState,
    /// Game time of the spawn.
    pub spawned_at: GameClock,
    /// Wall-clock time of the spawn.
    pub recorded_at: DateTime<Utc>,
    /// When the scene became active.
    pub activated_at: Option<DateTime<Utc>>,
    /// When the scene reached a terminal state.
    pub completed_at: Option<DateTime<Utc>>,
    /// Whether the scene was a preview that was never taken.
    pub discarded: bool,
    /// Child situation nodes.
    pub situations: Vec<SituationNodeId>,
}

/// A situation spawn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SituationSpawnNode {
    /// This node.
    pub id: SituationNodeId,
    /// Owning scene node.
    pub scene_node: SceneNodeId,
    /// Situation instance.
    pub situation: SituationId,
    /// Template id.
    pub template_id: String,
    /// Name at spawn time.
    pub name: String,
    /// Narrative text at spawn time.
    pub description: String,
    /// Location at spawn time.
    pub location: Option<LocationSnapshot>,
    /// NPC at spawn time.
    pub npc: Option<NpcSnapshot>,
    /// Route at spawn time.
    pub route: Option<RouteSnapshot>,
    /// How each slot was filled.
    pub resolutions: Vec<SlotResolution>,
    /// Whether a choice has been executed here.
    pub completed: bool,
    /// Challenge result, for challenge choices.
    pub challenge_succeeded: Option<bool>,
    /// Wall-clock time of the spawn.
    pub recorded_at: DateTime<Utc>,
    /// Child choice nodes.
    pub choices: Vec<ChoiceNodeId>,
}

/// An executed choice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChoiceExecutionNode {
    /// This node.
    pub id: ChoiceNodeId,
    /// Situation the choice belongs to.
    pub situation_node: SituationNodeId,
    /// Choice instance.
    pub choice: ChoiceId,
    /// Template id.
    pub template_id: String,
    /// Button text.
    pub action_text: String,
    /// Execution kind.
    pub action_type: ActionType,
    /// Player before the consequence.
    pub player_before: PlayerSnapshot,
    /// Player after the consequence.
    pub player_after: Option<PlayerSnapshot>,
    /// Effects in application order.
    pub effects: Vec<AppliedEffect>,
    /// Challenge result, if one ran.
    pub challenge: Option<ChallengeOutcome>,
    /// Scenes this choice spawned.
    pub spawned_scenes: Vec<SceneNodeId>,
    /// Game time of execution.
    pub executed_at: GameClock,
    /// Wall-clock time of execution.
    pub recorded_at: DateTime<Utc>,
}
