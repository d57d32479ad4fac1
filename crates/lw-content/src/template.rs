//! Scene, situation, and choice templates. Immutable once loaded.

use serde::{Deserialize, Serialize};

use lw_core::TimeBlock;

use crate::consequence::Consequence;
use crate::filter::PlacementFilter;
use crate::package::{ItemDef, LocationDef};
use crate::requirement::CompoundRequirement;

/// Structural shape of a scene.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SceneArchetype {
    #[default]
    Linear,
    HubAndSpoke,
    Branching,
    Converging,
    Discovery,
}

/// How a scene is presented.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PresentationMode {
    /// Offered alongside other activity at the placement.
    #[default]
    Atmospheric,
    /// Takes over the screen until resolved.
    Modal,
}

/// Pacing between situations.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProgressionMode {
    /// Return control to the player between situations.
    #[default]
    Breathe,
    /// Present the next situation immediately.
    Cascade,
}

/// Semantic weight of a situation.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SituationType {
    #[default]
    Normal,
    Crisis,
}

/// Presentation tag of a choice.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PathType {
    InstantSuccess,
    Challenge,
    #[default]
    Fallback,
}

/// What executing a choice does besides applying its consequence.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionType {
    /// Apply the consequence.
    #[default]
    Instant,
    /// Run a tactical challenge, then apply the success or failure consequence.
    StartChallenge,
    /// Apply the consequence and move the player.
    Navigate,
}

/// Tactical mini-game family.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChallengeKind {
    Social,
    Mental,
    Physical,
}

/// Parameters handed to the tactical challenge resolver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", deny_unknown_fields)]
pub struct ChallengeSpec {
    /// Mini-game family.
    pub kind: ChallengeKind,
    /// Card deck to draw from.
    #[serde(default)]
    pub deck_id: Option<String>,
    /// Progress needed to win.
    #[serde(default = "default_threshold")]
    pub victory_threshold: u32,
    /// Danger that ends the challenge in failure.
    #[serde(default = "default_threshold")]
    pub danger_threshold: u32,
}

fn default_threshold() -> u32 {
    10
}

/// Temporal and player-state eligibility for spawning.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "PascalCase", deny_unknown_fields)]
pub struct SpawnConditions {
    /// Earliest day.
    pub min_day: Option<u32>,
    /// Latest day.
    pub max_day: Option<u32>,
    /// Allowed time blocks; empty allows any.
    pub time_blocks: Vec<TimeBlock>,
    /// Player requirement.
    pub requirement: CompoundRequirement,
}

/// A choice blueprint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", deny_unknown_fields)]
pub struct ChoiceTemplate {
    /// Id, unique within its situation.
    pub id: String,
    /// Button text; may contain placeholders.
    pub action_text: String,
    /// Presentation tag.
    #[serde(default)]
    pub path_type: PathType,
    /// Execution kind.
    #[serde(default)]
    pub action_type: ActionType,
    /// Gate shown before selection.
    #[serde(default)]
    pub requirement: CompoundRequirement,
    /// Effects applied on execution.
    #[serde(default)]
    pub consequence: Consequence,
    /// Extra effects when a challenge succeeds.
    #[serde(default)]
    pub on_success_consequence: Option<Consequence>,
    /// Extra effects when a challenge fails.
    #[serde(default)]
    pub on_failure_consequence: Option<Consequence>,
    /// Challenge parameters for `StartChallenge` choices.
    #[serde(default)]
    pub challenge: Option<ChallengeSpec>,
}

impl ChoiceTemplate {
    /// Every consequence this choice can apply.
    pub fn consequences(&self) -> impl Iterator<Item = &Consequence> {
        std::iter::once(&self.consequence)
            .chain(self.on_success_consequence.as_ref())
            .chain(self.on_failure_consequence.as_ref())
    }
}

/// A situation blueprint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", deny_unknown_fields)]
pub struct SituationTemplate {
    /// Id, unique within its scene.
    pub id: String,
    /// Display name; may contain placeholders.
    #[serde(default)]
    pub name: Option<String>,
    /// Semantic weight.
    #[serde(default, rename = "Type")]
    pub situation_type: SituationType,
    /// Narrative text with placeholders.
    #[serde(default)]
    pub narrative_template: String,
    /// Location binding. Never inherited from the scene.
    #[serde(default)]
    pub location_filter: Option<PlacementFilter>,
    /// NPC binding. Never inherited from the scene.
    #[serde(default)]
    pub npc_filter: Option<PlacementFilter>,
    /// Route binding. Never inherited from the scene.
    #[serde(default)]
    pub route_filter: Option<PlacementFilter>,
    /// Choices, normally two to four.
    pub choice_templates: Vec<ChoiceTemplate>,
}

/// A scene blueprint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", deny_unknown_fields)]
pub struct SceneTemplate {
    /// Catalog-unique id.
    pub id: String,
    /// Display name; may contain placeholders.
    #[serde(default)]
    pub display_name: Option<String>,
    /// Structural shape.
    #[serde(default)]
    pub archetype: SceneArchetype,
    /// Where the scene spawns. `None` leaves the scene unplaced.
    #[serde(default)]
    pub placement_filter: Option<PlacementFilter>,
    /// Eligibility window.
    #[serde(default)]
    pub spawn_conditions: SpawnConditions,
    /// Difficulty tier.
    #[serde(default = "default_tier")]
    pub tier: u32,
    /// Presentation.
    #[serde(default)]
    pub presentation_mode: PresentationMode,
    /// Pacing.
    #[serde(default)]
    pub progression_mode: ProgressionMode,
    /// Days until an unresolved scene expires.
    #[serde(default)]
    pub expiration_days: Option<u32>,
    /// Spawned when a session starts.
    #[serde(default)]
    pub is_starter: bool,
    /// Introduction shown with the scene; may contain placeholders.
    #[serde(default)]
    pub intro_narrative: Option<String>,
    /// Locations the scene manufactures for itself. Keys are local to the scene.
    #[serde(default)]
    pub dependent_locations: Vec<LocationDef>,
    /// Items the scene manufactures for itself. Keys are local to the scene.
    #[serde(default)]
    pub dependent_items: Vec<ItemDef>,
    /// Ordered situations.
    pub situation_templates: Vec<SituationTemplate>,
}

fn default_tier() -> u32 {
    1
}

impl SceneTemplate {
    /// Look up a situation template by id.
    pub fn situation(&self, id: &str) -> Option<&SituationTemplate> {
        self.situation_templates.iter().find(|s| s.id == id)
    }

    /// Whether the scene declares a dependent item with this local key.
    pub fn has_dependent_item(&self, key: &str) -> bool {
        self.dependent_items.iter().any(|i| i.key == key)
    }

    /// Whether the scene declares a dependent location with this local key.
    pub fn has_dependent_location(&self, key: &str) -> bool {
        self.dependent_locations.iter().any(|l| l.key == key)
    }

    /// Every choice template in declaration order.
    pub fn choices(&self) -> impl Iterator<Item = &ChoiceTemplate> {
        self.situation_templates
            .iter()
            .flat_map(|s| s.choice_templates.iter())
    }
}
