//! Content packages: the JSON documents authors write.

use serde::{Deserialize, Serialize};

use lw_core::category::{
    KnowledgeLevel, LocationActivity, LocationPrivacy, LocationPurpose, LocationSafety,
    NpcRelationship, PersonalityType, Profession, RouteStructure, SocialStanding, StoryRole,
    Terrain,
};
use lw_core::entity::HexCoord;

use crate::template::SceneTemplate;

fn one() -> u32 {
    1
}

/// An achievement the content can grant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", deny_unknown_fields)]
pub struct AchievementDef {
    /// Unique id.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Flavor text.
    #[serde(default)]
    pub description: String,
}

/// An authored NPC.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", deny_unknown_fields)]
pub struct NpcDef {
    /// Unique key.
    pub key: String,
    /// Display name.
    pub name: String,
    /// Free-form description.
    #[serde(default)]
    pub description: String,
    /// Temperament.
    #[serde(default)]
    pub personality_type: PersonalityType,
    /// Occupation.
    #[serde(default)]
    pub profession: Profession,
    /// Attitude toward the player.
    #[serde(default)]
    pub relationship: NpcRelationship,
    /// Social weight.
    #[serde(default)]
    pub social_standing: SocialStanding,
    /// Narrative function.
    #[serde(default)]
    pub story_role: StoryRole,
    /// Knowledge.
    #[serde(default)]
    pub knowledge_level: KnowledgeLevel,
    /// Difficulty tier.
    #[serde(default = "one")]
    pub tier: u32,
    /// Starting bond.
    #[serde(default)]
    pub bond: i32,
    /// Location key.
    #[serde(default)]
    pub location: Option<String>,
    /// Tags.
    #[serde(default)]
    pub tags: Vec<String>,
}

/// An authored (or scene-dependent) location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", deny_unknown_fields)]
pub struct LocationDef {
    /// Unique key.
    pub key: String,
    /// Display name; placeholders are substituted for scene-dependent locations.
    pub name: String,
    /// Free-form description.
    #[serde(default)]
    pub description: String,
    /// Access restrictions.
    #[serde(default)]
    pub privacy: LocationPrivacy,
    /// Danger level.
    #[serde(default)]
    pub safety: LocationSafety,
    /// Crowding.
    #[serde(default)]
    pub activity: LocationActivity,
    /// Primary function.
    #[serde(default)]
    pub purpose: LocationPurpose,
    /// District key.
    #[serde(default)]
    pub district: Option<String>,
    /// Region key.
    #[serde(default)]
    pub region: Option<String>,
    /// Difficulty tier.
    #[serde(default = "one")]
    pub tier: u32,
    /// Hex position.
    #[serde(default)]
    pub position: Option<HexCoord>,
    /// Tags.
    #[serde(default)]
    pub tags: Vec<String>,
}

/// An authored route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", deny_unknown_fields)]
pub struct RouteDef {
    /// Unique key.
    pub key: String,
    /// Display name.
    pub name: String,
    /// Departure location key.
    #[serde(default)]
    pub from: Option<String>,
    /// Arrival location key.
    #[serde(default)]
    pub to: Option<String>,
    /// Dominant terrain.
    #[serde(default)]
    pub terrain: Terrain,
    /// Built structure.
    #[serde(default)]
    pub structure: RouteStructure,
    /// Travel danger.
    #[serde(default = "one")]
    pub danger: u32,
    /// Tags.
    #[serde(default)]
    pub tags: Vec<String>,
}

/// An authored (or scene-dependent) item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", deny_unknown_fields)]
pub struct ItemDef {
    /// Unique key.
    pub key: String,
    /// Display name.
    pub name: String,
    /// Free-form description.
    #[serde(default)]
    pub description: String,
    /// Tags.
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Property defaults for synthesized NPCs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", deny_unknown_fields)]
pub struct NpcDefaults {
    /// Name pool.
    #[serde(default)]
    pub names: Vec<String>,
    /// Default temperament.
    #[serde(default)]
    pub personality_type: PersonalityType,
    /// Default occupation.
    #[serde(default)]
    pub profession: Profession,
    /// Default attitude.
    #[serde(default)]
    pub relationship: NpcRelationship,
    /// Default standing.
    #[serde(default)]
    pub social_standing: SocialStanding,
    /// Default story role.
    #[serde(default)]
    pub story_role: StoryRole,
    /// Default knowledge.
    #[serde(default)]
    pub knowledge_level: KnowledgeLevel,
    /// Default tier.
    #[serde(default = "one")]
    pub tier: u32,
    /// Default bond.
    #[serde(default)]
    pub bond: i32,
}

/// Property defaults for synthesized locations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", deny_unknown_fields)]
pub struct LocationDefaults {
    /// Name pool.
    #[serde(default)]
    pub names: Vec<String>,
    /// Default privacy.
    #[serde(default)]
    pub privacy: LocationPrivacy,
    /// Default safety.
    #[serde(default)]
    pub safety: LocationSafety,
    /// Default activity.
    #[serde(default)]
    pub activity: LocationActivity,
    /// Default purpose.
    #[serde(default)]
    pub purpose: LocationPurpose,
    /// Default tier.
    #[serde(default = "one")]
    pub tier: u32,
}

/// Property defaults for synthesized routes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", deny_unknown_fields)]
pub struct RouteDefaults {
    /// Name pool.
    #[serde(default)]
    pub names: Vec<String>,
    /// Default terrain.
    #[serde(default)]
    pub terrain: Terrain,
    /// Default structure.
    #[serde(default)]
    pub structure: RouteStructure,
    /// Default danger.
    #[serde(default = "one")]
    pub danger: u32,
}

/// Synthesis defaults per entity kind. A missing block means entities of that
/// kind cannot be created procedurally.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "PascalCase", deny_unknown_fields)]
pub struct EntityDefaults {
    /// NPC defaults.
    pub npc: Option<NpcDefaults>,
    /// Location defaults.
    pub location: Option<LocationDefaults>,
    /// Route defaults.
    pub route: Option<RouteDefaults>,
}

impl EntityDefaults {
    /// Overlay another set of defaults; blocks present in `other` win.
    pub fn merge(&mut self, other: EntityDefaults) {
        if other.npc.is_some() {
            self.npc = other.npc;
        }
        if other.location.is_some() {
            self.location = other.location;
        }
        if other.route.is_some() {
            self.route = other.route;
        }
    }
}

/// One content document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "PascalCase", deny_unknown_fields)]
pub struct ContentPackage {
    /// Package id, for diagnostics.
    pub package_id: Option<String>,
    /// Achievement definitions.
    pub achievements: Vec<AchievementDef>,
    /// Synthesis defaults.
    pub defaults: EntityDefaults,
    /// Authored NPCs.
    pub npcs: Vec<NpcDef>,
    /// Authored locations.
    pub locations: Vec<LocationDef>,
    /// Authored routes.
    pub routes: Vec<RouteDef>,
    /// Authored items.
    pub items: Vec<ItemDef>,
    /// Scene templates.
    pub scene_templates: Vec<SceneTemplate>,
}

impl ContentPackage {
    /// Append another package's contents.
    pub fn merge(&mut self, other: ContentPackage) {
        self.achievements.extend(other.achievements);
        self.defaults.merge(other.defaults);
        self.npcs.extend(other.npcs);
        self.locations.extend(other.locations);
        self.routes.extend(other.routes);
        self.items.extend(other.items);
        self.scene_templates.extend(other.scene_templates);
    }

    /// Whether the package declares no entities.
    pub fn has_no_entities(&self) -> bool {
        self.npcs.is_empty()
            && self.locations.is_empty()
            && self.routes.is_empty()
            && self.items.is_empty()
    }
}
