use std::fmt;

use serde::{Deserialize, Serialize};

use crate::category::{
    KnowledgeLevel, LocationActivity, LocationPrivacy, LocationPurpose, LocationSafety,
    NpcRelationship, PersonalityType, Profession, RouteStructure, SocialStanding, StoryRole,
    Terrain,
};
use crate::id::{EntityId, SceneId};

/// The kinds of entity stored in the world graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    /// A non-player character.
    Npc,
    /// A place the player can be.
    Location,
    /// A connection between two locations.
    Route,
    /// A carriable object.
    Item,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Npc => write!(f, "npc"),
            Self::Location => write!(f, "location"),
            Self::Route => write!(f, "route"),
            Self::Item => write!(f, "item"),
        }
    }
}

/// The entity kinds a scene or situation can be placed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlacementKind {
    /// Placed on an NPC.
    #[serde(rename = "NPC", alias = "Npc")]
    Npc,
    /// Placed at a location.
    Location,
    /// Placed on a route.
    Route,
}

impl fmt::Display for PlacementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Npc => write!(f, "NPC"),
            Self::Location => write!(f, "Location"),
            Self::Route => write!(f, "Route"),
        }
    }
}

/// A typed reference to a placeable entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum EntityRef {
    /// Reference to an NPC.
    Npc(EntityId),
    /// Reference to a location.
    Location(EntityId),
    /// Reference to a route.
    Route(EntityId),
}

impl EntityRef {
    /// The referenced entity's ID.
    pub fn id(&self) -> EntityId {
        match self {
            Self::Npc(id) | Self::Location(id) | Self::Route(id) => *id,
        }
    }

    /// The placement kind of the referenced entity.
    pub fn kind(&self) -> PlacementKind {
        match self {
            Self::Npc(_) => PlacementKind::Npc,
            Self::Location(_) => PlacementKind::Location,
            Self::Route(_) => PlacementKind::Route,
        }
    }
}

/// Where an entity came from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum EntityOrigin {
    /// Declared in a content package.
    #[default]
    Authored,
    /// Synthesized by entity resolution because nothing matched a filter.
    Procedural,
    /// Manufactured by a scene for its own use; removed if the scene expires.
    SceneDependent {
        /// The owning scene instance.
        scene: SceneId,
    },
}

/// Axial hex-grid coordinate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HexCoord {
    /// Column axis.
    pub q: i32,
    /// Row axis.
    pub r: i32,
}

impl HexCoord {
    /// Create a coordinate.
    pub fn new(q: i32, r: i32) -> Self {
        Self { q, r }
    }

    /// Hex-grid distance between two coordinates.
    pub fn distance(self, other: HexCoord) -> u32 {
        let dq = self.q - other.q;
        let dr = self.r - other.r;
        let ds = (self.q + self.r) - (other.q + other.r);
        (dq.unsigned_abs() + dr.unsigned_abs() + ds.unsigned_abs()) / 2
    }
}

/// A non-player character.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Npc {
    /// World-unique identifier.
    pub id: EntityId,
    /// Content key, unique among NPCs.
    pub key: String,
    /// Display name.
    pub name: String,
    /// Free-form description.
    pub description: String,
    /// Temperament.
    pub personality: PersonalityType,
    /// Occupation.
    pub profession: Profession,
    /// Attitude toward the player.
    pub relationship: NpcRelationship,
    /// Social weight.
    pub social_standing: SocialStanding,
    /// Narrative function.
    pub story_role: StoryRole,
    /// Knowledge of current affairs.
    pub knowledge: KnowledgeLevel,
    /// Difficulty tier, 1 and up.
    pub tier: u32,
    /// Bond strength with the player.
    pub bond: i32,
    /// How many times the player has dealt with this NPC.
    pub interactions: u32,
    /// Where the NPC can be found.
    pub location: Option<EntityId>,
    /// Free-form tags.
    pub tags: Vec<String>,
    /// Provenance.
    pub origin: EntityOrigin,
}

impl Npc {
    /// Create an NPC with default categorical properties.
    pub fn new(key: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: EntityId::new(),
            key: key.into(),
            name: name.into(),
            description: String::new(),
            personality: PersonalityType::default(),
            profession: Profession::default(),
            relationship: NpcRelationship::default(),
            social_standing: SocialStanding::default(),
            story_role: StoryRole::default(),
            knowledge: KnowledgeLevel::default(),
            tier: 1,
            bond: 0,
            interactions: 0,
            location: None,
            tags: Vec::new(),
            origin: EntityOrigin::Authored,
        }
    }

    /// Builder: set the profession.
    pub fn with_profession(mut self, profession: Profession) -> Self {
        self.profession = profession;
        self
    }

    /// Builder: place the NPC at a location.
    pub fn at(mut self, location: EntityId) -> Self {
        self.location = Some(location);
        self
    }

    /// Builder: set the bond strength.
    pub fn with_bond(mut self, bond: i32) -> Self {
        self.bond = bond;
        self
    }
}

/// A place the player can visit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    /// World-unique identifier.
    pub id: EntityId,
    /// Content key, unique among locations.
    pub key: String,
    /// Display name.
    pub name: String,
    /// Free-form description.
    pub description: String,
    /// Access restrictions.
    pub privacy: LocationPrivacy,
    /// Danger level.
    pub safety: LocationSafety,
    /// Crowding.
    pub activity: LocationActivity,
    /// Primary function.
    pub purpose: LocationPurpose,
    /// District key, if the location belongs to one.
    pub district: Option<String>,
    /// Region key, if the location belongs to one.
    pub region: Option<String>,
    /// Difficulty tier, 1 and up.
    pub tier: u32,
    /// How many times the player has arrived here.
    pub visits: u32,
    /// Position on the hex map.
    pub position: Option<HexCoord>,
    /// Free-form tags.
    pub tags: Vec<String>,
    /// Provenance.
    pub origin: EntityOrigin,
}

impl Location {
    /// Create a location with default categorical properties.
    pub fn new(key: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: EntityId::new(),
            key: key.into(),
            name: name.into(),
            description: String::new(),
            privacy: LocationPrivacy::default(),
            safety: LocationSafety::default(),
            activity: LocationActivity::default(),
            purpose: LocationPurpose::default(),
            district: None,
            region: None,
            tier: 1,
            visits: 0,
            position: None,
            tags: Vec::new(),
            origin: EntityOrigin::Authored,
        }
    }

    /// Builder: set the purpose.
    pub fn with_purpose(mut self, purpose: LocationPurpose) -> Self {
        self.purpose = purpose;
        self
    }

    /// Builder: set the hex position.
    pub fn with_position(mut self, position: HexCoord) -> Self {
        self.position = Some(position);
        self
    }

    /// Whether the player has been here.
    pub fn visited(&self) -> bool {
        self.visits > 0
    }
}

/// A traversable connection between two locations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Route {
    /// World-unique identifier.
    pub id: EntityId,
    /// Content key, unique among routes.
    pub key: String,
    /// Display name.
    pub name: String,
    /// Departure location.
    pub from: Option<EntityId>,
    /// Arrival location.
    pub to: Option<EntityId>,
    /// Dominant terrain.
    pub terrain: Terrain,
    /// Built structure.
    pub structure: RouteStructure,
    /// Travel danger, 1 and up.
    pub danger: u32,
    /// Free-form tags.
    pub tags: Vec<String>,
    /// Provenance.
    pub origin: EntityOrigin,
}

impl Route {
    /// Create a route with default categorical properties.
    pub fn new(key: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: EntityId::new(),
            key: key.into(),
            name: name.into(),
            from: None,
            to: None,
            terrain: Terrain::default(),
            structure: RouteStructure::default(),
            danger: 1,
            tags: Vec::new(),
            origin: EntityOrigin::Authored,
        }
    }

    /// Builder: connect two locations.
    pub fn between(mut self, from: EntityId, to: EntityId) -> Self {
        self.from = Some(from);
        self.to = Some(to);
        self
    }
}

/// A carriable object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    /// World-unique identifier.
    pub id: EntityId,
    /// Content key, unique among items.
    pub key: String,
    /// Display name.
    pub name: String,
    /// Free-form description.
    pub description: String,
    /// Free-form tags.
    pub tags: Vec<String>,
    /// Provenance.
    pub origin: EntityOrigin,
}

impl Item {
    /// Create an item.
    pub fn new(key: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: EntityId::new(),
            key: key.into(),
            name: name.into(),
            description: String::new(),
            tags: Vec::new(),
            origin: EntityOrigin::Authored,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_distance() {
        let origin = HexCoord::new(0, 0);
        assert_eq!(origin.distance(origin), 0);
        assert_eq!(origin.distance(HexCoord::new(1, 0)), 1);
        assert_eq!(origin.distance(HexCoord::new(2, -1)), 2);
        assert_eq!(HexCoord::new(-3, 3).distance(HexCoord::new(3, -3)), 6);
    }

    #[test]
    fn entity_ref_kind() {
        let id = EntityId::new();
        assert_eq!(EntityRef::Route(id).kind(), PlacementKind::Route);
        assert_eq!(EntityRef::Route(id).id(), id);
    }

    #[test]
    fn placement_kind_serde_name() {
        let json = serde_json::to_string(&PlacementKind::Npc).unwrap();
        assert_eq!(json, "\"NPC\"");
        let back: PlacementKind = serde_json::from_str("\"Npc\"").unwrap();
        assert_eq!(back, PlacementKind::Npc);
    }
}
