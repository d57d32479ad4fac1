//! Placement filters: categorical descriptions of the NPC, location, or route
//! a scene or situation wants to be bound to.

use std::fmt;

use serde::{Deserialize, Serialize};

use lw_core::PlacementKind;
use lw_core::category::{
    KnowledgeLevel, LocationActivity, LocationPrivacy, LocationPurpose, LocationSafety,
    NpcRelationship, PersonalityType, Profession, RouteStructure, ScaleType, SocialStanding,
    StateType, StoryRole, Terrain,
};

/// Tie-break rule when several entities match a filter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SelectionStrategy {
    /// First match in world insertion order.
    #[default]
    First,
    /// Uniformly random match from the session RNG.
    Random,
    /// Match nearest to the player's hex position.
    Closest,
    /// NPC with the strongest bond.
    HighestBond,
    /// Match the player has dealt with least.
    LeastRecent,
}

/// Spatial constraint relative to the spawn context.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Proximity {
    /// No spatial constraint.
    #[default]
    Anywhere,
    /// At the context location (NPCs there, routes leaving it, or the location itself).
    SameLocation,
    /// The destination of the route resolved earlier in the same scene.
    RouteDestination,
}

/// Bounds on one of the player's scales.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", deny_unknown_fields)]
pub struct ScaleRange {
    /// Which scale.
    pub scale: ScaleType,
    /// Inclusive lower bound.
    #[serde(default)]
    pub min: Option<i32>,
    /// Inclusive upper bound.
    #[serde(default)]
    pub max: Option<i32>,
}

impl ScaleRange {
    /// Whether a scale value falls within the range.
    pub fn contains(&self, value: i32) -> bool {
        self.min.is_none_or(|min| value >= min) && self.max.is_none_or(|max| value <= max)
    }
}

/// Entity properties, used to report which parts of an entity came from a
/// filter and which were generated.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityProperty {
    Name,
    PersonalityType,
    Profession,
    Relationship,
    SocialStanding,
    StoryRole,
    KnowledgeLevel,
    Tier,
    Bond,
    Location,
    Privacy,
    Safety,
    Activity,
    Purpose,
    District,
    Region,
    Terrain,
    Structure,
    Danger,
    Origin,
    Tags,
}

impl fmt::Display for EntityProperty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// A bag of independent, optional categorical dimensions. Each set dimension
/// narrows the candidate set; an empty filter matches any entity of the
/// placement type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", deny_unknown_fields)]
pub struct PlacementFilter {
    /// Entity kind to resolve.
    pub placement_type: PlacementKind,
    /// Tie-break among matches.
    #[serde(default)]
    pub selection_strategy: SelectionStrategy,
    /// Spatial constraint.
    #[serde(default)]
    pub proximity: Proximity,
    /// Tags the entity must carry (all of them).
    #[serde(default)]
    pub tags: Vec<String>,

    // NPC dimensions
    /// Required NPC personality.
    #[serde(default)]
    pub personality_type: Option<PersonalityType>,
    /// Required NPC profession.
    #[serde(default)]
    pub profession: Option<Profession>,
    /// Required NPC attitude.
    #[serde(default)]
    pub relationship: Option<NpcRelationship>,
    /// Required NPC standing.
    #[serde(default)]
    pub social_standing: Option<SocialStanding>,
    /// Required NPC story role.
    #[serde(default)]
    pub story_role: Option<StoryRole>,
    /// Required NPC knowledge.
    #[serde(default)]
    pub knowledge_level: Option<KnowledgeLevel>,
    /// Minimum NPC bond.
    #[serde(default)]
    pub min_bond: Option<i32>,
    /// Maximum NPC bond.
    #[serde(default)]
    pub max_bond: Option<i32>,

    // NPC and location dimensions
    /// Minimum tier.
    #[serde(default)]
    pub min_tier: Option<u32>,
    /// Maximum tier.
    #[serde(default)]
    pub max_tier: Option<u32>,

    // Location dimensions
    /// Required privacy.
    #[serde(default)]
    pub privacy: Option<LocationPrivacy>,
    /// Required safety.
    #[serde(default)]
    pub safety: Option<LocationSafety>,
    /// Required activity.
    #[serde(default)]
    pub activity: Option<LocationActivity>,
    /// Required purpose.
    #[serde(default)]
    pub purpose: Option<LocationPurpose>,
    /// Required district.
    #[serde(default)]
    pub district: Option<String>,
    /// Required region.
    #[serde(default)]
    pub region: Option<String>,
    /// Whether the player must (or must not) have visited the location.
    #[serde(default)]
    pub visited: Option<bool>,
    /// Bind to one of the scene's own dependent locations, by local key.
    #[serde(default)]
    pub dependent_location: Option<String>,

    // Route dimensions
    /// Required terrain.
    #[serde(default)]
    pub terrain: Option<Terrain>,
    /// Required structure.
    #[serde(default)]
    pub structure: Option<RouteStructure>,
    /// Minimum route danger.
    #[serde(default)]
    pub min_danger: Option<u32>,
    /// Maximum route danger.
    #[serde(default)]
    pub max_danger: Option<u32>,

    // Player-state gates
    /// States the player must have.
    #[serde(default)]
    pub required_states: Vec<StateType>,
    /// States the player must not have.
    #[serde(default)]
    pub forbidden_states: Vec<StateType>,
    /// Achievements the player must have earned.
    #[serde(default)]
    pub required_achievements: Vec<String>,
    /// Scale windows the player must be inside.
    #[serde(default)]
    pub scale_requirements: Vec<ScaleRange>,
}

impl PlacementFilter {
    /// An empty filter for a placement type.
    pub fn new(placement_type: PlacementKind) -> Self {
        Self {
            placement_type,
            selection_strategy: SelectionStrategy::default(),
            proximity: Proximity::default(),
            tags: Vec::new(),
            personality_type: None,
            profession: None,
            relationship: None,
            social_standing: None,
            story_role: None,
            knowledge_level: None,
            min_bond: None,
            max_bond: None,
            min_tier: None,
            max_tier: None,
            privacy: None,
            safety: None,
            activity: None,
            purpose: None,
            district: None,
            region: None,
            visited: None,
            dependent_location: None,
            terrain: None,
            structure: None,
            min_danger: None,
            max_danger: None,
            required_states: Vec::new(),
            forbidden_states: Vec::new(),
            required_achievements: Vec::new(),
            scale_requirements: Vec::new(),
        }
    }

    /// Empty NPC filter.
    pub fn npc() -> Self {
        Self::new(PlacementKind::Npc)
    }

    /// Empty location filter.
    pub fn location() -> Self {
        Self::new(PlacementKind::Location)
    }

    /// Empty route filter.
    pub fn route() -> Self {
        Self::new(PlacementKind::Route)
    }

    /// Builder: require a profession.
    pub fn with_profession(mut self, profession: Profession) -> Self {
        self.profession = Some(profession);
        self
    }

    /// Builder: require a location purpose.
    pub fn with_purpose(mut self, purpose: LocationPurpose) -> Self {
        self.purpose = Some(purpose);
        self
    }

    /// Builder: set the selection strategy.
    pub fn with_strategy(mut self, strategy: SelectionStrategy) -> Self {
        self.selection_strategy = strategy;
        self
    }

    /// Builder: set the proximity constraint.
    pub fn with_proximity(mut self, proximity: Proximity) -> Self {
        self.proximity = proximity;
        self
    }

    /// Whether the filter carries any player-state gate.
    pub fn has_player_gates(&self) -> bool {
        !self.required_states.is_empty()
            || !self.forbidden_states.is_empty()
            || !self.required_achievements.is_empty()
            || !self.scale_requirements.is_empty()
    }

    /// The entity properties this filter pins down, in a stable order.
    pub fn provided_properties(&self) -> Vec<EntityProperty> {
        let mut props = Vec::new();
        let mut push = |set: bool, prop: EntityProperty| {
            if set {
                props.push(prop);
            }
        };
        match self.placement_type {
            PlacementKind::Npc => {
                push(self.personality_type.is_some(), EntityProperty::PersonalityType);
                push(self.profession.is_some(), EntityProperty::Profession);
                push(self.relationship.is_some(), EntityProperty::Relationship);
                push(self.social_standing.is_some(), EntityProperty::SocialStanding);
                push(self.story_role.is_some(), EntityProperty::StoryRole);
                push(self.knowledge_level.is_some(), EntityProperty::KnowledgeLevel);
                push(self.min_tier.is_some() || self.max_tier.is_some(), EntityProperty::Tier);
                push(self.min_bond.is_some() || self.max_bond.is_some(), EntityProperty::Bond);
            }
            PlacementKind::Location => {
                push(self.privacy.is_some(), EntityProperty::Privacy);
                push(self.safety.is_some(), EntityProperty::Safety);
                push(self.activity.is_some(), EntityProperty::Activity);
                push(self.purpose.is_some(), EntityProperty::Purpose);
                push(self.district.is_some(), EntityProperty::District);
                push(self.region.is_some(), EntityProperty::Region);
                push(self.min_tier.is_some() || self.max_tier.is_some(), EntityProperty::Tier);
            }
            PlacementKind::Route => {
                push(self.terrain.is_some(), EntityProperty::Terrain);
                push(self.structure.is_some(), EntityProperty::Structure);
                push(
                    self.min_danger.is_some() || self.max_danger.is_some(),
                    EntityProperty::Danger,
                );
            }
        }
        push(!self.tags.is_empty(), EntityProperty::Tags);
        props
    }

    /// Internal consistency problems, as human-readable messages.
    pub fn problems(&self) -> Vec<String> {
        let mut out = Vec::new();

        if let (Some(min), Some(max)) = (self.min_bond, self.max_bond)
            && min > max
        {
            out.push(format!("MinBond {min} exceeds MaxBond {max}"));
        }
        if let (Some(min), Some(max)) = (self.min_tier, self.max_tier)
            && min > max
        {
            out.push(format!("MinTier {min} exceeds MaxTier {max}"));
        }
        if let (Some(min), Some(max)) = (self.min_danger, self.max_danger)
            && min > max
        {
            out.push(format!("MinDanger {min} exceeds MaxDanger {max}"));
        }
        for range in &self.scale_requirements {
            if let (Some(min), Some(max)) = (range.min, range.max)
                && min > max
            {
                out.push(format!("{} range {min}..{max} is empty", range.scale));
            }
        }
        for state in &self.required_states {
            if self.forbidden_states.contains(state) {
                out.push(format!("state {state} is both required and forbidden"));
            }
        }

        let kind = self.placement_type;
        let mut misplaced = |set: bool, name: &str, allowed: &[PlacementKind]| {
            if set && !allowed.contains(&kind) {
                out.push(format!("{name} does not apply to {kind} filters"));
            }
        };
        use PlacementKind::{Location, Npc, Route};
        misplaced(self.personality_type.is_some(), "PersonalityType", &[Npc]);
        misplaced(self.profession.is_some(), "Profession", &[Npc]);
        misplaced(self.relationship.is_some(), "Relationship", &[Npc]);
        misplaced(self.social_standing.is_some(), "SocialStanding", &[Npc]);
        misplaced(self.story_role.is_some(), "StoryRole", &[Npc]);
        misplaced(self.knowledge_level.is_some(), "KnowledgeLevel", &[Npc]);
        misplaced(self.min_bond.is_some() || self.max_bond.is_some(), "Bond bounds", &[Npc]);
        misplaced(
            self.min_tier.is_some() || self.max_tier.is_some(),
            "Tier bounds",
            &[Npc, Location],
        );
        misplaced(self.privacy.is_some(), "Privacy", &[Location]);
        misplaced(self.safety.is_some(), "Safety", &[Location]);
        misplaced(self.activity.is_some(), "Activity", &[Location]);
        misplaced(self.purpose.is_some(), "Purpose", &[Location]);
        misplaced(self.district.is_some(), "District", &[Location]);
        misplaced(self.region.is_some(), "Region", &[Location]);
        misplaced(self.visited.is_some(), "Visited", &[Location]);
        misplaced(self.dependent_location.is_some(), "DependentLocation", &[Location]);
        misplaced(self.terrain.is_some(), "Terrain", &[Route]);
        misplaced(self.structure.is_some(), "Structure", &[Route]);
        misplaced(
            self.min_danger.is_some() || self.max_danger.is_some(),
            "Danger bounds",
            &[Route],
        );
        misplaced(
            self.proximity == Proximity::RouteDestination,
            "RouteDestination proximity",
            &[Location],
        );

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_fill_missing_fields() {
        let filter: PlacementFilter =
            serde_json::from_str(r#"{ "PlacementType": "NPC", "Profession": "Merchant" }"#)
                .unwrap();
        assert_eq!(filter.placement_type, PlacementKind::Npc);
        assert_eq!(filter.selection_strategy, SelectionStrategy::First);
        assert_eq!(filter.proximity, Proximity::Anywhere);
        assert_eq!(filter.profession, Some(Profession::Merchant));
        assert!(filter.problems().is_empty());
    }

    #[test]
    fn unknown_field_rejected() {
        let parsed: Result<PlacementFilter, _> =
            serde_json::from_str(r#"{ "PlacementType": "NPC", "Mood": "Grumpy" }"#);
        assert!(parsed.is_err());
    }

    #[test]
    fn inverted_bounds_reported() {
        let mut filter = PlacementFilter::npc();
        filter.min_bond = Some(10);
        filter.max_bond = Some(2);
        let problems = filter.problems();
        assert_eq!(problems.len(), 1);
        assert!(problems[0].contains("MinBond"));
    }

    #[test]
    fn misplaced_dimensions_reported() {
        let mut filter = PlacementFilter::location().with_profession(Profession::Guard);
        filter.terrain = Some(Terrain::Forest);
        assert_eq!(filter.problems().len(), 2);

        let filter = PlacementFilter::npc().with_proximity(Proximity::RouteDestination);
        assert_eq!(filter.problems().len(), 1);
    }

    #[test]
    fn provided_properties_follow_kind() {
        let filter = PlacementFilter::npc().with_profession(Profession::Merchant);
        assert_eq!(filter.provided_properties(), vec![EntityProperty::Profession]);

        let mut filter = PlacementFilter::location().with_purpose(LocationPurpose::Commerce);
        filter.tags.push("market".into());
        assert_eq!(
            filter.provided_properties(),
            vec![EntityProperty::Purpose, EntityProperty::Tags]
        );
    }

    #[test]
    fn scale_range_bounds() {
        let range = ScaleRange {
            scale: ScaleType::Morality,
            min: Some(-2),
            max: None,
        };
        assert!(range.contains(-2));
        assert!(range.contains(9));
        assert!(!range.contains(-3));
    }
}
