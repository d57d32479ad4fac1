//! Entity resolution: binding a placement filter to a concrete NPC, location,
//! or route, discovering an existing match or creating one from the content
//! defaults.

use std::cmp::Reverse;
use std::collections::HashMap;

use rand::Rng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

use lw_content::package::EntityDefaults;
use lw_content::{EntityProperty, PlacementFilter, Proximity, SelectionStrategy};
use lw_core::entity::{EntityOrigin, HexCoord, Location, Npc, Route};
use lw_core::{EntityId, EntityRef, PlacementKind, Player, World};

use crate::error::ResolutionError;

const NPC_PROPERTIES: [EntityProperty; 10] = [
    EntityProperty::Name,
    EntityProperty::PersonalityType,
    EntityProperty::Profession,
    EntityProperty::Relationship,
    EntityProperty::SocialStanding,
    EntityProperty::StoryRole,
    EntityProperty::KnowledgeLevel,
    EntityProperty::Tier,
    EntityProperty::Bond,
    EntityProperty::Tags,
];

const LOCATION_PROPERTIES: [EntityProperty; 9] = [
    EntityProperty::Name,
    EntityProperty::Privacy,
    EntityProperty::Safety,
    EntityProperty::Activity,
    EntityProperty::Purpose,
    EntityProperty::District,
    EntityProperty::Region,
    EntityProperty::Tier,
    EntityProperty::Tags,
];

const ROUTE_PROPERTIES: [EntityProperty; 5] = [
    EntityProperty::Name,
    EntityProperty::Terrain,
    EntityProperty::Structure,
    EntityProperty::Danger,
    EntityProperty::Tags,
];

/// How a placement was obtained.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ResolutionMetadata {
    /// An existing entity matched.
    Discovered {
        /// Tie-break used.
        strategy: SelectionStrategy,
        /// Number of matching candidates.
        candidates: usize,
        /// Filter dimensions that constrained the match.
        matched: Vec<EntityProperty>,
    },
    /// Nothing matched; a new entity was synthesized.
    Created {
        /// Properties copied from the filter.
        filter_provided: Vec<EntityProperty>,
        /// Properties taken from defaults or generated.
        generated: Vec<EntityProperty>,
    },
    /// Bound to the destination of a route resolved earlier in the scene.
    RouteDestination {
        /// The route.
        route: EntityId,
    },
    /// Bound to one of the scene's dependent locations.
    DependentResource {
        /// Scene-local key.
        key: String,
    },
    /// Supplied by the caller.
    Supplied,
}

/// A resolved placement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    /// The bound entity.
    pub entity: EntityRef,
    /// How it was obtained.
    pub metadata: ResolutionMetadata,
}

impl Resolution {
    /// Whether the entity was created by this resolution.
    pub fn is_created(&self) -> bool {
        matches!(self.metadata, ResolutionMetadata::Created { .. })
    }
}

/// Spatial and player context for a resolution.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResolutionContext {
    /// Location `SameLocation` refers to.
    pub location: Option<EntityId>,
    /// Route resolved earlier in the same scene.
    pub scene_route: Option<EntityId>,
    /// Player position, for `Closest`.
    pub player_position: Option<HexCoord>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    filter: PlacementFilter,
    anchor: Option<EntityId>,
}

#[derive(Debug, Clone)]
struct CacheEntry {
    revision: u64,
    resolution: Resolution,
}

/// Remembers resolutions per filter. An entry is only reused while the world
/// revision it was stored at is still current.
#[derive(Debug, Clone, Default)]
pub struct ResolutionCache {
    entries: HashMap<CacheKey, CacheEntry>,
}

impl ResolutionCache {
    /// Empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn lookup(&self, key: &CacheKey, world: &World) -> Option<Resolution> {
        let entry = self.entries.get(key)?;
        (entry.revision == world.revision() && world.contains(entry.resolution.entity))
            .then(|| entry.resolution.clone())
    }

    fn store(&mut self, key: CacheKey, world: &World, resolution: Resolution) {
        self.entries.insert(
            key,
            CacheEntry {
                revision: world.revision(),
                resolution,
            },
        );
    }
}

/// Whether the filter's player-state gates hold for this player.
pub fn player_gates_pass(filter: &PlacementFilter, player: &Player) -> bool {
    filter.required_states.iter().all(|s| player.has_state(*s))
        && !filter.forbidden_states.iter().any(|s| player.has_state(*s))
        && filter
            .required_achievements
            .iter()
            .all(|a| player.has_achievement(a))
        && filter
            .scale_requirements
            .iter()
            .all(|r| r.contains(player.scales.get(r.scale)))
}

/// Resolves placement filters against the world graph.
pub struct EntityResolver<'a> {
    defaults: &'a EntityDefaults,
    cache: &'a mut ResolutionCache,
    rng: &'a mut StdRng,
}

impl<'a> EntityResolver<'a> {
    /// Create a resolver over the given defaults, cache, and RNG.
    pub fn new(defaults: &'a EntityDefaults, cache: &'a mut ResolutionCache, rng: &'a mut StdRng) -> Self {
        Self {
            defaults,
            cache,
            rng,
        }
    }

    /// Resolve a filter. Created entities are inserted into `world`.
    pub fn resolve(
        &mut self,
        filter: &PlacementFilter,
        context: &ResolutionContext,
        world: &mut World,
    ) -> Result<Resolution, ResolutionError> {
        if filter.proximity == Proximity::RouteDestination {
            return route_destination(context, world);
        }

        let anchor = match filter.proximity {
            Proximity::SameLocation => Some(context.location.ok_or(ResolutionError::NoLocationContext)?),
            _ => None,
        };
        let key = CacheKey {
            filter: filter.clone(),
            anchor,
        };
        if let Some(hit) = self.cache.lookup(&key, world) {
            tracing::debug!(
                target: "loomwright::resolver",
                kind = %filter.placement_type,
                "resolution.cache_hit"
            );
            return Ok(hit);
        }

        let candidates = candidates(filter, anchor, world);
        let resolution = if candidates.is_empty() {
            self.create(filter, anchor, world)?
        } else {
            let entity = self.select(filter, &candidates, context, world);
            tracing::debug!(
                target: "loomwright::resolver",
                kind = %filter.placement_type,
                candidates = candidates.len(),
                strategy = ?filter.selection_strategy,
                "resolution.discovered"
            );
            Resolution {
                entity,
                metadata: ResolutionMetadata::Discovered {
                    strategy: filter.selection_strategy,
                    candidates: candidates.len(),
                    matched: filter.provided_properties(),
                },
            }
        };

        self.cache.store(key, world, resolution.clone());
        Ok(resolution)
    }

    // -----------------------------------------------------------------------
    // Selection
    // -----------------------------------------------------------------------

    fn select(
        &mut self,
        filter: &PlacementFilter,
        candidates: &[EntityRef],
        context: &ResolutionContext,
        world: &World,
    ) -> EntityRef {
        let first = candidates[0];
        match filter.selection_strategy {
            SelectionStrategy::First => first,
            SelectionStrategy::Random => candidates[self.rng.random_range(0..candidates.len())],
            SelectionStrategy::Closest => {
                let Some(origin) = context.player_position else {
                    return first;
                };
                candidates
                    .iter()
                    .copied()
                    .min_by_key(|c| position_of(*c, world).map_or(u32::MAX, |p| p.distance(origin)))
                    .unwrap_or(first)
            }
            SelectionStrategy::HighestBond => candidates
                .iter()
                .copied()
                .min_by_key(|c| match c {
                    EntityRef::Npc(id) => Reverse(world.npc(*id).map_or(i32::MIN, |n| n.bond)),
                    _ => Reverse(i32::MIN),
                })
                .unwrap_or(first),
            SelectionStrategy::LeastRecent => candidates
                .iter()
                .copied()
                .min_by_key(|c| match c {
                    EntityRef::Npc(id) => world.npc(*id).map_or(u32::MAX, |n| n.interactions),
                    EntityRef::Location(id) => world.location(*id).map_or(u32::MAX, |l| l.visits),
                    EntityRef::Route(_) => 0,
                })
                .unwrap_or(first),
        }
    }

    // -----------------------------------------------------------------------
    // Creation
    // -----------------------------------------------------------------------

    fn pick_name(&mut self, pool: &[String], fallback: String) -> String {
        if pool.is_empty() {
            fallback
        } else {
            pool[self.rng.random_range(0..pool.len())].clone()
        }
    }

    fn create(
        &mut self,
        filter: &PlacementFilter,
        anchor: Option<EntityId>,
        world: &mut World,
    ) -> Result<Resolution, ResolutionError> {
        let mut provided = filter.provided_properties();
        let id = EntityId::from_rng(self.rng);

        let (entity, all): (EntityRef, &[EntityProperty]) = match filter.placement_type {
            PlacementKind::Npc => {
                let defaults = self
                    .defaults
                    .npc
                    .as_ref()
                    .ok_or(ResolutionError::NoDefaults(PlacementKind::Npc))?;
                let profession = filter.profession.unwrap_or(defaults.profession);
                let name = self.pick_name(&defaults.names, format!("Unnamed {profession}"));
                let npc = Npc {
                    id,
                    key: format!("npc-{}", id.0.simple()),
                    name,
                    description: String::new(),
                    personality: filter.personality_type.unwrap_or(defaults.personality_type),
                    profession,
                    relationship: filter.relationship.unwrap_or(defaults.relationship),
                    social_standing: filter.social_standing.unwrap_or(defaults.social_standing),
                    story_role: filter.story_role.unwrap_or(defaults.story_role),
                    knowledge: filter.knowledge_level.unwrap_or(defaults.knowledge_level),
                    tier: bounded(filter.min_tier, filter.max_tier, defaults.tier),
                    bond: bounded(filter.min_bond, filter.max_bond, defaults.bond),
                    interactions: 0,
                    location: anchor,
                    tags: filter.tags.clone(),
                    origin: EntityOrigin::Procedural,
                };
                if anchor.is_some() {
                    provided.push(EntityProperty::Location);
                }
                (EntityRef::Npc(world.add_npc(npc)?), &NPC_PROPERTIES[..])
            }
            PlacementKind::Location => {
                let defaults = self
                    .defaults
                    .location
                    .as_ref()
                    .ok_or(ResolutionError::NoDefaults(PlacementKind::Location))?;
                let purpose = filter.purpose.unwrap_or(defaults.purpose);
                let name = self.pick_name(&defaults.names, format!("Nameless {purpose} Site"));
                let location = Location {
                    id,
                    key: format!("location-{}", id.0.simple()),
                    name,
                    description: String::new(),
                    privacy: filter.privacy.unwrap_or(defaults.privacy),
                    safety: filter.safety.unwrap_or(defaults.safety),
                    activity: filter.activity.unwrap_or(defaults.activity),
                    purpose,
                    district: filter.district.clone(),
                    region: filter.region.clone(),
                    tier: bounded(filter.min_tier, filter.max_tier, defaults.tier),
                    visits: 0,
                    position: None,
                    tags: filter.tags.clone(),
                    origin: EntityOrigin::Procedural,
                };
                (
                    EntityRef::Location(world.add_location(location)?),
                    &LOCATION_PROPERTIES[..],
                )
            }
            PlacementKind::Route => {
                let defaults = self
                    .defaults
                    .route
                    .as_ref()
                    .ok_or(ResolutionError::NoDefaults(PlacementKind::Route))?;
                let name = self.pick_name(&defaults.names, "Unmarked Trail".to_string());
                let route = Route {
                    id,
                    key: format!("route-{}", id.0.simple()),
                    name,
                    from: anchor,
                    to: None,
                    terrain: filter.terrain.unwrap_or(defaults.terrain),
                    structure: filter.structure.unwrap_or(defaults.structure),
                    danger: bounded(filter.min_danger, filter.max_danger, defaults.danger),
                    tags: filter.tags.clone(),
                    origin: EntityOrigin::Procedural,
                };
                if anchor.is_some() {
                    provided.push(EntityProperty::Origin);
                }
                (EntityRef::Route(world.add_route(route)?), &ROUTE_PROPERTIES[..])
            }
        };

        let generated: Vec<EntityProperty> = all
            .iter()
            .copied()
            .filter(|p| !provided.contains(p))
            .collect();
        tracing::debug!(
            target: "loomwright::resolver",
            kind = %filter.placement_type,
            entity = %entity.id(),
            provided = provided.len(),
            generated = generated.len(),
            "resolution.created"
        );
        Ok(Resolution {
            entity,
            metadata: ResolutionMetadata::Created {
                filter_provided: provided,
                generated,
            },
        })
    }
}

/// The lower bound if set, else the upper bound, else the default, clamped
/// into whichever bounds exist.
fn bounded<T: Ord + Copy>(min: Option<T>, max: Option<T>, default: T) -> T {
    let mut value = min.or(max).unwrap_or(default);
    if let Some(min) = min {
        value = value.max(min);
    }
    if let Some(max) = max {
        value = value.min(max);
    }
    value
}

fn route_destination(context: &ResolutionContext, world: &World) -> Result<Resolution, ResolutionError> {
    let route_id = context.scene_route.ok_or(ResolutionError::NoRouteContext)?;
    let destination = world
        .route(route_id)
        .and_then(|r| r.to)
        .ok_or(ResolutionError::RouteWithoutDestination(route_id))?;
    Ok(Resolution {
        entity: EntityRef::Location(destination),
        metadata: ResolutionMetadata::RouteDestination { route: route_id },
    })
}

fn position_of(entity: EntityRef, world: &World) -> Option<HexCoord> {
    let location = match entity {
        EntityRef::Location(id) => Some(id),
        EntityRef::Npc(id) => world.npc(id).and_then(|n| n.location),
        EntityRef::Route(id) => world.route(id).and_then(|r| r.from),
    }?;
    world.location(location).and_then(|l| l.position)
}

// ---------------------------------------------------------------------------
// Matching
// ---------------------------------------------------------------------------

/// Entities a filter can discover. Scene-dependent entities belong to the
/// scene that installed them; the only way to reach one is as the explicit
/// `SameLocation` anchor.
fn candidates(filter: &PlacementFilter, anchor: Option<EntityId>, world: &World) -> Vec<EntityRef> {
    match filter.placement_type {
        PlacementKind::Npc => world
            .npcs()
            .iter()
            .filter(|n| shareable(&n.origin))
            .filter(|n| anchor.is_none_or(|loc| n.location == Some(loc)))
            .filter(|n| npc_matches(filter, n))
            .map(|n| EntityRef::Npc(n.id))
            .collect(),
        PlacementKind::Location => world
            .locations()
            .iter()
            .filter(|l| anchor.map_or(shareable(&l.origin), |loc| l.id == loc))
            .filter(|l| location_matches(filter, l))
            .map(|l| EntityRef::Location(l.id))
            .collect(),
        PlacementKind::Route => world
            .routes()
            .iter()
            .filter(|r| shareable(&r.origin))
            .filter(|r| anchor.is_none_or(|loc| r.from == Some(loc)))
            .filter(|r| route_matches(filter, r))
            .map(|r| EntityRef::Route(r.id))
            .collect(),
    }
}

fn shareable(origin: &EntityOrigin) -> bool {
    !matches!(origin, EntityOrigin::SceneDependent { .. })
}

fn eq<T: PartialEq>(wanted: Option<T>, actual: T) -> bool {
    wanted.is_none_or(|w| w == actual)
}

fn within<T: PartialOrd>(min: Option<T>, max: Option<T>, actual: T) -> bool {
    min.is_none_or(|m| actual >= m) && max.is_none_or(|m| actual <= m)
}

fn has_tags(wanted: &[String], actual: &[String]) -> bool {
    wanted.iter().all(|t| actual.contains(t))
}

fn npc_matches(f: &PlacementFilter, n: &Npc) -> bool {
    eq(f.personality_type, n.personality)
        && eq(f.profession, n.profession)
        && eq(f.relationship, n.relationship)
        && eq(f.social_standing, n.social_standing)
        && eq(f.story_role, n.story_role)
        && eq(f.knowledge_level, n.knowledge)
        && within(f.min_tier, f.max_tier, n.tier)
        && within(f.min_bond, f.max_bond, n.bond)
        && has_tags(&f.tags, &n.tags)
}

fn location_matches(f: &PlacementFilter, l: &Location) -> bool {
    eq(f.privacy, l.privacy)
        && eq(f.safety, l.safety)
        && eq(f.activity, l.activity)
        && eq(f.purpose, l.purpose)
        && f.district.as_ref().is_none_or(|d| l.district.as_ref() == Some(d))
        && f.region.as_ref().is_none_or(|r| l.region.as_ref() == Some(r))
        && eq(f.visited, l.visited())
        && within(f.min_tier, f.max_tier, l.tier)
        && has_tags(&f.tags, &l.tags)
}

fn route_matches(f: &PlacementFilter, r: &Route) -> bool {
    eq(f.terrain, r.terrain)
        && eq(f.structure, r.structure)
        && within(f.min_danger, f.max_danger, r.danger)
        && has_tags(&f.tags, &r.tags)
}

#[cfg(test)]
mod tests {
    use super::*;
    use lw_content::package::{LocationDefaults, NpcDefaults};
    use lw_core::SceneId;
    use lw_core::category::{LocationPrivacy, LocationPurpose, Profession};
    use rand::SeedableRng;

    fn npc_defaults() -> EntityDefaults {
        EntityDefaults {
            npc: Some(NpcDefaults {
                names: vec!["Mara".into(), "Tobin".into()],
                personality_type: Default::default(),
                profession: Profession::Commoner,
                relationship: Default::default(),
                social_standing: Default::default(),
                story_role: Default::default(),
                knowledge_level: Default::default(),
                tier: 1,
                bond: 0,
            }),
            ..EntityDefaults::default()
        }
    }

    fn test_world() -> World {
        let mut world = World::default();
        let square = world
            .add_location(
                Location::new("square", "Market Square")
                    .with_purpose(LocationPurpose::Commerce)
                    .with_position(HexCoord::new(0, 0)),
            )
            .unwrap();
        let docks = world
            .add_location(Location::new("docks", "Docks").with_position(HexCoord::new(5, 0)))
            .unwrap();
        world
            .add_npc(Npc::new("guard_far", "Far Guard").with_profession(Profession::Guard).at(docks))
            .unwrap();
        world
            .add_npc(
                Npc::new("guard_near", "Near Guard")
                    .with_profession(Profession::Guard)
                    .at(square)
                    .with_bond(6),
            )
            .unwrap();
        world
    }

    #[test]
    fn creates_when_nothing_matches() {
        let defaults = npc_defaults();
        let mut cache = ResolutionCache::new();
        let mut rng = StdRng::seed_from_u64(1);
        let mut world = test_world();
        let filter = PlacementFilter::npc().with_profession(Profession::Merchant);

        let resolution = EntityResolver::new(&defaults, &mut cache, &mut rng)
            .resolve(&filter, &ResolutionContext::default(), &mut world)
            .unwrap();

        let ResolutionMetadata::Created {
            filter_provided,
            generated,
        } = &resolution.metadata
        else {
            panic!("expected creation, got {:?}", resolution.metadata);
        };
        assert_eq!(filter_provided, &vec![EntityProperty::Profession]);
        assert!(!generated.contains(&EntityProperty::Profession));
        assert!(generated.contains(&EntityProperty::Name));
        assert_eq!(generated.len(), NPC_PROPERTIES.len() - 1);

        let npc = world.npc(resolution.entity.id()).unwrap();
        assert_eq!(npc.profession, Profession::Merchant);
        assert_eq!(npc.origin, EntityOrigin::Procedural);
        assert!(["Mara", "Tobin"].contains(&npc.name.as_str()));
    }

    #[test]
    fn discovers_first_match() {
        let defaults = EntityDefaults::default();
        let mut cache = ResolutionCache::new();
        let mut rng = StdRng::seed_from_u64(1);
        let mut world = test_world();
        let filter = PlacementFilter::npc().with_profession(Profession::Guard);

        let resolution = EntityResolver::new(&defaults, &mut cache, &mut rng)
            .resolve(&filter, &ResolutionContext::default(), &mut world)
            .unwrap();
        assert_eq!(world.npc(resolution.entity.id()).unwrap().key, "guard_far");
        assert!(matches!(
            resolution.metadata,
            ResolutionMetadata::Discovered { candidates: 2, .. }
        ));
    }

    #[test]
    fn strategies_break_ties() {
        let defaults = EntityDefaults::default();
        let mut cache = ResolutionCache::new();
        let mut rng = StdRng::seed_from_u64(1);
        let mut world = test_world();
        let context = ResolutionContext {
            player_position: Some(HexCoord::new(1, 0)),
            ..ResolutionContext::default()
        };

        let mut resolver = EntityResolver::new(&defaults, &mut cache, &mut rng);
        let closest = PlacementFilter::npc()
            .with_profession(Profession::Guard)
            .with_strategy(SelectionStrategy::Closest);
        let r = resolver.resolve(&closest, &context, &mut world).unwrap();
        assert_eq!(world.npc(r.entity.id()).unwrap().key, "guard_near");

        let bonded = PlacementFilter::npc().with_strategy(SelectionStrategy::HighestBond);
        let r = resolver.resolve(&bonded, &context, &mut world).unwrap();
        assert_eq!(world.npc(r.entity.id()).unwrap().key, "guard_near");
    }

    #[test]
    fn same_location_limits_candidates() {
        let defaults = npc_defaults();
        let mut cache = ResolutionCache::new();
        let mut rng = StdRng::seed_from_u64(1);
        let mut world = test_world();
        let square = world.find_location_by_key("square").unwrap().id;
        let filter = PlacementFilter::npc().with_proximity(Proximity::SameLocation);
        let context = ResolutionContext {
            location: Some(square),
            ..ResolutionContext::default()
        };

        let mut resolver = EntityResolver::new(&defaults, &mut cache, &mut rng);
        let r = resolver.resolve(&filter, &context, &mut world).unwrap();
        assert_eq!(world.npc(r.entity.id()).unwrap().key, "guard_near");

        let err = resolver
            .resolve(&filter, &ResolutionContext::default(), &mut world)
            .unwrap_err();
        assert!(matches!(err, ResolutionError::NoLocationContext));
    }

    #[test]
    fn repeated_resolution_is_idempotent() {
        let defaults = npc_defaults();
        let mut cache = ResolutionCache::new();
        let mut rng = StdRng::seed_from_u64(1);
        let mut world = test_world();
        let filter = PlacementFilter::npc()
            .with_profession(Profession::Scholar)
            .with_strategy(SelectionStrategy::Random);

        let mut resolver = EntityResolver::new(&defaults, &mut cache, &mut rng);
        let first = resolver
            .resolve(&filter, &ResolutionContext::default(), &mut world)
            .unwrap();
        let count = world.npcs().len();
        let second = resolver
            .resolve(&filter, &ResolutionContext::default(), &mut world)
            .unwrap();
        assert_eq!(first, second);
        assert_eq!(world.npcs().len(), count);
    }

    #[test]
    fn missing_defaults_is_an_error() {
        let defaults = EntityDefaults::default();
        let mut cache = ResolutionCache::new();
        let mut rng = StdRng::seed_from_u64(1);
        let mut world = World::default();
        let err = EntityResolver::new(&defaults, &mut cache, &mut rng)
            .resolve(&PlacementFilter::route(), &ResolutionContext::default(), &mut world)
            .unwrap_err();
        assert!(matches!(err, ResolutionError::NoDefaults(PlacementKind::Route)));
        assert!(world.routes().is_empty());
    }

    #[test]
    fn route_destination_binds_earlier_route() {
        let defaults = EntityDefaults::default();
        let mut cache = ResolutionCache::new();
        let mut rng = StdRng::seed_from_u64(1);
        let mut world = test_world();
        let square = world.find_location_by_key("square").unwrap().id;
        let docks = world.find_location_by_key("docks").unwrap().id;
        let road = world
            .add_route(Route::new("road", "Harbor Road").between(square, docks))
            .unwrap();
        let filter = PlacementFilter::location().with_proximity(Proximity::RouteDestination);

        let mut resolver = EntityResolver::new(&defaults, &mut cache, &mut rng);
        let context = ResolutionContext {
            scene_route: Some(road),
            ..ResolutionContext::default()
        };
        let r = resolver.resolve(&filter, &context, &mut world).unwrap();
        assert_eq!(r.entity, EntityRef::Location(docks));
        assert_eq!(r.metadata, ResolutionMetadata::RouteDestination { route: road });

        let err = resolver
            .resolve(&filter, &ResolutionContext::default(), &mut world)
            .unwrap_err();
        assert!(matches!(err, ResolutionError::NoRouteContext));
    }

    #[test]
    fn least_recent_prefers_fewest_interactions_and_visits() {
        let defaults = EntityDefaults::default();
        let mut rng = StdRng::seed_from_u64(1);
        let mut world = test_world();
        let far = world.find_npc_by_key("guard_far").unwrap().id;
        world.npc_mut(far).unwrap().interactions = 3;
        let guards = PlacementFilter::npc()
            .with_profession(Profession::Guard)
            .with_strategy(SelectionStrategy::LeastRecent);

        let mut cache = ResolutionCache::new();
        let r = EntityResolver::new(&defaults, &mut cache, &mut rng)
            .resolve(&guards, &ResolutionContext::default(), &mut world)
            .unwrap();
        assert_eq!(world.npc(r.entity.id()).unwrap().key, "guard_near");

        let square = world.find_location_by_key("square").unwrap().id;
        world.location_mut(square).unwrap().visits = 2;
        let places = PlacementFilter::location().with_strategy(SelectionStrategy::LeastRecent);
        let mut cache = ResolutionCache::new();
        let r = EntityResolver::new(&defaults, &mut cache, &mut rng)
            .resolve(&places, &ResolutionContext::default(), &mut world)
            .unwrap();
        assert_eq!(world.location(r.entity.id()).unwrap().key, "docks");
    }

    #[test]
    fn random_spreads_over_candidates_and_follows_the_seed() {
        let defaults = EntityDefaults::default();
        let filter = PlacementFilter::npc()
            .with_profession(Profession::Guard)
            .with_strategy(SelectionStrategy::Random);
        let pick = |seed: u64| {
            let mut world = test_world();
            let mut cache = ResolutionCache::new();
            let mut rng = StdRng::seed_from_u64(seed);
            let r = EntityResolver::new(&defaults, &mut cache, &mut rng)
                .resolve(&filter, &ResolutionContext::default(), &mut world)
                .unwrap();
            assert!(matches!(r.metadata, ResolutionMetadata::Discovered { candidates: 2, .. }));
            world.npc(r.entity.id()).unwrap().key.clone()
        };

        let picked: std::collections::HashSet<String> = (0..32).map(&pick).collect();
        assert_eq!(picked.len(), 2);
        assert_eq!(pick(9), pick(9));
    }

    #[test]
    fn scene_dependent_locations_are_not_discovered() {
        let defaults = EntityDefaults {
            location: Some(LocationDefaults {
                names: vec!["Quiet Yard".into()],
                privacy: Default::default(),
                safety: Default::default(),
                activity: Default::default(),
                purpose: Default::default(),
                tier: 1,
            }),
            ..EntityDefaults::default()
        };
        let mut cache = ResolutionCache::new();
        let mut rng = StdRng::seed_from_u64(1);
        let mut world = test_world();
        let mut room = Location::new("abc.room", "Back Room");
        room.privacy = LocationPrivacy::Private;
        room.origin = EntityOrigin::SceneDependent { scene: SceneId::new() };
        let room = world.add_location(room).unwrap();

        let mut resolver = EntityResolver::new(&defaults, &mut cache, &mut rng);
        let private = PlacementFilter {
            privacy: Some(LocationPrivacy::Private),
            ..PlacementFilter::location()
        };
        let r = resolver
            .resolve(&private, &ResolutionContext::default(), &mut world)
            .unwrap();
        assert!(r.is_created());
        assert_ne!(r.entity.id(), room);

        let here = PlacementFilter::location().with_proximity(Proximity::SameLocation);
        let context = ResolutionContext {
            location: Some(room),
            ..ResolutionContext::default()
        };
        let r = resolver.resolve(&here, &context, &mut world).unwrap();
        assert_eq!(r.entity, EntityRef::Location(room));
    }

    #[test]
    fn bounded_prefers_lower_bound() {
        assert_eq!(bounded(Some(3), Some(5), 1), 3);
        assert_eq!(bounded(None, Some(5), 9), 5);
        assert_eq!(bounded(None, None, 2), 2);
        assert_eq!(bounded(Some(4), None, 1), 4);
    }
}
