use serde::{Deserialize, Serialize};

use crate::entity::{EntityKind, EntityOrigin, EntityRef, Item, Location, Npc, Route};
use crate::error::{CoreError, CoreResult};
use crate::id::{EntityId, SceneId};

/// Metadata about the world itself.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorldMeta {
    /// World name.
    pub name: String,
    /// Free-form description.
    pub description: String,
}

impl WorldMeta {
    /// Metadata with a name and no description.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
        }
    }
}

/// The live world graph. Owns every NPC, location, route, and item.
///
/// Entities are kept in insertion order, which makes the `First` selection
/// strategy stable. Every structural or property mutation bumps
/// [`World::revision`], which lets callers detect an unchanged graph.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct World {
    /// World metadata.
    pub meta: WorldMeta,
    npcs: Vec<Npc>,
    locations: Vec<Location>,
    routes: Vec<Route>,
    items: Vec<Item>,
    revision: u64,
}

impl World {
    /// Create an empty world.
    pub fn new(meta: WorldMeta) -> Self {
        Self {
            meta,
            ..Self::default()
        }
    }

    /// Mutation counter.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    fn touch(&mut self) {
        self.revision += 1;
    }

    // -----------------------------------------------------------------------
    // Insertion
    // -----------------------------------------------------------------------

    /// Add an NPC. Keys must be unique among NPCs.
    pub fn add_npc(&mut self, npc: Npc) -> CoreResult<EntityId> {
        if self.find_npc_by_key(&npc.key).is_some() {
            return Err(CoreError::DuplicateKey {
                kind: EntityKind::Npc,
                key: npc.key,
            });
        }
        let id = npc.id;
        self.npcs.push(npc);
        self.touch();
        Ok(id)
    }

    /// Add a location. Keys must be unique among locations.
    pub fn add_location(&mut self, location: Location) -> CoreResult<EntityId> {
        if self.find_location_by_key(&location.key).is_some() {
            return Err(CoreError::DuplicateKey {
                kind: EntityKind::Location,
                key: location.key,
            });
        }
        let id = location.id;
        self.locations.push(location);
        self.touch();
        Ok(id)
    }

    /// Add a route. Keys must be unique among routes.
    pub fn add_route(&mut self, route: Route) -> CoreResult<EntityId> {
        if self.find_route_by_key(&route.key).is_some() {
            return Err(CoreError::DuplicateKey {
                kind: EntityKind::Route,
                key: route.key,
            });
        }
        let id = route.id;
        self.routes.push(route);
        self.touch();
        Ok(id)
    }

    /// Add an item. Keys must be unique among items.
    pub fn add_item(&mut self, item: Item) -> CoreResult<EntityId> {
        if self.find_item_by_key(&item.key).is_some() {
            return Err(CoreError::DuplicateKey {
                kind: EntityKind::Item,
                key: item.key,
            });
        }
        let id = item.id;
        self.items.push(item);
        self.touch();
        Ok(id)
    }

    // -----------------------------------------------------------------------
    // Lookup
    // -----------------------------------------------------------------------

    /// All NPCs in insertion order.
    pub fn npcs(&self) -> &[Npc] {
        &self.npcs
    }

    /// All locations in insertion order.
    pub fn locations(&self) -> &[Location] {
        &self.locations
    }

    /// All routes in insertion order.
    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    /// All items in insertion order.
    pub fn items(&self) -> &[Item] {
        &self.items
    }

    /// Get an NPC by ID.
    pub fn npc(&self, id: EntityId) -> Option<&Npc> {
        self.npcs.iter().find(|n| n.id == id)
    }

    /// Get a location by ID.
    pub fn location(&self, id: EntityId) -> Option<&Location> {
        self.locations.iter().find(|l| l.id == id)
    }

    /// Get a route by ID.
    pub fn route(&self, id: EntityId) -> Option<&Route> {
        self.routes.iter().find(|r| r.id == id)
    }

    /// Get an item by ID.
    pub fn item(&self, id: EntityId) -> Option<&Item> {
        self.items.iter().find(|i| i.id == id)
    }

    /// Mutable NPC access. Counts as a mutation.
    pub fn npc_mut(&mut self, id: EntityId) -> Option<&mut Npc> {
        self.touch();
        self.npcs.iter_mut().find(|n| n.id == id)
    }

    /// Mutable location access. Counts as a mutation.
    pub fn location_mut(&mut self, id: EntityId) -> Option<&mut Location> {
        self.touch();
        self.locations.iter_mut().find(|l| l.id == id)
    }

    /// Find an NPC by content key.
    pub fn find_npc_by_key(&self, key: &str) -> Option<&Npc> {
        self.npcs.iter().find(|n| n.key == key)
    }

    /// Find a location by content key.
    pub fn find_location_by_key(&self, key: &str) -> Option<&Location> {
        self.locations.iter().find(|l| l.key == key)
    }

    /// Find a route by content key.
    pub fn find_route_by_key(&self, key: &str) -> Option<&Route> {
        self.routes.iter().find(|r| r.key == key)
    }

    /// Find an item by content key.
    pub fn find_item_by_key(&self, key: &str) -> Option<&Item> {
        self.items.iter().find(|i| i.key == key)
    }

    /// Resolve an item key to its ID.
    pub fn item_id(&self, key: &str) -> CoreResult<EntityId> {
        self.find_item_by_key(key)
            .map(|i| i.id)
            .ok_or_else(|| CoreError::UnknownKey {
                kind: EntityKind::Item,
                key: key.to_string(),
            })
    }

    /// Whether the referenced entity exists.
    pub fn contains(&self, entity: EntityRef) -> bool {
        match entity {
            EntityRef::Npc(id) => self.npc(id).is_some(),
            EntityRef::Location(id) => self.location(id).is_some(),
            EntityRef::Route(id) => self.route(id).is_some(),
        }
    }

    /// Display name of a placeable entity.
    pub fn display_name(&self, entity: EntityRef) -> Option<&str> {
        match entity {
            EntityRef::Npc(id) => self.npc(id).map(|n| n.name.as_str()),
            EntityRef::Location(id) => self.location(id).map(|l| l.name.as_str()),
            EntityRef::Route(id) => self.route(id).map(|r| r.name.as_str()),
        }
    }

    /// NPCs currently at a location.
    pub fn npcs_at(&self, location: EntityId) -> impl Iterator<Item = &Npc> {
        self.npcs
            .iter()
            .filter(move |n| n.location == Some(location))
    }

    /// Routes departing from a location.
    pub fn routes_from(&self, location: EntityId) -> impl Iterator<Item = &Route> {
        self.routes.iter().filter(move |r| r.from == Some(location))
    }

    // -----------------------------------------------------------------------
    // Removal
    // -----------------------------------------------------------------------

    /// Remove every location and item manufactured for a scene. Returns the
    /// removed IDs.
    pub fn remove_scene_dependents(&mut self, scene: SceneId) -> Vec<EntityId> {
        let owned = EntityOrigin::SceneDependent { scene };
        let mut removed: Vec<EntityId> = Vec::new();
        removed.extend(
            self.locations
                .iter()
                .filter(|l| l.origin == owned)
                .map(|l| l.id),
        );
        removed.extend(self.items.iter().filter(|i| i.origin == owned).map(|i| i.id));
        if removed.is_empty() {
            return removed;
        }
        self.locations.retain(|l| l.origin != owned);
        self.items.retain(|i| i.origin != owned);
        for npc in &mut self.npcs {
            if npc.location.is_some_and(|loc| removed.contains(&loc)) {
                npc.location = None;
            }
        }
        self.touch();
        removed
    }
}
