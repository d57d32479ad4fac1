//! Frozen copies of entities and the player, taken when a trace event is
//! recorded. Later changes to the live entity do not reach the trace.

use serde::{Deserialize, Serialize};

use lw_core::category::{LocationPurpose, LocationSafety, PersonalityType, Profession, Terrain};
use lw_core::entity::{Location, Npc, Route};
use lw_core::player::{Resources, Scales, Stats};
use lw_core::{EntityId, EntityRef, Player, StateType, World};

/// An NPC as it was.
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NpcSnapshot {
    pub id: EntityId,
    pub key: String,
    pub name: String,
    pub personality: PersonalityType,
    pub profession: Profession,
    pub tier: u32,
    pub bond: i32,
    pub location: Option<EntityId>,
}

impl From<&Npc> for NpcSnapshot {
    fn from(npc: &Npc) -> Self {
        Self {
            id: npc.id,
            key: npc.key.clone(),
            name: npc.name.clone(),
            personality: npc.personality,
            profession: npc.profession,
            tier: npc.tier,
            bond: npc.bond,
            location: npc.location,
        }
    }
}

/// A location as it was.
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationSnapshot {
    pub id: EntityId,
    pub key: String,
    pub name: String,
    pub purpose: LocationPurpose,
    pub safety: LocationSafety,
    pub district: Option<String>,
    pub region: Option<String>,
    pub visits: u32,
}

impl From<&Location> for LocationSnapshot {
    fn from(location: &Location) -> Self {
        Self {
            id: location.id,
            key: location.key.clone(),
            name: location.name.clone(),
            purpose: location.purpose,
            safety: location.safety,
            district: location.district.clone(),
            region: location.region.clone(),
            visits: location.visits,
        }
    }
}

/// A route as it was.
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteSnapshot {
    pub id: EntityId,
    pub key: String,
    pub name: String,
    pub from: Option<EntityId>,
    pub to: Option<EntityId>,
    pub terrain: Terrain,
    pub danger: u32,
}

impl From<&Route> for RouteSnapshot {
    fn from(route: &Route) -> Self {
        Self {
            id: route.id,
            key: route.key.clone(),
            name: route.name.clone(),
            from: route.from,
            to: route.to,
            terrain: route.terrain,
            danger: route.danger,
        }
    }
}

/// The entity a scene was placed on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PlacementSnapshot {
    /// NPC placement.
    Npc(NpcSnapshot),
    /// Location placement.
    Location(LocationSnapshot),
    /// Route placement.
    Route(RouteSnapshot),
}

impl PlacementSnapshot {
    /// Capture the referenced entity, if it exists.
    pub fn capture(world: &World, entity: EntityRef) -> Option<Self> {
        match entity {
            EntityRef::Npc(id) => world.npc(id).map(|n| Self::Npc(n.into())),
            EntityRef::Location(id) => world.location(id).map(|l| Self::Location(l.into())),
            EntityRef::Route(id) => world.route(id).map(|r| Self::Route(r.into())),
        }
    }

    /// Display name of the captured entity.
    pub fn name(&self) -> &str {
        match self {
            Self::Npc(n) => &n.name,
            Self::Location(l) => &l.name,
            Self::Route(r) => &r.name,
        }
    }
}

/// The player's numbers and flags at one moment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerSnapshot {
    /// Resource pools.
    pub resources: Resources,
    /// Stats.
    pub stats: Stats,
    /// Scales.
    pub scales: Scales,
    /// Active states.
    pub states: Vec<StateType>,
    /// Earned achievement ids.
    pub achievements: Vec<String>,
    /// Carried item ids.
    pub inventory: Vec<EntityId>,
    /// Completed situations count.
    pub completed_situations: u32,
    /// Current location.
    pub location: Option<EntityId>,
}

impl From<&Player> for PlayerSnapshot {
    fn from(player: &Player) -> Self {
        Self {
            resources: player.resources,
            stats: player.stats,
            scales: player.scales,
            states: player.states.iter().map(|s| s.state).collect(),
            achievements: player.achievements.iter().map(|a| a.id.clone()).collect(),
            inventory: player.inventory.clone(),
            completed_situations: player.completed_situations,
            location: player.location,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_is_detached_from_live_entity() {
        let mut world = World::default();
        let id = world.add_npc(Npc::new("elena", "Elena").with_bond(3)).unwrap();
        let snapshot = PlacementSnapshot::capture(&world, EntityRef::Npc(id)).unwrap();
        if let Some(npc) = world.npc_mut(id) {
            npc.bond = 12;
        }
        let PlacementSnapshot::Npc(npc) = snapshot else {
            panic!("expected an NPC snapshot");
        };
        assert_eq!(npc.bond, 3);
    }

    #[test]
    fn missing_entity_captures_nothing() {
        let world = World::default();
        assert!(PlacementSnapshot::capture(&world, EntityRef::Route(EntityId::new())).is_none());
    }
}
