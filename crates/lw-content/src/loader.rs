//! Reading content packages from JSON and installing their entities into a
//! world.

use std::path::Path;

use rand::Rng;

use lw_core::entity::{EntityOrigin, Item, Location, Npc, Route};
use lw_core::{CoreError, EntityId, EntityKind, World};

use crate::error::{ContentError, ContentResult};
use crate::package::ContentPackage;

/// Parse one package from a JSON string. `origin` names the document in errors.
pub fn parse_package(json: &str, origin: &str) -> ContentResult<ContentPackage> {
    serde_json::from_str(json).map_err(|source| ContentError::Parse {
        origin: origin.to_string(),
        source,
    })
}

/// Parse one package from an in-memory JSON value.
pub fn package_from_value(value: serde_json::Value, origin: &str) -> ContentResult<ContentPackage> {
    serde_json::from_value(value).map_err(|source| ContentError::Parse {
        origin: origin.to_string(),
        source,
    })
}

/// Load a package from a file, or merge every `*.json` file of a directory in
/// file-name order.
pub fn load_path(path: &Path) -> ContentResult<ContentPackage> {
    if path.is_dir() {
        let entries = std::fs::read_dir(path).map_err(|source| ContentError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut files: Vec<_> = entries
            .filter_map(|e| e.ok().map(|e| e.path()))
            .filter(|p| p.extension().is_some_and(|ext| ext == "json"))
            .collect();
        files.sort();

        let mut merged = ContentPackage::default();
        for file in files {
            merged.merge(load_file(&file)?);
        }
        Ok(merged)
    } else {
        load_file(path)
    }
}

/// Load a package from a single file.
pub fn load_file(path: &Path) -> ContentResult<ContentPackage> {
    let json = std::fs::read_to_string(path).map_err(|source| ContentError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let package = parse_package(&json, &path.display().to_string())?;
    tracing::debug!(
        target: "loomwright::content",
        path = %path.display(),
        templates = package.scene_templates.len(),
        "content.file_loaded"
    );
    Ok(package)
}

/// IDs of the entities installed from one package.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstalledEntities {
    /// Installed locations, in declaration order.
    pub locations: Vec<EntityId>,
    /// Installed NPCs, in declaration order.
    pub npcs: Vec<EntityId>,
    /// Installed routes, in declaration order.
    pub routes: Vec<EntityId>,
    /// Installed items, in declaration order.
    pub items: Vec<EntityId>,
}

/// Install a package's entities into a world. Locations go first so NPC and
/// route references can resolve against them. IDs are drawn from `rng`.
///
/// Key references may point at entities already in the world.
pub fn install_entities<R: Rng + ?Sized>(
    package: &ContentPackage,
    world: &mut World,
    origin: EntityOrigin,
    rng: &mut R,
) -> ContentResult<InstalledEntities> {
    let mut installed = InstalledEntities::default();

    for def in &package.locations {
        let location = Location {
            id: EntityId::from_rng(rng),
            key: def.key.clone(),
            name: def.name.clone(),
            description: def.description.clone(),
            privacy: def.privacy,
            safety: def.safety,
            activity: def.activity,
            purpose: def.purpose,
            district: def.district.clone(),
            region: def.region.clone(),
            tier: def.tier,
            visits: 0,
            position: def.position,
            tags: def.tags.clone(),
            origin,
        };
        installed.locations.push(world.add_location(location)?);
    }

    for def in &package.npcs {
        let location = def
            .location
            .as_deref()
            .map(|key| location_id(world, key))
            .transpose()?;
        let npc = Npc {
            id: EntityId::from_rng(rng),
            key: def.key.clone(),
            name: def.name.clone(),
            description: def.description.clone(),
            personality: def.personality_type,
            profession: def.profession,
            relationship: def.relationship,
            social_standing: def.social_standing,
            story_role: def.story_role,
            knowledge: def.knowledge_level,
            tier: def.tier,
            bond: def.bond,
            interactions: 0,
            location,
            tags: def.tags.clone(),
            origin,
        };
        installed.npcs.push(world.add_npc(npc)?);
    }

    for def in &package.routes {
        let from = def.from.as_deref().map(|k| location_id(world, k)).transpose()?;
        let to = def.to.as_deref().map(|k| location_id(world, k)).transpose()?;
        let route = Route {
            id: EntityId::from_rng(rng),
            key: def.key.clone(),
            name: def.name.clone(),
            from,
            to,
            terrain: def.terrain,
            structure: def.structure,
            danger: def.danger,
            tags: def.tags.clone(),
            origin,
        };
        installed.routes.push(world.add_route(route)?);
    }

    for def in &package.items {
        let item = Item {
            id: EntityId::from_rng(rng),
            key: def.key.clone(),
            name: def.name.clone(),
            description: def.description.clone(),
            tags: def.tags.clone(),
            origin,
        };
        installed.items.push(world.add_item(item)?);
    }

    Ok(installed)
}

fn location_id(world: &World, key: &str) -> ContentResult<EntityId> {
    world
        .find_location_by_key(key)
        .map(|l| l.id)
        .ok_or_else(|| {
            ContentError::Core(CoreError::UnknownKey {
                kind: EntityKind::Location,
                key: key.to_string(),
            })
        })
}
