//! The immutable content catalog.

use std::collections::HashMap;
use std::path::Path;

use rand::Rng;

use lw_core::entity::EntityOrigin;
use lw_core::{World, WorldMeta};

use crate::error::{ContentError, ContentResult};
use crate::loader;
use crate::package::{AchievementDef, ContentPackage, EntityDefaults};
use crate::template::SceneTemplate;
use crate::validate::{self, ValidationIssue};

/// Validated content, loaded once and never mutated.
#[derive(Debug, Clone)]
pub struct Catalog {
    package: ContentPackage,
    by_id: HashMap<String, usize>,
}

impl Catalog {
    /// Validate a merged package and build a catalog from it. Warnings are
    /// returned alongside the catalog; any error rejects the whole package.
    pub fn from_package(package: ContentPackage) -> ContentResult<(Self, Vec<ValidationIssue>)> {
        let issues = validate::validate_package(&package);
        if validate::has_errors(&issues) {
            return Err(ContentError::Invalid(issues));
        }
        let by_id = package
            .scene_templates
            .iter()
            .enumerate()
            .map(|(i, t)| (t.id.clone(), i))
            .collect();
        tracing::info!(
            target: "loomwright::content",
            templates = package.scene_templates.len(),
            warnings = issues.len(),
            "catalog.loaded"
        );
        Ok((Self { package, by_id }, issues))
    }

    /// Parse, validate, and build a catalog from one JSON document.
    pub fn from_json(json: &str) -> ContentResult<(Self, Vec<ValidationIssue>)> {
        Self::from_package(loader::parse_package(json, "<inline>")?)
    }

    /// Load a file or directory of packages.
    pub fn load(path: &Path) -> ContentResult<(Self, Vec<ValidationIssue>)> {
        Self::from_package(loader::load_path(path)?)
    }

    /// Look up a scene template by id.
    pub fn scene_template(&self, id: &str) -> Option<&SceneTemplate> {
        self.by_id.get(id).map(|&i| &self.package.scene_templates[i])
    }

    /// All scene templates in load order.
    pub fn scene_templates(&self) -> &[SceneTemplate] {
        &self.package.scene_templates
    }

    /// Templates spawned when a session starts.
    pub fn starter_templates(&self) -> impl Iterator<Item = &SceneTemplate> {
        self.package.scene_templates.iter().filter(|t| t.is_starter)
    }

    /// Synthesis defaults.
    pub fn defaults(&self) -> &EntityDefaults {
        &self.package.defaults
    }

    /// Achievement definitions.
    pub fn achievements(&self) -> &[AchievementDef] {
        &self.package.achievements
    }

    /// Look up an achievement definition.
    pub fn achievement(&self, id: &str) -> Option<&AchievementDef> {
        self.package.achievements.iter().find(|a| a.id == id)
    }

    /// The merged package the catalog was built from.
    pub fn package(&self) -> &ContentPackage {
        &self.package
    }

    /// A fresh world holding the authored entities.
    pub fn new_world<R: Rng + ?Sized>(&self, meta: WorldMeta, rng: &mut R) -> ContentResult<World> {
        let mut world = World::new(meta);
        loader::install_entities(&self.package, &mut world, EntityOrigin::Authored, rng)?;
        Ok(world)
    }
}
