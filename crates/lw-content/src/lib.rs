//! Content for Loomwright: scene/situation/choice templates, placement
//! filters, requirements, consequences, and the immutable catalog.
//!
//! Content arrives as JSON packages with PascalCase field names. Loading
//! parses, merges, and validates the packages before anything reaches the
//! engine; see [`Catalog::load`].

/// The immutable catalog.
pub mod catalog;
/// Consequence records.
pub mod consequence;
/// Error types.
pub mod error;
/// Placement filters.
pub mod filter;
/// JSON parsing and entity installation.
pub mod loader;
/// Content package documents.
pub mod package;
/// Compound requirements.
pub mod requirement;
/// Scene, situation, and choice templates.
pub mod template;
/// Load-time validation.
pub mod validate;

pub use catalog::Catalog;
pub use consequence::{Consequence, FlowControl, SceneSpawn, SpawnPlacement};
pub use error::{ContentError, ContentResult};
pub use filter::{EntityProperty, PlacementFilter, Proximity, SelectionStrategy};
pub use package::ContentPackage;
pub use requirement::{CompoundRequirement, NumericRequirement, OrPath};
pub use template::{ActionType, ChoiceTemplate, PathType, SceneTemplate, SituationTemplate};
pub use validate::ValidationIssue;
