use lw_content::ContentError;
use lw_core::{ChoiceId, CoreError, EntityId, PlacementKind, ResourceKind, SceneId};

use crate::lifecycle::SceneState;

/// Alias for `Result<T, EngineError>`.
pub type EngineResult<T> = Result<T, EngineError>;

/// Errors raised while resolving a placement filter.
#[derive(Debug, thiserror::Error)]
pub enum ResolutionError {
    /// Nothing matched and the content defines no defaults to create from.
    #[error("no {0} matched and no {0} defaults are defined")]
    NoDefaults(PlacementKind),

    /// `RouteDestination` was requested before any route was resolved.
    #[error("RouteDestination requested but no route was resolved earlier in the scene")]
    NoRouteContext,

    /// The route has no destination to bind to.
    #[error("route {0} has no destination")]
    RouteWithoutDestination(EntityId),

    /// `SameLocation` was requested without a context location.
    #[error("SameLocation requested but there is no current location")]
    NoLocationContext,

    /// A filter names a dependent location the scene did not create.
    #[error("unknown dependent location '{0}'")]
    UnknownDependentLocation(String),

    /// The world rejected a created entity.
    #[error(transparent)]
    Core(#[from] CoreError),
}

/// Errors raised while instantiating a scene.
#[derive(Debug, thiserror::Error)]
pub enum SpawnError {
    /// No template with this id.
    #[error("unknown scene template '{0}'")]
    UnknownTemplate(String),

    /// The template's spawn conditions or player gates do not hold.
    #[error("scene '{template}' is not eligible: {reason}")]
    Ineligible {
        /// Template id.
        template: String,
        /// Which condition failed.
        reason: String,
    },

    /// The cascade is deeper than the configured maximum.
    #[error("scene '{template}' would spawn at depth {depth}, beyond the configured maximum")]
    DepthExceeded {
        /// Template id.
        template: String,
        /// Requested depth.
        depth: u32,
    },

    /// A supplied placement no longer exists in the world.
    #[error("scene '{template}' was given a placement that is not in the world")]
    MissingPlacement {
        /// Template id.
        template: String,
    },

    /// A placement filter could not be resolved.
    #[error("cannot resolve placement for '{template}': {source}")]
    Resolution {
        /// Template id.
        template: String,
        /// Underlying failure.
        source: ResolutionError,
    },

    /// The scene's dependent resources did not pass the content pipeline.
    #[error("dependent resources of '{template}' are invalid: {source}")]
    DependentContent {
        /// Template id.
        template: String,
        /// Underlying failure.
        source: ContentError,
    },
}

/// Errors raised by scene lifecycle transitions.
#[derive(Debug, thiserror::Error)]
pub enum LifecycleError {
    /// The transition is not allowed from the current state.
    #[error("scene {scene} cannot move from {from} to {to}")]
    InvalidTransition {
        /// Scene instance.
        scene: SceneId,
        /// Current state.
        from: SceneState,
        /// Requested state.
        to: SceneState,
    },
}

/// Errors surfaced by a game session.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// No live scene with this id.
    #[error("scene not found: {0}")]
    SceneNotFound(SceneId),

    /// The scene has no selectable choices in its current state.
    #[error("scene {scene} is {state}, not active")]
    SceneNotActive {
        /// Scene instance.
        scene: SceneId,
        /// Its state.
        state: SceneState,
    },

    /// The choice is not part of the scene's current situation.
    #[error("choice {choice} is not available in scene {scene}")]
    ChoiceNotAvailable {
        /// Scene instance.
        scene: SceneId,
        /// Requested choice.
        choice: ChoiceId,
    },

    /// None of the choice's requirement paths hold.
    #[error("requirements of choice {0} are not met")]
    RequirementsNotMet(ChoiceId),

    /// The player cannot pay the choice's costs.
    #[error("cannot afford {required} {resource} (have {available})")]
    Unaffordable {
        /// Resource.
        resource: ResourceKind,
        /// Current amount.
        available: i32,
        /// Amount the choice costs.
        required: i32,
    },

    /// Scene instantiation failed.
    #[error(transparent)]
    Spawn(#[from] SpawnError),

    /// A lifecycle transition failed.
    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),

    /// Content could not be loaded.
    #[error(transparent)]
    Content(#[from] ContentError),

    /// A session snapshot could not be encoded or decoded.
    #[error("snapshot: {0}")]
    Snapshot(#[from] serde_json::Error),

    /// The snapshot was written by an incompatible version.
    #[error("snapshot version {found} is not supported (expected {expected})")]
    SnapshotVersion {
        /// Version in the snapshot.
        found: u32,
        /// Version this build reads.
        expected: u32,
    },
}
