//! Loomwright engine: resolves placement filters to world entities,
//! instantiates scenes from templates, applies consequences, drives the scene
//! lifecycle, and records a spawn trace.
//!
//! [`GameSession`] ties the pieces together. The lower-level modules can be
//! used on their own against a [`lw_core::GameState`].

/// Session configuration.
pub mod config;
/// Consequence application.
pub mod consequence;
/// Error types.
pub mod error;
/// Narrative and challenge service seams.
pub mod external;
/// Scene instantiation.
pub mod instantiate;
/// Scene lifecycle.
pub mod lifecycle;
/// Placeholder substitution.
pub mod placeholder;
/// Requirement evaluation.
pub mod requirement;
/// Entity resolution.
pub mod resolver;
/// Live scenes, situations, and choices.
pub mod scene;
/// Session orchestration.
pub mod session;
/// Session snapshots.
pub mod snapshot;
/// Spawn trace.
pub mod trace;

#[cfg(test)]
mod test_support;

pub use config::EngineConfig;
pub use consequence::{AppliedEffect, ConsequenceApplier, ConsequenceReceipt, FlowOutcome};
pub use error::{EngineError, EngineResult, LifecycleError, ResolutionError, SpawnError};
pub use external::{
    ChallengeOutcome, ChallengeRequest, ChallengeResolver, NarrativeContext, NarrativeService,
    ScriptedChallenges, SeededChallenges, TemplateNarrator,
};
pub use instantiate::{SceneInstantiator, SpawnRequest};
pub use lifecycle::SceneState;
pub use resolver::{EntityResolver, Resolution, ResolutionCache, ResolutionMetadata};
pub use scene::{Choice, Scene, Situation, SpawnTrigger};
pub use session::{ChoiceOutcome, ChoiceView, GameSession};
pub use snapshot::SessionSnapshot;
pub use trace::SpawnTrace;
