//! Core types for Loomwright: entities, the world graph, player state, and the game clock.
//!
//! Everything the narrative engine reads or mutates at runtime lives here.
//! Content templates and the engine itself sit in higher crates; this crate
//! knows nothing about scenes beyond their identifiers.

/// Closed categorical vocabularies (professions, location purposes, scales, ...).
pub mod category;
/// Game clock: days, time blocks, and segments.
pub mod clock;
/// NPC, Location, Route, and Item entities.
pub mod entity;
/// Error types used throughout the crate.
pub mod error;
/// Identifier newtypes.
pub mod id;
/// Player resources, stats, scales, states, and inventory.
pub mod player;
/// The aggregate game state threaded through the engine.
pub mod state;
/// The world graph that owns every entity.
pub mod world;

/// Re-export categorical enums.
pub use category::{ScaleType, StatType, StateType, TimeBlock};
/// Re-export the clock.
pub use clock::GameClock;
/// Re-export entity types.
pub use entity::{EntityKind, EntityOrigin, EntityRef, HexCoord, Item, Location, Npc, PlacementKind, Route};
/// Re-export error types.
pub use error::{CoreError, CoreResult};
/// Re-export identifiers.
pub use id::{ChoiceId, EntityId, SceneId, SituationId};
/// Re-export player state.
pub use player::{Player, ResourceKind};
/// Re-export the game state aggregate.
pub use state::GameState;
/// Re-export world model types.
pub use world::{World, WorldMeta};
