use crate::entity::EntityKind;
use crate::id::EntityId;

/// Alias for `Result<T, CoreError>`.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur when manipulating the world graph or player state.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// The requested entity ID does not exist in the world.
    #[error("entity not found: {0}")]
    EntityNotFound(EntityId),

    /// An entity of the same kind already uses this key.
    #[error("{kind} key already exists: \"{key}\"")]
    DuplicateKey {
        /// The entity kind that owns the key space.
        kind: EntityKind,
        /// The conflicting key.
        key: String,
    },

    /// A key reference could not be resolved to an existing entity.
    #[error("unknown {kind} key: \"{key}\"")]
    UnknownKey {
        /// The expected entity kind.
        kind: EntityKind,
        /// The unresolved key.
        key: String,
    },
}
