//! Session snapshots: everything needed to resume a session, as JSON.

use serde::{Deserialize, Serialize};

use lw_core::GameState;

use crate::error::EngineResult;
use crate::scene::Scene;
use crate::trace::SpawnTrace;

/// Format version written into every snapshot.
pub const SNAPSHOT_VERSION: u32 = 1;

/// A saved session. Previews stay embedded in their choices.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    /// Format version.
    pub version: u32,
    /// Seed the session was created with.
    pub seed: u64,
    /// Choices executed so far.
    pub turn: u64,
    /// Player, world, and clock.
    pub state: GameState,
    /// Every scene spawned so far.
    pub scenes: Vec<Scene>,
    /// Spawn trace, when tracing was enabled.
    pub trace: Option<SpawnTrace>,
}

impl SessionSnapshot {
    /// Encode as pretty JSON.
    pub fn to_json(&self) -> EngineResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Decode from JSON.
    pub fn from_json(json: &str) -> EngineResult<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EngineError;

    #[test]
    fn garbage_is_a_snapshot_error() {
        let err = SessionSnapshot::from_json("{ not json").unwrap_err();
        assert!(matches!(err, EngineError::Snapshot(_)));
    }
}
