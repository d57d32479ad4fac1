//! Configuration for a game session.

use std::time::Duration;

/// Configuration for a game session.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// RNG seed for reproducible resolution, naming, and ids.
    pub seed: u64,
    /// Record the spawn trace.
    pub trace_enabled: bool,
    /// How long to wait for the narrative service per situation.
    pub narrative_timeout: Duration,
    /// Maximum depth of scenes spawned by scenes.
    pub max_spawn_depth: u32,
    /// Reject choices whose costs exceed the player's resources.
    pub require_affordability: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            trace_enabled: true,
            narrative_timeout: Duration::from_secs(5),
            max_spawn_depth: 8,
            require_affordability: true,
        }
    }
}

impl EngineConfig {
    /// Set the RNG seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Enable or disable the spawn trace.
    pub fn with_trace(mut self, enabled: bool) -> Self {
        self.trace_enabled = enabled;
        self
    }

    /// Set the narrative service timeout.
    pub fn with_narrative_timeout(mut self, timeout: Duration) -> Self {
        self.narrative_timeout = timeout;
        self
    }

    /// Set the maximum cascade depth (at least 1).
    pub fn with_max_spawn_depth(mut self, depth: u32) -> Self {
        self.max_spawn_depth = depth.max(1);
        self
    }

    /// Enable or disable the affordability precheck.
    pub fn with_affordability_check(mut self, enabled: bool) -> Self {
        self.require_affordability = enabled;
        self
    }
}
