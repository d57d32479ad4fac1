//! Seams to services outside the engine: narrative generation and tactical
//! challenges.
//!
//! Both are optional. Narrative failures fall back to the authored text and
//! challenge resolvers are swappable so tests can script outcomes.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use lw_content::template::ChallengeSpec;
use lw_core::{ChoiceId, SceneId, TimeBlock};

// ---------------------------------------------------------------------------
// Narrative
// ---------------------------------------------------------------------------

/// Why a narrative request produced nothing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NarrativeError {
    /// The service could not produce text.
    #[error("narrative service unavailable: {0}")]
    Unavailable(String),

    /// The service did not answer in time.
    #[error("narrative service timed out after {0:?}")]
    TimedOut(Duration),
}

/// Everything a narrative service is told about a situation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NarrativeContext {
    /// Scene template id.
    pub scene_template: String,
    /// Situation template id.
    pub situation_template: String,
    /// Authored text with placeholders already substituted.
    pub base_text: String,
    /// Bound NPC name.
    pub npc_name: Option<String>,
    /// Bound location name.
    pub location_name: Option<String>,
    /// Bound route name.
    pub route_name: Option<String>,
    /// Current day.
    pub day: u32,
    /// Current time block.
    pub block: TimeBlock,
}

/// Produces situation text.
pub trait NarrativeService: Send + Sync {
    /// Generate text for a situation.
    fn generate(&self, context: &NarrativeContext) -> Result<String, NarrativeError>;
}

/// Returns the authored text unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct TemplateNarrator;

impl NarrativeService for TemplateNarrator {
    fn generate(&self, context: &NarrativeContext) -> Result<String, NarrativeError> {
        Ok(context.base_text.clone())
    }
}

/// Bounds another service with a timeout. The inner call runs on its own
/// thread; a late answer is dropped.
pub struct TimeoutNarrator {
    inner: Arc<dyn NarrativeService>,
    timeout: Duration,
}

impl TimeoutNarrator {
    /// Wrap a service.
    pub fn new(inner: Arc<dyn NarrativeService>, timeout: Duration) -> Self {
        Self { inner, timeout }
    }
}

impl NarrativeService for TimeoutNarrator {
    fn generate(&self, context: &NarrativeContext) -> Result<String, NarrativeError> {
        let (tx, rx) = mpsc::channel();
        let inner = Arc::clone(&self.inner);
        let context = context.clone();
        thread::spawn(move || {
            let _ = tx.send(inner.generate(&context));
        });
        match rx.recv_timeout(self.timeout) {
            Ok(result) => result,
            Err(mpsc::RecvTimeoutError::Timeout) => Err(NarrativeError::TimedOut(self.timeout)),
            Err(mpsc::RecvTimeoutError::Disconnected) => Err(NarrativeError::Unavailable(
                "narrative worker exited without answering".to_string(),
            )),
        }
    }
}

/// Ask a service for text, falling back to the authored text on failure or
/// an empty answer.
pub fn narrate(service: &dyn NarrativeService, context: &NarrativeContext) -> String {
    match service.generate(context) {
        Ok(text) if !text.trim().is_empty() => text,
        Ok(_) => {
            tracing::warn!(
                target: "loomwright::instantiate",
                situation = %context.situation_template,
                "narrative.empty"
            );
            context.base_text.clone()
        }
        Err(e) => {
            tracing::warn!(
                target: "loomwright::instantiate",
                situation = %context.situation_template,
                error = %e,
                "narrative.fallback"
            );
            context.base_text.clone()
        }
    }
}

// ---------------------------------------------------------------------------
// Challenges
// ---------------------------------------------------------------------------

/// A request to run a tactical challenge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChallengeRequest {
    /// Scene the choice belongs to.
    pub scene: SceneId,
    /// The choice being executed.
    pub choice: ChoiceId,
    /// Challenge parameters.
    pub spec: ChallengeSpec,
}

impl ChallengeRequest {
    /// Deck name for display.
    pub fn deck(&self) -> &str {
        self.spec.deck_id.as_deref().unwrap_or("default")
    }
}

/// How a challenge ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChallengeOutcome {
    /// Whether the player won.
    pub succeeded: bool,
    /// Short summary for the trace.
    pub summary: String,
}

/// A challenge could not be run.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("challenge failed to run: {0}")]
pub struct ChallengeError(pub String);

/// Runs tactical challenges.
pub trait ChallengeResolver: Send {
    /// Run a challenge to completion.
    fn run_challenge(&mut self, request: &ChallengeRequest) -> Result<ChallengeOutcome, ChallengeError>;
}

/// Replays a fixed list of outcomes. Runs out with an error.
#[derive(Debug, Clone, Default)]
pub struct ScriptedChallenges {
    outcomes: VecDeque<bool>,
}

impl ScriptedChallenges {
    /// Queue outcomes in order.
    pub fn new(outcomes: impl IntoIterator<Item = bool>) -> Self {
        Self {
            outcomes: outcomes.into_iter().collect(),
        }
    }
}

impl ChallengeResolver for ScriptedChallenges {
    fn run_challenge(&mut self, request: &ChallengeRequest) -> Result<ChallengeOutcome, ChallengeError> {
        let succeeded = self
            .outcomes
            .pop_front()
            .ok_or_else(|| ChallengeError(format!("no scripted outcome for {}", request.deck())))?;
        Ok(ChallengeOutcome {
            succeeded,
            summary: format!(
                "{:?} challenge '{}' {}",
                request.spec.kind,
                request.deck(),
                if succeeded { "won" } else { "lost" }
            ),
        })
    }
}

/// Rolls outcomes from a seeded RNG.
#[derive(Debug, Clone)]
pub struct SeededChallenges {
    rng: StdRng,
    success_percent: u32,
}

impl SeededChallenges {
    /// A resolver that succeeds `success_percent` percent of the time.
    pub fn new(seed: u64, success_percent: u32) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            success_percent: success_percent.min(100),
        }
    }
}

impl ChallengeResolver for SeededChallenges {
    fn run_challenge(&mut self, request: &ChallengeRequest) -> Result<ChallengeOutcome, ChallengeError> {
        let roll: u32 = self.rng.random_range(0..100);
        let succeeded = roll < self.success_percent;
        Ok(ChallengeOutcome {
            succeeded,
            summary: format!(
                "{:?} challenge '{}' rolled {roll} against {}",
                request.spec.kind,
                request.deck(),
                self.success_percent
            ),
        })
    }
}
