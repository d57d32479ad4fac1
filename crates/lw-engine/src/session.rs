//! Game session: owns the state, the live scenes, the trace, and the two
//! external services, and turns player choices into consequences.

use std::mem;
use std::sync::Arc;

use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

use lw_content::consequence::ResourceDelta;
use lw_content::{ActionType, Catalog, Consequence, PathType};
use lw_core::{ChoiceId, EntityId, GameState, Player, ResourceKind, SceneId, WorldMeta};

use crate::config::EngineConfig;
use crate::consequence::{
    AppliedEffect, ApplyTarget, ConsequenceApplier, ConsequenceReceipt, discard_preview,
    release_dependents,
};
use crate::error::{EngineError, EngineResult, SpawnError};
use crate::external::{
    ChallengeOutcome, ChallengeRequest, ChallengeResolver, NarrativeService, SeededChallenges,
    TemplateNarrator, TimeoutNarrator,
};
use crate::instantiate::{SceneInstantiator, SpawnRequest, eligibility_problem};
use crate::lifecycle::SceneState;
use crate::requirement::{PathExplanation, evaluate, explain};
use crate::resolver::ResolutionCache;
use crate::scene::{Choice, Scene, SpawnTrigger};
use crate::snapshot::{SNAPSHOT_VERSION, SessionSnapshot};
use crate::trace::SpawnTrace;

/// Chance the default challenge resolver reports a win.
const DEFAULT_CHALLENGE_ODDS: u32 = 50;

/// A preview scene as shown next to a choice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreviewView {
    /// Preview scene.
    pub scene: SceneId,
    /// Its display name.
    pub display_name: String,
    /// Name of the entity it is placed on.
    pub placement: Option<String>,
}

/// A choice as offered to the player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChoiceView {
    /// Choice instance.
    pub id: ChoiceId,
    /// Button text.
    pub action_text: String,
    /// Presentation tag.
    pub path_type: PathType,
    /// Execution kind.
    pub action_type: ActionType,
    /// Whether executing it would be accepted right now.
    pub selectable: bool,
    /// Whether the player can pay the costs.
    pub affordable: bool,
    /// Requirement paths with per-requirement results.
    pub paths: Vec<PathExplanation>,
    /// Costs shown before selection.
    pub costs: Vec<ResourceDelta>,
    /// Scenes this choice would spawn.
    pub previews: Vec<PreviewView>,
}

/// What executing a choice did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChoiceOutcome {
    /// Effects and flow.
    pub receipt: ConsequenceReceipt,
    /// Challenge result, for challenge choices.
    pub challenge: Option<ChallengeOutcome>,
    /// State of the scene afterwards.
    pub scene_state: SceneState,
    /// Scenes that expired at the end of the turn.
    pub expired: Vec<SceneId>,
}

/// A running game.
pub struct GameSession {
    catalog: Arc<Catalog>,
    config: EngineConfig,
    state: GameState,
    scenes: Vec<Scene>,
    trace: Option<SpawnTrace>,
    cache: ResolutionCache,
    rng: StdRng,
    turn: u64,
    narrator: Arc<dyn NarrativeService>,
    challenges: Box<dyn ChallengeResolver>,
}

impl GameSession {
    /// Create a session with a fresh world built from the catalog.
    pub fn new(catalog: Arc<Catalog>, config: EngineConfig) -> EngineResult<Self> {
        let mut rng = StdRng::seed_from_u64(config.seed);
        let name = catalog
            .package()
            .package_id
            .clone()
            .unwrap_or_else(|| "Loomwright".to_string());
        let world = catalog.new_world(WorldMeta::new(name), &mut rng)?;
        let mut state = GameState::new(Player::new("Traveler"), world);
        place_player(&mut state);

        tracing::info!(
            target: "loomwright::session",
            seed = config.seed,
            trace = config.trace_enabled,
            "session.created"
        );
        Ok(Self {
            trace: config.trace_enabled.then(SpawnTrace::new),
            challenges: Box::new(SeededChallenges::new(config.seed, DEFAULT_CHALLENGE_ODDS)),
            narrator: Arc::new(TemplateNarrator),
            catalog,
            config,
            state,
            scenes: Vec::new(),
            cache: ResolutionCache::new(),
            rng,
            turn: 0,
        })
    }

    /// Builder: replace the player. A player without a location starts at
    /// the first location of the world.
    pub fn with_player(mut self, player: Player) -> Self {
        self.state.player = player;
        place_player(&mut self.state);
        self
    }

    /// Builder: use a narrative service, bounded by the configured timeout.
    pub fn with_narrator(mut self, service: Arc<dyn NarrativeService>) -> Self {
        self.narrator = Arc::new(TimeoutNarrator::new(service, self.config.narrative_timeout));
        self
    }

    /// Builder: use a challenge resolver.
    pub fn with_challenges(mut self, resolver: Box<dyn ChallengeResolver>) -> Self {
        self.challenges = resolver;
        self
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    /// The game state.
    pub fn state(&self) -> &GameState {
        &self.state
    }

    /// The content catalog.
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// The configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Every scene spawned so far, in spawn order. Previews are not listed;
    /// they hang off their choices.
    pub fn scenes(&self) -> &[Scene] {
        &self.scenes
    }

    /// Look up a scene.
    pub fn scene(&self, id: SceneId) -> Option<&Scene> {
        self.scenes.iter().find(|s| s.id == id)
    }

    /// Scenes the player can act in.
    pub fn active_scenes(&self) -> impl Iterator<Item = &Scene> {
        self.scenes.iter().filter(|s| s.is_active())
    }

    /// The spawn trace, when tracing is enabled.
    pub fn trace(&self) -> Option<&SpawnTrace> {
        self.trace.as_ref()
    }

    /// Choices executed so far.
    pub fn turn(&self) -> u64 {
        self.turn
    }

    // -----------------------------------------------------------------------
    // Spawning
    // -----------------------------------------------------------------------

    /// Spawn every eligible starter scene. A starter that fails to spawn is
    /// logged and skipped.
    pub fn start(&mut self) -> Vec<SceneId> {
        let catalog = Arc::clone(&self.catalog);
        let mut started = Vec::new();
        for template in catalog.starter_templates() {
            if let Some(reason) =
                eligibility_problem(&template.spawn_conditions, template.placement_filter.as_ref(), &self.state)
            {
                tracing::debug!(
                    target: "loomwright::session",
                    template = %template.id,
                    reason = %reason,
                    "starter.ineligible"
                );
                continue;
            }
            match self.spawn(SpawnRequest::new(template, SpawnTrigger::Starter)) {
                Ok(id) => started.push(id),
                Err(e) => tracing::warn!(
                    target: "loomwright::session",
                    template = %template.id,
                    error = %e,
                    "starter.failed"
                ),
            }
        }
        tracing::info!(target: "loomwright::session", scenes = started.len(), "session.started");
        started
    }

    /// Spawn a scene on request.
    pub fn spawn_scene(&mut self, template_id: &str) -> EngineResult<SceneId> {
        let catalog = Arc::clone(&self.catalog);
        let template = catalog
            .scene_template(template_id)
            .ok_or_else(|| SpawnError::UnknownTemplate(template_id.to_string()))?;
        Ok(self.spawn(SpawnRequest::new(template, SpawnTrigger::Manual))?)
    }

    fn spawn(&mut self, request: SpawnRequest<'_>) -> Result<SceneId, SpawnError> {
        let Self {
            catalog,
            config,
            state,
            trace,
            cache,
            rng,
            narrator,
            ..
        } = self;
        let mut spawner = SceneInstantiator::new(catalog.as_ref(), config, rng, cache, narrator.as_ref());
        let mut scene = spawner.instantiate(request, state, trace.as_mut())?;
        spawner.prepare_previews(&mut scene, state, trace.as_mut());
        let id = scene.id;
        self.scenes.push(scene);
        Ok(id)
    }

    // -----------------------------------------------------------------------
    // Choices
    // -----------------------------------------------------------------------

    fn scene_index(&self, id: SceneId) -> EngineResult<usize> {
        self.scenes
            .iter()
            .position(|s| s.id == id)
            .ok_or(EngineError::SceneNotFound(id))
    }

    /// The choices of a scene's current situation, with requirement results,
    /// costs, and preview placements.
    pub fn choices(&self, scene_id: SceneId) -> EngineResult<Vec<ChoiceView>> {
        let scene = &self.scenes[self.scene_index(scene_id)?];
        let situation = scene.current().filter(|_| scene.is_active()).ok_or(
            EngineError::SceneNotActive {
                scene: scene_id,
                state: scene.state,
            },
        )?;
        Ok(situation
            .choices
            .iter()
            .map(|choice| {
                let met = evaluate(&choice.requirement, &self.state);
                let affordable = choice_affordability(choice, &self.state).is_none();
                ChoiceView {
                    id: choice.id,
                    action_text: choice.action_text.clone(),
                    path_type: choice.path_type,
                    action_type: choice.action_type,
                    selectable: met && (affordable || !self.config.require_affordability),
                    affordable,
                    paths: explain(&choice.requirement, &self.state),
                    costs: choice.consequence.costs(),
                    previews: choice
                        .previews
                        .iter()
                        .map(|p| PreviewView {
                            scene: p.id,
                            display_name: p.display_name.clone(),
                            placement: p
                                .placement
                                .and_then(|e| self.state.world.display_name(e))
                                .map(str::to_string),
                        })
                        .collect(),
                }
            })
            .collect())
    }

    /// Execute a choice in a scene's current situation.
    ///
    /// Every check runs before anything changes: on error the session is
    /// exactly as it was.
    pub fn execute_choice(&mut self, scene_id: SceneId, choice_id: ChoiceId) -> EngineResult<ChoiceOutcome> {
        let index = self.scene_index(scene_id)?;
        let scene = &self.scenes[index];
        let not_active = EngineError::SceneNotActive {
            scene: scene_id,
            state: scene.state,
        };
        if !scene.is_active() {
            return Err(not_active);
        }
        let situation = scene.current().ok_or(not_active)?;
        let choice = situation
            .choice(choice_id)
            .ok_or(EngineError::ChoiceNotAvailable {
                scene: scene_id,
                choice: choice_id,
            })?;
        if !evaluate(&choice.requirement, &self.state) {
            return Err(EngineError::RequirementsNotMet(choice_id));
        }
        let situation_id = situation.id;
        if self.config.require_affordability
            && let Some(err) = choice_affordability(choice, &self.state)
        {
            return Err(err);
        }

        let Self {
            catalog,
            config,
            state,
            scenes,
            trace,
            cache,
            rng,
            narrator,
            challenges,
            ..
        } = self;
        let scene = &mut scenes[index];

        // ----- Previews -----
        let mut taken = Vec::new();
        let mut untaken = Vec::new();
        let Some(situation) = scene.current_mut() else {
            return Err(EngineError::ChoiceNotAvailable {
                scene: scene_id,
                choice: choice_id,
            });
        };
        for c in &mut situation.choices {
            if c.id == choice_id {
                taken = mem::take(&mut c.previews);
            } else {
                untaken.extend(mem::take(&mut c.previews));
            }
        }
        let (npc, location, route) = (situation.npc, situation.location, situation.route);
        let Some(choice) = situation.choice(choice_id).cloned() else {
            return Err(EngineError::ChoiceNotAvailable {
                scene: scene_id,
                choice: choice_id,
            });
        };

        let trace_choice = trace.as_mut().and_then(|t| {
            let node = t.situation_node(situation_id)?;
            Some(t.record_choice_execution(node, &choice, &state.player, state.clock))
        });
        for preview in &untaken {
            discard_preview(preview, state, trace.as_mut());
        }

        // ----- Challenge -----
        let (consequence, challenge) = match choice.action_type {
            ActionType::StartChallenge => {
                let outcome = match &choice.challenge {
                    Some(spec) => {
                        let request = ChallengeRequest {
                            scene: scene_id,
                            choice: choice_id,
                            spec: spec.clone(),
                        };
                        challenges.run_challenge(&request).unwrap_or_else(|e| {
                            tracing::warn!(
                                target: "loomwright::session",
                                choice = %choice_id,
                                error = %e,
                                "challenge.failed_to_run"
                            );
                            ChallengeOutcome {
                                succeeded: false,
                                summary: e.to_string(),
                            }
                        })
                    }
                    None => {
                        tracing::error!(target: "loomwright::session", choice = %choice_id, "challenge.missing_spec");
                        ChallengeOutcome {
                            succeeded: false,
                            summary: "no challenge defined".to_string(),
                        }
                    }
                };
                let branch = if outcome.succeeded {
                    choice.on_success.as_ref()
                } else {
                    choice.on_failure.as_ref()
                };
                let consequence = match branch {
                    Some(extra) => choice.consequence.combine(extra),
                    None => choice.consequence.clone(),
                };
                (consequence, Some(outcome))
            }
            ActionType::Instant | ActionType::Navigate => (choice.consequence.clone(), None),
        };

        if let Some(npc) = npc.and_then(|id| state.world.npc_mut(id)) {
            npc.interactions += 1;
        }

        // ----- Consequence -----
        let mut spawner = SceneInstantiator::new(catalog.as_ref(), config, rng, cache, narrator.as_ref());
        let (mut receipt, mut spawned) = ConsequenceApplier::new(&mut spawner).apply(
            &consequence,
            ApplyTarget {
                scene: &mut *scene,
                situation: situation_id,
                previews: taken,
                trace_choice,
            },
            state,
            trace.as_mut(),
        );

        if choice.action_type == ActionType::Navigate {
            let destination = location.or_else(|| route.and_then(|r| state.world.route(r)).and_then(|r| r.to));
            if let Some(place) = destination.and_then(|id| state.world.location_mut(id)) {
                place.visits += 1;
                state.player.location = Some(place.id);
                state.player.position = place.position;
                receipt.effects.push(AppliedEffect::Moved { location: place.id });
            }
        }

        if let (Some(t), Some(node)) = (trace.as_mut(), trace_choice) {
            t.complete_choice(node, &state.player, &receipt.effects, challenge.clone());
        }

        spawner.prepare_previews(scene, state, trace.as_mut());
        for child in &mut spawned {
            spawner.prepare_previews(child, state, trace.as_mut());
        }
        let scene_state = scene.state;
        scenes.append(&mut spawned);

        self.turn += 1;
        let expired = self.expire_scenes();
        tracing::info!(
            target: "loomwright::session",
            turn = self.turn,
            scene = %scene_id,
            choice = %choice.template_id,
            effects = receipt.effects.len(),
            state = %scene_state,
            "choice.executed"
        );
        Ok(ChoiceOutcome {
            receipt,
            challenge,
            scene_state,
            expired,
        })
    }

    // -----------------------------------------------------------------------
    // Time
    // -----------------------------------------------------------------------

    /// Move the clock forward and expire overdue scenes.
    pub fn advance_time(&mut self, segments: u32) -> Vec<SceneId> {
        self.state.clock.advance_segments(segments);
        tracing::debug!(target: "loomwright::session", clock = %self.state.clock, "time.advanced");
        self.expire_scenes()
    }

    /// Expire every active scene whose last day has passed, releasing its
    /// dependent resources and discarding its previews.
    pub fn expire_scenes(&mut self) -> Vec<SceneId> {
        let day = self.state.clock.day;
        let mut expired = Vec::new();
        for scene in &mut self.scenes {
            if !scene.is_active() || !scene.expires_on_day.is_some_and(|last| day > last) {
                continue;
            }
            for choice in scene.situations.iter_mut().flat_map(|s| s.choices.iter_mut()) {
                for preview in mem::take(&mut choice.previews) {
                    discard_preview(&preview, &mut self.state, self.trace.as_mut());
                }
            }
            if let Err(e) = scene.transition(SceneState::Expired) {
                tracing::error!(target: "loomwright::session", error = %e, "scene.expire_failed");
                continue;
            }
            release_dependents(scene.id, &mut self.state);
            if let Some(trace) = self.trace.as_mut() {
                trace.update_scene_state(scene.id, SceneState::Expired);
            }
            expired.push(scene.id);
        }
        expired
    }

    // -----------------------------------------------------------------------
    // Persistence
    // -----------------------------------------------------------------------

    /// Capture everything needed to resume this session.
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            version: SNAPSHOT_VERSION,
            seed: self.config.seed,
            turn: self.turn,
            state: self.state.clone(),
            scenes: self.scenes.clone(),
            trace: self.trace.clone(),
        }
    }

    /// Resume a session. The RNG is reseeded from the seed and turn, and the
    /// resolution cache starts empty.
    pub fn restore(catalog: Arc<Catalog>, snapshot: SessionSnapshot, config: EngineConfig) -> EngineResult<Self> {
        if snapshot.version != SNAPSHOT_VERSION {
            return Err(EngineError::SnapshotVersion {
                found: snapshot.version,
                expected: SNAPSHOT_VERSION,
            });
        }
        let config = EngineConfig {
            seed: snapshot.seed,
            trace_enabled: snapshot.trace.is_some(),
            ..config
        };
        let reseed = snapshot.seed.wrapping_add(snapshot.turn);
        tracing::info!(
            target: "loomwright::session",
            turn = snapshot.turn,
            scenes = snapshot.scenes.len(),
            "session.restored"
        );
        Ok(Self {
            catalog,
            challenges: Box::new(SeededChallenges::new(reseed, DEFAULT_CHALLENGE_ODDS)),
            narrator: Arc::new(TemplateNarrator),
            rng: StdRng::seed_from_u64(reseed),
            cache: ResolutionCache::new(),
            turn: snapshot.turn,
            state: snapshot.state,
            scenes: snapshot.scenes,
            trace: snapshot.trace,
            config,
        })
    }
}

/// The first cost the player cannot pay on any outcome of the choice. A
/// challenge's base cost is checked folded into each branch.
fn choice_affordability(choice: &Choice, state: &GameState) -> Option<EngineError> {
    affordability_problem(&choice.consequence, state).or_else(|| {
        [&choice.on_success, &choice.on_failure]
            .into_iter()
            .flatten()
            .find_map(|branch| affordability_problem(&choice.consequence.combine(branch), state))
    })
}

/// The first cost the player cannot pay, as an error. Coins, stamina, and
/// focus are checked; health clamps and resolve has its own gate.
fn affordability_problem(consequence: &Consequence, state: &GameState) -> Option<EngineError> {
    consequence
        .costs()
        .into_iter()
        .filter(|cost| match cost.resource {
            ResourceKind::Coins => true,
            ResourceKind::Stamina | ResourceKind::Focus => !consequence.full_recovery,
            ResourceKind::Health | ResourceKind::Resolve | ResourceKind::Hunger => false,
        })
        .find_map(|cost| {
            let available = state.player.resources.get(cost.resource);
            let required = -cost.amount;
            (available < required).then_some(EngineError::Unaffordable {
                resource: cost.resource,
                available,
                required,
            })
        })
}

fn place_player(state: &mut GameState) {
    if state.player.location.is_some() {
        return;
    }
    let first: Option<EntityId> = state.world.locations().first().map(|l| l.id);
    state.player.location = first;
    state.player.position = first
        .and_then(|id| state.world.location(id))
        .and_then(|l| l.position);
}
