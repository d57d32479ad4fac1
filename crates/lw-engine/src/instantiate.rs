//! Scene instantiation: turning a template into a live scene with resolved
//! placements, dependent resources, situations, and choices.
//!
//! Instantiation is atomic. All work happens on a staged copy of the game
//! state which replaces the live state only when every step succeeded.

use std::collections::HashMap;

use rand::rngs::StdRng;

use lw_content::loader::{install_entities, package_from_value};
use lw_content::template::SpawnConditions;
use lw_content::validate::{has_errors, validate_entities};
use lw_content::{
    Catalog, ChoiceTemplate, CompoundRequirement, Consequence, ContentError, ContentPackage,
    NumericRequirement, PlacementFilter, SceneSpawn, SceneTemplate, SpawnPlacement,
};
use lw_core::{
    ChoiceId, EntityId, EntityOrigin, EntityRef, GameState, SceneId, SituationId, World,
};

use crate::config::EngineConfig;
use crate::error::{ResolutionError, SpawnError};
use crate::external::{NarrativeContext, NarrativeService, narrate};
use crate::lifecycle::SceneState;
use crate::placeholder::PlaceholderContext;
use crate::requirement::evaluate;
use crate::resolver::{
    EntityResolver, Resolution, ResolutionCache, ResolutionContext, ResolutionMetadata,
    player_gates_pass,
};
use crate::scene::{Choice, DependentResources, Scene, Situation, SpawnTrigger};
use crate::trace::{SlotResolution, SpawnTrace, TraceParent};

/// A request to spawn one scene.
#[derive(Debug, Clone)]
pub struct SpawnRequest<'t> {
    /// Template to instantiate.
    pub template: &'t SceneTemplate,
    /// Placement known in advance; skips resolving the template's filter.
    pub placement: Option<EntityRef>,
    /// Spawn cause.
    pub trigger: SpawnTrigger,
    /// Cascade depth.
    pub depth: u32,
    /// Location used for `SameLocation` filters; defaults to the player's.
    pub context_location: Option<EntityId>,
    /// Trace parent.
    pub parent: TraceParent,
    /// Choice that caused the spawn.
    pub parent_choice: Option<ChoiceId>,
}

impl<'t> SpawnRequest<'t> {
    /// A root-level request.
    pub fn new(template: &'t SceneTemplate, trigger: SpawnTrigger) -> Self {
        Self {
            template,
            placement: None,
            trigger,
            depth: 0,
            context_location: None,
            parent: TraceParent::Root,
            parent_choice: None,
        }
    }

    /// Builder: supply the placement.
    pub fn with_placement(mut self, placement: Option<EntityRef>) -> Self {
        self.placement = placement;
        self
    }

    /// Builder: set the cascade depth.
    pub fn with_depth(mut self, depth: u32) -> Self {
        self.depth = depth;
        self
    }

    /// Builder: set the context location.
    pub fn with_context_location(mut self, location: Option<EntityId>) -> Self {
        self.context_location = location;
        self
    }

    /// Builder: set the trace parent and originating choice.
    pub fn with_parent(mut self, parent: TraceParent, choice: Option<ChoiceId>) -> Self {
        self.parent = parent;
        self.parent_choice = choice;
        self
    }
}

/// The placement a spawn instruction asks for, relative to the situation it
/// fires from. `None` means the template's own filter decides.
pub fn spawn_placement(spawn: &SceneSpawn, situation: &Situation) -> Option<EntityRef> {
    match spawn.placement {
        SpawnPlacement::Filter => None,
        SpawnPlacement::SameNpc => situation.npc.map(EntityRef::Npc),
        SpawnPlacement::SameLocation => situation.location.map(EntityRef::Location),
        SpawnPlacement::SameRoute => situation.route.map(EntityRef::Route),
    }
}

/// Why a template may not spawn right now, if anything.
pub fn eligibility_problem(
    conditions: &SpawnConditions,
    filter: Option<&PlacementFilter>,
    state: &GameState,
) -> Option<String> {
    let day = state.clock.day;
    if let Some(min) = conditions.min_day
        && day < min
    {
        return Some(format!("day {day} is before day {min}"));
    }
    if let Some(max) = conditions.max_day
        && day > max
    {
        return Some(format!("day {day} is after day {max}"));
    }
    if !conditions.time_blocks.is_empty() && !conditions.time_blocks.contains(&state.clock.block) {
        return Some(format!("not available during {}", state.clock.block));
    }
    if !evaluate(&conditions.requirement, state) {
        return Some("spawn requirement not met".to_string());
    }
    if let Some(filter) = filter
        && !player_gates_pass(filter, &state.player)
    {
        return Some("player state gates not met".to_string());
    }
    None
}

/// Builds live scenes from templates.
pub struct SceneInstantiator<'a> {
    catalog: &'a Catalog,
    config: &'a EngineConfig,
    rng: &'a mut StdRng,
    cache: &'a mut ResolutionCache,
    narrator: &'a dyn NarrativeService,
}

struct SituationBuild {
    situation: Situation,
    resolutions: Vec<SlotResolution>,
}

impl<'a> SceneInstantiator<'a> {
    /// Create an instantiator over the session's catalog, RNG, and cache.
    pub fn new(
        catalog: &'a Catalog,
        config: &'a EngineConfig,
        rng: &'a mut StdRng,
        cache: &'a mut ResolutionCache,
        narrator: &'a dyn NarrativeService,
    ) -> Self {
        Self {
            catalog,
            config,
            rng,
            cache,
            narrator,
        }
    }

    /// The catalog templates come from.
    pub fn catalog(&self) -> &'a Catalog {
        self.catalog
    }

    /// Instantiate a scene. On success the live state holds every entity the
    /// scene created; on failure the live state, the cache, and the RNG
    /// stream are untouched.
    pub fn instantiate(
        &mut self,
        request: SpawnRequest<'_>,
        state: &mut GameState,
        trace: Option<&mut SpawnTrace>,
    ) -> Result<Scene, SpawnError> {
        let checkpoint = self.rng.clone();
        let result = self.instantiate_staged(request, state, trace);
        if result.is_err() {
            *self.rng = checkpoint;
        }
        result
    }

    fn instantiate_staged(
        &mut self,
        request: SpawnRequest<'_>,
        state: &mut GameState,
        trace: Option<&mut SpawnTrace>,
    ) -> Result<Scene, SpawnError> {
        let template = request.template;
        if let Some(reason) =
            eligibility_problem(&template.spawn_conditions, template.placement_filter.as_ref(), state)
        {
            return Err(SpawnError::Ineligible {
                template: template.id.clone(),
                reason,
            });
        }
        if request.depth > self.config.max_spawn_depth {
            return Err(SpawnError::DepthExceeded {
                template: template.id.clone(),
                depth: request.depth,
            });
        }

        let mut staged = state.clone();
        let mut cache = self.cache.clone();
        let scene_id = SceneId::from_rng(self.rng);
        let wrap = |source: ResolutionError| SpawnError::Resolution {
            template: template.id.clone(),
            source,
        };

        // ----- Placement -----
        let placement = match (request.placement, &template.placement_filter) {
            (Some(entity), _) => {
                if !staged.world.contains(entity) {
                    return Err(SpawnError::MissingPlacement {
                        template: template.id.clone(),
                    });
                }
                Some(Resolution {
                    entity,
                    metadata: ResolutionMetadata::Supplied,
                })
            }
            (None, Some(filter)) => {
                let context = ResolutionContext {
                    location: request.context_location.or(staged.player.location),
                    scene_route: None,
                    player_position: staged.player.position,
                };
                Some(
                    self.resolve(&mut cache, filter, &context, &mut staged.world)
                        .map_err(wrap)?,
                )
            }
            (None, None) => None,
        };
        let placement_ref = placement.as_ref().map(|r| r.entity);
        let anchor = anchor_location(&staged.world, placement_ref)
            .or(request.context_location)
            .or(staged.player.location);
        let scene_ctx = PlaceholderContext::from_placement(&staged.world, placement_ref)
            .with_player(staged.player.name.clone());

        // ----- Dependent resources -----
        let dependents = self
            .install_dependents(template, scene_id, anchor, &scene_ctx, &mut staged.world)
            .map_err(|source| SpawnError::DependentContent {
                template: template.id.clone(),
                source,
            })?;

        // ----- Situations -----
        let player_position = staged.player.position;
        let mut scene_route: Option<EntityId> = None;
        let mut builds = Vec::with_capacity(template.situation_templates.len());
        for situation_template in &template.situation_templates {
            let mut resolutions = Vec::new();
            let location = match &situation_template.location_filter {
                Some(filter) => match &filter.dependent_location {
                    Some(key) => {
                        let id = dependents
                            .location_for(key)
                            .ok_or_else(|| ResolutionError::UnknownDependentLocation(key.clone()))
                            .map_err(wrap)?;
                        resolutions.push(SlotResolution {
                            slot: filter.placement_type,
                            metadata: ResolutionMetadata::DependentResource { key: key.clone() },
                        });
                        Some(id)
                    }
                    None => {
                        let context = ResolutionContext {
                            location: anchor,
                            scene_route,
                            player_position,
                        };
                        Some(
                            self.resolve_slot(&mut cache, filter, &context, &mut staged.world, &mut resolutions)
                                .map_err(wrap)?,
                        )
                    }
                },
                None => None,
            };
            let here = ResolutionContext {
                location: location.or(anchor),
                scene_route,
                player_position,
            };
            let npc = match &situation_template.npc_filter {
                Some(filter) => Some(
                    self.resolve_slot(&mut cache, filter, &here, &mut staged.world, &mut resolutions)
                        .map_err(wrap)?,
                ),
                None => None,
            };
            let route = match &situation_template.route_filter {
                Some(filter) => Some(
                    self.resolve_slot(&mut cache, filter, &here, &mut staged.world, &mut resolutions)
                        .map_err(wrap)?,
                ),
                None => None,
            };
            if route.is_some() {
                scene_route = route;
            }

            let ctx = PlaceholderContext::from_entities(&staged.world, npc, location, route).or(&scene_ctx);
            let base_text = ctx.substitute(&situation_template.narrative_template);
            let narrative = NarrativeContext {
                scene_template: template.id.clone(),
                situation_template: situation_template.id.clone(),
                base_text,
                npc_name: ctx.npc_name.clone(),
                location_name: ctx.location_name.clone(),
                route_name: ctx.route_name.clone(),
                day: staged.clock.day,
                block: staged.clock.block,
            };
            let description = narrate(self.narrator, &narrative);

            let choices = situation_template
                .choice_templates
                .iter()
                .map(|ct| self.build_choice(ct, &ctx, &dependents))
                .collect();

            builds.push(SituationBuild {
                situation: Situation {
                    id: SituationId::from_rng(self.rng),
                    template_id: situation_template.id.clone(),
                    name: ctx.substitute(situation_template.name.as_deref().unwrap_or(&situation_template.id)),
                    situation_type: situation_template.situation_type,
                    description,
                    location,
                    npc,
                    route,
                    choices,
                    completed: false,
                },
                resolutions,
            });
        }

        // ----- Scene -----
        let state_on_spawn = match request.trigger {
            SpawnTrigger::ChoicePreview | SpawnTrigger::Cascade => SceneState::Provisional,
            SpawnTrigger::Starter | SpawnTrigger::Manual => SceneState::Active,
        };
        let situations: Vec<Situation> = builds.iter().map(|b| b.situation.clone()).collect();
        let scene = Scene {
            id: scene_id,
            template_id: template.id.clone(),
            display_name: scene_ctx.substitute(template.display_name.as_deref().unwrap_or(&template.id)),
            intro: scene_ctx.substitute(template.intro_narrative.as_deref().unwrap_or_default()),
            archetype: template.archetype,
            presentation_mode: template.presentation_mode,
            progression_mode: template.progression_mode,
            placement: placement_ref,
            state: state_on_spawn,
            current_situation: situations.first().map(|s| s.id),
            situations,
            spawned_at: staged.clock,
            expires_on_day: template.expiration_days.map(|d| staged.clock.day + d),
            trigger: request.trigger,
            depth: request.depth,
            parent_choice: request.parent_choice,
            dependents: dependents.resources,
        };

        *state = staged;
        *self.cache = cache;

        if let Some(trace) = trace {
            let node = trace.record_scene_spawn(
                &scene,
                &state.world,
                request.parent,
                placement.map(|p| p.metadata),
            );
            for build in builds {
                trace.record_situation_spawn(node, &build.situation, &state.world, build.resolutions);
            }
        }

        tracing::info!(
            target: "loomwright::instantiate",
            scene = %scene.id,
            template = %scene.template_id,
            trigger = ?scene.trigger,
            state = %scene.state,
            depth = scene.depth,
            "scene.spawned"
        );
        Ok(scene)
    }

    /// Build provisional previews for every spawn instruction of the current
    /// situation's choices. Failures leave the choice without a preview.
    pub fn prepare_previews(
        &mut self,
        scene: &mut Scene,
        state: &mut GameState,
        mut trace: Option<&mut SpawnTrace>,
    ) {
        if !scene.is_active() {
            return;
        }
        let depth = scene.depth + 1;
        let scene_id = scene.id;
        let Some(situation) = scene.current_mut() else {
            return;
        };
        let parent = trace
            .as_deref()
            .and_then(|t| t.situation_node(situation.id))
            .map_or(TraceParent::Root, TraceParent::Situation);
        let snapshot = situation.clone();

        for choice in &mut situation.choices {
            if !choice.previews.is_empty() {
                continue;
            }
            for spawn in &choice.consequence.scenes_to_spawn {
                let catalog = self.catalog;
                let Some(template) = catalog.scene_template(&spawn.scene_template_id) else {
                    continue;
                };
                let request = SpawnRequest::new(template, SpawnTrigger::ChoicePreview)
                    .with_placement(spawn_placement(spawn, &snapshot))
                    .with_depth(depth)
                    .with_context_location(snapshot.location)
                    .with_parent(parent, Some(choice.id));
                match self.instantiate(request, state, trace.as_deref_mut()) {
                    Ok(preview) => choice.previews.push(preview),
                    Err(e) => tracing::debug!(
                        target: "loomwright::instantiate",
                        scene = %scene_id,
                        template = %spawn.scene_template_id,
                        error = %e,
                        "preview.skipped"
                    ),
                }
            }
        }
    }

    fn resolve(
        &mut self,
        cache: &mut ResolutionCache,
        filter: &PlacementFilter,
        context: &ResolutionContext,
        world: &mut World,
    ) -> Result<Resolution, ResolutionError> {
        let catalog = self.catalog;
        EntityResolver::new(catalog.defaults(), cache, self.rng).resolve(filter, context, world)
    }

    fn resolve_slot(
        &mut self,
        cache: &mut ResolutionCache,
        filter: &PlacementFilter,
        context: &ResolutionContext,
        world: &mut World,
        resolutions: &mut Vec<SlotResolution>,
    ) -> Result<EntityId, ResolutionError> {
        let resolution = self.resolve(cache, filter, context, world)?;
        resolutions.push(SlotResolution {
            slot: filter.placement_type,
            metadata: resolution.metadata,
        });
        Ok(resolution.entity.id())
    }

    fn install_dependents(
        &mut self,
        template: &SceneTemplate,
        scene: SceneId,
        anchor: Option<EntityId>,
        ctx: &PlaceholderContext,
        world: &mut World,
    ) -> Result<InstalledDependents, ContentError> {
        let mut installed = InstalledDependents::default();
        if template.dependent_locations.is_empty() && template.dependent_items.is_empty() {
            return Ok(installed);
        }

        let prefix = scene.0.simple().to_string();
        let inherited = anchor.and_then(|id| world.location(id));
        let mut package = ContentPackage::default();
        for def in &template.dependent_locations {
            let mut def = def.clone();
            def.key = namespaced(&prefix, &def.key);
            def.name = ctx.substitute(&def.name);
            def.description = ctx.substitute(&def.description);
            if def.district.is_none() {
                def.district = inherited.and_then(|l| l.district.clone());
            }
            if def.region.is_none() {
                def.region = inherited.and_then(|l| l.region.clone());
            }
            package.locations.push(def);
        }
        for def in &template.dependent_items {
            let mut def = def.clone();
            def.key = namespaced(&prefix, &def.key);
            def.name = ctx.substitute(&def.name);
            def.description = ctx.substitute(&def.description);
            package.items.push(def);
        }

        let origin = format!("scene '{}' dependents", template.id);
        let value = serde_json::to_value(&package).map_err(|source| ContentError::Parse {
            origin: origin.clone(),
            source,
        })?;
        let package = package_from_value(value, &origin)?;
        let mut issues = Vec::new();
        validate_entities(&package, &mut issues);
        if has_errors(&issues) {
            return Err(ContentError::Invalid(issues));
        }

        let ids = install_entities(&package, world, EntityOrigin::SceneDependent { scene }, self.rng)?;
        for (def, id) in template.dependent_locations.iter().zip(&ids.locations) {
            installed.locations.insert(def.key.clone(), *id);
        }
        for def in &template.dependent_items {
            installed
                .item_keys
                .insert(def.key.clone(), namespaced(&prefix, &def.key));
        }
        installed.resources = DependentResources {
            locations: ids.locations,
            items: ids.items,
        };
        tracing::debug!(
            target: "loomwright::instantiate",
            scene = %scene,
            locations = installed.resources.locations.len(),
            items = installed.resources.items.len(),
            "dependents.installed"
        );
        Ok(installed)
    }

    fn build_choice(
        &mut self,
        template: &ChoiceTemplate,
        ctx: &PlaceholderContext,
        dependents: &InstalledDependents,
    ) -> Choice {
        let consequence = dependents.rebind_consequence(&template.consequence);
        let mut requirement = dependents.rebind_requirement(&template.requirement);
        if consequence.resolve < 0 {
            requirement = requirement.and_everywhere(NumericRequirement::Resolve { threshold: 0 });
        }
        Choice {
            id: ChoiceId::from_rng(self.rng),
            template_id: template.id.clone(),
            action_text: ctx.substitute(&template.action_text),
            path_type: template.path_type,
            action_type: template.action_type,
            requirement,
            consequence,
            on_success: template
                .on_success_consequence
                .as_ref()
                .map(|c| dependents.rebind_consequence(c)),
            on_failure: template
                .on_failure_consequence
                .as_ref()
                .map(|c| dependents.rebind_consequence(c)),
            challenge: template.challenge.clone(),
            previews: Vec::new(),
        }
    }
}

fn namespaced(prefix: &str, key: &str) -> String {
    format!("{prefix}.{key}")
}

/// The location a placement sits at.
fn anchor_location(world: &World, placement: Option<EntityRef>) -> Option<EntityId> {
    match placement? {
        EntityRef::Location(id) => Some(id),
        EntityRef::Npc(id) => world.npc(id).and_then(|n| n.location),
        EntityRef::Route(id) => world.route(id).and_then(|r| r.from),
    }
}

/// Dependent resources installed for one scene, with the mapping from
/// scene-local keys to world keys.
#[derive(Debug, Default)]
struct InstalledDependents {
    resources: DependentResources,
    locations: HashMap<String, EntityId>,
    item_keys: HashMap<String, String>,
}

impl InstalledDependents {
    fn location_for(&self, local: &str) -> Option<EntityId> {
        self.locations.get(local).copied()
    }

    fn item_key(&self, key: &str) -> String {
        self.item_keys.get(key).cloned().unwrap_or_else(|| key.to_string())
    }

    fn rebind_consequence(&self, consequence: &Consequence) -> Consequence {
        if self.item_keys.is_empty() {
            return consequence.clone();
        }
        let mut out = consequence.clone();
        out.item_grants = consequence.item_grants.iter().map(|k| self.item_key(k)).collect();
        out.item_removals = consequence.item_removals.iter().map(|k| self.item_key(k)).collect();
        out
    }

    fn rebind_requirement(&self, requirement: &CompoundRequirement) -> CompoundRequirement {
        let mut out = requirement.clone();
        for path in &mut out.or_paths {
            for req in &mut path.requirements {
                if let NumericRequirement::Item { context } = req {
                    *context = self.item_key(context);
                }
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::external::TemplateNarrator;
    use crate::test_support::{fixture_catalog, fixture_state};
    use lw_core::TimeBlock;
    use rand::{Rng, SeedableRng};

    struct Harness {
        catalog: Catalog,
        config: EngineConfig,
        rng: StdRng,
        cache: ResolutionCache,
    }

    impl Harness {
        fn new() -> Self {
            Self {
                catalog: fixture_catalog(),
                config: EngineConfig::default(),
                rng: StdRng::seed_from_u64(42),
                cache: ResolutionCache::new(),
            }
        }

        fn spawn(
            &mut self,
            template: &str,
            trigger: SpawnTrigger,
            state: &mut GameState,
            trace: Option<&mut SpawnTrace>,
        ) -> Result<Scene, SpawnError> {
            let catalog = &self.catalog;
            let template = catalog.scene_template(template).unwrap();
            SceneInstantiator::new(catalog, &self.config, &mut self.rng, &mut self.cache, &TemplateNarrator)
                .instantiate(SpawnRequest::new(template, trigger), state, trace)
        }
    }

    #[test]
    fn starter_scene_is_active_with_placement() {
        let mut harness = Harness::new();
        let mut state = fixture_state(&harness.catalog);
        let scene = harness
            .spawn("tavern_welcome", SpawnTrigger::Starter, &mut state, None)
            .unwrap();

        assert_eq!(scene.state, SceneState::Active);
        let Some(EntityRef::Npc(npc)) = scene.placement else {
            panic!("expected NPC placement");
        };
        assert_eq!(state.world.npc(npc).unwrap().key, "elena");
        assert_eq!(scene.current_situation, Some(scene.situations[0].id));
        assert!(scene.intro.contains("Elena"));
        assert!(!scene.intro.contains("{NpcName}"));
    }

    #[test]
    fn dependent_resources_are_namespaced() {
        let mut harness = Harness::new();
        let mut state = fixture_state(&harness.catalog);
        let scene = harness
            .spawn("private_room", SpawnTrigger::Manual, &mut state, None)
            .unwrap();

        assert_eq!(scene.dependents.locations.len(), 1);
        assert_eq!(scene.dependents.items.len(), 1);
        let room = state.world.location(scene.dependents.locations[0]).unwrap();
        assert!(room.key.ends_with(".room"));
        assert!(room.key.starts_with(&scene.id.0.simple().to_string()));
        assert_eq!(room.origin, EntityOrigin::SceneDependent { scene: scene.id });
        assert_eq!(room.name, "Elena's Back Room");

        let situation = &scene.situations[0];
        assert_eq!(situation.location, Some(room.id));
        let key = state.world.item(scene.dependents.items[0]).unwrap().key.clone();
        assert_eq!(situation.choices[0].consequence.item_grants, vec![key]);
    }

    #[test]
    fn resolve_spending_choice_gets_willpower_gate() {
        let mut harness = Harness::new();
        let mut state = fixture_state(&harness.catalog);
        let scene = harness
            .spawn("private_room", SpawnTrigger::Manual, &mut state, None)
            .unwrap();
        let defiant = &scene.situations[0].choices[1];
        assert!(defiant.consequence.resolve < 0);
        assert!(
            defiant
                .requirement
                .iter_requirements()
                .any(|r| *r == NumericRequirement::Resolve { threshold: 0 })
        );
    }

    #[test]
    fn ineligible_scene_leaves_state_untouched() {
        let mut harness = Harness::new();
        let mut state = fixture_state(&harness.catalog);
        state.clock = lw_core::GameClock::at(1, TimeBlock::Morning);
        let before = state.clone();
        let err = harness
            .spawn("night_watch", SpawnTrigger::Manual, &mut state, None)
            .unwrap_err();
        assert!(matches!(err, SpawnError::Ineligible { .. }));
        assert_eq!(state, before);
    }

    #[test]
    fn failed_resolution_is_atomic() {
        let mut harness = Harness::new();
        let mut state = fixture_state(&harness.catalog);
        let before = state.clone();
        let err = harness
            .spawn("broken_road", SpawnTrigger::Manual, &mut state, None)
            .unwrap_err();
        assert!(matches!(err, SpawnError::Resolution { .. }));
        assert_eq!(state, before);
    }

    #[test]
    fn failed_spawn_leaves_rng_stream_alone() {
        let mut harness = Harness::new();
        let mut state = fixture_state(&harness.catalog);
        let mut untouched = harness.rng.clone();
        harness
            .spawn("broken_road", SpawnTrigger::Manual, &mut state, None)
            .unwrap_err();
        assert_eq!(harness.rng.random::<u64>(), untouched.random::<u64>());
    }

    #[test]
    fn requirement_on_dependent_item_follows_the_rebinding() {
        let mut harness = Harness::new();
        let mut state = fixture_state(&harness.catalog);
        let scene = harness
            .spawn("private_room", SpawnTrigger::Manual, &mut state, None)
            .unwrap();
        let item = scene.dependents.items[0];
        let key = state.world.item(item).unwrap().key.clone();
        let unlock = scene.situations[0]
            .choices
            .iter()
            .find(|c| c.template_id == "unlock")
            .unwrap();
        assert!(
            unlock
                .requirement
                .iter_requirements()
                .any(|r| *r == NumericRequirement::Item { context: key.clone() })
        );

        assert!(!crate::requirement::evaluate(&unlock.requirement, &state));
        state.player.add_item(item);
        assert!(crate::requirement::evaluate(&unlock.requirement, &state));
    }

    #[test]
    fn situation_npc_prefers_the_closest_candidate() {
        let (catalog, _) = Catalog::from_json(
            r#"{
                "Locations": [
                    { "Key": "inn", "Name": "Inn", "Position": { "q": 0, "r": 0 } },
                    { "Key": "market", "Name": "Market", "Position": { "q": 2, "r": 0 } }
                ],
                "Npcs": [
                    { "Key": "far_guard", "Name": "Far", "Profession": "Guard", "Location": "market" },
                    { "Key": "near_guard", "Name": "Near", "Profession": "Guard", "Location": "inn" }
                ],
                "SceneTemplates": [ { "Id": "patrol", "SituationTemplates": [ {
                    "Id": "stop",
                    "NpcFilter": { "PlacementType": "NPC", "Profession": "Guard", "SelectionStrategy": "Closest" },
                    "ChoiceTemplates": [
                        { "Id": "talk", "ActionText": "Talk", "Consequence": { "IsTerminal": true } },
                        { "Id": "pass", "ActionText": "Pass", "Consequence": { "IsTerminal": true } }
                    ]
                } ] } ]
            }"#,
        )
        .unwrap();
        let world = catalog
            .new_world(lw_core::WorldMeta::new("Patrol"), &mut StdRng::seed_from_u64(1))
            .unwrap();
        let mut player = lw_core::Player::new("Wren");
        player.location = world.find_location_by_key("inn").map(|l| l.id);
        player.position = Some(lw_core::HexCoord::new(0, 0));
        let mut state = GameState::new(player, world);

        let mut harness = Harness::new();
        harness.catalog = catalog;
        let scene = harness
            .spawn("patrol", SpawnTrigger::Manual, &mut state, None)
            .unwrap();
        let guard = scene.situations[0].npc.unwrap();
        assert_eq!(state.world.npc(guard).unwrap().key, "near_guard");
    }

    #[test]
    fn trace_records_scene_and_situations() {
        let mut harness = Harness::new();
        let mut state = fixture_state(&harness.catalog);
        let mut trace = SpawnTrace::new();
        let scene = harness
            .spawn("tavern_welcome", SpawnTrigger::Starter, &mut state, Some(&mut trace))
            .unwrap();
        let node = trace.scene_node(scene.id).unwrap();
        assert_eq!(trace.scene(node).unwrap().situations.len(), scene.situations.len());
        assert!(trace.scene(node).unwrap().placement.is_some());
    }
}
