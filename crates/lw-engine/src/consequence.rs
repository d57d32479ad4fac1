//! Consequence application: the single place where a choice's outcome turns
//! into player, world, clock, and scene changes.
//!
//! Effects apply in a fixed order: resources, stats, bonds, scales, states,
//! items, achievements, time, spawns, flow. The receipt lists what actually
//! changed in that order.

use serde::{Deserialize, Serialize};

use lw_content::consequence::DayAdvancement;
use lw_content::{Consequence, FlowControl};
use lw_core::{
    EntityId, GameClock, GameState, ResourceKind, ScaleType, SceneId, SituationId, StatType,
    StateType,
};

use crate::instantiate::{SceneInstantiator, SpawnRequest, spawn_placement};
use crate::lifecycle::SceneState;
use crate::scene::{Scene, Situation, SpawnTrigger};
use crate::trace::{ChoiceNodeId, SpawnTrace, TraceParent};

/// One change made by a consequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "effect", rename_all = "snake_case")]
pub enum AppliedEffect {
    /// A resource pool changed.
    Resource {
        /// Which pool.
        resource: ResourceKind,
        /// Value before.
        before: i32,
        /// Value after clamping.
        after: i32,
    },
    /// Health, stamina, and focus were refilled and hunger cleared.
    FullRecovery,
    /// A stat changed.
    Stat {
        /// Which stat.
        stat: StatType,
        /// Amount added.
        delta: i32,
    },
    /// An NPC's bond changed.
    Bond {
        /// NPC key.
        npc: String,
        /// Amount added.
        delta: i32,
        /// Bond after the change.
        after: i32,
    },
    /// A scale shifted.
    Scale {
        /// Which scale.
        scale: ScaleType,
        /// Amount shifted.
        delta: i32,
        /// Value after the shift.
        after: i32,
    },
    /// A state was applied.
    StateApplied {
        /// The state.
        state: StateType,
    },
    /// A state was cleared.
    StateCleared {
        /// The state.
        state: StateType,
    },
    /// An item entered the inventory.
    ItemGranted {
        /// Item key.
        item: String,
    },
    /// An item left the inventory.
    ItemRemoved {
        /// Item key.
        item: String,
    },
    /// An achievement was earned.
    AchievementEarned {
        /// Achievement id.
        achievement: String,
    },
    /// The clock moved.
    TimeAdvanced {
        /// Clock before.
        from: GameClock,
        /// Clock after.
        to: GameClock,
    },
    /// A scene became active because of this consequence.
    SceneSpawned {
        /// Scene instance.
        scene: SceneId,
        /// Its template.
        template: String,
    },
    /// A spawn instruction could not be carried out.
    SpawnSkipped {
        /// Template requested.
        template: String,
        /// Why it was skipped.
        reason: String,
    },
    /// The player moved.
    Moved {
        /// New location.
        location: EntityId,
    },
}

/// Where the scene goes after a consequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "flow", content = "situation", rename_all = "snake_case")]
pub enum FlowOutcome {
    /// The scene moved on to this situation.
    Advance(SituationId),
    /// The scene completed.
    Complete,
}

/// The outcome of applying one consequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsequenceReceipt {
    /// Effects in application order.
    pub effects: Vec<AppliedEffect>,
    /// What happened to the scene.
    pub flow: FlowOutcome,
}

impl ConsequenceReceipt {
    /// Net change to one resource across the receipt.
    pub fn resource_change(&self, kind: ResourceKind) -> i32 {
        self.effects
            .iter()
            .filter_map(|e| match e {
                AppliedEffect::Resource {
                    resource,
                    before,
                    after,
                } if *resource == kind => Some(after - before),
                _ => None,
            })
            .sum()
    }

    /// Scenes this consequence activated.
    pub fn spawned(&self) -> impl Iterator<Item = SceneId> + '_ {
        self.effects.iter().filter_map(|e| match e {
            AppliedEffect::SceneSpawned { scene, .. } => Some(*scene),
            _ => None,
        })
    }
}

// ---------------------------------------------------------------------------
// Player, world, and clock effects
// ---------------------------------------------------------------------------

const RECOVERED: [ResourceKind; 4] = [
    ResourceKind::Health,
    ResourceKind::Stamina,
    ResourceKind::Focus,
    ResourceKind::Hunger,
];

/// Apply everything but spawns and flow. Bond changes without an NPC key
/// target `default_npc`, normally the NPC of the situation.
///
/// References that cannot be honored at this point (an NPC or item that no
/// longer exists) are logged and skipped.
pub fn apply_effects(
    consequence: &Consequence,
    state: &mut GameState,
    default_npc: Option<EntityId>,
) -> Vec<AppliedEffect> {
    let mut effects = Vec::new();
    let player = &mut state.player;

    for delta in consequence.resource_deltas() {
        if consequence.full_recovery && RECOVERED.contains(&delta.resource) {
            continue;
        }
        let before = player.resources.get(delta.resource);
        let after = player.resources.adjust(delta.resource, delta.amount);
        if before != after {
            effects.push(AppliedEffect::Resource {
                resource: delta.resource,
                before,
                after,
            });
        }
    }
    if consequence.full_recovery {
        player.resources.recover_fully();
        effects.push(AppliedEffect::FullRecovery);
    }

    for (stat, delta) in [
        (StatType::Insight, consequence.insight),
        (StatType::Rapport, consequence.rapport),
        (StatType::Authority, consequence.authority),
        (StatType::Diplomacy, consequence.diplomacy),
        (StatType::Cunning, consequence.cunning),
    ] {
        if delta != 0 {
            player.stats.add(stat, delta);
            effects.push(AppliedEffect::Stat { stat, delta });
        }
    }

    for change in &consequence.bond_changes {
        let npc = match &change.npc {
            Some(key) => state.world.find_npc_by_key(key).map(|n| n.id),
            None => default_npc,
        };
        let Some(npc) = npc.and_then(|id| state.world.npc_mut(id)) else {
            tracing::warn!(
                target: "loomwright::consequence",
                npc = change.npc.as_deref().unwrap_or("<situation npc>"),
                "bond.skipped"
            );
            continue;
        };
        npc.bond = npc.bond.saturating_add(change.delta);
        effects.push(AppliedEffect::Bond {
            npc: npc.key.clone(),
            delta: change.delta,
            after: npc.bond,
        });
    }

    for shift in &consequence.scale_shifts {
        let after = player.scales.shift(shift.scale, shift.delta);
        effects.push(AppliedEffect::Scale {
            scale: shift.scale,
            delta: shift.delta,
            after,
        });
    }

    for application in &consequence.state_applications {
        if application.clear {
            if player.clear_state(application.state) {
                effects.push(AppliedEffect::StateCleared {
                    state: application.state,
                });
            }
        } else if player.apply_state(application.state, state.clock.day) {
            effects.push(AppliedEffect::StateApplied {
                state: application.state,
            });
        }
    }

    for key in &consequence.item_grants {
        match state.world.item_id(key) {
            Ok(id) => {
                if player.add_item(id) {
                    effects.push(AppliedEffect::ItemGranted { item: key.clone() });
                }
            }
            Err(e) => tracing::warn!(target: "loomwright::consequence", error = %e, "item.grant_skipped"),
        }
    }
    for key in &consequence.item_removals {
        match state.world.item_id(key) {
            Ok(id) => {
                if player.remove_item(id) {
                    effects.push(AppliedEffect::ItemRemoved { item: key.clone() });
                }
            }
            Err(e) => tracing::warn!(target: "loomwright::consequence", error = %e, "item.removal_skipped"),
        }
    }

    for achievement in &consequence.achievements {
        if player.grant_achievement(achievement.clone(), state.clock.day, state.clock.block) {
            effects.push(AppliedEffect::AchievementEarned {
                achievement: achievement.clone(),
            });
        }
    }

    let from = state.clock;
    match (consequence.advance_to_block, consequence.advance_to_day) {
        (Some(block), Some(DayAdvancement::NextDay)) => state.clock.advance_to_next_day(block),
        (Some(block), _) => {
            state.clock.advance_to_block(block);
        }
        (None, _) if consequence.time_segments > 0 => {
            state.clock.advance_segments(consequence.time_segments);
        }
        (None, _) => {}
    }
    if state.clock != from {
        effects.push(AppliedEffect::TimeAdvanced {
            from,
            to: state.clock,
        });
    }

    effects
}

/// Remove a scene's dependent locations and items from the world and the
/// player's inventory. Returns the removed ids.
pub fn release_dependents(scene: SceneId, state: &mut GameState) -> Vec<EntityId> {
    let removed = state.world.remove_scene_dependents(scene);
    for id in &removed {
        state.player.remove_item(*id);
    }
    if state.player.location.is_some_and(|l| removed.contains(&l)) {
        state.player.location = None;
    }
    if !removed.is_empty() {
        tracing::debug!(
            target: "loomwright::consequence",
            scene = %scene,
            removed = removed.len(),
            "dependents.released"
        );
    }
    removed
}

/// Throw away a preview that was not taken.
pub fn discard_preview(preview: &Scene, state: &mut GameState, trace: Option<&mut SpawnTrace>) {
    debug_assert_eq!(preview.state, SceneState::Provisional);
    release_dependents(preview.id, state);
    if let Some(trace) = trace {
        trace.mark_discarded(preview.id);
    }
    tracing::debug!(
        target: "loomwright::consequence",
        scene = %preview.id,
        template = %preview.template_id,
        "preview.discarded"
    );
}

// ---------------------------------------------------------------------------
// Applier
// ---------------------------------------------------------------------------

/// What a consequence is applied to.
pub struct ApplyTarget<'s> {
    /// Scene owning the situation.
    pub scene: &'s mut Scene,
    /// Situation the executed choice belongs to.
    pub situation: SituationId,
    /// Previews built for the executed choice.
    pub previews: Vec<Scene>,
    /// Trace node of the executed choice.
    pub trace_choice: Option<ChoiceNodeId>,
}

/// Applies consequences, committing previews and spawning cascades through a
/// [`SceneInstantiator`].
pub struct ConsequenceApplier<'i, 'a> {
    spawner: &'i mut SceneInstantiator<'a>,
}

impl<'i, 'a> ConsequenceApplier<'i, 'a> {
    /// Applier that spawns through `spawner`.
    pub fn new(spawner: &'i mut SceneInstantiator<'a>) -> Self {
        Self { spawner }
    }

    /// Apply a consequence. Returns the receipt and the scenes it activated.
    pub fn apply(
        &mut self,
        consequence: &Consequence,
        target: ApplyTarget<'_>,
        state: &mut GameState,
        mut trace: Option<&mut SpawnTrace>,
    ) -> (ConsequenceReceipt, Vec<Scene>) {
        let ApplyTarget {
            scene,
            situation,
            mut previews,
            trace_choice,
        } = target;
        let Some(origin) = scene.situation(situation).cloned() else {
            debug_assert!(false, "situation {situation} is not part of scene {}", scene.id);
            tracing::error!(
                target: "loomwright::consequence",
                scene = %scene.id,
                situation = %situation,
                "consequence.orphaned"
            );
            for preview in &previews {
                discard_preview(preview, state, trace.as_deref_mut());
            }
            return (
                ConsequenceReceipt {
                    effects: Vec::new(),
                    flow: FlowOutcome::Complete,
                },
                Vec::new(),
            );
        };

        let mut effects = apply_effects(consequence, state, origin.npc);

        // ----- Spawns -----
        let mut spawned = Vec::new();
        for spawn in &consequence.scenes_to_spawn {
            let taken = previews
                .iter()
                .position(|p| p.template_id == spawn.scene_template_id)
                .map(|i| previews.remove(i));
            let result = match taken {
                Some(preview) => Ok(preview),
                None => self.spawn_cascade(spawn, &origin, scene, trace_choice, state, trace.as_deref_mut()),
            };
            match result {
                Ok(mut child) => {
                    if let Err(e) = child.transition(SceneState::Active) {
                        tracing::error!(target: "loomwright::consequence", error = %e, "spawn.activation_failed");
                        continue;
                    }
                    if let Some(trace) = trace.as_deref_mut() {
                        trace.update_scene_state(child.id, SceneState::Active);
                        if let (Some(choice), Some(node)) = (trace_choice, trace.scene_node(child.id)) {
                            trace.link_spawned(choice, node);
                        }
                    }
                    effects.push(AppliedEffect::SceneSpawned {
                        scene: child.id,
                        template: child.template_id.clone(),
                    });
                    spawned.push(child);
                }
                Err(reason) => {
                    tracing::warn!(
                        target: "loomwright::consequence",
                        template = %spawn.scene_template_id,
                        reason = %reason,
                        "spawn.skipped"
                    );
                    effects.push(AppliedEffect::SpawnSkipped {
                        template: spawn.scene_template_id.clone(),
                        reason,
                    });
                }
            }
        }
        for preview in &previews {
            discard_preview(preview, state, trace.as_deref_mut());
        }

        // ----- Flow -----
        if let Some(s) = scene.situations.iter_mut().find(|s| s.id == situation) {
            s.completed = true;
        }
        state.player.completed_situations += 1;

        let next = match consequence.flow() {
            FlowControl::Advance(template_id) => {
                let found = scene.situation_by_template(template_id).map(|s| s.id);
                if found.is_none() {
                    tracing::warn!(
                        target: "loomwright::consequence",
                        scene = %scene.id,
                        situation = template_id,
                        "flow.unknown_situation"
                    );
                }
                found
            }
            FlowControl::Terminal => None,
            FlowControl::Conflict => {
                tracing::warn!(
                    target: "loomwright::consequence",
                    scene = %scene.id,
                    "flow.conflict"
                );
                None
            }
            FlowControl::Unspecified => scene.situation_after(situation),
        };
        let flow = match next {
            Some(id) => {
                scene.current_situation = Some(id);
                FlowOutcome::Advance(id)
            }
            None => {
                complete(scene, trace.as_deref_mut());
                FlowOutcome::Complete
            }
        };

        (ConsequenceReceipt { effects, flow }, spawned)
    }

    fn spawn_cascade(
        &mut self,
        spawn: &lw_content::SceneSpawn,
        origin: &Situation,
        parent: &Scene,
        trace_choice: Option<ChoiceNodeId>,
        state: &mut GameState,
        trace: Option<&mut SpawnTrace>,
    ) -> Result<Scene, String> {
        let catalog = self.spawner.catalog();
        let template = catalog
            .scene_template(&spawn.scene_template_id)
            .ok_or_else(|| format!("unknown scene template '{}'", spawn.scene_template_id))?;
        let parent_node = trace_choice.map_or(TraceParent::Root, TraceParent::Choice);
        let request = SpawnRequest::new(template, SpawnTrigger::Cascade)
            .with_placement(spawn_placement(spawn, origin))
            .with_depth(parent.depth + 1)
            .with_context_location(origin.location)
            .with_parent(parent_node, None);
        self.spawner
            .instantiate(request, state, trace)
            .map_err(|e| e.to_string())
    }
}

fn complete(scene: &mut Scene, trace: Option<&mut SpawnTrace>) {
    debug_assert!(scene.is_active(), "completing a scene that is {}", scene.state);
    match scene.transition(SceneState::Completed) {
        Ok(()) => {
            if let Some(trace) = trace {
                trace.update_scene_state(scene.id, SceneState::Completed);
            }
        }
        Err(e) => tracing::error!(target: "loomwright::consequence", error = %e, "scene.complete_failed"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::external::TemplateNarrator;
    use crate::resolver::ResolutionCache;
    use crate::test_support::{bare_scene, fixture_catalog, fixture_state};
    use lw_content::consequence::BondChange;
    use lw_core::TimeBlock;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn coins(amount: i32) -> Consequence {
        Consequence {
            coins: amount,
            ..Consequence::default()
        }
    }

    #[test]
    fn coin_grant_completes_the_scene() {
        let catalog = fixture_catalog();
        let mut state = fixture_state(&catalog);
        let config = EngineConfig::default();
        let mut rng = StdRng::seed_from_u64(1);
        let mut cache = ResolutionCache::new();
        let mut spawner = SceneInstantiator::new(&catalog, &config, &mut rng, &mut cache, &TemplateNarrator);

        let mut scene = bare_scene(SceneState::Active);
        let situation = scene.situations[0].id;
        let before = state.player.resources.coins;
        let consequence = Consequence {
            is_terminal: true,
            ..coins(10)
        };
        let (receipt, spawned) = ConsequenceApplier::new(&mut spawner).apply(
            &consequence,
            ApplyTarget {
                scene: &mut scene,
                situation,
                previews: Vec::new(),
                trace_choice: None,
            },
            &mut state,
            None,
        );

        assert!(spawned.is_empty());
        assert_eq!(state.player.resources.coins, before + 10);
        assert_eq!(receipt.resource_change(ResourceKind::Coins), 10);
        assert_eq!(receipt.flow, FlowOutcome::Complete);
        assert_eq!(scene.state, SceneState::Completed);
        assert!(scene.situations[0].completed);
        assert_eq!(state.player.completed_situations, 1);
    }

    #[test]
    fn unspecified_flow_advances_in_declared_order() {
        let catalog = fixture_catalog();
        let mut state = fixture_state(&catalog);
        let config = EngineConfig::default();
        let mut rng = StdRng::seed_from_u64(1);
        let mut cache = ResolutionCache::new();
        let mut spawner = SceneInstantiator::new(&catalog, &config, &mut rng, &mut cache, &TemplateNarrator);

        let mut scene = bare_scene(SceneState::Active);
        let mut second = scene.situations[0].clone();
        second.id = SituationId::new();
        second.template_id = "second".into();
        scene.situations.push(second);
        let (first, second) = (scene.situations[0].id, scene.situations[1].id);

        let mut applier = ConsequenceApplier::new(&mut spawner);
        let (receipt, _) = applier.apply(
            &Consequence::default(),
            ApplyTarget {
                scene: &mut scene,
                situation: first,
                previews: Vec::new(),
                trace_choice: None,
            },
            &mut state,
            None,
        );
        assert_eq!(receipt.flow, FlowOutcome::Advance(second));
        assert_eq!(scene.current_situation, Some(second));
        assert!(scene.is_active());

        let (receipt, _) = applier.apply(
            &Consequence::default(),
            ApplyTarget {
                scene: &mut scene,
                situation: second,
                previews: Vec::new(),
                trace_choice: None,
            },
            &mut state,
            None,
        );
        assert_eq!(receipt.flow, FlowOutcome::Complete);
        assert_eq!(scene.state, SceneState::Completed);
        assert_eq!(scene.current_situation, None);
    }

    #[test]
    fn full_recovery_overrides_pool_deltas() {
        let catalog = fixture_catalog();
        let mut state = fixture_state(&catalog);
        state.player.resources.health = 3;
        state.player.resources.hunger = 6;
        let consequence = Consequence {
            health: -2,
            hunger: 4,
            coins: -1,
            full_recovery: true,
            ..Consequence::default()
        };
        let effects = apply_effects(&consequence, &mut state, None);
        let resources = state.player.resources;
        assert_eq!(resources.health, resources.max_health);
        assert_eq!(resources.hunger, 0);
        assert_eq!(resources.coins, 9);
        assert!(effects.contains(&AppliedEffect::FullRecovery));
    }

    #[test]
    fn block_advance_overrides_segments() {
        let catalog = fixture_catalog();
        let mut state = fixture_state(&catalog);
        state.clock = GameClock::at(1, TimeBlock::Morning);
        let consequence = Consequence {
            time_segments: 9,
            advance_to_block: Some(TimeBlock::Afternoon),
            ..Consequence::default()
        };
        apply_effects(&consequence, &mut state, None);
        assert_eq!(state.clock, GameClock::at(1, TimeBlock::Afternoon));

        let next_day = Consequence {
            advance_to_block: Some(TimeBlock::Morning),
            advance_to_day: Some(DayAdvancement::NextDay),
            ..Consequence::default()
        };
        let effects = apply_effects(&next_day, &mut state, None);
        assert_eq!(state.clock, GameClock::at(2, TimeBlock::Morning));
        assert!(matches!(effects.last(), Some(AppliedEffect::TimeAdvanced { .. })));
    }

    #[test]
    fn bond_without_key_targets_the_situation_npc() {
        let catalog = fixture_catalog();
        let mut state = fixture_state(&catalog);
        let elena = state.world.find_npc_by_key("elena").unwrap().id;
        let consequence = Consequence {
            bond_changes: vec![BondChange { npc: None, delta: 3 }],
            ..Consequence::default()
        };
        let effects = apply_effects(&consequence, &mut state, Some(elena));
        assert_eq!(state.bond_with("elena"), 5);
        assert_eq!(
            effects,
            vec![AppliedEffect::Bond {
                npc: "elena".into(),
                delta: 3,
                after: 5
            }]
        );

        let skipped = apply_effects(&consequence, &mut state, None);
        assert!(skipped.is_empty());
    }

    #[test]
    fn bond_saturates_at_the_integer_bounds() {
        let catalog = fixture_catalog();
        let mut state = fixture_state(&catalog);
        let elena = state.world.find_npc_by_key("elena").unwrap().id;
        state.world.npc_mut(elena).unwrap().bond = i32::MAX - 1;
        let consequence = Consequence {
            bond_changes: vec![BondChange { npc: None, delta: 5 }],
            ..Consequence::default()
        };
        apply_effects(&consequence, &mut state, Some(elena));
        assert_eq!(state.bond_with("elena"), i32::MAX);

        state.world.npc_mut(elena).unwrap().bond = i32::MIN + 1;
        let consequence = Consequence {
            bond_changes: vec![BondChange { npc: Some("elena".into()), delta: -5 }],
            ..Consequence::default()
        };
        apply_effects(&consequence, &mut state, None);
        assert_eq!(state.bond_with("elena"), i32::MIN);
    }

    #[test]
    fn missing_item_is_skipped_not_fatal() {
        let catalog = fixture_catalog();
        let mut state = fixture_state(&catalog);
        let consequence = Consequence {
            item_grants: vec!["room_key".into(), "ghost".into()],
            coins: 1,
            ..Consequence::default()
        };
        let effects = apply_effects(&consequence, &mut state, None);
        assert!(state.carries("room_key"));
        assert_eq!(state.player.inventory.len(), 1);
        assert_eq!(effects.len(), 2);
    }

    #[test]
    fn cascade_without_preview_spawns_on_the_spot() {
        let catalog = fixture_catalog();
        let mut state = fixture_state(&catalog);
        state.clock = GameClock::at(1, TimeBlock::Morning);
        let config = EngineConfig::default();
        let mut rng = StdRng::seed_from_u64(3);
        let mut cache = ResolutionCache::new();
        let mut spawner = SceneInstantiator::new(&catalog, &config, &mut rng, &mut cache, &TemplateNarrator);

        let template = catalog.scene_template("street_rumor").unwrap();
        let mut scene = spawner
            .instantiate(SpawnRequest::new(template, SpawnTrigger::Manual), &mut state, None)
            .unwrap();
        spawner.prepare_previews(&mut scene, &mut state, None);
        let follow = scene.situations[0].choices[0].clone();
        assert!(follow.previews.is_empty(), "night watch is not eligible in the morning");

        let situation = scene.situations[0].id;
        let (receipt, spawned) = ConsequenceApplier::new(&mut spawner).apply(
            &follow.consequence,
            ApplyTarget {
                scene: &mut scene,
                situation,
                previews: Vec::new(),
                trace_choice: None,
            },
            &mut state,
            None,
        );
        assert_eq!(spawned.len(), 1);
        assert_eq!(spawned[0].template_id, "night_watch");
        assert_eq!(spawned[0].state, SceneState::Active);
        assert_eq!(spawned[0].trigger, SpawnTrigger::Cascade);
        assert_eq!(spawned[0].depth, 1);
        assert_eq!(receipt.spawned().collect::<Vec<_>>(), vec![spawned[0].id]);
    }

    #[test]
    fn taken_preview_is_committed_and_others_discarded() {
        let catalog = fixture_catalog();
        let mut state = fixture_state(&catalog);
        let config = EngineConfig::default();
        let mut rng = StdRng::seed_from_u64(5);
        let mut cache = ResolutionCache::new();
        let mut spawner = SceneInstantiator::new(&catalog, &config, &mut rng, &mut cache, &TemplateNarrator);
        let mut trace = SpawnTrace::new();

        let template = catalog.scene_template("tavern_welcome").unwrap();
        let mut scene = spawner
            .instantiate(SpawnRequest::new(template, SpawnTrigger::Starter), &mut state, Some(&mut trace))
            .unwrap();
        spawner.prepare_previews(&mut scene, &mut state, Some(&mut trace));
        let chat = scene.situations[0]
            .choices
            .iter_mut()
            .find(|c| c.template_id == "chat")
            .unwrap();
        let previews = std::mem::take(&mut chat.previews);
        let consequence = chat.consequence.clone();
        assert_eq!(previews.len(), 1);
        let preview_id = previews[0].id;
        assert!(!previews[0].dependents.is_empty());

        let mut extra = previews[0].clone();
        extra.template_id = "unused".into();
        extra.id = SceneId::new();
        let situation = scene.situations[0].id;
        let (receipt, spawned) = ConsequenceApplier::new(&mut spawner).apply(
            &consequence,
            ApplyTarget {
                scene: &mut scene,
                situation,
                previews: vec![previews[0].clone(), extra.clone()],
                trace_choice: None,
            },
            &mut state,
            Some(&mut trace),
        );

        assert_eq!(spawned.len(), 1);
        assert_eq!(spawned[0].id, preview_id);
        assert_eq!(spawned[0].state, SceneState::Active);
        assert!(matches!(receipt.flow, FlowOutcome::Advance(_)));
        let node = trace.scene_node(preview_id).unwrap();
        assert_eq!(trace.scene(node).unwrap().state, SceneState::Active);
        assert!(trace.scene_node(extra.id).is_none());
        for id in &spawned[0].dependents.locations {
            assert!(state.world.location(*id).is_some());
        }
    }
}
