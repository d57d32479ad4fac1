//! Consequences: the flat effect record attached to every choice.

use serde::{Deserialize, Serialize};

use lw_core::{ResourceKind, ScaleType, StateType, TimeBlock};

/// Change to the bond with an NPC.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", deny_unknown_fields)]
pub struct BondChange {
    /// NPC content key. `None` targets the NPC of the situation the choice
    /// belongs to.
    #[serde(default)]
    pub npc: Option<String>,
    /// Signed change.
    pub delta: i32,
}

/// Shift of one scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", deny_unknown_fields)]
pub struct ScaleShift {
    /// Which scale.
    pub scale: ScaleType,
    /// Signed change.
    pub delta: i32,
}

/// Apply or clear a player state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", deny_unknown_fields)]
pub struct StateApplication {
    /// Which state.
    pub state: StateType,
    /// Clear instead of apply.
    #[serde(default)]
    pub clear: bool,
}

/// Which day an `AdvanceToBlock` targets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DayAdvancement {
    /// Later today; no-op if already at or past the block.
    #[default]
    CurrentDay,
    /// Tomorrow.
    NextDay,
}

/// How a cascading spawn finds its placement.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpawnPlacement {
    /// Resolve the spawned template's own placement filter.
    #[default]
    Filter,
    /// Place on the NPC of the spawning situation.
    SameNpc,
    /// Place at the location of the spawning situation.
    SameLocation,
    /// Place on the route of the spawning situation.
    SameRoute,
}

/// Instruction to spawn another scene.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", deny_unknown_fields)]
pub struct SceneSpawn {
    /// Template to instantiate.
    pub scene_template_id: String,
    /// Placement source.
    #[serde(default)]
    pub placement: SpawnPlacement,
}

/// Where a consequence sends the scene next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowControl<'a> {
    /// Neither flow field is set.
    Unspecified,
    /// Jump to a situation template of the same scene.
    Advance(&'a str),
    /// Complete the scene.
    Terminal,
    /// Both flow fields are set; rejected at load time.
    Conflict,
}

/// A signed resource amount, used to show costs before selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceDelta {
    /// Which resource.
    pub resource: ResourceKind,
    /// Signed amount.
    pub amount: i32,
}

/// Flat effect record. Costs are negative fields, rewards positive.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "PascalCase", deny_unknown_fields)]
pub struct Consequence {
    /// Coin delta.
    pub coins: i32,
    /// Resolve delta.
    pub resolve: i32,
    /// Health delta.
    pub health: i32,
    /// Stamina delta.
    pub stamina: i32,
    /// Focus delta.
    pub focus: i32,
    /// Hunger delta.
    pub hunger: i32,

    /// Insight delta.
    pub insight: i32,
    /// Rapport delta.
    pub rapport: i32,
    /// Authority delta.
    pub authority: i32,
    /// Diplomacy delta.
    pub diplomacy: i32,
    /// Cunning delta.
    pub cunning: i32,

    /// Bond changes.
    pub bond_changes: Vec<BondChange>,
    /// Scale shifts.
    pub scale_shifts: Vec<ScaleShift>,
    /// States to apply or clear.
    pub state_applications: Vec<StateApplication>,
    /// Item keys to grant.
    pub item_grants: Vec<String>,
    /// Item keys to remove.
    pub item_removals: Vec<String>,
    /// Achievement ids to grant.
    pub achievements: Vec<String>,

    /// Segments of time to pass.
    pub time_segments: u32,
    /// Jump to a time block; overrides `time_segments`.
    pub advance_to_block: Option<TimeBlock>,
    /// Day targeted by `advance_to_block`.
    pub advance_to_day: Option<DayAdvancement>,
    /// Restore health, stamina, and focus and clear hunger; overrides the
    /// individual deltas for those pools.
    pub full_recovery: bool,

    /// Scenes to spawn.
    pub scenes_to_spawn: Vec<SceneSpawn>,
    /// Situation template to move to next.
    pub next_situation_template_id: Option<String>,
    /// Complete the scene.
    pub is_terminal: bool,
}

impl Consequence {
    /// Consequence that only completes the scene.
    pub fn terminal() -> Self {
        Self {
            is_terminal: true,
            ..Self::default()
        }
    }

    /// Flow control carried by this consequence.
    pub fn flow(&self) -> FlowControl<'_> {
        match (&self.next_situation_template_id, self.is_terminal) {
            (Some(_), true) => FlowControl::Conflict,
            (Some(next), false) => FlowControl::Advance(next),
            (None, true) => FlowControl::Terminal,
            (None, false) => FlowControl::Unspecified,
        }
    }

    /// Resource deltas in application order, skipping zeros.
    pub fn resource_deltas(&self) -> Vec<ResourceDelta> {
        [
            (ResourceKind::Coins, self.coins),
            (ResourceKind::Resolve, self.resolve),
            (ResourceKind::Health, self.health),
            (ResourceKind::Stamina, self.stamina),
            (ResourceKind::Focus, self.focus),
            (ResourceKind::Hunger, self.hunger),
        ]
        .into_iter()
        .filter(|(_, amount)| *amount != 0)
        .map(|(resource, amount)| ResourceDelta { resource, amount })
        .collect()
    }

    /// Costs visible before the choice is taken: negative deltas of every
    /// pool except hunger, and hunger increases.
    pub fn costs(&self) -> Vec<ResourceDelta> {
        self.resource_deltas()
            .into_iter()
            .filter(|d| match d.resource {
                ResourceKind::Hunger => d.amount > 0,
                _ => d.amount < 0,
            })
            .collect()
    }

    /// Fold another consequence into this one: deltas add, lists
    /// concatenate, and the other's time and flow settings win where set.
    pub fn combine(&self, other: &Consequence) -> Consequence {
        let mut out = self.clone();
        out.coins += other.coins;
        out.resolve += other.resolve;
        out.health += other.health;
        out.stamina += other.stamina;
        out.focus += other.focus;
        out.hunger += other.hunger;
        out.insight += other.insight;
        out.rapport += other.rapport;
        out.authority += other.authority;
        out.diplomacy += other.diplomacy;
        out.cunning += other.cunning;
        out.bond_changes.extend(other.bond_changes.iter().cloned());
        out.scale_shifts.extend(other.scale_shifts.iter().copied());
        out.state_applications
            .extend(other.state_applications.iter().copied());
        out.item_grants.extend(other.item_grants.iter().cloned());
        out.item_removals.extend(other.item_removals.iter().cloned());
        out.achievements.extend(other.achievements.iter().cloned());
        out.time_segments += other.time_segments;
        if other.advance_to_block.is_some() {
            out.advance_to_block = other.advance_to_block;
            out.advance_to_day = other.advance_to_day;
        }
        out.full_recovery |= other.full_recovery;
        out.scenes_to_spawn
            .extend(other.scenes_to_spawn.iter().cloned());
        if !matches!(other.flow(), FlowControl::Unspecified) {
            out.next_situation_template_id = other.next_situation_template_id.clone();
            out.is_terminal = other.is_terminal;
        }
        out
    }

    /// Every item key referenced by grants and removals.
    pub fn item_keys(&self) -> impl Iterator<Item = &String> {
        self.item_grants.iter().chain(self.item_removals.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_default() {
        let c: Consequence = serde_json::from_str(r#"{ "Coins": 10, "IsTerminal": true }"#).unwrap();
        assert_eq!(c.coins, 10);
        assert_eq!(c.flow(), FlowControl::Terminal);
        assert!(c.scenes_to_spawn.is_empty());
    }

    #[test]
    fn flow_conflict_detected() {
        let c = Consequence {
            next_situation_template_id: Some("next".into()),
            is_terminal: true,
            ..Consequence::default()
        };
        assert_eq!(c.flow(), FlowControl::Conflict);
    }

    #[test]
    fn costs_exclude_rewards() {
        let c = Consequence {
            coins: -5,
            resolve: 2,
            hunger: 1,
            health: 3,
            ..Consequence::default()
        };
        let costs = c.costs();
        assert_eq!(costs.len(), 2);
        assert_eq!(costs[0].resource, ResourceKind::Coins);
        assert_eq!(costs[1].resource, ResourceKind::Hunger);
    }

    #[test]
    fn combine_prefers_other_flow() {
        let base = Consequence {
            stamina: -2,
            next_situation_template_id: Some("retry".into()),
            ..Consequence::default()
        };
        let success = Consequence {
            coins: 8,
            is_terminal: true,
            ..Consequence::default()
        };
        let merged = base.combine(&success);
        assert_eq!(merged.stamina, -2);
        assert_eq!(merged.coins, 8);
        assert_eq!(merged.flow(), FlowControl::Terminal);

        let merged = base.combine(&Consequence::default());
        assert_eq!(merged.flow(), FlowControl::Advance("retry"));
    }
}
