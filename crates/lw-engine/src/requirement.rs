//! Requirement evaluation against live game state.
//!
//! Both entry points are pure: they read the state and never change it.

use serde::{Deserialize, Serialize};

use lw_content::{CompoundRequirement, NumericRequirement, OrPath};
use lw_core::GameState;

/// Result of checking one requirement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequirementCheck {
    /// The requirement checked.
    pub requirement: NumericRequirement,
    /// The player's current value (1/0 for membership checks).
    pub current: i32,
    /// The threshold (1 for membership checks).
    pub required: i32,
    /// Whether it holds.
    pub satisfied: bool,
}

/// Result of checking one path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathExplanation {
    /// Display label.
    pub label: String,
    /// Whether every requirement of the path holds.
    pub satisfied: bool,
    /// Per-requirement results.
    pub checks: Vec<RequirementCheck>,
}

/// Whether a compound requirement holds. Empty compounds hold; otherwise at
/// least one path must hold, and a path holds when all its requirements do.
pub fn evaluate(requirement: &CompoundRequirement, state: &GameState) -> bool {
    requirement.is_empty()
        || requirement
            .or_paths
            .iter()
            .any(|path| path_holds(path, state))
}

fn path_holds(path: &OrPath, state: &GameState) -> bool {
    path.requirements.iter().all(|r| check(r, state).satisfied)
}

/// Evaluate every path and requirement, for display.
pub fn explain(requirement: &CompoundRequirement, state: &GameState) -> Vec<PathExplanation> {
    requirement
        .or_paths
        .iter()
        .map(|path| {
            let checks: Vec<RequirementCheck> =
                path.requirements.iter().map(|r| check(r, state)).collect();
            PathExplanation {
                label: path.display_label(),
                satisfied: checks.iter().all(|c| c.satisfied),
                checks,
            }
        })
        .collect()
}

/// Check a single requirement.
pub fn check(requirement: &NumericRequirement, state: &GameState) -> RequirementCheck {
    let player = &state.player;
    let (current, required, satisfied) = match requirement {
        NumericRequirement::BondStrength { context, threshold } => {
            let bond = state.bond_with(context);
            (bond, *threshold, bond >= *threshold)
        }
        NumericRequirement::Scale { context, threshold } => {
            let value = player.scales.get(*context);
            let ok = if *threshold >= 0 {
                value >= *threshold
            } else {
                value <= *threshold
            };
            (value, *threshold, ok)
        }
        NumericRequirement::Stat { context, threshold } => {
            let value = player.stats.get(*context);
            (value, *threshold, value >= *threshold)
        }
        NumericRequirement::Resolve { threshold } => {
            let value = player.resources.resolve;
            (value, *threshold, value >= *threshold)
        }
        NumericRequirement::Coins { threshold } => {
            let value = player.resources.coins;
            (value, *threshold, value >= *threshold)
        }
        NumericRequirement::CompletedSituations { threshold } => {
            let value = player.completed_situations;
            (
                i32::try_from(value).unwrap_or(i32::MAX),
                i32::try_from(*threshold).unwrap_or(i32::MAX),
                value >= *threshold,
            )
        }
        NumericRequirement::Achievement { context } => flag(player.has_achievement(context)),
        NumericRequirement::State { context } => flag(player.has_state(*context)),
        NumericRequirement::Item { context } => flag(state.carries(context)),
    };
    RequirementCheck {
        requirement: requirement.clone(),
        current,
        required,
        satisfied,
    }
}

fn flag(present: bool) -> (i32, i32, bool) {
    (i32::from(present), 1, present)
}
