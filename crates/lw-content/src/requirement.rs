//! Compound requirements: an OR of AND-paths over a closed vocabulary of
//! numeric and membership checks.

use std::fmt;

use serde::{Deserialize, Serialize};

use lw_core::{ScaleType, StatType, StateType};

/// One atomic check against player or world state.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "Type", rename_all_fields = "PascalCase")]
pub enum NumericRequirement {
    /// Bond with the NPC identified by `context` is at least `threshold`.
    BondStrength {
        /// NPC content key.
        context: String,
        /// Minimum bond.
        threshold: i32,
    },
    /// A scale satisfies `threshold`: at least it when non-negative, at most
    /// it when negative.
    Scale {
        /// Which scale.
        context: ScaleType,
        /// Signed threshold.
        threshold: i32,
    },
    /// A stat is at least `threshold`.
    Stat {
        /// Which stat.
        context: StatType,
        /// Minimum value.
        threshold: i32,
    },
    /// Resolve is at least `threshold`.
    Resolve {
        /// Minimum resolve.
        threshold: i32,
    },
    /// Coins are at least `threshold`.
    Coins {
        /// Minimum coins.
        threshold: i32,
    },
    /// The player has finished at least `threshold` situations.
    CompletedSituations {
        /// Minimum count.
        threshold: u32,
    },
    /// The player has earned an achievement.
    Achievement {
        /// Achievement id.
        context: String,
    },
    /// The player is in a state.
    State {
        /// Which state.
        context: StateType,
    },
    /// The player carries an item.
    Item {
        /// Item content key.
        context: String,
    },
}

impl fmt::Display for NumericRequirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BondStrength { context, threshold } => {
                write!(f, "Bond with {context} {threshold}+")
            }
            Self::Scale { context, threshold } if *threshold < 0 => {
                write!(f, "{context} {threshold} or lower")
            }
            Self::Scale { context, threshold } => write!(f, "{context} {threshold}+"),
            Self::Stat { context, threshold } => write!(f, "{context} {threshold}+"),
            Self::Resolve { threshold } => write!(f, "Resolve {threshold}+"),
            Self::Coins { threshold } => write!(f, "Coins {threshold}+"),
            Self::CompletedSituations { threshold } => {
                write!(f, "{threshold}+ completed situations")
            }
            Self::Achievement { context } => write!(f, "Achievement {context}"),
            Self::State { context } => write!(f, "State {context}"),
            Self::Item { context } => write!(f, "Carrying {context}"),
        }
    }
}

/// A conjunction of requirements. Holds when every requirement holds.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", deny_unknown_fields)]
pub struct OrPath {
    /// Optional label shown to the player.
    #[serde(default)]
    pub label: Option<String>,
    /// Requirements that must all hold.
    #[serde(default)]
    pub requirements: Vec<NumericRequirement>,
}

impl OrPath {
    /// A path over the given requirements.
    pub fn all(requirements: impl IntoIterator<Item = NumericRequirement>) -> Self {
        Self {
            label: None,
            requirements: requirements.into_iter().collect(),
        }
    }

    /// Label for display, falling back to the joined requirement descriptions.
    pub fn display_label(&self) -> String {
        match &self.label {
            Some(label) => label.clone(),
            None if self.requirements.is_empty() => "Always".to_string(),
            None => self
                .requirements
                .iter()
                .map(|r| r.to_string())
                .collect::<Vec<_>>()
                .join(" and "),
        }
    }
}

/// A disjunction of paths. Holds when any path holds; an empty compound
/// holds vacuously.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", deny_unknown_fields)]
pub struct CompoundRequirement {
    /// Alternative paths.
    #[serde(default)]
    pub or_paths: Vec<OrPath>,
}

impl CompoundRequirement {
    /// Requirement with no paths.
    pub fn none() -> Self {
        Self::default()
    }

    /// Requirement with the given paths.
    pub fn any(paths: impl IntoIterator<Item = OrPath>) -> Self {
        Self {
            or_paths: paths.into_iter().collect(),
        }
    }

    /// Whether the requirement is vacuous.
    pub fn is_empty(&self) -> bool {
        self.or_paths.is_empty()
    }

    /// Add a requirement to every path, or create a single path holding it if
    /// there are none. Used to gate choices that spend resolve.
    pub fn and_everywhere(mut self, requirement: NumericRequirement) -> Self {
        if self.or_paths.is_empty() {
            self.or_paths.push(OrPath::all([requirement]));
            return self;
        }
        for path in &mut self.or_paths {
            if !path.requirements.contains(&requirement) {
                path.requirements.push(requirement.clone());
            }
        }
        self
    }

    /// Every requirement across all paths.
    pub fn iter_requirements(&self) -> impl Iterator<Item = &NumericRequirement> {
        self.or_paths.iter().flat_map(|p| p.requirements.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_tagged_requirements() {
        let json = r#"{
            "OrPaths": [
                { "Label": "Friendship", "Requirements": [
                    { "Type": "BondStrength", "Context": "npc_x", "Threshold": 15 }
                ] },
                { "Requirements": [ { "Type": "Coins", "Threshold": 500 } ] }
            ]
        }"#;
        let req: CompoundRequirement = serde_json::from_str(json).unwrap();
        assert_eq!(req.or_paths.len(), 2);
        assert_eq!(
            req.or_paths[0].requirements[0],
            NumericRequirement::BondStrength {
                context: "npc_x".into(),
                threshold: 15
            }
        );
        assert_eq!(req.or_paths[1].display_label(), "Coins 500+");
    }

    #[test]
    fn unknown_requirement_type_rejected() {
        let json = r#"{ "OrPaths": [ { "Requirements": [ { "Type": "Luck", "Threshold": 3 } ] } ] }"#;
        assert!(serde_json::from_str::<CompoundRequirement>(json).is_err());
    }

    #[test]
    fn and_everywhere_adds_to_each_path() {
        let gate = NumericRequirement::Resolve { threshold: 0 };
        let req = CompoundRequirement::none().and_everywhere(gate.clone());
        assert_eq!(req.or_paths.len(), 1);

        let req = CompoundRequirement::any([
            OrPath::all([NumericRequirement::Coins { threshold: 5 }]),
            OrPath::all([]),
        ])
        .and_everywhere(gate.clone());
        assert!(req.or_paths.iter().all(|p| p.requirements.contains(&gate)));
        assert_eq!(req.iter_requirements().count(), 3);
    }
}
