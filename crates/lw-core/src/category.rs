use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! display_as_variant {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl fmt::Display for $ty {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    fmt::Debug::fmt(self, f)
                }
            }
        )+
    };
}

// ----- NPC dimensions -----

/// Broad temperament of an NPC.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PersonalityType {
    /// No strong leaning.
    #[default]
    Neutral,
    /// Loyal to people and causes.
    Devoted,
    /// Driven by trade and profit.
    Mercantile,
    /// Status-conscious.
    Proud,
    /// Scheming and indirect.
    Cunning,
    /// Reliable and unshakeable.
    Steadfast,
}

/// What an NPC does for a living.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Profession {
    #[default]
    Commoner,
    Merchant,
    Innkeeper,
    Guard,
    Scholar,
    Noble,
    Priest,
    Healer,
    Courier,
    Thief,
    Soldier,
    Artisan,
    Scribe,
    Diplomat,
    Ranger,
    Mystic,
    Ferryman,
    Laborer,
}

/// How an NPC currently regards the player.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NpcRelationship {
    #[default]
    Neutral,
    Allied,
    Wary,
    Unfriendly,
    Hostile,
    Betrayed,
}

/// Social weight of an NPC.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SocialStanding {
    #[default]
    Commoner,
    Notable,
    Authority,
}

/// Narrative function an NPC serves in a scene.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StoryRole {
    #[default]
    Bystander,
    Facilitator,
    Obstacle,
}

/// How much an NPC knows about the matter at hand.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KnowledgeLevel {
    #[default]
    Uninformed,
    Informed,
    Expert,
}

// ----- Location dimensions -----

/// Who may freely enter a location.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LocationPrivacy {
    #[default]
    Public,
    SemiPublic,
    Private,
}

/// How dangerous a location is to linger in.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LocationSafety {
    Safe,
    #[default]
    Neutral,
    Risky,
    Dangerous,
}

/// How crowded a location usually is.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LocationActivity {
    Quiet,
    #[default]
    Moderate,
    Busy,
}

/// Primary function of a location.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LocationPurpose {
    #[default]
    Generic,
    Dwelling,
    Commerce,
    Civic,
    Defense,
    Entertainment,
    Governance,
    Learning,
    Transit,
    Worship,
}

// ----- Route dimensions -----

/// Dominant terrain along a route.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Terrain {
    #[default]
    Plains,
    Forest,
    Hills,
    Mountain,
    Marsh,
    River,
    Urban,
}

/// Built structure a route follows.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RouteStructure {
    #[default]
    Path,
    Road,
    Bridge,
    Pass,
    Ford,
    Tunnel,
}

// ----- Player vocabularies -----

/// The five player stats.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StatType {
    Insight,
    Rapport,
    Authority,
    Diplomacy,
    Cunning,
}

/// The six moral/behavioral scales, each a signed value centered on zero.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScaleType {
    Morality,
    Lawfulness,
    Method,
    Caution,
    Transparency,
    Fame,
}

/// Conditions the player can be in.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StateType {
    Wounded,
    Exhausted,
    Inspired,
    Rested,
    Suspicious,
    Indebted,
    Celebrated,
}

/// Quarters of the in-game day.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TimeBlock {
    #[default]
    Morning,
    Midday,
    Afternoon,
    Evening,
}

impl TimeBlock {
    /// All blocks in day order.
    pub const ALL: [TimeBlock; 4] = [
        TimeBlock::Morning,
        TimeBlock::Midday,
        TimeBlock::Afternoon,
        TimeBlock::Evening,
    ];

    /// Zero-based position within the day.
    pub fn index(self) -> u32 {
        self as u32
    }

    /// Block at a zero-based position, wrapping past the end of the day.
    pub fn from_index(index: u32) -> Self {
        Self::ALL[(index % 4) as usize]
    }
}

display_as_variant!(
    PersonalityType,
    Profession,
    NpcRelationship,
    SocialStanding,
    StoryRole,
    KnowledgeLevel,
    LocationPrivacy,
    LocationSafety,
    LocationActivity,
    LocationPurpose,
    Terrain,
    RouteStructure,
    StatType,
    ScaleType,
    StateType,
    TimeBlock,
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn time_block_wraps() {
        assert_eq!(TimeBlock::from_index(0), TimeBlock::Morning);
        assert_eq!(TimeBlock::from_index(3), TimeBlock::Evening);
        assert_eq!(TimeBlock::from_index(5), TimeBlock::Midday);
        assert!(TimeBlock::Morning < TimeBlock::Evening);
    }

    #[test]
    fn unknown_tag_is_rejected() {
        let parsed: Result<Profession, _> = serde_json::from_str("\"Wizard\"");
        assert!(parsed.is_err());
        let parsed: Profession = serde_json::from_str("\"Merchant\"").unwrap();
        assert_eq!(parsed, Profession::Merchant);
        assert_eq!(parsed.to_string(), "Merchant");
    }
}
