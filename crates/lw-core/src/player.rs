//! Player state management.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::category::{ScaleType, StatType, StateType, TimeBlock};
use crate::entity::HexCoord;
use crate::id::EntityId;

/// The spendable and depletable resources tracked on the player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResourceKind {
    /// Currency.
    Coins,
    /// Willpower spent on hard choices. May go negative.
    Resolve,
    /// Physical condition.
    Health,
    /// Physical energy.
    Stamina,
    /// Mental energy.
    Focus,
    /// Rises as the player goes without food.
    Hunger,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Resource pools. Capped pools are clamped to `0..=max`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resources {
    /// Coins on hand.
    pub coins: i32,
    /// Current resolve.
    pub resolve: i32,
    /// Current health.
    pub health: i32,
    /// Health cap.
    pub max_health: i32,
    /// Current stamina.
    pub stamina: i32,
    /// Stamina cap.
    pub max_stamina: i32,
    /// Current focus.
    pub focus: i32,
    /// Focus cap.
    pub max_focus: i32,
    /// Current hunger.
    pub hunger: i32,
    /// Hunger cap.
    pub max_hunger: i32,
}

impl Default for Resources {
    fn default() -> Self {
        Self {
            coins: 10,
            resolve: 0,
            health: 10,
            max_health: 10,
            stamina: 10,
            max_stamina: 10,
            focus: 10,
            max_focus: 10,
            hunger: 0,
            max_hunger: 10,
        }
    }
}

impl Resources {
    /// Current value of a resource.
    pub fn get(&self, kind: ResourceKind) -> i32 {
        match kind {
            ResourceKind::Coins => self.coins,
            ResourceKind::Resolve => self.resolve,
            ResourceKind::Health => self.health,
            ResourceKind::Stamina => self.stamina,
            ResourceKind::Focus => self.focus,
            ResourceKind::Hunger => self.hunger,
        }
    }

    fn slot(&mut self, kind: ResourceKind) -> (&mut i32, Option<i32>) {
        match kind {
            ResourceKind::Coins => (&mut self.coins, None),
            ResourceKind::Resolve => (&mut self.resolve, None),
            ResourceKind::Health => (&mut self.health, Some(self.max_health)),
            ResourceKind::Stamina => (&mut self.stamina, Some(self.max_stamina)),
            ResourceKind::Focus => (&mut self.focus, Some(self.max_focus)),
            ResourceKind::Hunger => (&mut self.hunger, Some(self.max_hunger)),
        }
    }

    /// Apply a signed delta and return the new value. Coins never drop below
    /// zero, capped pools stay within `0..=max`, resolve is unbounded.
    pub fn adjust(&mut self, kind: ResourceKind, delta: i32) -> i32 {
        let (value, cap) = self.slot(kind);
        let raw = value.saturating_add(delta);
        *value = match (kind, cap) {
            (ResourceKind::Resolve, _) => raw,
            (_, Some(max)) => raw.clamp(0, max),
            (_, None) => raw.max(0),
        };
        *value
    }

    /// Restore health, stamina, and focus to their caps and clear hunger.
    pub fn recover_fully(&mut self) {
        self.health = self.max_health;
        self.stamina = self.max_stamina;
        self.focus = self.max_focus;
        self.hunger = 0;
    }
}

/// The five player stats.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stats {
    /// Perception and deduction.
    pub insight: i32,
    /// Warmth and connection.
    pub rapport: i32,
    /// Command and presence.
    pub authority: i32,
    /// Negotiation.
    pub diplomacy: i32,
    /// Guile.
    pub cunning: i32,
}

impl Stats {
    /// Current value of a stat.
    pub fn get(&self, stat: StatType) -> i32 {
        match stat {
            StatType::Insight => self.insight,
            StatType::Rapport => self.rapport,
            StatType::Authority => self.authority,
            StatType::Diplomacy => self.diplomacy,
            StatType::Cunning => self.cunning,
        }
    }

    /// Add a signed delta to a stat.
    pub fn add(&mut self, stat: StatType, delta: i32) {
        let slot = match stat {
            StatType::Insight => &mut self.insight,
            StatType::Rapport => &mut self.rapport,
            StatType::Authority => &mut self.authority,
            StatType::Diplomacy => &mut self.diplomacy,
            StatType::Cunning => &mut self.cunning,
        };
        *slot = slot.saturating_add(delta);
    }
}

/// The six scales. Zero is neutral.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scales {
    /// Cruel (-) to kind (+).
    pub morality: i32,
    /// Rebellious (-) to lawful (+).
    pub lawfulness: i32,
    /// Forceful (-) to subtle (+).
    pub method: i32,
    /// Reckless (-) to careful (+).
    pub caution: i32,
    /// Secretive (-) to open (+).
    pub transparency: i32,
    /// Infamous (-) to renowned (+).
    pub fame: i32,
}

impl Scales {
    /// Current value of a scale.
    pub fn get(&self, scale: ScaleType) -> i32 {
        match scale {
            ScaleType::Morality => self.morality,
            ScaleType::Lawfulness => self.lawfulness,
            ScaleType::Method => self.method,
            ScaleType::Caution => self.caution,
            ScaleType::Transparency => self.transparency,
            ScaleType::Fame => self.fame,
        }
    }

    /// Shift a scale and return the new value.
    pub fn shift(&mut self, scale: ScaleType, delta: i32) -> i32 {
        let slot = match scale {
            ScaleType::Morality => &mut self.morality,
            ScaleType::Lawfulness => &mut self.lawfulness,
            ScaleType::Method => &mut self.method,
            ScaleType::Caution => &mut self.caution,
            ScaleType::Transparency => &mut self.transparency,
            ScaleType::Fame => &mut self.fame,
        };
        *slot = slot.saturating_add(delta);
        *slot
    }
}

/// A state currently affecting the player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveState {
    /// Which state.
    pub state: StateType,
    /// Day it was applied.
    pub applied_day: u32,
}

/// An achievement the player has earned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EarnedAchievement {
    /// Achievement id from the content catalog.
    pub id: String,
    /// Day earned.
    pub day: u32,
    /// Time block earned.
    pub block: TimeBlock,
}

/// The player's state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    /// Display name.
    pub name: String,
    /// Resource pools.
    pub resources: Resources,
    /// Stats.
    pub stats: Stats,
    /// Scales.
    pub scales: Scales,
    /// Active states.
    pub states: Vec<ActiveState>,
    /// Earned achievements.
    pub achievements: Vec<EarnedAchievement>,
    /// Items carried.
    pub inventory: Vec<EntityId>,
    /// Number of situations the player has finished.
    pub completed_situations: u32,
    /// Current location.
    pub location: Option<EntityId>,
    /// Current hex position.
    pub position: Option<HexCoord>,
}

impl Default for Player {
    fn default() -> Self {
        Self::new("Traveler")
    }
}

impl Player {
    /// Create a player with default resources and no history.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            resources: Resources::default(),
            stats: Stats::default(),
            scales: Scales::default(),
            states: Vec::new(),
            achievements: Vec::new(),
            inventory: Vec::new(),
            completed_situations: 0,
            location: None,
            position: None,
        }
    }

    /// Check if a state is active.
    pub fn has_state(&self, state: StateType) -> bool {
        self.states.iter().any(|s| s.state == state)
    }

    /// Apply a state. Returns false if it was already active.
    pub fn apply_state(&mut self, state: StateType, day: u32) -> bool {
        if self.has_state(state) {
            return false;
        }
        self.states.push(ActiveState {
            state,
            applied_day: day,
        });
        true
    }

    /// Clear a state. Returns false if it was not active.
    pub fn clear_state(&mut self, state: StateType) -> bool {
        let before = self.states.len();
        self.states.retain(|s| s.state != state);
        self.states.len() != before
    }

    /// Check if an achievement has been earned.
    pub fn has_achievement(&self, id: &str) -> bool {
        self.achievements.iter().any(|a| a.id == id)
    }

    /// Grant an achievement. Returns false if it was already earned.
    pub fn grant_achievement(&mut self, id: impl Into<String>, day: u32, block: TimeBlock) -> bool {
        let id = id.into();
        if self.has_achievement(&id) {
            return false;
        }
        self.achievements.push(EarnedAchievement { id, day, block });
        true
    }

    /// Check if the player has an item.
    pub fn has_item(&self, item_id: EntityId) -> bool {
        self.inventory.contains(&item_id)
    }

    /// Add an item to inventory.
    pub fn add_item(&mut self, item_id: EntityId) -> bool {
        if self.inventory.contains(&item_id) {
            return false;
        }
        self.inventory.push(item_id);
        true
    }

    /// Remove an item from inventory.
    pub fn remove_item(&mut self, item_id: EntityId) -> bool {
        if let Some(pos) = self.inventory.iter().position(|&id| id == item_id) {
            self.inventory.remove(pos);
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capped_resources_clamp() {
        let mut res = Resources::default();
        assert_eq!(res.adjust(ResourceKind::Health, 5), 10);
        assert_eq!(res.adjust(ResourceKind::Health, -25), 0);
        assert_eq!(res.adjust(ResourceKind::Coins, -5), 5);
        assert_eq!(res.adjust(ResourceKind::Coins, -50), 0);
        assert_eq!(res.adjust(ResourceKind::Resolve, -3), -3);
    }

    #[test]
    fn full_recovery() {
        let mut res = Resources {
            health: 2,
            stamina: 1,
            focus: 0,
            hunger: 7,
            ..Resources::default()
        };
        res.recover_fully();
        assert_eq!(res.health, res.max_health);
        assert_eq!(res.stamina, res.max_stamina);
        assert_eq!(res.focus, res.max_focus);
        assert_eq!(res.hunger, 0);
    }

    #[test]
    fn states_and_achievements_do_not_duplicate() {
        let mut player = Player::default();
        assert!(player.apply_state(StateType::Wounded, 1));
        assert!(!player.apply_state(StateType::Wounded, 2));
        assert!(player.has_state(StateType::Wounded));
        assert!(player.clear_state(StateType::Wounded));
        assert!(!player.clear_state(StateType::Wounded));

        assert!(player.grant_achievement("first_night", 1, TimeBlock::Evening));
        assert!(!player.grant_achievement("first_night", 2, TimeBlock::Morning));
        assert_eq!(player.achievements.len(), 1);
        assert_eq!(player.achievements[0].day, 1);
    }

    #[test]
    fn inventory_management() {
        let mut player = Player::default();
        let item = EntityId::new();
        assert!(!player.has_item(item));
        assert!(player.add_item(item));
        assert!(!player.add_item(item));
        assert_eq!(player.inventory.len(), 1);
        assert!(player.remove_item(item));
        assert!(!player.remove_item(item));
    }

    #[test]
    fn stats_and_scales() {
        let mut player = Player::default();
        player.stats.add(StatType::Cunning, 2);
        assert_eq!(player.stats.get(StatType::Cunning), 2);
        assert_eq!(player.scales.shift(ScaleType::Morality, -3), -3);
        assert_eq!(player.scales.get(ScaleType::Morality), -3);
    }
}
