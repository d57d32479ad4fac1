use serde::{Deserialize, Serialize};

use crate::clock::GameClock;
use crate::player::Player;
use crate::world::World;

/// Everything the engine reads and mutates during play: the player, the world
/// graph, and the clock. Passed explicitly; there is no ambient game state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GameState {
    /// The player.
    pub player: Player,
    /// The world graph.
    pub world: World,
    /// In-game time.
    pub clock: GameClock,
}

impl GameState {
    /// Bundle a player and world at the start of day one.
    pub fn new(player: Player, world: World) -> Self {
        Self {
            player,
            world,
            clock: GameClock::default(),
        }
    }

    /// Bond strength with an NPC identified by content key. Unknown NPCs have
    /// a bond of zero.
    pub fn bond_with(&self, npc_key: &str) -> i32 {
        self.world
            .find_npc_by_key(npc_key)
            .map(|n| n.bond)
            .unwrap_or(0)
    }

    /// Whether the player carries an item identified by content key.
    pub fn carries(&self, item_key: &str) -> bool {
        self.world
            .find_item_by_key(item_key)
            .is_some_and(|item| self.player.has_item(item.id))
    }
}
