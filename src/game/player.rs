//! Player records and the roster.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Unique identifier for a player. `0` is reserved for "neutral" on the wire.
pub type PlayerId = u8;

/// Attack power assumed for players the roster does not know.
pub const DEFAULT_POWER: u32 = 10;

/// A one-shot special ability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Skill {
    /// Damage an enemy cell and its enemy neighbors.
    Artillery,
    /// Freeze a cell and its neighbors.
    Emp,
    /// Strike a cell up to two steps from the player's territory.
    DeepStrike,
    /// Arm an owned cell against capture.
    Trap,
}

impl std::fmt::Display for Skill {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Artillery => "artillery",
            Self::Emp => "emp",
            Self::DeepStrike => "deep strike",
            Self::Trap => "trap",
        };
        f.write_str(name)
    }
}

/// State for a single player.
///
/// `power`, `active_skill` and `has_vampirism` are driven by the economy; the match only
/// consumes skills and flips `eliminated` and `spawned`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    /// Unique identifier, also the corner slot.
    pub id: PlayerId,
    /// Display name.
    pub name: String,
    /// Damage dealt (and force added) per action.
    pub power: u32,
    /// Skill that the next action will use.
    pub active_skill: Option<Skill>,
    /// Whether the player has lost all cells.
    pub eliminated: bool,
    /// Whether captures get the vampirism force bonus.
    pub has_vampirism: bool,
    /// Whether the player has received a starting cell.
    pub spawned: bool,
}

impl Player {
    /// Create a new player with default power and no upgrades.
    #[must_use]
    pub fn new(id: PlayerId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            power: DEFAULT_POWER,
            active_skill: None,
            eliminated: false,
            has_vampirism: false,
            spawned: false,
        }
    }

    /// Eliminate this player. Any held skill is discarded.
    pub fn eliminate(&mut self) {
        self.eliminated = true;
        self.active_skill = None;
    }
}

/// Registry of players in a match, ordered by id.
#[derive(Debug, Clone, Default)]
pub struct Roster {
    players: BTreeMap<PlayerId, Player>,
}

impl Roster {
    /// Create an empty roster.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a player, replacing any previous record with the same id.
    pub fn insert(&mut self, player: Player) {
        self.players.insert(player.id, player);
    }

    /// Whether a player with this id is registered.
    #[must_use]
    pub fn contains(&self, id: PlayerId) -> bool {
        self.players.contains_key(&id)
    }

    /// Get a player by id.
    #[must_use]
    pub fn get(&self, id: PlayerId) -> Option<&Player> {
        self.players.get(&id)
    }

    /// Get a mutable reference to a player by id.
    #[must_use]
    pub fn get_mut(&mut self, id: PlayerId) -> Option<&mut Player> {
        self.players.get_mut(&id)
    }

    /// Iterate players in id order.
    pub fn iter(&self) -> impl Iterator<Item = &Player> {
        self.players.values()
    }

    /// Iterate players mutably in id order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Player> {
        self.players.values_mut()
    }

    /// Number of registered players.
    #[must_use]
    pub fn len(&self) -> usize {
        self.players.len()
    }

    /// Whether no players are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    /// Attack power of a player, or [`DEFAULT_POWER`] if unknown.
    #[must_use]
    pub fn power_of(&self, id: PlayerId) -> u32 {
        if let Some(player) = self.players.get(&id) {
            player.power
        } else {
            warn!(player = id, "power lookup for unknown player, using default");
            DEFAULT_POWER
        }
    }

    /// Display name of a player, or `"Player <id>"` if unknown.
    #[must_use]
    pub fn name_of(&self, id: PlayerId) -> String {
        self.players
            .get(&id)
            .map_or_else(|| format!("Player {id}"), |p| p.name.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_player_creation() {
        let player = Player::new(1, "alice");
        assert_eq!(player.id, 1);
        assert_eq!(player.name, "alice");
        assert_eq!(player.power, DEFAULT_POWER);
        assert!(player.active_skill.is_none());
        assert!(!player.eliminated);
        assert!(!player.spawned);
    }

    #[test]
    fn test_player_eliminate_clears_skill() {
        let mut player = Player::new(2, "bob");
        player.active_skill = Some(Skill::Emp);
        player.eliminate();
        assert!(player.eliminated);
        assert!(player.active_skill.is_none());
    }

    #[test]
    fn test_roster_lookups() {
        let mut roster = Roster::new();
        assert!(roster.is_empty());

        let mut p = Player::new(3, "carol");
        p.power = 25;
        roster.insert(p);

        assert!(roster.contains(3));
        assert_eq!(roster.power_of(3), 25);
        assert_eq!(roster.power_of(4), DEFAULT_POWER);
        assert_eq!(roster.name_of(3), "carol");
        assert_eq!(roster.name_of(4), "Player 4");
        assert_eq!(roster.len(), 1);
    }

    #[test]
    fn test_roster_iterates_in_id_order() {
        let mut roster = Roster::new();
        for id in [4, 1, 3] {
            roster.insert(Player::new(id, format!("p{id}")));
        }
        let ids: Vec<_> = roster.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![1, 3, 4]);
    }
}
