//! Team rosters.

use crate::error::GameError;
use crate::types::PlayerId;
use serde::{Deserialize, Serialize};

/// A named roster of players within one game.
///
/// Players are kept in join order. Variation between teams is data only: an
/// optional capacity and a spectator flag that predicates can select on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Team {
    name: String,
    capacity: Option<usize>,
    spectator: bool,
    players: Vec<PlayerId>,
}

impl Team {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            capacity: None,
            spectator: false,
            players: Vec::new(),
        }
    }

    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = Some(capacity);
        self
    }

    pub fn spectators(mut self) -> Self {
        self.spectator = true;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn capacity(&self) -> Option<usize> {
        self.capacity
    }

    pub fn is_spectator(&self) -> bool {
        self.spectator
    }

    pub fn players(&self) -> &[PlayerId] {
        &self.players
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.capacity
            .is_some_and(|capacity| self.players.len() >= capacity)
    }

    pub fn contains(&self, player: PlayerId) -> bool {
        self.players.contains(&player)
    }

    /// Case-insensitive name comparison.
    pub fn is_named(&self, name: &str) -> bool {
        self.name.to_lowercase() == name.to_lowercase()
    }

    pub(crate) fn add_player(&mut self, player: PlayerId) -> Result<(), GameError> {
        if self.contains(player) {
            return Err(GameError::AlreadyOnTeam {
                player,
                team: self.name.clone(),
            });
        }
        if let Some(capacity) = self.capacity {
            if self.players.len() >= capacity {
                return Err(GameError::TeamFull {
                    team: self.name.clone(),
                    capacity,
                });
            }
        }
        self.players.push(player);
        Ok(())
    }

    pub(crate) fn remove_player(&mut self, player: PlayerId) -> bool {
        let before = self.players.len();
        self.players.retain(|p| *p != player);
        self.players.len() != before
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capacity_enforced() {
        let mut team = Team::new("red").with_capacity(1);
        team.add_player(PlayerId::new()).unwrap();

        assert!(team.is_full());
        assert!(matches!(
            team.add_player(PlayerId::new()),
            Err(GameError::TeamFull { capacity: 1, .. })
        ));
    }

    #[test]
    fn test_join_order_preserved() {
        let mut team = Team::new("blue");
        let players: Vec<_> = (0..3).map(|_| PlayerId::new()).collect();
        for player in &players {
            team.add_player(*player).unwrap();
        }
        assert!(team.remove_player(players[1]));
        assert!(!team.remove_player(players[1]));
        assert_eq!(team.players(), &[players[0], players[2]]);
    }

    #[test]
    fn test_case_insensitive_name() {
        let team = Team::new("Red");
        assert!(team.is_named("red"));
        assert!(team.is_named("RED"));
        assert!(!team.is_named("blue"));
    }
}
