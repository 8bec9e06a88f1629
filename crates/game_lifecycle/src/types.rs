//! # Core Type Definitions
//!
//! Identifiers and lifecycle states shared by every part of the engine.
//!
//! - [`PlayerId`] - Unique identifier for a player across all games
//! - [`GameId`] - Unique identifier for one game session
//! - [`GameState`] - Lifecycle state of a game session

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a player.
///
/// This is a wrapper around UUID that provides type safety and ensures
/// player IDs cannot be confused with game IDs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PlayerId(pub Uuid);

impl PlayerId {
    /// Creates a new random player ID using UUID v4.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl std::str::FromStr for PlayerId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

impl Default for PlayerId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for PlayerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque session identifier, generated when a game is constructed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GameId(pub Uuid);

impl GameId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for GameId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for GameId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle state of a game.
///
/// `Startup -> Active -> {Ended, Crashed}`. The last two are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameState {
    Startup,
    Active,
    Ended,
    Crashed,
}

impl GameState {
    pub fn is_terminal(self) -> bool {
        matches!(self, GameState::Ended | GameState::Crashed)
    }
}

impl std::fmt::Display for GameState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            GameState::Startup => "STARTUP",
            GameState::Active => "ACTIVE",
            GameState::Ended => "ENDED",
            GameState::Crashed => "CRASHED",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_player_id_roundtrip_from_str() {
        let id = PlayerId::new();
        let parsed: PlayerId = id.to_string().parse().unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn test_terminal_states() {
        assert!(!GameState::Startup.is_terminal());
        assert!(!GameState::Active.is_terminal());
        assert!(GameState::Ended.is_terminal());
        assert!(GameState::Crashed.is_terminal());
    }
}
