//! # Game Registry
//!
//! Process-wide table of running games and of which game each player is in.
//!
//! The registry is owned by the top-level server context and handed to every
//! game at construction, so tests can build an isolated registry per run.
//! It is safe for concurrent use from any number of games and from the
//! external dispatch layer.
//!
//! Games insert their own handle on `start()` but never remove it; removing
//! finished games is the job of an external reaper via
//! [`GameRegistry::remove_game`].

use crate::types::{GameId, GameState, PlayerId};
use dashmap::DashMap;
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::debug;

/// Externally visible view of one game.
///
/// The game keeps the state up to date on every transition.
#[derive(Debug)]
pub struct GameHandle {
    id: GameId,
    game_type: String,
    state: RwLock<GameState>,
}

impl GameHandle {
    pub fn new(id: GameId, game_type: impl Into<String>) -> Self {
        Self {
            id,
            game_type: game_type.into(),
            state: RwLock::new(GameState::Startup),
        }
    }

    pub fn id(&self) -> GameId {
        self.id
    }

    pub fn game_type(&self) -> &str {
        &self.game_type
    }

    pub fn state(&self) -> GameState {
        *self.state.read()
    }

    pub(crate) fn set_state(&self, state: GameState) {
        *self.state.write() = state;
    }
}

#[derive(Debug, Default)]
pub struct GameRegistry {
    games: DashMap<GameId, Arc<GameHandle>>,
    players: DashMap<PlayerId, GameId>,
}

impl GameRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_game(&self, handle: Arc<GameHandle>) {
        debug!("📝 Registered game {} ({})", handle.id(), handle.game_type());
        self.games.insert(handle.id(), handle);
    }

    /// Removes a game and every player mapped to it.
    pub fn remove_game(&self, id: GameId) -> Option<Arc<GameHandle>> {
        let (_, handle) = self.games.remove(&id)?;
        self.players.retain(|_, game| *game != id);
        debug!("🗑️ Removed game {}", id);
        Some(handle)
    }

    pub fn game(&self, id: GameId) -> Option<Arc<GameHandle>> {
        self.games.get(&id).map(|entry| Arc::clone(entry.value()))
    }

    pub fn contains_game(&self, id: GameId) -> bool {
        self.games.contains_key(&id)
    }

    /// Maps a player to a game, replacing any previous mapping.
    pub fn bind_player(&self, player: PlayerId, game: GameId) -> Option<GameId> {
        self.players.insert(player, game)
    }

    /// Drops the player's mapping if it still points at `game`.
    pub fn unbind_player(&self, player: PlayerId, game: GameId) -> bool {
        self.players
            .remove_if(&player, |_, current| *current == game)
            .is_some()
    }

    pub fn game_id_of(&self, player: PlayerId) -> Option<GameId> {
        self.players.get(&player).map(|entry| *entry.value())
    }

    pub fn game_of(&self, player: PlayerId) -> Option<Arc<GameHandle>> {
        self.game_id_of(player).and_then(|id| self.game(id))
    }

    /// Games not yet in a terminal state.
    pub fn active_games(&self) -> Vec<Arc<GameHandle>> {
        self.games
            .iter()
            .filter(|entry| !entry.value().state().is_terminal())
            .map(|entry| Arc::clone(entry.value()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.games.len()
    }

    pub fn is_empty(&self) -> bool {
        self.games.is_empty()
    }

    pub fn player_count(&self) -> usize {
        self.players.len()
    }
}
