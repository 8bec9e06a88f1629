//! Arena binding contract.
//!
//! Arenas are owned by the external world provider; the engine only binds
//! them, reads their markers and frees them when the game ends or crashes.

use crate::types::{GameId, PlayerId};
use position_schema::MarkerSet;
use tracing::debug;

/// A concrete spatial instance a game plays inside.
pub trait Arena: Send {
    fn name(&self) -> &str;

    /// Markers discovered when the arena's template was loaded.
    fn markers(&self) -> &MarkerSet;

    /// Called when the arena is bound to a game.
    fn bind(&mut self, game: GameId) {
        let _ = game;
    }

    /// Called once when the game ends or crashes. Never called on ordinary
    /// stage transitions.
    fn free(&mut self);

    /// Called when the arena replaces another while the game is active.
    /// Re-seating the online players is up to the world provider.
    fn reseat(&mut self, players: &[PlayerId]) {
        let _ = players;
    }
}

/// Arena backed directly by a loaded template's markers.
#[derive(Debug, Clone)]
pub struct TemplateArena {
    name: String,
    markers: MarkerSet,
    bound_to: Option<GameId>,
    freed: bool,
}

impl TemplateArena {
    pub fn new(name: impl Into<String>, markers: MarkerSet) -> Self {
        Self {
            name: name.into(),
            markers,
            bound_to: None,
            freed: false,
        }
    }

    pub fn bound_to(&self) -> Option<GameId> {
        self.bound_to
    }

    pub fn is_freed(&self) -> bool {
        self.freed
    }
}

impl Arena for TemplateArena {
    fn name(&self) -> &str {
        &self.name
    }

    fn markers(&self) -> &MarkerSet {
        &self.markers
    }

    fn bind(&mut self, game: GameId) {
        debug!("🗺️ Arena '{}' bound to game {}", self.name, game);
        self.bound_to = Some(game);
        self.freed = false;
    }

    fn free(&mut self) {
        debug!("🗺️ Arena '{}' freed", self.name);
        self.bound_to = None;
        self.freed = true;
    }
}
