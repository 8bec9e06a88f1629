//! Error types for the lifecycle engine.
//!
//! Everything here is recoverable: callers decide whether to retry, report to
//! players or escalate with [`Game::crash`](crate::Game::crash). The one
//! unrecoverable path, a crash, unwinds with a [`GameCrash`] payload instead.

use crate::types::{GameId, GameState, PlayerId};
use position_schema::ResolutionError;

/// Errors raised by event handlers during dispatch.
#[derive(Debug, thiserror::Error)]
pub enum EventError {
    /// A handler rejected the event
    #[error("handler for {event} failed: {message}")]
    Handler { event: &'static str, message: String },
    /// A handler was invoked with an event of another type
    #[error("handler expected {expected}")]
    TypeMismatch { expected: &'static str },
    /// Serialization failed when converting an event to JSON
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl EventError {
    /// Convenience constructor for handler failures.
    pub fn handler<E>(message: impl Into<String>) -> Self {
        EventError::Handler {
            event: std::any::type_name::<E>(),
            message: message.into(),
        }
    }
}

/// Errors raised by stage factories and stage hooks.
#[derive(Debug, thiserror::Error)]
pub enum StageError {
    /// The stage cannot be built in the game's current shape
    #[error("stage cannot be created: {0}")]
    Unsatisfiable(String),
    /// A start or finish hook failed
    #[error("stage '{stage}' failed: {reason}")]
    Failed { stage: String, reason: String },
    #[error(transparent)]
    Event(#[from] EventError),
}

/// Errors returned by [`Game`](crate::Game) operations.
#[derive(Debug, thiserror::Error)]
pub enum GameError {
    #[error("game is {actual}, expected {expected}")]
    InvalidState {
        expected: GameState,
        actual: GameState,
    },
    #[error("game has reached a terminal state ({0})")]
    Terminated(GameState),
    #[error("no arena is bound to the game")]
    NoArenaBound,
    #[error("no more stages are queued")]
    NoMoreStages,
    #[error("team '{0}' is already registered")]
    DuplicateTeam(String),
    #[error("no team matches '{0}'")]
    TeamNotFound(String),
    #[error("team '{team}' is full ({capacity} players)")]
    TeamFull { team: String, capacity: usize },
    #[error("player {0} is not on any team")]
    PlayerNotOnTeam(PlayerId),
    #[error("player {player} is already on team '{team}'")]
    AlreadyOnTeam { player: PlayerId, team: String },
    #[error(transparent)]
    Stage(#[from] StageError),
    #[error(transparent)]
    Event(#[from] EventError),
    #[error(transparent)]
    Positions(#[from] ResolutionError),
}

/// Panic payload carried by a crashed game.
///
/// Supervisors running games under `std::panic::catch_unwind` can downcast
/// the payload to this type to learn which game crashed and why.
#[derive(Debug, Clone, PartialEq)]
pub struct GameCrash {
    pub game_id: GameId,
    pub reason: String,
}

impl std::fmt::Display for GameCrash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "game {} crashed: {}", self.game_id, self.reason)
    }
}
