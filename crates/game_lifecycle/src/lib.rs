//! # Game Lifecycle
//!
//! Coordinates the lifecycle of a single multiplayer game session: an ordered
//! sequence of stages (lobby, countdown, combat, end, ...) from startup to
//! termination, with team membership, per-game event dispatch and binding to
//! a reusable arena.
//!
//! ## Architecture Overview
//!
//! - [`Game`] - the state machine driving stages, teams, players and arena
//! - [`Stage`] / [`StageCreator`] - one phase of a game and its factory
//! - [`EventManager`] - synchronous typed publish/subscribe, one per game
//! - [`Team`] - named roster with an optional capacity
//! - [`GameRegistry`] - process-wide game and player lookup tables
//! - [`Arena`] - contract with the external world provider
//! - [`Scheduler`] - per-game deferred work, driven by [`Game::tick`]
//!
//! Spatial requirements of a game type are declared with the
//! [`position_schema`] crate and resolved from the bound arena through
//! [`Game::positions`].
//!
//! ## Quick Start Example
//!
//! ```rust
//! use game_lifecycle::*;
//! use position_schema::{MarkerSet, Position};
//! use std::sync::Arc;
//!
//! struct Lobby {
//!     listeners: ListenerScope,
//! }
//!
//! impl Stage for Lobby {
//!     fn name(&self) -> &str {
//!         "lobby"
//!     }
//!
//!     fn on_start(&mut self, ctx: &mut StageContext<'_>) -> Result<(), StageError> {
//!         self.listeners.subscribe(ctx.events, |event: &GameJoinEvent, _game: &Game| {
//!             println!("{} joined {}", event.player_id, event.team);
//!             Ok(())
//!         });
//!         Ok(())
//!     }
//!
//!     fn unregister_listeners(&mut self, events: &EventManager) {
//!         self.listeners.release(events);
//!     }
//! }
//!
//! let registry = Arc::new(GameRegistry::new());
//! let mut game = Game::new("duel", Arc::clone(&registry));
//! game.register_team(Team::new("red")).unwrap();
//! game.register_stage(stage_fn(|_game, _previous| {
//!     Ok(Box::new(Lobby { listeners: ListenerScope::new() }) as Box<dyn Stage>)
//! }));
//!
//! let markers: MarkerSet = [("spawn.red", Position::new(0.0, 64.0, 0.0))].into_iter().collect();
//! game.change_arena(Box::new(TemplateArena::new("plains", markers)));
//! game.start().unwrap();
//!
//! game.add_player(PlayerId::new(), "red").unwrap();
//! assert_eq!(game.state(), GameState::Active);
//! ```

pub mod arena;
pub mod error;
pub mod events;
pub mod game;
pub mod registry;
pub mod scheduler;
pub mod stage;
pub mod team;
pub mod types;

pub use arena::{Arena, TemplateArena};
pub use error::{EventError, GameCrash, GameError, StageError};
pub use events::{
    Event, EventManager, EventManagerStats, GameCrashEvent, GameEndEvent, GameJoinEvent,
    GameLeaveEvent, ListenerScope, StageStartEvent, SubscriptionId,
};
pub use game::Game;
pub use registry::{GameHandle, GameRegistry};
pub use scheduler::{ScheduledTask, Scheduler, TaskId};
pub use stage::{stage_fn, Stage, StageContext, StageCreator};
pub use team::Team;
pub use types::{GameId, GameState, PlayerId};
