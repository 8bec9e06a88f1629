//! # Stages
//!
//! A stage is one ordered phase of a game (lobby, countdown, combat, ...).
//! Stages are produced on demand by a [`StageCreator`] bound to the game and
//! the outgoing stage, so a factory can look at teams, the arena or the
//! previous stage's outcome before committing.
//!
//! ## Lifecycle
//!
//! A stage is created, started once, and finished at most once. It is never
//! reused across games or restarted. The engine guarantees that
//! [`Stage::unregister_listeners`] runs before the next stage's
//! [`Stage::on_start`], even when [`Stage::on_finish`] fails.

use crate::arena::Arena;
use crate::error::StageError;
use crate::events::EventManager;
use crate::game::Game;
use crate::scheduler::Scheduler;
use crate::team::Team;
use crate::types::GameId;

/// View of the game handed to stage hooks.
///
/// Hooks may subscribe to events and schedule deferred work, but cannot
/// trigger another stage transition while one is running.
pub struct StageContext<'a> {
    pub game_id: GameId,
    pub events: &'a EventManager,
    pub scheduler: &'a mut Scheduler,
    pub teams: &'a [Team],
    pub arena: Option<&'a dyn Arena>,
}

pub trait Stage: Send {
    /// Name used in logs and stage-start events.
    fn name(&self) -> &str;

    /// Called once when the stage becomes current.
    fn on_start(&mut self, ctx: &mut StageContext<'_>) -> Result<(), StageError>;

    /// Called once when the stage is replaced.
    fn on_finish(&mut self, ctx: &mut StageContext<'_>) -> Result<(), StageError> {
        let _ = ctx;
        Ok(())
    }

    /// Releases the stage's event subscriptions. Must be idempotent.
    fn unregister_listeners(&mut self, events: &EventManager);
}

/// Factory for the next stage of a game.
pub trait StageCreator: Send {
    fn create(&self, game: &Game, previous: Option<&dyn Stage>) -> Result<Box<dyn Stage>, StageError>;
}

impl<F> StageCreator for F
where
    F: Fn(&Game, Option<&dyn Stage>) -> Result<Box<dyn Stage>, StageError> + Send,
{
    fn create(&self, game: &Game, previous: Option<&dyn Stage>) -> Result<Box<dyn Stage>, StageError> {
        self(game, previous)
    }
}

/// Wraps a closure as a [`StageCreator`], pinning down its signature.
///
/// ```rust,ignore
/// game.register_stage(stage_fn(|game, _previous| {
///     if game.team_count() < 2 {
///         return Err(StageError::Unsatisfiable("need two teams".into()));
///     }
///     Ok(Box::new(CombatStage::default()))
/// }));
/// ```
pub fn stage_fn<F>(create: F) -> F
where
    F: Fn(&Game, Option<&dyn Stage>) -> Result<Box<dyn Stage>, StageError> + Send,
{
    create
}

/// Stage currently held by a game, with its teardown progress.
pub(crate) struct ActiveStage {
    pub(crate) stage: Box<dyn Stage>,
    pub(crate) listeners_released: bool,
    pub(crate) finished: bool,
}

impl ActiveStage {
    pub(crate) fn new(stage: Box<dyn Stage>) -> Self {
        Self {
            stage,
            listeners_released: false,
            finished: false,
        }
    }
}
