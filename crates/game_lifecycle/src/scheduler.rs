//! Per-game tick scheduler.
//!
//! Stages defer work by scheduling tasks a number of ticks ahead. The game's
//! owner drives time by calling [`Game::tick`](crate::Game::tick) from its
//! execution context; due tasks then run with exclusive access to the game.

use crate::error::GameError;
use crate::game::Game;
use crate::types::GameId;
use tracing::trace;

/// Deferred unit of work.
pub type ScheduledTask = Box<dyn FnOnce(&mut Game) -> Result<(), GameError> + Send>;

/// Identifies one scheduled task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskId(u64);

struct Entry {
    id: TaskId,
    due: u64,
    task: ScheduledTask,
}

/// Tick-based task queue owned by one game.
pub struct Scheduler {
    game_id: GameId,
    tick: u64,
    next_id: u64,
    entries: Vec<Entry>,
}

impl std::fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scheduler")
            .field("game_id", &self.game_id)
            .field("tick", &self.tick)
            .field("pending", &self.entries.len())
            .finish()
    }
}

impl Scheduler {
    pub fn new(game_id: GameId) -> Self {
        Self {
            game_id,
            tick: 0,
            next_id: 0,
            entries: Vec::new(),
        }
    }

    /// Runs `task` after `delay` ticks. A delay of zero runs on the next tick.
    /// Delays past the end of the tick range never come due.
    pub fn schedule<F>(&mut self, delay: u64, task: F) -> TaskId
    where
        F: FnOnce(&mut Game) -> Result<(), GameError> + Send + 'static,
    {
        let id = TaskId(self.next_id);
        self.next_id += 1;
        let due = self.tick.saturating_add(delay.max(1));
        trace!("Game {} scheduled task {:?} for tick {}", self.game_id, id, due);
        self.entries.push(Entry {
            id,
            due,
            task: Box::new(task),
        });
        id
    }

    pub fn cancel(&mut self, id: TaskId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|entry| entry.id != id);
        self.entries.len() != before
    }

    pub fn current_tick(&self) -> u64 {
        self.tick
    }

    pub fn pending(&self) -> usize {
        self.entries.len()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Advances one tick and takes every task now due, in scheduling order.
    pub(crate) fn advance(&mut self) -> Vec<ScheduledTask> {
        self.tick += 1;
        let tick = self.tick;
        let (due, waiting): (Vec<_>, Vec<_>) =
            self.entries.drain(..).partition(|entry| entry.due <= tick);
        self.entries = waiting;
        due.into_iter().map(|entry| entry.task).collect()
    }
}
