//! # Game
//!
//! The lifecycle state machine of one game session.
//!
//! A game is created in `STARTUP`, where teams, stages and an arena are
//! registered. [`Game::start`] activates the first queued stage and moves the
//! game to `ACTIVE`. From there stages advance with
//! [`Game::start_next_stage`] until the game is ended with [`Game::end`] or
//! aborted with [`Game::crash`]; both states are terminal.
//!
//! ## Stage transitions
//!
//! At most one stage is current. Replacing it always runs, in order:
//!
//! 1. `unregister_listeners()` on the outgoing stage (once per stage)
//! 2. `on_finish()` on the outgoing stage; on failure the transition aborts
//!    and the outgoing stage stays current
//! 3. the creator builds the incoming stage; on failure the creator is put
//!    back at the front of the queue
//! 4. a [`StageStartEvent`] is published
//! 5. the incoming stage becomes current and its `on_start()` runs once; a
//!    failure here is returned but the stage stays current
//!
//! ## Concurrency
//!
//! All mutation goes through `&mut self`, so one game is driven from one
//! execution context at a time. Independent games share nothing but the
//! [`GameRegistry`].

use crate::arena::Arena;
use crate::error::{EventError, GameCrash, GameError};
use crate::events::{
    Event, EventManager, GameCrashEvent, GameEndEvent, GameJoinEvent, GameLeaveEvent,
    StageStartEvent,
};
use crate::registry::{GameHandle, GameRegistry};
use crate::scheduler::Scheduler;
use crate::stage::{ActiveStage, Stage, StageContext, StageCreator};
use crate::team::Team;
use crate::types::{GameId, GameState, PlayerId};
use position_schema::{resolve_as, PositionData};
use std::collections::VecDeque;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

pub struct Game {
    id: GameId,
    game_type: String,
    state: GameState,
    pending: VecDeque<Box<dyn StageCreator>>,
    current: Option<ActiveStage>,
    arena: Option<Box<dyn Arena>>,
    teams: Vec<Team>,
    events: EventManager,
    scheduler: Scheduler,
    registry: Arc<GameRegistry>,
    handle: Arc<GameHandle>,
}

impl std::fmt::Debug for Game {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Game")
            .field("id", &self.id)
            .field("game_type", &self.game_type)
            .field("state", &self.state)
            .field("stage", &self.current_stage().map(|stage| stage.name()))
            .field("pending_stages", &self.pending.len())
            .field("arena", &self.arena.as_ref().map(|arena| arena.name()))
            .field("teams", &self.teams)
            .finish()
    }
}

impl Game {
    /// Creates a game in `STARTUP` with a fresh id and its own scheduler.
    pub fn new(game_type: impl Into<String>, registry: Arc<GameRegistry>) -> Self {
        let id = GameId::new();
        let game_type = game_type.into();
        debug!("🎮 Created game {} ({})", id, game_type);
        Self {
            id,
            handle: Arc::new(GameHandle::new(id, game_type.clone())),
            game_type,
            state: GameState::Startup,
            pending: VecDeque::new(),
            current: None,
            arena: None,
            teams: Vec::new(),
            events: EventManager::new(),
            scheduler: Scheduler::new(id),
            registry,
        }
    }

    pub fn id(&self) -> GameId {
        self.id
    }

    pub fn game_type(&self) -> &str {
        &self.game_type
    }

    pub fn state(&self) -> GameState {
        self.state
    }

    pub fn handle(&self) -> Arc<GameHandle> {
        Arc::clone(&self.handle)
    }

    pub fn registry(&self) -> &Arc<GameRegistry> {
        &self.registry
    }

    pub fn events(&self) -> &EventManager {
        &self.events
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut Scheduler {
        &mut self.scheduler
    }

    // ------------------------------------------------------------------
    // Registration
    // ------------------------------------------------------------------

    /// Adds a team. Names are unique per game, compared case-sensitively.
    pub fn register_team(&mut self, team: Team) -> Result<(), GameError> {
        if self.teams.iter().any(|existing| existing.name() == team.name()) {
            return Err(GameError::DuplicateTeam(team.name().to_string()));
        }
        debug!("Game {} registered team '{}'", self.id, team.name());
        self.teams.push(team);
        Ok(())
    }

    /// Appends a stage factory to the pending queue.
    pub fn register_stage<C: StageCreator + 'static>(&mut self, creator: C) {
        self.pending.push_back(Box::new(creator));
    }

    pub fn register_stages<I>(&mut self, creators: I)
    where
        I: IntoIterator<Item = Box<dyn StageCreator>>,
    {
        self.pending.extend(creators);
    }

    pub fn pending_stages(&self) -> usize {
        self.pending.len()
    }

    // ------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------

    /// Starts the first queued stage and moves the game to `ACTIVE`.
    ///
    /// The game joins its [`GameRegistry`] only once it is `ACTIVE`, so a
    /// failed start leaves no registry entry behind.
    ///
    /// # Errors
    ///
    /// - [`GameError::InvalidState`] unless the game is in `STARTUP`
    /// - [`GameError::NoArenaBound`] if no arena is bound; the stage queue is
    ///   left untouched
    /// - any error from [`start_next_stage`](Self::start_next_stage)
    ///
    /// On every error the game stays in `STARTUP`.
    pub fn start(&mut self) -> Result<(), GameError> {
        self.require_state(GameState::Startup)?;
        if self.arena.is_none() {
            warn!("⚠️ Game {} cannot start without an arena", self.id);
            return Err(GameError::NoArenaBound);
        }

        self.start_next_stage()?;

        self.set_state(GameState::Active);
        self.registry.register_game(Arc::clone(&self.handle));
        info!("🚀 Game {} ({}) is active", self.id, self.game_type);
        Ok(())
    }

    /// Replaces the current stage with the next queued one.
    ///
    /// Fails with [`GameError::NoMoreStages`] without touching anything when
    /// the queue is empty.
    pub fn start_next_stage(&mut self) -> Result<&dyn Stage, GameError> {
        self.require_live()?;
        let creator = self.pending.pop_front().ok_or(GameError::NoMoreStages)?;
        self.transition(creator, true)
    }

    /// Replaces the current stage with one built by `creator`, bypassing the
    /// queue.
    pub fn start_stage<C: StageCreator + 'static>(&mut self, creator: C) -> Result<&dyn Stage, GameError> {
        self.require_live()?;
        self.transition(Box::new(creator), false)
    }

    fn transition(
        &mut self,
        creator: Box<dyn StageCreator>,
        requeue: bool,
    ) -> Result<&dyn Stage, GameError> {
        if let Err(error) = self.finish_current() {
            if requeue {
                self.pending.push_front(creator);
            }
            return Err(error);
        }

        let created = {
            let previous = self.current.as_ref().map(|active| active.stage.as_ref());
            creator.create(&*self, previous)
        };
        let next = match created {
            Ok(stage) => stage,
            Err(error) => {
                warn!("⚠️ Game {} could not create its next stage: {}", self.id, error);
                if requeue {
                    self.pending.push_front(creator);
                }
                return Err(error.into());
            }
        };

        let event = StageStartEvent {
            game_id: self.id,
            stage: next.name().to_string(),
            previous: self.current_stage().map(|stage| stage.name().to_string()),
        };
        if let Err(error) = self.publish(&event) {
            if requeue {
                self.pending.push_front(creator);
            }
            return Err(error.into());
        }

        info!("🎬 Game {} entering stage '{}'", self.id, event.stage);
        let active = self.current.insert(ActiveStage::new(next));
        let mut ctx = StageContext {
            game_id: self.id,
            events: &self.events,
            scheduler: &mut self.scheduler,
            teams: &self.teams,
            arena: self.arena.as_deref(),
        };
        if let Err(error) = active.stage.on_start(&mut ctx) {
            warn!("⚠️ Stage '{}' failed to start in game {}: {}", event.stage, self.id, error);
            return Err(error.into());
        }
        Ok(active.stage.as_ref())
    }

    /// Releases the current stage's listeners and runs its finish hook, each
    /// at most once per stage.
    fn finish_current(&mut self) -> Result<(), GameError> {
        let Some(active) = self.current.as_mut() else {
            return Ok(());
        };

        if !active.listeners_released {
            active.stage.unregister_listeners(&self.events);
            active.listeners_released = true;
        }

        if !active.finished {
            let mut ctx = StageContext {
                game_id: self.id,
                events: &self.events,
                scheduler: &mut self.scheduler,
                teams: &self.teams,
                arena: self.arena.as_deref(),
            };
            if let Err(error) = active.stage.on_finish(&mut ctx) {
                warn!(
                    "⚠️ Stage '{}' failed to finish in game {}: {}",
                    active.stage.name(),
                    self.id,
                    error
                );
                return Err(error.into());
            }
            active.finished = true;
        }
        Ok(())
    }

    /// Ends the game.
    ///
    /// The [`GameEndEvent`] is published before the state is checked, so
    /// observers see it even when the call is rejected.
    pub fn end(&mut self) -> Result<(), GameError> {
        self.publish(&GameEndEvent { game_id: self.id })?;
        self.require_state(GameState::Active)?;

        self.set_state(GameState::Ended);
        self.scheduler.clear();
        self.release_arena();
        info!("🏁 Game {} ended", self.id);
        Ok(())
    }

    /// Aborts the game. Never returns.
    ///
    /// Publishes a [`GameCrashEvent`], releases the arena and logs the reason,
    /// then unwinds with a [`GameCrash`] payload. Cleanup is best effort: a
    /// failing crash handler is logged and does not stop the crash.
    ///
    /// Only an `ACTIVE` game moves to `CRASHED`; any other state is kept.
    pub fn crash(&mut self, reason: impl Into<String>) -> ! {
        let reason = reason.into();
        let event = GameCrashEvent {
            game_id: self.id,
            reason: reason.clone(),
        };
        if let Err(e) = self.publish(&event) {
            warn!("⚠️ Crash handler failed in game {}: {}", self.id, e);
        }

        self.release_arena();
        self.scheduler.clear();
        if self.state == GameState::Active {
            self.set_state(GameState::Crashed);
        }
        error!("💥 Game {} ({}) crashed: {}", self.id, self.game_type, reason);

        std::panic::panic_any(GameCrash {
            game_id: self.id,
            reason,
        })
    }

    /// Runs every scheduled task that is due on the next tick.
    ///
    /// Task failures are logged. Stops early if a task moves the game to a
    /// terminal state. Returns the number of tasks run.
    pub fn tick(&mut self) -> usize {
        let due = self.scheduler.advance();
        let mut ran = 0;
        for task in due {
            if self.state.is_terminal() {
                break;
            }
            if let Err(e) = task(&mut *self) {
                warn!("⚠️ Scheduled task failed in game {}: {}", self.id, e);
            }
            ran += 1;
        }
        ran
    }

    // ------------------------------------------------------------------
    // Arena
    // ------------------------------------------------------------------

    /// Binds `arena`, returning the previously bound one.
    ///
    /// The previous arena is handed back rather than freed. While the game is
    /// active the new arena's [`Arena::reseat`] hook receives every rostered
    /// player.
    pub fn change_arena(&mut self, mut arena: Box<dyn Arena>) -> Option<Box<dyn Arena>> {
        arena.bind(self.id);
        if self.state == GameState::Active {
            let players = self.players();
            arena.reseat(&players);
        }
        info!("🗺️ Game {} now plays in arena '{}'", self.id, arena.name());
        self.arena.replace(arena)
    }

    pub fn arena(&self) -> Result<&dyn Arena, GameError> {
        self.arena.as_deref().ok_or(GameError::NoArenaBound)
    }

    pub fn has_arena(&self) -> bool {
        self.arena.is_some()
    }

    /// Resolves typed position data from the bound arena's markers.
    pub fn positions<T: PositionData>(&self) -> Result<T, GameError> {
        Ok(resolve_as::<T>(self.arena()?.markers())?)
    }

    fn release_arena(&mut self) {
        if let Some(mut arena) = self.arena.take() {
            arena.free();
        }
    }

    // ------------------------------------------------------------------
    // Players and teams
    // ------------------------------------------------------------------

    /// Adds a player to the team with exactly this name.
    pub fn add_player(&mut self, player: PlayerId, team: &str) -> Result<(), GameError> {
        let index = self
            .teams
            .iter()
            .position(|candidate| candidate.name() == team)
            .ok_or_else(|| GameError::TeamNotFound(team.to_string()))?;
        self.join(player, index)
    }

    /// Adds a player to the first team, in registration order, accepted by
    /// `predicate`.
    pub fn add_player_matching<P>(&mut self, player: PlayerId, predicate: P) -> Result<(), GameError>
    where
        P: Fn(&Team) -> bool,
    {
        let index = self
            .teams
            .iter()
            .position(|team| predicate(team))
            .ok_or_else(|| GameError::TeamNotFound("<predicate>".to_string()))?;
        self.join(player, index)
    }

    fn join(&mut self, player: PlayerId, index: usize) -> Result<(), GameError> {
        if let Some(current) = self.team_of(player) {
            return Err(GameError::AlreadyOnTeam {
                player,
                team: current.name().to_string(),
            });
        }

        self.teams[index].add_player(player)?;
        let team = self.teams[index].name().to_string();
        self.registry.bind_player(player, self.id);
        debug!("👋 Player {} joined team '{}' in game {}", player, team, self.id);

        self.publish(&GameJoinEvent {
            game_id: self.id,
            player_id: player,
            team,
        })?;
        Ok(())
    }

    /// Removes a player from their team.
    ///
    /// Fails with [`GameError::PlayerNotOnTeam`], changing nothing, if the
    /// player is not rostered.
    pub fn remove_player(&mut self, player: PlayerId) -> Result<(), GameError> {
        let index = self
            .teams
            .iter()
            .position(|team| team.contains(player))
            .ok_or(GameError::PlayerNotOnTeam(player))?;

        self.teams[index].remove_player(player);
        let team = self.teams[index].name().to_string();
        self.registry.unbind_player(player, self.id);
        debug!("👋 Player {} left team '{}' in game {}", player, team, self.id);

        self.publish(&GameLeaveEvent {
            game_id: self.id,
            player_id: player,
            team,
        })?;
        Ok(())
    }

    /// Team lookup by name, ignoring case.
    pub fn team(&self, name: &str) -> Option<&Team> {
        self.teams.iter().find(|team| team.is_named(name))
    }

    pub fn team_of(&self, player: PlayerId) -> Option<&Team> {
        self.teams.iter().find(|team| team.contains(player))
    }

    /// Registration index of the team with exactly this name.
    pub fn team_index(&self, name: &str) -> Option<usize> {
        self.teams.iter().position(|team| team.name() == name)
    }

    pub fn teams(&self) -> &[Team] {
        &self.teams
    }

    pub fn team_count(&self) -> usize {
        self.teams.len()
    }

    /// Every rostered player, in team registration then join order.
    pub fn players(&self) -> Vec<PlayerId> {
        self.teams
            .iter()
            .flat_map(|team| team.players().iter().copied())
            .collect()
    }

    pub fn current_stage(&self) -> Option<&dyn Stage> {
        self.current.as_ref().map(|active| active.stage.as_ref())
    }

    pub fn current_stage_name(&self) -> Option<&str> {
        self.current_stage().map(|stage| stage.name())
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    fn publish<E: Event>(&self, event: &E) -> Result<(), EventError> {
        self.events.publish(event, self)
    }

    fn set_state(&mut self, state: GameState) {
        debug!("Game {} state {} -> {}", self.id, self.state, state);
        self.state = state;
        self.handle.set_state(state);
    }

    fn require_state(&self, expected: GameState) -> Result<(), GameError> {
        if self.state == expected {
            Ok(())
        } else {
            Err(GameError::InvalidState {
                expected,
                actual: self.state,
            })
        }
    }

    fn require_live(&self) -> Result<(), GameError> {
        if self.state.is_terminal() {
            Err(GameError::Terminated(self.state))
        } else {
            Ok(())
        }
    }
}
