//! # Event Manager
//!
//! Publish/subscribe dispatcher for typed game events, scoped to a single
//! game instance.
//!
//! Dispatch is synchronous: [`EventManager::publish`] invokes every handler
//! registered for the event's exact type, in registration order, on the
//! calling thread. The first handler failure stops dispatch and is returned to
//! the publisher; publishing is not a failure boundary.
//!
//! Handlers receive the event and a shared reference to the publishing
//! [`Game`]. They can inspect the game but not mutate it, so a handler can
//! never start a stage transition from inside dispatch.
//!
//! ## Core Events
//!
//! - [`GameJoinEvent`] / [`GameLeaveEvent`] - roster changes
//! - [`StageStartEvent`] - a new stage became current
//! - [`GameEndEvent`] - `end()` was called, whether or not it succeeded
//! - [`GameCrashEvent`] - the game is crashing

use crate::error::EventError;
use crate::game::Game;
use crate::types::{GameId, PlayerId};
use dashmap::DashMap;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::any::{Any, TypeId};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, trace};

// ============================================================================
// Event Traits
// ============================================================================

/// Core trait that all events must implement.
///
/// Any type that is `Serialize + DeserializeOwned + Send + Sync + Debug`
/// implements it through the blanket implementation, so new events only need
/// the usual derives.
pub trait Event: Send + Sync + Any + std::fmt::Debug {
    /// Stable name of the event type, used in logs and errors.
    fn type_name() -> &'static str
    where
        Self: Sized;

    /// JSON form of the event, for forwarding to external listeners.
    fn to_json(&self) -> Result<String, EventError>;

    fn as_any(&self) -> &dyn Any;
}

impl<T> Event for T
where
    T: Serialize + DeserializeOwned + Send + Sync + Any + std::fmt::Debug + 'static,
{
    fn type_name() -> &'static str {
        std::any::type_name::<T>()
    }

    fn to_json(&self) -> Result<String, EventError> {
        serde_json::to_string(self).map_err(EventError::Serialization)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Identifies one handler registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Handler = Arc<dyn Fn(&dyn Any, &Game) -> Result<(), EventError> + Send + Sync>;

/// Statistics about dispatch activity.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct EventManagerStats {
    /// Total number of registered handlers
    pub total_handlers: usize,
    /// Total number of events published since creation
    pub events_published: u64,
}

// ============================================================================
// Event Manager
// ============================================================================

/// Per-game event dispatcher.
#[derive(Default)]
pub struct EventManager {
    handlers: DashMap<TypeId, Vec<(SubscriptionId, Handler)>>,
    next_id: AtomicU64,
    published: AtomicU64,
}

impl std::fmt::Debug for EventManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventManager")
            .field("stats", &self.stats())
            .finish()
    }
}

impl EventManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a handler for events of type `E`.
    ///
    /// Handlers for the same type run in the order they were subscribed.
    pub fn subscribe<E, F>(&self, handler: F) -> SubscriptionId
    where
        E: Event,
        F: Fn(&E, &Game) -> Result<(), EventError> + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let handler: Handler = Arc::new(move |event: &dyn Any, game: &Game| {
            match event.downcast_ref::<E>() {
                Some(event) => handler(event, game),
                None => Err(EventError::TypeMismatch {
                    expected: E::type_name(),
                }),
            }
        });

        self.handlers
            .entry(TypeId::of::<E>())
            .or_default()
            .push((id, handler));

        debug!("📝 Subscribed handler {:?} to {}", id, E::type_name());
        id
    }

    /// Removes a single registration. Returns `false` if it was already gone.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut removed = false;
        for mut entry in self.handlers.iter_mut() {
            let before = entry.len();
            entry.retain(|(sub, _)| *sub != id);
            if entry.len() != before {
                removed = true;
                break;
            }
        }
        self.handlers.retain(|_, handlers| !handlers.is_empty());
        removed
    }

    /// Invokes every handler registered for `E`.
    ///
    /// Handlers are snapshotted before dispatch, so a handler that subscribes
    /// or unsubscribes does not affect the event being dispatched.
    pub fn publish<E: Event>(&self, event: &E, game: &Game) -> Result<(), EventError> {
        self.published.fetch_add(1, Ordering::Relaxed);

        let handlers: Vec<Handler> = match self.handlers.get(&TypeId::of::<E>()) {
            Some(entry) => entry.iter().map(|(_, handler)| Arc::clone(handler)).collect(),
            None => {
                trace!("No handlers for {}", E::type_name());
                return Ok(());
            }
        };

        debug!("📤 Publishing {} to {} handlers", E::type_name(), handlers.len());
        for handler in handlers {
            handler(event.as_any(), game)?;
        }
        Ok(())
    }

    /// Number of handlers registered for `E`.
    pub fn handler_count<E: Event>(&self) -> usize {
        self.handlers
            .get(&TypeId::of::<E>())
            .map(|entry| entry.len())
            .unwrap_or(0)
    }

    pub fn stats(&self) -> EventManagerStats {
        EventManagerStats {
            total_handlers: self.handlers.iter().map(|entry| entry.len()).sum(),
            events_published: self.published.load(Ordering::Relaxed),
        }
    }
}

/// Subscriptions owned by one listener, usually a stage.
///
/// A stage subscribes through its scope in `on_start` and calls
/// [`release`](Self::release) from `unregister_listeners`. Releasing twice,
/// or releasing an empty scope, does nothing.
#[derive(Debug, Default)]
pub struct ListenerScope {
    subscriptions: Vec<SubscriptionId>,
}

impl ListenerScope {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe<E, F>(&mut self, events: &EventManager, handler: F) -> SubscriptionId
    where
        E: Event,
        F: Fn(&E, &Game) -> Result<(), EventError> + Send + Sync + 'static,
    {
        let id = events.subscribe(handler);
        self.subscriptions.push(id);
        id
    }

    /// Unsubscribes everything registered through this scope.
    /// Returns how many registrations were removed.
    pub fn release(&mut self, events: &EventManager) -> usize {
        self.subscriptions
            .drain(..)
            .filter(|id| events.unsubscribe(*id))
            .count()
    }

    pub fn len(&self) -> usize {
        self.subscriptions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscriptions.is_empty()
    }
}

// ============================================================================
// Game Events
// ============================================================================

/// A player joined one of the game's teams.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameJoinEvent {
    pub game_id: GameId,
    pub player_id: PlayerId,
    pub team: String,
}

/// A player left the game's roster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameLeaveEvent {
    pub game_id: GameId,
    pub player_id: PlayerId,
    pub team: String,
}

/// `end()` was called on the game.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameEndEvent {
    pub game_id: GameId,
}

/// The game is crashing and will not resume.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameCrashEvent {
    pub game_id: GameId,
    pub reason: String,
}

/// A stage is about to become current.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageStartEvent {
    pub game_id: GameId,
    /// Name of the incoming stage
    pub stage: String,
    /// Name of the outgoing stage, if any
    pub previous: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::GameRegistry;
    use parking_lot::Mutex;

    fn game() -> Game {
        Game::new("test", Arc::new(GameRegistry::new()))
    }

    fn end_event(game: &Game) -> GameEndEvent {
        GameEndEvent { game_id: game.id() }
    }

    #[test]
    fn test_handlers_run_in_registration_order() {
        let game = game();
        let events = EventManager::new();
        let order = Arc::new(Mutex::new(Vec::new()));
        for label in ["first", "second", "third"] {
            let order = Arc::clone(&order);
            events.subscribe(move |_: &GameEndEvent, _: &Game| {
                order.lock().push(label);
                Ok(())
            });
        }

        events.publish(&end_event(&game), &game).unwrap();

        assert_eq!(*order.lock(), vec!["first", "second", "third"]);
    }

    #[test]
    fn test_first_failure_stops_dispatch() {
        let game = game();
        let events = EventManager::new();
        let reached = Arc::new(Mutex::new(false));
        events.subscribe(|_: &GameEndEvent, _: &Game| Err(EventError::handler::<GameEndEvent>("refused")));
        let flag = Arc::clone(&reached);
        events.subscribe(move |_: &GameEndEvent, _: &Game| {
            *flag.lock() = true;
            Ok(())
        });

        let err = events.publish(&end_event(&game), &game).unwrap_err();

        assert!(matches!(err, EventError::Handler { .. }));
        assert!(!*reached.lock());
    }

    #[test]
    fn test_dispatch_is_by_exact_type() {
        let game = game();
        let events = EventManager::new();
        events.subscribe(|_: &GameCrashEvent, _: &Game| Err(EventError::handler::<GameCrashEvent>("wrong")));

        assert!(events.publish(&end_event(&game), &game).is_ok());
        assert_eq!(events.handler_count::<GameEndEvent>(), 0);
        assert_eq!(events.handler_count::<GameCrashEvent>(), 1);
    }

    #[test]
    fn test_unsubscribe() {
        let events = EventManager::new();
        let id = events.subscribe(|_: &GameEndEvent, _: &Game| Ok(()));
        events.subscribe(|_: &GameEndEvent, _: &Game| Ok(()));

        assert!(events.unsubscribe(id));
        assert!(!events.unsubscribe(id));
        assert_eq!(events.handler_count::<GameEndEvent>(), 1);
    }

    #[test]
    fn test_listener_scope_release_is_idempotent() {
        let events = EventManager::new();
        let mut scope = ListenerScope::new();
        scope.subscribe(&events, |_: &GameJoinEvent, _: &Game| Ok(()));
        scope.subscribe(&events, |_: &GameLeaveEvent, _: &Game| Ok(()));
        assert_eq!(scope.len(), 2);

        assert_eq!(scope.release(&events), 2);
        assert_eq!(scope.release(&events), 0);
        assert!(scope.is_empty());
        assert_eq!(events.stats().total_handlers, 0);
    }

    #[test]
    fn test_stats_count_publications() {
        let game = game();
        let events = EventManager::new();
        events.subscribe(|_: &GameEndEvent, _: &Game| Ok(()));
        events.publish(&end_event(&game), &game).unwrap();
        events.publish(&end_event(&game), &game).unwrap();

        assert_eq!(
            events.stats(),
            EventManagerStats {
                total_handlers: 1,
                events_published: 2,
            }
        );
    }

    #[test]
    fn test_event_json() {
        let event = StageStartEvent {
            game_id: GameId::new(),
            stage: "lobby".to_string(),
            previous: None,
        };
        let json = event.to_json().unwrap();
        let back: StageStartEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(back, event);
    }
}
