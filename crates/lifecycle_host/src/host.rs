//! Template checks and session rehearsal.
//!
//! The host registers every configured game-type schema, validates each arena
//! template against its schema and, for every template that passes, builds
//! the configured roster into a real game session to prove that the roster,
//! the stages and the arena bind together.

use crate::config::{AppConfig, ArenaEntry};
use game_lifecycle::{
    stage_fn, EventManager, Game, GameError, GameId, GameJoinEvent, GameRegistry, ListenerScope,
    Stage, StageContext, StageError, Team, TemplateArena,
};
use position_schema::{SchemaError, SchemaRegistry, ValidationError};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Outcome of checking one arena template.
#[derive(Debug, Clone, PartialEq)]
pub struct TemplateReport {
    pub arena: String,
    pub game_type: String,
    /// Every rule the template fails, in schema order
    pub failures: Vec<ValidationError>,
}

impl TemplateReport {
    pub fn is_valid(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Summary of a session that was started and ended cleanly.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSummary {
    pub game_id: GameId,
    pub arena: String,
    pub teams: Vec<String>,
    pub first_stage: String,
}

/// Waiting room every rehearsed session starts in.
struct LobbyStage {
    listeners: ListenerScope,
}

impl Stage for LobbyStage {
    fn name(&self) -> &str {
        "lobby"
    }

    fn on_start(&mut self, ctx: &mut StageContext<'_>) -> Result<(), StageError> {
        debug!("Lobby open in game {} with {} teams", ctx.game_id, ctx.teams.len());
        self.listeners
            .subscribe(ctx.events, |event: &GameJoinEvent, _game: &Game| {
                info!("👋 {} joined '{}' in the lobby", event.player_id, event.team);
                Ok(())
            });
        Ok(())
    }

    fn unregister_listeners(&mut self, events: &EventManager) {
        self.listeners.release(events);
    }
}

pub struct Host {
    config: AppConfig,
    schemas: SchemaRegistry,
    games: Arc<GameRegistry>,
}

impl Host {
    /// Registers every configured schema.
    ///
    /// Fails on the first malformed schema, naming the offending slot.
    pub fn new(config: AppConfig) -> Result<Self, SchemaError> {
        let schemas = SchemaRegistry::new();
        for entry in &config.schemas {
            schemas.register(&entry.game_type, &entry.schema)?;
        }
        Ok(Self {
            config,
            schemas,
            games: Arc::new(GameRegistry::new()),
        })
    }

    /// Validates every arena template, reporting each failing rule.
    pub fn check_templates(&self) -> Vec<TemplateReport> {
        self.config
            .arenas
            .iter()
            .map(|arena| {
                let report = TemplateReport {
                    arena: arena.name.clone(),
                    game_type: arena.game_type.clone(),
                    failures: self
                        .schemas
                        .validate_all(&arena.game_type, &arena.markers)
                        .err()
                        .unwrap_or_default(),
                };
                if report.is_valid() {
                    info!("✅ Arena '{}' satisfies '{}'", report.arena, report.game_type);
                }
                for failure in &report.failures {
                    warn!("❌ Arena '{}' ({}): {}", report.arena, report.game_type, failure);
                }
                report
            })
            .collect()
    }

    /// Builds a game in `STARTUP` with the configured roster, a lobby stage
    /// and `arena` bound.
    pub fn build_session(&self, arena: &ArenaEntry) -> Result<Game, GameError> {
        let mut game = Game::new(arena.game_type.clone(), Arc::clone(&self.games));

        for entry in &self.config.teams {
            let mut team = Team::new(entry.name.clone());
            if let Some(capacity) = entry.capacity.or(self.config.engine.default_team_capacity) {
                team = team.with_capacity(capacity);
            }
            if entry.spectator {
                team = team.spectators();
            }
            game.register_team(team)?;
        }

        game.register_stage(stage_fn(|_game, _previous| {
            Ok(Box::new(LobbyStage {
                listeners: ListenerScope::new(),
            }) as Box<dyn Stage>)
        }));
        game.change_arena(Box::new(TemplateArena::new(
            arena.name.clone(),
            arena.markers.clone(),
        )));
        Ok(game)
    }

    /// Starts and ends a session in `arena`, then drops it from the registry.
    pub fn rehearse(&self, arena: &ArenaEntry) -> Result<SessionSummary, GameError> {
        let mut game = self.build_session(arena)?;
        let outcome = game.start().and_then(|()| {
            let summary = SessionSummary {
                game_id: game.id(),
                arena: arena.name.clone(),
                teams: game.teams().iter().map(|team| team.name().to_string()).collect(),
                first_stage: game.current_stage_name().unwrap_or_default().to_string(),
            };
            game.end()?;
            Ok(summary)
        });
        self.games.remove_game(game.id());

        outcome
    }

    /// Rehearses a session for every template in `reports` that passed.
    pub fn rehearse_valid(&self, reports: &[TemplateReport]) -> Result<Vec<SessionSummary>, GameError> {
        self.config
            .arenas
            .iter()
            .filter(|arena| {
                reports
                    .iter()
                    .any(|report| report.arena == arena.name && report.is_valid())
            })
            .map(|arena| self.rehearse(arena))
            .collect()
    }
}
