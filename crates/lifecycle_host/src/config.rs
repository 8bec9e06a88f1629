//! Configuration management for the lifecycle host.
//!
//! The configuration declares the position schema of every game type, the
//! arena templates to check against them and the team roster each rehearsed
//! session is built with.

use position_schema::{MarkerSet, Position, SchemaDescription};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::info;

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid configuration file: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("failed to write default configuration: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Application configuration loaded from a TOML file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub logging: LoggingSettings,
    #[serde(default)]
    pub engine: EngineSettings,
    /// Position schema per game type
    #[serde(default)]
    pub schemas: Vec<SchemaEntry>,
    /// Arena templates checked at startup
    #[serde(default)]
    pub arenas: Vec<ArenaEntry>,
    /// Team roster of every rehearsed session
    #[serde(default)]
    pub teams: Vec<TeamEntry>,
}

/// Logging system configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Log level filter (trace, debug, info, warn, error)
    pub level: String,
    /// Whether to output logs in JSON format
    #[serde(default)]
    pub json_format: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineSettings {
    /// Capacity applied to teams that do not declare one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_team_capacity: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaEntry {
    pub game_type: String,
    pub schema: SchemaDescription,
}

/// An arena template and the markers discovered in it, in discovery order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArenaEntry {
    pub name: String,
    pub game_type: String,
    #[serde(default)]
    pub markers: MarkerSet,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamEntry {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capacity: Option<usize>,
    #[serde(default)]
    pub spectator: bool,
}

impl TeamEntry {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            capacity: None,
            spectator: false,
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        let duel = SchemaDescription::new("duel")
            .exact("red", "spawn.red")
            .exact("blue", "spawn.blue");
        let markers: MarkerSet = [
            ("spawn.red", Position::new(-16.0, 64.0, 0.0)),
            ("spawn.blue", Position::new(16.0, 64.0, 0.0)),
        ]
        .into_iter()
        .collect();

        Self {
            logging: LoggingSettings::default(),
            engine: EngineSettings {
                default_team_capacity: Some(8),
            },
            schemas: vec![SchemaEntry {
                game_type: "duel".to_string(),
                schema: duel,
            }],
            arenas: vec![ArenaEntry {
                name: "plains".to_string(),
                game_type: "duel".to_string(),
                markers,
            }],
            teams: vec![
                TeamEntry::new("red"),
                TeamEntry::new("blue"),
                TeamEntry {
                    spectator: true,
                    ..TeamEntry::new("spectators")
                },
            ],
        }
    }
}

impl AppConfig {
    /// Loads configuration from a TOML file.
    ///
    /// If the file doesn't exist, writes the default configuration to `path`
    /// and returns it.
    pub async fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let io_error = |source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        };

        if path.exists() {
            let content = tokio::fs::read_to_string(path).await.map_err(io_error)?;
            Ok(toml::from_str(&content)?)
        } else {
            let default_config = AppConfig::default();
            let toml_content = toml::to_string_pretty(&default_config)?;
            tokio::fs::write(path, toml_content).await.map_err(io_error)?;
            info!("📄 Created default configuration file: {}", path.display());
            Ok(default_config)
        }
    }

    /// Checks the configuration for internal consistency.
    ///
    /// Schema well-formedness is checked later, when schemas are registered.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !LOG_LEVELS.contains(&self.logging.level.as_str()) {
            return Err(ConfigError::Invalid(format!(
                "invalid log level: {}. Must be one of: {LOG_LEVELS:?}",
                self.logging.level
            )));
        }

        let mut game_types = HashSet::new();
        for entry in &self.schemas {
            if !game_types.insert(entry.game_type.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "game type '{}' declares more than one schema",
                    entry.game_type
                )));
            }
        }

        let mut team_names = HashSet::new();
        for team in &self.teams {
            if !team_names.insert(team.name.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "team '{}' is declared twice",
                    team.name
                )));
            }
        }

        if let Some(arena) = self
            .arenas
            .iter()
            .find(|arena| !game_types.contains(arena.game_type.as_str()))
        {
            return Err(ConfigError::Invalid(format!(
                "arena '{}' uses undeclared game type '{}'",
                arena.name, arena.game_type
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::{NamedTempFile, TempDir};
    use tokio::fs;

    #[test]
    fn test_app_config_default_is_valid() {
        let config = AppConfig::default();

        assert_eq!(config.logging.level, "info");
        assert!(!config.logging.json_format);
        assert_eq!(config.engine.default_team_capacity, Some(8));
        assert_eq!(config.teams.len(), 3);
        assert!(config.teams[2].spectator);
        assert_eq!(config.arenas[0].markers.len(), 2);
        assert!(config.validate().is_ok());
    }

    #[tokio::test]
    async fn test_load_from_nonexistent_file_writes_default() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("lifecycle.toml");

        let config = AppConfig::load_from_file(&path).await.unwrap();

        assert_eq!(config, AppConfig::default());
        assert!(path.exists());
        let reloaded = AppConfig::load_from_file(&path).await.unwrap();
        assert_eq!(reloaded, config);
    }

    #[tokio::test]
    async fn test_load_from_existing_file() {
        let toml_content = r#"
[logging]
level = "debug"
json_format = true

[engine]
default_team_capacity = 4

[[schemas]]
game_type = "ctf"

[schemas.schema]
name = "ctf"

[[schemas.schema.slots]]
name = "powerups"
suffix = ".powerup"
plural = true

[[schemas.schema.slots]]
name = "red"

[schemas.schema.slots.nested]
name = "base.red"
slots = [{ name = "flag", exact = "red.flag" }]

[[arenas]]
name = "canyon"
game_type = "ctf"
markers = [
    { name = "red.flag", position = { x = 1.0, y = 70.0, z = 3.0 } },
    { name = "north.powerup", position = { x = 0.0, y = 65.0, z = 40.0 } },
]

[[teams]]
name = "red"
capacity = 2

[[teams]]
name = "observers"
spectator = true
"#;

        let temp_file = NamedTempFile::new().unwrap();
        fs::write(temp_file.path(), toml_content).await.unwrap();

        let config = AppConfig::load_from_file(temp_file.path()).await.unwrap();

        assert_eq!(config.logging.level, "debug");
        assert!(config.logging.json_format);
        assert_eq!(config.engine.default_team_capacity, Some(4));

        let schema = &config.schemas[0].schema;
        assert_eq!(schema.slots.len(), 2);
        assert!(schema.slots[0].plural);
        assert!(schema.find_slot("red").is_some_and(|slot| slot.is_nested()));

        let arena = &config.arenas[0];
        assert_eq!(arena.markers.names().collect::<Vec<_>>(), vec!["red.flag", "north.powerup"]);
        assert_eq!(config.teams[0].capacity, Some(2));
        assert!(config.teams[1].spectator);
        assert!(config.validate().is_ok());
    }

    #[tokio::test]
    async fn test_load_invalid_toml() {
        let temp_file = NamedTempFile::new().unwrap();
        fs::write(temp_file.path(), "[logging\nlevel = ").await.unwrap();

        let result = AppConfig::load_from_file(temp_file.path()).await;

        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_validate_rejects_unknown_log_level() {
        let mut config = AppConfig::default();
        config.logging.level = "verbose".to_string();
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_validate_rejects_duplicate_team() {
        let mut config = AppConfig::default();
        config.teams.push(TeamEntry::new("red"));

        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("team 'red'"));
    }

    #[test]
    fn test_validate_rejects_undeclared_game_type() {
        let mut config = AppConfig::default();
        config.arenas[0].game_type = "koth".to_string();

        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("koth"));
    }
}
