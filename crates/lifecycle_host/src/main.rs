//! Lifecycle host entry point.
//!
//! Loads the configuration, registers the declared position schemas, checks
//! every arena template against its game type and rehearses a session in each
//! template that passes. Exits non-zero if any template fails.

mod cli;
mod config;
mod host;
mod logging;

use anyhow::{bail, Context, Result};
use cli::CliArgs;
use config::AppConfig;
use host::Host;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    let args = CliArgs::parse();

    let mut config = AppConfig::load_from_file(&args.config_path)
        .await
        .with_context(|| format!("loading {}", args.config_path.display()))?;
    if let Some(level) = args.log_level {
        config.logging.level = level;
    }
    if args.json_logs {
        config.logging.json_format = true;
    }
    config.validate()?;

    logging::setup_logging(&config.logging)?;
    info!("🚀 Lifecycle host v{}", env!("CARGO_PKG_VERSION"));
    info!(
        "📂 Config: {} | {} schemas | {} arenas | {} teams",
        args.config_path.display(),
        config.schemas.len(),
        config.arenas.len(),
        config.teams.len()
    );

    let host = Host::new(config).context("registering position schemas")?;
    let reports = host.check_templates();
    let sessions = host.rehearse_valid(&reports)?;
    for session in &sessions {
        info!(
            "🎮 Rehearsed game {} in '{}': {} teams, opened with '{}'",
            session.game_id,
            session.arena,
            session.teams.len(),
            session.first_stage
        );
    }

    let failed = reports.iter().filter(|report| !report.is_valid()).count();
    info!(
        "📊 {} templates checked, {} sessions rehearsed, {} failed",
        reports.len(),
        sessions.len(),
        failed
    );

    if failed > 0 {
        error!("❌ {} arena templates failed validation", failed);
        bail!("{failed} arena templates failed validation");
    }
    Ok(())
}
