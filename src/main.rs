use std::sync::Arc;

use anyhow::{Context, Result};

use simple_bank::account::Database;
use simple_bank::config::AppConfig;
use simple_bank::gateway::{self, state::AppState};
use simple_bank::ledger::{PgStore, TransferEngine};
use simple_bank::token;

fn get_env() -> String {
    let args: Vec<String> = std::env::args().collect();
    for i in 0..args.len() {
        if (args[i] == "--env" || args[i] == "-e") && i + 1 < args.len() {
            return args[i + 1].clone();
        }
    }
    "dev".to_string()
}

/// Get port override from command line (--port argument)
fn get_port_override() -> Option<u16> {
    let args: Vec<String> = std::env::args().collect();
    for i in 0..args.len() {
        if args[i] == "--port" && i + 1 < args.len() {
            return args[i + 1].parse().ok();
        }
    }
    None
}

#[tokio::main]
async fn main() -> Result<()> {
    let env = get_env();
    let app_config = AppConfig::load(&env)?;
    let _log_guard = simple_bank::logging::init_logging(&app_config)?;

    tracing::info!("Starting simple_bank in {} mode", env);

    let database_url = app_config.database_url()?;
    let db = Database::connect(&app_config.database, database_url)
        .await
        .context("Failed to connect to PostgreSQL")?;
    db.health_check().await.context("PostgreSQL health check failed")?;

    if app_config.database.run_migrations {
        db.migrate().await.context("Failed to run migrations")?;
    }

    let token_config = &app_config.token;
    let token_maker = token::new_maker(token_config.token_type, &token_config.symmetric_key)
        .context("Invalid token.symmetric_key")?;
    let access_token_duration =
        chrono::Duration::from_std(app_config.token.access_token_duration())
            .context("token.access_token_duration_secs out of range")?;

    let mut engine = TransferEngine::new(Arc::new(PgStore::new(db.pool().clone())));
    if let Some(timeout) = app_config.transfer.timeout() {
        engine = engine.with_timeout(timeout);
    }

    let state = Arc::new(AppState::new(db, engine, token_maker, access_token_duration));

    let port = get_port_override().unwrap_or(app_config.server.port);
    gateway::run_server(state, &app_config.server.host, port)
        .await
        .context("HTTP server failed")?;

    Ok(())
}
