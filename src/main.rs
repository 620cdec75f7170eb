mod app;
mod auth;
mod config;
mod db;
mod error;
mod expenses;
mod state;
#[cfg(test)]
mod testing;

use std::time::Duration;

use crate::{config::AppConfig, state::AppState};

/// How often expired sessions are swept from memory.
const SESSION_REAP_INTERVAL: Duration = Duration::from_secs(5 * 60);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = AppConfig::from_env()?;
    let (host, port) = (config.host.clone(), config.port);

    let app_state = AppState::init(config).await?;
    let _reaper = app_state.sessions.spawn_reaper(SESSION_REAP_INTERVAL);

    app::serve(app::build_app(app_state), &host, port).await
}

fn init_tracing() {
    let env_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "expense_tracker=debug,axum=info,tower_http=info".to_string());
    let json_logs = std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }
}
