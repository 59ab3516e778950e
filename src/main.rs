mod app;
mod auth;
mod common;
mod config;
mod db;
mod error;
mod extract;
mod items;
mod mail;
mod private;
mod state;
mod users;
mod utils;
mod validation;

use crate::{config::AppConfig, state::AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "itemvault=debug,axum=info,tower_http=info".to_string());
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

    let config = AppConfig::from_env()?;
    tracing::info!(environment = ?config.environment, project = %config.project_name, "starting");

    let app_state = AppState::init(config).await?;
    db::migrate(&app_state).await?;
    db::init_db(&app_state).await?;

    app::serve(app::build_app(app_state)).await
}
