mod access;
mod app;
mod auth;
mod config;
mod dashboard;
mod error;
mod extract;
#[cfg(test)]
mod fixtures;
mod images;
mod listings;
mod pipeline;
mod state;
mod storage;
mod users;

use tracing::{info, warn};

fn init_tracing() {
    let env_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "bazaar=debug,axum=info,tower_http=info".to_string());
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

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let state = state::AppState::init().await?;

    if let Some(admin) = &state.config.admin {
        match auth::services::bootstrap_admin(state.users.as_ref(), admin).await {
            Ok(Some(user)) => info!(user_id = %user.id, "admin account provisioned"),
            Ok(None) => {}
            Err(e) => warn!(error = %e, "could not provision admin account"),
        }
    }

    app::serve(app::build_app(state)).await
}
