use axum::{extract::State, routing::get, Json, Router};
use tracing::instrument;

use super::services::{dashboard, Dashboard};
use crate::{
    auth::extractors::AuthUser, error::MarketError, pipeline::stats::LocalCalendar,
    state::AppState,
};

pub fn dashboard_routes() -> Router<AppState> {
    Router::new().route("/dashboard", get(get_dashboard))
}

#[instrument(skip(state))]
pub async fn get_dashboard(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
) -> Result<Json<Dashboard>, MarketError> {
    let calendar = LocalCalendar::now(state.config.view.utc_offset);
    let board = dashboard(state.listings.as_ref(), state.users.as_ref(), &actor, &calendar).await?;
    Ok(Json(board))
}
