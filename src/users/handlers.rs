use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, put},
    Json, Router,
};
use tracing::instrument;
use uuid::Uuid;

use super::dto::{AdminUpdateUserRequest, AdminUserView};
use super::repo_types::User;
use super::services::{admin_delete_user, admin_update_user, admin_user_view, export_users};
use crate::{
    auth::extractors::AuthUser,
    error::MarketError,
    extract::{JsonBody, PathParams, QueryParams},
    pipeline::{
        export::CsvAttachment,
        query::ViewQuery,
        stats::{format_day, LocalCalendar},
    },
    state::AppState,
};

pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/admin/users", get(admin_view))
        .route("/admin/users/export", get(export))
        .route("/admin/users/:id", put(update).delete(remove))
}

#[instrument(skip(state))]
pub async fn admin_view(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    QueryParams(query): QueryParams<ViewQuery>,
) -> Result<Json<AdminUserView>, MarketError> {
    let calendar = LocalCalendar::now(state.config.view.utc_offset);
    let view = admin_user_view(
        state.users.as_ref(),
        &actor,
        &query,
        state.config.view.page_size,
        &calendar,
    )
    .await?;
    Ok(Json(view))
}

#[instrument(skip(state, payload))]
pub async fn update(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    PathParams(id): PathParams<Uuid>,
    JsonBody(payload): JsonBody<AdminUpdateUserRequest>,
) -> Result<Json<User>, MarketError> {
    Ok(Json(admin_update_user(state.users.as_ref(), &actor, id, payload).await?))
}

#[instrument(skip(state))]
pub async fn remove(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    PathParams(id): PathParams<Uuid>,
) -> Result<StatusCode, MarketError> {
    admin_delete_user(state.users.as_ref(), &actor, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state))]
pub async fn export(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
) -> Result<CsvAttachment, MarketError> {
    let body = export_users(state.users.as_ref(), &actor).await?;
    let today = LocalCalendar::now(state.config.view.utc_offset).today;
    Ok(CsvAttachment::new("users", &format_day(today), body))
}
