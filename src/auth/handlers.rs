use axum::{
    extract::{FromRef, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument, warn};

use crate::{
    auth::{
        dto::{AuthResponse, LoginRequest, RefreshRequest, RegisterRequest, UpdateProfileRequest},
        extractors::AuthUser,
        jwt::JwtKeys,
        services,
    },
    error::{MarketError, MarketResult},
    extract::JsonBody,
    state::AppState,
    users::{
        repo_types::User,
        services::{get_profile, update_profile},
    },
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/refresh", post(refresh))
}

pub fn me_routes() -> Router<AppState> {
    Router::new().route("/me", get(get_me).put(update_me))
}

fn issue_tokens(state: &AppState, user: User) -> MarketResult<AuthResponse> {
    let keys = JwtKeys::from_ref(state);
    Ok(AuthResponse {
        access_token: keys.sign_access(user.id, user.role)?,
        refresh_token: keys.sign_refresh(user.id, user.role)?,
        user,
    })
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), MarketError> {
    let user = services::register(state.users.as_ref(), payload).await?;
    Ok((StatusCode::CREATED, Json(issue_tokens(&state, user)?)))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<LoginRequest>,
) -> Result<Json<AuthResponse>, MarketError> {
    let user = services::login(state.users.as_ref(), &payload.email, &payload.password).await?;
    Ok(Json(issue_tokens(&state, user)?))
}

/// Trades a refresh token for a new pair. The user is re-read so the new
/// tokens carry the current role.
#[instrument(skip(state, payload))]
pub async fn refresh(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<RefreshRequest>,
) -> Result<Json<AuthResponse>, MarketError> {
    let claims = JwtKeys::from_ref(&state)
        .verify_refresh(&payload.refresh_token)
        .map_err(|e| {
            warn!(error = %e, "refresh rejected");
            MarketError::Unauthenticated
        })?;

    let user = state
        .users
        .find(claims.sub)
        .await?
        .ok_or(MarketError::Unauthenticated)?;
    info!(user_id = %user.id, "tokens refreshed");
    Ok(Json(issue_tokens(&state, user)?))
}

#[instrument(skip(state))]
pub async fn get_me(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
) -> Result<Json<User>, MarketError> {
    Ok(Json(get_profile(state.users.as_ref(), &actor).await?))
}

#[instrument(skip(state, payload))]
pub async fn update_me(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    JsonBody(payload): JsonBody<UpdateProfileRequest>,
) -> Result<Json<User>, MarketError> {
    Ok(Json(update_profile(state.users.as_ref(), &actor, payload).await?))
}
