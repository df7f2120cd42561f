use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts},
};
use tracing::warn;

use super::claims::TokenKind;
use super::jwt::JwtKeys;
use crate::{access::Actor, error::MarketError, state::AppState};

/// The authenticated caller. The user is re-read on every request so a
/// changed role or a deleted account takes effect immediately.
pub struct AuthUser(pub Actor);

/// Like [`AuthUser`], but `None` when no Authorization header was sent.
pub struct MaybeAuthUser(pub Option<Actor>);

fn bearer(parts: &Parts) -> Result<Option<&str>, MarketError> {
    let Some(header) = parts.headers.get(AUTHORIZATION) else {
        return Ok(None);
    };
    let value = header.to_str().map_err(|_| MarketError::Unauthenticated)?;
    value
        .strip_prefix("Bearer ")
        .or_else(|| value.strip_prefix("bearer "))
        .map(Some)
        .ok_or(MarketError::Unauthenticated)
}

async fn resolve(token: &str, state: &AppState) -> Result<Actor, MarketError> {
    let keys = JwtKeys::from_ref(state);
    let claims = keys.verify(token).map_err(|e| {
        warn!(error = %e, "invalid or expired token");
        MarketError::Unauthenticated
    })?;
    if claims.kind != TokenKind::Access {
        warn!(user_id = %claims.sub, "refresh token used as access token");
        return Err(MarketError::Unauthenticated);
    }

    let user = state.users.find(claims.sub).await?.ok_or_else(|| {
        warn!(user_id = %claims.sub, "token for unknown user");
        MarketError::Unauthenticated
    })?;
    Ok(Actor::from(&user))
}

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = MarketError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = bearer(parts)?.ok_or(MarketError::Unauthenticated)?;
        Ok(AuthUser(resolve(token, state).await?))
    }
}

#[async_trait]
impl FromRequestParts<AppState> for MaybeAuthUser {
    type Rejection = MarketError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        match bearer(parts)? {
            Some(token) => Ok(MaybeAuthUser(Some(resolve(token, state).await?))),
            None => Ok(MaybeAuthUser(None)),
        }
    }
}
