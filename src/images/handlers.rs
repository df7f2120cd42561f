use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use serde::Serialize;
use tracing::{instrument, warn};

use super::services::{upload_images, UploadItem};
use crate::{auth::extractors::AuthUser, error::MarketError, state::AppState};

const UPLOAD_FIELDS: [&str; 3] = ["file", "files", "files[]"];
const MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub urls: Vec<String>,
}

pub fn upload_routes() -> Router<AppState> {
    Router::new()
        .route("/uploads", post(upload))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
}

/// POST /uploads (multipart), one or more image parts.
#[instrument(skip(state, mp))]
pub async fn upload(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    mut mp: Multipart,
) -> Result<(StatusCode, Json<UploadResponse>), MarketError> {
    let mut files = Vec::new();
    while let Some(field) = mp.next_field().await.map_err(|e| {
        warn!(error = %e, "malformed multipart body");
        MarketError::validation("malformed multipart body")
    })? {
        if !field.name().is_some_and(|n| UPLOAD_FIELDS.contains(&n)) {
            continue;
        }
        let content_type = field
            .content_type()
            .map(str::to_string)
            .unwrap_or_else(|| "application/octet-stream".into());
        let body = field
            .bytes()
            .await
            .map_err(|_| MarketError::validation("could not read uploaded file"))?;
        files.push(UploadItem { body, content_type });
    }

    let urls = upload_images(state.storage.as_ref(), &actor, files).await?;
    Ok((StatusCode::CREATED, Json(UploadResponse { urls })))
}
