use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, put},
    Json, Router,
};
use tracing::instrument;
use uuid::Uuid;

use super::dto::{AdminListingView, CreateListingRequest, ModerateListingRequest};
use super::moderation::{create_listing, delete_listing, moderate};
use super::repo_types::Listing;
use super::services::{
    admin_listing_view, export_listings, get_listing, listings_of_owner, public_catalogue,
};
use crate::{
    auth::extractors::{AuthUser, MaybeAuthUser},
    error::MarketError,
    extract::{JsonBody, PathParams, QueryParams},
    pipeline::{
        enrich::ListingView,
        export::CsvAttachment,
        query::{Page, ViewQuery},
        stats::{format_day, LocalCalendar},
    },
    state::AppState,
};

pub fn read_routes() -> Router<AppState> {
    Router::new()
        .route("/listings", get(catalogue).post(create))
        .route("/listings/:id", get(show))
        .route("/users/:id/listings", get(by_owner))
}

pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/admin/listings", get(admin_view))
        .route("/admin/listings/export", get(export))
        .route("/admin/listings/:id", put(update).delete(remove))
}

fn calendar(state: &AppState) -> LocalCalendar {
    LocalCalendar::now(state.config.view.utc_offset)
}

#[instrument(skip(state))]
pub async fn catalogue(
    State(state): State<AppState>,
    QueryParams(query): QueryParams<ViewQuery>,
) -> Result<Json<Page<ListingView>>, MarketError> {
    let page = public_catalogue(
        state.listings.as_ref(),
        state.users.as_ref(),
        &query,
        state.config.view.page_size,
    )
    .await?;
    Ok(Json(page))
}

#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    MaybeAuthUser(actor): MaybeAuthUser,
    PathParams(id): PathParams<Uuid>,
) -> Result<Json<Listing>, MarketError> {
    Ok(Json(get_listing(state.listings.as_ref(), actor.as_ref(), id).await?))
}

#[instrument(skip(state, payload))]
pub async fn create(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    JsonBody(payload): JsonBody<CreateListingRequest>,
) -> Result<(StatusCode, Json<Listing>), MarketError> {
    let listing = create_listing(state.listings.as_ref(), state.users.as_ref(), &actor, payload).await?;
    Ok((StatusCode::CREATED, Json(listing)))
}

#[instrument(skip(state))]
pub async fn by_owner(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    PathParams(owner_id): PathParams<Uuid>,
) -> Result<Json<Vec<Listing>>, MarketError> {
    Ok(Json(listings_of_owner(state.listings.as_ref(), &actor, owner_id).await?))
}

#[instrument(skip(state))]
pub async fn admin_view(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    QueryParams(query): QueryParams<ViewQuery>,
) -> Result<Json<AdminListingView>, MarketError> {
    let view = admin_listing_view(
        state.listings.as_ref(),
        state.users.as_ref(),
        &actor,
        &query,
        state.config.view.page_size,
        &calendar(&state),
    )
    .await?;
    Ok(Json(view))
}

#[instrument(skip(state, payload))]
pub async fn update(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    PathParams(id): PathParams<Uuid>,
    JsonBody(payload): JsonBody<ModerateListingRequest>,
) -> Result<Json<Listing>, MarketError> {
    Ok(Json(moderate(state.listings.as_ref(), &actor, id, payload).await?))
}

#[instrument(skip(state))]
pub async fn remove(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    PathParams(id): PathParams<Uuid>,
) -> Result<StatusCode, MarketError> {
    delete_listing(state.listings.as_ref(), &actor, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state))]
pub async fn export(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
) -> Result<CsvAttachment, MarketError> {
    let body = export_listings(state.listings.as_ref(), state.users.as_ref(), &actor).await?;
    Ok(CsvAttachment::new("listings", &format_day(calendar(&state).today), body))
}
