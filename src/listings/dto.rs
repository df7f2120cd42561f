use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::repo_types::ListingStatus;
use crate::pipeline::{enrich::ListingView, query::Page, stats::ListingStats};

/// Body of `POST /listings`.
///
/// Required fields are optional here so that a missing one is reported as a
/// validation error rather than a deserialization failure. `status`,
/// `message` and `createdAt` are accepted and discarded.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct CreateListingRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<f64>,
    pub category: Option<String>,
    /// Defaults to the acting user.
    pub owner_id: Option<Uuid>,
    pub images: Option<Vec<String>>,
    pub status: Option<serde_json::Value>,
    pub message: Option<serde_json::Value>,
    pub created_at: Option<serde_json::Value>,
}

/// Body of `PUT /admin/listings/:id`.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModerateListingRequest {
    pub status: Option<ListingStatus>,
    pub message: Option<String>,
    pub name: Option<String>,
    pub category: Option<String>,
    pub price: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct AdminListingView {
    #[serde(flatten)]
    pub page: Page<ListingView>,
    pub stats: ListingStats,
}
