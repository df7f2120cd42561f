use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::error::MarketError;

/// Moderation state of a listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListingStatus {
    Pending,
    Approved,
    Rejected,
}

impl ListingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ListingStatus::Pending => "pending",
            ListingStatus::Approved => "approved",
            ListingStatus::Rejected => "rejected",
        }
    }
}

impl std::fmt::Display for ListingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ListingStatus {
    type Err = MarketError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(ListingStatus::Pending),
            "approved" => Ok(ListingStatus::Approved),
            "rejected" => Ok(ListingStatus::Rejected),
            other => Err(MarketError::validation(format!("unknown status '{other}'"))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Listing {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub price: f64,
    pub category: String,
    pub owner_id: Uuid,
    pub status: ListingStatus,
    pub message: String,
    pub images: Vec<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(Debug, FromRow)]
pub struct ListingRow {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub price: f64,
    pub category: String,
    pub owner_id: Uuid,
    pub status: String,
    pub message: String,
    pub images: Vec<String>,
    pub created_at: OffsetDateTime,
}

impl TryFrom<ListingRow> for Listing {
    type Error = MarketError;

    fn try_from(r: ListingRow) -> Result<Self, Self::Error> {
        let status = r.status.parse().map_err(|_| {
            MarketError::Store(format!("listing {} has unknown status '{}'", r.id, r.status))
        })?;
        Ok(Self {
            id: r.id,
            name: r.name,
            description: r.description,
            price: r.price,
            category: r.category,
            owner_id: r.owner_id,
            status,
            message: r.message,
            images: r.images,
            created_at: r.created_at,
        })
    }
}

/// A validated submission. It carries no status or message: the store
/// always writes `pending` and an empty message.
#[derive(Debug, Clone, PartialEq)]
pub struct NewListing {
    pub name: String,
    pub description: String,
    pub price: f64,
    pub category: String,
    pub owner_id: Uuid,
    pub images: Vec<String>,
}

/// Admin-side partial update.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListingChanges {
    pub name: Option<String>,
    pub category: Option<String>,
    pub price: Option<f64>,
    pub status: Option<ListingStatus>,
    pub message: Option<String>,
}

impl ListingChanges {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.category.is_none()
            && self.price.is_none()
            && self.status.is_none()
            && self.message.is_none()
    }

    pub fn apply(self, listing: &mut Listing) {
        if let Some(name) = self.name {
            listing.name = name;
        }
        if let Some(category) = self.category {
            listing.category = category;
        }
        if let Some(price) = self.price {
            listing.price = price;
        }
        if let Some(status) = self.status {
            listing.status = status;
        }
        if let Some(message) = self.message {
            listing.message = message;
        }
    }
}
