use std::collections::HashMap;

use serde::Serialize;
use uuid::Uuid;

use crate::listings::repo_types::Listing;
use crate::users::repo_types::User;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OwnerSummary {
    pub name: String,
    /// Left out of public catalogue responses.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// A listing joined with its owner's display fields.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ListingView {
    #[serde(flatten)]
    pub listing: Listing,
    /// `None` once the owner account has been deleted.
    pub owner: Option<OwnerSummary>,
}

pub fn enrich(listings: Vec<Listing>, users: &[User]) -> Vec<ListingView> {
    let owners: HashMap<Uuid, &User> = users.iter().map(|u| (u.id, u)).collect();
    listings
        .into_iter()
        .map(|listing| {
            let owner = owners.get(&listing.owner_id).map(|u| OwnerSummary {
                name: u.name.clone(),
                email: Some(u.email.clone()),
            });
            ListingView { listing, owner }
        })
        .collect()
}

impl ListingView {
    /// Drops the owner's contact details for anonymous readers.
    pub fn without_contact(mut self) -> Self {
        if let Some(owner) = self.owner.as_mut() {
            owner.email = None;
        }
        self
    }
}
