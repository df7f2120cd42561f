//! Listing lifecycle: submission, moderation and removal.
//!
//! A listing is born `pending` with an empty message. Only an admin moves it
//! afterwards, and may move it between any of the three states.

use tracing::{debug, info};
use uuid::Uuid;

use super::dto::{CreateListingRequest, ModerateListingRequest};
use super::repo::ListingStore;
use super::repo_types::{Listing, ListingChanges, NewListing};
use crate::access::{authorize, Actor, Operation};
use crate::error::{MarketError, MarketResult};
use crate::users::repo::UserStore;

fn required_text(value: Option<String>, field: &str) -> MarketResult<String> {
    match value.map(|v| v.trim().to_string()) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(MarketError::validation(format!("{field} is required"))),
    }
}

fn optional_text(value: Option<String>, field: &str) -> MarketResult<Option<String>> {
    value.map(|v| required_text(Some(v), field)).transpose()
}

fn finite_price(price: f64) -> MarketResult<f64> {
    if price.is_finite() {
        Ok(price)
    } else {
        Err(MarketError::validation("price must be a finite number"))
    }
}

/// Turns a raw submission into a [`NewListing`] owned by `ownerId` or, when
/// absent, by `default_owner`.
pub fn validate_submission(req: CreateListingRequest, default_owner: Uuid) -> MarketResult<NewListing> {
    if req.status.is_some() || req.message.is_some() || req.created_at.is_some() {
        debug!("ignoring client supplied status/message/createdAt");
    }

    let name = required_text(req.name, "name")?;
    let description = required_text(req.description, "description")?;
    let price = finite_price(
        req.price
            .ok_or_else(|| MarketError::validation("price is required"))?,
    )?;
    let category = required_text(req.category, "category")?;

    let images: Vec<String> = req
        .images
        .unwrap_or_default()
        .into_iter()
        .map(|url| url.trim().to_string())
        .collect();
    if images.is_empty() {
        return Err(MarketError::validation("at least one image is required"));
    }
    if images.iter().any(|url| url.is_empty()) {
        return Err(MarketError::validation("image urls must not be blank"));
    }

    Ok(NewListing {
        name,
        description,
        price,
        category,
        owner_id: req.owner_id.unwrap_or(default_owner),
        images,
    })
}

impl ModerateListingRequest {
    pub fn into_changes(self) -> MarketResult<ListingChanges> {
        let changes = ListingChanges {
            name: optional_text(self.name, "name")?,
            category: optional_text(self.category, "category")?,
            price: self.price.map(finite_price).transpose()?,
            status: self.status,
            message: self.message,
        };
        if changes.is_empty() {
            return Err(MarketError::validation("no fields to update"));
        }
        Ok(changes)
    }
}

pub async fn create_listing(
    listings: &dyn ListingStore,
    users: &dyn UserStore,
    actor: &Actor,
    req: CreateListingRequest,
) -> MarketResult<Listing> {
    let submission = validate_submission(req, actor.id)?;
    authorize(
        Some(actor),
        Operation::CreateListing {
            owner_id: submission.owner_id,
        },
    )?;

    if users.find(submission.owner_id).await?.is_none() {
        return Err(MarketError::NotFound("user", submission.owner_id));
    }

    let listing = listings.create(submission).await?;
    info!(listing_id = %listing.id, owner_id = %listing.owner_id, "listing submitted");
    Ok(listing)
}

pub async fn moderate(
    listings: &dyn ListingStore,
    actor: &Actor,
    id: Uuid,
    req: ModerateListingRequest,
) -> MarketResult<Listing> {
    authorize(Some(actor), Operation::ModerateListing)?;
    let changes = req.into_changes()?;

    let listing = listings
        .update(id, changes)
        .await?
        .ok_or(MarketError::NotFound("listing", id))?;
    info!(
        listing_id = %listing.id,
        admin_id = %actor.id,
        status = %listing.status,
        "listing moderated"
    );
    Ok(listing)
}

pub async fn delete_listing(listings: &dyn ListingStore, actor: &Actor, id: Uuid) -> MarketResult<()> {
    authorize(Some(actor), Operation::DeleteListing)?;
    if !listings.delete(id).await? {
        return Err(MarketError::NotFound("listing", id));
    }
    info!(listing_id = %id, admin_id = %actor.id, "listing deleted");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{actor_of, listing_request, seed_user, Stores};
    use crate::listings::repo_types::ListingStatus;
    use crate::users::repo_types::Role;

    #[tokio::test]
    async fn created_listing_is_pending_even_when_tampered() {
        let stores = Stores::new();
        let owner = seed_user(&stores.users, Role::Craftsman).await;

        let mut req = listing_request();
        req.status = Some(serde_json::json!("approved"));
        req.message = Some(serde_json::json!("approved by myself"));

        let listing = create_listing(&stores.listings, &stores.users, &actor_of(&owner), req)
            .await
            .unwrap();
        assert_eq!(listing.status, ListingStatus::Pending);
        assert_eq!(listing.message, "");
        assert_eq!(listing.owner_id, owner.id);
    }

    #[tokio::test]
    async fn empty_images_fail_validation_and_store_nothing() {
        let stores = Stores::new();
        let owner = seed_user(&stores.users, Role::Client).await;

        let mut req = listing_request();
        req.images = Some(vec![]);
        let result = create_listing(&stores.listings, &stores.users, &actor_of(&owner), req).await;

        assert!(matches!(result, Err(MarketError::Validation(_))));
        assert!(stores.listings.list_all().await.unwrap().is_empty());
    }

    #[test]
    fn each_required_field_is_checked() {
        let owner = Uuid::new_v4();
        let blank: [fn(&mut CreateListingRequest); 5] = [
            |r| r.name = Some("  ".into()),
            |r| r.description = None,
            |r| r.price = None,
            |r| r.category = Some(String::new()),
            |r| r.images = None,
        ];
        for strip in blank {
            let mut req = listing_request();
            strip(&mut req);
            assert!(matches!(
                validate_submission(req, owner),
                Err(MarketError::Validation(_))
            ));
        }
    }

    #[test]
    fn non_finite_price_is_rejected_but_zero_and_negative_pass() {
        let owner = Uuid::new_v4();
        for (price, ok) in [(f64::NAN, false), (f64::INFINITY, false), (0.0, true), (-3.0, true)] {
            let mut req = listing_request();
            req.price = Some(price);
            assert_eq!(validate_submission(req, owner).is_ok(), ok, "price {price}");
        }
    }

    #[tokio::test]
    async fn members_cannot_submit_for_someone_else() {
        let stores = Stores::new();
        let me = seed_user(&stores.users, Role::Client).await;
        let other = seed_user(&stores.users, Role::Craftsman).await;

        let mut req = listing_request();
        req.owner_id = Some(other.id);
        let result = create_listing(&stores.listings, &stores.users, &actor_of(&me), req).await;
        assert!(matches!(result, Err(MarketError::Unauthorized)));
    }

    #[tokio::test]
    async fn unknown_owner_is_not_found() {
        let stores = Stores::new();
        let admin = seed_user(&stores.users, Role::Admin).await;

        let mut req = listing_request();
        let ghost = Uuid::new_v4();
        req.owner_id = Some(ghost);
        let result = create_listing(&stores.listings, &stores.users, &actor_of(&admin), req).await;
        assert!(matches!(result, Err(MarketError::NotFound("user", id)) if id == ghost));
    }

    #[tokio::test]
    async fn admin_approves_someone_elses_listing() {
        let stores = Stores::new();
        let owner = seed_user(&stores.users, Role::Craftsman).await;
        let admin = seed_user(&stores.users, Role::Admin).await;
        let listing = create_listing(&stores.listings, &stores.users, &actor_of(&owner), listing_request())
            .await
            .unwrap();

        let req = ModerateListingRequest {
            status: Some(ListingStatus::Approved),
            message: Some("looks good".into()),
            ..Default::default()
        };
        let updated = moderate(&stores.listings, &actor_of(&admin), listing.id, req).await.unwrap();
        assert_eq!(updated.status, ListingStatus::Approved);
        assert_eq!(updated.message, "looks good");
        assert_eq!(updated.name, listing.name);

        // approved is not terminal
        let back = ModerateListingRequest {
            status: Some(ListingStatus::Pending),
            ..Default::default()
        };
        let reverted = moderate(&stores.listings, &actor_of(&admin), listing.id, back).await.unwrap();
        assert_eq!(reverted.status, ListingStatus::Pending);
        assert_eq!(reverted.message, "looks good");
    }

    #[tokio::test]
    async fn non_admins_cannot_moderate_or_delete_even_their_own() {
        let stores = Stores::new();
        let owner = seed_user(&stores.users, Role::Craftsman).await;
        let stranger = seed_user(&stores.users, Role::Client).await;
        let listing = create_listing(&stores.listings, &stores.users, &actor_of(&owner), listing_request())
            .await
            .unwrap();

        for who in [&owner, &stranger] {
            let req = ModerateListingRequest {
                status: Some(ListingStatus::Approved),
                ..Default::default()
            };
            let moderated = moderate(&stores.listings, &actor_of(who), listing.id, req).await;
            assert!(matches!(moderated, Err(MarketError::Unauthorized)));

            let deleted = delete_listing(&stores.listings, &actor_of(who), listing.id).await;
            assert!(matches!(deleted, Err(MarketError::Unauthorized)));
        }
        let stored = stores.listings.find(listing.id).await.unwrap().unwrap();
        assert_eq!(stored.status, ListingStatus::Pending);
    }

    #[tokio::test]
    async fn moderate_needs_a_field_and_an_existing_listing() {
        let stores = Stores::new();
        let admin = actor_of(&seed_user(&stores.users, Role::Admin).await);

        let empty = moderate(&stores.listings, &admin, Uuid::new_v4(), ModerateListingRequest::default()).await;
        assert!(matches!(empty, Err(MarketError::Validation(_))));

        let req = ModerateListingRequest {
            message: Some("hi".into()),
            ..Default::default()
        };
        let missing = moderate(&stores.listings, &admin, Uuid::new_v4(), req).await;
        assert!(matches!(missing, Err(MarketError::NotFound("listing", _))));
    }

    #[tokio::test]
    async fn deleting_missing_listing_is_not_found_and_changes_nothing() {
        let stores = Stores::new();
        let owner = seed_user(&stores.users, Role::Client).await;
        let admin = actor_of(&seed_user(&stores.users, Role::Admin).await);
        let kept = create_listing(&stores.listings, &stores.users, &actor_of(&owner), listing_request())
            .await
            .unwrap();

        let result = delete_listing(&stores.listings, &admin, Uuid::new_v4()).await;
        assert!(matches!(result, Err(MarketError::NotFound("listing", _))));
        assert_eq!(stores.listings.list_all().await.unwrap(), vec![kept.clone()]);

        delete_listing(&stores.listings, &admin, kept.id).await.unwrap();
        assert!(stores.listings.list_all().await.unwrap().is_empty());
    }
}
