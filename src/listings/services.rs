use uuid::Uuid;

use super::dto::AdminListingView;
use super::repo::ListingStore;
use super::repo_types::{Listing, ListingStatus};
use crate::access::{authorize, Actor, Operation};
use crate::error::{MarketError, MarketResult};
use crate::pipeline::{
    enrich::{enrich, ListingView},
    export::listings_csv,
    query::{filter, paginate, Page, ViewQuery},
    stats::{ListingStats, LocalCalendar},
};
use crate::users::repo::UserStore;

/// Approved listings, searchable and paginated, open to anonymous readers.
pub async fn public_catalogue(
    listings: &dyn ListingStore,
    users: &dyn UserStore,
    query: &ViewQuery,
    page_size: usize,
) -> MarketResult<Page<ListingView>> {
    authorize(None, Operation::BrowseCatalogue)?;
    let approved = listings.list_by_status(ListingStatus::Approved).await?;
    let owners = users.list_all().await?;
    let views = enrich(approved, &owners)
        .into_iter()
        .map(ListingView::without_contact)
        .collect();
    Ok(paginate(filter(views, &query.q), query.page, page_size))
}

pub async fn get_listing(
    listings: &dyn ListingStore,
    actor: Option<&Actor>,
    id: Uuid,
) -> MarketResult<Listing> {
    let listing = listings
        .find(id)
        .await?
        .ok_or(MarketError::NotFound("listing", id))?;
    authorize(
        actor,
        Operation::ReadListing {
            owner_id: listing.owner_id,
            status: listing.status,
        },
    )?;
    Ok(listing)
}

pub async fn listings_of_owner(
    listings: &dyn ListingStore,
    actor: &Actor,
    owner_id: Uuid,
) -> MarketResult<Vec<Listing>> {
    authorize(Some(actor), Operation::ListOwnerListings { owner_id })?;
    listings.find_by_owner(owner_id).await
}

async fn enriched_all(
    listings: &dyn ListingStore,
    users: &dyn UserStore,
) -> MarketResult<(Vec<Listing>, Vec<ListingView>)> {
    let all = listings.list_all().await?;
    let owners = users.list_all().await?;
    let views = enrich(all.clone(), &owners);
    Ok((all, views))
}

/// Admin table: statistics over the whole collection, one filtered page of
/// enriched rows.
pub async fn admin_listing_view(
    listings: &dyn ListingStore,
    users: &dyn UserStore,
    actor: &Actor,
    query: &ViewQuery,
    page_size: usize,
    calendar: &LocalCalendar,
) -> MarketResult<AdminListingView> {
    authorize(Some(actor), Operation::ListAllListings)?;
    let (all, views) = enriched_all(listings, users).await?;
    let stats = ListingStats::compute(&all, calendar);
    let page = paginate(filter(views, &query.q), query.page, page_size);
    Ok(AdminListingView { page, stats })
}

/// Full, unfiltered collection as CSV.
pub async fn export_listings(
    listings: &dyn ListingStore,
    users: &dyn UserStore,
    actor: &Actor,
) -> MarketResult<String> {
    authorize(Some(actor), Operation::ListAllListings)?;
    let (_, views) = enriched_all(listings, users).await?;
    Ok(listings_csv(&views))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{actor_of, seed_listing, seed_user, Stores};
    use crate::listings::repo_types::ListingChanges;
    use crate::users::repo_types::Role;
    use time::UtcOffset;

    async fn approve(stores: &Stores, id: Uuid) {
        let changes = ListingChanges {
            status: Some(ListingStatus::Approved),
            ..Default::default()
        };
        stores.listings.update(id, changes).await.unwrap();
    }

    #[tokio::test]
    async fn catalogue_shows_only_approved_without_owner_email() {
        let stores = Stores::new();
        let owner = seed_user(&stores.users, Role::Craftsman).await;
        let shown = seed_listing(&stores, &owner, "Wood table").await;
        seed_listing(&stores, &owner, "Wood chair").await;
        approve(&stores, shown.id).await;

        let page = public_catalogue(&stores.listings, &stores.users, &ViewQuery::default(), 8)
            .await
            .unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.items[0].listing.id, shown.id);
        let owner_summary = page.items[0].owner.as_ref().unwrap();
        assert_eq!(owner_summary.name, owner.name);
        assert_eq!(owner_summary.email, None);
    }

    #[tokio::test]
    async fn pending_listing_is_visible_to_owner_and_admin_only() {
        let stores = Stores::new();
        let owner = seed_user(&stores.users, Role::Client).await;
        let other = seed_user(&stores.users, Role::Client).await;
        let admin = seed_user(&stores.users, Role::Admin).await;
        let listing = seed_listing(&stores, &owner, "Kilim").await;

        assert!(get_listing(&stores.listings, Some(&actor_of(&owner)), listing.id).await.is_ok());
        assert!(get_listing(&stores.listings, Some(&actor_of(&admin)), listing.id).await.is_ok());
        assert!(matches!(
            get_listing(&stores.listings, Some(&actor_of(&other)), listing.id).await,
            Err(MarketError::Unauthorized)
        ));
        assert!(matches!(
            get_listing(&stores.listings, None, listing.id).await,
            Err(MarketError::Unauthenticated)
        ));

        approve(&stores, listing.id).await;
        assert!(get_listing(&stores.listings, None, listing.id).await.is_ok());
        assert!(matches!(
            get_listing(&stores.listings, None, Uuid::new_v4()).await,
            Err(MarketError::NotFound("listing", _))
        ));
    }

    #[tokio::test]
    async fn owner_listing_reads_are_scoped() {
        let stores = Stores::new();
        let owner = seed_user(&stores.users, Role::Craftsman).await;
        let other = seed_user(&stores.users, Role::Client).await;
        seed_listing(&stores, &owner, "one").await;
        seed_listing(&stores, &owner, "two").await;

        let mine = listings_of_owner(&stores.listings, &actor_of(&owner), owner.id).await.unwrap();
        assert_eq!(mine.len(), 2);
        let peek = listings_of_owner(&stores.listings, &actor_of(&other), owner.id).await;
        assert!(matches!(peek, Err(MarketError::Unauthorized)));
    }

    #[tokio::test]
    async fn admin_view_pages_filtered_rows_but_counts_everything() {
        let stores = Stores::new();
        let owner = seed_user(&stores.users, Role::Craftsman).await;
        let admin = seed_user(&stores.users, Role::Admin).await;
        for i in 0..10 {
            seed_listing(&stores, &owner, &format!("Wood item {i}")).await;
        }
        seed_listing(&stores, &owner, "Metal chair").await;

        let calendar = LocalCalendar::now(UtcOffset::UTC);
        let query = ViewQuery {
            q: "WOOD".into(),
            page: 2,
        };
        let view = admin_listing_view(&stores.listings, &stores.users, &actor_of(&admin), &query, 8, &calendar)
            .await
            .unwrap();

        assert_eq!(view.page.total, 10);
        assert_eq!(view.page.page_count, 2);
        assert_eq!(view.page.items.len(), 2);
        assert_eq!(view.stats.total, 11);
        assert_eq!(view.stats.by_status.pending, 11);
        assert_eq!(view.stats.by_day.len(), 7);
        assert!(view.page.items.iter().all(|v| v.owner.is_some()));
    }

    #[tokio::test]
    async fn admin_view_and_export_require_admin() {
        let stores = Stores::new();
        let member = actor_of(&seed_user(&stores.users, Role::Craftsman).await);
        let calendar = LocalCalendar::now(UtcOffset::UTC);

        let view = admin_listing_view(&stores.listings, &stores.users, &member, &ViewQuery::default(), 8, &calendar).await;
        assert!(matches!(view, Err(MarketError::Unauthorized)));
        let csv = export_listings(&stores.listings, &stores.users, &member).await;
        assert!(matches!(csv, Err(MarketError::Unauthorized)));
    }

    #[tokio::test]
    async fn export_covers_the_whole_collection() {
        let stores = Stores::new();
        let owner = seed_user(&stores.users, Role::Client).await;
        let admin = actor_of(&seed_user(&stores.users, Role::Admin).await);
        seed_listing(&stores, &owner, "a").await;
        seed_listing(&stores, &owner, "b").await;
        stores.users.delete(owner.id).await.unwrap();

        let csv = export_listings(&stores.listings, &stores.users, &admin).await.unwrap();
        assert_eq!(csv.lines().count(), 3);
        assert!(csv.lines().skip(1).all(|l| l.contains(r#","",""#)));
    }
}
