use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use sqlx::PgPool;
use time::OffsetDateTime;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::repo_types::{Listing, ListingChanges, ListingRow, ListingStatus, NewListing};
use crate::error::MarketResult;

/// Persistence boundary for listings. Every listing method that returns a
/// collection orders it newest first.
#[async_trait]
pub trait ListingStore: Send + Sync {
    async fn find(&self, id: Uuid) -> MarketResult<Option<Listing>>;

    async fn find_by_owner(&self, owner_id: Uuid) -> MarketResult<Vec<Listing>>;

    async fn list_by_status(&self, status: ListingStatus) -> MarketResult<Vec<Listing>>;

    /// Stores the listing as `pending` with an empty message.
    async fn create(&self, new: NewListing) -> MarketResult<Listing>;

    async fn update(&self, id: Uuid, changes: ListingChanges) -> MarketResult<Option<Listing>>;

    async fn delete(&self, id: Uuid) -> MarketResult<bool>;

    async fn list_all(&self) -> MarketResult<Vec<Listing>>;
}

fn newest_first(listings: &mut [Listing]) {
    listings.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));
}

const LISTING_COLUMNS: &str =
    "id, name, description, price, category, owner_id, status, message, images, created_at";

#[derive(Clone)]
pub struct PgListingStore {
    db: PgPool,
}

impl PgListingStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    async fn fetch_many(&self, sql: &str, bind: Option<&str>) -> MarketResult<Vec<Listing>> {
        let mut query = sqlx::query_as::<_, ListingRow>(sql);
        if let Some(value) = bind {
            query = query.bind(value);
        }
        let rows = query.fetch_all(&self.db).await?;
        rows.into_iter().map(Listing::try_from).collect()
    }
}

#[async_trait]
impl ListingStore for PgListingStore {
    async fn find(&self, id: Uuid) -> MarketResult<Option<Listing>> {
        let row = sqlx::query_as::<_, ListingRow>(&format!(
            "SELECT {LISTING_COLUMNS} FROM listings WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        row.map(Listing::try_from).transpose()
    }

    async fn find_by_owner(&self, owner_id: Uuid) -> MarketResult<Vec<Listing>> {
        let rows = sqlx::query_as::<_, ListingRow>(&format!(
            "SELECT {LISTING_COLUMNS} FROM listings WHERE owner_id = $1 \
             ORDER BY created_at DESC, id ASC"
        ))
        .bind(owner_id)
        .fetch_all(&self.db)
        .await?;
        rows.into_iter().map(Listing::try_from).collect()
    }

    async fn list_by_status(&self, status: ListingStatus) -> MarketResult<Vec<Listing>> {
        let sql = format!(
            "SELECT {LISTING_COLUMNS} FROM listings WHERE status = $1 \
             ORDER BY created_at DESC, id ASC"
        );
        self.fetch_many(&sql, Some(status.as_str())).await
    }

    async fn create(&self, new: NewListing) -> MarketResult<Listing> {
        let row = sqlx::query_as::<_, ListingRow>(&format!(
            r#"
            INSERT INTO listings (id, name, description, price, category, owner_id, status, message, images)
            VALUES ($1, $2, $3, $4, $5, $6, 'pending', '', $7)
            RETURNING {LISTING_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(&new.name)
        .bind(&new.description)
        .bind(new.price)
        .bind(&new.category)
        .bind(new.owner_id)
        .bind(&new.images)
        .fetch_one(&self.db)
        .await?;
        Listing::try_from(row)
    }

    async fn update(&self, id: Uuid, changes: ListingChanges) -> MarketResult<Option<Listing>> {
        let row = sqlx::query_as::<_, ListingRow>(&format!(
            r#"
            UPDATE listings
               SET name     = COALESCE($2, name),
                   category = COALESCE($3, category),
                   price    = COALESCE($4, price),
                   status   = COALESCE($5, status),
                   message  = COALESCE($6, message)
             WHERE id = $1
            RETURNING {LISTING_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(changes.name)
        .bind(changes.category)
        .bind(changes.price)
        .bind(changes.status.map(|s| s.as_str()))
        .bind(changes.message)
        .fetch_optional(&self.db)
        .await?;
        row.map(Listing::try_from).transpose()
    }

    async fn delete(&self, id: Uuid) -> MarketResult<bool> {
        let result = sqlx::query("DELETE FROM listings WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_all(&self) -> MarketResult<Vec<Listing>> {
        let sql = format!("SELECT {LISTING_COLUMNS} FROM listings ORDER BY created_at DESC, id ASC");
        self.fetch_many(&sql, None).await
    }
}

#[derive(Debug, Default, Clone)]
pub struct InMemoryListingStore {
    listings: Arc<RwLock<HashMap<Uuid, Listing>>>,
}

impl InMemoryListingStore {
    pub fn new() -> Self {
        Self::default()
    }

    async fn collect(&self, keep: impl Fn(&Listing) -> bool) -> Vec<Listing> {
        let mut out: Vec<Listing> = self
            .listings
            .read()
            .await
            .values()
            .filter(|l| keep(l))
            .cloned()
            .collect();
        newest_first(&mut out);
        out
    }
}

#[async_trait]
impl ListingStore for InMemoryListingStore {
    async fn find(&self, id: Uuid) -> MarketResult<Option<Listing>> {
        Ok(self.listings.read().await.get(&id).cloned())
    }

    async fn find_by_owner(&self, owner_id: Uuid) -> MarketResult<Vec<Listing>> {
        Ok(self.collect(|l| l.owner_id == owner_id).await)
    }

    async fn list_by_status(&self, status: ListingStatus) -> MarketResult<Vec<Listing>> {
        Ok(self.collect(|l| l.status == status).await)
    }

    async fn create(&self, new: NewListing) -> MarketResult<Listing> {
        let listing = Listing {
            id: Uuid::new_v4(),
            name: new.name,
            description: new.description,
            price: new.price,
            category: new.category,
            owner_id: new.owner_id,
            status: ListingStatus::Pending,
            message: String::new(),
            images: new.images,
            created_at: OffsetDateTime::now_utc(),
        };
        self.listings.write().await.insert(listing.id, listing.clone());
        Ok(listing)
    }

    async fn update(&self, id: Uuid, changes: ListingChanges) -> MarketResult<Option<Listing>> {
        let mut listings = self.listings.write().await;
        let Some(listing) = listings.get_mut(&id) else {
            return Ok(None);
        };
        changes.apply(listing);
        Ok(Some(listing.clone()))
    }

    async fn delete(&self, id: Uuid) -> MarketResult<bool> {
        Ok(self.listings.write().await.remove(&id).is_some())
    }

    async fn list_all(&self) -> MarketResult<Vec<Listing>> {
        Ok(self.collect(|_| true).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn submission(owner_id: Uuid, name: &str) -> NewListing {
        NewListing {
            name: name.into(),
            description: "desc".into(),
            price: 12.5,
            category: "decor".into(),
            owner_id,
            images: vec!["https://cdn.example/x.jpg".into()],
        }
    }

    #[tokio::test]
    async fn create_always_starts_pending_with_empty_message() {
        let store = InMemoryListingStore::new();
        let listing = store.create(submission(Uuid::new_v4(), "Vase")).await.unwrap();
        assert_eq!(listing.status, ListingStatus::Pending);
        assert_eq!(listing.message, "");
        assert_eq!(store.find(listing.id).await.unwrap(), Some(listing));
    }

    #[tokio::test]
    async fn owner_and_status_scoped_reads() {
        let store = InMemoryListingStore::new();
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();
        let a1 = store.create(submission(alice, "a1")).await.unwrap();
        store.create(submission(bob, "b1")).await.unwrap();

        let changes = ListingChanges {
            status: Some(ListingStatus::Approved),
            ..Default::default()
        };
        store.update(a1.id, changes).await.unwrap();

        let mine = store.find_by_owner(alice).await.unwrap();
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].id, a1.id);

        let approved = store.list_by_status(ListingStatus::Approved).await.unwrap();
        assert_eq!(approved.len(), 1);
        assert_eq!(approved[0].name, "a1");
    }

    #[tokio::test]
    async fn delete_missing_leaves_store_untouched() {
        let store = InMemoryListingStore::new();
        store.create(submission(Uuid::new_v4(), "keep")).await.unwrap();
        assert!(!store.delete(Uuid::new_v4()).await.unwrap());
        assert_eq!(store.list_all().await.unwrap().len(), 1);
    }
}
