use serde::Serialize;

use crate::access::{authorize, Actor, Operation};
use crate::error::MarketResult;
use crate::listings::{repo::ListingStore, repo_types::Listing};
use crate::pipeline::stats::{ListingStats, LocalCalendar, StatusCounts, UserStats};
use crate::users::{repo::UserStore, repo_types::Role};

pub const RECENT_LISTINGS: usize = 5;

#[derive(Debug, Serialize)]
pub struct Dashboard {
    pub role: Role,
    pub name: String,
    #[serde(flatten)]
    pub summary: Summary,
}

#[derive(Debug, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Summary {
    /// Clients and craftsmen see their own submissions.
    Member {
        listings: StatusCounts,
        recent: Vec<Listing>,
    },
    Admin {
        listings: ListingStats,
        users: UserStats,
    },
}

pub async fn dashboard(
    listings: &dyn ListingStore,
    users: &dyn UserStore,
    actor: &Actor,
    calendar: &LocalCalendar,
) -> MarketResult<Dashboard> {
    let summary = if actor.is_admin() {
        authorize(Some(actor), Operation::ListAllListings)?;
        authorize(Some(actor), Operation::ListUsers)?;
        let all_listings = listings.list_all().await?;
        let all_users = users.list_all().await?;
        Summary::Admin {
            listings: ListingStats::compute(&all_listings, calendar),
            users: UserStats::compute(&all_users, calendar),
        }
    } else {
        authorize(Some(actor), Operation::ListOwnerListings { owner_id: actor.id })?;
        let mut own = listings.find_by_owner(actor.id).await?;
        let counts = StatusCounts::of(&own);
        own.truncate(RECENT_LISTINGS);
        Summary::Member {
            listings: counts,
            recent: own,
        }
    };

    Ok(Dashboard {
        role: actor.role,
        name: actor.name.clone(),
        summary,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{actor_of, seed_listing, seed_user, Stores};
    use crate::listings::repo_types::{ListingChanges, ListingStatus};
    use time::UtcOffset;

    #[tokio::test]
    async fn member_sees_own_counts_and_latest_listings() {
        let stores = Stores::new();
        let me = seed_user(&stores.users, Role::Craftsman).await;
        let someone = seed_user(&stores.users, Role::Client).await;
        for i in 0..7 {
            seed_listing(&stores, &me, &format!("piece {i}")).await;
        }
        let other = seed_listing(&stores, &someone, "not mine").await;
        let first = stores.listings.find_by_owner(me.id).await.unwrap()[0].clone();
        let approve = ListingChanges {
            status: Some(ListingStatus::Approved),
            ..Default::default()
        };
        stores.listings.update(first.id, approve).await.unwrap();

        let calendar = LocalCalendar::now(UtcOffset::UTC);
        let board = dashboard(&stores.listings, &stores.users, &actor_of(&me), &calendar)
            .await
            .unwrap();
        let Summary::Member { listings, recent } = board.summary else {
            panic!("member dashboard expected");
        };
        assert_eq!((listings.pending, listings.approved, listings.rejected), (6, 1, 0));
        assert_eq!(recent.len(), RECENT_LISTINGS);
        assert!(recent.iter().all(|l| l.owner_id == me.id && l.id != other.id));
    }

    #[tokio::test]
    async fn admin_sees_platform_totals() {
        let stores = Stores::new();
        let admin = seed_user(&stores.users, Role::Admin).await;
        let owner = seed_user(&stores.users, Role::Client).await;
        seed_listing(&stores, &owner, "a").await;
        seed_listing(&stores, &owner, "b").await;

        let calendar = LocalCalendar::now(UtcOffset::UTC);
        let board = dashboard(&stores.listings, &stores.users, &actor_of(&admin), &calendar)
            .await
            .unwrap();
        let json = serde_json::to_value(&board).unwrap();
        assert_eq!(json["kind"], "admin");
        assert_eq!(json["role"], "admin");
        assert_eq!(json["listings"]["total"], 2);
        assert_eq!(json["users"]["total"], 2);
        assert_eq!(json["users"]["byDay"].as_array().map(Vec::len), Some(7));
    }
}
