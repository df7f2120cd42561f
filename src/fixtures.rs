//! Shared builders for unit tests.

use uuid::Uuid;

use crate::access::Actor;
use crate::listings::{
    dto::CreateListingRequest,
    repo::{InMemoryListingStore, ListingStore},
    repo_types::{Listing, NewListing},
};
use crate::users::{
    repo::{InMemoryUserStore, UserStore},
    repo_types::{NewUser, Role, User},
};

pub struct Stores {
    pub users: InMemoryUserStore,
    pub listings: InMemoryListingStore,
}

impl Stores {
    pub fn new() -> Self {
        Self {
            users: InMemoryUserStore::new(),
            listings: InMemoryListingStore::new(),
        }
    }
}

/// Creates a user with a unique email. The hash is a placeholder, so the
/// account cannot log in.
pub async fn seed_user(users: &dyn UserStore, role: Role) -> User {
    let tag = Uuid::new_v4().simple().to_string();
    users
        .create(NewUser {
            name: format!("{role} {}", &tag[..6]),
            email: format!("{role}-{tag}@example.com"),
            phone: "+20 100 000 0000".into(),
            password_hash: "not-a-real-hash".into(),
            role,
        })
        .await
        .expect("seed user")
}

pub fn actor_of(user: &User) -> Actor {
    Actor::from(user)
}

/// A submission with every required field filled in.
pub fn listing_request() -> CreateListingRequest {
    CreateListingRequest {
        name: Some("Hand woven basket".into()),
        description: Some("Palm leaves, dyed by hand".into()),
        price: Some(350.0),
        category: Some("baskets".into()),
        images: Some(vec!["https://cdn.example.com/listings/basket.jpg".into()]),
        ..Default::default()
    }
}

/// A pending listing owned by `owner`.
pub async fn seed_listing(stores: &Stores, owner: &User, name: &str) -> Listing {
    stores
        .listings
        .create(NewListing {
            name: name.into(),
            description: "seeded".into(),
            price: 100.0,
            category: "decor".into(),
            owner_id: owner.id,
            images: vec!["https://cdn.example.com/seed.jpg".into()],
        })
        .await
        .expect("seed listing")
}
