//! Authorization gate.
//!
//! Every rule about who may touch which record lives in [`authorize`]. It is
//! a pure function of the acting principal and the requested operation, so
//! callers resolve whatever they need (the owner of a listing, its status)
//! before asking.

use serde::Serialize;
use tracing::warn;
use uuid::Uuid;

use crate::error::{MarketError, MarketResult};
use crate::listings::repo_types::ListingStatus;
use crate::users::repo_types::{Role, User};

/// The authenticated principal behind a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Actor {
    pub id: Uuid,
    pub role: Role,
    pub name: String,
}

impl Actor {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

impl From<&User> for Actor {
    fn from(u: &User) -> Self {
        Self {
            id: u.id,
            role: u.role,
            name: u.name.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// Approved listings, open to everyone.
    BrowseCatalogue,
    ReadListing { owner_id: Uuid, status: ListingStatus },
    CreateListing { owner_id: Uuid },
    ListOwnerListings { owner_id: Uuid },
    ListAllListings,
    ModerateListing,
    DeleteListing,
    ReadUser { user_id: Uuid },
    EditProfile { user_id: Uuid },
    ListUsers,
    AdminEditUser,
    DeleteUser,
    UploadImages,
}

pub fn authorize(actor: Option<&Actor>, op: Operation) -> MarketResult<()> {
    let allowed = match (actor, op) {
        (_, Operation::BrowseCatalogue) => true,
        (
            _,
            Operation::ReadListing {
                status: ListingStatus::Approved,
                ..
            },
        ) => true,
        (None, _) => return Err(MarketError::Unauthenticated),
        (Some(a), _) if a.is_admin() => true,
        (Some(a), Operation::ReadListing { owner_id, .. })
        | (Some(a), Operation::CreateListing { owner_id })
        | (Some(a), Operation::ListOwnerListings { owner_id }) => a.id == owner_id,
        (Some(a), Operation::ReadUser { user_id })
        | (Some(a), Operation::EditProfile { user_id }) => a.id == user_id,
        (Some(_), Operation::UploadImages) => true,
        (Some(_), _) => false,
    };

    if allowed {
        Ok(())
    } else {
        if let Some(a) = actor {
            warn!(actor_id = %a.id, role = %a.role, ?op, "operation denied");
        }
        Err(MarketError::Unauthorized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn actor(role: Role) -> Actor {
        Actor {
            id: Uuid::new_v4(),
            role,
            name: role.to_string(),
        }
    }

    fn denied(result: MarketResult<()>) -> bool {
        matches!(result, Err(MarketError::Unauthorized))
    }

    #[test]
    fn anonymous_sees_only_approved_listings() {
        let owner = Uuid::new_v4();
        assert!(authorize(None, Operation::BrowseCatalogue).is_ok());
        assert!(authorize(
            None,
            Operation::ReadListing {
                owner_id: owner,
                status: ListingStatus::Approved
            }
        )
        .is_ok());

        for status in [ListingStatus::Pending, ListingStatus::Rejected] {
            let result = authorize(None, Operation::ReadListing { owner_id: owner, status });
            assert!(matches!(result, Err(MarketError::Unauthenticated)));
        }
        assert!(matches!(
            authorize(None, Operation::CreateListing { owner_id: owner }),
            Err(MarketError::Unauthenticated)
        ));
    }

    #[test]
    fn members_act_only_on_their_own_records() {
        for role in [Role::Client, Role::Craftsman] {
            let me = actor(role);
            let other = Uuid::new_v4();

            assert!(authorize(Some(&me), Operation::CreateListing { owner_id: me.id }).is_ok());
            assert!(denied(authorize(Some(&me), Operation::CreateListing { owner_id: other })));

            assert!(authorize(
                Some(&me),
                Operation::ReadListing {
                    owner_id: me.id,
                    status: ListingStatus::Rejected
                }
            )
            .is_ok());
            assert!(denied(authorize(
                Some(&me),
                Operation::ReadListing {
                    owner_id: other,
                    status: ListingStatus::Pending
                }
            )));

            assert!(authorize(Some(&me), Operation::ListOwnerListings { owner_id: me.id }).is_ok());
            assert!(denied(authorize(Some(&me), Operation::ListOwnerListings { owner_id: other })));

            assert!(authorize(Some(&me), Operation::ReadUser { user_id: me.id }).is_ok());
            assert!(denied(authorize(Some(&me), Operation::ReadUser { user_id: other })));
            assert!(authorize(Some(&me), Operation::EditProfile { user_id: me.id }).is_ok());
            assert!(authorize(Some(&me), Operation::UploadImages).is_ok());
        }
    }

    #[test]
    fn members_never_moderate_delete_or_administer() {
        for role in [Role::Client, Role::Craftsman] {
            let me = actor(role);
            for op in [
                Operation::ModerateListing,
                Operation::DeleteListing,
                Operation::ListAllListings,
                Operation::ListUsers,
                Operation::AdminEditUser,
                Operation::DeleteUser,
            ] {
                assert!(denied(authorize(Some(&me), op)), "{role} allowed {op:?}");
            }
        }
    }

    #[test]
    fn admin_may_do_everything() {
        let admin = actor(Role::Admin);
        let someone = Uuid::new_v4();
        for op in [
            Operation::ModerateListing,
            Operation::DeleteListing,
            Operation::ListAllListings,
            Operation::ListUsers,
            Operation::AdminEditUser,
            Operation::DeleteUser,
            Operation::ReadUser { user_id: someone },
            Operation::CreateListing { owner_id: someone },
            Operation::ReadListing {
                owner_id: someone,
                status: ListingStatus::Pending,
            },
        ] {
            assert!(authorize(Some(&admin), op).is_ok(), "admin denied {op:?}");
        }
    }
}
