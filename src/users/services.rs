use tracing::{info, warn};
use uuid::Uuid;

use super::dto::{AdminUpdateUserRequest, AdminUserView};
use super::repo::UserStore;
use super::repo_types::{Role, User, UserChanges};
use crate::access::{authorize, Actor, Operation};
use crate::auth::dto::UpdateProfileRequest;
use crate::auth::services::{checked_email, checked_name};
use crate::error::{MarketError, MarketResult};
use crate::pipeline::{
    export::users_csv,
    query::{filter, paginate, ViewQuery},
    stats::{LocalCalendar, UserStats},
};

/// Fails with a conflict when `email` belongs to someone other than `owner`.
async fn ensure_email_free(users: &dyn UserStore, email: &str, owner: Uuid) -> MarketResult<()> {
    match users.find_by_email(email).await? {
        Some(other) if other.id != owner => {
            warn!(email = %email, "email already in use");
            Err(MarketError::Conflict("email already in use".into()))
        }
        _ => Ok(()),
    }
}

async fn ensure_not_last_admin(users: &dyn UserStore, target: &User) -> MarketResult<()> {
    if target.role == Role::Admin && users.count_by_role(Role::Admin).await? <= 1 {
        warn!(user_id = %target.id, "refusing to remove the last admin");
        return Err(MarketError::validation("cannot remove the last admin"));
    }
    Ok(())
}

pub async fn get_profile(users: &dyn UserStore, actor: &Actor) -> MarketResult<User> {
    authorize(Some(actor), Operation::ReadUser { user_id: actor.id })?;
    users
        .find(actor.id)
        .await?
        .ok_or(MarketError::NotFound("user", actor.id))
}

/// Self-service edit of name, email and phone. The role is never touched here.
pub async fn update_profile(
    users: &dyn UserStore,
    actor: &Actor,
    req: UpdateProfileRequest,
) -> MarketResult<User> {
    authorize(Some(actor), Operation::EditProfile { user_id: actor.id })?;

    let changes = UserChanges {
        name: req.name.as_deref().map(checked_name).transpose()?,
        email: req.email.as_deref().map(checked_email).transpose()?,
        phone: req.phone.map(|p| p.trim().to_string()),
        role: None,
    };
    if let Some(email) = &changes.email {
        ensure_email_free(users, email, actor.id).await?;
    }

    let user = users
        .update(actor.id, changes)
        .await?
        .ok_or(MarketError::NotFound("user", actor.id))?;
    info!(user_id = %user.id, "profile updated");
    Ok(user)
}

pub async fn admin_update_user(
    users: &dyn UserStore,
    actor: &Actor,
    id: Uuid,
    req: AdminUpdateUserRequest,
) -> MarketResult<User> {
    authorize(Some(actor), Operation::AdminEditUser)?;
    let name = checked_name(&req.name)?;
    let email = checked_email(&req.email)?;

    let target = users.find(id).await?.ok_or(MarketError::NotFound("user", id))?;
    if req.role != Role::Admin {
        ensure_not_last_admin(users, &target).await?;
    }
    ensure_email_free(users, &email, id).await?;

    let changes = UserChanges {
        name: Some(name),
        email: Some(email),
        phone: Some(req.phone.map(|p| p.trim().to_string()).unwrap_or_default()),
        role: Some(req.role),
    };
    let user = users
        .update(id, changes)
        .await?
        .ok_or(MarketError::NotFound("user", id))?;
    info!(user_id = %user.id, admin_id = %actor.id, role = %user.role, "user updated by admin");
    Ok(user)
}

/// Removes the account only. Listings that pointed at it keep their `ownerId`.
pub async fn admin_delete_user(users: &dyn UserStore, actor: &Actor, id: Uuid) -> MarketResult<()> {
    authorize(Some(actor), Operation::DeleteUser)?;
    let target = users.find(id).await?.ok_or(MarketError::NotFound("user", id))?;
    ensure_not_last_admin(users, &target).await?;

    if !users.delete(id).await? {
        return Err(MarketError::NotFound("user", id));
    }
    info!(user_id = %id, admin_id = %actor.id, "user deleted");
    Ok(())
}

pub async fn admin_user_view(
    users: &dyn UserStore,
    actor: &Actor,
    query: &ViewQuery,
    page_size: usize,
    calendar: &LocalCalendar,
) -> MarketResult<AdminUserView> {
    authorize(Some(actor), Operation::ListUsers)?;
    let all = users.list_all().await?;
    let stats = UserStats::compute(&all, calendar);
    let page = paginate(filter(all, &query.q), query.page, page_size);
    Ok(AdminUserView { page, stats })
}

pub async fn export_users(users: &dyn UserStore, actor: &Actor) -> MarketResult<String> {
    authorize(Some(actor), Operation::ListUsers)?;
    Ok(users_csv(&users.list_all().await?))
}
