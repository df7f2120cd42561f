use lazy_static::lazy_static;
use regex::Regex;
use tracing::{info, warn};

use super::dto::RegisterRequest;
use super::password::{hash_password, verify_password};
use crate::config::BootstrapAdmin;
use crate::error::{MarketError, MarketResult};
use crate::users::repo::UserStore;
use crate::users::repo_types::{NewUser, Role, User};

pub const MIN_PASSWORD_LEN: usize = 8;

lazy_static! {
    static ref EMAIL_RE: Regex =
        Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email pattern is valid");
}

pub(crate) fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

pub(crate) fn normalize_email(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// Trimmed, lowercased, well-formed email or a validation error.
pub(crate) fn checked_email(raw: &str) -> MarketResult<String> {
    let email = normalize_email(raw);
    if !is_valid_email(&email) {
        warn!(email = %email, "invalid email");
        return Err(MarketError::validation("invalid email"));
    }
    Ok(email)
}

pub(crate) fn checked_name(raw: &str) -> MarketResult<String> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(MarketError::validation("name is required"));
    }
    Ok(name.to_string())
}

fn checked_password(plain: &str) -> MarketResult<()> {
    if plain.chars().count() < MIN_PASSWORD_LEN {
        warn!("password too short");
        return Err(MarketError::validation(format!(
            "password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    Ok(())
}

pub async fn register(users: &dyn UserStore, req: RegisterRequest) -> MarketResult<User> {
    let email = checked_email(&req.email)?;
    let name = checked_name(&req.name)?;
    checked_password(&req.password)?;
    if req.role == Role::Admin {
        warn!(email = %email, "admin self-registration refused");
        return Err(MarketError::validation("admin accounts cannot be self-registered"));
    }

    if users.find_by_email(&email).await?.is_some() {
        warn!(email = %email, "email already registered");
        return Err(MarketError::Conflict("email already in use".into()));
    }

    let password_hash = hash_password(&req.password)?;
    let user = users
        .create(NewUser {
            name,
            email,
            phone: req.phone.map(|p| p.trim().to_string()).unwrap_or_default(),
            password_hash,
            role: req.role,
        })
        .await?;

    info!(user_id = %user.id, role = %user.role, "user registered");
    Ok(user)
}

/// Unknown email and wrong password fail the same way.
pub async fn login(users: &dyn UserStore, email: &str, password: &str) -> MarketResult<User> {
    let email = normalize_email(email);
    let Some(user) = users.find_by_email(&email).await? else {
        warn!(email = %email, "login unknown email");
        return Err(MarketError::InvalidCredentials);
    };

    if !verify_password(password, &user.password_hash)? {
        warn!(user_id = %user.id, "login invalid password");
        return Err(MarketError::InvalidCredentials);
    }

    info!(user_id = %user.id, "user logged in");
    Ok(user)
}

/// Creates the configured admin account unless its email is already taken.
pub async fn bootstrap_admin(
    users: &dyn UserStore,
    admin: &BootstrapAdmin,
) -> MarketResult<Option<User>> {
    let email = checked_email(&admin.email)?;
    if let Some(existing) = users.find_by_email(&email).await? {
        if existing.role != Role::Admin {
            warn!(user_id = %existing.id, "bootstrap admin email belongs to a non-admin account");
        }
        return Ok(None);
    }
    checked_password(&admin.password)?;

    let user = users
        .create(NewUser {
            name: checked_name(&admin.name)?,
            email,
            phone: String::new(),
            password_hash: hash_password(&admin.password)?,
            role: Role::Admin,
        })
        .await?;
    info!(user_id = %user.id, "bootstrap admin created");
    Ok(Some(user))
}
