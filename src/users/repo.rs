use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use sqlx::PgPool;
use time::OffsetDateTime;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::repo_types::{NewUser, Role, User, UserChanges, UserRow};
use crate::error::{MarketError, MarketResult};

/// Persistence boundary for user accounts.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find(&self, id: Uuid) -> MarketResult<Option<User>>;

    /// Case-insensitive lookup.
    async fn find_by_email(&self, email: &str) -> MarketResult<Option<User>>;

    /// Fails with `Conflict` when the email is taken.
    async fn create(&self, new: NewUser) -> MarketResult<User>;

    /// Returns `None` when no user has this id.
    async fn update(&self, id: Uuid, changes: UserChanges) -> MarketResult<Option<User>>;

    /// Returns `false` when no user has this id.
    async fn delete(&self, id: Uuid) -> MarketResult<bool>;

    /// Newest first.
    async fn list_all(&self) -> MarketResult<Vec<User>>;

    async fn count_by_role(&self, role: Role) -> MarketResult<usize>;
}

fn newest_first(users: &mut [User]) {
    users.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));
}

const USER_COLUMNS: &str = "id, name, email, phone, password_hash, role, created_at";

#[derive(Clone)]
pub struct PgUserStore {
    db: PgPool,
}

impl PgUserStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find(&self, id: Uuid) -> MarketResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        row.map(User::try_from).transpose()
    }

    async fn find_by_email(&self, email: &str) -> MarketResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE lower(email) = lower($1)"
        ))
        .bind(email)
        .fetch_optional(&self.db)
        .await?;
        row.map(User::try_from).transpose()
    }

    async fn create(&self, new: NewUser) -> MarketResult<User> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            r#"
            INSERT INTO users (id, name, email, phone, password_hash, role)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(&new.name)
        .bind(&new.email)
        .bind(&new.phone)
        .bind(&new.password_hash)
        .bind(new.role.as_str())
        .fetch_one(&self.db)
        .await?;
        let user = User::try_from(row)?;
        tracing::info!(user_id = %user.id, role = %user.role, "created user");
        Ok(user)
    }

    async fn update(&self, id: Uuid, changes: UserChanges) -> MarketResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            r#"
            UPDATE users
               SET name  = COALESCE($2, name),
                   email = COALESCE($3, email),
                   phone = COALESCE($4, phone),
                   role  = COALESCE($5, role)
             WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(changes.name)
        .bind(changes.email)
        .bind(changes.phone)
        .bind(changes.role.map(|r| r.as_str()))
        .fetch_optional(&self.db)
        .await?;
        row.map(User::try_from).transpose()
    }

    async fn delete(&self, id: Uuid) -> MarketResult<bool> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_all(&self) -> MarketResult<Vec<User>> {
        let rows = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY created_at DESC, id ASC"
        ))
        .fetch_all(&self.db)
        .await?;
        rows.into_iter().map(User::try_from).collect()
    }

    async fn count_by_role(&self, role: Role) -> MarketResult<usize> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users WHERE role = $1")
            .bind(role.as_str())
            .fetch_one(&self.db)
            .await?;
        Ok(usize::try_from(count).unwrap_or_default())
    }
}

/// In-memory store used by tests and local runs without Postgres.
#[derive(Debug, Default, Clone)]
pub struct InMemoryUserStore {
    users: Arc<RwLock<HashMap<Uuid, User>>>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a fully formed record, keeping its id and timestamp.
    #[cfg(test)]
    pub async fn insert(&self, user: User) {
        self.users.write().await.insert(user.id, user);
    }
}

fn same_email(a: &str, b: &str) -> bool {
    a.to_lowercase() == b.to_lowercase()
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn find(&self, id: Uuid) -> MarketResult<Option<User>> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> MarketResult<Option<User>> {
        let users = self.users.read().await;
        Ok(users.values().find(|u| same_email(&u.email, email)).cloned())
    }

    async fn create(&self, new: NewUser) -> MarketResult<User> {
        let mut users = self.users.write().await;
        if users.values().any(|u| same_email(&u.email, &new.email)) {
            return Err(MarketError::Conflict("email already in use".into()));
        }
        let user = User {
            id: Uuid::new_v4(),
            name: new.name,
            email: new.email,
            phone: new.phone,
            password_hash: new.password_hash,
            role: new.role,
            created_at: OffsetDateTime::now_utc(),
        };
        users.insert(user.id, user.clone());
        tracing::info!(user_id = %user.id, role = %user.role, "created user");
        Ok(user)
    }

    async fn update(&self, id: Uuid, changes: UserChanges) -> MarketResult<Option<User>> {
        let mut users = self.users.write().await;
        if let Some(email) = &changes.email {
            if users.values().any(|u| u.id != id && same_email(&u.email, email)) {
                return Err(MarketError::Conflict("email already in use".into()));
            }
        }
        let Some(user) = users.get_mut(&id) else {
            return Ok(None);
        };
        changes.apply(user);
        Ok(Some(user.clone()))
    }

    async fn delete(&self, id: Uuid) -> MarketResult<bool> {
        Ok(self.users.write().await.remove(&id).is_some())
    }

    async fn list_all(&self) -> MarketResult<Vec<User>> {
        let mut all: Vec<User> = self.users.read().await.values().cloned().collect();
        newest_first(&mut all);
        Ok(all)
    }

    async fn count_by_role(&self, role: Role) -> MarketResult<usize> {
        let users = self.users.read().await;
        Ok(users.values().filter(|u| u.role == role).count())
    }
}
