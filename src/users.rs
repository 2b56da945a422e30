/// User Records
///
/// The record store owns user identity and credential data. The authentication
/// engine only reads it, through the `UserStore` capability.

use async_trait::async_trait;
use dashmap::DashMap;
use sqlx::PgPool;

use crate::auth::StoreError;

/// A user identity and credential record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: String,
    pub email: String,
    pub role: String,
    pub password_hash: String,
}

/// Read access to user records
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn get_by_id(&self, id: &str) -> Result<User, StoreError>;

    async fn get_by_email(&self, email: &str) -> Result<User, StoreError>;

    async fn exists_by_email(&self, email: &str) -> Result<bool, StoreError>;

    /// Check that the backing store answers
    async fn ping(&self) -> Result<(), StoreError>;
}

/// Postgres-backed user store
#[derive(Debug, Clone)]
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn get_by_id(&self, id: &str) -> Result<User, StoreError> {
        let row = sqlx::query_as::<_, (String, String, String, String)>(
            "SELECT id::text, email, role, password_hash FROM users WHERE id::text = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(into_user).ok_or(StoreError::NotFound)
    }

    async fn get_by_email(&self, email: &str) -> Result<User, StoreError> {
        let row = sqlx::query_as::<_, (String, String, String, String)>(
            "SELECT id::text, email, role, password_hash FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        row.map(into_user).ok_or(StoreError::NotFound)
    }

    async fn exists_by_email(&self, email: &str) -> Result<bool, StoreError> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM users WHERE email = $1)",
        )
        .bind(email)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

fn into_user((id, email, role, password_hash): (String, String, String, String)) -> User {
    User {
        id,
        email,
        role,
        password_hash,
    }
}

/// In-process user store keyed by id, with an email index
#[derive(Debug, Default)]
pub struct InMemoryUserStore {
    by_id: DashMap<String, User>,
    id_by_email: DashMap<String, String>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a user record
    pub fn insert(&self, user: User) {
        if let Some(previous) = self.by_id.get(&user.id).map(|u| u.email.clone()) {
            self.id_by_email.remove(&previous);
        }
        self.id_by_email.insert(user.email.clone(), user.id.clone());
        self.by_id.insert(user.id.clone(), user);
    }

    /// Remove a user record, returning it if it existed
    pub fn remove(&self, id: &str) -> Option<User> {
        let (_, user) = self.by_id.remove(id)?;
        self.id_by_email.remove(&user.email);
        Some(user)
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn get_by_id(&self, id: &str) -> Result<User, StoreError> {
        self.by_id
            .get(id)
            .map(|user| user.value().clone())
            .ok_or(StoreError::NotFound)
    }

    async fn get_by_email(&self, email: &str) -> Result<User, StoreError> {
        let id = self
            .id_by_email
            .get(email)
            .map(|id| id.value().clone())
            .ok_or(StoreError::NotFound)?;
        self.get_by_id(&id).await
    }

    async fn exists_by_email(&self, email: &str) -> Result<bool, StoreError> {
        Ok(self.id_by_email.contains_key(email))
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
