/**
 * User Credentials
 *
 * Account rows (username, email, password hash). Display names are not
 * stored here: they live in the operation log as `CreateUser` and
 * `UpdateDisplayName` operations.
 *
 * Creating credentials returns a [`UnitOfWork`] so signup can undo it when
 * appending the user's `CreateUser` operation fails afterwards.
 */
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::backend::storage::error::is_unique_violation;
use crate::backend::storage::{StoreError, UnitOfWork};

/// User struct representing a user in the database
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    /// Unique user ID (UUID)
    pub id: Uuid,
    /// Username (unique, 3-30 chars, alphanumeric + underscore)
    pub username: String,
    /// User email address (unique)
    pub email: String,
    /// Hashed password (bcrypt)
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn new(username: String, email: String, password_hash: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            username,
            email,
            password_hash,
            created_at: now,
            updated_at: now,
        }
    }
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Unit inserting the user. Username or email taken surfaces as
    /// `StoreError::Duplicate` from `perform`.
    fn create(&self, user: User) -> Box<dyn UnitOfWork>;

    async fn get_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError>;

    async fn get_by_username(&self, username: &str) -> Result<Option<User>, StoreError>;

    async fn get_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;
}

/// Which unique column a duplicate insert hit
fn duplicate_field(err: &sqlx::Error) -> &'static str {
    match err {
        sqlx::Error::Database(db) if db.constraint().is_some_and(|c| c.contains("email")) => "email",
        _ => "username",
    }
}

#[derive(Debug, Clone)]
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn fetch_one_by(&self, column: &str, value: &str) -> Result<Option<User>, StoreError> {
        let sql = format!(
            "SELECT id, username, email, password_hash, created_at, updated_at FROM users WHERE {} = $1",
            column
        );
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(value)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }
}

struct PgCreateUserUnit {
    pool: PgPool,
    user: User,
}

#[async_trait]
impl UnitOfWork for PgCreateUserUnit {
    async fn perform(&self) -> Result<(), StoreError> {
        let result = sqlx::query(
            r#"
            INSERT INTO users (id, username, email, password_hash, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(self.user.id)
        .bind(&self.user.username)
        .bind(&self.user.email)
        .bind(&self.user.password_hash)
        .bind(self.user.created_at)
        .bind(self.user.updated_at)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(e) if is_unique_violation(&e) => Err(StoreError::Duplicate {
                field: duplicate_field(&e).to_string(),
            }),
            Err(e) => Err(e.into()),
        }
    }

    async fn rollback(&self) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(self.user.id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    fn create(&self, user: User) -> Box<dyn UnitOfWork> {
        Box::new(PgCreateUserUnit {
            pool: self.pool.clone(),
            user,
        })
    }

    async fn get_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, username, email, password_hash, created_at, updated_at FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn get_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        self.fetch_one_by("username", username).await
    }

    async fn get_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        self.fetch_one_by("email", email).await
    }
}

/// Users held in process memory
#[derive(Debug, Clone, Default)]
pub struct MemoryUserRepository {
    users: Arc<RwLock<HashMap<Uuid, User>>>,
}

impl MemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

struct MemoryCreateUserUnit {
    users: Arc<RwLock<HashMap<Uuid, User>>>,
    user: User,
}

#[async_trait]
impl UnitOfWork for MemoryCreateUserUnit {
    async fn perform(&self) -> Result<(), StoreError> {
        let mut users = self.users.write().await;
        for existing in users.values() {
            if existing.username == self.user.username {
                return Err(StoreError::Duplicate {
                    field: "username".to_string(),
                });
            }
            if existing.email == self.user.email {
                return Err(StoreError::Duplicate {
                    field: "email".to_string(),
                });
            }
        }
        users.insert(self.user.id, self.user.clone());
        Ok(())
    }

    async fn rollback(&self) -> Result<(), StoreError> {
        self.users.write().await.remove(&self.user.id);
        Ok(())
    }
}

#[async_trait]
impl UserRepository for MemoryUserRepository {
    fn create(&self, user: User) -> Box<dyn UnitOfWork> {
        Box::new(MemoryCreateUserUnit {
            users: Arc::clone(&self.users),
            user,
        })
    }

    async fn get_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn get_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        Ok(self
            .users
            .read()
            .await
            .values()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn get_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        Ok(self
            .users
            .read()
            .await
            .values()
            .find(|u| u.email == email)
            .cloned())
    }
}
