//! User lookup collaborator.
//!
//! Registration and password handling live elsewhere; this core only needs to turn
//! an email into the user it belongs to.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::{postgres::PgRow, FromRow, PgPool, Row};
use std::collections::HashMap;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::Instrument;
use uuid::Uuid;

/// A resolved user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: Uuid,
    pub email: String,
}

impl<'r> FromRow<'r, PgRow> for Identity {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            email: row.try_get("email")?,
        })
    }
}

#[derive(Debug, Error)]
pub enum DirectoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("directory unavailable: {0}")]
    Unavailable(String),
}

#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Resolve an identity key (email); `Ok(None)` when no such user exists.
    async fn resolve(&self, key: &str) -> Result<Option<Identity>, DirectoryError>;
}

/// Looks users up in the `users` table.
#[derive(Clone, Debug)]
pub struct PgUserDirectory {
    pool: PgPool,
}

impl PgUserDirectory {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserDirectory for PgUserDirectory {
    async fn resolve(&self, key: &str) -> Result<Option<Identity>, DirectoryError> {
        let query = "SELECT id, email FROM users WHERE email = $1";
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "SELECT",
            db.statement = query
        );
        let identity = sqlx::query_as::<_, Identity>(query)
            .bind(key)
            .fetch_optional(&self.pool)
            .instrument(span)
            .await?;

        Ok(identity)
    }
}

/// In-process directory keyed by email.
#[derive(Debug, Default)]
pub struct MemoryUserDirectory {
    users: RwLock<HashMap<String, Identity>>,
}

impl MemoryUserDirectory {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `email` with a fresh id and return the identity.
    pub async fn insert(&self, email: &str) -> Identity {
        let identity = Identity {
            id: Uuid::new_v4(),
            email: email.to_string(),
        };
        self.users
            .write()
            .await
            .insert(email.to_string(), identity.clone());
        identity
    }
}

#[async_trait]
impl UserDirectory for MemoryUserDirectory {
    async fn resolve(&self, key: &str) -> Result<Option<Identity>, DirectoryError> {
        Ok(self.users.read().await.get(key).cloned())
    }
}
