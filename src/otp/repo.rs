//! Postgres-backed credential store (`otp_codes` table).

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::Instrument;
use uuid::Uuid;

use super::error::StoreError;
use super::models::{NewOtpCredential, OtpCredential};
use super::store::OtpStore;

#[derive(Clone, Debug)]
pub struct PgOtpStore {
    pool: PgPool,
}

impl PgOtpStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn query_span(operation: &'static str, statement: &'static str) -> tracing::Span {
    tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = operation,
        db.statement = statement
    )
}

#[async_trait]
impl OtpStore for PgOtpStore {
    async fn save(&self, credential: NewOtpCredential) -> Result<OtpCredential, StoreError> {
        let query = r"
            INSERT INTO otp_codes (user_id, code, creation_date, exp_date, used, machine)
            VALUES ($1, $2, $3, $4, FALSE, $5)
            RETURNING id, user_id, code, creation_date, exp_date, used, machine
        ";
        let stored = sqlx::query_as::<_, OtpCredential>(query)
            .bind(credential.owner)
            .bind(&credential.code)
            .bind(credential.issued_at)
            .bind(credential.expires_at)
            .bind(credential.device.as_deref())
            .fetch_one(&self.pool)
            .instrument(query_span("INSERT", query))
            .await?;

        Ok(stored)
    }

    async fn find_active(
        &self,
        owner: Uuid,
        code: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<OtpCredential>, StoreError> {
        let query = r"
            SELECT id, user_id, code, creation_date, exp_date, used, machine
            FROM otp_codes
            WHERE user_id = $1
              AND code = $2
              AND used = FALSE
              AND exp_date > $3
            ORDER BY creation_date DESC, id DESC
            LIMIT 1
        ";
        let found = sqlx::query_as::<_, OtpCredential>(query)
            .bind(owner)
            .bind(code)
            .bind(now)
            .fetch_optional(&self.pool)
            .instrument(query_span("SELECT", query))
            .await?;

        Ok(found)
    }

    async fn mark_consumed(&self, id: i64) -> Result<bool, StoreError> {
        // The `used = FALSE` predicate makes the row update the arbiter between racing verifiers.
        let query = "UPDATE otp_codes SET used = TRUE WHERE id = $1 AND used = FALSE";
        let result = sqlx::query(query)
            .bind(id)
            .execute(&self.pool)
            .instrument(query_span("UPDATE", query))
            .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn discard_unconsumed(&self, owner: Uuid) -> Result<u64, StoreError> {
        let query = "DELETE FROM otp_codes WHERE user_id = $1 AND used = FALSE";
        let result = sqlx::query(query)
            .bind(owner)
            .execute(&self.pool)
            .instrument(query_span("DELETE", query))
            .await?;

        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::postgres::PgPoolOptions;

    #[tokio::test]
    async fn lazy_pool_builds_store_without_connecting() {
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://postgres@localhost/otpgate")
            .unwrap();
        let store = PgOtpStore::new(pool);
        assert!(format!("{store:?}").contains("PgOtpStore"));
    }
}
