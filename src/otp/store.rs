//! Credential persistence interface and the in-memory implementation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use uuid::Uuid;

use super::error::StoreError;
use super::models::{NewOtpCredential, OtpCredential};

#[async_trait]
pub trait OtpStore: Send + Sync {
    /// Persist a new credential and return it with its assigned id.
    async fn save(&self, credential: NewOtpCredential) -> Result<OtpCredential, StoreError>;

    /// Return the newest unconsumed credential for `owner` whose code equals `code`
    /// and whose `expires_at` is after `now`.
    async fn find_active(
        &self,
        owner: Uuid,
        code: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<OtpCredential>, StoreError>;

    /// Flip `consumed` from false to true.
    ///
    /// Returns `Ok(true)` only for the caller that performed the transition.
    async fn mark_consumed(&self, id: i64) -> Result<bool, StoreError>;

    /// Remove every unconsumed credential of `owner`, returning how many were removed.
    async fn discard_unconsumed(&self, owner: Uuid) -> Result<u64, StoreError>;
}

#[derive(Debug, Default)]
struct MemoryState {
    next_id: i64,
    credentials: Vec<OtpCredential>,
}

/// Store kept in process memory; every operation runs under one lock.
#[derive(Debug, Default)]
pub struct MemoryOtpStore {
    state: Mutex<MemoryState>,
}

impl MemoryOtpStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of a stored credential.
    pub async fn get(&self, id: i64) -> Option<OtpCredential> {
        let state = self.state.lock().await;
        state.credentials.iter().find(|otp| otp.id == id).cloned()
    }

    /// Snapshot of every credential belonging to `owner`, oldest first.
    pub async fn list_for_owner(&self, owner: Uuid) -> Vec<OtpCredential> {
        let state = self.state.lock().await;
        state
            .credentials
            .iter()
            .filter(|otp| otp.owner == owner)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl OtpStore for MemoryOtpStore {
    async fn save(&self, credential: NewOtpCredential) -> Result<OtpCredential, StoreError> {
        let mut state = self.state.lock().await;
        state.next_id += 1;
        let stored = credential.into_credential(state.next_id);
        state.credentials.push(stored.clone());
        Ok(stored)
    }

    async fn find_active(
        &self,
        owner: Uuid,
        code: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<OtpCredential>, StoreError> {
        let state = self.state.lock().await;
        Ok(state
            .credentials
            .iter()
            .filter(|otp| otp.owner == owner && otp.code == code && otp.is_active(now))
            .max_by_key(|otp| (otp.issued_at, otp.id))
            .cloned())
    }

    async fn mark_consumed(&self, id: i64) -> Result<bool, StoreError> {
        let mut state = self.state.lock().await;
        match state.credentials.iter_mut().find(|otp| otp.id == id) {
            Some(otp) if !otp.consumed => {
                otp.consumed = true;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn discard_unconsumed(&self, owner: Uuid) -> Result<u64, StoreError> {
        let mut state = self.state.lock().await;
        let before = state.credentials.len();
        state
            .credentials
            .retain(|otp| otp.owner != owner || otp.consumed);
        let removed = before - state.credentials.len();
        Ok(u64::try_from(removed).unwrap_or(u64::MAX))
    }
}
