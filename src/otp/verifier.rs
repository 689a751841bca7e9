use std::sync::Arc;
use tracing::{debug, instrument};

use super::clock::Clock;
use super::error::OtpError;
use super::store::OtpStore;
use crate::identity::UserDirectory;
use crate::token::TokenIssuer;

/// Checks submitted passcodes and exchanges them for session tokens.
#[derive(Clone)]
pub struct OtpVerifier {
    directory: Arc<dyn UserDirectory>,
    store: Arc<dyn OtpStore>,
    tokens: Arc<dyn TokenIssuer>,
    clock: Arc<dyn Clock>,
}

impl OtpVerifier {
    #[must_use]
    pub fn new(
        directory: Arc<dyn UserDirectory>,
        store: Arc<dyn OtpStore>,
        tokens: Arc<dyn TokenIssuer>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            directory,
            store,
            tokens,
            clock,
        }
    }

    /// Consume a matching active passcode and mint a token for its owner.
    ///
    /// `device` is only recorded in the span; it does not have to match the issuing device.
    ///
    /// # Errors
    /// `IdentityNotFound` if `key` does not resolve, `InvalidOrExpired` for any code that is
    /// wrong, expired, already consumed or consumed concurrently, `Mint` if signing fails.
    #[instrument(skip(self, code), fields(device = device.unwrap_or("-")))]
    pub async fn verify(
        &self,
        key: &str,
        code: &str,
        device: Option<&str>,
    ) -> Result<String, OtpError> {
        let identity = self
            .directory
            .resolve(key)
            .await?
            .ok_or(OtpError::IdentityNotFound)?;

        let now = self.clock.now();
        let Some(credential) = self.store.find_active(identity.id, code, now).await? else {
            debug!("no active otp matched");
            return Err(OtpError::InvalidOrExpired);
        };

        // Losing the race to another verifier looks the same as a replay.
        if !self.store.mark_consumed(credential.id).await? {
            debug!(credential_id = credential.id, "otp consumed concurrently");
            return Err(OtpError::InvalidOrExpired);
        }

        debug!(credential_id = credential.id, "otp consumed");
        Ok(self.tokens.mint(&identity).await?)
    }
}
