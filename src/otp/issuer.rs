use std::sync::Arc;
use tracing::{debug, instrument, warn};

use super::clock::Clock;
use super::code::CodeGenerator;
use super::error::OtpError;
use super::models::NewOtpCredential;
use super::policy::{OtpPolicy, PolicyError};
use super::store::OtpStore;
use crate::identity::UserDirectory;
use crate::notify::{Notifier, OtpMessage};

/// Creates, persists and delivers passcodes.
#[derive(Clone)]
pub struct OtpIssuer {
    directory: Arc<dyn UserDirectory>,
    store: Arc<dyn OtpStore>,
    notifier: Arc<dyn Notifier>,
    clock: Arc<dyn Clock>,
    generator: Arc<CodeGenerator>,
    policy: OtpPolicy,
}

impl OtpIssuer {
    #[must_use]
    pub fn new(
        directory: Arc<dyn UserDirectory>,
        store: Arc<dyn OtpStore>,
        notifier: Arc<dyn Notifier>,
        clock: Arc<dyn Clock>,
        generator: Arc<CodeGenerator>,
        policy: OtpPolicy,
    ) -> Self {
        Self {
            directory,
            store,
            notifier,
            clock,
            generator,
            policy,
        }
    }

    /// Issue a passcode for the identity behind `key` and deliver it.
    ///
    /// A delivery failure leaves the persisted credential in place; it simply expires unused.
    ///
    /// # Errors
    /// `IdentityNotFound` if `key` does not resolve, `Policy` if the validity window
    /// overflows the clock, `Store` if persistence fails, `DeliveryFailed` if the
    /// notifier rejects the message.
    #[instrument(skip(self), fields(device = device.unwrap_or("-")))]
    pub async fn issue(&self, key: &str, device: Option<&str>) -> Result<(), OtpError> {
        let identity = self
            .directory
            .resolve(key)
            .await?
            .ok_or(OtpError::IdentityNotFound)?;

        if self.policy.invalidate_prior_on_issue() {
            let discarded = self.store.discard_unconsumed(identity.id).await?;
            debug!(discarded, "discarded prior unconsumed codes");
        }

        let issued_at = self.clock.now();
        let expires_at = issued_at
            .checked_add_signed(self.policy.ttl())
            .ok_or(PolicyError::Ttl(self.policy.ttl().num_seconds()))?;

        let code = self.generator.generate();
        let stored = self
            .store
            .save(NewOtpCredential {
                owner: identity.id,
                code: code.clone(),
                issued_at,
                expires_at,
                device: device.map(str::to_string),
            })
            .await?;

        debug!(credential_id = stored.id, expires_at = %stored.expires_at, "otp stored");

        let message = OtpMessage::new(code, self.policy.ttl_minutes());
        if let Err(err) = self.notifier.send(&identity, &message).await {
            warn!(credential_id = stored.id, "otp delivery failed: {err}");
            return Err(OtpError::DeliveryFailed(err));
        }

        Ok(())
    }
}
