use std::sync::Arc;

use super::clock::{Clock, SystemClock};
use super::code::CodeGenerator;
use super::error::OtpError;
use super::issuer::OtpIssuer;
use super::policy::OtpPolicy;
use super::store::OtpStore;
use super::verifier::OtpVerifier;
use crate::identity::UserDirectory;
use crate::notify::Notifier;
use crate::token::TokenIssuer;

/// Issuer and verifier sharing one set of collaborators.
#[derive(Clone)]
pub struct OtpService {
    issuer: OtpIssuer,
    verifier: OtpVerifier,
    policy: OtpPolicy,
}

impl OtpService {
    #[must_use]
    pub fn builder(
        directory: Arc<dyn UserDirectory>,
        store: Arc<dyn OtpStore>,
        notifier: Arc<dyn Notifier>,
        tokens: Arc<dyn TokenIssuer>,
    ) -> OtpServiceBuilder {
        OtpServiceBuilder {
            directory,
            store,
            notifier,
            tokens,
            clock: Arc::new(SystemClock),
            generator: None,
            policy: OtpPolicy::default(),
        }
    }

    #[must_use]
    pub fn policy(&self) -> OtpPolicy {
        self.policy
    }

    #[must_use]
    pub fn issuer(&self) -> &OtpIssuer {
        &self.issuer
    }

    #[must_use]
    pub fn verifier(&self) -> &OtpVerifier {
        &self.verifier
    }

    /// # Errors
    /// See [`OtpIssuer::issue`].
    pub async fn issue(&self, key: &str, device: Option<&str>) -> Result<(), OtpError> {
        self.issuer.issue(key, device).await
    }

    /// # Errors
    /// See [`OtpVerifier::verify`].
    pub async fn verify(
        &self,
        key: &str,
        code: &str,
        device: Option<&str>,
    ) -> Result<String, OtpError> {
        self.verifier.verify(key, code, device).await
    }
}

pub struct OtpServiceBuilder {
    directory: Arc<dyn UserDirectory>,
    store: Arc<dyn OtpStore>,
    notifier: Arc<dyn Notifier>,
    tokens: Arc<dyn TokenIssuer>,
    clock: Arc<dyn Clock>,
    generator: Option<CodeGenerator>,
    policy: OtpPolicy,
}

impl OtpServiceBuilder {
    #[must_use]
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Use a specific generator instead of one seeded from the OS.
    ///
    /// Its length wins over the policy's code length.
    #[must_use]
    pub fn generator(mut self, generator: CodeGenerator) -> Self {
        self.generator = Some(generator);
        self
    }

    #[must_use]
    pub fn policy(mut self, policy: OtpPolicy) -> Self {
        self.policy = policy;
        self
    }

    #[must_use]
    pub fn build(self) -> OtpService {
        let generator = Arc::new(
            self.generator
                .unwrap_or_else(|| CodeGenerator::new(self.policy.code_length())),
        );

        let issuer = OtpIssuer::new(
            self.directory.clone(),
            self.store.clone(),
            self.notifier,
            self.clock.clone(),
            generator,
            self.policy,
        );
        let verifier = OtpVerifier::new(self.directory, self.store, self.tokens, self.clock);

        OtpService {
            issuer,
            verifier,
            policy: self.policy,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::MemoryUserDirectory;
    use crate::notify::MemoryNotifier;
    use crate::otp::clock::ManualClock;
    use crate::otp::store::MemoryOtpStore;
    use crate::token::JwtTokenIssuer;
    use chrono::{TimeZone, Utc};
    use rand::{rngs::StdRng, SeedableRng};
    use secrecy::SecretString;

    #[tokio::test]
    async fn issue_then_verify_through_one_handle() {
        let directory = Arc::new(MemoryUserDirectory::new());
        directory.insert("alice@example.com").await;
        let notifier = Arc::new(MemoryNotifier::new());
        let tokens = JwtTokenIssuer::new(
            &SecretString::from("service-test-secret".to_string()),
            "otpgate".to_string(),
            60,
        )
        .unwrap();

        let service = OtpService::builder(
            directory,
            Arc::new(MemoryOtpStore::new()),
            notifier.clone(),
            Arc::new(tokens),
        )
        .clock(Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2026, 5, 4, 8, 30, 0).unwrap(),
        )))
        .generator(CodeGenerator::with_rng(4, StdRng::seed_from_u64(7)))
        .build();

        service.issue("alice@example.com", None).await.unwrap();
        let code = notifier.last_code_for("alice@example.com").await.unwrap();
        assert_eq!(code.len(), 4);

        let token = service
            .verify("alice@example.com", &code, None)
            .await
            .unwrap();
        assert_eq!(token.split('.').count(), 3);
    }

    #[test]
    fn builder_defaults_to_default_policy() {
        let service = OtpService::builder(
            Arc::new(MemoryUserDirectory::new()),
            Arc::new(MemoryOtpStore::new()),
            Arc::new(MemoryNotifier::new()),
            Arc::new(
                JwtTokenIssuer::new(
                    &SecretString::from("service-test-secret".to_string()),
                    "otpgate".to_string(),
                    60,
                )
                .unwrap(),
            ),
        )
        .build();
        assert_eq!(service.policy(), OtpPolicy::default());
    }
}
