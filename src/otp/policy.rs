use chrono::Duration;
use thiserror::Error;

use super::code::DEFAULT_CODE_LENGTH;

pub const DEFAULT_TTL_SECONDS: i64 = 300;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PolicyError {
    #[error("code length must be between 1 and 10, got {0}")]
    CodeLength(usize),
    #[error("validity window out of range: {0} seconds")]
    Ttl(i64),
}

/// Issuance settings shared by the issuer and the verifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OtpPolicy {
    code_length: usize,
    ttl: Duration,
    invalidate_prior_on_issue: bool,
}

impl OtpPolicy {
    /// Upper bound matching the `otp_codes.code` column width.
    pub const MAX_CODE_LENGTH: usize = 10;

    /// Default policy: 6 digits, valid for 5 minutes, prior codes left alone.
    #[must_use]
    pub fn new() -> Self {
        Self {
            code_length: DEFAULT_CODE_LENGTH,
            ttl: Duration::seconds(DEFAULT_TTL_SECONDS),
            invalidate_prior_on_issue: false,
        }
    }

    /// # Errors
    /// Returns an error if `length` is zero or wider than [`Self::MAX_CODE_LENGTH`].
    pub fn with_code_length(mut self, length: usize) -> Result<Self, PolicyError> {
        if length == 0 || length > Self::MAX_CODE_LENGTH {
            return Err(PolicyError::CodeLength(length));
        }
        self.code_length = length;
        Ok(self)
    }

    /// # Errors
    /// Returns an error unless `seconds` is positive, which keeps `expires_at > issued_at`,
    /// and representable as a [`Duration`].
    pub fn with_ttl_seconds(mut self, seconds: i64) -> Result<Self, PolicyError> {
        if seconds <= 0 {
            return Err(PolicyError::Ttl(seconds));
        }
        self.ttl = Duration::try_seconds(seconds).ok_or(PolicyError::Ttl(seconds))?;
        Ok(self)
    }

    #[must_use]
    pub fn with_invalidate_prior_on_issue(mut self, invalidate: bool) -> Self {
        self.invalidate_prior_on_issue = invalidate;
        self
    }

    #[must_use]
    pub fn code_length(&self) -> usize {
        self.code_length
    }

    #[must_use]
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Whole minutes shown to the user, rounded up.
    #[must_use]
    pub fn ttl_minutes(&self) -> i64 {
        (self.ttl.num_seconds() + 59) / 60
    }

    #[must_use]
    pub fn invalidate_prior_on_issue(&self) -> bool {
        self.invalidate_prior_on_issue
    }
}

impl Default for OtpPolicy {
    fn default() -> Self {
        Self::new()
    }
}
