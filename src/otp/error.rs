use thiserror::Error;

use super::policy::PolicyError;
use crate::identity::DirectoryError;
use crate::notify::DeliveryError;
use crate::token::MintError;

/// Persistence failure reported by an [`OtpStore`](super::store::OtpStore).
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Outcomes surfaced by issuance and verification.
///
/// `InvalidOrExpired` deliberately covers a wrong code, an expired code, a replay,
/// and a lost consumption race so callers cannot tell them apart.
#[derive(Debug, Error)]
pub enum OtpError {
    #[error("identity not found")]
    IdentityNotFound,
    #[error("invalid or expired OTP")]
    InvalidOrExpired,
    #[error("failed to deliver OTP")]
    DeliveryFailed(#[source] DeliveryError),
    #[error("credential store failure")]
    Store(#[from] StoreError),
    #[error("failed to mint token")]
    Mint(#[from] MintError),
    #[error("user lookup failure")]
    UserLookup(#[from] DirectoryError),
    #[error("invalid policy: {0}")]
    Policy(#[from] PolicyError),
}

impl OtpError {
    /// Infrastructure failures are reported apart from user-input failures.
    #[must_use]
    pub fn is_infrastructure(&self) -> bool {
        matches!(
            self,
            Self::DeliveryFailed(_)
                | Self::Store(_)
                | Self::Mint(_)
                | Self::UserLookup(_)
                | Self::Policy(_)
        )
    }
}

impl From<DeliveryError> for OtpError {
    fn from(err: DeliveryError) -> Self {
        Self::DeliveryFailed(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_input_failures_are_not_infrastructure() {
        assert!(!OtpError::IdentityNotFound.is_infrastructure());
        assert!(!OtpError::InvalidOrExpired.is_infrastructure());
    }

    #[test]
    fn collaborator_failures_are_infrastructure() {
        let store = OtpError::from(StoreError::Unavailable("down".to_string()));
        assert!(store.is_infrastructure());

        let delivery = OtpError::from(DeliveryError::Transport("refused".to_string()));
        assert!(matches!(delivery, OtpError::DeliveryFailed(_)));
        assert!(delivery.is_infrastructure());

        let mint = OtpError::from(MintError::Signing("bad key".to_string()));
        assert!(mint.is_infrastructure());

        let policy = OtpError::from(PolicyError::Ttl(i64::MAX));
        assert!(policy.is_infrastructure());
    }

    #[test]
    fn invalid_or_expired_message_is_generic() {
        assert_eq!(OtpError::InvalidOrExpired.to_string(), "invalid or expired OTP");
    }
}
