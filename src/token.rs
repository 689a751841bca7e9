//! Session token minting for verified identities.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use ulid::Ulid;

use crate::identity::Identity;

#[derive(Debug, Error)]
pub enum MintError {
    #[error("failed to sign token: {0}")]
    Signing(String),
    #[error("invalid token configuration: {0}")]
    Config(String),
}

impl From<jsonwebtoken::errors::Error> for MintError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        Self::Signing(err.to_string())
    }
}

#[async_trait]
pub trait TokenIssuer: Send + Sync {
    /// Mint a signed, time-bound token for `identity`.
    async fn mint(&self, identity: &Identity) -> Result<String, MintError>;
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionClaims {
    pub sub: String,
    pub email: String,
    pub iss: String,
    pub iat: i64,
    pub exp: i64,
    pub jti: String,
}

/// HS256 JWT issuer.
#[derive(Clone)]
pub struct JwtTokenIssuer {
    key: EncodingKey,
    issuer: String,
    ttl: Duration,
}

impl JwtTokenIssuer {
    /// # Errors
    /// Returns an error if the secret is empty or the TTL is not a positive, representable
    /// number of seconds.
    pub fn new(secret: &SecretString, issuer: String, ttl_seconds: i64) -> Result<Self, MintError> {
        if secret.expose_secret().is_empty() {
            return Err(MintError::Config("token secret must not be empty".to_string()));
        }
        let ttl = Duration::try_seconds(ttl_seconds)
            .filter(|ttl| *ttl > Duration::zero())
            .ok_or_else(|| MintError::Config(format!("token ttl out of range: {ttl_seconds}")))?;

        Ok(Self {
            key: EncodingKey::from_secret(secret.expose_secret().as_bytes()),
            issuer,
            ttl,
        })
    }

    fn claims(&self, identity: &Identity, now: DateTime<Utc>) -> Result<SessionClaims, MintError> {
        let expires_at = now.checked_add_signed(self.ttl).ok_or_else(|| {
            MintError::Config(format!("token ttl overflows: {}s", self.ttl.num_seconds()))
        })?;

        Ok(SessionClaims {
            sub: identity.id.to_string(),
            email: identity.email.clone(),
            iss: self.issuer.clone(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
            jti: Ulid::new().to_string(),
        })
    }
}

impl std::fmt::Debug for JwtTokenIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtTokenIssuer")
            .field("key", &"***")
            .field("issuer", &self.issuer)
            .field("ttl", &self.ttl)
            .finish()
    }
}

#[async_trait]
impl TokenIssuer for JwtTokenIssuer {
    async fn mint(&self, identity: &Identity) -> Result<String, MintError> {
        let claims = self.claims(identity, Utc::now())?;
        Ok(encode(&Header::new(Algorithm::HS256), &claims, &self.key)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{decode, DecodingKey, Validation};
    use uuid::Uuid;

    const SECRET: &str = "a-test-secret-that-is-long-enough";

    fn alice() -> Identity {
        Identity {
            id: Uuid::new_v4(),
            email: "alice@example.com".to_string(),
        }
    }

    #[test]
    fn rejects_empty_secret_and_bad_ttl() {
        let empty = SecretString::from(String::new());
        assert!(matches!(
            JwtTokenIssuer::new(&empty, "otpgate".to_string(), 60),
            Err(MintError::Config(_))
        ));

        let secret = SecretString::from(SECRET.to_string());
        assert!(matches!(
            JwtTokenIssuer::new(&secret, "otpgate".to_string(), 0),
            Err(MintError::Config(_))
        ));
    }

    #[test]
    fn rejects_unrepresentable_ttl() {
        let secret = SecretString::from(SECRET.to_string());
        assert!(matches!(
            JwtTokenIssuer::new(&secret, "otpgate".to_string(), i64::MAX),
            Err(MintError::Config(_))
        ));
    }

    #[tokio::test]
    async fn overflowing_expiry_fails_to_mint() {
        let secret = SecretString::from(SECRET.to_string());
        let issuer =
            JwtTokenIssuer::new(&secret, "otpgate".to_string(), 9_000_000_000_000).unwrap();
        assert!(matches!(
            issuer.mint(&alice()).await,
            Err(MintError::Config(_))
        ));
    }

    #[tokio::test]
    async fn minted_token_carries_identity_claims() {
        let secret = SecretString::from(SECRET.to_string());
        let issuer = JwtTokenIssuer::new(&secret, "otpgate".to_string(), 3600).unwrap();
        let identity = alice();

        let token = issuer.mint(&identity).await.unwrap();
        assert!(!token.is_empty());

        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&["otpgate"]);
        let decoded = decode::<SessionClaims>(
            &token,
            &DecodingKey::from_secret(SECRET.as_bytes()),
            &validation,
        )
        .unwrap();

        assert_eq!(decoded.claims.sub, identity.id.to_string());
        assert_eq!(decoded.claims.email, "alice@example.com");
        assert_eq!(decoded.claims.exp - decoded.claims.iat, 3600);
    }

    #[tokio::test]
    async fn each_token_has_unique_id() {
        let secret = SecretString::from(SECRET.to_string());
        let issuer = JwtTokenIssuer::new(&secret, "otpgate".to_string(), 60).unwrap();
        let identity = alice();
        let first = issuer.mint(&identity).await.unwrap();
        let second = issuer.mint(&identity).await.unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn debug_hides_key() {
        let secret = SecretString::from(SECRET.to_string());
        let issuer = JwtTokenIssuer::new(&secret, "otpgate".to_string(), 60).unwrap();
        assert!(!format!("{issuer:?}").contains(SECRET));
    }
}
