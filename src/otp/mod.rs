//! One-time passcode issuance and verification.

pub mod clock;
pub mod code;
pub mod error;
pub mod issuer;
pub mod models;
pub mod policy;
pub mod repo;
pub mod service;
pub mod store;
pub mod verifier;

pub use clock::{Clock, ManualClock, SystemClock};
pub use code::{CodeGenerator, SecureRng};
pub use error::{OtpError, StoreError};
pub use issuer::OtpIssuer;
pub use models::{NewOtpCredential, OtpCredential};
pub use policy::{OtpPolicy, PolicyError};
pub use repo::PgOtpStore;
pub use service::{OtpService, OtpServiceBuilder};
pub use store::{MemoryOtpStore, OtpStore};
pub use verifier::OtpVerifier;
