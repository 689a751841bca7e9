//! # otpgate (one-time passcode gate)
//!
//! `otpgate` issues short numeric one-time passcodes bound to a user, delivers them
//! out-of-band, and trades exactly one correct submission for a signed session token.
//!
//! ## Lifecycle
//!
//! - **Issue:** resolve the user, generate a code from a cryptographically secure
//!   source, persist it with an expiry, then deliver it by email.
//! - **Verify:** find the newest unconsumed, unexpired code for the user that equals the
//!   submission, consume it with a conditional update, then mint a token.
//!
//! A code is active while it is unconsumed and `now < expires_at`. Consumption happens
//! at most once even under concurrent submissions.
//!
//! ## Errors
//!
//! Wrong, expired, replayed and raced codes all collapse into one `InvalidOrExpired`
//! outcome. The HTTP layer also hides unknown users so the endpoints cannot be used to
//! probe accounts.

pub mod api;
pub mod cli;
pub mod identity;
pub mod notify;
pub mod otp;
pub mod token;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};
