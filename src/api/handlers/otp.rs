//! Passcode request and verification endpoints.

use axum::{extract::Extension, http::StatusCode, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, error, warn};
use utoipa::ToSchema;

use super::{non_empty, normalize_email, valid_email};
use crate::otp::{OtpError, OtpService};

pub const OTP_SENT_MESSAGE: &str = "OTP sent to your email";
pub const INVALID_OTP_MESSAGE: &str = "Invalid or expired OTP";

/// Width of the `otp_codes.machine` column.
const MAX_MACHINE_LENGTH: usize = 100;

#[derive(ToSchema, Deserialize, Debug, Default)]
pub struct OtpRequest {
    #[serde(default)]
    pub email: Option<String>,
    /// Optional device or session identifier recorded with the passcode.
    #[serde(default)]
    pub machine: Option<String>,
}

#[derive(ToSchema, Deserialize, Debug, Default)]
pub struct OtpVerifyRequest {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub machine: Option<String>,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct OtpSent {
    pub message: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct SessionToken {
    pub token: String,
}

/// Issue a passcode and email it (unknown emails get the same answer to avoid user enumeration).
#[utoipa::path(
    post,
    path = "/v1/otp/request",
    request_body = OtpRequest,
    responses(
        (status = 202, description = "Passcode issued", body = OtpSent),
        (status = 400, description = "Missing or malformed email", body = String),
        (status = 502, description = "Passcode could not be delivered", body = String),
        (status = 500, description = "Internal failure", body = String)
    ),
    tag = "otp"
)]
pub async fn request_otp(
    otp: Extension<Arc<OtpService>>,
    payload: Option<Json<OtpRequest>>,
) -> impl IntoResponse {
    let request: OtpRequest = match payload {
        Some(Json(payload)) => payload,
        None => return (StatusCode::BAD_REQUEST, "Missing payload".to_string()).into_response(),
    };

    let email = normalize_email(request.email.as_deref().unwrap_or_default());
    if !valid_email(&email) {
        return (StatusCode::BAD_REQUEST, "Invalid email".to_string()).into_response();
    }

    let machine = non_empty(request.machine.as_deref());
    if machine.is_some_and(|machine| machine.chars().count() > MAX_MACHINE_LENGTH) {
        return (StatusCode::BAD_REQUEST, "Invalid machine".to_string()).into_response();
    }

    match otp.issue(&email, machine).await {
        Ok(()) => {}
        Err(OtpError::IdentityNotFound) => debug!("otp requested for unknown email"),
        Err(OtpError::DeliveryFailed(err)) => {
            warn!("Failed to deliver OTP: {err}");
            return (StatusCode::BAD_GATEWAY, "Failed to send OTP".to_string()).into_response();
        }
        Err(err) => {
            error!("Failed to issue OTP: {err}");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to issue OTP".to_string(),
            )
                .into_response();
        }
    }

    (
        StatusCode::ACCEPTED,
        Json(OtpSent {
            message: OTP_SENT_MESSAGE.to_string(),
        }),
    )
        .into_response()
}

/// Redeem a passcode for a session token.
#[utoipa::path(
    post,
    path = "/v1/otp/verify",
    request_body = OtpVerifyRequest,
    responses(
        (status = 200, description = "Passcode accepted", body = SessionToken),
        (status = 400, description = "Missing fields or invalid/expired passcode", body = String),
        (status = 500, description = "Internal failure", body = String)
    ),
    tag = "otp"
)]
pub async fn verify_otp(
    otp: Extension<Arc<OtpService>>,
    payload: Option<Json<OtpVerifyRequest>>,
) -> impl IntoResponse {
    let request: OtpVerifyRequest = match payload {
        Some(Json(payload)) => payload,
        None => return (StatusCode::BAD_REQUEST, "Missing payload".to_string()).into_response(),
    };

    let email = non_empty(request.email.as_deref()).map(normalize_email);
    // Codes match byte for byte, so only an absent or empty code is rejected here.
    let code = request.code.as_deref().filter(|code| !code.is_empty());
    let (Some(email), Some(code)) = (email, code) else {
        return (
            StatusCode::BAD_REQUEST,
            "Email and code are required".to_string(),
        )
            .into_response();
    };

    match otp
        .verify(&email, code, non_empty(request.machine.as_deref()))
        .await
    {
        Ok(token) => (StatusCode::OK, Json(SessionToken { token })).into_response(),
        // Unknown users and bad codes share one answer.
        Err(OtpError::IdentityNotFound | OtpError::InvalidOrExpired) => {
            (StatusCode::BAD_REQUEST, INVALID_OTP_MESSAGE.to_string()).into_response()
        }
        Err(err) => {
            error!("Failed to verify OTP: {err}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Verification failed".to_string(),
            )
                .into_response()
        }
    }
}
