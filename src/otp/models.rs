use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{postgres::PgRow, FromRow, Row};
use uuid::Uuid;

/// A persisted one-time passcode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OtpCredential {
    pub id: i64,
    pub owner: Uuid,
    pub code: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub consumed: bool,
    pub device: Option<String>,
}

impl OtpCredential {
    /// A credential can be redeemed only while unconsumed and strictly before `expires_at`.
    #[must_use]
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        !self.consumed && now < self.expires_at
    }
}

/// Credential fields known before the store assigns an id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOtpCredential {
    pub owner: Uuid,
    pub code: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub device: Option<String>,
}

impl NewOtpCredential {
    #[must_use]
    pub fn into_credential(self, id: i64) -> OtpCredential {
        OtpCredential {
            id,
            owner: self.owner,
            code: self.code,
            issued_at: self.issued_at,
            expires_at: self.expires_at,
            consumed: false,
            device: self.device,
        }
    }
}

impl<'r> FromRow<'r, PgRow> for OtpCredential {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            owner: row.try_get("user_id")?,
            code: row.try_get("code")?,
            issued_at: row.try_get("creation_date")?,
            expires_at: row.try_get("exp_date")?,
            consumed: row.try_get("used")?,
            device: row.try_get("machine")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn credential(consumed: bool) -> OtpCredential {
        let issued_at = Utc.with_ymd_and_hms(2026, 1, 1, 12, 0, 0).unwrap();
        OtpCredential {
            id: 1,
            owner: Uuid::nil(),
            code: "123456".to_string(),
            issued_at,
            expires_at: issued_at + Duration::minutes(5),
            consumed,
            device: None,
        }
    }

    #[test]
    fn active_until_the_last_instant_before_expiry() {
        let otp = credential(false);
        assert!(otp.is_active(otp.issued_at));
        assert!(otp.is_active(otp.expires_at - Duration::nanoseconds(1)));
        assert!(!otp.is_active(otp.expires_at));
        assert!(!otp.is_active(otp.expires_at + Duration::seconds(1)));
    }

    #[test]
    fn consumed_is_never_active() {
        let otp = credential(true);
        assert!(!otp.is_active(otp.issued_at));
    }

    #[test]
    fn into_credential_starts_unconsumed() {
        let otp = credential(false);
        let new = NewOtpCredential {
            owner: otp.owner,
            code: otp.code.clone(),
            issued_at: otp.issued_at,
            expires_at: otp.expires_at,
            device: Some("laptop".to_string()),
        };
        let stored = new.into_credential(42);
        assert_eq!(stored.id, 42);
        assert!(!stored.consumed);
        assert_eq!(stored.device.as_deref(), Some("laptop"));
    }
}
