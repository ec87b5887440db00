use chrono::{DateTime, Duration, Utc};
use sqlx::FromRow;

/// Minutes before a verification code expires.
pub const CODE_TTL_MINUTES: i64 = 10;

/// A single-use email verification credential.
///
/// Deliberately not foreign-keyed to a user row: the user may be deleted and
/// re-registered while a code is outstanding, and the code must survive that
/// independently. Matching is by email.
#[derive(Debug, Clone, FromRow)]
pub struct VerificationCode {
    pub id: i32,
    pub email: String,
    pub code: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub verified: bool,
}

impl VerificationCode {
    pub fn is_expired(&self) -> bool {
        Utc::now() > self.expires_at
    }

    /// Expiry timestamp for a code issued now.
    pub fn expiry_from(created_at: DateTime<Utc>) -> DateTime<Utc> {
        created_at + Duration::minutes(CODE_TTL_MINUTES)
    }
}
