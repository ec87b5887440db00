//!
//! # Verification Lifecycle
//!
//! Coordinates the two-phase registration flow: an account is created
//! unverified, a 6-digit code is emailed to its address, and the account is
//! promoted to verified when the code comes back in time. Registrations that
//! are never verified are reclaimed by a delayed cleanup job.
//!
//! The auth routes drive these helpers from inside their own transactions so
//! that a failed email send rolls back the whole registration.

use crate::error::AppError;
use crate::models::VerificationCode;
use chrono::Utc;
use lazy_static::lazy_static;
use rand::Rng;
use sqlx::{PgPool, Postgres, Transaction};
use std::time::Duration;

lazy_static! {
    // Standard local@domain.tld shape. The validator crate's email check is
    // looser (it accepts dotless domains), so the format is pinned here.
    static ref EMAIL_REGEX: regex::Regex =
        regex::Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}$").unwrap();
}

/// Lowercases and trims an email address. All storage and lookups go through
/// this so that case variants of one address map to one identity.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_REGEX.is_match(email)
}

/// Generates a 6-digit decimal verification code, zero-padded.
pub fn generate_code() -> String {
    let n: u32 = rand::thread_rng().gen_range(0..1_000_000);
    format!("{:06}", n)
}

/// Deletes every outstanding code for `email` and inserts a fresh one with a
/// 10-minute expiry, returning the new code. Prior codes (including expired
/// leftovers) never survive an issuance, keeping at most one active code per
/// email.
pub async fn issue_code(
    tx: &mut Transaction<'_, Postgres>,
    email: &str,
) -> Result<String, AppError> {
    sqlx::query("DELETE FROM verification_codes WHERE email = $1")
        .bind(email)
        .execute(&mut **tx)
        .await?;

    let code = generate_code();
    let now = Utc::now();
    sqlx::query(
        "INSERT INTO verification_codes (email, code, created_at, expires_at, verified)
         VALUES ($1, $2, $3, $4, false)",
    )
    .bind(email)
    .bind(&code)
    .bind(now)
    .bind(VerificationCode::expiry_from(now))
    .execute(&mut **tx)
    .await?;

    Ok(code)
}

/// Removes an unverified registration: its codes first, then the user row.
/// Rows that are already gone count as success.
pub async fn discard_unverified(
    tx: &mut Transaction<'_, Postgres>,
    email: &str,
) -> Result<(), AppError> {
    sqlx::query("DELETE FROM verification_codes WHERE email = $1")
        .bind(email)
        .execute(&mut **tx)
        .await?;
    sqlx::query("DELETE FROM users WHERE email = $1 AND email_verified = false")
        .bind(email)
        .execute(&mut **tx)
        .await?;
    Ok(())
}

/// Reclaims an abandoned registration if, at call time, the user is still
/// unverified. Returns whether a user row was removed.
///
/// This runs detached from the registration request, so it opens its own
/// transaction and re-checks state instead of trusting anything from
/// registration time. A user that verified or re-registered in the meantime
/// makes this a no-op.
pub async fn cleanup_unverified(pool: &PgPool, email: &str) -> Result<bool, sqlx::Error> {
    let mut tx = pool.begin().await?;

    let unverified: Option<(i32,)> =
        sqlx::query_as("SELECT id FROM users WHERE email = $1 AND email_verified = false")
            .bind(email)
            .fetch_optional(&mut *tx)
            .await?;

    let Some((user_id,)) = unverified else {
        // Verified in time, or already gone. Either way there is nothing to do.
        tx.commit().await?;
        return Ok(false);
    };

    sqlx::query("DELETE FROM verification_codes WHERE email = $1")
        .bind(email)
        .execute(&mut *tx)
        .await?;
    sqlx::query("DELETE FROM users WHERE id = $1")
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok(true)
}

/// Schedules a one-shot cleanup of `email`'s registration after `delay`.
///
/// Fire-and-forget: there is no cancellation handle. If the user verifies
/// before the timer fires, the re-check inside `cleanup_unverified` is what
/// prevents destructive action. Failures are logged and swallowed; no live
/// request is waiting on this.
pub fn schedule_cleanup(pool: PgPool, email: String, delay: Duration) {
    tokio::spawn(async move {
        tokio::time::sleep(delay).await;
        match cleanup_unverified(&pool, &email).await {
            Ok(true) => log::info!("Removed unverified registration for {}", email),
            Ok(false) => {}
            Err(e) => log::warn!("Cleanup of unverified registration {} failed: {}", email, e),
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email("  User@Example.COM "), "user@example.com");
        assert_eq!(normalize_email("plain@example.com"), "plain@example.com");
    }

    #[test]
    fn test_email_format() {
        assert!(is_valid_email("test@example.com"));
        assert!(is_valid_email("user.name+tag@sub.example.co"));

        assert!(!is_valid_email("invalid-email"));
        assert!(!is_valid_email("@example.com"));
        assert!(!is_valid_email("test@"));
        assert!(!is_valid_email("test.example.com"));
        assert!(!is_valid_email("test@domain"));
        assert!(!is_valid_email(""));
    }

    #[test]
    fn test_generate_code_shape() {
        for _ in 0..100 {
            let code = generate_code();
            assert_eq!(code.len(), 6);
            assert!(code.chars().all(|c| c.is_ascii_digit()), "bad code {}", code);
        }
    }
}
