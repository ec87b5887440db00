use crate::{
    auth::{
        generate_token, hash_password, verify_password, AuthResponse, AuthenticatedUser,
        LoginRequest, RegisterRequest, RegisterResponse, ResendVerificationRequest,
        VerifyEmailRequest,
    },
    config::Config,
    email::{send_verification_email, Mailer},
    error::AppError,
    models::{User, UserCredentials, VerificationCode},
    verification,
};
use actix_web::{get, post, web, HttpResponse, Responder};
use serde_json::json;
use sqlx::PgPool;
use std::time::Duration;
use validator::Validate;

const USER_COLUMNS: &str = "id, email, name, password_hash, email_verified, created_at";

/// Register a new user account, pending email verification.
///
/// Creates an unverified user, emails a 6-digit code, and schedules the
/// delayed cleanup that reclaims the registration if it is never verified.
/// No session token is issued at this stage.
///
/// ## Responses:
/// - `201 Created`: `{email, verification_sent: true}`.
/// - `400 Bad Request`: Malformed payload or email format.
/// - `409 Conflict`: A *verified* account already uses this email. An
///   unverified one is silently discarded and registration starts fresh.
/// - `500 Internal Server Error`: The verification email could not be sent;
///   the user and code are fully rolled back.
#[post("/register")]
pub async fn register(
    pool: web::Data<PgPool>,
    mailer: web::Data<dyn Mailer>,
    config: web::Data<Config>,
    register_data: web::Json<RegisterRequest>,
) -> Result<impl Responder, AppError> {
    register_data.validate()?;

    let email = verification::normalize_email(&register_data.email);

    let mut tx = pool.begin().await?;

    let existing: Option<(i32, bool)> =
        sqlx::query_as("SELECT id, email_verified FROM users WHERE email = $1")
            .bind(&email)
            .fetch_optional(&mut *tx)
            .await?;

    if let Some((_, verified)) = existing {
        if verified {
            return Err(AppError::Conflict("Email already in use".into()));
        }
        // A stale unverified registration: drop it and start over, so a user
        // who lost the first code can simply register again.
        verification::discard_unverified(&mut tx, &email).await?;
    }

    let password_hash = hash_password(&register_data.password)?;

    sqlx::query(
        "INSERT INTO users (email, name, password_hash, email_verified)
         VALUES ($1, $2, $3, false)",
    )
    .bind(&email)
    .bind(&register_data.name)
    .bind(&password_hash)
    .execute(&mut *tx)
    .await?;

    let code = verification::issue_code(&mut tx, &email).await?;

    // The send happens before commit: a delivery failure drops the
    // transaction, leaving no orphaned unverified account behind.
    send_verification_email(mailer.get_ref(), &email, &code).await?;

    tx.commit().await?;

    verification::schedule_cleanup(
        pool.get_ref().clone(),
        email.clone(),
        Duration::from_secs(config.cleanup_delay_secs),
    );

    Ok(HttpResponse::Created().json(RegisterResponse {
        email,
        verification_sent: true,
    }))
}

/// Verify an email address with the code from the verification email.
///
/// On success the user is promoted to verified, the code is consumed, and a
/// session token is issued.
///
/// ## Responses:
/// - `200 OK`: `{access_token, user}`.
/// - `400 Bad Request`: Unknown or expired code.
/// - `404 Not Found`: No unverified user for this email. Deliberately covers
///   both "never registered" and "already verified".
#[post("/verify-email")]
pub async fn verify_email(
    pool: web::Data<PgPool>,
    verify_data: web::Json<VerifyEmailRequest>,
) -> Result<impl Responder, AppError> {
    verify_data.validate()?;

    let email = verification::normalize_email(&verify_data.email);

    let mut tx = pool.begin().await?;

    let user: Option<UserCredentials> = sqlx::query_as(&format!(
        "SELECT {} FROM users WHERE email = $1 AND email_verified = false",
        USER_COLUMNS
    ))
    .bind(&email)
    .fetch_optional(&mut *tx)
    .await?;

    let Some(user) = user else {
        return Err(AppError::NotFound(
            "No pending verification for this email".into(),
        ));
    };

    let code: Option<VerificationCode> = sqlx::query_as(
        "SELECT id, email, code, created_at, expires_at, verified
         FROM verification_codes
         WHERE email = $1 AND code = $2 AND verified = false",
    )
    .bind(&email)
    .bind(&verify_data.code)
    .fetch_optional(&mut *tx)
    .await?;

    let Some(code) = code else {
        return Err(AppError::BadRequest("Invalid verification code".into()));
    };

    if code.is_expired() {
        // The row stays; register/resend reap expired codes when they issue
        // a replacement.
        return Err(AppError::BadRequest("Verification code expired".into()));
    }

    sqlx::query("UPDATE users SET email_verified = true WHERE id = $1")
        .bind(user.id)
        .execute(&mut *tx)
        .await?;
    sqlx::query("UPDATE verification_codes SET verified = true WHERE id = $1")
        .bind(code.id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    let access_token = generate_token(user.id)?;

    Ok(HttpResponse::Ok().json(AuthResponse {
        access_token,
        user: user.into_user(),
    }))
}

/// Send a fresh verification code, invalidating all previous ones.
///
/// ## Responses:
/// - `200 OK`: `{email, verification_sent: true}`.
/// - `404 Not Found`: No unverified user for this email.
/// - `500 Internal Server Error`: Delivery failed; the old codes are restored
///   by the rollback.
#[post("/resend-verification")]
pub async fn resend_verification(
    pool: web::Data<PgPool>,
    mailer: web::Data<dyn Mailer>,
    resend_data: web::Json<ResendVerificationRequest>,
) -> Result<impl Responder, AppError> {
    resend_data.validate()?;

    let email = verification::normalize_email(&resend_data.email);

    let mut tx = pool.begin().await?;

    let unverified: Option<(i32,)> =
        sqlx::query_as("SELECT id FROM users WHERE email = $1 AND email_verified = false")
            .bind(&email)
            .fetch_optional(&mut *tx)
            .await?;

    if unverified.is_none() {
        return Err(AppError::NotFound(
            "No pending verification for this email".into(),
        ));
    }

    let code = verification::issue_code(&mut tx, &email).await?;
    send_verification_email(mailer.get_ref(), &email, &code).await?;

    tx.commit().await?;

    Ok(HttpResponse::Ok().json(RegisterResponse {
        email,
        verification_sent: true,
    }))
}

/// Login with email and password.
///
/// ## Responses:
/// - `200 OK`: `{access_token, user}`.
/// - `401 Unauthorized`: Unknown email and wrong password are
///   indistinguishable; a correct password against an unverified account gets
///   its own message so the client can offer a resend.
#[post("/login")]
pub async fn login(
    pool: web::Data<PgPool>,
    login_data: web::Json<LoginRequest>,
) -> Result<impl Responder, AppError> {
    login_data.validate()?;

    let email = verification::normalize_email(&login_data.email);

    let user: Option<UserCredentials> =
        sqlx::query_as(&format!("SELECT {} FROM users WHERE email = $1", USER_COLUMNS))
            .bind(&email)
            .fetch_optional(&**pool)
            .await?;

    let Some(user) = user else {
        return Err(AppError::Unauthorized("Invalid credentials".into()));
    };

    if !verify_password(&login_data.password, &user.password_hash)? {
        return Err(AppError::Unauthorized("Invalid credentials".into()));
    }

    if !user.email_verified {
        return Err(AppError::Unauthorized(
            "Email not verified. Please check your inbox.".into(),
        ));
    }

    let access_token = generate_token(user.id)?;

    Ok(HttpResponse::Ok().json(AuthResponse {
        access_token,
        user: user.into_user(),
    }))
}

/// Fetch the authenticated user's own profile.
#[get("/me")]
pub async fn me(
    pool: web::Data<PgPool>,
    auth: AuthenticatedUser,
) -> Result<impl Responder, AppError> {
    let user: Option<User> =
        sqlx::query_as("SELECT id, email, name, created_at FROM users WHERE id = $1")
            .bind(auth.id)
            .fetch_optional(&**pool)
            .await?;

    match user {
        Some(user) => Ok(HttpResponse::Ok().json(json!({ "user": user }))),
        None => Err(AppError::NotFound("User not found".into())),
    }
}
