pub mod extractors;
pub mod middleware;
pub mod password;
pub mod token;

use crate::models::User;
use crate::verification::{is_valid_email, normalize_email};
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

// Re-export necessary items
pub use extractors::AuthenticatedUser;
pub use middleware::AuthMiddleware;
pub use password::{hash_password, verify_password};
pub use token::{generate_token, verify_token, Claims};

/// Format check applied to every email field, run against the *normalized*
/// address. Padding and case variants of a well-formed email are accepted;
/// the handlers normalize the same way before touching storage.
fn email_format(email: &str) -> Result<(), ValidationError> {
    if is_valid_email(&normalize_email(email)) {
        Ok(())
    } else {
        Err(ValidationError::new("email"))
    }
}

/// Represents the payload for a user login request.
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    /// User's email address.
    #[validate(custom = "email_format")]
    pub email: String,
    /// User's password.
    /// Must be at least 6 characters long.
    #[validate(length(min = 6))]
    pub password: String,
}

/// Represents the payload for a new user registration request.
///
/// The email is normalized (trimmed, lowercased) and checked against the
/// `local@domain.tld` pattern by the handler before anything is stored.
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    /// Email address for the new account.
    #[validate(custom = "email_format")]
    pub email: String,
    /// Display name for the new account.
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    /// Password for the new account.
    /// Must be at least 6 characters long.
    #[validate(length(min = 6))]
    pub password: String,
}

/// Payload for submitting a verification code.
#[derive(Debug, Deserialize, Validate)]
pub struct VerifyEmailRequest {
    #[validate(custom = "email_format")]
    pub email: String,
    /// The 6-digit code from the verification email.
    #[validate(length(equal = 6))]
    pub code: String,
}

/// Payload for requesting a fresh verification code.
#[derive(Debug, Deserialize, Validate)]
pub struct ResendVerificationRequest {
    #[validate(custom = "email_format")]
    pub email: String,
}

/// Response to a successful registration. No token is issued until the email
/// is verified.
#[derive(Debug, Serialize, Deserialize)]
pub struct RegisterResponse {
    pub email: String,
    pub verification_sent: bool,
}

/// Response structure after successful authentication (login or email
/// verification): the session JWT plus the authenticated user.
#[derive(Debug, Serialize, Deserialize)]
pub struct AuthResponse {
    /// The JWT (JSON Web Token) for session authentication.
    pub access_token: String,
    /// The authenticated user.
    pub user: User,
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[test]
    fn test_login_request_validation() {
        let valid_login = LoginRequest {
            email: "test@example.com".to_string(),
            password: "password123".to_string(),
        };
        assert!(valid_login.validate().is_ok());

        let invalid_email_login = LoginRequest {
            email: "testexample.com".to_string(),
            password: "password123".to_string(),
        };
        assert!(invalid_email_login.validate().is_err());

        let short_password_login = LoginRequest {
            email: "test@example.com".to_string(),
            password: "123".to_string(),
        };
        assert!(short_password_login.validate().is_err());
    }

    #[test]
    fn test_register_request_validation() {
        let valid_register = RegisterRequest {
            email: "test@example.com".to_string(),
            name: "Test User".to_string(),
            password: "password123".to_string(),
        };
        assert!(valid_register.validate().is_ok());

        let empty_name_register = RegisterRequest {
            email: "test@example.com".to_string(),
            name: "".to_string(),
            password: "password123".to_string(),
        };
        assert!(empty_name_register.validate().is_err());

        let short_password_register = RegisterRequest {
            email: "test@example.com".to_string(),
            name: "Test User".to_string(),
            password: "12345".to_string(),
        };
        assert!(short_password_register.validate().is_err());
    }

    #[test]
    fn test_padded_email_passes_validation() {
        // Padding and case are stripped by normalization before the format
        // gate, so these payloads must validate.
        let padded_login = LoginRequest {
            email: "  User@Example.COM ".to_string(),
            password: "password123".to_string(),
        };
        assert!(padded_login.validate().is_ok());

        let padded_register = RegisterRequest {
            email: "  User@Example.COM ".to_string(),
            name: "Test User".to_string(),
            password: "password123".to_string(),
        };
        assert!(padded_register.validate().is_ok());

        let padded_resend = ResendVerificationRequest {
            email: " test@example.com".to_string(),
        };
        assert!(padded_resend.validate().is_ok());

        let still_invalid = LoginRequest {
            email: "  not-an-email ".to_string(),
            password: "password123".to_string(),
        };
        assert!(still_invalid.validate().is_err());
    }

    #[test]
    fn test_verify_email_request_validation() {
        let valid = VerifyEmailRequest {
            email: "test@example.com".to_string(),
            code: "123456".to_string(),
        };
        assert!(valid.validate().is_ok());

        let wrong_length = VerifyEmailRequest {
            email: "test@example.com".to_string(),
            code: "1234".to_string(),
        };
        assert!(wrong_length.validate().is_err());
    }
}
