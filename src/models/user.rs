use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Public representation of a user, as returned by the API.
#[derive(Debug, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: i32,
    pub email: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// Full user row, including the password hash and verification flag.
/// Never serialized; used internally by the auth routes.
#[derive(Debug, FromRow)]
pub struct UserCredentials {
    pub id: i32,
    pub email: String,
    pub name: String,
    pub password_hash: String,
    pub email_verified: bool,
    pub created_at: DateTime<Utc>,
}

impl UserCredentials {
    /// Strips the credential fields, leaving the public representation.
    pub fn into_user(self) -> User {
        User {
            id: self.id,
            email: self.email,
            name: self.name,
            created_at: self.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_into_user_drops_credentials() {
        let row = UserCredentials {
            id: 1,
            email: "test@example.com".to_string(),
            name: "Test".to_string(),
            password_hash: "$2b$12$hash".to_string(),
            email_verified: true,
            created_at: Utc::now(),
        };
        let user = row.into_user();
        assert_eq!(user.id, 1);
        assert_eq!(user.email, "test@example.com");

        let value = serde_json::to_value(&user).unwrap();
        assert!(value.get("password_hash").is_none());
        assert!(value.get("email_verified").is_none());
    }
}
