//! Account DTOs for sign-up, sign-in and profile.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::ChatError;
use crate::persistence::models::PublicUser;

/// Request body for `POST /api/users/create` and `POST /api/users/auth`.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CredentialsRequest {
    /// Login name: at least 5 ASCII letters or digits.
    pub username: String,
    /// Password: 6 to 32 characters.
    pub password: String,
    /// Client installation identifier, embedded into the issued token.
    pub application_id: Uuid,
}

impl CredentialsRequest {
    /// Checks the username and password rules.
    ///
    /// # Errors
    ///
    /// Returns [`ChatError::InvalidRequest`] describing the first broken rule.
    pub fn validate(&self) -> Result<(), ChatError> {
        if self.username.len() < 5 || !self.username.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(ChatError::InvalidRequest(
                "username must be at least 5 ASCII letters or digits".to_string(),
            ));
        }
        let password_len = self.password.chars().count();
        if !(6..=32).contains(&password_len) {
            return Err(ChatError::InvalidRequest(
                "password must be 6 to 32 characters".to_string(),
            ));
        }
        Ok(())
    }
}

/// Response body for sign-up and sign-in.
#[derive(Debug, Serialize, ToSchema)]
pub struct AuthResponse {
    /// The signed-in account.
    pub user: PublicUser,
    /// Bearer token for subsequent requests.
    pub access_token: String,
    /// Token lifetime in seconds.
    pub expires_in: u64,
}

/// Response body for `GET /api/users/my`.
#[derive(Debug, Serialize, ToSchema)]
pub struct UserResponse {
    /// The caller's account.
    pub user: PublicUser,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(username: &str, password: &str) -> CredentialsRequest {
        CredentialsRequest {
            username: username.to_string(),
            password: password.to_string(),
            application_id: Uuid::nil(),
        }
    }

    #[test]
    fn valid_credentials_pass() {
        assert!(request("alice1", "secret").validate().is_ok());
        assert!(request("Bob42", &"p".repeat(32)).validate().is_ok());
    }

    #[test]
    fn short_or_symbolic_username_is_rejected() {
        assert!(request("bob", "secret").validate().is_err());
        assert!(request("alice_1", "secret").validate().is_err());
        assert!(request("alicé1", "secret").validate().is_err());
    }

    #[test]
    fn password_length_is_bounded() {
        assert!(request("alice1", "12345").validate().is_err());
        assert!(request("alice1", &"p".repeat(33)).validate().is_err());
    }
}
