//! Key exchange DTOs.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::common_dto::require_non_empty;
use crate::error::ChatError;
use crate::persistence::models::{PublicKeyRow, SessionKeyRow};

/// Request body for `PUT /api/users/{id}/key`.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct PutPublicKeyRequest {
    /// Key agreement algorithm label.
    pub algo: String,
    /// Encoded public key.
    pub value: String,
}

impl PutPublicKeyRequest {
    /// Rejects blank fields.
    ///
    /// # Errors
    ///
    /// Returns [`ChatError::InvalidRequest`] naming the blank field.
    pub fn validate(&self) -> Result<(), ChatError> {
        require_non_empty("algo", &self.algo)?;
        require_non_empty("value", &self.value)
    }
}

/// Request body for `PUT /api/users/{id}/sessionKey`.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct PutSessionKeyRequest {
    /// Cipher label.
    pub algo: String,
    /// Encrypted session key.
    pub value: String,
    /// Initialisation vector.
    pub iv: String,
}

impl PutSessionKeyRequest {
    /// Rejects blank fields.
    ///
    /// # Errors
    ///
    /// Returns [`ChatError::InvalidRequest`] naming the blank field.
    pub fn validate(&self) -> Result<(), ChatError> {
        require_non_empty("algo", &self.algo)?;
        require_non_empty("value", &self.value)?;
        require_non_empty("iv", &self.iv)
    }
}

/// A public key.
#[derive(Debug, Serialize, ToSchema)]
pub struct PublicKeyResponse {
    /// The stored key.
    pub key: PublicKeyRow,
}

/// A public key the caller may not have installed yet.
#[derive(Debug, Serialize, ToSchema)]
pub struct MaybePublicKeyResponse {
    /// The stored key, or `null`.
    pub key: Option<PublicKeyRow>,
}

/// A session key.
#[derive(Debug, Serialize, ToSchema)]
pub struct SessionKeyResponse {
    /// The stored key.
    pub key: SessionKeyRow,
}

/// A session key the caller may not have uploaded yet.
#[derive(Debug, Serialize, ToSchema)]
pub struct MaybeSessionKeyResponse {
    /// The stored key, or `null`.
    pub key: Option<SessionKeyRow>,
}
