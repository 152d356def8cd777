//! Access tokens and password hashing.
//!
//! Tokens are HS256 JWTs signed with one server secret. The `sub` claim
//! carries the account id; `application_id` identifies the client
//! installation that signed in.

use std::fmt;
use std::sync::LazyLock;
use std::time::Duration;

use argon2::Argon2;
use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::UserId;
use crate::error::ChatError;

/// Claims embedded in every access token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Account id as a decimal string.
    pub sub: String,
    /// Client installation the token was issued to.
    pub application_id: Uuid,
    /// Issued at (Unix seconds).
    pub iat: i64,
    /// Not before (Unix seconds).
    pub nbf: i64,
    /// Expiration (Unix seconds).
    pub exp: i64,
    /// Issuer.
    pub iss: String,
}

impl Claims {
    /// Parses the subject back into a [`UserId`].
    ///
    /// # Errors
    ///
    /// Returns [`ChatError::Unauthorized`] if the subject is not numeric.
    pub fn user_id(&self) -> Result<UserId, ChatError> {
        self.sub
            .parse()
            .map_err(|_| ChatError::Unauthorized("malformed token subject".to_string()))
    }
}

/// Signs and verifies access tokens.
#[derive(Clone)]
pub struct TokenIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    issuer: String,
    lifetime: Duration,
}

impl TokenIssuer {
    /// Creates an issuer for the given HMAC secret.
    #[must_use]
    pub fn new(secret: &[u8], issuer: impl Into<String>, lifetime: Duration) -> Self {
        let issuer = issuer.into();
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[issuer.as_str()]);
        validation.validate_nbf = true;

        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
            issuer,
            lifetime,
        }
    }

    /// Token lifetime.
    #[must_use]
    pub fn lifetime(&self) -> Duration {
        self.lifetime
    }

    /// Issues an access token for `user`.
    ///
    /// # Errors
    ///
    /// Returns [`ChatError::Internal`] if signing fails.
    pub fn issue(&self, user: UserId, application_id: Uuid) -> Result<String, ChatError> {
        let now = Utc::now().timestamp();
        let lifetime = i64::try_from(self.lifetime.as_secs()).unwrap_or(i64::MAX);
        let claims = Claims {
            sub: user.to_string(),
            application_id,
            iat: now - 1,
            nbf: now - 1,
            exp: now.saturating_add(lifetime),
            iss: self.issuer.clone(),
        };
        self.sign(&claims)
    }

    fn sign(&self, claims: &Claims) -> Result<String, ChatError> {
        jsonwebtoken::encode(&Header::new(Algorithm::HS256), claims, &self.encoding)
            .map_err(|e| ChatError::Internal(format!("failed to sign token: {e}")))
    }

    /// Verifies signature, issuer and validity window of `token`.
    ///
    /// # Errors
    ///
    /// Returns [`ChatError::Unauthorized`] for any invalid token.
    pub fn verify(&self, token: &str) -> Result<Claims, ChatError> {
        jsonwebtoken::decode::<Claims>(token, &self.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| ChatError::Unauthorized(e.to_string()))
    }
}

impl fmt::Debug for TokenIssuer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenIssuer")
            .field("issuer", &self.issuer)
            .field("lifetime", &self.lifetime)
            .finish_non_exhaustive()
    }
}

/// Hashes a password with Argon2id and a random salt.
///
/// # Errors
///
/// Returns [`ChatError::Internal`] if hashing fails.
pub fn hash_password(password: &str) -> Result<String, ChatError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| ChatError::Internal(format!("failed to hash password: {e}")))
}

/// Checks a password against a stored PHC hash string.
///
/// # Errors
///
/// Returns [`ChatError::InvalidCredentials`] on mismatch and
/// [`ChatError::Internal`] if the stored hash is unreadable.
pub fn verify_password(password: &str, hash: &str) -> Result<(), ChatError> {
    let parsed = PasswordHash::new(hash)
        .map_err(|e| ChatError::Internal(format!("unreadable password hash: {e}")))?;
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .map_err(|_| ChatError::InvalidCredentials)
}

/// Hash checked against when the account does not exist, so a sign-in
/// with an unknown username costs one Argon2 verification like any other.
static DECOY_HASH: LazyLock<Option<String>> =
    LazyLock::new(|| hash_password("sealed-chat-decoy-password").ok());

/// Runs a password check that always fails, taking as long as a real one.
///
/// # Errors
///
/// Always returns [`ChatError::InvalidCredentials`].
pub fn reject_unknown_account(password: &str) -> Result<(), ChatError> {
    if let Some(hash) = DECOY_HASH.as_deref() {
        let _ = verify_password(password, hash);
    }
    Err(ChatError::InvalidCredentials)
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    fn issuer() -> TokenIssuer {
        TokenIssuer::new(b"test-secret", "sealed-chat", Duration::from_secs(3600))
    }

    #[test]
    fn issued_token_verifies() {
        let tokens = issuer();
        let app = Uuid::new_v4();
        let Ok(token) = tokens.issue(UserId::new(42), app) else {
            panic!("signing should succeed");
        };

        let Ok(claims) = tokens.verify(&token) else {
            panic!("fresh token should verify");
        };
        assert_eq!(claims.application_id, app);
        assert_eq!(claims.iss, "sealed-chat");
        assert!(matches!(claims.user_id(), Ok(id) if id == UserId::new(42)));
    }

    #[test]
    fn token_from_other_secret_is_rejected() {
        let other = TokenIssuer::new(b"other-secret", "sealed-chat", Duration::from_secs(3600));
        let Ok(token) = other.issue(UserId::new(1), Uuid::new_v4()) else {
            panic!("signing should succeed");
        };
        assert!(matches!(issuer().verify(&token), Err(ChatError::Unauthorized(_))));
    }

    #[test]
    fn token_from_other_issuer_is_rejected() {
        let other = TokenIssuer::new(b"test-secret", "someone-else", Duration::from_secs(3600));
        let Ok(token) = other.issue(UserId::new(1), Uuid::new_v4()) else {
            panic!("signing should succeed");
        };
        assert!(issuer().verify(&token).is_err());
    }

    #[test]
    fn expired_token_is_rejected() {
        let tokens = issuer();
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: "1".to_string(),
            application_id: Uuid::new_v4(),
            iat: now - 7200,
            nbf: now - 7200,
            exp: now - 3600,
            iss: "sealed-chat".to_string(),
        };
        let Ok(token) = tokens.sign(&claims) else {
            panic!("signing should succeed");
        };
        assert!(tokens.verify(&token).is_err());
    }

    #[test]
    fn garbage_token_is_rejected() {
        assert!(issuer().verify("not.a.jwt").is_err());
    }

    #[test]
    fn non_numeric_subject_is_unauthorized() {
        let claims = Claims {
            sub: "root".to_string(),
            application_id: Uuid::nil(),
            iat: 0,
            nbf: 0,
            exp: 0,
            iss: String::new(),
        };
        assert!(matches!(claims.user_id(), Err(ChatError::Unauthorized(_))));
    }

    #[test]
    fn password_hash_round_trip() {
        let Ok(hash) = hash_password("correct horse") else {
            panic!("hashing should succeed");
        };
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("correct horse", &hash).is_ok());
        assert!(matches!(
            verify_password("wrong horse", &hash),
            Err(ChatError::InvalidCredentials)
        ));
    }

    #[test]
    fn unknown_account_runs_a_real_verification() {
        let hash = DECOY_HASH.as_deref();
        assert!(hash.is_some_and(|h| h.starts_with("$argon2id$")));
        assert!(matches!(
            reject_unknown_account("sealed-chat-decoy-password"),
            Err(ChatError::InvalidCredentials)
        ));
        assert!(matches!(
            reject_unknown_account("anything"),
            Err(ChatError::InvalidCredentials)
        ));
    }

    #[test]
    fn hashes_are_salted() {
        let a = hash_password("same").unwrap_or_default();
        let b = hash_password("same").unwrap_or_default();
        assert_ne!(a, b);
    }
}
