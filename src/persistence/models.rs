//! Row types for the `users`, `public_keys`, `session_keys` and
//! `messages` tables.

use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::UserId;

/// A stored account. Carries the password hash, so it is never serialized.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UserRow {
    /// Account id.
    pub id: i64,
    /// Unique login name.
    pub username: String,
    /// Argon2id PHC string.
    pub password_hash: String,
    /// Sign-up time.
    pub created_at: DateTime<Utc>,
}

/// Public view of an account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema, sqlx::FromRow)]
pub struct PublicUser {
    /// Account id.
    pub id: UserId,
    /// Unique login name.
    pub username: String,
    /// Sign-up time.
    pub created_at: DateTime<Utc>,
}

impl From<UserRow> for PublicUser {
    fn from(row: UserRow) -> Self {
        Self {
            id: UserId::new(row.id),
            username: row.username,
            created_at: row.created_at,
        }
    }
}

/// A Diffie-Hellman public key `user_id` installed for `to_user_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema, sqlx::FromRow)]
pub struct PublicKeyRow {
    /// Key id.
    pub id: i64,
    /// Owner of the key pair.
    pub user_id: UserId,
    /// Counterpart the key is meant for.
    pub to_user_id: UserId,
    /// Key agreement algorithm label chosen by the client.
    pub algo: String,
    /// Encoded public key.
    pub value: String,
    /// Installation time.
    pub created_at: DateTime<Utc>,
}

/// A session key encrypted by `from_user_id` for `to_user_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema, sqlx::FromRow)]
pub struct SessionKeyRow {
    /// Key id.
    pub id: i64,
    /// Author of the session key.
    pub from_user_id: UserId,
    /// Counterpart of the session.
    pub to_user_id: UserId,
    /// Cipher label chosen by the client.
    pub algo: String,
    /// Encrypted session key.
    pub value: String,
    /// Initialisation vector used to encrypt `value`.
    pub iv: String,
    /// Upload time.
    pub created_at: DateTime<Utc>,
}

/// An end-to-end encrypted message. The server only sees ciphertext.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema, sqlx::FromRow)]
pub struct MessageRow {
    /// Message id.
    pub id: i64,
    /// Sender.
    pub from_user_id: UserId,
    /// Recipient.
    pub to_user_id: UserId,
    /// Encrypted content.
    pub content: String,
    /// Send time.
    pub created_at: DateTime<Utc>,
}

/// Sort direction for paged listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    /// Oldest / lowest id first.
    Asc,
    /// Newest / highest id first.
    #[default]
    Desc,
}

impl SortOrder {
    /// SQL keyword for the direction.
    #[must_use]
    pub const fn as_sql(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

/// A window into a listing: `limit` rows starting at `offset`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    /// Maximum number of rows.
    pub limit: i64,
    /// Rows to skip.
    pub offset: i64,
    /// Sort direction.
    pub order: SortOrder,
}
