//! PostgreSQL queries run on a pooled connection.
//!
//! Every function borrows a single [`PgConnection`] checked out of the
//! [`super::DbPool`] by the caller, so a handler holds exactly one
//! connection for all of its queries.

use sqlx::PgConnection;

use super::models::{MessageRow, Page, PublicKeyRow, PublicUser, SessionKeyRow, UserRow};
use crate::domain::UserId;
use crate::error::ChatError;

/// Applies the embedded schema migrations.
///
/// # Errors
///
/// Returns a [`ChatError::Database`] if a migration fails.
pub async fn run_migrations(conn: &mut PgConnection) -> Result<(), ChatError> {
    sqlx::migrate!("./migrations")
        .run(conn)
        .await
        .map_err(|e| ChatError::Database(e.to_string()))
}

/// Inserts a new account. Returns `None` if the username is taken.
///
/// # Errors
///
/// Returns a [`ChatError::Database`] on database failure.
pub async fn insert_user(
    conn: &mut PgConnection,
    username: &str,
    password_hash: &str,
) -> Result<Option<UserRow>, ChatError> {
    let row = sqlx::query_as::<_, UserRow>(
        "INSERT INTO users (username, password_hash) VALUES ($1, $2) \
         ON CONFLICT (username) DO NOTHING \
         RETURNING id, username, password_hash, created_at",
    )
    .bind(username)
    .bind(password_hash)
    .fetch_optional(conn)
    .await?;

    Ok(row)
}

/// Looks up an account by login name.
///
/// # Errors
///
/// Returns a [`ChatError::Database`] on database failure.
pub async fn find_user_by_username(
    conn: &mut PgConnection,
    username: &str,
) -> Result<Option<UserRow>, ChatError> {
    let row = sqlx::query_as::<_, UserRow>(
        "SELECT id, username, password_hash, created_at FROM users WHERE username = $1",
    )
    .bind(username)
    .fetch_optional(conn)
    .await?;

    Ok(row)
}

/// Looks up the public view of an account.
///
/// # Errors
///
/// Returns a [`ChatError::Database`] on database failure.
pub async fn find_user(
    conn: &mut PgConnection,
    user_id: UserId,
) -> Result<Option<PublicUser>, ChatError> {
    let row = sqlx::query_as::<_, PublicUser>(
        "SELECT id, username, created_at FROM users WHERE id = $1",
    )
    .bind(user_id)
    .fetch_optional(conn)
    .await?;

    Ok(row)
}

/// Returns `true` if an account with the given id exists.
///
/// # Errors
///
/// Returns a [`ChatError::Database`] on database failure.
pub async fn user_exists(conn: &mut PgConnection, user_id: UserId) -> Result<bool, ChatError> {
    let exists =
        sqlx::query_scalar::<_, bool>("SELECT EXISTS (SELECT 1 FROM users WHERE id = $1)")
            .bind(user_id)
            .fetch_one(conn)
            .await?;

    Ok(exists)
}

/// Stores a public key `owner` installed for `counterpart`.
///
/// # Errors
///
/// Returns a [`ChatError::Database`] on database failure.
pub async fn insert_public_key(
    conn: &mut PgConnection,
    owner: UserId,
    counterpart: UserId,
    algo: &str,
    value: &str,
) -> Result<PublicKeyRow, ChatError> {
    let row = sqlx::query_as::<_, PublicKeyRow>(
        "INSERT INTO public_keys (user_id, to_user_id, algo, value) VALUES ($1, $2, $3, $4) \
         RETURNING id, user_id, to_user_id, algo, value, created_at",
    )
    .bind(owner)
    .bind(counterpart)
    .bind(algo)
    .bind(value)
    .fetch_one(conn)
    .await?;

    Ok(row)
}

/// Returns the most recent public key `owner` installed for `counterpart`.
///
/// # Errors
///
/// Returns a [`ChatError::Database`] on database failure.
pub async fn latest_public_key(
    conn: &mut PgConnection,
    owner: UserId,
    counterpart: UserId,
) -> Result<Option<PublicKeyRow>, ChatError> {
    let row = sqlx::query_as::<_, PublicKeyRow>(
        "SELECT id, user_id, to_user_id, algo, value, created_at FROM public_keys \
         WHERE user_id = $1 AND to_user_id = $2 ORDER BY id DESC LIMIT 1",
    )
    .bind(owner)
    .bind(counterpart)
    .fetch_optional(conn)
    .await?;

    Ok(row)
}

/// Stores an encrypted session key `from` uploaded for `to`.
///
/// # Errors
///
/// Returns a [`ChatError::Database`] on database failure.
pub async fn insert_session_key(
    conn: &mut PgConnection,
    from: UserId,
    to: UserId,
    algo: &str,
    value: &str,
    iv: &str,
) -> Result<SessionKeyRow, ChatError> {
    let row = sqlx::query_as::<_, SessionKeyRow>(
        "INSERT INTO session_keys (from_user_id, to_user_id, algo, value, iv) \
         VALUES ($1, $2, $3, $4, $5) \
         RETURNING id, from_user_id, to_user_id, algo, value, iv, created_at",
    )
    .bind(from)
    .bind(to)
    .bind(algo)
    .bind(value)
    .bind(iv)
    .fetch_one(conn)
    .await?;

    Ok(row)
}

/// Returns the most recent session key `from` uploaded for `to`.
///
/// # Errors
///
/// Returns a [`ChatError::Database`] on database failure.
pub async fn latest_session_key(
    conn: &mut PgConnection,
    from: UserId,
    to: UserId,
) -> Result<Option<SessionKeyRow>, ChatError> {
    let row = sqlx::query_as::<_, SessionKeyRow>(
        "SELECT id, from_user_id, to_user_id, algo, value, iv, created_at FROM session_keys \
         WHERE from_user_id = $1 AND to_user_id = $2 ORDER BY id DESC LIMIT 1",
    )
    .bind(from)
    .bind(to)
    .fetch_optional(conn)
    .await?;

    Ok(row)
}

/// Stores a message.
///
/// # Errors
///
/// Returns a [`ChatError::Database`] on database failure.
pub async fn insert_message(
    conn: &mut PgConnection,
    from: UserId,
    to: UserId,
    content: &str,
) -> Result<MessageRow, ChatError> {
    let row = sqlx::query_as::<_, MessageRow>(
        "INSERT INTO messages (from_user_id, to_user_id, content) VALUES ($1, $2, $3) \
         RETURNING id, from_user_id, to_user_id, content, created_at",
    )
    .bind(from)
    .bind(to)
    .bind(content)
    .fetch_one(conn)
    .await?;

    Ok(row)
}

/// Returns one page of the conversation between `me` and `other`, in
/// both directions.
///
/// # Errors
///
/// Returns a [`ChatError::Database`] on database failure.
pub async fn message_history(
    conn: &mut PgConnection,
    me: UserId,
    other: UserId,
    page: Page,
) -> Result<Vec<MessageRow>, ChatError> {
    let order = page.order.as_sql();
    let sql = format!(
        "SELECT id, from_user_id, to_user_id, content, created_at FROM messages \
         WHERE (from_user_id = $1 AND to_user_id = $2) OR (from_user_id = $2 AND to_user_id = $1) \
         ORDER BY created_at {order}, id {order} LIMIT $3 OFFSET $4"
    );
    let rows = sqlx::query_as::<_, MessageRow>(&sql)
        .bind(me)
        .bind(other)
        .bind(page.limit)
        .bind(page.offset)
        .fetch_all(conn)
        .await?;

    Ok(rows)
}

/// Returns one page of the accounts `me` has exchanged public keys with.
///
/// # Errors
///
/// Returns a [`ChatError::Database`] on database failure.
pub async fn chat_partners(
    conn: &mut PgConnection,
    me: UserId,
    page: Page,
) -> Result<Vec<PublicUser>, ChatError> {
    let order = page.order.as_sql();
    let sql = format!(
        "SELECT DISTINCT u.id, u.username, u.created_at FROM users u \
         JOIN public_keys k ON u.id = k.user_id OR u.id = k.to_user_id \
         WHERE (k.user_id = $1 OR k.to_user_id = $1) AND u.id <> $1 \
         ORDER BY u.id {order} LIMIT $2 OFFSET $3"
    );
    let rows = sqlx::query_as::<_, PublicUser>(&sql)
        .bind(me)
        .bind(page.limit)
        .bind(page.offset)
        .fetch_all(conn)
        .await?;

    Ok(rows)
}
