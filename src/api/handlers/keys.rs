//! Key exchange handlers: public keys and session keys.

use axum::extract::{Path, State};
use axum::routing::{get, put};
use axum::{Json, Router};

use crate::api::auth::AuthUser;
use crate::api::dto::{
    MaybePublicKeyResponse, MaybeSessionKeyResponse, PublicKeyResponse, PutPublicKeyRequest,
    PutSessionKeyRequest, SessionKeyResponse,
};
use crate::app_state::AppState;
use crate::domain::UserId;
use crate::error::{ChatError, ErrorResponse};

/// `PUT /api/users/{id}/key` — Install a public key for a counterpart.
///
/// # Errors
///
/// Returns [`ChatError`] on blank fields or an unknown counterpart.
#[utoipa::path(
    put,
    path = "/api/users/{id}/key",
    tag = "Keys",
    summary = "Install public key",
    description = "Stores the caller's public key for the counterpart and sends the counterpart a `new_key` event.",
    security(("bearer" = [])),
    params(("id" = i64, Path, description = "Counterpart account id")),
    request_body = PutPublicKeyRequest,
    responses(
        (status = 200, description = "Key stored", body = PublicKeyResponse),
        (status = 400, description = "Blank field", body = ErrorResponse),
        (status = 404, description = "Counterpart not found", body = ErrorResponse),
    )
)]
pub async fn put_public_key(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(counterpart): Path<UserId>,
    Json(req): Json<PutPublicKeyRequest>,
) -> Result<Json<PublicKeyResponse>, ChatError> {
    req.validate()?;
    let key = state
        .chat_service
        .put_public_key(auth.user_id, counterpart, &req.algo, &req.value)
        .await?;
    Ok(Json(PublicKeyResponse { key }))
}

/// `GET /api/users/{id}/keys` — The counterpart's public key for the caller.
///
/// # Errors
///
/// Returns [`ChatError::KeyNotInstalled`] when there is none yet; the
/// counterpart then receives a `need_to_put_key` event.
#[utoipa::path(
    get,
    path = "/api/users/{id}/keys",
    tag = "Keys",
    summary = "Counterpart public key",
    security(("bearer" = [])),
    params(("id" = i64, Path, description = "Counterpart account id")),
    responses(
        (status = 200, description = "Latest key", body = PublicKeyResponse),
        (status = 404, description = "Counterpart has not installed a key", body = ErrorResponse),
    )
)]
pub async fn get_public_key(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(counterpart): Path<UserId>,
) -> Result<Json<PublicKeyResponse>, ChatError> {
    let key = state
        .chat_service
        .counterpart_public_key(auth.user_id, counterpart)
        .await?;
    Ok(Json(PublicKeyResponse { key }))
}

/// `GET /api/users/{id}/myKeys` — The caller's own public key for a
/// counterpart.
///
/// # Errors
///
/// Returns [`ChatError`] on database failure.
#[utoipa::path(
    get,
    path = "/api/users/{id}/myKeys",
    tag = "Keys",
    summary = "Own public key",
    security(("bearer" = [])),
    params(("id" = i64, Path, description = "Counterpart account id")),
    responses(
        (status = 200, description = "Latest key or null", body = MaybePublicKeyResponse),
    )
)]
pub async fn get_own_public_key(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(counterpart): Path<UserId>,
) -> Result<Json<MaybePublicKeyResponse>, ChatError> {
    let key = state
        .chat_service
        .own_public_key(auth.user_id, counterpart)
        .await?;
    Ok(Json(MaybePublicKeyResponse { key }))
}

/// `PUT /api/users/{id}/sessionKey` — Upload an encrypted session key.
///
/// # Errors
///
/// Returns [`ChatError`] on blank fields or an unknown counterpart.
#[utoipa::path(
    put,
    path = "/api/users/{id}/sessionKey",
    tag = "Keys",
    summary = "Upload session key",
    security(("bearer" = [])),
    params(("id" = i64, Path, description = "Counterpart account id")),
    request_body = PutSessionKeyRequest,
    responses(
        (status = 200, description = "Key stored", body = SessionKeyResponse),
        (status = 400, description = "Blank field", body = ErrorResponse),
        (status = 404, description = "Counterpart not found", body = ErrorResponse),
    )
)]
pub async fn put_session_key(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(counterpart): Path<UserId>,
    Json(req): Json<PutSessionKeyRequest>,
) -> Result<Json<SessionKeyResponse>, ChatError> {
    req.validate()?;
    let key = state
        .chat_service
        .put_session_key(auth.user_id, counterpart, &req.algo, &req.value, &req.iv)
        .await?;
    Ok(Json(SessionKeyResponse { key }))
}

/// `GET /api/users/{id}/sessionKey` — The caller's latest session key for
/// a counterpart.
///
/// # Errors
///
/// Returns [`ChatError`] on database failure.
#[utoipa::path(
    get,
    path = "/api/users/{id}/sessionKey",
    tag = "Keys",
    summary = "Session key",
    security(("bearer" = [])),
    params(("id" = i64, Path, description = "Counterpart account id")),
    responses(
        (status = 200, description = "Latest key or null", body = MaybeSessionKeyResponse),
    )
)]
pub async fn get_session_key(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(counterpart): Path<UserId>,
) -> Result<Json<MaybeSessionKeyResponse>, ChatError> {
    let key = state
        .chat_service
        .session_key(auth.user_id, counterpart)
        .await?;
    Ok(Json(MaybeSessionKeyResponse { key }))
}

/// Key exchange routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/users/{id}/key", put(put_public_key))
        .route("/api/users/{id}/keys", get(get_public_key))
        .route("/api/users/{id}/myKeys", get(get_own_public_key))
        .route(
            "/api/users/{id}/sessionKey",
            put(put_session_key).get(get_session_key),
        )
}
