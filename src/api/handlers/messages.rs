//! Messaging handlers: send, history and chat list.

use axum::extract::{Path, Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::api::auth::AuthUser;
use crate::api::dto::{
    ChatsResponse, ListParams, MessageHistoryResponse, MessageResponse, SendMessageRequest,
};
use crate::app_state::AppState;
use crate::domain::UserId;
use crate::error::{ChatError, ErrorResponse};

/// `POST /api/users/{id}/messages/send` — Send an encrypted message.
///
/// # Errors
///
/// Returns [`ChatError`] on blank content or an unknown recipient.
#[utoipa::path(
    post,
    path = "/api/users/{id}/messages/send",
    tag = "Messages",
    summary = "Send message",
    description = "Stores the message and sends a `new_message` event to both participants.",
    security(("bearer" = [])),
    params(("id" = i64, Path, description = "Recipient account id")),
    request_body = SendMessageRequest,
    responses(
        (status = 200, description = "Message stored", body = MessageResponse),
        (status = 400, description = "Blank content", body = ErrorResponse),
        (status = 404, description = "Recipient not found", body = ErrorResponse),
    )
)]
pub async fn send_message(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(recipient): Path<UserId>,
    Json(req): Json<SendMessageRequest>,
) -> Result<Json<MessageResponse>, ChatError> {
    req.validate()?;
    let message = state
        .chat_service
        .send_message(auth.user_id, recipient, &req.content)
        .await?;
    Ok(Json(MessageResponse { message }))
}

/// `GET /api/users/{id}/messages/history` — One page of a conversation.
///
/// # Errors
///
/// Returns [`ChatError`] on database failure.
#[utoipa::path(
    get,
    path = "/api/users/{id}/messages/history",
    tag = "Messages",
    summary = "Message history",
    security(("bearer" = [])),
    params(("id" = i64, Path, description = "Counterpart account id"), ListParams),
    responses(
        (status = 200, description = "Messages in both directions", body = MessageHistoryResponse),
    )
)]
pub async fn message_history(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(counterpart): Path<UserId>,
    Query(params): Query<ListParams>,
) -> Result<Json<MessageHistoryResponse>, ChatError> {
    let messages = state
        .chat_service
        .message_history(auth.user_id, counterpart, params.to_page())
        .await?;
    Ok(Json(MessageHistoryResponse { messages }))
}

/// `GET /api/chats/get` — Accounts the caller exchanged keys with.
///
/// # Errors
///
/// Returns [`ChatError`] on database failure.
#[utoipa::path(
    get,
    path = "/api/chats/get",
    tag = "Messages",
    summary = "Chat list",
    security(("bearer" = [])),
    params(ListParams),
    responses(
        (status = 200, description = "Chat partners", body = ChatsResponse),
    )
)]
pub async fn list_chats(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(params): Query<ListParams>,
) -> Result<Json<ChatsResponse>, ChatError> {
    let users = state
        .chat_service
        .chats(auth.user_id, params.to_page())
        .await?;
    Ok(Json(ChatsResponse { users }))
}

/// Messaging routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/users/{id}/messages/send", post(send_message))
        .route("/api/users/{id}/messages/history", get(message_history))
        .route("/api/chats/get", get(list_chats))
}
