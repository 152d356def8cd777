//! OpenAPI document for the HTTP surface.

use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use super::dto;
use super::handlers;
use crate::domain::{DeliveredEvent, EventKind};
use crate::error::{ErrorBody, ErrorResponse};
use crate::persistence::models::{MessageRow, PublicKeyRow, PublicUser, SessionKeyRow, SortOrder};
use crate::pool::PoolStatus;

/// Generated OpenAPI description of every endpoint.
#[derive(Debug, OpenApi)]
#[openapi(
    info(
        title = "Sealed Chat API",
        description = "Key exchange storage, encrypted message relay and long-poll notifications"
    ),
    paths(
        handlers::users::sign_up,
        handlers::users::sign_in,
        handlers::users::my_profile,
        handlers::keys::put_public_key,
        handlers::keys::get_public_key,
        handlers::keys::get_own_public_key,
        handlers::keys::put_session_key,
        handlers::keys::get_session_key,
        handlers::messages::send_message,
        handlers::messages::message_history,
        handlers::messages::list_chats,
        handlers::events::poll_events,
        handlers::system::health_handler,
    ),
    components(schemas(
        dto::CredentialsRequest,
        dto::AuthResponse,
        dto::UserResponse,
        dto::PutPublicKeyRequest,
        dto::PutSessionKeyRequest,
        dto::PublicKeyResponse,
        dto::MaybePublicKeyResponse,
        dto::SessionKeyResponse,
        dto::MaybeSessionKeyResponse,
        dto::SendMessageRequest,
        dto::MessageResponse,
        dto::MessageHistoryResponse,
        dto::ChatsResponse,
        dto::EventsResponse,
        handlers::system::HealthResponse,
        PublicUser,
        PublicKeyRow,
        SessionKeyRow,
        MessageRow,
        SortOrder,
        DeliveredEvent,
        EventKind,
        PoolStatus,
        ErrorResponse,
        ErrorBody,
    )),
    modifiers(&BearerAuth),
    tags(
        (name = "Users", description = "Accounts and access tokens"),
        (name = "Keys", description = "Public and session key exchange"),
        (name = "Messages", description = "Encrypted messages and chat list"),
        (name = "Events", description = "Long-poll notifications"),
        (name = "System", description = "Health"),
    )
)]
pub struct ApiDoc;

#[derive(Debug)]
struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}
