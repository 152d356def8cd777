//! Messaging, chat list and event DTOs.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::common_dto::require_non_empty;
use crate::domain::DeliveredEvent;
use crate::error::ChatError;
use crate::persistence::models::{MessageRow, PublicUser};

/// Request body for `POST /api/users/{id}/messages/send`.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct SendMessageRequest {
    /// Encrypted content.
    pub content: String,
}

impl SendMessageRequest {
    /// Rejects blank content.
    ///
    /// # Errors
    ///
    /// Returns [`ChatError::InvalidRequest`] if `content` is blank.
    pub fn validate(&self) -> Result<(), ChatError> {
        require_non_empty("content", &self.content)
    }
}

/// A stored message.
#[derive(Debug, Serialize, ToSchema)]
pub struct MessageResponse {
    /// The message as stored.
    pub message: MessageRow,
}

/// One page of a conversation.
#[derive(Debug, Serialize, ToSchema)]
pub struct MessageHistoryResponse {
    /// Messages in the requested order.
    pub messages: Vec<MessageRow>,
}

/// One page of chat partners.
#[derive(Debug, Serialize, ToSchema)]
pub struct ChatsResponse {
    /// Accounts the caller exchanged keys with.
    pub users: Vec<PublicUser>,
}

/// Result of one long poll. Empty when the wait timed out.
#[derive(Debug, Serialize, ToSchema)]
pub struct EventsResponse {
    /// Events in publication order.
    pub events: Vec<DeliveredEvent>,
}
