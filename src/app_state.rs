//! Shared application state injected into all Axum handlers.

use std::sync::Arc;
use std::time::Duration;

use crate::domain::EventBus;
use crate::service::{ChatService, TokenIssuer};

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Chat service for all business logic.
    pub chat_service: Arc<ChatService>,
    /// Event bus drained by the long-poll endpoint.
    pub event_bus: EventBus,
    /// Access token signer and verifier.
    pub tokens: Arc<TokenIssuer>,
    /// How long `GET /api/events` waits before answering empty.
    pub poll_timeout: Duration,
}

impl AppState {
    /// Assembles the state around a service, sharing the service's bus.
    #[must_use]
    pub fn new(chat_service: ChatService, tokens: TokenIssuer, poll_timeout: Duration) -> Self {
        let event_bus = chat_service.event_bus().clone();
        Self {
            chat_service: Arc::new(chat_service),
            event_bus,
            tokens: Arc::new(tokens),
            poll_timeout,
        }
    }
}
