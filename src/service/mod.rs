//! Service layer: business logic orchestration.
//!
//! [`ChatService`] runs account, key exchange and messaging operations on
//! pooled database connections and emits events through the
//! [`super::domain::EventBus`]. [`auth`] holds the credential helpers.

pub mod auth;
pub mod chat_service;

pub use auth::{Claims, TokenIssuer};
pub use chat_service::ChatService;
