//! Notification records queued on the [`super::EventBus`].
//!
//! Every state change another identity must learn about (a new public key,
//! a missing key, a new message) becomes an [`EventRecord`] addressed to a
//! set of recipients. Pollers receive a [`DeliveredEvent`], the same record
//! with the recipient set stripped.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use super::UserId;

/// What happened, from the recipient's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// A counterpart installed a new Diffie-Hellman public key for the recipient.
    NewKey,
    /// A counterpart asked for the recipient's public key, which is not installed yet.
    NeedToPutKey,
    /// A message was sent to or by the recipient.
    NewMessage,
}

impl EventKind {
    /// Returns the wire name of the kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NewKey => "new_key",
            Self::NeedToPutKey => "need_to_put_key",
            Self::NewMessage => "new_message",
        }
    }
}

/// A pending notification and the identities still owed delivery.
#[derive(Debug, Clone)]
pub struct EventRecord {
    /// Event semantics.
    pub kind: EventKind,
    /// Recipients that have not polled this event yet. Only ever shrinks.
    pub recipients: HashSet<UserId>,
    /// Kind-specific JSON payload.
    pub payload: serde_json::Value,
    /// Publication time, for ordering and debugging only.
    pub created_at: DateTime<Utc>,
}

impl EventRecord {
    /// Creates a record stamped with the current time.
    #[must_use]
    pub fn new(
        kind: EventKind,
        recipients: HashSet<UserId>,
        payload: serde_json::Value,
    ) -> Self {
        Self {
            kind,
            recipients,
            payload,
            created_at: Utc::now(),
        }
    }

    /// Copy handed to a poller.
    #[must_use]
    pub fn delivered(&self) -> DeliveredEvent {
        DeliveredEvent {
            kind: self.kind,
            payload: self.payload.clone(),
            created_at: self.created_at,
        }
    }
}

/// Event as returned by the long-poll endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct DeliveredEvent {
    /// Event semantics.
    pub kind: EventKind,
    /// Kind-specific JSON payload.
    #[schema(value_type = Object)]
    pub payload: serde_json::Value,
    /// Publication time.
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_wire_names() {
        assert_eq!(EventKind::NewKey.as_str(), "new_key");
        assert_eq!(EventKind::NeedToPutKey.as_str(), "need_to_put_key");
        let json = serde_json::to_string(&EventKind::NewMessage).unwrap_or_default();
        assert_eq!(json, "\"new_message\"");
    }

    #[test]
    fn delivered_copy_omits_recipients() {
        let record = EventRecord::new(
            EventKind::NewMessage,
            HashSet::from([UserId::new(1), UserId::new(2)]),
            serde_json::json!({ "from": 1, "to": 2, "text": "hi" }),
        );
        let value = serde_json::to_value(record.delivered()).unwrap_or_default();

        assert_eq!(value["kind"], "new_message");
        assert_eq!(value["payload"]["text"], "hi");
        assert!(value.get("recipients").is_none());
        assert!(value.get("created_at").is_some());
    }
}
