//! Long-poll event delivery.

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};

use crate::api::auth::AuthUser;
use crate::api::dto::EventsResponse;
use crate::app_state::AppState;
use crate::error::ErrorResponse;

/// `GET /api/events` — Wait for events addressed to the caller.
///
/// Answers as soon as at least one event is pending, or with an empty list
/// once the poll window elapses.
#[utoipa::path(
    get,
    path = "/api/events",
    tag = "Events",
    summary = "Poll events",
    description = "Long poll. Each event is returned to each of its recipients exactly once.",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Pending events, possibly none", body = EventsResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
    )
)]
pub async fn poll_events(State(state): State<AppState>, auth: AuthUser) -> Json<EventsResponse> {
    let events = state
        .event_bus
        .poll(auth.user_id, state.poll_timeout)
        .await;
    Json(EventsResponse { events })
}

/// Event routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/api/events", get(poll_events))
}
