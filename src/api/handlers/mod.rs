//! REST endpoint handlers organized by resource.

pub mod events;
pub mod keys;
pub mod messages;
pub mod system;
pub mod users;

use axum::Router;

use crate::app_state::AppState;

/// Composes all resource routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(users::routes())
        .merge(keys::routes())
        .merge(messages::routes())
        .merge(events::routes())
        .merge(system::routes())
}
