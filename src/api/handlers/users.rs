//! Account handlers: sign-up, sign-in, profile.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::api::auth::AuthUser;
use crate::api::dto::{AuthResponse, CredentialsRequest, UserResponse};
use crate::app_state::AppState;
use crate::error::{ChatError, ErrorResponse};

/// `POST /api/users/create` — Register a new account.
///
/// # Errors
///
/// Returns [`ChatError`] on invalid input or a taken username.
#[utoipa::path(
    post,
    path = "/api/users/create",
    tag = "Users",
    summary = "Sign up",
    description = "Creates an account and returns an access token bound to the given application id.",
    request_body = CredentialsRequest,
    responses(
        (status = 201, description = "Account created", body = AuthResponse),
        (status = 400, description = "Invalid username or password", body = ErrorResponse),
        (status = 409, description = "Username already exists", body = ErrorResponse),
    )
)]
pub async fn sign_up(
    State(state): State<AppState>,
    Json(req): Json<CredentialsRequest>,
) -> Result<impl IntoResponse, ChatError> {
    req.validate()?;
    let user = state
        .chat_service
        .sign_up(&req.username, &req.password)
        .await?;
    let access_token = state.tokens.issue(user.id, req.application_id)?;

    let response = AuthResponse {
        user,
        access_token,
        expires_in: state.tokens.lifetime().as_secs(),
    };
    Ok((StatusCode::CREATED, Json(response)))
}

/// `POST /api/users/auth` — Sign in.
///
/// # Errors
///
/// Returns [`ChatError::InvalidCredentials`] on a wrong username or
/// password.
#[utoipa::path(
    post,
    path = "/api/users/auth",
    tag = "Users",
    summary = "Sign in",
    description = "Checks the credentials and returns a fresh access token.",
    request_body = CredentialsRequest,
    responses(
        (status = 200, description = "Signed in", body = AuthResponse),
        (status = 400, description = "Invalid username or password format", body = ErrorResponse),
        (status = 403, description = "Invalid credentials", body = ErrorResponse),
    )
)]
pub async fn sign_in(
    State(state): State<AppState>,
    Json(req): Json<CredentialsRequest>,
) -> Result<Json<AuthResponse>, ChatError> {
    req.validate()?;
    let user = state
        .chat_service
        .authenticate(&req.username, &req.password)
        .await?;
    let access_token = state.tokens.issue(user.id, req.application_id)?;

    Ok(Json(AuthResponse {
        user,
        access_token,
        expires_in: state.tokens.lifetime().as_secs(),
    }))
}

/// `GET /api/users/my` — The caller's account.
///
/// # Errors
///
/// Returns [`ChatError::UserNotFound`] if the account was removed.
#[utoipa::path(
    get,
    path = "/api/users/my",
    tag = "Users",
    summary = "Current account",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "The caller's account", body = UserResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
    )
)]
pub async fn my_profile(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<UserResponse>, ChatError> {
    let user = state.chat_service.profile(auth.user_id).await?;
    Ok(Json(UserResponse { user }))
}

/// Account routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/users/create", post(sign_up))
        .route("/api/users/auth", post(sign_in))
        .route("/api/users/my", get(my_profile))
}
