//! Bearer-token check for the /api routes.

use axum::{
    extract::{Request, State},
    http::{StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::warn;

use crate::routes::AppError;
use crate::state::AppState;

/// Reject requests without `Authorization: Bearer <api_secret>`.
///
/// A server started without a secret lets everything through.
pub async fn require_bearer(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let Some(secret) = state.api_secret() else {
        return next.run(request).await;
    };

    let token = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));

    match token {
        Some(token) if token == secret => next.run(request).await,
        Some(_) => {
            warn!(uri = %request.uri(), "rejected request with invalid API key");
            unauthorized("Unauthorized: Invalid API Key.")
        }
        None => {
            warn!(uri = %request.uri(), "rejected request without bearer token");
            unauthorized("Unauthorized: Missing or invalid Authorization header.")
        }
    }
}

fn unauthorized(message: &str) -> Response {
    AppError::new(StatusCode::UNAUTHORIZED, message).into_response()
}
