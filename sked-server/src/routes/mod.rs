pub mod download;
pub mod health;
pub mod parse;
pub mod scrape;

use axum::{
    Json, Router,
    extract::rejection::JsonRejection,
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use sked_core::{ExtractionError, PipelineError, SchemaValidationError, ScrapeError};
use tracing::error;

use crate::auth;
use crate::state::AppState;

/// All routes; everything except /health sits behind the bearer check.
pub fn router(state: AppState) -> Router {
    let api = Router::new()
        .merge(scrape::router())
        .merge(parse::router())
        .merge(download::router())
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_bearer,
        ));

    Router::new()
        .merge(health::router())
        .merge(api)
        .with_state(state)
}

/// Standard API error response
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// An error with the status code it should be reported under.
#[derive(Debug)]
pub struct AppError {
    status: StatusCode,
    error: String,
    details: Option<String>,
}

impl AppError {
    pub fn new(status: StatusCode, error: impl Into<String>) -> Self {
        Self {
            status,
            error: error.into(),
            details: None,
        }
    }

    pub fn bad_request(error: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, error)
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            error!(status = %self.status, error = %self.error, details = ?self.details, "request failed");
        }
        let body = Json(ErrorResponse {
            error: self.error,
            details: self.details,
        });
        (self.status, body).into_response()
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::new(rejection.status(), "Invalid request body").with_details(rejection.body_text())
    }
}

impl From<SchemaValidationError> for AppError {
    fn from(err: SchemaValidationError) -> Self {
        AppError::bad_request("Invalid event data").with_details(err.to_string())
    }
}

impl From<PipelineError> for AppError {
    fn from(err: PipelineError) -> Self {
        let status = match &err {
            PipelineError::Scrape(e) => match e {
                ScrapeError::InvalidUrl { .. } => StatusCode::BAD_REQUEST,
                ScrapeError::MissingApiKey => StatusCode::INTERNAL_SERVER_ERROR,
                ScrapeError::Network { .. } | ScrapeError::Api { .. } | ScrapeError::NoContent(_) => {
                    StatusCode::BAD_GATEWAY
                }
            },
            PipelineError::Extraction(e) => match e {
                ExtractionError::EmptyInput => StatusCode::BAD_REQUEST,
                ExtractionError::Schema(_) => StatusCode::UNPROCESSABLE_ENTITY,
                ExtractionError::Provider(_)
                | ExtractionError::EmptyCompletion
                | ExtractionError::InvalidJson(_) => StatusCode::BAD_GATEWAY,
                ExtractionError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
                ExtractionError::Cancelled => StatusCode::SERVICE_UNAVAILABLE,
            },
            PipelineError::Serialization(_) => StatusCode::BAD_REQUEST,
        };

        let error = match &err {
            PipelineError::Scrape(_) => "Failed to scrape page",
            PipelineError::Extraction(_) => "Failed to extract event",
            PipelineError::Serialization(_) => "Failed to generate calendar file",
        };

        AppError::new(status, error).with_details(err.to_string())
    }
}
