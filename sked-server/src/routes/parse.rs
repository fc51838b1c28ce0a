//! Event extraction endpoint

use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    routing::post,
};
use serde::Deserialize;
use sked_core::{CancellationToken, EventRecord};

use crate::routes::AppError;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/api/parse", post(parse))
}

/// Request body for extracting an event
#[derive(Deserialize)]
pub struct ParseRequest {
    pub text: Option<String>,
}

/// POST /api/parse - Extract one event from free text
async fn parse(
    State(state): State<AppState>,
    payload: Result<Json<ParseRequest>, JsonRejection>,
) -> Result<Json<EventRecord>, AppError> {
    let Json(req) = payload?;
    let text = req
        .text
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| AppError::bad_request("The text field is required"))?;

    // A dropped connection drops this future, which aborts the provider call.
    let cancel = CancellationToken::new();
    let event = state.pipeline().extract_text(&text, &cancel).await?;

    Ok(Json(event))
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use serde_json::json;

    use crate::routes::tests::{
        DINNER_REPLY, app, app_and_provider, app_with, body_json, post_json, send,
    };

    #[tokio::test]
    async fn returns_extracted_event() {
        let response = send(
            app(),
            post_json(
                "/api/parse",
                json!({"text": "Team dinner next Friday at 7pm at ABC Restaurant, Gangnam"}),
            ),
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        let expected: serde_json::Value = serde_json::from_str(DINNER_REPLY).unwrap();
        assert_eq!(body_json(response).await, expected);
    }

    #[tokio::test]
    async fn empty_text_is_bad_request() {
        for body in [json!({}), json!({"text": "   "})] {
            let (app, provider) = app_and_provider(Ok(DINNER_REPLY), None);
            let response = send(app, post_json("/api/parse", body)).await;
            assert_eq!(response.status(), StatusCode::BAD_REQUEST);
            assert_eq!(provider.calls(), 0);
        }
    }

    #[tokio::test]
    async fn malformed_json_gets_error_body() {
        let request = Request::post("/api/parse")
            .header("content-type", "application/json")
            .body(Body::from("{\"text\": "))
            .unwrap();
        let response = send(app(), request).await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["error"], "Invalid request body");
        assert!(body["details"].is_string());
    }

    #[tokio::test]
    async fn invalid_model_output_is_unprocessable() {
        let app = app_with(Ok(r#"{"title":"Dinner","date":"May 10"}"#), None);
        let response = send(app, post_json("/api/parse", json!({"text": "dinner"}))).await;
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body = body_json(response).await;
        assert_eq!(body["error"], "Failed to extract event");
        assert!(body["details"].as_str().unwrap().contains("date"));
    }

    #[tokio::test]
    async fn provider_failure_is_bad_gateway() {
        let (app, provider) = app_and_provider(Err(401), None);
        let response = send(app, post_json("/api/parse", json!({"text": "dinner"}))).await;
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(provider.calls(), 1);
    }
}
