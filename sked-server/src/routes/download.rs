//! Calendar file download endpoints

use std::collections::HashMap;

use axum::{
    Json, Router,
    extract::{Query, State, rejection::JsonRejection},
    http::header,
    response::{IntoResponse, Response},
    routing::get,
};
use serde::Deserialize;
use serde_json::{Map, Value};
use sked_core::{CalendarArtifact, EventRecord};
use tracing::info;

use crate::routes::AppError;
use crate::state::AppState;

const EVENT_FIELDS: [&str; 5] = ["title", "description", "date", "time", "location"];

pub fn router() -> Router<AppState> {
    Router::new().route("/api/download", get(download_query).post(download))
}

/// Request body for generating a calendar file
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadRequest {
    #[serde(alias = "eventData")]
    pub event_record: Option<Value>,
    #[serde(default)]
    pub url: Option<String>,
}

/// POST /api/download - Render an event as an .ics attachment
async fn download(
    State(state): State<AppState>,
    payload: Result<Json<DownloadRequest>, JsonRejection>,
) -> Result<Response, AppError> {
    let Json(req) = payload?;
    let candidate = req
        .event_record
        .ok_or_else(|| AppError::bad_request("The eventRecord field is required"))?;
    render(&state, &candidate, req.url.as_deref())
}

/// GET /api/download?title=&date=&time=... - Same, from query parameters
async fn download_query(
    State(state): State<AppState>,
    Query(mut params): Query<HashMap<String, String>>,
) -> Result<Response, AppError> {
    let url = params.remove("url");

    let candidate: Map<String, Value> = EVENT_FIELDS
        .iter()
        .filter_map(|field| {
            let value = params.remove(*field);
            // description and location may be omitted from a query string
            let value = match (*field, value) {
                (_, Some(v)) => Some(v),
                ("description" | "location", None) => Some(String::new()),
                (_, None) => None,
            };
            value.map(|v| (field.to_string(), Value::String(v)))
        })
        .collect();

    render(&state, &Value::Object(candidate), url.as_deref())
}

fn render(state: &AppState, candidate: &Value, url: Option<&str>) -> Result<Response, AppError> {
    let event = EventRecord::validate(candidate)?;
    let artifact = state.pipeline().serialize(&event, url)?;

    info!(file_name = %artifact.file_name, "serving calendar file");

    Ok(attachment(artifact))
}

fn attachment(artifact: CalendarArtifact) -> Response {
    (
        [
            (header::CONTENT_TYPE, CalendarArtifact::CONTENT_TYPE.to_string()),
            (header::CONTENT_DISPOSITION, artifact.content_disposition()),
        ],
        artifact.content,
    )
        .into_response()
}
