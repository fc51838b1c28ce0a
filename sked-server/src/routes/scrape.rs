//! Page scraping endpoint

use axum::{
    Json, Router,
    extract::{Query, State},
    routing::get,
};
use serde::{Deserialize, Serialize};

use crate::routes::AppError;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/api/scrape", get(scrape))
}

#[derive(Deserialize)]
pub struct ScrapeQuery {
    pub url: Option<String>,
}

#[derive(Serialize)]
pub struct ScrapeResponse {
    pub markdown: String,
}

/// GET /api/scrape?url= - Page content as markdown
async fn scrape(
    State(state): State<AppState>,
    Query(query): Query<ScrapeQuery>,
) -> Result<Json<ScrapeResponse>, AppError> {
    let url = query
        .url
        .filter(|u| !u.trim().is_empty())
        .ok_or_else(|| AppError::bad_request("The url query parameter is required"))?;

    let markdown = state.pipeline().scrape(&url).await?;

    Ok(Json(ScrapeResponse { markdown }))
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::{Request, StatusCode};

    use crate::routes::tests::{app, body_json, send};

    #[tokio::test]
    async fn missing_url_is_bad_request() {
        let response = send(app(), Request::get("/api/scrape").body(Body::empty()).unwrap()).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn invalid_url_is_bad_request() {
        let response = send(
            app(),
            Request::get("/api/scrape?url=javascript:alert(1)")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["error"], "Failed to scrape page");
    }
}
