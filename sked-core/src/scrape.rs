//! Page-text acquisition through the Firecrawl scrape API.

use std::time::Duration;

use reqwest::{Client, header};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use url::Url;

use crate::config::ScraperConfig;
use crate::error::ScrapeError;

/// Fetches the main content of a web page as markdown.
#[derive(Clone)]
pub struct Scraper {
    http_client: Client,
    api_key: Option<String>,
    endpoint: String,
    timeout: Duration,
}

#[derive(Serialize)]
struct ScrapeRequest<'a> {
    url: &'a str,
    formats: [&'a str; 1],
}

#[derive(Deserialize)]
struct ScrapeResponse {
    #[serde(default)]
    success: bool,
    data: Option<ScrapeData>,
}

#[derive(Deserialize)]
struct ScrapeData {
    markdown: Option<String>,
}

impl Scraper {
    pub fn new(config: &ScraperConfig) -> Self {
        if config.api_key.is_none() {
            warn!("scraper API key is not configured; scraping will fail");
        }

        Self {
            http_client: Client::new(),
            api_key: config.api_key.clone(),
            endpoint: config.endpoint.clone(),
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }

    /// Scrape `url` and return its markdown body.
    pub async fn scrape(&self, url: &str) -> Result<String, ScrapeError> {
        let url = validate_url(url)?;
        let api_key = self.api_key.as_deref().ok_or(ScrapeError::MissingApiKey)?;

        info!(%url, "scraping page");

        let network = |e: reqwest::Error| ScrapeError::Network {
            url: url.to_string(),
            message: e.to_string(),
        };

        let response = self
            .http_client
            .post(&self.endpoint)
            .header(header::AUTHORIZATION, format!("Bearer {api_key}"))
            .timeout(self.timeout)
            .json(&ScrapeRequest {
                url: url.as_str(),
                formats: ["markdown"],
            })
            .send()
            .await
            .map_err(network)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(%url, status = %status, error = %body, "scrape API error");
            return Err(ScrapeError::Api {
                url: url.to_string(),
                status: status.as_u16(),
                body,
            });
        }

        let result: ScrapeResponse = response.json().await.map_err(network)?;
        markdown_from(result).ok_or_else(|| ScrapeError::NoContent(url.to_string()))
    }
}

fn markdown_from(response: ScrapeResponse) -> Option<String> {
    if !response.success {
        return None;
    }
    response.data?.markdown
}

/// Only absolute http(s) URLs are scraped.
pub fn validate_url(raw: &str) -> Result<Url, ScrapeError> {
    let invalid = |reason: String| ScrapeError::InvalidUrl {
        url: raw.to_string(),
        reason,
    };

    let url = Url::parse(raw.trim()).map_err(|e| invalid(e.to_string()))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(invalid(format!("unsupported scheme '{other}'"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn accepts_http_and_https() {
        assert!(validate_url("https://example.com/event").is_ok());
        assert!(validate_url(" http://example.com ").is_ok());
    }

    #[test]
    fn rejects_other_schemes_and_garbage() {
        assert!(matches!(
            validate_url("file:///etc/passwd"),
            Err(ScrapeError::InvalidUrl { .. })
        ));
        assert!(matches!(
            validate_url("not a url"),
            Err(ScrapeError::InvalidUrl { .. })
        ));
    }

    #[tokio::test]
    async fn missing_api_key_fails_before_any_request() {
        let scraper = Scraper::new(&ScraperConfig::default());
        let err = scraper.scrape("https://example.com").await.unwrap_err();
        assert!(matches!(err, ScrapeError::MissingApiKey));
    }

    #[test]
    fn markdown_requires_success_flag() {
        let ok: ScrapeResponse = serde_json::from_value(json!({
            "success": true,
            "data": {"markdown": "# Party\nFriday 7pm"}
        }))
        .unwrap();
        assert_eq!(markdown_from(ok).as_deref(), Some("# Party\nFriday 7pm"));

        let failed: ScrapeResponse = serde_json::from_value(json!({
            "success": false,
            "data": {"markdown": "stale"}
        }))
        .unwrap();
        assert!(markdown_from(failed).is_none());

        let empty: ScrapeResponse = serde_json::from_value(json!({"success": true})).unwrap();
        assert!(markdown_from(empty).is_none());
    }
}
