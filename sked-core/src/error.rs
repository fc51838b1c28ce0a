//! Error types for the sked pipeline.

use std::fmt;
use std::time::Duration;

use thiserror::Error;

/// A single schema violation on one field of a candidate event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldIssue {
    Missing(&'static str),
    NotAString(&'static str),
    TooShort { field: &'static str, min: usize },
    TooLong { field: &'static str, max: usize, actual: usize },
    Pattern { field: &'static str, expected: &'static str },
}

impl FieldIssue {
    pub fn field(&self) -> &'static str {
        match self {
            FieldIssue::Missing(field) | FieldIssue::NotAString(field) => field,
            FieldIssue::TooShort { field, .. }
            | FieldIssue::TooLong { field, .. }
            | FieldIssue::Pattern { field, .. } => field,
        }
    }
}

impl fmt::Display for FieldIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldIssue::Missing(field) => write!(f, "{field}: required"),
            FieldIssue::NotAString(field) => write!(f, "{field}: expected a string"),
            FieldIssue::TooShort { field, min } => {
                write!(f, "{field}: must be at least {min} character(s)")
            }
            FieldIssue::TooLong { field, max, actual } => {
                write!(f, "{field}: must be at most {max} characters (got {actual})")
            }
            FieldIssue::Pattern { field, expected } => write!(f, "{field}: expected {expected}"),
        }
    }
}

/// The candidate did not match the event schema.
///
/// Carries every violation found, not just the first.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaValidationError {
    #[error("Invalid event data: expected a JSON object")]
    NotAnObject,

    #[error("Invalid event data: {}", join_issues(.0))]
    Fields(Vec<FieldIssue>),
}

impl SchemaValidationError {
    pub fn issues(&self) -> &[FieldIssue] {
        match self {
            SchemaValidationError::NotAnObject => &[],
            SchemaValidationError::Fields(issues) => issues,
        }
    }
}

fn join_issues(issues: &[FieldIssue]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Failures talking to the language-model provider.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Connection failed, DNS, TLS, reset
    #[error("Network error: {0}")]
    Network(String),

    /// Non-2xx response (auth, rate limit, bad request, server error)
    #[error("API error ({status}): {body}")]
    Api { status: u16, body: String },

    /// Response body was not the expected completion shape
    #[error("Unexpected response: {0}")]
    Parse(String),
}

impl ProviderError {
    /// Whether a later attempt could plausibly succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            ProviderError::Network(_) => true,
            ProviderError::Api { status, .. } => *status == 429 || *status >= 500,
            ProviderError::Parse(_) => false,
        }
    }
}

/// Errors from turning free text into an [`EventRecord`](crate::EventRecord).
#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("Event extraction failed: input text is empty")]
    EmptyInput,

    #[error("Event extraction failed: {0}")]
    Provider(#[source] ProviderError),

    #[error("Event extraction failed: completion contained no content")]
    EmptyCompletion,

    #[error("Event extraction failed: completion is not valid JSON: {0}")]
    InvalidJson(#[source] serde_json::Error),

    #[error("Event extraction failed: {0}")]
    Schema(#[from] SchemaValidationError),

    #[error("Event extraction failed: provider did not answer within {}s", .0.as_secs())]
    Timeout(Duration),

    #[error("Event extraction cancelled")]
    Cancelled,
}

impl ExtractionError {
    /// Transient provider failures and timeouts may be retried; a reply that
    /// failed to parse or validate must not be.
    pub fn is_retryable(&self) -> bool {
        match self {
            ExtractionError::Provider(e) => e.is_transient(),
            ExtractionError::Timeout(_) => true,
            _ => false,
        }
    }
}

/// Errors from rendering an event as calendar text.
#[derive(Debug, Error)]
pub enum SerializationError {
    #[error("ICS generation failed: invalid date '{value}': {reason}")]
    InvalidDate { value: String, reason: String },

    #[error("ICS generation failed: invalid time '{value}': {reason}")]
    InvalidTime { value: String, reason: String },

    #[error("ICS generation failed: end time overflows the calendar")]
    Overflow,

    #[error("ICS generation failed: {0}")]
    Render(String),
}

/// Errors from the page-text acquisition collaborator.
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("Invalid URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("Scrape API key is not configured")]
    MissingApiKey,

    #[error("Scrape request failed for {url}: {message}")]
    Network { url: String, message: String },

    #[error("Scrape API returned {status} for {url}: {body}")]
    Api { url: String, status: u16, body: String },

    #[error("Scrape result for {0} contained no markdown content")]
    NoContent(String),
}

/// Errors loading or writing configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration error: {0}")]
    Invalid(String),

    #[error("Configuration error: {0} is required")]
    Missing(&'static str),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<config::ConfigError> for ConfigError {
    fn from(e: config::ConfigError) -> Self {
        ConfigError::Invalid(e.to_string())
    }
}

/// Result type alias for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;
