//! Structured extraction: free text → [`EventRecord`] via a chat completion.

mod openai;
mod prompt;

pub use openai::{
    ChatRequest, ChatResponse, CompletionProvider, DEFAULT_BASE_URL, Message, OpenAiProvider,
    ResponseFormat,
};
pub use prompt::SYSTEM_PROMPT;

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::config::ExtractorConfig;
use crate::error::{ConfigError, ExtractionError};
use crate::event::EventRecord;

/// Low temperature biases the model toward the same structured answer.
pub const TEMPERATURE: f32 = 0.3;

/// Derives an [`EventRecord`] from unstructured text.
///
/// Each call makes exactly one provider request and keeps no state.
#[derive(Clone)]
pub struct EventExtractor {
    provider: Arc<dyn CompletionProvider>,
    model: String,
    max_tokens: u32,
    timeout: Duration,
}

impl EventExtractor {
    pub fn new(provider: Arc<dyn CompletionProvider>, config: &ExtractorConfig) -> Self {
        Self {
            provider,
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }

    /// Build an extractor backed by the OpenAI-compatible endpoint in `config`.
    pub fn from_config(config: &ExtractorConfig) -> Result<Self, ConfigError> {
        let api_key = config
            .api_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .ok_or(ConfigError::Missing("extractor.api_key (or OPENAI_API_KEY)"))?;

        let provider = OpenAiProvider::new(api_key).with_base_url(&config.base_url);
        Ok(Self::new(Arc::new(provider), config))
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// The request sent for `text`.
    pub fn request_for(&self, text: &str) -> ChatRequest {
        ChatRequest {
            model: self.model.clone(),
            messages: vec![Message::system(SYSTEM_PROMPT), Message::user(text)],
            temperature: TEMPERATURE,
            max_tokens: self.max_tokens,
            response_format: Some(ResponseFormat::json_object()),
        }
    }

    /// Extract one event from `text`.
    ///
    /// Returns [`ExtractionError::Cancelled`] as soon as `cancel` fires and
    /// [`ExtractionError::Timeout`] when the provider does not answer in time;
    /// the in-flight request is dropped in both cases.
    pub async fn extract(
        &self,
        text: &str,
        cancel: &CancellationToken,
    ) -> Result<EventRecord, ExtractionError> {
        if text.trim().is_empty() {
            return Err(ExtractionError::EmptyInput);
        }

        let request = self.request_for(text);
        debug!(model = %self.model, chars = text.chars().count(), "extracting event");

        let reply = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(ExtractionError::Cancelled),
            reply = tokio::time::timeout(self.timeout, self.provider.complete(&request)) => reply,
        };

        let content = reply
            .map_err(|_| ExtractionError::Timeout(self.timeout))?
            .map_err(ExtractionError::Provider)?
            .filter(|c| !c.trim().is_empty())
            .ok_or(ExtractionError::EmptyCompletion)?;

        let record = parse_completion(&content)?;
        info!(title = %record.title(), date = %record.date(), "extracted event");
        Ok(record)
    }
}

/// Two-phase decode: untyped JSON first, then the schema.
pub fn parse_completion(content: &str) -> Result<EventRecord, ExtractionError> {
    let value: serde_json::Value =
        serde_json::from_str(content).map_err(ExtractionError::InvalidJson)?;
    Ok(EventRecord::validate(&value)?)
}
