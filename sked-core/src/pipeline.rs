//! scrape → extract → serialize, as used by the CLI and the server.

use std::sync::Arc;

use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::config::SkedConfig;
use crate::error::{ConfigError, ExtractionError, ScrapeError, SerializationError};
use crate::event::EventRecord;
use crate::extract::{CompletionProvider, EventExtractor};
use crate::ics::{CalendarArtifact, IcsGenerator};
use crate::retry::{RetryPolicy, extract_with_retry};
use crate::scrape::Scraper;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Scrape(#[from] ScrapeError),

    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    #[error(transparent)]
    Serialization(#[from] SerializationError),
}

/// The three stages wired together. Cheap to clone and share.
#[derive(Clone)]
pub struct Pipeline {
    scraper: Scraper,
    extractor: EventExtractor,
    generator: IcsGenerator,
    retry: RetryPolicy,
}

impl Pipeline {
    pub fn new(
        scraper: Scraper,
        extractor: EventExtractor,
        generator: IcsGenerator,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            scraper,
            extractor,
            generator,
            retry,
        }
    }

    /// Build every stage from `config` with the OpenAI provider.
    pub fn from_config(config: &SkedConfig) -> Result<Self, ConfigError> {
        Ok(Self::new(
            Scraper::new(&config.scraper),
            EventExtractor::from_config(&config.extractor)?,
            IcsGenerator::new(&config.calendar),
            RetryPolicy::from(&config.retry),
        ))
    }

    /// Same as [`Pipeline::from_config`] but with a caller-supplied provider.
    pub fn with_provider(config: &SkedConfig, provider: Arc<dyn CompletionProvider>) -> Self {
        Self::new(
            Scraper::new(&config.scraper),
            EventExtractor::new(provider, &config.extractor),
            IcsGenerator::new(&config.calendar),
            RetryPolicy::from(&config.retry),
        )
    }

    pub fn generator(&self) -> &IcsGenerator {
        &self.generator
    }

    pub async fn scrape(&self, url: &str) -> Result<String, PipelineError> {
        Ok(self.scraper.scrape(url).await?)
    }

    /// Extract with the configured retry policy.
    pub async fn extract_text(
        &self,
        text: &str,
        cancel: &CancellationToken,
    ) -> Result<EventRecord, PipelineError> {
        Ok(extract_with_retry(&self.extractor, text, &self.retry, cancel).await?)
    }

    pub fn serialize(
        &self,
        event: &EventRecord,
        url: Option<&str>,
    ) -> Result<CalendarArtifact, PipelineError> {
        Ok(self.generator.generate(event, url)?)
    }

    /// Text in, calendar file out.
    pub async fn from_text(
        &self,
        text: &str,
        source_url: Option<&str>,
        cancel: &CancellationToken,
    ) -> Result<(EventRecord, CalendarArtifact), PipelineError> {
        let event = self.extract_text(text, cancel).await?;
        let artifact = self.serialize(&event, source_url)?;
        Ok((event, artifact))
    }

    /// Page in, calendar file out. The page URL is embedded in the event.
    pub async fn from_url(
        &self,
        url: &str,
        cancel: &CancellationToken,
    ) -> Result<(EventRecord, CalendarArtifact), PipelineError> {
        let text = self.scrape(url).await?;
        self.from_text(&text, Some(url), cancel).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::tests::{DINNER_REPLY, MockProvider, Reply};

    fn pipeline(provider: Arc<MockProvider>) -> Pipeline {
        Pipeline::with_provider(&SkedConfig::default(), provider)
    }

    #[tokio::test]
    async fn test_team_dinner_end_to_end() {
        let provider = MockProvider::new(vec![Reply::Content(DINNER_REPLY)]);
        let pipeline = pipeline(provider);

        let (event, artifact) = pipeline
            .from_text(
                "Team dinner next Friday at 7pm at ABC Restaurant, Gangnam",
                None,
                &CancellationToken::new(),
            )
            .await
            .unwrap();

        assert_eq!(
            event,
            EventRecord::new(
                "Team Dinner",
                "Team dinner",
                "2024-05-10",
                "19:00",
                "ABC Restaurant, Gangnam"
            )
            .unwrap()
        );

        let ics = artifact.content.replace("\r\n ", "");
        assert!(ics.contains("\r\nDTSTART:20240510T190000\r\n"), "ICS:\n{ics}");
        assert!(ics.contains("\r\nDTEND:20240510T210000\r\n"), "ICS:\n{ics}");
        let (start, end) = pipeline.generator().event_window(&event).unwrap();
        assert_eq!((end - start).num_hours(), 2);
        assert!(ics.contains("BEGIN:VALARM"));
    }

    #[tokio::test]
    async fn test_extraction_failure_yields_no_artifact() {
        let provider = MockProvider::new(vec![Reply::Content("not json")]);
        let err = pipeline(provider)
            .from_text("dinner", None, &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Extraction(ExtractionError::InvalidJson(_))
        ));
    }

    #[tokio::test]
    async fn test_schema_valid_but_impossible_date_fails_serialization() {
        let provider = MockProvider::new(vec![Reply::Content(
            r#"{"title":"Dinner","description":"","date":"2024-02-30","time":"19:00","location":""}"#,
        )]);
        let err = pipeline(provider)
            .from_text("dinner", None, &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Serialization(SerializationError::InvalidDate { .. })
        ));
    }

    #[tokio::test]
    async fn test_from_url_rejects_bad_url_before_extracting() {
        let provider = MockProvider::new(vec![Reply::Content(DINNER_REPLY)]);
        let err = pipeline(provider.clone())
            .from_url("ftp://example.com", &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Scrape(ScrapeError::InvalidUrl { .. })
        ));
        assert_eq!(provider.calls(), 0);
    }

    #[test]
    fn test_from_config_needs_api_key() {
        assert!(Pipeline::from_config(&SkedConfig::default()).is_err());
    }
}
