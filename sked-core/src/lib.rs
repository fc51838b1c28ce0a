//! Core pipeline for sked.
//!
//! This crate turns scraped page text into a calendar file in two stages:
//! - `extract`: free text → validated [`EventRecord`] via a language model
//! - `ics`: [`EventRecord`] → RFC 5545 calendar text
//!
//! The surrounding pieces (`scrape`, `retry`, `pipeline`, `config`) are thin
//! collaborators shared by the CLI and the HTTP server.

pub mod config;
pub mod error;
pub mod event;
pub mod extract;
pub mod filename;
pub mod ics;
pub mod pipeline;
pub mod retry;
pub mod scrape;

pub use error::{
    ConfigError, ExtractionError, FieldIssue, ProviderError, SchemaValidationError, ScrapeError,
    SerializationError,
};
pub use event::EventRecord;
pub use extract::{CompletionProvider, EventExtractor, OpenAiProvider};
pub use ics::{CalendarArtifact, IcsGenerator};
pub use pipeline::{Pipeline, PipelineError};
pub use retry::RetryPolicy;
pub use scrape::Scraper;

// Callers thread cancellation through `EventExtractor::extract`.
pub use tokio_util::sync::CancellationToken;
