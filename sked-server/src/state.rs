use std::sync::Arc;

use anyhow::{Context, Result};
use sked_core::Pipeline;
use sked_core::config::SkedConfig;

/// Shared application state
///
/// Every component is stateless, so one pipeline serves all requests.
#[derive(Clone)]
pub struct AppState {
    pipeline: Arc<Pipeline>,
    api_secret: Option<Arc<str>>,
}

impl AppState {
    pub fn new(pipeline: Pipeline, api_secret: Option<String>) -> Self {
        AppState {
            pipeline: Arc::new(pipeline),
            api_secret: api_secret
                .filter(|s| !s.trim().is_empty())
                .map(Arc::from),
        }
    }

    pub fn from_config(config: &SkedConfig) -> Result<Self> {
        let pipeline =
            Pipeline::from_config(config).context("Failed to build extraction pipeline")?;
        Ok(Self::new(pipeline, config.server.api_secret.clone()))
    }

    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    pub fn api_secret(&self) -> Option<&str> {
        self.api_secret.as_deref()
    }
}
