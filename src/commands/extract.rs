use std::path::Path;

use anyhow::Result;
use sked_core::{CancellationToken, Pipeline};

use crate::utils::tui::create_spinner;

pub async fn run(config_path: Option<&Path>, text: &str, cancel: &CancellationToken) -> Result<()> {
    let config = super::load_config(config_path)?;
    let pipeline = Pipeline::from_config(&config)?;

    let spinner = create_spinner(format!("Extracting with {}", config.extractor.model));
    let result = pipeline.extract_text(text, cancel).await;
    spinner.finish_and_clear();

    let event = result?;
    println!("{}", serde_json::to_string_pretty(&event)?);

    Ok(())
}
