use std::path::Path;

use anyhow::Result;
use owo_colors::OwoColorize;
use sked_core::{CancellationToken, Pipeline};

use crate::utils::tui::create_spinner;

pub async fn run(
    config_path: Option<&Path>,
    url: &str,
    out_dir: Option<&Path>,
    cancel: &CancellationToken,
) -> Result<()> {
    let config = super::load_config(config_path)?;
    let pipeline = Pipeline::from_config(&config)?;

    let spinner = create_spinner(format!(
        "Reading {url} with {}",
        config.extractor.model
    ));
    let result = pipeline.from_url(url, cancel).await;
    spinner.finish_and_clear();
    let (event, artifact) = result?;

    let path = super::write_artifact(&artifact, out_dir)?;

    println!("{}", event.title().bold());
    println!("  When:   {} {}", event.date(), event.time());
    if !event.location().is_empty() {
        println!("  Where:  {}", event.location());
    }
    println!("{} {}", "Wrote".green(), path.display());

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn bad_url_fails_before_writing_anything() {
        let dir = tempfile::tempdir().unwrap();
        let config = dir.path().join("config.toml");
        std::fs::write(&config, "[extractor]\napi_key = \"sk-test\"\n").unwrap();
        let out = dir.path().join("out");

        let err = run(
            Some(&config),
            "ftp://example.com/party",
            Some(&out),
            &CancellationToken::new(),
        )
        .await
        .unwrap_err();

        assert!(err.to_string().contains("Invalid URL"), "{err}");
        assert!(!out.exists());
    }
}
