use std::path::Path;

use anyhow::{Context, Result};
use owo_colors::OwoColorize;
use sked_core::{EventRecord, IcsGenerator};

pub fn run(
    config_path: Option<&Path>,
    event_path: Option<&Path>,
    url: Option<&str>,
    out_dir: Option<&Path>,
) -> Result<()> {
    let config = super::load_config(config_path)?;

    let json = super::read_input(None, event_path)?;
    let candidate: serde_json::Value =
        serde_json::from_str(&json).context("Event input is not valid JSON")?;
    let event = EventRecord::validate(&candidate)?;

    let artifact = IcsGenerator::new(&config.calendar).generate(&event, url)?;
    let path = super::write_artifact(&artifact, out_dir)?;

    println!("{} {}", "Wrote".green(), path.display());

    Ok(())
}
