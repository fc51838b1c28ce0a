use std::path::Path;

use anyhow::Result;
use owo_colors::OwoColorize;
use sked_core::config::SkedConfig;

pub fn run(config_path: Option<&Path>) -> Result<()> {
    let path = match config_path {
        Some(p) => p.to_path_buf(),
        None => SkedConfig::config_path()?,
    };

    if !path.exists() {
        SkedConfig::create_default_config(&path)?;
        println!("{} {}", "Created".green(), path.display());
    }

    let config = super::load_config(Some(&path))?;

    println!("{}", "Paths".bold());
    println!("  Config:     {}", path.display());
    println!("{}", "Extractor".bold());
    println!("  Model:      {}", config.extractor.model);
    println!("  API key:    {}", key_status(config.extractor.api_key.is_some()));
    println!("{}", "Scraper".bold());
    println!("  Endpoint:   {}", config.scraper.endpoint);
    println!("  API key:    {}", key_status(config.scraper.api_key.is_some()));

    Ok(())
}

fn key_status(set: bool) -> String {
    if set {
        "set".green().to_string()
    } else {
        "missing".red().to_string()
    }
}
