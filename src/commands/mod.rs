pub mod config;
pub mod extract;
pub mod ics;
pub mod run;

use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use sked_core::CalendarArtifact;
use sked_core::config::{KeyFallbacks, SkedConfig};

/// Load config from `path` (or the default location) with env key fallbacks.
pub fn load_config(path: Option<&Path>) -> Result<SkedConfig> {
    SkedConfig::load(path, KeyFallbacks::from_env()).context("Failed to load configuration")
}

/// Text from the argument, a file, or stdin, in that order.
pub fn read_input(text: Option<String>, file: Option<&Path>) -> Result<String> {
    if let Some(text) = text {
        return Ok(text);
    }

    match file {
        Some(path) if path != Path::new("-") => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display())),
        _ => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read stdin")?;
            Ok(buf)
        }
    }
}

/// Write the calendar file into `out_dir` (current directory by default).
pub fn write_artifact(artifact: &CalendarArtifact, out_dir: Option<&Path>) -> Result<PathBuf> {
    let dir = out_dir.unwrap_or(Path::new("."));
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create {}", dir.display()))?;

    let path = dir.join(&artifact.file_name);
    std::fs::write(&path, &artifact.content)
        .with_context(|| format!("Failed to write {}", path.display()))?;

    Ok(path)
}

#[cfg(test)]
mod tests {
    use sked_core::{EventRecord, IcsGenerator};

    use super::*;

    #[test]
    fn argument_text_wins_over_file() {
        let text = read_input(Some("dinner at 7".into()), Some(Path::new("/nonexistent"))).unwrap();
        assert_eq!(text, "dinner at 7");
    }

    #[test]
    fn reads_text_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notice.txt");
        std::fs::write(&path, "Team dinner Friday 7pm").unwrap();

        assert_eq!(
            read_input(None, Some(&path)).unwrap(),
            "Team dinner Friday 7pm"
        );
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_input(None, Some(&dir.path().join("nope.txt"))).unwrap_err();
        assert!(err.to_string().contains("nope.txt"));
    }

    #[test]
    fn writes_artifact_under_its_file_name() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("calendars");
        let event = EventRecord::new("Team Dinner", "", "2024-05-10", "19:00", "").unwrap();
        let artifact = IcsGenerator::default().generate(&event, None).unwrap();

        let path = write_artifact(&artifact, Some(&out)).unwrap();

        assert_eq!(path, out.join("Team Dinner.ics"));
        let written = std::fs::read_to_string(&path).unwrap();
        assert_eq!(written, artifact.content);
        assert!(written.contains("SUMMARY:Team Dinner"));
    }
}
