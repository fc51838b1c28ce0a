mod commands;
mod utils;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use sked_core::CancellationToken;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "sked")]
#[command(about = "Turn event announcements into calendar files")]
struct Cli {
    /// Config file to use instead of ~/.config/sked/config.toml
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract an event from text and print it as JSON
    Extract {
        /// Announcement text (reads stdin when neither this nor --file is given)
        text: Option<String>,

        /// Read the announcement from a file
        #[arg(short, long, conflicts_with = "text")]
        file: Option<PathBuf>,
    },
    /// Write an .ics file from event JSON
    Ics {
        /// Event JSON file ("-" or omitted for stdin)
        #[arg(short, long)]
        event: Option<PathBuf>,

        /// Link to embed in the event
        #[arg(long)]
        url: Option<String>,

        /// Directory to write the file into
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// Scrape a page, extract its event and write an .ics file
    Run {
        url: String,

        /// Directory to write the file into
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// Show the config path, creating a default file if there is none
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .with_writer(std::io::stderr)
        .init();

    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let cancel = CancellationToken::new();
    tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                cancel.cancel();
            }
        }
    });

    let config = cli.config.as_deref();

    match cli.command {
        Commands::Extract { text, file } => {
            let text = commands::read_input(text, file.as_deref())?;
            commands::extract::run(config, &text, &cancel).await
        }
        Commands::Ics { event, url, out } => {
            commands::ics::run(config, event.as_deref(), url.as_deref(), out.as_deref())
        }
        Commands::Run { url, out } => {
            commands::run::run(config, &url, out.as_deref(), &cancel).await
        }
        Commands::Config => commands::config::run(config),
    }
}
