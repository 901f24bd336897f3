//! Command-line interface for feature-stream
//!
//! # Usage Examples
//!
//! ## Copy
//! ```bash
//! # Download a feature file and store it gzip-compressed
//! feature-stream copy https://example.com/features.json features.json.gz
//!
//! # Upload a local file with PUT and an auth header
//! feature-stream copy features.json https://example.com/upload \
//!   --to-opt method=PUT \
//!   --to-opt "header.Authorization=Bearer abc"
//! ```
//!
//! ## Cat
//! ```bash
//! # Print a compressed file, decompressed
//! feature-stream cat features.json.gz
//! ```
//!
//! ## Options File
//! ```toml
//! [from]
//! timeout = "30s"
//! "header.Accept" = "application/json"
//!
//! [to]
//! compression = "gzip"
//! buffer_size = 131072
//! ```
//! Options given on the command line override the file.

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use futures::StreamExt;
use serde::Deserialize;
use tokio::io::AsyncWriteExt;

use feature_stream::config::parse_key_value;
use feature_stream::{ConnectionOptions, Registry};

#[derive(Parser)]
#[command(name = "feature-stream")]
#[command(about = "Stream feature records between files and HTTP endpoints")]
#[command(long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Copy a source connection into a destination connection
    Copy {
        /// Source connection (file path or URL)
        from: String,

        /// Destination connection (file path or URL)
        to: String,

        /// Source option as KEY=VALUE (repeatable)
        #[arg(long = "from-opt", value_name = "KEY=VALUE", value_parser = parse_key_value)]
        from_opts: Vec<(String, String)>,

        /// Destination option as KEY=VALUE (repeatable)
        #[arg(long = "to-opt", value_name = "KEY=VALUE", value_parser = parse_key_value)]
        to_opts: Vec<(String, String)>,

        /// TOML file with [from] and [to] option tables
        #[arg(long, value_name = "PATH", env = "FEATURE_STREAM_CONFIG")]
        config: Option<PathBuf>,
    },

    /// Write a source connection to stdout
    Cat {
        /// Source connection (file path or URL)
        from: String,

        /// Source option as KEY=VALUE (repeatable)
        #[arg(long = "from-opt", value_name = "KEY=VALUE", value_parser = parse_key_value)]
        from_opts: Vec<(String, String)>,

        /// TOML file with a [from] option table
        #[arg(long, value_name = "PATH", env = "FEATURE_STREAM_CONFIG")]
        config: Option<PathBuf>,
    },
}

/// Contents of an options file.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct OptionsFile {
    from: ConnectionOptions,
    to: ConnectionOptions,
}

impl OptionsFile {
    fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read options file {path:?}"))?;
        toml::from_str(&content).with_context(|| format!("Failed to parse options file {path:?}"))
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = run().await {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
    Ok(())
}

async fn run() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let registry = Registry::with_defaults();

    match cli.command {
        Commands::Copy {
            from,
            to,
            from_opts,
            to_opts,
            config,
        } => {
            let file = OptionsFile::load(config.as_deref())?;
            let from_options = file.from.merge(&from_opts.into_iter().collect());
            let to_options = file.to.merge(&to_opts.into_iter().collect());
            run_copy(&registry, &from, &from_options, &to, &to_options).await?;
        }
        Commands::Cat {
            from,
            from_opts,
            config,
        } => {
            let file = OptionsFile::load(config.as_deref())?;
            let from_options = file.from.merge(&from_opts.into_iter().collect());
            run_cat(&registry, &from, &from_options).await?;
        }
    }

    Ok(())
}

async fn run_copy(
    registry: &Registry,
    from: &str,
    from_options: &ConnectionOptions,
    to: &str,
    to_options: &ConnectionOptions,
) -> anyhow::Result<()> {
    tracing::info!("Copying {from} to {to}");
    let source = registry
        .from(from, from_options)
        .with_context(|| format!("Failed to open source {from}"))?;
    let sink = registry
        .to(to, to_options)
        .with_context(|| format!("Failed to open destination {to}"))?;
    source
        .forward(sink)
        .await
        .with_context(|| format!("Failed to copy {from} to {to}"))?;
    tracing::info!("Copied {from} to {to}");
    Ok(())
}

async fn run_cat(
    registry: &Registry,
    from: &str,
    from_options: &ConnectionOptions,
) -> anyhow::Result<()> {
    let mut source = registry
        .from(from, from_options)
        .with_context(|| format!("Failed to open source {from}"))?;
    let mut stdout = tokio::io::stdout();
    let mut total = 0usize;
    while let Some(record) = source.next().await {
        let record = record.with_context(|| format!("Failed to read {from}"))?;
        total += record.len();
        stdout.write_all(&record).await?;
    }
    stdout.flush().await?;
    tracing::debug!("Wrote {total} bytes from {from}");
    Ok(())
}
