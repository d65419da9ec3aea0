//! Paperbind main entry point
//!
//! This is the command-line interface that turns a saved-articles CSV export
//! into an offline-readable book.

use anyhow::Context;
use clap::Parser;
use paperbind::config::{load_config, validate, Config};
use paperbind::input::{find_latest_csv, read_entries};
use paperbind::delivery::{EmailCredentials, EmailSender};
use paperbind::output::{ArticleSink, BookMetadata, EpubWriter, HtmlBookWriter, MarkdownWriter};
use paperbind::{PaperbindError, Pipeline};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Paperbind: turn a read-it-later export into an offline book
///
/// Fetches every article listed in the CSV export, extracts its readable
/// content, writes an EPUB book (optionally plus an HTML book and markdown
/// files) and emails the EPUB when SMTP credentials are set.
#[derive(Parser, Debug)]
#[command(name = "paperbind")]
#[command(version)]
#[command(about = "Turn a read-it-later CSV export into an offline book", long_about = None)]
struct Cli {
    /// Path to the CSV export (default: newest .csv in the input directory)
    #[arg(value_name = "CSV")]
    csv: Option<PathBuf>,

    /// Path to TOML configuration file
    #[arg(short, long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Output directory
    #[arg(short, long, value_name = "DIR")]
    output: Option<PathBuf>,

    /// Number of concurrent fetch workers
    #[arg(long)]
    concurrency: Option<usize>,

    /// Per-request timeout in seconds
    #[arg(long, value_name = "SECS")]
    timeout: Option<u64>,

    /// Also write one markdown file per article
    #[arg(long)]
    markdown: bool,

    /// Also write a single-file HTML book
    #[arg(long)]
    html: bool,

    /// Do not email the finished book
    #[arg(long)]
    no_email: bool,

    /// Book title
    #[arg(long)]
    title: Option<String>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

impl Cli {
    /// Applies command-line overrides on top of file configuration
    fn apply_overrides(&self, config: &mut Config) {
        if let Some(output) = &self.output {
            config.output.directory = output.display().to_string();
        }
        if let Some(concurrency) = self.concurrency {
            config.pipeline.concurrency = concurrency;
        }
        if let Some(timeout) = self.timeout {
            config.fetch.timeout_secs = timeout;
        }
        if self.markdown {
            config.output.markdown = true;
        }
        if self.html {
            config.output.html = true;
        }
        if self.no_email {
            config.email.enabled = false;
        }
        if let Some(title) = &self.title {
            config.output.book_title = title.clone();
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    // SMTP credentials may live in a local .env file
    if let Ok(path) = dotenvy::dotenv() {
        tracing::debug!("Loaded environment from {}", path.display());
    }

    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            load_config(path)
                .with_context(|| format!("failed to load {}", path.display()))?
        }
        None => Config::default(),
    };
    cli.apply_overrides(&mut config);
    validate(&config).context("invalid configuration")?;

    let csv_path = resolve_csv_path(cli.csv.as_deref(), &config)?;
    run(&config, &csv_path).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("paperbind=info,warn"),
            1 => EnvFilter::new("paperbind=debug,info"),
            2 => EnvFilter::new("paperbind=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Uses the given CSV path or falls back to the newest export in the input
/// directory
fn resolve_csv_path(explicit: Option<&Path>, config: &Config) -> anyhow::Result<PathBuf> {
    if let Some(path) = explicit {
        return Ok(path.to_path_buf());
    }

    let input_dir = Path::new(&config.input.directory);
    let found = find_latest_csv(input_dir)
        .ok_or_else(|| PaperbindError::NoInput(input_dir.display().to_string()))
        .context("pass a CSV path or place a .csv file in the input directory")?;

    tracing::info!("Auto-detected CSV: {}", found.display());
    Ok(found)
}

/// Runs the whole conversion: read, fetch and extract, write
async fn run(config: &Config, csv_path: &Path) -> anyhow::Result<()> {
    let batch = read_entries(csv_path, &config.input)?;
    if batch.entries.is_empty() {
        anyhow::bail!("no entries to process after filtering");
    }

    let pipeline = Pipeline::from_config(config).context("failed to build HTTP client")?;
    let report = pipeline.run(batch.entries).await;
    if !report.skipped.is_empty() {
        tracing::warn!("{} entries skipped", report.skipped.len());
    }
    let articles = report.into_articles()?;

    let date = chrono::Local::now().format("%Y-%m-%d").to_string();
    let title = if config.output.book_title.trim().is_empty() {
        format!("Reading list – {}", date)
    } else {
        config.output.book_title.clone()
    };

    let output_dir = PathBuf::from(&config.output.directory);
    let metadata = BookMetadata {
        title: title.clone(),
        author: config.output.author.clone(),
        language: config.output.language.clone(),
        date: date.clone(),
    };
    let epub = EpubWriter::new(&output_dir, &config.output.file_stem, metadata);
    let written = epub.write(&articles)?;
    let epub_path = epub.path();
    for path in &written.paths {
        tracing::info!("Done! EPUB saved to: {}", path.display());
    }

    if config.output.html {
        let book = HtmlBookWriter::new(&output_dir, &config.output.file_stem, title, date.clone());
        for path in book.write(&articles)?.paths {
            tracing::info!("HTML book saved to: {}", path.display());
        }
    }

    if config.output.markdown {
        MarkdownWriter::new(&output_dir).write(&articles)?;
    }

    if config.email.enabled {
        let sender = EmailSender::new(&config.email, EmailCredentials::from_env());
        sender
            .send_book(&epub_path, &date)
            .await
            .context("failed to email the book")?;
    }

    Ok(())
}
