//! folio: command-line front end for PDF onboarding.
//!
//! Configuration comes from the environment (and a `.env` file):
//!   ANTHROPIC_API_KEY  - model credential (required for `onboard`)
//!   DATABASE_URL       - store connection string (default: sqlite://db.sqlite)
//!   MAX_CONCURRENCY    - concurrent page analysis calls (default: 20)
//!   LOG_FORMAT         - "json" or "text" (default: "text")
//!   RUST_LOG           - standard env filter (default: "folio=info")

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use folio_core::defaults::{DATABASE_URL, ENV_DATABASE_URL};
use folio_core::{DocumentReadout, FileInput, FolioConfig};
use folio_db::Database;
use folio_onboard::{onboard_file, OnboardingPipeline};

#[derive(Parser)]
#[command(name = "folio")]
#[command(author, version, about = "Onboard PDF documents into a searchable page store")]
#[command(propagate_version = true)]
struct Cli {
    /// Store connection string (overrides DATABASE_URL)
    #[arg(long, global = true)]
    database_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or upgrade the database schema
    Migrate,

    /// Onboard one or more PDF files, stopping at the first failure
    Onboard {
        /// Thread the documents belong to
        #[arg(short, long)]
        thread: String,

        /// Maximum concurrent page analysis calls (overrides MAX_CONCURRENCY)
        #[arg(long)]
        max_concurrency: Option<usize>,

        /// Files to onboard
        #[arg(required = true, num_args = 1..)]
        files: Vec<PathBuf>,
    },

    /// Print an onboarded document with its page content as JSON
    Read {
        /// Document id
        document_id: i64,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    init_logging();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn init_logging() {
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "folio=info,folio_onboard=info,folio_db=info".into());

    let registry = tracing_subscriber::registry().with(env_filter);
    if log_format == "json" {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Migrate => {
            let db = connect(&database_url(cli.database_url)).await?;
            db.migrate().await?;
            println!("Schema is up to date");
        }
        Commands::Onboard {
            thread,
            max_concurrency,
            files,
        } => {
            let mut config = FolioConfig::from_env()?;
            if let Some(url) = cli.database_url {
                config.database_url = url;
            }
            if let Some(n) = max_concurrency {
                config.max_concurrency = n;
            }
            cmd_onboard(&config, &thread, &files).await?;
        }
        Commands::Read { document_id } => {
            let db = connect(&database_url(cli.database_url)).await?;
            cmd_read(&db, document_id).await?;
        }
    }
    Ok(())
}

fn database_url(flag: Option<String>) -> String {
    flag.or_else(|| std::env::var(ENV_DATABASE_URL).ok())
        .filter(|url| !url.trim().is_empty())
        .unwrap_or_else(|| DATABASE_URL.to_string())
}

async fn connect(url: &str) -> anyhow::Result<Database> {
    Database::connect(url)
        .await
        .with_context(|| format!("Cannot open store at {}", url))
}

async fn cmd_onboard(config: &FolioConfig, thread_id: &str, files: &[PathBuf]) -> anyhow::Result<()> {
    let db = connect(&config.database_url).await?;
    db.migrate().await?;
    let pipeline = OnboardingPipeline::from_config(db, config)?;
    if !pipeline.extractor_ready().await? {
        bail!("PDF extraction tools are unavailable; install poppler-utils (pdfinfo, pdftotext, pdftoppm)");
    }

    info!(
        subsystem = "cli",
        files = files.len(),
        thread_id,
        max_concurrency = pipeline.max_concurrency(),
        "Starting onboarding"
    );

    for path in files {
        let input = FileInput::new(display_name(path), path);
        let outcome = onboard_file(&pipeline, input, thread_id)
            .await
            .with_context(|| format!("Failed to onboard {}", path.display()))?;

        let output = serde_json::json!({
            "document_id": outcome.document.id,
            "filename": outcome.document.filename,
            "page_count": outcome.page_count,
            "run_id": outcome.run_id.to_string(),
            "description": outcome.document.description,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    }
    Ok(())
}

async fn cmd_read(db: &Database, document_id: i64) -> anyhow::Result<()> {
    match db.documents.read_document(document_id).await? {
        DocumentReadout::NotFound(id) => bail!("File with id {} not found", id),
        DocumentReadout::NoPages { document } => {
            println!("No pages found for file: {}", document.filename);
        }
        DocumentReadout::Found(contents) => {
            println!("{}", serde_json::to_string_pretty(&contents)?);
        }
    }
    Ok(())
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_onboard() {
        let cli = Cli::try_parse_from([
            "folio", "onboard", "--thread", "t-1", "a.pdf", "b.pdf",
        ])
        .unwrap();
        match cli.command {
            Commands::Onboard { thread, files, max_concurrency } => {
                assert_eq!(thread, "t-1");
                assert_eq!(files, vec![PathBuf::from("a.pdf"), PathBuf::from("b.pdf")]);
                assert!(max_concurrency.is_none());
            }
            _ => panic!("expected onboard"),
        }
    }

    #[test]
    fn test_cli_requires_files() {
        assert!(Cli::try_parse_from(["folio", "onboard", "--thread", "t"]).is_err());
    }

    #[test]
    fn test_database_url_flag_wins() {
        assert_eq!(database_url(Some("sqlite://x.db".to_string())), "sqlite://x.db");
    }

    #[test]
    fn test_display_name() {
        assert_eq!(display_name(Path::new("/tmp/docs/report.pdf")), "report.pdf");
    }
}
