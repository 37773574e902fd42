//! # folio-onboard
//!
//! The PDF onboarding pipeline.
//!
//! A PDF is split into per-page text and page images, every page image is
//! described by a vision model under a concurrency limit, the descriptions
//! are summarized into a document description, and all rows are committed
//! in one transaction.
//!
//! ```rust,ignore
//! use folio_core::{FileInput, FolioConfig};
//! use folio_db::Database;
//! use folio_onboard::{onboard_file, OnboardingPipeline};
//!
//! let config = FolioConfig::from_env()?;
//! let db = Database::connect(&config.database_url).await?;
//! db.migrate().await?;
//!
//! let pipeline = OnboardingPipeline::from_config(db, &config)?;
//! let outcome = onboard_file(&pipeline, FileInput::new("report.pdf", "./report.pdf"), "thread-1").await?;
//! println!("document {}", outcome.document.id);
//! ```

pub mod analyzer;
pub mod extract;
pub mod limiter;
pub mod pipeline;
pub mod prompts;
pub mod router;
pub mod summarizer;

pub use analyzer::VisionAnalyzer;
pub use extract::PopplerExtractor;
pub use limiter::ConcurrencyLimiter;
pub use pipeline::{OnboardingOutcome, OnboardingPipeline, OnboardingStage};
pub use router::onboard_file;
pub use summarizer::{combine_page_analyses, Summarizer};
