//! Centralized default constants for folio.
//!
//! **This module is the single source of truth** for shared default values.
//! Crates reference these constants instead of defining their own magic
//! numbers. Organized by domain area.

// =============================================================================
// INFERENCE
// =============================================================================

/// Default Anthropic model for both page analysis and summaries.
pub const ANTHROPIC_MODEL: &str = "claude-sonnet-4-20250514";

/// Default Anthropic API endpoint.
pub const ANTHROPIC_URL: &str = "https://api.anthropic.com";

/// Anthropic API version header value.
pub const ANTHROPIC_API_VERSION: &str = "2023-06-01";

/// Retries for rate-limited or overloaded model calls.
pub const INFERENCE_MAX_RETRIES: u32 = 5;

/// Base delay for exponential retry backoff (milliseconds).
pub const INFERENCE_RETRY_BASE_MS: u64 = 500;

/// Upper bound for a single retry delay (milliseconds).
pub const INFERENCE_RETRY_MAX_MS: u64 = 30_000;

/// Request timeout for model calls (seconds).
pub const INFERENCE_TIMEOUT_SECS: u64 = 300;

/// Response token cap for model calls.
pub const INFERENCE_MAX_TOKENS: u32 = 4096;

/// Sampling temperature; zero keeps page descriptions reproducible.
pub const INFERENCE_TEMPERATURE: f32 = 0.0;

// =============================================================================
// ONBOARDING
// =============================================================================

/// Maximum concurrent page analysis calls.
pub const MAX_CONCURRENCY: usize = 20;

/// Leading page entries included in the summary prompt.
pub const SUMMARY_PAGE_CAP: usize = 39;

/// Prefix of the degraded visual-analysis string for a failed page.
pub const VISUAL_ANALYSIS_ERROR_PREFIX: &str = "Error during visual analysis: ";

// =============================================================================
// EXTRACTION
// =============================================================================

/// Rendering resolution for page images.
pub const RASTER_DPI: u32 = 150;

/// JPEG quality for page images.
pub const RASTER_JPEG_QUALITY: u8 = 85;

/// Per-command timeout for external extraction tools (seconds).
pub const EXTRACTION_CMD_TIMEOUT_SECS: u64 = 60;

/// Multiplier applied to the command timeout for page rendering.
pub const RASTER_TIMEOUT_MULTIPLIER: u64 = 3;

// =============================================================================
// DATABASE
// =============================================================================

/// Default store connection string.
pub const DATABASE_URL: &str = "sqlite://db.sqlite";

/// Default maximum number of pooled connections.
pub const DB_MAX_CONNECTIONS: u32 = 5;

/// How long a writer waits for the SQLite write lock (seconds).
pub const DB_BUSY_TIMEOUT_SECS: u64 = 30;

// =============================================================================
// ENVIRONMENT VARIABLES
// =============================================================================

pub const ENV_ANTHROPIC_API_KEY: &str = "ANTHROPIC_API_KEY";
pub const ENV_ANTHROPIC_MODEL: &str = "ANTHROPIC_MODEL";
pub const ENV_ANTHROPIC_BASE_URL: &str = "ANTHROPIC_BASE_URL";
pub const ENV_ANTHROPIC_MAX_RETRIES: &str = "ANTHROPIC_MAX_RETRIES";
pub const ENV_ANTHROPIC_TIMEOUT: &str = "ANTHROPIC_TIMEOUT";
pub const ENV_ANTHROPIC_MAX_TOKENS: &str = "ANTHROPIC_MAX_TOKENS";
pub const ENV_DATABASE_URL: &str = "DATABASE_URL";
pub const ENV_MAX_CONCURRENCY: &str = "MAX_CONCURRENCY";
