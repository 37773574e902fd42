//! Structured logging schema and field name constants for folio.
//!
//! All crates use these names for structured `tracing` fields so that log
//! aggregation can query a run end to end.
//!
//! ## Log Level Contract
//!
//! | Level | Usage |
//! |-------|-------|
//! | ERROR | Onboarding run failed and was rolled back |
//! | WARN  | Recoverable issue: degraded page analysis, retried model call |
//! | INFO  | Run lifecycle (start, commit), pool and migration setup |
//! | DEBUG | Stage transitions, intermediate counts, config choices |
//! | TRACE | Per-page iteration |

// ─── Identity fields ───────────────────────────────────────────────────────

/// Correlation ID of one onboarding run (UUIDv7).
pub const RUN_ID: &str = "run_id";

/// Subsystem originating the log event.
/// Values: "onboard", "db", "inference", "extract", "cli"
pub const SUBSYSTEM: &str = "subsystem";

/// Component within a subsystem.
/// Examples: "pipeline", "limiter", "anthropic", "poppler", "pool"
pub const COMPONENT: &str = "component";

/// Logical operation name.
/// Examples: "onboard", "analyze", "summarize", "rasterize"
pub const OPERATION: &str = "op";

// ─── Entity fields ─────────────────────────────────────────────────────────

/// Document row being built or read.
pub const DOCUMENT_ID: &str = "document_id";

/// Caller-supplied grouping key.
pub const THREAD_ID: &str = "thread_id";

/// 1-based page number.
pub const PAGE_NUMBER: &str = "page_number";

/// Pipeline stage reached.
pub const STAGE: &str = "stage";

// ─── Measurement fields ────────────────────────────────────────────────────

/// Wall-clock duration in milliseconds.
pub const DURATION_MS: &str = "duration_ms";

/// Number of pages in a document.
pub const PAGE_COUNT: &str = "page_count";

/// Byte length of a prompt.
pub const PROMPT_LEN: &str = "prompt_len";

/// Byte length of a model response.
pub const RESPONSE_LEN: &str = "response_len";

// ─── Inference fields ──────────────────────────────────────────────────────

/// Model name used for inference.
pub const MODEL: &str = "model";

/// Retry attempt number.
pub const ATTEMPT: &str = "attempt";

// ─── Outcome fields ────────────────────────────────────────────────────────

/// Error message when an operation fails.
pub const ERROR_MSG: &str = "error";
