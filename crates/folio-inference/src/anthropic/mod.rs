//! Anthropic Messages API backend.
//!
//! One backend serves both page analysis (text + image content blocks) and
//! document summaries (text only). Rate-limit, overload and server errors are
//! retried with exponential backoff.
//!
//! # Example
//!
//! ```rust,no_run
//! use folio_core::{GenerationBackend, InferenceSettings};
//! use folio_inference::anthropic::AnthropicBackend;
//!
//! #[tokio::main]
//! async fn main() {
//!     let settings = InferenceSettings::with_api_key("sk-ant-...");
//!     let backend = AnthropicBackend::from_settings(&settings).unwrap();
//!     let reply = backend.generate("Say hello").await.unwrap();
//!     println!("{}", reply);
//! }
//! ```

mod backend;
mod error;
mod types;

pub use backend::{AnthropicBackend, AnthropicConfig, DEFAULT_VISION_PROMPT};
pub use error::{to_folio_error, AnthropicErrorCode};
pub use types::*;
