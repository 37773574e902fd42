//! # folio-inference
//!
//! Model backends for folio.
//!
//! - [`anthropic::AnthropicBackend`] implements both
//!   [`folio_core::GenerationBackend`] and [`folio_core::VisionBackend`]
//!   over the Anthropic Messages API.
//! - [`mock`] provides deterministic in-process backends for tests.

pub mod anthropic;
pub mod mock;

pub use anthropic::{AnthropicBackend, AnthropicConfig};
pub use mock::{MockCall, MockInferenceBackend};
