//! # folio-core
//!
//! Core types, traits, and abstractions for the folio onboarding pipeline.
//!
//! This crate provides the foundational data structures and trait definitions
//! that the other folio crates depend on:
//! - the shared [`Error`] type and [`Result`] alias
//! - document, page and page-image models
//! - the backend seams ([`GenerationBackend`], [`VisionBackend`], [`PageExtractor`])
//! - default constants, structured logging field names and environment config

pub mod config;
pub mod defaults;
pub mod error;
pub mod logging;
pub mod models;
pub mod traits;

// Re-export commonly used types at crate root
pub use config::{FolioConfig, InferenceSettings};
pub use error::{Error, Result};
pub use models::*;
pub use traits::*;

/// Generate a new time-ordered UUIDv7, used as the per-run correlation id.
pub fn new_v7() -> uuid::Uuid {
    uuid::Uuid::now_v7()
}
