//! Backend trait definitions.
//!
//! These traits are the seams between the onboarding pipeline and its external
//! collaborators: the text generation model and the PDF extraction tooling.
//! Implementations live in `folio-inference` and `folio-onboard`; tests plug
//! in deterministic fakes.

use std::path::Path;

use async_trait::async_trait;

use crate::{PageRaster, Result};

// =============================================================================
// INFERENCE TRAITS
// =============================================================================

/// Backend for generating text with an LLM.
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    /// Generate a response to a prompt.
    async fn generate(&self, prompt: &str) -> Result<String>;

    /// Generate with a system prompt.
    async fn generate_with_system(&self, system: &str, prompt: &str) -> Result<String>;

    /// Get the model name.
    fn model_name(&self) -> &str;
}

/// Backend for describing images with a vision-capable model.
#[async_trait]
pub trait VisionBackend: Send + Sync {
    /// Describe an image. `prompt` overrides the backend's default instruction.
    async fn describe_image(
        &self,
        image_data: &[u8],
        mime_type: &str,
        prompt: Option<&str>,
    ) -> Result<String>;

    /// Check if the backend is reachable.
    async fn health_check(&self) -> Result<bool>;

    /// Get the model name.
    fn model_name(&self) -> &str;
}

// =============================================================================
// EXTRACTION TRAITS
// =============================================================================

/// Splits a paged document into per-page text and per-page rasters.
///
/// Both calls return one entry per physical page, in page order. Entry `i`
/// of either sequence describes page `i + 1`.
#[async_trait]
pub trait PageExtractor: Send + Sync {
    /// Extract the text layer of every page.
    async fn extract_text(&self, path: &Path) -> Result<Vec<String>>;

    /// Render every page to an encoded image.
    async fn rasterize(&self, path: &Path) -> Result<Vec<PageRaster>>;

    /// Check that the underlying tooling is available.
    async fn health_check(&self) -> Result<bool>;

    /// Get the extractor name.
    fn name(&self) -> &str;
}
