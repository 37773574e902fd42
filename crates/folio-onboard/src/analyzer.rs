//! Per-page visual analysis.

use std::sync::Arc;
use std::time::Instant;

use tracing::{trace, warn};

use folio_core::defaults::VISUAL_ANALYSIS_ERROR_PREFIX;
use folio_core::{PageAnalysis, PageRaster, VisionBackend};

use crate::prompts::VISUAL_ANALYSIS_PROMPT;

/// Describes one page image with a vision model.
///
/// Never fails: a model error becomes the page's description, prefixed with
/// `"Error during visual analysis: "`.
#[derive(Clone)]
pub struct VisionAnalyzer {
    backend: Arc<dyn VisionBackend>,
    prompt: Arc<str>,
}

impl VisionAnalyzer {
    pub fn new(backend: Arc<dyn VisionBackend>) -> Self {
        Self {
            backend,
            prompt: Arc::from(VISUAL_ANALYSIS_PROMPT),
        }
    }

    /// Analyze one page.
    pub async fn analyze(&self, page_number: i64, raster: &PageRaster) -> PageAnalysis {
        let start = Instant::now();
        let result = self
            .backend
            .describe_image(&raster.data, &raster.mime_type, Some(&*self.prompt))
            .await;

        match result {
            Ok(description) => {
                trace!(
                    page_number,
                    response_len = description.len(),
                    duration_ms = start.elapsed().as_millis() as u64,
                    "Page analyzed"
                );
                PageAnalysis {
                    page_number,
                    description,
                }
            }
            Err(e) => {
                warn!(
                    subsystem = "onboard",
                    component = "analyzer",
                    page_number,
                    error = %e,
                    "Visual analysis failed, storing error marker"
                );
                degraded(page_number, &e)
            }
        }
    }
}

/// The stored analysis of a page whose model call failed.
pub fn degraded(page_number: i64, reason: impl std::fmt::Display) -> PageAnalysis {
    PageAnalysis {
        page_number,
        description: format!("{}{}", VISUAL_ANALYSIS_ERROR_PREFIX, reason),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_inference::mock::{MockCall, MockInferenceBackend};

    #[tokio::test]
    async fn test_analyze_sends_fixed_prompt() {
        let backend = MockInferenceBackend::new();
        let analyzer = VisionAnalyzer::new(Arc::new(backend.clone()));

        let analysis = analyzer
            .analyze(3, &PageRaster::jpeg(b"page-3".to_vec()))
            .await;
        assert_eq!(analysis.page_number, 3);
        assert_eq!(analysis.description, "Description of page-3");

        match &backend.get_calls()[0] {
            MockCall::DescribeImage { prompt, .. } => {
                assert_eq!(prompt.as_deref(), Some(VISUAL_ANALYSIS_PROMPT))
            }
            other => panic!("unexpected call {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_failure_degrades_to_error_string() {
        let backend = MockInferenceBackend::new().with_image_failure(b"bad", "model down");
        let analyzer = VisionAnalyzer::new(Arc::new(backend));

        let analysis = analyzer.analyze(1, &PageRaster::jpeg(b"bad".to_vec())).await;
        assert_eq!(
            analysis.description,
            "Error during visual analysis: Inference error: model down"
        );
    }
}
