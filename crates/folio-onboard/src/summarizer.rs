//! Whole-document summary from the per-page analyses.

use std::sync::Arc;
use std::time::Instant;

use tracing::debug;

use folio_core::defaults::SUMMARY_PAGE_CAP;
use folio_core::{Error, GenerationBackend, PageAnalysis, Result};

use crate::prompts::render_summary_prompt;

/// Build the summary input from analyses in page order.
///
/// Each page contributes `"<Page {n}>:\n{analysis}\n\n"`; only the first
/// [`SUMMARY_PAGE_CAP`] entries are kept, joined with a newline.
pub fn combine_page_analyses(analyses: &[PageAnalysis]) -> String {
    analyses
        .iter()
        .take(SUMMARY_PAGE_CAP)
        .map(|a| format!("<Page {}>:\n{}\n\n", a.page_number, a.description))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Produces the document description with a text model.
#[derive(Clone)]
pub struct Summarizer {
    backend: Arc<dyn GenerationBackend>,
}

impl Summarizer {
    pub fn new(backend: Arc<dyn GenerationBackend>) -> Self {
        Self { backend }
    }

    /// Summarize combined page content. Any failure is a [`Error::Summary`].
    pub async fn summarize(&self, combined_content: &str) -> Result<String> {
        let start = Instant::now();
        let prompt = render_summary_prompt(combined_content);

        let summary = self
            .backend
            .generate(&prompt)
            .await
            .map_err(|e| Error::Summary(e.to_string()))?;

        let summary = summary.trim();
        if summary.is_empty() {
            return Err(Error::Summary("Model returned an empty summary".to_string()));
        }

        debug!(
            subsystem = "onboard",
            component = "summarizer",
            op = "summarize",
            model = self.backend.model_name(),
            prompt_len = prompt.len(),
            response_len = summary.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Document summary generated"
        );
        Ok(summary.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_inference::mock::MockInferenceBackend;

    fn analysis(page_number: i64, description: &str) -> PageAnalysis {
        PageAnalysis {
            page_number,
            description: description.to_string(),
        }
    }

    #[test]
    fn test_combine_format() {
        let combined = combine_page_analyses(&[analysis(1, "Title"), analysis(2, "Chart")]);
        assert_eq!(combined, "<Page 1>:\nTitle\n\n\n<Page 2>:\nChart\n\n");
    }

    #[test]
    fn test_combine_caps_entries() {
        let analyses: Vec<PageAnalysis> = (1..=45).map(|n| analysis(n, "x")).collect();
        let combined = combine_page_analyses(&analyses);
        assert!(combined.contains("<Page 39>:"));
        assert!(!combined.contains("<Page 40>:"));
        assert_eq!(combined.matches("<Page ").count(), SUMMARY_PAGE_CAP);
    }

    #[test]
    fn test_combine_empty() {
        assert_eq!(combine_page_analyses(&[]), "");
    }

    #[tokio::test]
    async fn test_summary_is_trimmed() {
        let backend = MockInferenceBackend::new().with_fixed_response("\n- One\n- Two\n");
        let summarizer = Summarizer::new(Arc::new(backend.clone()));

        let summary = summarizer.summarize("<Page 1>:\nx\n\n").await.unwrap();
        assert_eq!(summary, "- One\n- Two");
        assert!(backend.generate_prompts()[0].contains("<Page 1>:\nx\n\n"));
    }

    #[tokio::test]
    async fn test_failure_maps_to_summary_error() {
        let backend = MockInferenceBackend::new().with_generation_failure("quota");
        let summarizer = Summarizer::new(Arc::new(backend));

        let err = summarizer.summarize("content").await.unwrap_err();
        assert!(matches!(err, Error::Summary(_)));
        assert!(err.to_string().contains("quota"));
    }

    #[tokio::test]
    async fn test_blank_summary_is_error() {
        let backend = MockInferenceBackend::new().with_fixed_response("   ");
        let summarizer = Summarizer::new(Arc::new(backend));
        assert!(matches!(
            summarizer.summarize("content").await,
            Err(Error::Summary(_))
        ));
    }
}
