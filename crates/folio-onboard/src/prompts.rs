//! Fixed model instructions used by the onboarding pipeline.

/// Instruction sent with every page image.
pub const VISUAL_ANALYSIS_PROMPT: &str = "Analyze this page image.
Quote all prose on the page verbatim and in full, including titles, headings, paragraphs and columns.
Do not transcribe text that sits inside complex visual layouts such as tables, graphs, charts, diagrams, maps or photographs.
Instead give each of those figures a title and a detailed description, without reproducing all of its data.
Be concise but thorough.";

/// Placeholder replaced by the combined page analyses.
pub const DOCUMENT_CONTENT_PLACEHOLDER: &str = "{document_content}";

/// Instruction for the whole-document summary.
pub const DOCUMENT_SUMMARY_PROMPT: &str = "
Using the document content below, write about 10 bullet points summarizing its content and the key information it contains.

Content:
{document_content}

Respond with about 10 bullet points, each starting with \"- \", concise but informative:
";

/// Fill the summary prompt with the combined page content.
pub fn render_summary_prompt(document_content: &str) -> String {
    DOCUMENT_SUMMARY_PROMPT.replacen(DOCUMENT_CONTENT_PLACEHOLDER, document_content, 1)
}
