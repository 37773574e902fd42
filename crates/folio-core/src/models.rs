//! Domain models for onboarded documents, their pages and page images.

use std::path::{Path, PathBuf};

use base64::Engine;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

// =============================================================================
// INPUT
// =============================================================================

/// A local file submitted for onboarding.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FileInput {
    /// Declared display name; its extension selects the pipeline.
    pub filename: String,
    /// Location of the bytes on disk.
    pub file_path: PathBuf,
    /// Optional declared MIME type.
    #[serde(default)]
    pub content_type: Option<String>,
}

impl FileInput {
    pub fn new(filename: impl Into<String>, file_path: impl Into<PathBuf>) -> Self {
        Self {
            filename: filename.into(),
            file_path: file_path.into(),
            content_type: None,
        }
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Resolve the file type from the declared content type, then the filename extension.
    pub fn file_type(&self) -> FileType {
        if let Some(ct) = &self.content_type {
            if ct.eq_ignore_ascii_case(FileType::Pdf.mime_type()) {
                return FileType::Pdf;
            }
        }
        FileType::from_filename(&self.filename)
    }
}

/// Type tag stored on every document row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileType {
    Pdf,
    Unknown,
}

impl FileType {
    /// Map a filename to its file type by (case-insensitive) extension.
    pub fn from_filename(filename: &str) -> Self {
        let ext = Path::new(filename)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());
        match ext.as_deref() {
            Some("pdf") => FileType::Pdf,
            _ => FileType::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FileType::Pdf => "pdf",
            FileType::Unknown => "unknown",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            FileType::Pdf => "application/pdf",
            FileType::Unknown => "application/octet-stream",
        }
    }
}

impl std::fmt::Display for FileType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// RASTERS
// =============================================================================

/// One rendered page, as produced by a [`crate::PageExtractor`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRaster {
    pub mime_type: String,
    pub data: Vec<u8>,
}

impl PageRaster {
    pub fn new(mime_type: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            mime_type: mime_type.into(),
            data,
        }
    }

    pub fn jpeg(data: Vec<u8>) -> Self {
        Self::new("image/jpeg", data)
    }

    /// Base64 form stored in `page_images.image_data`.
    pub fn to_base64(&self) -> String {
        base64::engine::general_purpose::STANDARD.encode(&self.data)
    }
}

// =============================================================================
// PERSISTED ROWS
// =============================================================================

/// One ingested file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Document {
    pub id: i64,
    pub filename: String,
    pub thread_id: String,
    pub file_type: String,
    /// Set once the summary step completes.
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// One page of a [`Document`]. `page_number` is 1-based and dense.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Page {
    pub id: i64,
    pub document_id: i64,
    pub page_number: i64,
    pub ocr_text: Option<String>,
    pub visual_analysis: Option<String>,
    /// Structured table content; not written by the onboarding pipeline.
    pub grid_content: Option<Vec<Vec<String>>>,
    pub created_at: DateTime<Utc>,
}

/// Encoded raster of exactly one [`Page`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PageImage {
    pub id: i64,
    pub page_id: i64,
    pub mime_type: String,
    /// Base64-encoded image bytes.
    pub image_data: String,
    pub created_at: DateTime<Utc>,
}

impl PageImage {
    /// Decode the stored base64 payload back into raw image bytes.
    pub fn decode(&self) -> Result<Vec<u8>> {
        base64::engine::general_purpose::STANDARD
            .decode(&self.image_data)
            .map_err(|e| Error::Serialization(format!("Invalid page image data: {}", e)))
    }
}

/// Result of one page's visual analysis (or its degraded error string).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageAnalysis {
    pub page_number: i64,
    pub description: String,
}

// =============================================================================
// READ PATH
// =============================================================================

/// Document fields exposed by the read path.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DocumentHeader {
    pub id: i64,
    pub filename: String,
    pub file_type: String,
    pub description: Option<String>,
}

impl From<&Document> for DocumentHeader {
    fn from(doc: &Document) -> Self {
        Self {
            id: doc.id,
            filename: doc.filename.clone(),
            file_type: doc.file_type.clone(),
            description: doc.description.clone(),
        }
    }
}

/// Populated content of one page. Empty fields are omitted, never `null`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct PageContentFields {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visual_analysis: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PageContent {
    pub page_number: i64,
    pub content: PageContentFields,
}

impl From<&Page> for PageContent {
    fn from(page: &Page) -> Self {
        fn populated(value: &Option<String>) -> Option<String> {
            value.as_ref().filter(|v| !v.is_empty()).cloned()
        }

        Self {
            page_number: page.page_number,
            content: PageContentFields {
                text: populated(&page.ocr_text),
                visual_analysis: populated(&page.visual_analysis),
            },
        }
    }
}

/// A document with its pages in page-number order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DocumentContents {
    #[serde(rename = "file")]
    pub document: DocumentHeader,
    pub pages: Vec<PageContent>,
}

/// Outcome of reading a document back.
#[derive(Debug, Clone, PartialEq)]
pub enum DocumentReadout {
    NotFound(i64),
    NoPages { document: DocumentHeader },
    Found(DocumentContents),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(text: Option<&str>, visual: Option<&str>) -> Page {
        Page {
            id: 1,
            document_id: 1,
            page_number: 4,
            ocr_text: text.map(String::from),
            visual_analysis: visual.map(String::from),
            grid_content: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_file_type_from_filename() {
        assert_eq!(FileType::from_filename("report.pdf"), FileType::Pdf);
        assert_eq!(FileType::from_filename("REPORT.PDF"), FileType::Pdf);
        assert_eq!(FileType::from_filename("notes.txt"), FileType::Unknown);
        assert_eq!(FileType::from_filename("no_extension"), FileType::Unknown);
    }

    #[test]
    fn test_file_input_prefers_declared_pdf_content_type() {
        let input = FileInput::new("scan.bin", "/tmp/scan.bin").with_content_type("application/pdf");
        assert_eq!(input.file_type(), FileType::Pdf);

        let input = FileInput::new("scan.bin", "/tmp/scan.bin").with_content_type("image/png");
        assert_eq!(input.file_type(), FileType::Unknown);
    }

    #[test]
    fn test_page_raster_base64_round_trip() {
        let raster = PageRaster::jpeg(vec![0xFF, 0xD8, 0xFF, 0xE0]);
        let image = PageImage {
            id: 1,
            page_id: 1,
            mime_type: raster.mime_type.clone(),
            image_data: raster.to_base64(),
            created_at: Utc::now(),
        };
        assert_eq!(image.decode().unwrap(), raster.data);
    }

    #[test]
    fn test_page_image_decode_invalid() {
        let image = PageImage {
            id: 1,
            page_id: 1,
            mime_type: "image/jpeg".to_string(),
            image_data: "***not base64***".to_string(),
            created_at: Utc::now(),
        };
        assert!(matches!(image.decode(), Err(Error::Serialization(_))));
    }

    #[test]
    fn test_page_content_omits_absent_fields() {
        let content = PageContent::from(&page(Some("Intro"), None));
        let json = serde_json::to_value(&content).unwrap();
        assert_eq!(json["page_number"], 4);
        assert_eq!(json["content"]["text"], "Intro");
        assert!(json["content"].get("visual_analysis").is_none());
    }

    #[test]
    fn test_page_content_omits_empty_strings() {
        let content = PageContent::from(&page(Some(""), Some("A bar chart")));
        let json = serde_json::to_value(&content).unwrap();
        assert!(json["content"].get("text").is_none());
        assert_eq!(json["content"]["visual_analysis"], "A bar chart");
    }
}
