//! Poppler-based PDF extraction: `pdfinfo`, `pdftotext` and `pdftoppm`.
//!
//! Every command runs as a child process under a timeout, so the async
//! scheduler never blocks on PDF parsing. Rendered page files are read on the
//! blocking pool.

use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tempfile::TempDir;
use tokio::process::Command;
use tracing::{debug, warn};

use folio_core::defaults::{
    EXTRACTION_CMD_TIMEOUT_SECS, RASTER_DPI, RASTER_JPEG_QUALITY, RASTER_TIMEOUT_MULTIPLIER,
};
use folio_core::{Error, PageExtractor, PageRaster, Result};

/// Page separator emitted by `pdftotext`.
const FORM_FEED: char = '\x0c';

/// Extraction adapter backed by poppler-utils.
#[derive(Debug, Clone)]
pub struct PopplerExtractor {
    pub cmd_timeout_secs: u64,
    pub dpi: u32,
    pub jpeg_quality: u8,
}

impl Default for PopplerExtractor {
    fn default() -> Self {
        Self {
            cmd_timeout_secs: EXTRACTION_CMD_TIMEOUT_SECS,
            dpi: RASTER_DPI,
            jpeg_quality: RASTER_JPEG_QUALITY,
        }
    }
}

impl PopplerExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Page count reported by `pdfinfo`, if it can be determined.
    async fn page_count(&self, path: &Path) -> Option<usize> {
        match run_cmd_with_timeout(Command::new("pdfinfo").arg(path), self.cmd_timeout_secs).await
        {
            Ok(stdout) => parse_pdfinfo_pages(&String::from_utf8_lossy(&stdout)),
            Err(e) => {
                warn!(
                    subsystem = "extract",
                    component = "poppler",
                    error = %e,
                    "pdfinfo failed, relying on pdftotext page breaks"
                );
                None
            }
        }
    }
}

/// Run a command with a timeout, returning stdout.
async fn run_cmd_with_timeout(cmd: &mut Command, timeout_secs: u64) -> Result<Vec<u8>> {
    cmd.kill_on_drop(true);
    let output = tokio::time::timeout(Duration::from_secs(timeout_secs), cmd.output())
        .await
        .map_err(|_| {
            Error::Extraction(format!("External command timed out after {}s", timeout_secs))
        })?
        .map_err(|e| Error::Extraction(format!("Failed to execute command: {}", e)))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(Error::Extraction(format!(
            "Command failed ({}): {}",
            output.status,
            stderr.trim()
        )));
    }

    Ok(output.stdout)
}

/// Check the `%PDF` magic bytes. Unreadable or non-PDF files are
/// [`Error::Input`].
pub async fn validate_pdf(path: &Path) -> Result<()> {
    let owned = path.to_path_buf();
    let header = tokio::task::spawn_blocking(move || -> std::io::Result<Vec<u8>> {
        let mut file = std::fs::File::open(&owned)?;
        let mut buf = Vec::with_capacity(4);
        file.by_ref().take(4).read_to_end(&mut buf)?;
        Ok(buf)
    })
    .await
    .map_err(|e| Error::Internal(format!("PDF header check panicked: {}", e)))?
    .map_err(|e| Error::Input(format!("Cannot read '{}': {}", path.display(), e)))?;

    if header.as_slice() != b"%PDF" {
        return Err(Error::Input(format!(
            "File '{}' is not a valid PDF (missing %PDF header)",
            path.display()
        )));
    }
    Ok(())
}

/// Parse the `Pages:` line of `pdfinfo` output.
pub fn parse_pdfinfo_pages(output: &str) -> Option<usize> {
    output.lines().find_map(|line| {
        let (key, value) = line.split_once(':')?;
        if key.trim() == "Pages" {
            value.trim().parse().ok()
        } else {
            None
        }
    })
}

/// Split `pdftotext` output into pages.
///
/// `pdftotext` terminates every page with a form feed, so the segment after
/// the last one is dropped when empty. With a known page count, missing
/// trailing pages are padded with empty text; surplus pages are an error.
pub fn split_pages(text: &str, expected: Option<usize>) -> Result<Vec<String>> {
    let mut pages: Vec<String> = text.split(FORM_FEED).map(str::to_string).collect();
    if pages.last().is_some_and(|last| last.is_empty()) {
        pages.pop();
    }

    if let Some(expected) = expected {
        if pages.len() > expected {
            return Err(Error::Extraction(format!(
                "pdftotext produced {} pages but pdfinfo reports {}",
                pages.len(),
                expected
            )));
        }
        pages.resize(expected, String::new());
    }
    Ok(pages)
}

/// Page number encoded in a `pdftoppm` output name such as `page-07.jpg`.
fn rendered_page_number(path: &Path) -> Option<u32> {
    let stem = path.file_stem()?.to_str()?;
    let (_, number) = stem.rsplit_once('-')?;
    number.parse().ok()
}

/// Read rendered JPEG pages from `dir`, ordered by page number.
///
/// Blocking; call from the blocking pool.
pub fn collect_rendered_pages(dir: &Path) -> Result<Vec<PageRaster>> {
    let mut numbered: Vec<(u32, PathBuf)> = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        let is_jpeg = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("jpg") || e.eq_ignore_ascii_case("jpeg"));
        if !is_jpeg {
            continue;
        }
        match rendered_page_number(&path) {
            Some(number) => numbered.push((number, path)),
            None => {
                return Err(Error::Extraction(format!(
                    "Unexpected rendered page file: {}",
                    path.display()
                )))
            }
        }
    }
    numbered.sort_by_key(|(number, _)| *number);

    numbered
        .into_iter()
        .map(|(_, path)| -> Result<PageRaster> { Ok(PageRaster::jpeg(std::fs::read(&path)?)) })
        .collect()
}

#[async_trait]
impl PageExtractor for PopplerExtractor {
    async fn extract_text(&self, path: &Path) -> Result<Vec<String>> {
        let start = Instant::now();

        let expected = self.page_count(path).await;
        let stdout = run_cmd_with_timeout(
            Command::new("pdftotext").arg("-layout").arg(path).arg("-"),
            self.cmd_timeout_secs,
        )
        .await?;
        let pages = split_pages(&String::from_utf8_lossy(&stdout), expected)?;

        debug!(
            subsystem = "extract",
            component = "poppler",
            op = "extract_text",
            page_count = pages.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Extracted page text"
        );
        Ok(pages)
    }

    async fn rasterize(&self, path: &Path) -> Result<Vec<PageRaster>> {
        let start = Instant::now();

        let img_dir = TempDir::new()
            .map_err(|e| Error::Internal(format!("Failed to create temp dir: {}", e)))?;
        let img_prefix = img_dir.path().join("page");

        run_cmd_with_timeout(
            Command::new("pdftoppm")
                .arg("-jpeg")
                .arg("-jpegopt")
                .arg(format!("quality={}", self.jpeg_quality))
                .arg("-r")
                .arg(self.dpi.to_string())
                .arg(path)
                .arg(&img_prefix),
            self.cmd_timeout_secs * RASTER_TIMEOUT_MULTIPLIER,
        )
        .await?;

        let rasters = tokio::task::spawn_blocking(move || {
            let rasters = collect_rendered_pages(img_dir.path());
            drop(img_dir);
            rasters
        })
        .await
        .map_err(|e| Error::Internal(format!("Page collection panicked: {}", e)))??;

        debug!(
            subsystem = "extract",
            component = "poppler",
            op = "rasterize",
            page_count = rasters.len(),
            dpi = self.dpi,
            duration_ms = start.elapsed().as_millis() as u64,
            "Rendered page images"
        );
        Ok(rasters)
    }

    async fn health_check(&self) -> Result<bool> {
        for tool in ["pdfinfo", "pdftotext", "pdftoppm"] {
            if Command::new(tool).arg("-v").output().await.is_err() {
                warn!(tool, "Poppler tool not available");
                return Ok(false);
            }
        }
        Ok(true)
    }

    fn name(&self) -> &str {
        "poppler"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_pages_drops_trailing_segment() {
        let pages = split_pages("one\x0ctwo\x0c", None).unwrap();
        assert_eq!(pages, vec!["one".to_string(), "two".to_string()]);
    }

    #[test]
    fn test_split_pages_keeps_blank_pages() {
        let pages = split_pages("one\x0c\x0cthree\x0c", None).unwrap();
        assert_eq!(pages.len(), 3);
        assert_eq!(pages[1], "");
    }

    #[test]
    fn test_split_pages_without_final_form_feed() {
        let pages = split_pages("only page", None).unwrap();
        assert_eq!(pages, vec!["only page".to_string()]);
    }

    #[test]
    fn test_split_pages_pads_to_expected() {
        let pages = split_pages("one\x0c", Some(3)).unwrap();
        assert_eq!(pages, vec!["one".to_string(), String::new(), String::new()]);
    }

    #[test]
    fn test_split_pages_surplus_is_error() {
        let err = split_pages("a\x0cb\x0cc\x0c", Some(2)).unwrap_err();
        assert!(matches!(err, Error::Extraction(_)));
    }

    #[test]
    fn test_parse_pdfinfo_pages() {
        let output = "Title:          Report\nProducer:       LaTeX\nPages:          12\nEncrypted:      no\n";
        assert_eq!(parse_pdfinfo_pages(output), Some(12));
        assert_eq!(parse_pdfinfo_pages("Title: x\n"), None);
    }

    #[test]
    fn test_collect_rendered_pages_numeric_order() {
        let dir = tempfile::tempdir().unwrap();
        for (name, body) in [
            ("page-10.jpg", "ten"),
            ("page-2.jpg", "two"),
            ("page-1.jpg", "one"),
            ("notes.txt", "ignored"),
        ] {
            std::fs::write(dir.path().join(name), body).unwrap();
        }

        let rasters = collect_rendered_pages(dir.path()).unwrap();
        let bodies: Vec<&[u8]> = rasters.iter().map(|r| r.data.as_slice()).collect();
        assert_eq!(bodies, vec![&b"one"[..], &b"two"[..], &b"ten"[..]]);
        assert!(rasters.iter().all(|r| r.mime_type == "image/jpeg"));
    }

    #[test]
    fn test_collect_rendered_pages_zero_padded_names() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("page-002.jpg"), "b").unwrap();
        std::fs::write(dir.path().join("page-001.jpg"), "a").unwrap();

        let rasters = collect_rendered_pages(dir.path()).unwrap();
        assert_eq!(rasters[0].data, b"a");
        assert_eq!(rasters[1].data, b"b");
    }

    #[tokio::test]
    async fn test_validate_pdf_rejects_non_pdf() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fake.pdf");
        std::fs::write(&path, b"hello world").unwrap();

        let err = validate_pdf(&path).await.unwrap_err();
        assert!(matches!(err, Error::Input(_)));
    }

    #[tokio::test]
    async fn test_validate_pdf_accepts_magic() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("real.pdf");
        std::fs::write(&path, b"%PDF-1.7\n...").unwrap();

        assert!(validate_pdf(&path).await.is_ok());
    }

    #[tokio::test]
    async fn test_validate_pdf_missing_file_is_input_error() {
        let err = validate_pdf(Path::new("/nonexistent/missing.pdf"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Input(_)));
    }
}
