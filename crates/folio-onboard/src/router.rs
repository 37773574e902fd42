//! File-type dispatch for onboarding.

use tracing::warn;

use folio_core::{Error, FileInput, FileType, Result};

use crate::extract::validate_pdf;
use crate::pipeline::{OnboardingOutcome, OnboardingPipeline};

/// Onboard a local file with the pipeline matching its type.
///
/// Fails with [`Error::Input`] if the file does not exist or a PDF lacks the
/// `%PDF` header, and with [`Error::UnsupportedFileType`] for anything but
/// PDF. None of these cases writes to the store.
pub async fn onboard_file(
    pipeline: &OnboardingPipeline,
    input: FileInput,
    thread_id: &str,
) -> Result<OnboardingOutcome> {
    let exists = tokio::fs::try_exists(&input.file_path)
        .await
        .unwrap_or(false);
    if !exists {
        return Err(Error::Input(format!(
            "File not found: {}",
            input.file_path.display()
        )));
    }

    match input.file_type() {
        FileType::Pdf => {
            validate_pdf(&input.file_path).await?;
            pipeline.onboard_pdf(&input, thread_id).await
        }
        other => {
            warn!(
                subsystem = "onboard",
                component = "router",
                filename = %input.filename,
                file_type = %other,
                "Unsupported file type"
            );
            Err(Error::UnsupportedFileType(other.to_string()))
        }
    }
}
