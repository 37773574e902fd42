//! The PDF onboarding orchestrator.
//!
//! One run moves through these stages inside a single store transaction:
//!
//! ```text
//! Created -> TextExtracted -> ImagesExtracted -> PagesPersisted
//!         -> ImagesPersisted -> Analyzed -> Summarized -> Committed
//! ```
//!
//! Any error before `Committed` rolls the transaction back, so a failed run
//! leaves no rows behind. Page analysis failures do not fail the run; they are
//! stored as error strings on the affected page.

use std::collections::BTreeMap;
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;

use futures::FutureExt;
use serde::Serialize;
use sqlx::{Sqlite, Transaction};
use tokio::task::JoinSet;
use tracing::{debug, error, info, info_span, warn, Instrument};
use uuid::Uuid;

use folio_core::{
    new_v7, Document, Error, FileInput, FileType, FolioConfig, GenerationBackend, PageAnalysis,
    PageExtractor, PageRaster, Result, VisionBackend,
};
use folio_db::Database;
use folio_inference::AnthropicBackend;

use crate::analyzer::{degraded, VisionAnalyzer};
use crate::extract::PopplerExtractor;
use crate::limiter::ConcurrencyLimiter;
use crate::summarizer::{combine_page_analyses, Summarizer};

/// Progress of one onboarding run.
///
/// Variants are ordered; a run only ever moves forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OnboardingStage {
    /// Document row inserted.
    Created,
    TextExtracted,
    ImagesExtracted,
    PagesPersisted,
    ImagesPersisted,
    Analyzed,
    Summarized,
    Committed,
}

impl OnboardingStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::TextExtracted => "text_extracted",
            Self::ImagesExtracted => "images_extracted",
            Self::PagesPersisted => "pages_persisted",
            Self::ImagesPersisted => "images_persisted",
            Self::Analyzed => "analyzed",
            Self::Summarized => "summarized",
            Self::Committed => "committed",
        }
    }
}

impl fmt::Display for OnboardingStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A committed onboarding run.
#[derive(Debug, Clone, Serialize)]
pub struct OnboardingOutcome {
    pub run_id: Uuid,
    pub document: Document,
    pub page_count: usize,
}

/// Sequences extraction, bounded page analysis, summary and persistence.
pub struct OnboardingPipeline {
    db: Database,
    extractor: Arc<dyn PageExtractor>,
    analyzer: VisionAnalyzer,
    summarizer: Summarizer,
    limiter: ConcurrencyLimiter,
}

impl OnboardingPipeline {
    pub fn new(
        db: Database,
        extractor: Arc<dyn PageExtractor>,
        vision: Arc<dyn VisionBackend>,
        generator: Arc<dyn GenerationBackend>,
        max_concurrency: usize,
    ) -> Result<Self> {
        Ok(Self {
            db,
            extractor,
            analyzer: VisionAnalyzer::new(vision),
            summarizer: Summarizer::new(generator),
            limiter: ConcurrencyLimiter::new(max_concurrency)?,
        })
    }

    /// Production wiring: poppler extraction and one Anthropic backend for
    /// both model roles.
    pub fn from_config(db: Database, config: &FolioConfig) -> Result<Self> {
        let backend = Arc::new(AnthropicBackend::from_settings(&config.inference)?);
        Self::new(
            db,
            Arc::new(PopplerExtractor::new()),
            backend.clone(),
            backend,
            config.max_concurrency,
        )
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    pub fn max_concurrency(&self) -> usize {
        self.limiter.max_concurrency()
    }

    /// Whether the extraction backend can run, checked before a batch starts.
    pub async fn extractor_ready(&self) -> Result<bool> {
        let ready = self.extractor.health_check().await?;
        if !ready {
            warn!(
                subsystem = "onboard",
                component = "pipeline",
                extractor = self.extractor.name(),
                "Extractor is not available"
            );
        }
        Ok(ready)
    }

    /// Onboard one PDF. Either everything is committed or nothing is.
    pub async fn onboard_pdf(&self, input: &FileInput, thread_id: &str) -> Result<OnboardingOutcome> {
        let run_id = new_v7();
        let span = info_span!(
            "onboard",
            run_id = %run_id,
            filename = %input.filename,
            thread_id
        );
        self.onboard_pdf_inner(run_id, input, thread_id)
            .instrument(span)
            .await
    }

    async fn onboard_pdf_inner(
        &self,
        run_id: Uuid,
        input: &FileInput,
        thread_id: &str,
    ) -> Result<OnboardingOutcome> {
        let start = Instant::now();
        info!(
            subsystem = "onboard",
            component = "pipeline",
            op = "onboard",
            "Onboarding PDF"
        );

        let mut tx = self.db.begin().await?;
        let mut stage = None;

        match self.run(&mut tx, input, thread_id, &mut stage).await {
            Ok((document, page_count)) => {
                if let Err(e) = tx.commit().await {
                    error!(
                        subsystem = "onboard",
                        component = "pipeline",
                        stage = stage_label(stage),
                        error = %e,
                        "Commit failed"
                    );
                    return Err(Error::Database(e));
                }
                info!(
                    subsystem = "onboard",
                    component = "pipeline",
                    document_id = document.id,
                    page_count,
                    stage = %OnboardingStage::Committed,
                    duration_ms = start.elapsed().as_millis() as u64,
                    "Onboarding committed"
                );
                Ok(OnboardingOutcome {
                    run_id,
                    document,
                    page_count,
                })
            }
            Err(e) => {
                if let Err(rollback_err) = tx.rollback().await {
                    warn!(error = %rollback_err, "Rollback failed");
                }
                error!(
                    subsystem = "onboard",
                    component = "pipeline",
                    stage = stage_label(stage),
                    error = %e,
                    duration_ms = start.elapsed().as_millis() as u64,
                    "Onboarding failed, rolled back"
                );
                Err(e)
            }
        }
    }

    async fn run(
        &self,
        tx: &mut Transaction<'static, Sqlite>,
        input: &FileInput,
        thread_id: &str,
        stage: &mut Option<OnboardingStage>,
    ) -> Result<(Document, usize)> {
        let repo = &self.db.documents;

        let mut document = repo
            .insert_document_tx(tx, &input.filename, thread_id, FileType::Pdf)
            .await?;
        advance(stage, OnboardingStage::Created, document.id);

        let page_texts = self.extractor.extract_text(&input.file_path).await?;
        advance(stage, OnboardingStage::TextExtracted, document.id);

        let rasters = self.extractor.rasterize(&input.file_path).await?;
        advance(stage, OnboardingStage::ImagesExtracted, document.id);

        if page_texts.len() != rasters.len() {
            return Err(Error::PageCountMismatch {
                text_pages: page_texts.len(),
                image_pages: rasters.len(),
            });
        }

        let pages = repo.insert_pages_tx(tx, document.id, &page_texts).await?;
        advance(stage, OnboardingStage::PagesPersisted, document.id);

        repo.insert_page_images_tx(tx, &pages, &rasters).await?;
        advance(stage, OnboardingStage::ImagesPersisted, document.id);

        let mut by_page = self.analyze_pages(rasters).await?;
        let mut analyses = Vec::with_capacity(pages.len());
        for page in &pages {
            let description = by_page.remove(&page.page_number).unwrap_or_default();
            repo.set_visual_analysis_tx(tx, page.id, &description)
                .await?;
            analyses.push(PageAnalysis {
                page_number: page.page_number,
                description,
            });
        }
        advance(stage, OnboardingStage::Analyzed, document.id);

        let summary = self
            .summarizer
            .summarize(&combine_page_analyses(&analyses))
            .await?;
        repo.set_description_tx(tx, document.id, &summary).await?;
        document.description = Some(summary);
        advance(stage, OnboardingStage::Summarized, document.id);

        Ok((document, pages.len()))
    }

    /// Analyze every page with at most `max_concurrency` calls in flight.
    ///
    /// Permits are taken in page order before each task is spawned, so pages
    /// are admitted in submission order. Results are keyed by page number.
    async fn analyze_pages(&self, rasters: Vec<PageRaster>) -> Result<BTreeMap<i64, String>> {
        let start = Instant::now();
        let page_count = rasters.len();
        let mut tasks = JoinSet::new();

        for (idx, raster) in rasters.into_iter().enumerate() {
            let page_number = idx as i64 + 1;
            let permit = self.limiter.acquire().await?;
            let analyzer = self.analyzer.clone();

            tasks.spawn(async move {
                let _permit = permit;
                AssertUnwindSafe(analyzer.analyze(page_number, &raster))
                    .catch_unwind()
                    .await
                    .unwrap_or_else(|_| {
                        warn!(page_number, "Visual analysis task panicked");
                        degraded(page_number, "analysis task panicked")
                    })
            });
        }

        let mut by_page = BTreeMap::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(analysis) => {
                    by_page.insert(analysis.page_number, analysis.description);
                }
                Err(e) => error!(error = %e, "Visual analysis task failed to join"),
            }
        }

        for page_number in 1..=page_count as i64 {
            by_page
                .entry(page_number)
                .or_insert_with(|| degraded(page_number, "analysis task did not complete").description);
        }

        debug!(
            subsystem = "onboard",
            component = "pipeline",
            op = "analyze",
            page_count,
            max_concurrency = self.limiter.max_concurrency(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Pages analyzed"
        );
        Ok(by_page)
    }
}

/// Label of the last stage reached, `"none"` before the document row exists.
fn stage_label(stage: Option<OnboardingStage>) -> &'static str {
    stage.map_or("none", |s| s.as_str())
}

fn advance(stage: &mut Option<OnboardingStage>, next: OnboardingStage, document_id: i64) {
    debug_assert!(*stage < Some(next), "stage moved backwards");
    *stage = Some(next);
    debug!(
        subsystem = "onboard",
        component = "pipeline",
        stage = %next,
        document_id,
        "Stage reached"
    );
}
