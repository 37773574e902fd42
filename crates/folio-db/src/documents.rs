//! Document, page and page-image repository.
//!
//! Write methods take an open transaction (`*_tx`) so the onboarding pipeline
//! can flush rows, use their ids, and commit once at the end. Read methods run
//! against the pool.

use chrono::Utc;
use sqlx::sqlite::SqliteRow;
use sqlx::types::Json;
use sqlx::{Row, Sqlite, SqlitePool, Transaction};
use tracing::{debug, trace};

use folio_core::{
    Document, DocumentContents, DocumentHeader, DocumentReadout, Error, FileType, Page,
    PageContent, PageImage, PageRaster, Result,
};

/// SQLite implementation of the document store.
#[derive(Clone)]
pub struct SqliteDocumentRepository {
    pool: SqlitePool,
}

impl SqliteDocumentRepository {
    /// Create a new SqliteDocumentRepository with the given connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    // =========================================================================
    // TRANSACTION-AWARE WRITES
    // =========================================================================

    /// Insert a document row and flush it, returning the row with its id.
    pub async fn insert_document_tx(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        filename: &str,
        thread_id: &str,
        file_type: FileType,
    ) -> Result<Document> {
        let now = Utc::now();
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO documents (filename, thread_id, file_type, description, created_at)
            VALUES ($1, $2, $3, NULL, $4)
            RETURNING id
            "#,
        )
        .bind(filename)
        .bind(thread_id)
        .bind(file_type.as_str())
        .bind(now)
        .fetch_one(&mut **tx)
        .await
        .map_err(Error::Database)?;

        debug!(
            subsystem = "db",
            component = "documents",
            op = "insert_document",
            document_id = id,
            thread_id,
            "Document flushed"
        );

        Ok(Document {
            id,
            filename: filename.to_string(),
            thread_id: thread_id.to_string(),
            file_type: file_type.as_str().to_string(),
            description: None,
            created_at: now,
        })
    }

    /// Insert one page per text entry, numbered from 1 in input order.
    pub async fn insert_pages_tx(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        document_id: i64,
        page_texts: &[String],
    ) -> Result<Vec<Page>> {
        let now = Utc::now();
        let mut pages = Vec::with_capacity(page_texts.len());

        for (idx, text) in page_texts.iter().enumerate() {
            let page_number = idx as i64 + 1;
            let id: i64 = sqlx::query_scalar(
                r#"
                INSERT INTO pages (document_id, page_number, ocr_text, created_at)
                VALUES ($1, $2, $3, $4)
                RETURNING id
                "#,
            )
            .bind(document_id)
            .bind(page_number)
            .bind(text)
            .bind(now)
            .fetch_one(&mut **tx)
            .await
            .map_err(Error::Database)?;

            trace!(document_id, page_number, page_id = id, "Page flushed");

            pages.push(Page {
                id,
                document_id,
                page_number,
                ocr_text: Some(text.clone()),
                visual_analysis: None,
                grid_content: None,
                created_at: now,
            });
        }

        debug!(
            subsystem = "db",
            component = "documents",
            op = "insert_pages",
            document_id,
            page_count = pages.len(),
            "Pages flushed"
        );
        Ok(pages)
    }

    /// Attach one raster to each page, pairing them by position.
    pub async fn insert_page_images_tx(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        pages: &[Page],
        rasters: &[PageRaster],
    ) -> Result<Vec<PageImage>> {
        if pages.len() != rasters.len() {
            return Err(Error::Internal(format!(
                "Cannot pair {} pages with {} page images",
                pages.len(),
                rasters.len()
            )));
        }

        let now = Utc::now();
        let mut images = Vec::with_capacity(pages.len());

        for (page, raster) in pages.iter().zip(rasters) {
            let image_data = raster.to_base64();
            let id: i64 = sqlx::query_scalar(
                r#"
                INSERT INTO page_images (page_id, mime_type, image_data, created_at)
                VALUES ($1, $2, $3, $4)
                RETURNING id
                "#,
            )
            .bind(page.id)
            .bind(&raster.mime_type)
            .bind(&image_data)
            .bind(now)
            .fetch_one(&mut **tx)
            .await
            .map_err(Error::Database)?;

            images.push(PageImage {
                id,
                page_id: page.id,
                mime_type: raster.mime_type.clone(),
                image_data,
                created_at: now,
            });
        }

        debug!(
            subsystem = "db",
            component = "documents",
            op = "insert_page_images",
            page_count = images.len(),
            "Page images flushed"
        );
        Ok(images)
    }

    /// Store the visual analysis of a page.
    pub async fn set_visual_analysis_tx(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        page_id: i64,
        visual_analysis: &str,
    ) -> Result<()> {
        let result = sqlx::query("UPDATE pages SET visual_analysis = $1 WHERE id = $2")
            .bind(visual_analysis)
            .bind(page_id)
            .execute(&mut **tx)
            .await
            .map_err(Error::Database)?;

        if result.rows_affected() == 0 {
            return Err(Error::NotFound(format!("Page {} not found", page_id)));
        }
        Ok(())
    }

    /// Store the document summary.
    pub async fn set_description_tx(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        document_id: i64,
        description: &str,
    ) -> Result<()> {
        let result = sqlx::query("UPDATE documents SET description = $1 WHERE id = $2")
            .bind(description)
            .bind(document_id)
            .execute(&mut **tx)
            .await
            .map_err(Error::Database)?;

        if result.rows_affected() == 0 {
            return Err(Error::NotFound(format!("Document {} not found", document_id)));
        }
        Ok(())
    }

    // =========================================================================
    // READS
    // =========================================================================

    /// Fetch one document.
    pub async fn get_document(&self, id: i64) -> Result<Option<Document>> {
        let row = sqlx::query(
            r#"
            SELECT id, filename, thread_id, file_type, description, created_at
            FROM documents
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(row.map(|r| document_from_row(&r)))
    }

    /// Documents onboarded under a thread, oldest first.
    pub async fn list_documents_for_thread(&self, thread_id: &str) -> Result<Vec<Document>> {
        let rows = sqlx::query(
            r#"
            SELECT id, filename, thread_id, file_type, description, created_at
            FROM documents
            WHERE thread_id = $1
            ORDER BY id
            "#,
        )
        .bind(thread_id)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(rows.iter().map(document_from_row).collect())
    }

    /// Pages of a document in page-number order.
    pub async fn list_pages(&self, document_id: i64) -> Result<Vec<Page>> {
        let rows = sqlx::query(
            r#"
            SELECT id, document_id, page_number, ocr_text, visual_analysis, grid_content, created_at
            FROM pages
            WHERE document_id = $1
            ORDER BY page_number
            "#,
        )
        .bind(document_id)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(rows
            .into_iter()
            .map(|r| Page {
                id: r.get("id"),
                document_id: r.get("document_id"),
                page_number: r.get("page_number"),
                ocr_text: r.get("ocr_text"),
                visual_analysis: r.get("visual_analysis"),
                grid_content: r
                    .get::<Option<Json<Vec<Vec<String>>>>, _>("grid_content")
                    .map(|grid| grid.0),
                created_at: r.get("created_at"),
            })
            .collect())
    }

    /// The stored raster of a page.
    pub async fn get_page_image(&self, page_id: i64) -> Result<Option<PageImage>> {
        let row = sqlx::query(
            r#"
            SELECT id, page_id, mime_type, image_data, created_at
            FROM page_images
            WHERE page_id = $1
            "#,
        )
        .bind(page_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(row.map(|r| PageImage {
            id: r.get("id"),
            page_id: r.get("page_id"),
            mime_type: r.get("mime_type"),
            image_data: r.get("image_data"),
            created_at: r.get("created_at"),
        }))
    }

    /// Read a document back with its populated page content.
    pub async fn read_document(&self, id: i64) -> Result<DocumentReadout> {
        let Some(document) = self.get_document(id).await? else {
            return Ok(DocumentReadout::NotFound(id));
        };

        let pages = self.list_pages(id).await?;
        let header = DocumentHeader::from(&document);
        if pages.is_empty() {
            return Ok(DocumentReadout::NoPages { document: header });
        }

        Ok(DocumentReadout::Found(DocumentContents {
            document: header,
            pages: pages.iter().map(PageContent::from).collect(),
        }))
    }

    /// Number of stored documents.
    pub async fn count_documents(&self) -> Result<i64> {
        sqlx::query_scalar("SELECT COUNT(*) FROM documents")
            .fetch_one(&self.pool)
            .await
            .map_err(Error::Database)
    }
}

fn document_from_row(r: &SqliteRow) -> Document {
    Document {
        id: r.get("id"),
        filename: r.get("filename"),
        thread_id: r.get("thread_id"),
        file_type: r.get("file_type"),
        description: r.get("description"),
        created_at: r.get("created_at"),
    }
}
