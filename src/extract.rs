use std::path::Path;

use uuid::Uuid;

use crate::error::{AppError, AppResult};

/// The ordered page texts extracted from one source file. Immutable once
/// produced; everything downstream (chunking, indexing) keys off `id`.
#[derive(Debug, Clone)]
pub struct Document {
    pub id: Uuid,
    pub pages: Vec<String>,
}

impl Document {
    pub fn new(pages: Vec<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            pages,
        }
    }
}

/// Extract per-page text from a PDF on disk.
///
/// Fails with `Extraction` when the file cannot be parsed or when no page
/// yields any text (e.g. an image-only scan) so the pipeline never indexes
/// zero chunks from an unreadable document.
pub fn extract_pdf(path: &Path) -> AppResult<Document> {
    let doc = lopdf::Document::load(path)
        .map_err(|e| AppError::Extraction(format!("failed to read PDF: {e}")))?;

    let mut pages = Vec::new();
    for (page_number, _) in doc.get_pages() {
        let text = doc.extract_text(&[page_number]).unwrap_or_default();
        pages.push(text);
    }

    if pages.iter().all(|p| p.trim().is_empty()) {
        return Err(AppError::Extraction(
            "no extractable text found in document (is it an image-only scan?)".to_string(),
        ));
    }

    Ok(Document::new(pages))
}
