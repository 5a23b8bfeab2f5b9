//! Document loading: discover PDFs, extract page text, split into chunks

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::services::parser::{parse_pdf_pages, PdfPageText};
use crate::services::{Chunker, VectorConfig};
use crate::utils::{display_path, get_pdf_files};

/// A contiguous span of text from one page of one document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentChunk {
    /// Position in the whole ingest run, starting at 0
    pub chunk_id: i64,
    pub source: String,
    pub page_number: i32,
    /// Position within its page
    pub chunk_index: i32,
    pub text: String,
}

#[derive(Debug, Clone)]
pub struct ProcessedDocuments {
    pub chunks: Vec<DocumentChunk>,
    pub documents: usize,
    pub pages: usize,
}

pub struct DocumentProcessor {
    chunker: Chunker,
}

impl DocumentProcessor {
    pub fn new(config: &VectorConfig) -> AppResult<Self> {
        Ok(Self {
            chunker: Chunker::new(config)?,
        })
    }

    pub fn load_single_pdf(&self, path: &Path) -> AppResult<Vec<PdfPageText>> {
        let pages = parse_pdf_pages(path)?;
        tracing::info!(path = %path.display(), pages = pages.len(), "loaded PDF");
        Ok(pages)
    }

    /// Split pages into chunks, numbering them from `next_id`
    pub fn chunk_pages(
        &self,
        source: &str,
        pages: &[PdfPageText],
        next_id: &mut i64,
    ) -> Vec<DocumentChunk> {
        let mut chunks = Vec::new();
        for page in pages {
            for (idx, text) in self.chunker.split(&page.text).into_iter().enumerate() {
                chunks.push(DocumentChunk {
                    chunk_id: *next_id,
                    source: source.to_string(),
                    page_number: page.page_number as i32,
                    chunk_index: idx as i32,
                    text,
                });
                *next_id += 1;
            }
        }
        chunks
    }

    /// Load every PDF under `dir` and chunk it.
    ///
    /// Fails when the directory is missing, holds no PDFs, any PDF cannot be
    /// parsed, or nothing chunkable comes out.
    pub fn process_documents(&self, dir: &Path) -> AppResult<ProcessedDocuments> {
        let files = get_pdf_files(dir)?;
        if files.is_empty() {
            return Err(AppError::Validation(format!(
                "No PDF files found in {}",
                dir.display()
            )));
        }

        let mut chunks = Vec::new();
        let mut pages_total = 0usize;
        let mut next_id = 0i64;

        for path in &files {
            let pages = self.load_single_pdf(path)?;
            pages_total += pages.len();
            let source = display_path(path, dir);
            chunks.extend(self.chunk_pages(&source, &pages, &mut next_id));
        }

        if chunks.is_empty() {
            return Err(AppError::Validation(format!(
                "No text chunks produced from {}",
                dir.display()
            )));
        }

        tracing::info!(
            documents = files.len(),
            pages = pages_total,
            chunks = chunks.len(),
            "documents split into chunks"
        );

        Ok(ProcessedDocuments {
            chunks,
            documents: files.len(),
            pages: pages_total,
        })
    }
}
