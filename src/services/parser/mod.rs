//! File parsing services
//!
//! Text extraction from PDFs, one entry per non-blank page.

mod pdf;

pub use pdf::{join_pdf_pages, parse_pdf_pages, text_quality_score, PdfPageText};
