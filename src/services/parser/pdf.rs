//! PDF parsing utilities

use std::path::Path;

use pdf_oxide::converters::ConversionOptions;

use crate::error::{AppError, AppResult, ResultExt};

const MIN_PDF_TEXT_QUALITY_SCORE: f64 = 0.6;

#[derive(Debug, Clone, PartialEq)]
pub struct PdfPageText {
    pub page_number: usize,
    pub text: String,
}

fn markdown_options() -> ConversionOptions {
    ConversionOptions {
        include_images: false,
        ..ConversionOptions::default()
    }
}

pub fn join_pdf_pages(pages: &[PdfPageText]) -> String {
    let mut output = String::new();

    for page in pages {
        if page.text.trim().is_empty() {
            continue;
        }
        if !output.is_empty() {
            output.push_str("\n---\n\n");
        }
        output.push_str(page.text.trim_end());
        output.push('\n');
    }

    output
}

/// Heuristic in `0.0..=1.0`; garbled extraction (replacement or control
/// characters, symbol soup) scores low.
pub fn text_quality_score(text: &str) -> f64 {
    let mut total = 0usize;
    let mut printable = 0usize;
    let mut alnum = 0usize;
    let mut control = 0usize;
    let mut replacement = 0usize;

    for ch in text.chars() {
        if ch.is_whitespace() {
            continue;
        }
        total += 1;

        if ch == '\u{FFFD}' {
            replacement += 1;
            continue;
        }
        if ch.is_control() {
            control += 1;
            continue;
        }

        printable += 1;
        if ch.is_alphanumeric() {
            alnum += 1;
        }
    }

    if total == 0 {
        return 0.0;
    }

    let printable_ratio = printable as f64 / total as f64;
    let alnum_ratio = alnum as f64 / total as f64;
    let replacement_ratio = replacement as f64 / total as f64;
    let control_ratio = control as f64 / total as f64;

    let mut score = 0.6 * printable_ratio + 0.4 * alnum_ratio;
    score -= 0.7 * replacement_ratio;
    score -= 0.5 * control_ratio;
    score.clamp(0.0, 1.0)
}

/// Extract the text of every non-blank page.
pub fn parse_pdf_pages(path: &Path) -> AppResult<Vec<PdfPageText>> {
    let display = path.display().to_string();
    let path_str = path.to_string_lossy();
    let mut doc = pdf_oxide::PdfDocument::open(path_str.as_ref())
        .pdf_err(&format!("failed to open {display}"))?;
    let page_count = doc
        .page_count()
        .pdf_err(&format!("failed to read page count of {display}"))?;
    let options = markdown_options();
    let mut pages = Vec::new();

    for page_index in 0..page_count {
        let text = doc
            .to_markdown(page_index, &options)
            .pdf_err(&format!("failed to extract page {} of {display}", page_index + 1))?;
        if !text.trim().is_empty() {
            pages.push(PdfPageText {
                page_number: page_index + 1,
                text,
            });
        }
    }

    if pages.is_empty() {
        return Err(AppError::Pdf(format!("no extractable text in {display}")));
    }

    let score = text_quality_score(&join_pdf_pages(&pages));
    if score < MIN_PDF_TEXT_QUALITY_SCORE {
        return Err(AppError::Pdf(format!(
            "text quality too low ({score:.2}) in {display}; scanned documents need OCR"
        )));
    }

    tracing::debug!(path = %path.display(), pages = pages.len(), score, "PDF parsed");
    Ok(pages)
}
