use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::error::{AppError, AppResult};

pub fn get_extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|s| s.to_lowercase())
}

pub fn is_pdf(path: &Path) -> bool {
    get_extension(path).as_deref() == Some("pdf")
}

/// All PDF files under `dir` (recursive), sorted by path
pub fn get_pdf_files(dir: &Path) -> AppResult<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(AppError::NotFound {
            entity: "documents directory",
            detail: dir.display().to_string(),
        });
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(dir).follow_links(true) {
        let entry = entry.map_err(|e| {
            AppError::Io(std::io::Error::new(
                std::io::ErrorKind::Other,
                format!("walk {} failed: {}", dir.display(), e),
            ))
        })?;
        if entry.file_type().is_file() && is_pdf(entry.path()) {
            files.push(entry.into_path());
        }
    }
    files.sort();
    Ok(files)
}

pub fn count_pdf_files(dir: &Path) -> usize {
    get_pdf_files(dir).map(|files| files.len()).unwrap_or(0)
}

/// Path shown to users: relative to `base` when possible
pub fn display_path(path: &Path, base: &Path) -> String {
    path.strip_prefix(base)
        .unwrap_or(path)
        .to_string_lossy()
        .to_string()
}
