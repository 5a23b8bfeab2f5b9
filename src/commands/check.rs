use std::path::Path;

use anyhow::{bail, Result};

use crate::services::{build_language_model, AppConfig, LanguageModel};
use crate::utils::count_pdf_files;

use super::load_config;

/// Problems that would stop ingest or answering; empty when all is well.
pub async fn validate_environment(config: &AppConfig, llm: &dyn LanguageModel) -> Vec<String> {
    let mut issues = Vec::new();

    let documents_dir = Path::new(&config.documents_dir);
    if !documents_dir.is_dir() {
        issues.push(format!("Documents directory missing: {}", config.documents_dir));
    } else if count_pdf_files(documents_dir) == 0 {
        issues.push(format!("No PDF files found in {}", config.documents_dir));
    }

    if !Path::new(&config.vector_config.lancedb_path).exists() {
        issues.push(format!(
            "Vector store not found at {}. Build it with: docqa ingest",
            config.vector_config.lancedb_path
        ));
    }

    if let Err(err) = llm.health_check().await {
        issues.push(format!("Language model {} not ready: {err}", llm.name()));
    }

    issues
}

pub async fn run(config_path: &Path) -> Result<()> {
    let config = load_config(config_path)?;
    let llm = build_language_model(&config.llm)?;

    let issues = validate_environment(&config, llm.as_ref()).await;
    if issues.is_empty() {
        println!("✓ Environment validated successfully");
        return Ok(());
    }

    println!("❌ Environment Issues:");
    for issue in &issues {
        println!("  - {issue}");
    }
    bail!("{} environment issue(s) found", issues.len());
}
