//! Retrieval chain: top-k search, prompt stuffing, single completion call

use std::sync::Arc;

use crate::error::{AppError, AppResult};
use crate::services::RetrievalConfig;
use crate::utils::fill_placeholders;

use super::embedding::{SearchResult, VectorStore};
use super::llm::LanguageModel;
use super::types::RagAnswer;

const SOURCE_PREVIEW_CHARS: usize = 150;

pub struct RagChain {
    store: Arc<VectorStore>,
    llm: Arc<dyn LanguageModel>,
    config: RetrievalConfig,
}

impl RagChain {
    pub fn new(store: Arc<VectorStore>, llm: Arc<dyn LanguageModel>, config: RetrievalConfig) -> Self {
        Self { store, llm, config }
    }

    pub fn store(&self) -> &Arc<VectorStore> {
        &self.store
    }

    pub fn model_name(&self) -> String {
        self.llm.name()
    }

    pub fn config(&self) -> &RetrievalConfig {
        &self.config
    }

    /// Top-k hits for `question`, minus any below the similarity threshold.
    pub async fn retrieve(&self, question: &str) -> AppResult<Vec<SearchResult>> {
        let mut hits = self.store.query(question, self.config.top_k).await?;
        if let Some(threshold) = self.config.similarity_threshold {
            let before = hits.len();
            hits.retain(|hit| hit.score >= threshold);
            if hits.len() < before {
                tracing::debug!(dropped = before - hits.len(), threshold, "hits below threshold");
            }
        }
        Ok(hits)
    }

    pub fn build_prompt(&self, question: &str, context: &[SearchResult]) -> String {
        let joined = context
            .iter()
            .map(|hit| hit.chunk_text.as_str())
            .collect::<Vec<_>>()
            .join("\n\n");
        fill_placeholders(
            &self.config.prompt_template,
            &[("context", joined.as_str()), ("question", question)],
        )
    }

    pub async fn answer(&self, question: &str) -> AppResult<RagAnswer> {
        let question = question.trim();
        if question.is_empty() {
            return Err(AppError::Validation("Please enter a question.".to_string()));
        }

        let context = self.retrieve(question).await?;
        let prompt = self.build_prompt(question, &context);
        tracing::info!(hits = context.len(), model = %self.llm.name(), "generating answer");

        let generation = self.llm.generate(&prompt).await?;
        let answer = generation.text.trim().to_string();
        if answer.is_empty() {
            return Err(AppError::AiService(format!(
                "{} returned an empty answer",
                self.llm.name()
            )));
        }

        Ok(RagAnswer {
            question: question.to_string(),
            answer,
            context,
            usage: generation.usage,
        })
    }
}

/// Human readable listing of retrieved chunks for the UI and CLI.
pub fn format_sources(context: &[SearchResult]) -> String {
    if context.is_empty() {
        return "No sources found.".to_string();
    }

    context
        .iter()
        .enumerate()
        .map(|(idx, hit)| {
            let preview: String = hit.chunk_text.chars().take(SOURCE_PREVIEW_CHARS).collect();
            format!(
                "[{}] File: {} | Page: {}\n    Content: {}...\n",
                idx + 1,
                hit.source,
                hit.page_number,
                preview
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;
    use crate::services::DEFAULT_PROMPT_TEMPLATE;
    use crate::test_support::{sample_chunks, temp_store, ScriptedModel};

    fn hit(source: &str, page: i32, text: &str) -> SearchResult {
        SearchResult {
            chunk_id: 0,
            source: source.to_string(),
            page_number: page,
            chunk_index: 0,
            chunk_text: text.to_string(),
            score: 0.9,
        }
    }

    async fn chain_with(
        dir: &std::path::Path,
        model: Arc<ScriptedModel>,
        config: RetrievalConfig,
    ) -> RagChain {
        let store = temp_store(dir).await;
        store.rebuild(&sample_chunks()).await.unwrap();
        RagChain::new(Arc::new(store), model, config)
    }

    #[tokio::test]
    async fn answer_stuffs_retrieved_chunks_into_prompt() {
        let dir = tempdir().unwrap();
        let model = Arc::new(ScriptedModel::reply("Every thirty seconds."));
        let chain = chain_with(dir.path(), model.clone(), RetrievalConfig::default()).await;

        let question = "Fog signals sound every thirty seconds during low visibility.";
        let answer = chain.answer(&format!("  {question} ")).await.unwrap();

        assert_eq!(answer.question, question);
        assert_eq!(answer.answer, "Every thirty seconds.");
        assert!(!answer.context.is_empty());
        assert!(answer.context.len() <= RetrievalConfig::default().top_k);
        assert!(answer.context[0].chunk_text.contains("thirty seconds"));

        let prompts = model.prompts();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains(&answer.context[0].chunk_text));
        assert!(prompts[0].contains(&format!("Question: {question}")));
    }

    #[tokio::test]
    async fn blank_question_skips_retrieval_and_generation() {
        let dir = tempdir().unwrap();
        let model = Arc::new(ScriptedModel::reply("unused"));
        let chain = chain_with(dir.path(), model.clone(), RetrievalConfig::default()).await;

        let err = chain.answer("   ").await.unwrap_err();
        assert!(matches!(err, AppError::Validation(msg) if msg == "Please enter a question."));
        assert!(model.prompts().is_empty());
    }

    #[tokio::test]
    async fn empty_model_output_is_an_error() {
        let dir = tempdir().unwrap();
        let model = Arc::new(ScriptedModel::reply("  \n"));
        let chain = chain_with(dir.path(), model, RetrievalConfig::default()).await;

        let err = chain.answer("lighthouse").await.unwrap_err();
        assert!(matches!(err, AppError::AiService(_)));
    }

    #[tokio::test]
    async fn model_failure_propagates() {
        let dir = tempdir().unwrap();
        let model = Arc::new(ScriptedModel::failing("connection refused"));
        let chain = chain_with(dir.path(), model, RetrievalConfig::default()).await;

        let err = chain.answer("lighthouse").await.unwrap_err();
        assert!(err.to_string().contains("connection refused"));
    }

    #[tokio::test]
    async fn threshold_filters_weak_hits() {
        let dir = tempdir().unwrap();
        let config = RetrievalConfig {
            similarity_threshold: Some(1.1),
            ..RetrievalConfig::default()
        };
        let chain = chain_with(dir.path(), Arc::new(ScriptedModel::reply("ok")), config).await;

        assert!(chain.retrieve("lighthouse").await.unwrap().is_empty());
        let answer = chain.answer("lighthouse").await.unwrap();
        assert!(answer.context.is_empty());
    }

    #[test]
    fn default_template_mentions_both_parts() {
        assert!(DEFAULT_PROMPT_TEMPLATE.contains("{context}"));
        assert!(DEFAULT_PROMPT_TEMPLATE.contains("{question}"));
    }

    #[test]
    fn format_sources_lists_numbered_previews() {
        let long = "x".repeat(400);
        let text = format_sources(&[hit("manual.pdf", 3, "Short page."), hit("b.pdf", 1, &long)]);

        assert!(text.starts_with("[1] File: manual.pdf | Page: 3\n    Content: Short page....\n"));
        assert!(text.contains(&format!("[2] File: b.pdf | Page: 1\n    Content: {}...", "x".repeat(150))));
        assert!(!text.contains(&"x".repeat(151)));
        assert_eq!(format_sources(&[]), "No sources found.");
    }
}
