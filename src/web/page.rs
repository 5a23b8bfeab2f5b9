use ammonia::clean_text;
use url::form_urlencoded;

use crate::app_state::SystemInfo;
use crate::utils::fill_placeholders;

const INDEX_TEMPLATE: &str = include_str!("../../assets/index.html");

pub const EXAMPLE_QUESTIONS: &[&str] = &[
    "What is this document about?",
    "Summarize the main points",
    "What are the key findings?",
    "Can you explain the methodology used?",
];

/// Everything the index page shows for one request
#[derive(Debug, Default)]
pub struct PageView {
    pub question: String,
    pub answer: String,
    pub sources: String,
    pub show_sources: bool,
    pub chunks: Option<usize>,
}

pub fn render_page(info: &SystemInfo, view: &PageView) -> String {
    let chunks = view
        .chunks
        .map(|count| count.to_string())
        .unwrap_or_else(|| "?".to_string());
    let examples = EXAMPLE_QUESTIONS
        .iter()
        .map(|question| {
            format!(
                "<a href=\"/?q={}\">{}</a>",
                encode_query_value(question),
                clean_text(question)
            )
        })
        .collect::<Vec<_>>()
        .join("\n    ");

    let question = clean_text(&view.question);
    let answer = clean_text(&view.answer);
    let sources = clean_text(&view.sources);
    let documents_dir = clean_text(&info.documents_dir);
    let model = clean_text(&info.model);
    let embedding_model = clean_text(&info.embedding_model);

    fill_placeholders(
        INDEX_TEMPLATE,
        &[
            ("question", question.as_str()),
            ("checked", if view.show_sources { "checked" } else { "" }),
            ("answer", answer.as_str()),
            ("sources", sources.as_str()),
            ("documents_dir", documents_dir.as_str()),
            ("model", model.as_str()),
            ("embedding_model", embedding_model.as_str()),
            ("vector_db", info.vector_db),
            ("chunks", chunks.as_str()),
            ("examples", examples.as_str()),
        ],
    )
}

fn encode_query_value(value: &str) -> String {
    form_urlencoded::byte_serialize(value.as_bytes()).collect()
}
