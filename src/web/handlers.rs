use axum::extract::rejection::JsonRejection;
use axum::extract::{Form, Query, State};
use axum::response::Html;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::app_state::AppState;
use crate::error::{AppError, AppResult};
use crate::services::{format_sources, ChatUsage, RagChain, SearchResult};

use super::page::{render_page, PageView};

pub const SOURCES_HIDDEN: &str = "Sources hidden (enable 'Show source documents' to view)";

#[derive(Debug, Deserialize)]
pub struct IndexQuery {
    pub q: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AskForm {
    #[serde(default)]
    pub question: String,
    /// Present only when the checkbox is ticked
    pub show_sources: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AskRequest {
    pub question: String,
    #[serde(default = "default_show_sources")]
    pub show_sources: bool,
}

fn default_show_sources() -> bool {
    true
}

#[derive(Debug, Serialize)]
pub struct AskResponse {
    pub question: String,
    pub answer: String,
    pub sources: Vec<SearchResult>,
    pub usage: Option<ChatUsage>,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub chunks: usize,
    pub model: String,
}

/// Answer text and sources text for the form page. Errors become text.
pub async fn answer_question(chain: &RagChain, question: &str, show_sources: bool) -> (String, String) {
    if question.trim().is_empty() {
        return ("Please enter a question.".to_string(), String::new());
    }

    match chain.answer(question).await {
        Ok(result) => {
            let sources = if show_sources {
                format_sources(&result.context)
            } else {
                SOURCES_HIDDEN.to_string()
            };
            (result.answer, sources)
        }
        Err(err) => {
            tracing::warn!(error = %err, "question failed");
            (format!("Error: {err}"), String::new())
        }
    }
}

async fn chunk_count(state: &AppState) -> Option<usize> {
    match state.chain.store().count().await {
        Ok(count) => Some(count),
        Err(err) => {
            tracing::warn!(error = %err, "failed to count indexed chunks");
            None
        }
    }
}

pub async fn index(State(state): State<AppState>, Query(query): Query<IndexQuery>) -> Html<String> {
    let view = PageView {
        question: query.q.unwrap_or_default(),
        show_sources: true,
        chunks: chunk_count(&state).await,
        ..PageView::default()
    };
    Html(render_page(&state.info, &view))
}

pub async fn ask_form(State(state): State<AppState>, Form(form): Form<AskForm>) -> Html<String> {
    let show_sources = form.show_sources.is_some();
    let (answer, sources) = answer_question(&state.chain, &form.question, show_sources).await;
    let view = PageView {
        question: form.question,
        answer,
        sources,
        show_sources,
        chunks: chunk_count(&state).await,
    };
    Html(render_page(&state.info, &view))
}

pub async fn ask_json(
    State(state): State<AppState>,
    payload: Result<Json<AskRequest>, JsonRejection>,
) -> AppResult<Json<AskResponse>> {
    let Json(request) = payload.map_err(|rejection| AppError::Validation(rejection.body_text()))?;
    let result = state.chain.answer(&request.question).await?;
    let sources = if request.show_sources {
        result.context
    } else {
        Vec::new()
    };

    Ok(Json(AskResponse {
        question: result.question,
        answer: result.answer,
        sources,
        usage: result.usage,
    }))
}

pub async fn health(State(state): State<AppState>) -> AppResult<Json<HealthResponse>> {
    let chunks = state.chain.store().count().await?;
    Ok(Json(HealthResponse {
        status: "ok",
        chunks,
        model: state.info.model.clone(),
    }))
}
