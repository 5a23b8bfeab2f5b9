//! HTTP interface: HTML form at `/`, JSON at `/api/ask`

mod handlers;
mod page;

use std::net::SocketAddr;

use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::app_state::AppState;
use crate::error::AppResult;

pub use handlers::{answer_question, AskRequest, AskResponse, HealthResponse, SOURCES_HIDDEN};
pub use page::{render_page, PageView, EXAMPLE_QUESTIONS};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index).post(handlers::ask_form))
        .route("/api/ask", post(handlers::ask_json))
        .route("/health", get(handlers::health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve until ctrl-c.
pub async fn serve(state: AppState, addr: SocketAddr) -> AppResult<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "web interface listening");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("web interface stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to install ctrl-c handler");
        std::future::pending::<()>().await;
    }
}
