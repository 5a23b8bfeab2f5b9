use std::path::Path;

use anyhow::{Context, Result};
use clap::Args;

use crate::app_state::AppState;
use crate::services::AiServices;
use crate::web;

use super::load_config;

#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Interface to bind (overrides configuration)
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind (overrides configuration)
    #[arg(long)]
    pub port: Option<u16>,
}

pub async fn run(config_path: &Path, args: ServeArgs) -> Result<()> {
    let mut config = load_config(config_path)?;
    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }

    println!("Initializing RAG system...");
    let services = AiServices::new(&config)
        .await
        .context("failed to load the RAG system; make sure you've run `docqa ingest`")?;
    if let Err(err) = services.llm.health_check().await {
        tracing::warn!(error = %err, "language model not ready; answers will fail until it is");
    }
    println!("✓ RAG system ready!");

    let bind = config.server.bind_address();
    let addr = tokio::net::lookup_host(&bind)
        .await
        .with_context(|| format!("invalid bind address {bind}"))?
        .next()
        .with_context(|| format!("bind address {bind} did not resolve"))?;
    println!("Open http://{addr} in your browser");

    web::serve(AppState::new(&services, &config), addr).await?;
    Ok(())
}
