//! `docqa` subcommands

mod ask;
mod check;
mod config;
mod ingest;
mod reset;
mod search;
mod serve;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use crate::services::{AppConfig, ConfigService, DEFAULT_CONFIG_FILE};

pub use check::validate_environment;

/// Ask questions about a folder of PDFs
#[derive(Parser, Debug)]
#[command(name = "docqa")]
#[command(version)]
#[command(about = "Document Q&A over local PDFs with retrieval-augmented generation", long_about = None)]
pub struct Cli {
    /// Configuration file (JSON); missing files fall back to defaults
    #[arg(long, global = true, env = "DOCQA_CONFIG", default_value = DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Chunk and embed every PDF in the documents directory
    Ingest(ingest::IngestArgs),

    /// Launch the web interface
    Serve(serve::ServeArgs),

    /// Answer one question from the terminal
    Ask(ask::AskArgs),

    /// Show the chunks most similar to a query
    Search(search::SearchArgs),

    /// Check documents directory, vector store and language model
    Check,

    /// Print the effective configuration or write a default file
    Config(config::ConfigArgs),

    /// Delete the vector store
    Reset(reset::ResetArgs),
}

pub async fn execute(cli: Cli) -> Result<()> {
    let config_path = cli.config;
    match cli.command {
        Commands::Ingest(args) => ingest::run(&config_path, args).await,
        Commands::Serve(args) => serve::run(&config_path, args).await,
        Commands::Ask(args) => ask::run(&config_path, args).await,
        Commands::Search(args) => search::run(&config_path, args).await,
        Commands::Check => check::run(&config_path).await,
        Commands::Config(args) => config::run(&config_path, args),
        Commands::Reset(args) => reset::run(&config_path, args),
    }
}

fn load_config(path: &Path) -> Result<AppConfig> {
    ConfigService::new(path)
        .resolve()
        .with_context(|| format!("failed to load configuration from {}", path.display()))
}

fn banner(title: &str) {
    println!("\n{}", "=".repeat(60));
    println!("{:=^60}", format!(" {title} "));
    println!("{}\n", "=".repeat(60));
}
