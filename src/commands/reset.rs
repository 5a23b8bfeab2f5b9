use std::path::Path;

use anyhow::{bail, Result};
use clap::Args;

use crate::services::VectorStore;

use super::load_config;

#[derive(Args, Debug)]
pub struct ResetArgs {
    /// Confirm deletion
    #[arg(long)]
    pub yes: bool,
}

pub fn run(config_path: &Path, args: ResetArgs) -> Result<()> {
    let config = load_config(config_path)?;
    if !args.yes {
        bail!(
            "this deletes every indexed chunk in {}; re-run with --yes",
            config.vector_config.lancedb_path
        );
    }

    VectorStore::destroy(&config.vector_config)?;
    println!("Vector store {} deleted", config.vector_config.lancedb_path);
    Ok(())
}
