use std::path::Path;

use anyhow::Result;
use clap::Args;

use crate::services::{format_sources, AiServices};

use super::load_config;

#[derive(Args, Debug)]
pub struct AskArgs {
    /// The question to answer
    pub question: String,

    /// Print only the answer
    #[arg(long)]
    pub hide_sources: bool,
}

pub async fn run(config_path: &Path, args: AskArgs) -> Result<()> {
    let config = load_config(config_path)?;
    let services = AiServices::new(&config).await?;

    let answer = services.chain.answer(&args.question).await?;
    println!("{}", answer.answer);
    if !args.hide_sources {
        println!("\nSources:\n{}", format_sources(&answer.context));
    }
    if let Some(usage) = answer.usage {
        tracing::debug!(
            input_tokens = usage.input_tokens,
            output_tokens = usage.output_tokens,
            "token usage"
        );
    }
    Ok(())
}
