use std::path::Path;

use anyhow::{bail, Result};
use clap::Args;

use crate::services::{AppConfig, ConfigService};

use super::load_config;

#[derive(Args, Debug)]
pub struct ConfigArgs {
    /// Write a configuration file holding the defaults. Path fields stay
    /// empty so they keep following `data_dir`
    #[arg(long)]
    pub init: bool,

    /// Allow --init to overwrite an existing file
    #[arg(long, requires = "init")]
    pub force: bool,
}

pub fn run(config_path: &Path, args: ConfigArgs) -> Result<()> {
    if args.init {
        let service = ConfigService::new(config_path);
        if service.config_path().exists() && !args.force {
            bail!(
                "{} already exists; pass --force to overwrite",
                config_path.display()
            );
        }
        service.save(&AppConfig::default())?;
        println!("Wrote default configuration to {}", config_path.display());
        return Ok(());
    }

    let config = load_config(config_path)?;
    println!("{}", serde_json::to_string_pretty(&redacted(&config))?);
    Ok(())
}

fn redacted(config: &AppConfig) -> AppConfig {
    let mut shown = config.clone();
    if let Some(key) = shown.llm.api_key.as_mut() {
        let visible: String = key.chars().take(4).collect();
        *key = format!("{visible}****");
    }
    shown
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;

    #[test]
    fn api_key_is_masked() {
        let mut config = AppConfig::default();
        config.llm.api_key = Some("AIzaSyExampleSecret".to_string());
        let shown = redacted(&config);
        assert_eq!(shown.llm.api_key.as_deref(), Some("AIza****"));
        assert_eq!(config.llm.api_key.as_deref(), Some("AIzaSyExampleSecret"));
    }

    #[test]
    fn init_refuses_to_overwrite_without_force() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("docqa.json");

        run(&path, ConfigArgs { init: true, force: false }).unwrap();
        let written = ConfigService::new(&path).load().unwrap();
        assert_eq!(written.vector_config.chunk_size, 1000);
        assert!(written.documents_dir.is_empty());
        assert!(written.vector_config.lancedb_path.is_empty());

        assert!(run(&path, ConfigArgs { init: true, force: false }).is_err());
        run(&path, ConfigArgs { init: true, force: true }).unwrap();
    }

    #[test]
    fn data_dir_still_moves_paths_after_init() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("docqa.json");
        run(&path, ConfigArgs { init: true, force: false }).unwrap();

        let mut config = ConfigService::new(&path).load().unwrap();
        config
            .apply_env_overrides(|key| (key == "DOCQA_DATA_DIR").then(|| "/srv/qa".to_string()))
            .unwrap();
        config.apply_defaults();

        assert_eq!(
            Path::new(&config.vector_config.lancedb_path),
            Path::new("/srv/qa").join("vectorstore")
        );
        assert_eq!(
            Path::new(&config.documents_dir),
            Path::new("/srv/qa").join("documents")
        );
    }
}
