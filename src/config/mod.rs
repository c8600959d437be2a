// src/config/mod.rs
mod models;

pub use models::*;

use anyhow::{Context, Result};
use std::path::Path;
use tracing::warn;

/// Load configuration from a YAML or JSON file. A missing file is not an
/// error; the built-in defaults produce a runnable service.
pub async fn load_config<P: AsRef<Path>>(path: P) -> Result<Config> {
    let path = path.as_ref();

    if !path.exists() {
        warn!(path = %path.display(), "config file not found, using defaults");
        return Ok(Config::default());
    }

    let contents = tokio::fs::read_to_string(path)
        .await
        .context("Failed to read config file")?;

    let extension = path.extension().and_then(|s| s.to_str());
    let config: Config = if matches!(extension, Some("yaml") | Some("yml")) {
        serde_yaml::from_str(&contents).context("Failed to parse YAML config")?
    } else {
        serde_json::from_str(&contents).context("Failed to parse JSON config")?
    };

    config.validate()?;
    Ok(config)
}
