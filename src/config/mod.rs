mod types;

pub use types::*;

use anyhow::{Context, Result};
use std::path::Path;

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let config: Config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    validate_config(&config)?;

    Ok(config)
}

/// Load config from default locations or return default config
pub fn load_config_or_default(custom_path: Option<&Path>) -> Result<Config> {
    if let Some(path) = custom_path {
        return load_config(path);
    }

    let default_paths = ["./stickerforge.toml", "~/.config/stickerforge/config.toml"];

    for path_str in default_paths {
        let path = shellexpand::tilde(path_str);
        let path = Path::new(path.as_ref());
        if path.exists() {
            tracing::debug!("Using config file {:?}", path);
            return load_config(path);
        }
    }

    Ok(Config::default())
}

/// Validate configuration
fn validate_config(config: &Config) -> Result<()> {
    if config.workers.download == 0 || config.workers.transcode == 0 {
        anyhow::bail!("Worker counts must be at least 1");
    }

    if config.tools.timeout_secs == 0 {
        anyhow::bail!("tools.timeout_secs must be at least 1");
    }

    let limits = &config.limits;
    if !(limits.max_duration_secs > 0.0) {
        anyhow::bail!(
            "max_duration_secs must be positive, got {}",
            limits.max_duration_secs
        );
    }
    if limits.max_size_bytes == 0 {
        anyhow::bail!("max_size_bytes must be positive");
    }
    if !(limits.cap_growth > 1.0) {
        anyhow::bail!("cap_growth must be greater than 1.0, got {}", limits.cap_growth);
    }
    if limits.webm_framerate == 0 {
        anyhow::bail!("webm_framerate must be positive");
    }

    let download = &config.download;
    if download.max_attempts == 0 {
        anyhow::bail!("download.max_attempts must be at least 1");
    }
    if download.backoff_max_ms < download.backoff_base_ms {
        tracing::warn!(
            "download.backoff_max_ms ({}) is below backoff_base_ms ({}); every retry waits the maximum",
            download.backoff_max_ms,
            download.backoff_base_ms
        );
    }

    Ok(())
}
