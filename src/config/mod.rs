mod types;

pub use types::*;

use anyhow::{Context, Result};
use std::path::Path;

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let mut config: Config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    expand_paths(&mut config);
    validate_config(&config)?;

    Ok(config)
}

/// Load config from default locations or return default config
pub fn load_config_or_default(custom_path: Option<&Path>) -> Result<Config> {
    if let Some(path) = custom_path {
        return load_config(path);
    }

    let default_paths = [
        "./clipforged.toml",
        "~/.config/clipforged/config.toml",
        "/etc/clipforged/config.toml",
    ];

    for path_str in default_paths {
        let path = shellexpand::tilde(path_str);
        let path = Path::new(path.as_ref());
        if path.exists() {
            tracing::debug!(path = %path.display(), "using config file");
            return load_config(path);
        }
    }

    Ok(Config::default())
}

fn expand_paths(config: &mut Config) {
    let work_dir = config.work_dir.to_string_lossy().to_string();
    config.work_dir = shellexpand::tilde(&work_dir).into_owned().into();

    for tool in [&mut config.tools.ffmpeg, &mut config.tools.ffprobe] {
        let expanded = shellexpand::tilde(tool.as_str()).into_owned();
        *tool = expanded;
    }
}

/// Validate configuration
pub fn validate_config(config: &Config) -> Result<()> {
    if config.tools.timeout_secs == 0 {
        anyhow::bail!("tools.timeout_secs must be greater than 0");
    }

    if config.tools.ffmpeg.trim().is_empty() {
        anyhow::bail!("tools.ffmpeg cannot be empty");
    }

    if config.tools.ffprobe.trim().is_empty() {
        anyhow::bail!("tools.ffprobe cannot be empty");
    }

    if config.work_dir.as_os_str().is_empty() {
        anyhow::bail!("work_dir cannot be empty");
    }

    if config.work_dir.exists() && !config.work_dir.is_dir() {
        anyhow::bail!("work_dir {:?} exists but is not a directory", config.work_dir);
    }

    Ok(())
}
