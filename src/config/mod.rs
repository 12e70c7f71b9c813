mod types;

pub use types::*;

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

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
        "./config.toml",
        "./dashreel.toml",
        "~/.config/dashreel/config.toml",
        "/etc/dashreel/config.toml",
    ];

    for path_str in default_paths {
        let path = shellexpand::tilde(path_str);
        let path = Path::new(path.as_ref());
        if path.exists() {
            return load_config(path);
        }
    }

    Ok(Config::default())
}

fn expand_paths(config: &mut Config) {
    let expand = |p: &Path| -> PathBuf {
        PathBuf::from(shellexpand::tilde(&p.to_string_lossy()).into_owned())
    };

    config.archive.log_root = expand(&config.archive.log_root);
    config.params.dir = expand(&config.params.dir);
    config.transcoder.ffmpeg_path = config.transcoder.ffmpeg_path.as_deref().map(expand);
    config.server.static_dir = config.server.static_dir.as_deref().map(expand);
}

/// Validate configuration
pub fn validate_config(config: &Config) -> Result<()> {
    if config.server.port == 0 {
        anyhow::bail!("Server port cannot be 0");
    }

    if !config.archive.log_root.is_absolute() {
        anyhow::bail!(
            "Archive log_root must be an absolute path: {:?}",
            config.archive.log_root
        );
    }
    if !config.archive.log_root.exists() {
        tracing::warn!("Archive log_root does not exist: {:?}", config.archive.log_root);
    }

    let streaming = &config.streaming;
    if streaming.min_chunk_size == 0 {
        anyhow::bail!("streaming.min_chunk_size must be at least 1");
    }
    if streaming.min_chunk_size > streaming.max_chunk_size {
        anyhow::bail!(
            "streaming.min_chunk_size ({}) exceeds max_chunk_size ({})",
            streaming.min_chunk_size,
            streaming.max_chunk_size
        );
    }
    if !(streaming.min_chunk_size..=streaming.max_chunk_size)
        .contains(&streaming.default_chunk_size)
    {
        anyhow::bail!(
            "streaming.default_chunk_size ({}) is outside [{}, {}]",
            streaming.default_chunk_size,
            streaming.min_chunk_size,
            streaming.max_chunk_size
        );
    }

    if config.transcoder.frame_rate == 0 {
        anyhow::bail!("transcoder.frame_rate cannot be 0");
    }

    if config.params.lock_key.is_empty()
        || config.params.lock_key.contains(['/', '\\'])
        || config.params.lock_key.starts_with('.')
    {
        anyhow::bail!("Invalid params.lock_key: {:?}", config.params.lock_key);
    }

    Ok(())
}
