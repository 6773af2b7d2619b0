use std::path::PathBuf;

use thiserror::Error;

pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("io error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("invalid config: {0}")]
    TomlDeError(#[from] toml::de::Error),
    #[error("config not found at {}", path.display())]
    ConfigNotFound { path: PathBuf },
}
