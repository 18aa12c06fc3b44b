use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid config {path}: {source}")]
    Config {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("clipboard unavailable: {0}")]
    Clipboard(String),

    #[error("audio playback failed: {0}")]
    Audio(String),
}

pub type Result<T> = std::result::Result<T, Error>;
