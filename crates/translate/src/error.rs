use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while preparing a translator.
///
/// Translating a filter request never fails; malformed input degrades to an
/// empty or literal filter instead.
#[derive(Debug, Error)]
pub enum Error {
    #[error("failed reading settings at {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid settings: {0}")]
    Settings(#[from] toml::de::Error),
}

impl Error {
    #[inline]
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }
}
