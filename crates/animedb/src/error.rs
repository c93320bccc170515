use thiserror::Error;

#[derive(Debug, Error)]
pub enum AnimeDbError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse {source_name} corpus: {message}")]
    Parse {
        source_name: &'static str,
        message: String,
    },

    /// The data directory cannot be created or written. This is the only
    /// startup error treated as fatal.
    #[error("data directory is not writable: {0}")]
    DataDir(String),
}

impl AnimeDbError {
    pub fn parse(source_name: &'static str, message: impl Into<String>) -> Self {
        Self::Parse {
            source_name,
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, AnimeDbError>;
