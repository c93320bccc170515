use thiserror::Error;

#[derive(Debug, Error)]
pub enum MetadataError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("catalog API error ({status_code}): {message}")]
    Api { status_code: u16, message: String },
}

pub type Result<T> = std::result::Result<T, MetadataError>;
