use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Expression(#[from] expr::ExprError),

    #[error("cache error: {0}")]
    Cache(#[from] cache::CacheError),
}

pub type Result<T> = std::result::Result<T, PipelineError>;
