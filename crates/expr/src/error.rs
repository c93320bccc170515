use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExprError {
    /// The expression failed to compile; carries the offending source so the
    /// caller can report which user-supplied expression was rejected.
    #[error("failed to compile expression `{expression}`: {message}")]
    Compile { expression: String, message: String },

    /// Evaluation failed on a structurally valid expression (unknown
    /// function, wrong arity). These are surfaced per stream and the stream
    /// is simply not selected.
    #[error("evaluation error: {0}")]
    Eval(String),
}

impl ExprError {
    pub fn compile(expression: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Compile {
            expression: expression.into(),
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ExprError>;
