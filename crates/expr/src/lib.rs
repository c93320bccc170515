//! User-authored stream expressions.
//!
//! Users filter and rank candidate streams with small boolean formulas over
//! stream fields and request context, e.g.
//! `resolution == '1080p' and cached`, `seadex() or 'HDR' in visualTags`.
//!
//! An expression is compiled once per request stage and evaluated against
//! every stream. Evaluation is deterministic and side-effect-free; unknown
//! fields read as `null` instead of failing, so a half-filled stream record
//! never breaks a whole stage.

mod error;
mod eval;
mod lexer;
mod parser;

pub use error::{ExprError, Result};

use serde_json::Value;

/// A compiled, reusable expression.
#[derive(Debug, Clone)]
pub struct Compiled {
    source: String,
    ast: parser::Expr,
}

impl Compiled {
    /// Compile an expression, retaining the source for error reporting.
    pub fn compile(source: &str) -> Result<Self> {
        let ast = parser::parse(source)?;
        Ok(Self {
            source: source.to_string(),
            ast,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Evaluate against one stream record plus the request context record.
    pub fn evaluate(&self, stream: &Value, context: &Value) -> Result<Value> {
        eval::evaluate(&self.ast, stream, context)
    }

    /// Evaluate as a predicate.
    pub fn matches(&self, stream: &Value, context: &Value) -> Result<bool> {
        Ok(eval::truthy(&self.evaluate(stream, context)?))
    }

    /// Indices of the streams this predicate selects.
    ///
    /// Per-stream evaluation errors are logged and the stream is skipped;
    /// one malformed record must not poison the stage.
    pub fn select(&self, streams: &[Value], context: &Value) -> Vec<usize> {
        streams
            .iter()
            .enumerate()
            .filter_map(|(index, stream)| match self.matches(stream, context) {
                Ok(true) => Some(index),
                Ok(false) => None,
                Err(e) => {
                    tracing::warn!(
                        "expression `{}` failed on stream {}: {}",
                        self.source,
                        index,
                        e
                    );
                    None
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn select_returns_matching_indices() {
        let streams = vec![
            json!({"parsedFile": {"resolution": "2160p"}}),
            json!({"parsedFile": {"resolution": "1080p"}}),
            json!({"parsedFile": {"resolution": "2160p"}}),
        ];
        let compiled = Compiled::compile("resolution == '2160p'").unwrap();
        assert_eq!(compiled.select(&streams, &json!({})), vec![0, 2]);
    }

    #[test]
    fn select_skips_streams_with_eval_errors() {
        let streams = vec![json!({}), json!({})];
        // `bogus()` is unknown: every stream errors, none are selected.
        let compiled = Compiled::compile("bogus()").unwrap();
        assert!(compiled.select(&streams, &json!({})).is_empty());
    }

    #[test]
    fn compile_error_reports_expression() {
        match Compiled::compile("cached and (") {
            Err(ExprError::Compile { expression, .. }) => {
                assert_eq!(expression, "cached and (");
            }
            other => panic!("expected compile error, got {other:?}"),
        }
    }

    #[test]
    fn evaluation_is_deterministic() {
        let stream = json!({"parsedFile": {"resolution": "1080p"}});
        let context = json!({"year": 2020});
        let compiled = Compiled::compile("resolution == '1080p' and year == 2020").unwrap();
        for _ in 0..3 {
            assert!(compiled.matches(&stream, &context).unwrap());
        }
    }
}
