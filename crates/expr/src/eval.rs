//! Expression evaluation over JSON stream/context records.

use serde_json::Value;

use crate::error::{ExprError, Result};
use crate::parser::{CmpOp, Expr};

/// Bare names that are shorthand for a path into the stream record. Looked
/// up only after the context record, so context fields always win.
fn stream_shortcut(name: &str) -> Option<&'static [&'static str]> {
    let path: &[&str] = match name {
        "resolution" => &["parsedFile", "resolution"],
        "quality" => &["parsedFile", "quality"],
        "encode" => &["parsedFile", "encode"],
        "releaseGroup" => &["parsedFile", "releaseGroup"],
        "visualTags" => &["parsedFile", "visualTags"],
        "audioTags" => &["parsedFile", "audioTags"],
        "audioChannels" => &["parsedFile", "audioChannels"],
        "languages" => &["parsedFile", "languages"],
        "cached" => &["service", "cached"],
        "service" => &["service", "id"],
        "seeders" => &["torrent", "seeders"],
        "infoHash" => &["torrent", "infoHash"],
        "streamType" => &["type"],
        "filename" | "folderName" | "indexer" | "size" | "folderSize" | "age" | "type"
        | "library" | "proxied" | "private" | "message" => return Some(shortcut_top(name)),
        _ => return None,
    };
    Some(path)
}

fn shortcut_top(name: &str) -> &'static [&'static str] {
    match name {
        "filename" => &["filename"],
        "folderName" => &["folderName"],
        "indexer" => &["indexer"],
        "size" => &["size"],
        "folderSize" => &["folderSize"],
        "age" => &["age"],
        "type" => &["type"],
        "library" => &["library"],
        "proxied" => &["proxied"],
        "private" => &["private"],
        "message" => &["message"],
        _ => unreachable!(),
    }
}

fn walk<'a>(value: &'a Value, path: &[impl AsRef<str>]) -> Value {
    let mut current = value;
    for segment in path {
        match current.get(segment.as_ref()) {
            Some(next) => current = next,
            None => return Value::Null,
        }
    }
    current.clone()
}

/// Resolve an identifier path against the stream and context records.
///
/// `stream.x.y` walks into the stream record. A bare name resolves against
/// the context first, then against the stream shortcut table; unknown names
/// are `null`, never an error.
fn resolve(path: &[String], stream: &Value, context: &Value) -> Value {
    if path[0] == "stream" {
        return walk(stream, &path[1..]);
    }
    if path.len() == 1 {
        if let Some(found) = context.get(&path[0]) {
            return found.clone();
        }
        if let Some(shortcut) = stream_shortcut(&path[0]) {
            return walk(stream, shortcut);
        }
        return Value::Null;
    }
    // Dotted non-stream path: context object first, then the stream record.
    let from_context = walk(context, path);
    if !from_context.is_null() {
        return from_context;
    }
    walk(stream, path)
}

pub fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(false),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

pub fn evaluate(expr: &Expr, stream: &Value, context: &Value) -> Result<Value> {
    match expr {
        Expr::Str(s) => Ok(Value::String(s.clone())),
        Expr::Num(n) => Ok(serde_json::json!(n)),
        Expr::Bool(b) => Ok(Value::Bool(*b)),
        Expr::Null => Ok(Value::Null),
        Expr::List(items) => {
            let values = items
                .iter()
                .map(|item| evaluate(item, stream, context))
                .collect::<Result<Vec<_>>>()?;
            Ok(Value::Array(values))
        }
        Expr::Field(path) => Ok(resolve(path, stream, context)),
        Expr::Not(inner) => {
            let value = evaluate(inner, stream, context)?;
            Ok(Value::Bool(!truthy(&value)))
        }
        Expr::And(left, right) => {
            let left = evaluate(left, stream, context)?;
            if !truthy(&left) {
                return Ok(Value::Bool(false));
            }
            let right = evaluate(right, stream, context)?;
            Ok(Value::Bool(truthy(&right)))
        }
        Expr::Or(left, right) => {
            let left = evaluate(left, stream, context)?;
            if truthy(&left) {
                return Ok(Value::Bool(true));
            }
            let right = evaluate(right, stream, context)?;
            Ok(Value::Bool(truthy(&right)))
        }
        Expr::Cmp(op, left, right) => {
            let left = evaluate(left, stream, context)?;
            let right = evaluate(right, stream, context)?;
            Ok(Value::Bool(compare(*op, &left, &right)))
        }
        Expr::In(needle, haystack) => {
            let needle = evaluate(needle, stream, context)?;
            let haystack = evaluate(haystack, stream, context)?;
            Ok(Value::Bool(contains(&haystack, &needle)))
        }
        Expr::Call(name, args) => call(name, args, stream, context),
    }
}

fn compare(op: CmpOp, left: &Value, right: &Value) -> bool {
    match op {
        CmpOp::Eq => loose_eq(left, right),
        CmpOp::NotEq => !loose_eq(left, right),
        CmpOp::Lt | CmpOp::Le | CmpOp::Gt | CmpOp::Ge => {
            let ordering = match (left, right) {
                (Value::Number(a), Value::Number(b)) => match (a.as_f64(), b.as_f64()) {
                    (Some(a), Some(b)) => a.partial_cmp(&b),
                    _ => None,
                },
                (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
                _ => None,
            };
            match ordering {
                Some(ordering) => match op {
                    CmpOp::Lt => ordering.is_lt(),
                    CmpOp::Le => ordering.is_le(),
                    CmpOp::Gt => ordering.is_gt(),
                    CmpOp::Ge => ordering.is_ge(),
                    _ => unreachable!(),
                },
                // Ordered comparison against null/mismatched types is false,
                // never an error; absent fields must not select streams.
                None => false,
            }
        }
    }
}

/// Equality with number coercion (`1080 == 1080.0`); everything else is
/// strict structural equality.
fn loose_eq(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => match (a.as_f64(), b.as_f64()) {
            (Some(a), Some(b)) => a == b,
            _ => a == b,
        },
        _ => left == right,
    }
}

fn contains(haystack: &Value, needle: &Value) -> bool {
    match haystack {
        Value::Array(items) => items.iter().any(|item| loose_eq(item, needle)),
        Value::String(s) => match needle {
            Value::String(sub) => s.to_lowercase().contains(&sub.to_lowercase()),
            _ => false,
        },
        _ => false,
    }
}

fn call(name: &str, args: &[Expr], stream: &Value, context: &Value) -> Result<Value> {
    match name {
        "exists" => {
            expect_arity(name, args, 1)?;
            let value = evaluate(&args[0], stream, context)?;
            Ok(Value::Bool(!value.is_null()))
        }
        "istrue" => {
            expect_arity(name, args, 1)?;
            let value = evaluate(&args[0], stream, context)?;
            Ok(Value::Bool(value == Value::Bool(true)))
        }
        "isfalse" => {
            expect_arity(name, args, 1)?;
            let value = evaluate(&args[0], stream, context)?;
            Ok(Value::Bool(value == Value::Bool(false)))
        }
        "contains" => {
            expect_arity(name, args, 2)?;
            let haystack = evaluate(&args[0], stream, context)?;
            let needle = evaluate(&args[1], stream, context)?;
            Ok(Value::Bool(contains(&haystack, &needle)))
        }
        "seadex" => {
            expect_arity(name, args, 0)?;
            let tagged = walk(stream, &["seadex", "isSeadex"]);
            Ok(Value::Bool(truthy(&tagged)))
        }
        other => Err(ExprError::Eval(format!("unknown function `{other}`"))),
    }
}

fn expect_arity(name: &str, args: &[Expr], arity: usize) -> Result<()> {
    if args.len() == arity {
        Ok(())
    } else {
        Err(ExprError::Eval(format!(
            "`{name}` takes {arity} argument(s), got {}",
            args.len()
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;
    use serde_json::json;

    fn stream() -> Value {
        json!({
            "id": "s1",
            "filename": "Show.S01E01.1080p.WEB.mkv",
            "type": "debrid",
            "size": 2147483648u64,
            "library": false,
            "parsedFile": {
                "resolution": "1080p",
                "quality": "WEB-DL",
                "visualTags": ["HDR"],
                "languages": ["English", "Japanese"],
                "releaseGroup": "SubsPlease"
            },
            "torrent": { "infoHash": "aaaa", "seeders": 42 },
            "service": { "id": "realdebrid", "cached": true },
            "seadex": { "isBest": true, "isSeadex": true }
        })
    }

    fn context() -> Value {
        json!({
            "type": "series",
            "queryType": "anime.series",
            "isAnime": true,
            "title": "Sousou no Frieren",
            "year": 2023,
            "season": 1,
            "episode": 1,
            "genres": ["Adventure", "Fantasy"]
        })
    }

    fn eval_bool(src: &str) -> bool {
        let expr = parse(src).unwrap();
        truthy(&evaluate(&expr, &stream(), &context()).unwrap())
    }

    #[test]
    fn shortcut_fields_resolve_into_stream() {
        assert!(eval_bool("resolution == '1080p'"));
        assert!(eval_bool("cached"));
        assert!(eval_bool("seeders > 10"));
        assert!(eval_bool("releaseGroup == 'SubsPlease'"));
    }

    #[test]
    fn context_fields_resolve_by_bare_name() {
        assert!(eval_bool("year >= 2023"));
        assert!(eval_bool("isAnime"));
        assert!(eval_bool("queryType == 'anime.series'"));
    }

    #[test]
    fn context_wins_over_stream_shortcut() {
        // `type` exists in both records; the context value is used.
        assert!(eval_bool("type == 'series'"));
    }

    #[test]
    fn explicit_stream_prefix_bypasses_context() {
        assert!(eval_bool("stream.type == 'debrid'"));
    }

    #[test]
    fn list_membership_and_substring() {
        assert!(eval_bool("'Fantasy' in genres"));
        assert!(eval_bool("'English' in languages"));
        assert!(eval_bool("'WEB' in filename"));
        assert!(!eval_bool("'CAM' in filename"));
    }

    #[test]
    fn substring_match_is_case_insensitive() {
        assert!(eval_bool("'web' in filename"));
        assert!(eval_bool("contains(filename, '1080P')"));
    }

    #[test]
    fn functions() {
        assert!(eval_bool("exists(title)"));
        assert!(!eval_bool("exists(yearEnd)"));
        assert!(eval_bool("istrue(cached)"));
        assert!(!eval_bool("isfalse(cached)"));
        assert!(eval_bool("seadex()"));
    }

    #[test]
    fn unknown_field_is_null_not_error() {
        assert!(!eval_bool("nonsense"));
        assert!(!eval_bool("nonsense == 'x'"));
        assert!(eval_bool("nonsense == null"));
    }

    #[test]
    fn ordered_comparison_with_null_is_false() {
        assert!(!eval_bool("nonsense > 3"));
        assert!(!eval_bool("nonsense < 3"));
    }

    #[test]
    fn boolean_operators_and_precedence() {
        assert!(eval_bool("cached and resolution == '1080p'"));
        assert!(eval_bool("resolution == '720p' or cached"));
        assert!(eval_bool("not resolution == '720p'"));
        assert!(eval_bool("!library"));
        assert!(eval_bool("resolution == '720p' or cached and isAnime"));
    }

    #[test]
    fn number_equality_coerces() {
        assert!(eval_bool("season == 1.0"));
        assert!(eval_bool("size > 1000000000"));
    }

    #[test]
    fn unknown_function_is_eval_error() {
        let expr = parse("bogus(1)").unwrap();
        assert!(evaluate(&expr, &stream(), &context()).is_err());
    }
}
