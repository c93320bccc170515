//! Tag-annotation stages: SeaDex membership, preferred keywords/regexes/
//! expressions, and additive ranked scores.

use expr::Compiled;
use model::{ParsedStream, RegexPatternDef, SeadexTag, UserData};
use regex::Regex;
use seadex::SeadexInfo;
use serde_json::Value;

/// Tag streams against the SeaDex sets. Hash matches win outright: the
/// release-group fallback only runs when no stream in the request matched
/// by hash.
pub fn precompute_seadex(streams: &mut [ParsedStream], info: &SeadexInfo) {
    let mut any_hash_matched = false;
    for stream in streams.iter_mut() {
        let Some(hash) = stream.info_hash() else {
            continue;
        };
        if info.all_hashes.contains(&hash) {
            stream.seadex = Some(SeadexTag {
                is_best: info.best_hashes.contains(&hash),
                is_seadex: true,
            });
            any_hash_matched = true;
        }
    }

    if any_hash_matched {
        return;
    }

    for stream in streams.iter_mut() {
        let Some(group) = stream.release_group().map(str::to_lowercase) else {
            continue;
        };
        if info.all_groups.contains(&group) || info.best_groups.contains(&group) {
            stream.seadex = Some(SeadexTag {
                is_best: info.best_groups.contains(&group),
                is_seadex: info.all_groups.contains(&group),
            });
        }
    }
}

/// A user regex pattern with its synthetic flags parsed out.
///
/// Patterns may be written bare (`\bremux\b`) or in `/pattern/flags` form;
/// the synthetic `n` flag negates the match, `i` forces case-insensitivity
/// (bare patterns are case-insensitive by default).
pub struct CompiledPattern {
    pub name: Option<String>,
    pub source: String,
    pub regex: Regex,
    pub negated: bool,
}

pub fn compile_pattern(def: &RegexPatternDef) -> Option<CompiledPattern> {
    let raw = def.pattern.as_str();
    let (bare, flags) = match (raw.strip_prefix('/'), raw.rfind('/')) {
        (Some(_), Some(end)) if end > 0 => (&raw[1..end], &raw[end + 1..]),
        _ => (raw, ""),
    };
    let negated = flags.contains('n');
    let case_insensitive = flags.is_empty() || flags.contains('i');

    match regex::RegexBuilder::new(bare)
        .case_insensitive(case_insensitive)
        .build()
    {
        Ok(regex) => Some(CompiledPattern {
            name: def.name.clone(),
            source: bare.to_string(),
            regex,
            negated,
        }),
        Err(e) => {
            tracing::warn!("invalid preferred regex {:?}: {}", def.pattern, e);
            None
        }
    }
}

/// The fields preferred keywords/regexes match against.
fn matchable_fields(stream: &ParsedStream) -> [Option<&str>; 4] {
    [
        stream.filename.as_deref(),
        stream.folder_name.as_deref(),
        stream.release_group(),
        stream.indexer.as_deref(),
    ]
}

/// Annotate `keyword_matched` and `regex_matched`. Regex-bearing options
/// are ignored entirely for users without the regex permission.
pub fn precompute_preferred_patterns(streams: &mut [ParsedStream], user_data: &UserData) {
    if !user_data.regex_allowed {
        return;
    }

    let keyword_regex = compile_keywords(&user_data.preferred_keywords);
    let patterns: Vec<CompiledPattern> = user_data
        .preferred_regex_patterns
        .iter()
        .filter_map(compile_pattern)
        .collect();

    for stream in streams.iter_mut() {
        if let Some(keyword_regex) = &keyword_regex {
            let fields = matchable_fields(stream);
            let hit = fields
                .iter()
                .flatten()
                .any(|field| keyword_regex.is_match(field));
            if hit {
                stream.keyword_matched = Some(true);
            }
        }

        // First pattern to match claims the stream.
        for (index, pattern) in patterns.iter().enumerate() {
            let fields = matchable_fields(stream);
            let mut hit = fields
                .iter()
                .flatten()
                .any(|field| pattern.regex.is_match(field));
            if pattern.negated {
                hit = !hit;
            }
            if hit {
                stream.regex_matched = Some(model::RegexMatch {
                    name: pattern.name.clone(),
                    pattern: pattern.source.clone(),
                    index,
                });
                break;
            }
        }
    }
}

fn compile_keywords(keywords: &[String]) -> Option<Regex> {
    if keywords.is_empty() {
        return None;
    }
    let joined = keywords
        .iter()
        .map(|k| regex::escape(k))
        .collect::<Vec<_>>()
        .join("|");
    match regex::RegexBuilder::new(&format!("(?:{joined})"))
        .case_insensitive(true)
        .build()
    {
        Ok(regex) => Some(regex),
        Err(e) => {
            tracing::warn!("failed to compile preferred keywords: {}", e);
            None
        }
    }
}

/// First-claim preferred expressions: a stream is claimed by the first
/// expression that selects it and never moves to a later one.
pub fn precompute_preferred_expressions(
    streams: &mut [ParsedStream],
    records: &[Value],
    context: &Value,
    expressions: &[String],
) {
    for (index, source) in expressions.iter().enumerate() {
        let compiled = match Compiled::compile(source) {
            Ok(compiled) => compiled,
            Err(e) => {
                tracing::warn!("skipping preferred expression: {}", e);
                continue;
            }
        };
        for position in compiled.select(records, context) {
            let stream = &mut streams[position];
            if stream.expression_matched.is_none() {
                stream.expression_matched = Some(index);
            }
        }
    }
}

/// Additive ranked scores. A stream's score stays unset until some
/// expression selects it ("not evaluated" is distinct from a zero score).
pub fn precompute_ranked_expressions(
    streams: &mut [ParsedStream],
    records: &[Value],
    context: &Value,
    ranked: &[model::RankedExpression],
) {
    for entry in ranked {
        let compiled = match Compiled::compile(&entry.expression) {
            Ok(compiled) => compiled,
            Err(e) => {
                tracing::warn!("skipping ranked expression: {}", e);
                continue;
            }
        };
        for position in compiled.select(records, context) {
            let stream = &mut streams[position];
            stream.expression_score = Some(stream.expression_score.unwrap_or(0.0) + entry.score);
        }
    }
}
