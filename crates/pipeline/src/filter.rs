//! The filter stage.
//!
//! Applies, in order: included-expression whitelisting, excluded/required
//! expressions, quality and visual-tag deny lists, title/year/season-episode
//! matching against catalog metadata, and the digital-release filter.
//! Malformed expressions are logged and treated as empty; a stream is only
//! dropped by a check that positively rejects it.

use chrono::NaiveDate;
use expr::Compiled;
use metadata::{MediaMetadata, ReleaseDates};
use model::{ParsedStream, UserData};
use serde_json::Value;

use crate::context::StreamContext;

/// Everything the filter needs from the context, gathered once.
pub struct FilterInputs {
    pub metadata: Option<MediaMetadata>,
    pub release_dates: Option<ReleaseDates>,
    pub season: Option<u32>,
    pub episode: Option<u32>,
    pub is_movie: bool,
    pub today: NaiveDate,
}

impl FilterInputs {
    pub async fn gather(context: &StreamContext) -> Self {
        Self {
            metadata: context.get_metadata().await,
            release_dates: context.get_release_dates().await,
            season: context.season(),
            episode: context.episode(),
            is_movie: context.kind() == idparse::MediaKind::Movie,
            today: chrono::Utc::now().date_naive(),
        }
    }
}

fn compile_list(sources: &[String], stage: &str) -> Vec<Compiled> {
    sources
        .iter()
        .filter_map(|source| match Compiled::compile(source) {
            Ok(compiled) => Some(compiled),
            Err(e) => {
                tracing::warn!("skipping {} expression: {}", stage, e);
                None
            }
        })
        .collect()
}

pub fn filter_streams(
    streams: Vec<ParsedStream>,
    records: &[Value],
    expression_context: &Value,
    user_data: &UserData,
    inputs: &FilterInputs,
) -> Vec<ParsedStream> {
    let included = compile_list(&user_data.included_stream_expressions, "included");
    let required = compile_list(&user_data.required_stream_expressions, "required");
    let excluded = compile_list(&user_data.excluded_stream_expressions, "excluded");

    let before = streams.len();
    let kept: Vec<ParsedStream> = streams
        .into_iter()
        .zip(records)
        .filter_map(|(stream, record)| {
            let matches_any = |list: &[Compiled]| {
                list.iter()
                    .any(|compiled| compiled.matches(record, expression_context).unwrap_or(false))
            };

            // Whitelisted streams bypass every other check.
            if matches_any(&included) {
                return Some(stream);
            }
            if matches_any(&excluded) {
                return None;
            }
            if !required.is_empty() && !matches_any(&required) {
                return None;
            }
            if quality_excluded(&stream, user_data)
                || visual_tag_excluded(&stream, user_data)
                || title_mismatch(&stream, user_data, inputs)
                || year_mismatch(&stream, user_data, inputs)
                || season_episode_mismatch(&stream, user_data, inputs)
                || not_digitally_released(&stream, user_data, inputs)
            {
                return None;
            }
            Some(stream)
        })
        .collect();

    if kept.len() != before {
        tracing::debug!("filter: {} -> {} streams", before, kept.len());
    }
    kept
}

fn quality_excluded(stream: &ParsedStream, user_data: &UserData) -> bool {
    let Some(quality) = stream.parsed_file.as_ref().and_then(|f| f.quality.as_deref()) else {
        return false;
    };
    user_data
        .excluded_qualities
        .iter()
        .any(|excluded| excluded.eq_ignore_ascii_case(quality))
}

fn visual_tag_excluded(stream: &ParsedStream, user_data: &UserData) -> bool {
    let Some(file) = stream.parsed_file.as_ref() else {
        return false;
    };
    file.visual_tags.iter().any(|tag| {
        user_data
            .excluded_visual_tags
            .iter()
            .any(|excluded| excluded.eq_ignore_ascii_case(tag))
    })
}

/// Lowercase, strip punctuation, collapse whitespace.
fn normalize_title(title: &str) -> String {
    let mut normalized = String::with_capacity(title.len());
    let mut last_was_space = true;
    for c in title.chars() {
        if c.is_alphanumeric() {
            for lower in c.to_lowercase() {
                normalized.push(lower);
            }
            last_was_space = false;
        } else if !last_was_space {
            normalized.push(' ');
            last_was_space = true;
        }
    }
    normalized.trim_end().to_string()
}

/// A stream fails title matching only when it carries a parsed title that
/// matches none of the request's known titles.
fn title_mismatch(stream: &ParsedStream, user_data: &UserData, inputs: &FilterInputs) -> bool {
    if !user_data.title_matching.enabled {
        return false;
    }
    let Some(metadata) = inputs.metadata.as_ref() else {
        return false;
    };
    let Some(stream_title) = stream.parsed_file.as_ref().and_then(|f| f.title.as_deref()) else {
        return false;
    };

    let stream_title = normalize_title(stream_title);
    if stream_title.is_empty() {
        return false;
    }

    let matched = metadata.all_titles().iter().any(|known| {
        let known = normalize_title(known);
        if user_data.title_matching.exact {
            known == stream_title
        } else {
            known == stream_title
                || known.contains(&stream_title)
                || stream_title.contains(&known)
        }
    });
    !matched
}

fn year_mismatch(stream: &ParsedStream, user_data: &UserData, inputs: &FilterInputs) -> bool {
    if !user_data.year_matching.enabled {
        return false;
    }
    let Some(metadata) = inputs.metadata.as_ref() else {
        return false;
    };
    let Some(expected) = metadata.year else {
        return false;
    };
    let Some(stream_year) = stream.parsed_file.as_ref().and_then(|f| f.year) else {
        return false;
    };

    let tolerance = user_data.year_matching.tolerance as i32;
    let last = metadata.year_end.unwrap_or(expected);
    stream_year < expected - tolerance || stream_year > last + tolerance
}

/// Requires the stream's parsed season/episode coordinates to cover the
/// requested ones; streams with no coordinates pass.
fn season_episode_mismatch(
    stream: &ParsedStream,
    user_data: &UserData,
    inputs: &FilterInputs,
) -> bool {
    if !user_data.season_episode_matching.enabled {
        return false;
    }
    let Some(file) = stream.parsed_file.as_ref() else {
        return false;
    };

    if let Some(requested) = inputs.season {
        let stream_seasons: Vec<u32> = if !file.seasons.is_empty() {
            file.seasons.clone()
        } else {
            file.season.into_iter().collect()
        };
        if !stream_seasons.is_empty() && !stream_seasons.contains(&requested) {
            return true;
        }
    }
    if let Some(requested) = inputs.episode {
        if let Some(stream_episode) = file.episode {
            if stream_episode != requested {
                return true;
            }
        }
    }
    false
}

/// Movies not yet digitally released only surface library streams;
/// everything else at that point is a cam or a fake.
fn not_digitally_released(
    stream: &ParsedStream,
    user_data: &UserData,
    inputs: &FilterInputs,
) -> bool {
    if !user_data.digital_release_filter.enabled || !inputs.is_movie || stream.library {
        return false;
    }
    let Some(dates) = inputs.release_dates.as_ref() else {
        return false;
    };
    match dates.earliest_home_release() {
        Some(release) => release > inputs.today,
        // Dates known but no home channel yet: still theater-only.
        None => dates.theatrical.is_some(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use model::{DigitalReleaseFilter, ParsedFile, TitleMatching, YearMatching};
    use serde_json::json;

    fn stream(id: &str) -> ParsedStream {
        serde_json::from_value(json!({"id": id, "type": "debrid"})).unwrap()
    }

    fn inputs() -> FilterInputs {
        FilterInputs {
            metadata: None,
            release_dates: None,
            season: None,
            episode: None,
            is_movie: false,
            today: NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
        }
    }

    fn records(streams: &[ParsedStream]) -> Vec<Value> {
        streams.iter().map(|s| serde_json::to_value(s).unwrap()).collect()
    }

    #[test]
    fn excluded_quality_is_dropped() {
        let mut cam = stream("cam");
        cam.parsed_file = Some(ParsedFile {
            quality: Some("CAM".into()),
            ..Default::default()
        });
        let keep = stream("web");

        let user_data = UserData {
            excluded_qualities: vec!["cam".into()],
            ..Default::default()
        };
        let streams = vec![cam, keep];
        let recs = records(&streams);
        let kept = filter_streams(streams, &recs, &json!({}), &user_data, &inputs());
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].id, "web");
    }

    #[test]
    fn excluded_expression_drops_and_included_rescues() {
        let mut uncached = stream("uncached");
        uncached.service = Some(model::ServiceInfo {
            id: "rd".into(),
            short_name: None,
            cached: false,
        });
        let mut big = stream("big");
        big.size = Some(50_000_000_000);
        big.service = Some(model::ServiceInfo {
            id: "rd".into(),
            short_name: None,
            cached: false,
        });

        let user_data = UserData {
            excluded_stream_expressions: vec!["!cached".into()],
            included_stream_expressions: vec!["size > 40000000000".into()],
            ..Default::default()
        };
        let streams = vec![uncached, big];
        let recs = records(&streams);
        let kept = filter_streams(streams, &recs, &json!({}), &user_data, &inputs());
        // "uncached" dies to the exclusion; "big" is whitelisted past it.
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].id, "big");
    }

    #[test]
    fn required_expressions_gate_everything() {
        let mut cached = stream("cached");
        cached.service = Some(model::ServiceInfo {
            id: "rd".into(),
            short_name: None,
            cached: true,
        });
        let plain = stream("plain");

        let user_data = UserData {
            required_stream_expressions: vec!["cached".into()],
            ..Default::default()
        };
        let streams = vec![cached, plain];
        let recs = records(&streams);
        let kept = filter_streams(streams, &recs, &json!({}), &user_data, &inputs());
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].id, "cached");
    }

    #[test]
    fn malformed_expression_is_treated_as_empty() {
        let streams = vec![stream("s1")];
        let user_data = UserData {
            excluded_stream_expressions: vec!["((((".into()],
            ..Default::default()
        };
        let recs = records(&streams);
        let kept = filter_streams(streams, &recs, &json!({}), &user_data, &inputs());
        assert_eq!(kept.len(), 1);
    }

    #[test]
    fn title_matching_drops_wrong_title_only() {
        let mut wrong = stream("wrong");
        wrong.parsed_file = Some(ParsedFile {
            title: Some("Totally Different Show".into()),
            ..Default::default()
        });
        let mut right = stream("right");
        right.parsed_file = Some(ParsedFile {
            title: Some("Sousou no Frieren".into()),
            ..Default::default()
        });
        let untitled = stream("untitled");

        let mut inputs = inputs();
        inputs.metadata = Some(MediaMetadata {
            title: "Frieren: Beyond Journey's End".into(),
            titles: vec!["Sousou no Frieren".into()],
            ..Default::default()
        });
        let user_data = UserData {
            title_matching: TitleMatching {
                enabled: true,
                exact: false,
            },
            ..Default::default()
        };
        let streams = vec![wrong, right, untitled];
        let recs = records(&streams);
        let kept = filter_streams(streams, &recs, &json!({}), &user_data, &inputs);
        let ids: Vec<&str> = kept.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["right", "untitled"]);
    }

    #[test]
    fn year_matching_respects_tolerance_and_span() {
        let mut inputs = inputs();
        inputs.metadata = Some(MediaMetadata {
            year: Some(2008),
            year_end: Some(2013),
            ..Default::default()
        });
        let user_data = UserData {
            year_matching: YearMatching {
                enabled: true,
                tolerance: 1,
            },
            ..Default::default()
        };

        let mut old = stream("old");
        old.parsed_file = Some(ParsedFile {
            year: Some(2005),
            ..Default::default()
        });
        let mut inside = stream("inside");
        inside.parsed_file = Some(ParsedFile {
            year: Some(2011),
            ..Default::default()
        });
        let mut edge = stream("edge");
        edge.parsed_file = Some(ParsedFile {
            year: Some(2014),
            ..Default::default()
        });

        let streams = vec![old, inside, edge];
        let recs = records(&streams);
        let kept = filter_streams(streams, &recs, &json!({}), &user_data, &inputs);
        let ids: Vec<&str> = kept.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["inside", "edge"]);
    }

    #[test]
    fn season_episode_matching() {
        let mut inputs = inputs();
        inputs.season = Some(2);
        inputs.episode = Some(5);
        let user_data = UserData {
            season_episode_matching: model::SeasonEpisodeMatching { enabled: true },
            ..Default::default()
        };

        let mut right = stream("right");
        right.parsed_file = Some(ParsedFile {
            season: Some(2),
            episode: Some(5),
            ..Default::default()
        });
        let mut wrong_season = stream("wrong-season");
        wrong_season.parsed_file = Some(ParsedFile {
            season: Some(1),
            episode: Some(5),
            ..Default::default()
        });
        let mut season_pack = stream("season-pack");
        season_pack.parsed_file = Some(ParsedFile {
            seasons: vec![1, 2, 3],
            ..Default::default()
        });
        let unlabeled = stream("unlabeled");

        let streams = vec![right, wrong_season, season_pack, unlabeled];
        let recs = records(&streams);
        let kept = filter_streams(streams, &recs, &json!({}), &user_data, &inputs);
        let ids: Vec<&str> = kept.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["right", "season-pack", "unlabeled"]);
    }

    #[test]
    fn digital_release_filter_drops_prerelease_streams() {
        let mut inputs = inputs();
        inputs.is_movie = true;
        inputs.release_dates = Some(ReleaseDates {
            theatrical: NaiveDate::from_ymd_opt(2025, 5, 1),
            digital: NaiveDate::from_ymd_opt(2025, 8, 1),
            physical: None,
        });
        let user_data = UserData {
            digital_release_filter: DigitalReleaseFilter { enabled: true },
            ..Default::default()
        };

        let rip = stream("rip");
        let mut library = stream("library");
        library.library = true;

        let streams = vec![rip, library];
        let recs = records(&streams);
        let kept = filter_streams(streams, &recs, &json!({}), &user_data, &inputs);
        let ids: Vec<&str> = kept.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["library"]);
    }
}
