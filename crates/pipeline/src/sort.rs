//! Stable multi-key sort.
//!
//! Keys are compared in configuration order; the first non-equal key
//! decides, ties fall through, and fully tied streams keep their fetcher
//! order (`sort_by` is stable). Each key's natural ascending order runs
//! from "least of the property" to "most"; `desc` therefore puts cached,
//! high-resolution, large, well-scored streams first.

use std::cmp::Ordering;

use model::{resolution_rank, ParsedStream, SortCriterion, SortDirection, SortKey, StreamType};

/// Release quality ladder, best first.
const QUALITY_ORDER: &[&str] = &[
    "BluRay REMUX",
    "BluRay",
    "WEB-DL",
    "WEBRip",
    "WEB",
    "HDTV",
    "DVDRip",
    "DVD",
    "SDTV",
    "TS",
    "CAM",
];

/// Acquisition-type ladder, best first.
const STREAM_TYPE_ORDER: &[StreamType] = &[
    StreamType::Debrid,
    StreamType::Usenet,
    StreamType::P2p,
    StreamType::Http,
    StreamType::Live,
    StreamType::Youtube,
    StreamType::External,
];

pub fn sort_streams(
    streams: &mut [ParsedStream],
    criteria: &[SortCriterion],
    preferred_resolutions: &[String],
) {
    if criteria.is_empty() {
        return;
    }
    streams.sort_by(|a, b| {
        for criterion in criteria {
            let ordering = compare_by_key(a, b, criterion.key, preferred_resolutions);
            let ordering = match criterion.direction {
                SortDirection::Asc => ordering,
                SortDirection::Desc => ordering.reverse(),
            };
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        Ordering::Equal
    });
}

/// Resolution rank with the user's preferred list floated above the default
/// ladder. Lower rank = better.
fn effective_resolution_rank(stream: &ParsedStream, preferred: &[String]) -> usize {
    let resolution = stream.resolution();
    if let Some(resolution) = resolution {
        if let Some(position) = preferred
            .iter()
            .position(|p| p.eq_ignore_ascii_case(resolution))
        {
            return position;
        }
    }
    preferred.len() + resolution_rank(resolution)
}

fn quality_rank(stream: &ParsedStream) -> usize {
    stream
        .parsed_file
        .as_ref()
        .and_then(|f| f.quality.as_deref())
        .and_then(|q| {
            QUALITY_ORDER
                .iter()
                .position(|known| known.eq_ignore_ascii_case(q))
        })
        .unwrap_or(QUALITY_ORDER.len())
}

fn stream_type_rank(stream: &ParsedStream) -> usize {
    STREAM_TYPE_ORDER
        .iter()
        .position(|t| *t == stream.stream_type)
        .unwrap_or(STREAM_TYPE_ORDER.len())
}

fn seadex_value(stream: &ParsedStream) -> u8 {
    match stream.seadex {
        Some(tag) if tag.is_best => 2,
        Some(tag) if tag.is_seadex => 1,
        _ => 0,
    }
}

fn tag_count(stream: &ParsedStream, pick: fn(&model::ParsedFile) -> &Vec<String>) -> usize {
    stream
        .parsed_file
        .as_ref()
        .map(|f| pick(f).len())
        .unwrap_or(0)
}

/// Ascending comparison for one key ("less of the property" first).
fn compare_by_key(
    a: &ParsedStream,
    b: &ParsedStream,
    key: SortKey,
    preferred_resolutions: &[String],
) -> Ordering {
    match key {
        SortKey::Cached => a.is_cached().cmp(&b.is_cached()),
        SortKey::Library => a.library.cmp(&b.library),
        SortKey::Size => a.size.unwrap_or(0).cmp(&b.size.unwrap_or(0)),
        SortKey::Seeders => seeders(a).cmp(&seeders(b)),
        SortKey::Resolution => {
            // Lower rank = better, so ascending flips the rank order.
            effective_resolution_rank(b, preferred_resolutions)
                .cmp(&effective_resolution_rank(a, preferred_resolutions))
        }
        SortKey::Quality => quality_rank(b).cmp(&quality_rank(a)),
        SortKey::StreamType => stream_type_rank(b).cmp(&stream_type_rank(a)),
        SortKey::RegexPatterns => regex_value(a).cmp(&regex_value(b)),
        SortKey::StreamExpression => score(a).total_cmp(&score(b)),
        SortKey::Seadex => seadex_value(a).cmp(&seadex_value(b)),
        SortKey::VisualTag => tag_count(a, |f| &f.visual_tags).cmp(&tag_count(b, |f| &f.visual_tags)),
        SortKey::AudioTag => tag_count(a, |f| &f.audio_tags).cmp(&tag_count(b, |f| &f.audio_tags)),
        SortKey::AudioChannel => {
            tag_count(a, |f| &f.audio_channels).cmp(&tag_count(b, |f| &f.audio_channels))
        }
        SortKey::Language => tag_count(a, |f| &f.languages).cmp(&tag_count(b, |f| &f.languages)),
        SortKey::Encode => has_encode(a).cmp(&has_encode(b)),
    }
}

fn seeders(stream: &ParsedStream) -> u32 {
    stream.torrent.as_ref().and_then(|t| t.seeders).unwrap_or(0)
}

/// A matched pattern with a lower index outranks higher indices; unmatched
/// streams rank below every match.
fn regex_value(stream: &ParsedStream) -> i64 {
    match &stream.regex_matched {
        Some(m) => -(m.index as i64),
        None => i64::MIN,
    }
}

fn score(stream: &ParsedStream) -> f64 {
    stream.expression_score.unwrap_or(f64::NEG_INFINITY)
}

fn has_encode(stream: &ParsedStream) -> bool {
    stream
        .parsed_file
        .as_ref()
        .map(|f| f.encode.is_some())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use model::{ParsedFile, RegexMatch, SeadexTag, ServiceInfo};
    use serde_json::json;

    fn stream(id: &str, resolution: Option<&str>, cached: bool, size: u64) -> ParsedStream {
        let mut stream: ParsedStream =
            serde_json::from_value(json!({"id": id, "type": "debrid"})).unwrap();
        stream.parsed_file = Some(ParsedFile {
            resolution: resolution.map(String::from),
            ..Default::default()
        });
        stream.service = Some(ServiceInfo {
            id: "rd".into(),
            short_name: None,
            cached,
        });
        stream.size = Some(size);
        stream
    }

    fn ids(streams: &[ParsedStream]) -> Vec<&str> {
        streams.iter().map(|s| s.id.as_str()).collect()
    }

    #[test]
    fn sorts_by_cached_then_resolution() {
        let mut streams = vec![
            stream("uncached-4k", Some("2160p"), false, 1),
            stream("cached-720", Some("720p"), true, 1),
            stream("cached-1080", Some("1080p"), true, 1),
        ];
        sort_streams(
            &mut streams,
            &[
                SortCriterion::desc(SortKey::Cached),
                SortCriterion::desc(SortKey::Resolution),
            ],
            &[],
        );
        assert_eq!(ids(&streams), vec!["cached-1080", "cached-720", "uncached-4k"]);
    }

    #[test]
    fn preferred_resolutions_outrank_the_ladder() {
        let mut streams = vec![
            stream("a-4k", Some("2160p"), true, 1),
            stream("b-1080", Some("1080p"), true, 1),
            stream("c-720", Some("720p"), true, 1),
        ];
        // The user prefers 1080p first; 2160p falls back to ladder order
        // below the preferred block.
        sort_streams(
            &mut streams,
            &[SortCriterion::desc(SortKey::Resolution)],
            &["1080p".to_string()],
        );
        assert_eq!(ids(&streams), vec!["b-1080", "a-4k", "c-720"]);
    }

    #[test]
    fn unknown_resolution_ranks_last() {
        let mut streams = vec![
            stream("mystery", None, true, 1),
            stream("sd", Some("480p"), true, 1),
        ];
        sort_streams(&mut streams, &[SortCriterion::desc(SortKey::Resolution)], &[]);
        assert_eq!(ids(&streams), vec!["sd", "mystery"]);
    }

    #[test]
    fn size_direction_is_honored() {
        let mut streams = vec![
            stream("small", None, true, 100),
            stream("large", None, true, 5000),
        ];
        sort_streams(&mut streams, &[SortCriterion::desc(SortKey::Size)], &[]);
        assert_eq!(ids(&streams), vec!["large", "small"]);

        sort_streams(&mut streams, &[SortCriterion::asc(SortKey::Size)], &[]);
        assert_eq!(ids(&streams), vec!["small", "large"]);
    }

    #[test]
    fn regex_matches_rank_by_index_on_desc() {
        let mut first = stream("first", None, true, 1);
        first.regex_matched = Some(RegexMatch {
            name: None,
            pattern: "a".into(),
            index: 0,
        });
        let mut second = stream("second", None, true, 1);
        second.regex_matched = Some(RegexMatch {
            name: None,
            pattern: "b".into(),
            index: 3,
        });
        let unmatched = stream("unmatched", None, true, 1);

        let mut streams = vec![unmatched, second, first];
        sort_streams(&mut streams, &[SortCriterion::desc(SortKey::RegexPatterns)], &[]);
        assert_eq!(ids(&streams), vec!["first", "second", "unmatched"]);
    }

    #[test]
    fn expression_scores_with_unset_below_everything() {
        let mut high = stream("high", None, true, 1);
        high.expression_score = Some(15.0);
        let mut negative = stream("negative", None, true, 1);
        negative.expression_score = Some(-5.0);
        let unset = stream("unset", None, true, 1);

        let mut streams = vec![negative, unset, high];
        sort_streams(
            &mut streams,
            &[SortCriterion::desc(SortKey::StreamExpression)],
            &[],
        );
        assert_eq!(ids(&streams), vec!["high", "negative", "unset"]);
    }

    #[test]
    fn seadex_best_outranks_listed_outranks_plain() {
        let mut best = stream("best", None, true, 1);
        best.seadex = Some(SeadexTag {
            is_best: true,
            is_seadex: true,
        });
        let mut listed = stream("listed", None, true, 1);
        listed.seadex = Some(SeadexTag {
            is_best: false,
            is_seadex: true,
        });
        let plain = stream("plain", None, true, 1);

        let mut streams = vec![plain, listed, best];
        sort_streams(&mut streams, &[SortCriterion::desc(SortKey::Seadex)], &[]);
        assert_eq!(ids(&streams), vec!["best", "listed", "plain"]);
    }

    #[test]
    fn fully_tied_streams_keep_fetcher_order() {
        let mut streams = vec![
            stream("one", Some("1080p"), true, 1000),
            stream("two", Some("1080p"), true, 1000),
            stream("three", Some("1080p"), true, 1000),
        ];
        sort_streams(
            &mut streams,
            &[
                SortCriterion::desc(SortKey::Cached),
                SortCriterion::desc(SortKey::Resolution),
                SortCriterion::desc(SortKey::Size),
            ],
            &[],
        );
        assert_eq!(ids(&streams), vec!["one", "two", "three"]);
    }
}
