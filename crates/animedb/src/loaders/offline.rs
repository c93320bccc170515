use std::sync::LazyLock;

use idparse::IdSource;
use regex::Regex;
use serde::Deserialize;

use crate::error::{AnimeDbError, Result};
use crate::models::AnimeDetails;

/// One offline-catalog title: the details plus the external ids extracted
/// from its source URLs.
#[derive(Debug, Clone)]
pub struct OfflineTitle {
    pub ids: Vec<(IdSource, String)>,
    pub details: AnimeDetails,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawEntry {
    sources: Vec<String>,
    #[serde(flatten)]
    details: AnimeDetails,
}

#[derive(Debug, Deserialize)]
struct RawCorpus {
    data: Vec<serde_json::Value>,
}

static SOURCE_URL_PATTERNS: LazyLock<Vec<(IdSource, Regex)>> = LazyLock::new(|| {
    [
        (IdSource::Mal, r"myanimelist\.net/anime/(\d+)"),
        (IdSource::Anilist, r"anilist\.co/anime/(\d+)"),
        (IdSource::Kitsu, r"kitsu\.(?:app|io)/anime/([\w-]+)"),
        (IdSource::Anidb, r"anidb\.net/anime/(\d+)"),
        (IdSource::AnimePlanet, r"anime-planet\.com/anime/([\w-]+)"),
        (IdSource::Anisearch, r"anisearch\.com/anime/(\d+)"),
        (IdSource::Livechart, r"livechart\.me/anime/(\d+)"),
        (IdSource::NotifyMoe, r"notify\.moe/anime/([\w-]+)"),
        (IdSource::Simkl, r"simkl\.com/anime/(\d+)"),
        (IdSource::Animecountdown, r"animecountdown\.com/(\d+)"),
    ]
    .into_iter()
    .map(|(source, pattern)| (source, Regex::new(pattern).unwrap()))
    .collect()
});

/// Extract `(source, id)` pairs from a title's source URLs.
fn extract_ids(sources: &[String]) -> Vec<(IdSource, String)> {
    let mut ids = Vec::new();
    for url in sources {
        for (source, pattern) in SOURCE_URL_PATTERNS.iter() {
            if let Some(captures) = pattern.captures(url) {
                ids.push((*source, captures[1].to_string()));
                break;
            }
        }
    }
    ids
}

/// Parse the offline catalog (`{"data": [...]}`). With `reduced` set, only
/// the minimal detail form (title, season, synonyms) is retained.
pub fn parse_offline_database(raw: &str, reduced: bool) -> Result<Vec<OfflineTitle>> {
    let corpus: RawCorpus = serde_json::from_str(raw)
        .map_err(|e| AnimeDbError::parse("offline-database", e.to_string()))?;

    let mut titles = Vec::with_capacity(corpus.data.len());
    let mut skipped = 0usize;
    for value in corpus.data {
        let entry = match serde_json::from_value::<RawEntry>(value) {
            Ok(entry) => entry,
            Err(e) => {
                skipped += 1;
                tracing::warn!("skipping malformed offline-database record: {}", e);
                continue;
            }
        };

        let ids = extract_ids(&entry.sources);
        if ids.is_empty() || entry.details.title.is_empty() {
            skipped += 1;
            continue;
        }

        let details = if reduced {
            entry.details.reduced()
        } else {
            entry.details
        };
        titles.push(OfflineTitle { ids, details });
    }

    if skipped > 0 {
        tracing::warn!("offline-database: skipped {} unusable record(s)", skipped);
    }
    tracing::debug!("offline-database: parsed {} titles", titles.len());
    Ok(titles)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SeasonName;

    const SAMPLE: &str = r#"{
        "data": [
            {
                "sources": [
                    "https://anidb.net/anime/4563",
                    "https://anilist.co/anime/918",
                    "https://kitsu.app/anime/818",
                    "https://myanimelist.net/anime/918"
                ],
                "title": "Gintama",
                "type": "TV",
                "episodes": 201,
                "status": "FINISHED",
                "animeSeason": {"season": "SPRING", "year": 2006},
                "picture": "https://cdn.myanimelist.net/images/anime/10/73274.jpg",
                "synonyms": ["Gin Tama", "Silver Soul"]
            },
            {
                "sources": ["https://example.com/unknown/1"],
                "title": "Unmappable"
            },
            {"title": 42}
        ]
    }"#;

    #[test]
    fn extracts_ids_from_source_urls() {
        let titles = parse_offline_database(SAMPLE, false).unwrap();
        assert_eq!(titles.len(), 1);
        let title = &titles[0];
        assert_eq!(title.details.title, "Gintama");
        assert_eq!(title.details.anime_season.season, SeasonName::Spring);
        assert_eq!(title.details.episodes, Some(201));
        assert!(title
            .ids
            .contains(&(IdSource::Mal, "918".to_string())));
        assert!(title
            .ids
            .contains(&(IdSource::Anidb, "4563".to_string())));
        assert_eq!(title.ids.len(), 4);
    }

    #[test]
    fn reduced_detail_drops_extras() {
        let titles = parse_offline_database(SAMPLE, true).unwrap();
        assert_eq!(titles[0].details.episodes, None);
        assert_eq!(titles[0].details.status, None);
        assert_eq!(titles[0].details.synonyms.len(), 2);
    }

    #[test]
    fn kitsu_io_and_app_both_match() {
        let ids = extract_ids(&[
            "https://kitsu.io/anime/818".to_string(),
            "https://kitsu.app/anime/819".to_string(),
        ]);
        assert_eq!(ids.len(), 2);
    }

    #[test]
    fn missing_data_key_is_an_error() {
        assert!(parse_offline_database("[]", false).is_err());
    }
}
