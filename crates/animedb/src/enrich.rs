//! Backfill season/episode coordinates onto a parsed id from its resolved
//! entry.

use std::sync::LazyLock;

use idparse::{IdSource, ParsedId};
use regex::Regex;

use crate::models::AnimeEntry;

static SEASON_SYNONYM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)season[\s_-]*(\d+)").unwrap());

/// Fill `season` from the entry's catalog projections (IMDb → Trakt → TVDB
/// → synonyms → TMDB) and, for per-entry catalogs (MAL/Kitsu), rebase the
/// episode into the downstream catalog's numbering
/// (`from_episode + episode - 1`).
///
/// Idempotent: a parsed id that already carries a season is left untouched,
/// so the episode is never rebased twice.
pub fn enrich_parsed_id(parsed: &mut ParsedId, entry: &AnimeEntry) {
    if parsed.season.is_some() {
        return;
    }

    let season = entry
        .imdb
        .as_ref()
        .and_then(|imdb| imdb.season_number)
        .or_else(|| entry.trakt.as_ref().and_then(|trakt| trakt.season_number))
        .or_else(|| {
            entry
                .tvdb
                .season_number
                .and_then(|n| u32::try_from(n).ok())
        })
        .or_else(|| synonym_season(&entry.synonyms))
        .or_else(|| {
            entry
                .tmdb
                .season_number
                .and_then(|n| u32::try_from(n).ok())
        });

    let Some(season) = season else {
        return;
    };
    parsed.season = Some(season);

    if matches!(parsed.source, IdSource::Mal | IdSource::Kitsu) {
        if let Some(episode) = parsed.episode {
            let from_episode = entry
                .imdb
                .as_ref()
                .and_then(|imdb| imdb.from_episode)
                .or(entry.tvdb.from_episode);
            if let Some(from_episode) = from_episode {
                parsed.episode = Some(from_episode + episode - 1);
            }
        }
    }
}

fn synonym_season(synonyms: &[String]) -> Option<u32> {
    synonyms.iter().find_map(|synonym| {
        SEASON_SYNONYM
            .captures(synonym)
            .and_then(|captures| captures[1].parse().ok())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ImdbProjection, SeasonProjection};
    use idparse::MediaKind;

    fn entry_with_imdb(season: u32, from_episode: u32) -> AnimeEntry {
        AnimeEntry {
            imdb: Some(ImdbProjection {
                season_number: Some(season),
                from_episode: Some(from_episode),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    #[test]
    fn fills_season_and_rebases_kitsu_episode() {
        let mut parsed = idparse::parse("kitsu:11111:5", MediaKind::Series).unwrap();
        let entry = entry_with_imdb(2, 13);

        enrich_parsed_id(&mut parsed, &entry);
        assert_eq!(parsed.season, Some(2));
        // Episode 5 of the second cour is episode 17 downstream.
        assert_eq!(parsed.episode, Some(17));
    }

    #[test]
    fn enrichment_is_idempotent() {
        let mut parsed = idparse::parse("kitsu:11111:5", MediaKind::Series).unwrap();
        let entry = entry_with_imdb(2, 13);

        enrich_parsed_id(&mut parsed, &entry);
        let once = parsed.clone();
        enrich_parsed_id(&mut parsed, &entry);
        assert_eq!(parsed, once);
    }

    #[test]
    fn existing_season_is_never_touched() {
        let mut parsed = idparse::parse("tt0944947:3:9", MediaKind::Series).unwrap();
        let entry = entry_with_imdb(1, 10);

        enrich_parsed_id(&mut parsed, &entry);
        assert_eq!(parsed.season, Some(3));
        assert_eq!(parsed.episode, Some(9));
    }

    #[test]
    fn season_fallback_order() {
        // No imdb/trakt blocks: tvdb projection wins.
        let mut parsed = idparse::parse("mal:1:1", MediaKind::Series).unwrap();
        let entry = AnimeEntry {
            tvdb: SeasonProjection {
                season_number: Some(3),
                ..Default::default()
            },
            synonyms: vec!["Something Season 9".into()],
            ..Default::default()
        };
        enrich_parsed_id(&mut parsed, &entry);
        assert_eq!(parsed.season, Some(3));

        // Only synonyms: they supply the season.
        let mut parsed = idparse::parse("mal:1:1", MediaKind::Series).unwrap();
        let entry = AnimeEntry {
            synonyms: vec!["Something Season 4".into()],
            ..Default::default()
        };
        enrich_parsed_id(&mut parsed, &entry);
        assert_eq!(parsed.season, Some(4));
    }

    #[test]
    fn non_anime_scoped_sources_keep_their_episode() {
        let mut parsed = idparse::parse("tvdb:81189:2", MediaKind::Series).unwrap();
        parsed.season = None;
        parsed.episode = Some(7);
        let entry = entry_with_imdb(2, 13);

        enrich_parsed_id(&mut parsed, &entry);
        assert_eq!(parsed.season, Some(2));
        assert_eq!(parsed.episode, Some(7));
    }
}
