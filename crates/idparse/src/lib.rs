//! Media identifier parsing.
//!
//! Incoming requests address content by opaque ids from a number of catalogs:
//! bare IMDb ids (`tt0111161`, optionally `tt0111161:1:5` with season and
//! episode), or prefixed ids such as `kitsu:7936:5`, `mal:5114`,
//! `tmdb:1396:2:3`. This crate turns those into a [`ParsedId`] carrying the
//! source catalog, the raw value, and any season/episode coordinates.

mod models;

pub use models::{IdSource, MediaKind, ParsedId};

/// Parse an opaque media id into a [`ParsedId`].
///
/// Returns `None` for unknown prefixes or malformed ids; callers treat that
/// as "not found", never as an error.
///
/// The trailing-number rules:
/// - two trailing numbers are always `season:episode`;
/// - a single trailing number is an episode for anime-scoped catalogs
///   (MAL, Kitsu, AniDB, AniList, which number per-entry) and a season for
///   everything else.
///
/// `kind` is a caller-side hint carried onto the result; it does not change
/// how tokens are interpreted.
pub fn parse(raw: &str, kind: MediaKind) -> Option<ParsedId> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    // Bare IMDb form: tt123[:season[:episode]]
    if let Some(rest) = raw.strip_prefix("tt") {
        let mut parts = rest.split(':');
        let digits = parts.next()?;
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let season = match parts.next() {
            Some(s) => Some(s.parse().ok()?),
            None => None,
        };
        let episode = match parts.next() {
            Some(e) => Some(e.parse().ok()?),
            None => None,
        };
        if parts.next().is_some() {
            return None;
        }
        return Some(ParsedId {
            source: IdSource::Imdb,
            value: format!("tt{digits}"),
            season,
            episode,
            kind,
        });
    }

    // Prefixed form: <source>:<value>[:n[:m]]
    let mut parts = raw.splitn(2, ':');
    let prefix = parts.next()?;
    let rest = parts.next()?;
    let source = IdSource::from_prefix(prefix)?;

    let tokens: Vec<&str> = rest.split(':').collect();
    if tokens.is_empty() || tokens[0].is_empty() {
        return None;
    }

    let (value, numbers) = split_trailing_numbers(&tokens);
    if value.is_empty() {
        return None;
    }

    let (season, episode) = match numbers.as_slice() {
        [] => (None, None),
        [n] if source.is_anime_scoped() => (None, Some(*n)),
        [n] => (Some(*n), None),
        [s, e] => (Some(*s), Some(*e)),
        _ => return None,
    };

    Some(ParsedId {
        source,
        value,
        season,
        episode,
        kind,
    })
}

/// Split a token list into the id value and its trailing numeric coordinates.
///
/// The value itself may be numeric (most anime catalogs use integer ids), so
/// the first token is always part of the value; only tokens after it count
/// as coordinates.
fn split_trailing_numbers(tokens: &[&str]) -> (String, Vec<u32>) {
    let mut numbers = Vec::new();
    let mut end = tokens.len();
    while end > 1 {
        match tokens[end - 1].parse::<u32>() {
            Ok(n) => {
                numbers.push(n);
                end -= 1;
            }
            Err(_) => break,
        }
    }
    numbers.reverse();
    (tokens[..end].join(":"), numbers)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_bare_imdb_id() {
        let id = parse("tt0111161", MediaKind::Movie).unwrap();
        assert_eq!(id.source, IdSource::Imdb);
        assert_eq!(id.value, "tt0111161");
        assert_eq!(id.season, None);
        assert_eq!(id.episode, None);
    }

    #[test]
    fn parses_imdb_id_with_season_episode() {
        let id = parse("tt0944947:3:9", MediaKind::Series).unwrap();
        assert_eq!(id.value, "tt0944947");
        assert_eq!(id.season, Some(3));
        assert_eq!(id.episode, Some(9));
    }

    #[test]
    fn parses_kitsu_id_with_episode() {
        let id = parse("kitsu:7936:5", MediaKind::Series).unwrap();
        assert_eq!(id.source, IdSource::Kitsu);
        assert_eq!(id.value, "7936");
        // Single trailing number on an anime-scoped source is an episode.
        assert_eq!(id.season, None);
        assert_eq!(id.episode, Some(5));
    }

    #[test]
    fn parses_mal_id_without_coordinates() {
        let id = parse("mal:5114", MediaKind::Unknown).unwrap();
        assert_eq!(id.source, IdSource::Mal);
        assert_eq!(id.value, "5114");
        assert_eq!(id.episode, None);
    }

    #[test]
    fn parses_tmdb_id_with_season_and_episode() {
        let id = parse("tmdb:1396:2:3", MediaKind::Series).unwrap();
        assert_eq!(id.source, IdSource::Tmdb);
        assert_eq!(id.value, "1396");
        assert_eq!(id.season, Some(2));
        assert_eq!(id.episode, Some(3));
    }

    #[test]
    fn single_trailing_number_is_season_for_non_anime_sources() {
        let id = parse("tvdb:81189:4", MediaKind::Series).unwrap();
        assert_eq!(id.season, Some(4));
        assert_eq!(id.episode, None);
    }

    #[test]
    fn parses_hyphenated_prefixes() {
        let id = parse("anime-planet:cowboy-bebop", MediaKind::Series).unwrap();
        assert_eq!(id.source, IdSource::AnimePlanet);
        assert_eq!(id.value, "cowboy-bebop");

        let id = parse("notify-moe:aaaaaaaaaa", MediaKind::Series).unwrap();
        assert_eq!(id.source, IdSource::NotifyMoe);
    }

    #[test]
    fn slug_values_keep_inner_colons_out() {
        // A slug value is never split; only trailing pure numbers are lifted.
        let id = parse("trakt:breaking-bad:2:4", MediaKind::Series).unwrap();
        assert_eq!(id.value, "breaking-bad");
        assert_eq!(id.season, Some(2));
        assert_eq!(id.episode, Some(4));
    }

    #[test]
    fn rejects_unknown_prefix() {
        assert!(parse("netflix:81189", MediaKind::Unknown).is_none());
    }

    #[test]
    fn rejects_malformed_ids() {
        assert!(parse("", MediaKind::Unknown).is_none());
        assert!(parse("tt", MediaKind::Unknown).is_none());
        assert!(parse("ttabc", MediaKind::Unknown).is_none());
        assert!(parse("tt123:x", MediaKind::Unknown).is_none());
        assert!(parse("kitsu:", MediaKind::Unknown).is_none());
    }

    #[test]
    fn prefix_is_case_insensitive() {
        let id = parse("Kitsu:7936", MediaKind::Unknown).unwrap();
        assert_eq!(id.source, IdSource::Kitsu);
    }
}
