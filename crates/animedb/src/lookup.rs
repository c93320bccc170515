//! Id resolution: `(source, value, season?, episode?)` → [`AnimeEntry`].

use std::sync::Arc;
use std::sync::LazyLock;

use idparse::IdSource;
use regex::Regex;

use crate::index::{lookup, AnimeListIndex};
use crate::models::{
    AnimeDetails, AnimeEntry, AnimeKind, AnimeListEntry, AnitraktEntry, FanartProjection,
    ImdbProjection, KitsuImdbEntry, MappingEntry, SeasonProjection, TraktProjection,
};
use crate::AnimeDatabase;

/// The chosen records an entry is assembled from.
#[derive(Default)]
struct Selection {
    mapping: Option<Arc<MappingEntry>>,
    details: Option<Arc<AnimeDetails>>,
    /// AnimeList entry chosen by the episode tie-break, if any.
    anime_list: Option<Arc<AnimeListEntry>>,
}

struct Candidate {
    mapping: Arc<MappingEntry>,
    anime_list: Option<Arc<AnimeListEntry>>,
    /// First episode of the candidate inside the downstream catalog's
    /// numbering; the tie-break keeps the highest one not past the request.
    from_episode: u32,
}

impl AnimeDatabase {
    /// Resolve an id to its canonical entry. `None` means "not an anime we
    /// know", never an error.
    pub fn get_entry(
        &self,
        source: IdSource,
        value: &str,
        season: Option<u32>,
        episode: Option<u32>,
    ) -> Option<AnimeEntry> {
        let mappings = self.mappings_snapshot();
        let candidates: Vec<Arc<MappingEntry>> = mappings
            .get(&source)
            .and_then(|by_id| lookup(by_id, value))
            .map(|bucket| bucket.clone())
            .unwrap_or_default();

        let filtered = season_type_filter(&candidates, season);
        let selection = self.select(&filtered, source, value, season, episode);

        // Co-indexed records are reachable through the chosen mapping or,
        // for their own catalogs, directly through the queried id.
        let kitsu_snapshot = self.kitsu_snapshot();
        let kitsu_id = selection
            .mapping
            .as_ref()
            .and_then(|m| m.kitsu_id)
            .or_else(|| direct_id(source, IdSource::Kitsu, value));
        let kitsu = kitsu_id.and_then(|id| kitsu_snapshot.get(&id).cloned());

        let mal_id = selection
            .mapping
            .as_ref()
            .and_then(|m| m.mal_id)
            .or_else(|| direct_id(source, IdSource::Mal, value));
        let anitrakt = mal_id.and_then(|id| self.anitrakt_for(id, season));

        let anime_list_snapshot = self.anime_list_snapshot();
        let anime_list = selection.anime_list.clone().or_else(|| {
            let anidb_id = selection
                .mapping
                .as_ref()
                .and_then(|m| m.anidb_id)
                .or_else(|| direct_id(source, IdSource::Anidb, value))?;
            anime_list_snapshot.by_anidb.get(&anidb_id).cloned()
        });

        let details = selection.details.clone().or_else(|| {
            self.details_snapshot()
                .get(&source)
                .and_then(|by_id| lookup(by_id, value))
                .cloned()
        });

        if selection.mapping.is_none()
            && details.is_none()
            && kitsu.is_none()
            && anitrakt.is_none()
            && anime_list.is_none()
        {
            return None;
        }

        Some(build_entry(
            selection.mapping.as_deref(),
            details.as_deref(),
            kitsu.as_deref(),
            anitrakt.as_deref(),
            anime_list.as_deref(),
        ))
    }

    /// Anitrakt is split into movie and tv corpora; a season-less query
    /// checks movies first, a seasoned one checks tv first.
    fn anitrakt_for(&self, mal_id: u64, season: Option<u32>) -> Option<Arc<AnitraktEntry>> {
        let movies = self.anitrakt_movies_snapshot();
        let tv = self.anitrakt_tv_snapshot();
        if season.is_none() {
            movies.get(&mal_id).or_else(|| tv.get(&mal_id)).cloned()
        } else {
            tv.get(&mal_id).or_else(|| movies.get(&mal_id)).cloned()
        }
    }

    /// Pick the mapping (and possibly AnimeList entry) the entry is built
    /// around.
    fn select(
        &self,
        filtered: &[Arc<MappingEntry>],
        source: IdSource,
        value: &str,
        season: Option<u32>,
        episode: Option<u32>,
    ) -> Selection {
        match filtered.len() {
            0 => Selection::default(),
            1 => Selection {
                details: self.details_for(&filtered[0]),
                mapping: Some(Arc::clone(&filtered[0])),
                anime_list: None,
            },
            _ => match (season, episode) {
                (Some(season), Some(episode)) if self.config().episode_tiebreak => {
                    self.tie_break(filtered, source, value, season, episode)
                }
                _ => Selection {
                    details: self.details_for(&filtered[0]),
                    mapping: Some(Arc::clone(&filtered[0])),
                    anime_list: None,
                },
            },
        }
    }

    /// Episode-level tie-break across an ambiguous mapping list.
    ///
    /// Candidates come from Kitsu records whose `from_season` matches and
    /// whose `from_episode` is not past the request, and from AnimeList
    /// entries reachable via a TVDB id whose default season covers the
    /// request (TMDB default season as fallback). The candidate with the
    /// highest `from_episode` wins: the most specific split-cour half.
    fn tie_break(
        &self,
        filtered: &[Arc<MappingEntry>],
        source: IdSource,
        value: &str,
        season: u32,
        episode: u32,
    ) -> Selection {
        let kitsu_snapshot = self.kitsu_snapshot();
        let anime_list_snapshot = self.anime_list_snapshot();
        let mut candidates: Vec<Candidate> = Vec::new();

        for mapping in filtered {
            let Some(kitsu_id) = mapping.kitsu_id else {
                continue;
            };
            let Some(kitsu) = kitsu_snapshot.get(&kitsu_id) else {
                continue;
            };
            let from_episode = kitsu.from_episode.unwrap_or(1);
            if kitsu.from_season == Some(season) && episode >= from_episode {
                candidates.push(Candidate {
                    mapping: Arc::clone(mapping),
                    anime_list: None,
                    from_episode,
                });
            }
        }

        let tvdb_candidates = self.anime_list_candidates(
            filtered,
            source,
            value,
            season,
            episode,
            &anime_list_snapshot,
            false,
        );
        if tvdb_candidates.is_empty() {
            candidates.extend(self.anime_list_candidates(
                filtered,
                source,
                value,
                season,
                episode,
                &anime_list_snapshot,
                true,
            ));
        } else {
            candidates.extend(tvdb_candidates);
        }

        if let Some(best) = candidates
            .into_iter()
            .max_by_key(|candidate| candidate.from_episode)
        {
            return Selection {
                details: self.details_for(&best.mapping),
                mapping: Some(best.mapping),
                anime_list: best.anime_list,
            };
        }

        // No episode-level evidence: fall back to synonym season markers,
        // then to the first mapping.
        for mapping in filtered {
            if let Some(details) = self.details_for(mapping) {
                if synonyms_mention_season(&details.synonyms, season) {
                    return Selection {
                        details: Some(details),
                        mapping: Some(Arc::clone(mapping)),
                        anime_list: None,
                    };
                }
            }
        }

        Selection {
            details: self.details_for(&filtered[0]),
            mapping: Some(Arc::clone(&filtered[0])),
            anime_list: None,
        }
    }

    /// AnimeList-backed candidates. With `use_tmdb` unset the entry must be
    /// reachable by TVDB id and cover the season via `defaulttvdbseason`
    /// (`a` covers everything); with it set, the TMDB default season/offset
    /// is used instead.
    #[allow(clippy::too_many_arguments)]
    fn anime_list_candidates(
        &self,
        filtered: &[Arc<MappingEntry>],
        source: IdSource,
        value: &str,
        season: u32,
        episode: u32,
        snapshot: &AnimeListIndex,
        use_tmdb: bool,
    ) -> Vec<Candidate> {
        let mut candidates = Vec::new();

        if use_tmdb {
            for mapping in filtered {
                let Some(anidb_id) = mapping.anidb_id else {
                    continue;
                };
                let Some(entry) = snapshot.by_anidb.get(&anidb_id) else {
                    continue;
                };
                let from_episode = entry.tmdb_offset.unwrap_or(0) + 1;
                if entry.tmdb_season == Some(season as i32) && episode >= from_episode {
                    candidates.push(Candidate {
                        mapping: Arc::clone(mapping),
                        anime_list: Some(Arc::clone(entry)),
                        from_episode,
                    });
                }
            }
            return candidates;
        }

        // Collect every TVDB id the query can reach: directly, or through
        // the cross-referenced mappings (this covers the IMDb → TVDB hop).
        let mut tvdb_ids: Vec<u64> = Vec::new();
        if source == IdSource::Tvdb {
            if let Ok(id) = value.parse() {
                tvdb_ids.push(id);
            }
        }
        for mapping in filtered {
            if let Some(id) = mapping.thetvdb_id {
                if !tvdb_ids.contains(&id) {
                    tvdb_ids.push(id);
                }
            }
        }

        for tvdb_id in tvdb_ids {
            let Some(entries) = snapshot.by_tvdb.get(&tvdb_id) else {
                continue;
            };
            for entry in entries {
                let Some(default_season) = entry.default_tvdb_season else {
                    continue;
                };
                let from_episode = entry.episode_offset.unwrap_or(0) + 1;
                if default_season.covers(season) && episode >= from_episode {
                    let mapping = filtered
                        .iter()
                        .find(|m| m.anidb_id == Some(entry.anidb_id))
                        .unwrap_or(&filtered[0]);
                    candidates.push(Candidate {
                        mapping: Arc::clone(mapping),
                        anime_list: Some(Arc::clone(entry)),
                        from_episode,
                    });
                }
            }
        }
        candidates
    }

    /// Details for a mapping: scan its ids in order, first hit wins.
    fn details_for(&self, mapping: &MappingEntry) -> Option<Arc<AnimeDetails>> {
        let details = self.details_snapshot();
        for (source, id) in mapping.ids() {
            if let Some(found) = details.get(&source).and_then(|by_id| lookup(by_id, &id)) {
                return Some(Arc::clone(found));
            }
        }
        None
    }
}

/// Prefer mappings whose type matches the request shape: no season → MOVIE,
/// season 0 → specials, otherwise TV. UNKNOWN is always kept, and an
/// emptied list falls back to the unfiltered one.
fn season_type_filter(
    candidates: &[Arc<MappingEntry>],
    season: Option<u32>,
) -> Vec<Arc<MappingEntry>> {
    if candidates.is_empty() {
        return Vec::new();
    }
    let keep = |kind: AnimeKind| -> bool {
        if kind == AnimeKind::Unknown {
            return true;
        }
        match season {
            None => kind == AnimeKind::Movie,
            Some(0) => matches!(kind, AnimeKind::Special | AnimeKind::Ova | AnimeKind::Ona),
            Some(_) => kind == AnimeKind::Tv,
        }
    };

    let filtered: Vec<_> = candidates
        .iter()
        .filter(|m| keep(m.kind))
        .cloned()
        .collect();
    if filtered.is_empty() {
        candidates.to_vec()
    } else {
        filtered
    }
}

/// When the queried source *is* the co-indexed catalog, its value addresses
/// that index directly.
fn direct_id(queried: IdSource, wanted: IdSource, value: &str) -> Option<u64> {
    (queried == wanted).then(|| value.parse().ok()).flatten()
}

static SEASON_SYNONYM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)season[\s_-]*(\d+)").unwrap());

fn synonyms_mention_season(synonyms: &[String], season: u32) -> bool {
    synonyms.iter().any(|synonym| {
        SEASON_SYNONYM
            .captures(synonym)
            .and_then(|captures| captures[1].parse::<u32>().ok())
            == Some(season)
    })
}

/// Layered merge. Precedence per field:
/// - imdb id: mapping → anime-list → kitsu → anitrakt
/// - tvdb id: anime-list → kitsu → mapping → anitrakt
/// - tmdb id: mapping → anime-list → anitrakt
/// - trakt id: mapping → anitrakt
///
/// Season projections take the mapping's per-catalog overrides first, then
/// the anime-list defaults; `from_episode` is `offset + 1` when an offset
/// exists. Kitsu supplies the imdb block, Anitrakt the trakt block and the
/// season externals, Kitsu the fanart logo.
fn build_entry(
    mapping: Option<&MappingEntry>,
    details: Option<&AnimeDetails>,
    kitsu: Option<&KitsuImdbEntry>,
    anitrakt: Option<&AnitraktEntry>,
    anime_list: Option<&AnimeListEntry>,
) -> AnimeEntry {
    let mut entry = AnimeEntry {
        kind: mapping.map(|m| m.kind).unwrap_or_default(),
        ..Default::default()
    };

    if let Some(details) = details {
        entry.title = Some(details.title.clone());
        entry.synonyms = details.synonyms.clone();
        entry.anime_season = Some(details.anime_season);
    }

    entry.imdb_id = mapping
        .and_then(|m| m.imdb_id.clone())
        .or_else(|| anime_list.and_then(|al| al.imdb_id.clone()))
        .or_else(|| kitsu.and_then(|k| k.imdb_id.clone()))
        .or_else(|| anitrakt.and_then(|at| at.externals.imdb.clone()));

    entry.tvdb_id = anime_list
        .and_then(|al| al.tvdb_id)
        .or_else(|| kitsu.and_then(|k| k.tvdb_id))
        .or_else(|| mapping.and_then(|m| m.thetvdb_id))
        .or_else(|| anitrakt.and_then(|at| at.externals.tvdb));

    entry.tmdb_id = mapping
        .and_then(|m| m.themoviedb_id)
        .or_else(|| anime_list.and_then(|al| al.tmdb_id))
        .or_else(|| anitrakt.and_then(|at| at.externals.tmdb));

    entry.trakt_id = mapping
        .and_then(|m| m.trakt_id)
        .or_else(|| anitrakt.map(|at| at.trakt.id));

    entry.mal_id = mapping
        .and_then(|m| m.mal_id)
        .or_else(|| anitrakt.map(|at| at.mal_id));
    entry.kitsu_id = mapping.and_then(|m| m.kitsu_id).or(kitsu.map(|k| k.kitsu_id));
    entry.anilist_id = mapping.and_then(|m| m.anilist_id);
    entry.anidb_id = mapping
        .and_then(|m| m.anidb_id)
        .or_else(|| anime_list.map(|al| al.anidb_id));

    // TVDB projection: mapping override first, then anime-list defaults.
    entry.tvdb = SeasonProjection {
        season_number: mapping.and_then(|m| m.tvdb_season).or_else(|| {
            anime_list.and_then(|al| match al.default_tvdb_season {
                Some(crate::models::TvdbSeason::Number(n)) => Some(n),
                _ => None,
            })
        }),
        season_id: anitrakt
            .and_then(|at| at.trakt.season.as_ref())
            .and_then(|s| s.externals.tvdb),
        from_episode: anime_list
            .and_then(|al| al.episode_offset)
            .map(|offset| offset + 1),
    };

    entry.tmdb = SeasonProjection {
        season_number: mapping
            .and_then(|m| m.tmdb_season)
            .or_else(|| anime_list.and_then(|al| al.tmdb_season)),
        season_id: anitrakt
            .and_then(|at| at.trakt.season.as_ref())
            .and_then(|s| s.externals.tmdb),
        from_episode: anime_list
            .and_then(|al| al.tmdb_offset)
            .map(|offset| offset + 1),
    };

    if let Some(kitsu) = kitsu {
        entry.imdb = Some(ImdbProjection {
            season_number: kitsu.from_season,
            from_episode: kitsu.from_episode,
            non_imdb_episodes: kitsu.non_imdb_episodes.clone(),
            title: kitsu.title.clone(),
        });
        entry.fanart = kitsu
            .fanart_logo_id
            .map(|logo_id| FanartProjection { logo_id });
    }

    if let Some(anitrakt) = anitrakt {
        entry.trakt = Some(TraktProjection {
            title: anitrakt.trakt.title.clone(),
            slug: anitrakt.trakt.slug.clone(),
            is_split_cour: anitrakt.trakt.is_split_cour,
            season_id: anitrakt.trakt.season.as_ref().map(|s| s.id),
            season_number: anitrakt.trakt.season.as_ref().map(|s| s.number),
        });
    }

    if let Some(anime_list) = anime_list {
        entry.episode_mappings = anime_list.mappings.clone();
    }

    entry
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TvdbSeason;
    use crate::{AnimeDatabase, KitsuImdbEntry, MappingEntry, OfflineTitle};

    fn tv_mapping(kitsu_id: u64, extra: impl FnOnce(&mut MappingEntry)) -> MappingEntry {
        let mut mapping = MappingEntry {
            kitsu_id: Some(kitsu_id),
            kind: AnimeKind::Tv,
            ..Default::default()
        };
        extra(&mut mapping);
        mapping
    }

    #[test]
    fn season_filter_prefers_request_shape() {
        let movie = Arc::new(MappingEntry {
            kind: AnimeKind::Movie,
            ..Default::default()
        });
        let tv = Arc::new(MappingEntry {
            kind: AnimeKind::Tv,
            ..Default::default()
        });
        let special = Arc::new(MappingEntry {
            kind: AnimeKind::Special,
            ..Default::default()
        });
        let unknown = Arc::new(MappingEntry::default());
        let all = vec![movie, tv, special, unknown];

        let kinds = |season| {
            season_type_filter(&all, season)
                .iter()
                .map(|m| m.kind)
                .collect::<Vec<_>>()
        };

        assert_eq!(kinds(None), vec![AnimeKind::Movie, AnimeKind::Unknown]);
        assert_eq!(kinds(Some(0)), vec![AnimeKind::Special, AnimeKind::Unknown]);
        assert_eq!(kinds(Some(1)), vec![AnimeKind::Tv, AnimeKind::Unknown]);
    }

    #[test]
    fn season_filter_falls_back_when_emptied() {
        let tv = Arc::new(MappingEntry {
            kind: AnimeKind::Tv,
            ..Default::default()
        });
        let all = vec![tv];
        // A movie-shaped request over a TV-only list keeps the list.
        assert_eq!(season_type_filter(&all, None).len(), 1);
    }

    #[test]
    fn kitsu_tie_break_picks_highest_from_episode() {
        // kitsu:7936, season 2 episode 5. Two ambiguous
        // mappings; the season-2 kitsu record must win.
        let db = AnimeDatabase::builder()
            .mappings(vec![
                tv_mapping(7936, |m| m.mal_id = Some(136)),
                tv_mapping(11111, |m| m.mal_id = Some(137)),
            ])
            .kitsu(vec![
                KitsuImdbEntry {
                    kitsu_id: 7936,
                    from_season: Some(1),
                    from_episode: Some(1),
                    imdb_id: Some("tt1000001".into()),
                    ..Default::default()
                },
                KitsuImdbEntry {
                    kitsu_id: 11111,
                    from_season: Some(2),
                    from_episode: Some(1),
                    imdb_id: Some("tt1000001".into()),
                    ..Default::default()
                },
            ])
            .build();

        // Both mappings share the enriched imdb id, so an imdb query is
        // ambiguous; season/episode disambiguates.
        let entry = db
            .get_entry(IdSource::Imdb, "tt1000001", Some(2), Some(5))
            .unwrap();
        assert_eq!(entry.kitsu_id, Some(11111));
        assert_eq!(entry.imdb.as_ref().unwrap().season_number, Some(2));
    }

    #[test]
    fn kitsu_candidate_requires_episode_at_or_past_from_episode() {
        let db = AnimeDatabase::builder()
            .mappings(vec![tv_mapping(1, |_| {}), tv_mapping(2, |_| {})])
            .kitsu(vec![
                KitsuImdbEntry {
                    kitsu_id: 1,
                    from_season: Some(1),
                    from_episode: Some(1),
                    imdb_id: Some("tt2000001".into()),
                    ..Default::default()
                },
                // Second cour starts at episode 14; a request for episode 5
                // must not pick it.
                KitsuImdbEntry {
                    kitsu_id: 2,
                    from_season: Some(1),
                    from_episode: Some(14),
                    imdb_id: Some("tt2000001".into()),
                    ..Default::default()
                },
            ])
            .build();

        let entry = db
            .get_entry(IdSource::Imdb, "tt2000001", Some(1), Some(5))
            .unwrap();
        assert_eq!(entry.kitsu_id, Some(1));

        let entry = db
            .get_entry(IdSource::Imdb, "tt2000001", Some(1), Some(20))
            .unwrap();
        assert_eq!(entry.kitsu_id, Some(2));
    }

    #[test]
    fn absolute_default_season_covers_any_season() {
        let db = AnimeDatabase::builder()
            .mappings(vec![
                tv_mapping(1, |m| {
                    m.anidb_id = Some(100);
                    m.thetvdb_id = Some(500);
                }),
                tv_mapping(2, |m| {
                    m.anidb_id = Some(101);
                    m.thetvdb_id = Some(500);
                }),
            ])
            .anime_list(vec![
                AnimeListEntry {
                    anidb_id: 100,
                    tvdb_id: Some(500),
                    default_tvdb_season: Some(TvdbSeason::Number(1)),
                    episode_offset: None,
                    ..Default::default()
                },
                AnimeListEntry {
                    anidb_id: 101,
                    tvdb_id: Some(500),
                    default_tvdb_season: Some(TvdbSeason::Absolute),
                    episode_offset: Some(26),
                    ..Default::default()
                },
            ])
            .build();

        // Season 4 episode 30: only the absolute entry covers it, and its
        // offset qualifies (30 >= 27).
        let entry = db
            .get_entry(IdSource::Tvdb, "500", Some(4), Some(30))
            .unwrap();
        assert_eq!(entry.anidb_id, Some(101));
        assert_eq!(entry.tvdb.from_episode, Some(27));
    }

    #[test]
    fn synonym_fallback_selects_seasoned_mapping() {
        let db = AnimeDatabase::builder()
            .mappings(vec![
                tv_mapping(1, |m| m.mal_id = Some(300)),
                tv_mapping(2, |m| m.mal_id = Some(300)),
            ])
            .details(vec![
                OfflineTitle {
                    ids: vec![(IdSource::Kitsu, "1".into())],
                    details: AnimeDetails {
                        title: "Some Show".into(),
                        ..Default::default()
                    },
                },
                OfflineTitle {
                    ids: vec![(IdSource::Kitsu, "2".into())],
                    details: AnimeDetails {
                        title: "Some Show 2nd".into(),
                        synonyms: vec!["Some Show Season 2".into()],
                        ..Default::default()
                    },
                },
            ])
            .build();

        let entry = db
            .get_entry(IdSource::Mal, "300", Some(2), Some(3))
            .unwrap();
        assert_eq!(entry.kitsu_id, Some(2));
        assert_eq!(entry.title.as_deref(), Some("Some Show 2nd"));
    }

    #[test]
    fn unknown_id_returns_none() {
        let db = AnimeDatabase::builder().build();
        assert!(db.get_entry(IdSource::Mal, "999999", None, None).is_none());
    }

    #[test]
    fn movie_entry_layering_precedence() {
        let db = AnimeDatabase::builder()
            .mappings(vec![MappingEntry {
                kind: AnimeKind::Movie,
                mal_id: Some(199),
                kitsu_id: Some(42),
                imdb_id: Some("tt3000001".into()),
                themoviedb_id: Some(7777),
                ..Default::default()
            }])
            .kitsu(vec![KitsuImdbEntry {
                kitsu_id: 42,
                imdb_id: Some("tt9999999".into()),
                tvdb_id: Some(123),
                fanart_logo_id: Some(55),
                ..Default::default()
            }])
            .anitrakt_movies(vec![AnitraktEntry {
                mal_id: 199,
                trakt: crate::TraktInfo {
                    id: 88,
                    slug: "some-movie".into(),
                    title: "Some Movie".into(),
                    ..Default::default()
                },
                externals: crate::Externals {
                    tmdb: Some(1111),
                    ..Default::default()
                },
                ..Default::default()
            }])
            .build();

        let entry = db.get_entry(IdSource::Mal, "199", None, None).unwrap();
        // Mapping beats kitsu for imdb, mapping beats anitrakt for tmdb.
        assert_eq!(entry.imdb_id.as_deref(), Some("tt3000001"));
        assert_eq!(entry.tmdb_id, Some(7777));
        // No mapping/anime-list tvdb: kitsu supplies it.
        assert_eq!(entry.tvdb_id, Some(123));
        // No mapping trakt id: anitrakt supplies it.
        assert_eq!(entry.trakt_id, Some(88));
        assert_eq!(entry.trakt.as_ref().unwrap().slug, "some-movie");
        assert_eq!(entry.fanart.as_ref().unwrap().logo_id, 55);
    }

    #[test]
    fn from_episode_is_offset_plus_one() {
        let db = AnimeDatabase::builder()
            .mappings(vec![tv_mapping(1, |m| {
                m.anidb_id = Some(700);
                m.thetvdb_id = Some(900);
            })])
            .anime_list(vec![AnimeListEntry {
                anidb_id: 700,
                tvdb_id: Some(900),
                default_tvdb_season: Some(TvdbSeason::Number(1)),
                episode_offset: Some(12),
                tmdb_id: Some(31911),
                tmdb_offset: Some(12),
                ..Default::default()
            }])
            .build();

        let entry = db.get_entry(IdSource::Kitsu, "1", Some(1), None).unwrap();
        assert_eq!(entry.tvdb.from_episode, Some(13));
        assert_eq!(entry.tmdb.from_episode, Some(13));

        // No offset → no from_episode.
        let db = AnimeDatabase::builder()
            .mappings(vec![tv_mapping(2, |m| m.anidb_id = Some(701))])
            .anime_list(vec![AnimeListEntry {
                anidb_id: 701,
                default_tvdb_season: Some(TvdbSeason::Number(1)),
                ..Default::default()
            }])
            .build();
        let entry = db.get_entry(IdSource::Kitsu, "2", Some(1), None).unwrap();
        assert_eq!(entry.tvdb.from_episode, None);
    }
}
