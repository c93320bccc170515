//! Per-request stream context.
//!
//! Construction is synchronous: parse the id, consult the anime database,
//! enrich the parsed id. Everything remote (catalog metadata, release
//! dates, episode air date, SeaDex) lives in guarded one-shot slots: the
//! first consumer pays the fetch, concurrent consumers await the same
//! in-flight future, and a failed fetch memoizes `None` with a logged
//! warning. Per-slot failures never fail the request.

use std::sync::Arc;
use std::time::Duration;

use animedb::{enrich_parsed_id, AnimeDatabase, AnimeEntry};
use cache::CacheService;
use chrono::NaiveDate;
use idparse::{IdSource, MediaKind, ParsedId};
use metadata::{language_name, MediaMetadata, MetadataProvider, ReleaseDates};
use model::UserData;
use seadex::{SeadexInfo, SeadexSource};
use serde_json::{json, Value};
use tokio::sync::OnceCell;

const METADATA_TTL: Duration = Duration::from_secs(6 * 60 * 60);
const RELEASE_DATES_TTL: Duration = Duration::from_secs(6 * 60 * 60);
const AIR_DATE_TTL: Duration = Duration::from_secs(6 * 60 * 60);
const SEADEX_TTL: Duration = Duration::from_secs(12 * 60 * 60);

/// Context fields a user expression may reference; any expression mentioning
/// one of these forces the metadata fetch.
const METADATA_FIELDS: &[&str] = &[
    "title",
    "titles",
    "year",
    "yearEnd",
    "genres",
    "runtime",
    "originalLanguage",
    "daysSinceRelease",
    "absoluteEpisode",
];

/// Shared services a context draws on.
#[derive(Clone)]
pub struct ContextServices {
    pub db: Arc<AnimeDatabase>,
    pub metadata: Arc<dyn MetadataProvider>,
    pub seadex: Arc<dyn SeadexSource>,
    pub cache: Arc<CacheService>,
}

pub struct StreamContext {
    services: ContextServices,
    kind: MediaKind,
    id: String,
    user_data: UserData,

    parsed: Option<ParsedId>,
    is_anime: bool,
    anime_entry: Option<AnimeEntry>,

    tmdb_id: OnceCell<Option<u64>>,
    metadata: OnceCell<Option<MediaMetadata>>,
    release_dates: OnceCell<Option<ReleaseDates>>,
    episode_air_date: OnceCell<Option<NaiveDate>>,
    seadex_info: OnceCell<Option<SeadexInfo>>,
}

impl StreamContext {
    /// Synchronous construction: id parsing, anime resolution, enrichment.
    pub fn new(kind: MediaKind, id: &str, user_data: UserData, services: ContextServices) -> Self {
        let mut parsed = idparse::parse(id, kind);
        if parsed.is_none() {
            tracing::warn!("unparseable media id {:?}", id);
        }

        let anime_entry = parsed.as_ref().and_then(|p| {
            services
                .db
                .get_entry(p.source, &p.value, p.season, p.episode)
        });
        let is_anime = anime_entry.is_some();

        if let (Some(parsed), Some(entry)) = (parsed.as_mut(), anime_entry.as_ref()) {
            enrich_parsed_id(parsed, entry);
        }

        Self {
            services,
            kind,
            id: id.to_string(),
            user_data,
            parsed,
            is_anime,
            anime_entry,
            tmdb_id: OnceCell::new(),
            metadata: OnceCell::new(),
            release_dates: OnceCell::new(),
            episode_air_date: OnceCell::new(),
            seadex_info: OnceCell::new(),
        }
    }

    pub fn kind(&self) -> MediaKind {
        self.kind
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn user_data(&self) -> &UserData {
        &self.user_data
    }

    pub fn is_anime(&self) -> bool {
        self.is_anime
    }

    pub fn anime_entry(&self) -> Option<&AnimeEntry> {
        self.anime_entry.as_ref()
    }

    pub fn parsed_id(&self) -> Option<&ParsedId> {
        self.parsed.as_ref()
    }

    pub fn season(&self) -> Option<u32> {
        self.parsed.as_ref().and_then(|p| p.season)
    }

    pub fn episode(&self) -> Option<u32> {
        self.parsed.as_ref().and_then(|p| p.episode)
    }

    /// `anime.movie` / `anime.series` for anime, the raw type otherwise.
    pub fn query_type(&self) -> String {
        if self.is_anime {
            format!("anime.{}", self.kind)
        } else {
            self.kind.to_string()
        }
    }

    /// Whether anything in the user's configuration needs catalog metadata.
    pub fn needs_metadata(&self) -> bool {
        let data = &self.user_data;
        data.title_matching.enabled
            || data.year_matching.enabled
            || data.season_episode_matching.enabled
            || data.digital_release_filter.enabled
            || self.expressions_reference_metadata()
    }

    fn expressions_reference_metadata(&self) -> bool {
        let data = &self.user_data;
        let all = data
            .preferred_stream_expressions
            .iter()
            .chain(&data.included_stream_expressions)
            .chain(&data.required_stream_expressions)
            .chain(&data.excluded_stream_expressions)
            .chain(data.ranked_stream_expressions.iter().map(|r| &r.expression));
        all.into_iter()
            .any(|source| METADATA_FIELDS.iter().any(|field| source.contains(field)))
    }

    fn seadex_enabled(&self) -> bool {
        self.is_anime
            && self.user_data.enable_seadex != Some(false)
            && self
                .anime_entry
                .as_ref()
                .and_then(|entry| entry.anilist_id)
                .is_some()
    }

    // --- async slots -------------------------------------------------------

    /// Kick off every fetch this request is eligible for, without awaiting.
    pub fn start_all(self: Arc<Self>) {
        Arc::clone(&self).start_metadata_fetch();
        Arc::clone(&self).start_release_dates_fetch();
        Arc::clone(&self).start_episode_air_date_fetch();
        self.start_seadex_fetch();
    }

    pub fn start_metadata_fetch(self: Arc<Self>) {
        tokio::spawn(async move {
            self.get_metadata().await;
        });
    }

    pub fn start_release_dates_fetch(self: Arc<Self>) {
        tokio::spawn(async move {
            self.get_release_dates().await;
        });
    }

    pub fn start_episode_air_date_fetch(self: Arc<Self>) {
        tokio::spawn(async move {
            self.get_episode_air_date().await;
        });
    }

    pub fn start_seadex_fetch(self: Arc<Self>) {
        tokio::spawn(async move {
            self.get_seadex().await;
        });
    }

    /// The request's TMDB id: straight from a `tmdb:` id, else from the
    /// anime entry, else via the catalog's external-id lookup.
    pub async fn get_tmdb_id(&self) -> Option<u64> {
        *self
            .tmdb_id
            .get_or_init(|| async {
                if let Some(parsed) = &self.parsed {
                    if parsed.source == IdSource::Tmdb {
                        if let Ok(id) = parsed.value.parse() {
                            return Some(id);
                        }
                    }
                }
                if let Some(id) = self.anime_entry.as_ref().and_then(|entry| entry.tmdb_id) {
                    return Some(id);
                }

                let parsed = self.parsed.as_ref()?;
                // Anime entries may have resolved the id to IMDb even when
                // the query came from an anime catalog.
                let (source, value) = match parsed.source {
                    IdSource::Imdb | IdSource::Tvdb => (parsed.source, parsed.value.clone()),
                    _ => {
                        let imdb = self
                            .anime_entry
                            .as_ref()
                            .and_then(|entry| entry.imdb_id.clone())?;
                        (IdSource::Imdb, imdb)
                    }
                };
                match self
                    .services
                    .metadata
                    .find_tmdb_id(self.kind, source, &value)
                    .await
                {
                    Ok(id) => id,
                    Err(e) => {
                        tracing::warn!("tmdb id lookup failed for {}: {}", self.id, e);
                        None
                    }
                }
            })
            .await
    }

    pub async fn get_metadata(&self) -> Option<MediaMetadata> {
        self.metadata
            .get_or_init(|| async {
                if !self.needs_metadata() {
                    return None;
                }
                let tmdb_id = self.get_tmdb_id().await?;
                let key = format!("metadata:{}:{}", self.kind, tmdb_id);
                let result = self
                    .services
                    .cache
                    .get_or_fetch(&key, METADATA_TTL, || async {
                        self.services.metadata.get_metadata(self.kind, tmdb_id).await
                    })
                    .await;
                match result {
                    Ok(metadata) => metadata,
                    Err(e) => {
                        tracing::warn!("metadata fetch failed for {}: {}", self.id, e);
                        None
                    }
                }
            })
            .await
            .clone()
    }

    /// Movie only.
    pub async fn get_release_dates(&self) -> Option<ReleaseDates> {
        *self
            .release_dates
            .get_or_init(|| async {
                if self.kind != MediaKind::Movie {
                    return None;
                }
                let tmdb_id = self.get_tmdb_id().await?;
                let key = format!("releases:{tmdb_id}");
                let result = self
                    .services
                    .cache
                    .get_or_fetch(&key, RELEASE_DATES_TTL, || async {
                        self.services.metadata.get_release_dates(tmdb_id).await
                    })
                    .await;
                match result {
                    Ok(dates) => dates,
                    Err(e) => {
                        tracing::warn!("release dates fetch failed for {}: {}", self.id, e);
                        None
                    }
                }
            })
            .await
    }

    /// Series only; needs season and episode coordinates.
    pub async fn get_episode_air_date(&self) -> Option<NaiveDate> {
        *self
            .episode_air_date
            .get_or_init(|| async {
                if self.kind == MediaKind::Movie {
                    return None;
                }
                let (season, episode) = match (self.season(), self.episode()) {
                    (Some(season), Some(episode)) => (season, episode),
                    _ => return None,
                };
                let tmdb_id = self.get_tmdb_id().await?;
                let key = format!("airdate:{tmdb_id}:{season}:{episode}");
                let result = self
                    .services
                    .cache
                    .get_or_fetch(&key, AIR_DATE_TTL, || async {
                        self.services
                            .metadata
                            .get_episode_air_date(tmdb_id, season, episode)
                            .await
                    })
                    .await;
                match result {
                    Ok(date) => date,
                    Err(e) => {
                        tracing::warn!("air date fetch failed for {}: {}", self.id, e);
                        None
                    }
                }
            })
            .await
    }

    /// Anime only; gated by `enableSeadex` and a resolved AniList id.
    pub async fn get_seadex(&self) -> Option<SeadexInfo> {
        self.seadex_info
            .get_or_init(|| async {
                if !self.seadex_enabled() {
                    return None;
                }
                let anilist_id = self.anime_entry.as_ref()?.anilist_id?;
                let key = format!("seadex:{anilist_id}");
                let result = self
                    .services
                    .cache
                    .get_or_fetch(&key, SEADEX_TTL, || async {
                        self.services.seadex.get_info_hashes(anilist_id).await
                    })
                    .await;
                match result {
                    Ok(info) => Some(info),
                    Err(e) => {
                        tracing::warn!("seadex fetch failed for {}: {}", self.id, e);
                        None
                    }
                }
            })
            .await
            .clone()
    }

    // --- expression view ---------------------------------------------------

    /// Absolute episode number: episodes of all prior seasons plus the
    /// requested episode, shifted past the entry's non-IMDb episodes.
    fn absolute_episode(&self, metadata: Option<&MediaMetadata>) -> Option<u32> {
        if !self.is_anime {
            return None;
        }
        let (season, episode) = match (self.season(), self.episode()) {
            (Some(season), Some(episode)) => (season, episode),
            _ => return None,
        };
        let seasons = &metadata?.seasons;
        if seasons.is_empty() {
            return None;
        }

        let mut absolute: u32 = seasons
            .iter()
            .filter(|s| s.number != 0 && s.number < season)
            .map(|s| s.episode_count)
            .sum();
        absolute += episode;

        if let Some(imdb) = self.anime_entry.as_ref().and_then(|e| e.imdb.as_ref()) {
            let mut skipped: Vec<u32> = imdb.non_imdb_episodes.clone();
            skipped.sort_unstable();
            for skip in skipped {
                if skip < absolute {
                    absolute += 1;
                }
            }
        }
        Some(absolute)
    }

    /// Flat read-only view of the request for the expression engine.
    ///
    /// Slots that never started resolve here; gated-off slots come back
    /// `None` immediately, so this never fetches more than the request is
    /// eligible for.
    pub async fn expression_context(&self) -> Value {
        let metadata = self.get_metadata().await;
        let release_dates = self.get_release_dates().await;
        let air_date = self.get_episode_air_date().await;
        let seadex = self.get_seadex().await;

        let release_reference = if self.kind == MediaKind::Movie {
            metadata
                .as_ref()
                .and_then(|m| m.release_date)
                .or_else(|| release_dates.and_then(|d| d.earliest_home_release()))
        } else {
            air_date
        };
        let days_since_release = release_reference
            .map(|date| (chrono::Utc::now().date_naive() - date).num_days());

        let original_language = metadata
            .as_ref()
            .and_then(|m| m.original_language.as_deref())
            .map(|code| language_name(code).unwrap_or(code).to_string());

        let entry = self.anime_entry.as_ref();

        json!({
            "type": self.kind.to_string(),
            "id": self.id,
            "isAnime": self.is_anime,
            "queryType": self.query_type(),
            "season": self.season(),
            "episode": self.episode(),
            "title": metadata.as_ref().map(|m| m.title.clone()),
            "titles": metadata.as_ref().map(|m| m.all_titles()),
            "year": metadata.as_ref().and_then(|m| m.year),
            "yearEnd": metadata.as_ref().and_then(|m| m.year_end),
            "genres": metadata.as_ref().map(|m| m.genres.clone()),
            "runtime": metadata.as_ref().and_then(|m| m.runtime),
            "originalLanguage": original_language,
            "daysSinceRelease": days_since_release,
            "absoluteEpisode": self.absolute_episode(metadata.as_ref()),
            "anilistId": entry.and_then(|e| e.anilist_id),
            "malId": entry.and_then(|e| e.mal_id),
            "hasSeaDex": seadex.map(|info| !info.is_empty()).unwrap_or(false),
        })
    }
}
