//! Anime Identity Database.
//!
//! Cross-references heterogeneous anime catalogs (MAL, Kitsu, AniDB,
//! AniList, TVDB, TMDB, IMDb, Trakt, …) and resolves any supported id,
//! optionally with season/episode coordinates, into a canonical
//! [`AnimeEntry`] carrying every known external id plus per-catalog
//! season/offset projections.
//!
//! Six corpora are kept fresh on disk with an ETag-conditional download
//! protocol and loaded into in-memory indices that are replaced by atomic
//! `Arc` swap; readers never observe a half-built structure. Lookups are
//! synchronous and allocation-light.
//!
//! ```ignore
//! let config = DatabaseConfig::from_env("./data");
//! let db = AnimeDatabase::new(config)?;
//! let scheduler = Arc::clone(&db).init().await; // initial refresh + timers
//!
//! let entry = db.get_entry(IdSource::Kitsu, "7936", Some(2), Some(5));
//! scheduler.shutdown();
//! ```
//!
//! Tests inject fixtures through [`AnimeDatabase::builder`], which skips
//! disk and HTTP entirely.

mod builder;
mod config;
mod enrich;
mod error;
mod index;
mod loaders;
mod lookup;
mod models;
mod refresh;
mod sources;

pub use builder::AnimeDatabaseBuilder;
pub use config::{DatabaseConfig, LevelOfDetail};
pub use enrich::enrich_parsed_id;
pub use error::{AnimeDbError, Result};
pub use loaders::OfflineTitle;
pub use models::{
    AnimeDetails, AnimeEntry, AnimeKind, AnimeListEntry, AnimeListMapping, AnimeSeason,
    AnitraktEntry, Externals, FanartProjection, ImdbProjection, KitsuImdbEntry, MappingEntry,
    SeasonName, SeasonProjection, TraktInfo, TraktProjection, TraktSeason, TvdbSeason,
};
pub use refresh::RefreshScheduler;
pub use sources::SourceKind;

use std::sync::Arc;

use idparse::MediaKind;
use parking_lot::RwLock;

use index::{
    build_anime_list_index, build_anitrakt_index, build_details_index, build_kitsu_index,
    build_mapping_index, AnimeListIndex, AnitraktIndex, DetailsIndex, KitsuIndex, MappingIndex,
};

pub struct AnimeDatabase {
    config: DatabaseConfig,
    client: reqwest::Client,

    // Raw cross-reference corpus, retained so the mapping index can be
    // rebuilt with enrichment whenever the kitsu corpus changes.
    raw_mappings: RwLock<Arc<Vec<MappingEntry>>>,

    mappings: RwLock<Arc<MappingIndex>>,
    details: RwLock<Arc<DetailsIndex>>,
    kitsu: RwLock<Arc<KitsuIndex>>,
    anitrakt_movies: RwLock<Arc<AnitraktIndex>>,
    anitrakt_tv: RwLock<Arc<AnitraktIndex>>,
    anime_list: RwLock<Arc<AnimeListIndex>>,
}

impl AnimeDatabase {
    /// Create a database over the given config. Fails only when the data
    /// directory cannot be created or written, the one fatal startup error.
    pub fn new(config: DatabaseConfig) -> Result<Arc<Self>> {
        if config.detail != LevelOfDetail::None {
            let dir = config.database_dir();
            std::fs::create_dir_all(&dir)
                .map_err(|e| AnimeDbError::DataDir(format!("{}: {}", dir.display(), e)))?;
            let probe = dir.join(".write-probe");
            std::fs::write(&probe, b"")
                .map_err(|e| AnimeDbError::DataDir(format!("{}: {}", dir.display(), e)))?;
            let _ = std::fs::remove_file(&probe);
        }

        Ok(Arc::new(Self::empty(config)))
    }

    pub fn builder() -> AnimeDatabaseBuilder {
        AnimeDatabaseBuilder::new()
    }

    pub(crate) fn empty(config: DatabaseConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
            raw_mappings: RwLock::new(Arc::new(Vec::new())),
            mappings: RwLock::new(Arc::new(MappingIndex::new())),
            details: RwLock::new(Arc::new(DetailsIndex::new())),
            kitsu: RwLock::new(Arc::new(KitsuIndex::new())),
            anitrakt_movies: RwLock::new(Arc::new(AnitraktIndex::new())),
            anitrakt_tv: RwLock::new(Arc::new(AnitraktIndex::new())),
            anime_list: RwLock::new(Arc::new(AnimeListIndex::default())),
        }
    }

    pub fn config(&self) -> &DatabaseConfig {
        &self.config
    }

    pub(crate) fn http_client(&self) -> &reqwest::Client {
        &self.client
    }

    /// Run the initial refresh of every source concurrently (failures are
    /// logged, never fatal) and start the per-source refresh timers.
    ///
    /// At `LevelOfDetail::None` this is a no-op returning an idle scheduler.
    pub async fn init(self: Arc<Self>) -> RefreshScheduler {
        if self.config.detail == LevelOfDetail::None {
            tracing::info!("anime database disabled (level of detail = none)");
            return RefreshScheduler::idle();
        }

        let initial = SourceKind::ALL.map(|kind| {
            let db = Arc::clone(&self);
            async move {
                if let Err(e) = refresh::refresh_source_with_retry(&db, kind).await {
                    tracing::error!("[{}] initial refresh failed: {}", kind.name(), e);
                }
            }
        });
        futures::future::join_all(initial).await;

        RefreshScheduler::start(self)
    }

    /// Whether an opaque id resolves to a known anime.
    pub fn is_anime(&self, id: &str) -> bool {
        match idparse::parse(id, MediaKind::Unknown) {
            Some(parsed) => self
                .get_entry(
                    parsed.source,
                    &parsed.value,
                    parsed.season,
                    parsed.episode,
                )
                .is_some(),
            None => false,
        }
    }

    // --- corpus installation (build new maps, then atomic swap) -----------

    pub(crate) fn install_mappings(&self, entries: Vec<MappingEntry>) {
        let raw = Arc::new(entries);
        let index = Arc::new(build_mapping_index(&raw, &self.kitsu_snapshot()));
        *self.raw_mappings.write() = raw;
        *self.mappings.write() = index;
    }

    pub(crate) fn install_offline(&self, titles: Vec<OfflineTitle>) {
        let index = Arc::new(build_details_index(&titles));
        *self.details.write() = index;
    }

    pub(crate) fn install_kitsu(&self, entries: Vec<KitsuImdbEntry>) {
        let kitsu = Arc::new(build_kitsu_index(entries));
        // Rebuilding (not mutating) the published mapping snapshot keeps
        // readers on a consistent index while enrichment is applied.
        let raw = self.raw_mappings.read().clone();
        let mappings = Arc::new(build_mapping_index(&raw, &kitsu));
        *self.kitsu.write() = kitsu;
        *self.mappings.write() = mappings;
    }

    pub(crate) fn install_anitrakt_movies(&self, entries: Vec<AnitraktEntry>) {
        *self.anitrakt_movies.write() = Arc::new(build_anitrakt_index(entries));
    }

    pub(crate) fn install_anitrakt_tv(&self, entries: Vec<AnitraktEntry>) {
        *self.anitrakt_tv.write() = Arc::new(build_anitrakt_index(entries));
    }

    pub(crate) fn install_anime_list(&self, entries: Vec<AnimeListEntry>) {
        *self.anime_list.write() = Arc::new(build_anime_list_index(entries));
    }

    /// Parse one source's on-disk file and install it. Returns the record
    /// count, or an error when the file is unreadable/unusable (the refresh
    /// cycle answers that by forcing a remote refetch).
    pub(crate) fn load_source_from_disk(&self, kind: SourceKind) -> Result<usize> {
        let path = kind.data_path(&self.config);
        let raw = std::fs::read_to_string(&path)?;
        let reduced = self.config.detail == LevelOfDetail::Required;

        let count = match kind {
            SourceKind::Mappings => {
                let entries = loaders::parse_mappings(&raw)?;
                let count = entries.len();
                self.install_mappings(entries);
                count
            }
            SourceKind::OfflineDatabase => {
                let titles = loaders::parse_offline_database(&raw, reduced)?;
                let count = titles.len();
                self.install_offline(titles);
                count
            }
            SourceKind::KitsuImdb => {
                let entries = loaders::parse_kitsu_imdb(&raw)?;
                let count = entries.len();
                self.install_kitsu(entries);
                count
            }
            SourceKind::AnitraktMovies => {
                let entries = loaders::parse_anitrakt(&raw, "anitrakt-movies")?;
                let count = entries.len();
                self.install_anitrakt_movies(entries);
                count
            }
            SourceKind::AnitraktTv => {
                let entries = loaders::parse_anitrakt(&raw, "anitrakt-tv")?;
                let count = entries.len();
                self.install_anitrakt_tv(entries);
                count
            }
            SourceKind::AnimeList => {
                let parse_mappings = self.config.detail == LevelOfDetail::Full;
                let entries = loaders::parse_anime_list(raw.as_bytes(), parse_mappings)?;
                let count = entries.len();
                self.install_anime_list(entries);
                count
            }
        };
        Ok(count)
    }

    // --- snapshot accessors ------------------------------------------------

    pub(crate) fn mappings_snapshot(&self) -> Arc<MappingIndex> {
        self.mappings.read().clone()
    }

    pub(crate) fn details_snapshot(&self) -> Arc<DetailsIndex> {
        self.details.read().clone()
    }

    pub(crate) fn kitsu_snapshot(&self) -> Arc<KitsuIndex> {
        self.kitsu.read().clone()
    }

    pub(crate) fn anitrakt_movies_snapshot(&self) -> Arc<AnitraktIndex> {
        self.anitrakt_movies.read().clone()
    }

    pub(crate) fn anitrakt_tv_snapshot(&self) -> Arc<AnitraktIndex> {
        self.anitrakt_tv.read().clone()
    }

    pub(crate) fn anime_list_snapshot(&self) -> Arc<AnimeListIndex> {
        self.anime_list.read().clone()
    }
}
