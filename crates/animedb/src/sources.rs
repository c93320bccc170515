//! The six remote corpora the database keeps fresh.

use std::path::PathBuf;
use std::time::Duration;

use crate::config::DatabaseConfig;

const HOUR: u64 = 60 * 60;
const DAY: u64 = 24 * HOUR;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceKind {
    /// Cross-reference corpus: every known external id per title.
    Mappings,
    /// Offline catalog: titles, synonyms, airing seasons.
    OfflineDatabase,
    /// Kitsu → IMDb season/episode bridge.
    KitsuImdb,
    /// MAL → Trakt bridge, movies.
    AnitraktMovies,
    /// MAL → Trakt bridge, tv.
    AnitraktTv,
    /// AniDB → TVDB/TMDB season-mapping XML master list.
    AnimeList,
}

impl SourceKind {
    pub const ALL: [SourceKind; 6] = [
        SourceKind::Mappings,
        SourceKind::OfflineDatabase,
        SourceKind::KitsuImdb,
        SourceKind::AnitraktMovies,
        SourceKind::AnitraktTv,
        SourceKind::AnimeList,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Mappings => "mappings",
            Self::OfflineDatabase => "offline-database",
            Self::KitsuImdb => "kitsu-imdb",
            Self::AnitraktMovies => "anitrakt-movies",
            Self::AnitraktTv => "anitrakt-tv",
            Self::AnimeList => "anime-list",
        }
    }

    /// Name segment used in `ANIME_DB_*_REFRESH_INTERVAL` env keys.
    pub fn env_name(&self) -> &'static str {
        match self {
            Self::Mappings => "MAPPINGS",
            Self::OfflineDatabase => "OFFLINE_DATABASE",
            Self::KitsuImdb => "KITSU_IMDB",
            Self::AnitraktMovies => "ANITRAKT_MOVIES",
            Self::AnitraktTv => "ANITRAKT_TV",
            Self::AnimeList => "ANIME_LIST",
        }
    }

    pub fn url(&self) -> &'static str {
        match self {
            Self::Mappings => {
                "https://raw.githubusercontent.com/Fribb/anime-lists/master/anime-list-full.json"
            }
            Self::OfflineDatabase => {
                "https://raw.githubusercontent.com/manami-project/anime-offline-database/master/anime-offline-database-minified.json"
            }
            Self::KitsuImdb => {
                "https://raw.githubusercontent.com/TheBeastLT/stremio-kitsu-anime/master/static/data/imdb_mapping.json"
            }
            Self::AnitraktMovies => {
                "https://raw.githubusercontent.com/rensetsu/db.trakt.anitrakt/main/db/movies.json"
            }
            Self::AnitraktTv => {
                "https://raw.githubusercontent.com/rensetsu/db.trakt.anitrakt/main/db/tv.json"
            }
            Self::AnimeList => {
                "https://raw.githubusercontent.com/Anime-Lists/anime-lists/master/anime-list-full.xml"
            }
        }
    }

    fn file_name(&self) -> &'static str {
        match self {
            Self::Mappings => "mappings.json",
            Self::OfflineDatabase => "offline-database.json",
            Self::KitsuImdb => "kitsu-imdb.json",
            Self::AnitraktMovies => "anitrakt-movies.json",
            Self::AnitraktTv => "anitrakt-tv.json",
            Self::AnimeList => "anime-list.xml",
        }
    }

    pub fn default_refresh_interval(&self) -> Duration {
        match self {
            Self::Mappings | Self::OfflineDatabase | Self::KitsuImdb | Self::AnimeList => {
                Duration::from_secs(DAY)
            }
            Self::AnitraktMovies | Self::AnitraktTv => Duration::from_secs(7 * DAY),
        }
    }

    pub fn data_path(&self, config: &DatabaseConfig) -> PathBuf {
        config.database_dir().join(self.file_name())
    }

    pub fn etag_path(&self, config: &DatabaseConfig) -> PathBuf {
        config
            .database_dir()
            .join(format!("{}.etag", self.file_name()))
    }
}
