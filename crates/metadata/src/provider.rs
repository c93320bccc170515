use async_trait::async_trait;
use chrono::NaiveDate;
use idparse::{IdSource, MediaKind};

use crate::error::Result;
use crate::models::{MediaMetadata, ReleaseDates};

/// Catalog access seam. Production uses [`crate::CatalogClient`]; tests
/// substitute fixtures.
#[async_trait]
pub trait MetadataProvider: Send + Sync {
    /// Translate an external id (IMDb/TVDB) into a TMDB id.
    async fn find_tmdb_id(
        &self,
        kind: MediaKind,
        source: IdSource,
        value: &str,
    ) -> Result<Option<u64>>;

    async fn get_metadata(&self, kind: MediaKind, tmdb_id: u64) -> Result<Option<MediaMetadata>>;

    /// Movie release dates by channel; `None` when the catalog has none.
    async fn get_release_dates(&self, tmdb_id: u64) -> Result<Option<ReleaseDates>>;

    async fn get_episode_air_date(
        &self,
        tmdb_id: u64,
        season: u32,
        episode: u32,
    ) -> Result<Option<NaiveDate>>;

    /// Provider name for logging.
    fn name(&self) -> &'static str;
}
