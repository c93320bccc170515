//! Fixture-based construction for tests and embedders.

use std::sync::Arc;

use crate::config::DatabaseConfig;
use crate::loaders::OfflineTitle;
use crate::models::{AnimeListEntry, AnitraktEntry, KitsuImdbEntry, MappingEntry};
use crate::AnimeDatabase;

/// Builds an [`AnimeDatabase`] from pre-parsed corpora, skipping disk and
/// HTTP entirely. Intended for tests and for embedders that manage corpus
/// files themselves.
#[derive(Default)]
pub struct AnimeDatabaseBuilder {
    config: Option<DatabaseConfig>,
    mappings: Vec<MappingEntry>,
    details: Vec<OfflineTitle>,
    kitsu: Vec<KitsuImdbEntry>,
    anitrakt_movies: Vec<AnitraktEntry>,
    anitrakt_tv: Vec<AnitraktEntry>,
    anime_list: Vec<AnimeListEntry>,
}

impl AnimeDatabaseBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn config(mut self, config: DatabaseConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn mappings(mut self, entries: Vec<MappingEntry>) -> Self {
        self.mappings = entries;
        self
    }

    pub fn details(mut self, titles: Vec<OfflineTitle>) -> Self {
        self.details = titles;
        self
    }

    pub fn kitsu(mut self, entries: Vec<KitsuImdbEntry>) -> Self {
        self.kitsu = entries;
        self
    }

    pub fn anitrakt_movies(mut self, entries: Vec<AnitraktEntry>) -> Self {
        self.anitrakt_movies = entries;
        self
    }

    pub fn anitrakt_tv(mut self, entries: Vec<AnitraktEntry>) -> Self {
        self.anitrakt_tv = entries;
        self
    }

    pub fn anime_list(mut self, entries: Vec<AnimeListEntry>) -> Self {
        self.anime_list = entries;
        self
    }

    pub fn build(self) -> Arc<AnimeDatabase> {
        let config = self
            .config
            .unwrap_or_else(|| DatabaseConfig::new("/tmp/nagare-fixture"));
        let db = AnimeDatabase::empty(config);

        // Kitsu first: mapping installation consumes the kitsu snapshot
        // for enrichment.
        db.install_kitsu(self.kitsu);
        db.install_mappings(self.mappings);
        db.install_offline(self.details);
        db.install_anitrakt_movies(self.anitrakt_movies);
        db.install_anitrakt_tv(self.anitrakt_tv);
        db.install_anime_list(self.anime_list);

        Arc::new(db)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use idparse::IdSource;

    #[test]
    fn builder_database_answers_lookups() {
        let db = AnimeDatabase::builder()
            .mappings(vec![MappingEntry {
                mal_id: Some(5114),
                kitsu_id: Some(3936),
                kind: crate::AnimeKind::Tv,
                ..Default::default()
            }])
            .build();

        assert!(db.get_entry(IdSource::Mal, "5114", None, None).is_some());
        assert!(db.is_anime("mal:5114"));
        assert!(!db.is_anime("tt0111161"));
        assert!(!db.is_anime("garbage"));
    }
}
