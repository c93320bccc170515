use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::sources::SourceKind;

/// How much of each corpus is kept in memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LevelOfDetail {
    /// Skip database initialisation entirely.
    None,
    /// Store reduced details (title, season, synonyms) and skip the XML
    /// `mapping-list` subtree.
    Required,
    #[default]
    Full,
}

impl LevelOfDetail {
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "none" => Self::None,
            "required" => Self::Required,
            _ => Self::Full,
        }
    }
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub data_path: PathBuf,
    pub detail: LevelOfDetail,
    /// Keep episode-level tie-breaking on even when the XML mapping subtree
    /// was skipped at `Required` detail.
    pub episode_tiebreak: bool,
    /// Per-source refresh interval overrides, milliseconds.
    refresh_overrides: Vec<(SourceKind, Duration)>,
}

impl DatabaseConfig {
    pub fn new(data_path: impl AsRef<Path>) -> Self {
        Self {
            data_path: data_path.as_ref().to_path_buf(),
            detail: LevelOfDetail::default(),
            episode_tiebreak: true,
            refresh_overrides: Vec::new(),
        }
    }

    /// Read the config from the environment:
    /// `ANIME_DB_LEVEL_OF_DETAIL` and per-source
    /// `ANIME_DB_<SOURCE>_REFRESH_INTERVAL` (milliseconds).
    pub fn from_env(data_path: impl AsRef<Path>) -> Self {
        let mut config = Self::new(data_path);

        if let Ok(detail) = std::env::var("ANIME_DB_LEVEL_OF_DETAIL") {
            config.detail = LevelOfDetail::from_str(&detail);
        }

        for kind in SourceKind::ALL {
            let key = format!("ANIME_DB_{}_REFRESH_INTERVAL", kind.env_name());
            if let Ok(raw) = std::env::var(&key) {
                match raw.parse::<u64>() {
                    Ok(millis) => config
                        .refresh_overrides
                        .push((kind, Duration::from_millis(millis))),
                    Err(_) => {
                        tracing::warn!("ignoring invalid {}: {:?}", key, raw);
                    }
                }
            }
        }

        config
    }

    pub fn with_detail(mut self, detail: LevelOfDetail) -> Self {
        self.detail = detail;
        self
    }

    pub fn with_refresh_interval(mut self, kind: SourceKind, interval: Duration) -> Self {
        self.refresh_overrides.push((kind, interval));
        self
    }

    /// Directory holding the downloaded corpora and their etag files.
    pub fn database_dir(&self) -> PathBuf {
        self.data_path.join("anime-database")
    }

    pub fn refresh_interval(&self, kind: SourceKind) -> Duration {
        self.refresh_overrides
            .iter()
            .rev()
            .find(|(k, _)| *k == kind)
            .map(|(_, interval)| *interval)
            .unwrap_or_else(|| kind.default_refresh_interval())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detail_parsing() {
        assert_eq!(LevelOfDetail::from_str("none"), LevelOfDetail::None);
        assert_eq!(LevelOfDetail::from_str("REQUIRED"), LevelOfDetail::Required);
        assert_eq!(LevelOfDetail::from_str("full"), LevelOfDetail::Full);
        assert_eq!(LevelOfDetail::from_str("bogus"), LevelOfDetail::Full);
    }

    #[test]
    fn interval_overrides_win_over_defaults() {
        let config = DatabaseConfig::new("/tmp/data")
            .with_refresh_interval(SourceKind::Mappings, Duration::from_millis(5000));
        assert_eq!(
            config.refresh_interval(SourceKind::Mappings),
            Duration::from_millis(5000)
        );
        assert_eq!(
            config.refresh_interval(SourceKind::AnimeList),
            SourceKind::AnimeList.default_refresh_interval()
        );
    }

    #[test]
    fn database_dir_is_under_data_path() {
        let config = DatabaseConfig::new("/data");
        assert_eq!(config.database_dir(), PathBuf::from("/data/anime-database"));
    }
}
