use serde::{Deserialize, Serialize};

/// The catalog an id belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum IdSource {
    Imdb,
    Tmdb,
    Tvdb,
    Mal,
    Kitsu,
    Anidb,
    Anilist,
    AnimePlanet,
    Anisearch,
    Livechart,
    NotifyMoe,
    Simkl,
    Trakt,
    Animecountdown,
}

impl IdSource {
    /// Map the prefix used in opaque ids (`kitsu:…`, `anime-planet:…`) to a
    /// source. Case-insensitive.
    pub fn from_prefix(prefix: &str) -> Option<Self> {
        let source = match prefix.to_ascii_lowercase().as_str() {
            "imdb" => Self::Imdb,
            "tmdb" => Self::Tmdb,
            "tvdb" | "thetvdb" => Self::Tvdb,
            "mal" | "myanimelist" => Self::Mal,
            "kitsu" => Self::Kitsu,
            "anidb" => Self::Anidb,
            "anilist" => Self::Anilist,
            "anime-planet" | "animeplanet" => Self::AnimePlanet,
            "anisearch" => Self::Anisearch,
            "livechart" => Self::Livechart,
            "notify-moe" | "notifymoe" => Self::NotifyMoe,
            "simkl" => Self::Simkl,
            "trakt" => Self::Trakt,
            "animecountdown" => Self::Animecountdown,
            _ => return None,
        };
        Some(source)
    }

    /// The canonical prefix form of this source.
    pub fn prefix(&self) -> &'static str {
        match self {
            Self::Imdb => "imdb",
            Self::Tmdb => "tmdb",
            Self::Tvdb => "tvdb",
            Self::Mal => "mal",
            Self::Kitsu => "kitsu",
            Self::Anidb => "anidb",
            Self::Anilist => "anilist",
            Self::AnimePlanet => "anime-planet",
            Self::Anisearch => "anisearch",
            Self::Livechart => "livechart",
            Self::NotifyMoe => "notify-moe",
            Self::Simkl => "simkl",
            Self::Trakt => "trakt",
            Self::Animecountdown => "animecountdown",
        }
    }

    /// Catalogs that address anime per-entry rather than per-series, so a
    /// single trailing number in their ids is an episode.
    pub fn is_anime_scoped(&self) -> bool {
        matches!(self, Self::Mal | Self::Kitsu | Self::Anidb | Self::Anilist)
    }
}

impl std::fmt::Display for IdSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.prefix())
    }
}

/// Caller-side hint about what kind of content an id addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Movie,
    Series,
    Anime,
    #[default]
    Unknown,
}

impl MediaKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Movie => "movie",
            Self::Series => "series",
            Self::Anime => "anime",
            Self::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for MediaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A parsed media identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedId {
    pub source: IdSource,
    pub value: String,
    pub season: Option<u32>,
    pub episode: Option<u32>,
    pub kind: MediaKind,
}

impl ParsedId {
    pub fn new(source: IdSource, value: impl Into<String>) -> Self {
        Self {
            source,
            value: value.into(),
            season: None,
            episode: None,
            kind: MediaKind::Unknown,
        }
    }
}

impl std::fmt::Display for ParsedId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (self.season, self.episode) {
            (Some(s), Some(e)) => write!(f, "{}:{}:{}:{}", self.source, self.value, s, e),
            (Some(s), None) => write!(f, "{}:{}:{}", self.source, self.value, s),
            (None, Some(e)) => write!(f, "{}:{}:{}", self.source, self.value, e),
            (None, None) => write!(f, "{}:{}", self.source, self.value),
        }
    }
}
