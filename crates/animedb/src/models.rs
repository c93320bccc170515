//! Corpus record shapes and the derived [`AnimeEntry`].

use idparse::IdSource;
use serde::{Deserialize, Serialize};

/// Title classification carried by the cross-reference corpus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AnimeKind {
    Tv,
    Movie,
    Special,
    Ova,
    Ona,
    #[default]
    #[serde(other)]
    Unknown,
}

/// One cross-reference record: every external id known for a title.
///
/// Field names follow the corpus wire format (`anime-planet_id`,
/// `notify.moe_id`, …). The `thetvdb_season`/`themoviedb_season` overrides
/// are rare and take precedence over the XML master list when present.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MappingEntry {
    pub anidb_id: Option<u64>,
    pub anilist_id: Option<u64>,
    #[serde(rename = "anime-planet_id")]
    pub anime_planet_id: Option<String>,
    pub anisearch_id: Option<u64>,
    pub imdb_id: Option<String>,
    pub kitsu_id: Option<u64>,
    pub livechart_id: Option<u64>,
    pub mal_id: Option<u64>,
    #[serde(rename = "notify.moe_id")]
    pub notify_moe_id: Option<String>,
    pub simkl_id: Option<u64>,
    pub themoviedb_id: Option<u64>,
    pub thetvdb_id: Option<u64>,
    pub trakt_id: Option<u64>,
    pub animecountdown_id: Option<u64>,
    #[serde(rename = "type")]
    pub kind: AnimeKind,
    #[serde(rename = "thetvdb_season")]
    pub tvdb_season: Option<i32>,
    #[serde(rename = "themoviedb_season")]
    pub tmdb_season: Option<i32>,
}

impl MappingEntry {
    /// The id this entry carries for a source, stringified for index keys.
    pub fn id_for(&self, source: IdSource) -> Option<String> {
        match source {
            IdSource::Imdb => self.imdb_id.clone(),
            IdSource::Tmdb => self.themoviedb_id.map(|v| v.to_string()),
            IdSource::Tvdb => self.thetvdb_id.map(|v| v.to_string()),
            IdSource::Mal => self.mal_id.map(|v| v.to_string()),
            IdSource::Kitsu => self.kitsu_id.map(|v| v.to_string()),
            IdSource::Anidb => self.anidb_id.map(|v| v.to_string()),
            IdSource::Anilist => self.anilist_id.map(|v| v.to_string()),
            IdSource::AnimePlanet => self.anime_planet_id.clone(),
            IdSource::Anisearch => self.anisearch_id.map(|v| v.to_string()),
            IdSource::Livechart => self.livechart_id.map(|v| v.to_string()),
            IdSource::NotifyMoe => self.notify_moe_id.clone(),
            IdSource::Simkl => self.simkl_id.map(|v| v.to_string()),
            IdSource::Trakt => self.trakt_id.map(|v| v.to_string()),
            IdSource::Animecountdown => self.animecountdown_id.map(|v| v.to_string()),
        }
    }

    /// All `(source, id)` pairs this entry carries.
    pub fn ids(&self) -> Vec<(IdSource, String)> {
        const SOURCES: [IdSource; 14] = [
            IdSource::Imdb,
            IdSource::Tmdb,
            IdSource::Tvdb,
            IdSource::Mal,
            IdSource::Kitsu,
            IdSource::Anidb,
            IdSource::Anilist,
            IdSource::AnimePlanet,
            IdSource::Anisearch,
            IdSource::Livechart,
            IdSource::NotifyMoe,
            IdSource::Simkl,
            IdSource::Trakt,
            IdSource::Animecountdown,
        ];
        SOURCES
            .iter()
            .filter_map(|&source| self.id_for(source).map(|id| (source, id)))
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SeasonName {
    Winter,
    Spring,
    Summer,
    Fall,
    #[default]
    #[serde(other)]
    Undefined,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AnimeSeason {
    pub season: SeasonName,
    pub year: Option<i32>,
}

/// Title details from the offline catalog. At `Required` detail only the
/// reduced form (title, season, synonyms) is stored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AnimeDetails {
    pub title: String,
    pub synonyms: Vec<String>,
    pub anime_season: AnimeSeason,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub episodes: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub picture: Option<String>,
}

impl AnimeDetails {
    /// Drop everything outside the reduced form.
    pub fn reduced(mut self) -> Self {
        self.episodes = None;
        self.status = None;
        self.picture = None;
        self
    }
}

/// Kitsu → IMDb bridge record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct KitsuImdbEntry {
    /// Filled from the corpus map key during load.
    #[serde(skip)]
    pub kitsu_id: u64,
    pub tvdb_id: Option<u64>,
    pub imdb_id: Option<String>,
    pub title: Option<String>,
    pub from_season: Option<u32>,
    pub from_episode: Option<u32>,
    pub non_imdb_episodes: Vec<u32>,
    pub fanart_logo_id: Option<u64>,
}

/// External ids attached to a Trakt entry or season.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Externals {
    pub tvdb: Option<u64>,
    pub tmdb: Option<u64>,
    pub imdb: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TraktSeason {
    pub id: u64,
    pub number: u32,
    pub externals: Externals,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TraktInfo {
    pub id: u64,
    pub slug: String,
    pub title: String,
    pub is_split_cour: Option<bool>,
    pub season: Option<TraktSeason>,
}

/// MAL → Trakt bridge record (movie and tv corpora share the shape; movies
/// simply never carry a season).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnitraktEntry {
    pub mal_id: u64,
    pub trakt: TraktInfo,
    pub externals: Externals,
    pub release_year: Option<i32>,
}

/// `defaulttvdbseason` from the XML master list: a season number, or `a`
/// meaning the TVDB side uses absolute numbering across the whole series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TvdbSeason {
    Number(i32),
    Absolute,
}

impl TvdbSeason {
    pub fn parse(raw: &str) -> Option<Self> {
        if raw.eq_ignore_ascii_case("a") {
            Some(Self::Absolute)
        } else {
            raw.parse().ok().map(Self::Number)
        }
    }

    /// Whether this default season covers a request for `season`.
    pub fn covers(&self, season: u32) -> bool {
        match self {
            Self::Absolute => true,
            Self::Number(n) => *n >= 0 && *n as u32 == season,
        }
    }
}

/// One per-season mapping row from the XML `mapping-list` subtree.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnimeListMapping {
    pub anidb_season: u32,
    pub tvdb_season: Option<i32>,
    pub tmdb_season: Option<i32>,
    pub start: Option<u32>,
    pub end: Option<u32>,
    pub offset: Option<i32>,
    /// Raw `;1-5;2-6;`-style episode pair list, kept verbatim.
    pub episodes: Option<String>,
}

/// One `<anime>` record from the XML master list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnimeListEntry {
    pub anidb_id: u64,
    pub tvdb_id: Option<u64>,
    pub default_tvdb_season: Option<TvdbSeason>,
    pub episode_offset: Option<u32>,
    pub tmdb_id: Option<u64>,
    pub tmdb_season: Option<i32>,
    pub tmdb_offset: Option<u32>,
    pub imdb_id: Option<String>,
    pub mappings: Vec<AnimeListMapping>,
}

// --- Derived entry ---------------------------------------------------------

/// Season/offset projection for one downstream catalog.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeasonProjection {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub season_number: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub season_id: Option<u64>,
    /// First episode of this entry inside the catalog's own numbering.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from_episode: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImdbProjection {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub season_number: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from_episode: Option<u32>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub non_imdb_episodes: Vec<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TraktProjection {
    pub title: String,
    pub slug: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_split_cour: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub season_id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub season_number: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FanartProjection {
    pub logo_id: u64,
}

/// The canonical merged view the rest of the system consumes: one title,
/// every resolved external id, and per-catalog season projections.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnimeEntry {
    pub kind: AnimeKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub synonyms: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub anime_season: Option<AnimeSeason>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub imdb_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tvdb_id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tmdb_id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trakt_id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mal_id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kitsu_id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub anilist_id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub anidb_id: Option<u64>,

    pub tvdb: SeasonProjection,
    pub tmdb: SeasonProjection,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub imdb: Option<ImdbProjection>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trakt: Option<TraktProjection>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fanart: Option<FanartProjection>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub episode_mappings: Vec<AnimeListMapping>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mapping_entry_parses_corpus_field_names() {
        let entry: MappingEntry = serde_json::from_str(
            r#"{
                "anidb_id": 23,
                "anilist_id": 1,
                "anime-planet_id": "cowboy-bebop",
                "imdb_id": "tt0213338",
                "kitsu_id": 1,
                "mal_id": 1,
                "notify.moe_id": "Tk3ccKimg",
                "thetvdb_id": 76885,
                "themoviedb_id": 30991,
                "type": "TV"
            }"#,
        )
        .unwrap();
        assert_eq!(entry.kind, AnimeKind::Tv);
        assert_eq!(entry.id_for(idparse::IdSource::Imdb).as_deref(), Some("tt0213338"));
        assert_eq!(entry.id_for(idparse::IdSource::Kitsu).as_deref(), Some("1"));
        assert_eq!(entry.ids().len(), 9);
    }

    #[test]
    fn unknown_kind_falls_back() {
        let entry: MappingEntry = serde_json::from_str(r#"{"type": "MUSIC"}"#).unwrap();
        assert_eq!(entry.kind, AnimeKind::Unknown);
    }

    #[test]
    fn tvdb_season_parses_numbers_and_absolute() {
        assert_eq!(TvdbSeason::parse("1"), Some(TvdbSeason::Number(1)));
        assert_eq!(TvdbSeason::parse("a"), Some(TvdbSeason::Absolute));
        assert_eq!(TvdbSeason::parse("A"), Some(TvdbSeason::Absolute));
        assert_eq!(TvdbSeason::parse("movie"), None);

        assert!(TvdbSeason::Absolute.covers(4));
        assert!(TvdbSeason::Number(2).covers(2));
        assert!(!TvdbSeason::Number(2).covers(3));
    }

    #[test]
    fn details_reduced_drops_extras() {
        let details = AnimeDetails {
            title: "Frieren".into(),
            synonyms: vec!["Sousou no Frieren".into()],
            anime_season: AnimeSeason {
                season: SeasonName::Fall,
                year: Some(2023),
            },
            episodes: Some(28),
            status: Some("FINISHED".into()),
            picture: Some("https://example/pic.png".into()),
        };
        let reduced = details.reduced();
        assert_eq!(reduced.title, "Frieren");
        assert_eq!(reduced.synonyms.len(), 1);
        assert!(reduced.episodes.is_none());
        assert!(reduced.status.is_none());
    }
}
