use serde::{Deserialize, Serialize};

/// The pipeline-material subset of a user's configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserData {
    /// Resolutions to float to the top of the `resolution` sort key, in
    /// order; unlisted resolutions keep the default ladder order below them.
    pub preferred_resolutions: Vec<String>,
    pub excluded_qualities: Vec<String>,
    pub excluded_visual_tags: Vec<String>,
    pub preferred_keywords: Vec<String>,
    pub preferred_regex_patterns: Vec<RegexPatternDef>,
    pub preferred_stream_expressions: Vec<String>,
    pub ranked_stream_expressions: Vec<RankedExpression>,
    pub included_stream_expressions: Vec<String>,
    pub required_stream_expressions: Vec<String>,
    pub excluded_stream_expressions: Vec<String>,
    pub deduplicator: DeduplicatorConfig,
    /// None means "not set" and defaults to enabled for anime requests.
    pub enable_seadex: Option<bool>,
    pub title_matching: TitleMatching,
    pub year_matching: YearMatching,
    pub season_episode_matching: SeasonEpisodeMatching,
    pub digital_release_filter: DigitalReleaseFilter,
    pub sort_criteria: SortCriteria,
    /// Whether this user is allowed to supply regular expressions. When
    /// false, regex-bearing options are treated as empty.
    pub regex_allowed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegexPatternDef {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub pattern: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankedExpression {
    pub expression: String,
    pub score: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DeduplicatorConfig {
    pub enabled: bool,
    pub keys: Vec<DedupKey>,
    pub multi_group_behaviour: MultiGroupBehaviour,
    pub cached: DedupMode,
    pub uncached: DedupMode,
    pub p2p: DedupMode,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DedupKey {
    Filename,
    InfoHash,
    Size,
    SmartDetect,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MultiGroupBehaviour {
    Aggressive,
    #[default]
    Conservative,
    KeepAll,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DedupMode {
    SingleResult,
    PerService,
    #[default]
    Disabled,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TitleMatching {
    pub enabled: bool,
    /// Exact (normalised) equality; when false, containment also passes.
    pub exact: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct YearMatching {
    pub enabled: bool,
    /// Allowed distance from the request's year (span-aware for series).
    pub tolerance: u32,
}

impl Default for YearMatching {
    fn default() -> Self {
        Self {
            enabled: false,
            tolerance: 1,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SeasonEpisodeMatching {
    pub enabled: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DigitalReleaseFilter {
    pub enabled: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SortCriteria {
    pub global: Vec<SortCriterion>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SortCriterion {
    pub key: SortKey,
    #[serde(default)]
    pub direction: SortDirection,
}

impl SortCriterion {
    pub fn desc(key: SortKey) -> Self {
        Self {
            key,
            direction: SortDirection::Desc,
        }
    }

    pub fn asc(key: SortKey) -> Self {
        Self {
            key,
            direction: SortDirection::Asc,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortKey {
    Cached,
    Resolution,
    Library,
    RegexPatterns,
    StreamType,
    VisualTag,
    AudioTag,
    AudioChannel,
    Encode,
    Language,
    Size,
    Seeders,
    Quality,
    StreamExpression,
    Seadex,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}
