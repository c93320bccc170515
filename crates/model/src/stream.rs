use serde::{Deserialize, Serialize};

/// Resolution ladder, best first. Anything unlisted ranks below the ladder.
pub const RESOLUTION_ORDER: &[&str] = &[
    "2160p", "1440p", "1080p", "720p", "576p", "480p", "360p", "240p", "144p",
];

/// Rank of a resolution on the default ladder; unknown resolutions rank last.
pub fn resolution_rank(resolution: Option<&str>) -> usize {
    resolution
        .and_then(|r| RESOLUTION_ORDER.iter().position(|known| known.eq_ignore_ascii_case(r)))
        .unwrap_or(RESOLUTION_ORDER.len())
}

/// How a stream is acquired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StreamType {
    Debrid,
    P2p,
    Usenet,
    Http,
    Live,
    Youtube,
    External,
    Error,
    Statistic,
    #[default]
    #[serde(other)]
    Unknown,
}

/// Debrid/usenet service attribution for a stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceInfo {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub short_name: Option<String>,
    #[serde(default)]
    pub cached: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TorrentInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub info_hash: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seeders: Option<u32>,
}

/// Attributes parsed out of a release filename by the upstream addon.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolution: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quality: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encode: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub visual_tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub audio_tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub audio_channels: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub languages: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release_group: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub season: Option<u32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub seasons: Vec<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub episode: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
}

/// SeaDex tagging computed by the pipeline's early precompute stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeadexTag {
    pub is_best: bool,
    pub is_seadex: bool,
}

/// Which preferred regex pattern claimed a stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegexMatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub pattern: String,
    pub index: usize,
}

/// One candidate playback stream as returned by an addon, plus the mutable
/// per-request annotations the pipeline writes onto it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedStream {
    /// Unique within one request.
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub folder_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub indexer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parsed_file: Option<ParsedFile>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub torrent: Option<TorrentInfo>,
    /// Bytes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub folder_size: Option<u64>,
    /// Days since the release was indexed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<u32>,
    #[serde(rename = "type", default)]
    pub stream_type: StreamType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service: Option<ServiceInfo>,
    #[serde(default)]
    pub library: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proxied: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub private: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    // Per-request annotations, written by the precompute stages.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seadex: Option<SeadexTag>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub regex_matched: Option<RegexMatch>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keyword_matched: Option<bool>,
    #[serde(
        rename = "streamExpressionMatched",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub expression_matched: Option<usize>,
    #[serde(
        rename = "streamExpressionScore",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub expression_score: Option<f64>,
}

impl ParsedStream {
    /// Lowercase info-hash, when the stream carries a torrent.
    pub fn info_hash(&self) -> Option<String> {
        self.torrent
            .as_ref()
            .and_then(|t| t.info_hash.as_ref())
            .map(|h| h.to_lowercase())
    }

    pub fn release_group(&self) -> Option<&str> {
        self.parsed_file
            .as_ref()
            .and_then(|f| f.release_group.as_deref())
    }

    pub fn resolution(&self) -> Option<&str> {
        self.parsed_file
            .as_ref()
            .and_then(|f| f.resolution.as_deref())
    }

    /// Whether a debrid/usenet service reports this stream as cached.
    pub fn is_cached(&self) -> bool {
        self.service.as_ref().map(|s| s.cached).unwrap_or(false)
    }
}
