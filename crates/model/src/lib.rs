//! Data model shared by the stream pipeline stages.
//!
//! [`ParsedStream`] mirrors the addon wire format (camelCase JSON), so a
//! stream record round-trips untouched between the fetcher, the expression
//! engine, and the response. [`UserData`] carries the pipeline-material
//! subset of a user's configuration.

mod stream;
mod user_data;

pub use stream::{
    resolution_rank, ParsedFile, ParsedStream, RegexMatch, SeadexTag, ServiceInfo, StreamType,
    TorrentInfo, RESOLUTION_ORDER,
};
pub use user_data::{
    DedupKey, DedupMode, DeduplicatorConfig, DigitalReleaseFilter, MultiGroupBehaviour,
    RankedExpression, RegexPatternDef, SeasonEpisodeMatching, SortCriteria, SortCriterion,
    SortDirection, SortKey, TitleMatching, UserData, YearMatching,
};
