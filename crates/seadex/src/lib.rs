//! SeaDex client.
//!
//! SeaDex (releases.moe) is a community-curated list of preferred anime
//! releases per AniList entry, keyed by torrent info-hash with release-group
//! names as a fallback signal. The pipeline tags candidate streams against
//! these sets.

mod client;
mod error;
mod models;

pub use client::SeadexClient;
pub use error::{Result, SeadexError};
pub use models::SeadexInfo;

use async_trait::async_trait;

/// Source seam so tests can inject fixture sets.
#[async_trait]
pub trait SeadexSource: Send + Sync {
    /// Best/all info-hash and release-group sets for one AniList entry.
    /// Hashes are lowercase hex; group names lowercase.
    async fn get_info_hashes(&self, anilist_id: u64) -> Result<SeadexInfo>;
}
