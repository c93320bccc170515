use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::error::{Result, SeadexError};
use crate::models::SeadexInfo;
use crate::SeadexSource;

const BASE_URL: &str = "https://releases.moe/api/collections/entries/records";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

pub struct SeadexClient {
    client: Client,
}

impl SeadexClient {
    /// Create a client over a caller-supplied reqwest `Client`.
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl SeadexSource for SeadexClient {
    async fn get_info_hashes(&self, anilist_id: u64) -> Result<SeadexInfo> {
        let filter = format!("alID={anilist_id}");
        let response = self
            .client
            .get(BASE_URL)
            .timeout(REQUEST_TIMEOUT)
            .query(&[("filter", filter.as_str()), ("expand", "trs")])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(SeadexError::Api {
                status_code: status.as_u16(),
                message,
            });
        }

        let listing: Listing = response.json().await?;
        let info = info_from_listing(listing);
        tracing::debug!(
            "seadex: {} hashes ({} best) for anilist {}",
            info.all_hashes.len(),
            info.best_hashes.len(),
            anilist_id
        );
        Ok(info)
    }
}

// --- wire models -----------------------------------------------------------

#[derive(Debug, Deserialize)]
struct Listing {
    #[serde(default)]
    items: Vec<Entry>,
}

#[derive(Debug, Deserialize)]
struct Entry {
    #[serde(default)]
    expand: Expanded,
}

#[derive(Debug, Default, Deserialize)]
struct Expanded {
    #[serde(default)]
    trs: Vec<Torrent>,
}

#[derive(Debug, Deserialize)]
struct Torrent {
    #[serde(rename = "infoHash", default)]
    info_hash: Option<String>,
    #[serde(rename = "releaseGroup", default)]
    release_group: Option<String>,
    #[serde(rename = "isBest", default)]
    is_best: bool,
}

fn info_from_listing(listing: Listing) -> SeadexInfo {
    let mut info = SeadexInfo::default();
    for entry in listing.items {
        for torrent in entry.expand.trs {
            // Private-tracker entries redact the hash.
            let hash = torrent
                .info_hash
                .as_deref()
                .map(str::to_lowercase)
                .filter(|h| h.len() == 40 && h.bytes().all(|b| b.is_ascii_hexdigit()));
            let group = torrent
                .release_group
                .as_deref()
                .map(str::to_lowercase)
                .filter(|g| !g.is_empty());

            if let Some(hash) = hash {
                if torrent.is_best {
                    info.best_hashes.insert(hash.clone());
                }
                info.all_hashes.insert(hash);
            }
            if let Some(group) = group {
                if torrent.is_best {
                    info.best_groups.insert(group.clone());
                }
                info.all_groups.insert(group);
            }
        }
    }
    info
}
