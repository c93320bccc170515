use serde_json::Value;

use crate::error::{AnimeDbError, Result};
use crate::models::KitsuImdbEntry;

/// Parse the Kitsu → IMDb bridge: a JSON object keyed by kitsu id.
pub fn parse_kitsu_imdb(raw: &str) -> Result<Vec<KitsuImdbEntry>> {
    let map: serde_json::Map<String, Value> = serde_json::from_str(raw)
        .map_err(|e| AnimeDbError::parse("kitsu-imdb", e.to_string()))?;

    let mut entries = Vec::with_capacity(map.len());
    let mut skipped = 0usize;
    for (key, value) in map {
        let kitsu_id = match key.parse::<u64>() {
            Ok(id) => id,
            Err(_) => {
                skipped += 1;
                tracing::warn!("skipping kitsu-imdb record with non-numeric key {:?}", key);
                continue;
            }
        };
        match serde_json::from_value::<KitsuImdbEntry>(value) {
            Ok(mut entry) => {
                entry.kitsu_id = kitsu_id;
                entries.push(entry);
            }
            Err(e) => {
                skipped += 1;
                tracing::warn!("skipping malformed kitsu-imdb record {}: {}", kitsu_id, e);
            }
        }
    }

    if skipped > 0 {
        tracing::warn!("kitsu-imdb: skipped {} unusable record(s)", skipped);
    }
    tracing::debug!("kitsu-imdb: parsed {} records", entries.len());
    Ok(entries)
}
