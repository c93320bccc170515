use crate::error::{AnimeDbError, Result};
use crate::models::MappingEntry;

/// Parse the cross-reference corpus: a JSON array of mapping records.
pub fn parse_mappings(raw: &str) -> Result<Vec<MappingEntry>> {
    let values: Vec<serde_json::Value> = serde_json::from_str(raw)
        .map_err(|e| AnimeDbError::parse("mappings", e.to_string()))?;

    let mut entries = Vec::with_capacity(values.len());
    let mut skipped = 0usize;
    for value in values {
        match serde_json::from_value::<MappingEntry>(value) {
            Ok(entry) => {
                // A record with no ids at all can never be looked up.
                if entry.ids().is_empty() {
                    skipped += 1;
                    continue;
                }
                entries.push(entry);
            }
            Err(e) => {
                skipped += 1;
                tracing::warn!("skipping malformed mapping record: {}", e);
            }
        }
    }

    if skipped > 0 {
        tracing::warn!("mappings: skipped {} unusable record(s)", skipped);
    }
    tracing::debug!("mappings: parsed {} records", entries.len());
    Ok(entries)
}
