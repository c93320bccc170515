use crate::error::{AnimeDbError, Result};
use crate::models::AnitraktEntry;

/// Parse an Anitrakt corpus (movies or tv): a JSON array of bridge records.
/// `source_name` labels warnings ("anitrakt-movies" / "anitrakt-tv").
pub fn parse_anitrakt(raw: &str, source_name: &'static str) -> Result<Vec<AnitraktEntry>> {
    let values: Vec<serde_json::Value> =
        serde_json::from_str(raw).map_err(|e| AnimeDbError::parse(source_name, e.to_string()))?;

    let mut entries = Vec::with_capacity(values.len());
    let mut skipped = 0usize;
    for value in values {
        match serde_json::from_value::<AnitraktEntry>(value) {
            Ok(entry) if entry.mal_id != 0 => entries.push(entry),
            Ok(_) => skipped += 1,
            Err(e) => {
                skipped += 1;
                tracing::warn!("skipping malformed {} record: {}", source_name, e);
            }
        }
    }

    if skipped > 0 {
        tracing::warn!("{}: skipped {} unusable record(s)", source_name, skipped);
    }
    tracing::debug!("{}: parsed {} records", source_name, entries.len());
    Ok(entries)
}
