//! In-memory indices.
//!
//! Every index is rebuilt from scratch on load and published by swapping an
//! `Arc`; a published snapshot is never mutated. The Kitsu → IMDb enrichment
//! is therefore part of mapping-index construction: whenever either the
//! cross-reference corpus or the kitsu corpus loads, the mapping index is
//! rebuilt from the retained raw corpus plus the latest kitsu snapshot.

use std::collections::HashMap;
use std::sync::Arc;

use idparse::IdSource;

use crate::loaders::OfflineTitle;
use crate::models::{AnimeDetails, AnimeListEntry, AnitraktEntry, KitsuImdbEntry, MappingEntry};

pub type MappingIndex = HashMap<IdSource, HashMap<String, Vec<Arc<MappingEntry>>>>;
pub type DetailsIndex = HashMap<IdSource, HashMap<String, Arc<AnimeDetails>>>;
pub type KitsuIndex = HashMap<u64, Arc<KitsuImdbEntry>>;
pub type AnitraktIndex = HashMap<u64, Arc<AnitraktEntry>>;

#[derive(Default)]
pub struct AnimeListIndex {
    pub by_anidb: HashMap<u64, Arc<AnimeListEntry>>,
    pub by_tvdb: HashMap<u64, Vec<Arc<AnimeListEntry>>>,
}

/// Build the per-source mapping index, applying Kitsu enrichment: a kitsu
/// record carrying an `imdb_id` writes that id onto its mapping entry, and
/// the entry joins the IMDb bucket (deduplicated by kitsu id).
pub fn build_mapping_index(raw: &[MappingEntry], kitsu: &KitsuIndex) -> MappingIndex {
    let mut entries: Vec<MappingEntry> = raw.to_vec();

    // kitsu id -> position, for the enrichment pass.
    let mut by_kitsu: HashMap<u64, usize> = HashMap::new();
    for (position, entry) in entries.iter().enumerate() {
        if let Some(kitsu_id) = entry.kitsu_id {
            by_kitsu.entry(kitsu_id).or_insert(position);
        }
    }

    let mut enriched = 0usize;
    for kitsu_entry in kitsu.values() {
        let Some(imdb_id) = kitsu_entry.imdb_id.as_ref() else {
            continue;
        };
        if let Some(&position) = by_kitsu.get(&kitsu_entry.kitsu_id) {
            if entries[position].imdb_id.is_none() {
                entries[position].imdb_id = Some(imdb_id.clone());
                enriched += 1;
            }
        }
    }
    if enriched > 0 {
        tracing::debug!("mapping index: enriched {} entries with kitsu imdb ids", enriched);
    }

    let mut index: MappingIndex = HashMap::new();
    for entry in entries {
        let entry = Arc::new(entry);
        for (source, id) in entry.ids() {
            let bucket = index
                .entry(source)
                .or_default()
                .entry(normalize_key(&id))
                .or_default();
            // The corpus's own ambiguity (several entries per id) is
            // preserved; only same-kitsu duplicates are collapsed.
            let duplicate = entry.kitsu_id.is_some()
                && bucket.iter().any(|existing| existing.kitsu_id == entry.kitsu_id);
            if !duplicate {
                bucket.push(Arc::clone(&entry));
            }
        }
    }
    index
}

pub fn build_details_index(titles: &[OfflineTitle]) -> DetailsIndex {
    let mut index: DetailsIndex = HashMap::new();
    for title in titles {
        let details = Arc::new(title.details.clone());
        for (source, id) in &title.ids {
            index
                .entry(*source)
                .or_default()
                .entry(normalize_key(id))
                .or_insert_with(|| Arc::clone(&details));
        }
    }
    index
}

pub fn build_kitsu_index(entries: Vec<KitsuImdbEntry>) -> KitsuIndex {
    entries
        .into_iter()
        .map(|entry| (entry.kitsu_id, Arc::new(entry)))
        .collect()
}

pub fn build_anitrakt_index(entries: Vec<AnitraktEntry>) -> AnitraktIndex {
    entries
        .into_iter()
        .map(|entry| (entry.mal_id, Arc::new(entry)))
        .collect()
}

pub fn build_anime_list_index(entries: Vec<AnimeListEntry>) -> AnimeListIndex {
    let mut index = AnimeListIndex::default();
    for entry in entries {
        let entry = Arc::new(entry);
        if let Some(tvdb_id) = entry.tvdb_id {
            index.by_tvdb.entry(tvdb_id).or_default().push(Arc::clone(&entry));
        }
        index.by_anidb.insert(entry.anidb_id, entry);
    }
    index
}

/// Canonical index key: numeric ids lose leading zeros so `007` and `7`
/// address the same bucket; everything else is kept verbatim.
pub fn normalize_key(id: &str) -> String {
    match id.parse::<u64>() {
        Ok(n) => n.to_string(),
        Err(_) => id.to_string(),
    }
}

/// Look up a bucket trying both the raw and the normalized key form.
pub fn lookup<'a, T>(map: &'a HashMap<String, T>, id: &str) -> Option<&'a T> {
    map.get(id).or_else(|| map.get(&normalize_key(id)))
}
