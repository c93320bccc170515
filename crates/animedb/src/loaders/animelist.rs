//! XML master-list loader.
//!
//! The corpus is `<anime-list><anime anidbid="..." .../>...</anime-list>`;
//! each `<anime>` may carry a `<mapping-list>` of per-season rows. The
//! mapping subtree is parsed only at full detail.

use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;

use crate::error::{AnimeDbError, Result};
use crate::models::{AnimeListEntry, AnimeListMapping, TvdbSeason};

pub fn parse_anime_list(xml: &[u8], parse_mappings: bool) -> Result<Vec<AnimeListEntry>> {
    let mut reader = Reader::from_reader(xml);
    reader.config_mut().trim_text(true);

    let mut entries = Vec::new();
    let mut skipped = 0usize;
    let mut buf = Vec::new();

    let mut saw_root = false;
    let mut current: Option<EntryBuilder> = None;
    let mut current_mapping: Option<AnimeListMapping> = None;
    let mut in_mapping_list = false;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => match e.name().as_ref() {
                b"anime-list" => saw_root = true,
                b"anime" => {
                    if !saw_root {
                        return Err(AnimeDbError::parse(
                            "anime-list",
                            "missing <anime-list> root element",
                        ));
                    }
                    current = Some(EntryBuilder::from_attributes(&e));
                }
                b"mapping-list" => in_mapping_list = true,
                b"mapping" if in_mapping_list && parse_mappings => {
                    current_mapping = Some(mapping_from_attributes(&e));
                }
                _ => {}
            },
            // Self-closing elements deliver no matching End event.
            Ok(Event::Empty(e)) => match e.name().as_ref() {
                b"anime" => {
                    if !saw_root {
                        return Err(AnimeDbError::parse(
                            "anime-list",
                            "missing <anime-list> root element",
                        ));
                    }
                    match EntryBuilder::from_attributes(&e).build() {
                        Some(entry) => entries.push(entry),
                        None => {
                            skipped += 1;
                            tracing::warn!("skipping <anime> element without usable anidbid");
                        }
                    }
                }
                b"mapping" if in_mapping_list && parse_mappings => {
                    if let Some(builder) = current.as_mut() {
                        builder.mappings.push(mapping_from_attributes(&e));
                    }
                }
                _ => {}
            },
            Ok(Event::End(e)) => match e.name().as_ref() {
                b"anime" => {
                    if let Some(builder) = current.take() {
                        match builder.build() {
                            Some(entry) => entries.push(entry),
                            None => {
                                skipped += 1;
                                tracing::warn!("skipping <anime> element without usable anidbid");
                            }
                        }
                    }
                }
                b"mapping-list" => in_mapping_list = false,
                b"mapping" => {
                    if let (Some(mapping), Some(builder)) =
                        (current_mapping.take(), current.as_mut())
                    {
                        builder.mappings.push(mapping);
                    }
                }
                _ => {}
            },
            Ok(Event::Text(e)) => {
                if let Some(mapping) = current_mapping.as_mut() {
                    let text = e.unescape().unwrap_or_default().to_string();
                    if !text.is_empty() {
                        mapping.episodes = Some(text);
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(AnimeDbError::parse(
                    "anime-list",
                    format!("XML parse error: {e}"),
                ))
            }
            _ => {}
        }
        buf.clear();
    }

    if !saw_root {
        return Err(AnimeDbError::parse(
            "anime-list",
            "missing <anime-list> root element",
        ));
    }
    if skipped > 0 {
        tracing::warn!("anime-list: skipped {} unusable record(s)", skipped);
    }
    tracing::debug!("anime-list: parsed {} records", entries.len());
    Ok(entries)
}

#[derive(Default)]
struct EntryBuilder {
    anidb_id: Option<u64>,
    tvdb_id: Option<u64>,
    default_tvdb_season: Option<TvdbSeason>,
    episode_offset: Option<u32>,
    tmdb_id: Option<u64>,
    tmdb_season: Option<i32>,
    tmdb_offset: Option<u32>,
    imdb_id: Option<String>,
    mappings: Vec<AnimeListMapping>,
}

impl EntryBuilder {
    fn from_attributes(element: &BytesStart<'_>) -> Self {
        let mut builder = Self::default();
        for attr in element.attributes().flatten() {
            let value = String::from_utf8_lossy(&attr.value).to_string();
            match attr.key.as_ref() {
                b"anidbid" => builder.anidb_id = value.parse().ok(),
                // `tvdbid` may be a number or placeholder text
                // ("movie", "hentai", "unknown"); text means no TVDB entry.
                b"tvdbid" => builder.tvdb_id = value.parse().ok(),
                b"defaulttvdbseason" => {
                    builder.default_tvdb_season = TvdbSeason::parse(&value);
                }
                b"episodeoffset" => builder.episode_offset = value.parse().ok(),
                b"tmdbid" => builder.tmdb_id = value.parse().ok(),
                b"tmdbseason" => builder.tmdb_season = value.parse().ok(),
                b"tmdboffset" => builder.tmdb_offset = value.parse().ok(),
                b"imdbid" => {
                    // Placeholder "unknown" and multi-id values are dropped.
                    if value.starts_with("tt") && !value.contains(',') {
                        builder.imdb_id = Some(value);
                    }
                }
                _ => {}
            }
        }
        builder
    }

    fn build(self) -> Option<AnimeListEntry> {
        Some(AnimeListEntry {
            anidb_id: self.anidb_id?,
            tvdb_id: self.tvdb_id,
            default_tvdb_season: self.default_tvdb_season,
            episode_offset: self.episode_offset,
            tmdb_id: self.tmdb_id,
            tmdb_season: self.tmdb_season,
            tmdb_offset: self.tmdb_offset,
            imdb_id: self.imdb_id,
            mappings: self.mappings,
        })
    }
}

fn mapping_from_attributes(element: &BytesStart<'_>) -> AnimeListMapping {
    let mut mapping = AnimeListMapping::default();
    for attr in element.attributes().flatten() {
        let value = String::from_utf8_lossy(&attr.value).to_string();
        match attr.key.as_ref() {
            b"anidbseason" => mapping.anidb_season = value.parse().unwrap_or(0),
            b"tvdbseason" => mapping.tvdb_season = value.parse().ok(),
            b"tmdbseason" => mapping.tmdb_season = value.parse().ok(),
            b"start" => mapping.start = value.parse().ok(),
            b"end" => mapping.end = value.parse().ok(),
            b"offset" => mapping.offset = value.parse().ok(),
            _ => {}
        }
    }
    mapping
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<anime-list>
  <anime anidbid="23" tvdbid="76885" defaulttvdbseason="1" imdbid="tt0213338" tmdbid="30991"/>
  <anime anidbid="2369" tvdbid="81472" defaulttvdbseason="a" episodeoffset="26">
    <mapping-list>
      <mapping anidbseason="0" tvdbseason="0">;1-5;2-6;</mapping>
      <mapping anidbseason="1" tvdbseason="1" start="1" end="26" offset="26"/>
    </mapping-list>
  </anime>
  <anime anidbid="8692" tvdbid="movie" imdbid="unknown"/>
  <anime tvdbid="1234"/>
</anime-list>"#;

    #[test]
    fn parses_entries_with_mappings() {
        let entries = parse_anime_list(SAMPLE.as_bytes(), true).unwrap();
        assert_eq!(entries.len(), 3);

        let first = &entries[0];
        assert_eq!(first.anidb_id, 23);
        assert_eq!(first.tvdb_id, Some(76885));
        assert_eq!(first.default_tvdb_season, Some(TvdbSeason::Number(1)));
        assert_eq!(first.imdb_id.as_deref(), Some("tt0213338"));

        let second = &entries[1];
        assert_eq!(second.default_tvdb_season, Some(TvdbSeason::Absolute));
        assert_eq!(second.episode_offset, Some(26));
        assert_eq!(second.mappings.len(), 2);
        assert_eq!(second.mappings[0].episodes.as_deref(), Some(";1-5;2-6;"));
        assert_eq!(second.mappings[1].offset, Some(26));

        // "movie"/"unknown" placeholders parse to None.
        let third = &entries[2];
        assert_eq!(third.tvdb_id, None);
        assert_eq!(third.imdb_id, None);
    }

    #[test]
    fn mapping_subtree_is_skipped_below_full_detail() {
        let entries = parse_anime_list(SAMPLE.as_bytes(), false).unwrap();
        assert!(entries[1].mappings.is_empty());
    }

    #[test]
    fn requires_anime_list_root() {
        let err = parse_anime_list(b"<wrong><anime anidbid=\"1\"/></wrong>", true);
        assert!(err.is_err());
    }
}
