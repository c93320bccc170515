//! TMDB-backed catalog client.

use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use idparse::{IdSource, MediaKind};
use reqwest::Client;
use serde::Deserialize;

use crate::error::{MetadataError, Result};
use crate::models::{MediaMetadata, ReleaseDates, SeasonInfo};
use crate::provider::MetadataProvider;

const BASE_URL: &str = "https://api.themoviedb.org/3";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

pub struct CatalogClient {
    client: Client,
    api_key: String,
}

impl CatalogClient {
    /// Create a client over a caller-supplied reqwest `Client`.
    pub fn with_client(client: Client, api_key: impl Into<String>) -> Self {
        Self {
            client,
            api_key: api_key.into(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{BASE_URL}{path}")
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T> {
        let response = self
            .client
            .get(self.url(path))
            .timeout(REQUEST_TIMEOUT)
            .query(&[("api_key", self.api_key.as_str())])
            .query(query)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(MetadataError::Api {
                status_code: status.as_u16(),
                message,
            });
        }
        Ok(response.json().await?)
    }
}

#[async_trait]
impl MetadataProvider for CatalogClient {
    async fn find_tmdb_id(
        &self,
        kind: MediaKind,
        source: IdSource,
        value: &str,
    ) -> Result<Option<u64>> {
        let external_source = match source {
            IdSource::Imdb => "imdb_id",
            IdSource::Tvdb => "tvdb_id",
            _ => return Ok(None),
        };

        let found: FindResponse = self
            .get_json(
                &format!("/find/{value}"),
                &[("external_source", external_source)],
            )
            .await?;

        let id = match kind {
            MediaKind::Movie => found.movie_results.first().map(|r| r.id),
            _ => found
                .tv_results
                .first()
                .map(|r| r.id)
                .or_else(|| found.movie_results.first().map(|r| r.id)),
        };
        Ok(id)
    }

    async fn get_metadata(&self, kind: MediaKind, tmdb_id: u64) -> Result<Option<MediaMetadata>> {
        let query = [("append_to_response", "alternative_titles")];
        let metadata = match kind {
            MediaKind::Movie => {
                let raw: MovieResponse = self
                    .get_json(&format!("/movie/{tmdb_id}"), &query)
                    .await?;
                metadata_from_movie(raw)
            }
            _ => {
                let raw: TvResponse = self.get_json(&format!("/tv/{tmdb_id}"), &query).await?;
                metadata_from_tv(raw)
            }
        };
        Ok(Some(metadata))
    }

    async fn get_release_dates(&self, tmdb_id: u64) -> Result<Option<ReleaseDates>> {
        let raw: ReleaseDatesResponse = self
            .get_json(&format!("/movie/{tmdb_id}/release_dates"), &[])
            .await?;
        Ok(Some(release_dates_from_response(raw)))
    }

    async fn get_episode_air_date(
        &self,
        tmdb_id: u64,
        season: u32,
        episode: u32,
    ) -> Result<Option<NaiveDate>> {
        let raw: EpisodeResponse = self
            .get_json(&format!("/tv/{tmdb_id}/season/{season}/episode/{episode}"), &[])
            .await?;
        Ok(raw.air_date.as_deref().and_then(parse_date))
    }

    fn name(&self) -> &'static str {
        "tmdb"
    }
}

// --- wire models -----------------------------------------------------------

#[derive(Debug, Deserialize)]
struct FindResponse {
    #[serde(default)]
    movie_results: Vec<FindResult>,
    #[serde(default)]
    tv_results: Vec<FindResult>,
}

#[derive(Debug, Deserialize)]
struct FindResult {
    id: u64,
}

#[derive(Debug, Deserialize)]
struct Genre {
    name: String,
}

#[derive(Debug, Default, Deserialize)]
struct AlternativeTitles {
    #[serde(default)]
    titles: Vec<AlternativeTitle>,
    /// Movies use `titles`, series use `results`.
    #[serde(default)]
    results: Vec<AlternativeTitle>,
}

#[derive(Debug, Deserialize)]
struct AlternativeTitle {
    title: String,
}

#[derive(Debug, Deserialize)]
struct MovieResponse {
    id: u64,
    title: String,
    original_title: Option<String>,
    release_date: Option<String>,
    #[serde(default)]
    genres: Vec<Genre>,
    runtime: Option<u32>,
    original_language: Option<String>,
    #[serde(default)]
    alternative_titles: AlternativeTitles,
}

#[derive(Debug, Deserialize)]
struct TvResponse {
    id: u64,
    name: String,
    original_name: Option<String>,
    first_air_date: Option<String>,
    last_air_date: Option<String>,
    #[serde(default)]
    genres: Vec<Genre>,
    #[serde(default)]
    episode_run_time: Vec<u32>,
    original_language: Option<String>,
    #[serde(default)]
    seasons: Vec<TvSeason>,
    #[serde(default)]
    alternative_titles: AlternativeTitles,
}

#[derive(Debug, Deserialize)]
struct TvSeason {
    season_number: u32,
    #[serde(default)]
    episode_count: u32,
    air_date: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ReleaseDatesResponse {
    #[serde(default)]
    results: Vec<CountryReleases>,
}

#[derive(Debug, Deserialize)]
struct CountryReleases {
    #[serde(default)]
    release_dates: Vec<ReleaseDateEntry>,
}

#[derive(Debug, Deserialize)]
struct ReleaseDateEntry {
    /// 3 = theatrical, 4 = digital, 5 = physical.
    #[serde(rename = "type")]
    kind: u8,
    release_date: String,
}

#[derive(Debug, Deserialize)]
struct EpisodeResponse {
    air_date: Option<String>,
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    // Release dates may carry a time component.
    let date_part = raw.split('T').next().unwrap_or(raw);
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d").ok()
}

fn parse_year(raw: &Option<String>) -> Option<i32> {
    raw.as_deref()
        .and_then(|date| date.split('-').next())
        .and_then(|year| year.parse().ok())
}

fn metadata_from_movie(raw: MovieResponse) -> MediaMetadata {
    let mut titles: Vec<String> = raw
        .alternative_titles
        .titles
        .into_iter()
        .map(|t| t.title)
        .collect();
    if let Some(original) = raw.original_title {
        if original != raw.title && !titles.contains(&original) {
            titles.insert(0, original);
        }
    }

    MediaMetadata {
        tmdb_id: raw.id,
        title: raw.title,
        titles,
        year: parse_year(&raw.release_date),
        year_end: None,
        genres: raw.genres.into_iter().map(|g| g.name).collect(),
        runtime: raw.runtime,
        original_language: raw.original_language,
        seasons: Vec::new(),
        release_date: raw.release_date.as_deref().and_then(parse_date),
    }
}

fn metadata_from_tv(raw: TvResponse) -> MediaMetadata {
    let mut titles: Vec<String> = raw
        .alternative_titles
        .results
        .into_iter()
        .map(|t| t.title)
        .collect();
    if let Some(original) = raw.original_name {
        if original != raw.name && !titles.contains(&original) {
            titles.insert(0, original);
        }
    }

    let year = parse_year(&raw.first_air_date);
    let year_end = parse_year(&raw.last_air_date).filter(|end| Some(*end) != year);

    MediaMetadata {
        tmdb_id: raw.id,
        title: raw.name,
        titles,
        year,
        year_end,
        genres: raw.genres.into_iter().map(|g| g.name).collect(),
        runtime: raw.episode_run_time.first().copied(),
        original_language: raw.original_language,
        seasons: raw
            .seasons
            .into_iter()
            .map(|s| SeasonInfo {
                number: s.season_number,
                episode_count: s.episode_count,
                air_date: s.air_date.as_deref().and_then(parse_date),
            })
            .collect(),
        release_date: raw.first_air_date.as_deref().and_then(parse_date),
    }
}

fn release_dates_from_response(raw: ReleaseDatesResponse) -> ReleaseDates {
    let mut dates = ReleaseDates::default();
    for country in raw.results {
        for entry in country.release_dates {
            let Some(date) = parse_date(&entry.release_date) else {
                continue;
            };
            let slot = match entry.kind {
                3 => &mut dates.theatrical,
                4 => &mut dates.digital,
                5 => &mut dates.physical,
                _ => continue,
            };
            // Earliest date per channel across all regions.
            if slot.map(|existing| date < existing).unwrap_or(true) {
                *slot = Some(date);
            }
        }
    }
    dates
}
