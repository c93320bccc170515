use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Season layout of a series, as the catalog reports it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeasonInfo {
    pub number: u32,
    pub episode_count: u32,
    pub air_date: Option<NaiveDate>,
}

/// Merged metadata for one title.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MediaMetadata {
    pub tmdb_id: u64,
    pub title: String,
    /// Alternative titles, original title included.
    pub titles: Vec<String>,
    pub year: Option<i32>,
    /// Last year a series aired; None for movies and single-year runs.
    pub year_end: Option<i32>,
    pub genres: Vec<String>,
    /// Minutes.
    pub runtime: Option<u32>,
    /// ISO-639-1 code.
    pub original_language: Option<String>,
    pub seasons: Vec<SeasonInfo>,
    pub release_date: Option<NaiveDate>,
}

impl MediaMetadata {
    /// Every name this title is known under.
    pub fn all_titles(&self) -> Vec<String> {
        let mut titles = vec![self.title.clone()];
        for title in &self.titles {
            if !titles.iter().any(|known| known == title) {
                titles.push(title.clone());
            }
        }
        titles
    }
}

/// Movie release dates by channel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseDates {
    pub theatrical: Option<NaiveDate>,
    pub digital: Option<NaiveDate>,
    pub physical: Option<NaiveDate>,
}

impl ReleaseDates {
    /// Earliest date the movie is available outside theaters.
    pub fn earliest_home_release(&self) -> Option<NaiveDate> {
        match (self.digital, self.physical) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }
}
