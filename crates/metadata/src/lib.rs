//! Catalog metadata for the stream pipeline.
//!
//! Fetches titles, alternative titles, years, genres, runtime, season
//! layouts, movie release dates, and episode air dates from TMDB. The
//! [`MetadataProvider`] trait fronts the client so tests inject fixtures.

mod error;
mod language;
mod models;
mod provider;
mod tmdb;

pub use error::{MetadataError, Result};
pub use language::language_name;
pub use models::{MediaMetadata, ReleaseDates, SeasonInfo};
pub use provider::MetadataProvider;
pub use tmdb::CatalogClient;
