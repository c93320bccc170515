//! Corpus loaders.
//!
//! Every loader follows the same contract: records that fail shape
//! validation are logged and skipped, never fatal; only an unreadable or
//! structurally unusable file is an error (which the refresh cycle answers
//! by forcing a remote refetch).

mod animelist;
mod anitrakt;
mod kitsu;
mod mappings;
mod offline;

pub use animelist::parse_anime_list;
pub use anitrakt::parse_anitrakt;
pub use kitsu::parse_kitsu_imdb;
pub use mappings::parse_mappings;
pub use offline::{parse_offline_database, OfflineTitle};
