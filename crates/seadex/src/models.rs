use std::collections::HashSet;

use serde::{Deserialize, Serialize};

/// Best/all sets for one AniList entry.
///
/// `best` marks the releases SeaDex editors consider the definitive pick;
/// `all` is every listed release. Hashes are lowercase 40-char hex,
/// groups lowercase names.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeadexInfo {
    pub best_hashes: HashSet<String>,
    pub all_hashes: HashSet<String>,
    pub best_groups: HashSet<String>,
    pub all_groups: HashSet<String>,
}

impl SeadexInfo {
    pub fn is_empty(&self) -> bool {
        self.all_hashes.is_empty() && self.all_groups.is_empty()
    }
}
