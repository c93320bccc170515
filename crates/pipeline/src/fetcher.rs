use async_trait::async_trait;
use idparse::MediaKind;
use model::{ParsedStream, UserData};

/// One addon's answer to a stream request.
#[derive(Debug, Clone, Default)]
pub struct AddonResponse {
    pub addon: String,
    pub streams: Vec<ParsedStream>,
    /// Set when the addon errored; its streams are then empty.
    pub error: Option<String>,
}

/// Fans a request out to the enabled stream-provider addons. External
/// collaborator: transport and addon selection live behind this seam.
#[async_trait]
pub trait StreamFetcher: Send + Sync {
    /// One response per contacted addon. An empty vector means no addon
    /// answered at all (as opposed to addons answering with zero streams).
    async fn fetch(&self, kind: MediaKind, id: &str, user_data: &UserData) -> Vec<AddonResponse>;
}
