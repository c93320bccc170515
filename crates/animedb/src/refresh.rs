//! ETag-conditional corpus refresh and the per-source timers.
//!
//! Per cycle: HEAD the remote for its `ETag` and compare with the locally
//! stored tag. When the data file is missing, the tags differ, or either
//! tag is absent, GET the body streamed to disk and persist the new tag.
//! Then hand the file to the source's loader. A loader failure on a pass
//! that did not download deletes the local file and tag, forcing a remote
//! refetch on the next cycle.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use parking_lot::Mutex;
use tokio::io::AsyncWriteExt;
use tokio::task::JoinHandle;

use crate::error::Result;
use crate::sources::SourceKind;
use crate::AnimeDatabase;

const HEAD_TIMEOUT: Duration = Duration::from_secs(15);
const GET_TIMEOUT: Duration = Duration::from_secs(90);
const RETRY_ATTEMPTS: u32 = 3;
const RETRY_BASE_DELAY: Duration = Duration::from_millis(500);

/// Run `op` up to `attempts` times with exponential backoff between
/// failures, logging each failure under `label`.
pub(crate) async fn retry_with_backoff<T, F, Fut>(
    label: &str,
    attempts: u32,
    base_delay: Duration,
    op: F,
) -> Result<T>
where
    F: Fn() -> Fut,
    Fut: std::future::Future<Output = Result<T>>,
{
    let mut delay = base_delay;
    let mut last_error = None;
    for attempt in 1..=attempts {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) => {
                tracing::warn!("[{}] attempt {}/{} failed: {}", label, attempt, attempts, e);
                last_error = Some(e);
                if attempt < attempts {
                    tokio::time::sleep(delay).await;
                    delay *= 2;
                }
            }
        }
    }
    Err(last_error.expect("at least one attempt"))
}

pub(crate) async fn refresh_source_with_retry(db: &AnimeDatabase, kind: SourceKind) -> Result<()> {
    retry_with_backoff(kind.name(), RETRY_ATTEMPTS, RETRY_BASE_DELAY, || {
        refresh_source(db, kind)
    })
    .await
}

/// One refresh cycle for one source.
async fn refresh_source(db: &AnimeDatabase, kind: SourceKind) -> Result<()> {
    let config = db.config();
    let data_path = kind.data_path(config);
    let etag_path = kind.etag_path(config);

    let local_etag = std::fs::read_to_string(&etag_path).ok();
    let remote_etag = head_etag(db, kind).await?;

    // Tags are opaque and compared byte-exact; a missing tag on either side
    // always forces a download.
    let must_download = !data_path.exists()
        || local_etag.is_none()
        || remote_etag.is_none()
        || local_etag != remote_etag;

    if must_download {
        tracing::info!("[{}] downloading corpus", kind.name());
        download_to(db, kind, &data_path).await?;
        match &remote_etag {
            Some(tag) => tokio::fs::write(&etag_path, tag).await?,
            None => {
                let _ = tokio::fs::remove_file(&etag_path).await;
            }
        }
    } else {
        tracing::debug!("[{}] corpus unchanged (etag match)", kind.name());
    }

    match db.load_source_from_disk(kind) {
        Ok(count) => {
            tracing::info!("[{}] loaded {} records", kind.name(), count);
            Ok(())
        }
        Err(e) if !must_download => {
            // The cached file is unusable; drop it so the next cycle
            // refetches from the remote.
            tracing::warn!(
                "[{}] cached corpus failed to load, forcing refetch: {}",
                kind.name(),
                e
            );
            let _ = std::fs::remove_file(&data_path);
            let _ = std::fs::remove_file(&etag_path);
            Err(e)
        }
        Err(e) => Err(e),
    }
}

async fn head_etag(db: &AnimeDatabase, kind: SourceKind) -> Result<Option<String>> {
    let response = db
        .http_client()
        .head(kind.url())
        .timeout(HEAD_TIMEOUT)
        .send()
        .await?
        .error_for_status()?;
    Ok(response
        .headers()
        .get(reqwest::header::ETAG)
        .and_then(|v| v.to_str().ok())
        .map(String::from))
}

/// Stream the corpus body to disk, writing through a temp file so a failed
/// download never clobbers a loadable copy.
async fn download_to(db: &AnimeDatabase, kind: SourceKind, path: &Path) -> Result<()> {
    let response = db
        .http_client()
        .get(kind.url())
        .timeout(GET_TIMEOUT)
        .send()
        .await?
        .error_for_status()?;

    let tmp_path = path.with_extension("tmp");
    let mut file = tokio::fs::File::create(&tmp_path).await?;
    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        file.write_all(&chunk).await?;
    }
    file.flush().await?;
    drop(file);

    tokio::fs::rename(&tmp_path, path).await?;
    Ok(())
}

/// Per-source refresh timers. Each source runs on its own interval in its
/// own task; `shutdown` aborts them all.
pub struct RefreshScheduler {
    handles: Mutex<Vec<JoinHandle<()>>>,
}

impl RefreshScheduler {
    /// A scheduler with no jobs (database disabled).
    pub fn idle() -> Self {
        Self {
            handles: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn start(db: Arc<AnimeDatabase>) -> Self {
        let handles = SourceKind::ALL
            .map(|kind| {
                let db = Arc::clone(&db);
                tokio::spawn(async move {
                    let interval = db.config().refresh_interval(kind);
                    let mut timer = tokio::time::interval(interval);
                    timer.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
                    // The immediate first tick is consumed; init() already
                    // refreshed every source.
                    timer.tick().await;

                    loop {
                        timer.tick().await;
                        if let Err(e) = refresh_source_with_retry(&db, kind).await {
                            tracing::error!("[{}] refresh failed: {}", kind.name(), e);
                        }
                    }
                })
            })
            .into_iter()
            .collect();

        Self {
            handles: Mutex::new(handles),
        }
    }

    pub fn job_count(&self) -> usize {
        self.handles.lock().len()
    }

    /// Stop all refresh timers. In-flight request handling is unaffected;
    /// the indices simply stop being refreshed.
    pub fn shutdown(&self) {
        for handle in self.handles.lock().drain(..) {
            handle.abort();
        }
    }
}

impl Drop for RefreshScheduler {
    fn drop(&mut self) {
        self.shutdown();
    }
}
