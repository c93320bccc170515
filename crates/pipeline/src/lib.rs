//! The per-request stream pipeline.
//!
//! Given a content id and a user's configuration, this crate materializes
//! the request context (anime identity, catalog metadata, release dates,
//! SeaDex sets, all fetched lazily and memoized), fans out to the stream
//! fetcher, and turns the raw candidate list into the final ranked,
//! filtered, deduplicated answer.
//!
//! ```ignore
//! let services = ContextServices { db, metadata, seadex, cache };
//! let context = Arc::new(StreamContext::new(MediaKind::Movie, "tt0111161", user_data, services));
//! let result = StreamPipeline::new(context).run(&fetcher).await;
//! ```

mod context;
mod dedup;
mod error;
mod fetcher;
mod filter;
mod pipeline;
mod precompute;
mod sort;

pub use context::{ContextServices, StreamContext};
pub use dedup::deduplicate;
pub use error::{PipelineError, Result};
pub use fetcher::{AddonResponse, StreamFetcher};
pub use pipeline::{PipelineResult, StreamPipeline};
pub use sort::sort_streams;
