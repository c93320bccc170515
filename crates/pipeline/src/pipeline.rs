//! Pipeline orchestration.
//!
//! Per request, in strict order: fetch, SeaDex precompute, filter,
//! preferred/ranked precompute, sort, deduplicate. Context fetches run
//! concurrently with the addon fan-out, and every stage degrades
//! gracefully: the only "failure" shape is an empty result with a status
//! message when no addon answered at all.

use std::sync::Arc;

use model::ParsedStream;
use serde_json::Value;

use crate::context::StreamContext;
use crate::dedup::deduplicate;
use crate::fetcher::StreamFetcher;
use crate::filter::{filter_streams, FilterInputs};
use crate::precompute::{
    precompute_preferred_expressions, precompute_preferred_patterns, precompute_ranked_expressions,
    precompute_seadex,
};
use crate::sort::sort_streams;

/// The pipeline's answer: the final ordered list plus an optional
/// user-facing status message.
#[derive(Debug, Default)]
pub struct PipelineResult {
    pub streams: Vec<ParsedStream>,
    pub message: Option<String>,
}

pub struct StreamPipeline {
    context: Arc<StreamContext>,
}

impl StreamPipeline {
    pub fn new(context: Arc<StreamContext>) -> Self {
        Self { context }
    }

    pub fn context(&self) -> &Arc<StreamContext> {
        &self.context
    }

    pub async fn run(&self, fetcher: &dyn StreamFetcher) -> PipelineResult {
        let context = &self.context;
        let user_data = context.user_data().clone();

        // Context fetches overlap with the addon fan-out.
        Arc::clone(context).start_all();
        let responses = fetcher
            .fetch(context.kind(), context.id(), &user_data)
            .await;

        if responses.is_empty() {
            tracing::warn!("no addon responses for {}", context.id());
            return PipelineResult {
                streams: Vec::new(),
                message: Some("no addons responded to this request".to_string()),
            };
        }

        let mut streams: Vec<ParsedStream> = Vec::new();
        for response in responses {
            if let Some(error) = response.error {
                tracing::warn!("addon {} failed: {}", response.addon, error);
                continue;
            }
            streams.extend(response.streams);
        }
        tracing::debug!("fetched {} streams for {}", streams.len(), context.id());

        // 1. SeaDex tagging happens before any filter so expressions can
        //    reference membership.
        if let Some(info) = context.get_seadex().await {
            precompute_seadex(&mut streams, &info);
        }

        // 2. Filter.
        let expression_context = context.expression_context().await;
        let inputs = FilterInputs::gather(context).await;
        let records = to_records(&streams);
        let mut streams = filter_streams(
            streams,
            &records,
            &expression_context,
            &user_data,
            &inputs,
        );

        // 3. Preferred and ranked annotations on the survivors.
        precompute_preferred_patterns(&mut streams, &user_data);
        let records = to_records(&streams);
        precompute_preferred_expressions(
            &mut streams,
            &records,
            &expression_context,
            &user_data.preferred_stream_expressions,
        );
        precompute_ranked_expressions(
            &mut streams,
            &records,
            &expression_context,
            &user_data.ranked_stream_expressions,
        );

        // 4. Sort, then deduplicate against the sorted order.
        sort_streams(
            &mut streams,
            &user_data.sort_criteria.global,
            &user_data.preferred_resolutions,
        );
        let streams = deduplicate(streams, &user_data.deduplicator);

        PipelineResult {
            streams,
            message: None,
        }
    }
}

fn to_records(streams: &[ParsedStream]) -> Vec<Value> {
    streams
        .iter()
        .map(|stream| serde_json::to_value(stream).unwrap_or(Value::Null))
        .collect()
}
