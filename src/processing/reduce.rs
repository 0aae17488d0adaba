//! Recursive reduction of a chunk set into one summary.
//!
//! Each cycle summarizes every chunk of the current [`ChunkSet`], then re-chunks the
//! double-newline joined summaries with the downstream chunk size for the next cycle. The last
//! cycle's summaries are joined and returned as-is.

use std::sync::Arc;

use futures_util::{StreamExt, TryStreamExt, stream};

use crate::config::Config;
use crate::summarization::InferenceClient;

use super::types::{ChunkSet, ReduceError, ReductionReport};

/// Separator placed between summaries when joining a cycle's output.
pub const SUMMARY_SEPARATOR: &str = "\n\n";

/// Cycle control owned by a single `reduce` call.
#[derive(Debug)]
struct ReductionState {
    cycles_remaining: u32,
    chunks: ChunkSet,
}

/// Drives the fixed number of summarize/re-chunk cycles for a document.
pub struct RecursiveReducer {
    client: Arc<dyn InferenceClient>,
    downstream_chunk_size: usize,
    concurrency: usize,
}

impl RecursiveReducer {
    /// Build a reducer that re-chunks between cycles with `downstream_chunk_size` words.
    ///
    /// Chunks within a cycle are summarized one after another; see
    /// [`RecursiveReducer::with_concurrency`] to overlap calls.
    pub fn new(client: Arc<dyn InferenceClient>, downstream_chunk_size: usize) -> Self {
        Self {
            client,
            downstream_chunk_size,
            concurrency: 1,
        }
    }

    /// Build a reducer from the loaded configuration.
    pub fn from_config(client: Arc<dyn InferenceClient>, config: &Config) -> Self {
        Self::new(client, config.downstream_chunk_size).with_concurrency(config.summary_concurrency)
    }

    /// Allow up to `concurrency` summarize calls in flight within one cycle.
    ///
    /// Output order still follows chunk order, and a cycle never starts before the previous one
    /// has fully completed.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Reduce `initial` over `cycles` cycles and return the final text.
    ///
    /// With `cycles == 0` the original chunks are joined and returned without any inference
    /// call.
    pub async fn reduce(&self, cycles: u32, initial: ChunkSet) -> Result<String, ReduceError> {
        Ok(self.reduce_with_report(cycles, initial).await?.text)
    }

    /// Same as [`RecursiveReducer::reduce`], additionally reporting per-cycle counters.
    pub async fn reduce_with_report(
        &self,
        cycles: u32,
        initial: ChunkSet,
    ) -> Result<ReductionReport, ReduceError> {
        let mut state = ReductionState {
            cycles_remaining: cycles,
            chunks: initial,
        };
        let mut report = ReductionReport {
            text: String::new(),
            cycles_run: 0,
            inference_calls: 0,
            chunks_per_cycle: Vec::with_capacity(cycles as usize),
        };

        if state.cycles_remaining == 0 {
            tracing::debug!(
                chunks = state.chunks.len(),
                "Zero reduction cycles requested; returning chunks unsummarized"
            );
            report.text = state.chunks.join(SUMMARY_SEPARATOR);
            return Ok(report);
        }

        loop {
            let cycle = report.cycles_run + 1;
            let chunk_count = state.chunks.len();
            tracing::info!(
                cycle,
                remaining = state.cycles_remaining,
                chunks = chunk_count,
                "Starting reduction cycle"
            );

            let summaries = self.summarize_cycle(cycle, &state.chunks).await?;
            report.cycles_run = cycle;
            report.inference_calls += chunk_count;
            report.chunks_per_cycle.push(chunk_count);

            let joined = summaries.join(SUMMARY_SEPARATOR);
            state.cycles_remaining -= 1;

            if state.cycles_remaining == 0 {
                report.text = joined;
                tracing::info!(
                    cycles = report.cycles_run,
                    calls = report.inference_calls,
                    "Reduction complete"
                );
                return Ok(report);
            }

            state.chunks = ChunkSet::from_text(&joined, self.downstream_chunk_size)
                .map_err(|source| ReduceError::Chunking { cycle, source })?;
            tracing::info!(
                cycle,
                chunks = state.chunks.len(),
                chunk_size = self.downstream_chunk_size,
                "Chunked summaries again"
            );
        }
    }

    async fn summarize_cycle(
        &self,
        cycle: u32,
        chunks: &ChunkSet,
    ) -> Result<Vec<String>, ReduceError> {
        let client = &self.client;
        stream::iter(chunks.iter().map(move |chunk| async move {
            tracing::debug!(cycle, chunk = chunk.index(), "Summarizing chunk");
            client
                .summarize(chunk.text())
                .await
                .map_err(|source| {
                    tracing::error!(
                        cycle,
                        chunk = chunk.index(),
                        kind = ?source.kind(),
                        error = %source,
                        "Chunk summarization failed"
                    );
                    ReduceError::Inference {
                        cycle,
                        chunk: chunk.index(),
                        source,
                    }
                })
        }))
        .buffered(self.concurrency)
        .try_collect()
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::summarization::{FailureKind, InferenceError};
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Records every input and answers with a deterministic transformation.
    struct RecordingClient {
        calls: Mutex<Vec<String>>,
        fail_on_call: Option<usize>,
    }

    impl RecordingClient {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                calls: Mutex::new(Vec::new()),
                fail_on_call: None,
            })
        }

        fn failing_on(call: usize) -> Arc<Self> {
            Arc::new(Self {
                calls: Mutex::new(Vec::new()),
                fail_on_call: Some(call),
            })
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().expect("calls lock").clone()
        }
    }

    #[async_trait]
    impl InferenceClient for RecordingClient {
        async fn summarize(&self, text: &str) -> Result<String, InferenceError> {
            let call = {
                let mut calls = self.calls.lock().expect("calls lock");
                calls.push(text.to_string());
                calls.len()
            };
            if self.fail_on_call == Some(call) {
                return Err(InferenceError::Structural("message missing".into()));
            }
            let first = text.split_whitespace().next().unwrap_or("");
            Ok(format!("sum({first}) x{}", text.split_whitespace().count()))
        }
    }

    fn words(count: usize) -> String {
        (0..count)
            .map(|n| format!("w{n}"))
            .collect::<Vec<_>>()
            .join(" ")
    }

    #[tokio::test]
    async fn zero_cycles_pass_chunks_through() {
        let client = RecordingClient::new();
        let reducer = RecursiveReducer::new(client.clone(), 4);
        let chunks = ChunkSet::from_texts(["first chunk", "second chunk"]);

        let report = reducer
            .reduce_with_report(0, chunks)
            .await
            .expect("reduction");

        assert_eq!(report.text, "first chunk\n\nsecond chunk");
        assert_eq!(report.cycles_run, 0);
        assert_eq!(report.inference_calls, 0);
        assert!(client.calls().is_empty());
    }

    #[tokio::test]
    async fn single_cycle_joins_summaries_without_rechunking() {
        let client = RecordingClient::new();
        let reducer = RecursiveReducer::new(client.clone(), 1);
        let chunks = ChunkSet::from_text(&words(600), 256).expect("chunks");

        let text = reducer.reduce(1, chunks).await.expect("reduction");

        assert_eq!(client.calls().len(), 3);
        assert_eq!(
            text,
            "sum(w0) x256\n\nsum(w256) x256\n\nsum(w512) x88"
        );
    }

    #[tokio::test]
    async fn later_cycles_consume_previous_summaries_only() {
        let client = RecordingClient::new();
        let reducer = RecursiveReducer::new(client.clone(), 3);
        let chunks = ChunkSet::from_texts(["a b c", "d e f", "g h i", "j k l"]);

        let report = reducer
            .reduce_with_report(2, chunks)
            .await
            .expect("reduction");

        let calls = client.calls();
        // Four two-word summaries re-chunk into three chunks of at most three words.
        assert_eq!(report.chunks_per_cycle, vec![4, 3]);
        assert_eq!(report.inference_calls, 7);
        assert_eq!(calls.len(), 7);
        assert_eq!(&calls[..4], &["a b c", "d e f", "g h i", "j k l"]);
        assert_eq!(calls[4], "sum(a) x3 sum(d)");
        assert_eq!(calls[5], "x3 sum(g) x3");
        assert_eq!(calls[6], "sum(j) x3");
        assert_eq!(report.cycles_run, 2);
        assert_eq!(report.text.split(SUMMARY_SEPARATOR).count(), 3);
    }

    #[tokio::test]
    async fn call_count_matches_sum_of_cycle_sizes() {
        let client = RecordingClient::new();
        let reducer = RecursiveReducer::new(client.clone(), 2);
        let chunks = ChunkSet::from_text(&words(20), 5).expect("chunks");

        let report = reducer
            .reduce_with_report(3, chunks)
            .await
            .expect("reduction");

        assert_eq!(report.chunks_per_cycle.len(), 3);
        assert_eq!(
            report.inference_calls,
            report.chunks_per_cycle.iter().sum::<usize>()
        );
        assert_eq!(client.calls().len(), report.inference_calls);
    }

    #[tokio::test]
    async fn single_chunk_still_runs_every_cycle() {
        let client = RecordingClient::new();
        let reducer = RecursiveReducer::new(client.clone(), 100);

        let report = reducer
            .reduce_with_report(3, ChunkSet::from_texts(["only chunk"]))
            .await
            .expect("reduction");

        assert_eq!(report.chunks_per_cycle, vec![1, 1, 1]);
        assert_eq!(client.calls().len(), 3);
    }

    #[tokio::test]
    async fn failure_aborts_reduction() {
        let client = RecordingClient::failing_on(2);
        let reducer = RecursiveReducer::new(client.clone(), 2);
        let chunks = ChunkSet::from_texts(["a", "b", "c"]);

        let error = reducer.reduce(2, chunks).await.expect_err("abort");

        assert!(matches!(
            error,
            ReduceError::Inference { cycle: 1, chunk: 1, .. }
        ));
        assert_eq!(error.failure_kind(), Some(FailureKind::Structural));
        assert_eq!(client.calls().len(), 2);
    }

    #[tokio::test]
    async fn concurrent_cycle_preserves_order() {
        let client = RecordingClient::new();
        let reducer = RecursiveReducer::new(client.clone(), 10).with_concurrency(4);
        let chunks = ChunkSet::from_texts(["a", "b c", "d e f", "g h i j", "k"]);

        let text = reducer.reduce(1, chunks).await.expect("reduction");

        assert_eq!(
            text,
            "sum(a) x1\n\nsum(b) x2\n\nsum(d) x3\n\nsum(g) x4\n\nsum(k) x1"
        );
    }

    #[tokio::test]
    async fn empty_chunk_set_yields_empty_text() {
        let client = RecordingClient::new();
        let reducer = RecursiveReducer::new(client.clone(), 10);

        let text = reducer
            .reduce(2, ChunkSet::default())
            .await
            .expect("reduction");

        assert!(text.is_empty());
        assert!(client.calls().is_empty());
    }
}
