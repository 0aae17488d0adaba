use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe counters describing pipeline activity.
#[derive(Default)]
pub struct PipelineMetrics {
    documents_summarized: AtomicU64,
    documents_skipped: AtomicU64,
    documents_failed: AtomicU64,
    initial_chunks: AtomicU64,
    inference_calls: AtomicU64,
}

impl PipelineMetrics {
    /// Create an empty metrics accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a summarized document with its initial chunk count and total inference calls.
    pub fn record_summarized(&self, initial_chunks: u64, inference_calls: u64) {
        self.documents_summarized.fetch_add(1, Ordering::Relaxed);
        self.initial_chunks
            .fetch_add(initial_chunks, Ordering::Relaxed);
        self.inference_calls
            .fetch_add(inference_calls, Ordering::Relaxed);
    }

    /// Record a document that was not processed (existing output or admission limit).
    pub fn record_skipped(&self) {
        self.documents_skipped.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a document whose extraction or reduction failed.
    pub fn record_failed(&self) {
        self.documents_failed.fetch_add(1, Ordering::Relaxed);
    }

    /// Return a snapshot of the current counters.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            documents_summarized: self.documents_summarized.load(Ordering::Relaxed),
            documents_skipped: self.documents_skipped.load(Ordering::Relaxed),
            documents_failed: self.documents_failed.load(Ordering::Relaxed),
            initial_chunks: self.initial_chunks.load(Ordering::Relaxed),
            inference_calls: self.inference_calls.load(Ordering::Relaxed),
        }
    }
}

/// Immutable view of pipeline counters used for reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetricsSnapshot {
    /// Documents whose summary was written.
    pub documents_summarized: u64,
    /// Documents skipped before reduction.
    pub documents_skipped: u64,
    /// Documents abandoned after a failure.
    pub documents_failed: u64,
    /// Initial chunks across summarized documents.
    pub initial_chunks: u64,
    /// Summarize calls across summarized documents.
    pub inference_calls: u64,
}
