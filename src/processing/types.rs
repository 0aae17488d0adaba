//! Core data types and error definitions for chunking and recursive reduction.

use crate::summarization::{FailureKind, InferenceError};
use thiserror::Error;

/// Errors produced while splitting text into word-bounded chunks.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChunkingError {
    /// Caller requested chunks of zero words.
    #[error("chunk size must be greater than zero")]
    InvalidChunkSize,
}

/// Errors that abort a reduction.
///
/// Reductions are never retried internally: the first failing chunk ends the whole call.
#[derive(Debug, Error)]
pub enum ReduceError {
    /// Summaries of a finished cycle could not be re-chunked for the next cycle.
    #[error("Failed to re-chunk summaries after cycle {cycle}: {source}")]
    Chunking {
        /// One-based cycle whose output was being re-chunked.
        cycle: u32,
        /// Underlying chunking failure.
        #[source]
        source: ChunkingError,
    },
    /// The inference service failed to summarize a chunk.
    #[error("Summarization failed in cycle {cycle} at chunk {chunk}: {source}")]
    Inference {
        /// One-based cycle that was running.
        cycle: u32,
        /// Index of the failing chunk within that cycle's chunk set.
        chunk: usize,
        /// Classified inference failure.
        #[source]
        source: InferenceError,
    },
}

impl ReduceError {
    /// Classification of the inference failure behind this error, if any.
    pub fn failure_kind(&self) -> Option<FailureKind> {
        match self {
            Self::Chunking { .. } => None,
            Self::Inference { source, .. } => Some(source.kind()),
        }
    }
}

/// A word-bounded slice of text used as one unit of inference input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    index: usize,
    text: String,
}

impl Chunk {
    pub(crate) fn new(index: usize, text: String) -> Self {
        Self { index, text }
    }

    /// Position of the chunk within its chunk set.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Words of the chunk joined by single spaces.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Number of words in the chunk.
    pub fn word_count(&self) -> usize {
        self.text.split_whitespace().count()
    }

    /// Consume the chunk, returning its text.
    pub fn into_text(self) -> String {
        self.text
    }
}

/// Ordered chunks forming the input of one reduction cycle.
///
/// Order is insertion order and determines the join order of the final summary.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChunkSet {
    chunks: Vec<Chunk>,
}

impl ChunkSet {
    /// Split `text` into chunks of at most `size` words.
    pub fn from_text(text: &str, size: usize) -> Result<Self, ChunkingError> {
        Ok(super::chunking::chunk_text(text, size)?.collect())
    }

    /// Build a chunk set from pre-split texts, assigning indexes in iteration order.
    pub fn from_texts<I, S>(texts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            chunks: texts
                .into_iter()
                .enumerate()
                .map(|(index, text)| Chunk::new(index, text.into()))
                .collect(),
        }
    }

    /// Number of chunks in the set.
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    /// Whether the set holds no chunks.
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Iterate chunks in order.
    pub fn iter(&self) -> std::slice::Iter<'_, Chunk> {
        self.chunks.iter()
    }

    /// Concatenate chunk texts in order with `separator` between them.
    pub fn join(&self, separator: &str) -> String {
        self.chunks
            .iter()
            .map(Chunk::text)
            .collect::<Vec<_>>()
            .join(separator)
    }
}

impl FromIterator<Chunk> for ChunkSet {
    fn from_iter<T: IntoIterator<Item = Chunk>>(iter: T) -> Self {
        Self {
            chunks: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for ChunkSet {
    type Item = Chunk;
    type IntoIter = std::vec::IntoIter<Chunk>;

    fn into_iter(self) -> Self::IntoIter {
        self.chunks.into_iter()
    }
}

impl<'a> IntoIterator for &'a ChunkSet {
    type Item = &'a Chunk;
    type IntoIter = std::slice::Iter<'a, Chunk>;

    fn into_iter(self) -> Self::IntoIter {
        self.chunks.iter()
    }
}

/// Outcome of a completed reduction produced by
/// [`crate::processing::RecursiveReducer::reduce_with_report`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReductionReport {
    /// Final summary text.
    pub text: String,
    /// Number of cycles that actually ran.
    pub cycles_run: u32,
    /// Total summarize calls issued across all cycles.
    pub inference_calls: usize,
    /// Size of the chunk set fed into each cycle, in order.
    pub chunks_per_cycle: Vec<usize>,
}
