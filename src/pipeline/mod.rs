//! Batch driver: one markdown summary per input document.
//!
//! Documents in the input directory are processed one at a time in file-name order. A document
//! is skipped when its summary already exists or when it splits into more initial chunks than
//! the admission limit allows. Failures are logged and counted; nothing is written for a
//! document that failed, and the run continues with the next one. Cancellation is the
//! exception: it ends the whole run with [`PipelineError::Cancelled`].

use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;
use tokio_util::sync::CancellationToken;
use walkdir::WalkDir;

use crate::config::Config;
use crate::metrics::{MetricsSnapshot, PipelineMetrics};
use crate::processing::{ChunkSet, ChunkingError, RecursiveReducer, ReduceError};
use crate::summarization::FailureKind;

pub mod extract;
pub mod output;

pub use extract::{DocumentExtractor, ExtractionError, TextExtractor};
pub use output::{markdown_path, write_markdown};

/// Errors that stop a pipeline run entirely.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Input directory could not be listed.
    #[error("Failed to list input directory {path}: {source}")]
    InputDirectory {
        /// Directory being listed.
        path: PathBuf,
        /// Underlying traversal failure.
        #[source]
        source: walkdir::Error,
    },
    /// Output directory could not be created.
    #[error("Failed to create output directory {path}: {source}")]
    OutputDirectory {
        /// Directory being created.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },
    /// Run was interrupted; documents after `processed` were left untouched.
    #[error("Run cancelled after {processed} documents")]
    Cancelled {
        /// Documents handled before the interruption.
        processed: usize,
    },
}

#[derive(Debug, Error)]
enum DocumentError {
    #[error(transparent)]
    Extraction(#[from] ExtractionError),
    #[error("Extraction task failed: {0}")]
    ExtractionTask(#[from] tokio::task::JoinError),
    #[error(transparent)]
    Chunking(#[from] ChunkingError),
    #[error(transparent)]
    Reduction(#[from] ReduceError),
    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl DocumentError {
    fn is_cancelled(&self) -> bool {
        matches!(self, Self::Reduction(error) if error.failure_kind() == Some(FailureKind::Cancelled))
    }
}

/// Per-run knobs taken from configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineSettings {
    /// Words per chunk when splitting a fresh document.
    pub chunk_size: usize,
    /// Reduction cycles applied to each document.
    pub cycles: u32,
    /// Documents with more initial chunks are skipped.
    pub max_initial_chunks: usize,
}

impl From<&Config> for PipelineSettings {
    fn from(config: &Config) -> Self {
        Self {
            chunk_size: config.chunk_size,
            cycles: config.chunking_cycles,
            max_initial_chunks: config.max_initial_chunks,
        }
    }
}

/// What happened to a single document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentOutcome {
    /// Summary written to the given path.
    Written(PathBuf),
    /// Summary already existed at the given path.
    SkippedExisting(PathBuf),
    /// Document exceeded the initial chunk limit.
    SkippedOversized {
        /// Initial chunk count of the document.
        chunks: usize,
    },
    /// Extraction, reduction or persistence failed.
    Failed {
        /// Rendered error.
        reason: String,
    },
}

/// Result of [`Pipeline::run`].
#[derive(Debug, Clone)]
pub struct PipelineSummary {
    /// Outcome per discovered document, in processing order.
    pub outcomes: Vec<(PathBuf, DocumentOutcome)>,
    /// Counters accumulated by the pipeline so far.
    pub metrics: MetricsSnapshot,
}

/// Drives extraction, chunking, reduction and persistence for a directory of documents.
pub struct Pipeline {
    reducer: RecursiveReducer,
    extractor: Arc<dyn TextExtractor>,
    settings: PipelineSettings,
    metrics: PipelineMetrics,
    cancel: CancellationToken,
}

impl Pipeline {
    /// Build a pipeline using the default [`DocumentExtractor`].
    pub fn new(reducer: RecursiveReducer, settings: PipelineSettings) -> Self {
        Self {
            reducer,
            extractor: Arc::new(DocumentExtractor),
            settings,
            metrics: PipelineMetrics::new(),
            cancel: CancellationToken::new(),
        }
    }

    /// Stop the run once `cancel` fires; no document is started afterwards.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Replace the text extractor.
    pub fn with_extractor(mut self, extractor: Arc<dyn TextExtractor>) -> Self {
        self.extractor = extractor;
        self
    }

    /// Current counters.
    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    /// List supported documents directly inside `input_dir`, sorted by file name.
    pub fn discover(&self, input_dir: &Path) -> Result<Vec<PathBuf>, PipelineError> {
        let mut documents = Vec::new();
        for entry in WalkDir::new(input_dir)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
        {
            let entry = entry.map_err(|source| PipelineError::InputDirectory {
                path: input_dir.to_path_buf(),
                source,
            })?;
            if entry.file_type().is_file() && self.extractor.supports(entry.path()) {
                documents.push(entry.into_path());
            }
        }
        Ok(documents)
    }

    /// Summarize every supported document of `input_dir` into `output_dir`.
    pub async fn run(
        &self,
        input_dir: &Path,
        output_dir: &Path,
    ) -> Result<PipelineSummary, PipelineError> {
        let documents = self.discover(input_dir)?;
        if documents.is_empty() {
            tracing::info!(input = %input_dir.display(), "No supported documents found");
            return Ok(PipelineSummary {
                outcomes: Vec::new(),
                metrics: self.metrics(),
            });
        }

        std::fs::create_dir_all(output_dir).map_err(|source| PipelineError::OutputDirectory {
            path: output_dir.to_path_buf(),
            source,
        })?;

        tracing::info!(
            input = %input_dir.display(),
            output = %output_dir.display(),
            documents = documents.len(),
            cycles = self.settings.cycles,
            "Starting pipeline"
        );

        let mut outcomes = Vec::with_capacity(documents.len());
        for document in documents {
            let outcome = self.process_document(&document, output_dir).await?;
            outcomes.push((document, outcome));
        }

        let metrics = self.metrics();
        tracing::info!(
            summarized = metrics.documents_summarized,
            skipped = metrics.documents_skipped,
            failed = metrics.documents_failed,
            inference_calls = metrics.inference_calls,
            "Pipeline finished"
        );

        Ok(PipelineSummary { outcomes, metrics })
    }

    /// Summarize one document into `output_dir`, never writing output for a failed document.
    ///
    /// Only cancellation is returned as an error; other failures become
    /// [`DocumentOutcome::Failed`].
    pub async fn process_document(
        &self,
        path: &Path,
        output_dir: &Path,
    ) -> Result<DocumentOutcome, PipelineError> {
        if self.cancel.is_cancelled() {
            return Err(self.cancelled(path));
        }

        let name = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| "document".into());
        let target = markdown_path(&name, output_dir);

        if target.exists() {
            tracing::info!(
                document = %path.display(),
                output = %target.display(),
                "Summary already exists; skipping"
            );
            self.metrics.record_skipped();
            return Ok(DocumentOutcome::SkippedExisting(target));
        }

        match self.summarize_document(path, &name, output_dir).await {
            Ok(outcome) => Ok(outcome),
            Err(error) if error.is_cancelled() => Err(self.cancelled(path)),
            Err(error) => {
                tracing::error!(document = %path.display(), error = %error, "Document failed");
                self.metrics.record_failed();
                Ok(DocumentOutcome::Failed {
                    reason: error.to_string(),
                })
            }
        }
    }

    fn cancelled(&self, path: &Path) -> PipelineError {
        let metrics = self.metrics();
        let processed = (metrics.documents_summarized
            + metrics.documents_skipped
            + metrics.documents_failed) as usize;
        tracing::warn!(document = %path.display(), processed, "Pipeline cancelled");
        PipelineError::Cancelled { processed }
    }

    async fn summarize_document(
        &self,
        path: &Path,
        name: &str,
        output_dir: &Path,
    ) -> Result<DocumentOutcome, DocumentError> {
        let extractor = Arc::clone(&self.extractor);
        let source = path.to_path_buf();
        let text = tokio::task::spawn_blocking(move || extractor.extract(&source)).await??;
        if text.trim().is_empty() {
            tracing::warn!(document = %path.display(), "Document contains no extractable text");
        }

        let chunks = ChunkSet::from_text(&text, self.settings.chunk_size)?;
        let initial_chunks = chunks.len();
        tracing::info!(document = %path.display(), chunks = initial_chunks, "Document chunked");

        if initial_chunks > self.settings.max_initial_chunks {
            tracing::warn!(
                document = %path.display(),
                chunks = initial_chunks,
                limit = self.settings.max_initial_chunks,
                "Too many chunks; skipping summarization"
            );
            self.metrics.record_skipped();
            return Ok(DocumentOutcome::SkippedOversized {
                chunks: initial_chunks,
            });
        }

        let report = self
            .reducer
            .reduce_with_report(self.settings.cycles, chunks)
            .await?;
        let written = write_markdown(name, &report.text, output_dir).map_err(|source| {
            DocumentError::Write {
                path: markdown_path(name, output_dir),
                source,
            }
        })?;

        self.metrics
            .record_summarized(initial_chunks as u64, report.inference_calls as u64);
        tracing::info!(
            document = %path.display(),
            output = %written.display(),
            bytes = report.text.len(),
            "Summary written"
        );
        Ok(DocumentOutcome::Written(written))
    }
}
