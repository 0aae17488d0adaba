#![deny(missing_docs)]

//! Core library for Rusty Digest, a recursive chunk-and-summarize document reducer.

/// Environment-driven configuration management.
pub mod config;
/// Structured logging and tracing setup.
pub mod logging;
/// Pipeline activity counters.
pub mod metrics;
/// Directory-level batch driver.
pub mod pipeline;
/// Word chunking and recursive reduction.
pub mod processing;
/// Inference clients backed by an Ollama chat service.
pub mod summarization;
