//! Inference client used to compress one text at a time.
//!
//! The Ollama-backed client talks to the chat endpoint directly over HTTP. Every call first
//! waits for the service to answer its health probe, then issues a single non-streaming chat
//! request and extracts `message.content` from the reply. Failures are classified so that
//! callers (and logs) can tell transport problems, undecodable payloads and structurally
//! incomplete answers apart.

use async_trait::async_trait;
use reqwest::StatusCode;
use thiserror::Error;

mod client;
pub mod readiness;
pub mod wire;

pub use client::{InferenceSettings, OllamaChatClient};
pub use readiness::{HealthProbe, ProbeFailure, Readiness, ReadinessGate, Sleeper, TokioSleeper};
pub use wire::{ChatMessage, ChatRequest, ChatResponse, decode_chat_response};

/// Returned instead of a model answer when the input holds no text.
pub const EMPTY_INPUT_SENTINEL: &str = "No text provided for summarization.";

/// Errors surfaced by a summarize call.
#[derive(Debug, Error)]
pub enum InferenceError {
    /// HTTP layer failed before a complete response was received (including timeouts).
    #[error("Inference request failed: {0}")]
    Transport(#[from] reqwest::Error),
    /// Service answered the chat request with a non-success status.
    #[error("Inference service returned {status}: {body}")]
    UnexpectedStatus {
        /// HTTP status returned by the service.
        status: StatusCode,
        /// Body associated with the failing response.
        body: String,
    },
    /// Response body was not JSON, or not a JSON object once unwrapped.
    #[error("Malformed inference response: {0}")]
    MalformedResponse(String),
    /// Response decoded fine but carried no usable `message.content`.
    #[error("Inference response has no usable message: {0}")]
    Structural(String),
    /// Waiting for the service was cancelled.
    #[error("Waiting for the inference service was cancelled")]
    Cancelled,
}

/// Coarse failure classes used for logging and assertions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Timeout, connection problem or non-2xx status.
    Transport,
    /// Invalid JSON or a non-object payload.
    MalformedResponse,
    /// Well-formed payload lacking `message.content`.
    Structural,
    /// Caller cancelled the readiness wait.
    Cancelled,
}

impl InferenceError {
    /// Classify the error.
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Transport(_) | Self::UnexpectedStatus { .. } => FailureKind::Transport,
            Self::MalformedResponse(_) => FailureKind::MalformedResponse,
            Self::Structural(_) => FailureKind::Structural,
            Self::Cancelled => FailureKind::Cancelled,
        }
    }
}

/// Interface implemented by text-generation backends.
#[async_trait]
pub trait InferenceClient: Send + Sync {
    /// Compress `text` into a shorter text.
    async fn summarize(&self, text: &str) -> Result<String, InferenceError>;
}
