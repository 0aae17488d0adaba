//! HTTP client for the Ollama chat endpoint.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use tokio_util::sync::CancellationToken;

use crate::config::Config;

use super::readiness::{HealthProbe, ProbeFailure, ReadinessGate, Sleeper};
use super::wire::{ChatRequest, decode_chat_response};
use super::{EMPTY_INPUT_SENTINEL, InferenceClient, InferenceError};

const CHAT_PATH: &str = "api/chat/";

/// Connection settings for [`OllamaChatClient`].
#[derive(Debug, Clone)]
pub struct InferenceSettings {
    /// Service base URL; also the health probe target.
    pub base_url: String,
    /// Model identifier sent with every request.
    pub model: String,
    /// Timeout applied to each chat request and health probe.
    pub request_timeout: Duration,
    /// Delay between failed health probes.
    pub health_interval: Duration,
}

impl From<&Config> for InferenceSettings {
    fn from(config: &Config) -> Self {
        Self {
            base_url: config.ollama_api_url.clone(),
            model: config.ollama_model.clone(),
            request_timeout: config.request_timeout,
            health_interval: config.health_interval,
        }
    }
}

/// Stateless chat client; only its immutable settings survive between calls.
pub struct OllamaChatClient {
    http: Client,
    base_url: String,
    model: String,
    request_timeout: Duration,
    gate: ReadinessGate,
}

impl OllamaChatClient {
    /// Build a client whose readiness wait can be aborted through `cancel`.
    pub fn new(
        settings: InferenceSettings,
        cancel: CancellationToken,
    ) -> Result<Self, InferenceError> {
        let http = Client::builder().user_agent("rusty-digest/0.1").build()?;
        let base_url = settings.base_url.trim_end_matches('/').to_string();
        tracing::debug!(
            url = %base_url,
            model = %settings.model,
            timeout_secs = settings.request_timeout.as_secs(),
            "Initialized inference client"
        );

        Ok(Self {
            http,
            base_url,
            model: settings.model,
            request_timeout: settings.request_timeout,
            gate: ReadinessGate::new(settings.health_interval, cancel),
        })
    }

    /// Replace the delay source used between failed health probes.
    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.gate = self.gate.with_sleeper(sleeper);
        self
    }

    fn chat_endpoint(&self) -> String {
        format!("{}/{CHAT_PATH}", self.base_url)
    }
}

#[async_trait]
impl HealthProbe for OllamaChatClient {
    async fn probe(&self) -> Result<(), ProbeFailure> {
        let response = self
            .http
            .get(&self.base_url)
            .timeout(self.request_timeout)
            .send()
            .await
            .map_err(|error| ProbeFailure::Unreachable(error.to_string()))?;

        match response.status() {
            StatusCode::OK => Ok(()),
            status => Err(ProbeFailure::Status(status)),
        }
    }
}

#[async_trait]
impl InferenceClient for OllamaChatClient {
    async fn summarize(&self, text: &str) -> Result<String, InferenceError> {
        if text.trim().is_empty() {
            tracing::debug!("Empty input; skipping inference call");
            return Ok(EMPTY_INPUT_SENTINEL.to_string());
        }

        self.gate.wait_until_ready(self).await?;

        let request = ChatRequest::user(&self.model, text);
        let response = self
            .http
            .post(self.chat_endpoint())
            .timeout(self.request_timeout)
            .json(&request)
            .send()
            .await
            .map_err(|error| {
                tracing::error!(url = %self.chat_endpoint(), error = %error, "Chat request failed");
                InferenceError::Transport(error)
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let error = InferenceError::UnexpectedStatus { status, body };
            tracing::error!(error = %error, "Chat request rejected");
            return Err(error);
        }

        let body = response.bytes().await?;
        let decoded = decode_chat_response(&body)?;
        tracing::debug!(
            model = ?decoded.model,
            done = ?decoded.done,
            eval_count = ?decoded.eval_count,
            "Chat response received"
        );
        decoded.into_content()
    }
}
