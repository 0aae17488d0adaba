//! Availability wait for the inference service.
//!
//! The gate probes the service until it reports healthy, sleeping a fixed interval between
//! failed probes. There is no attempt limit: an unreachable service blocks the caller until it
//! comes up or the gate's [`CancellationToken`] is cancelled.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use tokio_util::sync::CancellationToken;

use super::InferenceError;

/// Why a single health probe failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeFailure {
    /// Connection error or probe timeout.
    Unreachable(String),
    /// Service answered with something other than `200 OK`.
    Status(StatusCode),
}

impl fmt::Display for ProbeFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unreachable(reason) => write!(f, "unreachable: {reason}"),
            Self::Status(status) => write!(f, "status {status}"),
        }
    }
}

/// One-shot health check against the inference service.
#[async_trait]
pub trait HealthProbe: Send + Sync {
    /// Return `Ok` when the service is ready to accept requests.
    async fn probe(&self) -> Result<(), ProbeFailure>;
}

/// Source of delays between probes.
#[async_trait]
pub trait Sleeper: Send + Sync {
    /// Suspend the caller for `duration`.
    async fn sleep(&self, duration: Duration);
}

/// [`Sleeper`] backed by the Tokio timer.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Connection state tracked while waiting for the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Readiness {
    /// Probes have been failing so far.
    Connecting {
        /// Failed probes so far.
        attempts: u32,
    },
    /// The latest probe succeeded.
    Ready {
        /// Probes issued, including the successful one.
        attempts: u32,
    },
}

impl Readiness {
    /// Probes issued so far.
    pub fn attempts(self) -> u32 {
        match self {
            Self::Connecting { attempts } | Self::Ready { attempts } => attempts,
        }
    }

    fn advance(self, probe: &Result<(), ProbeFailure>) -> Self {
        let attempts = self.attempts() + 1;
        match probe {
            Ok(()) => Self::Ready { attempts },
            Err(_) => Self::Connecting { attempts },
        }
    }
}

/// Blocks callers until the service passes a health probe.
#[derive(Clone)]
pub struct ReadinessGate {
    interval: Duration,
    sleeper: Arc<dyn Sleeper>,
    cancel: CancellationToken,
}

impl ReadinessGate {
    /// Build a gate that waits `interval` between failed probes using the Tokio timer.
    pub fn new(interval: Duration, cancel: CancellationToken) -> Self {
        Self {
            interval,
            sleeper: Arc::new(TokioSleeper),
            cancel,
        }
    }

    /// Replace the delay source, typically with a fake clock in tests.
    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    /// Token that aborts an in-progress wait.
    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Probe until the service is ready.
    ///
    /// Returns the final [`Readiness::Ready`] state, or [`InferenceError::Cancelled`] once the
    /// token fires. Probe failures are logged and never returned.
    pub async fn wait_until_ready<P>(&self, probe: &P) -> Result<Readiness, InferenceError>
    where
        P: HealthProbe + ?Sized,
    {
        let mut state = Readiness::Connecting { attempts: 0 };

        loop {
            let outcome = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return Err(InferenceError::Cancelled),
                outcome = probe.probe() => outcome,
            };
            state = state.advance(&outcome);

            match outcome {
                Ok(()) => {
                    if state.attempts() > 1 {
                        tracing::info!(attempts = state.attempts(), "Inference service is reachable");
                    }
                    return Ok(state);
                }
                Err(failure) => {
                    tracing::warn!(
                        attempt = state.attempts(),
                        reason = %failure,
                        retry_in_ms = self.interval.as_millis() as u64,
                        "Inference service not ready; retrying"
                    );
                }
            }

            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return Err(InferenceError::Cancelled),
                _ = self.sleeper.sleep(self.interval) => {}
            }
        }
    }
}
