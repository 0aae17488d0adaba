use std::env;
use std::path::PathBuf;
use std::sync::OnceLock;
use std::time::Duration;
use thiserror::Error;

const DEFAULT_CHUNK_SIZE: usize = 256;
const DEFAULT_DOWNSTREAM_CHUNK_SIZE: usize = 256;
const DEFAULT_CHUNKING_CYCLES: u32 = 1;
const DEFAULT_TIMEOUT_SECS: u64 = 10;
const DEFAULT_HEALTH_INTERVAL_MS: u64 = 1_000;
const DEFAULT_MAX_INITIAL_CHUNKS: usize = 100;
const DEFAULT_SUMMARY_CONCURRENCY: usize = 1;

/// Errors encountered while loading configuration from environment variables.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Required environment variable was not provided.
    #[error("Missing environment variable: {0}")]
    MissingVariable(String),
    /// Environment variable contained a value that could not be parsed.
    #[error("Invalid value for environment variable {key}: {reason}")]
    InvalidValue {
        /// Variable that failed validation.
        key: String,
        /// Human readable description of the problem.
        reason: String,
    },
    /// Configuration was already installed in the process-wide cache.
    #[error("Configuration already initialized")]
    AlreadyInitialized,
}

/// Runtime configuration for Rusty Digest.
///
/// Loaded once before any reduction runs and treated as immutable afterwards. Components
/// receive the values they need through their constructors rather than reading globals.
#[derive(Debug, Clone)]
pub struct Config {
    /// Model identifier sent with every chat request.
    pub ollama_model: String,
    /// Base URL of the inference service (health probe target).
    pub ollama_api_url: String,
    /// Word count per chunk when splitting a fresh document.
    pub chunk_size: usize,
    /// Word count per chunk when re-chunking between reduction cycles.
    pub downstream_chunk_size: usize,
    /// Number of reduction cycles applied to each document.
    pub chunking_cycles: u32,
    /// Timeout applied to each summarize request.
    pub request_timeout: Duration,
    /// Fixed backoff between failed readiness probes.
    pub health_interval: Duration,
    /// Documents producing more initial chunks than this are skipped.
    pub max_initial_chunks: usize,
    /// Maximum number of in-flight summarize calls within a single cycle.
    pub summary_concurrency: usize,
    /// Explicit log file; `None` logs to `logs/rusty-digest.log`.
    pub log_file: Option<PathBuf>,
}

impl Config {
    /// Load configuration from environment variables, performing validation along the way.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup.
    ///
    /// Blank values are treated as absent so that `.env` templates with empty entries fall back
    /// to defaults instead of failing to parse.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let ollama_api_url = require(&get, "OLLAMA_API_URL")?;
        reqwest::Url::parse(&ollama_api_url).map_err(|error| ConfigError::InvalidValue {
            key: "OLLAMA_API_URL".into(),
            reason: error.to_string(),
        })?;

        Ok(Self {
            ollama_model: require(&get, "OLLAMA_MODEL")?,
            ollama_api_url,
            chunk_size: positive(&get, "CHUNK_SIZE", DEFAULT_CHUNK_SIZE)?,
            downstream_chunk_size: positive(
                &get,
                "OLLAMA_CHUNK_SIZE",
                DEFAULT_DOWNSTREAM_CHUNK_SIZE,
            )?,
            chunking_cycles: parse_or(&get, "CHUNKING_CYCLES", DEFAULT_CHUNKING_CYCLES)?,
            request_timeout: Duration::from_secs(positive(
                &get,
                "OLLAMA_TIMEOUT_SECS",
                DEFAULT_TIMEOUT_SECS,
            )?),
            health_interval: Duration::from_millis(positive(
                &get,
                "OLLAMA_HEALTH_INTERVAL_MS",
                DEFAULT_HEALTH_INTERVAL_MS,
            )?),
            max_initial_chunks: positive(&get, "MAX_INITIAL_CHUNKS", DEFAULT_MAX_INITIAL_CHUNKS)?,
            summary_concurrency: positive(
                &get,
                "SUMMARY_CONCURRENCY",
                DEFAULT_SUMMARY_CONCURRENCY,
            )?,
            log_file: get("RUSTY_DIGEST_LOG_FILE").map(PathBuf::from),
        })
    }
}

fn require<G>(get: &G, key: &str) -> Result<String, ConfigError>
where
    G: Fn(&str) -> Option<String>,
{
    get(key).ok_or_else(|| ConfigError::MissingVariable(key.to_string()))
}

fn parse_or<G, T>(get: &G, key: &str, default: T) -> Result<T, ConfigError>
where
    G: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match get(key) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|error: T::Err| ConfigError::InvalidValue {
                key: key.to_string(),
                reason: error.to_string(),
            }),
    }
}

fn positive<G, T>(get: &G, key: &str, default: T) -> Result<T, ConfigError>
where
    G: Fn(&str) -> Option<String>,
    T: std::str::FromStr + PartialOrd + Default,
    T::Err: std::fmt::Display,
{
    let value = parse_or(get, key, default)?;
    if value <= T::default() {
        return Err(ConfigError::InvalidValue {
            key: key.to_string(),
            reason: "must be greater than zero".into(),
        });
    }
    Ok(value)
}

/// Global configuration cache populated during process start.
static CONFIG: OnceLock<Config> = OnceLock::new();

/// Load configuration from the environment and install it in the global cache.
///
/// Returns the installed value so callers can hand it to constructors explicitly.
pub fn init_config() -> Result<&'static Config, ConfigError> {
    dotenvy::dotenv().ok();
    let config = Config::from_env()?;
    tracing::debug!(
        model = %config.ollama_model,
        url = %config.ollama_api_url,
        chunk_size = config.chunk_size,
        downstream_chunk_size = config.downstream_chunk_size,
        cycles = config.chunking_cycles,
        "Loaded configuration"
    );
    CONFIG
        .set(config)
        .map_err(|_| ConfigError::AlreadyInitialized)?;
    CONFIG.get().ok_or(ConfigError::AlreadyInitialized)
}
