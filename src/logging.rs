//! Tracing setup for the digest binary.
//!
//! Events are printed to stdout and mirrored, without ANSI colors, to a log file. The file
//! comes from [`Config::log_file`] when set and defaults to `logs/rusty-digest.log`.
use std::fs::{File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use crate::config::Config;

const DEFAULT_LOG_DIR: &str = "logs";
const DEFAULT_LOG_FILE: &str = "rusty-digest.log";

static LOG_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

/// Install the global subscriber. `RUST_LOG` filters events (default `info`).
///
/// A log file that cannot be opened only disables the file layer. Calling this twice keeps the
/// first subscriber.
pub fn init_tracing(config: &Config) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let (writer, path) = match open_log_file(config.log_file.as_deref()) {
        Ok((file, path)) => (Some(non_blocking(file)), Some(path)),
        Err((path, error)) => {
            eprintln!("File logging disabled; cannot open {}: {error}", path.display());
            (None, None)
        }
    };

    let installed = tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_target(false).compact())
        .with(writer.map(|writer| {
            fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .compact()
        }))
        .try_init();

    match installed {
        Ok(()) => {
            if let Some(path) = path {
                tracing::debug!(path = %path.display(), "File logging enabled");
            }
        }
        Err(error) => eprintln!("Tracing already initialized: {error}"),
    }
}

fn non_blocking(file: File) -> NonBlocking {
    let (writer, guard) = tracing_appender::non_blocking(file);
    let _ = LOG_GUARD.set(guard);
    writer
}

/// Open the configured log file for appending, creating the default directory if needed.
fn open_log_file(configured: Option<&Path>) -> Result<(File, PathBuf), (PathBuf, io::Error)> {
    let path = match configured {
        Some(path) => path.to_path_buf(),
        None => {
            let dir = Path::new(DEFAULT_LOG_DIR);
            std::fs::create_dir_all(dir).map_err(|error| (dir.to_path_buf(), error))?;
            dir.join(DEFAULT_LOG_FILE)
        }
    };

    match OpenOptions::new().create(true).append(true).open(&path) {
        Ok(file) => Ok((file, path)),
        Err(error) => Err((path, error)),
    }
}
