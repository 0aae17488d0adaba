use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use rustydigest::{
    config, logging,
    pipeline::{DocumentOutcome, Pipeline, PipelineSettings},
    processing::RecursiveReducer,
    summarization::{InferenceSettings, OllamaChatClient},
};
use tokio_util::sync::CancellationToken;

#[derive(Parser)]
#[command(
    name = "rusty-digest",
    about = "Summarize every document in a directory into markdown"
)]
struct Cli {
    /// Directory holding .pdf, .txt or .md documents.
    input_dir: PathBuf,
    /// Directory receiving one `{name}.md` summary per document.
    output_dir: PathBuf,
    /// Override CHUNKING_CYCLES for this run.
    #[arg(long)]
    cycles: Option<u32>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = config::init_config().context("Failed to load configuration")?;
    logging::init_tracing(config);

    let cancel = CancellationToken::new();
    let shutdown = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received; cancelling");
            shutdown.cancel();
        }
    });

    let client = OllamaChatClient::new(InferenceSettings::from(config), cancel.clone())
        .context("Failed to build inference client")?;
    let reducer = RecursiveReducer::from_config(Arc::new(client), config);

    let mut settings = PipelineSettings::from(config);
    if let Some(cycles) = cli.cycles {
        settings.cycles = cycles;
    }

    let summary = Pipeline::new(reducer, settings)
        .with_cancellation(cancel)
        .run(&cli.input_dir, &cli.output_dir)
        .await
        .context("Pipeline aborted")?;

    for (document, outcome) in &summary.outcomes {
        match outcome {
            DocumentOutcome::Written(path) => {
                println!("{} -> {}", document.display(), path.display())
            }
            DocumentOutcome::SkippedExisting(path) => {
                println!("{} skipped ({} exists)", document.display(), path.display())
            }
            DocumentOutcome::SkippedOversized { chunks } => {
                println!("{} skipped ({chunks} chunks)", document.display())
            }
            DocumentOutcome::Failed { reason } => {
                println!("{} failed: {reason}", document.display())
            }
        }
    }

    tracing::info!(
        summarized = summary.metrics.documents_summarized,
        skipped = summary.metrics.documents_skipped,
        failed = summary.metrics.documents_failed,
        "Run complete"
    );
    Ok(())
}
