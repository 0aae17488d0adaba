use std::sync::Arc;

use rustydigest::{
    config::Config,
    processing::{ChunkSet, RecursiveReducer},
    summarization::{InferenceClient, InferenceSettings, OllamaChatClient},
};
use tokio_util::sync::CancellationToken;

fn live_client() -> (Config, OllamaChatClient) {
    let _ = dotenvy::dotenv();
    let config = Config::from_env().expect("OLLAMA_MODEL and OLLAMA_API_URL must be set");
    let client = OllamaChatClient::new(InferenceSettings::from(&config), CancellationToken::new())
        .expect("client");
    (config, client)
}

#[tokio::test]
#[ignore = "Requires live Ollama"]
async fn live_ollama_summarizes_text() {
    let (_, client) = live_client();
    let summary = client
        .summarize("Rust is a systems programming language focused on safety and speed.")
        .await
        .expect("summary from live service");
    assert!(!summary.trim().is_empty(), "expected non-empty summary");
}

#[tokio::test]
#[ignore = "Requires live Ollama"]
async fn live_two_cycle_reduction() {
    let (config, client) = live_client();
    let text = "The quick brown fox jumps over the lazy dog. ".repeat(80);
    let chunks = ChunkSet::from_text(&text, config.chunk_size).expect("chunks");
    let reducer = RecursiveReducer::from_config(Arc::new(client), &config);

    let report = reducer
        .reduce_with_report(2, chunks)
        .await
        .expect("reduction against live service");

    assert_eq!(report.cycles_run, 2);
    assert!(!report.text.trim().is_empty());
}
