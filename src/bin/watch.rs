use std::sync::Arc;
use std::time::Duration;

use tokio::time::sleep;
use tracing_subscriber::EnvFilter;

use encode_tracker::config::ZencoderConfig;
use encode_tracker::services::client::HttpZencoderClient;
use encode_tracker::services::engine::EncodeEngine;

const POLL_INTERVAL_MS: u64 = 5000;

#[tokio::main]
async fn main() {
    // Initialize structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .init();

    // Load configuration from environment
    let config = ZencoderConfig::from_env().expect("Failed to load configuration");

    let client = HttpZencoderClient::with_base_url(config.api_key, config.base_url)
        .expect("Failed to build Zencoder client");
    let engine = EncodeEngine::new(Arc::new(client));

    let args: Vec<String> = std::env::args().skip(1).collect();
    let mut handle = match args.as_slice() {
        [flag, source_url] if flag.as_str() == "--submit" => engine
            .create(source_url)
            .await
            .expect("Failed to submit job"),
        [job_id] => engine.find(job_id).await.expect("Failed to look up job"),
        _ => {
            eprintln!("usage: watch <job-id> | watch --submit <source-url>");
            std::process::exit(2);
        }
    };

    tracing::info!(job_id = %handle.id(), state = %handle.state(), "tracking job");

    loop {
        let snapshot = handle.snapshot();

        tracing::info!(
            job_id = %snapshot.id,
            state = %snapshot.state,
            percent_complete = snapshot.percent_complete,
            operations = ?snapshot.current_operations,
            "job status"
        );

        if snapshot.state.is_terminal() {
            break;
        }

        sleep(Duration::from_millis(POLL_INTERVAL_MS)).await;

        handle.reload().await.expect("Failed to reload job status");
    }

    let snapshot = handle.snapshot();

    if snapshot.is_failed() {
        for error in snapshot.errors.iter().chain(snapshot.input.errors.iter()) {
            tracing::warn!(job_id = %snapshot.id, error = %error, "job failed");
        }
    }

    println!(
        "{}",
        serde_json::to_string_pretty(snapshot).expect("Failed to render snapshot")
    );
}
