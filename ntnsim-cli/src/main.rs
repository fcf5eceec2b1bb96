//! ntnsim command-line driver
//!
//! Loads and validates the configuration, evaluates the serving batches read
//! from JSON files, and writes every emitted measurement event to stdout as
//! one JSON line.
//!
//! # Usage
//!
//! ```bash
//! ntnsim -c config/ntnsim.yaml -i pass-001.json -i pass-002.json
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::io::{AsyncWriteExt, BufWriter};
use tokio::signal;
use tokio::sync::mpsc;
use tracing::{info, warn};

use ntnsim_common::{init_logging, LogLevel, NtnsimConfig};
use ntnsim_events::{
    BatchEvaluator, EvaluationStats, EventPublisher, PublishMessage, ServingBatch,
};

/// ntnsim - satellite link quality and measurement events
#[derive(Parser, Debug)]
#[command(name = "ntnsim")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the configuration file (YAML)
    #[arg(short = 'c', long = "config", value_name = "FILE")]
    config_file: PathBuf,

    /// Serving batch file (JSON), evaluated in the order given
    #[arg(short = 'i', long = "input", value_name = "FILE", required = true)]
    inputs: Vec<PathBuf>,

    /// Log level, overriding the configuration file
    #[arg(long = "log-level", value_name = "LEVEL")]
    log_level: Option<LogLevel>,

    /// Evaluate pairs on a single thread
    #[arg(long = "sequential")]
    sequential: bool,

    /// Capacity of the event output channel (batches)
    #[arg(long = "channel-capacity", value_name = "N", default_value_t = 1024)]
    channel_capacity: usize,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("ERROR: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> Result<()> {
    // A missing key aborts here, before anything is evaluated
    let config = NtnsimConfig::from_yaml_file(&args.config_file).with_context(|| {
        format!(
            "Failed to load configuration from {}",
            args.config_file.display()
        )
    })?;
    init_logging(args.log_level.unwrap_or(config.log_level));

    info!(
        "Configuration loaded: f={} Hz, B={} Hz, TTT={} ms, max pairs={}",
        config.link.frequency_hz,
        config.link.bandwidth_hz,
        config.events.time_to_trigger_ms,
        config.events.max_tracked_pairs
    );
    let config = Arc::new(config);

    let cancel = Arc::new(AtomicBool::new(false));
    {
        let cancel = Arc::clone(&cancel);
        tokio::spawn(async move {
            if signal::ctrl_c().await.is_ok() {
                warn!("Interrupt received, stopping after the current sample");
                cancel.store(true, Ordering::SeqCst);
            }
        });
    }

    let (publisher, rx) = EventPublisher::channel(args.channel_capacity);
    let writer = tokio::spawn(write_events(rx));

    let mut evaluator =
        BatchEvaluator::new(Arc::clone(&config)).with_parallelism(!args.sequential);
    let mut stats = EvaluationStats::new();

    for path in &args.inputs {
        let batch = read_batch(path)
            .with_context(|| format!("Failed to read batch from {}", path.display()))?;
        info!(
            "Evaluating {} samples for serving satellite {}",
            batch.samples.len(),
            batch.serving_id
        );

        let outcome = evaluator.evaluate_cancellable(&batch, &mut stats, &cancel);
        for skipped in &outcome.skipped {
            warn!(
                pair = %skipped.pair,
                timestamp = skipped.timestamp.as_millis(),
                kind = ?skipped.kind,
                "Sample skipped"
            );
        }
        info!(
            "Batch {}: {} events, {} skipped",
            path.display(),
            outcome.events.len(),
            outcome.skipped.len()
        );

        let cancelled = outcome.cancelled;
        publisher.publish(outcome);
        if cancelled {
            break;
        }
    }

    evaluator.end_session();
    publisher
        .shutdown()
        .await
        .context("Event writer stopped early")?;
    drop(publisher);

    let written = writer.await.context("Event writer task failed")??;
    info!("Done: {} event records written; {}", written, stats);
    Ok(())
}

fn read_batch(path: &Path) -> Result<ServingBatch, ntnsim_common::Error> {
    let contents = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&contents)?)
}

/// Writes every event of every received outcome as one JSON line.
async fn write_events(mut rx: mpsc::Receiver<PublishMessage>) -> Result<usize> {
    let mut out = BufWriter::new(tokio::io::stdout());
    let mut written = 0;

    while let Some(msg) = rx.recv().await {
        match msg {
            PublishMessage::Outcome(outcome) => {
                for event in &outcome.events {
                    let line = serde_json::to_string(event)?;
                    out.write_all(line.as_bytes()).await?;
                    out.write_all(b"\n").await?;
                    written += 1;
                }
            }
            PublishMessage::Shutdown => break,
        }
    }

    out.flush().await?;
    Ok(written)
}
