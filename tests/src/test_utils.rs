//! Test utility functions for integration tests
//!
//! Provides common utilities for test setup, logging, and collecting results.

use ntnsim_common::EventConfig;
use ntnsim_events::{
    BatchOutcome, MeasurementEvent, PairKey, PairSample, PairTable, PublishMessage,
};
use tokio::sync::mpsc;
use tracing_subscriber::{fmt, EnvFilter};

/// Result type for integration tests
pub type TestResult<T = ()> = Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// Initialize logging for tests
///
/// Uses RUST_LOG environment variable if set, otherwise defaults to "info"
pub fn init_test_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = fmt().with_env_filter(filter).with_test_writer().try_init();
}

/// Feeds `samples` to a fresh pair and returns every emitted event record.
///
/// Out-of-order samples are skipped, as the evaluator does.
pub fn drive_pair(samples: &[PairSample], config: &EventConfig) -> Vec<MeasurementEvent> {
    let mut table = PairTable::new(1);
    let mut events = Vec::new();
    let Some(id) = table.insert(PairKey::new("SERV", "CAND")) else {
        return events;
    };
    let Some(state) = table.get_mut(id) else {
        return events;
    };
    for sample in samples {
        if let Ok(step) = state.process(sample, config) {
            events.extend(step.events);
        }
    }
    events
}

/// Drains a publisher channel up to its shutdown marker.
pub async fn receive_outcomes(rx: &mut mpsc::Receiver<PublishMessage>) -> Vec<BatchOutcome> {
    let mut outcomes = Vec::new();
    while let Some(msg) = rx.recv().await {
        match msg {
            PublishMessage::Outcome(outcome) => outcomes.push(outcome),
            PublishMessage::Shutdown => break,
        }
    }
    outcomes
}
