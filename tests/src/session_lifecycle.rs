//! Evaluation sessions across batches
//!
//! These tests validate:
//! - Parallel and sequential evaluation agree
//! - Snapshot, restore and replay without duplicate events
//! - Pair retirement after losing visibility
//! - Outcome delivery through the publisher
//! - Configuration loading and missing-key reporting

use std::ops::Range;

use integration_tests::{
    init_test_logging, link_sample, receive_outcomes, serving_batch, test_config, TestResult,
    TEST_CONFIG_YAML,
};
use ntnsim_common::{ConfigError, NtnsimConfig, Timestamp};
use ntnsim_events::{
    BatchEvaluator, ErrorKind, EvaluationStats, EvaluatorSnapshot, EventAggregator,
    EventPublisher, EventType, PairKey, ServingBatch,
};

const CANDIDATES: usize = 12;

/// Serving drifts away while twelve candidates approach at staggered ranges.
fn constellation_window(secs: Range<i64>) -> ServingBatch {
    let mut samples = Vec::new();
    for t in secs {
        samples.push(link_sample("SERV", t, 1400.0 + 15.0 * t as f64, 30.0));
        for k in 0..CANDIDATES {
            let id = format!("CAND-{k:02}");
            let range_km = 500.0 + 30.0 * k as f64 + 10.0 * t as f64;
            samples.push(link_sample(&id, t, range_km, 40.0));
        }
    }
    serving_batch("SERV", samples)
}

#[test]
fn test_parallel_and_sequential_agree() {
    init_test_logging();
    let mut parallel = BatchEvaluator::new(test_config(2000, 64));
    let mut sequential = BatchEvaluator::new(test_config(2000, 64)).with_parallelism(false);
    let mut parallel_stats = EvaluationStats::new();
    let mut sequential_stats = EvaluationStats::new();

    let mut total_events = 0;
    for window in [0..20, 20..40, 40..60] {
        let batch = constellation_window(window);
        let p = parallel.evaluate(&batch, &mut parallel_stats);
        let s = sequential.evaluate(&batch, &mut sequential_stats);
        assert_eq!(p, s);
        total_events += p.events.len();
    }
    assert!(total_events > 0);
    assert_eq!(parallel_stats, sequential_stats);
    assert_eq!(parallel_stats.samples_processed, 60 * CANDIDATES as u64);
    assert_eq!(parallel.pairs().len(), CANDIDATES);
}

#[test]
fn test_restore_and_replay_does_not_duplicate_events() -> TestResult {
    init_test_logging();
    let config = test_config(2000, 64);
    let first = constellation_window(0..30);
    let second = constellation_window(30..60);

    let mut live = BatchEvaluator::new(config.clone());
    let mut stats = EvaluationStats::new();
    let first_out = live.evaluate(&first, &mut stats);
    let json = serde_json::to_string(&live.snapshot())?;
    let second_out = live.evaluate(&second, &mut stats);

    // D2 for the nearest candidates closes in the second window
    assert!(second_out
        .events
        .iter()
        .any(|e| e.event_type == EventType::D2 && !e.is_active()));

    let snapshot: EvaluatorSnapshot = serde_json::from_str(&json)?;
    assert_eq!(snapshot.pairs().len(), CANDIDATES);
    let mut recovered = BatchEvaluator::restore(config, snapshot)?;
    let replay = recovered.evaluate(&second, &mut EvaluationStats::new());
    assert_eq!(replay.events, second_out.events);

    let mut aggregator = EventAggregator::new("SERV");
    aggregator.ingest(first_out.events);
    aggregator.ingest(second_out.events);
    let logical = aggregator.len();
    assert_eq!(aggregator.ingest(replay.events), 0);
    assert_eq!(aggregator.len(), logical);

    let times: Vec<_> = aggregator.events().map(|e| e.trigger_time).collect();
    assert!(times.windows(2).all(|w| w[0] <= w[1]));
    Ok(())
}

#[test]
fn test_lost_candidate_retires_and_closes_events() {
    init_test_logging();
    let mut samples = Vec::new();
    for t in 0..60 {
        samples.push(link_sample("SERV", t, 1600.0, 30.0));
        let elevation = if t < 20 { 40.0 } else { -1.0 };
        samples.push(link_sample("CAND", t, 800.0, elevation));
    }
    let batch = serving_batch("SERV", samples);

    let mut evaluator = BatchEvaluator::new(test_config(2000, 8));
    let mut stats = EvaluationStats::new();
    let outcome = evaluator.evaluate(&batch, &mut stats);

    let d2: Vec<_> = outcome
        .events
        .iter()
        .filter(|e| e.event_type == EventType::D2)
        .collect();
    assert_eq!(d2.len(), 2);
    assert_eq!(d2[0].trigger_time, Timestamp::from_secs(2));
    // below the horizon from 20 s, grace of 30 s
    assert_eq!(d2[1].leave_time, Some(Timestamp::from_secs(50)));

    assert!(outcome
        .skipped
        .iter()
        .any(|s| s.kind == ErrorKind::InvalidGeometry));
    assert_eq!(stats.pairs_retired, 1);

    // nothing after the retirement instant revives the pair
    let dropped: Vec<_> = outcome
        .skipped
        .iter()
        .filter(|s| s.kind == ErrorKind::PairRetired)
        .map(|s| s.timestamp)
        .collect();
    assert_eq!(dropped, (51..60).map(Timestamp::from_secs).collect::<Vec<_>>());
    assert_eq!(stats.retired_drops, 9);
    assert!(outcome.events.iter().all(|e| e.emitted_at() <= Timestamp::from_secs(50)));
    assert!(evaluator
        .pairs()
        .get_by_key(&PairKey::new("SERV", "CAND"))
        .is_none());
}

#[tokio::test]
async fn test_publisher_delivers_batch_outcomes() {
    init_test_logging();
    let (publisher, mut rx) = EventPublisher::channel(8);
    let consumer = tokio::spawn(async move { receive_outcomes(&mut rx).await });

    let mut evaluator = BatchEvaluator::new(test_config(2000, 64));
    let mut stats = EvaluationStats::new();
    let mut expected = Vec::new();
    for window in [0..20, 20..40] {
        let outcome = evaluator.evaluate(&constellation_window(window), &mut stats);
        expected.push(outcome.clone());
        assert!(publisher.publish(outcome));
    }
    publisher.shutdown().await.unwrap();

    let received = consumer.await.unwrap();
    assert_eq!(received, expected);
}

#[test]
fn test_shipped_configuration_loads() {
    let path = concat!(env!("CARGO_MANIFEST_DIR"), "/../config/ntnsim.yaml");
    let config = NtnsimConfig::from_yaml_file(path).unwrap();
    assert_eq!(config.link.frequency_hz, 2.0e9);
    assert_eq!(config.events.time_to_trigger_ms, 640);
    assert!(config.validate().is_ok());
}

#[test]
fn test_missing_keys_abort_before_evaluation() {
    let yaml = TEST_CONFIG_YAML
        .replace("  frequency_hz: 2.0e9\n", "")
        .replace("  a4:\n    threshold_dbm: -95.0\n", "");
    match NtnsimConfig::from_yaml(&yaml) {
        Err(ConfigError::MissingConfiguration(keys)) => {
            assert_eq!(
                keys,
                vec![
                    "link.frequency_hz".to_string(),
                    "events.a4.threshold_dbm".to_string()
                ]
            );
        }
        other => panic!("expected missing configuration, got {other:?}"),
    }

    let config = NtnsimConfig::from_yaml(TEST_CONFIG_YAML).unwrap();
    assert_eq!(config.events.max_tracked_pairs, 64);
}
