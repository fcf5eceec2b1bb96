//! Measurement event scenarios
//!
//! Drives pairs through complete passes and checks when events enter and
//! leave:
//! - A4 entering with hysteresis and time-to-trigger
//! - A5 waiting on the serving side while the candidate side already holds
//! - D2 entering and leaving on slant range
//! - Strict inequalities at the threshold boundaries

use integration_tests::{
    drive_pair, init_test_logging, link_sample, pair_sample, serving_batch, test_config,
};
use ntnsim_common::Timestamp;
use ntnsim_events::{
    BatchEvaluator, EvaluationStats, EventAggregator, EventType, MeasurementEvent, ServingBatch,
};

fn of_type(events: &[MeasurementEvent], event_type: EventType) -> Vec<&MeasurementEvent> {
    events.iter().filter(|e| e.event_type == event_type).collect()
}

/// Serving moves out past 1700 km and back while the candidate holds at 800 km.
fn d2_pass() -> ServingBatch {
    let mut samples = Vec::new();
    for t in 0..36 {
        let serving_km = if t <= 15 {
            1400.0 + 20.0 * t as f64
        } else {
            1700.0 - 20.0 * (t - 15) as f64
        };
        samples.push(link_sample("SERV", t, serving_km, 25.0));
        samples.push(link_sample("CAND", t, 800.0, 60.0));
    }
    serving_batch("SERV", samples)
}

#[test]
fn test_a4_enters_after_time_to_trigger() {
    init_test_logging();
    let config = test_config(5000, 8);

    // candidate climbs from -110 to -80 dBm over 20 one-second samples
    let samples: Vec<_> = (0..20)
        .map(|i| pair_sample(i, -100.0, -110.0 + 30.0 * i as f64 / 19.0))
        .collect();

    let events = drive_pair(&samples, &config.events);
    let a4 = of_type(&events, EventType::A4);
    assert_eq!(a4.len(), 1);

    // first sample above -93 dBm is at 11 s
    assert_eq!(a4[0].trigger_time, Timestamp::from_secs(16));
    assert!(a4[0].is_active());
    let candidate = a4[0].quality_snapshot.candidate.quality.unwrap();
    assert!(candidate.rsrp_dbm() > -93.0);

    // one sample short of the window, nothing has fired yet
    let early = drive_pair(&samples[..16], &config.events);
    assert!(of_type(&early, EventType::A4).is_empty());
}

#[test]
fn test_a5_waits_for_serving_side() {
    init_test_logging();
    let config = test_config(5000, 8);

    // serving falls one dB per second to -115 dBm, candidate holds at -85 dBm
    let samples: Vec<_> = (0..30)
        .map(|i| pair_sample(i, (-95.0 - i as f64).max(-115.0), -85.0))
        .collect();

    let events = drive_pair(&samples, &config.events);
    let a5 = of_type(&events, EventType::A5);
    assert_eq!(a5.len(), 1);
    // -112 dBm at 17 s does not satisfy the strict bound; 18 s does
    assert_eq!(a5[0].trigger_time, Timestamp::from_secs(23));
    let serving = a5[0].quality_snapshot.serving.quality.unwrap();
    assert!(serving.rsrp_dbm() < -112.0);

    // the candidate side held from the start, so A4 fired a long time before
    let a4 = of_type(&events, EventType::A4);
    assert_eq!(a4[0].trigger_time, Timestamp::from_secs(5));
}

#[test]
fn test_d2_enters_and_leaves_once() {
    init_test_logging();
    let mut evaluator = BatchEvaluator::new(test_config(2000, 8));
    let mut stats = EvaluationStats::new();
    let outcome = evaluator.evaluate(&d2_pass(), &mut stats);
    assert!(outcome.skipped.is_empty());

    let d2 = of_type(&outcome.events, EventType::D2);
    assert_eq!(d2.len(), 2);
    // above 1550 km from 8 s, below 1450 km from 28 s
    assert_eq!(d2[0].trigger_time, Timestamp::from_secs(10));
    assert!(d2[0].is_active());
    assert_eq!(d2[1].trigger_time, Timestamp::from_secs(10));
    assert_eq!(d2[1].leave_time, Some(Timestamp::from_secs(30)));
    assert_eq!(d2[0].quality_snapshot.serving.distance_km, Some(1600.0));

    let merged = EventAggregator::merge_streams("SERV", vec![outcome.events.clone()]);
    let logical = of_type(&merged, EventType::D2);
    assert_eq!(logical.len(), 1);
    assert_eq!(logical[0].leave_time, Some(Timestamp::from_secs(30)));
}

#[test]
fn test_thresholds_are_strict() {
    let config = test_config(5000, 8);

    // candidate sits exactly at threshold + hysteresis
    let at_bound: Vec<_> = (0..20).map(|i| pair_sample(i, -100.0, -93.0)).collect();
    let events = drive_pair(&at_bound, &config.events);
    assert!(of_type(&events, EventType::A4).is_empty());

    // active, then exactly at threshold - hysteresis: never leaves
    let mut samples: Vec<_> = (0..10).map(|i| pair_sample(i, -100.0, -80.0)).collect();
    samples.extend((10..30).map(|i| pair_sample(i, -100.0, -97.0)));
    let events = drive_pair(&samples, &config.events);
    let a4 = of_type(&events, EventType::A4);
    assert_eq!(a4.len(), 1);
    assert!(a4[0].is_active());
}

#[test]
fn test_at_most_one_active_period_per_event_type() {
    let config = test_config(2000, 8);
    let samples: Vec<_> = (0..300)
        .map(|i| {
            let t = i as f64;
            pair_sample(i, -100.0 + 6.0 * (t / 11.0).cos(), -95.0 + 9.0 * (t / 7.0).sin())
        })
        .collect();
    let events = drive_pair(&samples, &config.events);
    assert!(!events.is_empty());

    for event_type in EventType::ALL {
        let records = of_type(&events, event_type);
        let mut open: Option<Timestamp> = None;
        for record in records {
            match record.leave_time {
                None => {
                    assert!(open.is_none(), "{event_type} opened twice");
                    open = Some(record.trigger_time);
                }
                Some(leave) => {
                    assert_eq!(open, Some(record.trigger_time), "{event_type}");
                    assert!(leave > record.trigger_time);
                    open = None;
                }
            }
        }
    }
}

#[test]
fn test_evaluation_is_idempotent() {
    let batch = d2_pass();
    let run = || {
        let mut evaluator = BatchEvaluator::new(test_config(2000, 8));
        evaluator.evaluate(&batch, &mut EvaluationStats::new())
    };
    assert_eq!(run(), run());

    let config = test_config(5000, 8);
    let samples: Vec<_> = (0..40)
        .map(|i| pair_sample(i, -105.0 + (i % 7) as f64, -110.0 + i as f64))
        .collect();
    assert_eq!(
        drive_pair(&samples, &config.events),
        drive_pair(&samples, &config.events)
    );
}
