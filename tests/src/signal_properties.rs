//! Link budget behaviour across geometry

use approx::assert_abs_diff_eq;
use integration_tests::{link_sample, test_config};
use ntnsim_common::{LinkParameters, SignalQuality, Timestamp};
use ntnsim_events::{Observation, QualityReading};
use ntnsim_signal::{compute, GeometryFault, SignalQualityEngine};

fn s_band() -> LinkParameters {
    test_config(640, 8).link.clone()
}

#[test]
fn test_doubling_distance_costs_six_db() {
    let engine = SignalQualityEngine::new(s_band());
    for &el in &[15.0, 40.0, 80.0] {
        let near = engine.compute(&link_sample("SAT", 1, 600.0, el));
        let far = engine.compute(&link_sample("SAT", 1, 1200.0, el));
        let drop = near.quality().rsrp_dbm() - far.quality().rsrp_dbm();
        assert_abs_diff_eq!(drop, 6.0206, epsilon = 1e-3);
    }
}

#[test]
fn test_quality_improves_towards_zenith() {
    let engine = SignalQualityEngine::new(s_band());
    let mut previous: Option<SignalQuality> = None;
    for el in [5.0, 10.0, 20.0, 45.0, 70.0, 90.0] {
        let q = *engine.compute(&link_sample("SAT", 1, 1000.0, el)).quality();
        if let Some(p) = previous {
            assert!(q.rsrp_dbm() >= p.rsrp_dbm(), "rsrp at {el}");
            assert!(q.sinr_db() >= p.sinr_db(), "sinr at {el}");
        }
        previous = Some(q);
    }
}

#[test]
fn test_reported_values_stay_in_range() {
    let engine = SignalQualityEngine::new(s_band());
    let cases = [(1.0, 90.0), (300.0, 60.0), (40_000.0, 1.0), (2500.0, 0.5)];
    for (d, el) in cases {
        let q = *engine.compute(&link_sample("SAT", 1, d, el)).quality();
        assert!((-140.0..=-44.0).contains(&q.rsrp_dbm()), "rsrp d={d}");
        assert!((-34.0..=2.5).contains(&q.rsrq_db()), "rsrq d={d}");
        assert!((-20.0..=30.0).contains(&q.sinr_db()), "sinr d={d}");
    }
}

#[test]
fn test_invalid_geometry_never_reaches_events() {
    let params = s_band();
    let below = link_sample("SAT", 3, 2000.0, -2.0);
    let assessment = compute(&below, &params);
    assert_eq!(assessment.fault(), Some(GeometryFault::NonPhysicalElevation));
    assert_eq!(*assessment.quality(), SignalQuality::floor(Timestamp::from_secs(3)));

    let obs = Observation::new(&below, &assessment);
    assert_eq!(obs.quality, QualityReading::InvalidGeometry);
    assert!(obs.quality.measured().is_none());
    assert!(obs.is_below_horizon());

    let mut partial = link_sample("SAT", 3, 2000.0, 30.0);
    partial.distance_km = None;
    let obs = Observation::new(&partial, &compute(&partial, &params));
    assert_eq!(obs.quality, QualityReading::Missing);
}

#[test]
fn test_batch_matches_single_computation() {
    let engine = SignalQualityEngine::new(s_band());
    let samples: Vec<_> = (0..200)
        .map(|i| link_sample("SAT", i, 500.0 + 10.0 * i as f64, 5.0 + (i % 85) as f64))
        .collect();
    let batch = engine.compute_batch(&samples);
    assert_eq!(batch.len(), samples.len());
    for (sample, assessment) in samples.iter().zip(&batch) {
        assert_eq!(*assessment, engine.compute(sample));
    }
}
