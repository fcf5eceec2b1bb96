//! Test fixtures for integration tests
//!
//! Configurations and sample builders used across the scenario tests.

use std::sync::Arc;

use ntnsim_common::{
    A3Config, A4Config, A5Config, Constellation, D2Config, EventConfig, LinkParameters,
    LinkSample, LogLevel, NtnsimConfig, SatelliteId, SignalQuality, Timestamp,
};
use ntnsim_events::{Observation, PairSample, QualityReading, ServingBatch};

/// Complete configuration document with the thresholds used by the scenarios.
pub const TEST_CONFIG_YAML: &str = r#"
link:
  frequency_hz: 2.0e9
  tx_power_dbm: 43.0
  tx_antenna_gain_dbi: 30.0
  rx_antenna_gain_dbi: 0.0
  bandwidth_hz: 20.0e6
  receiver_noise_figure_db: 7.0
  antenna_temperature_k: 290.0
events:
  a3:
    offset_db: 3.0
  a4:
    threshold_dbm: -95.0
  a5:
    threshold1_dbm: -110.0
    threshold2_dbm: -90.0
  d2:
    distance_threshold1_km: 1500.0
    distance_threshold2_km: 1000.0
    hysteresis_km: 50.0
  hysteresis_db: 2.0
  time_to_trigger_ms: 5000
  visibility_grace_ms: 30000
  max_tracked_pairs: 64
log_level: debug
"#;

/// Scenario configuration with the given time-to-trigger and table size.
pub fn test_config(time_to_trigger_ms: u64, max_tracked_pairs: usize) -> Arc<NtnsimConfig> {
    Arc::new(NtnsimConfig {
        link: LinkParameters {
            frequency_hz: 2.0e9,
            tx_power_dbm: 43.0,
            tx_antenna_gain_dbi: 30.0,
            rx_antenna_gain_dbi: 0.0,
            bandwidth_hz: 20.0e6,
            receiver_noise_figure_db: 7.0,
            antenna_temperature_k: 290.0,
        },
        events: EventConfig {
            a3: A3Config { offset_db: 3.0 },
            a4: A4Config {
                threshold_dbm: -95.0,
            },
            a5: A5Config {
                threshold1_dbm: -110.0,
                threshold2_dbm: -90.0,
            },
            d2: D2Config {
                distance_threshold1_km: 1500.0,
                distance_threshold2_km: 1000.0,
                hysteresis_km: 50.0,
            },
            hysteresis_db: 2.0,
            time_to_trigger_ms,
            visibility_grace_ms: 30_000,
            max_tracked_pairs,
        },
        log_level: LogLevel::Debug,
    })
}

/// Complete geometric sample at `secs` seconds.
pub fn link_sample(id: &str, secs: i64, distance_km: f64, elevation_deg: f64) -> LinkSample {
    LinkSample::new(
        id,
        Constellation::Starlink,
        Timestamp::from_secs(secs),
        distance_km,
        elevation_deg,
        0.0,
    )
}

/// Batch for `serving_id` from already ordered samples.
pub fn serving_batch(serving_id: &str, samples: Vec<LinkSample>) -> ServingBatch {
    ServingBatch {
        serving_id: SatelliteId::from(serving_id),
        samples,
    }
}

/// Observation carrying a measured RSRP and a visible geometry.
pub fn measured(id: &str, secs: i64, rsrp_dbm: f64, distance_km: f64) -> Observation {
    Observation {
        satellite_id: SatelliteId::from(id),
        quality: QualityReading::Measured(SignalQuality::new(
            rsrp_dbm,
            -10.0,
            5.0,
            Timestamp::from_secs(secs),
        )),
        distance_km: Some(distance_km),
        elevation_deg: Some(45.0),
    }
}

/// Pair sample with measured RSRP on both sides.
pub fn pair_sample(secs: i64, serving_rsrp_dbm: f64, candidate_rsrp_dbm: f64) -> PairSample {
    PairSample {
        timestamp: Timestamp::from_secs(secs),
        serving_id: SatelliteId::from("SERV"),
        serving: Some(measured("SERV", secs, serving_rsrp_dbm, 1200.0)),
        candidate: measured("CAND", secs, candidate_rsrp_dbm, 900.0),
    }
}
