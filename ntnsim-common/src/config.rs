//! Configuration structures for the link model and the measurement events
//!
//! Every physical link parameter and every event threshold is mandatory.
//! Documents are parsed into an all-optional raw form first so that every
//! absent key can be reported at once; a missing key is a fatal startup error
//! and is never replaced by a default.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::logging::LogLevel;

/// Radio link parameters shared by every satellite link.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkParameters {
    /// Carrier frequency (Hz)
    pub frequency_hz: f64,
    /// Satellite transmit power (dBm)
    pub tx_power_dbm: f64,
    /// Satellite transmit antenna gain (dBi)
    pub tx_antenna_gain_dbi: f64,
    /// Ground terminal receive antenna gain (dBi)
    pub rx_antenna_gain_dbi: f64,
    /// Channel bandwidth (Hz)
    pub bandwidth_hz: f64,
    /// Receiver noise figure (dB)
    pub receiver_noise_figure_db: f64,
    /// Antenna noise temperature (K)
    pub antenna_temperature_k: f64,
}

/// A3: neighbour becomes offset better than serving.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct A3Config {
    /// Offset (dB)
    pub offset_db: f64,
}

/// A4: neighbour becomes better than an absolute threshold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct A4Config {
    /// Threshold (dBm)
    pub threshold_dbm: f64,
}

/// A5: serving worse than threshold1 and neighbour better than threshold2.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct A5Config {
    /// Serving threshold (dBm)
    pub threshold1_dbm: f64,
    /// Neighbour threshold (dBm)
    pub threshold2_dbm: f64,
}

/// D2: distance to serving above threshold1 and distance to candidate below threshold2.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct D2Config {
    /// Serving distance threshold (km)
    pub distance_threshold1_km: f64,
    /// Candidate distance threshold (km)
    pub distance_threshold2_km: f64,
    /// Distance hysteresis (km), applied to both thresholds
    pub hysteresis_km: f64,
}

/// Measurement event configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventConfig {
    /// A3 parameters
    pub a3: A3Config,
    /// A4 parameters
    pub a4: A4Config,
    /// A5 parameters
    pub a5: A5Config,
    /// D2 parameters
    pub d2: D2Config,
    /// Hysteresis for the RSRP-based events (dB)
    pub hysteresis_db: f64,
    /// Time-to-trigger (ms)
    pub time_to_trigger_ms: u64,
    /// How long a pair may stay below the horizon before it is retired (ms)
    pub visibility_grace_ms: u64,
    /// Capacity of the pair table
    pub max_tracked_pairs: usize,
}

/// Complete ntnsim configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NtnsimConfig {
    /// Link budget parameters
    pub link: LinkParameters,
    /// Event thresholds and timers
    pub events: EventConfig,
    /// Log level used by the binary
    #[serde(default)]
    pub log_level: LogLevel,
}

#[derive(Debug, Default, Deserialize)]
struct RawConfig {
    link: Option<RawLink>,
    events: Option<RawEvents>,
    log_level: Option<LogLevel>,
}

#[derive(Debug, Default, Deserialize)]
struct RawLink {
    frequency_hz: Option<f64>,
    tx_power_dbm: Option<f64>,
    tx_antenna_gain_dbi: Option<f64>,
    rx_antenna_gain_dbi: Option<f64>,
    bandwidth_hz: Option<f64>,
    receiver_noise_figure_db: Option<f64>,
    antenna_temperature_k: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
struct RawEvents {
    a3: Option<RawA3>,
    a4: Option<RawA4>,
    a5: Option<RawA5>,
    d2: Option<RawD2>,
    hysteresis_db: Option<f64>,
    time_to_trigger_ms: Option<u64>,
    visibility_grace_ms: Option<u64>,
    max_tracked_pairs: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
struct RawA3 {
    offset_db: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
struct RawA4 {
    threshold_dbm: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
struct RawA5 {
    threshold1_dbm: Option<f64>,
    threshold2_dbm: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
struct RawD2 {
    distance_threshold1_km: Option<f64>,
    distance_threshold2_km: Option<f64>,
    hysteresis_km: Option<f64>,
}

/// Collects absent keys while unpacking a raw document.
///
/// The placeholder returned for an absent key is never used: `finish`
/// fails whenever anything was recorded.
#[derive(Default)]
struct Required {
    missing: Vec<String>,
}

impl Required {
    fn take<T: Default>(&mut self, key: &str, value: Option<T>) -> T {
        match value {
            Some(v) => v,
            None => {
                self.missing.push(key.to_string());
                T::default()
            }
        }
    }

    fn finish(self) -> Result<(), ConfigError> {
        if self.missing.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::MissingConfiguration(self.missing))
        }
    }
}

impl TryFrom<RawConfig> for NtnsimConfig {
    type Error = ConfigError;

    fn try_from(raw: RawConfig) -> Result<Self, Self::Error> {
        let mut req = Required::default();

        let link = raw.link.unwrap_or_default();
        let link = LinkParameters {
            frequency_hz: req.take("link.frequency_hz", link.frequency_hz),
            tx_power_dbm: req.take("link.tx_power_dbm", link.tx_power_dbm),
            tx_antenna_gain_dbi: req.take("link.tx_antenna_gain_dbi", link.tx_antenna_gain_dbi),
            rx_antenna_gain_dbi: req.take("link.rx_antenna_gain_dbi", link.rx_antenna_gain_dbi),
            bandwidth_hz: req.take("link.bandwidth_hz", link.bandwidth_hz),
            receiver_noise_figure_db: req
                .take("link.receiver_noise_figure_db", link.receiver_noise_figure_db),
            antenna_temperature_k: req
                .take("link.antenna_temperature_k", link.antenna_temperature_k),
        };

        let events = raw.events.unwrap_or_default();
        let a3 = events.a3.unwrap_or_default();
        let a4 = events.a4.unwrap_or_default();
        let a5 = events.a5.unwrap_or_default();
        let d2 = events.d2.unwrap_or_default();
        let events = EventConfig {
            a3: A3Config {
                offset_db: req.take("events.a3.offset_db", a3.offset_db),
            },
            a4: A4Config {
                threshold_dbm: req.take("events.a4.threshold_dbm", a4.threshold_dbm),
            },
            a5: A5Config {
                threshold1_dbm: req.take("events.a5.threshold1_dbm", a5.threshold1_dbm),
                threshold2_dbm: req.take("events.a5.threshold2_dbm", a5.threshold2_dbm),
            },
            d2: D2Config {
                distance_threshold1_km: req
                    .take("events.d2.distance_threshold1_km", d2.distance_threshold1_km),
                distance_threshold2_km: req
                    .take("events.d2.distance_threshold2_km", d2.distance_threshold2_km),
                hysteresis_km: req.take("events.d2.hysteresis_km", d2.hysteresis_km),
            },
            hysteresis_db: req.take("events.hysteresis_db", events.hysteresis_db),
            time_to_trigger_ms: req.take("events.time_to_trigger_ms", events.time_to_trigger_ms),
            visibility_grace_ms: req
                .take("events.visibility_grace_ms", events.visibility_grace_ms),
            max_tracked_pairs: req.take("events.max_tracked_pairs", events.max_tracked_pairs),
        };

        req.finish()?;

        let config = NtnsimConfig {
            link,
            events,
            log_level: raw.log_level.unwrap_or_default(),
        };
        config.validate()?;
        Ok(config)
    }
}

impl NtnsimConfig {
    /// Parses and validates a configuration from a YAML string.
    ///
    /// # Returns
    /// * `Ok(NtnsimConfig)` - Complete, validated configuration
    /// * `Err(ConfigError::MissingConfiguration)` - One or more mandatory keys absent
    /// * `Err(ConfigError)` - YAML or range error
    ///
    /// # Example
    /// ```
    /// use ntnsim_common::NtnsimConfig;
    ///
    /// let yaml = r#"
    /// link:
    ///   frequency_hz: 2.0e9
    ///   tx_power_dbm: 43.0
    ///   tx_antenna_gain_dbi: 30.0
    ///   rx_antenna_gain_dbi: 0.0
    ///   bandwidth_hz: 20.0e6
    ///   receiver_noise_figure_db: 7.0
    ///   antenna_temperature_k: 290.0
    /// events:
    ///   a3: { offset_db: 3.0 }
    ///   a4: { threshold_dbm: -95.0 }
    ///   a5: { threshold1_dbm: -110.0, threshold2_dbm: -90.0 }
    ///   d2: { distance_threshold1_km: 1500.0, distance_threshold2_km: 1000.0, hysteresis_km: 50.0 }
    ///   hysteresis_db: 2.0
    ///   time_to_trigger_ms: 640
    ///   visibility_grace_ms: 30000
    ///   max_tracked_pairs: 256
    /// "#;
    ///
    /// let config = NtnsimConfig::from_yaml(yaml).unwrap();
    /// assert_eq!(config.events.time_to_trigger_ms, 640);
    /// ```
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        let raw: RawConfig = serde_yaml::from_str(yaml)?;
        Self::try_from(raw)
    }

    /// Loads a configuration from a YAML file.
    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        Self::from_yaml(&contents)
    }

    /// Serializes the configuration to a YAML string.
    pub fn to_yaml(&self) -> Result<String, ConfigError> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Checks that every present value is physical.
    ///
    /// # Validation Rules
    ///
    /// - All numeric values must be finite
    /// - Frequency, bandwidth and antenna temperature must be positive
    /// - Noise figure and both hysteresis values must be non-negative
    /// - D2 distance thresholds must be positive
    /// - The pair table must hold at least one pair and be addressable by a `u32`
    pub fn validate(&self) -> Result<(), ConfigError> {
        let l = &self.link;
        let e = &self.events;
        let finite = [
            ("link.frequency_hz", l.frequency_hz),
            ("link.tx_power_dbm", l.tx_power_dbm),
            ("link.tx_antenna_gain_dbi", l.tx_antenna_gain_dbi),
            ("link.rx_antenna_gain_dbi", l.rx_antenna_gain_dbi),
            ("link.bandwidth_hz", l.bandwidth_hz),
            ("link.receiver_noise_figure_db", l.receiver_noise_figure_db),
            ("link.antenna_temperature_k", l.antenna_temperature_k),
            ("events.a3.offset_db", e.a3.offset_db),
            ("events.a4.threshold_dbm", e.a4.threshold_dbm),
            ("events.a5.threshold1_dbm", e.a5.threshold1_dbm),
            ("events.a5.threshold2_dbm", e.a5.threshold2_dbm),
            ("events.d2.distance_threshold1_km", e.d2.distance_threshold1_km),
            ("events.d2.distance_threshold2_km", e.d2.distance_threshold2_km),
            ("events.d2.hysteresis_km", e.d2.hysteresis_km),
            ("events.hysteresis_db", e.hysteresis_db),
        ];
        if let Some((key, _)) = finite.iter().find(|(_, v)| !v.is_finite()) {
            return Err(ConfigError::Invalid(format!("{key} must be a finite number")));
        }

        let positive = [
            ("link.frequency_hz", l.frequency_hz),
            ("link.bandwidth_hz", l.bandwidth_hz),
            ("link.antenna_temperature_k", l.antenna_temperature_k),
            ("events.d2.distance_threshold1_km", e.d2.distance_threshold1_km),
            ("events.d2.distance_threshold2_km", e.d2.distance_threshold2_km),
        ];
        if let Some((key, v)) = positive.iter().find(|(_, v)| *v <= 0.0) {
            return Err(ConfigError::Invalid(format!("{key} must be positive, got {v}")));
        }

        let non_negative = [
            ("link.receiver_noise_figure_db", l.receiver_noise_figure_db),
            ("events.d2.hysteresis_km", e.d2.hysteresis_km),
            ("events.hysteresis_db", e.hysteresis_db),
        ];
        if let Some((key, v)) = non_negative.iter().find(|(_, v)| *v < 0.0) {
            return Err(ConfigError::Invalid(format!("{key} must not be negative, got {v}")));
        }

        if e.max_tracked_pairs == 0 || e.max_tracked_pairs > u32::MAX as usize {
            return Err(ConfigError::Invalid(format!(
                "events.max_tracked_pairs must be in 1..={}, got {}",
                u32::MAX,
                e.max_tracked_pairs
            )));
        }

        Ok(())
    }
}
