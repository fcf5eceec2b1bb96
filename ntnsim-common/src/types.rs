//! Core record types: satellite identity, timestamps, geometry samples and
//! signal-quality records.

use std::fmt;
use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};

/// Reportable SS-RSRP range in dBm (3GPP TS 38.133).
pub const RSRP_RANGE_DBM: RangeInclusive<f64> = -140.0..=-44.0;
/// Reportable SS-RSRQ range in dB (3GPP TS 38.133).
pub const RSRQ_RANGE_DB: RangeInclusive<f64> = -34.0..=2.5;
/// Reportable SS-SINR range in dB (3GPP TS 38.133).
pub const SINR_RANGE_DB: RangeInclusive<f64> = -20.0..=30.0;

/// Satellite identifier as delivered by the geometry source (e.g. `STARLINK-1007`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SatelliteId(String);

impl SatelliteId {
    /// Creates a new satellite identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SatelliteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SatelliteId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Constellation a satellite belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Constellation {
    /// SpaceX Starlink
    Starlink,
    /// OneWeb
    #[serde(alias = "one_web")]
    OneWeb,
    /// Amazon Kuiper
    Kuiper,
    /// Iridium
    Iridium,
    /// Anything else
    #[default]
    #[serde(other)]
    Other,
}

impl fmt::Display for Constellation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Constellation::Starlink => write!(f, "starlink"),
            Constellation::OneWeb => write!(f, "oneweb"),
            Constellation::Kuiper => write!(f, "kuiper"),
            Constellation::Iridium => write!(f, "iridium"),
            Constellation::Other => write!(f, "other"),
        }
    }
}

/// Simulation timestamp in milliseconds.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Timestamp(i64);

impl Timestamp {
    /// Creates a timestamp from milliseconds.
    pub const fn from_millis(ms: i64) -> Self {
        Self(ms)
    }

    /// Creates a timestamp from whole seconds.
    pub const fn from_secs(secs: i64) -> Self {
        Self(secs * 1000)
    }

    /// Returns the timestamp in milliseconds.
    pub const fn as_millis(&self) -> i64 {
        self.0
    }

    /// Milliseconds elapsed since `earlier` (negative if `earlier` is later).
    pub fn millis_since(&self, earlier: Timestamp) -> i64 {
        self.0.saturating_sub(earlier.0)
    }

    /// Returns true if at least `duration_ms` have elapsed since `earlier`.
    pub fn has_elapsed(&self, earlier: Timestamp, duration_ms: u64) -> bool {
        let elapsed = self.millis_since(earlier);
        elapsed >= 0 && elapsed as u64 >= duration_ms
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}ms", self.0)
    }
}

impl From<i64> for Timestamp {
    fn from(ms: i64) -> Self {
        Self(ms)
    }
}

/// One geometric sample of one satellite at one sampling tick.
///
/// Produced by the external geometry source. The geometric fields are
/// optional because the source may omit them; an absent value is a missing
/// field and is never substituted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkSample {
    /// Satellite this sample describes
    pub satellite_id: SatelliteId,
    /// Constellation of the satellite
    #[serde(default)]
    pub constellation: Constellation,
    /// Sampling instant
    pub timestamp: Timestamp,
    /// Slant range from the ground terminal (km, must be > 0)
    #[serde(default)]
    pub distance_km: Option<f64>,
    /// Elevation above the local horizon (degrees, 0..=90 when visible)
    #[serde(default)]
    pub elevation_deg: Option<f64>,
    /// Range rate (m/s, positive when receding)
    #[serde(default)]
    pub relative_velocity_ms: Option<f64>,
}

impl LinkSample {
    /// Creates a complete sample.
    pub fn new(
        satellite_id: impl Into<SatelliteId>,
        constellation: Constellation,
        timestamp: Timestamp,
        distance_km: f64,
        elevation_deg: f64,
        relative_velocity_ms: f64,
    ) -> Self {
        Self {
            satellite_id: satellite_id.into(),
            constellation,
            timestamp,
            distance_km: Some(distance_km),
            elevation_deg: Some(elevation_deg),
            relative_velocity_ms: Some(relative_velocity_ms),
        }
    }

    /// Returns true if the satellite is below the local horizon.
    pub fn is_below_horizon(&self) -> bool {
        matches!(self.elevation_deg, Some(e) if e < 0.0)
    }
}

/// Signal-quality record derived from one sample.
///
/// Values are clamped to the reportable 3GPP ranges at construction and are
/// read-only afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SignalQuality {
    rsrp_dbm: f64,
    rsrq_db: f64,
    sinr_db: f64,
    derived_at: Timestamp,
}

impl SignalQuality {
    /// Creates a record, clamping each metric to its reportable range.
    ///
    /// Non-finite inputs are kept as-is so that numeric defects stay visible.
    pub fn new(rsrp_dbm: f64, rsrq_db: f64, sinr_db: f64, derived_at: Timestamp) -> Self {
        Self {
            rsrp_dbm: clamp_to(rsrp_dbm, &RSRP_RANGE_DBM),
            rsrq_db: clamp_to(rsrq_db, &RSRQ_RANGE_DB),
            sinr_db: clamp_to(sinr_db, &SINR_RANGE_DB),
            derived_at,
        }
    }

    /// The floor value returned for non-physical input.
    pub fn floor(derived_at: Timestamp) -> Self {
        Self {
            rsrp_dbm: *RSRP_RANGE_DBM.start(),
            rsrq_db: *RSRQ_RANGE_DB.start(),
            sinr_db: *SINR_RANGE_DB.start(),
            derived_at,
        }
    }

    /// SS-RSRP in dBm
    pub fn rsrp_dbm(&self) -> f64 {
        self.rsrp_dbm
    }

    /// SS-RSRQ in dB
    pub fn rsrq_db(&self) -> f64 {
        self.rsrq_db
    }

    /// SS-SINR in dB
    pub fn sinr_db(&self) -> f64 {
        self.sinr_db
    }

    /// Instant the record was derived for
    pub fn derived_at(&self) -> Timestamp {
        self.derived_at
    }

    /// Returns true if all three metrics are finite numbers.
    pub fn is_finite(&self) -> bool {
        self.rsrp_dbm.is_finite() && self.rsrq_db.is_finite() && self.sinr_db.is_finite()
    }
}

fn clamp_to(value: f64, range: &RangeInclusive<f64>) -> f64 {
    if value.is_nan() {
        return value;
    }
    value.clamp(*range.start(), *range.end())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signal_quality_clamps_to_3gpp_ranges() {
        let q = SignalQuality::new(-20.0, 10.0, -50.0, Timestamp::from_secs(1));
        assert_eq!(q.rsrp_dbm(), -44.0);
        assert_eq!(q.rsrq_db(), 2.5);
        assert_eq!(q.sinr_db(), -20.0);
        assert_eq!(q.derived_at(), Timestamp::from_millis(1000));
    }

    #[test]
    fn test_signal_quality_keeps_nan_visible() {
        let q = SignalQuality::new(f64::NAN, -10.0, 5.0, Timestamp::default());
        assert!(!q.is_finite());
    }

    #[test]
    fn test_signal_quality_floor() {
        let q = SignalQuality::floor(Timestamp::from_millis(5));
        assert_eq!(q.rsrp_dbm(), -140.0);
        assert_eq!(q.rsrq_db(), -34.0);
        assert_eq!(q.sinr_db(), -20.0);
    }

    #[test]
    fn test_timestamp_elapsed() {
        let t0 = Timestamp::from_secs(10);
        let t1 = Timestamp::from_millis(14_999);
        assert!(!t1.has_elapsed(t0, 5000));
        assert!(Timestamp::from_secs(15).has_elapsed(t0, 5000));
        assert!(!t0.has_elapsed(t1, 0));
        assert_eq!(t1.millis_since(t0), 4999);
    }

    #[test]
    fn test_link_sample_deserializes_missing_fields_as_none() {
        let json = r#"{"satellite_id":"STARLINK-1","timestamp":1000,"distance_km":700.0}"#;
        let sample: LinkSample = serde_json::from_str(json).unwrap();
        assert_eq!(sample.satellite_id.as_str(), "STARLINK-1");
        assert_eq!(sample.constellation, Constellation::Other);
        assert_eq!(sample.distance_km, Some(700.0));
        assert!(sample.elevation_deg.is_none());
        assert!(!sample.is_below_horizon());
    }

    #[test]
    fn test_constellation_serde_names() {
        let c: Constellation = serde_json::from_str("\"oneweb\"").unwrap();
        assert_eq!(c, Constellation::OneWeb);
        let unknown: Constellation = serde_json::from_str("\"globalstar\"").unwrap();
        assert_eq!(unknown, Constellation::Other);
        assert_eq!(Constellation::Starlink.to_string(), "starlink");
    }
}
