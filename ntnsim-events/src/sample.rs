//! Per-pair input records fed to the state machines.

use serde::{Deserialize, Serialize};

use ntnsim_common::types::{LinkSample, SatelliteId, SignalQuality, Timestamp};
use ntnsim_signal::QualityAssessment;

/// Quality of one satellite at one tick, as seen by the evaluator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "status", content = "quality")]
pub enum QualityReading {
    /// A real measurement
    Measured(SignalQuality),
    /// Geometry present but non-physical
    InvalidGeometry,
    /// Distance or elevation absent from the sample
    Missing,
}

impl QualityReading {
    /// Classifies an engine result.
    pub fn from_assessment(assessment: &QualityAssessment) -> Self {
        match assessment.fault() {
            None => QualityReading::Measured(*assessment.quality()),
            Some(fault) if fault.is_missing_field() => QualityReading::Missing,
            Some(_) => QualityReading::InvalidGeometry,
        }
    }

    /// The measurement, if there is one
    pub fn measured(&self) -> Option<&SignalQuality> {
        match self {
            QualityReading::Measured(q) => Some(q),
            _ => None,
        }
    }
}

/// One satellite at one tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    /// Satellite identifier
    pub satellite_id: SatelliteId,
    /// Derived quality
    pub quality: QualityReading,
    /// Slant range (km) as delivered
    pub distance_km: Option<f64>,
    /// Elevation (degrees) as delivered
    pub elevation_deg: Option<f64>,
}

impl Observation {
    /// Builds an observation from a geometry sample and its engine result.
    pub fn new(sample: &LinkSample, assessment: &QualityAssessment) -> Self {
        Self {
            satellite_id: sample.satellite_id.clone(),
            quality: QualityReading::from_assessment(assessment),
            distance_km: sample.distance_km,
            elevation_deg: sample.elevation_deg,
        }
    }

    /// Returns true if the satellite is reported below the horizon.
    pub fn is_below_horizon(&self) -> bool {
        matches!(self.elevation_deg, Some(e) if e < 0.0)
    }
}

/// Serving and candidate observations at one tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairSample {
    /// Sampling instant
    pub timestamp: Timestamp,
    /// Serving satellite of the pair
    pub serving_id: SatelliteId,
    /// Serving observation; `None` if the tick carried no serving sample
    pub serving: Option<Observation>,
    /// Candidate observation
    pub candidate: Observation,
}

impl PairSample {
    /// Returns true if either side is reported below the horizon.
    pub fn either_below_horizon(&self) -> bool {
        self.candidate.is_below_horizon()
            || self.serving.as_ref().is_some_and(Observation::is_below_horizon)
    }
}
