//! Entering and leaving conditions of the measurement events
//!
//! All comparisons are strict: a value sitting exactly on a threshold plus
//! its hysteresis margin satisfies neither condition.
//!
//! # Reference
//! - 3GPP TS 38.331 §5.5.4.4 (A3), §5.5.4.5 (A4), §5.5.4.6 (A5), §5.5.4.15a (D2)

use std::fmt;

use serde::{Deserialize, Serialize};

use ntnsim_common::config::EventConfig;
use ntnsim_common::types::SatelliteId;

use crate::event::EventType;
use crate::sample::{Observation, PairSample, QualityReading};

/// Input a condition could not be evaluated without
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequiredField {
    /// No serving sample at this tick
    ServingSample,
    /// Serving RSRP (distance or elevation absent)
    ServingRsrp,
    /// Candidate RSRP (distance or elevation absent)
    CandidateRsrp,
    /// Serving slant range
    ServingDistance,
    /// Candidate slant range
    CandidateDistance,
}

impl fmt::Display for RequiredField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequiredField::ServingSample => write!(f, "serving sample"),
            RequiredField::ServingRsrp => write!(f, "serving rsrp"),
            RequiredField::CandidateRsrp => write!(f, "candidate rsrp"),
            RequiredField::ServingDistance => write!(f, "serving distance"),
            RequiredField::CandidateDistance => write!(f, "candidate distance"),
        }
    }
}

/// Outcome of evaluating one event's conditions at one sample
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Verdict {
    /// Entering condition holds
    pub enter: bool,
    /// Leaving condition holds
    pub leave: bool,
}

/// Why a condition could not be evaluated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Unavailable {
    /// A field is absent
    Missing(RequiredField),
    /// A satellite's geometry is non-physical
    InvalidGeometry(SatelliteId),
    /// A quality metric is not a finite number
    NonFinite,
}

/// Evaluates the entering and leaving conditions of `event_type`.
pub fn evaluate(
    event_type: EventType,
    sample: &PairSample,
    config: &EventConfig,
) -> Result<Verdict, Unavailable> {
    let hys = config.hysteresis_db;
    match event_type {
        EventType::A3 => {
            let serv = rsrp(serving(sample)?, RequiredField::ServingRsrp)?;
            let cand = rsrp(&sample.candidate, RequiredField::CandidateRsrp)?;
            let reference = serv + config.a3.offset_db;
            Ok(Verdict {
                enter: cand > reference + hys,
                leave: cand < reference - hys,
            })
        }
        EventType::A4 => {
            let cand = rsrp(&sample.candidate, RequiredField::CandidateRsrp)?;
            let thr = config.a4.threshold_dbm;
            Ok(Verdict {
                enter: cand > thr + hys,
                leave: cand < thr - hys,
            })
        }
        EventType::A5 => {
            let serv = rsrp(serving(sample)?, RequiredField::ServingRsrp)?;
            let cand = rsrp(&sample.candidate, RequiredField::CandidateRsrp)?;
            let t1 = config.a5.threshold1_dbm;
            let t2 = config.a5.threshold2_dbm;
            Ok(Verdict {
                enter: serv < t1 - hys && cand > t2 + hys,
                leave: serv > t1 + hys || cand < t2 - hys,
            })
        }
        EventType::D2 => {
            let d2 = &config.d2;
            let serv = distance(serving(sample)?, RequiredField::ServingDistance)?;
            let cand = distance(&sample.candidate, RequiredField::CandidateDistance)?;
            let hys = d2.hysteresis_km;
            Ok(Verdict {
                enter: serv - hys > d2.distance_threshold1_km
                    && cand + hys < d2.distance_threshold2_km,
                leave: serv + hys < d2.distance_threshold1_km
                    || cand - hys > d2.distance_threshold2_km,
            })
        }
    }
}

fn serving(sample: &PairSample) -> Result<&Observation, Unavailable> {
    sample
        .serving
        .as_ref()
        .ok_or(Unavailable::Missing(RequiredField::ServingSample))
}

fn rsrp(obs: &Observation, field: RequiredField) -> Result<f64, Unavailable> {
    match obs.quality {
        QualityReading::Measured(q) if q.is_finite() => Ok(q.rsrp_dbm()),
        QualityReading::Measured(_) => Err(Unavailable::NonFinite),
        QualityReading::InvalidGeometry => {
            Err(Unavailable::InvalidGeometry(obs.satellite_id.clone()))
        }
        QualityReading::Missing => Err(Unavailable::Missing(field)),
    }
}

fn distance(obs: &Observation, field: RequiredField) -> Result<f64, Unavailable> {
    match obs.distance_km {
        None => Err(Unavailable::Missing(field)),
        Some(d) if d.is_finite() && d > 0.0 => Ok(d),
        Some(_) => Err(Unavailable::InvalidGeometry(obs.satellite_id.clone())),
    }
}
