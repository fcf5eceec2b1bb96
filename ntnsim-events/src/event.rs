//! Measurement event records

use std::fmt;

use serde::{Deserialize, Serialize};

use ntnsim_common::types::{SatelliteId, SignalQuality, Timestamp};

use crate::sample::{Observation, PairSample};

/// Measurement event types evaluated for every pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum EventType {
    /// A3: Candidate becomes offset better than serving
    A3,
    /// A4: Candidate becomes better than threshold
    A4,
    /// A5: Serving < threshold1 AND candidate > threshold2
    A5,
    /// D2: Serving distance > threshold1 AND candidate distance < threshold2
    D2,
}

impl EventType {
    /// All event types, in machine order
    pub const ALL: [EventType; 4] = [EventType::A3, EventType::A4, EventType::A5, EventType::D2];

    /// Position of this type in [`EventType::ALL`]
    pub fn index(&self) -> usize {
        *self as usize
    }

    /// Short name used in logs
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::A3 => "A3",
            EventType::A4 => "A4",
            EventType::A5 => "A5",
            EventType::D2 => "D2",
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One side of a pair as it looked at trigger time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SideSnapshot {
    /// Satellite identifier
    pub satellite_id: SatelliteId,
    /// Quality, present only when it was a real measurement
    pub quality: Option<SignalQuality>,
    /// Slant range (km)
    pub distance_km: Option<f64>,
    /// Elevation (degrees)
    pub elevation_deg: Option<f64>,
}

impl From<&Observation> for SideSnapshot {
    fn from(obs: &Observation) -> Self {
        Self {
            satellite_id: obs.satellite_id.clone(),
            quality: obs.quality.measured().copied(),
            distance_km: obs.distance_km,
            elevation_deg: obs.elevation_deg,
        }
    }
}

/// Quality and geometry of both satellites at trigger time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualitySnapshot {
    /// Serving satellite
    pub serving: SideSnapshot,
    /// Candidate satellite
    pub candidate: SideSnapshot,
}

/// A measurement event for one (serving, candidate) pair.
///
/// Emitted once when the entering condition has held for time-to-trigger,
/// and once more with `leave_time` set when the leaving condition has.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeasurementEvent {
    /// Event type
    pub event_type: EventType,
    /// Serving satellite
    pub serving_id: SatelliteId,
    /// Candidate satellite
    pub candidate_id: SatelliteId,
    /// Instant the entering condition completed its time-to-trigger
    pub trigger_time: Timestamp,
    /// Instant the leaving condition completed its time-to-trigger; `None` while active
    pub leave_time: Option<Timestamp>,
    /// Both sides at trigger time
    pub quality_snapshot: QualitySnapshot,
}

impl MeasurementEvent {
    pub(crate) fn triggered(event_type: EventType, sample: &PairSample) -> Self {
        let candidate = SideSnapshot::from(&sample.candidate);
        let serving = match &sample.serving {
            Some(obs) => SideSnapshot::from(obs),
            None => SideSnapshot {
                satellite_id: sample.serving_id.clone(),
                quality: None,
                distance_km: None,
                elevation_deg: None,
            },
        };
        Self {
            event_type,
            serving_id: sample.serving_id.clone(),
            candidate_id: sample.candidate.satellite_id.clone(),
            trigger_time: sample.timestamp,
            leave_time: None,
            quality_snapshot: QualitySnapshot { serving, candidate },
        }
    }

    /// Returns true while the event has not left.
    pub fn is_active(&self) -> bool {
        self.leave_time.is_none()
    }

    /// Instant this record was emitted: the leave time for closed records,
    /// the trigger time otherwise.
    pub fn emitted_at(&self) -> Timestamp {
        self.leave_time.unwrap_or(self.trigger_time)
    }

    /// Identity of the logical event, independent of whether it has closed.
    pub fn identity(&self) -> (Timestamp, EventType, &SatelliteId) {
        (self.trigger_time, self.event_type, &self.candidate_id)
    }
}
