//! Per-serving event aggregation
//!
//! Merges the event streams of every pair sharing a serving satellite into
//! one sequence ordered by trigger time. A logical event is identified by
//! (trigger time, event type, candidate); when the same event arrives twice,
//! for instance from a replay after restoring a snapshot, one record survives
//! and a closed record replaces an open one.

use std::collections::BTreeMap;

use tracing::{debug, warn};

use ntnsim_common::types::{SatelliteId, Timestamp};

use crate::event::{EventType, MeasurementEvent};

/// Ordered, deduplicated events of one serving satellite
#[derive(Debug, Clone)]
pub struct EventAggregator {
    serving_id: SatelliteId,
    events: BTreeMap<(Timestamp, EventType, SatelliteId), MeasurementEvent>,
}

impl EventAggregator {
    /// Creates an empty aggregator for `serving_id`.
    pub fn new(serving_id: impl Into<SatelliteId>) -> Self {
        Self {
            serving_id: serving_id.into(),
            events: BTreeMap::new(),
        }
    }

    /// Serving satellite this aggregator collects for
    pub fn serving_id(&self) -> &SatelliteId {
        &self.serving_id
    }

    /// Adds events, returning how many logical events were new.
    ///
    /// Events of another serving satellite are ignored with a warning.
    pub fn ingest<I>(&mut self, events: I) -> usize
    where
        I: IntoIterator<Item = MeasurementEvent>,
    {
        let mut added = 0;
        for event in events {
            if event.serving_id != self.serving_id {
                warn!(
                    expected = %self.serving_id,
                    got = %event.serving_id,
                    "Ignoring event of another serving satellite"
                );
                continue;
            }
            let key = {
                let (trigger, event_type, candidate) = event.identity();
                (trigger, event_type, candidate.clone())
            };
            match self.events.get_mut(&key) {
                None => {
                    self.events.insert(key, event);
                    added += 1;
                }
                Some(existing) => {
                    if existing.leave_time.is_none() && event.leave_time.is_some() {
                        *existing = event;
                    } else {
                        debug!(
                            event = %key.1,
                            candidate = %key.2,
                            trigger_ms = key.0.as_millis(),
                            "Duplicate event dropped"
                        );
                    }
                }
            }
        }
        added
    }

    /// Number of logical events
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// True if nothing was ingested
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Events ordered by trigger time, then event type, then candidate
    pub fn events(&self) -> impl Iterator<Item = &MeasurementEvent> {
        self.events.values()
    }

    /// Events that have not left yet
    pub fn active_events(&self) -> impl Iterator<Item = &MeasurementEvent> {
        self.events.values().filter(|e| e.is_active())
    }

    /// Consumes the aggregator, returning the ordered events.
    pub fn into_events(self) -> Vec<MeasurementEvent> {
        self.events.into_values().collect()
    }

    /// Merges several event streams of one serving satellite.
    pub fn merge_streams<S>(
        serving_id: impl Into<SatelliteId>,
        streams: S,
    ) -> Vec<MeasurementEvent>
    where
        S: IntoIterator<Item = Vec<MeasurementEvent>>,
    {
        let mut aggregator = Self::new(serving_id);
        for stream in streams {
            aggregator.ingest(stream);
        }
        aggregator.into_events()
    }
}
