//! Caller-owned evaluation statistics

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ErrorKind;

/// Counters accumulated across evaluation calls.
///
/// The caller creates one, passes it to every call, and decides when to
/// discard or persist it. Workers count into private copies that are merged
/// after each parallel section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationStats {
    /// Pair samples applied to a pair state
    pub samples_processed: u64,
    /// Samples rejected as out of order
    pub out_of_order: u64,
    /// Machines frozen for a missing field
    pub missing_fields: u64,
    /// Machines frozen for non-physical geometry
    pub invalid_geometry: u64,
    /// Machines frozen for non-finite metrics
    pub numeric_overflow: u64,
    /// Samples dropped because the pair table was full
    pub capacity_drops: u64,
    /// Samples dropped because their pair was already retired
    pub retired_drops: u64,
    /// Events that became active
    pub events_triggered: u64,
    /// Events that left, including those closed on retirement
    pub events_closed: u64,
    /// Pairs allocated in the table
    pub pairs_created: u64,
    /// Pairs retired after staying below the horizon
    pub pairs_retired: u64,
}

impl EvaluationStats {
    /// Creates an empty accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds every counter of `other` into `self`.
    pub fn merge(&mut self, other: &EvaluationStats) {
        self.samples_processed += other.samples_processed;
        self.out_of_order += other.out_of_order;
        self.missing_fields += other.missing_fields;
        self.invalid_geometry += other.invalid_geometry;
        self.numeric_overflow += other.numeric_overflow;
        self.capacity_drops += other.capacity_drops;
        self.retired_drops += other.retired_drops;
        self.events_triggered += other.events_triggered;
        self.events_closed += other.events_closed;
        self.pairs_created += other.pairs_created;
        self.pairs_retired += other.pairs_retired;
    }

    /// Counts one skipped or frozen sample.
    pub fn record_error(&mut self, kind: ErrorKind) {
        match kind {
            ErrorKind::OutOfOrderSample => self.out_of_order += 1,
            ErrorKind::MissingField(_) => self.missing_fields += 1,
            ErrorKind::InvalidGeometry => self.invalid_geometry += 1,
            ErrorKind::NumericOverflow => self.numeric_overflow += 1,
            ErrorKind::PairCapacityExceeded => self.capacity_drops += 1,
            ErrorKind::PairRetired => self.retired_drops += 1,
        }
    }

    /// Total number of data-quality problems seen
    pub fn total_errors(&self) -> u64 {
        self.out_of_order
            + self.missing_fields
            + self.invalid_geometry
            + self.numeric_overflow
            + self.capacity_drops
            + self.retired_drops
    }
}

impl fmt::Display for EvaluationStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "samples={} triggered={} closed={} pairs_created={} pairs_retired={} errors={}",
            self.samples_processed,
            self.events_triggered,
            self.events_closed,
            self.pairs_created,
            self.pairs_retired,
            self.total_errors()
        )
    }
}
