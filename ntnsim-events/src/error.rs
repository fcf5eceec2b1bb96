//! Error types for measurement-event evaluation

use serde::{Deserialize, Serialize};
use thiserror::Error;

use ntnsim_common::types::{SatelliteId, Timestamp};

use crate::condition::RequiredField;
use crate::pair_table::PairKey;

/// Per-pair evaluation failures.
///
/// None of these halt a batch: the offending sample is skipped or the
/// affected machines are frozen, and the remaining pairs carry on.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvaluationError {
    /// Sample not strictly newer than the last one processed for its pair
    #[error("Out-of-order sample for {pair}: {timestamp} is not after {last}")]
    OutOfOrderSample {
        pair: PairKey,
        timestamp: Timestamp,
        last: Timestamp,
    },

    /// A field a machine needs is absent
    #[error("Missing {field} for {pair} at {timestamp}")]
    MissingField {
        pair: PairKey,
        timestamp: Timestamp,
        field: RequiredField,
    },

    /// Non-physical distance or elevation
    #[error("Invalid geometry of {satellite} for {pair} at {timestamp}")]
    InvalidGeometry {
        pair: PairKey,
        timestamp: Timestamp,
        satellite: SatelliteId,
    },

    /// A quality metric reached the evaluator as NaN or infinity
    #[error("Non-finite quality metric for {pair} at {timestamp}")]
    NumericOverflow { pair: PairKey, timestamp: Timestamp },

    /// The pair table is full
    #[error("Pair table full ({capacity} pairs), cannot track {pair} at {timestamp}")]
    PairCapacityExceeded {
        pair: PairKey,
        timestamp: Timestamp,
        capacity: usize,
    },

    /// The pair was retired earlier in the batch
    #[error("Pair {pair} was retired at {retired_at}, sample at {timestamp} dropped")]
    PairRetired {
        pair: PairKey,
        timestamp: Timestamp,
        retired_at: Timestamp,
    },
}

impl EvaluationError {
    /// Pair the error belongs to
    pub fn pair(&self) -> &PairKey {
        match self {
            EvaluationError::OutOfOrderSample { pair, .. }
            | EvaluationError::MissingField { pair, .. }
            | EvaluationError::InvalidGeometry { pair, .. }
            | EvaluationError::NumericOverflow { pair, .. }
            | EvaluationError::PairCapacityExceeded { pair, .. }
            | EvaluationError::PairRetired { pair, .. } => pair,
        }
    }

    /// Timestamp of the offending sample
    pub fn timestamp(&self) -> Timestamp {
        match self {
            EvaluationError::OutOfOrderSample { timestamp, .. }
            | EvaluationError::MissingField { timestamp, .. }
            | EvaluationError::InvalidGeometry { timestamp, .. }
            | EvaluationError::NumericOverflow { timestamp, .. }
            | EvaluationError::PairCapacityExceeded { timestamp, .. }
            | EvaluationError::PairRetired { timestamp, .. } => *timestamp,
        }
    }

    /// Classification used in the skip list
    pub fn kind(&self) -> ErrorKind {
        match self {
            EvaluationError::OutOfOrderSample { .. } => ErrorKind::OutOfOrderSample,
            EvaluationError::MissingField { field, .. } => ErrorKind::MissingField(*field),
            EvaluationError::InvalidGeometry { .. } => ErrorKind::InvalidGeometry,
            EvaluationError::NumericOverflow { .. } => ErrorKind::NumericOverflow,
            EvaluationError::PairCapacityExceeded { .. } => ErrorKind::PairCapacityExceeded,
            EvaluationError::PairRetired { .. } => ErrorKind::PairRetired,
        }
    }
}

/// Error classification reported to callers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Sample rejected, pair state unchanged
    OutOfOrderSample,
    /// Machines needing the field were frozen
    MissingField(RequiredField),
    /// RSRP-based machines were frozen
    InvalidGeometry,
    /// Affected machines were frozen
    NumericOverflow,
    /// Sample dropped, pair not tracked
    PairCapacityExceeded,
    /// Sample dropped, pair already retired
    PairRetired,
}

/// One entry of the user-visible skip list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedSample {
    /// Pair the sample belonged to
    pub pair: PairKey,
    /// Sample timestamp
    pub timestamp: Timestamp,
    /// What went wrong
    pub kind: ErrorKind,
}

impl From<&EvaluationError> for SkippedSample {
    fn from(err: &EvaluationError) -> Self {
        Self {
            pair: err.pair().clone(),
            timestamp: err.timestamp(),
            kind: err.kind(),
        }
    }
}

/// Errors raised when restoring an evaluator from a snapshot
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SnapshotError {
    /// Snapshot holds more pairs than the configured table capacity
    #[error("Snapshot holds {pairs} pairs but the table capacity is {capacity}")]
    CapacityExceeded { pairs: usize, capacity: usize },

    /// The same pair appears twice
    #[error("Duplicate pair in snapshot: {0}")]
    DuplicatePair(PairKey),
}
