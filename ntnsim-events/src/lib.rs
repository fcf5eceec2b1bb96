//! Measurement-event evaluation for satellite handover
//!
//! Converts per-satellite quality time series into discrete 3GPP measurement
//! events (TS 38.331 §5.5.4) for every (serving, candidate) pair:
//!
//! - **A3**: candidate becomes offset better than serving
//! - **A4**: candidate becomes better than an absolute threshold
//! - **A5**: serving worse than threshold1 and candidate better than threshold2
//! - **D2**: serving farther than distance threshold1 and candidate closer
//!   than distance threshold2
//!
//! Each pair owns one hysteresis / time-to-trigger state machine per event
//! type. Pairs are independent and are evaluated in parallel; the only shared
//! state is the read-only configuration.

pub mod aggregator;
pub mod condition;
pub mod error;
pub mod evaluator;
pub mod event;
pub mod pair_table;
pub mod publish;
pub mod sample;
pub mod state_machine;
pub mod stats;

pub use aggregator::EventAggregator;
pub use condition::{RequiredField, Unavailable, Verdict};
pub use error::{ErrorKind, EvaluationError, SkippedSample, SnapshotError};
pub use evaluator::{BatchEvaluator, BatchOutcome, EvaluatorSnapshot, ServingBatch};
pub use event::{EventType, MeasurementEvent, QualitySnapshot, SideSnapshot};
pub use pair_table::{PairId, PairKey, PairState, PairStep, PairTable};
pub use publish::{EventPublisher, PublishMessage};
pub use sample::{Observation, PairSample, QualityReading};
pub use state_machine::{EventMachine, TriggerState};
pub use stats::EvaluationStats;
