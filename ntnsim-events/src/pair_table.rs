//! Per-pair state and the arena table that owns it
//!
//! Pair states live in a fixed-capacity slot vector indexed by [`PairId`].
//! Retired pairs free their slot for reuse, so the table never grows past
//! the configured capacity and workers can take one slot each without locks.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use ntnsim_common::config::EventConfig;
use ntnsim_common::types::{SatelliteId, Timestamp};

use crate::condition::{self, Unavailable};
use crate::error::EvaluationError;
use crate::event::{EventType, MeasurementEvent};
use crate::sample::PairSample;
use crate::state_machine::{EventMachine, TriggerState};

/// Index of a pair in the table
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PairId(u32);

impl PairId {
    /// Raw id value
    pub fn value(&self) -> u32 {
        self.0
    }

    pub(crate) fn index(&self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for PairId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "pair#{}", self.0)
    }
}

/// (serving, candidate) identity of a pair
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PairKey {
    /// Serving satellite
    pub serving: SatelliteId,
    /// Candidate satellite
    pub candidate: SatelliteId,
}

impl PairKey {
    /// Creates a pair key.
    pub fn new(serving: impl Into<SatelliteId>, candidate: impl Into<SatelliteId>) -> Self {
        Self {
            serving: serving.into(),
            candidate: candidate.into(),
        }
    }
}

impl fmt::Display for PairKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}->{}", self.serving, self.candidate)
    }
}

/// What one sample did to a pair
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PairStep {
    /// Event records emitted at this sample
    pub events: Vec<MeasurementEvent>,
    /// Data-quality problems that froze one or more machines
    pub errors: Vec<EvaluationError>,
    /// The pair was retired at this sample
    pub retired: bool,
}

/// State of one (serving, candidate) pair: one machine per event type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairState {
    id: PairId,
    key: PairKey,
    last_timestamp: Option<Timestamp>,
    below_horizon_since: Option<Timestamp>,
    machines: [EventMachine; 4],
    retired_at: Option<Timestamp>,
}

impl PairState {
    /// Creates a pair with every machine idle.
    pub fn new(id: PairId, key: PairKey) -> Self {
        Self {
            id,
            key,
            last_timestamp: None,
            below_horizon_since: None,
            machines: EventType::ALL.map(EventMachine::new),
            retired_at: None,
        }
    }

    /// Table index
    pub fn id(&self) -> PairId {
        self.id
    }

    /// Pair identity
    pub fn key(&self) -> &PairKey {
        &self.key
    }

    /// Timestamp of the last accepted sample
    pub fn last_timestamp(&self) -> Option<Timestamp> {
        self.last_timestamp
    }

    /// Start of the current below-horizon stretch
    pub fn below_horizon_since(&self) -> Option<Timestamp> {
        self.below_horizon_since
    }

    /// All machines, in [`EventType::ALL`] order
    pub fn machines(&self) -> &[EventMachine; 4] {
        &self.machines
    }

    /// Machine of one event type
    pub fn machine(&self, event_type: EventType) -> &EventMachine {
        &self.machines[event_type.index()]
    }

    /// Currently active events
    pub fn open_events(&self) -> impl Iterator<Item = &MeasurementEvent> {
        self.machines.iter().filter_map(EventMachine::open_event)
    }

    /// True once the pair was retired; it accepts no further samples.
    pub fn is_retired(&self) -> bool {
        self.retired_at.is_some()
    }

    /// Instant the pair was retired
    pub fn retired_at(&self) -> Option<Timestamp> {
        self.retired_at
    }

    /// Applies one sample to every machine.
    ///
    /// # Errors
    ///
    /// `PairRetired` once the pair has been retired, and `OutOfOrderSample`
    /// if `sample` is not strictly newer than the last accepted one; the
    /// state is then left untouched. Missing or invalid
    /// inputs are not errors here: they freeze the affected machines and are
    /// listed in [`PairStep::errors`].
    pub fn process(
        &mut self,
        sample: &PairSample,
        config: &EventConfig,
    ) -> Result<PairStep, EvaluationError> {
        let ts = sample.timestamp;
        if let Some(retired_at) = self.retired_at {
            debug!(
                pair = %self.key,
                timestamp = ts.as_millis(),
                retired_ms = retired_at.as_millis(),
                "Sample for retired pair dropped"
            );
            return Err(EvaluationError::PairRetired {
                pair: self.key.clone(),
                timestamp: ts,
                retired_at,
            });
        }
        if let Some(last) = self.last_timestamp {
            if ts <= last {
                warn!(
                    pair = %self.key,
                    timestamp = ts.as_millis(),
                    last = last.as_millis(),
                    "Out-of-order sample rejected"
                );
                return Err(EvaluationError::OutOfOrderSample {
                    pair: self.key.clone(),
                    timestamp: ts,
                    last,
                });
            }
        }
        self.last_timestamp = Some(ts);

        let mut step = PairStep::default();
        for machine in self.machines.iter_mut() {
            match condition::evaluate(machine.event_type(), sample, config) {
                Ok(verdict) => {
                    if let Some(event) =
                        machine.step(verdict, sample, config.time_to_trigger_ms, &self.key)
                    {
                        step.events.push(event);
                    }
                }
                Err(reason) => {
                    let err = frozen(reason, &self.key, ts);
                    if !step.errors.contains(&err) {
                        step.errors.push(err);
                    }
                }
            }
        }
        for err in &step.errors {
            match err {
                EvaluationError::NumericOverflow { .. } => error!("{err}"),
                _ => warn!("{err}"),
            }
        }

        if sample.either_below_horizon() {
            let since = *self.below_horizon_since.get_or_insert(ts);
            if ts.has_elapsed(since, config.visibility_grace_ms) {
                step.events.extend(self.retire(ts));
                step.retired = true;
            }
        } else {
            self.below_horizon_since = None;
        }

        Ok(step)
    }

    /// Returns every machine to idle, closing open events at `at`.
    pub fn retire(&mut self, at: Timestamp) -> Vec<MeasurementEvent> {
        let closed: Vec<_> = self
            .machines
            .iter_mut()
            .filter_map(|m| m.close(at, &self.key))
            .collect();
        self.below_horizon_since = None;
        self.retired_at = Some(at);
        info!(pair = %self.key, at_ms = at.as_millis(), closed = closed.len(), "Pair retired");
        closed
    }

    /// True if every machine is idle
    pub fn is_idle(&self) -> bool {
        self.machines.iter().all(|m| m.state() == TriggerState::Idle)
    }
}

fn frozen(reason: Unavailable, pair: &PairKey, timestamp: Timestamp) -> EvaluationError {
    let pair = pair.clone();
    match reason {
        Unavailable::Missing(field) => EvaluationError::MissingField {
            pair,
            timestamp,
            field,
        },
        Unavailable::InvalidGeometry(satellite) => EvaluationError::InvalidGeometry {
            pair,
            timestamp,
            satellite,
        },
        Unavailable::NonFinite => EvaluationError::NumericOverflow { pair, timestamp },
    }
}

/// Fixed-capacity arena of pair states
#[derive(Debug, Clone)]
pub struct PairTable {
    slots: Vec<Option<PairState>>,
    free: Vec<u32>,
    index: HashMap<PairKey, PairId>,
    capacity: usize,
}

impl PairTable {
    /// Creates an empty table holding at most `capacity` pairs.
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            index: HashMap::new(),
            capacity,
        }
    }

    /// Maximum number of pairs
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of tracked pairs
    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// True if no pair is tracked
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Id of a tracked pair
    pub fn lookup(&self, key: &PairKey) -> Option<PairId> {
        self.index.get(key).copied()
    }

    /// State of a tracked pair
    pub fn get(&self, id: PairId) -> Option<&PairState> {
        self.slots.get(id.index()).and_then(Option::as_ref)
    }

    /// Mutable state of a tracked pair
    pub fn get_mut(&mut self, id: PairId) -> Option<&mut PairState> {
        self.slots.get_mut(id.index()).and_then(Option::as_mut)
    }

    /// State of a tracked pair by identity
    pub fn get_by_key(&self, key: &PairKey) -> Option<&PairState> {
        self.lookup(key).and_then(|id| self.get(id))
    }

    /// Starts tracking `key`, reusing a freed slot when there is one.
    ///
    /// Returns the existing id if the pair is already tracked, or `None` if
    /// the table is full.
    pub fn insert(&mut self, key: PairKey) -> Option<PairId> {
        if let Some(id) = self.lookup(&key) {
            return Some(id);
        }
        let id = match self.free.pop() {
            Some(raw) => PairId(raw),
            None if self.slots.len() < self.capacity => {
                let id = PairId(u32::try_from(self.slots.len()).ok()?);
                self.slots.push(None);
                id
            }
            None => return None,
        };
        self.index.insert(key.clone(), id);
        self.slots[id.index()] = Some(PairState::new(id, key));
        Some(id)
    }

    /// Stops tracking a pair and frees its slot.
    pub fn remove(&mut self, id: PairId) -> Option<PairState> {
        let state = self.slots.get_mut(id.index())?.take()?;
        self.index.remove(&state.key);
        self.free.push(id.0);
        Some(state)
    }

    /// Frees the slot of every retired pair.
    pub fn remove_retired(&mut self) -> usize {
        let retired: Vec<PairId> = self
            .iter()
            .filter(|p| p.is_retired())
            .map(PairState::id)
            .collect();
        for id in &retired {
            self.remove(*id);
        }
        retired.len()
    }

    /// Drops every pair.
    pub fn clear(&mut self) {
        self.slots.clear();
        self.free.clear();
        self.index.clear();
    }

    /// Tracked pairs in slot order
    pub fn iter(&self) -> impl Iterator<Item = &PairState> {
        self.slots.iter().filter_map(Option::as_ref)
    }

    pub(crate) fn slots_mut(&mut self) -> &mut [Option<PairState>] {
        &mut self.slots
    }

    /// Re-inserts a pair state, assigning it a slot in this table.
    pub(crate) fn adopt(&mut self, mut state: PairState) -> Option<PairId> {
        let id = self.insert(state.key.clone())?;
        state.id = id;
        self.slots[id.index()] = Some(state);
        Some(id)
    }
}
