//! Hysteresis / time-to-trigger state machine of one event type for one pair
//!
//! ```text
//!   IDLE --enter--> ENTERING --enter held TTT--> ACTIVE --leave--> LEAVING --leave held TTT--> IDLE
//!                      |                           ^                  |
//!                      +--no enter--> IDLE         +----no leave------+
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

use ntnsim_common::logging::log_transition;
use ntnsim_common::types::Timestamp;

use crate::condition::Verdict;
use crate::event::{EventType, MeasurementEvent};
use crate::pair_table::PairKey;
use crate::sample::PairSample;

/// Trigger state of one machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerState {
    /// Entering condition not met
    #[default]
    Idle,
    /// Entering condition met, waiting for time-to-trigger
    Entering,
    /// Event triggered
    Active,
    /// Leaving condition met, waiting for time-to-trigger
    Leaving,
}

impl TriggerState {
    /// State name used in logs
    pub fn as_str(&self) -> &'static str {
        match self {
            TriggerState::Idle => "IDLE",
            TriggerState::Entering => "ENTERING",
            TriggerState::Active => "ACTIVE",
            TriggerState::Leaving => "LEAVING",
        }
    }
}

impl fmt::Display for TriggerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// State machine of one event type for one pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventMachine {
    event_type: EventType,
    state: TriggerState,
    /// Timestamp of the first sample of the current waiting window
    condition_since: Option<Timestamp>,
    /// Event emitted on activation, held until it leaves
    open_event: Option<MeasurementEvent>,
}

impl EventMachine {
    /// Creates an idle machine.
    pub fn new(event_type: EventType) -> Self {
        Self {
            event_type,
            state: TriggerState::Idle,
            condition_since: None,
            open_event: None,
        }
    }

    /// Event type evaluated by this machine
    pub fn event_type(&self) -> EventType {
        self.event_type
    }

    /// Current state
    pub fn state(&self) -> TriggerState {
        self.state
    }

    /// Start of the current waiting window, if any
    pub fn condition_since(&self) -> Option<Timestamp> {
        self.condition_since
    }

    /// The active event, if any
    pub fn open_event(&self) -> Option<&MeasurementEvent> {
        self.open_event.as_ref()
    }

    /// Advances the machine with the verdict for `sample`.
    ///
    /// Returns the event record emitted at this sample: a new event on
    /// activation, or the open event with `leave_time` set on leaving.
    pub fn step(
        &mut self,
        verdict: Verdict,
        sample: &PairSample,
        time_to_trigger_ms: u64,
        pair: &PairKey,
    ) -> Option<MeasurementEvent> {
        let ts = sample.timestamp;
        match self.state {
            TriggerState::Idle => {
                if !verdict.enter {
                    return None;
                }
                self.transition(TriggerState::Entering, pair, ts);
                self.condition_since = Some(ts);
                self.try_activate(sample, time_to_trigger_ms, pair)
            }
            TriggerState::Entering => {
                if verdict.enter {
                    self.try_activate(sample, time_to_trigger_ms, pair)
                } else {
                    self.condition_since = None;
                    self.transition(TriggerState::Idle, pair, ts);
                    None
                }
            }
            TriggerState::Active => {
                if !verdict.leave {
                    return None;
                }
                self.transition(TriggerState::Leaving, pair, ts);
                self.condition_since = Some(ts);
                self.try_leave(ts, time_to_trigger_ms, pair)
            }
            TriggerState::Leaving => {
                if verdict.leave {
                    self.try_leave(ts, time_to_trigger_ms, pair)
                } else {
                    self.condition_since = None;
                    self.transition(TriggerState::Active, pair, ts);
                    None
                }
            }
        }
    }

    /// Forces the machine back to idle, closing the open event at `at`.
    pub fn close(&mut self, at: Timestamp, pair: &PairKey) -> Option<MeasurementEvent> {
        self.condition_since = None;
        if self.state != TriggerState::Idle {
            self.transition(TriggerState::Idle, pair, at);
        }
        let mut event = self.open_event.take()?;
        event.leave_time = Some(at);
        Some(event)
    }

    fn try_activate(
        &mut self,
        sample: &PairSample,
        time_to_trigger_ms: u64,
        pair: &PairKey,
    ) -> Option<MeasurementEvent> {
        let since = self.condition_since?;
        if !sample.timestamp.has_elapsed(since, time_to_trigger_ms) {
            return None;
        }
        self.condition_since = None;
        self.transition(TriggerState::Active, pair, sample.timestamp);

        let event = MeasurementEvent::triggered(self.event_type, sample);
        tracing::info!(
            pair = %pair,
            event = self.event_type.as_str(),
            trigger_ms = sample.timestamp.as_millis(),
            "Measurement event triggered"
        );
        self.open_event = Some(event.clone());
        Some(event)
    }

    fn try_leave(
        &mut self,
        ts: Timestamp,
        time_to_trigger_ms: u64,
        pair: &PairKey,
    ) -> Option<MeasurementEvent> {
        let since = self.condition_since?;
        if !ts.has_elapsed(since, time_to_trigger_ms) {
            return None;
        }
        let event = self.close(ts, pair);
        if let Some(e) = &event {
            tracing::info!(
                pair = %pair,
                event = self.event_type.as_str(),
                trigger_ms = e.trigger_time.as_millis(),
                leave_ms = ts.as_millis(),
                "Measurement event left"
            );
        }
        event
    }

    fn transition(&mut self, to: TriggerState, pair: &PairKey, at: Timestamp) {
        log_transition(pair, self.event_type.as_str(), self.state.as_str(), to.as_str(), at);
        self.state = to;
    }
}
