//! Batch evaluation of all pairs of one serving satellite
//!
//! A batch is split into per-pair sample streams. Every pair owns one slot
//! of the [`PairTable`]; the streams run on the rayon pool with one worker
//! per slot, and per-worker results are merged once the parallel section
//! ends.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use ntnsim_common::config::{EventConfig, NtnsimConfig};
use ntnsim_common::types::{LinkSample, SatelliteId};
use ntnsim_signal::{QualityAssessment, SignalQualityEngine};

use crate::error::{EvaluationError, SkippedSample, SnapshotError};
use crate::event::MeasurementEvent;
use crate::pair_table::{PairKey, PairState, PairTable};
use crate::sample::{Observation, PairSample};
use crate::stats::EvaluationStats;

/// Samples of the serving satellite and its candidates over one window.
///
/// Samples must be ordered by timestamp; samples sharing a timestamp form
/// one tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServingBatch {
    /// Serving satellite
    pub serving_id: SatelliteId,
    /// Serving and candidate samples
    pub samples: Vec<LinkSample>,
}

/// Result of evaluating one batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchOutcome {
    /// Serving satellite
    pub serving_id: SatelliteId,
    /// Emitted event records, ordered by emission time
    pub events: Vec<MeasurementEvent>,
    /// Samples skipped or machines frozen, ordered by timestamp
    pub skipped: Vec<SkippedSample>,
    /// Evaluation stopped early on request
    pub cancelled: bool,
}

/// Resumable evaluator state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluatorSnapshot {
    pairs: Vec<PairState>,
}

impl EvaluatorSnapshot {
    /// Pair states captured in the snapshot
    pub fn pairs(&self) -> &[PairState] {
        &self.pairs
    }
}

#[derive(Default)]
struct WorkerOutput {
    events: Vec<MeasurementEvent>,
    skipped: Vec<SkippedSample>,
    stats: EvaluationStats,
    cancelled: bool,
}

/// Evaluates serving batches against the tracked pairs.
pub struct BatchEvaluator {
    config: Arc<NtnsimConfig>,
    engine: SignalQualityEngine,
    pairs: PairTable,
    parallel: bool,
}

impl BatchEvaluator {
    /// Creates an evaluator with an empty pair table.
    pub fn new(config: Arc<NtnsimConfig>) -> Self {
        let engine = SignalQualityEngine::new(config.link.clone());
        let pairs = PairTable::new(config.events.max_tracked_pairs);
        Self {
            config,
            engine,
            pairs,
            parallel: true,
        }
    }

    /// Selects parallel (default) or sequential pair evaluation.
    pub fn with_parallelism(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Shared configuration
    pub fn config(&self) -> &NtnsimConfig {
        &self.config
    }

    /// Signal-quality engine in use
    pub fn engine(&self) -> &SignalQualityEngine {
        &self.engine
    }

    /// Tracked pairs
    pub fn pairs(&self) -> &PairTable {
        &self.pairs
    }

    /// Evaluates one batch to completion.
    pub fn evaluate(&mut self, batch: &ServingBatch, stats: &mut EvaluationStats) -> BatchOutcome {
        self.evaluate_cancellable(batch, stats, &AtomicBool::new(false))
    }

    /// Evaluates one batch, stopping between samples once `cancel` is set.
    ///
    /// Every sample is applied to its pair atomically, so a cancelled run
    /// leaves each pair exactly after the last sample it accepted. The
    /// outcome is marked cancelled only if some pair actually stopped short.
    ///
    /// A pair retired during the batch accepts none of its later samples;
    /// they are reported as `PairRetired` and its slot is freed once the
    /// batch ends.
    pub fn evaluate_cancellable(
        &mut self,
        batch: &ServingBatch,
        stats: &mut EvaluationStats,
        cancel: &AtomicBool,
    ) -> BatchOutcome {
        let assessments = self.engine.compute_batch(&batch.samples);
        let streams = pair_streams(batch, &assessments);

        let mut skipped = Vec::new();
        let mut inputs: Vec<Vec<PairSample>> = Vec::new();
        for (key, samples) in streams {
            let id = match self.pairs.lookup(&key) {
                Some(id) => id,
                None => match self.pairs.insert(key.clone()) {
                    Some(id) => {
                        stats.pairs_created += 1;
                        debug!(pair = %key, id = %id, "Tracking new pair");
                        id
                    }
                    None => {
                        let capacity = self.pairs.capacity();
                        warn!(
                            pair = %key,
                            capacity,
                            "Pair table full, dropping {} samples",
                            samples.len()
                        );
                        for sample in &samples {
                            let err = EvaluationError::PairCapacityExceeded {
                                pair: key.clone(),
                                timestamp: sample.timestamp,
                                capacity,
                            };
                            stats.record_error(err.kind());
                            skipped.push(SkippedSample::from(&err));
                        }
                        continue;
                    }
                },
            };
            if inputs.len() <= id.index() {
                inputs.resize_with(id.index() + 1, Vec::new);
            }
            inputs[id.index()] = samples;
        }

        let config = Arc::clone(&self.config);
        let events_config = &config.events;
        let slots = self.pairs.slots_mut();
        inputs.resize_with(slots.len(), Vec::new);
        let run = |(slot, samples): (&mut Option<PairState>, &Vec<PairSample>)| {
            run_pair(slot, samples, events_config, cancel)
        };
        let outputs: Vec<WorkerOutput> = if self.parallel {
            slots.par_iter_mut().zip(inputs.par_iter()).map(run).collect()
        } else {
            slots.iter_mut().zip(inputs.iter()).map(run).collect()
        };

        let mut events = Vec::new();
        let mut cancelled = false;
        for output in outputs {
            stats.merge(&output.stats);
            events.extend(output.events);
            skipped.extend(output.skipped);
            cancelled |= output.cancelled;
        }
        events.sort_by(|a, b| {
            (a.emitted_at(), &a.candidate_id, a.event_type, a.leave_time.is_some()).cmp(&(
                b.emitted_at(),
                &b.candidate_id,
                b.event_type,
                b.leave_time.is_some(),
            ))
        });
        skipped.sort_by(|a, b| a.timestamp.cmp(&b.timestamp).then_with(|| a.pair.cmp(&b.pair)));

        let freed = self.pairs.remove_retired();
        if freed > 0 {
            debug!(freed, "Released retired pair slots");
        }
        if cancelled {
            info!(serving = %batch.serving_id, "Batch evaluation cancelled");
        }
        debug!(
            serving = %batch.serving_id,
            events = events.len(),
            skipped = skipped.len(),
            pairs = self.pairs.len(),
            "Batch evaluated"
        );

        BatchOutcome {
            serving_id: batch.serving_id.clone(),
            events,
            skipped,
            cancelled,
        }
    }

    /// Captures every tracked pair.
    pub fn snapshot(&self) -> EvaluatorSnapshot {
        EvaluatorSnapshot {
            pairs: self.pairs.iter().cloned().collect(),
        }
    }

    /// Rebuilds an evaluator from a snapshot.
    ///
    /// # Errors
    ///
    /// Returns `SnapshotError` if the snapshot does not fit the configured
    /// table capacity or repeats a pair.
    pub fn restore(
        config: Arc<NtnsimConfig>,
        snapshot: EvaluatorSnapshot,
    ) -> Result<Self, SnapshotError> {
        let mut evaluator = Self::new(config);
        let capacity = evaluator.pairs.capacity();
        if snapshot.pairs.len() > capacity {
            return Err(SnapshotError::CapacityExceeded {
                pairs: snapshot.pairs.len(),
                capacity,
            });
        }
        for state in snapshot.pairs {
            if evaluator.pairs.lookup(state.key()).is_some() {
                return Err(SnapshotError::DuplicatePair(state.key().clone()));
            }
            evaluator.pairs.adopt(state);
        }
        info!(pairs = evaluator.pairs.len(), "Evaluator restored from snapshot");
        Ok(evaluator)
    }

    /// Drops every tracked pair, returning how many there were.
    pub fn end_session(&mut self) -> usize {
        let dropped = self.pairs.len();
        self.pairs.clear();
        info!(dropped, "Session ended");
        dropped
    }
}

fn run_pair(
    slot: &mut Option<PairState>,
    samples: &[PairSample],
    config: &EventConfig,
    cancel: &AtomicBool,
) -> WorkerOutput {
    let mut out = WorkerOutput::default();
    let Some(state) = slot.as_mut() else {
        return out;
    };
    for sample in samples {
        if cancel.load(Ordering::Relaxed) {
            out.cancelled = true;
            break;
        }
        match state.process(sample, config) {
            Ok(step) => {
                out.stats.samples_processed += 1;
                for event in &step.events {
                    if event.is_active() {
                        out.stats.events_triggered += 1;
                    } else {
                        out.stats.events_closed += 1;
                    }
                }
                for err in &step.errors {
                    out.stats.record_error(err.kind());
                    out.skipped.push(SkippedSample::from(err));
                }
                if step.retired {
                    out.stats.pairs_retired += 1;
                }
                out.events.extend(step.events);
            }
            Err(err) => {
                out.stats.record_error(err.kind());
                out.skipped.push(SkippedSample::from(&err));
            }
        }
    }
    out
}

/// Splits a batch into per-candidate streams, in order of first appearance.
fn pair_streams(
    batch: &ServingBatch,
    assessments: &[QualityAssessment],
) -> Vec<(PairKey, Vec<PairSample>)> {
    let samples = &batch.samples;
    let mut streams: Vec<(PairKey, Vec<PairSample>)> = Vec::new();
    let mut position: HashMap<&SatelliteId, usize> = HashMap::new();

    let mut start = 0;
    while start < samples.len() {
        let ts = samples[start].timestamp;
        let len = samples[start..].iter().take_while(|s| s.timestamp == ts).count();
        let tick = start..start + len;

        let mut servings = tick
            .clone()
            .filter(|&i| samples[i].satellite_id == batch.serving_id);
        let serving = servings
            .next()
            .map(|i| Observation::new(&samples[i], &assessments[i]));
        if servings.next().is_some() {
            warn!(
                serving = %batch.serving_id,
                timestamp = ts.as_millis(),
                "Duplicate serving sample in tick, using the first"
            );
        }

        for i in tick {
            let sample = &samples[i];
            if sample.satellite_id == batch.serving_id {
                continue;
            }
            let idx = *position.entry(&sample.satellite_id).or_insert_with(|| {
                streams.push((
                    PairKey::new(batch.serving_id.clone(), sample.satellite_id.clone()),
                    Vec::new(),
                ));
                streams.len() - 1
            });
            streams[idx].1.push(PairSample {
                timestamp: ts,
                serving_id: batch.serving_id.clone(),
                serving: serving.clone(),
                candidate: Observation::new(sample, &assessments[i]),
            });
        }
        start += len;
    }
    streams
}
