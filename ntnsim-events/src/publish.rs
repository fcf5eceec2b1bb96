//! Fire-and-forget delivery of batch outcomes to downstream consumers

use tokio::sync::mpsc;
use tracing::warn;

use crate::evaluator::BatchOutcome;

/// Message carried by the publisher channel
#[derive(Debug)]
pub enum PublishMessage {
    /// Result of one evaluated batch
    Outcome(BatchOutcome),
    /// No more outcomes will follow
    Shutdown,
}

/// Sending side of the outcome channel.
///
/// Publishing never blocks the evaluation loop: a full or closed channel
/// drops the outcome and logs a warning.
#[derive(Debug)]
pub struct EventPublisher {
    tx: mpsc::Sender<PublishMessage>,
}

impl Clone for EventPublisher {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
        }
    }
}

impl EventPublisher {
    /// Creates a publisher from a sender.
    pub fn new(tx: mpsc::Sender<PublishMessage>) -> Self {
        Self { tx }
    }

    /// Creates a publisher and the receiver its outcomes arrive on.
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<PublishMessage>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self::new(tx), rx)
    }

    /// Queues an outcome without waiting.
    ///
    /// Returns false if the outcome was dropped.
    pub fn publish(&self, outcome: BatchOutcome) -> bool {
        match self.tx.try_send(PublishMessage::Outcome(outcome)) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(PublishMessage::Outcome(dropped))) => {
                warn!(
                    serving = %dropped.serving_id,
                    events = dropped.events.len(),
                    "Publisher channel full, outcome dropped"
                );
                false
            }
            Err(mpsc::error::TrySendError::Full(_)) => false,
            Err(mpsc::error::TrySendError::Closed(_)) => {
                warn!("Publisher channel closed, outcome dropped");
                false
            }
        }
    }

    /// Tells the consumer that no more outcomes will follow.
    pub async fn shutdown(&self) -> Result<(), mpsc::error::SendError<PublishMessage>> {
        self.tx.send(PublishMessage::Shutdown).await
    }

    /// Returns true if the consumer has gone away.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}
