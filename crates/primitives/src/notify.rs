//! Change notification
//!
//! Every successful create, patch and delete publishes a [`ChangeEvent`] to a
//! single topic. Downstream consumers (the search indexer in production)
//! subscribe to that topic; nothing in the plan store waits for them.
//!
//! Wire form of one message:
//!
//! ```json
//! {"operation":"patch","plan":{"objectId":"...","objectType":"plan", ...}}
//! ```

use parking_lot::Mutex;
use planstore_core::Plan;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::debug;

/// Kind of change an event reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    /// Plan written for the first time (or rewritten by a full update)
    Create,
    /// Plan and its sub-objects removed
    Delete,
    /// Plan merged with a partial document
    Patch,
}

impl Operation {
    /// Wire name of the operation
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Create => "create",
            Operation::Delete => "delete",
            Operation::Patch => "patch",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One published change
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeEvent {
    /// What happened
    pub operation: Operation,
    /// Plan after the change (before it, for deletes)
    pub plan: Plan,
}

impl ChangeEvent {
    /// Create an event
    pub fn new(operation: Operation, plan: Plan) -> Self {
        Self { operation, plan }
    }
}

/// Errors raised while publishing
#[derive(Debug, Error)]
pub enum NotifyError {
    /// The topic has no live consumer channel
    #[error("topic '{topic}' is closed")]
    Closed {
        /// Topic name
        topic: String,
    },
    /// The event could not be encoded
    #[error("failed to encode event: {0}")]
    Encode(String),
    /// The notifier rejected the event
    #[error("publish rejected: {0}")]
    Rejected(String),
}

impl From<NotifyError> for planstore_core::Error {
    fn from(e: NotifyError) -> Self {
        planstore_core::Error::NotificationFailed(e.to_string())
    }
}

/// Sink for change events
///
/// Called after the store writes of an operation completed. A failure here is
/// reported to the caller but does not undo those writes.
pub trait ChangeNotifier: Send + Sync {
    /// Publish one event
    fn publish(&self, event: &ChangeEvent) -> Result<(), NotifyError>;
}

// =============================================================================
// NoopNotifier
// =============================================================================

/// Notifier that drops every event
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopNotifier;

impl ChangeNotifier for NoopNotifier {
    fn publish(&self, event: &ChangeEvent) -> Result<(), NotifyError> {
        debug!(operation = %event.operation, plan = %event.plan.object_id, "event dropped");
        Ok(())
    }
}

// =============================================================================
// RecordingNotifier
// =============================================================================

/// Notifier that keeps every event in memory
///
/// Can be switched into a failing mode to exercise notification errors.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    events: Mutex<Vec<ChangeEvent>>,
    failing: Mutex<bool>,
}

impl RecordingNotifier {
    /// Create an empty recorder
    pub fn new() -> Self {
        Self::default()
    }

    /// Events published so far, in order
    pub fn events(&self) -> Vec<ChangeEvent> {
        self.events.lock().clone()
    }

    /// Operations published so far, in order
    pub fn operations(&self) -> Vec<Operation> {
        self.events.lock().iter().map(|e| e.operation).collect()
    }

    /// Remove and return every recorded event
    pub fn take(&self) -> Vec<ChangeEvent> {
        std::mem::take(&mut *self.events.lock())
    }

    /// Reject (`true`) or accept (`false`) subsequent events
    pub fn set_failing(&self, failing: bool) {
        *self.failing.lock() = failing;
    }
}

impl ChangeNotifier for RecordingNotifier {
    fn publish(&self, event: &ChangeEvent) -> Result<(), NotifyError> {
        if *self.failing.lock() {
            return Err(NotifyError::Rejected(format!(
                "{} for {}",
                event.operation, event.plan.object_id
            )));
        }
        self.events.lock().push(event.clone());
        Ok(())
    }
}

// =============================================================================
// ChannelNotifier
// =============================================================================

/// Notifier that sends encoded events down a tokio channel
///
/// The receiving half stands in for a message-queue topic: a consumer task
/// reads JSON messages from it and forwards them to the broker or indexer.
/// Sending never blocks.
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
    topic: String,
    sender: UnboundedSender<String>,
}

impl ChannelNotifier {
    /// Create a notifier and the receiver for its topic
    ///
    /// # Example
    ///
    /// ```
    /// use planstore_primitives::{ChangeEvent, ChangeNotifier, ChannelNotifier, Operation};
    /// use planstore_core::Plan;
    ///
    /// let (notifier, mut rx) = ChannelNotifier::new("plans_queue");
    /// notifier.publish(&ChangeEvent::new(Operation::Create, Plan::default())).unwrap();
    ///
    /// let message = rx.try_recv().unwrap();
    /// assert!(message.starts_with(r#"{"operation":"create""#));
    /// ```
    pub fn new(topic: impl Into<String>) -> (Self, UnboundedReceiver<String>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (
            Self {
                topic: topic.into(),
                sender,
            },
            receiver,
        )
    }

    /// Topic this notifier publishes to
    pub fn topic(&self) -> &str {
        &self.topic
    }
}

impl ChangeNotifier for ChannelNotifier {
    fn publish(&self, event: &ChangeEvent) -> Result<(), NotifyError> {
        let message =
            serde_json::to_string(event).map_err(|e| NotifyError::Encode(e.to_string()))?;
        self.sender
            .send(message)
            .map_err(|_| NotifyError::Closed {
                topic: self.topic.clone(),
            })?;
        debug!(topic = %self.topic, operation = %event.operation, plan = %event.plan.object_id, "event published");
        Ok(())
    }
}
