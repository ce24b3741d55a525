// /////////////////////////////////////////////////////////////////////////////
// Kernel Memory Core
// SPDX-License-Identifier: MIT
// /////////////////////////////////////////////////////////////////////////////

//! # Queue Port
//!
//! A named, at-least-once queue with visibility timeout and poison-queue
//! escalation (spec.md §4.4). Ordering is best-effort FIFO, never
//! guaranteed. Messages are small `(index, document_id, step)` references,
//! never document bodies.

use async_trait::async_trait;
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use crate::error::KmError;
use crate::value_objects::{DocumentId, IndexName, StepName};

/// Wire format for a queue message (spec.md §6).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueMessage {
    pub index: IndexName,
    pub document_id: DocumentId,
    pub step: StepName,
    pub attempt: u32,
}

impl QueueMessage {
    pub fn first_attempt(index: IndexName, document_id: DocumentId, step: StepName) -> Self {
        Self { index, document_id, step, attempt: 1 }
    }

    pub fn next_attempt(&self) -> Self {
        Self { attempt: self.attempt + 1, ..self.clone() }
    }
}

/// Connection-time options for a named queue.
#[derive(Debug, Clone)]
pub struct QueueOptions {
    /// Duration a dequeued-but-unacked message stays invisible to other
    /// consumers; the effective per-step deadline (spec.md §5).
    pub visibility_timeout: Duration,
    /// Messages exceeding this many delivery attempts are routed to
    /// `<name><poison_suffix>` instead of being redelivered.
    pub max_retries: u32,
    /// Suffix appended to the queue name to form the poison queue name.
    pub poison_suffix: String,
}

impl Default for QueueOptions {
    fn default() -> Self {
        Self {
            visibility_timeout: Duration::from_secs(300),
            max_retries: 10,
            poison_suffix: "-poison".to_string(),
        }
    }
}

/// A handler invoked for each dequeued message. Returning `Ok(true)` acks
/// and deletes the message; `Ok(false)` or an error nacks it (redelivered
/// after the visibility timeout, or routed to the poison queue once
/// `max_retries` is exceeded).
pub type DequeueHandler = Arc<dyn Fn(QueueMessage) -> BoxFuture<'static, Result<bool, KmError>> + Send + Sync>;

/// A single named queue connection.
#[async_trait]
pub trait Queue: Send + Sync {
    /// Enqueues `message` for delivery.
    async fn enqueue(&self, message: QueueMessage) -> Result<(), KmError>;

    /// Registers the callback invoked for every dequeued message. A queue
    /// implementation may only have one active handler at a time; calling
    /// this again replaces the previous handler.
    async fn on_dequeue(&self, handler: DequeueHandler) -> Result<(), KmError>;

    /// Releases resources (background pollers, connections). Safe to call
    /// more than once.
    async fn dispose(&self) -> Result<(), KmError>;
}

/// Connects to (and lazily creates) named queues.
#[async_trait]
pub trait QueueFactory: Send + Sync {
    async fn connect_to(&self, name: &str, options: QueueOptions) -> Result<Arc<dyn Queue>, KmError>;
}
