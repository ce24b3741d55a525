// /////////////////////////////////////////////////////////////////////////////
// Kernel Memory Core
// SPDX-License-Identifier: MIT
// /////////////////////////////////////////////////////////////////////////////

//! # Handler Contract
//!
//! A handler is one named step of the ingestion pipeline (spec.md §4.2):
//! given the current [`PipelineState`], it does its work and returns
//! whether the step succeeded and the (possibly updated) state. Handlers
//! never call [`PipelineState::complete_step`] themselves — the
//! orchestrator does that once a handler reports success, keeping step
//! bookkeeping in one place.

use async_trait::async_trait;

use crate::aggregates::PipelineState;
use crate::error::KmError;

/// Outcome of a single handler invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandlerOutcome {
    /// The step's work is done; the orchestrator will advance
    /// `completed_steps` and enqueue the next step.
    Success,
    /// The step is not yet done but made no unrecoverable error (e.g. it
    /// deferred to a sub-pipeline); the orchestrator leaves the state
    /// as-is and does not advance.
    Continue,
}

/// One named step of the ingestion or deletion pipeline.
#[async_trait]
pub trait Handler: Send + Sync {
    /// The step name this handler registers under; must equal the
    /// `StepName` instances that appear in pipelines routed to it.
    fn name(&self) -> &str;

    /// Executes the step against `state`, returning the outcome and the
    /// (possibly mutated in-memory) state. Errors are returned rather
    /// than panicking; the orchestrator classifies them via
    /// [`KmError::is_recoverable`] to decide between retry and
    /// terminal failure.
    async fn process(&self, state: PipelineState) -> Result<(HandlerOutcome, PipelineState), KmError>;
}
