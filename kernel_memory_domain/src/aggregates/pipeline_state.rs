// /////////////////////////////////////////////////////////////////////////////
// Kernel Memory Core
// SPDX-License-Identifier: MIT
// /////////////////////////////////////////////////////////////////////////////

//! # Pipeline State Aggregate
//!
//! The durable record of a document's ingestion progress (spec.md §3). This
//! is the one write-contended object per document (spec.md §5): the
//! orchestrator serializes access to it via the single-worker-per-document
//! invariant, and this aggregate additionally carries an optimistic
//! concurrency `version` so a stray concurrent writer is detected rather
//! than silently lost.
//!
//! ## Invariants
//!
//! - `completed_steps` is a strict prefix of `steps`.
//! - `remaining_steps()` = `steps` minus `completed_steps`, order preserved.
//! - Once `terminal_error` is set, the aggregate is terminal and every
//!   mutating method returns an error instead of changing state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ulid::Ulid;

use crate::error::KmError;
use crate::value_objects::{DocumentId, FileDescriptor, IndexName, PipelineStatus, StepName, TagCollection};

/// The durable per-document pipeline state. See module docs for invariants.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineState {
    pub index: IndexName,
    pub document_id: DocumentId,
    pub execution_id: String,
    steps: Vec<StepName>,
    completed_steps: Vec<StepName>,
    pub files: Vec<FileDescriptor>,
    pub tags: TagCollection,
    pub creation: DateTime<Utc>,
    pub last_update: DateTime<Utc>,
    pub failed_attempts: u32,
    pub terminal_error: Option<String>,
    pub status: PipelineStatus,
    /// Optimistic-concurrency version; bumped on every successful write.
    pub version: u64,
}

impl PipelineState {
    /// Admits a new pipeline with the given ordered `steps`. `steps` is
    /// immutable after this call except via [`Self::restart`].
    pub fn admit(index: IndexName, document_id: DocumentId, steps: Vec<StepName>, files: Vec<FileDescriptor>, tags: TagCollection) -> Self {
        let now = Utc::now();
        Self {
            index,
            document_id,
            execution_id: Ulid::new().to_string(),
            steps,
            completed_steps: Vec::new(),
            files,
            tags,
            creation: now,
            last_update: now,
            failed_attempts: 0,
            terminal_error: None,
            status: PipelineStatus::Admitted,
            version: 0,
        }
    }

    pub fn steps(&self) -> &[StepName] {
        &self.steps
    }

    pub fn completed_steps(&self) -> &[StepName] {
        &self.completed_steps
    }

    /// `Steps \ CompletedSteps`, order preserved (spec.md §3).
    pub fn remaining_steps(&self) -> &[StepName] {
        &self.steps[self.completed_steps.len()..]
    }

    pub fn first_remaining_step(&self) -> Option<&StepName> {
        self.remaining_steps().first()
    }

    pub fn is_terminal(&self) -> bool {
        self.terminal_error.is_some() || self.status.is_terminal()
    }

    /// `IsReady`: state exists, no remaining steps, no terminal error.
    pub fn is_ready(&self) -> bool {
        self.remaining_steps().is_empty() && self.terminal_error.is_none()
    }

    /// Marks the current first remaining step as running, for status
    /// reporting; does not otherwise mutate the aggregate.
    pub fn mark_running(&mut self) {
        if let Some(step) = self.first_remaining_step().cloned() {
            self.status = PipelineStatus::Running { step: step.as_str().to_string() };
        }
    }

    /// Appends `step` to `completed_steps`. Fails if the aggregate is
    /// terminal, or if `step` is not the first remaining step (handlers
    /// must run in declared order, spec.md §5).
    pub fn complete_step(&mut self, step: &StepName) -> Result<(), KmError> {
        if self.is_terminal() {
            return Err(KmError::conflict("pipeline is already terminal"));
        }
        match self.first_remaining_step() {
            Some(expected) if expected == step => {
                self.completed_steps.push(step.clone());
                self.touch();
                if self.remaining_steps().is_empty() {
                    self.status = PipelineStatus::Completed;
                } else {
                    self.mark_running();
                }
                Ok(())
            }
            Some(expected) => Err(KmError::conflict(format!(
                "step out of order: completed {step} but {expected} was expected"
            ))),
            None => Err(KmError::conflict("no remaining steps to complete")),
        }
    }

    /// Increments the transient-failure counter; returns `true` once the
    /// caller should escalate to the poison queue (spec.md §4.1: default
    /// `MaxRetries` = 10).
    pub fn record_failed_attempt(&mut self, max_retries: u32) -> bool {
        self.failed_attempts += 1;
        self.touch();
        self.failed_attempts >= max_retries
    }

    /// Records a terminal failure. Idempotent: calling twice keeps the
    /// first error.
    pub fn fail(&mut self, error: impl Into<String>) {
        if self.terminal_error.is_none() {
            self.terminal_error = Some(error.into());
            self.status = PipelineStatus::Failed;
            self.touch();
        }
    }

    /// Transitions to `Deleting`, suppressing further step advancement
    /// regardless of current state (spec.md §4.8: cascade delete under
    /// contention).
    pub fn begin_deleting(&mut self) {
        if !matches!(self.status, PipelineStatus::Deleted) {
            self.status = PipelineStatus::Deleting;
            self.steps = StepName::deletion_chain();
            self.completed_steps.clear();
            self.touch();
        }
    }

    pub fn mark_deleted(&mut self) {
        self.status = PipelineStatus::Deleted;
        self.touch();
    }

    /// Re-admission: replaces `steps`/`files`/`tags` and clears completion
    /// progress. Only legal when the pipeline is already terminal, or
    /// `force` is set (spec.md §4.1 `AdmitOptions::force_restart`).
    pub fn restart(&mut self, steps: Vec<StepName>, files: Vec<FileDescriptor>, tags: TagCollection, force: bool) -> Result<(), KmError> {
        if !force && !self.is_terminal() {
            return Err(KmError::conflict("pipeline is still running; pass force_restart to override"));
        }
        self.steps = steps;
        self.completed_steps.clear();
        self.files = files;
        self.tags.merge(&tags);
        self.terminal_error = None;
        self.failed_attempts = 0;
        self.status = PipelineStatus::Admitted;
        self.touch();
        Ok(())
    }

    fn touch(&mut self) {
        self.last_update = Utc::now();
        self.version += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> PipelineState {
        PipelineState::admit(
            IndexName::new("default"),
            DocumentId::new("d1"),
            StepName::standard_chain(),
            vec![],
            TagCollection::new(),
        )
    }

    #[test]
    fn completed_and_remaining_partition_steps() {
        let mut state = sample();
        assert_eq!(state.remaining_steps(), state.steps());
        state.complete_step(&StepName::extract()).unwrap();
        assert_eq!(state.completed_steps(), &[StepName::extract()]);
        assert_eq!(state.remaining_steps().len(), state.steps().len() - 1);
    }

    #[test]
    fn completing_out_of_order_is_rejected() {
        let mut state = sample();
        assert!(state.complete_step(&StepName::partition()).is_err());
    }

    #[test]
    fn all_steps_complete_marks_ready() {
        let mut state = sample();
        for step in state.steps().to_vec() {
            state.complete_step(&step).unwrap();
        }
        assert!(state.is_ready());
        assert_eq!(state.status, PipelineStatus::Completed);
    }

    #[test]
    fn terminal_state_rejects_further_mutation() {
        let mut state = sample();
        state.fail("bad mime type");
        assert!(state.complete_step(&StepName::extract()).is_err());
        state.fail("second error ignored");
        assert_eq!(state.terminal_error.as_deref(), Some("bad mime type"));
    }

    #[test]
    fn retry_escalates_after_max_retries() {
        let mut state = sample();
        for _ in 0..9 {
            assert!(!state.record_failed_attempt(10));
        }
        assert!(state.record_failed_attempt(10));
    }

    #[test]
    fn deleting_reachable_mid_ingest() {
        let mut state = sample();
        state.complete_step(&StepName::extract()).unwrap();
        state.begin_deleting();
        assert_eq!(state.status, PipelineStatus::Deleting);
        assert_eq!(state.steps(), StepName::deletion_chain());
    }

    proptest::proptest! {
        #[test]
        fn prop_completed_is_always_prefix_of_steps(n_complete in 0usize..=4) {
            let mut state = sample();
            let steps = state.steps().to_vec();
            for step in steps.iter().take(n_complete) {
                state.complete_step(step).unwrap();
            }
            let expected_completed = &steps[..n_complete];
            proptest::prop_assert_eq!(state.completed_steps(), expected_completed);
            let mut concat = state.completed_steps().to_vec();
            concat.extend_from_slice(state.remaining_steps());
            proptest::prop_assert_eq!(concat, steps);
        }
    }
}
