// /////////////////////////////////////////////////////////////////////////////
// Kernel Memory Core
// SPDX-License-Identifier: MIT
// /////////////////////////////////////////////////////////////////////////////

//! The five-step execution contract from spec.md §4.1, shared by the
//! in-process and distributed orchestrators so the state-machine logic is
//! written once.
//!
//! State persistence ordering rule: the queue (or in-process re-dispatch)
//! is never advanced before the state-file write has returned success.

use kernel_memory_domain::aggregates::PipelineState;
use kernel_memory_domain::error::KmError;
use kernel_memory_domain::repositories::{DocumentStore, HandlerOutcome};
use kernel_memory_domain::value_objects::{DocumentId, IndexName};

use super::registry::HandlerRegistry;

/// Name of the pipeline state file within a document's container
/// (spec.md §6: a compatibility surface).
pub const STATE_FILE_NAME: &str = "state.json";

/// Default retry ceiling before a work item is escalated to the poison
/// queue (spec.md §4.1).
pub const DEFAULT_MAX_RETRIES: u32 = 10;

/// Outcome of advancing a pipeline by one step.
pub enum StepOutcome {
    /// The step completed; more steps remain.
    Advanced(PipelineState),
    /// The step completed and no steps remain.
    Finished(PipelineState),
    /// The step failed transiently; caller should re-enqueue with backoff.
    Retry(PipelineState),
    /// `max_retries` was exceeded; the pipeline is now terminally failed.
    Poisoned(PipelineState),
    /// No handler is registered for the first remaining step. In
    /// distributed mode callers nack without incrementing; in in-process
    /// mode this is a hard [`KmError::internal`] per spec.md §4.1 step 3.
    HandlerMissing(PipelineState),
}

/// Persists `state` to the document store's `state.json`.
pub async fn save_state(document_store: &dyn DocumentStore, state: &PipelineState) -> Result<(), KmError> {
    let bytes = serde_json::to_vec_pretty(state)?;
    document_store.write_file(&state.index, &state.document_id, STATE_FILE_NAME, bytes).await
}

/// Loads the pipeline state for `(index, document_id)`, if one exists.
pub async fn load_state(
    document_store: &dyn DocumentStore,
    index: &IndexName,
    document_id: &DocumentId,
) -> Result<Option<PipelineState>, KmError> {
    if !document_store.exists(index, document_id).await? {
        return Ok(None);
    }
    match document_store.read_file_to_vec(index, document_id, STATE_FILE_NAME).await {
        Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
        Err(KmError::NotFound(_)) => Ok(None),
        Err(err) => Err(err),
    }
}

/// Runs the handler for `state`'s first remaining step and advances the
/// state machine accordingly. Does not loop: callers drive repeated calls
/// (in-process: a loop; distributed: one call per dequeued message).
pub async fn execute_step(
    document_store: &dyn DocumentStore,
    registry: &HandlerRegistry,
    state: PipelineState,
    max_retries: u32,
) -> Result<StepOutcome, KmError> {
    let Some(step) = state.first_remaining_step().cloned() else {
        let mut state = state;
        state.mark_running();
        save_state(document_store, &state).await?;
        return Ok(StepOutcome::Finished(state));
    };

    let Some(handler) = registry.resolve(step.as_str()) else {
        return Ok(StepOutcome::HandlerMissing(state));
    };

    let mut pre_call_state = state.clone();
    pre_call_state.mark_running();
    let invocation_input = pre_call_state.clone();

    match handler.process(invocation_input).await {
        Ok((HandlerOutcome::Success, mut updated)) => {
            updated.complete_step(&step)?;
            save_state(document_store, &updated).await?;
            if updated.remaining_steps().is_empty() {
                Ok(StepOutcome::Finished(updated))
            } else {
                Ok(StepOutcome::Advanced(updated))
            }
        }
        Ok((HandlerOutcome::Continue, updated)) => {
            save_state(document_store, &updated).await?;
            Ok(StepOutcome::Advanced(updated))
        }
        Err(err) if err.is_recoverable() => {
            let poisoned = pre_call_state.record_failed_attempt(max_retries);
            save_state(document_store, &pre_call_state).await?;
            if poisoned {
                let mut failed = pre_call_state;
                failed.fail(err.to_string());
                save_state(document_store, &failed).await?;
                Ok(StepOutcome::Poisoned(failed))
            } else {
                Ok(StepOutcome::Retry(pre_call_state))
            }
        }
        Err(err) => {
            let mut failed = pre_call_state;
            failed.fail(err.to_string());
            save_state(document_store, &failed).await?;
            Ok(StepOutcome::Poisoned(failed))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use kernel_memory_domain::repositories::Handler;
    use kernel_memory_domain::value_objects::{StepName, TagCollection};
    use std::sync::Arc;

    struct FlakyHandler {
        fail_times: std::sync::atomic::AtomicU32,
    }

    #[async_trait]
    impl Handler for FlakyHandler {
        fn name(&self) -> &str {
            "extract"
        }

        async fn process(&self, state: PipelineState) -> Result<(HandlerOutcome, PipelineState), KmError> {
            use std::sync::atomic::Ordering;
            if self.fail_times.fetch_sub(1, Ordering::SeqCst) > 0 {
                Err(KmError::transient("simulated timeout"))
            } else {
                Ok((HandlerOutcome::Success, state))
            }
        }
    }

    fn sample_state() -> PipelineState {
        PipelineState::admit(
            IndexName::new("default"),
            DocumentId::new("d1"),
            vec![StepName::extract()],
            vec![],
            TagCollection::new(),
        )
    }

    #[tokio::test]
    async fn retry_until_success() {
        use crate::infrastructure::document_store::LocalFsDocumentStore;
        let temp = tempfile::tempdir().unwrap();
        let store = LocalFsDocumentStore::new(temp.path());
        let index = IndexName::new("default");
        let doc_id = DocumentId::new("d1");
        store.create_document(&index, &doc_id).await.unwrap();

        let registry = HandlerRegistry::new();
        registry.register(Arc::new(FlakyHandler { fail_times: 2.into() })).unwrap();

        let mut state = sample_state();
        loop {
            match execute_step(&store, &registry, state, 10).await.unwrap() {
                StepOutcome::Retry(s) => state = s,
                StepOutcome::Finished(s) => {
                    assert!(s.is_ready());
                    break;
                }
                _ => panic!("unexpected outcome"),
            }
        }
    }

    #[tokio::test]
    async fn exhausting_retries_poisons() {
        use crate::infrastructure::document_store::LocalFsDocumentStore;
        let temp = tempfile::tempdir().unwrap();
        let store = LocalFsDocumentStore::new(temp.path());
        let index = IndexName::new("default");
        let doc_id = DocumentId::new("d1");
        store.create_document(&index, &doc_id).await.unwrap();

        let registry = HandlerRegistry::new();
        registry.register(Arc::new(FlakyHandler { fail_times: 999.into() })).unwrap();

        let mut state = sample_state();
        for _ in 0..2 {
            state = match execute_step(&store, &registry, state, 2).await.unwrap() {
                StepOutcome::Retry(s) => s,
                other => panic!("expected retry, got poisoned too early: {}", matches!(other, StepOutcome::Poisoned(_))),
            };
        }
        match execute_step(&store, &registry, state, 2).await.unwrap() {
            StepOutcome::Poisoned(s) => assert!(s.terminal_error.is_some()),
            _ => panic!("expected poisoned"),
        }
    }
}
