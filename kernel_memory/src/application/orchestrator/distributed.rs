// /////////////////////////////////////////////////////////////////////////////
// Kernel Memory Core
// SPDX-License-Identifier: MIT
// /////////////////////////////////////////////////////////////////////////////

//! Distributed orchestrator: one named queue per step (`km-<step>`,
//! spec.md §4.1), workers bound via [`Queue::on_dequeue`]. Drives the
//! same [`execute_step`] state machine as the in-process variant; only
//! dispatch plumbing differs.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::broadcast;

use kernel_memory_domain::aggregates::PipelineState;
use kernel_memory_domain::error::KmError;
use kernel_memory_domain::events::PipelineEvent;
use kernel_memory_domain::repositories::{DocumentStore, Handler, Queue, QueueFactory, QueueMessage, QueueOptions, RecordStore};
use kernel_memory_domain::value_objects::{DocumentId, Filter, IndexName, StepName, TAG_DOCUMENT_ID};

use super::registry::HandlerRegistry;
use super::runner::{execute_step, load_state, save_state, StepOutcome, DEFAULT_MAX_RETRIES};
use super::{files_from_request, validate_admit_request, AdmitOptions, AdmitRequest, KmOrchestrator, EVENT_CHANNEL_CAPACITY};

pub struct DistributedOrchestrator {
    document_store: Arc<dyn DocumentStore>,
    record_store: Arc<dyn RecordStore>,
    queue_factory: Arc<dyn QueueFactory>,
    registry: Arc<HandlerRegistry>,
    max_retries: u32,
    queue_options: QueueOptions,
    events: broadcast::Sender<PipelineEvent>,
}

impl DistributedOrchestrator {
    pub fn new(document_store: Arc<dyn DocumentStore>, record_store: Arc<dyn RecordStore>, queue_factory: Arc<dyn QueueFactory>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            document_store,
            record_store,
            queue_factory,
            registry: Arc::new(HandlerRegistry::new()),
            max_retries: DEFAULT_MAX_RETRIES,
            queue_options: QueueOptions::default(),
            events,
        }
    }

    /// Connects to the queue for every currently-registered step and
    /// starts consuming it. Must be called once, after every handler has
    /// been registered (spec.md §9's register-then-seal lifecycle);
    /// subsequent registration attempts are rejected by the sealed
    /// registry.
    pub async fn start_workers(self: &Arc<Self>) -> Result<(), KmError> {
        self.registry.seal();
        for step in all_known_steps() {
            if self.registry.resolve(step.as_str()).is_none() {
                continue;
            }
            let queue = self.queue_factory.connect_to(&step.queue_name(), self.queue_options.clone()).await?;
            let worker = self.clone();
            let bound_step = step.clone();
            queue
                .on_dequeue(Arc::new(move |message: QueueMessage| {
                    let worker = worker.clone();
                    let bound_step = bound_step.clone();
                    Box::pin(async move { worker.handle_message(bound_step, message).await })
                }))
                .await?;
        }
        Ok(())
    }

    async fn handle_message(&self, expected_step: StepName, message: QueueMessage) -> Result<bool, KmError> {
        let Some(state) = load_state(self.document_store.as_ref(), &message.index, &message.document_id).await? else {
            return Ok(true);
        };
        if state.is_terminal() {
            return Ok(true);
        }
        if state.first_remaining_step() != Some(&expected_step) {
            return Ok(true);
        }

        match execute_step(self.document_store.as_ref(), &self.registry, state, self.max_retries).await? {
            StepOutcome::Advanced(next) => {
                if let Some(step) = next.completed_steps().last().cloned() {
                    let _ = self.events.send(PipelineEvent::StepCompleted {
                        index: next.index.clone(),
                        document_id: next.document_id.clone(),
                        step,
                        at: Utc::now(),
                    });
                }
                self.enqueue_next(&next).await?;
                Ok(true)
            }
            StepOutcome::Finished(next) => {
                let _ = self.events.send(PipelineEvent::Completed { index: next.index.clone(), document_id: next.document_id.clone(), at: Utc::now() });
                Ok(true)
            }
            StepOutcome::Retry(_) => Ok(false),
            StepOutcome::Poisoned(next) => {
                let error = next.terminal_error.clone().unwrap_or_default();
                let _ = self.events.send(PipelineEvent::Failed { index: next.index.clone(), document_id: next.document_id.clone(), error, at: Utc::now() });
                Ok(true)
            }
            StepOutcome::HandlerMissing(_) => Ok(false),
        }
    }

    async fn enqueue_next(&self, state: &PipelineState) -> Result<(), KmError> {
        let Some(step) = state.first_remaining_step() else {
            return Ok(());
        };
        let queue = self.queue_factory.connect_to(&step.queue_name(), self.queue_options.clone()).await?;
        queue.enqueue(QueueMessage::first_attempt(state.index.clone(), state.document_id.clone(), step.clone())).await
    }

    async fn documents_in_index(&self, index: &IndexName) -> Result<Vec<DocumentId>, KmError> {
        let records = self.record_store.get_list(index, &Filter::unfiltered(), usize::MAX).await?;
        let mut seen = std::collections::BTreeSet::new();
        for record in records {
            if let Some(id) = record.tags.values(TAG_DOCUMENT_ID).first() {
                seen.insert(id.clone());
            }
        }
        Ok(seen.into_iter().map(DocumentId::new).collect())
    }
}

/// Every step name the standard and deletion chains can reference; used
/// to decide which queues to bind workers to at startup.
fn all_known_steps() -> Vec<StepName> {
    let mut steps = StepName::standard_chain();
    steps.push(StepName::summarize());
    steps.extend(StepName::deletion_chain());
    steps.push(StepName::delete_index());
    steps
}

#[async_trait]
impl KmOrchestrator for DistributedOrchestrator {
    async fn add_handler(&self, handler: Arc<dyn Handler>) -> Result<(), KmError> {
        self.registry.register(handler)
    }

    async fn admit(&self, request: AdmitRequest, options: AdmitOptions) -> Result<DocumentId, KmError> {
        validate_admit_request(&request)?;

        let index = request.index.clone();
        let document_id = request.document_id.clone();
        let steps = request.steps.clone().unwrap_or_else(StepName::standard_chain);
        let files = files_from_request(&request.files);

        self.document_store.create_index(&index).await?;
        self.document_store.create_document(&index, &document_id).await?;
        for (name, _, content) in &request.files {
            self.document_store.write_file(&index, &document_id, name, content.clone()).await?;
        }

        let state = match load_state(self.document_store.as_ref(), &index, &document_id).await? {
            Some(mut existing) => {
                existing.restart(steps, files, request.tags.clone(), options.force_restart)?;
                existing
            }
            None => PipelineState::admit(index.clone(), document_id.clone(), steps, files, request.tags.clone()),
        };
        save_state(self.document_store.as_ref(), &state).await?;
        let _ = self.events.send(PipelineEvent::Admitted { index: index.clone(), document_id: document_id.clone(), at: Utc::now() });

        self.enqueue_next(&state).await?;
        Ok(document_id)
    }

    async fn status(&self, index: &IndexName, document_id: &DocumentId) -> Result<Option<PipelineState>, KmError> {
        load_state(self.document_store.as_ref(), index, document_id).await
    }

    async fn is_ready(&self, index: &IndexName, document_id: &DocumentId) -> Result<bool, KmError> {
        Ok(load_state(self.document_store.as_ref(), index, document_id).await?.is_some_and(|s| s.is_ready()))
    }

    async fn delete_document(&self, index: &IndexName, document_id: &DocumentId) -> Result<(), KmError> {
        let Some(mut state) = load_state(self.document_store.as_ref(), index, document_id).await? else {
            return Err(KmError::not_found(format!("no pipeline state for {index}/{document_id}")));
        };
        state.begin_deleting();
        save_state(self.document_store.as_ref(), &state).await?;
        self.enqueue_next(&state).await?;
        Ok(())
    }

    async fn delete_index(&self, index: &IndexName) -> Result<(), KmError> {
        for document_id in self.documents_in_index(index).await? {
            self.delete_document(index, &document_id).await?;
        }
        self.record_store.delete_index(index).await?;
        self.document_store.delete_index(index).await?;
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<PipelineEvent> {
        self.events.subscribe()
    }
}
