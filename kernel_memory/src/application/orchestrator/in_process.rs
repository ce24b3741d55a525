// /////////////////////////////////////////////////////////////////////////////
// Kernel Memory Core
// SPDX-License-Identifier: MIT
// /////////////////////////////////////////////////////////////////////////////

//! In-process orchestrator: a bounded worker pool with a per-document
//! logical lock (spec.md §4.1, §5). No external queue — backpressure
//! comes from the worker-pool semaphore.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::{broadcast, Mutex, Semaphore};

use kernel_memory_domain::aggregates::PipelineState;
use kernel_memory_domain::error::KmError;
use kernel_memory_domain::events::PipelineEvent;
use kernel_memory_domain::repositories::{DocumentStore, Handler, RecordStore};
use kernel_memory_domain::value_objects::{DocumentId, Filter, IndexName, StepName, TAG_DOCUMENT_ID};

use super::registry::HandlerRegistry;
use super::runner::{execute_step, load_state, save_state, StepOutcome, DEFAULT_MAX_RETRIES};
use super::{files_from_request, validate_admit_request, AdmitOptions, AdmitRequest, KmOrchestrator, EVENT_CHANNEL_CAPACITY};

type DocKey = (IndexName, DocumentId);

/// Default worker-pool width when the caller doesn't override it: the
/// number of available CPUs.
pub fn default_worker_count() -> usize {
    std::thread::available_parallelism().map(|n| n.get()).unwrap_or(4)
}

/// Runs the pipeline loop entirely within this process.
pub struct InProcessOrchestrator {
    document_store: Arc<dyn DocumentStore>,
    record_store: Arc<dyn RecordStore>,
    registry: Arc<HandlerRegistry>,
    max_retries: u32,
    worker_permits: Arc<Semaphore>,
    document_locks: Arc<Mutex<HashMap<DocKey, Arc<Mutex<()>>>>>,
    events: broadcast::Sender<PipelineEvent>,
}

impl InProcessOrchestrator {
    pub fn new(document_store: Arc<dyn DocumentStore>, record_store: Arc<dyn RecordStore>, worker_count: usize) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            document_store,
            record_store,
            registry: Arc::new(HandlerRegistry::new()),
            max_retries: DEFAULT_MAX_RETRIES,
            worker_permits: Arc::new(Semaphore::new(worker_count.max(1))),
            document_locks: Arc::new(Mutex::new(HashMap::new())),
            events,
        }
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    async fn lock_for(&self, key: &DocKey) -> Arc<Mutex<()>> {
        let mut locks = self.document_locks.lock().await;
        locks.entry(key.clone()).or_insert_with(|| Arc::new(Mutex::new(()))).clone()
    }

    /// Drives a pipeline from its current state to a terminal outcome for
    /// this dispatch round, serialized per-document via the logical lock
    /// from spec.md §5.
    async fn dispatch(&self, index: IndexName, document_id: DocumentId) -> Result<(), KmError> {
        let key = (index.clone(), document_id.clone());
        let lock = self.lock_for(&key).await;
        let _permit = self.worker_permits.acquire().await.map_err(|_| KmError::internal("worker pool closed"))?;
        let _guard = lock.lock().await;

        let Some(mut state) = load_state(self.document_store.as_ref(), &index, &document_id).await? else {
            return Err(KmError::not_found(format!("no pipeline state for {index}/{document_id}")));
        };

        loop {
            if state.is_terminal() {
                break;
            }
            match execute_step(self.document_store.as_ref(), &self.registry, state, self.max_retries).await? {
                StepOutcome::Advanced(next) => {
                    let step = next.completed_steps().last().cloned();
                    state = next;
                    if let Some(step) = step {
                        let _ = self.events.send(PipelineEvent::StepCompleted {
                            index: index.clone(),
                            document_id: document_id.clone(),
                            step,
                            at: Utc::now(),
                        });
                    }
                }
                StepOutcome::Finished(next) => {
                    state = next;
                    let _ = self.events.send(PipelineEvent::Completed { index: index.clone(), document_id: document_id.clone(), at: Utc::now() });
                    break;
                }
                StepOutcome::Retry(next) => {
                    state = next;
                    continue;
                }
                StepOutcome::Poisoned(next) => {
                    let error = next.terminal_error.clone().unwrap_or_default();
                    state = next;
                    let _ = self.events.send(PipelineEvent::Failed { index: index.clone(), document_id: document_id.clone(), error, at: Utc::now() });
                    break;
                }
                StepOutcome::HandlerMissing(next) => {
                    return Err(KmError::internal(format!(
                        "no handler registered for step '{}'",
                        next.first_remaining_step().map(StepName::as_str).unwrap_or("?")
                    )));
                }
            }
        }
        Ok(())
    }

    /// Enumerates document ids belonging to `index` by scanning the
    /// record store's `__document_id` tag (SPEC_FULL.md §9: reference
    /// implementations have no separate document index).
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

#[async_trait]
impl KmOrchestrator for InProcessOrchestrator {
    async fn add_handler(&self, handler: Arc<dyn Handler>) -> Result<(), KmError> {
        self.registry.register(handler)
    }

    async fn admit(&self, request: AdmitRequest, options: AdmitOptions) -> Result<DocumentId, KmError> {
        validate_admit_request(&request)?;
        self.registry.seal();

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

        let orchestrator = self.clone_handles();
        let dispatch_index = index.clone();
        let dispatch_doc = document_id.clone();
        tokio::spawn(async move {
            if let Err(err) = orchestrator.dispatch(dispatch_index, dispatch_doc).await {
                tracing::error!(error = %err, "pipeline dispatch failed");
            }
        });

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

        self.dispatch(index.clone(), document_id.clone()).await?;

        let _ = self.events.send(PipelineEvent::Deleted { index: index.clone(), document_id: document_id.clone(), at: Utc::now() });
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

impl InProcessOrchestrator {
    fn clone_handles(&self) -> Arc<Self> {
        Arc::new(Self {
            document_store: self.document_store.clone(),
            record_store: self.record_store.clone(),
            registry: self.registry.clone(),
            max_retries: self.max_retries,
            worker_permits: self.worker_permits.clone(),
            document_locks: self.document_locks.clone(),
            events: self.events.clone(),
        })
    }
}
