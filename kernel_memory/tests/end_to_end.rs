// /////////////////////////////////////////////////////////////////////////////
// Kernel Memory Core
// SPDX-License-Identifier: MIT
// /////////////////////////////////////////////////////////////////////////////

//! End-to-end scenarios over the assembled [`kernel_memory::Memory`]:
//! ingest, filtered retrieval, cascade delete, idempotent re-ingest,
//! crash recovery, and the poison-queue path.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use kernel_memory::application::orchestrator::{AdmitOptions, AdmitRequest};
use kernel_memory::infrastructure::document_store::LocalFsDocumentStore;
use kernel_memory::infrastructure::generators::{EchoTextGenerator, MockEmbeddingGenerator};
use kernel_memory::infrastructure::record_store::InMemoryRecordStore;
use kernel_memory::MemoryBuilder;

use kernel_memory_domain::aggregates::PipelineState;
use kernel_memory_domain::error::KmError;
use kernel_memory_domain::repositories::{DocumentStore, Handler, HandlerOutcome, RecordStore};
use kernel_memory_domain::value_objects::{DocumentId, Filter, IndexName, StepName, TagCollection};

async fn build_memory(root: &std::path::Path) -> kernel_memory::Memory {
    MemoryBuilder::new()
        .with_document_store(Arc::new(LocalFsDocumentStore::new(root)))
        .with_record_store(Arc::new(InMemoryRecordStore::new()))
        .with_embedding_generator(Arc::new(MockEmbeddingGenerator::new(16)))
        .with_text_generator(Arc::new(EchoTextGenerator))
        .in_process(Some(4))
        .build()
        .await
        .expect("memory must build with every required collaborator supplied")
}

async fn wait_until_ready(memory: &kernel_memory::Memory, index: &IndexName, document_id: &DocumentId) {
    for _ in 0..200 {
        if memory.is_ready.execute(index, document_id).await.expect("status poll must not error") {
            return;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("document never became ready");
}

async fn wait_until_terminal(memory: &kernel_memory::Memory, index: &IndexName, document_id: &DocumentId) -> PipelineState {
    for _ in 0..200 {
        let state = memory.status.execute(index, document_id).await.expect("status poll must not error");
        if state.is_terminal() {
            return state;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("document never reached a terminal state");
}

fn source_file(name: &str, text: &str) -> (String, String, Vec<u8>) {
    (name.to_string(), "text/plain".to_string(), text.as_bytes().to_vec())
}

#[tokio::test]
async fn s1_ingest_then_ask() {
    let temp = tempfile::tempdir().unwrap();
    let memory = build_memory(temp.path()).await;
    let index = IndexName::default_index();
    let document_id = DocumentId::new("d1");

    memory
        .admit
        .execute(
            AdmitRequest {
                index: index.clone(),
                document_id: document_id.clone(),
                files: vec![source_file("physics.txt", "In physics, E = m*c^2 relates mass and energy.")],
                tags: TagCollection::new(),
                steps: None,
            },
            AdmitOptions::default(),
        )
        .await
        .unwrap();

    wait_until_ready(&memory, &index, &document_id).await;

    let answer = memory.ask.execute(&index, "What's E = m*c^2?", &Filter::unfiltered(), None, None).await.unwrap();
    assert!(!answer.no_answer);
    assert!(answer.text.contains("mass") || answer.text.contains("energy"));
    assert!(!answer.citations.is_empty());
    assert_eq!(answer.citations[0].document_id.as_deref(), Some("d1"));
}

#[tokio::test]
async fn s2_tag_filtering() {
    let temp = tempfile::tempdir().unwrap();
    let memory = build_memory(temp.path()).await;
    let index = IndexName::default_index();
    let document_id = DocumentId::new("d2");

    let mut tags = TagCollection::new();
    tags.insert("type", "news");
    tags.insert("user", "admin");
    tags.insert("user", "owner");

    memory
        .admit
        .execute(
            AdmitRequest {
                index: index.clone(),
                document_id: document_id.clone(),
                files: vec![source_file("story.txt", "Breaking news about the quarterly results.")],
                tags,
                steps: None,
            },
            AdmitOptions::default(),
        )
        .await
        .unwrap();
    wait_until_ready(&memory, &index, &document_id).await;

    let someone = memory.ask.execute(&index, "What happened?", &Filter::by_tag("user", "someone"), None, None).await.unwrap();
    assert!(someone.no_answer);

    let admin = memory.ask.execute(&index, "What happened?", &Filter::by_tag("user", "admin"), None, None).await.unwrap();
    assert!(!admin.no_answer);
    assert_eq!(admin.citations[0].document_id.as_deref(), Some("d2"));

    let conflicting = memory
        .ask
        .execute(&index, "What happened?", &Filter::by_tag("type", "news").and_tag("user", "someone"), None, None)
        .await
        .unwrap();
    assert!(conflicting.no_answer);
}

#[tokio::test]
async fn s3_or_of_filters() {
    let temp = tempfile::tempdir().unwrap();
    let memory = build_memory(temp.path()).await;
    let index = IndexName::default_index();

    let d2 = DocumentId::new("d2");
    let mut d2_tags = TagCollection::new();
    d2_tags.insert("user", "admin");
    memory
        .admit
        .execute(
            AdmitRequest { index: index.clone(), document_id: d2.clone(), files: vec![source_file("a.txt", "Admin authored report.")], tags: d2_tags, steps: None },
            AdmitOptions::default(),
        )
        .await
        .unwrap();

    let d3 = DocumentId::new("d3");
    let mut d3_tags = TagCollection::new();
    d3_tags.insert("user", "blake");
    memory
        .admit
        .execute(
            AdmitRequest { index: index.clone(), document_id: d3.clone(), files: vec![source_file("b.txt", "Blake authored memo.")], tags: d3_tags, steps: None },
            AdmitOptions::default(),
        )
        .await
        .unwrap();

    wait_until_ready(&memory, &index, &d2).await;
    wait_until_ready(&memory, &index, &d3).await;

    let filter = Filter::by_tag("user", "admin").or(Filter::by_tag("user", "blake"));
    let results = memory.search.execute(&index, "authored", &filter, Some(-1.0), Some(10)).await.unwrap();
    let cited: std::collections::BTreeSet<_> = results.iter().filter_map(|r| r.record.document_id().map(str::to_string)).collect();
    assert!(cited.contains("d2"));
    assert!(cited.contains("d3"));
}

#[tokio::test]
async fn s4_cascade_delete() {
    let temp = tempfile::tempdir().unwrap();
    let memory = build_memory(temp.path()).await;
    let index = IndexName::default_index();
    let document_id = DocumentId::new("d4");

    memory
        .admit
        .execute(
            AdmitRequest {
                index: index.clone(),
                document_id: document_id.clone(),
                files: vec![source_file("doc.txt", "Content scheduled for deletion.")],
                tags: TagCollection::new(),
                steps: None,
            },
            AdmitOptions::default(),
        )
        .await
        .unwrap();
    wait_until_ready(&memory, &index, &document_id).await;

    let before = memory.search.execute(&index, "deletion", &Filter::by_document("d4"), Some(-1.0), Some(10)).await.unwrap();
    assert!(!before.is_empty());

    memory.delete_document.execute(&index, &document_id).await.unwrap();
    // Deletion runs through the same async dispatch as ingestion.
    for _ in 0..200 {
        if memory.status.execute(&index, &document_id).await.is_err() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }

    let after = memory.search.execute(&index, "deletion", &Filter::by_document("d4"), Some(-1.0), Some(10)).await.unwrap();
    assert!(after.is_empty());
    assert!(memory.status.execute(&index, &document_id).await.is_err());
}

#[tokio::test]
async fn s5_idempotent_reingest() {
    let temp = tempfile::tempdir().unwrap();
    let memory = build_memory(temp.path()).await;
    let index = IndexName::default_index();
    let document_id = DocumentId::new("d5");
    let request = || AdmitRequest {
        index: index.clone(),
        document_id: document_id.clone(),
        files: vec![source_file("same.txt", "Identical bytes ingested twice over.")],
        tags: TagCollection::new(),
        steps: None,
    };

    memory.admit.execute(request(), AdmitOptions::default()).await.unwrap();
    wait_until_ready(&memory, &index, &document_id).await;
    let first_count = memory.search.execute(&index, "ingested", &Filter::by_document("d5"), Some(-1.0), Some(100)).await.unwrap().len();

    memory.admit.execute(request(), AdmitOptions { force_restart: true }).await.unwrap();
    wait_until_ready(&memory, &index, &document_id).await;
    let second_count = memory.search.execute(&index, "ingested", &Filter::by_document("d5"), Some(-1.0), Some(100)).await.unwrap().len();

    assert_eq!(first_count, second_count);
}

/// Drives a pipeline by calling [`execute_step`] directly, bypassing the
/// orchestrator's spawned dispatch loop, so a test can pause mid-pipeline
/// and resume from the persisted state exactly as a restarted process
/// would.
async fn drive_n_steps(document_store: &dyn DocumentStore, registry: &kernel_memory::application::orchestrator::HandlerRegistry, mut state: PipelineState, steps: usize) -> PipelineState {
    use kernel_memory::application::orchestrator::{execute_step, StepOutcome};
    for _ in 0..steps {
        match execute_step(document_store, registry, state, 10).await.unwrap() {
            StepOutcome::Advanced(next) | StepOutcome::Finished(next) => state = next,
            other => panic!("unexpected outcome mid-drive: {:?}", std::mem::discriminant(&other)),
        }
    }
    state
}

async fn drive_to_finish(document_store: &dyn DocumentStore, registry: &kernel_memory::application::orchestrator::HandlerRegistry, mut state: PipelineState) -> PipelineState {
    use kernel_memory::application::orchestrator::{execute_step, StepOutcome};
    loop {
        match execute_step(document_store, registry, state, 10).await.unwrap() {
            StepOutcome::Advanced(next) => state = next,
            StepOutcome::Finished(next) => return next,
            other => panic!("unexpected outcome: {:?}", std::mem::discriminant(&other)),
        }
    }
}

#[tokio::test]
async fn s6_crash_recovery_resumes_from_persisted_state() {
    use kernel_memory::application::handlers::{EmbedHandler, ExtractHandler, PartitionHandler, SaveRecordsHandler};
    use kernel_memory::application::orchestrator::HandlerRegistry;

    let temp = tempfile::tempdir().unwrap();
    let document_store: Arc<dyn DocumentStore> = Arc::new(LocalFsDocumentStore::new(temp.path()));
    let record_store: Arc<dyn RecordStore> = Arc::new(InMemoryRecordStore::new());
    let embedding_generator = Arc::new(MockEmbeddingGenerator::new(8));

    let index = IndexName::default_index();
    let document_id = DocumentId::new("d6");
    document_store.create_index(&index).await.unwrap();
    document_store.create_document(&index, &document_id).await.unwrap();

    let sentences: String = (0..20).map(|n| format!("Partition sentence number {n} carries its own content. ")).collect();
    document_store.write_file(&index, &document_id, "big.txt", sentences.into_bytes()).await.unwrap();

    let steps = vec![StepName::extract(), StepName::partition(), StepName::gen_embeddings(), StepName::save_records()];
    let files = vec![kernel_memory_domain::value_objects::FileDescriptor::source("big.txt".to_string(), "text/plain".to_string(), 1)];
    let state = PipelineState::admit(index.clone(), document_id.clone(), steps, files, TagCollection::new());

    let registry_before_crash = HandlerRegistry::new();
    registry_before_crash.register(Arc::new(ExtractHandler::new(document_store.clone()))).unwrap();
    registry_before_crash
        .register(Arc::new(PartitionHandler::new(document_store.clone()).with_chunking(1, 0)))
        .unwrap();

    // Drive through extract + partition only, then "crash": drop this
    // registry and everything built against it without ever calling
    // gen_embeddings or save_records.
    let state = drive_n_steps(document_store.as_ref(), &registry_before_crash, state, 2).await;
    assert_eq!(state.completed_steps(), &[StepName::extract(), StepName::partition()]);
    drop(registry_before_crash);

    // "Restart": a fresh registry and a fresh read of the persisted
    // state, as a newly started process would do.
    let resumed_state = kernel_memory::application::orchestrator::load_state(document_store.as_ref(), &index, &document_id).await.unwrap().unwrap();
    assert_eq!(resumed_state.completed_steps(), &[StepName::extract(), StepName::partition()]);

    let registry_after_restart = HandlerRegistry::new();
    registry_after_restart.register(Arc::new(ExtractHandler::new(document_store.clone()))).unwrap();
    registry_after_restart
        .register(Arc::new(PartitionHandler::new(document_store.clone()).with_chunking(1, 0)))
        .unwrap();
    registry_after_restart.register(Arc::new(EmbedHandler::new(document_store.clone(), embedding_generator))).unwrap();
    registry_after_restart
        .register(Arc::new(SaveRecordsHandler::new(document_store.clone(), record_store.clone())))
        .unwrap();

    let finished = drive_to_finish(document_store.as_ref(), &registry_after_restart, resumed_state).await;
    assert!(finished.is_ready());

    let records = record_store.get_list(&index, &Filter::by_document("d6"), 100).await.unwrap();
    assert_eq!(records.len(), 20, "every partition must be saved exactly once, no duplicates");
    let unique_ids: std::collections::BTreeSet<_> = records.iter().map(|r| r.id.clone()).collect();
    assert_eq!(unique_ids.len(), 20);
}

struct AlwaysFailEmbed;

#[async_trait]
impl Handler for AlwaysFailEmbed {
    fn name(&self) -> &str {
        "gen_embeddings"
    }

    async fn process(&self, _state: PipelineState) -> Result<(HandlerOutcome, PipelineState), KmError> {
        Err(KmError::transient("simulated embedding backend outage"))
    }
}

#[tokio::test]
async fn s7_poison_queue_after_exhausted_retries() {
    let temp = tempfile::tempdir().unwrap();
    let memory = build_memory(temp.path()).await;
    // Overrides the real gen_embeddings handler before the first admit
    // seals the registry.
    memory.orchestrator.add_handler(Arc::new(AlwaysFailEmbed)).await.unwrap();

    let index = IndexName::default_index();
    let document_id = DocumentId::new("d7");
    memory
        .admit
        .execute(
            AdmitRequest {
                index: index.clone(),
                document_id: document_id.clone(),
                files: vec![source_file("flaky.txt", "This document can never be embedded.")],
                tags: TagCollection::new(),
                steps: None,
            },
            AdmitOptions::default(),
        )
        .await
        .unwrap();

    let final_state = wait_until_terminal(&memory, &index, &document_id).await;
    assert!(final_state.terminal_error.is_some());
    assert!(final_state.terminal_error.unwrap().contains("simulated embedding backend outage"));
    assert_eq!(final_state.completed_steps(), &[StepName::extract(), StepName::partition()]);

    // The failure must not have silently let save_records run anyway.
    let records = memory.search.execute(&index, "embedded", &Filter::by_document("d7"), Some(-1.0), Some(10)).await.unwrap();
    assert!(records.is_empty());
}
