// /////////////////////////////////////////////////////////////////////////////
// Kernel Memory Core
// SPDX-License-Identifier: MIT
// /////////////////////////////////////////////////////////////////////////////

//! One file per pipeline step (spec.md §4.2), each implementing
//! [`kernel_memory_domain::repositories::Handler`] and registered by name
//! with a [`crate::application::orchestrator::registry::HandlerRegistry`].

mod delete_document;
mod delete_index;
mod embed;
mod embed_parallel;
mod extract;
mod partition;
mod save_records;
mod summarize;

pub use delete_document::DeleteDocumentHandler;
pub use delete_index::DeleteIndexHandler;
pub use embed::{embedding_name, EmbedHandler, EmbeddingArtifact};
pub use embed_parallel::EmbedParallelHandler;
pub use extract::ExtractHandler;
pub use partition::PartitionHandler;
pub use save_records::SaveRecordsHandler;
pub use summarize::SummarizeHandler;
