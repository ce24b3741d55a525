//! Repository ports: the collaborator contracts the domain depends on but
//! does not implement. Concrete adapters live in the `kernel-memory`
//! crate's `infrastructure` module.

mod document_store;
mod handler;
mod queue;
mod record_store;

pub use document_store::{DocumentStore, FileStream};
pub use handler::{Handler, HandlerOutcome};
pub use queue::{DequeueHandler, Queue, QueueFactory, QueueMessage, QueueOptions};
pub use record_store::{RecordStore, ScoredRecord};
