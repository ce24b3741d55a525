//! Value objects: immutable types defined by their attributes rather than
//! identity.

mod document_id;
mod file_descriptor;
mod filter;
mod index_name;
mod pipeline_status;
mod record_id;
mod step_name;
mod tag_collection;

pub use document_id::DocumentId;
pub use file_descriptor::{ArtifactType, FileDescriptor};
pub use filter::{Conjunction, Filter};
pub use index_name::{IndexName, DEFAULT_INDEX_NAME};
pub use pipeline_status::PipelineStatus;
pub use record_id::RecordId;
pub use step_name::StepName;
pub use tag_collection::{TagCollection, RESERVED_PREFIX, TAG_DOCUMENT_ID, TAG_FILE_ID, TAG_PART_N, TAG_SECT_N, TAG_SYNTHETIC};
