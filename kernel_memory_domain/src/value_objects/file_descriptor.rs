// /////////////////////////////////////////////////////////////////////////////
// Kernel Memory Core
// SPDX-License-Identifier: MIT
// /////////////////////////////////////////////////////////////////////////////

//! Describes one file (source upload or generated artifact) attached to a
//! pipeline. Generated artifacts carry a back-reference to the step that
//! produced them, so a retried handler can tell "already produced" from
//! "still missing" without re-deriving the artifact.

use serde::{Deserialize, Serialize};

use crate::value_objects::StepName;

/// What role a file plays in the pipeline, mirrors §6's `artifact_type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactType {
    Source,
    Extracted,
    Partition,
    Embedding,
    Synthetic,
}

/// One file belonging to a document's pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileDescriptor {
    pub name: String,
    pub mime_type: String,
    pub size: u64,
    pub artifact_type: ArtifactType,
    #[serde(skip_serializing_if = "Option::is_none", default, rename = "generated_by")]
    pub generated_by_step: Option<StepName>,
    #[serde(skip_serializing_if = "Option::is_none", default, rename = "source_file")]
    pub source_file: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default, rename = "part_n")]
    pub partition_number: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none", default, rename = "sect_n")]
    pub section_number: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub content_sha: Option<String>,
}

impl FileDescriptor {
    pub fn source(name: impl Into<String>, mime_type: impl Into<String>, size: u64) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            size,
            artifact_type: ArtifactType::Source,
            generated_by_step: None,
            source_file: None,
            partition_number: None,
            section_number: None,
            content_sha: None,
        }
    }

    pub fn generated(
        name: impl Into<String>,
        mime_type: impl Into<String>,
        size: u64,
        artifact_type: ArtifactType,
        generated_by_step: StepName,
        source_file: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            size,
            artifact_type,
            generated_by_step: Some(generated_by_step),
            source_file: Some(source_file.into()),
            partition_number: None,
            section_number: None,
            content_sha: None,
        }
    }

    pub fn with_partition(mut self, part_n: u32, sect_n: u32) -> Self {
        self.partition_number = Some(part_n);
        self.section_number = Some(sect_n);
        self
    }

    pub fn with_content_sha(mut self, sha: impl Into<String>) -> Self {
        self.content_sha = Some(sha.into());
        self
    }

    /// An artifact is "already produced" by `step` for `source_file` (and,
    /// for partition/embedding artifacts, the given partition/section) when
    /// a descriptor with a matching back-reference already exists. Handlers
    /// use this to skip re-derivation on a retried run.
    pub fn matches_back_reference(
        &self,
        step: &StepName,
        source_file: &str,
        part_n: Option<u32>,
        sect_n: Option<u32>,
    ) -> bool {
        self.generated_by_step.as_ref() == Some(step)
            && self.source_file.as_deref() == Some(source_file)
            && self.partition_number == part_n
            && self.section_number == sect_n
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn back_reference_roundtrip() {
        let artifact = FileDescriptor::generated(
            "part-0003.txt",
            "text/plain",
            128,
            ArtifactType::Partition,
            StepName::partition(),
            "extracted.txt",
        )
        .with_partition(3, 0);

        assert!(artifact.matches_back_reference(&StepName::partition(), "extracted.txt", Some(3), Some(0)));
        assert!(!artifact.matches_back_reference(&StepName::partition(), "extracted.txt", Some(4), Some(0)));
        assert!(!artifact.matches_back_reference(&StepName::extract(), "extracted.txt", Some(3), Some(0)));
    }
}
