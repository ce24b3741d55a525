// /////////////////////////////////////////////////////////////////////////////
// Kernel Memory Core
// SPDX-License-Identifier: MIT
// /////////////////////////////////////////////////////////////////////////////

//! `extract` step (spec.md §4.2 table): produces one extracted-text
//! artifact per source file. MIME sniffing is limited to plain-text and
//! HTML; anything else is a terminal error — format-specific extractors
//! and OCR are out of scope (spec.md §1).

use std::sync::Arc;

use async_trait::async_trait;

use kernel_memory_domain::aggregates::PipelineState;
use kernel_memory_domain::error::KmError;
use kernel_memory_domain::repositories::{DocumentStore, Handler, HandlerOutcome};
use kernel_memory_domain::value_objects::{ArtifactType, FileDescriptor, StepName};

pub struct ExtractHandler {
    document_store: Arc<dyn DocumentStore>,
}

impl ExtractHandler {
    pub fn new(document_store: Arc<dyn DocumentStore>) -> Self {
        Self { document_store }
    }

    fn extracted_name(source_name: &str) -> String {
        format!("extracted__{source_name}.txt")
    }

    fn plain_text(mime_type: &str, bytes: &[u8]) -> Result<String, KmError> {
        match mime_type {
            "text/plain" => String::from_utf8(bytes.to_vec()).map_err(|_| KmError::terminal("source file is not valid UTF-8")),
            "text/html" => {
                let raw = String::from_utf8(bytes.to_vec()).map_err(|_| KmError::terminal("source file is not valid UTF-8"))?;
                Ok(strip_tags(&raw))
            }
            other => Err(KmError::terminal(format!("unsupported mime type '{other}'"))),
        }
    }
}

/// Minimal tag stripper; good enough to turn simple HTML into readable
/// text without pulling in a full parser.
fn strip_tags(html: &str) -> String {
    let mut out = String::with_capacity(html.len());
    let mut in_tag = false;
    for ch in html.chars() {
        match ch {
            '<' => in_tag = true,
            '>' => in_tag = false,
            _ if !in_tag => out.push(ch),
            _ => {}
        }
    }
    out.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[async_trait]
impl Handler for ExtractHandler {
    fn name(&self) -> &str {
        "extract"
    }

    async fn process(&self, mut state: PipelineState) -> Result<(HandlerOutcome, PipelineState), KmError> {
        let sources: Vec<FileDescriptor> = state.files.iter().filter(|f| f.artifact_type == ArtifactType::Source).cloned().collect();

        for source in sources {
            let already_done = state
                .files
                .iter()
                .any(|f| f.matches_back_reference(&StepName::extract(), &source.name, None, None));
            if already_done {
                continue;
            }

            let bytes = self.document_store.read_file_to_vec(&state.index, &state.document_id, &source.name).await?;
            let text = Self::plain_text(&source.mime_type, &bytes)?;
            let extracted_name = Self::extracted_name(&source.name);
            let content = text.into_bytes();
            let size = content.len() as u64;

            self.document_store.write_file(&state.index, &state.document_id, &extracted_name, content).await?;

            let descriptor = FileDescriptor::generated(
                extracted_name.clone(),
                "text/plain".to_string(),
                size,
                ArtifactType::Extracted,
                StepName::extract(),
                source.name.clone(),
            );
            state.files.push(descriptor);
        }

        Ok((HandlerOutcome::Success, state))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strip_tags_collapses_markup_and_whitespace() {
        let stripped = strip_tags("<html><body>Hello   <b>World</b></body></html>");
        assert_eq!(stripped, "Hello World");
    }
}
