// /////////////////////////////////////////////////////////////////////////////
// Kernel Memory Core
// SPDX-License-Identifier: MIT
// /////////////////////////////////////////////////////////////////////////////

//! Domain events emitted as a [`PipelineState`](crate::aggregates::PipelineState)
//! moves through its lifecycle. Consumed by the orchestrator's broadcast
//! channel (SPEC_FULL.md §10) so callers can observe completion without
//! polling `Status`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::value_objects::{DocumentId, IndexName, StepName};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum PipelineEvent {
    Admitted {
        index: IndexName,
        document_id: DocumentId,
        at: DateTime<Utc>,
    },
    StepCompleted {
        index: IndexName,
        document_id: DocumentId,
        step: StepName,
        at: DateTime<Utc>,
    },
    Completed {
        index: IndexName,
        document_id: DocumentId,
        at: DateTime<Utc>,
    },
    Failed {
        index: IndexName,
        document_id: DocumentId,
        error: String,
        at: DateTime<Utc>,
    },
    Deleted {
        index: IndexName,
        document_id: DocumentId,
        at: DateTime<Utc>,
    },
}

impl PipelineEvent {
    pub fn document_id(&self) -> &DocumentId {
        match self {
            PipelineEvent::Admitted { document_id, .. }
            | PipelineEvent::StepCompleted { document_id, .. }
            | PipelineEvent::Completed { document_id, .. }
            | PipelineEvent::Failed { document_id, .. }
            | PipelineEvent::Deleted { document_id, .. } => document_id,
        }
    }
}
