// /////////////////////////////////////////////////////////////////////////////
// Kernel Memory Core
// SPDX-License-Identifier: MIT
// /////////////////////////////////////////////////////////////////////////////

//! The per-document state machine from spec.md §4.1:
//! `Admitted -> Running(step) -> ... -> Completed | Failed | Deleting -> Deleted`.
//! Transitions are one-way except `Running -> Running` on step advance;
//! `Deleting` can be entered from any non-`Deleted` state.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum PipelineStatus {
    Admitted,
    Running { step: String },
    Completed,
    Failed,
    Deleting,
    Deleted,
}

impl PipelineStatus {
    /// Whether `self -> next` is a legal transition per the state machine.
    pub fn can_transition_to(&self, next: &PipelineStatus) -> bool {
        use PipelineStatus::*;
        match (self, next) {
            (Deleted, _) => false,
            (_, Deleting) => true,
            (Admitted, Running { .. }) => true,
            (Running { .. }, Running { .. }) => true,
            (Running { .. }, Completed) => true,
            (Running { .. }, Failed) => true,
            (Deleting, Deleted) => true,
            _ => false,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, PipelineStatus::Completed | PipelineStatus::Failed | PipelineStatus::Deleted)
    }
}
