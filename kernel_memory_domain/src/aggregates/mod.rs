//! Aggregates: consistency boundaries that own their own invariants.

mod pipeline_state;

pub use pipeline_state::PipelineState;
