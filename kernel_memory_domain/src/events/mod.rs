//! Domain events for decoupled observation of pipeline lifecycle transitions.

mod pipeline_events;

pub use pipeline_events::PipelineEvent;
