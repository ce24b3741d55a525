//! Entities: objects with an identity that persists across mutation.

mod record;

pub use record::Record;
