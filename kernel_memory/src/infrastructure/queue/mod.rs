// /////////////////////////////////////////////////////////////////////////////
// Kernel Memory Core
// SPDX-License-Identifier: MIT
// /////////////////////////////////////////////////////////////////////////////

mod in_memory;

pub use in_memory::{InMemoryQueue, InMemoryQueueFactory};
