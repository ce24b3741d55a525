// /////////////////////////////////////////////////////////////////////////////
// Kernel Memory Core
// SPDX-License-Identifier: MIT
// /////////////////////////////////////////////////////////////////////////////

//! # Kernel Memory Core
//!
//! A long-term memory service for LLM applications: ingests documents
//! through a resumable pipeline (extract, partition, embed, save) and
//! retrieves grounded answers over them (search, ask).
//!
//! ## Layout
//!
//! - [`application`] — the pipeline orchestrator, handler chain,
//!   retrieval engine, use cases, and the [`application::builder::MemoryBuilder`]
//!   composition root.
//! - [`infrastructure`] — concrete adapters (local-disk document store,
//!   in-memory queue and record store, mock generators) plus config and
//!   metrics.
//! - [`presentation`] — the HTTP surface.
//!
//! Callers typically only touch [`application::builder::MemoryBuilder`]
//! and the [`kernel_memory_domain`] ports it's generic over.

pub mod application;
pub mod infrastructure;
pub mod presentation;

pub use application::builder::{Memory, MemoryBuilder};
pub use kernel_memory_domain as domain;
