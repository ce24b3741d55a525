// /////////////////////////////////////////////////////////////////////////////
// Kernel Memory Bootstrap
// SPDX-License-Identifier: MIT
// /////////////////////////////////////////////////////////////////////////////

//! # Kernel Memory Bootstrap
//!
//! Sits outside the layered `kernel-memory` crate and owns everything
//! that crate deliberately doesn't: CLI parsing, layered config loading,
//! the tracing subscriber, signal-driven graceful shutdown, and the
//! composition root that builds a [`kernel_memory::Memory`] and serves
//! it over HTTP.
//!
//! `kernel-memory` can be used as a library with its own host process;
//! this crate is one concrete way to run it as a standalone server.

pub mod cli;
pub mod config;
pub mod exit_code;
pub mod logger;
pub mod shutdown;
