// /////////////////////////////////////////////////////////////////////////////
// Kernel Memory Bootstrap
// SPDX-License-Identifier: MIT
// /////////////////////////////////////////////////////////////////////////////

//! Composition root: parses the CLI, loads layered config, wires a
//! [`kernel_memory::Memory`] out of the in-process-local infrastructure
//! adapters, and serves it over HTTP until a shutdown signal arrives.

use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use kernel_memory::infrastructure::document_store::LocalFsDocumentStore;
use kernel_memory::infrastructure::generators::{EchoTextGenerator, MockEmbeddingGenerator};
use kernel_memory::infrastructure::record_store::InMemoryRecordStore;
use kernel_memory::presentation::http::{self, AuthConfig};
use kernel_memory::MemoryBuilder;

use kernel_memory_bootstrap::cli::Cli;
use kernel_memory_bootstrap::config::ServerConfig;
use kernel_memory_bootstrap::exit_code::ExitCode;
use kernel_memory_bootstrap::logger::{BootstrapLogger, ConsoleLogger};
use kernel_memory_bootstrap::shutdown::{wait_for_shutdown_signal, ShutdownCoordinator};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let logger = ConsoleLogger::new();

    match run(cli, &logger).await {
        Ok(()) => std::process::exit(ExitCode::Success.as_i32()),
        Err(err) => {
            logger.error(&format!("fatal: {err}"));
            std::process::exit(ExitCode::Error.as_i32());
        }
    }
}

fn init_tracing(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt().with_env_filter(filter).json().init();
}

async fn run(cli: Cli, logger: &dyn BootstrapLogger) -> anyhow::Result<()> {
    let mut config = ServerConfig::load(cli.config.as_deref())?;
    if let Some(host) = cli.host {
        config.host = host;
    }
    if let Some(port) = cli.port {
        config.port = port;
    }
    if let Some(root) = cli.storage_root {
        config.storage_root = root.to_string_lossy().into_owned();
    }
    if let Some(workers) = cli.workers {
        config.worker_count = Some(workers);
    }

    logger.info(&format!("starting kernel-memory-server on {}:{}", config.host, config.port));

    let document_store = Arc::new(LocalFsDocumentStore::new(config.storage_root.clone()));
    let record_store = Arc::new(InMemoryRecordStore::new());
    let embedding_generator = Arc::new(MockEmbeddingGenerator::new(config.embedding_dimensions));
    let text_generator = Arc::new(EchoTextGenerator);

    let memory = MemoryBuilder::new()
        .with_document_store(document_store)
        .with_record_store(record_store)
        .with_embedding_generator(embedding_generator)
        .with_text_generator(text_generator)
        .with_pipeline_config(config.pipeline_config())
        .with_retrieval_config(config.retrieval_config())
        .with_summarize()
        .in_process(config.worker_count)
        .build()
        .await?;
    let memory = Arc::new(memory);

    let auth = match config.auth_header.clone() {
        Some(header) if !config.auth_keys.is_empty() => AuthConfig::new(header, config.auth_keys.clone()),
        _ => AuthConfig::disabled(),
    };

    let router = http::router(memory, auth);
    let listener = tokio::net::TcpListener::bind((config.host.as_str(), config.port)).await?;

    let shutdown = ShutdownCoordinator::default();
    let shutdown_for_server = shutdown.clone();
    let server = axum::serve(listener, router).with_graceful_shutdown(async move {
        wait_for_shutdown_signal().await;
        shutdown_for_server.initiate_shutdown();
    });

    server.await?;
    logger.info("server stopped");
    Ok(())
}
