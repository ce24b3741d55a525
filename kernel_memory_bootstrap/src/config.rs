// /////////////////////////////////////////////////////////////////////////////
// Kernel Memory Bootstrap
// SPDX-License-Identifier: MIT
// /////////////////////////////////////////////////////////////////////////////

//! # Server Configuration
//!
//! Layered configuration for the `kernel-memory-server` binary: built-in
//! defaults, overridden by an optional TOML file, overridden by `KM_*`
//! environment variables, overridden by CLI flags (applied by the
//! caller after [`ServerConfig::load`] returns).

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use kernel_memory::infrastructure::config::{PipelineConfig, RetrievalConfig};

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub storage_root: String,
    pub target_tokens: usize,
    pub overlap_tokens: usize,
    pub max_retries: u32,
    pub visibility_timeout_secs: u64,
    pub worker_count: Option<usize>,
    pub min_relevance: f32,
    pub max_prompt_words: usize,
    pub default_limit: usize,
    pub auth_header: Option<String>,
    pub auth_keys: Vec<String>,
    pub embedding_dimensions: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            storage_root: "./km-data".to_string(),
            target_tokens: 200,
            overlap_tokens: 20,
            max_retries: 10,
            visibility_timeout_secs: 300,
            worker_count: None,
            min_relevance: 0.0,
            max_prompt_words: 2000,
            default_limit: 10,
            auth_header: None,
            auth_keys: Vec::new(),
            embedding_dimensions: 32,
        }
    }
}

impl ServerConfig {
    /// Loads defaults, then an optional TOML file at `config_path`, then
    /// `KM_*` environment variables (e.g. `KM_PORT=9000`), in that order
    /// of increasing precedence.
    pub fn load(config_path: Option<&Path>) -> Result<Self, config::ConfigError> {
        let defaults = Self::default();
        let mut builder = config::Config::builder()
            .set_default("host", defaults.host)?
            .set_default("port", defaults.port as i64)?
            .set_default("storage_root", defaults.storage_root)?
            .set_default("target_tokens", defaults.target_tokens as i64)?
            .set_default("overlap_tokens", defaults.overlap_tokens as i64)?
            .set_default("max_retries", defaults.max_retries as i64)?
            .set_default("visibility_timeout_secs", defaults.visibility_timeout_secs as i64)?
            .set_default("min_relevance", defaults.min_relevance as f64)?
            .set_default("max_prompt_words", defaults.max_prompt_words as i64)?
            .set_default("default_limit", defaults.default_limit as i64)?
            .set_default("auth_keys", Vec::<String>::new())?
            .set_default("embedding_dimensions", defaults.embedding_dimensions as i64)?;

        if let Some(path) = config_path {
            builder = builder.add_source(config::File::from(path));
        }
        builder = builder.add_source(config::Environment::with_prefix("KM").try_parsing(true).list_separator(","));

        builder.build()?.try_deserialize()
    }

    pub fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            target_tokens: self.target_tokens,
            overlap_tokens: self.overlap_tokens,
            max_retries: self.max_retries,
            visibility_timeout: Duration::from_secs(self.visibility_timeout_secs),
            worker_count: self.worker_count,
        }
    }

    pub fn retrieval_config(&self) -> RetrievalConfig {
        RetrievalConfig { min_relevance: self.min_relevance, max_prompt_words: self.max_prompt_words, default_limit: self.default_limit }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_load_with_no_file_or_env() {
        let config = ServerConfig::load(None).expect("defaults alone must be loadable");
        assert_eq!(config.port, 8080);
        assert_eq!(config.host, "127.0.0.1");
    }

    #[test]
    fn toml_file_overrides_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("km.toml");
        std::fs::write(&path, "port = 9001\nstorage_root = \"/tmp/km\"\n").expect("write config");
        let config = ServerConfig::load(Some(&path)).expect("file config must load");
        assert_eq!(config.port, 9001);
        assert_eq!(config.storage_root, "/tmp/km");
    }
}
