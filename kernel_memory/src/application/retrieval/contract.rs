// /////////////////////////////////////////////////////////////////////////////
// Kernel Memory Core
// SPDX-License-Identifier: MIT
// /////////////////////////////////////////////////////////////////////////////

//! Ports for the two external-LLM collaborators named in spec.md §1's
//! out-of-scope list. Only their contracts are fixed here; concrete
//! providers are the caller's responsibility to wire via
//! [`crate::application::builder::MemoryBuilder`].

use async_trait::async_trait;

use kernel_memory_domain::error::KmError;

/// Turns text into a fixed-dimension embedding vector.
#[async_trait]
pub trait EmbeddingGenerator: Send + Sync {
    /// The vector dimensionality this generator always produces.
    fn dimensions(&self) -> usize;

    async fn embed(&self, text: &str) -> Result<Vec<f32>, KmError>;

    /// Batched embedding; the default loops over [`Self::embed`] — a
    /// `gen_embeddings_parallel`-capable generator overrides this with
    /// a real batch call (spec.md §4.2).
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, KmError> {
        let mut out = Vec::with_capacity(texts.len());
        for text in texts {
            out.push(self.embed(text).await?);
        }
        Ok(out)
    }
}

/// Turns a grounded prompt into a natural-language answer.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, KmError>;
}
