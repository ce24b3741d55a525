// /////////////////////////////////////////////////////////////////////////////
// Kernel Memory Core
// SPDX-License-Identifier: MIT
// /////////////////////////////////////////////////////////////////////////////

//! Deterministic stand-in [`EmbeddingGenerator`] for tests and local runs
//! without a real embedding provider configured: hashes words into a
//! fixed-size vector so the same text always embeds to the same point and
//! unrelated texts don't collide.

use async_trait::async_trait;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use kernel_memory_domain::error::KmError;

use crate::application::retrieval::EmbeddingGenerator;

pub struct MockEmbeddingGenerator {
    dimensions: usize,
}

impl MockEmbeddingGenerator {
    pub fn new(dimensions: usize) -> Self {
        Self { dimensions: dimensions.max(1) }
    }
}

impl Default for MockEmbeddingGenerator {
    fn default() -> Self {
        Self::new(32)
    }
}

#[async_trait]
impl EmbeddingGenerator for MockEmbeddingGenerator {
    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, KmError> {
        let mut vector = vec![0.0f32; self.dimensions];
        for word in text.split_whitespace() {
            let mut hasher = DefaultHasher::new();
            word.hash(&mut hasher);
            let bucket = (hasher.finish() as usize) % self.dimensions;
            vector[bucket] += 1.0;
        }
        let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for v in &mut vector {
                *v /= norm;
            }
        }
        Ok(vector)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn same_text_embeds_identically() {
        let generator = MockEmbeddingGenerator::default();
        let a = generator.embed("hello world").await.unwrap();
        let b = generator.embed("hello world").await.unwrap();
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn output_has_configured_dimensions() {
        let generator = MockEmbeddingGenerator::new(16);
        let v = generator.embed("anything").await.unwrap();
        assert_eq!(v.len(), 16);
    }
}
