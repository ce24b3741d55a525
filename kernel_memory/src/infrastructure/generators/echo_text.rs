// /////////////////////////////////////////////////////////////////////////////
// Kernel Memory Core
// SPDX-License-Identifier: MIT
// /////////////////////////////////////////////////////////////////////////////

//! Stand-in [`TextGenerator`] for tests and local runs: echoes the
//! assembled prompt's context back as the answer instead of calling a
//! real LLM. Useful for exercising the `ask` path end to end without an
//! external provider.

use async_trait::async_trait;

use kernel_memory_domain::error::KmError;

use crate::application::retrieval::TextGenerator;

#[derive(Default)]
pub struct EchoTextGenerator;

#[async_trait]
impl TextGenerator for EchoTextGenerator {
    async fn generate(&self, prompt: &str) -> Result<String, KmError> {
        let context = prompt.split("Context:\n").nth(1).and_then(|rest| rest.split("\n\nQuestion:").next()).unwrap_or(prompt);
        Ok(context.trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn echoes_the_context_section() {
        let generator = EchoTextGenerator;
        let prompt = "Answer using only the context.\n\nContext:\nsome grounded fact\n\nQuestion: what?\n\nAnswer:";
        let answer = generator.generate(prompt).await.unwrap();
        assert_eq!(answer, "some grounded fact");
    }
}
