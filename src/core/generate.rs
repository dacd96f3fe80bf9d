//! Prompt-to-workflow generation.
//!
//! Generation itself is an opaque collaborator behind the `CodeGenerator`
//! trait; this module owns the surrounding orchestration: prompt
//! validation, id derivation, and packaging the result.

use std::sync::Arc;

use sha2::{Digest, Sha256};
use thiserror::Error;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::backends::CodeGenerator;
use crate::domain::GeneratedWorkflow;

/// Terminal failure of workflow generation.
#[derive(Debug, Error)]
pub enum GenerateError {
    /// The prompt was empty after trimming
    #[error("Prompt must not be empty")]
    EmptyPrompt,

    /// The generation backend failed
    #[error("Failed to generate workflow: {0}")]
    Generation(#[source] anyhow::Error),
}

/// Turns prompts into generated workflows with derived ids.
pub struct WorkflowGenerator {
    generator: Arc<dyn CodeGenerator>,
}

impl WorkflowGenerator {
    pub fn new(generator: Arc<dyn CodeGenerator>) -> Self {
        Self { generator }
    }

    /// Generate workflow code for `prompt` and derive its id.
    #[instrument(skip(self, prompt))]
    pub async fn generate_workflow(
        &self,
        prompt: &str,
    ) -> Result<GeneratedWorkflow, GenerateError> {
        if prompt.trim().is_empty() {
            return Err(GenerateError::EmptyPrompt);
        }

        let generated_code = self
            .generator
            .generate(prompt)
            .await
            .map_err(GenerateError::Generation)?;

        let workflow_id = derive_workflow_id(prompt);
        info!(%workflow_id, code_len = generated_code.len(), "Workflow generated");

        Ok(GeneratedWorkflow {
            workflow_id,
            generated_code,
        })
    }
}

/// Derive a workflow id from a prompt.
///
/// `wf-` followed by the first 6 bytes (12 hex characters) of a SHA-256
/// over the prompt and a per-request nonce. The nonce keeps ids unique
/// when the same prompt is submitted more than once.
pub fn derive_workflow_id(prompt: &str) -> String {
    let nonce = Uuid::new_v4();

    let mut hasher = Sha256::new();
    hasher.update(prompt.as_bytes());
    hasher.update(nonce.as_bytes());
    let digest = hasher.finalize();

    format!("wf-{}", hex::encode(&digest[..6]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingGenerator {
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl CodeGenerator for CountingGenerator {
        async fn generate(&self, prompt: &str) -> anyhow::Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(format!("# generated for: {prompt}\n"))
        }
    }

    #[test]
    fn test_workflow_id_shape() {
        let id = derive_workflow_id("post hello to slack");

        assert_eq!(id.len(), 15);
        assert!(id.starts_with("wf-"));
        assert!(id[3..].chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn test_workflow_ids_are_unique() {
        let first = derive_workflow_id("same prompt");
        let second = derive_workflow_id("same prompt");

        assert_ne!(first, second);
    }

    #[tokio::test]
    async fn test_empty_prompt_skips_generator() {
        let calls = Arc::new(AtomicUsize::new(0));
        let generator = WorkflowGenerator::new(Arc::new(CountingGenerator {
            calls: calls.clone(),
        }));

        let err = generator.generate_workflow("   ").await.unwrap_err();
        assert!(matches!(err, GenerateError::EmptyPrompt));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }
}
