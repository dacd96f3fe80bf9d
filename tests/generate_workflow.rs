//! Workflow Generation Tests
//!
//! Covers id derivation, generator pass-through, and the generate-then-
//! deploy flow against in-memory backends.

use std::sync::Arc;

use async_trait::async_trait;

use daemon_backend::backends::{
    CodeGenerator, MemoryBlobStore, MemoryCodeGenerator, MemoryMetadataStore,
};
use daemon_backend::core::{DeploymentCoordinator, GenerateError, WorkflowGenerator};

/// Generator returning a fixed body regardless of prompt
struct FixedGenerator(&'static str);

#[async_trait]
impl CodeGenerator for FixedGenerator {
    async fn generate(&self, _prompt: &str) -> anyhow::Result<String> {
        Ok(self.0.to_string())
    }
}

/// Generator whose backend call always fails
struct BrokenGenerator;

#[async_trait]
impl CodeGenerator for BrokenGenerator {
    async fn generate(&self, _prompt: &str) -> anyhow::Result<String> {
        anyhow::bail!("model unavailable")
    }
}

#[tokio::test]
async fn test_workflow_id_format() {
    let generator = WorkflowGenerator::new(Arc::new(FixedGenerator("x = 1\n")));

    let workflow = generator
        .generate_workflow("Create a workflow that posts 'Hello World' to Slack")
        .await
        .unwrap();

    assert_eq!(workflow.workflow_id.len(), 15);
    assert!(workflow.workflow_id.starts_with("wf-"));
    assert!(workflow.workflow_id[3..]
        .chars()
        .all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
}

#[tokio::test]
async fn test_generated_code_passed_through() {
    let generator = WorkflowGenerator::new(Arc::new(FixedGenerator(
        "data = get_trigger_data()\npost_slack_message(token, '#general', 'hi')\n",
    )));

    let workflow = generator.generate_workflow("post to slack").await.unwrap();

    assert!(workflow.generated_code.contains("get_trigger_data"));
    assert!(workflow.generated_code.contains("post_slack_message"));
}

#[tokio::test]
async fn test_different_requests_get_different_ids() {
    let generator = WorkflowGenerator::new(Arc::new(FixedGenerator("pass\n")));

    let first = generator
        .generate_workflow("Post 'Morning update' to Slack")
        .await
        .unwrap();
    let second = generator
        .generate_workflow("Post 'Evening summary' to Slack")
        .await
        .unwrap();

    assert_ne!(first.workflow_id, second.workflow_id);
}

#[tokio::test]
async fn test_generation_failure_is_classified() {
    let generator = WorkflowGenerator::new(Arc::new(BrokenGenerator));

    let err = generator.generate_workflow("post to slack").await.unwrap_err();

    assert!(matches!(err, GenerateError::Generation(_)));
    assert!(err.to_string().starts_with("Failed to generate workflow"));
}

#[tokio::test]
async fn test_generate_then_deploy_flow() {
    let generator = WorkflowGenerator::new(Arc::new(MemoryCodeGenerator::new()));
    let blobs = Arc::new(MemoryBlobStore::new());
    let metadata = Arc::new(MemoryMetadataStore::new());
    let coordinator = DeploymentCoordinator::new(
        blobs.clone(),
        metadata.clone(),
        "workflows",
        "https://daemon.example.com",
    );

    let workflow = generator
        .generate_workflow("read the webhook and post it to #general")
        .await
        .unwrap();
    let outcome = coordinator
        .deploy(&workflow.workflow_id, &workflow.generated_code)
        .await
        .unwrap();

    assert!(outcome.webhook_url.contains(&workflow.workflow_id));

    let path = format!("{}/main.py", workflow.workflow_id);
    assert_eq!(blobs.object(&path).unwrap(), workflow.generated_code.as_bytes());

    let record = metadata
        .document("workflows", &workflow.workflow_id)
        .unwrap();
    assert_eq!(record["status"], "deployed");
    assert_eq!(record["workflow_id"], workflow.workflow_id.as_str());
}
