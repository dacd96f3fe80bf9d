//! Workflow deployment transaction.
//!
//! Deployment is two ordered writes: the code blob first, the metadata
//! record second. A record with status `deployed` must never be observable
//! unless the blob write already completed, so a blob failure aborts before
//! any metadata call, and a metadata failure still reports the whole
//! operation as failed. Redeploying an id overwrites both writes (last
//! write wins, no versioning).

use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use tracing::{info, instrument, warn};

use crate::backends::{BackendError, BlobStore, MetadataStore};
use crate::domain::DeploymentRecord;

/// Content type recorded on stored workflow code
const CODE_CONTENT_TYPE: &str = "text/x-python";

/// Terminal failure of a deployment.
///
/// Both variants surface to callers the same way: deployment either fully
/// succeeded or failed. The variants stay distinct so the failing write is
/// visible in logs and tests.
#[derive(Debug, Error)]
pub enum DeploymentError {
    /// The code blob write failed; no metadata was written
    #[error("Failed to deploy workflow: {0}")]
    BlobWrite(#[source] BackendError),

    /// The metadata upsert failed after the blob write succeeded
    #[error("Failed to deploy workflow: {0}")]
    MetadataWrite(#[source] BackendError),
}

/// Successful deployment result returned to the caller.
#[derive(Debug, Clone, Serialize)]
pub struct DeploymentOutcome {
    /// Fixed confirmation message
    pub message: String,

    /// Deterministic trigger URL for the deployed workflow
    pub webhook_url: String,
}

/// Storage path of a workflow's code blob
pub fn code_object_path(workflow_id: &str) -> String {
    format!("{workflow_id}/main.py")
}

/// Persists generated workflow code and records deployment state.
pub struct DeploymentCoordinator {
    blobs: Arc<dyn BlobStore>,
    metadata: Arc<dyn MetadataStore>,

    /// Metadata collection holding deployment records
    collection: String,

    /// Base URL the webhook path is appended to
    webhook_base_url: String,
}

impl DeploymentCoordinator {
    pub fn new(
        blobs: Arc<dyn BlobStore>,
        metadata: Arc<dyn MetadataStore>,
        collection: impl Into<String>,
        webhook_base_url: impl Into<String>,
    ) -> Self {
        Self {
            blobs,
            metadata,
            collection: collection.into(),
            webhook_base_url: webhook_base_url.into(),
        }
    }

    /// Deploy `code` under `workflow_id`.
    ///
    /// The code is stored as opaque text; it is never validated. An
    /// existing deployment with the same id is silently overwritten.
    #[instrument(skip(self, code), fields(workflow = %workflow_id))]
    pub async fn deploy(
        &self,
        workflow_id: &str,
        code: &str,
    ) -> Result<DeploymentOutcome, DeploymentError> {
        let path = code_object_path(workflow_id);

        // Blob write strictly precedes the metadata write
        self.blobs
            .write_object(&path, code.as_bytes(), CODE_CONTENT_TYPE)
            .await
            .map_err(|e| {
                warn!(error = %e, "Code blob write failed, aborting deployment");
                DeploymentError::BlobWrite(e)
            })?;

        let record = DeploymentRecord::deployed(workflow_id);
        let fields = serde_json::to_value(&record)
            .map_err(|e| DeploymentError::MetadataWrite(BackendError::Other(e.to_string())))?;

        self.metadata
            .upsert_document(&self.collection, workflow_id, fields)
            .await
            .map_err(|e| {
                warn!(error = %e, "Deployment record write failed");
                DeploymentError::MetadataWrite(e)
            })?;

        info!(%path, "Workflow deployed");
        Ok(DeploymentOutcome {
            message: "Workflow deployed successfully.".to_string(),
            webhook_url: self.webhook_url(workflow_id),
        })
    }

    /// Deterministic webhook URL for a workflow id
    fn webhook_url(&self, workflow_id: &str) -> String {
        format!(
            "{}/webhooks/{}",
            self.webhook_base_url.trim_end_matches('/'),
            workflow_id
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::{MemoryBlobStore, MemoryMetadataStore};

    fn coordinator(
        blobs: Arc<MemoryBlobStore>,
        metadata: Arc<MemoryMetadataStore>,
    ) -> DeploymentCoordinator {
        DeploymentCoordinator::new(
            blobs,
            metadata,
            "workflows",
            "https://daemon.example.com",
        )
    }

    #[test]
    fn test_code_object_path() {
        assert_eq!(code_object_path("wf-abc123def456"), "wf-abc123def456/main.py");
    }

    #[tokio::test]
    async fn test_webhook_url_contains_id() {
        let blobs = Arc::new(MemoryBlobStore::new());
        let metadata = Arc::new(MemoryMetadataStore::new());
        let coordinator = coordinator(blobs, metadata);

        let outcome = coordinator.deploy("wf-feedbeef0001", "x = 1").await.unwrap();
        assert!(outcome.webhook_url.contains("wf-feedbeef0001"));
        assert_eq!(
            outcome.webhook_url,
            "https://daemon.example.com/webhooks/wf-feedbeef0001"
        );
    }

    #[tokio::test]
    async fn test_trailing_slash_base_url() {
        let blobs = Arc::new(MemoryBlobStore::new());
        let metadata = Arc::new(MemoryMetadataStore::new());
        let coordinator = DeploymentCoordinator::new(
            blobs,
            metadata,
            "workflows",
            "https://daemon.example.com/",
        );

        let outcome = coordinator.deploy("wf-0123456789ab", "pass").await.unwrap();
        assert_eq!(
            outcome.webhook_url,
            "https://daemon.example.com/webhooks/wf-0123456789ab"
        );
    }

    #[tokio::test]
    async fn test_redeploy_overwrites() {
        let blobs = Arc::new(MemoryBlobStore::new());
        let metadata = Arc::new(MemoryMetadataStore::new());
        let coordinator = coordinator(blobs.clone(), metadata.clone());

        coordinator.deploy("wf-aaaa0000bbbb", "print(1)").await.unwrap();
        coordinator.deploy("wf-aaaa0000bbbb", "print(2)").await.unwrap();

        assert_eq!(blobs.object_count(), 1);
        assert_eq!(metadata.document_count(), 1);
        assert_eq!(
            blobs.object("wf-aaaa0000bbbb/main.py").unwrap(),
            b"print(2)"
        );
    }
}
