//! Backend interfaces for external storage systems.
//!
//! Backends provide a unified interface for the three external stores the
//! API depends on:
//! - `SecretStore`: versioned secret containers (Secret Manager)
//! - `BlobStore`: durable object storage for workflow code (Cloud Storage)
//! - `MetadataStore`: deployment metadata documents (Firestore)
//!
//! Each trait carries exactly the operations the orchestration layer needs,
//! so tests can substitute in-memory implementations without any network
//! dependency.

pub mod gcp;
pub mod gemini;
pub mod memory;

use async_trait::async_trait;
use thiserror::Error;

// Re-export the production and in-memory backends
pub use gcp::{GcpSecretStore, GcsBlobStore, FirestoreMetadataStore, TokenSource};
pub use gemini::GeminiGenerator;
pub use memory::{MemoryBlobStore, MemoryCodeGenerator, MemoryMetadataStore, MemorySecretStore};

/// A classified backend failure.
///
/// `NotFound` is the only classification that triggers fallback
/// provisioning; everything else is terminal for the operation that
/// observed it. Classification is structural (HTTP status on the REST
/// clients), never matched out of error text.
#[derive(Debug, Error)]
pub enum BackendError {
    /// The addressed container/object does not exist
    #[error("not found: {0}")]
    NotFound(String),

    /// The caller is not allowed to perform the operation
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// Any other backend failure (quota, transport, encoding, ...)
    #[error("{0}")]
    Other(String),
}

impl BackendError {
    /// Whether this failure means "the container does not exist yet"
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

/// Versioned secret storage.
#[async_trait]
pub trait SecretStore: Send + Sync {
    /// Append `value` as a new version under the secret named `name`.
    ///
    /// Returns the backend-assigned resource name of the new version
    /// (e.g. `projects/p/secrets/s/versions/3`). Fails with
    /// [`BackendError::NotFound`] when the secret container does not exist.
    async fn add_version(&self, name: &str, value: &str) -> Result<String, BackendError>;

    /// Create the secret container for `name`.
    ///
    /// Replication policy is fixed configuration, not a caller input.
    /// Returns the resource name of the created container.
    async fn create_secret(&self, name: &str) -> Result<String, BackendError>;
}

/// Durable object storage.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Write `bytes` verbatim to `path`, overwriting any existing object.
    /// No partial-write recovery: any failure means the object must be
    /// treated as not written.
    async fn write_object(
        &self,
        path: &str,
        bytes: &[u8],
        content_type: &str,
    ) -> Result<(), BackendError>;
}

/// Document metadata storage.
#[async_trait]
pub trait MetadataStore: Send + Sync {
    /// Create or overwrite the document at `collection/key`.
    async fn upsert_document(
        &self,
        collection: &str,
        key: &str,
        fields: serde_json::Value,
    ) -> Result<(), BackendError>;
}

/// Opaque natural-language-to-code generation.
///
/// The implementation (a hosted language model) is an external
/// collaborator; the orchestration layer only sees code text out.
#[async_trait]
pub trait CodeGenerator: Send + Sync {
    /// Generate workflow source text for a natural-language prompt.
    async fn generate(&self, prompt: &str) -> anyhow::Result<String>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_classification() {
        assert!(BackendError::NotFound("secret x".into()).is_not_found());
        assert!(!BackendError::PermissionDenied("nope".into()).is_not_found());
        assert!(!BackendError::Other("quota".into()).is_not_found());
    }

    #[test]
    fn test_error_display() {
        let err = BackendError::NotFound("secrets/slack-token".into());
        assert_eq!(err.to_string(), "not found: secrets/slack-token");

        let err = BackendError::Other("connection reset".into());
        assert_eq!(err.to_string(), "connection reset");
    }
}
