//! In-memory backend implementations.
//!
//! Used by `serve --backend memory` for local development and by the test
//! suite as drop-in replacements for the Google Cloud backends. State lives
//! in process memory and is lost on shutdown.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use super::{BackendError, BlobStore, CodeGenerator, MetadataStore, SecretStore};

/// In-memory versioned secret store.
///
/// Mirrors the backend contract: adding a version to a secret that was
/// never created fails with `NotFound`; creating an existing secret is
/// idempotent.
#[derive(Debug, Default)]
pub struct MemorySecretStore {
    secrets: Mutex<HashMap<String, Vec<String>>>,
}

impl MemorySecretStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of versions stored under `name`, if the secret exists
    pub fn version_count(&self, name: &str) -> Option<usize> {
        self.secrets.lock().unwrap().get(name).map(Vec::len)
    }
}

#[async_trait]
impl SecretStore for MemorySecretStore {
    async fn add_version(&self, name: &str, value: &str) -> Result<String, BackendError> {
        let mut secrets = self.secrets.lock().unwrap();
        let versions = secrets
            .get_mut(name)
            .ok_or_else(|| BackendError::NotFound(format!("secret {name}")))?;

        versions.push(value.to_string());
        Ok(format!("secrets/{}/versions/{}", name, versions.len()))
    }

    async fn create_secret(&self, name: &str) -> Result<String, BackendError> {
        let mut secrets = self.secrets.lock().unwrap();
        secrets.entry(name.to_string()).or_default();
        Ok(format!("secrets/{name}"))
    }
}

/// In-memory blob store keyed by object path.
#[derive(Debug, Default)]
pub struct MemoryBlobStore {
    objects: Mutex<HashMap<String, StoredObject>>,
}

#[derive(Debug, Clone)]
struct StoredObject {
    content_type: String,
    bytes: Vec<u8>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read back a stored object's bytes
    pub fn object(&self, path: &str) -> Option<Vec<u8>> {
        self.objects
            .lock()
            .unwrap()
            .get(path)
            .map(|o| o.bytes.clone())
    }

    /// Content type recorded for a stored object
    pub fn content_type(&self, path: &str) -> Option<String> {
        self.objects
            .lock()
            .unwrap()
            .get(path)
            .map(|o| o.content_type.clone())
    }

    pub fn object_count(&self) -> usize {
        self.objects.lock().unwrap().len()
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn write_object(
        &self,
        path: &str,
        bytes: &[u8],
        content_type: &str,
    ) -> Result<(), BackendError> {
        self.objects.lock().unwrap().insert(
            path.to_string(),
            StoredObject {
                content_type: content_type.to_string(),
                bytes: bytes.to_vec(),
            },
        );
        Ok(())
    }
}

/// In-memory document store keyed by (collection, key).
#[derive(Debug, Default)]
pub struct MemoryMetadataStore {
    documents: Mutex<HashMap<(String, String), serde_json::Value>>,
}

impl MemoryMetadataStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read back a stored document
    pub fn document(&self, collection: &str, key: &str) -> Option<serde_json::Value> {
        self.documents
            .lock()
            .unwrap()
            .get(&(collection.to_string(), key.to_string()))
            .cloned()
    }

    pub fn document_count(&self) -> usize {
        self.documents.lock().unwrap().len()
    }
}

#[async_trait]
impl MetadataStore for MemoryMetadataStore {
    async fn upsert_document(
        &self,
        collection: &str,
        key: &str,
        fields: serde_json::Value,
    ) -> Result<(), BackendError> {
        self.documents
            .lock()
            .unwrap()
            .insert((collection.to_string(), key.to_string()), fields);
        Ok(())
    }
}

/// Canned code generator for local development.
///
/// Returns a fixed workflow that exercises the SDK contract, with the
/// prompt echoed in a comment so generated ids still vary per request.
#[derive(Debug, Default)]
pub struct MemoryCodeGenerator;

impl MemoryCodeGenerator {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl CodeGenerator for MemoryCodeGenerator {
    async fn generate(&self, prompt: &str) -> anyhow::Result<String> {
        Ok(format!(
            "# {prompt}\n\
             data = get_trigger_data()\n\
             token = get_secret('slack_bot_token')\n\
             post_slack_message(token, '#general', str(data))\n"
        ))
    }
}
