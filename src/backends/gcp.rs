//! Google Cloud backend clients (Secret Manager, Cloud Storage, Firestore).
//!
//! All three speak the public REST APIs directly via `reqwest`. A bearer
//! token comes from `DAEMON_GCP_ACCESS_TOKEN` or, on GCE/Cloud Run, from
//! the instance metadata server.
//!
//! Failures are classified structurally from the HTTP status code:
//! 404 -> `NotFound`, 403 -> `PermissionDenied`, everything else -> `Other`.

use async_trait::async_trait;
use base64::Engine;
use reqwest::StatusCode;
use serde::Deserialize;
use tracing::debug;

use super::{BackendError, BlobStore, MetadataStore, SecretStore};

const METADATA_TOKEN_URL: &str =
    "http://metadata.google.internal/computeMetadata/v1/instance/service-accounts/default/token";

/// Bearer token source for Google Cloud REST calls.
#[derive(Clone)]
pub struct TokenSource {
    /// Static token from the environment (development), if set
    static_token: Option<String>,
    client: reqwest::Client,
}

/// Token response from the metadata server
#[derive(Debug, Deserialize)]
struct MetadataToken {
    access_token: String,
}

impl TokenSource {
    /// Create a token source, preferring `DAEMON_GCP_ACCESS_TOKEN` over
    /// the metadata server.
    pub fn from_env() -> Self {
        Self {
            static_token: std::env::var("DAEMON_GCP_ACCESS_TOKEN").ok(),
            client: reqwest::Client::new(),
        }
    }

    /// Create a token source with a fixed token
    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            static_token: Some(token.into()),
            client: reqwest::Client::new(),
        }
    }

    /// Fetch a bearer token for the next request
    pub async fn token(&self) -> Result<String, BackendError> {
        if let Some(token) = &self.static_token {
            return Ok(token.clone());
        }

        let response = self
            .client
            .get(METADATA_TOKEN_URL)
            .header("Metadata-Flavor", "Google")
            .send()
            .await
            .map_err(|e| BackendError::Other(format!("metadata server unreachable: {e}")))?;

        let token: MetadataToken = response
            .error_for_status()
            .map_err(|e| BackendError::Other(format!("metadata token request failed: {e}")))?
            .json()
            .await
            .map_err(|e| BackendError::Other(format!("invalid metadata token response: {e}")))?;

        Ok(token.access_token)
    }
}

/// Classify a non-success HTTP response into a backend error
async fn classify_response(response: reqwest::Response) -> BackendError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    let summary = format!("HTTP {}: {}", status.as_u16(), body.chars().take(200).collect::<String>());

    match status {
        StatusCode::NOT_FOUND => BackendError::NotFound(summary),
        StatusCode::FORBIDDEN => BackendError::PermissionDenied(summary),
        _ => BackendError::Other(summary),
    }
}

fn transport_error(e: reqwest::Error) -> BackendError {
    BackendError::Other(format!("request failed: {e}"))
}

/// Secret Manager client.
///
/// Secret ids are the logical credential name under a fixed project prefix
/// (e.g. credential `slack_token` lives at secret `daemon-mvp-slack_token`).
pub struct GcpSecretStore {
    project_id: String,
    secret_prefix: String,
    tokens: TokenSource,
    client: reqwest::Client,
}

/// Resource-name envelope returned by create/addVersion
#[derive(Debug, Deserialize)]
struct ResourceName {
    name: String,
}

impl GcpSecretStore {
    pub fn new(project_id: impl Into<String>, secret_prefix: impl Into<String>, tokens: TokenSource) -> Self {
        Self {
            project_id: project_id.into(),
            secret_prefix: secret_prefix.into(),
            tokens,
            client: reqwest::Client::new(),
        }
    }

    /// Secret id for a logical credential name
    fn secret_id(&self, name: &str) -> String {
        format!("{}-{}", self.secret_prefix, name)
    }
}

#[async_trait]
impl SecretStore for GcpSecretStore {
    async fn add_version(&self, name: &str, value: &str) -> Result<String, BackendError> {
        let secret_id = self.secret_id(name);
        let url = format!(
            "https://secretmanager.googleapis.com/v1/projects/{}/secrets/{}:addVersion",
            self.project_id, secret_id
        );
        let payload = serde_json::json!({
            "payload": {
                "data": base64::engine::general_purpose::STANDARD.encode(value.as_bytes()),
            }
        });

        let token = self.tokens.token().await?;
        let response = self
            .client
            .post(&url)
            .bearer_auth(token)
            .json(&payload)
            .send()
            .await
            .map_err(transport_error)?;

        if !response.status().is_success() {
            return Err(classify_response(response).await);
        }

        let version: ResourceName = response
            .json()
            .await
            .map_err(|e| BackendError::Other(format!("invalid addVersion response: {e}")))?;
        debug!(secret = %secret_id, version = %version.name, "Added secret version");
        Ok(version.name)
    }

    async fn create_secret(&self, name: &str) -> Result<String, BackendError> {
        let secret_id = self.secret_id(name);
        let url = format!(
            "https://secretmanager.googleapis.com/v1/projects/{}/secrets",
            self.project_id
        );
        // Replication policy is fixed, never caller-supplied
        let payload = serde_json::json!({
            "replication": { "automatic": {} }
        });

        let token = self.tokens.token().await?;
        let response = self
            .client
            .post(&url)
            .query(&[("secretId", secret_id.as_str())])
            .bearer_auth(token)
            .json(&payload)
            .send()
            .await
            .map_err(transport_error)?;

        if !response.status().is_success() {
            return Err(classify_response(response).await);
        }

        let secret: ResourceName = response
            .json()
            .await
            .map_err(|e| BackendError::Other(format!("invalid createSecret response: {e}")))?;
        debug!(secret = %secret.name, "Created secret container");
        Ok(secret.name)
    }
}

/// Cloud Storage client writing objects into a single bucket.
pub struct GcsBlobStore {
    bucket: String,
    tokens: TokenSource,
    client: reqwest::Client,
}

impl GcsBlobStore {
    pub fn new(bucket: impl Into<String>, tokens: TokenSource) -> Self {
        Self {
            bucket: bucket.into(),
            tokens,
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl BlobStore for GcsBlobStore {
    async fn write_object(
        &self,
        path: &str,
        bytes: &[u8],
        content_type: &str,
    ) -> Result<(), BackendError> {
        let url = format!(
            "https://storage.googleapis.com/upload/storage/v1/b/{}/o",
            self.bucket
        );

        let token = self.tokens.token().await?;
        let response = self
            .client
            .post(&url)
            .query(&[("uploadType", "media"), ("name", path)])
            .bearer_auth(token)
            .header("Content-Type", content_type)
            .body(bytes.to_vec())
            .send()
            .await
            .map_err(transport_error)?;

        if !response.status().is_success() {
            return Err(classify_response(response).await);
        }

        debug!(bucket = %self.bucket, %path, size = bytes.len(), "Wrote object");
        Ok(())
    }
}

/// Firestore client writing documents into the default database.
pub struct FirestoreMetadataStore {
    project_id: String,
    tokens: TokenSource,
    client: reqwest::Client,
}

impl FirestoreMetadataStore {
    pub fn new(project_id: impl Into<String>, tokens: TokenSource) -> Self {
        Self {
            project_id: project_id.into(),
            tokens,
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl MetadataStore for FirestoreMetadataStore {
    async fn upsert_document(
        &self,
        collection: &str,
        key: &str,
        fields: serde_json::Value,
    ) -> Result<(), BackendError> {
        let url = format!(
            "https://firestore.googleapis.com/v1/projects/{}/databases/(default)/documents/{}/{}",
            self.project_id, collection, key
        );
        let payload = serde_json::json!({ "fields": firestore_fields(&fields)? });

        let token = self.tokens.token().await?;
        let response = self
            .client
            .patch(&url)
            .bearer_auth(token)
            .json(&payload)
            .send()
            .await
            .map_err(transport_error)?;

        if !response.status().is_success() {
            return Err(classify_response(response).await);
        }

        debug!(%collection, %key, "Upserted document");
        Ok(())
    }
}

/// Convert a flat JSON object into Firestore's typed field encoding
fn firestore_fields(fields: &serde_json::Value) -> Result<serde_json::Value, BackendError> {
    let object = fields
        .as_object()
        .ok_or_else(|| BackendError::Other("document fields must be a JSON object".into()))?;

    let mut encoded = serde_json::Map::new();
    for (key, value) in object {
        let typed = match value {
            serde_json::Value::String(s) => serde_json::json!({ "stringValue": s }),
            serde_json::Value::Bool(b) => serde_json::json!({ "booleanValue": b }),
            serde_json::Value::Number(n) if n.is_i64() => {
                serde_json::json!({ "integerValue": n.to_string() })
            }
            serde_json::Value::Number(n) => serde_json::json!({ "doubleValue": n }),
            serde_json::Value::Null => serde_json::json!({ "nullValue": null }),
            other => serde_json::json!({ "stringValue": other.to_string() }),
        };
        encoded.insert(key.clone(), typed);
    }

    Ok(serde_json::Value::Object(encoded))
}
