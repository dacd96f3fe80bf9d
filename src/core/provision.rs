//! Credential provisioning protocol.
//!
//! Saving a credential is optimistic: try to append a new version first,
//! and only when the backend reports the secret container missing, create
//! the container and retry the append exactly once. Any other failure is
//! terminal immediately. The fallback decision is a pure function over the
//! provisioning state and the classified error, so the protocol is
//! independent of any particular backend client's error hierarchy.

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use crate::backends::{BackendError, SecretStore};

/// Terminal failure of a credential save operation.
///
/// The two variants are distinct failure categories: a failed container
/// creation is reported separately from a failed version append, so
/// callers can pattern-match the category without parsing backend text.
#[derive(Debug, Error)]
pub enum ProvisionError {
    /// Fallback creation of the secret container failed
    #[error("Failed to create secret: {0}")]
    CreateFailed(#[source] BackendError),

    /// Appending the secret version failed
    #[error("Failed to save credential: {0}")]
    VersionAddFailed(#[source] BackendError),
}

/// Where a save operation is in the provisioning protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ProvisionState {
    /// No fallback attempted yet; a missing container is still recoverable
    Unprovisioned,

    /// Container creation in progress
    Provisioning,

    /// Container known to exist; a failed append is terminal
    Ready,
}

/// Reaction to a failed version append.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FallbackStep {
    /// Create the container, then retry the append once
    CreateContainer,

    /// Give up and surface the failure
    Fail,
}

/// Decide whether a failed append may fall back to container creation.
///
/// Only a "not found" failure observed before any fallback qualifies;
/// after one creation the protocol never creates again.
fn on_add_failure(state: ProvisionState, error: &BackendError) -> FallbackStep {
    match state {
        ProvisionState::Unprovisioned if error.is_not_found() => FallbackStep::CreateContainer,
        _ => FallbackStep::Fail,
    }
}

/// Saves caller credentials as versioned secrets.
pub struct CredentialProvisioner {
    secrets: Arc<dyn SecretStore>,
}

impl CredentialProvisioner {
    pub fn new(secrets: Arc<dyn SecretStore>) -> Self {
        Self { secrets }
    }

    /// Store `value` as a new version of the credential named `name`.
    ///
    /// Returns the backend-assigned version identifier. An empty value is
    /// valid input and stored like any other. Concurrent saves for the
    /// same name are not coordinated; both may succeed independently.
    #[instrument(skip(self, value), fields(credential = %name))]
    pub async fn save_credential(
        &self,
        name: &str,
        value: &str,
    ) -> Result<String, ProvisionError> {
        let mut state = ProvisionState::Unprovisioned;

        loop {
            match self.secrets.add_version(name, value).await {
                Ok(resource) => {
                    let version = version_id(&resource);
                    info!(%version, "Credential version stored");
                    return Ok(version);
                }
                Err(error) => match on_add_failure(state, &error) {
                    FallbackStep::CreateContainer => {
                        debug!("Secret container missing, creating");
                        state = ProvisionState::Provisioning;
                        self.secrets
                            .create_secret(name)
                            .await
                            .map_err(ProvisionError::CreateFailed)?;
                        state = ProvisionState::Ready;
                    }
                    FallbackStep::Fail => {
                        warn!(%error, "Credential save failed");
                        return Err(ProvisionError::VersionAddFailed(error));
                    }
                },
            }
        }
    }
}

/// Extract the version identifier from a backend resource name.
///
/// The backend returns the full resource path
/// (`projects/p/secrets/s/versions/4`); the identifier is the trailing
/// segment.
fn version_id(resource: &str) -> String {
    resource
        .rsplit('/')
        .next()
        .unwrap_or(resource)
        .to_string()
}
