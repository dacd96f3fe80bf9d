//! daemon-backend - Backend API for the Daemon workflow platform
//!
//! Daemon turns a natural-language prompt into a deployable webhook
//! workflow. This crate is the control plane: it generates workflow code,
//! provisions run-time credentials, and persists deployments.
//!
//! # Architecture
//!
//! The orchestration core sits behind narrow backend traits:
//! - Credential saves are optimistic, with a single classified-not-found
//!   fallback that creates the secret container and retries once
//! - Deployments write the code blob strictly before the metadata record,
//!   so a `deployed` record is never observable without its code
//! - Code generation is an opaque collaborator returning source text
//!
//! # Modules
//!
//! - `backends`: External storage and generation clients (GCP, in-memory)
//! - `core`: Orchestration logic (Provision, Deploy, Generate)
//! - `domain`: Data structures (DeploymentRecord, GeneratedWorkflow)
//! - `server`: HTTP API (axum)
//! - `cli`: Command-line interface
//!
//! # Usage
//!
//! ```bash
//! # Serve against Google Cloud backends
//! daemon-backend serve
//!
//! # Local development without cloud access
//! daemon-backend serve --backend memory --bind 127.0.0.1:8080
//! ```

pub mod backends;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod server;

// Re-export main types at crate root for convenience
pub use crate::backends::{BackendError, BlobStore, CodeGenerator, MetadataStore, SecretStore};
pub use crate::config::{BackendKind, Config};
pub use crate::core::{
    CredentialProvisioner, DeploymentCoordinator, DeploymentError, DeploymentOutcome,
    GenerateError, ProvisionError, WorkflowGenerator,
};
pub use crate::domain::{DeploymentRecord, DeploymentStatus, GeneratedWorkflow};
pub use crate::server::AppState;
