//! Core orchestration logic.
//!
//! This module contains:
//! - Provision: Credential save protocol with fallback secret creation
//! - Deploy: Ordered blob-then-metadata deployment transaction
//! - Generate: Prompt-to-workflow generation and id derivation

pub mod deploy;
pub mod generate;
pub mod provision;

// Re-export commonly used types
pub use deploy::{DeploymentCoordinator, DeploymentError, DeploymentOutcome, code_object_path};
pub use generate::{derive_workflow_id, GenerateError, WorkflowGenerator};
pub use provision::{CredentialProvisioner, ProvisionError};
