//! Domain types for the Daemon backend.
//!
//! This module contains the core data structures:
//! - DeploymentRecord: Metadata describing a deployed workflow
//! - GeneratedWorkflow: Generated code text plus its derived identifier

pub mod deployment;

// Re-export commonly used types
pub use deployment::{DeploymentRecord, DeploymentStatus};

use serde::{Deserialize, Serialize};

/// A generated workflow: the code text plus its derived identifier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedWorkflow {
    /// Derived identifier (`wf-` followed by 12 hex characters)
    pub workflow_id: String,

    /// Generated source text, stored verbatim on deployment
    pub generated_code: String,
}
